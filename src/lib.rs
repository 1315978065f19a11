//! Amazon検索結果スクレイパーライブラリ
//!
//! - カテゴリリストを順に検索し、結果ページの商品カードを抽出
//! - 抽出レコードをバリデーションしてAirtableへアップサート
//!
//! # クローラー使用例
//!
//! ```rust,ignore
//! use amazon_scraper_service::{AmazonCrawler, Crawler, CrawlerConfig};
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = CrawlerConfig::new("airtable_api_key", "airtable_base_id")
//!         .with_headless(false);
//!
//!     let mut crawler = AmazonCrawler::new(config).unwrap();
//!     let report = crawler.execute().await.unwrap();
//!     println!("Upserted: {}", report.records_upserted);
//! }
//! ```
//!
//! # tower Service 使用例
//!
//! ```rust,ignore
//! use amazon_scraper_service::{CrawlerService, CrawlRequest};
//! use tower::Service;
//!
//! #[tokio::main]
//! async fn main() {
//!     let mut service = CrawlerService::new();
//!
//!     let request = CrawlRequest::new("airtable_api_key", "airtable_base_id")
//!         .with_categories(vec!["Books".to_string()]);
//!
//!     let report = service.call(request).await.unwrap();
//!     println!("Cards: {}", report.cards_seen);
//! }
//! ```

pub mod airtable;
pub mod amazon;
pub mod config;
pub mod error;
pub mod service;
pub mod traits;

// 主要な型をリエクスポート
pub use airtable::{AirtableClient, AirtableRecord, UPSERT_KEY_FIELD};
pub use amazon::{AmazonCrawler, CrawlReport, CrawlSession, ProductRecord, RawFields};
pub use config::CrawlerConfig;
pub use error::ScraperError;
pub use service::{CrawlRequest, CrawlerService};
pub use traits::Crawler;
