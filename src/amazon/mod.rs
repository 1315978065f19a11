//! Amazon検索結果クローラーモジュール
//!
//! カテゴリリストを順に検索し、結果ページの商品カードを抽出して
//! Airtableへアップサートする。

pub mod constants;
mod crawler;
mod record;
mod types;

pub use crawler::AmazonCrawler;
pub use record::{keys, normalize_url, sentinels, ProductRecord, RawFields, REQUIRED_KEYS};
pub use types::{CrawlReport, CrawlSession};
