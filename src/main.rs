//! バッチ実行エントリポイント
//!
//! 固定カテゴリリストを一巡クロールして終了する。

use amazon_scraper_service::{AmazonCrawler, Crawler, CrawlerConfig};

#[tokio::main]
async fn main() {
    // .envがあれば読み込む（なくてもよい）
    let _ = dotenvy::dotenv();

    // ログ設定
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,amazon_scraper_service=debug".into()),
        )
        .init();

    let config = match CrawlerConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("設定エラー: {}", e);
            std::process::exit(1);
        }
    };

    let mut crawler = match AmazonCrawler::new(config) {
        Ok(crawler) => crawler,
        Err(e) => {
            eprintln!("クライアント初期化エラー: {}", e);
            std::process::exit(1);
        }
    };

    match crawler.execute().await {
        Ok(report) => {
            println!("=== Crawl Report ===");
            println!("Categories: {}", report.categories_total);
            println!("Skipped:    {}", report.categories_skipped);
            println!("Cards:      {}", report.cards_seen);
            println!("Upserted:   {}", report.records_upserted);
            println!("Failed:     {}", report.records_failed);
        }
        Err(e) => {
            eprintln!("クロール失敗: {}", e);
            std::process::exit(1);
        }
    }
}
