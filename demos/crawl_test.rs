use amazon_scraper_service::{AmazonCrawler, Crawler, CrawlerConfig};

#[tokio::main]
async fn main() {
    // ログ設定
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .init();

    // 環境変数から認証情報を取得
    let api_key = std::env::var("AIRTABLE_API_KEY")
        .expect("AIRTABLE_API_KEY environment variable not set");
    let base_id = std::env::var("AIRTABLE_BASE_ID")
        .expect("AIRTABLE_BASE_ID environment variable not set");

    let config = CrawlerConfig::new(&api_key, &base_id)
        .with_headless(false) // デバッグ用に表示モード
        .with_debug(true)
        .with_categories(vec!["Books".to_string()]);

    let mut crawler = AmazonCrawler::new(config).expect("failed to build crawler");

    println!("=== Amazon Crawl Test ===");

    match crawler.execute().await {
        Ok(report) => {
            println!(
                "成功! cards={} upserted={} failed={}",
                report.cards_seen, report.records_upserted, report.records_failed
            );
        }
        Err(e) => {
            eprintln!("エラー: {}", e);
        }
    }
}
