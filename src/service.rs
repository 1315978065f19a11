use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Duration;

use tower::Service;
use tracing::info;

use crate::amazon::{AmazonCrawler, CrawlReport};
use crate::config::CrawlerConfig;
use crate::error::ScraperError;
use crate::traits::Crawler;

/// クロールリクエスト
#[derive(Debug, Clone)]
pub struct CrawlRequest {
    pub airtable_api_key: String,
    pub airtable_base_id: String,
    pub headless: bool,
    pub debug: bool,
    pub categories: Vec<String>,
}

impl CrawlRequest {
    pub fn new(airtable_api_key: impl Into<String>, airtable_base_id: impl Into<String>) -> Self {
        Self {
            airtable_api_key: airtable_api_key.into(),
            airtable_base_id: airtable_base_id.into(),
            headless: true,
            debug: false,
            categories: Vec::new(),
        }
    }

    pub fn with_headless(mut self, headless: bool) -> Self {
        self.headless = headless;
        self
    }

    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    pub fn with_categories(mut self, categories: Vec<String>) -> Self {
        self.categories = categories;
        self
    }
}

impl From<CrawlRequest> for CrawlerConfig {
    fn from(req: CrawlRequest) -> Self {
        CrawlerConfig {
            airtable_api_key: req.airtable_api_key,
            airtable_base_id: req.airtable_base_id,
            headless: req.headless,
            debug: req.debug,
            wait_timeout: Duration::from_secs(10),
            categories: req.categories,
        }
    }
}

/// tower::Serviceを実装したクローラーサービス
#[derive(Debug, Clone, Default)]
pub struct CrawlerService {
    // 将来的な拡張用（レートリミット、キャッシュなど）
}

impl CrawlerService {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Service<CrawlRequest> for CrawlerService {
    type Response = CrawlReport;
    type Error = ScraperError;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: CrawlRequest) -> Self::Future {
        info!("クロールリクエスト受信: base_id={}", req.airtable_base_id);

        Box::pin(async move {
            let config: CrawlerConfig = req.into();
            let mut crawler = AmazonCrawler::new(config)?;

            // クロール実行（initialize成功後はエラー時もcloseされる）
            let report = crawler.execute().await?;

            info!(
                "クロール完了: upserted={}, failed={}, skipped={}",
                report.records_upserted, report.records_failed, report.categories_skipped
            );

            Ok(report)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_crawl_request_builder() {
        let req = CrawlRequest::new("key", "base")
            .with_headless(false)
            .with_debug(true)
            .with_categories(vec!["Books".to_string()]);

        assert_eq!(req.airtable_api_key, "key");
        assert_eq!(req.airtable_base_id, "base");
        assert!(!req.headless);
        assert!(req.debug);
        assert_eq!(req.categories, vec!["Books".to_string()]);
    }

    #[test]
    fn test_crawl_request_to_config() {
        let req = CrawlRequest::new("key", "base").with_headless(false);
        let config: CrawlerConfig = req.into();

        assert_eq!(config.airtable_api_key, "key");
        assert_eq!(config.airtable_base_id, "base");
        assert!(!config.headless);
    }
}
