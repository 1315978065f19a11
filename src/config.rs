use std::time::Duration;

use crate::error::ScraperError;

#[derive(Debug, Clone)]
pub struct CrawlerConfig {
    pub airtable_api_key: String,
    pub airtable_base_id: String,
    pub headless: bool,
    pub debug: bool,
    /// 各バウンデッドウェイト（カード出現・次ページボタン・stale判定）の上限
    pub wait_timeout: Duration,
    /// 処理対象の検索カテゴリ。空の場合は既定リストを使用
    pub categories: Vec<String>,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            airtable_api_key: String::new(),
            airtable_base_id: String::new(),
            headless: true,
            debug: false,
            wait_timeout: Duration::from_secs(10),
            categories: Vec::new(),
        }
    }
}

impl CrawlerConfig {
    pub fn new(airtable_api_key: impl Into<String>, airtable_base_id: impl Into<String>) -> Self {
        Self {
            airtable_api_key: airtable_api_key.into(),
            airtable_base_id: airtable_base_id.into(),
            ..Default::default()
        }
    }

    /// 環境変数から設定を読み込む
    ///
    /// 必須: `AIRTABLE_API_KEY`, `AIRTABLE_BASE_ID`
    /// 任意: `HEADLESS` ("false"で表示モード), `SCRAPER_DEBUG`
    pub fn from_env() -> Result<Self, ScraperError> {
        let api_key = std::env::var("AIRTABLE_API_KEY")
            .map_err(|_| ScraperError::Config("AIRTABLE_API_KEY が設定されていません".into()))?;
        let base_id = std::env::var("AIRTABLE_BASE_ID")
            .map_err(|_| ScraperError::Config("AIRTABLE_BASE_ID が設定されていません".into()))?;

        let headless = std::env::var("HEADLESS")
            .map(|v| v != "false" && v != "0")
            .unwrap_or(true);
        let debug = std::env::var("SCRAPER_DEBUG")
            .map(|v| v == "true" || v == "1")
            .unwrap_or(false);

        Ok(Self::new(api_key, base_id)
            .with_headless(headless)
            .with_debug(debug))
    }

    pub fn with_headless(mut self, headless: bool) -> Self {
        self.headless = headless;
        self
    }

    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    pub fn with_wait_timeout(mut self, timeout: Duration) -> Self {
        self.wait_timeout = timeout;
        self
    }

    pub fn with_categories(mut self, categories: Vec<String>) -> Self {
        self.categories = categories;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_builder() {
        let config = CrawlerConfig::new("key", "base")
            .with_headless(false)
            .with_debug(true)
            .with_wait_timeout(Duration::from_secs(5))
            .with_categories(vec!["Books".to_string()]);

        assert_eq!(config.airtable_api_key, "key");
        assert_eq!(config.airtable_base_id, "base");
        assert!(!config.headless);
        assert!(config.debug);
        assert_eq!(config.wait_timeout, Duration::from_secs(5));
        assert_eq!(config.categories, vec!["Books".to_string()]);
    }

    #[test]
    fn test_config_default() {
        let config = CrawlerConfig::default();
        assert!(config.headless);
        assert!(!config.debug);
        assert_eq!(config.wait_timeout, Duration::from_secs(10));
        assert!(config.categories.is_empty());
    }
}
