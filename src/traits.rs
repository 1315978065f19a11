use async_trait::async_trait;

use crate::amazon::CrawlReport;
use crate::error::ScraperError;

#[async_trait]
pub trait Crawler: Send + Sync {
    /// ブラウザ初期化
    async fn initialize(&mut self) -> Result<(), ScraperError>;

    /// 全カテゴリをクロール
    async fn crawl(&mut self) -> Result<CrawlReport, ScraperError>;

    /// リソース解放
    async fn close(&mut self) -> Result<(), ScraperError>;

    /// 一括実行（initialize → crawl → close）
    ///
    /// initialize成功後は、crawlがエラーで終わってもcloseを必ず実行する。
    async fn execute(&mut self) -> Result<CrawlReport, ScraperError> {
        self.initialize().await?;
        let result = self.crawl().await;
        let close_result = self.close().await;
        let report = result?;
        close_result?;
        Ok(report)
    }
}
