use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScraperError {
    #[error("ブラウザ初期化エラー: {0}")]
    BrowserInit(String),

    #[error("ナビゲーションエラー: {0}")]
    Navigation(String),

    #[error("ホームページ読み込み失敗: {0}")]
    HomePage(String),

    #[error("タイムアウト: {0}")]
    Timeout(String),

    #[error("要素が見つかりません: {0}")]
    ElementNotFound(String),

    #[error("JavaScript実行エラー: {0}")]
    JavaScript(String),

    #[error("バリデーションエラー: 必須キーがありません: {0}")]
    Validation(String),

    #[error("Airtable APIエラー: status={status}, body={body}")]
    Airtable { status: u16, body: String },

    #[error("HTTPエラー: {0}")]
    Http(#[from] reqwest::Error),

    #[error("設定エラー: {0}")]
    Config(String),
}
