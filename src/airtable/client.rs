//! Airtable REST API クライアント
//!
//! reqwestをAirtable向けのエラー処理・認証・型付きレスポンスで包む。
//! アップサートは`product id`をマージキーにした冪等操作として呼び出すが、
//! このIDは抽出のたびに新規生成されるため、再クロールでは既存行の更新では
//! なく新規行の追加になる（DESIGN.md参照）。

use std::collections::HashMap;
use std::time::Duration;

use reqwest::{Client, Url};
use tracing::{debug, info};

use crate::amazon::constants::AIRTABLE_TABLE_NAME;
use crate::error::ScraperError;

use super::types::{AirtableRecord, PerformUpsert, RecordPage, UpsertRecord, UpsertRequest};

const DEFAULT_BASE_URL: &str = "https://api.airtable.com/v0/";

/// アップサートのマージキー列
pub const UPSERT_KEY_FIELD: &str = "product id";

/// Airtable REST API クライアント
///
/// 本番は [`AirtableClient::new`]、テストでは [`AirtableClient::with_base_url`]
/// でモックサーバーに向ける。
pub struct AirtableClient {
    client: Client,
    api_key: String,
    base_id: String,
    table_name: String,
    base_url: Url,
}

impl AirtableClient {
    pub fn new(api_key: &str, base_id: &str) -> Result<Self, ScraperError> {
        Self::with_base_url(api_key, base_id, DEFAULT_BASE_URL)
    }

    /// ベースURLを差し替えてクライアントを作る（wiremockテスト用）
    pub fn with_base_url(
        api_key: &str,
        base_id: &str,
        base_url: &str,
    ) -> Result<Self, ScraperError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .connect_timeout(Duration::from_secs(10))
            .user_agent("amazon-scraper-service/0.1")
            .build()?;

        // 末尾スラッシュをちょうど1つに正規化してからパースする
        let normalized = format!("{}/", base_url.trim_end_matches('/'));
        let base_url = Url::parse(&normalized)
            .map_err(|e| ScraperError::Config(format!("不正なベースURL '{}': {}", normalized, e)))?;

        Ok(Self {
            client,
            api_key: api_key.to_owned(),
            base_id: base_id.to_owned(),
            table_name: AIRTABLE_TABLE_NAME.to_owned(),
            base_url,
        })
    }

    fn table_url(&self) -> Result<Url, ScraperError> {
        self.base_url
            .join(&format!("{}/{}", self.base_id, self.table_name))
            .map_err(|e| ScraperError::Config(format!("テーブルURL構築エラー: {}", e)))
    }

    /// レコード1件をアップサートする
    ///
    /// `fields` は列ラベル → 値のマッピング。`product id` をマージキーとして
    /// PATCHする。失敗はエラーとして返し、クロールを止めるかどうかは
    /// 呼び出し側が決める（クロールループはログに残して続行する）。
    pub async fn upsert(&self, fields: HashMap<String, String>) -> Result<(), ScraperError> {
        info!("Upserting record into Airtable...");

        let body = UpsertRequest {
            perform_upsert: PerformUpsert {
                fields_to_merge_on: vec![UPSERT_KEY_FIELD.to_string()],
            },
            records: vec![UpsertRecord { fields }],
        };

        let response = self
            .client
            .patch(self.table_url()?)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;
        Self::check_status(response).await?;

        info!("Record upserted successfully");
        Ok(())
    }

    /// フィルタ列が指定値に一致するレコードを全件取得する
    ///
    /// レスポンスの`offset`カーソルが尽きるまでページを辿る。
    /// 検証・照会用であり、コアのクロールループからは呼ばない。
    pub async fn fetch_all(
        &self,
        filter_field: &str,
        value: &str,
    ) -> Result<Vec<AirtableRecord>, ScraperError> {
        let mut records = Vec::new();
        let mut offset: Option<String> = None;

        loop {
            let mut url = self.table_url()?;
            {
                let mut query = url.query_pairs_mut();
                query.append_pair("filterByFormula", &Self::filter_formula(filter_field, value));
                if let Some(ref cursor) = offset {
                    query.append_pair("offset", cursor);
                }
            }

            let response = self
                .client
                .get(url)
                .bearer_auth(&self.api_key)
                .send()
                .await?;
            let page: RecordPage = Self::check_status(response).await?.json().await?;

            debug!("Fetched {} records", page.records.len());
            records.extend(page.records);

            match page.offset {
                Some(cursor) => offset = Some(cursor),
                None => break,
            }
        }

        Ok(records)
    }

    /// フィルタ列が指定値に一致する先頭レコードを取得する
    pub async fn fetch_one(
        &self,
        filter_field: &str,
        value: &str,
    ) -> Result<Option<AirtableRecord>, ScraperError> {
        let mut url = self.table_url()?;
        {
            let mut query = url.query_pairs_mut();
            query.append_pair("filterByFormula", &Self::filter_formula(filter_field, value));
            query.append_pair("maxRecords", "1");
        }

        let response = self
            .client
            .get(url)
            .bearer_auth(&self.api_key)
            .send()
            .await?;
        let page: RecordPage = Self::check_status(response).await?.json().await?;

        Ok(page.records.into_iter().next())
    }

    fn filter_formula(field: &str, value: &str) -> String {
        // 値に含まれるシングルクォートはエスケープする
        format!("{{{}}} = '{}'", field, value.replace('\'', "\\'"))
    }

    async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, ScraperError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(ScraperError::Airtable {
            status: status.as_u16(),
            body,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, method, path, query_param, query_param_is_missing};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn test_client(server: &MockServer) -> AirtableClient {
        AirtableClient::with_base_url("test_key", "base123", &server.uri()).unwrap()
    }

    #[test]
    fn test_filter_formula() {
        assert_eq!(
            AirtableClient::filter_formula("product id", "abc-123"),
            "{product id} = 'abc-123'"
        );
        assert_eq!(
            AirtableClient::filter_formula("product name", "it's"),
            "{product name} = 'it\\'s'"
        );
    }

    #[tokio::test]
    async fn test_upsert_sends_merge_key_payload() {
        let server = MockServer::start().await;
        Mock::given(method("PATCH"))
            .and(path("/base123/selenium_extracted_data"))
            .and(body_partial_json(json!({
                "performUpsert": { "fieldsToMergeOn": ["product id"] },
                "records": [ { "fields": { "product name": "jako" } } ]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "records": [] })))
            .expect(1)
            .mount(&server)
            .await;

        let client = test_client(&server).await;
        let fields = HashMap::from([
            ("product id".to_string(), "1".to_string()),
            ("product name".to_string(), "jako".to_string()),
        ]);

        client.upsert(fields).await.expect("upsert should succeed");
    }

    #[tokio::test]
    async fn test_upsert_surfaces_api_error() {
        let server = MockServer::start().await;
        Mock::given(method("PATCH"))
            .and(path("/base123/selenium_extracted_data"))
            .respond_with(
                ResponseTemplate::new(422)
                    .set_body_json(json!({ "error": { "type": "INVALID_REQUEST_UNKNOWN" } })),
            )
            .mount(&server)
            .await;

        let client = test_client(&server).await;
        let err = client.upsert(HashMap::new()).await.unwrap_err();

        match err {
            ScraperError::Airtable { status, body } => {
                assert_eq!(status, 422);
                assert!(body.contains("INVALID_REQUEST_UNKNOWN"));
            }
            other => panic!("expected Airtable error, got: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_fetch_one_returns_first_record() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/base123/selenium_extracted_data"))
            .and(query_param("filterByFormula", "{product id} = 'uuid-1'"))
            .and(query_param("maxRecords", "1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "records": [
                    { "id": "rec1", "createdTime": "2025-05-20T00:00:00.000Z",
                      "fields": { "product id": "uuid-1" } }
                ]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = test_client(&server).await;
        let record = client
            .fetch_one("product id", "uuid-1")
            .await
            .expect("fetch should succeed")
            .expect("record should be present");
        assert_eq!(record.id, "rec1");
    }

    #[tokio::test]
    async fn test_fetch_one_absent() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/base123/selenium_extracted_data"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "records": [] })))
            .mount(&server)
            .await;

        let client = test_client(&server).await;
        let record = client.fetch_one("product id", "nope").await.unwrap();
        assert!(record.is_none());
    }

    #[tokio::test]
    async fn test_fetch_all_follows_offset_cursor() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/base123/selenium_extracted_data"))
            .and(query_param("offset", "cursor1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "records": [ { "id": "rec2", "fields": {} } ]
            })))
            .expect(1)
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path("/base123/selenium_extracted_data"))
            .and(query_param_is_missing("offset"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "records": [ { "id": "rec1", "fields": {} } ],
                "offset": "cursor1"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = test_client(&server).await;
        let records = client.fetch_all("product name", "jako").await.unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].id, "rec1");
        assert_eq!(records[1].id, "rec2");
    }
}
