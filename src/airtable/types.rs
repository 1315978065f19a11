//! Airtable REST API のリクエスト/レスポンス型

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// アップサートリクエストボディ
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpsertRequest {
    pub perform_upsert: PerformUpsert,
    pub records: Vec<UpsertRecord>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PerformUpsert {
    pub fields_to_merge_on: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct UpsertRecord {
    pub fields: HashMap<String, String>,
}

/// レコード一覧レスポンス（offsetは次ページカーソル）
#[derive(Debug, Deserialize)]
pub struct RecordPage {
    pub records: Vec<AirtableRecord>,
    #[serde(default)]
    pub offset: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AirtableRecord {
    pub id: String,
    #[serde(rename = "createdTime", default)]
    pub created_time: Option<String>,
    #[serde(default)]
    pub fields: HashMap<String, serde_json::Value>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upsert_request_serializes_camel_case() {
        let request = UpsertRequest {
            perform_upsert: PerformUpsert {
                fields_to_merge_on: vec!["product id".to_string()],
            },
            records: vec![UpsertRecord {
                fields: HashMap::from([("product name".to_string(), "jako".to_string())]),
            }],
        };

        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(
            value["performUpsert"]["fieldsToMergeOn"][0],
            "product id"
        );
        assert_eq!(value["records"][0]["fields"]["product name"], "jako");
    }

    #[test]
    fn test_record_page_deserializes_without_offset() {
        let json = r#"{"records":[{"id":"rec1","createdTime":"2025-05-20T00:00:00.000Z","fields":{"product name":"jako"}}]}"#;
        let page: RecordPage = serde_json::from_str(json).unwrap();
        assert_eq!(page.records.len(), 1);
        assert_eq!(page.records[0].id, "rec1");
        assert!(page.offset.is_none());
    }
}
