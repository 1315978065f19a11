//! 商品レコードの型定義とバリデーション
//!
//! カード1枚から抽出した生フィールドを [`RawFields`] に貯め、
//! センチネル置換・URL正規化・ID生成を経て [`ProductRecord`] にする。
//! フィールド単位の抽出失敗はレコード全体を壊さない。

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ScraperError;

/// 抽出失敗時に入る固定文字列
pub mod sentinels {
    pub const PRODUCT_NAME: &str = "Product Name Not Found";
    pub const PRODUCT_PRICE: &str = "Price not found!";
    pub const PRODUCT_RATING: &str = "Product rating not found";
    pub const IMAGE_URL: &str = "Image URL Not found.";
    pub const PRODUCT_URL: &str = "product url not found.";
}

/// 生フィールドマッピングのキー名
pub mod keys {
    pub const PRODUCT_ID: &str = "Product_id";
    pub const PRODUCT_NAME: &str = "Product Name";
    pub const PRODUCT_PRICE: &str = "Product Price";
    pub const PRODUCT_RATING: &str = "Product_rating";
    pub const IMAGE_URL: &str = "Image_URL";
    pub const PRODUCT_URL: &str = "product url";
}

/// バリデーション必須キー（5項目。product urlは任意）
pub const REQUIRED_KEYS: &[&str] = &[
    keys::PRODUCT_ID,
    keys::PRODUCT_NAME,
    keys::PRODUCT_PRICE,
    keys::PRODUCT_RATING,
    keys::IMAGE_URL,
];

/// カード1枚から取れた生の値。フィールドごとに独立して埋める
#[derive(Debug, Clone, Default)]
pub struct RawFields {
    pub name: Option<String>,
    pub price: Option<String>,
    pub rating: Option<String>,
    pub image_src: Option<String>,
    pub href: Option<String>,
}

impl RawFields {
    /// 生フィールドマッピングに変換する
    ///
    /// 全キーを必ず埋める。値が取れなかった（またはトリム後に空の）
    /// フィールドはセンチネルに置換し、hrefはスキームなしならoriginを前置する。
    /// Product_idはページからは読まず、抽出のたびに新しいUUID v4を生成する。
    /// そのため同じ商品を再クロールしてもIDは一致しない（アップサートの
    /// マージキーがこのIDである限り、再クロールは更新ではなく追加になる）。
    pub fn into_fields(self, origin: &str) -> HashMap<String, String> {
        let mut fields = HashMap::new();
        fields.insert(keys::PRODUCT_ID.to_string(), Uuid::new_v4().to_string());
        fields.insert(
            keys::PRODUCT_NAME.to_string(),
            or_sentinel(self.name, sentinels::PRODUCT_NAME),
        );
        fields.insert(
            keys::PRODUCT_PRICE.to_string(),
            or_sentinel(self.price, sentinels::PRODUCT_PRICE),
        );
        fields.insert(
            keys::PRODUCT_RATING.to_string(),
            or_sentinel(self.rating, sentinels::PRODUCT_RATING),
        );
        fields.insert(
            keys::IMAGE_URL.to_string(),
            or_sentinel(self.image_src, sentinels::IMAGE_URL),
        );
        let product_url = match non_empty(self.href) {
            Some(href) => normalize_url(&href, origin),
            None => sentinels::PRODUCT_URL.to_string(),
        };
        fields.insert(keys::PRODUCT_URL.to_string(), product_url);
        fields
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn or_sentinel(value: Option<String>, sentinel: &str) -> String {
    non_empty(value).unwrap_or_else(|| sentinel.to_string())
}

/// スキームなしのhrefにサイトoriginを前置する。スキーム付きはそのまま
pub fn normalize_url(href: &str, origin: &str) -> String {
    if href.starts_with("http") {
        href.to_string()
    } else {
        format!("{}{}", origin, href)
    }
}

/// バリデーション済みの商品レコード
///
/// 全フィールドが必ず埋まっている（実値かセンチネルのどちらか）。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductRecord {
    pub product_id: String,
    pub product_name: String,
    pub product_price: String,
    pub product_rating: String,
    pub image_url: String,
    pub product_url: String,
}

impl ProductRecord {
    /// 生フィールドマッピングをバリデーションしてレコードにする
    ///
    /// 必須5キーのいずれかが欠けていればエラー。値がセンチネルでも有効。
    /// 副作用なし。シンク呼び出しの前に必ず通す。
    pub fn validate(raw: &HashMap<String, String>) -> Result<Self, ScraperError> {
        for key in REQUIRED_KEYS {
            if !raw.contains_key(*key) {
                return Err(ScraperError::Validation((*key).to_string()));
            }
        }

        Ok(Self {
            product_id: raw[keys::PRODUCT_ID].clone(),
            product_name: raw[keys::PRODUCT_NAME].clone(),
            product_price: raw[keys::PRODUCT_PRICE].clone(),
            product_rating: raw[keys::PRODUCT_RATING].clone(),
            image_url: raw[keys::IMAGE_URL].clone(),
            product_url: raw
                .get(keys::PRODUCT_URL)
                .cloned()
                .unwrap_or_else(|| sentinels::PRODUCT_URL.to_string()),
        })
    }

    /// Airtableフィールドラベルのマッピングに変換する（snake_case → 空白区切り）
    pub fn airtable_fields(&self) -> HashMap<String, String> {
        [
            ("product_id", &self.product_id),
            ("product_name", &self.product_name),
            ("product_price", &self.product_price),
            ("product_rating", &self.product_rating),
            ("image_url", &self.image_url),
            ("product_url", &self.product_url),
        ]
        .into_iter()
        .map(|(key, value)| (field_label(key), value.clone()))
        .collect()
    }
}

/// snake_caseキーをAirtableの列ラベルにする ("product_id" → "product id")
fn field_label(snake: &str) -> String {
    snake.replace('_', " ")
}
