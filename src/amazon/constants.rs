//! Amazonリクエスト用の固定テーブル（クッキー・ヘッダー・セレクタ・カテゴリ）
//!
//! ここの値は起動時に一度だけ読み込まれ、クロール中は不変として扱う。

pub const HOME_PAGE_URL: &str = "https://www.amazon.com";
pub const COOKIE_DOMAIN: &str = ".amazon.com";

/// ホームページタイトルの判定文字列
pub const HOME_PAGE_TITLE_MARKER: &str = "Amazon";

/// 処理対象の検索カテゴリ（既定リスト）
pub const CATEGORIES_TO_PROCESS: &[&str] = &[
    "Digital Content & Devices",
    "Shop by Department",
    "Programs & Features",
];

/// セッションクッキー (name, value)
pub const COOKIES: &[(&str, &str)] = &[
    ("session-id", "145-4902261-2194662"),
    ("session-id-time", "2082787201l"),
    ("i18n-prefs", "USD"),
    ("sp-cdn", "\"L5Z9:PK\""),
    ("ubid-main", "131-4180572-4581705"),
    ("skin", "noskin"),
    (
        "session-token",
        "HKbu/rRDFO/67hrbgAKw1WLYX0Ppxh9biUPLHd15IiSXS9d1McNj5tUNMry6D5sJv1HlsyQXF57kwtQ+5zQu/hp64950WEQO/Q9iAG5xXciMKw04HWL8TD+/rbrPy/z1xY769labzFojm3St+KYAw08BMLTOEAPDcU3Hc9ZFLRvY/Fl1zDXefHl4GxKRF0lV6cPhEs5FNs6xxS5p+rRAv+jwpLtC873zP9T2rVZLcJDwQiGXVQMn7evJnxxNi8lBcl68GM3QBdDrYUISmKOntnaKSXSEMQOVE5d9DzD0Lln30r5vw3W4YnUgkHKRAp9xxSD90A5VAm8N8M94UMYdNU/Mfat8SGyJ",
    ),
    ("rxc", "ANqE/8c0UQIHoVa3Kmk"),
    (
        "csm-hit",
        "tb:SVB5DVJY072ZDBJ9WW84+s-HKZ7EF7BQZDNYDZ35CSY|1747741452456&t:1747741452457&adb:adblk_no",
    ),
];

/// ブラウザ引数として適用するUser-Agent
pub const USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/136.0.0.0 Safari/537.36";

/// Network.setExtraHTTPHeadersで注入する追加ヘッダー
pub const EXTRA_HEADERS: &[(&str, &str)] = &[
    (
        "accept",
        "text/html,application/xhtml+xml,application/xml;q=0.9,image/avif,image/webp,image/apng,*/*;q=0.8,application/signed-exchange;v=b3;q=0.7",
    ),
    ("accept-language", "en-US,en;q=0.9"),
    ("device-memory", "8"),
    ("downlink", "10"),
    ("dpr", "1"),
    ("ect", "4g"),
    ("priority", "u=0, i"),
    ("rtt", "250"),
    ("sec-ch-device-memory", "8"),
    ("sec-ch-dpr", "1"),
    (
        "sec-ch-ua",
        "\"Chromium\";v=\"136\", \"Google Chrome\";v=\"136\", \"Not.A/Brand\";v=\"99\"",
    ),
    ("sec-ch-ua-mobile", "?0"),
    ("sec-ch-ua-platform", "\"Linux\""),
    ("sec-ch-ua-platform-version", "\"6.11.0\""),
    ("sec-ch-viewport-width", "964"),
    ("sec-fetch-dest", "document"),
    ("sec-fetch-mode", "navigate"),
    ("sec-fetch-site", "none"),
    ("sec-fetch-user", "?1"),
    ("upgrade-insecure-requests", "1"),
    ("viewport-width", "964"),
];

/// CSSセレクタ
pub mod selectors {
    pub const SEARCH_FIELD: &str = "input[id*='twotabsearchtextbox']";
    pub const SEARCH_BUTTON: &str = "input[id*='nav-search-submit-button']";
    pub const PRODUCT_CARDS: &str = "div[role='listitem'] > div > div";
    pub const PRODUCT_NAME: &str = "h2[aria-label]";
    pub const PRODUCT_PRICE: &str = "span.a-price > span.a-offscreen";
    pub const PRODUCT_RATING: &str = "i[data-cy='reviews-ratings-slot'] > span.a-icon-alt";
    pub const IMAGE_ELEMENT: &str = "div.a-section.aok-relative.s-image-fixed-height > img.s-image";
    pub const PRODUCT_URL: &str = "a.a-link-normal.s-no-outline";
    pub const NEXT_PAGE_BUTTON: &str = "a.s-pagination-next";
}

/// Airtableテーブル名
pub const AIRTABLE_TABLE_NAME: &str = "selenium_extracted_data";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_categories_not_empty() {
        assert_eq!(CATEGORIES_TO_PROCESS.len(), 3);
        assert!(CATEGORIES_TO_PROCESS.iter().all(|c| !c.is_empty()));
    }

    #[test]
    fn test_cookie_table_has_session_token() {
        assert!(COOKIES.iter().any(|(name, _)| *name == "session-token"));
    }
}
