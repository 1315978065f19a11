//! クロール状態とレポートの型定義

use chrono::{DateTime, Utc};
use serde::Serialize;

/// プロセス全体のクロール状態
///
/// グローバルに持たず、カテゴリループとページコントローラに
/// 明示的に引き回す。カウンタは累積。
#[derive(Debug, Clone, Default)]
pub struct CrawlSession {
    /// 現在のカテゴリ番号（0始まり）
    pub category_index: usize,
    /// 現在のページ番号（カテゴリごとに1から）
    pub page_number: u32,
    pub cards_seen: u64,
    pub records_upserted: u64,
    pub records_failed: u64,
    pub categories_skipped: u64,
}

impl CrawlSession {
    pub fn start_category(&mut self, index: usize) {
        self.category_index = index;
        self.page_number = 1;
    }

    pub fn next_page(&mut self) {
        self.page_number += 1;
    }

    pub fn record_card(&mut self) {
        self.cards_seen += 1;
    }

    pub fn record_upsert(&mut self) {
        self.records_upserted += 1;
    }

    pub fn record_failure(&mut self) {
        self.records_failed += 1;
    }

    pub fn record_category_skip(&mut self) {
        self.categories_skipped += 1;
    }

    pub fn into_report(
        self,
        categories_total: usize,
        started_at: DateTime<Utc>,
        finished_at: DateTime<Utc>,
    ) -> CrawlReport {
        CrawlReport {
            categories_total,
            categories_skipped: self.categories_skipped,
            cards_seen: self.cards_seen,
            records_upserted: self.records_upserted,
            records_failed: self.records_failed,
            started_at,
            finished_at,
        }
    }
}

/// クロール結果サマリ
#[derive(Debug, Clone, Serialize)]
pub struct CrawlReport {
    pub categories_total: usize,
    pub categories_skipped: u64,
    pub cards_seen: u64,
    pub records_upserted: u64,
    pub records_failed: u64,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_start_category_resets_page_number() {
        let mut session = CrawlSession::default();
        session.start_category(0);
        session.next_page();
        session.next_page();
        assert_eq!(session.page_number, 3);

        session.start_category(1);
        assert_eq!(session.category_index, 1);
        assert_eq!(session.page_number, 1);
    }

    #[test]
    fn test_one_skip_among_n_categories() {
        // カテゴリ5件中1件だけ検索フィールド再取得に失敗するケース
        let mut session = CrawlSession::default();
        let mut processed = 0;
        for index in 0..5 {
            session.start_category(index);
            if index == 2 {
                session.record_category_skip();
                continue;
            }
            processed += 1;
        }

        assert_eq!(processed, 4);
        assert_eq!(session.categories_skipped, 1);
    }

    #[test]
    fn test_counters_accumulate_across_categories() {
        let mut session = CrawlSession::default();
        session.start_category(0);
        session.record_card();
        session.record_upsert();
        session.start_category(1);
        session.record_card();
        session.record_failure();

        assert_eq!(session.cards_seen, 2);
        assert_eq!(session.records_upserted, 1);
        assert_eq!(session.records_failed, 1);
    }

    #[test]
    fn test_report_carries_counters() {
        let mut session = CrawlSession::default();
        session.record_card();
        session.record_upsert();
        session.record_category_skip();

        let started = Utc::now();
        let finished = Utc::now();
        let report = session.into_report(3, started, finished);

        assert_eq!(report.categories_total, 3);
        assert_eq!(report.categories_skipped, 1);
        assert_eq!(report.cards_seen, 1);
        assert_eq!(report.records_upserted, 1);
        assert_eq!(report.records_failed, 0);
    }
}
