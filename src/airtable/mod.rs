//! Airtable アップサートシンクモジュール

mod client;
mod types;

pub use client::{AirtableClient, UPSERT_KEY_FIELD};
pub use types::{AirtableRecord, RecordPage};
