//! Last-import watermark
//!
//! A single-line ISO date file recording the last successfully ingested
//! day. Only written once a run completes, so a crashed run resumes from
//! the last confirmed date.

use crate::error::Result;
use crate::store::blob::BlobStore;
use chrono::NaiveDate;
use std::sync::Arc;
use tracing::warn;

/// Reader/writer for the watermark file
pub struct Watermark {
    store: Arc<dyn BlobStore>,
    filename: String,
}

impl Watermark {
    pub fn new(store: Arc<dyn BlobStore>, filename: String) -> Self {
        Self { store, filename }
    }

    /// Last confirmed import date, if any run has completed before.
    /// An unreadable or corrupt file counts as "never imported".
    pub fn load(&self) -> Option<NaiveDate> {
        if !self.store.exists(&self.filename) {
            return None;
        }

        let bytes = match self.store.get(&self.filename) {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!("Watermark read failed: {}", e);
                return None;
            }
        };

        let text = String::from_utf8_lossy(&bytes);
        match text.trim().parse::<NaiveDate>() {
            Ok(date) => Some(date),
            Err(e) => {
                warn!("Watermark file is corrupt ({}): {}", text.trim(), e);
                None
            }
        }
    }

    /// Persist `date` as the new watermark.
    pub fn save(&self, date: NaiveDate) -> Result<()> {
        self.store
            .put(&self.filename, date.to_string().as_bytes())
    }
}
