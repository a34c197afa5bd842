//! Response envelopes shared by the account endpoints

use common::query::Page;
use serde::{Deserialize, Serialize};

/// A page of results with its pagination metadata
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageResponse<T> {
    /// The items in this page
    pub items: Vec<T>,
    /// Zero-based page number
    pub page_number: u32,
    /// Requested page size
    pub page_size: u32,
    /// Number of records matching the query
    pub total_count: u64,
    /// Number of pages at this page size
    pub total_pages: u64,
}

impl<T> From<Page<T>> for PageResponse<T> {
    fn from(page: Page<T>) -> Self {
        let total_pages = page.total_pages();
        Self {
            items: page.items,
            page_number: page.page_number,
            page_size: page.page_size,
            total_count: page.total_count,
            total_pages,
        }
    }
}

/// Minimal liveness body
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
}
