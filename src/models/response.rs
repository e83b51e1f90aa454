//! JSON envelopes shared by every endpoint.
//!
//! Success and failure bodies both use [`ApiResponse`]:
//! `{"code": "<http status>", "description": "...", "responseData": ...}`.

use actix_web::http::StatusCode;
use serde::{Deserialize, Serialize};

use super::page::Slice;

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiResponse<T> {
    pub code: String,
    pub description: String,
    pub response_data: Option<T>,
}

impl<T> ApiResponse<T> {
    pub fn new(status: StatusCode, description: impl Into<String>, data: Option<T>) -> Self {
        Self {
            code: status.as_u16().to_string(),
            description: description.into(),
            response_data: data,
        }
    }

    /// A `"Successful"` envelope for the given status.
    pub fn success(status: StatusCode, data: T) -> Self {
        Self::new(status, "Successful", Some(data))
    }
}

impl ApiResponse<()> {
    /// An envelope with `responseData: null`.
    pub fn empty(status: StatusCode, description: impl Into<String>) -> Self {
        Self::new(status, description, None)
    }
}

/// A page of results as returned to clients.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Paginated<T> {
    pub content: Vec<T>,
    pub page_num: u32,
    pub page_size: u32,
    /// Number of items on this page.
    pub total_element: usize,
    /// `true` when no further page exists.
    pub last: bool,
}

impl<T> From<Slice<T>> for Paginated<T> {
    fn from(slice: Slice<T>) -> Self {
        Self {
            total_element: slice.items.len(),
            content: slice.items,
            page_num: slice.page.page_num,
            page_size: slice.page.page_size,
            last: !slice.has_next,
        }
    }
}
