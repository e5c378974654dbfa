//! Admin back-office handlers.
//!
//! Every route below `/api/admin` requires [`AccountType::Admin`] and returns
//! `403 Forbidden` otherwise. Listings take `page`/`limit` plus
//! entity-appropriate search and filter query parameters and return a
//! [`PagedResponse`] envelope.
//!
//! [`AccountType::Admin`]: crate::domain::AccountType::Admin

use pagination::{PageEnvelope, PageParams};
use serde::Serialize;

pub mod learning;
pub mod marketplace;
pub mod outreach;
pub mod users;

/// Paged listing envelope shared by the admin endpoints.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PagedResponse<T> {
    /// The requested page of items.
    pub items: Vec<T>,
    /// Where the page sits in the full collection.
    pub pagination: PageEnvelope,
}

impl<T> PagedResponse<T> {
    pub(crate) const fn new(items: Vec<T>, params: PageParams, total: u64) -> Self {
        Self {
            items,
            pagination: PageEnvelope::describe(params, total),
        }
    }
}
