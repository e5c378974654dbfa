//! Page-number pagination primitives shared by backend endpoints.
//!
//! Endpoints accept `page`/`limit` query parameters, slice an ordered
//! collection, and return a [`PageEnvelope`] describing where the slice sits
//! in the whole. Keeping the arithmetic here means every list endpoint
//! agrees on defaults, bounds, and the meaning of `totalPages`.

use serde::{Deserialize, Serialize};

/// Default page number when the client omits `page`.
pub const DEFAULT_PAGE: u32 = 1;
/// Default page size when the client omits `limit`.
pub const DEFAULT_LIMIT: u32 = 10;
/// Upper bound on page size accepted from clients.
pub const MAX_LIMIT: u32 = 50;

/// Validation failures for client-supplied pagination parameters.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PageParamsError {
    /// `page` was zero; pages are numbered from one.
    #[error("page must be at least 1")]
    PageOutOfRange,
    /// `limit` was zero or exceeded [`MAX_LIMIT`].
    #[error("limit must be between 1 and {MAX_LIMIT}")]
    LimitOutOfRange,
}

/// Validated pagination parameters.
///
/// ## Invariants
/// - `page >= 1`
/// - `1 <= limit <= MAX_LIMIT`
///
/// # Examples
/// ```
/// use pagination::PageParams;
///
/// let params = PageParams::try_new(2, 10)?;
/// assert_eq!(params.offset(), 10);
/// # Ok::<(), pagination::PageParamsError>(())
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageParams {
    page: u32,
    limit: u32,
}

impl PageParams {
    /// Validate explicit `page`/`limit` values.
    pub const fn try_new(page: u32, limit: u32) -> Result<Self, PageParamsError> {
        if page == 0 {
            return Err(PageParamsError::PageOutOfRange);
        }
        if limit == 0 || limit > MAX_LIMIT {
            return Err(PageParamsError::LimitOutOfRange);
        }
        Ok(Self { page, limit })
    }

    /// Resolve optional query parameters against the documented defaults.
    pub const fn resolve(page: Option<u32>, limit: Option<u32>) -> Result<Self, PageParamsError> {
        let page = match page {
            Some(value) => value,
            None => DEFAULT_PAGE,
        };
        let limit = match limit {
            Some(value) => value,
            None => DEFAULT_LIMIT,
        };
        Self::try_new(page, limit)
    }

    /// One-based page number.
    #[must_use]
    pub const fn page(&self) -> u32 {
        self.page
    }

    /// Maximum number of items on the page.
    #[must_use]
    pub const fn limit(&self) -> u32 {
        self.limit
    }

    /// Number of items preceding this page.
    #[must_use]
    pub const fn offset(&self) -> usize {
        ((self.page - 1) as usize).saturating_mul(self.limit as usize)
    }
}

impl Default for PageParams {
    fn default() -> Self {
        Self {
            page: DEFAULT_PAGE,
            limit: DEFAULT_LIMIT,
        }
    }
}

/// Position of a returned slice within the full collection.
///
/// Serialises with camelCase keys to match the JSON contract:
/// `{"page":1,"totalPages":2,"totalItems":15}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageEnvelope {
    /// Page number that was returned.
    pub page: u32,
    /// Total number of pages at the requested limit.
    pub total_pages: u64,
    /// Total number of items across all pages.
    pub total_items: u64,
}

impl PageEnvelope {
    /// Describe a page of a collection with `total_items` members.
    #[must_use]
    pub const fn describe(params: PageParams, total_items: u64) -> Self {
        Self {
            page: params.page,
            total_pages: total_items.div_ceil(params.limit as u64),
            total_items,
        }
    }
}

/// Take the window of `items` selected by `params`, consuming the input.
///
/// Out-of-range pages yield an empty window rather than an error so that
/// clients paging past the end see an empty list with an accurate envelope.
///
/// # Examples
/// ```
/// use pagination::{paginate, PageParams};
///
/// let params = PageParams::try_new(2, 10)?;
/// let (window, envelope) = paginate((0..15).collect::<Vec<_>>(), params);
/// assert_eq!(window, vec![10, 11, 12, 13, 14]);
/// assert_eq!(envelope.total_pages, 2);
/// # Ok::<(), pagination::PageParamsError>(())
/// ```
#[must_use]
pub fn paginate<T>(items: Vec<T>, params: PageParams) -> (Vec<T>, PageEnvelope) {
    let envelope = PageEnvelope::describe(params, items.len() as u64);
    let window = items
        .into_iter()
        .skip(params.offset())
        .take(params.limit as usize)
        .collect();
    (window, envelope)
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case(0, 10, PageParamsError::PageOutOfRange)]
    #[case(1, 0, PageParamsError::LimitOutOfRange)]
    #[case(1, MAX_LIMIT + 1, PageParamsError::LimitOutOfRange)]
    fn rejects_out_of_range_parameters(
        #[case] page: u32,
        #[case] limit: u32,
        #[case] expected: PageParamsError,
    ) {
        assert_eq!(PageParams::try_new(page, limit), Err(expected));
    }

    #[rstest]
    fn resolve_applies_defaults() -> Result<(), PageParamsError> {
        let params = PageParams::resolve(None, None)?;
        assert_eq!(params.page(), DEFAULT_PAGE);
        assert_eq!(params.limit(), DEFAULT_LIMIT);
        Ok(())
    }

    #[rstest]
    #[case(1, 10, 0)]
    #[case(2, 10, 10)]
    #[case(3, 25, 50)]
    fn offset_skips_preceding_pages(
        #[case] page: u32,
        #[case] limit: u32,
        #[case] expected: usize,
    ) -> Result<(), PageParamsError> {
        assert_eq!(PageParams::try_new(page, limit)?.offset(), expected);
        Ok(())
    }

    #[rstest]
    #[case(15, 10, 2)]
    #[case(20, 10, 2)]
    #[case(0, 10, 0)]
    #[case(1, 10, 1)]
    fn envelope_rounds_total_pages_up(
        #[case] total: u64,
        #[case] limit: u32,
        #[case] expected_pages: u64,
    ) -> Result<(), PageParamsError> {
        let envelope = PageEnvelope::describe(PageParams::try_new(1, limit)?, total);
        assert_eq!(envelope.total_pages, expected_pages);
        Ok(())
    }

    #[rstest]
    fn paginate_returns_partial_final_page() -> Result<(), PageParamsError> {
        let params = PageParams::try_new(2, 10)?;
        let (window, envelope) = paginate((0..15).collect::<Vec<_>>(), params);
        assert_eq!(window.len(), 5);
        assert_eq!(envelope.page, 2);
        assert_eq!(envelope.total_pages, 2);
        assert_eq!(envelope.total_items, 15);
        Ok(())
    }

    #[rstest]
    fn paginate_past_the_end_is_empty() -> Result<(), PageParamsError> {
        let params = PageParams::try_new(4, 10)?;
        let (window, envelope) = paginate((0..15).collect::<Vec<_>>(), params);
        assert!(window.is_empty());
        assert_eq!(envelope.total_pages, 2);
        Ok(())
    }

    #[rstest]
    fn envelope_serialises_camel_case() -> Result<(), PageParamsError> {
        let envelope = PageEnvelope::describe(PageParams::try_new(1, 10)?, 15);
        let json = serde_json::to_value(envelope).expect("envelope serialises");
        assert_eq!(
            json.get("totalPages").and_then(serde_json::Value::as_u64),
            Some(2)
        );
        assert_eq!(
            json.get("totalItems").and_then(serde_json::Value::as_u64),
            Some(15)
        );
        Ok(())
    }
}
