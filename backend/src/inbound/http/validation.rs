//! Shared validation helpers for inbound HTTP adapters.

use pagination::PageParams;
use serde_json::json;
use uuid::Uuid;

use crate::domain::Error;

/// Newtype wrapper for HTTP field names to provide type safety.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct FieldName(&'static str);

impl FieldName {
    pub(crate) const fn new(name: &'static str) -> Self {
        Self(name)
    }

    fn as_str(&self) -> &str {
        self.0
    }
}

pub(crate) fn invalid_field_error(field: FieldName, message: impl Into<String>, code: &str) -> Error {
    Error::invalid_request(message).with_details(json!({
        "field": field.as_str(),
        "code": code,
    }))
}

pub(crate) fn parse_uuid(value: &str, field: FieldName) -> Result<Uuid, Error> {
    Uuid::parse_str(value).map_err(|_| {
        invalid_field_error(
            field,
            format!("{} must be a valid UUID", field.as_str()),
            "invalid_uuid",
        )
    })
}

/// Resolve `page`/`limit` query values against the documented defaults.
pub(crate) fn page_params(page: Option<u32>, limit: Option<u32>) -> Result<PageParams, Error> {
    PageParams::resolve(page, limit).map_err(|err| {
        Error::invalid_request(err.to_string())
            .with_details(json!({ "code": "invalid_pagination" }))
    })
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use crate::domain::ErrorCode;

    use super::*;

    #[rstest]
    fn uuids_parse_or_carry_field_details() {
        let field = FieldName::new("courseId");
        assert!(parse_uuid("3fa85f64-5717-4562-b3fc-2c963f66afa6", field).is_ok());

        let err = parse_uuid("nope", field).expect_err("invalid uuid must fail");
        assert_eq!(err.code(), ErrorCode::InvalidRequest);
        let details = err.details().expect("details present");
        assert_eq!(
            details.get("field").and_then(serde_json::Value::as_str),
            Some("courseId")
        );
    }

    #[rstest]
    fn zero_limits_are_rejected() {
        assert!(page_params(Some(1), Some(0)).is_err());
        assert!(page_params(None, None).is_ok());
    }
}
