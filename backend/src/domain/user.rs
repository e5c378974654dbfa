//! User account aggregate and its validated field types.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// Validation errors returned by the account constructors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserValidationError {
    /// Identifier was empty or not a UUID.
    InvalidId,
    /// Email was empty after trimming.
    EmptyEmail,
    /// Email was not of the form `local@domain.tld`.
    InvalidEmail,
    /// Display name was empty after trimming.
    EmptyDisplayName,
    /// Display name exceeded the maximum length.
    DisplayNameTooLong {
        /// Maximum accepted length in characters.
        max: usize,
    },
    /// Account type string did not match a known role.
    UnknownAccountType,
    /// Stored credential hash was not a PHC-formatted string.
    InvalidPasswordHash,
}

impl fmt::Display for UserValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidId => write!(f, "user id must be a valid UUID"),
            Self::EmptyEmail => write!(f, "email must not be empty"),
            Self::InvalidEmail => write!(f, "email must be a valid address"),
            Self::EmptyDisplayName => write!(f, "display name must not be empty"),
            Self::DisplayNameTooLong { max } => {
                write!(f, "display name must be at most {max} characters")
            }
            Self::UnknownAccountType => write!(
                f,
                "account type must be one of student, professional, business, agency, admin",
            ),
            Self::InvalidPasswordHash => write!(f, "password hash must be a PHC string"),
        }
    }
}

impl std::error::Error for UserValidationError {}

/// Stable user identifier stored as a UUID.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(transparent)]
pub struct UserId(Uuid);

impl UserId {
    /// Validate and construct a [`UserId`] from string input.
    pub fn new(id: impl AsRef<str>) -> Result<Self, UserValidationError> {
        let raw = id.as_ref();
        if raw.trim() != raw {
            return Err(UserValidationError::InvalidId);
        }
        Uuid::parse_str(raw)
            .map(Self)
            .map_err(|_| UserValidationError::InvalidId)
    }

    /// Wrap an already-parsed UUID.
    #[must_use]
    pub const fn from_uuid(id: Uuid) -> Self {
        Self(id)
    }

    /// Generate a new random [`UserId`].
    #[must_use]
    pub fn random() -> Self {
        Self(Uuid::new_v4())
    }

    /// Access the underlying UUID.
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Account role controlling dashboard shape and admin access.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum AccountType {
    /// Course-taking learner.
    Student,
    /// Individual practitioner.
    Professional,
    /// Company account.
    Business,
    /// Agency account managing client work.
    Agency,
    /// Back-office administrator.
    Admin,
}

impl AccountType {
    /// Parse the wire representation of a role.
    pub fn parse(value: &str) -> Result<Self, UserValidationError> {
        match value {
            "student" => Ok(Self::Student),
            "professional" => Ok(Self::Professional),
            "business" => Ok(Self::Business),
            "agency" => Ok(Self::Agency),
            "admin" => Ok(Self::Admin),
            _ => Err(UserValidationError::UnknownAccountType),
        }
    }

    /// Wire representation of the role.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Student => "student",
            Self::Professional => "professional",
            Self::Business => "business",
            Self::Agency => "agency",
            Self::Admin => "admin",
        }
    }

    /// Whether the role grants access to the admin back-office.
    #[must_use]
    pub const fn is_admin(self) -> bool {
        matches!(self, Self::Admin)
    }
}

impl fmt::Display for AccountType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Email address normalised to lower case.
///
/// ## Invariants
/// - trimmed, non-empty, lower-cased on construction;
/// - contains exactly one `@` with a non-empty local part and a domain
///   containing at least one dot.
///
/// Normalising here is what makes duplicate-registration checks and
/// guest-enrollment auto-linking case-insensitive.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(try_from = "String", into = "String")]
pub struct EmailAddress(String);

impl EmailAddress {
    /// Validate and normalise an email address.
    pub fn new(value: impl AsRef<str>) -> Result<Self, UserValidationError> {
        let trimmed = value.as_ref().trim();
        if trimmed.is_empty() {
            return Err(UserValidationError::EmptyEmail);
        }
        let normalised = trimmed.to_lowercase();
        let mut parts = normalised.splitn(2, '@');
        let local = parts.next().unwrap_or_default();
        let Some(domain) = parts.next() else {
            return Err(UserValidationError::InvalidEmail);
        };
        if local.is_empty() || domain.is_empty() || !domain.contains('.') || domain.contains('@') {
            return Err(UserValidationError::InvalidEmail);
        }
        if normalised.chars().any(char::is_whitespace) {
            return Err(UserValidationError::InvalidEmail);
        }
        Ok(Self(normalised))
    }

    /// Borrow the normalised address.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for EmailAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<EmailAddress> for String {
    fn from(value: EmailAddress) -> Self {
        value.0
    }
}

impl TryFrom<String> for EmailAddress {
    type Error = UserValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// Maximum allowed length for a display name.
pub const DISPLAY_NAME_MAX: usize = 80;

/// Human readable display name for the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(try_from = "String", into = "String")]
pub struct DisplayName(String);

impl DisplayName {
    /// Validate and construct a [`DisplayName`].
    pub fn new(value: impl Into<String>) -> Result<Self, UserValidationError> {
        let value = value.into();
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(UserValidationError::EmptyDisplayName);
        }
        if trimmed.chars().count() > DISPLAY_NAME_MAX {
            return Err(UserValidationError::DisplayNameTooLong {
                max: DISPLAY_NAME_MAX,
            });
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// Borrow the underlying name.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for DisplayName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<DisplayName> for String {
    fn from(value: DisplayName) -> Self {
        value.0
    }
}

impl TryFrom<String> for DisplayName {
    type Error = UserValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// Stored credential hash in PHC string format (`$argon2id$...`).
#[derive(Clone, PartialEq, Eq)]
pub struct PasswordHash(String);

impl PasswordHash {
    /// Accept an existing PHC-formatted hash.
    pub fn new(value: impl Into<String>) -> Result<Self, UserValidationError> {
        let value = value.into();
        if !value.starts_with('$') {
            return Err(UserValidationError::InvalidPasswordHash);
        }
        Ok(Self(value))
    }

    /// Borrow the PHC string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Debug for PasswordHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Hashes are not secrets, but keeping them out of logs costs nothing.
        f.write_str("PasswordHash(..)")
    }
}

/// A registered account.
#[derive(Debug, Clone, PartialEq)]
pub struct User {
    /// Stable identifier.
    pub id: UserId,
    /// Normalised login email.
    pub email: EmailAddress,
    /// Stored credential hash.
    pub password_hash: PasswordHash,
    /// Public display name.
    pub display_name: DisplayName,
    /// Account role.
    pub account_type: AccountType,
    /// Short profile headline.
    pub headline: Option<String>,
    /// Longer profile biography.
    pub bio: Option<String>,
    /// Relative path of the stored avatar image, if any.
    pub avatar_path: Option<String>,
    /// Soft-delete flag; deactivated accounts cannot authenticate.
    pub is_active: bool,
    /// Email verification flag.
    pub is_verified: bool,
    /// Registration timestamp.
    pub created_at: DateTime<Utc>,
}

impl User {
    /// Public summary used when embedding an author in a response.
    #[must_use]
    pub fn summary(&self) -> UserSummary {
        UserSummary {
            id: self.id,
            display_name: self.display_name.clone(),
            account_type: self.account_type,
            headline: self.headline.clone(),
            avatar_path: self.avatar_path.clone(),
        }
    }
}

/// Public author/commenter summary embedded in feed responses.
#[derive(Debug, Clone, PartialEq)]
pub struct UserSummary {
    /// Stable identifier.
    pub id: UserId,
    /// Public display name.
    pub display_name: DisplayName,
    /// Account role.
    pub account_type: AccountType,
    /// Short profile headline.
    pub headline: Option<String>,
    /// Relative path of the stored avatar image, if any.
    pub avatar_path: Option<String>,
}

/// Partial profile update applied by `PUT /auth/profile`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProfileUpdate {
    /// Replacement display name, when present.
    pub display_name: Option<DisplayName>,
    /// Replacement headline, when present.
    pub headline: Option<String>,
    /// Replacement biography, when present.
    pub bio: Option<String>,
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case("Ada@Example.COM", "ada@example.com")]
    #[case("  mixed.Case@Domain.Org  ", "mixed.case@domain.org")]
    fn emails_normalise_to_lower_case(#[case] input: &str, #[case] expected: &str) {
        let email = EmailAddress::new(input).expect("valid email");
        assert_eq!(email.as_str(), expected);
    }

    #[rstest]
    #[case("")]
    #[case("no-at-sign")]
    #[case("@missing-local.com")]
    #[case("missing-domain@")]
    #[case("no-dot@domain")]
    #[case("two words@domain.com")]
    fn invalid_emails_are_rejected(#[case] input: &str) {
        assert!(EmailAddress::new(input).is_err());
    }

    #[rstest]
    #[case("student", AccountType::Student)]
    #[case("agency", AccountType::Agency)]
    #[case("admin", AccountType::Admin)]
    fn account_types_parse_round_trip(#[case] raw: &str, #[case] expected: AccountType) {
        let parsed = AccountType::parse(raw).expect("known role");
        assert_eq!(parsed, expected);
        assert_eq!(parsed.as_str(), raw);
    }

    #[rstest]
    fn unknown_account_type_is_rejected() {
        assert_eq!(
            AccountType::parse("superuser"),
            Err(UserValidationError::UnknownAccountType)
        );
    }

    #[rstest]
    fn only_admin_reaches_the_back_office() {
        assert!(AccountType::Admin.is_admin());
        assert!(!AccountType::Business.is_admin());
    }

    #[rstest]
    fn display_name_is_trimmed_and_bounded() {
        let name = DisplayName::new("  Ada Lovelace  ").expect("valid name");
        assert_eq!(name.as_str(), "Ada Lovelace");

        let too_long = "x".repeat(DISPLAY_NAME_MAX + 1);
        assert_eq!(
            DisplayName::new(too_long),
            Err(UserValidationError::DisplayNameTooLong {
                max: DISPLAY_NAME_MAX
            })
        );
    }

    #[rstest]
    fn password_hash_requires_phc_format() {
        assert!(PasswordHash::new("$argon2id$v=19$m=19456,t=2,p=1$abc$def").is_ok());
        assert_eq!(
            PasswordHash::new("plaintext"),
            Err(UserValidationError::InvalidPasswordHash)
        );
    }

    #[rstest]
    fn user_id_rejects_non_uuid_input() {
        assert!(UserId::new("not-a-uuid").is_err());
        assert!(UserId::new(" 3fa85f64-5717-4562-b3fc-2c963f66afa6").is_err());
        assert!(UserId::new("3fa85f64-5717-4562-b3fc-2c963f66afa6").is_ok());
    }
}
