//! Authentication primitives: credentials, registration payloads, hashing.
//!
//! Keep inbound payload parsing outside the domain by exposing constructors
//! that validate string inputs before a handler talks to a port or service.
//! Credential hashing uses Argon2id and stores PHC-formatted strings.

use std::fmt;

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash as PhcHash, SaltString};
use argon2::{Argon2, PasswordHasher as _, PasswordVerifier as _};
use zeroize::Zeroizing;

use super::user::{AccountType, DisplayName, EmailAddress, PasswordHash, UserValidationError};

/// Minimum accepted password length in characters.
pub const PASSWORD_MIN: usize = 8;

/// Domain error returned when login or registration payload values are invalid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthValidationError {
    /// Email failed address validation.
    Email(UserValidationError),
    /// Password was blank.
    EmptyPassword,
    /// Password was shorter than [`PASSWORD_MIN`].
    PasswordTooShort {
        /// Minimum accepted length.
        min: usize,
    },
    /// Display name failed validation.
    DisplayName(UserValidationError),
    /// Requested role is not self-assignable.
    ReservedAccountType,
    /// Account type string did not match a known role.
    AccountType(UserValidationError),
}

impl fmt::Display for AuthValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Email(err) | Self::DisplayName(err) | Self::AccountType(err) => err.fmt(f),
            Self::EmptyPassword => write!(f, "password must not be empty"),
            Self::PasswordTooShort { min } => {
                write!(f, "password must be at least {min} characters")
            }
            Self::ReservedAccountType => write!(f, "the admin role cannot be self-assigned"),
        }
    }
}

impl std::error::Error for AuthValidationError {}

/// Validated login credentials used by the account service.
///
/// ## Invariants
/// - `email` is normalised by [`EmailAddress`];
/// - `password` is non-empty and retains caller-provided whitespace to avoid
///   surprising credential comparisons.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginCredentials {
    email: EmailAddress,
    password: Zeroizing<String>,
}

impl LoginCredentials {
    /// Construct credentials from raw email/password inputs.
    pub fn try_from_parts(email: &str, password: &str) -> Result<Self, AuthValidationError> {
        let email = EmailAddress::new(email).map_err(AuthValidationError::Email)?;
        if password.is_empty() {
            return Err(AuthValidationError::EmptyPassword);
        }
        Ok(Self {
            email,
            password: Zeroizing::new(password.to_owned()),
        })
    }

    /// Normalised email for user lookups.
    #[must_use]
    pub const fn email(&self) -> &EmailAddress {
        &self.email
    }

    /// Password string provided by the caller.
    #[must_use]
    pub fn password(&self) -> &str {
        self.password.as_str()
    }
}

/// Validated registration payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistrationRequest {
    email: EmailAddress,
    password: Zeroizing<String>,
    display_name: DisplayName,
    account_type: AccountType,
}

impl RegistrationRequest {
    /// Validate the raw registration fields.
    ///
    /// The admin role is provisioned out of band and cannot be requested at
    /// registration time.
    pub fn try_from_parts(
        email: &str,
        password: &str,
        display_name: &str,
        account_type: &str,
    ) -> Result<Self, AuthValidationError> {
        let email = EmailAddress::new(email).map_err(AuthValidationError::Email)?;
        if password.is_empty() {
            return Err(AuthValidationError::EmptyPassword);
        }
        if password.chars().count() < PASSWORD_MIN {
            return Err(AuthValidationError::PasswordTooShort { min: PASSWORD_MIN });
        }
        let display_name =
            DisplayName::new(display_name).map_err(AuthValidationError::DisplayName)?;
        let account_type =
            AccountType::parse(account_type).map_err(AuthValidationError::AccountType)?;
        if account_type.is_admin() {
            return Err(AuthValidationError::ReservedAccountType);
        }
        Ok(Self {
            email,
            password: Zeroizing::new(password.to_owned()),
            display_name,
            account_type,
        })
    }

    /// Normalised email.
    #[must_use]
    pub const fn email(&self) -> &EmailAddress {
        &self.email
    }

    /// Raw password awaiting hashing.
    #[must_use]
    pub fn password(&self) -> &str {
        self.password.as_str()
    }

    /// Validated display name.
    #[must_use]
    pub const fn display_name(&self) -> &DisplayName {
        &self.display_name
    }

    /// Requested account role.
    #[must_use]
    pub const fn account_type(&self) -> AccountType {
        self.account_type
    }
}

/// Failure while producing a credential hash.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("credential hashing failed: {message}")]
pub struct PasswordHashingError {
    message: String,
}

/// Hash a password with Argon2id and a fresh random salt.
pub fn hash_password(password: &str) -> Result<PasswordHash, PasswordHashingError> {
    let salt = SaltString::generate(&mut OsRng);
    let hashed = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|err| PasswordHashingError {
            message: err.to_string(),
        })?;
    PasswordHash::new(hashed.to_string()).map_err(|err| PasswordHashingError {
        message: err.to_string(),
    })
}

/// Verify a candidate password against a stored hash.
///
/// Malformed stored hashes verify as false rather than erroring; a corrupt
/// credential row must never authenticate anyone.
#[must_use]
pub fn verify_password(hash: &PasswordHash, candidate: &str) -> bool {
    let Ok(parsed) = PhcHash::new(hash.as_str()) else {
        return false;
    };
    Argon2::default()
        .verify_password(candidate.as_bytes(), &parsed)
        .is_ok()
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case("", "pw", AuthValidationError::Email(UserValidationError::EmptyEmail))]
    #[case("user@example.com", "", AuthValidationError::EmptyPassword)]
    fn invalid_credentials(
        #[case] email: &str,
        #[case] password: &str,
        #[case] expected: AuthValidationError,
    ) {
        let err = LoginCredentials::try_from_parts(email, password)
            .expect_err("invalid inputs must fail");
        assert_eq!(err, expected);
    }

    #[rstest]
    fn credentials_normalise_email_but_not_password() {
        let creds = LoginCredentials::try_from_parts("  Ada@Example.COM ", " secret ")
            .expect("valid credentials");
        assert_eq!(creds.email().as_str(), "ada@example.com");
        assert_eq!(creds.password(), " secret ");
    }

    #[rstest]
    fn registration_rejects_short_passwords() {
        let err = RegistrationRequest::try_from_parts("a@b.co", "short", "Ada", "student")
            .expect_err("short password must fail");
        assert_eq!(
            err,
            AuthValidationError::PasswordTooShort { min: PASSWORD_MIN }
        );
    }

    #[rstest]
    fn registration_rejects_admin_role() {
        let err =
            RegistrationRequest::try_from_parts("a@b.co", "long enough", "Ada", "admin")
                .expect_err("admin must not be self-assignable");
        assert_eq!(err, AuthValidationError::ReservedAccountType);
    }

    #[rstest]
    fn hashing_round_trips_and_rejects_wrong_password() {
        let hash = hash_password("correct horse battery staple").expect("hashing succeeds");
        assert!(hash.as_str().starts_with("$argon2"));
        assert!(verify_password(&hash, "correct horse battery staple"));
        assert!(!verify_password(&hash, "wrong password"));
    }

    #[rstest]
    fn corrupt_stored_hash_never_verifies() {
        let hash = PasswordHash::new("$not-a-real-phc-string").expect("constructor only checks prefix");
        assert!(!verify_password(&hash, "anything"));
    }
}
