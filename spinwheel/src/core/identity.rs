//! Participant identity and contact name validation
//!
//! A participant is identified solely by a normalized phone number: digits
//! only, prefixed with the `55` country code. The same normalization is
//! applied by every operation, so the normalized form is the canonical key
//! for spins, claims and contacts alike.

use super::WheelError;
use std::fmt;

/// Country code prepended to national numbers
pub const COUNTRY_CODE: &str = "55";

const MIN_NATIONAL_DIGITS: usize = 10;
const MAX_NATIONAL_DIGITS: usize = 11;

const MIN_NAME_CHARS: usize = 2;
const MAX_NAME_CHARS: usize = 60;

/// A normalized, country-code-prefixed phone number
///
/// # Example
///
/// ```
/// use spinwheel::Identity;
///
/// let identity = Identity::parse("(21) 99999-8888").unwrap();
/// assert_eq!(identity.as_str(), "5521999998888");
///
/// // Normalization is idempotent
/// let again = Identity::parse(identity.as_str()).unwrap();
/// assert_eq!(identity, again);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Identity(String);

impl Identity {
    /// Normalize a raw phone number into an identity
    ///
    /// All non-digit characters are stripped. Ten or eleven digits are a
    /// national number and receive the country code; twelve or thirteen
    /// digits must already carry it. Anything else is rejected.
    ///
    /// # Errors
    ///
    /// [`WheelError::InvalidIdentity`] when the digits do not form a valid
    /// national or international number.
    pub fn parse(raw: &str) -> Result<Self, WheelError> {
        let digits: String = raw.chars().filter(char::is_ascii_digit).collect();

        let national = MIN_NATIONAL_DIGITS..=MAX_NATIONAL_DIGITS;
        let international =
            MIN_NATIONAL_DIGITS + COUNTRY_CODE.len()..=MAX_NATIONAL_DIGITS + COUNTRY_CODE.len();

        if national.contains(&digits.len()) {
            Ok(Identity(format!("{COUNTRY_CODE}{digits}")))
        } else if international.contains(&digits.len()) && digits.starts_with(COUNTRY_CODE) {
            Ok(Identity(digits))
        } else {
            Err(WheelError::InvalidIdentity(raw.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Identity {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Validate and trim a contact name
///
/// The trimmed name must hold between 2 and 60 characters.
pub fn normalize_name(raw: &str) -> Result<String, WheelError> {
    let trimmed = raw.trim();
    let len = trimmed.chars().count();
    if !(MIN_NAME_CHARS..=MAX_NAME_CHARS).contains(&len) {
        return Err(WheelError::InvalidName(len));
    }
    Ok(trimmed.to_string())
}
