//! Pickup code value object and generator.
//!
//! A pickup code is a six-digit, zero-padded numeric string that a recipient
//! presents when collecting a parcel. Codes are unique among the codes that
//! have not yet expired; uniqueness is checked against an external lookup
//! supplied by the caller.

use std::future::Future;

use chrono::Duration;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::domain::foundation::{DomainError, FulfillmentError, Timestamp, ValidationError};

/// Number of digits in a pickup code.
pub const PICKUP_CODE_LENGTH: usize = 6;

/// Size of the code space (`000000`..=`999999`).
const CODE_SPACE: u32 = 1_000_000;

/// Recommended bound for unique generation.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 100;

/// Returns true if `code` is exactly six ASCII digits.
///
/// Pure predicate, safe to call before any lookup. Surrounding whitespace
/// is not trimmed.
pub fn is_valid_pickup_code(code: &str) -> bool {
    code.len() == PICKUP_CODE_LENGTH && code.bytes().all(|b| b.is_ascii_digit())
}

/// A well-formed pickup code.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PickupCode(String);

impl PickupCode {
    /// Parses a code, rejecting anything but six ASCII digits.
    pub fn parse(code: &str) -> Result<Self, ValidationError> {
        if !is_valid_pickup_code(code) {
            return Err(ValidationError::invalid_format(
                "pickup_code",
                format!("expected {} digits", PICKUP_CODE_LENGTH),
            ));
        }
        Ok(Self(code.to_string()))
    }

    /// Draws a uniformly random code from the thread-local RNG.
    pub fn generate() -> Self {
        Self::generate_with(&mut rand::thread_rng())
    }

    /// Draws a uniformly random code from `rng`.
    pub fn generate_with<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let n = rng.gen_range(0..CODE_SPACE);
        Self(format!("{:0width$}", n, width = PICKUP_CODE_LENGTH))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for PickupCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<String> for PickupCode {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<PickupCode> for String {
    fn from(code: PickupCode) -> Self {
        code.0
    }
}

/// Generates codes that the supplied existence check reports as free.
#[derive(Debug, Clone, Copy)]
pub struct PickupCodeGenerator {
    max_attempts: u32,
}

impl PickupCodeGenerator {
    pub fn new(max_attempts: u32) -> Self {
        Self { max_attempts }
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Generates codes until `exists` reports one as free.
    ///
    /// # Errors
    ///
    /// - `CodeSpaceExhausted` once `max_attempts` codes were all taken
    /// - `Infrastructure` if the lookup itself fails
    pub async fn generate_unique<F, Fut>(&self, mut exists: F) -> Result<PickupCode, FulfillmentError>
    where
        F: FnMut(PickupCode) -> Fut,
        Fut: Future<Output = Result<bool, DomainError>>,
    {
        for _ in 0..self.max_attempts {
            let candidate = PickupCode::generate();
            if !exists(candidate.clone()).await? {
                return Ok(candidate);
            }
        }

        Err(FulfillmentError::CodeSpaceExhausted {
            attempts: self.max_attempts,
        })
    }
}

impl Default for PickupCodeGenerator {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_ATTEMPTS)
    }
}

/// A minted code with its validity window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PickupGrant {
    pub code: PickupCode,
    pub generated_at: Timestamp,
    pub expires_at: Timestamp,
}

impl PickupGrant {
    /// Issues `code` at `now`, valid for `ttl`.
    pub fn issue(code: PickupCode, now: Timestamp, ttl: Duration) -> Self {
        Self {
            code,
            generated_at: now,
            expires_at: now.plus(ttl),
        }
    }

    /// A code is invalid once `now` is strictly after its expiry.
    ///
    /// Verification does not consume the code.
    pub fn is_expired_at(&self, now: &Timestamp) -> bool {
        now.is_after(&self.expires_at)
    }
}
