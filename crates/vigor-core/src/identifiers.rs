//! Validated identifier types used throughout the workspace.
//!
//! All identifiers follow the parse-don't-validate pattern: constructors
//! return `Result` instead of panicking, and a successfully constructed
//! identifier is guaranteed to be well-formed. Each identifier is a distinct
//! newtype so a `SessionId` can never be passed where a `UserId` is expected.
//!
//! # Validation Rules
//!
//! - Non-empty, maximum 128 characters
//! - No leading or trailing whitespace
//! - Only alphanumeric characters, hyphens (`-`), underscores (`_`), and dots (`.`)

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Maximum length accepted for any identifier.
pub const MAX_ID_LENGTH: usize = 128;

/// Errors produced when parsing an identifier.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IdError {
    #[error("identifier cannot be empty")]
    Empty,
    #[error("identifier too long: {length} characters (max {MAX_ID_LENGTH})")]
    TooLong { length: usize },
    #[error("identifier '{input}' contains invalid characters")]
    InvalidChars { input: String },
}

fn validate(input: &str) -> Result<(), IdError> {
    if input.is_empty() {
        return Err(IdError::Empty);
    }
    if input.len() > MAX_ID_LENGTH {
        return Err(IdError::TooLong {
            length: input.len(),
        });
    }
    let well_formed = input
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-' || c == '_' || c == '.');
    if !well_formed || input.trim() != input {
        return Err(IdError::InvalidChars {
            input: input.to_string(),
        });
    }
    Ok(())
}

macro_rules! string_id {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Parse a client-supplied identifier, validating its shape.
            pub fn parse(input: &str) -> Result<Self, IdError> {
                validate(input)?;
                Ok(Self(input.to_string()))
            }

            /// Generate a fresh random identifier.
            pub fn generate() -> Self {
                Self(Uuid::new_v4().to_string())
            }

            /// Get the identifier as a string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl std::str::FromStr for $name {
            type Err = IdError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::parse(s)
            }
        }
    };
}

string_id! {
    /// Identifier for one ongoing user engagement.
    ///
    /// Sessions may be opened explicitly or created transparently when a
    /// dispatch arrives with a previously unseen identifier.
    SessionId
}

string_id! {
    /// Identifier for a user whose long-lived profile is tracked in memory.
    UserId
}

/// Identifier for a single recorded interaction.
///
/// Always engine-generated; used to reject duplicate re-delivery of the
/// same interaction on retry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InteractionId(Uuid);

impl InteractionId {
    /// Generate a fresh interaction identifier.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Parse an interaction identifier from its canonical string form.
    pub fn parse(input: &str) -> Result<Self, IdError> {
        Uuid::parse_str(input)
            .map(Self)
            .map_err(|_| IdError::InvalidChars {
                input: input.to_string(),
            })
    }
}

impl Default for InteractionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for InteractionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
