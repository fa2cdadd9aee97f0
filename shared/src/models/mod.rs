//! Data models
//!
//! Shared between gse-server and frontend (via API).
//! DB row types use `#[cfg_attr(feature = "db", derive(sqlx::FromRow))]`.
//! All IDs are UUID strings; timestamps are Unix millis; calendar dates are
//! `YYYY-MM-DD` strings.

/// Unknown value for one of the closed vocabularies below
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {kind}: {value:?}")]
pub struct UnknownVariant {
    pub kind: &'static str,
    pub value: String,
}

impl UnknownVariant {
    pub fn new(kind: &'static str, value: &str) -> Self {
        Self {
            kind,
            value: value.to_string(),
        }
    }
}

/// Lenient parsing for closed vocabularies.
///
/// Every spelling the frontend or older data may carry is folded through
/// [`crate::util::vocab_key`] and matched against the listed keys. Serde
/// deserialization goes through the same path (`#[serde(try_from = "String")]`).
macro_rules! lenient_vocab {
    ($ty:ident, $kind:literal, { $($variant:ident => [$($key:literal),+ $(,)?]),+ $(,)? }) => {
        impl std::str::FromStr for $ty {
            type Err = $crate::models::UnknownVariant;

            fn from_str(raw: &str) -> Result<Self, Self::Err> {
                match $crate::util::vocab_key(raw).as_str() {
                    $($($key)|+ => Ok(Self::$variant),)+
                    _ => Err($crate::models::UnknownVariant::new($kind, raw)),
                }
            }
        }

        impl TryFrom<String> for $ty {
            type Error = $crate::models::UnknownVariant;

            fn try_from(raw: String) -> Result<Self, Self::Error> {
                raw.parse()
            }
        }
    };
}

pub mod attendance;
pub mod audit;
pub mod auth;
pub mod holiday;
pub mod page;
pub mod request;
pub mod settings;
pub mod teacher;

// Re-exports
pub use attendance::*;
pub use audit::*;
pub use auth::*;
pub use holiday::*;
pub use page::*;
pub use request::*;
pub use settings::*;
pub use teacher::*;
