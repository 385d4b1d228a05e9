//! Macro for implementing Display and FromStr for status enums
//!
//! Persisted status columns store the canonical string of each variant. The
//! macro keeps `Display` and `FromStr` in sync so a value written by one is
//! always accepted by the other.
//!
//! # Example
//!
//! ```rust
//! use medalarm_domain::impl_domain_status_conversions;
//!
//! #[derive(Debug, Clone, Copy, PartialEq, Eq)]
//! pub enum RefillState {
//!     Requested,
//!     Collected,
//! }
//!
//! impl_domain_status_conversions!(RefillState {
//!     Requested => "REQUESTED",
//!     Collected => "COLLECTED",
//! });
//!
//! assert_eq!(RefillState::Collected.to_string(), "COLLECTED");
//! assert_eq!("requested".parse::<RefillState>(), Ok(RefillState::Requested));
//! ```

/// Implements Display and FromStr traits for status enums
///
/// This macro generates:
/// - Display trait: writes the canonical string exactly as declared
/// - FromStr trait: matches the canonical string ignoring ASCII case
///
/// # Arguments
///
/// * `$enum_name` - The name of the enum type
/// * `$variant => $str` - Mapping of enum variants to their canonical string
#[macro_export]
macro_rules! impl_domain_status_conversions {
    ($enum_name:ident { $($variant:ident => $str:expr),+ $(,)? }) => {
        impl $enum_name {
            /// Canonical string stored for this variant.
            pub const fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $str,)+
                }
            }
        }

        impl std::fmt::Display for $enum_name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $enum_name {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                $(
                    if s.eq_ignore_ascii_case($str) {
                        return Ok(Self::$variant);
                    }
                )+
                Err(format!("Invalid {}: {}", stringify!($enum_name), s))
            }
        }
    };
}
