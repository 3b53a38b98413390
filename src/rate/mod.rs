//! Transfer throttling.
//!
//! # Data Flow
//! ```text
//! operator rate string ("low", "10MB", "unlimited", ...)
//!     → parse_rate (normalize & classify)
//!     → RateLimit descriptor (rate + burst)
//!     → bucket.rs (token bucket on the byte-transfer path)
//! ```
//!
//! # Design Decisions
//! - Rate strings are free-form operator input; parse failures are reported
//!   as values and callers downgrade to unlimited instead of aborting
//! - Byte sizes use 1024-based units, integer magnitudes only
//! - Finite rates are capped at i32::MAX bytes/sec

pub mod bucket;

pub use bucket::RateLimiter;

use thiserror::Error;

/// Burst headroom granted on top of the sustained rate.
pub const BURST_MULTIPLIER: u64 = 3;

/// Byte rates for the named throttle tiers.
const LOW_RATE: u64 = 50_000;
const MEDIUM_RATE: u64 = 500_000;
const HIGH_RATE: u64 = 1_500_000;

/// A parsed throttle descriptor for one transfer direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateLimit {
    /// No throttling; the transfer path admits everything.
    Unlimited,
    /// Token-bucket throttling at `bytes_per_sec` with `burst` headroom.
    Limited {
        /// Sustained refill rate in bytes per second.
        bytes_per_sec: u64,
        /// Bucket capacity (always `BURST_MULTIPLIER` times the rate).
        burst: u64,
    },
}

impl RateLimit {
    /// Build the token bucket enforcing this descriptor.
    pub fn into_limiter(self) -> RateLimiter {
        RateLimiter::new(self)
    }
}

/// Error from [`parse_rate`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RateParseError {
    /// The string is not a known tier, an unlimited form, or a byte size.
    #[error("unrecognized rate '{0}'")]
    Invalid(String),
    /// The parsed byte rate does not fit a 32-bit signed integer.
    #[error("rate '{0}' exceeds representable range")]
    ExceedsRange(String),
}

/// Parse an operator-supplied throttle string into a [`RateLimit`].
///
/// Input is trimmed and lowercased. Recognized forms:
/// - `"low"` / `"medium"` / `"high"` named tiers
/// - `"unlimited"`, `"0"`, or empty → [`RateLimit::Unlimited`]
/// - a byte-size expression such as `"10MB"` or `"2 kb"` (1024-based)
pub fn parse_rate(spec: &str) -> Result<RateLimit, RateParseError> {
    let normalized = spec.trim().to_ascii_lowercase();
    let bytes_per_sec = match normalized.as_str() {
        "low" => LOW_RATE,
        "medium" => MEDIUM_RATE,
        "high" => HIGH_RATE,
        "unlimited" | "0" | "" => return Ok(RateLimit::Unlimited),
        other => {
            let value = parse_byte_size(other)
                .ok_or_else(|| RateParseError::Invalid(spec.trim().to_string()))?;
            if value > i32::MAX as u64 {
                return Err(RateParseError::ExceedsRange(spec.trim().to_string()));
            }
            value
        }
    };
    Ok(RateLimit::Limited {
        bytes_per_sec,
        burst: bytes_per_sec * BURST_MULTIPLIER,
    })
}

/// Parse a 1024-based byte-size expression (`"10mb"`, `"2 kb"`, `"512"`).
///
/// Expects lowercased input. Returns `None` for fractional magnitudes,
/// unknown units, or overflow.
fn parse_byte_size(s: &str) -> Option<u64> {
    let digits_end = s
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(s.len());
    if digits_end == 0 {
        return None;
    }
    let magnitude: u64 = s[..digits_end].parse().ok()?;
    let shift = match s[digits_end..].trim() {
        "" | "b" => 0u32,
        "k" | "kb" => 10,
        "m" | "mb" => 20,
        "g" | "gb" => 30,
        "t" | "tb" => 40,
        _ => return None,
    };
    magnitude.checked_mul(1u64 << shift)
}
