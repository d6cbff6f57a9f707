//! Parsing surface for time query parameters.
//!
//! Transports hand cutoffs over as strings (`?time=`, `?t1=&t2=`); this
//! module turns them into [`Timestamp`]s and reports which parameter was
//! missing or malformed. Two formats are accepted:
//!
//! - RFC 3339 instants: `2026-03-01T12:00:00Z`
//! - Integer nanoseconds since Unix epoch: `1772366400000000000`
//!
//! The parameter name travels inside the error so callers can surface it
//! without re-parsing anything.

use retrace_types::Timestamp;
use thiserror::Error;

/// Errors raised while parsing time query parameters.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TimeQueryError {
    /// A required query parameter was not supplied.
    #[error("missing required query parameter `{name}`")]
    MissingParameter {
        /// Name of the absent parameter.
        name: &'static str,
    },

    /// A query parameter was supplied but is not a recognizable instant.
    #[error("invalid time range value for `{name}`: {value:?}")]
    InvalidTimeRange {
        /// Name of the offending parameter.
        name: &'static str,
        /// The rejected raw value.
        value: String,
    },
}

/// Parses a required time parameter, rejecting absence.
///
/// # Errors
///
/// Returns [`TimeQueryError::MissingParameter`] when `value` is `None`, and
/// [`TimeQueryError::InvalidTimeRange`] when the value parses as neither an
/// RFC 3339 instant nor integer nanoseconds.
pub fn parse_required(
    name: &'static str,
    value: Option<&str>,
) -> Result<Timestamp, TimeQueryError> {
    match value {
        Some(raw) => parse_timestamp(name, raw),
        None => Err(TimeQueryError::MissingParameter { name }),
    }
}

/// Parses one time parameter value.
///
/// Integer nanoseconds are tried first so an all-digit value never reaches
/// the RFC 3339 parser.
///
/// # Errors
///
/// Returns [`TimeQueryError::InvalidTimeRange`] when the value parses as
/// neither format.
pub fn parse_timestamp(name: &'static str, raw: &str) -> Result<Timestamp, TimeQueryError> {
    if let Ok(nanos) = raw.parse::<u64>() {
        return Ok(Timestamp::from_nanos(nanos));
    }

    Timestamp::from_rfc3339(raw).map_err(|_| TimeQueryError::InvalidTimeRange {
        name,
        value: raw.to_string(),
    })
}
