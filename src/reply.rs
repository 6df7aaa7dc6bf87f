//! Decoders for reply text.
//!
//! Every decoder is fallible and reports a [`MalformedReplyError`] when the
//! reply does not hold the expected value. The controllers pair each query
//! with a documented fallback that replaces the value on failure (see
//! [`Port::query_or`](crate::port::Port::query_or)), so a noisy serial line
//! never halts a calling sequence.
//!
//! Surrounding whitespace is ignored by all decoders.

use crate::{error::MalformedReplyError, units};

/// Whether the reply is exactly the `expected` text.
pub fn matches(reply: &str, expected: &str) -> bool {
    reply.trim() == expected
}

/// Decode a single integer.
pub fn integer(reply: &str) -> Result<i64, MalformedReplyError> {
    reply
        .trim()
        .parse()
        .map_err(|_| MalformedReplyError::new(reply, "an integer"))
}

/// Decode a comma separated list of integers.
///
/// An empty reply is malformed, as is any empty field.
pub fn integer_list(reply: &str) -> Result<Vec<i64>, MalformedReplyError> {
    reply
        .split(',')
        .map(|field| field.trim().parse())
        .collect::<Result<Vec<_>, _>>()
        .map_err(|_| MalformedReplyError::new(reply, "a comma separated list of integers"))
}

/// Decode a length in millimeters and return it in whole micrometers.
///
/// The value is rounded to the nearest micrometer. Non-finite values are
/// malformed.
pub fn millimeters(reply: &str) -> Result<i64, MalformedReplyError> {
    match reply.trim().parse::<f64>() {
        Ok(mm) if mm.is_finite() => Ok(units::mm_to_um(mm)),
        _ => Err(MalformedReplyError::new(reply, "a length in millimeters")),
    }
}

/// Unwrap a decoded value, substituting `fallback` if decoding failed.
pub(crate) fn or_fallback<T: std::fmt::Debug>(
    decoded: Result<T, MalformedReplyError>,
    fallback: T,
) -> T {
    decoded.unwrap_or_else(|err| {
        log::warn!("{err}; using {fallback:?} instead");
        fallback
    })
}
