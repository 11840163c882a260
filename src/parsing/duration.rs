//! Duration literals such as `5m`, `10s` or `1h30m`.
//!
//! A literal is one or more `<integer><unit>` segments. Supported units are
//! `ns`, `us` (or `µs`), `ms`, `s`, `m` and `h`. The bare literal `0` is also
//! accepted. Fractions and signs are not.

use nom::{
    IResult, Parser,
    branch::alt,
    bytes::complete::tag,
    character::complete::u64 as integer,
    combinator::{all_consuming, value},
    multi::many1,
    sequence::pair,
};
use std::time::Duration;
use thiserror::Error;

const NANOSECOND: u64 = 1;
const MICROSECOND: u64 = 1_000 * NANOSECOND;
const MILLISECOND: u64 = 1_000 * MICROSECOND;
const SECOND: u64 = 1_000 * MILLISECOND;
const MINUTE: u64 = 60 * SECOND;
const HOUR: u64 = 60 * MINUTE;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DurationError {
    #[error("empty duration")]
    Empty,

    #[error("invalid duration {0:?}: expected <integer><unit> with unit one of ns, us, ms, s, m, h")]
    Invalid(String),

    #[error("duration {0:?} is out of range")]
    Overflow(String),
}

// Longer units first, otherwise `m` would win over `ms`.
fn unit(input: &str) -> IResult<&str, u64> {
    alt((
        value(NANOSECOND, tag("ns")),
        value(MICROSECOND, tag("us")),
        value(MICROSECOND, tag("µs")),
        value(MILLISECOND, tag("ms")),
        value(SECOND, tag("s")),
        value(MINUTE, tag("m")),
        value(HOUR, tag("h")),
    ))
    .parse(input)
}

fn segments(input: &str) -> IResult<&str, Vec<(u64, u64)>> {
    all_consuming(many1(pair(integer, unit))).parse(input)
}

pub fn parse_duration(text: &str) -> Result<Duration, DurationError> {
    let text = text.trim();
    if text.is_empty() {
        return Err(DurationError::Empty);
    }
    if text == "0" {
        return Ok(Duration::ZERO);
    }

    let (_, segments) = segments(text).map_err(|_| DurationError::Invalid(text.to_string()))?;

    let mut total: u64 = 0;
    for (amount, unit_nanos) in segments {
        total = amount
            .checked_mul(unit_nanos)
            .and_then(|nanos| total.checked_add(nanos))
            .ok_or_else(|| DurationError::Overflow(text.to_string()))?;
    }

    Ok(Duration::from_nanos(total))
}
