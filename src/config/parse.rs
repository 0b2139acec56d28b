use std::time::Duration;

use crate::error::ValidationError;

/// Parses `1m30s`-style durations. Each segment is an integer followed by
/// one of `ns`, `us`, `ms`, `s`, `m` or `h`; a bare integer means seconds.
/// Zero is accepted.
pub(crate) fn parse_duration_value(value: &str) -> Result<Duration, ValidationError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(ValidationError::DurationEmpty);
    }

    if value.bytes().all(|byte| byte.is_ascii_digit()) {
        let secs = parse_number(value, value)?;
        return Ok(Duration::from_secs(secs));
    }

    let mut total = Duration::ZERO;
    let mut rest = value;
    while !rest.is_empty() {
        let digits_len = rest.bytes().take_while(u8::is_ascii_digit).count();
        if digits_len == 0 {
            return Err(ValidationError::InvalidDurationFormat {
                value: value.to_owned(),
            });
        }
        let (num_part, tail) = rest.split_at(digits_len);
        let unit_len = tail.bytes().take_while(|byte| !byte.is_ascii_digit()).count();
        let (unit, next) = tail.split_at(unit_len);
        if unit.is_empty() {
            return Err(ValidationError::InvalidDurationFormat {
                value: value.to_owned(),
            });
        }

        let segment = unit_duration(parse_number(num_part, value)?, unit)?;
        total = total
            .checked_add(segment)
            .ok_or(ValidationError::DurationOverflow)?;
        rest = next;
    }

    Ok(total)
}

fn parse_number(digits: &str, whole: &str) -> Result<u64, ValidationError> {
    digits
        .parse::<u64>()
        .map_err(|source| ValidationError::InvalidDurationNumber {
            value: whole.to_owned(),
            source,
        })
}

fn unit_duration(number: u64, unit: &str) -> Result<Duration, ValidationError> {
    let whole_secs = |factor: u64| {
        number
            .checked_mul(factor)
            .map(Duration::from_secs)
            .ok_or(ValidationError::DurationOverflow)
    };
    match unit {
        "ns" => Ok(Duration::from_nanos(number)),
        "us" | "µs" => Ok(Duration::from_micros(number)),
        "ms" => Ok(Duration::from_millis(number)),
        "s" => Ok(Duration::from_secs(number)),
        "m" => whole_secs(60),
        "h" => whole_secs(3600),
        _ => Err(ValidationError::InvalidDurationUnit {
            unit: unit.to_owned(),
        }),
    }
}
