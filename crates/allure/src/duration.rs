//! Finish-time normalization.
//!
//! Result listings write durations in several hand-typed shapes:
//! `1h 02' 03''`, `45'30''`, `45'30`, `1:02:03`, `32:10` or `2h05`.
//! [`parse_duration`] turns any of them into whole seconds.

use std::sync::LazyLock;

use regex::Regex;

#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum DurationError {
    #[error("Unrecognized duration format: {0}")]
    Unrecognized(String),
    #[error("Invalid duration component '{component}' in {input}")]
    InvalidComponent { component: String, input: String },
    #[error("Duration does not fit in 64 bits")]
    Overflow,
}

static RE_MARKERS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[h']+").expect("invalid regex: duration markers"));

const HOUR: char = 'h';
const MINUTE: &str = "'";
const SECOND: &str = "''";

/// Parses a finish time into total seconds.
///
/// Shapes are tried in order: hours/minutes/seconds markers, minutes/seconds
/// markers, a lone minute apostrophe, colon-delimited, and finally any string
/// carrying an hour marker. Unit ranges are not checked.
pub fn parse_duration(text: &str) -> Result<u64, DurationError> {
    let input = normalize_markers(text.trim());
    let has_hour = input.contains(HOUR);
    let has_minute = input.contains(MINUTE);
    let has_second = input.contains(SECOND);

    if has_hour && has_minute && has_second {
        let parts = split_markers(&input);
        let [h, m, s, ..] = parts.as_slice() else {
            return Err(DurationError::Unrecognized(text.to_string()));
        };
        return hms(component(h, text)?, component(m, text)?, component(s, text)?);
    }

    if !has_hour && has_second {
        let parts = split_markers(&input);
        let [m, s, ..] = parts.as_slice() else {
            return Err(DurationError::Unrecognized(text.to_string()));
        };
        return hms(0, component(m, text)?, component(s, text)?);
    }

    if !has_hour && has_minute {
        let parts: Vec<&str> = input.split(MINUTE).collect();
        let [m, s] = parts.as_slice() else {
            return Err(DurationError::Unrecognized(text.to_string()));
        };
        return hms(0, component(m, text)?, component(s, text)?);
    }

    if input.contains(':') {
        let parts: Vec<&str> = input.split(':').collect();
        return match parts.as_slice() {
            [h, m, s] => hms(component(h, text)?, component(m, text)?, component(s, text)?),
            [m, s] => hms(0, component(m, text)?, component(s, text)?),
            _ => Err(DurationError::Unrecognized(text.to_string())),
        };
    }

    if has_hour {
        return parse_hour_fallback(&input, text);
    }

    Err(DurationError::Unrecognized(text.to_string()))
}

/// `2h05`, `1h05'30`, `1h 05'` and `3h`: hours, then minutes with optional seconds.
fn parse_hour_fallback(input: &str, text: &str) -> Result<u64, DurationError> {
    let Some((hours, rest)) = input.split_once(HOUR) else {
        return Err(DurationError::Unrecognized(text.to_string()));
    };
    let hours = component(hours, text)?;
    let rest = rest.trim();

    match rest.split_once(MINUTE) {
        Some((minutes, seconds)) => {
            let seconds = seconds.trim_end_matches('\'').trim();
            let seconds = if seconds.is_empty() {
                0
            } else {
                component(seconds, text)?
            };
            hms(hours, component(minutes, text)?, seconds)
        }
        None if rest.is_empty() => hms(hours, 0, 0),
        None => hms(hours, component(rest, text)?, 0),
    }
}

/// Formats seconds as `1h 2min 3s`.
pub fn format_duration(total_seconds: u64) -> String {
    let h = total_seconds / 3600;
    let m = (total_seconds % 3600) / 60;
    let s = total_seconds % 60;
    format!("{h}h {m}min {s}s")
}

fn normalize_markers(text: &str) -> String {
    text.replace(['’', '′'], MINUTE)
        .replace(['"', '″'], SECOND)
        .to_lowercase()
}

fn split_markers(input: &str) -> Vec<&str> {
    RE_MARKERS.split(input).collect()
}

fn component(part: &str, input: &str) -> Result<u64, DurationError> {
    part.trim()
        .parse::<u64>()
        .map_err(|_| DurationError::InvalidComponent {
            component: part.trim().to_string(),
            input: input.to_string(),
        })
}

fn hms(hours: u64, minutes: u64, seconds: u64) -> Result<u64, DurationError> {
    hours
        .checked_mul(3600)
        .and_then(|h| minutes.checked_mul(60).and_then(|m| h.checked_add(m)))
        .and_then(|hm| hm.checked_add(seconds))
        .ok_or(DurationError::Overflow)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hours_minutes_seconds_markers() {
        assert_eq!(parse_duration("1h 02' 03''"), Ok(3723));
        assert_eq!(parse_duration("2h05'07''"), Ok(7507));
        assert_eq!(parse_duration("1h 02’ 03’’"), Ok(3723));
        assert_eq!(parse_duration("1H 02' 03\""), Ok(3723));
    }

    #[test]
    fn test_minutes_seconds_markers() {
        assert_eq!(parse_duration("45'30''"), Ok(2730));
        assert_eq!(parse_duration(" 45' 30'' "), Ok(2730));
        assert_eq!(parse_duration("45'30\""), Ok(2730));
    }

    #[test]
    fn test_single_apostrophe() {
        assert_eq!(parse_duration("45'30"), Ok(2730));
        assert_eq!(parse_duration("9'05"), Ok(545));
    }

    #[test]
    fn test_colon_delimited() {
        assert_eq!(parse_duration("1:02:03"), Ok(3723));
        assert_eq!(parse_duration("32:10"), Ok(1930));
        assert!(matches!(
            parse_duration("1:02:03:04"),
            Err(DurationError::Unrecognized(_))
        ));
    }

    #[test]
    fn test_hour_fallback() {
        assert_eq!(parse_duration("2h05"), Ok(7500));
        assert_eq!(parse_duration("1h05'30"), Ok(3930));
        assert_eq!(parse_duration("1h 05'"), Ok(3900));
        assert_eq!(parse_duration("3h"), Ok(10800));
    }

    #[test]
    fn test_unrecognized() {
        assert_eq!(
            parse_duration("DNF"),
            Err(DurationError::Unrecognized("DNF".to_string()))
        );
        assert!(parse_duration("").is_err());
        assert!(parse_duration("45'").is_err());
    }

    #[test]
    fn test_invalid_component() {
        assert!(matches!(
            parse_duration("ab:10"),
            Err(DurationError::InvalidComponent { .. })
        ));
        assert!(matches!(
            parse_duration("-5:10"),
            Err(DurationError::InvalidComponent { .. })
        ));
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(3723), "1h 2min 3s");
        assert_eq!(format_duration(59), "0h 0min 59s");
    }
}
