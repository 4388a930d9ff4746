use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// How an event name maps onto a race distance.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Distance {
    /// Trail formats graded by difficulty; such rows never become records.
    Excluded,
    Known(f64),
    Unknown,
}

impl Distance {
    pub fn km(&self) -> Option<f64> {
        match self {
            Distance::Known(km) => Some(*km),
            _ => None,
        }
    }
}

pub const HALF_MARATHON_KM: f64 = 21.0;
pub const MARATHON_KM: f64 = 42.0;

static RE_TRAIL_GRADE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\btrail\s+(?:xxs|xs|s|m|l|xl)\b").expect("invalid regex: trail grade")
});

static RE_KM: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d+(?:[.,]\d+)?)\s?km").expect("invalid regex: km"));

/// Classifies a lowercased event name.
pub fn classify_distance(event_name: &str) -> Distance {
    if RE_TRAIL_GRADE.is_match(event_name) {
        return Distance::Excluded;
    }

    if event_name.contains("semi marathon")
        || event_name.contains("semi_marathon")
        || event_name.contains("half marathon")
        || (event_name.contains("1/2") && event_name.contains("marathon"))
    {
        return Distance::Known(HALF_MARATHON_KM);
    }

    if event_name.contains("marathon") {
        return Distance::Known(MARATHON_KM);
    }

    RE_KM
        .captures_iter(event_name)
        .filter_map(|caps| {
            let number = caps.get(1)?;
            if event_name[..number.start()].ends_with("semi ") {
                return None;
            }
            number.as_str().replace(',', ".").parse::<f64>().ok()
        })
        .next()
        .map_or(Distance::Unknown, Distance::Known)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_half_marathon_variants() {
        assert_eq!(classify_distance("semi marathon de paris"), Distance::Known(21.0));
        assert_eq!(classify_distance("semi_marathon nocturne"), Distance::Known(21.0));
        assert_eq!(classify_distance("1/2 marathon de lyon"), Distance::Known(21.0));
        assert_eq!(classify_distance("half marathon"), Distance::Known(21.0));
    }

    #[test]
    fn test_marathon() {
        assert_eq!(classify_distance("marathon de chicago"), Distance::Known(42.0));
        assert_eq!(classify_distance("1/2 finale 800m"), Distance::Unknown);
    }

    #[test]
    fn test_km_pattern() {
        assert_eq!(classify_distance("trail 15 km"), Distance::Known(15.0));
        assert_eq!(classify_distance("10km de la ville"), Distance::Known(10.0));
        assert_eq!(classify_distance("corrida 7,5 km"), Distance::Known(7.5));
        assert_eq!(classify_distance("semi 21 km puis 10 km"), Distance::Known(10.0));
    }

    #[test]
    fn test_trail_grade_excluded() {
        assert_eq!(classify_distance("trail xs du causse"), Distance::Excluded);
        assert_eq!(classify_distance("trail m 32 km"), Distance::Excluded);
        assert_eq!(classify_distance("trail des monts 25 km"), Distance::Known(25.0));
    }

    #[test]
    fn test_unknown() {
        assert_eq!(classify_distance("course mystère"), Distance::Unknown);
        assert_eq!(classify_distance("course mystère").km(), None);
    }
}
