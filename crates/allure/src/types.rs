use std::{fmt::Display, str::FromStr};

use serde::{Deserialize, Serialize};

#[derive(Debug, thiserror::Error)]
#[error("Invalid sex '{0}'. Accepted values: 'm', 'f'")]
pub struct SexParseError(String);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Sex {
    #[serde(rename = "m")]
    Male,
    #[serde(rename = "f")]
    Female,
}

impl Sex {
    pub fn code(&self) -> char {
        match self {
            Sex::Male => 'm',
            Sex::Female => 'f',
        }
    }

    pub fn from_code(c: char) -> Option<Self> {
        match c.to_ascii_lowercase() {
            'm' => Some(Sex::Male),
            'f' => Some(Sex::Female),
            _ => None,
        }
    }
}

impl FromStr for Sex {
    type Err = SexParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut chars = s.trim().chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => Sex::from_code(c).ok_or_else(|| SexParseError(s.to_string())),
            _ => Err(SexParseError(s.to_string())),
        }
    }
}

impl Display for Sex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.code())
    }
}

#[derive(Debug, PartialEq, Eq, thiserror::Error)]
#[error("Display name '{0}' needs at least a last name and a first name")]
pub struct NameError(pub String);

/// A competitor as listed on an entrant page: `LAST First [Other]`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AthleteIdentity {
    pub last_name: String,
    pub first_name: String,
}

impl AthleteIdentity {
    pub fn from_display_name(name: &str) -> Result<Self, NameError> {
        let mut tokens = name.split_whitespace();
        let last_name = tokens.next().ok_or_else(|| NameError(name.to_string()))?;
        let first_name = tokens.collect::<Vec<_>>().join(" ");
        if first_name.is_empty() {
            return Err(NameError(name.to_string()));
        }

        Ok(Self {
            last_name: last_name.to_string(),
            first_name,
        })
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

impl Display for AthleteIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.full_name())
    }
}

/// One parsed result row, tagged with the athlete it was searched for.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceRecord {
    pub athlete: String,
    pub event_name: String,
    pub distance_km: Option<f64>,
    pub finish_time: String,
    pub total_seconds: u64,
    pub speed_kph: f64,
    pub birth_year: Option<i32>,
    pub sex: Option<Sex>,
}

impl PerformanceRecord {
    /// Kilometers per hour, or 0 when either the distance or the duration is missing.
    pub fn compute_speed(distance_km: Option<f64>, total_seconds: u64) -> f64 {
        match distance_km {
            Some(km) if total_seconds > 0 => km / (total_seconds as f64 / 3600.0),
            _ => 0.0,
        }
    }
}

impl Display for PerformanceRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} — {} in {}", self.athlete, self.event_name, self.finish_time)?;
        if self.speed_kph > 0.0 {
            write!(f, " ({:.2} km/h)", self.speed_kph)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Course {
    pub name: String,
    pub id: String,
}

impl Display for Course {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} [{}]", self.name, self.id)
    }
}

const CATEGORY_TOKENS: &[&str] = &[
    "hommes", "femmes", "mixte", "ea", "po", "be", "mi", "ca", "ju", "es", "se", "m0", "m1", "m2",
    "m3", "m4", "m5", "m6", "m7", "m8", "m9", "m10",
];

/// Selectable courses of one race, in page order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CourseCatalog {
    courses: Vec<Course>,
}

impl CourseCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a course unless one with the same name is already listed.
    pub fn insert(&mut self, name: impl Into<String>, id: impl Into<String>) -> bool {
        let name = name.into();
        if self.courses.iter().any(|c| c.name == name) {
            return false;
        }
        self.courses.push(Course { name, id: id.into() });
        true
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.courses
            .iter()
            .find(|c| c.name == name)
            .map(|c| c.id.as_str())
    }

    /// Resolves a user choice given either as a course id or a case-insensitive name.
    pub fn resolve(&self, id_or_name: &str) -> Option<&Course> {
        let wanted = id_or_name.trim();
        self.courses
            .iter()
            .find(|c| c.id == wanted)
            .or_else(|| {
                self.courses
                    .iter()
                    .find(|c| c.name.eq_ignore_ascii_case(wanted))
            })
    }

    /// Courses that are actual races rather than gender or age-category selectors.
    pub fn races(&self) -> impl Iterator<Item = &Course> {
        self.courses.iter().filter(|c| !is_category(&c.name))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Course> {
        self.courses.iter()
    }

    pub fn len(&self) -> usize {
        self.courses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.courses.is_empty()
    }
}

fn is_category(name: &str) -> bool {
    name.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .any(|token| CATEGORY_TOKENS.contains(&token))
}
