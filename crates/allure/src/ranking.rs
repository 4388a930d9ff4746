use std::cmp::Ordering;
use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::types::PerformanceRecord;

/// Inclusive age bounds, in years reached during `current_year`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgeRange {
    pub min_age: u32,
    pub max_age: u32,
}

impl AgeRange {
    pub fn new(min_age: u32, max_age: u32) -> Self {
        Self { min_age, max_age }
    }

    /// Records without a birth year never match.
    pub fn contains(&self, birth_year: Option<i32>, current_year: i32) -> bool {
        let Some(birth_year) = birth_year else {
            return false;
        };
        let age = i64::from(current_year) - i64::from(birth_year);
        age >= i64::from(self.min_age) && age <= i64::from(self.max_age)
    }
}

pub fn filter_by_age(
    records: Vec<PerformanceRecord>,
    range: AgeRange,
    current_year: i32,
) -> Vec<PerformanceRecord> {
    records
        .into_iter()
        .filter(|r| range.contains(r.birth_year, current_year))
        .collect()
}

/// Fastest record per athlete among those strictly below a speed ceiling.
#[derive(Debug, Clone, PartialEq)]
pub struct BestPerformances {
    speed_ceiling_kph: f64,
    best: HashMap<String, PerformanceRecord>,
}

impl BestPerformances {
    pub fn new(speed_ceiling_kph: f64) -> Self {
        Self {
            speed_ceiling_kph,
            best: HashMap::new(),
        }
    }

    pub fn from_records(
        records: impl IntoIterator<Item = PerformanceRecord>,
        speed_ceiling_kph: f64,
    ) -> Self {
        let mut best = Self::new(speed_ceiling_kph);
        for record in records {
            best.offer(record);
        }
        best
    }

    /// Keeps `record` if it is under the ceiling and beats the athlete's
    /// current entry. Returns whether the entry changed.
    pub fn offer(&mut self, record: PerformanceRecord) -> bool {
        if record.speed_kph.is_nan() || record.speed_kph >= self.speed_ceiling_kph {
            return false;
        }

        match self.best.get(&record.athlete) {
            Some(current) if !beats(&record, current) => false,
            _ => {
                self.best.insert(record.athlete.clone(), record);
                true
            }
        }
    }

    pub fn get(&self, athlete: &str) -> Option<&PerformanceRecord> {
        self.best.get(athlete)
    }

    pub fn len(&self) -> usize {
        self.best.len()
    }

    pub fn is_empty(&self) -> bool {
        self.best.is_empty()
    }

    /// Entries by descending speed, then by athlete name.
    pub fn into_ranked(self) -> Vec<PerformanceRecord> {
        let mut ranked: Vec<_> = self.best.into_values().collect();
        ranked.sort_by(|a, b| {
            b.speed_kph
                .total_cmp(&a.speed_kph)
                .then_with(|| a.athlete.cmp(&b.athlete))
        });
        ranked
    }
}

// Equal speeds fall back to event name then finish time so the winner does
// not depend on arrival order.
fn beats(candidate: &PerformanceRecord, current: &PerformanceRecord) -> bool {
    match candidate.speed_kph.total_cmp(&current.speed_kph) {
        Ordering::Greater => true,
        Ordering::Less => false,
        Ordering::Equal => {
            (&candidate.event_name, &candidate.finish_time)
                < (&current.event_name, &current.finish_time)
        }
    }
}

/// Age filter followed by the best-under-ceiling reduction.
pub fn rank(
    records: Vec<PerformanceRecord>,
    range: AgeRange,
    speed_ceiling_kph: f64,
    current_year: i32,
) -> Vec<PerformanceRecord> {
    let eligible = filter_by_age(records, range, current_year);
    BestPerformances::from_records(eligible, speed_ceiling_kph).into_ranked()
}
