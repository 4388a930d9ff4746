use std::fmt::Display;
use std::io::Write;

use serde::{Deserialize, Serialize};

use crate::duration::format_duration;
use crate::types::{PerformanceRecord, Sex};

/// Column names of the exported table, in order.
pub const CSV_HEADERS: [&str; 6] = [
    "full_name",
    "birth_year",
    "sex",
    "distance_km",
    "time",
    "speed_kph",
];

/// One line of the final ranking, as displayed and exported.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedRow {
    pub full_name: String,
    pub birth_year: Option<i32>,
    pub sex: Option<Sex>,
    pub distance_km: Option<f64>,
    pub time: String,
    pub speed_kph: f64,
}

impl From<&PerformanceRecord> for RankedRow {
    fn from(record: &PerformanceRecord) -> Self {
        Self {
            full_name: record.athlete.clone(),
            birth_year: record.birth_year,
            sex: record.sex,
            distance_km: record.distance_km,
            time: format_duration(record.total_seconds),
            speed_kph: record.speed_kph,
        }
    }
}

impl Display for RankedRow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.full_name)?;
        match (self.sex, self.birth_year) {
            (Some(sex), Some(year)) => write!(f, " ({}, {})", sex, year)?,
            (None, Some(year)) => write!(f, " ({})", year)?,
            (Some(sex), None) => write!(f, " ({})", sex)?,
            (None, None) => {}
        }
        if let Some(km) = self.distance_km {
            write!(f, " — {} km", km)?;
        }
        write!(f, " in {} — {:.2} km/h", self.time, self.speed_kph)
    }
}

pub fn to_rows(ranked: &[PerformanceRecord]) -> Vec<RankedRow> {
    ranked.iter().map(RankedRow::from).collect()
}

/// Writes `rows` as UTF-8 CSV with a header line. Unknown values are empty cells.
pub fn write_csv<W: Write>(rows: &[RankedRow], writer: W) -> Result<(), csv::Error> {
    let mut writer = csv::Writer::from_writer(writer);
    writer.write_record(CSV_HEADERS)?;
    for row in rows {
        writer.write_record([
            row.full_name.clone(),
            row.birth_year.map(|y| y.to_string()).unwrap_or_default(),
            row.sex.map(|s| s.to_string()).unwrap_or_default(),
            row.distance_km.map(|km| km.to_string()).unwrap_or_default(),
            row.time.clone(),
            format!("{:.2}", row.speed_kph),
        ])?;
    }
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rows() -> Vec<RankedRow> {
        let records = vec![
            PerformanceRecord {
                athlete: "Claire MARTIN".to_string(),
                event_name: "semi marathon de paris".to_string(),
                distance_km: Some(21.0),
                finish_time: "1h30'00''".to_string(),
                total_seconds: 5400,
                speed_kph: 14.0,
                birth_year: Some(1988),
                sex: Some(Sex::Female),
            },
            PerformanceRecord {
                athlete: "Jean, \"Jo\" DUPONT".to_string(),
                event_name: "10 km".to_string(),
                distance_km: Some(10.0),
                finish_time: "1:02:03".to_string(),
                total_seconds: 3723,
                speed_kph: 9.669621273166801,
                birth_year: None,
                sex: None,
            },
        ];
        to_rows(&records)
    }

    #[test]
    fn test_row_from_record() {
        let rows = rows();
        assert_eq!(rows[0].time, "1h 30min 0s");
        assert_eq!(rows[1].time, "1h 2min 3s");
        assert_eq!(rows[0].full_name, "Claire MARTIN");
    }

    #[test]
    fn test_csv_header_round_trip() {
        let mut buf = Vec::new();
        write_csv(&rows(), &mut buf).expect("Failed to write CSV");

        let mut reader = csv::Reader::from_reader(buf.as_slice());
        let headers = reader.headers().expect("Failed to read headers").clone();
        assert_eq!(headers.iter().collect::<Vec<_>>(), CSV_HEADERS.to_vec());

        let records: Vec<csv::StringRecord> = reader
            .records()
            .collect::<Result<_, _>>()
            .expect("Failed to read rows");
        assert_eq!(records.len(), 2);
        assert_eq!(
            records[0].iter().collect::<Vec<_>>(),
            vec!["Claire MARTIN", "1988", "f", "21", "1h 30min 0s", "14.00"]
        );
        assert_eq!(
            records[1].iter().collect::<Vec<_>>(),
            vec!["Jean, \"Jo\" DUPONT", "", "", "10", "1h 2min 3s", "9.67"]
        );
    }

    #[test]
    fn test_csv_is_utf8() {
        let mut row = rows().remove(0);
        row.full_name = "Hélène Éluard".to_string();

        let mut buf = Vec::new();
        write_csv(&[row], &mut buf).expect("Failed to write CSV");

        let text = String::from_utf8(buf).expect("CSV should be UTF-8");
        assert!(text.starts_with("full_name,birth_year,sex,distance_km,time,speed_kph\n"));
        assert!(text.contains("Hélène Éluard"));
    }

    #[test]
    fn test_display() {
        let rows = rows();
        assert_eq!(
            rows[0].to_string(),
            "Claire MARTIN (f, 1988) — 21 km in 1h 30min 0s — 14.00 km/h"
        );
    }
}
