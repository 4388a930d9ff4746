use scraper::{ElementRef, Html, Selector};

use crate::distance::{Distance, classify_distance};
use crate::duration::{DurationError, parse_duration};
use crate::types::{PerformanceRecord, Sex};
use crate::utils::{elem_text, normalize_whitespace, own_text};

// 0-based positions of the result table columns.
const EVENT_CELL: usize = 4;
const TIME_CELL: usize = 10;
const BIRTH_CELL: usize = 14;

/// Why a result row did not become a record.
#[derive(Debug, PartialEq, thiserror::Error)]
pub enum RowError {
    #[error("row has {0} cells")]
    MissingCells(usize),
    #[error("empty event name")]
    MissingEvent,
    #[error("graded trail event: {0}")]
    ExcludedEvent(String),
    #[error("{distance_km} km is below the minimum distance")]
    TooShort { distance_km: f64 },
    #[error("no finish time")]
    MissingTime,
    #[error(transparent)]
    Duration(#[from] DurationError),
    #[error("malformed birth field: {0}")]
    MalformedBirthField(String),
    #[error("sex does not match the filter")]
    SexMismatch,
}

/// Row-level filters applied while parsing.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RowFilter {
    pub min_distance_km: f64,
    pub sex: Option<Sex>,
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct ParsedResults {
    pub records: Vec<PerformanceRecord>,
    pub skipped: usize,
}

/// Text cells of one table row, before any interpretation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResultRow {
    pub event_name: String,
    pub finish_time: Option<String>,
    pub birth_field: Option<String>,
}

/// Expands two-digit years: 00–19 are 2000s, 20–99 are 1900s.
pub fn expand_birth_year(year: i32) -> i32 {
    match year {
        0..=19 => year + 2000,
        20..=99 => year + 1900,
        _ => year,
    }
}

/// Splits a `CATEGORY/YY` field into sex and birth year. The sex is the last
/// letter of the second-to-last segment, the year is the last segment.
pub fn parse_birth_field(field: &str) -> Result<(Option<Sex>, Option<i32>), RowError> {
    let segments: Vec<&str> = field.split('/').map(str::trim).collect();
    let [.., category, year] = segments.as_slice() else {
        return Err(RowError::MalformedBirthField(field.to_string()));
    };

    let sex = category.chars().next_back().and_then(Sex::from_code);
    let birth_year = year.parse::<i32>().ok().map(expand_birth_year);
    Ok((sex, birth_year))
}

/// Turns a raw row into a record for `athlete`.
pub fn parse_result_row(
    row: &RawResultRow,
    athlete: &str,
    filter: &RowFilter,
) -> Result<PerformanceRecord, RowError> {
    let event_name = normalize_whitespace(&row.event_name).to_lowercase();
    if event_name.is_empty() {
        return Err(RowError::MissingEvent);
    }

    let distance_km = match classify_distance(&event_name) {
        Distance::Excluded => return Err(RowError::ExcludedEvent(event_name)),
        Distance::Known(km) if km < filter.min_distance_km => {
            return Err(RowError::TooShort { distance_km: km });
        }
        distance => distance.km(),
    };

    let (sex, birth_year) = match row.birth_field.as_deref() {
        Some(field) => parse_birth_field(field)?,
        None => (None, None),
    };
    if let Some(wanted) = filter.sex
        && sex != Some(wanted)
    {
        return Err(RowError::SexMismatch);
    }

    let finish_time = row
        .finish_time
        .as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or(RowError::MissingTime)?;
    let total_seconds = parse_duration(finish_time)?;

    Ok(PerformanceRecord {
        athlete: athlete.to_string(),
        event_name,
        distance_km,
        finish_time: finish_time.to_string(),
        total_seconds,
        speed_kph: PerformanceRecord::compute_speed(distance_km, total_seconds),
        birth_year,
        sex,
    })
}

/// Reads the raw rows of a bases.athle.fr result list. A page without the
/// `#ctnResultats` container yields no rows.
pub fn parse_result_rows(html: &str) -> Vec<Result<RawResultRow, RowError>> {
    let document = Html::parse_document(html);
    let row_sel = Selector::parse("#ctnResultats tr").unwrap();
    let time_sel = Selector::parse("b").unwrap();
    let fallback_time_sel = Selector::parse("u").unwrap();

    document
        .select(&row_sel)
        .filter_map(|row| {
            let cells: Vec<ElementRef> = row
                .children()
                .filter_map(ElementRef::wrap)
                .filter(|e| e.value().name() == "td")
                .collect();
            if cells.is_empty() {
                return None;
            }
            if cells.len() <= BIRTH_CELL {
                return Some(Err(RowError::MissingCells(cells.len())));
            }

            let event_cell = cells[EVENT_CELL];
            let mut event_name = normalize_whitespace(&own_text(event_cell));
            if event_name.is_empty() {
                event_name = normalize_whitespace(&elem_text(event_cell));
            }

            let time_cell = cells[TIME_CELL];
            let finish_time = time_cell
                .select(&time_sel)
                .next()
                .or_else(|| time_cell.select(&fallback_time_sel).next())
                .map(|e| normalize_whitespace(&elem_text(e)));

            let birth_field = Some(normalize_whitespace(&own_text(cells[BIRTH_CELL])))
                .filter(|field| !field.is_empty());

            Some(Ok(RawResultRow {
                event_name,
                finish_time,
                birth_field,
            }))
        })
        .collect()
}

/// Parses every result row of a page into records for `athlete`, counting
/// the rows that were dropped.
pub fn parse_results(html: &str, athlete: &str, filter: &RowFilter) -> ParsedResults {
    let mut parsed = ParsedResults::default();

    for (i, row) in parse_result_rows(html).into_iter().enumerate() {
        match row.and_then(|row| parse_result_row(&row, athlete, filter)) {
            Ok(record) => parsed.records.push(record),
            Err(e) => {
                log::debug!("{}: result row {} skipped: {}", athlete, i, e);
                parsed.skipped += 1;
            }
        }
    }

    parsed
}
