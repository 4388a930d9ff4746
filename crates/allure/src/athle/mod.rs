mod parser;
pub mod scraper;

pub use parser::{
    ParsedResults, RawResultRow, RowError, RowFilter, expand_birth_year, parse_birth_field,
    parse_result_row, parse_results,
};
pub use scraper::PerformanceScraper;

pub(crate) const BASE_URL: &str = "https://bases.athle.fr";
