mod parser;
pub mod scraper;

pub use parser::{ParseError, parse_race_reference};
pub use scraper::{RosterScraper, ScraperError};

pub(crate) const BASE_URL: &str = "https://www.klikego.com";
