use super::parser::{ParseError, parse_course_catalog, parse_race_reference, parse_roster_page};
use crate::transport::{Transport, TransportError};
use crate::types::CourseCatalog;

#[derive(Debug, thiserror::Error)]
pub enum ScraperError {
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] TransportError),
    #[error("Parse error: {0}")]
    ParseError(#[from] ParseError),
}

/// Entrant lists and course discovery on klikego.com.
#[derive(Debug, Clone)]
pub struct RosterScraper<'a, T> {
    transport: &'a T,
    base_url: String,
}

impl<'a, T: Transport> RosterScraper<'a, T> {
    pub fn new(transport: &'a T) -> Self {
        Self {
            transport,
            base_url: super::BASE_URL.to_string(),
        }
    }

    pub fn with_base_url(transport: &'a T, base_url: impl Into<String>) -> Self {
        Self {
            transport,
            base_url: base_url.into(),
        }
    }

    /// Lists the selectable courses of a race given its link or reference.
    pub async fn fetch_course_catalog(&self, race: &str) -> Result<CourseCatalog, ScraperError> {
        let reference = parse_race_reference(race)?;
        let url = format!("{}/inscrits/{}", self.base_url, reference);
        log::info!("Fetching courses for race {}...", reference);

        let html = self.transport.get(&url, &[]).await?;
        let catalog = parse_course_catalog(&html)?;
        log::info!("Found {} course(s)", catalog.len());
        Ok(catalog)
    }

    pub async fn fetch_roster_page(
        &self,
        reference: &str,
        course_id: &str,
        page: u32,
    ) -> Result<Vec<String>, ScraperError> {
        let url = format!(
            "{}/types/generic/custo/x.running/findInInscrits.jsp",
            self.base_url
        );
        let page = page.to_string();
        let form = [
            ("search", ""),
            ("ville", ""),
            ("course", course_id),
            ("reference", reference),
            ("version", "v6"),
            ("page", page.as_str()),
        ];
        let html = self.transport.post_form(&url, &form).await?;
        Ok(parse_roster_page(&html))
    }

    /// Walks roster pages from index 0 and returns every entrant name in page
    /// order. The walk ends on the first page that yields no name or fails,
    /// or after `max_pages` pages.
    pub async fn crawl_roster(
        &self,
        reference: &str,
        course_id: &str,
        max_pages: u32,
    ) -> Vec<String> {
        let mut all = Vec::new();

        for page in 0..max_pages {
            log::info!("Fetching roster page {}...", page + 1);
            let names = match self.fetch_roster_page(reference, course_id, page).await {
                Ok(names) => names,
                Err(e) => {
                    log::warn!("Roster page {} unavailable, stopping: {}", page + 1, e);
                    break;
                }
            };

            if names.is_empty() {
                log::info!("Roster page {} is empty, {} entrant(s) found", page + 1, all.len());
                return all;
            }

            log::debug!("Roster page {}: {} name(s)", page + 1, names.len());
            all.extend(names);

            if page + 1 == max_pages {
                log::warn!(
                    "Stopped after {} roster pages without reaching an empty page",
                    max_pages
                );
            }
        }

        all
    }
}
