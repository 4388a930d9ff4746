//! End-to-end ranking of a race's entrants.
//!
//! ```text
//! klikego roster ──► athlete identities ──► bases.athle searches (pooled)
//!                                                  │
//!                          ranked rows ◄── age filter + best under ceiling
//! ```

use crate::athle::{PerformanceScraper, RowFilter};
use crate::config::{ConfigError, RankingConfig, RankingRequest};
use crate::klikego::{ParseError, RosterScraper, parse_race_reference};
use crate::ranking::{AgeRange, rank};
use crate::transport::Transport;
use crate::types::{AthleteIdentity, PerformanceRecord};

#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error(transparent)]
    InvalidRace(#[from] ParseError),
    #[error("No course selected")]
    MissingCourse,
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Everything a run produced, for display or export.
#[derive(Debug, Clone, PartialEq)]
pub struct RankingOutcome {
    pub entrants: Vec<String>,
    pub athletes: Vec<AthleteIdentity>,
    pub rejected_names: Vec<String>,
    pub performances: usize,
    pub ranked: Vec<PerformanceRecord>,
}

/// Splits roster names into identities, setting aside the unusable ones.
pub fn identities(names: &[String]) -> (Vec<AthleteIdentity>, Vec<String>) {
    let mut athletes = Vec::new();
    let mut rejected = Vec::new();
    for name in names {
        match AthleteIdentity::from_display_name(name) {
            Ok(athlete) => athletes.push(athlete),
            Err(e) => {
                log::warn!("Ignoring entrant: {}", e);
                rejected.push(name.clone());
            }
        }
    }
    (athletes, rejected)
}

pub struct Pipeline<'a, T> {
    roster: RosterScraper<'a, T>,
    performances: PerformanceScraper<'a, T>,
    config: RankingConfig,
}

impl<'a, T: Transport> Pipeline<'a, T> {
    pub fn new(transport: &'a T, config: RankingConfig) -> Result<Self, PipelineError> {
        let config = config.validate()?;
        Ok(Self {
            roster: RosterScraper::new(transport),
            performances: PerformanceScraper::new(transport, config.season),
            config,
        })
    }

    pub fn with_scrapers(
        roster: RosterScraper<'a, T>,
        performances: PerformanceScraper<'a, T>,
        config: RankingConfig,
    ) -> Result<Self, PipelineError> {
        Ok(Self {
            roster,
            performances,
            config: config.validate()?,
        })
    }

    pub fn config(&self) -> &RankingConfig {
        &self.config
    }

    pub fn roster(&self) -> &RosterScraper<'a, T> {
        &self.roster
    }

    /// Crawls the roster, looks up every entrant and ranks them, with ages
    /// computed against `current_year`. Input errors are reported before any
    /// request is sent.
    pub async fn run(
        &self,
        request: &RankingRequest,
        current_year: i32,
    ) -> Result<RankingOutcome, PipelineError> {
        let reference = parse_race_reference(&request.race)?;
        let course_id = request.course_id.trim();
        if course_id.is_empty() {
            return Err(PipelineError::MissingCourse);
        }

        let entrants = self
            .roster
            .crawl_roster(&reference, course_id, self.config.max_roster_pages)
            .await;
        let (athletes, rejected_names) = identities(&entrants);
        log::info!(
            "{} entrant(s), {} searchable athlete(s)",
            entrants.len(),
            athletes.len()
        );

        let filter = RowFilter {
            min_distance_km: self.config.min_distance_km,
            sex: request.sex,
        };
        let records = self
            .performances
            .fetch_all(&athletes, &filter, self.config.workers)
            .await;
        let performances = records.len();
        log::info!("{} performance(s) found", performances);

        let ranked = rank(
            records,
            AgeRange::new(request.min_age, request.max_age),
            self.config.speed_ceiling_kph,
            current_year,
        );
        log::info!("{} athlete(s) ranked", ranked.len());

        Ok(RankingOutcome {
            entrants,
            athletes,
            rejected_names,
            performances,
            ranked,
        })
    }
}
