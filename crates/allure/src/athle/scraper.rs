use futures::{StreamExt, stream};

use super::parser::{RowFilter, parse_results};
use crate::transport::{Transport, TransportError};
use crate::types::{AthleteIdentity, PerformanceRecord};

/// Result searches on bases.athle.fr.
#[derive(Debug, Clone)]
pub struct PerformanceScraper<'a, T> {
    transport: &'a T,
    base_url: String,
    season: i32,
}

impl<'a, T: Transport> PerformanceScraper<'a, T> {
    pub fn new(transport: &'a T, season: i32) -> Self {
        Self::with_base_url(transport, super::BASE_URL, season)
    }

    pub fn with_base_url(transport: &'a T, base_url: impl Into<String>, season: i32) -> Self {
        Self {
            transport,
            base_url: base_url.into(),
            season,
        }
    }

    /// Every result of one athlete in the configured season that passes `filter`.
    pub async fn fetch_performances(
        &self,
        athlete: &AthleteIdentity,
        filter: &RowFilter,
    ) -> Result<Vec<PerformanceRecord>, TransportError> {
        let url = format!("{}/asp.net/liste.aspx", self.base_url);
        let season = self.season.to_string();
        let query = [
            ("frmpostback", "true"),
            ("frmbase", "resultats"),
            ("frmmode", "1"),
            ("frmespace", "0"),
            ("frmsaison", season.as_str()),
            ("frmclub", ""),
            ("frmnom", athlete.last_name.as_str()),
            ("frmprenom", athlete.first_name.as_str()),
            ("frmsexe", ""),
            ("frmlicence", ""),
            ("frmdepartement", ""),
            ("frmligue", ""),
            ("frmcomprch", ""),
        ];

        let html = self.transport.get(&url, &query).await?;
        let parsed = parse_results(&html, &athlete.full_name(), filter);
        log::debug!(
            "{}: {} performance(s), {} row(s) skipped",
            athlete,
            parsed.records.len(),
            parsed.skipped
        );
        Ok(parsed.records)
    }

    /// Fetches all athletes with at most `workers` searches in flight. A failed
    /// search contributes no record; the order of the returned records is
    /// unspecified.
    pub async fn fetch_all(
        &self,
        athletes: &[AthleteIdentity],
        filter: &RowFilter,
        workers: usize,
    ) -> Vec<PerformanceRecord> {
        let total = athletes.len();
        let mut results = stream::iter(athletes)
            .map(|athlete| async move { (athlete, self.fetch_performances(athlete, filter).await) })
            .buffer_unordered(workers.max(1));

        let mut all = Vec::new();
        let mut done = 0;
        while let Some((athlete, result)) = results.next().await {
            done += 1;
            match result {
                Ok(records) => all.extend(records),
                Err(e) => log::warn!("No performances for {}: {}", athlete, e),
            }
            log::info!("Processed {}/{} athletes", done, total);
        }

        all
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::testing::MockTransport;
    use crate::types::Sex;

    const FILTER: RowFilter = RowFilter {
        min_distance_km: 5.0,
        sex: None,
    };

    fn results_page(event: &str, time: &str, birth: &str) -> String {
        let mut cells = vec![String::new(); 15];
        cells[4] = event.to_string();
        cells[10] = format!("<b>{}</b>", time);
        cells[14] = birth.to_string();
        let row: String = cells.iter().map(|c| format!("<td>{}</td>", c)).collect();
        format!(r#"<table id="ctnResultats"><tr>{}</tr></table>"#, row)
    }

    fn athlete(name: &str) -> AthleteIdentity {
        AthleteIdentity::from_display_name(name).unwrap()
    }

    #[tokio::test]
    async fn test_fetch_performances_sends_identity_and_season() {
        let transport = MockTransport::new(|_| Ok(results_page("10 km", "40:00", "SEM/90")));
        let scraper = PerformanceScraper::with_base_url(&transport, "http://athle.test", 2024);

        let records = scraper
            .fetch_performances(&athlete("DUPONT Jean Pierre"), &FILTER)
            .await
            .expect("Failed to fetch performances");

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].athlete, "Jean Pierre DUPONT");
        assert_eq!(records[0].speed_kph, 15.0);

        let request = &transport.recorded()[0];
        assert_eq!(request.url, "http://athle.test/asp.net/liste.aspx");
        assert_eq!(request.param("frmnom"), Some("DUPONT"));
        assert_eq!(request.param("frmprenom"), Some("Jean Pierre"));
        assert_eq!(request.param("frmsaison"), Some("2024"));
        assert_eq!(request.param("frmbase"), Some("resultats"));
    }

    #[tokio::test]
    async fn test_fetch_all_skips_failed_athletes() {
        let transport = MockTransport::new(|req| match req.param("frmnom") {
            Some("DUPONT") => Ok(results_page("10 km", "40:00", "SEM/90")),
            Some("MARTIN") => Ok(results_page("semi marathon", "1:30:00", "SEF/88")),
            _ => Err(500),
        });
        let scraper = PerformanceScraper::with_base_url(&transport, "http://athle.test", 2024);
        let athletes = vec![athlete("DUPONT Jean"), athlete("BROKEN Link"), athlete("MARTIN Claire")];

        let mut records = scraper.fetch_all(&athletes, &FILTER, 2).await;
        records.sort_by(|a, b| a.athlete.cmp(&b.athlete));

        let names: Vec<_> = records.iter().map(|r| r.athlete.as_str()).collect();
        assert_eq!(names, vec!["Claire MARTIN", "Jean DUPONT"]);
        assert_eq!(transport.recorded().len(), 3);
    }

    #[tokio::test]
    async fn test_fetch_all_applies_sex_filter() {
        let transport = MockTransport::new(|req| match req.param("frmnom") {
            Some("DUPONT") => Ok(results_page("10 km", "40:00", "SEM/90")),
            _ => Ok(results_page("10 km", "45:00", "SEF/88")),
        });
        let scraper = PerformanceScraper::with_base_url(&transport, "http://athle.test", 2024);
        let filter = RowFilter {
            min_distance_km: 5.0,
            sex: Some(Sex::Female),
        };

        let records = scraper
            .fetch_all(&[athlete("DUPONT Jean"), athlete("MARTIN Claire")], &filter, 1)
            .await;

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].athlete, "Claire MARTIN");
    }
}
