use scraper::{ElementRef, Html, Selector};

use crate::types::CourseCatalog;
use crate::utils::{elem_text, normalize_whitespace};

#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("Failed to parse race link: {0}")]
    UrlParse(String),
    #[error("No course selector found on the race page")]
    MissingCourseSelector,
    #[error("Course selector has no selectable course")]
    NoCourseOptions,
}

/// Extracts the race reference from a race link such as
/// `https://www.klikego.com/inscrits/10-km-de-paris/1234567890`.
/// A bare reference is returned unchanged.
pub fn parse_race_reference(link: &str) -> Result<String, ParseError> {
    let without_fragment = link.trim().split('#').next().unwrap_or_default();
    let path = without_fragment.split('?').next().unwrap_or_default();

    let reference = path
        .split('/')
        .filter(|segment| !segment.is_empty())
        .next_back()
        .ok_or_else(|| ParseError::UrlParse(format!("No path segment in '{}'", link)))?;

    if reference.contains(char::is_whitespace) || reference.ends_with(':') {
        return Err(ParseError::UrlParse(format!(
            "'{}' is not a race reference",
            reference
        )));
    }

    Ok(reference.to_string())
}

pub fn parse_course_catalog(html: &str) -> Result<CourseCatalog, ParseError> {
    let document = Html::parse_document(html);
    let select_sel = Selector::parse("select").unwrap();
    let option_sel = Selector::parse("option").unwrap();

    let selects: Vec<ElementRef> = document.select(&select_sel).collect();
    if selects.is_empty() {
        return Err(ParseError::MissingCourseSelector);
    }

    let mentions_course = |select: &ElementRef| {
        ["name", "id"].iter().any(|attr| {
            select
                .value()
                .attr(attr)
                .is_some_and(|v| v.to_lowercase().contains("course"))
        })
    };
    let select = selects
        .iter()
        .find(|s| mentions_course(*s))
        .or_else(|| {
            selects
                .iter()
                .find(|s| s.select(&option_sel).next().is_some())
        })
        .ok_or(ParseError::NoCourseOptions)?;

    let mut catalog = CourseCatalog::new();
    for option in select.select(&option_sel) {
        let Some(id) = option.value().attr("value").map(str::trim) else {
            continue;
        };
        let name = normalize_whitespace(&elem_text(option));
        if id.is_empty() || name.is_empty() {
            continue;
        }
        if !catalog.insert(name.clone(), id) {
            log::debug!("Duplicate course name ignored: {}", name);
        }
    }

    if catalog.is_empty() {
        return Err(ParseError::NoCourseOptions);
    }
    Ok(catalog)
}

/// Entrant display names of one roster page. Rows that do not carry the
/// expected cell layout are skipped; a page without the results table
/// yields no names.
pub fn parse_roster_page(html: &str) -> Vec<String> {
    let document = Html::parse_document(html);
    let table_sel = Selector::parse("table.table.table-sm.table-bordered.table-striped").unwrap();
    let row_sel = Selector::parse("tr.mt-1").unwrap();
    let cell_sel = Selector::parse("td").unwrap();
    let bold_sel = Selector::parse("b").unwrap();
    let div_sel = Selector::parse("div").unwrap();

    let Some(table) = document.select(&table_sel).next() else {
        log::debug!("No entrant table on page");
        return Vec::new();
    };

    let mut names = Vec::new();
    for (i, row) in table.select(&row_sel).enumerate() {
        let cells: Vec<ElementRef> = row.select(&cell_sel).collect();
        let Some(first) = cells.first() else {
            log::debug!("Row {}: no cells", i);
            continue;
        };

        let has_bib = first.select(&bold_sel).next().is_some_and(|b| {
            let bib = normalize_whitespace(&elem_text(b));
            !bib.is_empty() && bib.chars().all(|c| c.is_ascii_digit())
        });

        let name_cell = if has_bib {
            let Some(second) = cells.get(1) else {
                log::debug!("Row {}: bib number without a name cell", i);
                continue;
            };
            second
        } else {
            first
        };

        let name = name_cell
            .select(&div_sel)
            .nth(1)
            .map(|div| normalize_whitespace(&elem_text(div)))
            .filter(|name| !name.is_empty());

        match name {
            Some(name) => names.push(name),
            None => log::debug!("Row {}: no name block", i),
        }
    }

    names
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_parse_race_reference() {
        assert_eq!(
            parse_race_reference("https://www.klikego.com/inscrits/corrida-2024/1597534682").unwrap(),
            "1597534682"
        );
        assert_eq!(
            parse_race_reference("https://www.klikego.com/inscrits/corrida/42/?lang=fr#top")
                .unwrap(),
            "42"
        );
        assert_eq!(parse_race_reference("1597534682").unwrap(), "1597534682");
    }

    #[test]
    fn test_parse_race_reference_rejects_garbage() {
        assert!(parse_race_reference("").is_err());
        assert!(parse_race_reference("///").is_err());
        assert!(parse_race_reference("https://").is_err());
        assert!(parse_race_reference("https://www.klikego.com/inscrits/not a ref").is_err());
    }

    #[test]
    fn test_parse_course_catalog_from_fixture() {
        let html = fs::read_to_string("fixtures/klikego/race_page.html")
            .expect("Failed to read fixture");

        let catalog = parse_course_catalog(&html).expect("Failed to parse catalog");

        assert_eq!(catalog.get("10 km"), Some("c-10"));
        assert_eq!(catalog.get("Semi-marathon"), Some("c-21"));
        assert!(
            catalog.iter().all(|c| !c.id.is_empty()),
            "Placeholder option should be skipped"
        );

        let races: Vec<_> = catalog.races().map(|c| c.name.as_str()).collect();
        assert_eq!(races, vec!["10 km", "Semi-marathon"]);
    }

    #[test]
    fn test_parse_course_catalog_without_selector() {
        let html = "<html><body><p>Inscriptions closes</p></body></html>";
        assert!(matches!(
            parse_course_catalog(html),
            Err(ParseError::MissingCourseSelector)
        ));
    }

    #[test]
    fn test_parse_course_catalog_without_options() {
        let html = r#"<select name="course"><option value="">Choisir</option></select>"#;
        assert!(matches!(
            parse_course_catalog(html),
            Err(ParseError::NoCourseOptions)
        ));
    }

    #[test]
    fn test_parse_roster_page_from_fixture() {
        let html = fs::read_to_string("fixtures/klikego/roster_page.html")
            .expect("Failed to read fixture");

        let names = parse_roster_page(&html);

        assert_eq!(
            names,
            vec!["DUPONT Jean", "MARTIN Claire Anne", "LEROY Paul"],
            "Bib rows read the second cell, broken rows are skipped"
        );
    }

    #[test]
    fn test_parse_roster_page_without_table() {
        assert!(parse_roster_page("<html><body>Aucun inscrit</body></html>").is_empty());
    }
}
