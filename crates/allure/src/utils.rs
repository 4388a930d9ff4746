use scraper::ElementRef;

pub(crate) fn elem_text(element: ElementRef) -> String {
    element.text().collect::<String>()
}

/// Text nodes directly under `element`, ignoring nested markup.
pub(crate) fn own_text(element: ElementRef) -> String {
    element
        .children()
        .filter_map(|node| node.value().as_text().map(|t| &**t))
        .collect::<String>()
}

pub(crate) fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
