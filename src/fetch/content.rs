//! Visible-text extraction from fetched markup.

use scraper::{Html, Selector};

/// Extract the page title: `og:title`, then `<title>`, then the first `<h1>`.
#[must_use]
pub fn extract_title(document: &Html) -> String {
    if let Some(og_title) = extract_meta(document, "og:title") {
        return og_title;
    }

    if let Ok(selector) = Selector::parse("title")
        && let Some(element) = document.select(&selector).next()
    {
        let title = element.text().collect::<String>().trim().to_string();
        if !title.is_empty() {
            return title;
        }
    }

    if let Ok(selector) = Selector::parse("h1")
        && let Some(element) = document.select(&selector).next()
    {
        return element.text().collect::<String>().trim().to_string();
    }

    String::new()
}

/// Extract meta tag content by `name` or OpenGraph `property`.
fn extract_meta(document: &Html, name: &str) -> Option<String> {
    for attr in ["name", "property"] {
        let selector_str = format!("meta[{attr}='{name}']");
        if let Ok(selector) = Selector::parse(&selector_str)
            && let Some(element) = document.select(&selector).next()
            && let Some(content) = element.value().attr("content")
        {
            let content = content.trim();
            if !content.is_empty() {
                return Some(content.to_string());
            }
        }
    }

    None
}

/// Extract all visible text from the document body.
///
/// Concatenates every text node; no structural guarantees are made beyond
/// collapsing whitespace runs.
#[must_use]
pub fn extract_visible_text(document: &Html) -> String {
    if let Ok(body_selector) = Selector::parse("body")
        && let Some(body) = document.select(&body_selector).next()
    {
        let mut text = String::new();
        for node in body.text() {
            let trimmed = node.trim();
            if !trimmed.is_empty() {
                if !text.is_empty() {
                    text.push(' ');
                }
                text.push_str(trimmed);
            }
        }
        return clean_text(&text);
    }

    // Plain-text bodies parse without a <body>; fall back to the raw tree.
    clean_text(&document.root_element().text().collect::<String>())
}

/// Collapse whitespace runs into single spaces.
fn clean_text(text: &str) -> String {
    let text: String = text
        .chars()
        .map(|c| if c.is_whitespace() { ' ' } else { c })
        .collect();

    let mut result = String::with_capacity(text.len());
    let mut last_was_space = false;

    for c in text.chars() {
        if c == ' ' {
            if !last_was_space {
                result.push(c);
                last_was_space = true;
            }
        } else {
            result.push(c);
            last_was_space = false;
        }
    }

    result.trim().to_string()
}
