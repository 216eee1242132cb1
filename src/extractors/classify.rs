// src/extractors/classify.rs

use crate::extractors::patterns::PatternRegistry;
use once_cell::sync::Lazy;
use scraper::{ElementRef, Selector};

/// Titles longer than this are assumed to be running text, not headings.
const TITLE_MAX_CHARS: usize = 150;

/// Container tags a body statement may live in.
pub const BODY_CONTAINER_TAGS: &[&str] = &["p", "div", "tr"];

static HYPERLINK_SELECTOR: Lazy<Selector> = Lazy::new(|| {
    Selector::parse("a[href]").expect("Failed to compile HYPERLINK_SELECTOR")
});

// Body text is alternately found in <font> and <div> blocks in these
// filings; nothing else carries it reliably.
static TEXT_BLOCK_SELECTOR: Lazy<Selector> = Lazy::new(|| {
    Selector::parse("font, div").expect("Failed to compile TEXT_BLOCK_SELECTOR")
});

/// Decides whether a bold element plausibly marks the start of an
/// acquisition section.
///
/// Rejects long text, and anything whose immediate container holds a
/// hyperlink (table-of-contents entries render exactly like titles).
/// Leaf text nodes never reach this function: candidates come from element
/// selectors, so only markup elements are representable here.
pub fn is_candidate_title(el: ElementRef, patterns: &PatternRegistry) -> bool {
    let raw = el.text().collect::<String>();
    if raw.chars().count() > TITLE_MAX_CHARS {
        return false;
    }
    if let Some(parent) = el.parent().and_then(ElementRef::wrap) {
        if parent.select(&HYPERLINK_SELECTOR).next().is_some() {
            return false;
        }
    }
    if !patterns.title_trigger.is_match(&raw) {
        return false;
    }
    tracing::debug!("new possible title found: {}", raw.trim());
    true
}

/// Scans a container for the first text block that reads like an
/// acquisition statement about the target entity.
///
/// The filter order is load-bearing: hyperlink (ToC) skip, then entity
/// match, then body trigger, then exclusion. Only the first surviving
/// candidate is returned; the scan assumes one acquisition statement per
/// paragraph/row (an open simplification, kept deliberately).
pub fn extract_body_statement(el: ElementRef, patterns: &PatternRegistry) -> Option<String> {
    if !BODY_CONTAINER_TAGS.contains(&el.value().name()) {
        tracing::trace!("<{}> not in container whitelist", el.value().name());
        return None;
    }
    let mut candidates: Vec<ElementRef> = el.select(&TEXT_BLOCK_SELECTOR).collect();
    if candidates.is_empty() && el.value().name() == "div" {
        // Flat <div> bodies carry their text directly.
        candidates.push(el);
    }
    for candidate in candidates {
        if let Some(parent) = candidate.parent().and_then(ElementRef::wrap) {
            if parent.select(&HYPERLINK_SELECTOR).next().is_some() {
                tracing::trace!("ignoring hyperlinked block");
                continue;
            }
        }
        let raw = candidate.text().collect::<String>();
        if !patterns.entity.is_match(&raw) {
            continue;
        }
        if !patterns.body_trigger.is_match(&raw) {
            continue;
        }
        if patterns.body_exclude.is_match(&raw) {
            continue;
        }
        return Some(raw);
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extractors::patterns::PhraseSets;
    use scraper::Html;

    fn registry() -> PatternRegistry {
        PatternRegistry::compile(&PhraseSets::default(), "Sherman", false).unwrap()
    }

    fn first<'a>(doc: &'a Html, css: &str) -> ElementRef<'a> {
        let sel = Selector::parse(css).unwrap();
        doc.select(&sel).next().expect("selector must match fixture")
    }

    #[test]
    fn short_bold_trigger_is_a_title() {
        let doc = Html::parse_document("<p><b>Business Acquisition</b></p>");
        assert!(is_candidate_title(first(&doc, "b"), &registry()));
    }

    #[test]
    fn uppercase_titles_match() {
        let doc = Html::parse_document("<p><b>BUSINESS ACQUISITION</b></p>");
        assert!(is_candidate_title(first(&doc, "b"), &registry()));
    }

    #[test]
    fn long_text_is_never_a_title() {
        let long = "Acquisition ".repeat(20);
        let doc = Html::parse_document(&format!("<p><b>{long}</b></p>"));
        assert!(!is_candidate_title(first(&doc, "b"), &registry()));
    }

    #[test]
    fn hyperlinked_container_is_toc_noise() {
        let doc = Html::parse_document(
            "<p><a href='#note2'>Note 2</a><b>Acquisition</b></p>",
        );
        assert!(!is_candidate_title(first(&doc, "b"), &registry()));
    }

    #[test]
    fn body_statement_found_in_font_block() {
        let doc = Html::parse_document(
            "<div><font>Sherman acquired the business for cash.</font></div>",
        );
        let got = extract_body_statement(first(&doc, "div"), &registry()).unwrap();
        assert!(got.contains("Sherman acquired"));
    }

    #[test]
    fn flat_div_without_font_children_is_its_own_candidate() {
        let doc = Html::parse_document(
            "<body><div id='flat'>Sherman purchased the clinic assets.</div></body>",
        );
        let got = extract_body_statement(first(&doc, "div#flat"), &registry()).unwrap();
        assert!(got.contains("purchased the clinic"));
    }

    #[test]
    fn exclusion_takes_precedence_over_body_trigger() {
        let doc = Html::parse_document(
            "<div><font>Sherman acquired the unit, closing no later than June 1.</font></div>",
        );
        assert!(extract_body_statement(first(&doc, "div"), &registry()).is_none());
    }

    #[test]
    fn entity_mention_is_required() {
        let doc = Html::parse_document(
            "<div><font>The company acquired a business for cash.</font></div>",
        );
        assert!(extract_body_statement(first(&doc, "div"), &registry()).is_none());
    }

    #[test]
    fn non_whitelisted_container_is_rejected() {
        let doc = Html::parse_document(
            "<span><font>Sherman acquired the business.</font></span>",
        );
        assert!(extract_body_statement(first(&doc, "span"), &registry()).is_none());
    }
}
