// src/extractors/dom.rs
//
// The only tree-walking vocabulary the extraction engine is allowed to use.
// Both helpers are pure functions over `ElementRef`; descendant scans go
// through compiled `Selector`s instead.

use scraper::ElementRef;

/// Walks parent references until an element whose tag is in `whitelist` is
/// found. Returns `None` when the root is exceeded first.
pub fn nearest_ancestor<'a>(el: ElementRef<'a>, whitelist: &[&str]) -> Option<ElementRef<'a>> {
    el.ancestors()
        .filter_map(ElementRef::wrap)
        .find(|ancestor| whitelist.contains(&ancestor.value().name()))
}

/// Returns the next sibling element whose tag is in `whitelist`, skipping
/// text nodes, comments and non-whitelisted elements transparently.
pub fn next_sibling_in<'a>(el: ElementRef<'a>, whitelist: &[&str]) -> Option<ElementRef<'a>> {
    el.next_siblings()
        .filter_map(ElementRef::wrap)
        .find(|sibling| whitelist.contains(&sibling.value().name()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use scraper::{Html, Selector};

    fn first<'a>(doc: &'a Html, css: &str) -> ElementRef<'a> {
        let sel = Selector::parse(css).unwrap();
        doc.select(&sel).next().expect("selector must match fixture")
    }

    #[test]
    fn nearest_ancestor_skips_intermediate_tags() {
        let doc = Html::parse_document(
            "<div><p><font><b>Acquisition</b></font></p></div>",
        );
        let bold = first(&doc, "b");

        let hit = nearest_ancestor(bold, &["p", "div", "tr"]).unwrap();
        assert_eq!(hit.value().name(), "p");

        let div = nearest_ancestor(bold, &["div"]).unwrap();
        assert_eq!(div.value().name(), "div");
    }

    #[test]
    fn nearest_ancestor_exhausts_to_none() {
        let doc = Html::parse_document("<p><b>x</b></p>");
        let bold = first(&doc, "b");
        assert!(nearest_ancestor(bold, &["table"]).is_none());
    }

    #[test]
    fn next_sibling_skips_text_and_unlisted_elements() {
        let doc = Html::parse_document(
            "<body><p id='a'>one</p> stray text <span>skip</span><div id='b'>two</div></body>",
        );
        let start = first(&doc, "p");

        let sibling = next_sibling_in(start, &["p", "div", "tr"]).unwrap();
        assert_eq!(sibling.value().name(), "div");
        assert_eq!(sibling.value().attr("id"), Some("b"));
    }

    #[test]
    fn next_sibling_returns_none_at_end() {
        let doc = Html::parse_document("<body><p>only</p><span>tail</span></body>");
        let start = first(&doc, "p");
        assert!(next_sibling_in(start, &["p", "div", "tr"]).is_none());
    }

    #[test]
    fn table_rows_are_siblings_despite_tbody_insertion() {
        // html5ever wraps bare <tr> in <tbody>; row-to-row stepping must
        // still work.
        let doc = Html::parse_document(
            "<table><tr id='r1'><td>a</td></tr><tr id='r2'><td>b</td></tr></table>",
        );
        let row = first(&doc, "tr");
        let next = next_sibling_in(row, &["p", "div", "tr"]).unwrap();
        assert_eq!(next.value().attr("id"), Some("r2"));
    }
}
