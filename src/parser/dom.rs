//! Typed lookups over a parsed element tree.
//!
//! Every accessor returns `Option` so the extractor can turn a missing node
//! into the matching `ExtractError` instead of indexing blindly.

use scraper::ElementRef;

/// Descendant elements of `root` with the given tag name, in document order.
pub fn find_all<'a>(root: ElementRef<'a>, tag: &'a str) -> impl Iterator<Item = ElementRef<'a>> + 'a {
    root.descendants()
        .filter_map(ElementRef::wrap)
        .filter(move |el| el.value().name() == tag)
}

/// First descendant `<tag class="... class ...">`.
pub fn find_by_class<'a>(root: ElementRef<'a>, tag: &'a str, class: &str) -> Option<ElementRef<'a>> {
    find_all(root, tag).find(|el| el.value().classes().any(|c| c == class))
}

/// The `n`th (zero-based) descendant of `parent` with the given tag name.
pub fn nth_by_tag<'a>(parent: ElementRef<'a>, tag: &'a str, n: usize) -> Option<ElementRef<'a>> {
    find_all(parent, tag).nth(n)
}

/// The `n`th (zero-based) direct child element of `parent`.
pub fn nth_child(parent: ElementRef<'_>, n: usize) -> Option<ElementRef<'_>> {
    parent.children().filter_map(ElementRef::wrap).nth(n)
}

/// Trimmed text of a table cell's leaf value.
///
/// Cells normally wrap their value in a link (`<td><a>10BERLIN180</a></td>`);
/// a bare text cell is read directly. Whitespace-only values count as absent.
pub fn leaf_text(cell: ElementRef<'_>) -> Option<String> {
    let leaf = nth_child(cell, 0).unwrap_or(cell);
    let text = leaf.text().collect::<String>();
    let text = text.trim();
    if text.is_empty() {
        None
    } else {
        Some(text.to_string())
    }
}
