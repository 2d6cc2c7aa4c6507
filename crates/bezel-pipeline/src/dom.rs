//! Small helpers over `scraper` element trees.
//!
//! Selectors are compile-time constants; a selector that fails to parse
//! simply matches nothing, the same way an outdated selector matches
//! nothing on a changed page.

use scraper::{ElementRef, Selector};

/// First element under `scope` matching `selector`.
pub(crate) fn first<'a>(scope: ElementRef<'a>, selector: &str) -> Option<ElementRef<'a>> {
    let sel = Selector::parse(selector).ok()?;
    scope.select(&sel).next()
}

/// All elements under `scope` matching `selector`, in document order.
pub(crate) fn all<'a>(scope: ElementRef<'a>, selector: &str) -> Vec<ElementRef<'a>> {
    match Selector::parse(selector) {
        Ok(sel) => scope.select(&sel).collect(),
        Err(_) => Vec::new(),
    }
}

/// Rendered text of `el` with whitespace collapsed and trimmed.
pub(crate) fn text(el: ElementRef<'_>) -> String {
    el.text().collect::<String>().split_whitespace().collect::<Vec<_>>().join(" ")
}
