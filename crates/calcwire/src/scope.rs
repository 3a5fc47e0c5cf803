//! Scope boundaries: which sources an expression can see by name.

use tracing::debug;

use crate::document::{Document, ElementId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScopeBoundary {
    Document,
    Element(ElementId),
}

impl ScopeBoundary {
    pub fn element(self) -> Option<ElementId> {
        match self {
            Self::Document => None,
            Self::Element(element) => Some(element),
        }
    }

    pub fn is_document(self) -> bool {
        matches!(self, Self::Document)
    }

    /// Document contains everything; an element contains itself and its descendants.
    pub fn contains<D: Document + ?Sized>(self, document: &D, element: ElementId) -> bool {
        match self {
            Self::Document => true,
            Self::Element(boundary) => document.contains(boundary, element),
        }
    }
}

/// Nearest element matching `selector`, starting at `anchor` itself.
/// A missing or blank selector, or no match, means the whole document.
pub fn find_scope<D: Document + ?Sized>(
    document: &D,
    anchor: ElementId,
    selector: Option<&str>,
) -> ScopeBoundary {
    let Some(selector) = selector.map(str::trim).filter(|selector| !selector.is_empty()) else {
        return ScopeBoundary::Document;
    };
    match document
        .ancestors(anchor)
        .find(|element| document.matches(*element, selector))
    {
        Some(element) => ScopeBoundary::Element(element),
        None => {
            debug!(selector, "no scope element matched, using the document");
            ScopeBoundary::Document
        }
    }
}

/// Scope of an expression anchored at `anchor`: the nearest element carrying
/// `scope_attribute`, or the element its selector value names.
pub fn resolve_expression_scope<D: Document + ?Sized>(
    document: &D,
    anchor: ElementId,
    scope_attribute: &str,
) -> ScopeBoundary {
    let Some(marked) = document
        .ancestors(anchor)
        .find(|element| document.has_attribute(*element, scope_attribute))
    else {
        return ScopeBoundary::Document;
    };
    match document
        .attribute(marked, scope_attribute)
        .map(str::trim)
        .filter(|selector| !selector.is_empty())
    {
        Some(selector) => find_scope(document, marked, Some(selector)),
        None => ScopeBoundary::Element(marked),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{Element, MemoryDocument};

    const SCOPE: &str = "x-calculator-scope";

    #[test]
    fn find_scope_walks_up_inclusively() {
        let mut document = MemoryDocument::new();
        let body = document.root();
        let card = document.append(body, Element::new("div").attr("class", "card"));
        let span = document.append(card, Element::new("span"));

        assert_eq!(find_scope(&document, span, Some(".card")), ScopeBoundary::Element(card));
        assert_eq!(find_scope(&document, card, Some(".card")), ScopeBoundary::Element(card));
        assert_eq!(find_scope(&document, span, Some(".missing")), ScopeBoundary::Document);
        assert_eq!(find_scope(&document, span, Some("  ")), ScopeBoundary::Document);
        assert_eq!(find_scope(&document, span, None), ScopeBoundary::Document);
    }

    #[test]
    fn bare_marker_scopes_to_marked_element() {
        let mut document = MemoryDocument::new();
        let body = document.root();
        let row = document.append(body, Element::new("div").attr(SCOPE, ""));
        let total = document.append(row, Element::new("span"));

        assert_eq!(resolve_expression_scope(&document, total, SCOPE), ScopeBoundary::Element(row));
        assert_eq!(resolve_expression_scope(&document, row, SCOPE), ScopeBoundary::Element(row));
    }

    #[test]
    fn marker_with_selector_searches_from_marked_element() {
        let mut document = MemoryDocument::new();
        let body = document.root();
        let table = document.append(body, Element::new("table").attr("class", "invoice"));
        let row = document.append(table, Element::new("tr").attr(SCOPE, ".invoice"));
        let cell = document.append(row, Element::new("td"));

        assert_eq!(resolve_expression_scope(&document, cell, SCOPE), ScopeBoundary::Element(table));
    }

    #[test]
    fn unmarked_anchor_is_document_scoped() {
        let mut document = MemoryDocument::new();
        let body = document.root();
        let span = document.append(body, Element::new("span"));
        assert_eq!(resolve_expression_scope(&document, span, SCOPE), ScopeBoundary::Document);
        assert!(ScopeBoundary::Document.contains(&document, span));
    }
}
