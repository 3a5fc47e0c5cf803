use crate::document::{Document, ElementId};
use crate::scope::resolve_expression_scope;

/// Finds the locale that applies to an element.
#[derive(Debug, Clone, Copy)]
pub struct LocaleResolver<'a> {
    pub locale_attribute: &'a str,
    pub scope_attribute: &'a str,
    pub default_locale: &'a str,
}

impl LocaleResolver<'_> {
    /// The element's own locale attribute, then its scope element's when it
    /// is scope-marked, then the root's, then the default.
    pub fn resolve<D: Document + ?Sized>(&self, document: &D, element: ElementId) -> String {
        self.attribute(document, element)
            .or_else(|| {
                if !document.has_attribute(element, self.scope_attribute) {
                    return None;
                }
                resolve_expression_scope(document, element, self.scope_attribute)
                    .element()
                    .and_then(|scope| self.attribute(document, scope))
            })
            .or_else(|| self.attribute(document, document.root()))
            .unwrap_or(self.default_locale)
            .to_owned()
    }

    fn attribute<'d, D: Document + ?Sized>(&self, document: &'d D, element: ElementId) -> Option<&'d str> {
        document
            .attribute(element, self.locale_attribute)
            .map(str::trim)
            .filter(|locale| !locale.is_empty())
    }
}
