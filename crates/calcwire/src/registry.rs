//! Registries of sources and expressions, keyed by anchor element and
//! enumerated in registration order.

use indexmap::IndexMap;

use crate::config::DependencyMatching;
use crate::document::{Document, ElementId, ElementKind};
use crate::error::FormulaError;
use crate::locale::{LocaleResolver, NumberSymbols, parse_optional, parse_with_symbols};
use crate::parser::Formula;
use crate::scope::ScopeBoundary;

/// Unreadable source values count as zero in aggregates.
pub(crate) fn or_zero(value: f64) -> f64 {
    if value.is_nan() { 0.0 } else { value }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Source {
    pub identifier: String,
    pub anchor: ElementId,
}

impl Source {
    /// Current value of the anchor, NaN when it does not read as a number.
    pub fn read_value<D: Document + ?Sized>(&self, document: &D, resolver: &LocaleResolver) -> f64 {
        match document.kind(self.anchor) {
            ElementKind::Checkbox => {
                if document.is_checked(self.anchor) { 1.0 } else { 0.0 }
            }
            ElementKind::NumberInput => document
                .content(self.anchor)
                .and_then(|value| parse_with_symbols(&value, NumberSymbols::ENGLISH).ok())
                .unwrap_or(f64::NAN),
            ElementKind::TextInput => {
                let content = document.content(self.anchor);
                if let Some(flag) = content.as_deref().and_then(boolean_word) {
                    return flag;
                }
                let locale = resolver.resolve(document, self.anchor);
                parse_optional(content.as_deref(), Some(&locale))
            }
            ElementKind::TextArea | ElementKind::Display => {
                let locale = resolver.resolve(document, self.anchor);
                parse_optional(document.content(self.anchor).as_deref(), Some(&locale))
            }
        }
    }
}

/// Flag words stored in (typically hidden) text inputs.
fn boolean_word(text: &str) -> Option<f64> {
    const TRUE: [&str; 3] = ["true", "yes", "on"];
    const FALSE: [&str; 3] = ["false", "no", "off"];
    let text = text.trim();
    if TRUE.iter().any(|word| text.eq_ignore_ascii_case(word)) {
        Some(1.0)
    } else if FALSE.iter().any(|word| text.eq_ignore_ascii_case(word)) {
        Some(0.0)
    } else {
        None
    }
}

#[derive(Debug, Default)]
pub struct SourceRegistry {
    sources: IndexMap<ElementId, Source>,
}

impl SourceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `anchor` to `identifier`, replacing an earlier binding.
    pub fn register(&mut self, anchor: ElementId, identifier: impl Into<String>) -> Option<Source> {
        self.sources.insert(
            anchor,
            Source {
                identifier: identifier.into(),
                anchor,
            },
        )
    }

    pub fn unregister(&mut self, anchor: ElementId) -> Option<Source> {
        self.sources.shift_remove(&anchor)
    }

    pub fn get(&self, anchor: ElementId) -> Option<&Source> {
        self.sources.get(&anchor)
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Source> {
        self.sources.values()
    }

    pub fn by_identifier<'a>(&'a self, identifier: &'a str) -> impl Iterator<Item = &'a Source> {
        self.iter().filter(move |source| source.identifier == identifier)
    }

    pub fn by_identifier_in_scope<'a, D: Document + ?Sized>(
        &'a self,
        document: &'a D,
        boundary: ScopeBoundary,
        identifier: &'a str,
    ) -> impl Iterator<Item = &'a Source> {
        self.by_identifier(identifier)
            .filter(move |source| boundary.contains(document, source.anchor))
    }

    /// Sum of every source named `identifier`, regardless of scope.
    pub fn sum<D: Document + ?Sized>(&self, document: &D, resolver: &LocaleResolver, identifier: &str) -> f64 {
        self.by_identifier(identifier)
            .map(|source| or_zero(source.read_value(document, resolver)))
            .fold(0.0, |total, value| total + value)
    }

    /// Value of the first source named `identifier` inside `boundary`, or 0.
    pub fn first_in_scope<D: Document + ?Sized>(
        &self,
        document: &D,
        resolver: &LocaleResolver,
        boundary: ScopeBoundary,
        identifier: &str,
    ) -> f64 {
        self.by_identifier_in_scope(document, boundary, identifier)
            .next()
            .map_or(0.0, |source| or_zero(source.read_value(document, resolver)))
    }
}

#[derive(Debug)]
pub struct Expression {
    pub anchor: ElementId,
    pub text: String,
    pub scope: ScopeBoundary,
    pub formula: Result<Formula, FormulaError>,
}

impl Expression {
    /// Whether a change to `identifier` can affect this expression.
    pub fn depends_on(&self, identifier: &str, matching: DependencyMatching) -> bool {
        match matching {
            DependencyMatching::Substring => self.text.contains(identifier),
            DependencyMatching::Referenced => self
                .formula
                .as_ref()
                .is_ok_and(|formula| formula.references(identifier)),
        }
    }
}

#[derive(Debug, Default)]
pub struct ExpressionRegistry {
    expressions: IndexMap<ElementId, Expression>,
}

impl ExpressionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Compile and register `text` at `anchor`. A formula that fails to
    /// compile is kept with its error.
    pub fn register(&mut self, anchor: ElementId, text: impl Into<String>, scope: ScopeBoundary) -> &Expression {
        let text = text.into();
        let formula = Formula::compile(&text);
        self.expressions.insert(
            anchor,
            Expression {
                anchor,
                text,
                scope,
                formula,
            },
        );
        &self.expressions[&anchor]
    }

    pub fn unregister(&mut self, anchor: ElementId) -> Option<Expression> {
        self.expressions.shift_remove(&anchor)
    }

    pub fn get(&self, anchor: ElementId) -> Option<&Expression> {
        self.expressions.get(&anchor)
    }

    pub fn len(&self) -> usize {
        self.expressions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.expressions.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Expression> {
        self.expressions.values()
    }

    pub fn anchors(&self) -> Vec<ElementId> {
        self.expressions.keys().copied().collect()
    }

    /// Expressions a change to `identifier` at `changed` must recompute.
    /// Element-scoped expressions ignore changes outside their scope.
    pub fn referencing<'a, D: Document + ?Sized>(
        &'a self,
        document: &'a D,
        identifier: &'a str,
        changed: Option<ElementId>,
        matching: DependencyMatching,
    ) -> impl Iterator<Item = &'a Expression> {
        self.iter().filter(move |expression| {
            expression.depends_on(identifier, matching)
                && match (expression.scope, changed) {
                    (ScopeBoundary::Element(_), Some(changed)) => {
                        expression.scope.contains(document, changed)
                    }
                    _ => true,
                }
        })
    }
}
