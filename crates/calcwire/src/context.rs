//! Builds the bindings an expression is evaluated against.

use indexmap::IndexMap;
use smallvec::SmallVec;

use crate::document::Document;
use crate::evaluator::Bindings;
use crate::locale::LocaleResolver;
use crate::parser::Formula;
use crate::registry::{SourceRegistry, or_zero};
use crate::scope::ScopeBoundary;
use crate::value::Value;

type Values = SmallVec<[f64; 4]>;

/// One source binds a number; several sources sharing a name bind a list.
fn group_value(values: Values) -> Value {
    match values.as_slice() {
        [single] => Value::Number(*single),
        _ => Value::List(values.into_vec()),
    }
}

/// Document-wide values of every identifier, in registration order.
fn global_groups<'s, D: Document + ?Sized>(
    document: &D,
    sources: &'s SourceRegistry,
    resolver: &LocaleResolver,
) -> IndexMap<&'s str, Values> {
    let mut groups: IndexMap<&str, Values> = IndexMap::new();
    for source in sources.iter() {
        groups
            .entry(source.identifier.as_str())
            .or_default()
            .push(or_zero(source.read_value(document, resolver)));
    }
    groups
}

/// Bindings for `formula` evaluated in `scope`.
///
/// Document scope sees every source. Element scope sees the first source
/// of each name inside the boundary; names the formula reads that have no
/// source in scope fall back to their document-wide value.
pub fn build_context<'a, D: Document + ?Sized>(
    document: &'a D,
    sources: &'a SourceRegistry,
    scope: ScopeBoundary,
    resolver: LocaleResolver<'a>,
    formula: &Formula,
) -> Bindings<'a> {
    let mut bindings = Bindings::new()
        .with_sum_values_with_id(move |identifier| sources.sum(document, &resolver, identifier));

    if scope.is_document() {
        for (identifier, values) in global_groups(document, sources, &resolver) {
            bindings.bind(identifier, group_value(values));
        }
        return bindings;
    }

    for source in sources.iter() {
        if bindings.contains(&source.identifier) || !scope.contains(document, source.anchor) {
            continue;
        }
        let value = or_zero(source.read_value(document, &resolver));
        bindings.bind(source.identifier.clone(), Value::Number(value));
    }

    for name in formula.referenced_names() {
        if bindings.contains(name) {
            continue;
        }
        let values: Values = sources
            .by_identifier(name)
            .map(|source| or_zero(source.read_value(document, &resolver)))
            .collect();
        if !values.is_empty() {
            bindings.bind(name, group_value(values));
        }
    }
    bindings
}
