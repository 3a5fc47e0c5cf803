//! CSS selector subset for [`MemoryDocument`](super::MemoryDocument):
//! type, `*`, `#id`, `.class`, `[attr]`, `[attr=value]`, compounds,
//! descendant combinators and comma-separated lists.

use chumsky::prelude::*;

use super::{Document, ElementId, MemoryDocument};

#[derive(Debug, Clone, PartialEq, Eq)]
enum Condition {
    Id(String),
    Class(String),
    Attribute { name: String, value: Option<String> },
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Compound {
    tag: Option<String>,
    conditions: Vec<Condition>,
}

/// A parsed selector list. Each entry is a chain of compounds joined by
/// descendant combinators, outermost first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selector {
    alternatives: Vec<Vec<Compound>>,
}

fn selector_parser<'src>() -> impl Parser<'src, &'src str, Selector, extra::Err<Rich<'src, char>>>
{
    let name = any()
        .filter(|c: &char| c.is_ascii_alphanumeric() || *c == '-' || *c == '_')
        .repeated()
        .at_least(1)
        .to_slice();

    let quoted = choice((
        just('"')
            .ignore_then(none_of('"').repeated().to_slice())
            .then_ignore(just('"')),
        just('\'')
            .ignore_then(none_of('\'').repeated().to_slice())
            .then_ignore(just('\'')),
    ));

    let attribute = just('[')
        .ignore_then(name.clone().padded())
        .then(just('=').padded().ignore_then(quoted.or(name.clone())).or_not())
        .then_ignore(just(']'))
        .map(|(name, value): (&str, Option<&str>)| Condition::Attribute {
            name: name.to_owned(),
            value: value.map(str::to_owned),
        });

    let condition = choice((
        just('#').ignore_then(name.clone()).map(|id: &str| Condition::Id(id.to_owned())),
        just('.').ignore_then(name.clone()).map(|class: &str| Condition::Class(class.to_owned())),
        attribute,
    ));

    let tag = choice((
        just('*').to(None),
        name.map(|tag: &str| Some(tag.to_ascii_lowercase())),
    ));

    let compound = tag
        .or_not()
        .then(condition.repeated().collect::<Vec<_>>())
        .try_map(|(tag, conditions), span| {
            if tag.is_none() && conditions.is_empty() {
                Err(Rich::custom(span, "empty selector"))
            } else {
                Ok(Compound {
                    tag: tag.flatten(),
                    conditions,
                })
            }
        });

    compound
        .padded()
        .repeated()
        .at_least(1)
        .collect::<Vec<_>>()
        .separated_by(just(','))
        .at_least(1)
        .collect::<Vec<_>>()
        .then_ignore(end())
        .map(|alternatives| Selector { alternatives })
}

impl Selector {
    pub fn parse(text: &str) -> Option<Self> {
        selector_parser().parse(text).into_result().ok()
    }

    pub fn matches(&self, document: &MemoryDocument, element: ElementId) -> bool {
        self.alternatives
            .iter()
            .any(|chain| chain_matches(chain, document, element))
    }
}

fn chain_matches(chain: &[Compound], document: &MemoryDocument, element: ElementId) -> bool {
    let Some((last, outer)) = chain.split_last() else {
        return false;
    };
    if !compound_matches(last, document, element) {
        return false;
    }
    let mut ancestors = document.ancestors(element).skip(1);
    outer.iter().rev().all(|compound| {
        ancestors
            .by_ref()
            .any(|ancestor| compound_matches(compound, document, ancestor))
    })
}

fn compound_matches(compound: &Compound, document: &MemoryDocument, element: ElementId) -> bool {
    if let Some(tag) = &compound.tag {
        if document.tag(element) != Some(tag.as_str()) {
            return false;
        }
    }
    compound.conditions.iter().all(|condition| match condition {
        Condition::Id(id) => document.attribute(element, "id") == Some(id.as_str()),
        Condition::Class(class) => document
            .attribute(element, "class")
            .is_some_and(|classes| classes.split_ascii_whitespace().any(|c| c == class)),
        Condition::Attribute { name, value: None } => document.has_attribute(element, name),
        Condition::Attribute {
            name,
            value: Some(value),
        } => document.attribute(element, name) == Some(value.as_str()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::Element;

    #[test]
    fn parses_compounds_and_lists() {
        assert!(Selector::parse(".card").is_some());
        assert!(Selector::parse("div#main.card[data-x='1']").is_some());
        assert!(Selector::parse("section .row, .other").is_some());
        assert!(Selector::parse("").is_none());
        assert!(Selector::parse(".").is_none());
        assert!(Selector::parse("[unclosed").is_none());
    }

    #[test]
    fn matches_descendants() {
        let mut document = MemoryDocument::new();
        let body = document.root();
        let section = document.append(body, Element::new("section").attr("class", "cart wide"));
        let row = document.append(section, Element::new("div").attr("data-row", "a"));
        let span = document.append(row, Element::new("span"));

        let descendant = Selector::parse("section.cart span").unwrap();
        assert!(descendant.matches(&document, span));
        assert!(!descendant.matches(&document, row));

        let attribute = Selector::parse("[data-row=a]").unwrap();
        assert!(attribute.matches(&document, row));
        assert!(!attribute.matches(&document, section));

        let list = Selector::parse("p, .wide").unwrap();
        assert!(list.matches(&document, section));
    }
}
