//! The document the engine binds to.
//!
//! A host (browser bridge, native UI toolkit, test harness) implements
//! [`Document`]; [`MemoryDocument`] is a complete in-memory tree.

pub mod memory;
pub mod selector;

pub use memory::{Element, MemoryDocument};

/// Generational handle to an element.
/// A handle to a removed element never aliases a newer one.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, PartialOrd, Ord)]
pub struct ElementId {
    pub index: u32,
    pub generation: u32,
}

/// How an element exposes its content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElementKind {
    /// Any element whose content is its text.
    Display,
    NumberInput,
    TextInput,
    TextArea,
    Checkbox,
}

impl ElementKind {
    /// Edit fields hold a value instead of text content.
    pub fn is_edit_field(self) -> bool {
        !matches!(self, Self::Display)
    }

    /// Derive the kind from a tag name and its `type` attribute.
    pub fn from_tag(tag: &str, input_type: Option<&str>) -> Self {
        if tag.eq_ignore_ascii_case("textarea") {
            return Self::TextArea;
        }
        if !tag.eq_ignore_ascii_case("input") {
            return Self::Display;
        }
        match input_type.map(str::to_ascii_lowercase).as_deref() {
            Some("number") => Self::NumberInput,
            Some("checkbox") => Self::Checkbox,
            _ => Self::TextInput,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DocumentEvent {
    Input,
    Change,
    KeyUp,
    Focus,
    Blur,
}

impl DocumentEvent {
    /// Events after which a source value may differ.
    pub fn changes_value(self) -> bool {
        matches!(self, Self::Input | Self::Change | Self::KeyUp)
    }
}

pub trait Document {
    fn root(&self) -> ElementId;

    fn parent(&self, element: ElementId) -> Option<ElementId>;

    /// Children in document order.
    fn children(&self, element: ElementId) -> Vec<ElementId>;

    fn kind(&self, element: ElementId) -> ElementKind;

    fn attribute(&self, element: ElementId, name: &str) -> Option<&str>;

    fn matches(&self, element: ElementId, selector: &str) -> bool;

    /// Value of an edit field or text content of anything else.
    fn content(&self, element: ElementId) -> Option<String>;

    fn set_content(&mut self, element: ElementId, content: &str);

    fn is_checked(&self, _element: ElementId) -> bool {
        false
    }

    fn has_attribute(&self, element: ElementId, name: &str) -> bool {
        self.attribute(element, name).is_some()
    }

    /// The element itself, then its ancestors up to the root.
    fn ancestors(&self, element: ElementId) -> Ancestors<'_, Self> {
        Ancestors {
            document: self,
            next: Some(element),
        }
    }

    /// Whether `element` is `ancestor` or one of its descendants.
    fn contains(&self, ancestor: ElementId, element: ElementId) -> bool {
        self.ancestors(element).any(|candidate| candidate == ancestor)
    }

    /// Subtree of `element` in document order, `element` first.
    fn descendants(&self, element: ElementId) -> Vec<ElementId> {
        let mut ordered = Vec::new();
        let mut stack = vec![element];
        while let Some(next) = stack.pop() {
            ordered.push(next);
            stack.extend(self.children(next).into_iter().rev());
        }
        ordered
    }
}

pub struct Ancestors<'document, D: Document + ?Sized> {
    document: &'document D,
    next: Option<ElementId>,
}

impl<D: Document + ?Sized> Iterator for Ancestors<'_, D> {
    type Item = ElementId;

    fn next(&mut self) -> Option<ElementId> {
        let current = self.next?;
        self.next = self.document.parent(current);
        Some(current)
    }
}
