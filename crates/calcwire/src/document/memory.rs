use indexmap::IndexMap;

use super::selector::Selector;
use super::{Document, ElementId, ElementKind};

/// Element description used to build a [`MemoryDocument`] tree.
#[derive(Debug, Clone, Default)]
pub struct Element {
    tag: String,
    attributes: IndexMap<String, String>,
    text: String,
    children: Vec<Element>,
}

impl Element {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            ..Self::default()
        }
    }

    /// `<input type="...">`
    pub fn input(input_type: &str) -> Self {
        Self::new("input").attr("type", input_type)
    }

    pub fn attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    /// Initial value of an input, i.e. its `value` attribute.
    pub fn value(self, value: impl Into<String>) -> Self {
        self.attr("value", value)
    }

    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    pub fn child(mut self, child: Element) -> Self {
        self.children.push(child);
        self
    }
}

struct Node {
    generation: u32,
    live: bool,
    tag: String,
    kind: ElementKind,
    attributes: IndexMap<String, String>,
    parent: Option<ElementId>,
    children: Vec<ElementId>,
    text: String,
    value: String,
    checked: bool,
}

impl Node {
    fn vacant() -> Self {
        Self {
            generation: 0,
            live: false,
            tag: String::new(),
            kind: ElementKind::Display,
            attributes: IndexMap::new(),
            parent: None,
            children: Vec::new(),
            text: String::new(),
            value: String::new(),
            checked: false,
        }
    }
}

/// In-memory element tree with generational element handles.
pub struct MemoryDocument {
    nodes: Vec<Node>,
    free_list: Vec<u32>,
    root: ElementId,
}

impl MemoryDocument {
    /// An empty document whose root is a `body` element.
    pub fn new() -> Self {
        let mut document = Self {
            nodes: Vec::new(),
            free_list: Vec::new(),
            root: ElementId {
                index: 0,
                generation: 0,
            },
        };
        document.root = document.create(None, &Element::new("body"));
        document
    }

    pub fn is_valid(&self, element: ElementId) -> bool {
        self.node(element).is_some()
    }

    /// Number of live elements, root included.
    pub fn len(&self) -> usize {
        self.nodes.iter().filter(|node| node.live).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Append `element` and its children under `parent`. Returns the new handle.
    pub fn append(&mut self, parent: ElementId, element: Element) -> ElementId {
        let id = self.create(Some(parent), &element);
        if let Some(parent) = self.node_mut(parent) {
            parent.children.push(id);
        }
        id
    }

    /// Remove `element` and its subtree. Returns removed handles in document order.
    pub fn remove(&mut self, element: ElementId) -> Vec<ElementId> {
        if element == self.root || !self.is_valid(element) {
            return Vec::new();
        }
        let removed = self.descendants(element);
        if let Some(parent) = self.parent(element).and_then(|parent| self.node_mut(parent)) {
            parent.children.retain(|child| *child != element);
        }
        for id in &removed {
            self.free(*id);
        }
        removed
    }

    pub fn tag(&self, element: ElementId) -> Option<&str> {
        self.node(element).map(|node| node.tag.as_str())
    }

    pub fn set_attribute(&mut self, element: ElementId, name: &str, value: &str) {
        if let Some(node) = self.node_mut(element) {
            node.attributes.insert(name.to_owned(), value.to_owned());
            if name.eq_ignore_ascii_case("type") {
                node.kind = ElementKind::from_tag(&node.tag, Some(value));
            }
        }
    }

    pub fn remove_attribute(&mut self, element: ElementId, name: &str) {
        if let Some(node) = self.node_mut(element) {
            node.attributes.shift_remove(name);
        }
    }

    /// What a user typing into the element would leave behind.
    pub fn set_value(&mut self, element: ElementId, value: &str) {
        self.set_content(element, value);
    }

    pub fn set_checked(&mut self, element: ElementId, checked: bool) {
        if let Some(node) = self.node_mut(element) {
            node.checked = checked;
        }
    }

    /// First element in document order matching `selector`.
    pub fn query(&self, selector: &str) -> Option<ElementId> {
        self.query_all(selector).into_iter().next()
    }

    pub fn query_all(&self, selector: &str) -> Vec<ElementId> {
        let Some(selector) = Selector::parse(selector) else {
            return Vec::new();
        };
        self.descendants(self.root)
            .into_iter()
            .filter(|element| selector.matches(self, *element))
            .collect()
    }

    pub fn get_element_by_id(&self, id: &str) -> Option<ElementId> {
        self.descendants(self.root)
            .into_iter()
            .find(|element| self.attribute(*element, "id") == Some(id))
    }

    fn create(&mut self, parent: Option<ElementId>, element: &Element) -> ElementId {
        let id = self.alloc();
        let kind = ElementKind::from_tag(
            &element.tag,
            element.attributes.get("type").map(String::as_str),
        );
        let value = match kind {
            ElementKind::TextArea => element.text.clone(),
            ElementKind::Display => String::new(),
            _ => element.attributes.get("value").cloned().unwrap_or_default(),
        };
        let node = &mut self.nodes[id.index as usize];
        node.live = true;
        node.tag = element.tag.to_ascii_lowercase();
        node.kind = kind;
        node.attributes = element.attributes.clone();
        node.parent = parent;
        node.children = Vec::new();
        node.text = element.text.clone();
        node.value = value;
        node.checked = element.attributes.contains_key("checked");

        let children = element
            .children
            .iter()
            .map(|child| self.create(Some(id), child))
            .collect();
        self.nodes[id.index as usize].children = children;
        id
    }

    fn alloc(&mut self) -> ElementId {
        if let Some(index) = self.free_list.pop() {
            ElementId {
                index,
                generation: self.nodes[index as usize].generation,
            }
        } else {
            let index = self.nodes.len() as u32;
            self.nodes.push(Node::vacant());
            ElementId {
                index,
                generation: 0,
            }
        }
    }

    fn free(&mut self, element: ElementId) {
        if let Some(node) = self.node_mut(element) {
            let generation = node.generation + 1;
            *node = Node::vacant();
            node.generation = generation;
            self.free_list.push(element.index);
        }
    }

    fn node(&self, element: ElementId) -> Option<&Node> {
        self.nodes
            .get(element.index as usize)
            .filter(|node| node.live && node.generation == element.generation)
    }

    fn node_mut(&mut self, element: ElementId) -> Option<&mut Node> {
        self.nodes
            .get_mut(element.index as usize)
            .filter(|node| node.live && node.generation == element.generation)
    }

    fn text_content(&self, element: ElementId, output: &mut String) {
        if let Some(node) = self.node(element) {
            output.push_str(&node.text);
            for child in &node.children {
                self.text_content(*child, output);
            }
        }
    }
}

impl Default for MemoryDocument {
    fn default() -> Self {
        Self::new()
    }
}

impl Document for MemoryDocument {
    fn root(&self) -> ElementId {
        self.root
    }

    fn parent(&self, element: ElementId) -> Option<ElementId> {
        self.node(element).and_then(|node| node.parent)
    }

    fn children(&self, element: ElementId) -> Vec<ElementId> {
        self.node(element)
            .map(|node| node.children.clone())
            .unwrap_or_default()
    }

    fn kind(&self, element: ElementId) -> ElementKind {
        self.node(element)
            .map_or(ElementKind::Display, |node| node.kind)
    }

    fn attribute(&self, element: ElementId, name: &str) -> Option<&str> {
        self.node(element)
            .and_then(|node| node.attributes.get(name))
            .map(String::as_str)
    }

    fn matches(&self, element: ElementId, selector: &str) -> bool {
        Selector::parse(selector).is_some_and(|selector| selector.matches(self, element))
    }

    fn content(&self, element: ElementId) -> Option<String> {
        let node = self.node(element)?;
        if node.kind.is_edit_field() {
            return Some(node.value.clone());
        }
        let mut text = String::new();
        self.text_content(element, &mut text);
        Some(text)
    }

    /// Edit fields take the new value; other elements lose their children,
    /// as with assigning `textContent`.
    fn set_content(&mut self, element: ElementId, content: &str) {
        let Some(node) = self.node_mut(element) else {
            return;
        };
        if node.kind.is_edit_field() {
            node.value = content.to_owned();
            return;
        }
        node.text = content.to_owned();
        let children = std::mem::take(&mut node.children);
        for child in children {
            for id in self.descendants(child) {
                self.free(id);
            }
        }
    }

    fn is_checked(&self, element: ElementId) -> bool {
        self.node(element).is_some_and(|node| node.checked)
    }
}
