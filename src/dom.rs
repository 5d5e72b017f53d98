//! In-memory document model
//!
//! A small arena-backed element tree carrying what the widget needs from a
//! browser DOM: parent/child structure, class lists, input values, inner
//! markup, node containment and page navigation.
//!
//! Slots of discarded subtrees are recycled by `create_element`, so a handle
//! must not be used after [`Document::discard`] released it.

use crate::error::{Result, TypeaheadError};
use maud::Render;
use std::fmt;

/// Handle to an element in a [`Document`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    /// Build a handle from its raw index
    pub fn from_raw(index: usize) -> Self {
        NodeId(index)
    }

    /// Raw arena index
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A single element
#[derive(Debug, Clone, Default)]
pub struct Element {
    /// Tag name (`div`, `input`, ...)
    pub tag: String,
    classes: Vec<String>,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    /// Current value (inputs only)
    value: String,
    /// Markup set via `set_inner_html`, rendered after the element's children
    inner_html: String,
}

impl Element {
    fn new(tag: &str) -> Self {
        Self {
            tag: tag.to_string(),
            ..Default::default()
        }
    }

    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn inner_html(&self) -> &str {
        &self.inner_html
    }
}

/// Element tree plus the page location
#[derive(Debug, Clone)]
pub struct Document {
    nodes: Vec<Option<Element>>,
    /// Released slots, reused before the arena grows
    free: Vec<usize>,
    body: NodeId,
    location: Option<String>,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    /// Create an empty document with a `body` root
    pub fn new() -> Self {
        Self {
            nodes: vec![Some(Element::new("body"))],
            free: Vec::new(),
            body: NodeId(0),
            location: None,
        }
    }

    pub fn body(&self) -> NodeId {
        self.body
    }

    /// Create a detached element
    pub fn create_element(&mut self, tag: &str) -> NodeId {
        match self.free.pop() {
            Some(slot) => {
                self.nodes[slot] = Some(Element::new(tag));
                NodeId(slot)
            }
            None => {
                self.nodes.push(Some(Element::new(tag)));
                NodeId(self.nodes.len() - 1)
            }
        }
    }

    /// Number of elements currently allocated, attached or not
    pub fn live_count(&self) -> usize {
        self.nodes.len() - self.free.len()
    }

    fn slot(&self, id: NodeId) -> Option<&Element> {
        self.nodes.get(id.0).and_then(Option::as_ref)
    }

    /// Look up an element
    pub fn get(&self, id: NodeId) -> Result<&Element> {
        self.slot(id).ok_or(TypeaheadError::NoSuchNode(id))
    }

    fn get_mut(&mut self, id: NodeId) -> Result<&mut Element> {
        self.nodes
            .get_mut(id.0)
            .and_then(Option::as_mut)
            .ok_or(TypeaheadError::NoSuchNode(id))
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.slot(id).and_then(|e| e.parent)
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.slot(id).map(|e| e.children.as_slice()).unwrap_or(&[])
    }

    /// Detach `id` from its parent (no-op when already detached)
    pub fn remove(&mut self, id: NodeId) -> Result<()> {
        let parent = self.get(id)?.parent;
        if let Some(parent) = parent {
            self.get_mut(parent)?.children.retain(|c| *c != id);
            self.get_mut(id)?.parent = None;
        }
        Ok(())
    }

    /// Append `child` as the last child of `parent`, moving it if needed
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> Result<()> {
        self.get(parent)?;
        if self.contains(child, parent) {
            return Err(TypeaheadError::HierarchyRequest(parent));
        }
        self.remove(child)?;
        self.get_mut(parent)?.children.push(child);
        self.get_mut(child)?.parent = Some(parent);
        Ok(())
    }

    /// Insert `child` into `parent` right before `reference`
    pub fn insert_before(&mut self, parent: NodeId, child: NodeId, reference: NodeId) -> Result<()> {
        if self.parent(reference) != Some(parent) {
            return Err(TypeaheadError::NotAttachedToTree(reference));
        }
        if self.contains(child, parent) {
            return Err(TypeaheadError::HierarchyRequest(parent));
        }
        self.remove(child)?;
        let siblings = &mut self.get_mut(parent)?.children;
        let position = siblings
            .iter()
            .position(|c| *c == reference)
            .unwrap_or(siblings.len());
        siblings.insert(position, child);
        self.get_mut(child)?.parent = Some(parent);
        Ok(())
    }

    /// Detach `id` and release it together with its whole subtree
    pub fn discard(&mut self, id: NodeId) -> Result<()> {
        if id == self.body {
            return Err(TypeaheadError::HierarchyRequest(id));
        }
        self.remove(id)?;

        let mut pending = vec![id];
        while let Some(current) = pending.pop() {
            if let Some(element) = self.nodes.get_mut(current.0).and_then(Option::take) {
                pending.extend(element.children);
                self.free.push(current.0);
            }
        }
        Ok(())
    }

    /// `true` if `node` is `ancestor` or one of its descendants
    pub fn contains(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut current = Some(node);
        while let Some(id) = current {
            if id == ancestor {
                return true;
            }
            current = self.parent(id);
        }
        false
    }

    /// `true` if `id` is reachable from the body
    pub fn is_connected(&self, id: NodeId) -> bool {
        self.contains(self.body, id)
    }

    // ========================================================================
    // Classes
    // ========================================================================

    pub fn add_class(&mut self, id: NodeId, class: &str) -> Result<()> {
        let classes = &mut self.get_mut(id)?.classes;
        if !classes.iter().any(|c| c == class) {
            classes.push(class.to_string());
        }
        Ok(())
    }

    pub fn remove_class(&mut self, id: NodeId, class: &str) -> Result<()> {
        self.get_mut(id)?.classes.retain(|c| c != class);
        Ok(())
    }

    pub fn has_class(&self, id: NodeId, class: &str) -> bool {
        self.slot(id)
            .is_some_and(|e| e.classes.iter().any(|c| c == class))
    }

    /// Replace the class list from a space separated string
    pub fn set_class_name(&mut self, id: NodeId, class_name: &str) -> Result<()> {
        self.get_mut(id)?.classes = class_name.split_whitespace().map(str::to_string).collect();
        Ok(())
    }

    // ========================================================================
    // Content
    // ========================================================================

    pub fn value(&self, id: NodeId) -> Result<&str> {
        Ok(&self.get(id)?.value)
    }

    pub fn set_value(&mut self, id: NodeId, value: &str) -> Result<()> {
        self.get_mut(id)?.value = value.to_string();
        Ok(())
    }

    /// Set trusted markup rendered inside the element
    pub fn set_inner_html(&mut self, id: NodeId, html: impl Into<String>) -> Result<()> {
        self.get_mut(id)?.inner_html = html.into();
        Ok(())
    }

    // ========================================================================
    // Navigation
    // ========================================================================

    /// Record a full-page navigation
    pub fn navigate(&mut self, url: &str) {
        self.location = Some(url.to_string());
    }

    /// Last navigation target, if any
    pub fn location(&self) -> Option<&str> {
        self.location.as_deref()
    }

    // ========================================================================
    // Serialization
    // ========================================================================

    /// Serialize `id` and its subtree to HTML
    pub fn outer_html(&self, id: NodeId) -> String {
        let mut out = String::new();
        self.write_html(id, &mut out);
        out
    }

    fn write_html(&self, id: NodeId, out: &mut String) {
        let Some(element) = self.slot(id) else {
            return;
        };

        out.push('<');
        out.push_str(&element.tag);
        if !element.classes.is_empty() {
            out.push_str(" class=\"");
            out.push_str(&element.classes.join(" ").render().into_string());
            out.push('"');
        }
        if element.tag == "input" {
            out.push_str(" value=\"");
            out.push_str(&element.value.render().into_string());
            out.push_str("\">");
            return;
        }
        out.push('>');

        for child in &element.children {
            self.write_html(*child, out);
        }
        out.push_str(&element.inner_html);

        out.push_str("</");
        out.push_str(&element.tag);
        out.push('>');
    }
}
