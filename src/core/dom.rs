//! In-memory element tree — the retained document that the UI renders.
//!
//! The [`Element`] is the fundamental unit – it holds the tag name, attribute
//! and style maps, class list, and the visual fields (`shown`, opacity) that
//! the fade engine mutates.  Elements link to each other via indices into an
//! arena (the [`Document`] struct).  Using an arena avoids recursive `Box`
//! allocations, is cache-friendly, and makes borrowing trivial.
//!
//! Unlike a build-once tree, the document mutates shape at runtime: removal
//! detaches a subtree (the nodes stay alive and may be re-inserted), and the
//! structural operations return [`DomError`] when asked to do something the
//! tree cannot represent (cycles, sibling-inserting the root, …).

use std::collections::HashMap;

use thiserror::Error;

// ───────────────────────────────────────── errors ────────────

/// Structural errors raised by document mutation.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DomError {
    #[error("unknown node id {0}")]
    UnknownNode(NodeId),
    #[error("node {0} has no parent")]
    NoParent(NodeId),
    #[error("operation would make node {0} its own ancestor")]
    WouldCycle(NodeId),
    #[error("the document root cannot be moved or removed")]
    IsRoot,
}

// ───────────────────────────────────────── element ───────────

/// Index into [`Document::nodes`].
pub type NodeId = usize;

/// A single element in the arena-allocated document.
#[derive(Debug, Clone)]
pub struct Element {
    pub tag: String,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
    /// Attribute map (`id` included — see [`Element::element_id`]).
    pub attrs: HashMap<String, String>,
    /// Class list — ordered, duplicate-free.
    pub classes: Vec<String>,
    /// Style property map (free-form key → value).
    pub styles: HashMap<String, String>,
    /// Direct text content of this element (not including descendants).
    pub text: Option<String>,
    /// Form value, for input-like elements.
    pub value: Option<String>,
    /// Whether the element is displayed.  A hidden element hides its
    /// whole subtree.
    pub shown: bool,
    /// Own opacity in [0, 1].  Private so the clamp can't be bypassed.
    opacity: f32,
}

impl Element {
    fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            parent: None,
            children: Vec::new(),
            attrs: HashMap::new(),
            classes: Vec::new(),
            styles: HashMap::new(),
            text: None,
            value: None,
            shown: true,
            opacity: 1.0,
        }
    }

    /// The `id` attribute, if set.
    pub fn element_id(&self) -> Option<&str> {
        self.attrs.get("id").map(String::as_str)
    }

    pub fn opacity(&self) -> f32 {
        self.opacity
    }

    /// Set opacity, clamped to [0, 1].
    pub fn set_opacity(&mut self, value: f32) {
        self.opacity = value.clamp(0.0, 1.0);
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.classes.iter().any(|c| c == class)
    }
}

// ───────────────────────────────────────── document ──────────

/// Arena-backed element tree.
///
/// Elements are stored in a flat `Vec` and reference each other by index,
/// which avoids recursive ownership and makes traversal cheap.  Slots are
/// never reused: a removed element stays in the arena (detached) and may be
/// appended somewhere else later.
#[derive(Debug, Clone)]
pub struct Document {
    pub nodes: Vec<Element>,
    pub root: NodeId,
}

impl Document {
    /// Create a new document with a single root element.
    pub fn new(root_tag: impl Into<String>) -> Self {
        Self {
            nodes: vec![Element::new(root_tag)],
            root: 0,
        }
    }

    /// Create a detached element and return its [`NodeId`].
    /// Attach it with [`Document::append_child`] or the insert operations.
    pub fn create_element(&mut self, tag: impl Into<String>) -> NodeId {
        let id = self.nodes.len();
        self.nodes.push(Element::new(tag));
        id
    }

    // ── access ──────────────────────────────────────────────────

    pub fn get(&self, id: NodeId) -> Result<&Element, DomError> {
        self.nodes.get(id).ok_or(DomError::UnknownNode(id))
    }

    pub fn get_mut(&mut self, id: NodeId) -> Result<&mut Element, DomError> {
        self.nodes.get_mut(id).ok_or(DomError::UnknownNode(id))
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes.get(id).and_then(|n| n.parent)
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.nodes.get(id).map(|n| n.children.as_slice()).unwrap_or(&[])
    }

    pub fn next_sibling(&self, id: NodeId) -> Option<NodeId> {
        let parent = self.parent(id)?;
        let siblings = &self.nodes[parent].children;
        let pos = siblings.iter().position(|&c| c == id)?;
        siblings.get(pos + 1).copied()
    }

    pub fn prev_sibling(&self, id: NodeId) -> Option<NodeId> {
        let parent = self.parent(id)?;
        let siblings = &self.nodes[parent].children;
        let pos = siblings.iter().position(|&c| c == id)?;
        pos.checked_sub(1).map(|p| siblings[p])
    }

    /// Whether `id` is reachable from the document root.
    pub fn is_attached(&self, id: NodeId) -> bool {
        if self.nodes.get(id).is_none() {
            return false;
        }
        let mut cur = id;
        loop {
            if cur == self.root {
                return true;
            }
            match self.nodes[cur].parent {
                Some(p) => cur = p,
                None => return false,
            }
        }
    }

    /// Whether `ancestor` is `id` itself or one of its ancestors.
    fn is_self_or_ancestor(&self, ancestor: NodeId, id: NodeId) -> bool {
        let mut cur = Some(id);
        while let Some(c) = cur {
            if c == ancestor {
                return true;
            }
            cur = self.nodes[c].parent;
        }
        false
    }

    // ── structure ───────────────────────────────────────────────

    /// Append `child` as the last child of `parent`.  Detaches `child` from
    /// its current parent first (moving, like the platform `appendChild`).
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), DomError> {
        self.get(parent)?;
        self.get(child)?;
        if child == self.root {
            return Err(DomError::IsRoot);
        }
        if self.is_self_or_ancestor(child, parent) {
            return Err(DomError::WouldCycle(child));
        }
        self.detach(child);
        self.nodes[child].parent = Some(parent);
        self.nodes[parent].children.push(child);
        Ok(())
    }

    /// Remove `id` from its parent.  The subtree under `id` stays intact and
    /// detached; it may be re-inserted later.
    pub fn remove(&mut self, id: NodeId) -> Result<(), DomError> {
        self.get(id)?;
        if id == self.root {
            return Err(DomError::IsRoot);
        }
        if self.nodes[id].parent.is_none() {
            return Err(DomError::NoParent(id));
        }
        self.detach(id);
        Ok(())
    }

    /// Insert `new` immediately before `reference` among its siblings.
    pub fn insert_before(&mut self, new: NodeId, reference: NodeId) -> Result<(), DomError> {
        self.insert_at(new, reference, 0)
    }

    /// Insert `new` immediately after `reference` among its siblings.
    pub fn insert_after(&mut self, new: NodeId, reference: NodeId) -> Result<(), DomError> {
        self.insert_at(new, reference, 1)
    }

    fn insert_at(&mut self, new: NodeId, reference: NodeId, offset: usize) -> Result<(), DomError> {
        self.get(new)?;
        self.get(reference)?;
        if new == self.root {
            return Err(DomError::IsRoot);
        }
        let parent = self.nodes[reference].parent.ok_or(DomError::NoParent(reference))?;
        if self.is_self_or_ancestor(new, parent) {
            return Err(DomError::WouldCycle(new));
        }
        // Inserting a node relative to itself leaves the order unchanged.
        // Bail before the detach below unlinks it.
        if new == reference {
            return Ok(());
        }
        self.detach(new);
        // Look the position up *after* the detach — `new` may have been a
        // sibling of `reference`, shifting the index.
        let pos = self.nodes[parent]
            .children
            .iter()
            .position(|&c| c == reference)
            .ok_or(DomError::NoParent(reference))?;
        self.nodes[new].parent = Some(parent);
        self.nodes[parent].children.insert(pos + offset, new);
        Ok(())
    }

    /// Replace `old` with `new` in place.  `old` becomes detached.
    pub fn replace(&mut self, new: NodeId, old: NodeId) -> Result<(), DomError> {
        self.get(new)?;
        self.get(old)?;
        if old == self.root || new == self.root {
            return Err(DomError::IsRoot);
        }
        let parent = self.nodes[old].parent.ok_or(DomError::NoParent(old))?;
        if self.is_self_or_ancestor(new, parent) {
            return Err(DomError::WouldCycle(new));
        }
        // Replacing a node with itself is a no-op; detaching first would
        // lose its slot among the siblings.
        if new == old {
            return Ok(());
        }
        self.detach(new);
        let pos = self.nodes[parent]
            .children
            .iter()
            .position(|&c| c == old)
            .ok_or(DomError::NoParent(old))?;
        self.nodes[parent].children[pos] = new;
        self.nodes[new].parent = Some(parent);
        self.nodes[old].parent = None;
        Ok(())
    }

    /// Unlink `id` from its parent, if any.
    fn detach(&mut self, id: NodeId) {
        if let Some(parent) = self.nodes[id].parent.take() {
            self.nodes[parent].children.retain(|&c| c != id);
        }
    }

    /// Deep-copy the subtree rooted at `id`.  The copy is detached.
    pub fn clone_subtree(&mut self, id: NodeId) -> Result<NodeId, DomError> {
        self.get(id)?;
        let copy = self.clone_node(id);
        let children = self.nodes[id].children.clone();
        for child in children {
            let child_copy = self.clone_subtree(child)?;
            self.nodes[child_copy].parent = Some(copy);
            self.nodes[copy].children.push(child_copy);
        }
        Ok(copy)
    }

    /// Shallow-copy a single element (no parent, no children).
    pub fn clone_node(&mut self, id: NodeId) -> NodeId {
        let mut el = self.nodes[id].clone();
        el.parent = None;
        el.children = Vec::new();
        let copy = self.nodes.len();
        self.nodes.push(el);
        copy
    }

    // ── content ─────────────────────────────────────────────────

    /// Concatenated text of `id` and all its descendants, in document order.
    pub fn text_content(&self, id: NodeId) -> String {
        let mut out = String::new();
        self.collect_text(id, &mut out);
        out
    }

    fn collect_text(&self, id: NodeId, out: &mut String) {
        let Some(node) = self.nodes.get(id) else {
            return;
        };
        if let Some(ref text) = node.text {
            out.push_str(text);
        }
        for &child in &node.children {
            self.collect_text(child, out);
        }
    }

    pub fn set_text(&mut self, id: NodeId, text: impl Into<String>) -> Result<(), DomError> {
        self.get_mut(id)?.text = Some(text.into());
        Ok(())
    }

    pub fn value(&self, id: NodeId) -> Option<&str> {
        self.nodes.get(id).and_then(|n| n.value.as_deref())
    }

    pub fn set_value(&mut self, id: NodeId, value: impl Into<String>) -> Result<(), DomError> {
        self.get_mut(id)?.value = Some(value.into());
        Ok(())
    }

    // ── attributes ──────────────────────────────────────────────

    pub fn set_attribute(
        &mut self,
        id: NodeId,
        name: impl Into<String>,
        value: impl Into<String>,
    ) -> Result<(), DomError> {
        self.get_mut(id)?.attrs.insert(name.into(), value.into());
        Ok(())
    }

    pub fn attribute(&self, id: NodeId, name: &str) -> Option<&str> {
        self.nodes.get(id).and_then(|n| n.attrs.get(name)).map(String::as_str)
    }

    pub fn remove_attribute(&mut self, id: NodeId, name: &str) -> Result<(), DomError> {
        self.get_mut(id)?.attrs.remove(name);
        Ok(())
    }

    /// Set several attributes at once.
    pub fn set_attributes<I, K, V>(&mut self, id: NodeId, attrs: I) -> Result<(), DomError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let node = self.get_mut(id)?;
        for (k, v) in attrs {
            node.attrs.insert(k.into(), v.into());
        }
        Ok(())
    }

    // ── classes ─────────────────────────────────────────────────

    pub fn add_class(&mut self, id: NodeId, class: impl Into<String>) -> Result<(), DomError> {
        let class = class.into();
        let node = self.get_mut(id)?;
        if !node.has_class(&class) {
            node.classes.push(class);
        }
        Ok(())
    }

    pub fn remove_class(&mut self, id: NodeId, class: &str) -> Result<(), DomError> {
        self.get_mut(id)?.classes.retain(|c| c != class);
        Ok(())
    }

    pub fn has_class(&self, id: NodeId, class: &str) -> bool {
        self.nodes.get(id).map(|n| n.has_class(class)).unwrap_or(false)
    }

    /// Toggle a class; returns whether the class is present afterwards.
    pub fn toggle_class(&mut self, id: NodeId, class: &str) -> Result<bool, DomError> {
        let node = self.get_mut(id)?;
        if node.has_class(class) {
            node.classes.retain(|c| c != class);
            Ok(false)
        } else {
            node.classes.push(class.to_string());
            Ok(true)
        }
    }

    pub fn add_classes<I, S>(&mut self, id: NodeId, classes: I) -> Result<(), DomError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for class in classes {
            self.add_class(id, class)?;
        }
        Ok(())
    }

    pub fn remove_classes<'a, I>(&mut self, id: NodeId, classes: I) -> Result<(), DomError>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let node = self.get_mut(id)?;
        for class in classes {
            node.classes.retain(|c| c != class);
        }
        Ok(())
    }

    // ── styles ──────────────────────────────────────────────────

    pub fn set_style(
        &mut self,
        id: NodeId,
        property: impl Into<String>,
        value: impl Into<String>,
    ) -> Result<(), DomError> {
        self.get_mut(id)?.styles.insert(property.into(), value.into());
        Ok(())
    }

    /// The element's own style value for `property`, if set.
    pub fn style(&self, id: NodeId, property: &str) -> Option<&str> {
        self.nodes.get(id).and_then(|n| n.styles.get(property)).map(String::as_str)
    }

    pub fn set_styles<I, K, V>(&mut self, id: NodeId, styles: I) -> Result<(), DomError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let node = self.get_mut(id)?;
        for (k, v) in styles {
            node.styles.insert(k.into(), v.into());
        }
        Ok(())
    }

    /// The computed style for `property`: the element's own value, falling
    /// back to the nearest ancestor that sets it (the inheritance
    /// approximation of a computed-style lookup).
    pub fn computed_style(&self, id: NodeId, property: &str) -> Option<&str> {
        let mut cur = Some(id);
        while let Some(c) = cur {
            let node = self.nodes.get(c)?;
            if let Some(v) = node.styles.get(property) {
                return Some(v);
            }
            cur = node.parent;
        }
        None
    }

    // ── visibility & opacity ────────────────────────────────────

    pub fn hide(&mut self, id: NodeId) -> Result<(), DomError> {
        self.get_mut(id)?.shown = false;
        Ok(())
    }

    pub fn show(&mut self, id: NodeId) -> Result<(), DomError> {
        self.get_mut(id)?.shown = true;
        Ok(())
    }

    /// Toggle `shown`; returns the new state.
    pub fn toggle_visibility(&mut self, id: NodeId) -> Result<bool, DomError> {
        let node = self.get_mut(id)?;
        node.shown = !node.shown;
        Ok(node.shown)
    }

    /// An element is visible when it is attached, shown, and every ancestor
    /// is shown — the retained-tree analogue of the offset-box check.
    pub fn is_visible(&self, id: NodeId) -> bool {
        if !self.is_attached(id) {
            return false;
        }
        let mut cur = Some(id);
        while let Some(c) = cur {
            if !self.nodes[c].shown {
                return false;
            }
            cur = self.nodes[c].parent;
        }
        true
    }

    /// Composited opacity: the product of this element's opacity and every
    /// ancestor's, as a real compositor would blend nested layers.
    pub fn effective_opacity(&self, id: NodeId) -> f32 {
        let mut acc = 1.0;
        let mut cur = Some(id);
        while let Some(c) = cur {
            let Some(node) = self.nodes.get(c) else {
                return 0.0;
            };
            acc *= node.opacity;
            cur = node.parent;
        }
        acc
    }

    // ── traversal ───────────────────────────────────────────────

    /// Element ids in document order (depth-first), skipping hidden subtrees.
    /// This is the flattened list the UI renders.
    pub fn visible_nodes(&self) -> Vec<NodeId> {
        let mut out = Vec::new();
        self.collect_visible(self.root, &mut out);
        out
    }

    fn collect_visible(&self, id: NodeId, out: &mut Vec<NodeId>) {
        let node = &self.nodes[id];
        if !node.shown {
            return;
        }
        out.push(id);
        for &child in &node.children {
            self.collect_visible(child, out);
        }
    }

    /// All descendant ids of `id` in document order (not including `id`).
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        self.collect_descendants(id, &mut out);
        out
    }

    fn collect_descendants(&self, id: NodeId, out: &mut Vec<NodeId>) {
        let Some(node) = self.nodes.get(id) else {
            return;
        };
        for &child in &node.children {
            out.push(child);
            self.collect_descendants(child, out);
        }
    }

    /// Depth of `id` from the root (0 = root).  Detached nodes measure from
    /// their detached subtree root.
    pub fn depth(&self, id: NodeId) -> usize {
        let mut depth = 0;
        let mut cur = self.nodes.get(id).and_then(|n| n.parent);
        while let Some(c) = cur {
            depth += 1;
            cur = self.nodes[c].parent;
        }
        depth
    }
}

// ───────────────────────────────────────── tests ─────────────
