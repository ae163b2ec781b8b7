//! Selector parsing + matching for element lookup.
//!
//! Supports the simple-selector subset the document model needs: `*`, tag
//! names, `#id`, `.class`, compounds of those (`div.note#intro`), and
//! descendant chains separated by whitespace (`section .hint`).  No child
//! combinators, no attribute selectors, no pseudo-classes.

use thiserror::Error;

use super::dom::{Document, NodeId};

// ───────────────────────────────────────── errors ────────────

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SelectorError {
    #[error("empty selector")]
    Empty,
    #[error("invalid selector part {0:?}")]
    Parse(String),
}

// ───────────────────────────────────────── grammar ───────────

/// One compound step: every listed constraint must hold on a single element.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct Compound {
    tag: Option<String>,
    id: Option<String>,
    classes: Vec<String>,
}

impl Compound {
    fn parse(part: &str) -> Result<Self, SelectorError> {
        if part == "*" {
            return Ok(Self::default());
        }

        let mut compound = Self::default();
        let mut chars = part.chars().peekable();
        let mut saw_token = false;

        // Leading bare tag name, if any.
        let mut tag = String::new();
        while let Some(&c) = chars.peek() {
            if c == '#' || c == '.' {
                break;
            }
            tag.push(c);
            chars.next();
        }
        if !tag.is_empty() {
            if !is_ident(&tag) {
                return Err(SelectorError::Parse(part.to_string()));
            }
            compound.tag = Some(tag);
            saw_token = true;
        }

        while let Some(marker) = chars.next() {
            let mut name = String::new();
            while let Some(&c) = chars.peek() {
                if c == '#' || c == '.' {
                    break;
                }
                name.push(c);
                chars.next();
            }
            if !is_ident(&name) {
                return Err(SelectorError::Parse(part.to_string()));
            }
            match marker {
                '#' => {
                    if compound.id.is_some() {
                        return Err(SelectorError::Parse(part.to_string()));
                    }
                    compound.id = Some(name);
                }
                '.' => compound.classes.push(name),
                _ => return Err(SelectorError::Parse(part.to_string())),
            }
            saw_token = true;
        }

        if !saw_token {
            return Err(SelectorError::Parse(part.to_string()));
        }
        Ok(compound)
    }

    fn matches(&self, doc: &Document, id: NodeId) -> bool {
        let Ok(el) = doc.get(id) else {
            return false;
        };
        if let Some(ref tag) = self.tag {
            if el.tag != *tag {
                return false;
            }
        }
        if let Some(ref want) = self.id {
            if el.element_id() != Some(want.as_str()) {
                return false;
            }
        }
        self.classes.iter().all(|c| el.has_class(c))
    }
}

fn is_ident(s: &str) -> bool {
    !s.is_empty()
        && s.chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

/// A parsed selector: one or more compounds joined by the descendant
/// combinator.  `a b` matches `b`-elements with an `a`-matching ancestor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selector {
    compounds: Vec<Compound>,
}

impl Selector {
    pub fn parse(input: &str) -> Result<Self, SelectorError> {
        let parts: Vec<&str> = input.split_whitespace().collect();
        if parts.is_empty() {
            return Err(SelectorError::Empty);
        }
        let compounds = parts
            .iter()
            .map(|p| Compound::parse(p))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { compounds })
    }

    /// Does the element match this selector?  The last compound must match
    /// the element itself; earlier compounds must match successively higher
    /// ancestors, in order.
    pub fn matches(&self, doc: &Document, id: NodeId) -> bool {
        let (last, rest) = match self.compounds.split_last() {
            Some(pair) => pair,
            None => return false,
        };
        if !last.matches(doc, id) {
            return false;
        }

        // Greedy ancestor walk: each remaining compound (right to left) must
        // be satisfied by some strictly-higher ancestor.
        let mut cur = doc.parent(id);
        for compound in rest.iter().rev() {
            let mut found = false;
            while let Some(c) = cur {
                let is_match = compound.matches(doc, c);
                cur = doc.parent(c);
                if is_match {
                    found = true;
                    break;
                }
            }
            if !found {
                return false;
            }
        }
        true
    }
}

// ───────────────────────────────────────── queries ───────────

impl Document {
    /// First element matching `selector`, in document order.
    pub fn query(&self, selector: &str) -> Result<Option<NodeId>, SelectorError> {
        let sel = Selector::parse(selector)?;
        Ok(self.document_order().find(|&id| sel.matches(self, id)))
    }

    /// Every element matching `selector`, in document order.
    pub fn query_all(&self, selector: &str) -> Result<Vec<NodeId>, SelectorError> {
        let sel = Selector::parse(selector)?;
        Ok(self
            .document_order()
            .filter(|&id| sel.matches(self, id))
            .collect())
    }

    /// Matching descendants of `scope` (not including `scope` itself).
    pub fn query_within(&self, scope: NodeId, selector: &str) -> Result<Vec<NodeId>, SelectorError> {
        let sel = Selector::parse(selector)?;
        Ok(self
            .descendants(scope)
            .into_iter()
            .filter(|&id| sel.matches(self, id))
            .collect())
    }

    /// Nearest of `id` or its ancestors that matches `selector`.
    pub fn closest(&self, id: NodeId, selector: &str) -> Result<Option<NodeId>, SelectorError> {
        let sel = Selector::parse(selector)?;
        let mut cur = Some(id);
        while let Some(c) = cur {
            if sel.matches(self, c) {
                return Ok(Some(c));
            }
            cur = self.parent(c);
        }
        Ok(None)
    }

    /// Whether `id` matches `selector`.
    pub fn matches_selector(&self, id: NodeId, selector: &str) -> Result<bool, SelectorError> {
        Ok(Selector::parse(selector)?.matches(self, id))
    }

    /// Attached element ids in document order, root first.
    fn document_order(&self) -> impl Iterator<Item = NodeId> + '_ {
        let mut out = Vec::new();
        let mut stack = vec![self.root];
        while let Some(id) = stack.pop() {
            out.push(id);
            for &child in self.children(id).iter().rev() {
                stack.push(child);
            }
        }
        out.into_iter()
    }
}

// ───────────────────────────────────────── tests ─────────────

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn sample() -> (Document, NodeId, NodeId, NodeId) {
        let mut doc = Document::new("body");
        let section = doc.create_element("section");
        let note = doc.create_element("div");
        let hint = doc.create_element("span");
        doc.append_child(doc.root, section).unwrap();
        doc.append_child(section, note).unwrap();
        doc.append_child(note, hint).unwrap();
        doc.set_attribute(note, "id", "intro").unwrap();
        doc.add_class(note, "note").unwrap();
        doc.add_class(hint, "hint").unwrap();
        (doc, section, note, hint)
    }

    #[test]
    fn parse_rejects_garbage() {
        assert_eq!(Selector::parse(""), Err(SelectorError::Empty));
        assert!(Selector::parse("div..x").is_err());
        assert!(Selector::parse("#").is_err());
        assert!(Selector::parse("a#x#y").is_err());
        assert!(Selector::parse("div[attr]").is_err());
    }

    #[test]
    fn matches_tag_id_class_compound() {
        let (doc, _section, note, hint) = sample();
        assert!(doc.matches_selector(note, "div").unwrap());
        assert!(doc.matches_selector(note, "#intro").unwrap());
        assert!(doc.matches_selector(note, ".note").unwrap());
        assert!(doc.matches_selector(note, "div.note#intro").unwrap());
        assert!(!doc.matches_selector(note, "span.note").unwrap());
        assert!(doc.matches_selector(hint, "*").unwrap());
    }

    #[test]
    fn descendant_chains() {
        let (doc, _section, _note, hint) = sample();
        assert!(doc.matches_selector(hint, "section .hint").unwrap());
        assert!(doc.matches_selector(hint, "body section span").unwrap());
        assert!(!doc.matches_selector(hint, "ul .hint").unwrap());
        // Compounds must match in ancestor order.
        assert!(!doc.matches_selector(hint, ".hint section").unwrap());
    }

    #[test]
    fn query_first_in_document_order() {
        let (doc, section, note, _hint) = sample();
        assert_eq!(doc.query("section").unwrap(), Some(section));
        assert_eq!(doc.query("#intro").unwrap(), Some(note));
        assert_eq!(doc.query(".missing").unwrap(), None);
    }

    #[test]
    fn query_all_and_within() {
        let (mut doc, section, note, hint) = sample();
        let extra = doc.create_element("span");
        doc.add_class(extra, "hint").unwrap();
        doc.append_child(doc.root, extra).unwrap();

        assert_eq!(doc.query_all(".hint").unwrap(), vec![hint, extra]);
        // Scoped query only sees descendants of `section`.
        assert_eq!(doc.query_within(section, ".hint").unwrap(), vec![hint]);
        assert_eq!(doc.query_within(note, "div").unwrap(), vec![]);
    }

    #[test]
    fn closest_walks_upward() {
        let (doc, section, note, hint) = sample();
        assert_eq!(doc.closest(hint, ".hint").unwrap(), Some(hint));
        assert_eq!(doc.closest(hint, "#intro").unwrap(), Some(note));
        assert_eq!(doc.closest(hint, "section").unwrap(), Some(section));
        assert_eq!(doc.closest(hint, "ul").unwrap(), None);
    }
}
