//! The sample document shown by the demo binary.
//!
//! Built entirely through the public document API — every structural helper
//! the crate exposes is exercised somewhere in here.

use anyhow::Result;
use tracing::info;

use crate::core::dom::{Document, NodeId};
use crate::core::events::{EventKind, EventRegistry};

/// Build the demo document and wire its listeners.
/// Returns the document and the id of the popup element (starts hidden,
/// ready to be faded in).
pub fn build(registry: &mut EventRegistry) -> Result<(Document, NodeId)> {
    let mut doc = Document::new("body");

    let header = doc.create_element("header");
    doc.set_attribute(header, "id", "top")?;
    doc.set_text(header, "veil demo")?;
    doc.append_child(doc.root, header)?;

    let nav = doc.create_element("nav");
    doc.add_class(nav, "menu")?;
    doc.append_child(doc.root, nav)?;
    for label in ["home", "docs", "about"] {
        let item = doc.create_element("a");
        doc.add_class(item, "menu-item")?;
        doc.set_text(item, label)?;
        doc.append_child(nav, item)?;
    }

    let section = doc.create_element("section");
    doc.set_attributes(section, [("id", "content"), ("role", "main")])?;
    doc.append_child(doc.root, section)?;

    let card = doc.create_element("div");
    doc.add_classes(card, ["card", "note"])?;
    doc.set_text(card, "select a row, then fade it")?;
    doc.append_child(section, card)?;

    // A second card cloned from the first, re-labelled.
    let card2 = doc.clone_subtree(card)?;
    doc.set_text(card2, "fades compose down the tree")?;
    doc.append_child(section, card2)?;

    let popup = doc.create_element("dialog");
    doc.set_attribute(popup, "id", "popup")?;
    doc.add_class(popup, "overlay")?;
    doc.set_text(popup, "I fade in and out")?;
    doc.append_child(doc.root, popup)?;
    doc.hide(popup)?;

    // Listeners: clicks log, and fade completions on the popup log through
    // the same registry the fade loop dispatches into.
    registry.add_listener(nav, EventKind::Click, |ev| {
        info!(target_node = ev.target, "menu clicked");
    });
    registry.add_listener(popup, EventKind::Custom("fade-done".into()), |ev| {
        info!(detail = ev.detail.as_deref(), "popup fade finished");
    });

    Ok((doc, popup))
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn demo_document_shape() {
        let mut registry = EventRegistry::new();
        let (doc, popup) = build(&mut registry).unwrap();

        assert_eq!(doc.query("#popup").unwrap(), Some(popup));
        assert!(!doc.is_visible(popup));
        assert_eq!(doc.query_all("nav .menu-item").unwrap().len(), 3);
        assert_eq!(doc.query_all(".card").unwrap().len(), 2);
        assert_eq!(registry.len(), 2);
    }
}
