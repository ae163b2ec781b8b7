//! Central application state.
//!
//! All mutable state lives here so that the rest of the app can be pure
//! functions over `&AppState` (rendering) or `&mut AppState` (event handling).

use crate::anim::fade::Animator;
use crate::config::AppConfig;
use crate::core::dom::{Document, NodeId};
use crate::core::events::EventRegistry;
use crate::ui::doc_widget::DocWidgetState;

/// Top-level application state.
pub struct AppState {
    /// The retained document being rendered and animated.
    pub doc: Document,
    /// Widget-level state (selection, scroll).
    pub doc_state: DocWidgetState,
    /// Active opacity ramps — ticked from the main loop.
    pub animator: Animator,
    /// Element event listeners (clicks, fade completion notices).
    pub registry: EventRegistry,
    /// Controls the main event loop.
    pub should_quit: bool,
    /// An optional status message shown in the bottom bar.
    pub status_message: Option<String>,
    /// User configuration (keybindings, fade settings).
    pub config: AppConfig,
}

impl AppState {
    pub fn new(doc: Document, config: AppConfig) -> Self {
        Self {
            doc,
            doc_state: DocWidgetState::default(),
            animator: Animator::new(),
            registry: EventRegistry::new(),
            should_quit: false,
            status_message: None,
            config,
        }
    }

    /// The element currently highlighted in the outline, if any.
    pub fn selected_node(&self) -> Option<NodeId> {
        self.doc.visible_nodes().get(self.doc_state.selected).copied()
    }
}
