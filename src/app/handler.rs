//! Input handling — maps key events to document mutations and fades.

use std::time::Instant;

use crossterm::event::{
    KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseButton, MouseEvent, MouseEventKind,
};
use tracing::warn;

use crate::anim::fade::FadeDirection;
use crate::config::Action;
use crate::core::dom::NodeId;
use crate::core::events::{Event, EventKind};

use super::state::AppState;

/// Process a key event.
pub fn handle_key(state: &mut AppState, key: KeyEvent) {
    if key.kind == KeyEventKind::Release {
        return;
    }

    // Ctrl+c always quits, regardless of bindings.
    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
        state.should_quit = true;
        return;
    }

    // Enter fires a click at the selected element (bubbling to ancestors).
    if key.code == KeyCode::Enter {
        if let Some(node) = state.selected_node() {
            let ran = state
                .registry
                .dispatch(&state.doc, Event::new(EventKind::Click, node));
            state.status_message = Some(format!("click on node {node} ({ran} listeners ran)"));
        }
        return;
    }

    let Some(action) = state.config.match_key(key) else {
        return;
    };

    match action {
        Action::Quit => {
            state.should_quit = true;
        }
        Action::MoveUp => {
            state.doc_state.select_prev();
        }
        Action::MoveDown => {
            let max = state.doc.visible_nodes().len();
            state.doc_state.select_next(max);
        }
        Action::FadeIn => {
            if let Some(node) = state.selected_node() {
                start_fade(state, node, FadeDirection::In);
            }
        }
        Action::FadeOut => {
            if let Some(node) = state.selected_node() {
                start_fade(state, node, FadeDirection::Out);
            }
        }
        Action::ToggleFade => {
            toggle_popup_fade(state);
        }
        Action::ToggleClass => {
            if let Some(node) = state.selected_node() {
                match state.doc.toggle_class(node, "active") {
                    Ok(present) => {
                        state.status_message =
                            Some(format!("class \"active\" {}", if present { "added" } else { "removed" }));
                    }
                    Err(err) => warn!(%err, "toggle_class failed"),
                }
            }
        }
        Action::ToggleVisibility => {
            if let Some(node) = state.selected_node() {
                if let Ok(shown) = state.doc.toggle_visibility(node) {
                    state.status_message =
                        Some(format!("node {node} {}", if shown { "shown" } else { "hidden" }));
                    // Hiding the selection collapses the row list under it.
                    state.doc_state.selected = state
                        .doc_state
                        .selected
                        .min(state.doc.visible_nodes().len().saturating_sub(1));
                }
            }
        }
    }
}

/// Process a mouse event.  Scrolling moves the selection; a left click on an
/// outline row selects it and fires a click at that element.
pub fn handle_mouse(state: &mut AppState, mouse: MouseEvent) {
    match mouse.kind {
        MouseEventKind::ScrollUp => {
            state.doc_state.select_prev();
        }
        MouseEventKind::ScrollDown => {
            let max = state.doc.visible_nodes().len();
            state.doc_state.select_next(max);
        }
        MouseEventKind::Down(MouseButton::Left) => {
            // Row 0 is the pane border; inner rows map to the visible list
            // shifted by the scroll offset.
            if mouse.row == 0 {
                return;
            }
            let index = state.doc_state.offset + mouse.row as usize - 1;
            let visible = state.doc.visible_nodes();
            let Some(&node) = visible.get(index) else {
                return;
            };
            state.doc_state.selected = index;
            let ran = state
                .registry
                .dispatch(&state.doc, Event::new(EventKind::Click, node));
            state.status_message = Some(format!("click on node {node} ({ran} listeners ran)"));
        }
        _ => {}
    }
}

/// Start a fade on `node`, surfacing failures in the status bar.
fn start_fade(state: &mut AppState, node: NodeId, direction: FadeDirection) {
    let duration = state.config.fade_duration();
    match state
        .animator
        .start(&mut state.doc, node, direction, duration, Instant::now())
    {
        Ok(_) => {
            let dir = match direction {
                FadeDirection::In => "in",
                FadeDirection::Out => "out",
            };
            state.status_message = Some(format!("fading node {node} {dir}"));
        }
        Err(err) => {
            state.status_message = Some(format!("fade failed: {err}"));
        }
    }
}

/// Fade the `#popup` element in when hidden, out when shown — the animated
/// version of a visibility toggle.
fn toggle_popup_fade(state: &mut AppState) {
    let popup = match state.doc.query("#popup") {
        Ok(Some(node)) => node,
        Ok(None) => {
            state.status_message = Some("no #popup element".into());
            return;
        }
        Err(err) => {
            warn!(%err, "popup selector failed");
            return;
        }
    };
    let direction = if state.doc.is_visible(popup) && !state.animator.is_animating(popup) {
        FadeDirection::Out
    } else {
        FadeDirection::In
    };
    start_fade(state, popup, direction);
}

// ───────────────────────────────────────── tests ─────────────

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use crate::app::demo;
    use crate::config::AppConfig;
    use crate::core::events::EventRegistry;

    use super::*;

    fn press(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn sample_state() -> AppState {
        let mut registry = EventRegistry::new();
        let (doc, _popup) = demo::build(&mut registry).unwrap();
        let mut state = AppState::new(doc, AppConfig::default());
        state.registry = registry;
        state
    }

    #[test]
    fn navigation_moves_selection() {
        let mut state = sample_state();
        assert_eq!(state.doc_state.selected, 0);
        handle_key(&mut state, press(KeyCode::Char('j')));
        handle_key(&mut state, press(KeyCode::Down));
        assert_eq!(state.doc_state.selected, 2);
        handle_key(&mut state, press(KeyCode::Char('k')));
        assert_eq!(state.doc_state.selected, 1);
    }

    #[test]
    fn fade_keys_start_a_ramp_on_the_selection() {
        let mut state = sample_state();
        handle_key(&mut state, press(KeyCode::Char('j')));
        let node = state.selected_node().unwrap();

        handle_key(&mut state, press(KeyCode::Char('o')));
        assert!(state.animator.is_animating(node));
        // Restarting in the other direction keeps a single ramp.
        handle_key(&mut state, press(KeyCode::Char('i')));
        assert_eq!(state.animator.active_count(), 1);
    }

    #[test]
    fn toggle_fade_targets_the_popup() {
        let mut state = sample_state();
        let popup = state.doc.query("#popup").unwrap().unwrap();
        assert!(!state.doc.is_visible(popup));

        handle_key(&mut state, press(KeyCode::Char(' ')));
        // Fade-in shows the popup immediately at opacity 0.
        assert!(state.animator.is_animating(popup));
        assert!(state.doc.nodes[popup].shown);
        assert_eq!(state.doc.nodes[popup].opacity(), 0.0);
    }

    #[test]
    fn class_toggle_and_quit() {
        let mut state = sample_state();
        handle_key(&mut state, press(KeyCode::Char('j')));
        let node = state.selected_node().unwrap();

        handle_key(&mut state, press(KeyCode::Char('c')));
        assert!(state.doc.has_class(node, "active"));
        handle_key(&mut state, press(KeyCode::Char('c')));
        assert!(!state.doc.has_class(node, "active"));

        handle_key(&mut state, press(KeyCode::Char('q')));
        assert!(state.should_quit);
    }

    fn mouse(kind: MouseEventKind, row: u16) -> MouseEvent {
        MouseEvent {
            kind,
            column: 2,
            row,
            modifiers: KeyModifiers::NONE,
        }
    }

    #[test]
    fn mouse_scroll_moves_selection() {
        let mut state = sample_state();
        handle_mouse(&mut state, mouse(MouseEventKind::ScrollDown, 0));
        handle_mouse(&mut state, mouse(MouseEventKind::ScrollDown, 0));
        assert_eq!(state.doc_state.selected, 2);
        handle_mouse(&mut state, mouse(MouseEventKind::ScrollUp, 0));
        assert_eq!(state.doc_state.selected, 1);
    }

    #[test]
    fn mouse_click_selects_row_and_dispatches() {
        let mut state = sample_state();
        // Terminal row 4 is the fourth outline row (row 0 is the border),
        // which is the first menu item — its nav ancestor has a listener.
        handle_mouse(&mut state, mouse(MouseEventKind::Down(MouseButton::Left), 4));
        assert_eq!(state.doc_state.selected, 3);
        let msg = state.status_message.clone().unwrap();
        assert!(msg.contains("1 listeners ran"), "{msg}");

        // The border row and rows past the outline leave the state alone.
        state.status_message = None;
        handle_mouse(&mut state, mouse(MouseEventKind::Down(MouseButton::Left), 0));
        handle_mouse(&mut state, mouse(MouseEventKind::Down(MouseButton::Left), 200));
        assert_eq!(state.doc_state.selected, 3);
        assert_eq!(state.status_message, None);
    }

    #[test]
    fn enter_dispatches_click_with_bubbling() {
        let mut state = sample_state();
        // Move to the first menu item (row order: body, header, nav, item).
        for _ in 0..3 {
            handle_key(&mut state, press(KeyCode::Char('j')));
        }
        handle_key(&mut state, press(KeyCode::Enter));
        let msg = state.status_message.unwrap();
        assert!(msg.contains("1 listeners ran"), "{msg}");
    }
}
