//! Custom Ratatui widget that renders a [`Document`] as an indented outline —
//! one row per visible element, foreground blended toward the background by
//! the element's effective opacity.

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, StatefulWidget, Widget},
};

use crate::anim::fade::Animator;
use crate::core::dom::{Document, NodeId};

use super::theme::{blend, Theme};

// ───────────────────────────────────────── state ─────────────

/// Persistent state for the document widget (selected index, scroll offset).
#[derive(Debug, Default)]
pub struct DocWidgetState {
    /// Index into the *visible* flat list that is currently highlighted.
    pub selected: usize,
    /// Vertical scroll offset (first visible row).
    pub offset: usize,
}

impl DocWidgetState {
    pub fn select_next(&mut self, max: usize) {
        if max > 0 && self.selected < max - 1 {
            self.selected += 1;
        }
    }

    pub fn select_prev(&mut self) {
        self.selected = self.selected.saturating_sub(1);
    }

    /// Ensure the selected row is visible within the viewport of `height` rows.
    pub fn clamp_scroll(&mut self, height: usize) {
        if height == 0 {
            return;
        }
        if self.selected < self.offset {
            self.offset = self.selected;
        } else if self.selected >= self.offset + height {
            self.offset = self.selected - height + 1;
        }
    }
}

// ───────────────────────────────────────── row model ─────────

/// One rendered row in the outline.
#[derive(Debug)]
pub struct DocRow {
    pub node_id: NodeId,
    pub depth: usize,
}

// ───────────────────────────────────────── widget ────────────

/// The document widget itself — created fresh each frame.
pub struct DocWidget<'a> {
    doc: &'a Document,
    animator: Option<&'a Animator>,
    block: Option<Block<'a>>,
}

impl<'a> DocWidget<'a> {
    pub fn new(doc: &'a Document) -> Self {
        Self {
            doc,
            animator: None,
            block: None,
        }
    }

    /// Show a fading marker on rows with an active ramp.
    pub fn animator(mut self, animator: &'a Animator) -> Self {
        self.animator = Some(animator);
        self
    }

    pub fn block(mut self, block: Block<'a>) -> Self {
        self.block = Some(block);
        self
    }

    /// Build the flat list of rows (hidden subtrees skipped).
    pub fn build_rows(&self) -> Vec<DocRow> {
        self.doc
            .visible_nodes()
            .into_iter()
            .map(|node_id| DocRow {
                node_id,
                depth: self.doc.depth(node_id),
            })
            .collect()
    }

    /// Compose the styled line for one element row.
    fn row_line(&self, row: &DocRow, selected: bool) -> Line<'static> {
        let Ok(el) = self.doc.get(row.node_id) else {
            return Line::raw("");
        };
        let opacity = self.doc.effective_opacity(row.node_id);
        let fade = |color| blend(color, Theme::BACKGROUND, opacity);

        let mut spans = vec![Span::raw("  ".repeat(row.depth))];
        spans.push(Span::styled(
            format!("<{}>", el.tag),
            Style::default().fg(fade(Theme::TAG)).add_modifier(Modifier::BOLD),
        ));
        if let Some(id) = el.element_id() {
            spans.push(Span::styled(
                format!(" #{id}"),
                Style::default().fg(fade(Theme::ID)),
            ));
        }
        if !el.classes.is_empty() {
            let classes: String = el.classes.iter().map(|c| format!(" .{c}")).collect();
            spans.push(Span::styled(classes, Style::default().fg(fade(Theme::CLASS))));
        }
        if let Some(ref text) = el.text {
            spans.push(Span::styled(
                format!("  {text}"),
                Style::default().fg(fade(Theme::TEXT)),
            ));
        }
        if self
            .animator
            .map(|a| a.is_animating(row.node_id))
            .unwrap_or(false)
        {
            spans.push(Span::styled(
                format!("  ░ {:.0}%", opacity * 100.0),
                Style::default().fg(Theme::HIDDEN_HINT),
            ));
        }

        let mut line = Line::from(spans);
        if selected {
            line = line.style(Theme::selected_style());
        }
        line
    }
}

impl<'a> StatefulWidget for DocWidget<'a> {
    type State = DocWidgetState;

    fn render(self, area: Rect, buf: &mut Buffer, state: &mut Self::State) {
        let inner = match self.block {
            Some(ref b) => {
                let inner = b.inner(area);
                b.clone().render(area, buf);
                inner
            }
            None => area,
        };
        if inner.width == 0 || inner.height == 0 {
            return;
        }

        let rows = self.build_rows();
        if rows.is_empty() {
            return;
        }
        if state.selected >= rows.len() {
            state.selected = rows.len() - 1;
        }
        state.clamp_scroll(inner.height as usize);

        for (i, row) in rows
            .iter()
            .skip(state.offset)
            .take(inner.height as usize)
            .enumerate()
        {
            let selected = state.offset + i == state.selected;
            let line = self.row_line(row, selected);
            buf.set_line(inner.x, inner.y + i as u16, &line, inner.width);
        }
    }
}

// ───────────────────────────────────────── tests ─────────────
