//! Core document model – element tree, selectors, and event dispatch.
//!
//! Nothing in this module depends on any TUI or rendering crate.

pub mod dom;
pub mod events;
pub mod selector;
