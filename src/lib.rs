//! A retained element tree for terminal UIs.
//!
//! `veil` keeps a document of elements — tags, attributes, classes, styles,
//! text, visibility, opacity — and lets an application mutate it the way a
//! browser script mutates its page: append/remove/insert/replace, selector
//! queries, event listeners with bubbling, and visibility toggling.  On top
//! of that sits the piece everything else serves: a cancellable opacity-fade
//! engine ([`anim::fade::Animator`]) driven one tick per frame by the host
//! event loop.
//!
//! The `veil` binary is a small ratatui demo that renders a sample document
//! as an outline and fades elements interactively.

pub mod anim;
pub mod app;
pub mod config;
pub mod core;
pub mod ui;

pub use crate::anim::fade::{Animator, FadeDirection, FadeError, FadeEvent, RampHandle};
pub use crate::core::dom::{Document, DomError, Element, NodeId};
pub use crate::core::events::{Event, EventKind, EventRegistry, ListenerId};
pub use crate::core::selector::{Selector, SelectorError};
