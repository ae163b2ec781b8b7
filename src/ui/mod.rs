//! UI / rendering layer — everything that touches Ratatui widgets.
//!
//! This layer takes the *core* document and turns it into rows on the
//! terminal.  Opacity becomes color: each row's foreground is blended
//! toward the background by the element's effective opacity.

pub mod doc_widget;
pub mod layout;
pub mod theme;
