//! Application orchestration — state management, event loop, and input
//! handling for the demo binary.

pub mod demo;
pub mod event;
pub mod handler;
pub mod state;
