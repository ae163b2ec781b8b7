//! Animation engine — cooperative, per-frame opacity ramps.
//!
//! Nothing in this module schedules its own timers: the host event loop
//! owns the clock and calls [`fade::Animator::tick`] once per frame.

pub mod fade;
