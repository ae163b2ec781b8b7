//! Opacity fades — time-bounded linear ramps over an element's opacity.
//!
//! A ramp drives one element from 0→1 (fade in) or 1→0 (fade out) over a
//! fixed duration.  The [`Animator`] owns every active ramp and advances them
//! all from a single [`Animator::tick`] call per frame: cooperative,
//! single-threaded scheduling with no timer of its own.  Progress is derived
//! from wall-clock time elapsed since the ramp started, so the total fade
//! time equals the requested duration regardless of tick jitter, and opacity
//! is monotonic by construction.
//!
//! One ramp per element: starting a fade on an element that is already
//! mid-ramp cancels the active ramp first.  Handles carry a generation id so
//! a handle to a superseded ramp can never cancel its successor.

use std::collections::BTreeMap;
use std::time::{Duration, Instant};

use thiserror::Error;
use tracing::{debug, trace};

use crate::core::dom::{Document, NodeId};

// ───────────────────────────────────────── errors ────────────

#[derive(Debug, Error, PartialEq, Eq)]
pub enum FadeError {
    /// The target element is unknown or not attached to the document.
    #[error("element {0} is not attached to the document")]
    InvalidSurface(NodeId),
    /// A zero-length fade is rejected rather than treated as an instant
    /// change; set the opacity directly instead.
    #[error("fade duration must be positive")]
    InvalidDuration,
}

// ───────────────────────────────────────── ramp model ────────

/// Which way a fade moves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FadeDirection {
    /// 0 → 1.  Shows the element before the first tick.
    In,
    /// 1 → 0.  Hides the element once the ramp completes.
    Out,
}

/// An active ramp on one element.
#[derive(Debug, Clone)]
struct Ramp {
    direction: FadeDirection,
    started: Instant,
    duration: Duration,
    generation: u64,
}

impl Ramp {
    /// Linear progress in [0, 1] at `now`.
    fn progress(&self, now: Instant) -> f32 {
        let elapsed = now.saturating_duration_since(self.started);
        (elapsed.as_secs_f32() / self.duration.as_secs_f32()).clamp(0.0, 1.0)
    }

    fn opacity_at(&self, now: Instant) -> f32 {
        match self.direction {
            FadeDirection::In => self.progress(now),
            FadeDirection::Out => 1.0 - self.progress(now),
        }
    }
}

/// Handle to a started ramp.  Cancelling through a handle whose ramp has
/// already completed or been superseded is a no-op.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RampHandle {
    node: NodeId,
    generation: u64,
}

impl RampHandle {
    pub fn node(&self) -> NodeId {
        self.node
    }
}

/// Completion notice returned by [`Animator::tick`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FadeEvent {
    pub node: NodeId,
    pub direction: FadeDirection,
}

// ───────────────────────────────────────── animator ──────────

/// Owner of all active ramps — one slot per element.
///
/// The host loop calls [`Animator::tick`] once per frame with the current
/// time; tests drive it with simulated instants.
#[derive(Debug, Default)]
pub struct Animator {
    /// Active ramps keyed by element.  BTreeMap so tick order (and the order
    /// of completion events) is deterministic.
    ramps: BTreeMap<NodeId, Ramp>,
    /// Monotonic id handed to each new ramp; lets stale handles be detected.
    next_generation: u64,
}

impl Animator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start fading `node` in the given direction.
    ///
    /// Applies the initial surface state immediately: fade-in shows the
    /// element at opacity 0, fade-out pins opacity to 1 (the element is
    /// assumed shown).  Any ramp already running on `node` is cancelled.
    pub fn start(
        &mut self,
        doc: &mut Document,
        node: NodeId,
        direction: FadeDirection,
        duration: Duration,
        now: Instant,
    ) -> Result<RampHandle, FadeError> {
        if duration.is_zero() {
            return Err(FadeError::InvalidDuration);
        }
        if !doc.is_attached(node) {
            return Err(FadeError::InvalidSurface(node));
        }

        let el = doc.get_mut(node).map_err(|_| FadeError::InvalidSurface(node))?;
        match direction {
            FadeDirection::In => {
                el.shown = true;
                el.set_opacity(0.0);
            }
            FadeDirection::Out => {
                el.set_opacity(1.0);
            }
        }

        let generation = self.next_generation;
        self.next_generation += 1;

        if let Some(old) = self.ramps.insert(
            node,
            Ramp {
                direction,
                started: now,
                duration,
                generation,
            },
        ) {
            debug!(node, old_generation = old.generation, "superseding active ramp");
        }
        debug!(node, ?direction, ?duration, generation, "ramp started");

        Ok(RampHandle { node, generation })
    }

    /// Stop a ramp before it completes.  Already-applied opacity is left as
    /// is.  Returns `true` if the handle's ramp was still active.
    pub fn cancel(&mut self, handle: RampHandle) -> bool {
        match self.ramps.get(&handle.node) {
            Some(ramp) if ramp.generation == handle.generation => {
                self.ramps.remove(&handle.node);
                debug!(node = handle.node, "ramp cancelled");
                true
            }
            _ => false,
        }
    }

    /// Advance every active ramp to `now`, mutating element opacities.
    ///
    /// Ramps that reach their target are finalized (fade-out hides the
    /// element), removed, and reported.  Ramps whose element has been
    /// detached since the last tick are dropped without an event.
    pub fn tick(&mut self, doc: &mut Document, now: Instant) -> Vec<FadeEvent> {
        let mut completed = Vec::new();
        let mut dropped = Vec::new();

        for (&node, ramp) in self.ramps.iter() {
            if !doc.is_attached(node) {
                trace!(node, "dropping ramp for detached element");
                dropped.push(node);
                continue;
            }
            let el = match doc.get_mut(node) {
                Ok(el) => el,
                Err(_) => {
                    dropped.push(node);
                    continue;
                }
            };

            el.set_opacity(ramp.opacity_at(now));

            if ramp.progress(now) >= 1.0 {
                match ramp.direction {
                    FadeDirection::In => el.set_opacity(1.0),
                    FadeDirection::Out => {
                        el.set_opacity(0.0);
                        el.shown = false;
                    }
                }
                completed.push(FadeEvent {
                    node,
                    direction: ramp.direction,
                });
            }
        }

        for node in dropped {
            self.ramps.remove(&node);
        }
        for event in &completed {
            debug!(node = event.node, direction = ?event.direction, "ramp complete");
            self.ramps.remove(&event.node);
        }

        completed
    }

    /// Whether a ramp is currently running on `node`.
    pub fn is_animating(&self, node: NodeId) -> bool {
        self.ramps.contains_key(&node)
    }

    /// Progress of the ramp on `node` at `now`, if one is running.
    pub fn progress(&self, node: NodeId, now: Instant) -> Option<f32> {
        self.ramps.get(&node).map(|r| r.progress(now))
    }

    /// Number of active ramps.
    pub fn active_count(&self) -> usize {
        self.ramps.len()
    }
}

// ───────────────────────────────────────── tests ─────────────

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    const D100: Duration = Duration::from_millis(100);

    fn ms(base: Instant, millis: u64) -> Instant {
        base + Duration::from_millis(millis)
    }

    fn sample() -> (Document, NodeId) {
        let mut doc = Document::new("body");
        let el = doc.create_element("div");
        doc.append_child(doc.root, el).unwrap();
        (doc, el)
    }

    #[test]
    fn fade_in_reaches_one_and_stays_shown() {
        let (mut doc, el) = sample();
        doc.hide(el).unwrap();
        let mut anim = Animator::new();
        let t0 = Instant::now();

        anim.start(&mut doc, el, FadeDirection::In, D100, t0).unwrap();
        // Fade-in shows the element immediately, at opacity 0.
        assert!(doc.nodes[el].shown);
        assert_eq!(doc.nodes[el].opacity(), 0.0);

        assert!(anim.tick(&mut doc, ms(t0, 50)).is_empty());
        assert!((doc.nodes[el].opacity() - 0.5).abs() < 1e-3);

        let events = anim.tick(&mut doc, ms(t0, 100));
        assert_eq!(events, vec![FadeEvent { node: el, direction: FadeDirection::In }]);
        assert_eq!(doc.nodes[el].opacity(), 1.0);
        assert!(doc.nodes[el].shown);
        assert!(!anim.is_animating(el));
    }

    #[test]
    fn fade_out_reaches_zero_and_hides() {
        let (mut doc, el) = sample();
        let mut anim = Animator::new();
        let t0 = Instant::now();

        anim.start(&mut doc, el, FadeDirection::Out, D100, t0).unwrap();
        assert_eq!(doc.nodes[el].opacity(), 1.0);

        anim.tick(&mut doc, ms(t0, 40));
        assert!((doc.nodes[el].opacity() - 0.6).abs() < 1e-3);
        assert!(doc.nodes[el].shown);

        let events = anim.tick(&mut doc, ms(t0, 150));
        assert_eq!(events, vec![FadeEvent { node: el, direction: FadeDirection::Out }]);
        assert_eq!(doc.nodes[el].opacity(), 0.0);
        assert!(!doc.nodes[el].shown);
    }

    #[test]
    fn opacity_is_monotonic_and_clamped_across_ticks() {
        let (mut doc, el) = sample();
        let mut anim = Animator::new();
        let t0 = Instant::now();

        anim.start(&mut doc, el, FadeDirection::In, D100, t0).unwrap();
        let mut last = doc.nodes[el].opacity();
        // Irregular tick spacing, including past the end of the ramp.
        for millis in [3, 9, 40, 41, 90, 130, 200] {
            anim.tick(&mut doc, ms(t0, millis));
            let o = doc.nodes[el].opacity();
            assert!(o >= last, "opacity regressed: {last} -> {o}");
            assert!((0.0..=1.0).contains(&o));
            last = o;
        }
        assert_eq!(last, 1.0);
    }

    #[test]
    fn single_tick_past_duration_completes() {
        let (mut doc, el) = sample();
        let mut anim = Animator::new();
        let t0 = Instant::now();

        anim.start(&mut doc, el, FadeDirection::In, D100, t0).unwrap();
        let events = anim.tick(&mut doc, ms(t0, 1000));
        assert_eq!(events.len(), 1);
        assert_eq!(doc.nodes[el].opacity(), 1.0);
    }

    #[test]
    fn zero_duration_is_rejected() {
        let (mut doc, el) = sample();
        let mut anim = Animator::new();
        let err = anim
            .start(&mut doc, el, FadeDirection::In, Duration::ZERO, Instant::now())
            .unwrap_err();
        assert_eq!(err, FadeError::InvalidDuration);
    }

    #[test]
    fn detached_surface_is_rejected() {
        let (mut doc, _el) = sample();
        let orphan = doc.create_element("div");
        let mut anim = Animator::new();
        let err = anim
            .start(&mut doc, orphan, FadeDirection::In, D100, Instant::now())
            .unwrap_err();
        assert_eq!(err, FadeError::InvalidSurface(orphan));
        let err = anim
            .start(&mut doc, 999, FadeDirection::Out, D100, Instant::now())
            .unwrap_err();
        assert_eq!(err, FadeError::InvalidSurface(999));
    }

    #[test]
    fn restart_supersedes_and_stales_the_old_handle() {
        let (mut doc, el) = sample();
        let mut anim = Animator::new();
        let t0 = Instant::now();

        let first = anim.start(&mut doc, el, FadeDirection::In, D100, t0).unwrap();
        anim.tick(&mut doc, ms(t0, 50));
        let _second = anim
            .start(&mut doc, el, FadeDirection::Out, D100, ms(t0, 50))
            .unwrap();
        assert_eq!(anim.active_count(), 1);

        // The superseded handle must not be able to kill the new ramp.
        assert!(!anim.cancel(first));
        assert!(anim.is_animating(el));

        let events = anim.tick(&mut doc, ms(t0, 150));
        assert_eq!(events[0].direction, FadeDirection::Out);
        assert!(!doc.nodes[el].shown);
    }

    #[test]
    fn cancel_stops_future_ticks_but_keeps_applied_opacity() {
        let (mut doc, el) = sample();
        let mut anim = Animator::new();
        let t0 = Instant::now();

        let handle = anim.start(&mut doc, el, FadeDirection::In, D100, t0).unwrap();
        anim.tick(&mut doc, ms(t0, 50));
        let mid = doc.nodes[el].opacity();

        assert!(anim.cancel(handle));
        assert!(!anim.cancel(handle)); // second cancel is a no-op
        assert!(anim.tick(&mut doc, ms(t0, 100)).is_empty());
        assert_eq!(doc.nodes[el].opacity(), mid);
    }

    #[test]
    fn ramp_on_removed_element_is_dropped_without_event() {
        let (mut doc, el) = sample();
        let mut anim = Animator::new();
        let t0 = Instant::now();

        anim.start(&mut doc, el, FadeDirection::In, D100, t0).unwrap();
        anim.tick(&mut doc, ms(t0, 30));
        let mid = doc.nodes[el].opacity();

        doc.remove(el).unwrap();
        assert!(anim.tick(&mut doc, ms(t0, 200)).is_empty());
        assert!(!anim.is_animating(el));
        assert_eq!(doc.nodes[el].opacity(), mid);
    }

    #[test]
    fn independent_ramps_complete_deterministically() {
        let (mut doc, el) = sample();
        let other = doc.create_element("aside");
        doc.append_child(doc.root, other).unwrap();
        let mut anim = Animator::new();
        let t0 = Instant::now();

        anim.start(&mut doc, other, FadeDirection::Out, D100, t0).unwrap();
        anim.start(&mut doc, el, FadeDirection::In, D100, t0).unwrap();
        assert_eq!(anim.active_count(), 2);

        let events = anim.tick(&mut doc, ms(t0, 100));
        // Completion order follows NodeId order, not start order.
        assert_eq!(
            events,
            vec![
                FadeEvent { node: el, direction: FadeDirection::In },
                FadeEvent { node: other, direction: FadeDirection::Out },
            ]
        );
    }

    #[test]
    fn progress_reports_elapsed_fraction() {
        let (mut doc, el) = sample();
        let mut anim = Animator::new();
        let t0 = Instant::now();

        anim.start(&mut doc, el, FadeDirection::Out, D100, t0).unwrap();
        let p = anim.progress(el, ms(t0, 25)).unwrap();
        assert!((p - 0.25).abs() < 1e-3);
        assert_eq!(anim.progress(999, t0), None);
    }
}
