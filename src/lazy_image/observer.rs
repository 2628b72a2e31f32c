//! Single-threaded model of viewport intersection observation.
//!
//! A [`Viewport`] tracks how much of each element is visible and notifies
//! watchers when an element crosses their threshold. Notifications are queued
//! and delivered by [`Viewport::flush`], the way a browser delivers observer
//! callbacks on a later turn of the event loop. Callbacks therefore never run
//! inside `observe`, and a callback may cancel its own subscription.
//!
//! Each [`Subscription`] owns exactly one watch. `cancel` is idempotent and
//! also runs on drop, so a torn-down owner can never be called back.

use std::cell::{Cell, RefCell};
use std::collections::{HashMap, VecDeque};
use std::rc::{Rc, Weak};

/// Visibility report delivered to a watcher.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IntersectionEntry {
    /// Visible fraction of the element, `0.0..=1.0`.
    pub ratio: f64,
    /// Whether `ratio` meets the watcher's threshold.
    pub is_intersecting: bool,
}

type Callback = Rc<RefCell<dyn FnMut(IntersectionEntry)>>;

struct Watcher {
    id: u64,
    target: String,
    threshold: f64,
    /// Last side of the threshold reported to this watcher.
    intersecting: bool,
    active: Rc<Cell<bool>>,
    callback: Callback,
}

#[derive(Default)]
struct Registry {
    next_id: u64,
    watchers: Vec<Watcher>,
    visibility: HashMap<String, f64>,
    queue: VecDeque<(u64, IntersectionEntry)>,
}

/// Observation root shared by every image on a page.
#[derive(Clone, Default)]
pub struct Viewport {
    registry: Rc<RefCell<Registry>>,
}

impl Viewport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start watching `target`. The callback fires once per threshold crossing.
    ///
    /// If the target is already visible past the threshold, an initial entry is
    /// queued for the next [`flush`](Self::flush).
    pub fn observe<F>(&self, target: &str, threshold: f64, callback: F) -> Subscription
    where
        F: FnMut(IntersectionEntry) + 'static,
    {
        let active = Rc::new(Cell::new(true));
        let mut reg = self.registry.borrow_mut();
        let id = reg.next_id;
        reg.next_id += 1;

        let ratio = reg.visibility.get(target).copied().unwrap_or(0.0);
        let intersecting = ratio >= threshold;
        if intersecting {
            reg.queue.push_back((
                id,
                IntersectionEntry {
                    ratio,
                    is_intersecting: true,
                },
            ));
        }
        reg.watchers.push(Watcher {
            id,
            target: target.to_string(),
            threshold,
            intersecting,
            active: Rc::clone(&active),
            callback: Rc::new(RefCell::new(callback)),
        });

        Subscription {
            id,
            registry: Rc::downgrade(&self.registry),
            active,
        }
    }

    /// Record a new visible fraction for `target` and deliver any crossings.
    ///
    /// Returns the number of callbacks invoked.
    pub fn set_visibility(&self, target: &str, ratio: f64) -> usize {
        let ratio = ratio.clamp(0.0, 1.0);
        {
            let mut reg = self.registry.borrow_mut();
            reg.visibility.insert(target.to_string(), ratio);
            let Registry {
                watchers, queue, ..
            } = &mut *reg;
            for w in watchers.iter_mut().filter(|w| w.target == target) {
                let now = ratio >= w.threshold;
                if now != w.intersecting {
                    w.intersecting = now;
                    queue.push_back((
                        w.id,
                        IntersectionEntry {
                            ratio,
                            is_intersecting: now,
                        },
                    ));
                }
            }
        }
        self.flush()
    }

    /// Deliver queued entries. Returns the number of callbacks invoked.
    pub fn flush(&self) -> usize {
        let mut delivered = 0;
        loop {
            let next = {
                let mut reg = self.registry.borrow_mut();
                let Some((id, entry)) = reg.queue.pop_front() else {
                    break;
                };
                reg.watchers
                    .iter()
                    .find(|w| w.id == id)
                    .map(|w| (Rc::clone(&w.active), Rc::clone(&w.callback), entry))
            };
            // Registry borrow is released here so callbacks may cancel.
            if let Some((active, callback, entry)) = next {
                if active.get() {
                    (callback.borrow_mut())(entry);
                    delivered += 1;
                }
            }
        }
        delivered
    }

    /// Last reported visible fraction of `target`, if it is still tracked.
    pub fn visibility(&self, target: &str) -> Option<f64> {
        self.registry.borrow().visibility.get(target).copied()
    }

    /// Drop `target` from the layout once it has left the page.
    ///
    /// Kept while any watch on it is live; returns whether it was removed.
    pub fn forget(&self, target: &str) -> bool {
        let mut reg = self.registry.borrow_mut();
        if reg.watchers.iter().any(|w| w.target == target) {
            return false;
        }
        reg.visibility.remove(target).is_some()
    }

    /// Number of live watches on `target`.
    pub fn watch_count(&self, target: &str) -> usize {
        self.registry
            .borrow()
            .watchers
            .iter()
            .filter(|w| w.target == target)
            .count()
    }

    /// Number of live watches across all targets.
    pub fn total_watches(&self) -> usize {
        self.registry.borrow().watchers.len()
    }
}

/// Handle to one watch. Cancelled explicitly or on drop.
pub struct Subscription {
    id: u64,
    registry: Weak<RefCell<Registry>>,
    active: Rc<Cell<bool>>,
}

impl Subscription {
    /// Stop watching. Safe to call any number of times, including from inside
    /// the subscription's own callback.
    pub fn cancel(&self) {
        if !self.active.replace(false) {
            return;
        }
        if let Some(reg) = self.registry.upgrade() {
            let mut reg = reg.borrow_mut();
            reg.watchers.retain(|w| w.id != self.id);
            reg.queue.retain(|(id, _)| *id != self.id);
        }
    }

    pub fn is_active(&self) -> bool {
        self.active.get()
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.cancel();
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("id", &self.id)
            .field("active", &self.active.get())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn counter() -> (Rc<Cell<u32>>, impl FnMut(IntersectionEntry) + 'static) {
        let hits = Rc::new(Cell::new(0));
        let h = Rc::clone(&hits);
        (hits, move |_| h.set(h.get() + 1))
    }

    #[test]
    fn fires_when_threshold_is_crossed() {
        let vp = Viewport::new();
        let (hits, cb) = counter();
        let _sub = vp.observe("a", 0.1, cb);

        assert_eq!(vp.set_visibility("a", 0.05), 0);
        assert_eq!(hits.get(), 0);
        assert_eq!(vp.set_visibility("a", 0.1), 1);
        assert_eq!(hits.get(), 1);
    }

    #[test]
    fn no_repeat_without_a_new_crossing() {
        let vp = Viewport::new();
        let (hits, cb) = counter();
        let _sub = vp.observe("a", 0.1, cb);

        vp.set_visibility("a", 0.5);
        vp.set_visibility("a", 0.9);
        assert_eq!(hits.get(), 1);
    }

    #[test]
    fn leaving_reports_not_intersecting() {
        let vp = Viewport::new();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let s = Rc::clone(&seen);
        let _sub = vp.observe("a", 0.1, move |e| s.borrow_mut().push(e.is_intersecting));

        vp.set_visibility("a", 0.3);
        vp.set_visibility("a", 0.0);
        assert_eq!(*seen.borrow(), vec![true, false]);
    }

    #[test]
    fn already_visible_target_is_queued_until_flush() {
        let vp = Viewport::new();
        vp.set_visibility("a", 1.0);
        let (hits, cb) = counter();
        let _sub = vp.observe("a", 0.1, cb);
        assert_eq!(hits.get(), 0);
        assert_eq!(vp.flush(), 1);
        assert_eq!(hits.get(), 1);
    }

    #[test]
    fn other_targets_are_unaffected() {
        let vp = Viewport::new();
        let (hits, cb) = counter();
        let _sub = vp.observe("a", 0.1, cb);
        vp.set_visibility("b", 1.0);
        assert_eq!(hits.get(), 0);
    }

    #[test]
    fn cancel_is_idempotent_and_detaches() {
        let vp = Viewport::new();
        let (hits, cb) = counter();
        let sub = vp.observe("a", 0.1, cb);
        assert_eq!(vp.watch_count("a"), 1);

        sub.cancel();
        sub.cancel();
        assert!(!sub.is_active());
        assert_eq!(vp.watch_count("a"), 0);

        vp.set_visibility("a", 1.0);
        assert_eq!(hits.get(), 0);
    }

    #[test]
    fn drop_cancels() {
        let vp = Viewport::new();
        let (hits, cb) = counter();
        drop(vp.observe("a", 0.1, cb));
        assert_eq!(vp.total_watches(), 0);
        vp.set_visibility("a", 1.0);
        assert_eq!(hits.get(), 0);
    }

    #[test]
    fn cancel_drops_queued_entry() {
        let vp = Viewport::new();
        vp.set_visibility("a", 1.0);
        let (hits, cb) = counter();
        let sub = vp.observe("a", 0.1, cb);
        sub.cancel();
        assert_eq!(vp.flush(), 0);
        assert_eq!(hits.get(), 0);
    }

    #[test]
    fn callback_can_cancel_its_own_subscription() {
        let vp = Viewport::new();
        let slot: Rc<RefCell<Option<Subscription>>> = Rc::new(RefCell::new(None));
        let hits = Rc::new(Cell::new(0));

        let s = Rc::clone(&slot);
        let h = Rc::clone(&hits);
        let sub = vp.observe("a", 0.1, move |_| {
            h.set(h.get() + 1);
            if let Some(sub) = s.borrow().as_ref() {
                sub.cancel();
            }
        });
        *slot.borrow_mut() = Some(sub);

        vp.set_visibility("a", 1.0);
        vp.set_visibility("a", 0.0);
        vp.set_visibility("a", 1.0);
        assert_eq!(hits.get(), 1);
        assert_eq!(vp.watch_count("a"), 0);
    }

    #[test]
    fn forget_removes_unwatched_target() {
        let vp = Viewport::new();
        let (_hits, cb) = counter();
        let sub = vp.observe("a", 0.1, cb);
        vp.set_visibility("a", 0.05);

        assert!(!vp.forget("a"));
        assert_eq!(vp.visibility("a"), Some(0.05));

        sub.cancel();
        assert!(vp.forget("a"));
        assert_eq!(vp.visibility("a"), None);
        assert!(vp.registry.borrow().visibility.is_empty());
    }

    #[test]
    fn cancel_after_viewport_dropped_is_harmless() {
        let vp = Viewport::new();
        let (_hits, cb) = counter();
        let sub = vp.observe("a", 0.1, cb);
        drop(vp);
        sub.cancel();
        assert!(!sub.is_active());
    }
}
