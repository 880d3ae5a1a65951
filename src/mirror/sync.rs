//! Bidirectional collection synchronizer.
//!
//! Keeps two [`ObservableList`]s element-wise equal under a pair of
//! mapping functions, propagating changes in both directions without
//! feeding back into itself: before mutating one side the mirror
//! unsubscribes from that side, re-subscribing once the mutation is
//! done, so every external change costs exactly one propagation pass.

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use thiserror::Error;

use super::list::{ListChange, ObservableList, SubId};

/// Mapping failure between the two element types.
#[derive(Debug, Error)]
pub enum MirrorError {
    #[error("element mapping failed: {0}")]
    Map(String),
}

/// Fallible element mapping.
pub type MapFn<A, B> = Rc<dyn Fn(&A) -> Result<B, MirrorError>>;

type ErrorHandler = Box<dyn Fn(&MirrorError)>;

struct MirrorInner<A, B> {
    source: ObservableList<A>,
    target: ObservableList<B>,
    fwd: MapFn<A, B>,
    back: MapFn<B, A>,
    source_sub: Cell<Option<SubId>>,
    target_sub: Cell<Option<SubId>>,
    on_error: RefCell<Option<ErrorHandler>>,
}

/// Two-way mirror over a pair of observable lists.
///
/// Construction performs a one-time synchronization: the target is
/// cleared and repopulated from the source through the forward mapping,
/// silently. Dropping (or [`dispose`](Self::dispose)-ing) the mirror
/// detaches it from both sides.
///
/// Not thread-safe by design; callers serialize access to one mirror.
pub struct CollectionMirror<A, B> {
    inner: Rc<MirrorInner<A, B>>,
}

impl<A: Clone + 'static, B: Clone + 'static> CollectionMirror<A, B> {
    pub fn new(
        source: ObservableList<A>,
        target: ObservableList<B>,
        fwd: MapFn<A, B>,
        back: MapFn<B, A>,
    ) -> Result<Self, MirrorError> {
        // Initial bulk sync, notifications suppressed.
        let mapped = source
            .snapshot()
            .iter()
            .map(|a| (fwd)(a))
            .collect::<Result<Vec<_>, _>>()?;
        target.load_silent(mapped);

        let inner = Rc::new(MirrorInner {
            source,
            target,
            fwd,
            back,
            source_sub: Cell::new(None),
            target_sub: Cell::new(None),
            on_error: RefCell::new(None),
        });
        inner.source_sub.set(Some(subscribe_source(&inner)));
        inner.target_sub.set(Some(subscribe_target(&inner)));
        Ok(Self { inner })
    }

    /// Install a handler for propagation errors (mapping failures).
    pub fn on_error(&self, handler: impl Fn(&MirrorError) + 'static) {
        *self.inner.on_error.borrow_mut() = Some(Box::new(handler));
    }

    /// Detach from both lists; later mutations no longer propagate.
    pub fn dispose(&self) {
        if let Some(id) = self.inner.source_sub.take() {
            self.inner.source.unsubscribe(id);
        }
        if let Some(id) = self.inner.target_sub.take() {
            self.inner.target.unsubscribe(id);
        }
    }
}

impl<T: Clone + 'static> CollectionMirror<T, T> {
    /// Mirror between two lists of the same element type.
    pub fn identity(source: ObservableList<T>, target: ObservableList<T>) -> Self {
        let clone_fn: MapFn<T, T> = Rc::new(|t: &T| Ok(t.clone()));
        match Self::new(source, target, Rc::clone(&clone_fn), clone_fn) {
            Ok(mirror) => mirror,
            Err(_) => unreachable!("identity mapping cannot fail"),
        }
    }
}

impl<A, B> Drop for CollectionMirror<A, B> {
    fn drop(&mut self) {
        if let Some(id) = self.inner.source_sub.take() {
            self.inner.source.unsubscribe(id);
        }
        if let Some(id) = self.inner.target_sub.take() {
            self.inner.target.unsubscribe(id);
        }
    }
}

// ============================================================================
// Propagation
// ============================================================================

fn subscribe_source<A: Clone + 'static, B: Clone + 'static>(
    inner: &Rc<MirrorInner<A, B>>,
) -> SubId {
    let weak = Rc::downgrade(inner);
    inner.source.subscribe(move |change| {
        if let Some(inner) = weak.upgrade() {
            handle_source(&inner, change);
        }
    })
}

fn subscribe_target<A: Clone + 'static, B: Clone + 'static>(
    inner: &Rc<MirrorInner<A, B>>,
) -> SubId {
    let weak = Rc::downgrade(inner);
    inner.target.subscribe(move |change| {
        if let Some(inner) = weak.upgrade() {
            handle_target(&inner, change);
        }
    })
}

fn handle_source<A: Clone + 'static, B: Clone + 'static>(
    inner: &Rc<MirrorInner<A, B>>,
    change: &ListChange<A>,
) {
    // Mute our own target subscription while mutating the target.
    if let Some(id) = inner.target_sub.take() {
        inner.target.unsubscribe(id);
    }
    let result = apply(change, &inner.source, &inner.target, &inner.fwd);
    inner.target_sub.set(Some(subscribe_target(inner)));

    if let Err(e) = result {
        // Both-reject: undo the originating change so the sides stay
        // element-wise equal, with our source subscription muted too.
        if let Some(id) = inner.source_sub.take() {
            inner.source.unsubscribe(id);
        }
        rollback(change, &inner.source, &inner.target, &inner.back);
        inner.source_sub.set(Some(subscribe_source(inner)));
        report(inner, &e);
    }
}

fn handle_target<A: Clone + 'static, B: Clone + 'static>(
    inner: &Rc<MirrorInner<A, B>>,
    change: &ListChange<B>,
) {
    if let Some(id) = inner.source_sub.take() {
        inner.source.unsubscribe(id);
    }
    let result = apply(change, &inner.target, &inner.source, &inner.back);
    inner.source_sub.set(Some(subscribe_source(inner)));

    if let Err(e) = result {
        if let Some(id) = inner.target_sub.take() {
            inner.target.unsubscribe(id);
        }
        rollback(change, &inner.target, &inner.source, &inner.fwd);
        inner.target_sub.set(Some(subscribe_target(inner)));
        report(inner, &e);
    }
}

/// Apply `change` (raised by `origin`) to `dest` through `map`.
///
/// Mapping happens before any mutation, so a failure leaves `dest`
/// untouched.
fn apply<X: Clone, Y: Clone>(
    change: &ListChange<X>,
    origin: &ObservableList<X>,
    dest: &ObservableList<Y>,
    map: &MapFn<X, Y>,
) -> Result<(), MirrorError> {
    match change {
        ListChange::Insert { index, items } => {
            let mapped = items.iter().map(|x| map(x)).collect::<Result<Vec<_>, _>>()?;
            // insert_many clamps to append when batched notifications
            // leave the lengths transiently out of step
            dest.insert_many(*index, mapped);
        }
        ListChange::Remove { index, count } => {
            // Single range removal; indices resolved back-to-front
            // internally so earlier ones stay valid.
            dest.remove_range(*index, *count);
        }
        ListChange::Replace { index, item } => {
            let mapped = map(item)?;
            dest.replace(*index, mapped);
        }
        // Remove + insert rather than a native move: uniform across
        // both backing implementations.
        ListChange::Move { from, to } => {
            if let Some(item) = dest.get(*from) {
                dest.remove(*from);
                dest.insert(*to, item);
            }
        }
        ListChange::Reset => {
            let mapped = origin
                .snapshot()
                .iter()
                .map(|x| map(x))
                .collect::<Result<Vec<_>, _>>()?;
            dest.reset(mapped);
        }
    }
    Ok(())
}

/// Undo a change on its originating list after a mapping failure.
///
/// Only Insert and Replace can fail (they map elements); Remove and
/// Move never enter this path.
fn rollback<X: Clone, Y: Clone>(
    change: &ListChange<X>,
    origin: &ObservableList<X>,
    dest: &ObservableList<Y>,
    back: &MapFn<Y, X>,
) {
    match change {
        ListChange::Insert { index, items } => {
            origin.remove_range(*index, items.len());
        }
        ListChange::Replace { index, .. } => {
            // Dest still holds the pre-change value at this index.
            if let Some(old) = dest.get(*index)
                && let Ok(restored) = back(&old)
            {
                origin.replace(*index, restored);
            }
        }
        // A failed Reset cannot be undone (the old contents are gone);
        // the error report is all we can do.
        _ => {}
    }
}

fn report<A, B>(inner: &MirrorInner<A, B>, error: &MirrorError) {
    if let Some(handler) = inner.on_error.borrow().as_ref() {
        handler(error);
    } else {
        crate::debug!("mirror"; "{}", error);
    }
}
