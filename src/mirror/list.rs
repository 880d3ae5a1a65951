//! Ordered observable sequence.
//!
//! A `Vec` whose mutations emit typed [`ListChange`] values to
//! subscribers. Single-threaded by design (`Rc`/`RefCell`): callers
//! serialize access, matching how the diagram set is owned by one
//! event loop.

use std::cell::RefCell;
use std::rc::Rc;

/// One mutation of an observable list.
#[derive(Debug, Clone, PartialEq)]
pub enum ListChange<T> {
    /// `items` inserted starting at `index`.
    Insert { index: usize, items: Vec<T> },
    /// `count` elements removed starting at `index`.
    Remove { index: usize, count: usize },
    /// Element at `index` replaced by `item`.
    Replace { index: usize, item: T },
    /// Element moved from `from` to `to`.
    Move { from: usize, to: usize },
    /// Contents replaced wholesale; read the list for the new state.
    Reset,
}

/// Subscription handle returned by [`ObservableList::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubId(u64);

type Callback<T> = Rc<dyn Fn(&ListChange<T>)>;

struct Inner<T> {
    items: Vec<T>,
    subscribers: Vec<(SubId, Callback<T>)>,
    next_id: u64,
}

/// Shared handle to an ordered, observable sequence.
///
/// Cloning the handle shares the underlying list.
pub struct ObservableList<T> {
    inner: Rc<RefCell<Inner<T>>>,
}

impl<T> Clone for ObservableList<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T: Clone> Default for ObservableList<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone> ObservableList<T> {
    pub fn new() -> Self {
        Self::from_vec(Vec::new())
    }

    pub fn from_vec(items: Vec<T>) -> Self {
        Self {
            inner: Rc::new(RefCell::new(Inner {
                items,
                subscribers: Vec::new(),
                next_id: 0,
            })),
        }
    }

    pub fn len(&self) -> usize {
        self.inner.borrow().items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.borrow().items.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<T> {
        self.inner.borrow().items.get(index).cloned()
    }

    /// Clone of the current contents.
    pub fn snapshot(&self) -> Vec<T> {
        self.inner.borrow().items.clone()
    }

    /// Index of the first element matching the predicate.
    pub fn position<F: Fn(&T) -> bool>(&self, pred: F) -> Option<usize> {
        self.inner.borrow().items.iter().position(|t| pred(t))
    }

    // ------------------------------------------------------------------
    // Mutations (each emits exactly one ListChange)
    // ------------------------------------------------------------------

    /// Insert `item` at `index`, clamped to append when out of range.
    pub fn insert(&self, index: usize, item: T) {
        self.insert_many(index, vec![item]);
    }

    /// Insert `items` starting at `index`, clamped to append.
    pub fn insert_many(&self, index: usize, items: Vec<T>) {
        if items.is_empty() {
            return;
        }
        let index = {
            let mut inner = self.inner.borrow_mut();
            let index = index.min(inner.items.len());
            inner.items.splice(index..index, items.iter().cloned());
            index
        };
        self.dispatch(&ListChange::Insert { index, items });
    }

    pub fn push(&self, item: T) {
        let index = self.len();
        self.insert_many(index, vec![item]);
    }

    /// Remove one element. Out-of-range indices are ignored.
    pub fn remove(&self, index: usize) {
        self.remove_range(index, 1);
    }

    /// Remove `count` elements starting at `index` (clamped to the tail).
    pub fn remove_range(&self, index: usize, count: usize) {
        let removed = {
            let mut inner = self.inner.borrow_mut();
            let len = inner.items.len();
            if index >= len || count == 0 {
                return;
            }
            let count = count.min(len - index);
            inner.items.drain(index..index + count);
            count
        };
        self.dispatch(&ListChange::Remove {
            index,
            count: removed,
        });
    }

    /// Replace the element at `index`. Out-of-range indices are ignored.
    pub fn replace(&self, index: usize, item: T) {
        {
            let mut inner = self.inner.borrow_mut();
            let Some(slot) = inner.items.get_mut(index) else {
                return;
            };
            *slot = item.clone();
        }
        self.dispatch(&ListChange::Replace { index, item });
    }

    /// Move the element at `from` to `to`. Out-of-range `from` is
    /// ignored; `to` is clamped.
    pub fn move_item(&self, from: usize, to: usize) {
        let to = {
            let mut inner = self.inner.borrow_mut();
            if from >= inner.items.len() {
                return;
            }
            let item = inner.items.remove(from);
            let to = to.min(inner.items.len());
            inner.items.insert(to, item);
            to
        };
        if from != to {
            self.dispatch(&ListChange::Move { from, to });
        }
    }

    /// Replace the whole contents, emitting a single `Reset`.
    pub fn reset(&self, items: Vec<T>) {
        self.inner.borrow_mut().items = items;
        self.dispatch(&ListChange::Reset);
    }

    pub fn clear(&self) {
        self.reset(Vec::new());
    }

    /// Replace the whole contents WITHOUT notifying anyone.
    ///
    /// Used for the mirror's one-time initial synchronization.
    pub fn load_silent(&self, items: Vec<T>) {
        self.inner.borrow_mut().items = items;
    }
}

// Subscriptions carry no `Clone` bound so detaching works from any
// context, including Drop impls on observers.
impl<T> ObservableList<T> {
    pub fn subscribe(&self, callback: impl Fn(&ListChange<T>) + 'static) -> SubId {
        let mut inner = self.inner.borrow_mut();
        let id = SubId(inner.next_id);
        inner.next_id += 1;
        inner.subscribers.push((id, Rc::new(callback)));
        id
    }

    /// Remove a subscription. Unknown ids are ignored.
    pub fn unsubscribe(&self, id: SubId) {
        self.inner
            .borrow_mut()
            .subscribers
            .retain(|(sub_id, _)| *sub_id != id);
    }

    /// Notify subscribers. The borrow is released before callbacks run,
    /// so handlers may freely mutate other lists (or this one).
    fn dispatch(&self, change: &ListChange<T>) {
        let callbacks: Vec<Callback<T>> = self
            .inner
            .borrow()
            .subscribers
            .iter()
            .map(|(_, cb)| Rc::clone(cb))
            .collect();
        for cb in callbacks {
            cb(change);
        }
    }
}
