//! Observable collections and bidirectional synchronization.
//!
//! The diagram set is an [`ObservableList`]; any second view of it
//! (another ordered collection) stays consistent through a
//! [`CollectionMirror`].

#![allow(dead_code)]

// Ordered observable sequence.
mod list;
// Cycle-safe two-way synchronizer.
mod sync;

#[cfg(test)]
mod tests;

pub use list::{ListChange, ObservableList, SubId};
pub use sync::{CollectionMirror, MapFn, MirrorError};
