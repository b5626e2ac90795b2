use std::fmt::Display;
use std::hash::Hash;

/// Capability floor for every searchable state.
///
/// `Hash` supplies the numeric identity and `Display` the canonical text
/// identity; which one keys a given run is decided by the configured
/// [KeyMode](crate::KeyMode). Implemented automatically for any type with
/// both.
pub trait State: Hash + Display + Sized {}

impl<T: Hash + Display + Sized> State for T {}

/// A child state produced during expansion, together with the name of the
/// move that produced it.
///
/// The label is optional; an unlabeled successor reports its key text as the
/// move name.
#[derive(Debug, Clone)]
pub struct Successor<S> {
    pub state: S,
    pub label: Option<String>,
}

impl<S> Successor<S> {
    pub fn new(state: S) -> Self {
        Successor { state, label: None }
    }

    pub fn labeled(state: S, label: impl Into<String>) -> Self {
        Successor {
            state,
            label: Some(label.into()),
        }
    }
}

impl<S> From<S> for Successor<S> {
    fn from(state: S) -> Self {
        Successor::new(state)
    }
}
