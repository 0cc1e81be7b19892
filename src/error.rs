use std::error::Error;
use std::fmt;

/// Errors of [`BlockDeque`] and its cursors.
///
/// A failed operation leaves the deque unchanged.
///
/// [`BlockDeque`]: crate::BlockDeque
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum DequeError {
    /// An index was past the last element, or a cursor was moved before the
    /// first element or past the end.
    IndexOutOfBound,

    /// The operation needs at least one element.
    ContainerIsEmpty,

    /// The cursor belongs to another deque, was invalidated by a structural
    /// change, or does not point at an element where one is required.
    InvalidIterator,
}

impl fmt::Display for DequeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DequeError::IndexOutOfBound => write!(f, "index out of bound"),
            DequeError::ContainerIsEmpty => write!(f, "container is empty"),
            DequeError::InvalidIterator => write!(f, "invalid iterator"),
        }
    }
}

impl Error for DequeError {}
