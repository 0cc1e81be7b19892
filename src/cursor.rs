use std::fmt;

use crate::list::NodeId;
use crate::{BlockDeque, DequeError};

/// A position inside one [`BlockDeque`].
///
/// A cursor is a plain value: it borrows nothing, so it can be kept across
/// mutations of the deque and handed back to [`insert`], [`erase`] or
/// [`current_mut`]. It points either at an element or at the end position,
/// one past the last element.
///
/// Splitting, merging or dropping a block invalidates every cursor taken
/// before the change. Invalidated cursors, and cursors of other deques, are
/// rejected with [`DequeError::InvalidIterator`].
///
/// Two cursors are equal when they were taken from the same deque, point at
/// the same position and were both taken after the last structural change.
///
/// ```
/// use block_deque::BlockDeque;
///
/// let mut deque = BlockDeque::from([1, 2, 4]);
///
/// let cursor = deque.cursor(2).unwrap();
/// let inserted = deque.insert(cursor, 3).unwrap();
/// assert_eq!(deque.current(inserted), Ok(&3));
/// assert_eq!(deque, [1, 2, 3, 4]);
/// ```
///
/// [`insert`]: BlockDeque::insert
/// [`erase`]: BlockDeque::erase
/// [`current_mut`]: BlockDeque::current_mut
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct Cursor {
    pub(crate) owner: usize,
    pub(crate) node: NodeId,
    pub(crate) offset: usize,
    pub(crate) generation: u64,
}

/// A read-only cursor bound to a borrowed [`BlockDeque`].
///
/// It offers the same movement and dereference operations as the deque's
/// cursor methods without passing the deque around. While it lives, the
/// deque cannot be mutated, so it never goes stale.
///
/// ```
/// use block_deque::BlockDeque;
///
/// let deque = BlockDeque::from(['a', 'b', 'c']);
///
/// let first = deque.cbegin();
/// let last = deque.cend().move_prev().unwrap();
/// assert_eq!(last.get(), Ok(&'c'));
/// assert_eq!(last.distance(&first), Ok(2));
/// assert_eq!(first.move_by(2), Ok(last));
/// ```
pub struct CursorRef<'a, T> {
    deque: &'a BlockDeque<T>,
    cursor: Cursor,
}

impl<'a, T> CursorRef<'a, T> {
    pub(crate) fn new(deque: &'a BlockDeque<T>, cursor: Cursor) -> Self {
        CursorRef { deque, cursor }
    }

    /// Returns the detached position, usable with the mutating methods of the
    /// deque once this borrow ends.
    pub fn cursor(&self) -> Cursor {
        self.cursor
    }

    /// Returns the element under the cursor.
    ///
    /// # Errors
    ///
    /// [`DequeError::InvalidIterator`] at the end position.
    pub fn get(&self) -> Result<&'a T, DequeError> {
        self.deque.current(self.cursor)
    }

    /// Returns the cursor `n` positions away; negative `n` moves toward the
    /// front.
    ///
    /// # Errors
    ///
    /// [`DequeError::IndexOutOfBound`] if the destination is before the first
    /// element or past the end position.
    pub fn move_by(&self, n: isize) -> Result<Self, DequeError> {
        let cursor = self.deque.move_by(self.cursor, n)?;
        Ok(CursorRef::new(self.deque, cursor))
    }

    /// Returns the cursor one position toward the back.
    pub fn move_next(&self) -> Result<Self, DequeError> {
        self.move_by(1)
    }

    /// Returns the cursor one position toward the front.
    pub fn move_prev(&self) -> Result<Self, DequeError> {
        self.move_by(-1)
    }

    /// Returns the signed number of positions from `other` to `self`.
    ///
    /// # Errors
    ///
    /// [`DequeError::InvalidIterator`] if the cursors belong to different
    /// deques.
    pub fn distance(&self, other: &CursorRef<'_, T>) -> Result<isize, DequeError> {
        self.deque.distance(self.cursor, other.cursor)
    }

    /// Returns the index of the position, `len()` for the end position.
    pub fn index(&self) -> Result<usize, DequeError> {
        self.deque.index_of(self.cursor)
    }
}

impl<'a, T> Clone for CursorRef<'a, T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<'a, T> Copy for CursorRef<'a, T> {}

impl<'a, 'b, T> PartialEq<CursorRef<'b, T>> for CursorRef<'a, T> {
    fn eq(&self, other: &CursorRef<'b, T>) -> bool {
        self.cursor == other.cursor
    }
}

impl<'a, T> Eq for CursorRef<'a, T> {}

impl<'a, T> PartialEq<Cursor> for CursorRef<'a, T> {
    fn eq(&self, other: &Cursor) -> bool {
        self.cursor == *other
    }
}

impl<'a, T> PartialEq<CursorRef<'a, T>> for Cursor {
    fn eq(&self, other: &CursorRef<'a, T>) -> bool {
        *self == other.cursor
    }
}

impl<'a, T> From<CursorRef<'a, T>> for Cursor {
    fn from(cursor: CursorRef<'a, T>) -> Self {
        cursor.cursor
    }
}

impl<'a, T> fmt::Debug for CursorRef<'a, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("CursorRef").field(&self.cursor).finish()
    }
}
