#![warn(missing_docs)]
#![doc(test(attr(deny(warnings))))]

//! A double-ended queue with cheap insertion and removal at any position.
//!
//! # Layout
//!
//! A [`BlockDeque`] keeps its elements in a list of blocks, each one a
//! contiguous run of elements. Blocks are sized near the square root of the
//! number of elements, so both costs of a positional operation stay near
//! `sqrt(n)`:
//!
//! - finding the block that holds an index walks the block list from the
//!   nearer end;
//! - inserting or removing inside a block shifts the rest of that block only.
//!
//! A block that overflows is split in two halves, and a block that becomes
//! small enough is merged with its neighbour. Blocks that become empty are
//! dropped.
//!
//! # Cursors
//!
//! Positions are represented by [`Cursor`] values, which borrow nothing and
//! are handed back to the deque to read, move, insert or erase. Splits, merges
//! and dropped blocks invalidate earlier cursors; the deque detects such stale
//! cursors and rejects them with [`DequeError::InvalidIterator`] instead of
//! reading the wrong element.
//!
//! ```
//! use block_deque::BlockDeque;
//!
//! let mut deque = BlockDeque::new();
//! deque.push_back(2);
//! deque.push_front(0);
//!
//! let end = deque.end();
//! let two = deque.move_prev(end).unwrap();
//! deque.insert(two, 1).unwrap();
//!
//! assert_eq!(deque, [0, 1, 2]);
//! ```
//!
//! # Errors
//!
//! Checked accessors and every cursor operation return a [`DequeError`] on
//! failure and leave the deque unchanged.

use std::cmp::Ordering;
use std::collections::VecDeque;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::ops::{Index, IndexMut};
use std::sync::atomic::{self, AtomicUsize};

use tracing::trace;

use block::Block;
use list::{BlockList, NodeId};

pub use cursor::{Cursor, CursorRef};
pub use error::DequeError;
pub use iter::{IntoIter, Iter};

mod block;
mod buffer;
mod cursor;
mod error;
mod iter;
mod list;

#[cfg(test)]
mod drop_tracker;

/// Default lower bound of the block capacity.
///
/// See [`BlockDeque::with_baseline`].
pub const DEFAULT_BASELINE: usize = 32;

static NEXT_DEQUE_ID: AtomicUsize = AtomicUsize::new(0);

/// A double-ended queue implemented with a list of square-root sized blocks.
///
/// A `BlockDeque` with a known list of items can be initialized from an array:
///
/// ```
/// use block_deque::BlockDeque;
///
/// # #[allow(unused)]
/// let deq = BlockDeque::from([-1, 0, 1]);
/// ```
///
/// Insertion and removal cost `O(sqrt(n))` anywhere in the deque, as does
/// indexing.
pub struct BlockDeque<T> {
    blocks: BlockList<T>,
    len: usize,
    baseline: usize,
    target: usize,
    id: usize,
    generation: u64,
}

impl<T> BlockDeque<T> {
    /// Creates an empty deque.
    ///
    /// # Example
    ///
    /// ```
    /// use block_deque::BlockDeque;
    /// # #[allow(unused)]
    /// let deque: BlockDeque<u32> = BlockDeque::new();
    /// ```
    pub fn new() -> Self {
        Self::with_baseline(DEFAULT_BASELINE)
    }

    /// Creates an empty deque whose blocks hold at least `baseline` elements.
    ///
    /// The block capacity is `max(baseline, isqrt(len) + 1)`, recomputed as
    /// blocks are split and merged. A small baseline makes the deque split
    /// early; a large one keeps small deques in a single block.
    ///
    /// # Panics
    ///
    /// Panics if `baseline` is less than 2.
    ///
    /// # Example
    ///
    /// ```
    /// use block_deque::BlockDeque;
    ///
    /// let deque: BlockDeque<u32> = BlockDeque::with_baseline(8);
    ///
    /// assert_eq!(deque.baseline(), 8);
    /// assert_eq!(deque.target_capacity(), 8);
    /// assert_eq!(deque.len(), 0);
    /// ```
    pub fn with_baseline(baseline: usize) -> Self {
        assert!(baseline >= 2, "baseline block capacity must be at least 2");

        let mut blocks = BlockList::new();
        blocks.push_back(Block::with_capacity(baseline));

        BlockDeque {
            blocks,
            len: 0,
            baseline,
            target: baseline,
            id: next_deque_id(),
            generation: 0,
        }
    }

    /// Returns the lower bound of the block capacity.
    pub fn baseline(&self) -> usize {
        self.baseline
    }

    /// Returns the capacity given to blocks created by the latest split or
    /// merge.
    pub fn target_capacity(&self) -> usize {
        self.target
    }

    /// Returns the number of blocks. An empty deque has one empty block.
    ///
    /// # Example
    ///
    /// ```
    /// use block_deque::BlockDeque;
    ///
    /// let mut deque = BlockDeque::with_baseline(2);
    /// assert_eq!(deque.block_count(), 1);
    ///
    /// deque.extend([1, 2, 3]);
    /// assert_eq!(deque.block_count(), 2);
    /// ```
    pub fn block_count(&self) -> usize {
        self.blocks.len()
    }

    /// Returns the number of elements in the deque.
    ///
    /// # Example
    ///
    /// ```
    /// use block_deque::BlockDeque;
    ///
    /// let mut deque = BlockDeque::new();
    /// assert_eq!(deque.len(), 0);
    /// deque.push_back(1);
    /// assert_eq!(deque.len(), 1);
    /// ```
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns `true` if the deque is empty.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Returns a reference to the element at `index`.
    ///
    /// Element at index 0 is the front of the queue.
    ///
    /// # Errors
    ///
    /// [`DequeError::IndexOutOfBound`] if `index >= len()`.
    ///
    /// # Example
    ///
    /// ```
    /// use block_deque::{BlockDeque, DequeError};
    ///
    /// let deque = BlockDeque::from([3, 4, 5]);
    /// assert_eq!(deque.at(1), Ok(&4));
    /// assert_eq!(deque.at(3), Err(DequeError::IndexOutOfBound));
    /// ```
    pub fn at(&self, index: usize) -> Result<&T, DequeError> {
        self.get(index).ok_or(DequeError::IndexOutOfBound)
    }

    /// Returns a mutable reference to the element at `index`.
    ///
    /// # Errors
    ///
    /// [`DequeError::IndexOutOfBound`] if `index >= len()`.
    ///
    /// # Example
    ///
    /// ```
    /// use block_deque::BlockDeque;
    ///
    /// let mut deque = BlockDeque::from([3, 4, 5]);
    /// *deque.at_mut(1).unwrap() = 7;
    /// assert_eq!(deque, [3, 7, 5]);
    /// ```
    pub fn at_mut(&mut self, index: usize) -> Result<&mut T, DequeError> {
        self.get_mut(index).ok_or(DequeError::IndexOutOfBound)
    }

    /// Returns a reference to the element at `index`, or `None` if it is out
    /// of bounds.
    pub fn get(&self, index: usize) -> Option<&T> {
        if index < self.len {
            let (node, offset) = self.locate(index);
            Some(&self.blocks.block(node)[offset])
        } else {
            None
        }
    }

    /// Returns a mutable reference to the element at `index`, or `None` if it
    /// is out of bounds.
    pub fn get_mut(&mut self, index: usize) -> Option<&mut T> {
        if index < self.len {
            let (node, offset) = self.locate(index);
            Some(&mut self.blocks.block_mut(node)[offset])
        } else {
            None
        }
    }

    /// Provides a reference to the front element.
    ///
    /// # Errors
    ///
    /// [`DequeError::ContainerIsEmpty`] if the deque is empty.
    ///
    /// # Example
    ///
    /// ```
    /// use block_deque::{BlockDeque, DequeError};
    ///
    /// let mut d = BlockDeque::new();
    /// assert_eq!(d.front(), Err(DequeError::ContainerIsEmpty));
    ///
    /// d.push_back(1);
    /// d.push_back(2);
    /// assert_eq!(d.front(), Ok(&1));
    /// ```
    pub fn front(&self) -> Result<&T, DequeError> {
        self.blocks
            .block(self.first_block())
            .first()
            .ok_or(DequeError::ContainerIsEmpty)
    }

    /// Provides a mutable reference to the front element.
    ///
    /// # Errors
    ///
    /// [`DequeError::ContainerIsEmpty`] if the deque is empty.
    pub fn front_mut(&mut self) -> Result<&mut T, DequeError> {
        let first = self.first_block();
        self.blocks
            .block_mut(first)
            .first_mut()
            .ok_or(DequeError::ContainerIsEmpty)
    }

    /// Provides a reference to the back element.
    ///
    /// # Errors
    ///
    /// [`DequeError::ContainerIsEmpty`] if the deque is empty.
    ///
    /// # Example
    ///
    /// ```
    /// use block_deque::{BlockDeque, DequeError};
    ///
    /// let mut d = BlockDeque::new();
    /// assert_eq!(d.back(), Err(DequeError::ContainerIsEmpty));
    ///
    /// d.push_back(1);
    /// d.push_back(2);
    /// assert_eq!(d.back(), Ok(&2));
    /// ```
    pub fn back(&self) -> Result<&T, DequeError> {
        self.blocks
            .block(self.last_block())
            .last()
            .ok_or(DequeError::ContainerIsEmpty)
    }

    /// Provides a mutable reference to the back element.
    ///
    /// # Errors
    ///
    /// [`DequeError::ContainerIsEmpty`] if the deque is empty.
    ///
    /// # Example
    ///
    /// ```
    /// use block_deque::BlockDeque;
    ///
    /// let mut d = BlockDeque::from([1, 2]);
    /// if let Ok(x) = d.back_mut() {
    ///     *x = 9;
    /// }
    /// assert_eq!(d.back(), Ok(&9));
    /// ```
    pub fn back_mut(&mut self) -> Result<&mut T, DequeError> {
        let last = self.last_block();
        self.blocks
            .block_mut(last)
            .last_mut()
            .ok_or(DequeError::ContainerIsEmpty)
    }

    /// Returns a cursor to the front element, or the end cursor if the deque
    /// is empty.
    pub fn begin(&self) -> Cursor {
        self.position((self.first_block(), 0))
    }

    /// Returns the cursor one past the back element.
    pub fn end(&self) -> Cursor {
        self.position(self.end_position())
    }

    /// Returns a read-only cursor to the front element.
    pub fn cbegin(&self) -> CursorRef<'_, T> {
        CursorRef::new(self, self.begin())
    }

    /// Returns the read-only cursor one past the back element.
    pub fn cend(&self) -> CursorRef<'_, T> {
        CursorRef::new(self, self.end())
    }

    /// Returns a cursor to the element at `index`, or the end cursor when
    /// `index == len()`.
    ///
    /// # Errors
    ///
    /// [`DequeError::IndexOutOfBound`] if `index > len()`.
    ///
    /// # Example
    ///
    /// ```
    /// use block_deque::BlockDeque;
    ///
    /// let deque = BlockDeque::from(['a', 'b']);
    /// assert_eq!(deque.cursor(0), Ok(deque.begin()));
    /// assert_eq!(deque.cursor(2), Ok(deque.end()));
    /// assert!(deque.cursor(3).is_err());
    /// ```
    pub fn cursor(&self, index: usize) -> Result<Cursor, DequeError> {
        if index > self.len {
            return Err(DequeError::IndexOutOfBound);
        }
        Ok(self.position(self.locate(index)))
    }

    /// Binds `cursor` to this deque as a read-only cursor.
    ///
    /// The cursor is not checked here; the operations of the returned value
    /// check it.
    pub fn cursor_ref(&self, cursor: Cursor) -> CursorRef<'_, T> {
        CursorRef::new(self, cursor)
    }

    /// Returns the element under `cursor`.
    ///
    /// # Errors
    ///
    /// [`DequeError::InvalidIterator`] if the cursor belongs to another deque,
    /// is stale, or is the end cursor.
    ///
    /// # Example
    ///
    /// ```
    /// use block_deque::{BlockDeque, DequeError};
    ///
    /// let deque = BlockDeque::from([1, 2]);
    /// assert_eq!(deque.current(deque.begin()), Ok(&1));
    /// assert_eq!(deque.current(deque.end()), Err(DequeError::InvalidIterator));
    /// ```
    pub fn current(&self, cursor: Cursor) -> Result<&T, DequeError> {
        let (node, offset) = self.resolve(cursor)?;
        self.blocks
            .block(node)
            .get(offset)
            .ok_or(DequeError::InvalidIterator)
    }

    /// Returns a mutable reference to the element under `cursor`.
    ///
    /// # Errors
    ///
    /// Same as [`current`](BlockDeque::current).
    pub fn current_mut(&mut self, cursor: Cursor) -> Result<&mut T, DequeError> {
        let (node, offset) = self.resolve(cursor)?;
        self.blocks
            .block_mut(node)
            .get_mut(offset)
            .ok_or(DequeError::InvalidIterator)
    }

    /// Returns the cursor `n` positions after `cursor`, or before it when `n`
    /// is negative.
    ///
    /// # Errors
    ///
    /// [`DequeError::InvalidIterator`] if `cursor` is not a valid cursor of
    /// this deque, [`DequeError::IndexOutOfBound`] if the destination is
    /// before the front element or past the end cursor.
    ///
    /// # Example
    ///
    /// ```
    /// use block_deque::{BlockDeque, DequeError};
    ///
    /// let deque = BlockDeque::from([10, 11, 12, 13]);
    ///
    /// let third = deque.move_by(deque.begin(), 2).unwrap();
    /// assert_eq!(deque.current(third), Ok(&12));
    /// assert_eq!(deque.move_by(third, 2), Ok(deque.end()));
    /// assert_eq!(deque.move_by(third, 3), Err(DequeError::IndexOutOfBound));
    /// assert_eq!(deque.move_by(third, -2), Ok(deque.begin()));
    /// assert_eq!(deque.move_by(third, -3), Err(DequeError::IndexOutOfBound));
    /// ```
    pub fn move_by(&self, cursor: Cursor, n: isize) -> Result<Cursor, DequeError> {
        let (mut node, mut offset) = self.resolve(cursor)?;

        if n >= 0 {
            offset = offset
                .checked_add(n.unsigned_abs())
                .ok_or(DequeError::IndexOutOfBound)?;
            loop {
                let len = self.blocks.block(node).len();
                if offset < len {
                    break;
                }
                match self.blocks.next(node) {
                    Some(next) => {
                        offset -= len;
                        node = next;
                    }
                    None if offset == len => break,
                    None => return Err(DequeError::IndexOutOfBound),
                }
            }
        } else {
            let mut back = n.unsigned_abs();
            while back > offset {
                back -= offset;
                node = self.blocks.prev(node).ok_or(DequeError::IndexOutOfBound)?;
                // the end of the previous block is the start of this one
                offset = self.blocks.block(node).len();
            }
            offset -= back;
        }

        Ok(self.position((node, offset)))
    }

    /// Returns the cursor following `cursor`.
    ///
    /// # Errors
    ///
    /// Same as [`move_by`](BlockDeque::move_by).
    pub fn move_next(&self, cursor: Cursor) -> Result<Cursor, DequeError> {
        self.move_by(cursor, 1)
    }

    /// Returns the cursor preceding `cursor`.
    ///
    /// # Errors
    ///
    /// Same as [`move_by`](BlockDeque::move_by).
    pub fn move_prev(&self, cursor: Cursor) -> Result<Cursor, DequeError> {
        self.move_by(cursor, -1)
    }

    /// Returns the index of the element under `cursor`, or `len()` for the
    /// end cursor.
    ///
    /// # Errors
    ///
    /// [`DequeError::InvalidIterator`] if `cursor` is not a valid cursor of
    /// this deque.
    pub fn index_of(&self, cursor: Cursor) -> Result<usize, DequeError> {
        let (node, offset) = self.resolve(cursor)?;

        let mut index = offset;
        for (id, block) in self.blocks.iter() {
            if id == node {
                return Ok(index);
            }
            index += block.len();
        }
        unreachable!("resolved cursor outside of the block list")
    }

    /// Returns the signed number of positions from `b` to `a`, so that
    /// `move_by(b, distance(a, b)) == a`.
    ///
    /// # Errors
    ///
    /// [`DequeError::InvalidIterator`] if either cursor is not a valid cursor
    /// of this deque, which includes cursors of two different deques.
    ///
    /// # Example
    ///
    /// ```
    /// use block_deque::BlockDeque;
    ///
    /// let deque = BlockDeque::from([1, 2, 3]);
    /// assert_eq!(deque.distance(deque.end(), deque.begin()), Ok(3));
    /// assert_eq!(deque.distance(deque.begin(), deque.end()), Ok(-3));
    /// ```
    pub fn distance(&self, a: Cursor, b: Cursor) -> Result<isize, DequeError> {
        let a = self.index_of(a)?;
        let b = self.index_of(b)?;
        Ok(a as isize - b as isize)
    }

    /// Inserts `value` before the element under `cursor` (at the back for the
    /// end cursor), returning a cursor to the inserted element.
    ///
    /// A full block is split first, which invalidates earlier cursors.
    ///
    /// # Errors
    ///
    /// [`DequeError::InvalidIterator`] if `cursor` is not a valid cursor of
    /// this deque. The value is dropped in that case.
    ///
    /// # Example
    ///
    /// ```
    /// use block_deque::BlockDeque;
    ///
    /// let mut deque = BlockDeque::from(['a', 'c']);
    /// let c = deque.move_next(deque.begin()).unwrap();
    ///
    /// let b = deque.insert(c, 'b').unwrap();
    /// assert_eq!(deque.current(b), Ok(&'b'));
    /// assert_eq!(deque, ['a', 'b', 'c']);
    /// ```
    pub fn insert(&mut self, cursor: Cursor, value: T) -> Result<Cursor, DequeError> {
        let (node, offset) = self.resolve(cursor)?;
        let position = self.insert_raw(node, offset, value);
        Ok(self.position(position))
    }

    /// Inserts `value` at `index`, shifting the following elements toward the
    /// back, and returns a cursor to it.
    ///
    /// # Errors
    ///
    /// [`DequeError::IndexOutOfBound`] if `index > len()`.
    ///
    /// # Example
    ///
    /// ```
    /// use block_deque::BlockDeque;
    ///
    /// let mut deque = BlockDeque::from(['a', 'b', 'c']);
    /// deque.insert_at(1, 'd').unwrap();
    /// assert_eq!(deque, ['a', 'd', 'b', 'c']);
    /// ```
    pub fn insert_at(&mut self, index: usize, value: T) -> Result<Cursor, DequeError> {
        if index > self.len {
            return Err(DequeError::IndexOutOfBound);
        }
        let (node, offset) = self.locate(index);
        let position = self.insert_raw(node, offset, value);
        Ok(self.position(position))
    }

    /// Removes the element under `cursor`, returning a cursor to the element
    /// that took its place, or the end cursor.
    ///
    /// # Errors
    ///
    /// [`DequeError::InvalidIterator`] if `cursor` is the end cursor or not a
    /// valid cursor of this deque.
    ///
    /// # Example
    ///
    /// ```
    /// use block_deque::BlockDeque;
    ///
    /// let mut deque = BlockDeque::from([1, 2, 3]);
    ///
    /// let next = deque.erase(deque.begin()).unwrap();
    /// assert_eq!(deque.current(next), Ok(&2));
    ///
    /// let last = deque.move_next(next).unwrap();
    /// assert_eq!(deque.erase(last), Ok(deque.end()));
    /// assert_eq!(deque, [2]);
    /// ```
    pub fn erase(&mut self, cursor: Cursor) -> Result<Cursor, DequeError> {
        self.take(cursor).map(|(_, position)| position)
    }

    /// Removes the element under `cursor` and returns it together with the
    /// cursor that [`erase`](BlockDeque::erase) would return.
    ///
    /// # Errors
    ///
    /// Same as [`erase`](BlockDeque::erase).
    pub fn take(&mut self, cursor: Cursor) -> Result<(T, Cursor), DequeError> {
        let (node, offset) = self.resolve(cursor)?;
        if offset == self.blocks.block(node).len() {
            return Err(DequeError::InvalidIterator);
        }
        let (value, position) = self.remove_raw(node, offset);
        Ok((value, self.position(position)))
    }

    /// Removes and returns the element at `index`.
    ///
    /// # Errors
    ///
    /// [`DequeError::IndexOutOfBound`] if `index >= len()`.
    ///
    /// # Example
    ///
    /// ```
    /// use block_deque::BlockDeque;
    ///
    /// let mut buf = BlockDeque::from([1, 2, 3]);
    /// assert_eq!(buf.remove_at(1), Ok(2));
    /// assert_eq!(buf, [1, 3]);
    /// ```
    pub fn remove_at(&mut self, index: usize) -> Result<T, DequeError> {
        if index >= self.len {
            return Err(DequeError::IndexOutOfBound);
        }
        let (node, offset) = self.locate(index);
        let (value, _) = self.remove_raw(node, offset);
        Ok(value)
    }

    /// Appends an element to the back of the deque.
    ///
    /// # Example
    ///
    /// ```
    /// use block_deque::BlockDeque;
    ///
    /// let mut buf = BlockDeque::new();
    /// buf.push_back(1);
    /// buf.push_back(3);
    /// assert_eq!(buf.back(), Ok(&3));
    /// ```
    pub fn push_back(&mut self, value: T) {
        let (node, offset) = self.end_position();
        self.insert_raw(node, offset, value);
    }

    /// Prepends an element to the deque.
    ///
    /// # Example
    ///
    /// ```
    /// use block_deque::BlockDeque;
    ///
    /// let mut d = BlockDeque::new();
    /// d.push_front(1);
    /// d.push_front(2);
    /// assert_eq!(d.front(), Ok(&2));
    /// ```
    pub fn push_front(&mut self, value: T) {
        let first = self.first_block();
        self.insert_raw(first, 0, value);
    }

    /// Removes the last element from the deque and returns it.
    ///
    /// # Errors
    ///
    /// [`DequeError::ContainerIsEmpty`] if the deque is empty.
    ///
    /// # Example
    ///
    /// ```
    /// use block_deque::{BlockDeque, DequeError};
    ///
    /// let mut buf = BlockDeque::new();
    /// assert_eq!(buf.pop_back(), Err(DequeError::ContainerIsEmpty));
    /// buf.push_back(1);
    /// buf.push_back(3);
    /// assert_eq!(buf.pop_back(), Ok(3));
    /// ```
    pub fn pop_back(&mut self) -> Result<T, DequeError> {
        if self.is_empty() {
            Err(DequeError::ContainerIsEmpty)
        } else {
            Ok(self.pop_back_raw())
        }
    }

    /// Removes the first element and returns it.
    ///
    /// # Errors
    ///
    /// [`DequeError::ContainerIsEmpty`] if the deque is empty.
    ///
    /// # Example
    ///
    /// ```
    /// use block_deque::{BlockDeque, DequeError};
    ///
    /// let mut d = BlockDeque::new();
    /// d.push_back(1);
    /// d.push_back(2);
    ///
    /// assert_eq!(d.pop_front(), Ok(1));
    /// assert_eq!(d.pop_front(), Ok(2));
    /// assert_eq!(d.pop_front(), Err(DequeError::ContainerIsEmpty));
    /// ```
    pub fn pop_front(&mut self) -> Result<T, DequeError> {
        if self.is_empty() {
            return Err(DequeError::ContainerIsEmpty);
        }
        let first = self.first_block();
        let (value, _) = self.remove_raw(first, 0);
        Ok(value)
    }

    /// Clears the deque, removing all values.
    ///
    /// # Example
    ///
    /// ```
    /// use block_deque::BlockDeque;
    ///
    /// let mut deque = BlockDeque::new();
    /// deque.push_back(1);
    /// deque.clear();
    /// assert!(deque.is_empty());
    /// ```
    pub fn clear(&mut self) {
        while !self.is_empty() {
            self.pop_back_raw();
        }
    }

    /// Returns a front-to-back iterator.
    ///
    /// # Example
    ///
    /// ```
    /// use block_deque::BlockDeque;
    ///
    /// let buf = BlockDeque::from([5, 3, 4]);
    /// let b: &[_] = &[&5, &3, &4];
    /// let c: Vec<&i32> = buf.iter().collect();
    /// assert_eq!(&c[..], b);
    /// ```
    pub fn iter(&self) -> Iter<'_, T> {
        Iter::new(&self.blocks, self.len)
    }

    fn capacity_for(&self, len: usize) -> usize {
        self.baseline.max(isqrt(len) + 1)
    }

    fn first_block(&self) -> NodeId {
        match self.blocks.first() {
            Some(id) => id,
            None => unreachable!("deque without blocks"),
        }
    }

    fn last_block(&self) -> NodeId {
        match self.blocks.last() {
            Some(id) => id,
            None => unreachable!("deque without blocks"),
        }
    }

    fn end_position(&self) -> (NodeId, usize) {
        let last = self.last_block();
        (last, self.blocks.block(last).len())
    }

    fn position(&self, (node, offset): (NodeId, usize)) -> Cursor {
        Cursor {
            owner: self.id,
            node,
            offset,
            generation: self.generation,
        }
    }

    /// Finds the block and offset of `index`, walking from the nearer end.
    /// `index == len` resolves to the end position.
    fn locate(&self, index: usize) -> (NodeId, usize) {
        debug_assert!(index <= self.len);

        if index == self.len {
            return self.end_position();
        }

        if index < self.len / 2 {
            let mut rest = index;
            for (id, block) in self.blocks.iter() {
                if rest < block.len() {
                    return (id, rest);
                }
                rest -= block.len();
            }
        } else {
            let mut from_back = self.len - index;
            for (id, block) in self.blocks.iter().rev() {
                if from_back <= block.len() {
                    return (id, block.len() - from_back);
                }
                from_back -= block.len();
            }
        }

        unreachable!("index {index} not found among {} elements", self.len)
    }

    /// Checks that `cursor` was taken from this deque after the last
    /// structural change and still points inside its block.
    fn resolve(&self, cursor: Cursor) -> Result<(NodeId, usize), DequeError> {
        if cursor.owner != self.id || cursor.generation != self.generation {
            return Err(DequeError::InvalidIterator);
        }

        let block = self
            .blocks
            .get(cursor.node)
            .ok_or(DequeError::InvalidIterator)?;
        let at_end = cursor.offset == block.len() && self.blocks.last() == Some(cursor.node);

        if cursor.offset < block.len() || at_end {
            Ok((cursor.node, cursor.offset))
        } else {
            Err(DequeError::InvalidIterator)
        }
    }

    /// Moves a position past the end of a non-last block to the start of the
    /// next block.
    fn normalize(&self, node: NodeId, offset: usize) -> (NodeId, usize) {
        if offset == self.blocks.block(node).len() {
            if let Some(next) = self.blocks.next(node) {
                return (next, 0);
            }
        }
        (node, offset)
    }

    fn insert_raw(&mut self, node: NodeId, offset: usize, value: T) -> (NodeId, usize) {
        let (node, offset) = if self.blocks.block(node).is_full() {
            let (left, right) = self.split(node);
            let left_len = self.blocks.block(left).len();
            if offset < left_len {
                (left, offset)
            } else {
                (right, offset - left_len)
            }
        } else {
            (node, offset)
        };

        self.blocks.block_mut(node).insert(offset, value);
        self.len += 1;

        (node, offset)
    }

    fn remove_raw(&mut self, node: NodeId, offset: usize) -> (T, (NodeId, usize)) {
        if self.blocks.next(node).is_none() && offset + 1 == self.blocks.block(node).len() {
            let value = self.pop_back_raw();
            return (value, self.end_position());
        }

        self.target = self.capacity_for(self.len);
        let (node, offset) = self.merge_around(node, offset);

        let block = self.blocks.block_mut(node);
        let value = block.remove(offset);
        let emptied = block.is_empty();
        self.len -= 1;

        let position = if emptied {
            let (_, next) = self.blocks.erase(node);
            self.generation += 1;
            trace!(blocks = self.blocks.len(), "dropped emptied block");
            match next {
                Some(next) => (next, 0),
                None => unreachable!("emptied the last block away from the back"),
            }
        } else {
            self.normalize(node, offset)
        };

        (value, position)
    }

    /// Removes the back element. The deque must not be empty.
    fn pop_back_raw(&mut self) -> T {
        let last = self.last_block();
        let block = self.blocks.block_mut(last);
        let value = match block.pop() {
            Some(value) => value,
            None => unreachable!("last block of a non-empty deque is empty"),
        };
        let emptied = block.is_empty();
        self.len -= 1;

        if emptied && self.blocks.len() > 1 {
            self.blocks.erase(last);
            self.generation += 1;
            trace!(blocks = self.blocks.len(), "dropped emptied last block");
        }

        value
    }

    /// Replaces the full block `node` with two halves, returning their ids.
    fn split(&mut self, node: NodeId) -> (NodeId, NodeId) {
        self.target = self.capacity_for(self.len);

        let (block, next) = self.blocks.erase(node);
        let len = block.len();
        let at = len / 2;
        // both halves need room for the element about to be inserted
        let capacity = self.target.max(len - at + 1);
        trace!(len, capacity, blocks = self.blocks.len() + 2, "splitting full block");

        let (left, right) = block.split(at, capacity);
        let right = self.blocks.insert_before(next, right);
        let left = self.blocks.insert_before(Some(right), left);
        self.generation += 1;

        (left, right)
    }

    /// Merges the block at `node` with a neighbour when both fit in one block
    /// of the target capacity, returning the new position of `offset`.
    ///
    /// The previous block is preferred; the first block merges with the next
    /// one instead.
    fn merge_around(&mut self, node: NodeId, offset: usize) -> (NodeId, usize) {
        let len = self.blocks.block(node).len();

        if let Some(prev) = self.blocks.prev(node) {
            let prev_len = self.blocks.block(prev).len();
            if prev_len + len < self.target {
                return (self.merge(prev, node), prev_len + offset);
            }
        } else if let Some(next) = self.blocks.next(node) {
            if len + self.blocks.block(next).len() < self.target {
                return (self.merge(node, next), offset);
            }
        }

        (node, offset)
    }

    fn merge(&mut self, left: NodeId, right: NodeId) -> NodeId {
        let (left, _) = self.blocks.erase(left);
        let (right, next) = self.blocks.erase(right);
        trace!(
            left = left.len(),
            right = right.len(),
            capacity = self.target,
            "merging adjacent blocks"
        );

        let merged = Block::merge(left, right, self.target);
        self.generation += 1;
        self.blocks.insert_before(next, merged)
    }
}

fn next_deque_id() -> usize {
    NEXT_DEQUE_ID.fetch_add(1, atomic::Ordering::Relaxed)
}

fn isqrt(n: usize) -> usize {
    if n < 2 {
        return n;
    }
    let mut x = n;
    let mut y = n / 2 + n % 2;
    while y < x {
        x = y;
        y = (x + n / x) / 2;
    }
    x
}

impl<T> Default for BlockDeque<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone> Clone for BlockDeque<T> {
    fn clone(&self) -> Self {
        BlockDeque {
            blocks: self.blocks.clone(),
            len: self.len,
            baseline: self.baseline,
            target: self.target,
            id: next_deque_id(),
            generation: 0,
        }
    }

    /// Replaces the contents with a copy of `source`. Cursors previously
    /// taken from `self` become invalid.
    fn clone_from(&mut self, source: &Self) {
        self.blocks = source.blocks.clone();
        self.len = source.len;
        self.baseline = source.baseline;
        self.target = source.target;
        self.generation += 1;
    }
}

impl<T: fmt::Debug> fmt::Debug for BlockDeque<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

impl<T> Index<usize> for BlockDeque<T> {
    type Output = T;

    fn index(&self, index: usize) -> &T {
        let len = self.len;
        match self.get(index) {
            Some(elem) => elem,
            None => panic!("index out of bounds: the len is {len} but the index is {index}"),
        }
    }
}

impl<T> IndexMut<usize> for BlockDeque<T> {
    fn index_mut(&mut self, index: usize) -> &mut T {
        let len = self.len;
        match self.get_mut(index) {
            Some(elem) => elem,
            None => panic!("index out of bounds: the len is {len} but the index is {index}"),
        }
    }
}

impl<T> IntoIterator for BlockDeque<T> {
    type Item = T;

    type IntoIter = IntoIter<T>;

    fn into_iter(self) -> Self::IntoIter {
        IntoIter::new(self)
    }
}

impl<'a, T> IntoIterator for &'a BlockDeque<T> {
    type Item = &'a T;

    type IntoIter = Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

macro_rules! impl_partial_eq {
    ([$($n:tt)*] $rhs:ty) => {
        impl<T, U, $($n)*> PartialEq<$rhs> for BlockDeque<T>
        where
            T: PartialEq<U>,
        {
            fn eq(&self, other: & $rhs) -> bool {
                self.len() == other.len() && self.iter().zip(other.iter()).all(|(a, b)| a == b)
            }
        }
    };
}

impl_partial_eq!([const N: usize] [U; N]);
impl_partial_eq!([const N: usize] &[U; N]);
impl_partial_eq!([const N: usize] &mut [U; N]);
impl_partial_eq!([] & [U]);
impl_partial_eq!([] &mut [U]);
impl_partial_eq!([] Vec<U>);
impl_partial_eq!([] VecDeque<U>);
impl_partial_eq!([] BlockDeque<U>);

impl<T: Eq> Eq for BlockDeque<T> {}

impl<T: PartialOrd> PartialOrd for BlockDeque<T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        self.iter().partial_cmp(other.iter())
    }
}

impl<T: Ord> Ord for BlockDeque<T> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.iter().cmp(other.iter())
    }
}

impl<T: Hash> Hash for BlockDeque<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_usize(self.len);
        self.iter().for_each(|elem| elem.hash(state));
    }
}

impl<T, const N: usize> From<[T; N]> for BlockDeque<T> {
    /// Converts a `[T; N]` into a `BlockDeque<T>`.
    ///
    /// ```
    /// use block_deque::BlockDeque;
    ///
    /// let deq = BlockDeque::from([1, 2, 3, 4]);
    /// assert_eq!(deq, [1, 2, 3, 4]);
    /// ```
    fn from(value: [T; N]) -> Self {
        Self::from_iter(value)
    }
}

impl<T> From<Vec<T>> for BlockDeque<T> {
    /// Turn a [`Vec<T>`] into a [`BlockDeque<T>`].
    fn from(value: Vec<T>) -> Self {
        Self::from_iter(value)
    }
}

impl<T> FromIterator<T> for BlockDeque<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut deque = Self::new();
        deque.extend(iter);
        deque
    }
}

impl<T> Extend<T> for BlockDeque<T> {
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        for elem in iter {
            self.push_back(elem);
        }
    }
}

impl<'a, T: Copy + 'a> Extend<&'a T> for BlockDeque<T> {
    fn extend<I: IntoIterator<Item = &'a T>>(&mut self, iter: I) {
        self.extend(iter.into_iter().copied());
    }
}

#[cfg(test)]
impl<T> BlockDeque<T> {
    pub(crate) fn from_iter_with_baseline<I: IntoIterator<Item = T>>(
        iter: I,
        baseline: usize,
    ) -> Self {
        let mut deque = Self::with_baseline(baseline);
        deque.extend(iter);
        deque
    }
}
