use std::fmt;
use std::iter::FusedIterator;

use crate::list::{BlockList, NodeId};
use crate::BlockDeque;

/// An iterator over the elements of a `BlockDeque`.
///
/// This `struct` is created by the [`iter`] method on [`BlockDeque`]. See its
/// documentation for more.
///
/// [`iter`]: BlockDeque::iter
pub struct Iter<'a, T> {
    blocks: &'a BlockList<T>,
    front: Option<NodeId>,
    front_offset: usize,
    back: Option<NodeId>,
    back_offset: usize,
    remaining: usize,
}

impl<'a, T> Iter<'a, T> {
    pub(crate) fn new(blocks: &'a BlockList<T>, len: usize) -> Self {
        let back = blocks.last();
        Iter {
            blocks,
            front: blocks.first(),
            front_offset: 0,
            back,
            back_offset: back.map_or(0, |id| blocks.block(id).len()),
            remaining: len,
        }
    }
}

impl<'a, T> Iterator for Iter<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }

        let id = self.front?;
        let block = self.blocks.block(id);
        let elem = &block[self.front_offset];

        self.front_offset += 1;
        if self.front_offset == block.len() {
            self.front = self.blocks.next(id);
            self.front_offset = 0;
        }
        self.remaining -= 1;

        Some(elem)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<'a, T> DoubleEndedIterator for Iter<'a, T> {
    fn next_back(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }

        let mut id = self.back?;
        if self.back_offset == 0 {
            id = self.blocks.prev(id)?;
            self.back = Some(id);
            self.back_offset = self.blocks.block(id).len();
        }
        self.back_offset -= 1;
        self.remaining -= 1;

        Some(&self.blocks.block(id)[self.back_offset])
    }
}

impl<'a, T> ExactSizeIterator for Iter<'a, T> {}

impl<'a, T> FusedIterator for Iter<'a, T> {}

impl<'a, T> Clone for Iter<'a, T> {
    fn clone(&self) -> Self {
        Iter {
            blocks: self.blocks,
            front: self.front,
            front_offset: self.front_offset,
            back: self.back,
            back_offset: self.back_offset,
            remaining: self.remaining,
        }
    }
}

impl<'a, T: fmt::Debug> fmt::Debug for Iter<'a, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.clone()).finish()
    }
}

/// An owning iterator over the elements of a `BlockDeque`.
///
/// This `struct` is created by the [`into_iter`] method on [`BlockDeque`]
/// (provided by the [`IntoIterator`] trait). See its documentation for more.
///
/// [`into_iter`]: BlockDeque::into_iter
/// [`IntoIterator`]: core::iter::IntoIterator
pub struct IntoIter<T> {
    deque: BlockDeque<T>,
}

impl<T> IntoIter<T> {
    pub(crate) fn new(deque: BlockDeque<T>) -> Self {
        IntoIter { deque }
    }
}

impl<T> Iterator for IntoIter<T> {
    type Item = T;

    fn next(&mut self) -> Option<Self::Item> {
        self.deque.pop_front().ok()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.deque.len(), Some(self.deque.len()))
    }
}

impl<T> DoubleEndedIterator for IntoIter<T> {
    fn next_back(&mut self) -> Option<Self::Item> {
        self.deque.pop_back().ok()
    }
}

impl<T> ExactSizeIterator for IntoIter<T> {}

impl<T> FusedIterator for IntoIter<T> {}

impl<T: fmt::Debug> fmt::Debug for IntoIter<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("IntoIter").field(&self.deque).finish()
    }
}
