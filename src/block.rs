use std::fmt;
use std::ops::{Deref, DerefMut};
use std::ptr;
use std::slice;

use crate::buffer::Buffer;

/// A contiguous run of deque elements with a capacity fixed at creation.
///
/// Elements live in `[0, len)` of the buffer; the rest is uninitialized.
pub(crate) struct Block<T> {
    buf: Buffer<T>,
    len: usize,
}

impl<T> Block<T> {
    pub fn with_capacity(capacity: usize) -> Self {
        Block {
            buf: Buffer::with_capacity(capacity),
            len: 0,
        }
    }

    fn ptr(&self) -> *mut T {
        self.buf.ptr.as_ptr()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    /// Zero-sized element types get `usize::MAX`, so their blocks never fill.
    pub fn capacity(&self) -> usize {
        self.buf.cap
    }

    pub fn is_full(&self) -> bool {
        self.len == self.capacity()
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Shifts `[index, len)` one slot to the right and writes `elem` at
    /// `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index > len` or if the block is full.
    pub fn insert(&mut self, index: usize, elem: T) {
        assert!(index <= self.len, "index out of bounds");
        assert!(!self.is_full(), "block is full");

        unsafe {
            let slot = self.ptr().add(index);
            ptr::copy(slot, slot.add(1), self.len - index);
            ptr::write(slot, elem);
        }
        self.len += 1;
    }

    /// Removes the element at `index`, shifting `[index + 1, len)` one slot to
    /// the left.
    ///
    /// # Panics
    ///
    /// Panics if `index >= len`.
    pub fn remove(&mut self, index: usize) -> T {
        assert!(index < self.len, "index out of bounds");

        self.len -= 1;
        unsafe {
            let slot = self.ptr().add(index);
            let elem = ptr::read(slot);
            ptr::copy(slot.add(1), slot, self.len - index);
            elem
        }
    }

    pub fn push(&mut self, elem: T) {
        self.insert(self.len, elem);
    }

    pub fn pop(&mut self) -> Option<T> {
        if self.len == 0 {
            None
        } else {
            self.len -= 1;
            unsafe { Some(ptr::read(self.ptr().add(self.len))) }
        }
    }

    /// Moves `[0, at)` and `[at, len)` into two new blocks of `capacity`.
    pub fn split(mut self, at: usize, capacity: usize) -> (Block<T>, Block<T>) {
        assert!(at <= self.len, "split point out of bounds");
        let tail = self.len - at;
        assert!(at <= capacity && tail <= capacity, "split halves exceed capacity");

        let mut left = Block::with_capacity(capacity);
        let mut right = Block::with_capacity(capacity);
        unsafe {
            ptr::copy_nonoverlapping(self.ptr(), left.ptr(), at);
            ptr::copy_nonoverlapping(self.ptr().add(at), right.ptr(), tail);
        }
        left.len = at;
        right.len = tail;
        // the elements now belong to the halves
        self.len = 0;

        (left, right)
    }

    /// Moves the elements of `left` followed by those of `right` into a new
    /// block of `capacity`.
    pub fn merge(mut left: Block<T>, mut right: Block<T>, capacity: usize) -> Block<T> {
        let len = left.len + right.len;
        assert!(len <= capacity, "merged block exceeds capacity");

        let mut merged = Block::with_capacity(capacity);
        unsafe {
            ptr::copy_nonoverlapping(left.ptr(), merged.ptr(), left.len);
            ptr::copy_nonoverlapping(right.ptr(), merged.ptr().add(left.len), right.len);
        }
        merged.len = len;
        left.len = 0;
        right.len = 0;

        merged
    }
}

impl<T> Drop for Block<T> {
    fn drop(&mut self) {
        unsafe {
            ptr::drop_in_place(ptr::slice_from_raw_parts_mut(self.ptr(), self.len));
        }
    }
}

impl<T> Deref for Block<T> {
    type Target = [T];

    fn deref(&self) -> &Self::Target {
        unsafe { slice::from_raw_parts(self.ptr(), self.len) }
    }
}

impl<T> DerefMut for Block<T> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        unsafe { slice::from_raw_parts_mut(self.ptr(), self.len) }
    }
}

impl<T: Clone> Clone for Block<T> {
    fn clone(&self) -> Self {
        let mut block = Block::with_capacity(self.capacity());
        for elem in self.iter() {
            block.push(elem.clone());
        }
        block
    }
}

impl<T: fmt::Debug> fmt::Debug for Block<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Block")
            .field("capacity", &self.capacity())
            .field("elems", &self.deref())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use crate::drop_tracker::DropTracker;

    use super::Block;

    fn prepare_block<T>(capacity: usize, elems: impl IntoIterator<Item = T>) -> Block<T> {
        let mut block = Block::with_capacity(capacity);
        for elem in elems {
            block.push(elem);
        }
        block
    }

    #[test]
    fn with_capacity() {
        let block: Block<char> = Block::with_capacity(4);

        assert_eq!(block.capacity(), 4);
        assert_eq!(block.len(), 0);
        assert!(block.is_empty());
        assert!(!block.is_full());
    }

    #[test]
    fn with_capacity_zst() {
        let block: Block<()> = Block::with_capacity(4);

        assert_eq!(block.capacity(), usize::MAX);
        assert!(!block.is_full());
    }

    #[test]
    fn push_until_full() {
        let mut block = Block::with_capacity(3);

        block.push('A');
        block.push('B');
        assert!(!block.is_full());
        block.push('C');

        assert!(block.is_full());
        assert_eq!(&*block, ['A', 'B', 'C']);
    }

    #[test]
    #[should_panic(expected = "block is full")]
    fn insert_into_full_block() {
        let mut block = prepare_block(2, ['A', 'B']);

        block.insert(1, 'x');
    }

    #[test]
    #[should_panic(expected = "index out of bounds")]
    fn insert_past_len() {
        let mut block = prepare_block(4, ['A', 'B']);

        block.insert(3, 'x');
    }

    #[test]
    fn insert_shifts_right() {
        let mut block = prepare_block(5, ['A', 'B', 'C']);
        // [ABC--]

        block.insert(1, 'x');

        // [AxBC-]
        assert_eq!(&*block, ['A', 'x', 'B', 'C']);

        block.insert(0, 'y');

        // [yAxBC]
        assert_eq!(&*block, ['y', 'A', 'x', 'B', 'C']);
    }

    #[test]
    fn remove_shifts_left() {
        let mut block = prepare_block(5, ['A', 'B', 'C', 'D']);
        // [ABCD-]

        assert_eq!(block.remove(1), 'B');

        // [ACD--]
        assert_eq!(&*block, ['A', 'C', 'D']);

        assert_eq!(block.remove(2), 'D');

        // [AC---]
        assert_eq!(&*block, ['A', 'C']);
    }

    #[test]
    fn pop() {
        let mut block = prepare_block(3, ['A', 'B']);

        assert_eq!(block.pop(), Some('B'));
        assert_eq!(block.pop(), Some('A'));
        assert_eq!(block.pop(), None);
        assert!(block.is_empty());
    }

    #[test]
    fn split_partitions_in_order() {
        let block = prepare_block(5, ['A', 'B', 'C', 'D', 'E']);

        let (left, right) = block.split(5 / 2, 6);

        assert_eq!(&*left, ['A', 'B']);
        assert_eq!(&*right, ['C', 'D', 'E']);
        assert_eq!(left.capacity(), 6);
        assert_eq!(right.capacity(), 6);
    }

    #[test]
    fn split_keeps_every_element() {
        for len in 2..=16 {
            let block = prepare_block(len, 0..len);

            let (left, right) = block.split(len / 2, len);

            assert_eq!(left.len() + right.len(), len);
            assert!(left.len() <= left.capacity());
            assert!(right.len() <= right.capacity());
            let joined: Vec<_> = left.iter().chain(right.iter()).copied().collect();
            assert_eq!(joined, Vec::from_iter(0..len));
        }
    }

    #[test]
    fn merge_concatenates() {
        let left = prepare_block(4, ['A', 'B']);
        let right = prepare_block(4, ['C']);

        let merged = Block::merge(left, right, 8);

        assert_eq!(&*merged, ['A', 'B', 'C']);
        assert_eq!(merged.capacity(), 8);
    }

    #[test]
    #[should_panic(expected = "merged block exceeds capacity")]
    fn merge_over_capacity() {
        let left = prepare_block(4, ['A', 'B']);
        let right = prepare_block(4, ['C', 'D']);

        Block::merge(left, right, 3);
    }

    #[test]
    fn split_and_merge_do_not_drop() {
        let drop_tracker = DropTracker::new();
        let block = prepare_block(4, drop_tracker.wrap_iter('A'..='D'));

        let (dropped, merged) = drop_tracker.track(|| {
            let (left, right) = block.split(2, 4);
            Block::merge(left, right, 4)
        });

        assert!(dropped.is_empty());
        assert_eq!(merged.len(), 4);
        assert_eq!(drop_tracker.live(), 4);
    }

    #[test]
    fn drop_drops_elements() {
        let drop_tracker = DropTracker::new();
        let mut block = prepare_block(6, drop_tracker.wrap_iter('A'..='D'));
        drop(block.remove(0));

        let (dropped, _) = drop_tracker.track(|| drop(block));

        assert_eq!(dropped, Vec::from_iter('B'..='D'));
        assert_eq!(drop_tracker.live(), 0);
    }

    #[test]
    fn clone_is_deep() {
        let block = prepare_block(4, [String::from("A"), String::from("B")]);

        let mut copy = block.clone();
        copy[0].push('x');

        assert_eq!(copy.capacity(), 4);
        assert_eq!(&*block, ["A", "B"]);
        assert_eq!(&*copy, ["Ax", "B"]);
    }

    #[test]
    fn zst() {
        let mut block = Block::with_capacity(0);

        block.push(());
        block.insert(0, ());
        block.remove(1);

        assert_eq!(block.len(), 1);
        assert_eq!(block.pop(), Some(()));
        assert_eq!(block.pop(), None);
    }
}
