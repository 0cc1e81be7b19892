use std::mem;

use crate::block::Block;

/// Identifies a node of a [`BlockList`].
///
/// Ids of erased nodes are recycled, so an id alone does not prove that it
/// still names the same block.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub(crate) struct NodeId(usize);

struct Node<T> {
    block: Block<T>,
    prev: Option<NodeId>,
    next: Option<NodeId>,
}

enum Slot<T> {
    Occupied(Node<T>),
    Vacant { next_free: Option<usize> },
}

/// An ordered, doubly linked sequence of blocks.
///
/// Nodes live in an arena indexed by [`NodeId`]; the links are arena indices,
/// and vacated slots are chained into a free list for reuse.
pub(crate) struct BlockList<T> {
    slots: Vec<Slot<T>>,
    free: Option<usize>,
    head: Option<NodeId>,
    tail: Option<NodeId>,
    len: usize,
}

impl<T> BlockList<T> {
    pub fn new() -> Self {
        BlockList {
            slots: Vec::new(),
            free: None,
            head: None,
            tail: None,
            len: 0,
        }
    }

    /// Number of blocks in the list.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn first(&self) -> Option<NodeId> {
        self.head
    }

    pub fn last(&self) -> Option<NodeId> {
        self.tail
    }

    pub fn next(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).next
    }

    pub fn prev(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).prev
    }

    /// Returns the block of `id`, or `None` if the slot is vacant or out of
    /// the arena.
    pub fn get(&self, id: NodeId) -> Option<&Block<T>> {
        match self.slots.get(id.0) {
            Some(Slot::Occupied(node)) => Some(&node.block),
            _ => None,
        }
    }

    pub fn block(&self, id: NodeId) -> &Block<T> {
        &self.node(id).block
    }

    pub fn block_mut(&mut self, id: NodeId) -> &mut Block<T> {
        &mut self.node_mut(id).block
    }

    /// Links `block` right before `pos`, or at the back when `pos` is `None`.
    pub fn insert_before(&mut self, pos: Option<NodeId>, block: Block<T>) -> NodeId {
        let prev = match pos {
            Some(next) => self.node(next).prev,
            None => self.tail,
        };

        let id = self.allocate(Node {
            block,
            prev,
            next: pos,
        });

        match prev {
            Some(prev) => self.node_mut(prev).next = Some(id),
            None => self.head = Some(id),
        }
        match pos {
            Some(next) => self.node_mut(next).prev = Some(id),
            None => self.tail = Some(id),
        }

        self.len += 1;
        id
    }

    pub fn push_back(&mut self, block: Block<T>) -> NodeId {
        self.insert_before(None, block)
    }

    /// Unlinks the node `id`, returning its block and the node that followed
    /// it.
    pub fn erase(&mut self, id: NodeId) -> (Block<T>, Option<NodeId>) {
        let slot = mem::replace(
            &mut self.slots[id.0],
            Slot::Vacant {
                next_free: self.free,
            },
        );
        let node = match slot {
            Slot::Occupied(node) => node,
            Slot::Vacant { .. } => unreachable!("erasing a vacant block slot"),
        };
        self.free = Some(id.0);

        match node.prev {
            Some(prev) => self.node_mut(prev).next = node.next,
            None => self.head = node.next,
        }
        match node.next {
            Some(next) => self.node_mut(next).prev = node.prev,
            None => self.tail = node.prev,
        }

        self.len -= 1;
        (node.block, node.next)
    }

    pub fn iter(&self) -> Nodes<'_, T> {
        Nodes {
            list: self,
            front: self.head,
            back: self.tail,
            remaining: self.len,
        }
    }

    fn allocate(&mut self, node: Node<T>) -> NodeId {
        match self.free {
            Some(index) => {
                self.free = match self.slots[index] {
                    Slot::Vacant { next_free } => next_free,
                    Slot::Occupied(_) => unreachable!("free list points at an occupied slot"),
                };
                self.slots[index] = Slot::Occupied(node);
                NodeId(index)
            }
            None => {
                self.slots.push(Slot::Occupied(node));
                NodeId(self.slots.len() - 1)
            }
        }
    }

    fn node(&self, id: NodeId) -> &Node<T> {
        match &self.slots[id.0] {
            Slot::Occupied(node) => node,
            Slot::Vacant { .. } => unreachable!("dangling block id {id:?}"),
        }
    }

    fn node_mut(&mut self, id: NodeId) -> &mut Node<T> {
        match &mut self.slots[id.0] {
            Slot::Occupied(node) => node,
            Slot::Vacant { .. } => unreachable!("dangling block id {id:?}"),
        }
    }
}

impl<T> Drop for BlockList<T> {
    fn drop(&mut self) {
        while let Some(head) = self.head {
            self.erase(head);
        }
    }
}

impl<T: Clone> Clone for BlockList<T> {
    fn clone(&self) -> Self {
        let mut list = BlockList::new();
        for (_, block) in self.iter() {
            list.push_back(block.clone());
        }
        list
    }
}

/// Iterates the blocks of a [`BlockList`] in order, with their ids.
pub(crate) struct Nodes<'a, T> {
    list: &'a BlockList<T>,
    front: Option<NodeId>,
    back: Option<NodeId>,
    remaining: usize,
}

impl<'a, T> Iterator for Nodes<'a, T> {
    type Item = (NodeId, &'a Block<T>);

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let id = self.front?;
        self.front = self.list.next(id);
        self.remaining -= 1;
        Some((id, self.list.block(id)))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<'a, T> DoubleEndedIterator for Nodes<'a, T> {
    fn next_back(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let id = self.back?;
        self.back = self.list.prev(id);
        self.remaining -= 1;
        Some((id, self.list.block(id)))
    }
}

impl<'a, T> ExactSizeIterator for Nodes<'a, T> {}
