//! A typed block allocator with an intrusive free list.
//!
//! Storage is handed out in blocks of roughly 4KB worth of items. Freed
//! items go to the head of a free list and are reused before any new block
//! is allocated, so both `alloc` and `free` are O(1). Handles carry a
//! generation so a handle to a freed item is never mistaken for the item
//! that later reuses its slot.

use std::mem::size_of;
use std::ops::{Index, IndexMut};

const BLOCK_BYTES: usize = 4 * 1024;

/// Handle to an item in a [`BlockPool`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct PoolId {
    index: u32,
    generation: u32,
}

#[derive(Debug)]
enum Slot<T> {
    Occupied { generation: u32, value: T },
    Vacant { generation: u32, next: Option<u32> },
}

impl<T> Slot<T> {
    fn generation(&self) -> u32 {
        match self {
            Slot::Occupied { generation, .. } | Slot::Vacant { generation, .. } => *generation,
        }
    }
}

/// Allocation counters of a pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PoolStats {
    /// Items currently allocated.
    pub current_allocs: usize,
    /// Items ever allocated since the last clear.
    pub total_allocs: usize,
    /// High-water mark of `current_allocs`.
    pub max_allocs: usize,
    /// Items allocated but not yet linked into a document or released.
    pub untracked: usize,
    /// Blocks currently held.
    pub blocks: usize,
}

#[derive(Debug)]
pub(crate) struct BlockPool<T> {
    blocks: Vec<Vec<Slot<T>>>,
    free_head: Option<u32>,
    // generation given to the slots of freshly allocated blocks; raised on
    // clear so handles from before the clear stay stale
    base_generation: u32,
    max_generation: u32,
    current_allocs: usize,
    total_allocs: usize,
    max_allocs: usize,
    untracked: usize,
}

impl<T> BlockPool<T> {
    pub(crate) fn new() -> Self {
        BlockPool {
            blocks: Vec::new(),
            free_head: None,
            base_generation: 0,
            max_generation: 0,
            current_allocs: 0,
            total_allocs: 0,
            max_allocs: 0,
            untracked: 0,
        }
    }

    /// How many items fit in one block.
    pub(crate) fn items_per_block() -> usize {
        (BLOCK_BYTES / size_of::<Slot<T>>().max(1)).max(1)
    }

    #[inline]
    fn locate(index: u32) -> (usize, usize) {
        let per_block = Self::items_per_block();
        let index = index as usize;
        (index / per_block, index % per_block)
    }

    fn slot(&self, index: u32) -> Option<&Slot<T>> {
        let (block, offset) = Self::locate(index);
        self.blocks.get(block)?.get(offset)
    }

    fn slot_mut(&mut self, index: u32) -> Option<&mut Slot<T>> {
        let (block, offset) = Self::locate(index);
        self.blocks.get_mut(block)?.get_mut(offset)
    }

    fn grow(&mut self) {
        let per_block = Self::items_per_block();
        let first = self.blocks.len() * per_block;
        let generation = self.base_generation;
        let block = (0..per_block)
            .map(|i| Slot::Vacant {
                generation,
                next: if i + 1 < per_block {
                    Some((first + i + 1) as u32)
                } else {
                    None
                },
            })
            .collect();
        self.blocks.push(block);
        self.free_head = Some(first as u32);
        tracing::trace!(blocks = self.blocks.len(), per_block, "pool grew");
    }

    /// Store `value` in a free item, allocating a new block if none is free.
    pub(crate) fn alloc(&mut self, value: T) -> PoolId {
        if self.free_head.is_none() {
            self.grow();
        }
        let index = match self.free_head {
            Some(index) => index,
            None => unreachable!("grow always provides a free item"),
        };
        let slot = self
            .slot_mut(index)
            .unwrap_or_else(|| unreachable!("free list points into a block"));
        let (generation, next) = match slot {
            Slot::Vacant { generation, next } => (*generation, *next),
            Slot::Occupied { .. } => unreachable!("free list points at a vacant item"),
        };
        *slot = Slot::Occupied { generation, value };
        self.free_head = next;

        self.current_allocs += 1;
        self.max_allocs = self.max_allocs.max(self.current_allocs);
        self.total_allocs += 1;
        self.untracked += 1;
        PoolId { index, generation }
    }

    /// Return an item to the free list, handing back its value. Returns
    /// `None` if the handle is stale.
    pub(crate) fn free(&mut self, id: PoolId) -> Option<T> {
        let free_head = self.free_head;
        let slot = self.slot_mut(id.index)?;
        match slot {
            Slot::Occupied { generation, .. } if *generation == id.generation => {}
            _ => return None,
        }
        let generation = id.generation.wrapping_add(1);
        let old = std::mem::replace(
            slot,
            Slot::Vacant {
                generation,
                next: free_head,
            },
        );
        self.free_head = Some(id.index);
        self.max_generation = self.max_generation.max(generation);
        self.current_allocs -= 1;
        match old {
            Slot::Occupied { value, .. } => Some(value),
            Slot::Vacant { .. } => None,
        }
    }

    /// Release every block and reset the counters.
    pub(crate) fn clear(&mut self) {
        let highest = self
            .blocks
            .iter()
            .flatten()
            .map(Slot::generation)
            .max()
            .unwrap_or(0)
            .max(self.max_generation);
        self.base_generation = highest.wrapping_add(1);
        self.max_generation = self.base_generation;
        self.blocks.clear();
        self.free_head = None;
        self.current_allocs = 0;
        self.total_allocs = 0;
        self.max_allocs = 0;
        self.untracked = 0;
    }

    /// Confirm that an item has been linked into the live structure.
    pub(crate) fn set_tracked(&mut self) {
        self.untracked = self.untracked.saturating_sub(1);
    }

    /// Undo [`BlockPool::set_tracked`] for an item taken out of the live
    /// structure again.
    pub(crate) fn set_untracked(&mut self) {
        self.untracked += 1;
    }

    pub(crate) fn contains(&self, id: PoolId) -> bool {
        self.get(id).is_some()
    }

    pub(crate) fn get(&self, id: PoolId) -> Option<&T> {
        match self.slot(id.index)? {
            Slot::Occupied { generation, value } if *generation == id.generation => Some(value),
            _ => None,
        }
    }

    pub(crate) fn get_mut(&mut self, id: PoolId) -> Option<&mut T> {
        match self.slot_mut(id.index)? {
            Slot::Occupied { generation, value } if *generation == id.generation => Some(value),
            _ => None,
        }
    }

    pub(crate) fn current_allocs(&self) -> usize {
        self.current_allocs
    }

    pub(crate) fn stats(&self) -> PoolStats {
        PoolStats {
            current_allocs: self.current_allocs,
            total_allocs: self.total_allocs,
            max_allocs: self.max_allocs,
            untracked: self.untracked,
            blocks: self.blocks.len(),
        }
    }
}

impl<T> Default for BlockPool<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Index<PoolId> for BlockPool<T> {
    type Output = T;

    fn index(&self, id: PoolId) -> &T {
        match self.get(id) {
            Some(value) => value,
            None => panic!("pool item {:?} has been freed", id),
        }
    }
}

impl<T> IndexMut<PoolId> for BlockPool<T> {
    fn index_mut(&mut self, id: PoolId) -> &mut T {
        match self.get_mut(id) {
            Some(value) => value,
            None => panic!("pool item {:?} has been freed", id),
        }
    }
}
