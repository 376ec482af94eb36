//! A priority queue implemented with a 4-ary heap.
//!
//! Insertion and popping the minimal element have `O(log n)` time complexity.
//! Checking the minimal element is `O(1)`. Keys of elements in the heap can
//! also be decreased or increased.
//!
//! # Examples
//!
//! ```
//! use contraction_router::datastr::index_heap::{Indexing, IndexdMinHeap};
//!
//! #[derive(Copy, Clone, Eq, PartialEq, Debug, Ord, PartialOrd)]
//! pub struct State {
//!     pub distance: usize,
//!     pub node: usize,
//! }
//!
//! // The `Indexing` trait needs to be implemented as well, so we can find elements to decrease their key.
//! impl Indexing for State {
//!     fn as_index(&self) -> usize {
//!         self.node as usize
//!     }
//! }
//!
//! let mut heap = IndexdMinHeap::new(3);
//! heap.push(State { node: 0, distance: 42 });
//! heap.push(State { node: 1, distance: 23 });
//! heap.push(State { node: 2, distance: 50000 });
//! assert_eq!(heap.peek().cloned(), Some(State { node: 1, distance: 23 }));
//! heap.decrease_key(State { node: 0, distance: 1 });
//! assert_eq!(heap.pop(), Some(State { node: 0, distance: 1 }));
//! ```

use std::{cmp::min, mem::swap};

/// A trait to map elements in a heap to a unique index.
/// The element type of the `IndexdMinHeap` has to implement this trait.
pub trait Indexing {
    /// This method has to map a heap element to a unique `usize` index.
    fn as_index(&self) -> usize;
}

/// A priority queue where the elements are IDs from 0 to id_count-1 where id_count is a number that is set in the constructor.
/// The elements are sorted ascending by the ordering defined by the `Ord` trait.
/// The interface mirrors the standard library BinaryHeap (except for the reversed order).
/// Only the methods necessary for Dijkstra-like algorithms are implemented.
/// In addition, `increase_key` and `decrease_key` methods are available.
#[derive(Debug)]
pub struct IndexdMinHeap<T> {
    positions: Vec<usize>,
    data: Vec<T>,
}

const TREE_ARITY: usize = 4;
const INVALID_POSITION: usize = usize::MAX;

impl<T: Ord + Indexing> IndexdMinHeap<T> {
    /// Creates an empty `IndexdMinHeap` as a min-heap.
    /// The indices (as defined by the `Indexing` trait) of all inserted elements
    /// will have to be in `[0, max_id)`.
    pub fn new(max_id: usize) -> IndexdMinHeap<T> {
        IndexdMinHeap {
            positions: vec![INVALID_POSITION; max_id],
            data: Vec::new(),
        }
    }

    /// Returns the number of elements in the heap.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Checks if the heap is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Checks if the heap already contains an element mapped to the given index.
    pub fn contains_index(&self, id: usize) -> bool {
        self.positions[id] != INVALID_POSITION
    }

    pub fn get(&self, id: usize) -> Option<&T> {
        self.data.get(self.positions[id])
    }

    /// Drops all items from the heap.
    pub fn clear(&mut self) {
        for element in &self.data {
            self.positions[element.as_index()] = INVALID_POSITION;
        }
        self.data.clear();
    }

    /// Returns a reference to the smallest item in the heap, or None if it is empty.
    pub fn peek(&self) -> Option<&T> {
        self.data.first()
    }

    /// Removes the smallest item from the heap and returns it, or None if it is empty.
    pub fn pop(&mut self) -> Option<T> {
        self.data.pop().map(|mut item| {
            self.positions[item.as_index()] = INVALID_POSITION;
            if !self.is_empty() {
                self.positions[item.as_index()] = 0;
                self.positions[self.data[0].as_index()] = INVALID_POSITION;
                swap(&mut item, &mut self.data[0]);
                self.move_down_in_tree(0);
            }
            item
        })
    }

    /// Pushes an item onto the heap if its not yet in the queue.
    pub fn push_unless_contained(&mut self, element: T) {
        if !self.contains_index(element.as_index()) {
            self.push(element)
        }
    }

    /// Pushes an item onto the heap.
    /// Panics if an element with the same index already exists.
    pub fn push(&mut self, element: T) {
        assert!(!self.contains_index(element.as_index()));
        let insert_position = self.len();
        self.positions[element.as_index()] = insert_position;
        self.data.push(element);
        self.move_up_in_tree(insert_position);
    }

    // Updates the key of an element.
    pub fn update_key(&mut self, element: T) {
        match element.cmp(&self.data[self.positions[element.as_index()]]) {
            std::cmp::Ordering::Less => self.decrease_key(element),
            std::cmp::Ordering::Greater => self.increase_key(element),
            _ => (),
        }
    }

    // Updates the key of an element if the new key is smaller than the old key.
    pub fn decrease_key(&mut self, element: T) {
        let position = self.positions[element.as_index()];
        self.data[position] = element;
        self.move_up_in_tree(position);
    }

    // Updates the key of an element if the new key is larger than the old key.
    pub fn increase_key(&mut self, element: T) {
        let position = self.positions[element.as_index()];
        self.data[position] = element;
        self.move_down_in_tree(position);
    }

    fn move_up_in_tree(&mut self, mut position: usize) {
        while position > 0 {
            let parent = (position - 1) / TREE_ARITY;

            if self.data[parent] < self.data[position] {
                break;
            }

            self.positions.swap(self.data[parent].as_index(), self.data[position].as_index());
            self.data.swap(parent, position);
            position = parent;
        }
    }

    fn move_down_in_tree(&mut self, mut position: usize) {
        let heap_size = self.len();

        while let Some(smallest_child) = Self::children_index_range(position, heap_size).min_by_key(|&child| &self.data[child]) {
            if self.data[smallest_child] >= self.data[position] {
                return; // no child is smaller
            }

            self.positions.swap(self.data[position].as_index(), self.data[smallest_child].as_index());
            self.data.swap(smallest_child, position);
            position = smallest_child;
        }
    }

    fn children_index_range(parent_index: usize, heap_size: usize) -> std::ops::Range<usize> {
        let first_child = TREE_ARITY * parent_index + 1;
        let last_child = min(TREE_ARITY * parent_index + TREE_ARITY + 1, heap_size);
        first_child..last_child
    }
}
