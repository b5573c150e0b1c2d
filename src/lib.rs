//! A persistent, Fibonacci-balanced rope.
//!
//! `Rope` is an immutable binary tree over chunks of some sequence. Every
//! edit returns a new `Rope` that shares all untouched subtrees with the
//! version it was made from, so old versions stay valid and cheap to keep.
//! How chunks are measured, indexed, cut and glued is decided by an
//! `Adapter`, which makes the same tree usable for text, bytes or any other
//! chunked sequence.
//!
//! # Example
//!
//! ```
//! use fib_rope::{Rope, StringAdapter};
//!
//! let empty = Rope::new(StringAdapter::new(4));
//! let abc = empty.insert("abc".to_owned(), 0).unwrap();
//! let edited = abc.insert("def".to_owned(), 1).unwrap();
//!
//! assert_eq!(edited.to_string(), "adefbc");
//! assert_eq!(abc.to_string(), "abc");
//! assert_eq!(edited.get(1), Some('d'));
//! assert!(empty.is_empty());
//! ```

#[macro_use]
mod trace;

mod adapters;
mod cursor;
mod error;
mod fib;
mod node;

pub use adapters::{StringAdapter, VecAdapter, DEFAULT_MAX_LEAF_LEN};
pub use cursor::{Chunks, Cursor};
pub use error::{Result, RopeError};

use std::fmt;
use std::ops::{Add, Sub};
use std::sync::Arc;

use node::{join_links, split_link, Link, Node};

/// Trait for adapting `Rope` to its contents.
///
/// An `Adapter` is the strategy a rope is built with. It is supplied once,
/// when the empty rope is created, and shared by every version derived from
/// it. All of its functions must be pure: the cached lengths in the tree are
/// only correct as long as `len`, `split` and `join` agree with each other.
///
/// `SizeType` is the type used for lengths and offsets. In most cases it
/// should be `usize`, but any type meeting the bounds works, for example
/// `u64` for sequences that may not be addressable on 32-bit targets.
///
/// # Example
///
/// ```
/// use fib_rope::{Adapter, Rope};
///
/// struct Bytes;
///
/// impl Adapter for Bytes {
///     type Chunk = Vec<u8>;
///     type Elem = u8;
///     type SizeType = u64;
///
///     fn len(&self, chunk: &Vec<u8>) -> u64 {
///         chunk.len() as u64
///     }
///
///     fn get(&self, chunk: &Vec<u8>, offset: u64) -> Option<u8> {
///         chunk.get(offset as usize).copied()
///     }
///
///     fn split(&self, chunk: &Vec<u8>, offset: u64) -> (Vec<u8>, Vec<u8>) {
///         let (left, right) = chunk.split_at(offset as usize);
///         (left.to_vec(), right.to_vec())
///     }
///
///     fn join(&self, left: &Vec<u8>, right: &Vec<u8>) -> Vec<u8> {
///         [left.as_slice(), right.as_slice()].concat()
///     }
///
///     fn max_leaf_len(&self) -> u64 {
///         4096
///     }
/// }
///
/// let rope = Rope::with_root(Bytes, b"hello".to_vec());
/// assert_eq!(rope.len(), 5);
/// assert_eq!(rope.get(1), Some(b'e'));
/// ```
pub trait Adapter {
    /// The chunk stored in a leaf.
    type Chunk;
    /// A single element of a chunk.
    type Elem;
    type SizeType: Add<Output = Self::SizeType>
        + Sub<Output = Self::SizeType>
        + PartialOrd
        + Default
        + Copy
        + From<u8>
        + fmt::Debug
        + fmt::Display;

    /// Logical length of a chunk.
    fn len(&self, chunk: &Self::Chunk) -> Self::SizeType;

    /// Element at `offset` within a chunk, if there is one.
    fn get(&self, chunk: &Self::Chunk, offset: Self::SizeType) -> Option<Self::Elem>;

    /// Divides a chunk so that the left part has length `offset`. The two
    /// lengths must add up to the length of `chunk`.
    fn split(&self, chunk: &Self::Chunk, offset: Self::SizeType) -> (Self::Chunk, Self::Chunk);

    /// Concatenates two chunks.
    fn join(&self, left: &Self::Chunk, right: &Self::Chunk) -> Self::Chunk;

    /// Longest chunk two leaves are merged into. Zero disables merging and
    /// the cutting of long inserted values.
    fn max_leaf_len(&self) -> Self::SizeType;

    /// What to do with an inserted value longer than `max_leaf_len`.
    fn oversize_insert(&self) -> OversizeInsert {
        OversizeInsert::Split
    }

    /// Where to cut an oversized inserted value so that the head is at most
    /// `max` long. Adapters whose chunks cannot be split at every offset move
    /// the cut to a valid one. A cut at zero or at the end of the chunk keeps
    /// the rest of the value whole.
    fn cut_point(&self, _chunk: &Self::Chunk, max: Self::SizeType) -> Self::SizeType {
        max
    }
}

/// Handling of inserted values longer than `Adapter::max_leaf_len`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OversizeInsert {
    /// Cut the value into consecutive leaves of at most `max_leaf_len`.
    Split,
    /// Keep the value in a single, oversized leaf.
    Whole,
}

/// A persistent rope.
///
/// `Rope` never changes once built. `insert`, `remove`, `split`, `append`
/// and `balance` all return new ropes; the receiver, and every other rope
/// sharing its nodes, is left untouched. Cloning a rope is O(1).
///
/// Offsets are validated: operations taking an offset or range return a
/// `RopeError` instead of descending with an out-of-range position. `get`
/// reports anything it cannot find as `None`.
///
/// Edits do not rebalance on their own. After a run of edits, `balance`
/// rebuilds the tree so that every node of depth `d` holds at least
/// `fib(d + 2)` leaves.
pub struct Rope<T: Adapter> {
    root: Link<T>,
    adapter: Arc<T>,
}

impl<T: Adapter> Clone for Rope<T> {
    fn clone(&self) -> Self {
        Self {
            root: self.root.clone(),
            adapter: Arc::clone(&self.adapter),
        }
    }
}

impl<T: Adapter + Default> Default for Rope<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T: Adapter> Rope<T> {
    /// Creates a new empty rope.
    pub fn new(adapter: T) -> Self {
        Self {
            root: None,
            adapter: Arc::new(adapter),
        }
    }

    /// Creates a rope holding a single chunk. Long chunks are cut according
    /// to the adapter's `OversizeInsert` policy.
    pub fn with_root(adapter: T, chunk: T::Chunk) -> Self {
        let rope = Self::new(adapter);
        let root = Node::insert(&Node::empty(), chunk, T::SizeType::default(), rope.adapter());
        rope.with_node(Some(root))
    }

    // A root without content collapses into the empty rope.
    fn with_node(&self, root: Link<T>) -> Self {
        Self {
            root: root.filter(|node| node.len() > T::SizeType::default()),
            adapter: Arc::clone(&self.adapter),
        }
    }

    /// Returns the adapter the rope was created with.
    pub fn adapter(&self) -> &T {
        &self.adapter
    }

    /// Returns the total length; the sum of the lengths of every chunk.
    pub fn len(&self) -> T::SizeType {
        node::len_of(&self.root)
    }

    /// Returns true if the rope holds no elements.
    pub fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    /// Returns the number of leaves in the tree.
    pub fn weight(&self) -> usize {
        self.root.as_ref().map_or(0, |root| root.weight())
    }

    /// Returns the longest root-to-leaf path length.
    pub fn depth(&self) -> usize {
        self.root.as_ref().map_or(0, |root| root.depth())
    }

    /// Returns true if every node of the tree is balanced, that is, holds at
    /// least `fib(depth + 2)` leaves.
    pub fn is_balanced(&self) -> bool {
        self.root.as_ref().map_or(true, |root| root.is_settled())
    }

    /// Returns a rope with `value` inserted so that its first element lands
    /// at `offset`.
    ///
    /// `"abc"` with `"de"` inserted at 1 reads `"adebc"`. Inserting a value of
    /// length zero returns an equivalent rope.
    ///
    /// # Errors
    ///
    /// `RopeError::OffsetOutOfRange` if `offset > len()`.
    pub fn insert(&self, value: T::Chunk, offset: T::SizeType) -> Result<Self, T::SizeType> {
        let len = self.len();
        if offset > len {
            return Err(RopeError::OffsetOutOfRange { offset, len });
        }
        if self.adapter.len(&value) == T::SizeType::default() {
            return Ok(self.clone());
        }
        let root = self.root.clone().unwrap_or_else(Node::empty);
        Ok(self.with_node(Some(Node::insert(&root, value, offset, self.adapter()))))
    }

    /// Returns a rope with the elements in `start..=end` removed. Both ends
    /// are inclusive, so `start == end` removes a single element.
    ///
    /// `"abcd"` with `remove(1, 2)` reads `"ad"`. On an empty rope this is a
    /// no-op whatever the range.
    ///
    /// # Errors
    ///
    /// `RopeError::InvertedRange` if `start > end`, and
    /// `RopeError::RangeOutOfBounds` if `end >= len()`.
    pub fn remove(&self, start: T::SizeType, end: T::SizeType) -> Result<Self, T::SizeType> {
        let root = match &self.root {
            Some(root) => root,
            None => return Ok(self.clone()),
        };
        if start > end {
            return Err(RopeError::InvertedRange { start, end });
        }
        let len = root.len();
        if end >= len {
            return Err(RopeError::RangeOutOfBounds { start, end, len });
        }
        Ok(self.with_node(Node::remove(root, start, end, self.adapter())))
    }

    /// Returns the element at `offset`, or `None` if there is none.
    pub fn get(&self, offset: T::SizeType) -> Option<T::Elem> {
        let root = self.root.as_ref()?;
        if offset >= root.len() {
            return None;
        }
        root.get(offset, self.adapter())
    }

    /// Calls `f` on every chunk, in order.
    pub fn each<F: FnMut(&T::Chunk)>(&self, f: F) {
        if let Some(root) = &self.root {
            root.each(f);
        }
    }

    /// Returns a balanced rope with the same content.
    ///
    /// Subtrees that are already balanced throughout are reused as they are,
    /// so balancing a balanced rope is cheap.
    pub fn balance(&self) -> Self {
        match &self.root {
            None => self.clone(),
            Some(root) => {
                debug_event!(weight = root.weight(), depth = root.depth(), "balancing rope");
                let balanced = Node::balance(root, self.adapter());
                debug_event!(
                    weight = balanced.weight(),
                    depth = balanced.depth(),
                    "balanced rope"
                );
                self.with_node(Some(balanced))
            }
        }
    }

    /// Returns the ropes holding the elements before and from `offset`.
    ///
    /// # Errors
    ///
    /// `RopeError::OffsetOutOfRange` if `offset > len()`.
    pub fn split(&self, offset: T::SizeType) -> Result<(Self, Self), T::SizeType> {
        let len = self.len();
        if offset > len {
            return Err(RopeError::OffsetOutOfRange { offset, len });
        }
        let (left, right) = split_link(&self.root, offset, self.adapter());
        Ok((self.with_node(left), self.with_node(right)))
    }

    /// Returns the concatenation of `self` and `other`. The result uses the
    /// adapter of `self`.
    pub fn append(&self, other: &Self) -> Self {
        self.with_node(join_links(
            self.root.clone(),
            other.root.clone(),
            self.adapter(),
        ))
    }

    /// Returns an iterator over the chunks of the rope, in order.
    pub fn chunks(&self) -> Chunks<'_, T> {
        cursor::chunks(self)
    }

    /// Returns a null `Cursor`.
    pub fn null_cursor(&self) -> Cursor<'_, T> {
        cursor::new(self)
    }

    /// Returns a `Cursor` that points to the first chunk, at offset 0.
    pub fn front(&self) -> Cursor<'_, T> {
        let mut cursor = cursor::new(self);
        cursor.move_next();
        cursor
    }

    /// Returns a `Cursor` that points to the last chunk.
    pub fn back(&self) -> Cursor<'_, T> {
        let mut cursor = cursor::new(self);
        cursor.move_prev();
        cursor
    }

    /// Finds the chunk that covers the offset `pos`. The cursor will be null
    /// if `pos` is greater than or equal to the total length.
    /// A `Cursor` and an offset into the chunk is returned. The offset into
    /// the chunk is the offset from the start of the chunk that is
    /// equivalent to `pos`. If the cursor is null, the offset will always be
    /// 0, and is essentially meaningless.
    pub fn find(&self, pos: T::SizeType) -> (Cursor<'_, T>, T::SizeType) {
        cursor::find(self, pos)
    }
}

impl<T: Adapter> fmt::Debug for Rope<T>
where
    T::Chunk: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.chunks()).finish()
    }
}

impl<'a, T: Adapter> IntoIterator for &'a Rope<T> {
    type Item = &'a T::Chunk;
    type IntoIter = Chunks<'a, T>;

    fn into_iter(self) -> Chunks<'a, T> {
        self.chunks()
    }
}
