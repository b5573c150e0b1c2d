use std::fmt;
use std::marker::PhantomData;

use crate::{Adapter, OversizeInsert, Rope};

/// Leaf length used by the `Default` implementations of the bundled adapters.
pub const DEFAULT_MAX_LEAF_LEN: usize = 512;

/// Adapter for ropes of `String` chunks.
///
/// Offsets and lengths are in bytes and elements are the `char` starting at
/// a byte offset. `get` returns `None` for an offset inside a multi-byte
/// character. Unicode boundaries are otherwise the caller's concern.
///
/// Long inserted values are cut on `char` boundaries, so a piece holding a
/// character wider than `max_leaf_len` may exceed it.
///
/// # Panics
///
/// Splitting or removing at an offset that is not a `char` boundary panics.
///
/// # Example
///
/// ```
/// use fib_rope::{Rope, StringAdapter};
///
/// let rope = Rope::with_root(StringAdapter::new(3), "abcd".to_owned());
/// let rope = rope.remove(1, 2).unwrap();
/// assert_eq!(rope.to_string(), "ad");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StringAdapter {
    max_leaf_len: usize,
    oversize: OversizeInsert,
}

impl StringAdapter {
    pub fn new(max_leaf_len: usize) -> Self {
        Self {
            max_leaf_len,
            oversize: OversizeInsert::Split,
        }
    }

    pub fn with_oversize_insert(self, oversize: OversizeInsert) -> Self {
        Self { oversize, ..self }
    }
}

impl Default for StringAdapter {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_LEAF_LEN)
    }
}

impl Adapter for StringAdapter {
    type Chunk = String;
    type Elem = char;
    type SizeType = usize;

    fn len(&self, chunk: &String) -> usize {
        chunk.len()
    }

    fn get(&self, chunk: &String, offset: usize) -> Option<char> {
        chunk.get(offset..)?.chars().next()
    }

    fn split(&self, chunk: &String, offset: usize) -> (String, String) {
        let (left, right) = chunk.split_at(offset);
        (left.to_owned(), right.to_owned())
    }

    fn join(&self, left: &String, right: &String) -> String {
        let mut joined = String::with_capacity(left.len() + right.len());
        joined.push_str(left);
        joined.push_str(right);
        joined
    }

    fn max_leaf_len(&self) -> usize {
        self.max_leaf_len
    }

    fn oversize_insert(&self) -> OversizeInsert {
        self.oversize
    }

    fn cut_point(&self, chunk: &String, max: usize) -> usize {
        let mut at = max.min(chunk.len());
        while at > 0 && !chunk.is_char_boundary(at) {
            at -= 1;
        }
        if at == 0 {
            at = chunk.chars().next().map_or(0, char::len_utf8);
        }
        at
    }
}

impl fmt::Display for Rope<StringAdapter> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for chunk in self.chunks() {
            f.write_str(chunk)?;
        }
        Ok(())
    }
}

impl From<&str> for Rope<StringAdapter> {
    fn from(text: &str) -> Self {
        Rope::with_root(StringAdapter::default(), text.to_owned())
    }
}

/// Adapter for ropes of `Vec<E>` chunks, indexed by element.
pub struct VecAdapter<E> {
    max_leaf_len: usize,
    oversize: OversizeInsert,
    marker: PhantomData<fn() -> E>,
}

impl<E> VecAdapter<E> {
    pub fn new(max_leaf_len: usize) -> Self {
        Self {
            max_leaf_len,
            oversize: OversizeInsert::Split,
            marker: PhantomData,
        }
    }

    pub fn with_oversize_insert(self, oversize: OversizeInsert) -> Self {
        Self { oversize, ..self }
    }
}

impl<E> Default for VecAdapter<E> {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_LEAF_LEN)
    }
}

impl<E> Clone for VecAdapter<E> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<E> Copy for VecAdapter<E> {}

impl<E> fmt::Debug for VecAdapter<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VecAdapter")
            .field("max_leaf_len", &self.max_leaf_len)
            .field("oversize", &self.oversize)
            .finish()
    }
}

impl<E: Clone> Adapter for VecAdapter<E> {
    type Chunk = Vec<E>;
    type Elem = E;
    type SizeType = usize;

    fn len(&self, chunk: &Vec<E>) -> usize {
        chunk.len()
    }

    fn get(&self, chunk: &Vec<E>, offset: usize) -> Option<E> {
        chunk.get(offset).cloned()
    }

    fn split(&self, chunk: &Vec<E>, offset: usize) -> (Vec<E>, Vec<E>) {
        let (left, right) = chunk.split_at(offset);
        (left.to_vec(), right.to_vec())
    }

    fn join(&self, left: &Vec<E>, right: &Vec<E>) -> Vec<E> {
        let mut joined = Vec::with_capacity(left.len() + right.len());
        joined.extend_from_slice(left);
        joined.extend_from_slice(right);
        joined
    }

    fn max_leaf_len(&self) -> usize {
        self.max_leaf_len
    }

    fn oversize_insert(&self) -> OversizeInsert {
        self.oversize
    }
}
