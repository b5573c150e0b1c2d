use super::*;
use crate::node::{self, Node};

/// A cursor into a rope that provides traversal of its chunks.
///
/// The cursor can be moved back and forth between chunks. Ropes are
/// immutable, so any number of `Cursor`s can coexist, and a cursor stays
/// valid for as long as the rope it borrows.
///
/// The `Cursor` may either point to a single chunk, or null, meaning that it
/// does not point to any chunk. Placeholder leaves are never visited.
pub struct Cursor<'a, T: Adapter> {
    rope: &'a Rope<T>,
    pos: T::SizeType,
    // Branches above the current leaf, each paired with whether the path
    // continues into its right child.
    path: Vec<(&'a Node<T>, bool)>,
    leaf: Option<&'a T::Chunk>,
}

impl<'a, T: Adapter> Clone for Cursor<'a, T> {
    fn clone(&self) -> Self {
        Self {
            rope: self.rope,
            pos: self.pos,
            path: self.path.clone(),
            leaf: self.leaf,
        }
    }
}

pub fn new<T: Adapter>(rope: &Rope<T>) -> Cursor<'_, T> {
    Cursor {
        rope,
        pos: T::SizeType::default(),
        path: Vec::new(),
        leaf: None,
    }
}

pub fn find<T: Adapter>(rope: &Rope<T>, pos: T::SizeType) -> (Cursor<'_, T>, T::SizeType) {
    let mut cursor = new(rope);
    let zero = T::SizeType::default();
    let mut node = match &rope.root {
        Some(root) if pos < root.len() => &**root,
        _ => return (cursor, zero),
    };
    let mut start = zero;
    let mut offset = pos;
    loop {
        match node {
            Node::Leaf { data: Some(data), .. } => {
                cursor.pos = start;
                cursor.leaf = Some(data);
                return (cursor, offset);
            }
            Node::Leaf { data: None, .. } => break,
            Node::Branch { left, right, .. } => {
                let left_len = node::len_of(left);
                match (left, right) {
                    (Some(left), _) if offset < left_len => {
                        cursor.path.push((node, false));
                        node = &**left;
                    }
                    (_, Some(right)) => {
                        cursor.path.push((node, true));
                        offset = offset - left_len;
                        start = start + left_len;
                        node = &**right;
                    }
                    _ => break,
                }
            }
        }
    }
    (new(rope), zero)
}

pub fn chunks<T: Adapter>(rope: &Rope<T>) -> Chunks<'_, T> {
    Chunks {
        cursor: rope.front(),
    }
}

impl<'a, T: Adapter> Cursor<'a, T> {
    /// Returns a reference to the rope the cursor points into.
    pub fn rope(&self) -> &'a Rope<T> {
        self.rope
    }

    /// Returns true if the cursor is null, false otherwise.
    pub fn is_null(&self) -> bool {
        self.leaf.is_none()
    }

    /// Returns the start offset of the chunk the cursor points to. `None`
    /// if the cursor is null.
    pub fn position(&self) -> Option<T::SizeType> {
        self.leaf.map(|_| self.pos)
    }

    /// Returns the length of the chunk the cursor points to. `None` if the
    /// cursor is null.
    pub fn len(&self) -> Option<T::SizeType> {
        self.leaf.map(|chunk| self.rope.adapter().len(chunk))
    }

    /// Returns the chunk the cursor points to. `None` if the cursor is null.
    pub fn get(&self) -> Option<&'a T::Chunk> {
        self.leaf
    }

    /// Moves the cursor to the next chunk. If the cursor is on the back
    /// chunk, the cursor will become null. If the cursor is null, the cursor
    /// will move to the front chunk.
    pub fn move_next(&mut self) {
        match self.leaf {
            None => {
                self.pos = T::SizeType::default();
                let rope = self.rope;
                if let Some(root) = &rope.root {
                    if !self.descend(root, true) {
                        self.step(true);
                    }
                }
            }
            Some(chunk) => {
                self.pos = self.pos + self.rope.adapter().len(chunk);
                self.step(true);
                if self.leaf.is_none() {
                    self.pos = T::SizeType::default();
                }
            }
        }
    }

    /// Move the cursor to the previous chunk. If the cursor is on the front
    /// chunk, the cursor will become null. If the cursor is null, the cursor
    /// will move to the back chunk.
    pub fn move_prev(&mut self) {
        if self.leaf.is_none() {
            let rope = self.rope;
            if let Some(root) = &rope.root {
                if !self.descend(root, false) {
                    self.step(false);
                }
            }
            self.pos = match self.len() {
                Some(len) => self.rope.len() - len,
                None => T::SizeType::default(),
            };
        } else {
            self.step(false);
            self.pos = match self.len() {
                Some(len) => self.pos - len,
                None => T::SizeType::default(),
            };
        }
    }

    /// Returns a new cursor to the next chunk. If the self cursor is on the
    /// back chunk, the new cursor will be null. If the self cursor is null,
    /// the new cursor will be on the front chunk.
    pub fn peek_next(&self) -> Self {
        let mut ret = self.clone();
        ret.move_next();
        ret
    }

    /// Returns a new cursor to the previous chunk. If the self cursor is on
    /// the front chunk, the new cursor will be null. If the self cursor is
    /// null, the new cursor will be on the back chunk.
    pub fn peek_prev(&self) -> Self {
        let mut ret = self.clone();
        ret.move_prev();
        ret
    }

    // Walks down to the first (or last) chunk under `node`. Returns false on
    // a dead end, leaving the partial path behind for `step` to resume from.
    fn descend(&mut self, mut node: &'a Node<T>, forward: bool) -> bool {
        loop {
            match node {
                Node::Leaf { data, .. } => {
                    self.leaf = data.as_ref();
                    return self.leaf.is_some();
                }
                Node::Branch { left, right, .. } => {
                    let (first, second) = if forward { (left, right) } else { (right, left) };
                    if let Some(child) = first {
                        self.path.push((node, !forward));
                        node = &**child;
                    } else if let Some(child) = second {
                        self.path.push((node, forward));
                        node = &**child;
                    } else {
                        self.leaf = None;
                        return false;
                    }
                }
            }
        }
    }

    // Moves to the neighbouring chunk in the given direction, or to null.
    fn step(&mut self, forward: bool) {
        while let Some((node, went_right)) = self.path.pop() {
            if went_right == forward {
                continue;
            }
            if let Node::Branch { left, right, .. } = node {
                let sibling = if forward { right } else { left };
                if let Some(sibling) = sibling {
                    self.path.push((node, forward));
                    if self.descend(sibling, forward) {
                        return;
                    }
                }
            }
        }
        self.leaf = None;
    }
}

/// An iterator over the chunks of a rope, in order.
///
/// Created by `Rope::chunks`.
pub struct Chunks<'a, T: Adapter> {
    cursor: Cursor<'a, T>,
}

impl<'a, T: Adapter> Clone for Chunks<'a, T> {
    fn clone(&self) -> Self {
        Self {
            cursor: self.cursor.clone(),
        }
    }
}

impl<'a, T: Adapter> Iterator for Chunks<'a, T> {
    type Item = &'a T::Chunk;

    fn next(&mut self) -> Option<&'a T::Chunk> {
        let chunk = self.cursor.get()?;
        self.cursor.move_next();
        Some(chunk)
    }
}

impl<'a, T: Adapter> std::iter::FusedIterator for Chunks<'a, T> {}
