use std::sync::Arc;

use crate::fib::{fib, fib_index};
use crate::{Adapter, OversizeInsert};

pub(crate) type Link<T> = Option<Arc<Node<T>>>;

/// A node of the rope tree.
///
/// Nodes are frozen once built. Every operation that changes content builds
/// new nodes and re-references the untouched subtrees of the old version.
pub(crate) enum Node<T: Adapter> {
    Leaf {
        len: T::SizeType,
        data: Option<T::Chunk>,
    },
    Branch {
        left: Link<T>,
        right: Link<T>,
        len: T::SizeType,
        weight: usize,
        depth: usize,
        // Every node in the subtree, this one included, is balanced.
        settled: bool,
    },
}

pub(crate) fn len_of<T: Adapter>(link: &Link<T>) -> T::SizeType {
    link.as_ref().map(|node| node.len()).unwrap_or_default()
}

pub(crate) fn split_link<T: Adapter>(
    link: &Link<T>,
    offset: T::SizeType,
    adapter: &T,
) -> (Link<T>, Link<T>) {
    match link {
        Some(node) => Node::split(node, offset, adapter),
        None => (None, None),
    }
}

/// Joins two optional subtrees. A missing side yields the other side as-is.
pub(crate) fn join_links<T: Adapter>(left: Link<T>, right: Link<T>, adapter: &T) -> Link<T> {
    match (left, right) {
        (Some(left), Some(right)) => Some(Node::join(&left, &right, adapter)),
        (Some(node), None) | (None, Some(node)) => Some(node),
        (None, None) => None,
    }
}

impl<T: Adapter> Node<T> {
    pub(crate) fn leaf(adapter: &T, data: T::Chunk) -> Arc<Self> {
        Arc::new(Node::Leaf {
            len: adapter.len(&data),
            data: Some(data),
        })
    }

    /// Placeholder leaf used as the root of a rope that has no content yet.
    pub(crate) fn empty() -> Arc<Self> {
        Arc::new(Node::Leaf {
            len: T::SizeType::default(),
            data: None,
        })
    }

    pub(crate) fn branch(left: Link<T>, right: Link<T>) -> Arc<Self> {
        let (left_len, left_weight, left_depth, left_settled) = Self::aggregates(&left);
        let (right_len, right_weight, right_depth, right_settled) = Self::aggregates(&right);
        let weight = left_weight + right_weight;
        let depth = left_depth.max(right_depth) + 1;
        Arc::new(Node::Branch {
            left,
            right,
            len: left_len + right_len,
            weight,
            depth,
            settled: left_settled && right_settled && weight >= fib(depth + 2),
        })
    }

    fn aggregates(link: &Link<T>) -> (T::SizeType, usize, usize, bool) {
        match link {
            Some(node) => (node.len(), node.weight(), node.depth(), node.is_settled()),
            None => (T::SizeType::default(), 0, 0, true),
        }
    }

    pub(crate) fn len(&self) -> T::SizeType {
        match self {
            Node::Leaf { len, .. } | Node::Branch { len, .. } => *len,
        }
    }

    /// Number of leaves in the subtree.
    pub(crate) fn weight(&self) -> usize {
        match self {
            Node::Leaf { .. } => 1,
            Node::Branch { weight, .. } => *weight,
        }
    }

    pub(crate) fn depth(&self) -> usize {
        match self {
            Node::Leaf { .. } => 0,
            Node::Branch { depth, .. } => *depth,
        }
    }

    pub(crate) fn is_leaf(&self) -> bool {
        matches!(self, Node::Leaf { .. })
    }

    pub(crate) fn is_balanced(&self) -> bool {
        match self {
            Node::Leaf { .. } => true,
            Node::Branch { weight, depth, .. } => *weight >= fib(depth + 2),
        }
    }

    pub(crate) fn is_settled(&self) -> bool {
        match self {
            Node::Leaf { .. } => true,
            Node::Branch { settled, .. } => *settled,
        }
    }

    /// Splits the subtree so that the left part holds exactly `offset`
    /// elements. Requires `offset <= len()`.
    ///
    /// A split on a branch boundary hands back the two children untouched.
    /// A split on either end of a node returns the node itself on one side
    /// and nothing on the other, so no zero-length leaves are produced.
    ///
    /// Walks down iteratively and rejoins the kept siblings bottom-up, so
    /// deep unbalanced trees are handled without recursion.
    pub(crate) fn split(node: &Arc<Self>, offset: T::SizeType, adapter: &T) -> (Link<T>, Link<T>) {
        let zero = T::SizeType::default();
        // Siblings left behind on the way down. `true` means the walk went
        // left, so the sibling belongs after the tail.
        let mut path: Vec<(bool, &Link<T>)> = Vec::new();
        let mut node = node;
        let mut offset = offset;
        let (mut head, mut tail) = loop {
            match &**node {
                Node::Leaf { data: None, .. } => break (None, None),
                _ if offset == zero => break (None, Some(Arc::clone(node))),
                _ if offset >= node.len() => break (Some(Arc::clone(node)), None),
                Node::Leaf { data: Some(data), .. } => {
                    let (left, right) = adapter.split(data, offset);
                    break (Some(Self::leaf(adapter, left)), Some(Self::leaf(adapter, right)));
                }
                Node::Branch { left, right, .. } => {
                    let left_len = len_of(left);
                    match (left, right) {
                        (Some(child), _) if offset < left_len => {
                            path.push((true, right));
                            node = child;
                        }
                        (_, Some(child)) if offset > left_len => {
                            path.push((false, left));
                            offset = offset - left_len;
                            node = child;
                        }
                        _ => break (left.clone(), right.clone()),
                    }
                }
            }
        };
        while let Some((went_left, sibling)) = path.pop() {
            if went_left {
                tail = join_links(tail, sibling.clone(), adapter);
            } else {
                head = join_links(sibling.clone(), head, adapter);
            }
        }
        (head, tail)
    }

    /// Concatenates two subtrees. Two leaves that fit in one leaf together
    /// are merged through the adapter; anything else becomes a new branch.
    pub(crate) fn join(left: &Arc<Self>, right: &Arc<Self>, adapter: &T) -> Arc<Self> {
        if let (
            Node::Leaf {
                len: left_len,
                data: left_data,
            },
            Node::Leaf {
                len: right_len,
                data: right_data,
            },
        ) = (&**left, &**right)
        {
            if *left_len + *right_len <= adapter.max_leaf_len() {
                return match (left_data, right_data) {
                    (Some(l), Some(r)) => Self::leaf(adapter, adapter.join(l, r)),
                    (Some(_), None) => Arc::clone(left),
                    (None, _) => Arc::clone(right),
                };
            }
        }
        Self::branch(Some(Arc::clone(left)), Some(Arc::clone(right)))
    }

    /// Inserts `value` so that its first element lands at `offset`.
    ///
    /// Values longer than the adapter's leaf limit are cut into leaf-sized
    /// pieces first, at the points `Adapter::cut_point` picks, unless the
    /// adapter asks for them to stay whole.
    pub(crate) fn insert(
        node: &Arc<Self>,
        mut value: T::Chunk,
        mut offset: T::SizeType,
        adapter: &T,
    ) -> Arc<Self> {
        let zero = T::SizeType::default();
        let max = adapter.max_leaf_len();
        let mut node = Arc::clone(node);
        if adapter.oversize_insert() == OversizeInsert::Split && max > zero {
            let mut pieces = 1usize;
            while adapter.len(&value) > max {
                let at = adapter.cut_point(&value, max);
                if at == zero || at >= adapter.len(&value) {
                    break;
                }
                let (head, tail) = adapter.split(&value, at);
                node = Self::insert_piece(&node, head, offset, adapter);
                offset = offset + at;
                value = tail;
                pieces += 1;
            }
            if pieces > 1 {
                trace_event!(pieces, "split oversized insert");
            }
        }
        Self::insert_piece(&node, value, offset, adapter)
    }

    fn insert_piece(node: &Arc<Self>, value: T::Chunk, offset: T::SizeType, adapter: &T) -> Arc<Self> {
        let zero = T::SizeType::default();
        let piece = Self::leaf(adapter, value);
        let (left, right) = Self::split(node, offset, adapter);
        let joined = match &**node {
            // Join the new piece onto the shorter neighbour first.
            Node::Leaf { .. } => match (left, right) {
                (Some(left), Some(right)) if left.len() > zero && right.len() > zero => {
                    if left.len() < right.len() {
                        let left = Self::join(&left, &piece, adapter);
                        Some(Self::join(&left, &right, adapter))
                    } else {
                        let right = Self::join(&piece, &right, adapter);
                        Some(Self::join(&left, &right, adapter))
                    }
                }
                (left, right) => {
                    if len_of(&left) > zero {
                        join_links(left, Some(piece), adapter)
                    } else {
                        join_links(Some(piece), right.filter(|r| r.len() > zero), adapter)
                    }
                }
            },
            Node::Branch { .. } => {
                let left = join_links(left, Some(piece), adapter);
                join_links(left, right, adapter)
            }
        };
        joined.unwrap_or_else(Self::empty)
    }

    /// Removes the inclusive range `start..=end`. Returns `None` when nothing
    /// is left of the subtree. Requires `start <= end < len()`.
    pub(crate) fn remove(node: &Arc<Self>, start: T::SizeType, end: T::SizeType, adapter: &T) -> Link<T> {
        let count = end + T::SizeType::from(1u8) - start;
        match &**node {
            Node::Leaf { len, data } => {
                if start == T::SizeType::default() && count >= *len {
                    return None;
                }
                match data {
                    None => Some(Arc::clone(node)),
                    Some(data) => {
                        let (head, rest) = adapter.split(data, start);
                        let (_, tail) = adapter.split(&rest, count);
                        Some(Self::leaf(adapter, adapter.join(&head, &tail)))
                    }
                }
            }
            Node::Branch { .. } => {
                let (head, rest) = Self::split(node, start, adapter);
                let (_, tail) = split_link(&rest, count, adapter);
                join_links(head, tail, adapter)
            }
        }
    }

    /// Element at `offset`, or `None` when no child covers it.
    pub(crate) fn get(&self, mut offset: T::SizeType, adapter: &T) -> Option<T::Elem> {
        let mut node = self;
        loop {
            match node {
                Node::Leaf { data, .. } => {
                    return data.as_ref().and_then(|data| adapter.get(data, offset));
                }
                Node::Branch { left, right, .. } => match (left, right) {
                    (Some(left), _) if offset < left.len() => node = &**left,
                    (Some(left), Some(right)) => {
                        offset = offset - left.len();
                        node = &**right;
                    }
                    (None, Some(right)) => node = &**right,
                    _ => return None,
                },
            }
        }
    }

    /// Visits the chunk of every non-placeholder leaf, left to right.
    pub(crate) fn each<F: FnMut(&T::Chunk)>(&self, mut f: F) {
        let mut stack = vec![self];
        while let Some(node) = stack.pop() {
            match node {
                Node::Leaf { data: Some(data), .. } => f(data),
                Node::Leaf { data: None, .. } => {}
                Node::Branch { left, right, .. } => {
                    stack.extend(right.as_deref());
                    stack.extend(left.as_deref());
                }
            }
        }
    }

    pub(crate) fn each_leaf<F: FnMut(&Arc<Self>)>(node: &Arc<Self>, f: F) {
        Self::each_unit(node, Self::is_leaf, f)
    }

    /// Visits the topmost balanced subtrees, left to right.
    pub(crate) fn each_balanced<F: FnMut(&Arc<Self>)>(node: &Arc<Self>, f: F) {
        Self::each_unit(node, Self::is_balanced, f)
    }

    fn each_settled<F: FnMut(&Arc<Self>)>(node: &Arc<Self>, f: F) {
        Self::each_unit(node, Self::is_settled, f)
    }

    // Leaves always satisfy `is_unit`, so the walk terminates.
    fn each_unit<F: FnMut(&Arc<Self>)>(node: &Arc<Self>, is_unit: fn(&Self) -> bool, mut f: F) {
        let mut stack = vec![node];
        while let Some(node) = stack.pop() {
            match &**node {
                Node::Branch { left, right, .. } if !is_unit(&**node) => {
                    stack.extend(right.as_ref());
                    stack.extend(left.as_ref());
                }
                _ => f(node),
            }
        }
    }

    /// Rebuilds the subtree so that every node in it is balanced.
    ///
    /// Topmost balanced subtrees are taken as units, narrowed down to
    /// subtrees balanced all the way through, and merged through Fibonacci
    /// slots: slot `i` holds a subtree whose weight lies in
    /// `[fib(i), fib(i + 1))`, and a unit is folded together with every
    /// occupied slot at or below its own index before it is placed.
    pub(crate) fn balance(node: &Arc<Self>, adapter: &T) -> Arc<Self> {
        if node.is_settled() {
            return Arc::clone(node);
        }

        let mut units = Vec::new();
        Self::each_balanced(node, |unit| {
            Self::each_settled(unit, |settled| units.push(Arc::clone(settled)))
        });
        trace_event!(units = units.len(), weight = node.weight(), "merging balanced units");

        let mut slots: Vec<Link<T>> = vec![None; fib_index(node.weight()) + 3];
        for mut unit in units {
            loop {
                let target = fib_index(unit.weight());
                if target >= slots.len() {
                    slots.resize(target + 1, None);
                }

                // Higher slots hold earlier content.
                let mut folded: Link<T> = None;
                for slot in slots[..=target].iter_mut() {
                    if let Some(held) = slot.take() {
                        folded = Some(match folded {
                            Some(acc) => Self::settled_join(&held, &acc, adapter),
                            None => held,
                        });
                    }
                }

                match folded {
                    Some(prefix) => unit = Self::settled_join(&prefix, &unit, adapter),
                    None => {
                        slots[target] = Some(unit);
                        break;
                    }
                }
            }
        }

        let mut balanced: Link<T> = None;
        for held in slots.into_iter().flatten() {
            balanced = Some(match balanced {
                Some(acc) => Self::settled_join(&held, &acc, adapter),
                None => held,
            });
        }
        balanced.unwrap_or_else(Self::empty)
    }

    /// `join` that never yields an unbalanced node: when the plain join is
    /// not balanced throughout, the leaves of both sides are rebuilt into a
    /// midpoint tree.
    fn settled_join(left: &Arc<Self>, right: &Arc<Self>, adapter: &T) -> Arc<Self> {
        let joined = Self::join(left, right, adapter);
        if joined.is_settled() {
            return joined;
        }
        trace_event!(
            weight = joined.weight(),
            depth = joined.depth(),
            "rebuilding unbalanced join"
        );
        let mut leaves = Vec::with_capacity(joined.weight());
        Self::each_leaf(&joined, |leaf| leaves.push(Arc::clone(leaf)));
        Self::build(&leaves)
    }

    fn build(leaves: &[Arc<Self>]) -> Arc<Self> {
        match leaves {
            [] => Self::empty(),
            [leaf] => Arc::clone(leaf),
            _ => {
                let (left, right) = leaves.split_at(leaves.len() / 2);
                Self::branch(Some(Self::build(left)), Some(Self::build(right)))
            }
        }
    }
}

// Unlinks children into a worklist so that dropping a deep tree does not
// recurse once per level.
impl<T: Adapter> Drop for Node<T> {
    fn drop(&mut self) {
        let mut stack = Vec::new();
        if let Node::Branch { left, right, .. } = self {
            stack.extend(left.take());
            stack.extend(right.take());
        }
        while let Some(node) = stack.pop() {
            if let Ok(mut node) = Arc::try_unwrap(node) {
                if let Node::Branch { left, right, .. } = &mut node {
                    stack.extend(left.take());
                    stack.extend(right.take());
                }
            }
        }
    }
}
