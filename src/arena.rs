use std::{fmt, hash::Hash, marker::PhantomData, num::NonZeroU32, ops};

/// Default maximum number of nodes of a single arena.
pub const DEFAULT_NODE_LIMIT: usize = 1 << 20;

/// A typed handle to a node owned by an [`Arena<T>`].
pub struct Idx<T> {
    // Here we use a NonZeroU32 to leverage niche layout optimization, so that
    // `Option<Idx<T>>` is as small as `Idx<T>`.
    raw: NonZeroU32,
    _ty: PhantomData<fn() -> T>,
}

impl<T> Idx<T> {
    fn new(index: usize) -> Option<Self> {
        let raw = u32::try_from(index + 1).ok().and_then(NonZeroU32::new)?;
        Some(Idx {
            raw,
            _ty: PhantomData,
        })
    }

    pub fn index(self) -> usize {
        self.raw.get() as usize - 1
    }
}

impl<T> Copy for Idx<T> {}

impl<T> Clone for Idx<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> PartialEq for Idx<T> {
    fn eq(&self, other: &Self) -> bool {
        self.raw == other.raw
    }
}

impl<T> Eq for Idx<T> {}

impl<T> Hash for Idx<T> {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.raw.hash(state);
    }
}

impl<T> fmt::Debug for Idx<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Idx({})", self.index())
    }
}

/// Owns every node of one kind for a single compilation.
///
/// Nodes are never freed individually; the arena (and all of its nodes) is
/// dropped in one step.
pub struct Arena<T> {
    nodes: Vec<T>,
    limit: usize,
}

impl<T> Arena<T> {
    pub fn new() -> Self {
        Self::with_limit(DEFAULT_NODE_LIMIT)
    }

    pub fn with_limit(limit: usize) -> Self {
        Arena {
            nodes: Vec::new(),
            limit,
        }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Moves `node` into the arena, returning its handle.
    ///
    /// Fails once the arena holds `limit` nodes.
    pub fn alloc(&mut self, node: T) -> Result<Idx<T>, Exhausted> {
        let len = self.nodes.len();
        if len >= self.limit {
            return Err(Exhausted { limit: self.limit });
        }
        let idx = Idx::new(len).ok_or(Exhausted { limit: self.limit })?;
        self.nodes.push(node);
        Ok(idx)
    }

    pub fn get(&self, idx: Idx<T>) -> &T {
        &self.nodes[idx.index()]
    }

    pub fn get_mut(&mut self, idx: Idx<T>) -> &mut T {
        &mut self.nodes[idx.index()]
    }
}

impl<T> Default for Arena<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> ops::Index<Idx<T>> for Arena<T> {
    type Output = T;

    fn index(&self, idx: Idx<T>) -> &T {
        self.get(idx)
    }
}

impl<T> ops::IndexMut<Idx<T>> for Arena<T> {
    fn index_mut(&mut self, idx: Idx<T>) -> &mut T {
        self.get_mut(idx)
    }
}

impl<T: fmt::Debug> fmt::Debug for Arena<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(&self.nodes).finish()
    }
}

/// The arena reached its node limit.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Exhausted {
    pub limit: usize,
}
