//! Generational arena holding widget nodes.
//!
//! A removed slot bumps its generation, so a stale id held by user code
//! resolves to `None` instead of aliasing a newer widget.

/// Generational index for safe references
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GenIndex {
    pub index: u32,
    pub generation: u32,
}

impl GenIndex {
    /// Pack into a single integer (generation in the high half)
    pub fn to_bits(self) -> u64 {
        ((self.generation as u64) << 32) | self.index as u64
    }

    pub fn from_bits(bits: u64) -> Self {
        GenIndex {
            index: bits as u32,
            generation: (bits >> 32) as u32,
        }
    }
}

/// Generational arena (slot map)
#[derive(Debug)]
pub struct GenArena<T> {
    items: Vec<Option<T>>,
    generations: Vec<u32>,
    free_list: Vec<u32>,
}

impl<T> GenArena<T> {
    pub fn new() -> Self {
        Self {
            items: Vec::new(),
            generations: Vec::new(),
            free_list: Vec::new(),
        }
    }

    /// Insert item
    pub fn insert(&mut self, value: T) -> GenIndex {
        if let Some(index) = self.free_list.pop() {
            self.items[index as usize] = Some(value);
            GenIndex { index, generation: self.generations[index as usize] }
        } else {
            let index = self.items.len() as u32;
            self.items.push(Some(value));
            self.generations.push(0);
            GenIndex { index, generation: 0 }
        }
    }

    /// Get item
    pub fn get(&self, idx: GenIndex) -> Option<&T> {
        if self.generations.get(idx.index as usize) != Some(&idx.generation) {
            return None;
        }
        self.items.get(idx.index as usize)?.as_ref()
    }

    /// Get mutable item
    pub fn get_mut(&mut self, idx: GenIndex) -> Option<&mut T> {
        if self.generations.get(idx.index as usize) != Some(&idx.generation) {
            return None;
        }
        self.items.get_mut(idx.index as usize)?.as_mut()
    }

    pub fn contains(&self, idx: GenIndex) -> bool {
        self.get(idx).is_some()
    }

    /// Remove item
    pub fn remove(&mut self, idx: GenIndex) -> Option<T> {
        if !self.contains(idx) {
            return None;
        }
        let value = self.items[idx.index as usize].take();
        let generation = &mut self.generations[idx.index as usize];
        *generation = generation.wrapping_add(1);
        self.free_list.push(idx.index);
        value
    }

    pub fn len(&self) -> usize {
        self.items.len() - self.free_list.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<T> Default for GenArena<T> {
    fn default() -> Self {
        Self::new()
    }
}
