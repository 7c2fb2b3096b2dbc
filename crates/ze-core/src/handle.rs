//! Generational handles
//!
//! Editor components never hold owning references to objects they do not
//! own. Instead they keep a [`Handle`], an index/generation pair that is
//! resolved through an [`Arena`] and yields `None` once the slot has been
//! reused by a newer object.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;

/// Index/generation pair pointing into an [`Arena`].
pub struct Handle<T> {
    index: u32,
    generation: u32,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Handle<T> {
    /// Build a handle from its raw parts.
    pub const fn from_raw_parts(index: u32, generation: u32) -> Self {
        Self {
            index,
            generation,
            _marker: PhantomData,
        }
    }

    /// Slot index in the owning arena
    pub fn index(&self) -> u32 {
        self.index
    }

    /// Generation the slot had when this handle was issued
    pub fn generation(&self) -> u32 {
        self.generation
    }
}

// Manual impls so `T` does not need to implement these traits itself.
impl<T> Clone for Handle<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Handle<T> {}

impl<T> PartialEq for Handle<T> {
    fn eq(&self, other: &Self) -> bool {
        self.index == other.index && self.generation == other.generation
    }
}

impl<T> Eq for Handle<T> {}

impl<T> Hash for Handle<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.index.hash(state);
        self.generation.hash(state);
    }
}

impl<T> PartialOrd for Handle<T> {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl<T> Ord for Handle<T> {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        (self.index, self.generation).cmp(&(other.index, other.generation))
    }
}

impl<T> fmt::Debug for Handle<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Handle({}v{})", self.index, self.generation)
    }
}

enum Slot<T> {
    Occupied { generation: u32, value: T },
    Vacant { next_generation: u32 },
}

/// Generational storage.
///
/// `Tag` is the type the issued handles are branded with. It defaults to
/// the stored type but can be a marker so that several stores share one
/// public handle type (see [`crate::EntityId`]).
pub struct Arena<T, Tag = T> {
    slots: Vec<Slot<T>>,
    free: Vec<u32>,
    len: usize,
    _tag: PhantomData<fn() -> Tag>,
}

impl<T, Tag> Default for Arena<T, Tag> {
    fn default() -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
            len: 0,
            _tag: PhantomData,
        }
    }
}

impl<T: fmt::Debug, Tag> fmt::Debug for Arena<T, Tag> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(self.iter().map(|(h, v)| (h.index(), v)))
            .finish()
    }
}

impl<T, Tag> Arena<T, Tag> {
    /// Create an empty arena
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live values
    pub fn len(&self) -> usize {
        self.len
    }

    /// Check if the arena holds no live values
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Insert a value, reusing a vacant slot when one exists
    pub fn insert(&mut self, value: T) -> Handle<Tag> {
        self.len += 1;
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            let generation = match slot {
                Slot::Vacant { next_generation } => *next_generation,
                Slot::Occupied { generation, .. } => generation.wrapping_add(1),
            };
            *slot = Slot::Occupied { generation, value };
            return Handle::from_raw_parts(index, generation);
        }

        let index = self.slots.len() as u32;
        self.slots.push(Slot::Occupied {
            generation: 0,
            value,
        });
        Handle::from_raw_parts(index, 0)
    }

    /// Remove a value. Every outstanding handle to it becomes stale.
    pub fn remove(&mut self, handle: Handle<Tag>) -> Option<T> {
        let slot = self.slots.get_mut(handle.index as usize)?;
        match slot {
            Slot::Occupied { generation, .. } if *generation == handle.generation => {
                let next_generation = generation.wrapping_add(1);
                let old = std::mem::replace(slot, Slot::Vacant { next_generation });
                self.free.push(handle.index);
                self.len -= 1;
                match old {
                    Slot::Occupied { value, .. } => Some(value),
                    Slot::Vacant { .. } => None,
                }
            }
            _ => None,
        }
    }

    /// Check if the handle still resolves
    pub fn contains(&self, handle: Handle<Tag>) -> bool {
        self.get(handle).is_some()
    }

    /// Resolve a handle
    pub fn get(&self, handle: Handle<Tag>) -> Option<&T> {
        match self.slots.get(handle.index as usize)? {
            Slot::Occupied { generation, value } if *generation == handle.generation => Some(value),
            _ => None,
        }
    }

    /// Resolve a handle mutably
    pub fn get_mut(&mut self, handle: Handle<Tag>) -> Option<&mut T> {
        match self.slots.get_mut(handle.index as usize)? {
            Slot::Occupied { generation, value } if *generation == handle.generation => Some(value),
            _ => None,
        }
    }

    /// Iterate live values in slot order
    pub fn iter(&self) -> impl Iterator<Item = (Handle<Tag>, &T)> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(index, slot)| match slot {
                Slot::Occupied { generation, value } => {
                    Some((Handle::from_raw_parts(index as u32, *generation), value))
                }
                Slot::Vacant { .. } => None,
            })
    }

    /// Handles of all live values in slot order
    pub fn handles(&self) -> Vec<Handle<Tag>> {
        self.iter().map(|(handle, _)| handle).collect()
    }
}
