//! Generational slot map for compiled objects.
//!
//! [`ObjectIndex<T>`] stores values in a growable array of slots and hands out
//! [`ObjectKey`]s. Removing a value bumps the slot's generation, so a key kept
//! after removal no longer resolves, even if the slot has been reused.
//!
//! # Example
//!
//! ```
//! use uiframe_core::index::ObjectIndex;
//!
//! let mut index = ObjectIndex::new();
//! let key = index.insert("geometry");
//! assert_eq!(index.get(key), Some(&"geometry"));
//!
//! assert_eq!(index.remove(key), Some("geometry"));
//! assert_eq!(index.get(key), None);
//! ```

/// Key into an [`ObjectIndex`].
///
/// [`ObjectKey::NULL`] never resolves and can be used as an inert handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectKey {
    index: u32,
    generation: u32,
}

impl ObjectKey {
    /// Key that never refers to a live object.
    pub const NULL: Self = Self {
        index: u32::MAX,
        generation: 0,
    };

    /// Slot index of this key.
    pub fn index(self) -> u32 {
        self.index
    }

    /// Generation of this key.
    pub fn generation(self) -> u32 {
        self.generation
    }

    /// Returns true for [`ObjectKey::NULL`].
    pub fn is_null(self) -> bool {
        self == Self::NULL
    }
}

impl Default for ObjectKey {
    fn default() -> Self {
        Self::NULL
    }
}

#[derive(Debug)]
struct Slot<T> {
    generation: u32,
    value: Option<T>,
}

/// Arena with a free list, addressed by generational keys.
#[derive(Debug)]
pub struct ObjectIndex<T> {
    slots: Vec<Slot<T>>,
    free: Vec<u32>,
    len: usize,
}

impl<T> Default for ObjectIndex<T> {
    fn default() -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
            len: 0,
        }
    }
}

impl<T> ObjectIndex<T> {
    /// Create an empty index.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live objects.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of slots ever allocated.
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Store `value` and return its key. Freed slots are reused first.
    pub fn insert(&mut self, value: T) -> ObjectKey {
        self.len += 1;
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.value = Some(value);
            return ObjectKey {
                index,
                generation: slot.generation,
            };
        }
        let index = self.slots.len() as u32;
        self.slots.push(Slot {
            generation: 1,
            value: Some(value),
        });
        ObjectKey {
            index,
            generation: 1,
        }
    }

    /// Returns true if `key` refers to a live object.
    pub fn contains(&self, key: ObjectKey) -> bool {
        self.get(key).is_some()
    }

    pub fn get(&self, key: ObjectKey) -> Option<&T> {
        self.slots
            .get(key.index as usize)
            .filter(|slot| slot.generation == key.generation)
            .and_then(|slot| slot.value.as_ref())
    }

    pub fn get_mut(&mut self, key: ObjectKey) -> Option<&mut T> {
        self.slots
            .get_mut(key.index as usize)
            .filter(|slot| slot.generation == key.generation)
            .and_then(|slot| slot.value.as_mut())
    }

    /// Remove and return the object behind `key`.
    ///
    /// Returns `None` for stale or null keys.
    pub fn remove(&mut self, key: ObjectKey) -> Option<T> {
        let slot = self
            .slots
            .get_mut(key.index as usize)
            .filter(|slot| slot.generation == key.generation)?;
        let value = slot.value.take()?;
        slot.generation = slot.generation.wrapping_add(1).max(1);
        self.free.push(key.index);
        self.len -= 1;
        Some(value)
    }

    /// Iterate over live objects with their keys.
    pub fn iter(&self) -> impl Iterator<Item = (ObjectKey, &T)> {
        self.slots.iter().enumerate().filter_map(|(index, slot)| {
            slot.value.as_ref().map(|value| {
                (
                    ObjectKey {
                        index: index as u32,
                        generation: slot.generation,
                    },
                    value,
                )
            })
        })
    }

    /// Remove every object, keeping slot storage.
    pub fn drain(&mut self) -> Vec<T> {
        let mut values = Vec::with_capacity(self.len);
        for (index, slot) in self.slots.iter_mut().enumerate() {
            if let Some(value) = slot.value.take() {
                slot.generation = slot.generation.wrapping_add(1).max(1);
                self.free.push(index as u32);
                values.push(value);
            }
        }
        self.len = 0;
        values
    }
}

impl<T> std::ops::Index<ObjectKey> for ObjectIndex<T> {
    type Output = T;

    /// # Panics
    ///
    /// Panics if `key` is stale or null.
    fn index(&self, key: ObjectKey) -> &T {
        match self.get(key) {
            Some(value) => value,
            None => panic!("object key {key:?} does not refer to a live object"),
        }
    }
}
