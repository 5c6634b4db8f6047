//! Polymorphic object storage with stable handles
//!
//! An [`ObjectStore`] exclusively owns heap-allocated objects (usually trait
//! objects such as `dyn Entity`) and hands out copyable [`Handle`]s.
//!
//! - Handles are generation-checked: once an object is erased its handle can
//!   never reach another object, even if the slot is reused.
//! - Objects are boxed, so erasing one never moves the others.
//! - Handles remember which store minted them; using one on another store is a
//!   programming error and panics.
//! - [`ObjectStore::cursor`] walks a snapshot of live handles and allows
//!   erasing the current (or any other) object mid-pass.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;
use std::ops::{Index, IndexMut};
use std::sync::atomic::{AtomicU32, Ordering};

use slotmap::{DefaultKey, SlotMap};

static NEXT_STORE_ID: AtomicU32 = AtomicU32::new(1);

/// Non-owning reference to one object in one [`ObjectStore`]
pub struct Handle<T: ?Sized> {
    key: DefaultKey,
    store: u32,
    _marker: PhantomData<fn() -> Box<T>>,
}

impl<T: ?Sized> Handle<T> {
    fn new(key: DefaultKey, store: u32) -> Self {
        Self {
            key,
            store,
            _marker: PhantomData,
        }
    }
}

impl<T: ?Sized> Clone for Handle<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T: ?Sized> Copy for Handle<T> {}

impl<T: ?Sized> PartialEq for Handle<T> {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key && self.store == other.store
    }
}

impl<T: ?Sized> Eq for Handle<T> {}

impl<T: ?Sized> Hash for Handle<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key.hash(state);
        self.store.hash(state);
    }
}

impl<T: ?Sized> fmt::Debug for Handle<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Handle")
            .field("key", &self.key)
            .field("store", &self.store)
            .finish()
    }
}

/// Owning container of boxed objects addressed by [`Handle`]
pub struct ObjectStore<T: ?Sized> {
    id: u32,
    slots: SlotMap<DefaultKey, Box<T>>,
}

impl<T: ?Sized> Default for ObjectStore<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: ?Sized> fmt::Debug for ObjectStore<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObjectStore")
            .field("id", &self.id)
            .field("len", &self.slots.len())
            .finish()
    }
}

impl<T: ?Sized> ObjectStore<T> {
    pub fn new() -> Self {
        Self {
            id: NEXT_STORE_ID.fetch_add(1, Ordering::Relaxed),
            slots: SlotMap::new(),
        }
    }

    /// Take ownership of a freshly constructed object
    pub fn insert(&mut self, value: T) -> Handle<T>
    where
        T: Sized,
    {
        self.insert_boxed(Box::new(value))
    }

    /// Take ownership of an object built elsewhere (e.g. by a factory)
    pub fn insert_boxed(&mut self, value: Box<T>) -> Handle<T> {
        let key = self.slots.insert(value);
        Handle::new(key, self.id)
    }

    /// Erase the object behind `handle`. Returns false if it is already gone.
    pub fn erase(&mut self, handle: Handle<T>) -> bool {
        self.remove(handle).is_some()
    }

    /// Erase and return the object behind `handle`
    pub fn remove(&mut self, handle: Handle<T>) -> Option<Box<T>> {
        self.check_origin(handle);
        self.slots.remove(handle.key)
    }

    pub fn get(&self, handle: Handle<T>) -> Option<&T> {
        self.check_origin(handle);
        self.slots.get(handle.key).map(|boxed| &**boxed)
    }

    pub fn get_mut(&mut self, handle: Handle<T>) -> Option<&mut T> {
        self.check_origin(handle);
        self.slots.get_mut(handle.key).map(|boxed| &mut **boxed)
    }

    pub fn contains(&self, handle: Handle<T>) -> bool {
        self.check_origin(handle);
        self.slots.contains_key(handle.key)
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Drop every object. Outstanding handles become stale.
    pub fn clear(&mut self) {
        self.slots.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = (Handle<T>, &T)> + '_ {
        let id = self.id;
        self.slots
            .iter()
            .map(move |(key, boxed)| (Handle::new(key, id), &**boxed))
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (Handle<T>, &mut T)> + '_ {
        let id = self.id;
        self.slots
            .iter_mut()
            .map(move |(key, boxed)| (Handle::new(key, id), &mut **boxed))
    }

    pub fn values(&self) -> impl Iterator<Item = &T> + '_ {
        self.slots.values().map(|boxed| &**boxed)
    }

    pub fn values_mut(&mut self) -> impl Iterator<Item = &mut T> + '_ {
        self.slots.values_mut().map(|boxed| &mut **boxed)
    }

    /// Snapshot of live handles in iteration order
    pub fn handles(&self) -> Vec<Handle<T>> {
        let id = self.id;
        self.slots.keys().map(|key| Handle::new(key, id)).collect()
    }

    /// Keep objects for which `keep` returns true. Returns how many were erased.
    pub fn retain(&mut self, mut keep: impl FnMut(Handle<T>, &mut T) -> bool) -> usize {
        let id = self.id;
        let before = self.slots.len();
        self.slots
            .retain(|key, boxed| keep(Handle::new(key, id), &mut **boxed));
        before - self.slots.len()
    }

    /// Start an erase-safe pass over the objects live right now
    pub fn cursor(&mut self) -> Cursor<'_, T> {
        let pending = self.slots.keys().collect::<Vec<_>>().into_iter();
        Cursor {
            store: self,
            pending,
        }
    }

    fn check_origin(&self, handle: Handle<T>) {
        assert_eq!(
            handle.store, self.id,
            "handle minted by store {} used on store {}",
            handle.store, self.id
        );
    }
}

impl<T: ?Sized> Index<Handle<T>> for ObjectStore<T> {
    type Output = T;

    /// Panics if the object was erased
    fn index(&self, handle: Handle<T>) -> &T {
        match self.get(handle) {
            Some(value) => value,
            None => panic!("dereferenced erased handle {handle:?}"),
        }
    }
}

impl<T: ?Sized> IndexMut<Handle<T>> for ObjectStore<T> {
    fn index_mut(&mut self, handle: Handle<T>) -> &mut T {
        match self.get_mut(handle) {
            Some(value) => value,
            None => panic!("dereferenced erased handle {handle:?}"),
        }
    }
}

/// Erase-safe pass over an [`ObjectStore`].
///
/// Visits every object that was live when the cursor was created and is
/// still live when its turn comes, exactly once.
pub struct Cursor<'a, T: ?Sized> {
    store: &'a mut ObjectStore<T>,
    pending: std::vec::IntoIter<DefaultKey>,
}

impl<'a, T: ?Sized> Cursor<'a, T> {
    /// Advance to the next live object
    pub fn next_entry(&mut self) -> Option<CursorEntry<'_, T>> {
        let id = self.store.id;
        loop {
            let key = self.pending.next()?;
            if self.store.slots.contains_key(key) {
                return Some(CursorEntry {
                    store: &mut *self.store,
                    handle: Handle::new(key, id),
                });
            }
        }
    }

    /// Erase any object, including ones not yet visited
    pub fn erase(&mut self, handle: Handle<T>) -> bool {
        self.store.erase(handle)
    }

    pub fn get(&self, handle: Handle<T>) -> Option<&T> {
        self.store.get(handle)
    }

    /// Objects not yet reached (some may already have been erased)
    pub fn remaining(&self) -> usize {
        self.pending.len()
    }
}

/// The object a [`Cursor`] currently points at
pub struct CursorEntry<'c, T: ?Sized> {
    store: &'c mut ObjectStore<T>,
    handle: Handle<T>,
}

impl<'c, T: ?Sized> CursorEntry<'c, T> {
    pub fn handle(&self) -> Handle<T> {
        self.handle
    }

    pub fn get(&self) -> &T {
        &self.store[self.handle]
    }

    pub fn get_mut(&mut self) -> &mut T {
        &mut self.store[self.handle]
    }

    /// Erase the current object; the cursor moves on to the next live one
    pub fn erase(self) -> Box<T> {
        match self.store.remove(self.handle) {
            Some(value) => value,
            None => panic!("cursor entry {:?} erased twice", self.handle),
        }
    }

    /// Erase a different object mid-pass
    pub fn erase_other(&mut self, other: Handle<T>) -> bool {
        assert_ne!(other, self.handle, "use CursorEntry::erase for the current object");
        self.store.erase(other)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    trait Named {
        fn name(&self) -> &str;
    }

    struct Rock(String);

    impl Named for Rock {
        fn name(&self) -> &str {
            &self.0
        }
    }

    struct Tree;

    impl Named for Tree {
        fn name(&self) -> &str {
            "tree"
        }
    }

    #[test]
    fn test_erase_twice_returns_true_then_false() {
        let mut store = ObjectStore::new();
        let h = store.insert(5u32);
        assert!(store.erase(h));
        assert!(!store.erase(h));
        assert!(store.get(h).is_none());
        assert!(store.is_empty());
    }

    #[test]
    fn test_polymorphic_insert() {
        let mut store: ObjectStore<dyn Named> = ObjectStore::new();
        let rock = store.insert_boxed(Box::new(Rock("granite".into())));
        let tree = store.insert_boxed(Box::new(Tree));
        assert_eq!(store[rock].name(), "granite");
        assert_eq!(store[tree].name(), "tree");
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_stale_handle_never_aliases_reused_slot() {
        let mut store = ObjectStore::new();
        let old = store.insert(1);
        store.erase(old);
        let new = store.insert(2);
        assert_ne!(old, new);
        assert!(store.get(old).is_none());
        assert_eq!(store[new], 2);
    }

    #[test]
    #[should_panic(expected = "dereferenced erased handle")]
    fn test_index_on_erased_handle_panics() {
        let mut store = ObjectStore::new();
        let h = store.insert(1);
        store.erase(h);
        let _value: i32 = store[h];
    }

    #[test]
    #[should_panic(expected = "handle minted by store")]
    fn test_foreign_handle_panics() {
        let mut a = ObjectStore::new();
        let b: ObjectStore<i32> = ObjectStore::new();
        let h = a.insert(1);
        let _ = b.get(h);
    }

    #[test]
    fn test_erase_leaves_other_objects_in_place() {
        let mut store = ObjectStore::new();
        let handles: Vec<_> = (0..16).map(|i| store.insert(i)).collect();
        let addr = &store[handles[10]] as *const i32;
        store.erase(handles[3]);
        store.erase(handles[11]);
        assert_eq!(&store[handles[10]] as *const i32, addr);
    }

    #[test]
    fn test_cursor_erase_current_visits_everything_once() {
        let mut store = ObjectStore::new();
        for i in 0..10 {
            store.insert(i);
        }

        let mut seen = Vec::new();
        let mut cursor = store.cursor();
        while let Some(entry) = cursor.next_entry() {
            let value = *entry.get();
            seen.push(value);
            if value % 2 == 0 {
                entry.erase();
            }
        }

        seen.sort();
        assert_eq!(seen, (0..10).collect::<Vec<_>>());
        let mut left: Vec<_> = store.values().copied().collect();
        left.sort();
        assert_eq!(left, vec![1, 3, 5, 7, 9]);
    }

    #[test]
    fn test_cursor_erase_other_skips_it() {
        let mut store = ObjectStore::new();
        let handles: Vec<_> = (0..6).map(|i| store.insert(i)).collect();
        let order = store.handles();
        let victim = *order.last().unwrap();

        let mut visited = HashSet::new();
        let mut cursor = store.cursor();
        while let Some(mut entry) = cursor.next_entry() {
            visited.insert(entry.handle());
            if entry.handle() == order[0] {
                assert!(entry.erase_other(victim));
            }
        }

        assert_eq!(visited.len(), 5);
        assert!(!visited.contains(&victim));
        assert_eq!(store.len(), 5);
        assert_eq!(handles.iter().filter(|h| store.contains(**h)).count(), 5);
    }

    #[test]
    fn test_cursor_erase_between_entries() {
        let mut store = ObjectStore::new();
        for i in 0..6 {
            store.insert(i);
        }
        let order = store.handles();

        let mut visited = Vec::new();
        let mut cursor = store.cursor();
        while let Some(entry) = cursor.next_entry() {
            let handle = entry.handle();
            visited.push(handle);
            if handle == order[1] {
                assert!(cursor.erase(order[4]));
                assert!(!cursor.erase(order[4]));
                assert!(cursor.get(order[4]).is_none());
            }
        }

        assert_eq!(visited.len(), 5);
        assert!(!visited.contains(&order[4]));
        assert_eq!(store.len(), 5);
    }

    #[test]
    fn test_retain_counts_removed() {
        let mut store = ObjectStore::new();
        for i in 0..8 {
            store.insert(i);
        }
        let removed = store.retain(|_, v| *v < 5);
        assert_eq!(removed, 3);
        assert_eq!(store.len(), 5);
    }

    #[test]
    fn test_iteration_is_restartable() {
        let mut store = ObjectStore::new();
        for i in 0..4 {
            store.insert(i);
        }
        let first: Vec<_> = store.iter().map(|(h, _)| h).collect();
        let second: Vec<_> = store.iter().map(|(h, _)| h).collect();
        assert_eq!(first, second);
    }
}
