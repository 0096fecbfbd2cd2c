//! # Paged Slab
//!
//! Growable slot storage whose entries never move once written.

/// Index of an occupied slot in a [`PagedSlab`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SlabKey {
    /// Flat index across all pages.
    index: usize,
}

impl SlabKey {
    /// Returns the flat slot index.
    #[inline]
    #[must_use]
    pub const fn index(self) -> usize {
        self.index
    }
}

/// A slab allocator built from fixed-size pages.
///
/// New pages are appended when every slot is taken. Growing the page table
/// only moves the page pointers, so an entry's address is stable for as long
/// as it stays in the slab, no matter how many other entries are inserted or
/// removed around it.
///
/// Freed slots are recycled LIFO.
///
/// # Thread Safety
///
/// This slab is NOT thread-safe.
///
/// # Example
///
/// ```rust
/// use keystone_core::memory::PagedSlab;
///
/// let mut slab: PagedSlab<u32> = PagedSlab::new(64);
/// let key = slab.insert(7);
/// assert_eq!(slab.get(key), Some(&7));
/// assert_eq!(slab.remove(key), Some(7));
/// ```
pub struct PagedSlab<T> {
    /// Fixed-size pages of optional entries.
    pages: Vec<Box<[Option<T>]>>,
    /// Free list - indices of vacant slots.
    free_list: Vec<usize>,
    /// Entries per page.
    page_size: usize,
    /// Number of occupied slots.
    len: usize,
}

impl<T> PagedSlab<T> {
    /// Creates an empty slab. No page is allocated until the first insert.
    ///
    /// # Arguments
    ///
    /// * `page_size` - Entries per page
    ///
    /// # Panics
    ///
    /// Panics if `page_size` is zero.
    #[must_use]
    pub fn new(page_size: usize) -> Self {
        assert!(page_size > 0, "Page size must be greater than zero");
        Self {
            pages: Vec::new(),
            free_list: Vec::new(),
            page_size,
            len: 0,
        }
    }

    /// Returns the number of occupied slots.
    #[inline]
    #[must_use]
    pub const fn len(&self) -> usize {
        self.len
    }

    /// Returns `true` if no slot is occupied.
    #[inline]
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Returns the total number of slots across all pages.
    #[inline]
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.pages.len() * self.page_size
    }

    /// Returns the entries-per-page setting.
    #[inline]
    #[must_use]
    pub const fn page_size(&self) -> usize {
        self.page_size
    }

    /// Stores a value, allocating a new page if the slab is full.
    pub fn insert(&mut self, value: T) -> SlabKey {
        let index = match self.free_list.pop() {
            Some(index) => index,
            None => self.grow(),
        };
        let (page, offset) = self.locate(index);
        self.pages[page][offset] = Some(value);
        self.len += 1;
        SlabKey { index }
    }

    /// Removes and returns the value at `key`.
    ///
    /// Returns `None` if the slot was already vacant.
    pub fn remove(&mut self, key: SlabKey) -> Option<T> {
        let (page, offset) = self.locate(key.index);
        let value = self.pages.get_mut(page)?[offset].take()?;
        self.free_list.push(key.index);
        self.len -= 1;
        Some(value)
    }

    /// Gets a reference to an occupied slot.
    #[inline]
    #[must_use]
    pub fn get(&self, key: SlabKey) -> Option<&T> {
        let (page, offset) = self.locate(key.index);
        self.pages.get(page)?[offset].as_ref()
    }

    /// Gets a mutable reference to an occupied slot.
    #[inline]
    pub fn get_mut(&mut self, key: SlabKey) -> Option<&mut T> {
        let (page, offset) = self.locate(key.index);
        self.pages.get_mut(page)?[offset].as_mut()
    }

    /// Vacates every slot. Pages are kept for reuse.
    pub fn clear(&mut self) {
        for slot in self.pages.iter_mut().flat_map(|page| page.iter_mut()) {
            *slot = None;
        }
        self.free_list.clear();
        self.free_list.extend((0..self.capacity()).rev());
        self.len = 0;
    }

    /// Iterates over all occupied slots.
    pub fn iter(&self) -> impl Iterator<Item = (SlabKey, &T)> {
        self.pages
            .iter()
            .flat_map(|page| page.iter())
            .enumerate()
            .filter_map(|(index, slot)| slot.as_ref().map(|v| (SlabKey { index }, v)))
    }

    /// Iterates mutably over all occupied slots.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (SlabKey, &mut T)> {
        self.pages
            .iter_mut()
            .flat_map(|page| page.iter_mut())
            .enumerate()
            .filter_map(|(index, slot)| slot.as_mut().map(|v| (SlabKey { index }, v)))
    }

    #[inline]
    fn locate(&self, index: usize) -> (usize, usize) {
        (index / self.page_size, index % self.page_size)
    }

    /// Appends a page and returns its first index; the rest go to the free list.
    fn grow(&mut self) -> usize {
        let first = self.capacity();
        let page: Vec<Option<T>> = (0..self.page_size).map(|_| None).collect();
        self.pages.push(page.into_boxed_slice());
        self.free_list.extend((first + 1..first + self.page_size).rev());
        first
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_remove() {
        let mut slab: PagedSlab<u32> = PagedSlab::new(4);

        let key = slab.insert(42);
        assert_eq!(*slab.get(key).unwrap(), 42);
        assert_eq!(slab.len(), 1);

        assert_eq!(slab.remove(key), Some(42));
        assert!(slab.is_empty());
        assert_eq!(slab.remove(key), None);
    }

    #[test]
    fn test_grows_by_page() {
        let mut slab: PagedSlab<u8> = PagedSlab::new(2);
        assert_eq!(slab.capacity(), 0);

        let keys: Vec<_> = (0..5).map(|i| slab.insert(i)).collect();
        assert_eq!(slab.capacity(), 6);
        assert_eq!(keys.iter().map(|k| k.index()).collect::<Vec<_>>(), [0, 1, 2, 3, 4]);
    }

    #[test]
    fn test_addresses_stable_across_growth() {
        let mut slab: PagedSlab<u64> = PagedSlab::new(2);
        let first = slab.insert(1);
        let before: *const u64 = slab.get(first).unwrap();

        for i in 0..100 {
            slab.insert(i);
        }

        let after: *const u64 = slab.get(first).unwrap();
        assert_eq!(before, after);
    }

    #[test]
    fn test_slot_reuse() {
        let mut slab: PagedSlab<u32> = PagedSlab::new(8);

        let k1 = slab.insert(1);
        slab.remove(k1);

        let k2 = slab.insert(2);
        assert_eq!(k1, k2);
        assert_eq!(*slab.get(k2).unwrap(), 2);
    }

    #[test]
    fn test_clear_and_iter() {
        let mut slab: PagedSlab<u32> = PagedSlab::new(3);
        for i in 0..7 {
            slab.insert(i);
        }
        for (_, value) in slab.iter_mut() {
            *value *= 10;
        }
        let sum: u32 = slab.iter().map(|(_, v)| *v).sum();
        assert_eq!(sum, 210);

        slab.clear();
        assert!(slab.is_empty());
        assert_eq!(slab.iter().count(), 0);
        assert_eq!(slab.capacity(), 9);
    }
}
