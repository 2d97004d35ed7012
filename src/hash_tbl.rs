//! HashTbl: separate-chaining table with prime bucket counts.

use crate::bucket::{Buckets, IntoIter, Iter, IterMut};
use crate::entry::Entry;
use crate::error::{or_panic, TableError};
use crate::primes::next_prime;
use crate::strategy::{EqStrategy, HashStrategy, StdEq, StdHash};
use core::borrow::Borrow;
use core::fmt;
use core::hash::BuildHasher;
use log::{debug, trace, warn};
use slotmap::DefaultKey;

/// Bucket count of a table built without an explicit capacity.
pub const DEFAULT_CAPACITY: usize = 11;

/// A hash table resolving collisions by separate chaining.
///
/// The bucket count is always prime. Inserting a new key that would push
/// the load factor above 1.0 first grows the table to the next prime at or
/// above twice the current bucket count. The table never shrinks.
///
/// Hashing and key comparison are delegated to `H` and `E`; the defaults
/// forward to `Hash` with `RandomState` and to `Eq`.
pub struct HashTbl<K, V, H = StdHash, E = StdEq> {
    buckets: Buckets<K, V>,
    hasher: H,
    eq: E,
}

impl<K, V> HashTbl<K, V>
where
    K: Eq + core::hash::Hash,
{
    /// Creates an empty table with [`DEFAULT_CAPACITY`] buckets.
    ///
    /// # Examples
    ///
    /// ```
    /// use hashtbl::HashTbl;
    ///
    /// let tbl: HashTbl<u32, &str> = HashTbl::new();
    /// assert_eq!(tbl.capacity(), 11);
    /// ```
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    /// Creates an empty table whose bucket count is the smallest prime
    /// `>= requested`.
    ///
    /// # Panics
    ///
    /// Panics if the bucket array cannot be allocated.
    pub fn with_capacity(requested: usize) -> Self {
        Self::with_capacity_and_hasher(requested, StdHash::default())
    }
}

impl<K, V> Default for HashTbl<K, V>
where
    K: Eq + core::hash::Hash,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V, H, E> HashTbl<K, V, H, E> {
    /// Number of entries.
    #[inline]
    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.buckets.len() == 0
    }

    /// Number of buckets. Always prime.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.buckets.bucket_count()
    }

    /// `len / capacity`; at most 1.0 after any insert.
    pub fn load_factor(&self) -> f64 {
        self.len() as f64 / self.capacity() as f64
    }

    /// Drops every entry. The bucket count is unchanged.
    pub fn clear(&mut self) {
        self.buckets.clear();
    }

    pub fn hasher(&self) -> &H {
        &self.hasher
    }

    pub fn eq_strategy(&self) -> &E {
        &self.eq
    }

    pub fn iter(&self) -> Iter<'_, K, V> {
        self.buckets.iter()
    }

    pub fn iter_mut(&mut self) -> IterMut<'_, K, V> {
        self.buckets.iter_mut()
    }

    pub fn keys(&self) -> impl Iterator<Item = &K> {
        self.iter().map(|(k, _)| k)
    }

    pub fn values(&self) -> impl Iterator<Item = &V> {
        self.iter().map(|(_, v)| v)
    }

    pub fn values_mut(&mut self) -> impl Iterator<Item = &mut V> {
        self.iter_mut().map(|(_, v)| v)
    }

    fn hash_of<Q>(&self, key: &Q) -> u64
    where
        Q: ?Sized,
        H: HashStrategy<Q>,
    {
        self.hasher.hash_key(key)
    }

    fn find_slot<Q>(&self, hash: u64, key: &Q) -> Option<DefaultKey>
    where
        K: Borrow<Q>,
        Q: ?Sized,
        E: EqStrategy<Q>,
    {
        self.buckets
            .find(hash, |stored| self.eq.key_eq(stored.borrow(), key))
    }

    fn unlink<Q>(&mut self, hash: u64, key: &Q) -> Option<Entry<K, V>>
    where
        K: Borrow<Q>,
        Q: ?Sized,
        E: EqStrategy<Q>,
    {
        let eq = &self.eq;
        self.buckets
            .unlink(hash, |stored| eq.key_eq(stored.borrow(), key))
    }

    /// Grows to `next_prime(2 * capacity)` and relinks every entry.
    ///
    /// On error nothing has moved: the old bucket array is still in place.
    fn grow(&mut self) -> Result<(), TableError> {
        let old = self.capacity();
        let doubled = old
            .checked_mul(2)
            .ok_or(TableError::CapacityOverflow { requested: old })?;
        let new = next_prime(doubled).ok_or(TableError::CapacityOverflow { requested: doubled })?;
        self.relink_to(new)
    }

    /// Relinks every entry into `new` buckets. On error the old bucket array
    /// is still in place.
    fn relink_to(&mut self, new: usize) -> Result<(), TableError> {
        debug!(
            "rehashing {} entries from {} to {} buckets",
            self.len(),
            self.capacity(),
            new
        );
        self.buckets.relink(new).map_err(|source| {
            warn!("rehash to {} buckets failed: {}", new, source);
            TableError::AllocationFailure {
                buckets: new,
                source,
            }
        })
    }

    /// Makes room for one more entry without exceeding a load factor of 1.0.
    fn reserve_one(&mut self) -> Result<(), TableError> {
        if self.len() < self.capacity() {
            return Ok(());
        }
        self.grow()
    }
}

fn alloc_buckets<K, V>(requested: usize) -> Result<Buckets<K, V>, TableError> {
    let buckets = next_prime(requested).ok_or(TableError::CapacityOverflow { requested })?;
    trace!("allocating {} buckets (requested {})", buckets, requested);
    Buckets::try_with_buckets(buckets)
        .map_err(|source| TableError::AllocationFailure { buckets, source })
}

impl<K, V, S> HashTbl<K, V, StdHash<S>, StdEq>
where
    K: Eq + core::hash::Hash,
    S: BuildHasher,
{
    /// Creates an empty table hashing with `build_hasher`.
    pub fn with_build_hasher(requested: usize, build_hasher: S) -> Self {
        Self::with_capacity_and_hasher(requested, StdHash::new(build_hasher))
    }
}

impl<K, V, H, E> HashTbl<K, V, H, E>
where
    H: HashStrategy<K>,
    E: EqStrategy<K>,
{
    pub fn with_hasher(hasher: H) -> Self
    where
        E: Default,
    {
        Self::with_capacity_and_hasher(DEFAULT_CAPACITY, hasher)
    }

    pub fn with_capacity_and_hasher(requested: usize, hasher: H) -> Self
    where
        E: Default,
    {
        Self::with_strategies(requested, hasher, E::default())
    }

    /// # Panics
    ///
    /// Panics if the bucket array cannot be allocated; see
    /// [`try_with_strategies`](Self::try_with_strategies).
    pub fn with_strategies(requested: usize, hasher: H, eq: E) -> Self {
        or_panic(Self::try_with_strategies(requested, hasher, eq))
    }

    /// Creates an empty table with `next_prime(requested)` buckets,
    /// reporting allocation failure instead of panicking.
    pub fn try_with_strategies(requested: usize, hasher: H, eq: E) -> Result<Self, TableError> {
        Ok(Self {
            buckets: alloc_buckets(requested)?,
            hasher,
            eq,
        })
    }

    /// Builds a default table and inserts each entry in order. Later
    /// entries overwrite earlier ones with the same key.
    pub fn from_entries<I>(entries: I) -> Self
    where
        I: IntoIterator<Item = Entry<K, V>>,
        H: Default,
        E: Default,
    {
        let mut tbl = Self::with_strategies(DEFAULT_CAPACITY, H::default(), E::default());
        tbl.extend(entries);
        tbl
    }

    /// Replaces the contents with `entries`, keeping the bucket count.
    pub fn assign<I>(&mut self, entries: I)
    where
        I: IntoIterator<Item = (K, V)>,
    {
        self.clear();
        self.extend(entries);
    }

    /// Inserts `data` under `key`.
    ///
    /// Returns `true` if the key was new. If the key was already present its
    /// data is overwritten in place and `false` is returned; the length is
    /// unchanged.
    ///
    /// # Panics
    ///
    /// Panics if growing the bucket array fails; see
    /// [`try_insert`](Self::try_insert).
    ///
    /// # Examples
    ///
    /// ```
    /// use hashtbl::HashTbl;
    ///
    /// let mut tbl = HashTbl::new();
    /// assert!(tbl.insert(5, "A"));
    /// assert!(!tbl.insert(5, "B"));
    /// assert_eq!(tbl.len(), 1);
    /// assert_eq!(tbl.get(&5), Some(&"B"));
    /// ```
    pub fn insert(&mut self, key: K, data: V) -> bool {
        or_panic(self.try_insert(key, data))
    }

    /// Like [`insert`](Self::insert), but reports a failed growth. On error
    /// the table is unchanged and `key`/`data` are dropped.
    pub fn try_insert(&mut self, key: K, data: V) -> Result<bool, TableError> {
        let hash = self.hasher.hash_key(&key);
        if let Some(slot) = self.find_slot(hash, &key) {
            self.buckets.entry_mut(slot).replace_data(data);
            return Ok(false);
        }
        self.reserve_one()?;
        self.buckets.push_front(hash, Entry::new(key, data));
        Ok(true)
    }

    /// Returns the data stored under `key`, inserting `V::default()` first if
    /// the key is absent.
    ///
    /// This is the implicit-insert counterpart of [`at_mut`](Self::at_mut):
    /// a missing key is never an error here.
    pub fn get_or_insert_default(&mut self, key: K) -> &mut V
    where
        V: Default,
    {
        self.get_or_insert_with(key, V::default)
    }

    pub fn get_or_insert_with<F>(&mut self, key: K, default: F) -> &mut V
    where
        F: FnOnce() -> V,
    {
        or_panic(self.try_get_or_insert_with(key, default))
    }

    /// `default` runs only when the key is absent and growth succeeded.
    pub fn try_get_or_insert_with<F>(&mut self, key: K, default: F) -> Result<&mut V, TableError>
    where
        F: FnOnce() -> V,
    {
        let hash = self.hasher.hash_key(&key);
        let slot = match self.find_slot(hash, &key) {
            Some(slot) => slot,
            None => {
                self.reserve_one()?;
                self.buckets.push_front(hash, Entry::new(key, default()))
            }
        };
        Ok(self.buckets.entry_mut(slot).data_mut())
    }

    /// Removes `key`. Returns `false` if it was not present.
    pub fn erase<Q>(&mut self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized,
        H: HashStrategy<Q>,
        E: EqStrategy<Q>,
    {
        self.remove_entry(key).is_some()
    }

    pub fn remove<Q>(&mut self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: ?Sized,
        H: HashStrategy<Q>,
        E: EqStrategy<Q>,
    {
        self.remove_entry(key).map(|e| e.into_parts().1)
    }

    /// Unlinks the single entry for `key` from its chain. Other entries in
    /// the same bucket are not touched.
    pub fn remove_entry<Q>(&mut self, key: &Q) -> Option<Entry<K, V>>
    where
        K: Borrow<Q>,
        Q: ?Sized,
        H: HashStrategy<Q>,
        E: EqStrategy<Q>,
    {
        let hash = self.hash_of(key);
        self.unlink(hash, key)
    }

    /// Copies the data for `key` into `out` and returns `true`. On a miss
    /// `out` is left untouched and `false` is returned.
    pub fn retrieve<Q>(&self, key: &Q, out: &mut V) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized,
        H: HashStrategy<Q>,
        E: EqStrategy<Q>,
        V: Clone,
    {
        match self.get(key) {
            Some(data) => {
                out.clone_from(data);
                true
            }
            None => false,
        }
    }

    pub fn get<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: ?Sized,
        H: HashStrategy<Q>,
        E: EqStrategy<Q>,
    {
        self.get_entry(key).map(Entry::data)
    }

    pub fn get_mut<Q>(&mut self, key: &Q) -> Option<&mut V>
    where
        K: Borrow<Q>,
        Q: ?Sized,
        H: HashStrategy<Q>,
        E: EqStrategy<Q>,
    {
        let hash = self.hash_of(key);
        let slot = self.find_slot(hash, key)?;
        Some(self.buckets.entry_mut(slot).data_mut())
    }

    pub fn get_entry<Q>(&self, key: &Q) -> Option<&Entry<K, V>>
    where
        K: Borrow<Q>,
        Q: ?Sized,
        H: HashStrategy<Q>,
        E: EqStrategy<Q>,
    {
        let hash = self.hash_of(key);
        self.find_slot(hash, key).map(|slot| self.buckets.entry(slot))
    }

    /// Strict lookup: a missing key is [`TableError::KeyNotFound`].
    ///
    /// # Examples
    ///
    /// ```
    /// use hashtbl::{HashTbl, TableError};
    ///
    /// let mut tbl: HashTbl<u32, i64> = HashTbl::new();
    /// assert!(matches!(tbl.at(&1), Err(TableError::KeyNotFound)));
    ///
    /// *tbl.get_or_insert_default(1) += 10;
    /// assert_eq!(*tbl.at(&1).unwrap(), 10);
    /// ```
    pub fn at<Q>(&self, key: &Q) -> Result<&V, TableError>
    where
        K: Borrow<Q>,
        Q: ?Sized,
        H: HashStrategy<Q>,
        E: EqStrategy<Q>,
    {
        self.get(key).ok_or(TableError::KeyNotFound)
    }

    pub fn at_mut<Q>(&mut self, key: &Q) -> Result<&mut V, TableError>
    where
        K: Borrow<Q>,
        Q: ?Sized,
        H: HashStrategy<Q>,
        E: EqStrategy<Q>,
    {
        self.get_mut(key).ok_or(TableError::KeyNotFound)
    }

    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized,
        H: HashStrategy<Q>,
        E: EqStrategy<Q>,
    {
        let hash = self.hash_of(key);
        self.find_slot(hash, key).is_some()
    }

    /// Number of entries stored under `key`: 0 or 1, since keys are unique.
    ///
    /// For the number of entries sharing `key`'s bucket, see
    /// [`bucket_len`](Self::bucket_len).
    pub fn count<Q>(&self, key: &Q) -> usize
    where
        K: Borrow<Q>,
        Q: ?Sized,
        H: HashStrategy<Q>,
        E: EqStrategy<Q>,
    {
        usize::from(self.contains_key(key))
    }

    /// Number of entries chained in the bucket `key` hashes to, whether or
    /// not `key` itself is present. Diagnostic.
    pub fn bucket_len<Q>(&self, key: &Q) -> usize
    where
        Q: ?Sized,
        H: HashStrategy<Q>,
    {
        let addr = self.buckets.address(self.hash_of(key));
        self.buckets.chain(addr).count()
    }
}

impl<K, V, H, E> Clone for HashTbl<K, V, H, E>
where
    K: Clone,
    V: Clone,
    H: Clone,
    E: Clone,
{
    /// Allocates a bucket array of the same size and re-inserts every entry
    /// with its remembered hash.
    fn clone(&self) -> Self {
        let mut buckets = or_panic(alloc_buckets(self.capacity()));
        for (hash, entry) in self.buckets.hashed_entries() {
            buckets.push_front(hash, entry.clone());
        }
        Self {
            buckets,
            hasher: self.hasher.clone(),
            eq: self.eq.clone(),
        }
    }

    fn clone_from(&mut self, source: &Self) {
        self.buckets.clear();
        if self.capacity() != source.capacity() {
            or_panic(self.buckets.relink(source.capacity()).map_err(|e| {
                TableError::AllocationFailure {
                    buckets: source.capacity(),
                    source: e,
                }
            }));
        }
        for (hash, entry) in source.buckets.hashed_entries() {
            self.buckets.push_front(hash, entry.clone());
        }
        self.hasher.clone_from(&source.hasher);
        self.eq.clone_from(&source.eq);
    }
}

impl<K, V, H, E> Extend<(K, V)> for HashTbl<K, V, H, E>
where
    H: HashStrategy<K>,
    E: EqStrategy<K>,
{
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (k, v) in iter {
            self.insert(k, v);
        }
    }
}

impl<K, V, H, E> Extend<Entry<K, V>> for HashTbl<K, V, H, E>
where
    H: HashStrategy<K>,
    E: EqStrategy<K>,
{
    fn extend<I: IntoIterator<Item = Entry<K, V>>>(&mut self, iter: I) {
        self.extend(iter.into_iter().map(Entry::into_parts));
    }
}

impl<K, V, H, E> FromIterator<(K, V)> for HashTbl<K, V, H, E>
where
    H: HashStrategy<K> + Default,
    E: EqStrategy<K> + Default,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut tbl = Self::with_strategies(DEFAULT_CAPACITY, H::default(), E::default());
        tbl.extend(iter);
        tbl
    }
}

impl<K, V, H, E> FromIterator<Entry<K, V>> for HashTbl<K, V, H, E>
where
    H: HashStrategy<K> + Default,
    E: EqStrategy<K> + Default,
{
    fn from_iter<I: IntoIterator<Item = Entry<K, V>>>(iter: I) -> Self {
        Self::from_entries(iter)
    }
}

impl<'a, K, V, H, E> IntoIterator for &'a HashTbl<K, V, H, E> {
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<'a, K, V, H, E> IntoIterator for &'a mut HashTbl<K, V, H, E> {
    type Item = (&'a K, &'a mut V);
    type IntoIter = IterMut<'a, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter_mut()
    }
}

impl<K, V, H, E> IntoIterator for HashTbl<K, V, H, E> {
    type Item = (K, V);
    type IntoIter = IntoIter<K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.buckets.into_entries()
    }
}

impl<K: fmt::Debug, V: fmt::Debug, H, E> fmt::Debug for HashTbl<K, V, H, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

/// Bucket layout, one line per non-empty bucket:
/// `[index] key => data -> key => data`.
impl<K: fmt::Display, V: fmt::Display, H, E> fmt::Display for HashTbl<K, V, H, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for addr in 0..self.capacity() {
            let mut chain = self.buckets.chain(addr).peekable();
            if chain.peek().is_none() {
                continue;
            }
            write!(f, "[{}]", addr)?;
            for (i, entry) in chain.enumerate() {
                let sep = if i == 0 { " " } else { " -> " };
                write!(f, "{}{} => {}", sep, entry.key(), entry.data())?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
