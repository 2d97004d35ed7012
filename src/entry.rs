//! Entry: a key/data pair whose key cannot change after construction.

/// A key/data pair stored in a [`HashTbl`](crate::HashTbl) chain.
///
/// The key is fixed for the entry's lifetime; there is no `key_mut`.
/// Re-keying an entry means erasing it and inserting a new one.
///
/// The derived `PartialEq` compares both key and data. The table never uses
/// it: lookups and removal match keys through the table's `EqStrategy`.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Entry<K, V> {
    key: K,
    data: V,
}

impl<K, V> Entry<K, V> {
    pub fn new(key: K, data: V) -> Self {
        Self { key, data }
    }

    pub fn key(&self) -> &K {
        &self.key
    }

    pub fn data(&self) -> &V {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut V {
        &mut self.data
    }

    /// Replaces the data, returning the previous value.
    pub fn replace_data(&mut self, data: V) -> V {
        core::mem::replace(&mut self.data, data)
    }

    pub fn into_parts(self) -> (K, V) {
        (self.key, self.data)
    }

    pub(crate) fn parts_mut(&mut self) -> (&K, &mut V) {
        (&self.key, &mut self.data)
    }
}

impl<K, V> From<(K, V)> for Entry<K, V> {
    fn from((key, data): (K, V)) -> Self {
        Self::new(key, data)
    }
}

impl<K, V> From<Entry<K, V>> for (K, V) {
    fn from(entry: Entry<K, V>) -> Self {
        entry.into_parts()
    }
}
