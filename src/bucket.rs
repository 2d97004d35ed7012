//! Buckets: the bucket array and the chains hanging off it.
//!
//! Chains are singly-linked lists. Nodes live in one `SlotMap` arena and
//! link to each other through generational keys; the bucket array holds
//! the head key of each chain. Consequences:
//! - Front insertion and single-node unlink touch only the affected links.
//! - Relinking for a new bucket count moves no entries, it only rewrites
//!   `next` links into a freshly allocated head array.
//! - Each node carries the hash computed at insertion, so relinking never
//!   calls back into the hash strategy.

use crate::entry::Entry;
use slotmap::{DefaultKey, SlotMap};
use std::collections::TryReserveError;

#[derive(Debug)]
struct Node<K, V> {
    entry: Entry<K, V>,
    hash: u64,
    next: Option<DefaultKey>,
}

#[derive(Debug)]
pub(crate) struct Buckets<K, V> {
    heads: Vec<Option<DefaultKey>>,
    nodes: SlotMap<DefaultKey, Node<K, V>>,
}

fn alloc_heads(buckets: usize) -> Result<Vec<Option<DefaultKey>>, TryReserveError> {
    let mut heads = Vec::new();
    heads.try_reserve_exact(buckets)?;
    heads.resize(buckets, None);
    Ok(heads)
}

impl<K, V> Buckets<K, V> {
    /// `buckets` must be non-zero.
    pub(crate) fn try_with_buckets(buckets: usize) -> Result<Self, TryReserveError> {
        debug_assert!(buckets > 0);
        Ok(Self {
            heads: alloc_heads(buckets)?,
            nodes: SlotMap::with_key(),
        })
    }

    #[inline]
    pub(crate) fn bucket_count(&self) -> usize {
        self.heads.len()
    }

    #[inline]
    pub(crate) fn len(&self) -> usize {
        self.nodes.len()
    }

    #[inline]
    pub(crate) fn address(&self, hash: u64) -> usize {
        (hash % self.heads.len() as u64) as usize
    }

    /// Walks the chain `hash` addresses and returns the first node whose
    /// stored hash equals `hash` and whose key satisfies `is_match`.
    /// `is_match` is never called for nodes with a different stored hash.
    pub(crate) fn find<P>(&self, hash: u64, mut is_match: P) -> Option<DefaultKey>
    where
        P: FnMut(&K) -> bool,
    {
        let mut cur = self.heads[self.address(hash)];
        while let Some(k) = cur {
            let node = &self.nodes[k];
            if node.hash == hash && is_match(node.entry.key()) {
                return Some(k);
            }
            cur = node.next;
        }
        None
    }

    pub(crate) fn entry(&self, k: DefaultKey) -> &Entry<K, V> {
        &self.nodes[k].entry
    }

    pub(crate) fn entry_mut(&mut self, k: DefaultKey) -> &mut Entry<K, V> {
        &mut self.nodes[k].entry
    }

    /// Links a new node at the front of its chain. Does not check for
    /// duplicates.
    pub(crate) fn push_front(&mut self, hash: u64, entry: Entry<K, V>) -> DefaultKey {
        let addr = self.address(hash);
        let next = self.heads[addr];
        let k = self.nodes.insert(Node { entry, hash, next });
        self.heads[addr] = Some(k);
        k
    }

    /// Unlinks the first matching node from its chain and returns its entry.
    /// Neighbouring nodes keep their contents; only the predecessor's link
    /// (or the bucket head) is rewritten.
    pub(crate) fn unlink<P>(&mut self, hash: u64, mut is_match: P) -> Option<Entry<K, V>>
    where
        P: FnMut(&K) -> bool,
    {
        let addr = self.address(hash);
        let mut prev: Option<DefaultKey> = None;
        let mut cur = self.heads[addr];
        while let Some(k) = cur {
            let node = &self.nodes[k];
            if node.hash == hash && is_match(node.entry.key()) {
                let next = node.next;
                match prev {
                    Some(p) => self.nodes[p].next = next,
                    None => self.heads[addr] = next,
                }
                return self.nodes.remove(k).map(|n| n.entry);
            }
            prev = cur;
            cur = node.next;
        }
        None
    }

    /// Redistributes every node over a new array of `buckets` heads.
    ///
    /// The new array is allocated before any link changes, so on error the
    /// structure is exactly as it was.
    pub(crate) fn relink(&mut self, buckets: usize) -> Result<(), TryReserveError> {
        debug_assert!(buckets > 0);
        let mut heads = alloc_heads(buckets)?;
        for (k, node) in self.nodes.iter_mut() {
            let addr = (node.hash % buckets as u64) as usize;
            node.next = heads[addr];
            heads[addr] = Some(k);
        }
        self.heads = heads;
        Ok(())
    }

    pub(crate) fn clear(&mut self) {
        self.nodes.clear();
        self.heads.fill(None);
    }

    pub(crate) fn chain(&self, addr: usize) -> Chain<'_, K, V> {
        Chain {
            nodes: &self.nodes,
            cur: self.heads[addr],
        }
    }

    /// Entries together with the hash remembered at insertion.
    pub(crate) fn hashed_entries(&self) -> impl Iterator<Item = (u64, &Entry<K, V>)> {
        self.nodes.values().map(|n| (n.hash, &n.entry))
    }

    pub(crate) fn iter(&self) -> Iter<'_, K, V> {
        Iter {
            inner: self.nodes.values(),
        }
    }

    pub(crate) fn iter_mut(&mut self) -> IterMut<'_, K, V> {
        IterMut {
            inner: self.nodes.values_mut(),
        }
    }

    pub(crate) fn into_entries(self) -> IntoIter<K, V> {
        IntoIter {
            inner: self.nodes.into_iter(),
        }
    }
}

/// Entries of one chain, front to back.
pub(crate) struct Chain<'a, K, V> {
    nodes: &'a SlotMap<DefaultKey, Node<K, V>>,
    cur: Option<DefaultKey>,
}

impl<'a, K, V> Iterator for Chain<'a, K, V> {
    type Item = &'a Entry<K, V>;

    fn next(&mut self) -> Option<Self::Item> {
        let nodes: &'a SlotMap<DefaultKey, Node<K, V>> = self.nodes;
        let node = &nodes[self.cur?];
        self.cur = node.next;
        Some(&node.entry)
    }
}

/// Iterator over `(&K, &V)` in unspecified order.
pub struct Iter<'a, K, V> {
    inner: slotmap::basic::Values<'a, DefaultKey, Node<K, V>>,
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|n| (n.entry.key(), n.entry.data()))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

/// Iterator over `(&K, &mut V)` in unspecified order.
pub struct IterMut<'a, K, V> {
    inner: slotmap::basic::ValuesMut<'a, DefaultKey, Node<K, V>>,
}

impl<'a, K, V> Iterator for IterMut<'a, K, V> {
    type Item = (&'a K, &'a mut V);

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|n| n.entry.parts_mut())
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

/// Owning iterator over `(K, V)` in unspecified order.
pub struct IntoIter<K, V> {
    inner: slotmap::basic::IntoIter<DefaultKey, Node<K, V>>,
}

impl<K, V> Iterator for IntoIter<K, V> {
    type Item = (K, V);

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(_, n)| n.entry.into_parts())
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keys_in(b: &Buckets<u32, &'static str>, addr: usize) -> Vec<u32> {
        b.chain(addr).map(|e| *e.key()).collect()
    }

    /// Invariant: new nodes go to the front of their chain.
    #[test]
    fn push_front_orders_newest_first() {
        let mut b = Buckets::try_with_buckets(3).unwrap();
        b.push_front(1, Entry::new(1, "a"));
        b.push_front(4, Entry::new(4, "b"));
        b.push_front(7, Entry::new(7, "c"));
        assert_eq!(keys_in(&b, 1), vec![7, 4, 1]);
        assert_eq!(b.len(), 3);
    }

    /// Invariant: unlinking a middle, head, or tail node leaves the rest of
    /// the chain intact and in order.
    #[test]
    fn unlink_is_node_scoped() {
        let mut b = Buckets::try_with_buckets(3).unwrap();
        for k in [1u32, 4, 7, 10] {
            b.push_front(u64::from(k), Entry::new(k, "x"));
        }
        assert_eq!(keys_in(&b, 1), vec![10, 7, 4, 1]);

        let e = b.unlink(7, |k| *k == 7).unwrap();
        assert_eq!(*e.key(), 7);
        assert_eq!(keys_in(&b, 1), vec![10, 4, 1]);

        b.unlink(10, |k| *k == 10).unwrap();
        assert_eq!(keys_in(&b, 1), vec![4, 1]);

        b.unlink(1, |k| *k == 1).unwrap();
        assert_eq!(keys_in(&b, 1), vec![4]);

        assert!(b.unlink(13, |k| *k == 13).is_none());
        assert_eq!(b.len(), 1);
    }

    /// Invariant: a stored hash that differs from the lookup hash never
    /// matches, even if the predicate would.
    #[test]
    fn find_requires_equal_stored_hash() {
        let mut b = Buckets::try_with_buckets(2).unwrap();
        b.push_front(0, Entry::new(0u32, "a"));
        assert!(b.find(0, |_| true).is_some());
        assert!(b.find(2, |_| true).is_none());
    }

    /// Invariant: relink places every node at `hash % new_buckets` using the
    /// remembered hash.
    #[test]
    fn relink_redistributes_by_stored_hash() {
        let mut b = Buckets::try_with_buckets(2).unwrap();
        for k in 0u32..6 {
            b.push_front(u64::from(k), Entry::new(k, "v"));
        }
        b.relink(5).unwrap();
        assert_eq!(b.bucket_count(), 5);
        assert_eq!(b.len(), 6);
        for addr in 0..5 {
            for k in keys_in(&b, addr) {
                assert_eq!(k as usize % 5, addr);
            }
        }
        for k in 0u32..6 {
            let slot = b.find(u64::from(k), |kk| *kk == k).unwrap();
            assert_eq!(*b.entry(slot).key(), k);
        }
    }

    #[test]
    fn clear_keeps_bucket_count() {
        let mut b = Buckets::try_with_buckets(7).unwrap();
        b.push_front(3, Entry::new(3u32, "v"));
        b.clear();
        assert_eq!(b.len(), 0);
        assert_eq!(b.bucket_count(), 7);
        assert!(b.chain(3).next().is_none());
    }

    /// Invariant: a relink whose head array cannot be allocated errors out
    /// before touching any link.
    #[test]
    fn failed_relink_keeps_structure() {
        let mut b = Buckets::try_with_buckets(3).unwrap();
        b.push_front(1, Entry::new(1u32, "a"));
        b.push_front(4, Entry::new(4u32, "b"));

        assert!(b.relink(usize::MAX).is_err());
        assert_eq!(b.bucket_count(), 3);
        assert_eq!(b.len(), 2);
        assert_eq!(keys_in(&b, 1), vec![4, 1]);
        for k in [1u32, 4] {
            let slot = b.find(u64::from(k), |kk| *kk == k).unwrap();
            assert_eq!(*b.entry(slot).key(), k);
        }
    }
}
