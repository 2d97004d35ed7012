//! Hash and equality strategies.
//!
//! The table never hashes or compares keys directly; it asks a
//! [`HashStrategy`] for an address seed and an [`EqStrategy`] to tell
//! apart entries sharing a bucket. Defaults forward to `Hash`/`Eq`.

use core::hash::{BuildHasher, Hash};
use std::collections::hash_map::RandomState;

/// Maps a key to an unsigned integer. The table uses the result only as
/// `hash % capacity`.
///
/// Implementations must agree with the paired [`EqStrategy`]: keys that
/// compare equal must hash equal. The table compares full 64-bit hashes
/// before consulting the equality strategy, so equal keys with different
/// hashes are stored as separate entries.
pub trait HashStrategy<Q: ?Sized> {
    fn hash_key(&self, key: &Q) -> u64;
}

/// Decides whether two keys name the same entry.
///
/// Only called for stored keys whose hash equals the looked-up key's hash.
pub trait EqStrategy<Q: ?Sized> {
    fn key_eq(&self, a: &Q, b: &Q) -> bool;
}

/// Hashes with a standard [`BuildHasher`]; `RandomState` by default.
#[derive(Clone, Debug, Default)]
pub struct StdHash<S = RandomState>(S);

impl<S> StdHash<S> {
    pub fn new(build_hasher: S) -> Self {
        StdHash(build_hasher)
    }

    pub fn build_hasher(&self) -> &S {
        &self.0
    }
}

impl<Q, S> HashStrategy<Q> for StdHash<S>
where
    Q: ?Sized + Hash,
    S: BuildHasher,
{
    #[inline]
    fn hash_key(&self, key: &Q) -> u64 {
        self.0.hash_one(key)
    }
}

/// Compares keys with `==`.
#[derive(Clone, Copy, Debug, Default)]
pub struct StdEq;

impl<Q> EqStrategy<Q> for StdEq
where
    Q: ?Sized + Eq,
{
    #[inline]
    fn key_eq(&self, a: &Q, b: &Q) -> bool {
        a == b
    }
}

/// Adapts a closure `Fn(&K) -> u64` into a [`HashStrategy`].
#[derive(Clone, Copy, Debug)]
pub struct FnHash<F>(F);

impl<F> FnHash<F> {
    pub fn new(f: F) -> Self {
        FnHash(f)
    }
}

impl<K, F> HashStrategy<K> for FnHash<F>
where
    K: ?Sized,
    F: Fn(&K) -> u64,
{
    #[inline]
    fn hash_key(&self, key: &K) -> u64 {
        (self.0)(key)
    }
}

/// Adapts a closure `Fn(&K, &K) -> bool` into an [`EqStrategy`].
#[derive(Clone, Copy, Debug)]
pub struct FnEq<F>(F);

impl<F> FnEq<F> {
    pub fn new(f: F) -> Self {
        FnEq(f)
    }
}

impl<K, F> EqStrategy<K> for FnEq<F>
where
    K: ?Sized,
    F: Fn(&K, &K) -> bool,
{
    #[inline]
    fn key_eq(&self, a: &K, b: &K) -> bool {
        (self.0)(a, b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Invariant: `String` and `str` hash identically under `StdHash`, which
    /// borrowed lookups depend on.
    #[test]
    fn std_hash_agrees_across_borrow() {
        let h = StdHash::<RandomState>::default();
        let owned = "account".to_string();
        assert_eq!(
            HashStrategy::<String>::hash_key(&h, &owned),
            HashStrategy::<str>::hash_key(&h, "account")
        );
    }

    #[test]
    fn closure_strategies_forward() {
        let h = FnHash::new(|k: &u32| u64::from(*k) * 3);
        assert_eq!(h.hash_key(&5u32), 15);

        let eq = FnEq::new(|a: &i32, b: &i32| a.abs() == b.abs());
        assert!(eq.key_eq(&-4, &4));
        assert!(!eq.key_eq(&3, &4));
        assert!(StdEq.key_eq("x", "x"));
    }
}
