//! hashtbl: a separate-chaining hash table with prime bucket counts and
//! pluggable hash/equality strategies.
//!
//! Internal Design:
//!
//! Summary
//! - Goal: a small associative container whose growth and collision
//!   behavior is fully specified, so every entry can be found by hashing
//!   its key modulo the bucket count and scanning one chain.
//! - Layers:
//!   - Buckets<K, V>: the bucket array plus a `SlotMap` arena of chain
//!     nodes. Owns linking, unlinking and relinking; never hashes or
//!     compares keys itself beyond a caller-supplied predicate.
//!   - HashTbl<K, V, H, E>: public API. Computes hashes with `H`, resolves
//!     chain members with `E`, and decides when to grow.
//!
//! Constraints
//! - Bucket count is always prime: requests round up with `next_prime`,
//!   growth goes to `next_prime(2 * capacity)`. Never shrinks.
//! - Load factor never exceeds 1.0 after an insert: a new key that would
//!   push `len` past `capacity` grows the table before it is linked.
//! - Unique keys: inserting an existing key overwrites its data in place.
//! - Keys are immutable post-insert; there is no `key_mut`.
//!
//! Hash and rehash invariants
//! - Each node stores the hash computed at insertion; growth and `Clone`
//!   relink by the stored hash and never call `H` again.
//! - Growth allocates the new head array first; if that fails the table is
//!   untouched and `try_*` operations report `TableError`.
//!
//! Strict vs. implicit-insert lookups
//! - `at`/`at_mut` fail with `TableError::KeyNotFound`.
//! - `get_or_insert_default` inserts `V::default()` on a miss.
//!
//! `count(key)` is key multiplicity (0 or 1). The bucket-occupancy query is
//! `bucket_len(key)`.
//!
//! Notes and non-goals
//! - Single-threaded API: mutation takes `&mut self`; no internal locking.
//! - Iteration order is unspecified.

mod bucket;
pub mod entry;
pub mod error;
pub mod hash_tbl;
mod hash_tbl_proptest;
pub mod primes;
pub mod strategy;

// Public surface
pub use bucket::{IntoIter, Iter, IterMut};
pub use entry::Entry;
pub use error::TableError;
pub use hash_tbl::{HashTbl, DEFAULT_CAPACITY};
pub use strategy::{EqStrategy, FnEq, FnHash, HashStrategy, StdEq, StdHash};
