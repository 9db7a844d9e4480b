//! Registration store
//!
//! Uses DashMap for lock-free concurrent registration. Type identities and
//! tokens live in separate maps, so a token that happens to spell a type
//! name never shadows a type-keyed entry.

use crate::TypeKey;
use ahash::RandomState;
use dashmap::DashMap;
use std::any::Any;
use std::fmt;
use std::sync::Arc;

/// Type-erased registered value
pub type AnyArc = Arc<dyn Any + Send + Sync>;

/// Key an entry was stored under
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum EntryKey {
    /// Normalized type identity
    Type(TypeKey),
    /// Explicit token, verbatim
    Token(String),
}

impl fmt::Display for EntryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntryKey::Type(key) => write!(f, "type `{key}`"),
            EntryKey::Token(token) => write!(f, "token `{token}`"),
        }
    }
}

/// A registered value together with its key.
///
/// Concrete values are stored as their pointee `T`, whether registered by
/// value or through an `Arc<T>`. Interface implementations are stored as the
/// `Arc<dyn Trait>` itself.
#[derive(Clone)]
pub struct Entry {
    key: EntryKey,
    value: AnyArc,
    stored_as: &'static str,
}

impl Entry {
    /// Entry holding `value` behind a fresh `Arc`
    #[inline]
    pub fn new<T: Any + Send + Sync>(key: EntryKey, value: T) -> Self {
        Self::from_arc(key, Arc::new(value))
    }

    /// Entry sharing an existing `Arc`
    #[inline]
    pub fn from_arc<T: Any + Send + Sync>(key: EntryKey, value: Arc<T>) -> Self {
        Self {
            key,
            value: value as AnyArc,
            stored_as: std::any::type_name::<T>(),
        }
    }

    #[inline]
    pub fn key(&self) -> &EntryKey {
        &self.key
    }

    /// The stored value
    #[inline]
    pub fn value(&self) -> &AnyArc {
        &self.value
    }

    /// Type name of the stored value (for diagnostics)
    #[inline]
    pub fn stored_as(&self) -> &'static str {
        self.stored_as
    }
}

impl fmt::Debug for Entry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Entry")
            .field("key", &self.key)
            .field("stored_as", &self.stored_as)
            .finish()
    }
}

/// Thread-safe registration store
///
/// Uses `DashMap` with `ahash`. Every insert overwrites (last write wins).
pub struct Registry {
    types: DashMap<TypeKey, Entry, RandomState>,
    tokens: DashMap<String, Entry, RandomState>,
}

impl Registry {
    /// Create new empty storage.
    ///
    /// Uses 8 shards per map; registries are small and mostly written during
    /// start-up, so the default of num_cpus * 4 shards is wasted.
    #[inline]
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    /// Create with pre-allocated capacity for type registrations.
    ///
    /// The token map always starts empty with 8 shards; tokens are usually few.
    #[inline]
    pub fn with_capacity(capacity: usize) -> Self {
        let shard_amount = if capacity <= 16 {
            8
        } else if capacity <= 64 {
            16
        } else {
            32
        };
        Self {
            types: DashMap::with_capacity_and_hasher_and_shard_amount(
                capacity,
                RandomState::new(),
                shard_amount,
            ),
            tokens: DashMap::with_capacity_and_hasher_and_shard_amount(
                0,
                RandomState::new(),
                8,
            ),
        }
    }

    /// Store an entry under its key. Returns the replaced entry, if any.
    #[inline]
    pub fn insert(&self, entry: Entry) -> Option<Entry> {
        match &entry.key {
            EntryKey::Type(key) => self.types.insert(*key, entry),
            EntryKey::Token(token) => self.tokens.insert(token.clone(), entry),
        }
    }

    /// Look up a type-keyed entry.
    ///
    /// Returns a clone so no shard lock is held while the caller writes into
    /// its target.
    #[inline]
    pub fn by_type(&self, key: &TypeKey) -> Option<Entry> {
        self.types.get(key).map(|e| e.value().clone())
    }

    /// Look up a token-keyed entry (verbatim, no normalization).
    #[inline]
    pub fn by_token(&self, token: &str) -> Option<Entry> {
        self.tokens.get(token).map(|e| e.value().clone())
    }

    #[inline]
    pub fn contains_type(&self, key: &TypeKey) -> bool {
        self.types.contains_key(key)
    }

    #[inline]
    pub fn contains_token(&self, token: &str) -> bool {
        self.tokens.contains_key(token)
    }

    /// Number of entries across both namespaces
    #[inline]
    pub fn len(&self) -> usize {
        self.types.len() + self.tokens.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.types.is_empty() && self.tokens.is_empty()
    }

    /// Keys of every entry, types first
    pub fn keys(&self) -> Vec<EntryKey> {
        self.types
            .iter()
            .map(|r| EntryKey::Type(*r.key()))
            .chain(self.tokens.iter().map(|r| EntryKey::Token(r.key().clone())))
            .collect()
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("types", &self.types.len())
            .field("tokens", &self.tokens.len())
            .finish()
    }
}
