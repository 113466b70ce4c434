//! # Key Collections
//!
//! A [`KeyCollection`] is the result of a find: the matching keys in service
//! order plus a prototype record used to read them. Nothing is read until a
//! record is asked for, and each key is read at most once per collection.
//! Keys that resolve to nothing are remembered as `None` and never re-read.
//!
//! Collections are immutable. Deriving one (`diff`, `slice`, `paginate`,
//! `filter_keys`) yields a new collection with its own, empty cache.

use crate::error::{Error, Result};
use crate::key::Key;
use crate::query::DEFAULT_PER_PAGE;
use crate::record::{Attributes, Record};
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::fmt;
use tokio::sync::Mutex;
use tracing::{debug, warn};

pub struct KeyCollection {
    resolver: Record,
    keys: Vec<Key>,
    cache: Mutex<HashMap<Key, Option<Record>>>,
}

impl fmt::Debug for KeyCollection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyCollection")
            .field("type_name", self.resolver.type_name())
            .field("keys", &self.keys)
            .finish_non_exhaustive()
    }
}

impl KeyCollection {
    pub fn new(resolver: Record, keys: Vec<Key>) -> Self {
        Self {
            resolver,
            keys,
            cache: Mutex::new(HashMap::new()),
        }
    }

    /// A collection over partially loaded objects returned by a find.
    ///
    /// Each object becomes a persisted record and is cached under its key, so
    /// accessing it issues no read. Objects without a usable key are dropped.
    pub fn from_value_objects(resolver: Record, objects: Vec<Value>) -> Self {
        let mut keys = Vec::with_capacity(objects.len());
        let mut cache = HashMap::with_capacity(objects.len());

        for object in objects {
            match object {
                Value::Object(attributes) => {
                    let record = resolver.hydrate(attributes);
                    match record.key(None) {
                        Ok(key) => {
                            keys.push(key.clone());
                            cache.insert(key, Some(record));
                        }
                        Err(err) => warn!(error = %err, "Dropping loaded object without a key"),
                    }
                }
                other => keys.extend(Key::from_value(&other)),
            }
        }

        Self {
            resolver,
            keys,
            cache: Mutex::new(cache),
        }
    }

    /// A collection over `keys` sharing this one's resolver.
    fn derive(&self, keys: Vec<Key>) -> Self {
        Self::new(self.resolver.clone(), keys)
    }

    pub fn count(&self) -> usize {
        self.keys.len()
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn keys(&self) -> &[Key] {
        &self.keys
    }

    /// Type-sensitive membership: `6` and `"6"` are different keys.
    pub fn has(&self, key: impl Into<Key>) -> bool {
        self.keys.contains(&key.into())
    }

    async fn resolve(&self, key: Option<&Key>) -> Result<Option<Record>> {
        let Some(key) = key else {
            return Ok(None);
        };

        let mut cache = self.cache.lock().await;
        if let Some(record) = cache.get(key) {
            return Ok(record.clone());
        }

        debug!(type_name = %self.resolver.type_name(), %key, "Resolving key");
        let record = self.resolver.read(key).await?;
        cache.insert(key.clone(), record.clone());
        Ok(record)
    }

    /// The record for `key`, which must be in the collection.
    pub async fn get(&self, key: impl Into<Key>) -> Result<Option<Record>> {
        let key = key.into();
        if !self.keys.contains(&key) {
            return Err(Error::KeyNotFound(key));
        }
        self.resolve(Some(&key)).await
    }

    pub async fn first(&self) -> Result<Option<Record>> {
        self.resolve(self.keys.first()).await
    }

    pub async fn last(&self) -> Result<Option<Record>> {
        self.resolve(self.keys.last()).await
    }

    /// Every record in key order. Keys that no longer resolve stay in place
    /// as `None`.
    pub async fn all(&self) -> Result<Vec<Option<Record>>> {
        let mut records = Vec::with_capacity(self.keys.len());
        for key in &self.keys {
            records.push(self.resolve(Some(key)).await?);
        }
        Ok(records)
    }

    /// The `value_field` of every record, in key order. Misses and absent
    /// fields are `Null`, so the result lines up with [`KeyCollection::keys`].
    pub async fn pluck(&self, value_field: &str) -> Result<Vec<Value>> {
        Ok(self
            .all()
            .await?
            .iter()
            .map(|record| {
                record
                    .as_ref()
                    .and_then(|record| record.get(value_field).cloned())
                    .unwrap_or(Value::Null)
            })
            .collect())
    }

    /// The `value_field` of every record, keyed by its `key_field`.
    ///
    /// A miss has no `key_field` to key it by and is left out.
    pub async fn pluck_keyed(&self, value_field: &str, key_field: &str) -> Result<Attributes> {
        Ok(self
            .all()
            .await?
            .iter()
            .flatten()
            .map(|record| {
                let key = match record.get(key_field) {
                    Some(Value::String(s)) => s.clone(),
                    Some(other) => other.to_string(),
                    None => String::new(),
                };
                (key, record.get(value_field).cloned().unwrap_or(Value::Null))
            })
            .collect())
    }

    /// The keys not in `other`, in this collection's order.
    pub fn diff<'a, I>(&self, other: I) -> KeyCollection
    where
        I: IntoIterator<Item = &'a Key>,
    {
        let other: HashSet<&Key> = other.into_iter().collect();
        self.filter_keys(|key| !other.contains(key))
    }

    pub fn filter_keys<F>(&self, mut predicate: F) -> KeyCollection
    where
        F: FnMut(&Key) -> bool,
    {
        self.derive(self.keys.iter().filter(|key| predicate(key)).cloned().collect())
    }

    /// At most `length` keys starting at `offset`; all remaining keys when
    /// `length` is `None`.
    pub fn slice(&self, offset: usize, length: Option<usize>) -> KeyCollection {
        let rest = self.keys.iter().skip(offset);
        let keys = match length {
            Some(length) => rest.take(length).cloned().collect(),
            None => rest.cloned().collect(),
        };
        self.derive(keys)
    }

    /// 1-based page of `per_page` keys; pages below 1 are page 1.
    pub fn paginate(&self, page: usize, per_page: usize) -> KeyCollection {
        self.slice(page.saturating_sub(1).saturating_mul(per_page), Some(per_page))
    }

    /// [`KeyCollection::paginate`] with [`DEFAULT_PER_PAGE`].
    pub fn page(&self, page: usize) -> KeyCollection {
        self.paginate(page, DEFAULT_PER_PAGE)
    }

    /// Always fails: key collections are read-only.
    pub fn try_insert(&mut self, key: impl Into<Key>, _record: Record) -> Result<()> {
        Err(Error::Immutable(key.into()))
    }

    /// Always fails: key collections are read-only.
    pub fn try_remove(&mut self, key: impl Into<Key>) -> Result<()> {
        Err(Error::Immutable(key.into()))
    }

    pub fn cursor(&self) -> Cursor<'_> {
        Cursor {
            collection: self,
            position: 0,
        }
    }

    /// `{key: attributes}` for every key, `null` for keys that do not resolve.
    pub async fn to_json(&self) -> Result<Value> {
        let mut object = Attributes::new();
        for key in &self.keys {
            let record = self.resolve(Some(key)).await?;
            let value = record.map_or(Value::Null, |r| Value::Object(r.into_attributes()));
            object.insert(key.to_string(), value);
        }
        Ok(Value::Object(object))
    }
}

impl<'a> IntoIterator for &'a KeyCollection {
    type Item = &'a Key;
    type IntoIter = std::slice::Iter<'a, Key>;

    fn into_iter(self) -> Self::IntoIter {
        self.keys.iter()
    }
}

/// Sequential access to a collection's records.
///
/// ```rust,ignore
/// let mut cursor = jobs.cursor();
/// while cursor.valid() {
///     let job = cursor.current().await?;
///     cursor.advance();
/// }
/// ```
#[derive(Debug)]
pub struct Cursor<'a> {
    collection: &'a KeyCollection,
    position: usize,
}

impl Cursor<'_> {
    pub fn valid(&self) -> bool {
        self.position < self.collection.keys.len()
    }

    pub fn key(&self) -> Option<&Key> {
        self.collection.keys.get(self.position)
    }

    /// The record under the cursor; `None` past the end, without a read.
    pub async fn current(&self) -> Result<Option<Record>> {
        self.collection.resolve(self.key()).await
    }

    pub fn advance(&mut self) {
        if self.valid() {
            self.position += 1;
        }
    }

    pub fn rewind(&mut self) {
        self.position = 0;
    }
}
