//! # Records
//!
//! A [`Record`] is a local snapshot of one remote object: its type, its
//! attributes as last seen (`original`) and as edited (`attributes`), and
//! whether it exists remotely. Records are also prototypes: an empty record of
//! a type is how you read, find and create objects of that type.
//!
//! ```text
//!   new (exists = false) --save--> persisted (exists = true) --delete--> deleted
//!                                      ^                                    |
//!                                      +-------------- save ----------------+
//! ```
//!
//! Relationships follow naming conventions, see [`relation`].

pub mod relation;

pub use relation::{Related, Relation, RelationshipResolver};

use crate::collection::KeyCollection;
use crate::error::{Error, Result};
use crate::key::{is_compound, join_keys, split_key, Key};
use crate::naming::TypeName;
use crate::query::{Builder, FilterValue};
use crate::service::{Client, FindRequest};
use serde::{Serialize, Serializer};
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use tracing::{debug, instrument};

/// Attribute bag of a remote object, in the order the service returned it.
pub type Attributes = serde_json::Map<String, Value>;

/// Generic primary key attribute, used when present.
pub const PRIMARY_KEY: &str = "primaryKey";

/// Type of the objects returned by [`Record::attachments`].
pub const ATTACHMENT_TYPE: &str = "FileAttachment";

#[derive(Debug, Clone)]
pub struct Record {
    client: Client,
    type_name: TypeName,
    attributes: Attributes,
    original: Attributes,
    exists: bool,
    relations: HashMap<String, Option<Record>>,
}

impl Record {
    /// An unsaved record. Fails if `type_name` is not a valid type name.
    pub fn new(client: Client, type_name: &str, attributes: Attributes) -> Result<Self> {
        let type_name = TypeName::new(type_name)?;
        Ok(Self {
            client,
            type_name,
            original: attributes.clone(),
            attributes,
            exists: false,
            relations: HashMap::new(),
        })
    }

    /// An unsaved record of the same type.
    pub fn new_instance(&self, attributes: Attributes) -> Record {
        Record {
            client: self.client.clone(),
            type_name: self.type_name.clone(),
            original: attributes.clone(),
            attributes,
            exists: false,
            relations: HashMap::new(),
        }
    }

    /// A persisted record of the same type built from service attributes.
    pub fn hydrate(&self, attributes: Attributes) -> Record {
        let mut record = self.new_instance(attributes);
        record.exists = true;
        record
    }

    fn prototype(&self) -> Record {
        self.new_instance(Attributes::new())
    }

    pub fn client(&self) -> &Client {
        &self.client
    }

    pub fn type_name(&self) -> &TypeName {
        &self.type_name
    }

    pub fn exists(&self) -> bool {
        self.exists
    }

    // --- Attributes ---

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.attributes.get(name)
    }

    pub fn has_attribute(&self, name: &str) -> bool {
        self.attributes.contains_key(name)
    }

    pub fn set(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.attributes.insert(name.into(), value.into());
    }

    /// Point an attribute at another record by storing that record's key.
    pub fn set_related(&mut self, name: impl Into<String>, related: &Record) -> Result<()> {
        let key = related.key(None)?;
        self.attributes.insert(name.into(), key.to_value());
        Ok(())
    }

    pub fn unset(&mut self, name: &str) -> Option<Value> {
        self.attributes.remove(name)
    }

    pub fn attributes(&self) -> &Attributes {
        &self.attributes
    }

    pub fn original(&self) -> &Attributes {
        &self.original
    }

    pub fn into_attributes(self) -> Attributes {
        self.attributes
    }

    pub fn is_dirty(&self) -> bool {
        self.attributes != self.original
    }

    /// Attributes whose value differs from the last synced snapshot.
    ///
    /// Attributes removed since the snapshot are not reported.
    pub fn get_dirty(&self) -> Attributes {
        self.attributes
            .iter()
            .filter(|(name, value)| self.original.get(name.as_str()) != Some(*value))
            .map(|(name, value)| (name.clone(), value.clone()))
            .collect()
    }

    fn sync_original(&mut self) {
        self.original = self.attributes.clone();
    }

    fn restore(&mut self) {
        self.attributes = self.original.clone();
    }

    // --- Keys ---

    /// Name of the attribute holding the primary key.
    ///
    /// Registered key fields win, then [`PRIMARY_KEY`], then `id`, then the
    /// camel-cased type name (`Job` -> `job`).
    pub fn key_field(&self) -> String {
        if let Some(field) = self.client.primary_key_field(self.type_name.as_str()) {
            return field.to_string();
        }
        if self.has_attribute(PRIMARY_KEY) {
            return PRIMARY_KEY.to_string();
        }
        if self.has_attribute("id") {
            return "id".to_string();
        }
        self.type_name.property_name()
    }

    /// The primary key, read from `key_field` or the guessed key field.
    ///
    /// Null, empty and zero values are all rejected with
    /// [`Error::MissingKey`]; the service treats them as "no key".
    pub fn key(&self, key_field: Option<&str>) -> Result<Key> {
        let field = match key_field {
            Some(field) if !field.is_empty() => field.to_string(),
            _ => self.key_field(),
        };

        self.get(&field)
            .and_then(Key::from_value)
            .filter(|key| !key.is_null())
            .ok_or_else(|| Error::MissingKey {
                type_name: self.type_name.to_string(),
            })
    }

    /// Split a compound key, or this record's own key when `key` is `None`.
    pub fn split_key(&self, key: Option<&str>) -> Result<Vec<String>> {
        match key {
            Some(key) => Ok(split_key(key)),
            None => Ok(split_key(&self.key(None)?.to_string())),
        }
    }

    /// Join the named attributes into a compound key (`job:part`).
    fn compound_key(&self, foreign_key: &str) -> String {
        join_keys(
            split_key(foreign_key)
                .iter()
                .map(|field| self.get(field).map(value_to_key_part).unwrap_or_default()),
        )
    }

    // --- Persistence ---

    /// Read an object of this record's type.
    ///
    /// Null keys return `None` without contacting the service.
    pub async fn read(&self, key: impl Into<Key>) -> Result<Option<Record>> {
        self.read_key(Some(key.into())).await
    }

    async fn read_key(&self, key: Option<Key>) -> Result<Option<Record>> {
        let key = match key {
            Some(key) if !key.is_null() => key,
            _ => {
                debug!(type_name = %self.type_name, "Null key, skipping read");
                return Ok(None);
            }
        };

        let attributes = self.client.read_object(self.type_name.as_str(), &key).await?;
        Ok(attributes.map(|attributes| self.hydrate(attributes)))
    }

    pub async fn read_or_fail(&self, key: impl Into<Key>) -> Result<Record> {
        let key = key.into();
        match self.read(key.clone()).await? {
            Some(record) => Ok(record),
            None => Err(Error::NotFound {
                type_name: self.type_name.to_string(),
                key,
            }),
        }
    }

    /// Create `attributes` as a new object of this type.
    pub async fn create(&self, attributes: Attributes) -> Result<Record> {
        let mut record = self.new_instance(attributes);
        record.save().await?;
        Ok(record)
    }

    /// Create or update the remote object and adopt the attributes the
    /// service returns.
    #[instrument(skip(self), fields(type_name = %self.type_name, exists = self.exists))]
    pub async fn save(&mut self) -> Result<()> {
        let attributes = self.attributes.clone();
        if self.exists {
            self.attributes = self.client.update_object(self.type_name.as_str(), attributes).await?;
        } else {
            self.attributes = self.client.create_object(self.type_name.as_str(), attributes).await?;
            self.exists = true;
        }
        self.sync_original();
        Ok(())
    }

    /// Delete the remote object. Returns `false` when it was never saved.
    pub async fn delete(&mut self, key_field: Option<&str>) -> Result<bool> {
        if !self.exists {
            return Ok(false);
        }
        let key = self.key(key_field)?;
        self.client.delete_object(self.type_name.as_str(), &key).await?;
        self.exists = false;
        Ok(true)
    }

    /// Clone the remote object with the pending edits applied to the copy.
    ///
    /// This record is reset to its last synced state afterwards.
    pub async fn duplicate(&mut self, new_key: Option<Key>) -> Result<Option<Record>> {
        if !self.exists {
            return Ok(None);
        }
        let attributes = self
            .client
            .clone_object(
                self.type_name.as_str(),
                self.original.clone(),
                self.get_dirty(),
                new_key,
                None,
            )
            .await?;

        let duplicate = self.hydrate(attributes);
        self.restore();
        Ok(Some(duplicate))
    }

    /// Re-read this record from the service.
    pub async fn fresh(&self, key_field: Option<&str>) -> Result<Option<Record>> {
        if !self.exists {
            return Ok(None);
        }
        self.read(self.key(key_field)?).await
    }

    // --- Finding ---

    pub async fn find(&self, filter: impl Into<String>) -> Result<KeyCollection> {
        self.find_with(FindRequest::new(filter)).await
    }

    /// Run a find request; loading fields implies a first page of
    /// `field_limit` objects unless the request says otherwise.
    pub async fn find_with(&self, mut request: FindRequest) -> Result<KeyCollection> {
        if request.has_fields() {
            request.offset.get_or_insert(0);
            request.limit.get_or_insert(self.client.field_limit());
        }

        let found = self
            .client
            .find_objects(self.type_name.as_str(), &request)
            .await?;

        if found.first().is_some_and(Value::is_object) {
            Ok(KeyCollection::from_value_objects(self.prototype(), found))
        } else {
            let keys = found.iter().filter_map(Key::from_value).collect();
            Ok(KeyCollection::new(self.prototype(), keys))
        }
    }

    /// A builder bound to this record's type.
    pub fn new_builder(&self) -> Builder {
        Builder::bound(self.prototype())
    }

    // --- Relationships ---

    /// Read the `related_type` object this record points at through
    /// `foreign_key` (`job`, or compound `job:jobPart`).
    pub async fn belongs_to(&self, related_type: &str, foreign_key: &str) -> Result<Option<Record>> {
        let key = if is_compound(foreign_key) {
            Some(Key::Str(self.compound_key(foreign_key)))
        } else {
            self.get(foreign_key).and_then(Key::from_value)
        };

        self.client.model(related_type)?.read_key(key).await
    }

    /// Query the `related_type` objects whose `foreign_key` holds this
    /// record's key. Compound foreign keys filter each component field.
    pub fn has_many(
        &self,
        related_type: &str,
        foreign_key: &str,
        key_field: Option<&str>,
    ) -> Result<Builder> {
        let mut builder = self.client.model(related_type)?.new_builder();
        let key = self.key(key_field)?;

        if is_compound(foreign_key) {
            let fields = split_key(foreign_key);
            let parts = split_key(&key.to_string());
            if fields.len() != parts.len() {
                return Err(Error::KeyMismatch {
                    type_name: self.type_name.to_string(),
                    foreign_key: foreign_key.to_string(),
                    key,
                });
            }
            for (field, value) in fields.into_iter().zip(parts) {
                builder = builder.filter(format!("@{field}"), value);
            }
        } else {
            builder = builder.filter(format!("@{foreign_key}"), key);
        }

        Ok(builder)
    }

    /// Polymorphic "has many" on the default `baseObject`/`baseObjectKey`
    /// fields.
    pub fn morph_many(&self, related_type: &str) -> Result<Builder> {
        self.morph_many_on(related_type, "baseObject", "baseObjectKey", None)
    }

    pub fn morph_many_on(
        &self,
        related_type: &str,
        base_object: &str,
        base_object_key: &str,
        key_field: Option<&str>,
    ) -> Result<Builder> {
        let key = self.key(key_field)?;
        let builder = self
            .client
            .model(related_type)?
            .new_builder()
            .filter(format!("@{base_object}"), self.type_name.as_str())
            .filter(format!("@{base_object_key}"), key);

        Ok(builder)
    }

    /// File attachments owned by this record.
    pub async fn attachments(&self) -> Result<KeyCollection> {
        self.morph_many(ATTACHMENT_TYPE)?.get().await
    }

    /// Follow a relation by naming convention.
    ///
    /// "Belongs to" results are cached on this record; "has many" builders
    /// are built fresh on every call.
    pub async fn relation(&mut self, accessor: &str) -> Result<Related> {
        let relation = RelationshipResolver::new(self.client.inflector()).resolve(self, accessor)?;

        match relation {
            Relation::BelongsTo {
                related_type,
                foreign_key,
            } => {
                if let Some(loaded) = self.relations.get(accessor) {
                    return Ok(Related::One(loaded.clone()));
                }
                let related = self.belongs_to(related_type.as_str(), &foreign_key).await?;
                self.relations.insert(accessor.to_string(), related.clone());
                Ok(Related::One(related))
            }
            Relation::HasMany {
                related_type,
                foreign_key,
            } => Ok(Related::Many(self.has_many(
                related_type.as_str(),
                &foreign_key,
                None,
            )?)),
        }
    }

    pub fn relation_loaded(&self, accessor: &str) -> bool {
        self.relations.contains_key(accessor)
    }

    /// True if `name` is a builder method records forward.
    pub fn is_builder_method(name: &str) -> bool {
        Self::BUILDER_METHODS.contains(&name)
    }
}

/// Renders a key component the way the service joins them: strings bare,
/// other scalars in their JSON form.
fn value_to_key_part(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Generates the builder shorthands on [`Record`] and the
/// [`Record::BUILDER_METHODS`] list naming them.
///
/// `pairs` are `(field, value)` filters that also get an `or_` variant;
/// `fallible` take an operator token as well; `other` are forwarded with the
/// signature given.
macro_rules! builder_passthrough {
    (
        pairs: [$($pair:ident),* $(,)?],
        fallible: [$($fallible:ident),* $(,)?],
        other: [$($method:ident($($arg:ident: $ty:ty),*)),* $(,)?] $(,)?
    ) => {
        paste::paste! {
            impl Record {
                pub const BUILDER_METHODS: &'static [&'static str] = &[
                    $(stringify!($pair), stringify!([<or_ $pair>]),)*
                    $(stringify!($fallible), stringify!([<or_ $fallible>]),)*
                    $(stringify!($method),)*
                ];

                $(
                    #[doc = "Shorthand for `new_builder()." $pair "(..)`."]
                    pub fn $pair(&self, field: impl Into<String>, value: impl Into<FilterValue>) -> Builder {
                        self.new_builder().$pair(field, value)
                    }

                    #[doc = "Shorthand for `new_builder().or_" $pair "(..)`."]
                    pub fn [<or_ $pair>](&self, field: impl Into<String>, value: impl Into<FilterValue>) -> Builder {
                        self.new_builder().[<or_ $pair>](field, value)
                    }
                )*

                $(
                    #[doc = "Shorthand for `new_builder()." $fallible "(..)`."]
                    pub fn $fallible(
                        &self,
                        field: impl Into<String>,
                        operator: &str,
                        value: impl Into<FilterValue>,
                    ) -> Result<Builder> {
                        self.new_builder().$fallible(field, operator, value)
                    }

                    #[doc = "Shorthand for `new_builder().or_" $fallible "(..)`."]
                    pub fn [<or_ $fallible>](
                        &self,
                        field: impl Into<String>,
                        operator: &str,
                        value: impl Into<FilterValue>,
                    ) -> Result<Builder> {
                        self.new_builder().[<or_ $fallible>](field, operator, value)
                    }
                )*

                $(
                    #[doc = "Shorthand for `new_builder()." $method "(..)`."]
                    pub fn $method(&self, $($arg: $ty),*) -> Builder {
                        self.new_builder().$method($($arg),*)
                    }
                )*
            }
        }
    };
}

builder_passthrough! {
    pairs: [filter, contains, starts_with],
    fallible: [filter_op],
    other: [
        filter_in(field: impl Into<String>, values: impl IntoIterator<Item = impl Into<FilterValue>>),
        or_filter_in(field: impl Into<String>, values: impl IntoIterator<Item = impl Into<FilterValue>>),
        filter_group(callback: impl FnOnce(Builder) -> Builder),
        or_filter_group(callback: impl FnOnce(Builder) -> Builder),
        sort(field: impl Into<String>, descending: bool),
        load(fields: impl IntoIterator<Item = impl Into<crate::query::Projection>>),
        offset(offset: usize),
        limit(limit: usize),
        paginate(page: usize, per_page: usize),
    ],
}

impl Serialize for Record {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.attributes.serialize(serializer)
    }
}

impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let json = serde_json::to_string(&self.attributes).map_err(|_| fmt::Error)?;
        f.write_str(&json)
    }
}
