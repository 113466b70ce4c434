//! # Remote Object Service Boundary
//!
//! [`ObjectService`] is the contract a transport must satisfy for records to
//! reach the remote service. Every call is one round trip; the mapping layer
//! awaits each call before issuing the next and never overlaps requests.
//!
//! Transports receive a [`RequestContext`] with every call. It carries the
//! active transaction and renders the headers that must accompany the request,
//! so no transport needs global state to take part in a transaction.
//!
//! [`Client`] wraps a service for use by [`crate::record::Record`] and the
//! rest of the crate.

pub mod client;
pub mod context;

pub use client::Client;
pub use context::{Header, Process, RequestContext};

use crate::error::Result;
use crate::key::Key;
use crate::query::{FieldDescriptor, SortDirective};
use crate::record::Attributes;
use async_trait::async_trait;
use serde_json::Value;

/// Arguments of a find call.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FindRequest {
    pub filter: String,
    pub sort: Option<SortDirective>,
    pub offset: Option<usize>,
    pub limit: Option<usize>,
    pub fields: Vec<FieldDescriptor>,
}

impl FindRequest {
    pub fn new(filter: impl Into<String>) -> Self {
        Self {
            filter: filter.into(),
            ..Self::default()
        }
    }

    pub fn has_fields(&self) -> bool {
        !self.fields.is_empty()
    }
}

/// The CRUD and transaction operations of the remote object service.
///
/// Implementations translate "object not found" faults on `read` into
/// `Ok(None)` and surface every other fault as [`crate::Error::Fault`].
#[async_trait]
pub trait ObjectService: Send + Sync {
    /// Create an object, returning its attributes including server defaults.
    async fn create(
        &self,
        ctx: &RequestContext,
        type_name: &str,
        attributes: Attributes,
    ) -> Result<Attributes>;

    async fn read(
        &self,
        ctx: &RequestContext,
        type_name: &str,
        key: &Key,
    ) -> Result<Option<Attributes>>;

    async fn update(
        &self,
        ctx: &RequestContext,
        type_name: &str,
        attributes: Attributes,
    ) -> Result<Attributes>;

    async fn delete(&self, ctx: &RequestContext, type_name: &str, key: &Key) -> Result<()>;

    /// Clone `attributes`, applying `overrides` to the copy.
    async fn clone_object(
        &self,
        ctx: &RequestContext,
        type_name: &str,
        attributes: Attributes,
        overrides: Attributes,
        new_key: Option<Key>,
        new_parent: Option<Attributes>,
    ) -> Result<Attributes>;

    /// Find matching objects.
    ///
    /// Returns bare keys, or partially loaded objects when the request names
    /// fields to load.
    async fn find(
        &self,
        ctx: &RequestContext,
        type_name: &str,
        request: &FindRequest,
    ) -> Result<Vec<Value>>;

    /// Start a transaction, returning its id.
    async fn start_transaction(&self, ctx: &RequestContext, timeout_secs: u32) -> Result<String>;

    async fn commit(&self, ctx: &RequestContext) -> Result<()>;

    async fn rollback(&self, ctx: &RequestContext) -> Result<()>;
}
