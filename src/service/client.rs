//! # Client
//!
//! The handle records use to reach an [`ObjectService`]. It is cheap to clone;
//! clones share the service, the transaction state and the naming options.

use super::{FindRequest, ObjectService, Process, RequestContext};
use crate::config::{ServiceConfig, DEFAULT_FIELD_LIMIT, DEFAULT_TRANSACTION_TIMEOUT};
use crate::error::{Error, Result};
use crate::key::Key;
use crate::naming::{EnglishInflector, Inflector, TypeName};
use crate::record::{Attributes, Record};
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, info, instrument, warn};

#[derive(Clone)]
pub struct Client {
    service: Arc<dyn ObjectService>,
    context: Arc<Mutex<RequestContext>>,
    inflector: Arc<dyn Inflector>,
    key_fields: Arc<HashMap<String, String>>,
    transaction_timeout: u32,
    field_limit: usize,
}

impl fmt::Debug for Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Client")
            .field("inflector", &self.inflector)
            .field("key_fields", &self.key_fields)
            .finish_non_exhaustive()
    }
}

impl Client {
    pub fn new(service: impl ObjectService + 'static) -> Self {
        Self::from_service(Arc::new(service))
    }

    pub fn from_service(service: Arc<dyn ObjectService>) -> Self {
        Self {
            service,
            context: Arc::new(Mutex::new(RequestContext::new())),
            inflector: Arc::new(EnglishInflector),
            key_fields: Arc::new(HashMap::new()),
            transaction_timeout: DEFAULT_TRANSACTION_TIMEOUT,
            field_limit: DEFAULT_FIELD_LIMIT,
        }
    }

    /// Apply the mapping options of a service configuration.
    pub fn with_config(mut self, config: &ServiceConfig) -> Self {
        self.key_fields = Arc::new(config.key_fields.clone());
        self.transaction_timeout = config.transaction_timeout;
        self.field_limit = config.field_limit;
        self
    }

    pub fn with_inflector(mut self, inflector: impl Inflector + 'static) -> Self {
        self.inflector = Arc::new(inflector);
        self
    }

    /// Register the primary key field of a type whose key cannot be guessed.
    pub fn with_key_field(mut self, type_name: impl Into<String>, field: impl Into<String>) -> Self {
        Arc::make_mut(&mut self.key_fields).insert(type_name.into(), field.into());
        self
    }

    pub fn inflector(&self) -> &dyn Inflector {
        self.inflector.as_ref()
    }

    pub fn primary_key_field(&self, type_name: &str) -> Option<&str> {
        self.key_fields.get(type_name).map(String::as_str)
    }

    pub fn field_limit(&self) -> usize {
        self.field_limit
    }

    /// An empty record of `type_name`, used as a prototype for reads and finds.
    pub fn model(&self, type_name: &str) -> Result<Record> {
        Record::new(self.clone(), type_name, Attributes::new())
    }

    /// Like [`Client::model`], from a camel-cased name (`glAccount`).
    pub fn model_for(&self, property: &str) -> Result<Record> {
        let type_name = TypeName::from_property(property)?;
        self.model(type_name.as_str())
    }

    /// Snapshot of the transaction state sent with the next request.
    pub fn context(&self) -> RequestContext {
        self.lock_context().clone()
    }

    fn lock_context(&self) -> MutexGuard<'_, RequestContext> {
        self.context.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // --- Object operations ---

    #[instrument(skip(self, attributes))]
    pub async fn create_object(&self, type_name: &str, attributes: Attributes) -> Result<Attributes> {
        debug!(?attributes, "Sending request");
        let created = self.service.create(&self.context(), type_name, attributes).await?;
        info!("Created");
        Ok(created)
    }

    #[instrument(skip(self))]
    pub async fn read_object(&self, type_name: &str, key: &Key) -> Result<Option<Attributes>> {
        debug!("Sending request");
        let attributes = self.service.read(&self.context(), type_name, key).await?;
        debug!(found = attributes.is_some(), "Read");
        Ok(attributes)
    }

    #[instrument(skip(self, attributes))]
    pub async fn update_object(&self, type_name: &str, attributes: Attributes) -> Result<Attributes> {
        debug!(?attributes, "Sending request");
        let updated = self.service.update(&self.context(), type_name, attributes).await?;
        info!("Updated");
        Ok(updated)
    }

    #[instrument(skip(self))]
    pub async fn delete_object(&self, type_name: &str, key: &Key) -> Result<()> {
        debug!("Sending request");
        self.service.delete(&self.context(), type_name, key).await?;
        info!("Deleted");
        Ok(())
    }

    #[instrument(skip(self, attributes, overrides, new_parent))]
    pub async fn clone_object(
        &self,
        type_name: &str,
        attributes: Attributes,
        overrides: Attributes,
        new_key: Option<Key>,
        new_parent: Option<Attributes>,
    ) -> Result<Attributes> {
        debug!(?overrides, "Sending request");
        let cloned = self
            .service
            .clone_object(&self.context(), type_name, attributes, overrides, new_key, new_parent)
            .await?;
        info!("Cloned");
        Ok(cloned)
    }

    #[instrument(skip(self, request), fields(filter = %request.filter))]
    pub async fn find_objects(&self, type_name: &str, request: &FindRequest) -> Result<Vec<Value>> {
        debug!(?request, "Sending request");
        let found = self.service.find(&self.context(), type_name, request).await?;
        debug!(count = found.len(), "Found");
        Ok(found)
    }

    // --- Transactions ---

    #[instrument(skip(self))]
    pub async fn start_transaction(&self, timeout_secs: u32) -> Result<()> {
        let ctx = self.context().with_process(Process::StartTransaction);
        let id = self.service.start_transaction(&ctx, timeout_secs).await?;
        info!(transaction = %id, "Transaction started");
        *self.lock_context() = RequestContext::new().with_transaction(id);
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn commit_transaction(&self) -> Result<()> {
        let ctx = self.context().with_process(Process::Commit);
        self.service.commit(&ctx).await?;
        self.lock_context().clear();
        info!("Transaction committed");
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn rollback_transaction(&self) -> Result<()> {
        let ctx = self.context().with_process(Process::Rollback);
        self.service.rollback(&ctx).await?;
        self.lock_context().clear();
        info!("Transaction rolled back");
        Ok(())
    }

    /// Run `callback` inside a transaction.
    ///
    /// Commits when the callback succeeds. A remote fault means the service has
    /// already rolled back, so only the local transaction state is dropped; any
    /// other error is rolled back here. The callback's error is returned either
    /// way.
    pub async fn transaction<F, Fut, T>(&self, callback: F) -> Result<T>
    where
        F: FnOnce(Client) -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        self.start_transaction(self.transaction_timeout).await?;

        match callback(self.clone()).await {
            Ok(value) => {
                self.commit_transaction().await?;
                Ok(value)
            }
            Err(Error::Fault(fault)) => {
                warn!(%fault, "Remote fault in transaction, already rolled back by the service");
                self.lock_context().clear();
                Err(Error::Fault(fault))
            }
            Err(err) => {
                warn!(error = %err, "Rolling back transaction");
                if let Err(rollback_err) = self.rollback_transaction().await {
                    warn!(error = %rollback_err, "Rollback failed");
                    self.lock_context().clear();
                }
                Err(err)
            }
        }
    }
}
