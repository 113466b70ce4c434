#![doc(html_logo_url = "https://www.rust-lang.org/logos/rust-logo-128x128.png")]
#![doc(html_favicon_url = "https://www.rust-lang.org/favicon.ico")]
//! # Remote Model
//!
//! > **Active records for a remote object service.**
//!
//! This crate maps the objects of a remote, SOAP-style object service (types
//! such as `Job`, `JobPart`, `Customer` or `CSR`) onto local [`Record`]s with
//! Eloquent-style ergonomics: attribute access with dirty tracking, create,
//! read, update, delete and clone, a fluent filter [`Builder`], lazily resolved
//! [`KeyCollection`]s and relationships inferred from naming conventions.
//!
//! ## 🏗️ Design
//!
//! ### One boundary
//! Everything that talks to the network goes through the [`ObjectService`]
//! trait. The crate ships no transport; implement the trait over your SOAP or
//! HTTP client and wrap it in a [`Client`]. Each call is one awaited round
//! trip and the crate never overlaps requests.
//!
//! ### Lazy results
//! A find returns keys, not objects. [`KeyCollection`] reads a record the
//! first time it is asked for and caches it (misses included) for the life of
//! the collection.
//!
//! ### Conventions over configuration
//! `record.relation("customer")` on a job with a `customer` attribute reads the
//! `Customer` it points at; `record.relation("jobParts")` on a job builds a
//! query for `JobPart`s whose `@job` is the job's key. Irregular type names
//! (`CSR`, `GLAccount`, ...) are handled by [`naming`], English plurals by a
//! pluggable [`Inflector`](naming::Inflector).
//!
//! ### Explicit transactions
//! [`Client::transaction`] starts a transaction, threads its id through every
//! call as a [`RequestContext`], and commits or rolls back depending on the
//! outcome of your closure.
//!
//! ## 🗺️ Module Tour
//!
//! - [`naming`]: type name validation and camel-case conversion, inflection.
//! - [`key`]: integer/string keys and compound key helpers.
//! - [`query`]: the filter expression [`Builder`].
//! - [`collection`]: [`KeyCollection`] and its cursor.
//! - [`record`]: [`Record`] and relationship resolution.
//! - [`service`]: the [`ObjectService`] boundary, [`Client`] and transactions.
//! - [`config`]: [`ServiceConfig`], loaded from serde or the environment.
//! - [`mock`]: [`MockService`](mock::MockService) for tests.
//! - [`observability`]: tracing setup.
//!
//! ## 🚀 Quick Start
//!
//! ```rust
//! use remote_model::mock::MockService;
//! use serde_json::json;
//!
//! # #[tokio::main]
//! # async fn main() -> remote_model::Result<()> {
//! let mock = MockService::new();
//! mock.expect_find("JobPart")
//!     .with_filter(r#"@job = "12345""#)
//!     .return_ok(vec![json!("12345:01"), json!("12345:02")]);
//!
//! let client = mock.client();
//! let job = client.model("Job")?.hydrate(json!({"job": "12345"}).as_object().cloned().unwrap());
//!
//! let parts = job.has_many("JobPart", "job", None)?.get().await?;
//! assert_eq!(parts.count(), 2);
//! # mock.verify();
//! # Ok(())
//! # }
//! ```
//!
//! ### Running Tests
//!
//! ```bash
//! RUST_LOG=debug cargo test
//! ```

pub mod collection;
pub mod config;
pub mod error;
pub mod key;
pub mod mock;
pub mod naming;
pub mod observability;
pub mod query;
pub mod record;
pub mod service;

pub use collection::{Cursor, KeyCollection};
pub use config::ServiceConfig;
pub use error::{Error, Fault, Result};
pub use key::Key;
pub use naming::TypeName;
pub use query::{Boolean, Builder, Operator};
pub use record::{Attributes, Record, Related, Relation};
pub use service::{Client, FindRequest, ObjectService, RequestContext};
