//! # Observability & Tracing
//!
//! Every boundary call made through [`crate::service::Client`] runs in a span
//! named after the operation, with the type name and key as fields. Records and
//! key collections add `debug!` events for reads they skip or resolve, and
//! transactions log their start, commit and rollback at `info`.
//!
//! ```bash
//! # Operations and transaction boundaries
//! RUST_LOG=info cargo test
//!
//! # Full payloads (attributes, overrides, find requests)
//! RUST_LOG=debug cargo test
//!
//! # Only this crate
//! RUST_LOG=remote_model=debug cargo test
//! ```
//!
//! With `RUST_LOG=debug` a `has_many` followed by a lookup reads like:
//!
//! ```text
//! DEBUG Executing builder type_name=JobPart filter=@job = "12345"
//! DEBUG find_objects: Sending request filter=@job = "12345" request=FindRequest { .. }
//! DEBUG find_objects: Found filter=@job = "12345" count=2
//! DEBUG Resolving key type_name=JobPart key=12345:01
//! DEBUG read_object: Sending request type_name="JobPart" key=Str("12345:01")
//! ```
//!
//! Host applications normally install their own subscriber; [`setup_tracing`]
//! is for binaries and tests that have none.

/// Install a compact, `RUST_LOG`-filtered subscriber.
///
/// Safe to call more than once; later calls leave the first subscriber in
/// place.
pub fn setup_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_target(false) // Span names already identify the operation
        .compact()
        .try_init();
}
