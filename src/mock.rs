//! # Mock Object Service
//!
//! [`MockService`] implements [`ObjectService`] entirely in memory. Queue the
//! calls you expect, each with its response, then hand [`MockService::client`]
//! to the code under test:
//!
//! ```rust
//! use remote_model::mock::MockService;
//! use serde_json::json;
//!
//! # #[tokio::main]
//! # async fn main() {
//! let mock = MockService::new();
//! mock.expect_read("Job", "12345")
//!     .return_ok(json!({"job": "12345", "description": "Brochure"}).as_object().cloned());
//!
//! let job = mock.client().model("Job").unwrap().read("12345").await.unwrap().unwrap();
//! assert_eq!(job.get("description"), Some(&json!("Brochure")));
//!
//! mock.verify(); // all expectations were consumed
//! # }
//! ```
//!
//! Expectations are matched in order. A call that does not match the next
//! expectation panics with "Unexpected request or expectation mismatch", which
//! fails the test. Every call is also recorded with the transaction headers it
//! carried, see [`MockService::calls`].

use crate::error::{Error, Result};
use crate::key::Key;
use crate::record::Attributes;
use crate::service::{Client, FindRequest, Header, ObjectService, RequestContext};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

/// The service operation a call or expectation refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Create,
    Read,
    Update,
    Delete,
    Clone,
    Find,
    StartTransaction,
    Commit,
    Rollback,
}

/// A call received by the mock.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedCall {
    pub operation: Operation,
    pub type_name: Option<String>,
    pub key: Option<Key>,
    pub filter: Option<String>,
    /// The full find request, for find calls.
    pub find: Option<FindRequest>,
    pub headers: Vec<Header>,
}

#[derive(Debug, Default)]
struct Matcher {
    type_name: Option<String>,
    key: Option<Key>,
    attributes: Option<Attributes>,
    overrides: Option<Attributes>,
    new_key: Option<Option<Key>>,
    filter: Option<String>,
    find: Option<FindRequest>,
}

enum Response {
    Attributes(Result<Attributes>),
    Read(Result<Option<Attributes>>),
    Unit(Result<()>),
    Found(Result<Vec<Value>>),
    Transaction(Result<String>),
}

struct Expectation {
    operation: Operation,
    matcher: Matcher,
    response: Response,
}

/// What a call actually sent, checked against the next expectation.
#[derive(Default)]
struct Request<'a> {
    type_name: Option<&'a str>,
    key: Option<&'a Key>,
    attributes: Option<&'a Attributes>,
    overrides: Option<&'a Attributes>,
    new_key: Option<Option<&'a Key>>,
    filter: Option<&'a str>,
    find: Option<&'a FindRequest>,
}

impl Matcher {
    fn matches(&self, request: &Request<'_>) -> bool {
        fn check<T: PartialEq + ?Sized>(expected: Option<&T>, actual: Option<&T>) -> bool {
            expected.is_none() || expected == actual
        }

        check(self.type_name.as_deref(), request.type_name)
            && check(self.key.as_ref(), request.key)
            && check(self.attributes.as_ref(), request.attributes)
            && check(self.overrides.as_ref(), request.overrides)
            && check(self.filter.as_deref(), request.filter)
            && check(self.find.as_ref(), request.find)
            && match (&self.new_key, request.new_key) {
                (None, _) => true,
                (Some(expected), Some(actual)) => expected.as_ref() == actual,
                (Some(_), None) => false,
            }
    }
}

#[derive(Clone, Default)]
pub struct MockService {
    expectations: Arc<Mutex<VecDeque<Expectation>>>,
    calls: Arc<Mutex<Vec<RecordedCall>>>,
}

impl MockService {
    pub fn new() -> Self {
        Self::default()
    }

    /// A client backed by this mock.
    pub fn client(&self) -> Client {
        Client::new(self.clone())
    }

    fn expect<T>(
        &self,
        operation: Operation,
        matcher: Matcher,
        wrap: fn(Result<T>) -> Response,
    ) -> ExpectationBuilder<T> {
        ExpectationBuilder {
            expectations: self.expectations.clone(),
            operation,
            matcher,
            wrap,
        }
    }

    fn typed(type_name: &str) -> Matcher {
        Matcher {
            type_name: Some(type_name.to_string()),
            ..Matcher::default()
        }
    }

    pub fn expect_create(&self, type_name: &str) -> ExpectationBuilder<Attributes> {
        self.expect(Operation::Create, Self::typed(type_name), Response::Attributes)
    }

    pub fn expect_read(&self, type_name: &str, key: impl Into<Key>) -> ExpectationBuilder<Option<Attributes>> {
        let matcher = Matcher {
            key: Some(key.into()),
            ..Self::typed(type_name)
        };
        self.expect(Operation::Read, matcher, Response::Read)
    }

    pub fn expect_update(&self, type_name: &str) -> ExpectationBuilder<Attributes> {
        self.expect(Operation::Update, Self::typed(type_name), Response::Attributes)
    }

    pub fn expect_delete(&self, type_name: &str, key: impl Into<Key>) -> ExpectationBuilder<()> {
        let matcher = Matcher {
            key: Some(key.into()),
            ..Self::typed(type_name)
        };
        self.expect(Operation::Delete, matcher, Response::Unit)
    }

    pub fn expect_clone(&self, type_name: &str) -> ExpectationBuilder<Attributes> {
        self.expect(Operation::Clone, Self::typed(type_name), Response::Attributes)
    }

    pub fn expect_find(&self, type_name: &str) -> ExpectationBuilder<Vec<Value>> {
        self.expect(Operation::Find, Self::typed(type_name), Response::Found)
    }

    pub fn expect_start_transaction(&self) -> ExpectationBuilder<String> {
        self.expect(Operation::StartTransaction, Matcher::default(), Response::Transaction)
    }

    pub fn expect_commit(&self) -> ExpectationBuilder<()> {
        self.expect(Operation::Commit, Matcher::default(), Response::Unit)
    }

    pub fn expect_rollback(&self) -> ExpectationBuilder<()> {
        self.expect(Operation::Rollback, Matcher::default(), Response::Unit)
    }

    /// Verifies that all expectations were met.
    pub fn verify(&self) {
        let exps = self.expectations.lock().unwrap();
        if !exps.is_empty() {
            panic!("Not all expectations were met. {} remaining", exps.len());
        }
    }

    /// Every call received so far, in order.
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }

    fn respond(&self, operation: Operation, ctx: &RequestContext, request: Request<'_>) -> Response {
        self.calls.lock().unwrap().push(RecordedCall {
            operation,
            type_name: request.type_name.map(str::to_string),
            key: request.key.cloned(),
            filter: request.filter.map(str::to_string),
            find: request.find.cloned(),
            headers: ctx.headers(),
        });

        let expectation = self.expectations.lock().unwrap().pop_front();
        match expectation {
            Some(exp) if exp.operation == operation && exp.matcher.matches(&request) => exp.response,
            Some(exp) => panic!(
                "Unexpected request or expectation mismatch: expected {:?} {:?}, got {:?} {:?}",
                exp.operation, exp.matcher, operation, request.type_name
            ),
            None => panic!("Unexpected request or expectation mismatch: {operation:?} with nothing expected"),
        }
    }
}

/// Completes an expectation with its response.
pub struct ExpectationBuilder<T> {
    expectations: Arc<Mutex<VecDeque<Expectation>>>,
    operation: Operation,
    matcher: Matcher,
    wrap: fn(Result<T>) -> Response,
}

impl<T> ExpectationBuilder<T> {
    /// Only match calls sending exactly these attributes.
    pub fn with_attributes(mut self, attributes: Value) -> Self {
        self.matcher.attributes = Some(into_attributes(attributes));
        self
    }

    /// Only match clone calls with exactly these overrides.
    pub fn with_overrides(mut self, overrides: Value) -> Self {
        self.matcher.overrides = Some(into_attributes(overrides));
        self
    }

    /// Only match clone calls requesting this new key.
    pub fn with_new_key(mut self, new_key: Option<Key>) -> Self {
        self.matcher.new_key = Some(new_key);
        self
    }

    /// Only match finds with exactly this filter expression.
    pub fn with_filter(mut self, filter: impl Into<String>) -> Self {
        self.matcher.filter = Some(filter.into());
        self
    }

    /// Only match finds sending exactly this request: filter, sort, paging
    /// and fields.
    pub fn with_request(mut self, request: FindRequest) -> Self {
        self.matcher.find = Some(request);
        self
    }

    /// Sets the expectation to return a successful result.
    pub fn return_ok(self, value: T) {
        self.push(Ok(value));
    }

    /// Sets the expectation to return an error.
    pub fn return_err(self, error: impl Into<Error>) {
        self.push(Err(error.into()));
    }

    fn push(self, result: Result<T>) {
        let mut exps = self.expectations.lock().unwrap();
        exps.push_back(Expectation {
            operation: self.operation,
            matcher: self.matcher,
            response: (self.wrap)(result),
        });
    }
}

fn into_attributes(value: Value) -> Attributes {
    match value {
        Value::Object(attributes) => attributes,
        other => panic!("Expected a JSON object, got {other}"),
    }
}

macro_rules! unexpected_response {
    ($operation:expr) => {
        panic!("Unexpected request or expectation mismatch: wrong response for {:?}", $operation)
    };
}

#[async_trait]
impl ObjectService for MockService {
    async fn create(
        &self,
        ctx: &RequestContext,
        type_name: &str,
        attributes: Attributes,
    ) -> Result<Attributes> {
        let request = Request {
            type_name: Some(type_name),
            attributes: Some(&attributes),
            ..Request::default()
        };
        match self.respond(Operation::Create, ctx, request) {
            Response::Attributes(result) => result,
            _ => unexpected_response!(Operation::Create),
        }
    }

    async fn read(
        &self,
        ctx: &RequestContext,
        type_name: &str,
        key: &Key,
    ) -> Result<Option<Attributes>> {
        let request = Request {
            type_name: Some(type_name),
            key: Some(key),
            ..Request::default()
        };
        match self.respond(Operation::Read, ctx, request) {
            // Mirrors transports: a missing object reads as `None`.
            Response::Read(Err(Error::Fault(fault))) if fault.is_object_not_found() => Ok(None),
            Response::Read(result) => result,
            _ => unexpected_response!(Operation::Read),
        }
    }

    async fn update(
        &self,
        ctx: &RequestContext,
        type_name: &str,
        attributes: Attributes,
    ) -> Result<Attributes> {
        let request = Request {
            type_name: Some(type_name),
            attributes: Some(&attributes),
            ..Request::default()
        };
        match self.respond(Operation::Update, ctx, request) {
            Response::Attributes(result) => result,
            _ => unexpected_response!(Operation::Update),
        }
    }

    async fn delete(&self, ctx: &RequestContext, type_name: &str, key: &Key) -> Result<()> {
        let request = Request {
            type_name: Some(type_name),
            key: Some(key),
            ..Request::default()
        };
        match self.respond(Operation::Delete, ctx, request) {
            Response::Unit(result) => result,
            _ => unexpected_response!(Operation::Delete),
        }
    }

    async fn clone_object(
        &self,
        ctx: &RequestContext,
        type_name: &str,
        attributes: Attributes,
        overrides: Attributes,
        new_key: Option<Key>,
        _new_parent: Option<Attributes>,
    ) -> Result<Attributes> {
        let request = Request {
            type_name: Some(type_name),
            attributes: Some(&attributes),
            overrides: Some(&overrides),
            new_key: Some(new_key.as_ref()),
            ..Request::default()
        };
        match self.respond(Operation::Clone, ctx, request) {
            Response::Attributes(result) => result,
            _ => unexpected_response!(Operation::Clone),
        }
    }

    async fn find(
        &self,
        ctx: &RequestContext,
        type_name: &str,
        request: &FindRequest,
    ) -> Result<Vec<Value>> {
        let call = Request {
            type_name: Some(type_name),
            filter: Some(&request.filter),
            find: Some(request),
            ..Request::default()
        };
        match self.respond(Operation::Find, ctx, call) {
            Response::Found(result) => result,
            _ => unexpected_response!(Operation::Find),
        }
    }

    async fn start_transaction(&self, ctx: &RequestContext, _timeout_secs: u32) -> Result<String> {
        match self.respond(Operation::StartTransaction, ctx, Request::default()) {
            Response::Transaction(result) => result,
            _ => unexpected_response!(Operation::StartTransaction),
        }
    }

    async fn commit(&self, ctx: &RequestContext) -> Result<()> {
        match self.respond(Operation::Commit, ctx, Request::default()) {
            Response::Unit(result) => result,
            _ => unexpected_response!(Operation::Commit),
        }
    }

    async fn rollback(&self, ctx: &RequestContext) -> Result<()> {
        match self.respond(Operation::Rollback, ctx, Request::default()) {
            Response::Unit(result) => result,
            _ => unexpected_response!(Operation::Rollback),
        }
    }
}
