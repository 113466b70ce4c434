//! Per-request transaction state.

use serde::Serialize;

/// Transaction control phase a request belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Process {
    StartTransaction,
    Commit,
    Rollback,
}

impl Process {
    pub fn as_str(self) -> &'static str {
        match self {
            Process::StartTransaction => "startTransaction",
            Process::Commit => "commit",
            Process::Rollback => "rollback",
        }
    }
}

/// A header a transport attaches to a request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Header {
    pub namespace: String,
    pub name: String,
    pub value: String,
}

impl Header {
    fn transaction(name: &str, value: &str) -> Self {
        Self {
            namespace: "transaction".to_string(),
            name: name.to_string(),
            value: value.to_string(),
        }
    }
}

/// Transaction state threaded through every service call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestContext {
    transaction: Option<String>,
    process: Option<Process>,
}

impl RequestContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn transaction(&self) -> Option<&str> {
        self.transaction.as_deref()
    }

    pub fn process(&self) -> Option<Process> {
        self.process
    }

    pub fn in_transaction(&self) -> bool {
        self.transaction.is_some()
    }

    pub fn with_transaction(mut self, id: impl Into<String>) -> Self {
        self.transaction = Some(id.into());
        self
    }

    pub fn with_process(mut self, process: Process) -> Self {
        self.process = Some(process);
        self
    }

    /// Forget the transaction.
    pub fn clear(&mut self) {
        self.transaction = None;
        self.process = None;
    }

    /// Headers in the order the transport must send them: the transaction
    /// id first, then the process instruction.
    pub fn headers(&self) -> Vec<Header> {
        let mut headers = Vec::new();
        if let Some(id) = &self.transaction {
            headers.push(Header::transaction("txnId", id));
        }
        if let Some(process) = self.process {
            headers.push(Header::transaction("process", process.as_str()));
        }
        headers
    }
}
