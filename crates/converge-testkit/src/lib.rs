//! Scripted test doubles for the convergence core.
//!
//! Provides:
//! - [`MockRemote`]: scripted remote invoker that records every wire request
//! - [`StaticCatalog`]: fixed zone catalog
//! - [`StatusScript`]: scripted status-label sequence for poller tests
//!
//! All doubles use interior mutability so they can back `Fn`/`FnMut`
//! closures while the test keeps a handle for later assertions.

use converge_core::{ConvergeError, ConvergeResult, WireRequest, ZoneEntry};
use converge_types::Value;
use std::cell::RefCell;
use std::collections::VecDeque;

/// One scripted remote outcome.
#[derive(Debug, Clone)]
enum Outcome {
    Respond(Value),
    Fail(String),
}

/// Scripted remote-operation invoker.
///
/// Outcomes are consumed in script order; once the script is exhausted
/// every further call succeeds with `Value::Null`. Every request is
/// recorded for later inspection.
///
/// # Examples
///
/// ```
/// use converge_testkit::MockRemote;
/// use converge_core::WireRequest;
/// use converge_types::Value;
///
/// let remote = MockRemote::new().fail("not here").respond(Value::from("ok"));
///
/// let mut req = WireRequest::new();
/// req.set("Name", "web-1");
/// assert!(remote.invoke(&req).is_err());
/// assert!(remote.invoke(&req).is_ok());
/// assert_eq!(remote.call_count(), 2);
/// ```
#[derive(Debug, Default)]
pub struct MockRemote {
    script: RefCell<VecDeque<Outcome>>,
    calls: RefCell<Vec<WireRequest>>,
}

impl MockRemote {
    /// Creates a remote with an empty script (every call returns null).
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a successful response to the script.
    pub fn respond(self, payload: Value) -> Self {
        self.script.borrow_mut().push_back(Outcome::Respond(payload));
        self
    }

    /// Appends a successful JSON response to the script.
    pub fn respond_json(self, payload: serde_json::Value) -> Self {
        self.respond(Value::from_json(payload))
    }

    /// Appends a failing outcome to the script.
    pub fn fail(self, message: impl Into<String>) -> Self {
        self.script.borrow_mut().push_back(Outcome::Fail(message.into()));
        self
    }

    /// Invokes the next scripted outcome, recording the request.
    pub fn invoke(&self, request: &WireRequest) -> ConvergeResult<Value> {
        self.calls.borrow_mut().push(request.clone());
        match self.script.borrow_mut().pop_front() {
            Some(Outcome::Respond(payload)) => Ok(payload),
            Some(Outcome::Fail(message)) => Err(ConvergeError::remote("mock", message)),
            None => Ok(Value::Null),
        }
    }

    /// Returns the number of invocations so far.
    pub fn call_count(&self) -> usize {
        self.calls.borrow().len()
    }

    /// Returns a copy of every recorded request, in call order.
    pub fn calls(&self) -> Vec<WireRequest> {
        self.calls.borrow().clone()
    }

    /// Returns a copy of the most recent request.
    pub fn last_call(&self) -> Option<WireRequest> {
        self.calls.borrow().last().cloned()
    }
}

/// Fixed zone catalog.
#[derive(Debug, Clone, Default)]
pub struct StaticCatalog {
    entries: Vec<ZoneEntry>,
}

impl StaticCatalog {
    /// Creates an empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a zone in a region.
    pub fn with_zone(mut self, zone: impl Into<String>, region: impl Into<String>) -> Self {
        self.entries.push(ZoneEntry::new(zone, region));
        self
    }

    /// Returns the catalog entries, as a zone-catalog provider would.
    pub fn fetch(&self) -> ConvergeResult<Vec<ZoneEntry>> {
        Ok(self.entries.clone())
    }
}

/// Scripted status-label sequence for poller tests.
///
/// Each refresh yields the next scripted label; the last label repeats
/// once the script is exhausted. The snapshot is the 1-based attempt
/// number.
#[derive(Debug)]
pub struct StatusScript {
    labels: Vec<String>,
    attempt: RefCell<usize>,
}

impl StatusScript {
    /// Creates a script from a label sequence.
    pub fn new<I, S>(labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let labels: Vec<String> = labels.into_iter().map(Into::into).collect();
        assert!(!labels.is_empty(), "status script needs at least one label");
        Self {
            labels,
            attempt: RefCell::new(0),
        }
    }

    /// Returns the next (attempt, label) pair.
    pub fn refresh(&self) -> ConvergeResult<(u32, String)> {
        let mut attempt = self.attempt.borrow_mut();
        let label = self.labels[(*attempt).min(self.labels.len() - 1)].clone();
        *attempt += 1;
        Ok((*attempt as u32, label))
    }

    /// Returns the number of refreshes so far.
    pub fn attempts(&self) -> usize {
        *self.attempt.borrow()
    }
}
