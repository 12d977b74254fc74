//! State poller: block until a resource reaches a target status.

use crate::error::{ConvergeError, ConvergeResult};
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, trace};

/// Polling parameters.
///
/// `pending` is advisory: any label outside `target` and `fail` is
/// treated as still-pending (optimistic continuation), whether listed or
/// not. Unlisted labels are only logged.
#[derive(Debug, Clone)]
pub struct PollSpec {
    pending: Vec<String>,
    target: Vec<String>,
    fail: Vec<String>,
    delay: Duration,
    min_interval: Duration,
    timeout: Duration,
}

impl PollSpec {
    /// Creates a spec with the given target labels, no delay, a 1s
    /// minimum interval and a 5 minute timeout.
    pub fn new<I, S>(target: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            pending: Vec::new(),
            target: target.into_iter().map(Into::into).collect(),
            fail: Vec::new(),
            delay: Duration::ZERO,
            min_interval: Duration::from_secs(1),
            timeout: Duration::from_secs(300),
        }
    }

    /// Sets the expected intermediate labels.
    pub fn pending<I, S>(mut self, labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.pending = labels.into_iter().map(Into::into).collect();
        self
    }

    /// Sets the terminal failure labels.
    pub fn fail<I, S>(mut self, labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fail = labels.into_iter().map(Into::into).collect();
        self
    }

    /// Sets the initial delay before the first refresh.
    pub fn delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Sets the minimum interval between refreshes.
    pub fn min_interval(mut self, min_interval: Duration) -> Self {
        self.min_interval = min_interval;
        self
    }

    /// Sets the overall timeout (counted from the start of the wait,
    /// initial delay included).
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Blocks until `refresh` reports a target label.
///
/// After the initial delay, `refresh` is invoked at intervals no shorter
/// than the spec's minimum: a target label succeeds with the snapshot, a
/// fail label or a refresh error fails immediately, anything else keeps
/// waiting. Elapsing the timeout fails with [`ConvergeError::PollTimeout`].
///
/// `refresh` must fold any "object mid-transition" signal into the label
/// it returns, so a resource reporting a target status prematurely is
/// still treated as pending.
pub fn wait_for<S, F>(spec: &PollSpec, mut refresh: F) -> ConvergeResult<S>
where
    F: FnMut() -> ConvergeResult<(S, String)>,
{
    let started = Instant::now();
    if !spec.delay.is_zero() {
        thread::sleep(spec.delay);
    }

    loop {
        let attempt_started = Instant::now();
        let (snapshot, label) = refresh()?;

        if spec.target.iter().any(|t| *t == label) {
            debug!(%label, elapsed = ?started.elapsed(), "target status reached");
            return Ok(snapshot);
        }
        if spec.fail.iter().any(|f| *f == label) {
            return Err(ConvergeError::PollFailState { label });
        }
        if !spec.pending.iter().any(|p| *p == label) {
            debug!(%label, "unexpected status, still waiting");
        }

        if started.elapsed() >= spec.timeout {
            return Err(ConvergeError::PollTimeout {
                elapsed: started.elapsed(),
                last: label,
            });
        }

        trace!(%label, "still pending");
        let spent = attempt_started.elapsed();
        if spent < spec.min_interval {
            thread::sleep(spec.min_interval - spent);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn fast_spec() -> PollSpec {
        PollSpec::new(["running"])
            .pending(["provisioning"])
            .fail(["error"])
            .min_interval(Duration::from_millis(1))
            .timeout(Duration::from_secs(5))
    }

    fn scripted<'a>(
        labels: &'a [&'static str],
    ) -> impl FnMut() -> ConvergeResult<(u32, String)> + 'a {
        let mut calls = 0usize;
        move || {
            let label = labels[calls.min(labels.len() - 1)];
            calls += 1;
            Ok((calls as u32, label.to_string()))
        }
    }

    #[test]
    fn test_succeeds_on_third_refresh() {
        let snapshot = wait_for(
            &fast_spec(),
            scripted(&["provisioning", "provisioning", "running"]),
        )
        .unwrap();
        assert_eq!(snapshot, 3);
    }

    #[test]
    fn test_fail_label_returns_immediately() {
        let started = Instant::now();
        let err = wait_for(&fast_spec(), scripted(&["provisioning", "error"])).unwrap_err();

        assert!(matches!(err, ConvergeError::PollFailState { ref label } if label == "error"));
        // Did not wait out the 5s timeout.
        assert!(started.elapsed() < Duration::from_secs(1));
    }

    #[test]
    fn test_refresh_error_propagates() {
        let err = wait_for(&fast_spec(), || {
            Err::<(u32, String), _>(ConvergeError::remote("describe", "reset"))
        })
        .unwrap_err();
        assert!(matches!(err, ConvergeError::Remote { .. }));
    }

    #[test]
    fn test_unknown_label_is_still_pending() {
        let snapshot =
            wait_for(&fast_spec(), scripted(&["migrating", "running"])).unwrap();
        assert_eq!(snapshot, 2);
    }

    #[test]
    fn test_timeout() {
        let spec = fast_spec().timeout(Duration::from_millis(20));
        let err = wait_for(&spec, scripted(&["provisioning"])).unwrap_err();

        assert!(
            matches!(err, ConvergeError::PollTimeout { ref last, .. } if last == "provisioning")
        );
    }
}
