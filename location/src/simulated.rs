//! Scripted location source for tests and demos.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use crate::{Fix, LocationDelegate, LocationError, LocationResult, LocationSource, UpdateConfig};

/// A call recorded by a [`SimulatedSource`], in arrival order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceCall {
    /// `configure` was invoked.
    Configure,
    /// `start_updates` was invoked.
    Start,
    /// `stop_updates` was invoked.
    Stop,
    /// `request_fix` was invoked.
    RequestFix,
}

/// An in-memory [`LocationSource`] driven by the test instead of hardware.
///
/// The source records every trait call so tests can assert on the
/// duty-cycle sequence, and delivers whatever the test scripts through
/// [`emit`](Self::emit) and [`fail`](Self::fail). Deliveries are pushed
/// through the delegate whether or not the source is currently sensing: a
/// real platform keeps delivering fixes that were in flight when sensing
/// stopped, and the simulation preserves that.
#[derive(Default)]
pub struct SimulatedSource {
    delegate: Mutex<Option<Arc<dyn LocationDelegate>>>,
    sensing: AtomicBool,
    config: Mutex<Option<UpdateConfig>>,
    calls: Mutex<Vec<SourceCall>>,
}

impl SimulatedSource {
    /// A fresh source with no delegate and sensing off.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Deliver a batch of fixes to the delegate.
    pub fn emit(&self, fixes: &[Fix]) {
        let delegate = self
            .delegate
            .lock()
            .expect("delegate mutex poisoned")
            .clone();
        if let Some(delegate) = delegate {
            delegate.on_update(fixes);
        }
    }

    /// Deliver an acquisition failure to the delegate.
    pub fn fail(&self, error: &LocationError) {
        let delegate = self
            .delegate
            .lock()
            .expect("delegate mutex poisoned")
            .clone();
        if let Some(delegate) = delegate {
            delegate.on_failure(error);
        }
    }

    /// Whether the source is currently between `start_updates` and
    /// `stop_updates`.
    #[must_use]
    pub fn is_sensing(&self) -> bool {
        self.sensing.load(Ordering::SeqCst)
    }

    /// The configuration last applied through `configure`, if any.
    #[must_use]
    pub fn config(&self) -> Option<UpdateConfig> {
        self.config.lock().expect("config mutex poisoned").clone()
    }

    /// Every trait call seen so far, oldest first.
    #[must_use]
    pub fn calls(&self) -> Vec<SourceCall> {
        self.calls.lock().expect("calls mutex poisoned").clone()
    }

    fn record(&self, call: SourceCall) {
        self.calls.lock().expect("calls mutex poisoned").push(call);
    }
}

impl fmt::Debug for SimulatedSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SimulatedSource")
            .field("sensing", &self.is_sensing())
            .finish()
    }
}

impl LocationSource for SimulatedSource {
    fn configure(&self, config: UpdateConfig) -> LocationResult<()> {
        self.record(SourceCall::Configure);
        *self.config.lock().expect("config mutex poisoned") = Some(config);
        Ok(())
    }

    fn set_delegate(&self, delegate: Arc<dyn LocationDelegate>) {
        *self.delegate.lock().expect("delegate mutex poisoned") = Some(delegate);
    }

    fn start_updates(&self) -> LocationResult<()> {
        self.record(SourceCall::Start);
        self.sensing.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn stop_updates(&self) {
        self.record(SourceCall::Stop);
        self.sensing.store(false, Ordering::SeqCst);
    }

    fn request_fix(&self) -> LocationResult<()> {
        self.record(SourceCall::RequestFix);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Recording {
        batches: Mutex<Vec<Vec<Fix>>>,
        failures: Mutex<Vec<LocationError>>,
    }

    impl LocationDelegate for Recording {
        fn on_update(&self, fixes: &[Fix]) {
            self.batches
                .lock()
                .expect("batches mutex poisoned")
                .push(fixes.to_vec());
        }

        fn on_failure(&self, error: &LocationError) {
            self.failures
                .lock()
                .expect("failures mutex poisoned")
                .push(error.clone());
        }
    }

    #[test]
    fn records_call_sequence() {
        let source = SimulatedSource::new();
        source.configure(UpdateConfig::default()).unwrap();
        source.start_updates().unwrap();
        source.stop_updates();
        source.request_fix().unwrap();
        assert_eq!(
            source.calls(),
            vec![
                SourceCall::Configure,
                SourceCall::Start,
                SourceCall::Stop,
                SourceCall::RequestFix,
            ]
        );
    }

    #[test]
    fn delivers_even_when_not_sensing() {
        let source = SimulatedSource::new();
        let delegate = Arc::new(Recording::default());
        source.set_delegate(delegate.clone());

        source.start_updates().unwrap();
        source.stop_updates();
        assert!(!source.is_sensing());

        // The in-flight fix still lands after sensing stops.
        source.emit(&[Fix::new(1.0, 2.0)]);
        assert_eq!(delegate.batches.lock().unwrap().len(), 1);
    }

    #[test]
    fn forwards_failures() {
        let source = SimulatedSource::new();
        let delegate = Arc::new(Recording::default());
        source.set_delegate(delegate.clone());
        source.fail(&LocationError::NotAvailable);
        assert_eq!(delegate.failures.lock().unwrap().len(), 1);
    }
}
