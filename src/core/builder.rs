use std::sync::Arc;

use tokio::runtime::Handle;

use super::config::TimerConfig;
use super::timer::{Listener, Timer};
use crate::{
    dispatch::{Dispatch, TokioDispatcher},
    error::RuntimeError,
    events::Bus,
    subscribers::{Subscribe, SubscriberSet},
};

/// Builder for constructing a [`Timer`] with optional features.
pub struct TimerBuilder {
    cfg: TimerConfig,
    subscribers: Vec<Arc<dyn Subscribe>>,
    runtime: Option<Handle>,
}

impl TimerBuilder {
    /// Creates a new builder with the given configuration.
    pub fn new(cfg: TimerConfig) -> Self {
        Self {
            cfg,
            subscribers: Vec::new(),
            runtime: None,
        }
    }

    /// Sets event subscribers for observability.
    ///
    /// Subscribers receive lifecycle events (scheduled, started, finished, cancelled)
    /// through dedicated workers with bounded queues.
    pub fn with_subscribers(mut self, subscribers: Vec<Arc<dyn Subscribe>>) -> Self {
        self.subscribers = subscribers;
        self
    }

    /// Uses `handle` instead of the runtime of the calling thread.
    ///
    /// Lets a timer be built (and used) from plain threads.
    pub fn with_runtime(mut self, handle: Handle) -> Self {
        self.runtime = Some(handle);
        self
    }

    /// Builds a timer on the default tokio engine.
    ///
    /// ### Errors
    /// [`RuntimeError::NoRuntime`] when no runtime was given and none is current.
    pub fn build(self) -> Result<Timer<TokioDispatcher>, RuntimeError> {
        let handle = self.resolve_runtime()?;
        let dispatcher = TokioDispatcher::new(handle.clone(), self.cfg.blocking_actions);
        Ok(self.assemble(dispatcher, Some(handle)))
    }

    /// Builds a timer on a custom dispatch engine.
    ///
    /// A runtime is only required when subscribers were configured (for the event listener).
    ///
    /// ### Errors
    /// [`RuntimeError::NoRuntime`] when subscribers need a runtime and none is available.
    pub fn build_with<D: Dispatch>(self, dispatcher: D) -> Result<Timer<D>, RuntimeError> {
        let handle = if self.subscribers.is_empty() {
            None
        } else {
            Some(self.resolve_runtime()?)
        };
        Ok(self.assemble(dispatcher, handle))
    }

    fn resolve_runtime(&self) -> Result<Handle, RuntimeError> {
        match &self.runtime {
            Some(h) => Ok(h.clone()),
            None => Handle::try_current().map_err(|_| RuntimeError::NoRuntime),
        }
    }

    fn assemble<D: Dispatch>(self, dispatcher: D, runtime: Option<Handle>) -> Timer<D> {
        let bus = Bus::new(self.cfg.bus_capacity_clamped());

        let listener = match runtime {
            Some(rt) if !self.subscribers.is_empty() => {
                let subs = SubscriberSet::new(self.subscribers, bus.clone(), &rt);
                Some(Listener::spawn(&bus, subs, &rt))
            }
            _ => None,
        };
        Timer::new_internal(dispatcher, bus, listener)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_build_outside_runtime_fails() {
        let err = TimerBuilder::new(TimerConfig::default()).build().unwrap_err();
        assert_eq!(err.as_label(), "runtime_missing");
    }

    #[test]
    fn test_explicit_runtime_from_plain_thread() {
        let rt = tokio::runtime::Builder::new_multi_thread()
            .enable_time()
            .build()
            .expect("runtime");
        let timer = TimerBuilder::new(TimerConfig::default())
            .with_runtime(rt.handle().clone())
            .build()
            .expect("explicit runtime");

        let h = timer.run_after(|| Ok::<_, String>(7), Duration::from_millis(5));
        assert_eq!(h.wait_blocking().ok(), Some(7));
    }

    #[test]
    fn test_custom_engine_without_subscribers_needs_no_runtime() {
        let rt = tokio::runtime::Builder::new_multi_thread()
            .enable_time()
            .build()
            .expect("runtime");
        let engine = TokioDispatcher::new(rt.handle().clone(), false);
        let timer = TimerBuilder::new(TimerConfig::default())
            .build_with(engine)
            .expect("no runtime needed");

        let h = timer.run_after(|| Ok::<_, String>("inline"), Duration::ZERO);
        assert_eq!(h.wait_blocking().ok(), Some("inline"));
    }
}
