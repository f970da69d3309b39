//! Progress handler trait and events

use std::time::Duration;

/// Events emitted while one step runs
#[derive(Debug, Clone)]
pub enum ProgressEvent {
    /// Step invocation started
    StepStarted {
        step: u8,
        label: &'static str,
        job: String,
    },

    /// `currentStep` pointer written (or not)
    PointerUpdated { step: u8, persisted: bool },

    /// LLM request started
    LlmRequestStarted { phase: &'static str },

    /// LLM response received
    LlmResponseReceived {
        phase: &'static str,
        response_time: Duration,
    },

    /// Parser fell back to marker extraction or a placeholder
    FallbackUsed {
        phase: &'static str,
        method: String,
        reason: String,
    },

    /// Estimate sent to the rendering service
    RenderDispatched { products: usize, total_price: i64 },

    /// Step finished and its output was persisted
    StepCompleted { step: u8, duration: Duration },

    /// Step failed
    StepFailed { step: u8, error: String },
}

/// Trait for handling progress events during a step run
pub trait ProgressHandler: Send + Sync {
    /// Called when a progress event occurs
    fn on_progress(&self, event: &ProgressEvent);
}

/// No-op handler that ignores all events
#[derive(Debug, Default, Clone, Copy)]
pub struct NoOpHandler;

impl ProgressHandler for NoOpHandler {
    fn on_progress(&self, _event: &ProgressEvent) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct CountingHandler {
        count: Arc<AtomicUsize>,
    }

    impl ProgressHandler for CountingHandler {
        fn on_progress(&self, _event: &ProgressEvent) {
            self.count.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn test_noop_handler() {
        NoOpHandler.on_progress(&ProgressEvent::StepStarted {
            step: 1,
            label: "acquisition",
            job: "agent_job/doc".to_string(),
        });
    }

    #[test]
    fn test_progress_events() {
        let count = Arc::new(AtomicUsize::new(0));
        let handler = CountingHandler {
            count: count.clone(),
        };

        handler.on_progress(&ProgressEvent::PointerUpdated {
            step: 2,
            persisted: true,
        });
        handler.on_progress(&ProgressEvent::LlmRequestStarted {
            phase: "product_identification",
        });
        handler.on_progress(&ProgressEvent::StepCompleted {
            step: 2,
            duration: Duration::from_millis(40),
        });

        assert_eq!(count.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn test_event_debug() {
        let event = ProgressEvent::StepFailed {
            step: 4,
            error: "missing step3_output".to_string(),
        };
        let debug_str = format!("{:?}", event);
        assert!(debug_str.contains("StepFailed"));
        assert!(debug_str.contains("step: 4"));
    }
}
