//! Logging-based progress handler

use super::{ProgressEvent, ProgressHandler};
use tracing::{debug, info, warn};

/// Handler that logs progress events using tracing
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingHandler;

impl ProgressHandler for LoggingHandler {
    fn on_progress(&self, event: &ProgressEvent) {
        match event {
            ProgressEvent::StepStarted { step, label, job } => {
                info!(step, label, job = %job, "Starting step");
            }
            ProgressEvent::PointerUpdated { step, persisted } => {
                if *persisted {
                    debug!(step, "Step pointer updated");
                } else {
                    warn!(step, "Step pointer not persisted");
                }
            }
            ProgressEvent::LlmRequestStarted { phase } => {
                debug!(phase, "Sending request to LLM");
            }
            ProgressEvent::LlmResponseReceived {
                phase,
                response_time,
            } => {
                debug!(
                    phase,
                    response_time_ms = response_time.as_millis() as u64,
                    "Received LLM response"
                );
            }
            ProgressEvent::FallbackUsed {
                phase,
                method,
                reason,
            } => {
                warn!(phase, method = %method, reason = %reason, "Parser fallback used");
            }
            ProgressEvent::RenderDispatched {
                products,
                total_price,
            } => {
                info!(products, total_price, "Estimate dispatched for rendering");
            }
            ProgressEvent::StepCompleted { step, duration } => {
                info!(
                    step,
                    duration_ms = duration.as_millis() as u64,
                    "Step complete"
                );
            }
            ProgressEvent::StepFailed { step, error } => {
                warn!(step, error = %error, "Step failed");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_logging_handler_accepts_all_events() {
        let handler = LoggingHandler;
        let events = vec![
            ProgressEvent::StepStarted {
                step: 3,
                label: "parts_breakdown",
                job: "agent_job/a".to_string(),
            },
            ProgressEvent::PointerUpdated {
                step: 3,
                persisted: false,
            },
            ProgressEvent::FallbackUsed {
                phase: "parts_breakdown",
                method: "placeholder".to_string(),
                reason: "no JSON".to_string(),
            },
            ProgressEvent::RenderDispatched {
                products: 2,
                total_price: 71600,
            },
            ProgressEvent::StepCompleted {
                step: 3,
                duration: Duration::from_millis(5),
            },
        ];
        for event in &events {
            handler.on_progress(event);
        }
    }
}
