//! Per-request observations. Events are emitted, never retained.

use crate::types::{CommunicationStyle, ContextLevel, EmotionalLevel, ModelProvider};
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Which half of the analysis an event is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Branch {
    Cultural,
    Gender,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum Observation {
    CulturalAssessed {
        source_culture: String,
        context_level: ContextLevel,
        nuances: usize,
        suggestions: usize,
    },
    GenderAssessed {
        source_gender: String,
        style: CommunicationStyle,
        level: EmotionalLevel,
        heuristic: bool,
    },
    FallbackApplied {
        branch: Branch,
        reason: String,
    },
    ResultSynthesized {
        model: ModelProvider,
        confidence: f64,
        suggestions: usize,
        degraded: bool,
    },
}

/// Timestamped wrapper handed to sinks.
#[derive(Debug, Clone, Serialize)]
pub struct ObservationRecord {
    pub at: DateTime<Utc>,
    #[serde(flatten)]
    pub observation: Observation,
}

impl ObservationRecord {
    pub fn now(observation: Observation) -> Self {
        Self {
            at: Utc::now(),
            observation,
        }
    }
}

/// Receiver for analysis events. Implementations must not block.
pub trait ObservationSink: Send + Sync {
    fn record(&self, record: ObservationRecord);
}

/// Writes every observation as a structured `tracing` event.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl ObservationSink for TracingSink {
    fn record(&self, record: ObservationRecord) {
        let at = record.at.to_rfc3339();
        match record.observation {
            Observation::CulturalAssessed {
                source_culture,
                context_level,
                nuances,
                suggestions,
            } => tracing::info!(
                target: "parley::observation",
                %at,
                source_culture = %source_culture,
                context_level = ?context_level,
                nuances,
                suggestions,
                "cultural assessed"
            ),
            Observation::GenderAssessed {
                source_gender,
                style,
                level,
                heuristic,
            } => tracing::info!(
                target: "parley::observation",
                %at,
                source_gender = %source_gender,
                style = ?style,
                level = ?level,
                heuristic,
                "gender assessed"
            ),
            Observation::FallbackApplied { branch, reason } => tracing::warn!(
                target: "parley::observation",
                %at,
                branch = ?branch,
                reason = %reason,
                "fallback applied"
            ),
            Observation::ResultSynthesized {
                model,
                confidence,
                suggestions,
                degraded,
            } => tracing::info!(
                target: "parley::observation",
                %at,
                model = %model,
                confidence,
                suggestions,
                degraded,
                "result synthesized"
            ),
        }
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use std::sync::Mutex;

    /// Collects observations for assertions.
    #[derive(Default)]
    pub struct CollectingSink {
        pub records: Mutex<Vec<Observation>>,
    }

    impl CollectingSink {
        pub fn observations(&self) -> Vec<Observation> {
            self.records.lock().unwrap().clone()
        }
    }

    impl ObservationSink for CollectingSink {
        fn record(&self, record: ObservationRecord) {
            self.records.lock().unwrap().push(record.observation);
        }
    }
}
