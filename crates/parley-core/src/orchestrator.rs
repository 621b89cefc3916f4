//! Communicator: runs both sub-analyses and guarantees a well-formed result.
//!
//! Tier 1 replaces a failed sub-analysis with its static fallback. Tier 2 replaces a
//! synthesized result that breaks the shape invariant, or a synthesis that panics,
//! with [`AnalysisResult::error`].
//! Only a [`ValidationError`] ever reaches the caller.

use crate::cultural::CulturalAnalyzer;
use crate::error::{AnalysisError, ValidationError};
use crate::gender::GenderAnalyzer;
use crate::observation::{Branch, Observation, ObservationRecord, ObservationSink};
use crate::provider::ProviderGateway;
use crate::synthesizer::synthesize;
use crate::types::{AnalysisRequest, AnalysisResult, CulturalAnalysis, GenderAnalysis};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

type Synthesizer = fn(CulturalAnalysis, GenderAnalysis) -> AnalysisResult;

#[derive(Clone)]
pub struct Communicator {
    cultural: CulturalAnalyzer,
    gender: GenderAnalyzer,
    synthesizer: Synthesizer,
    sink: Option<Arc<dyn ObservationSink>>,
}

impl Communicator {
    pub fn new(gateway: ProviderGateway) -> Self {
        Self {
            cultural: CulturalAnalyzer::new(gateway.clone()),
            gender: GenderAnalyzer::new(gateway),
            synthesizer: synthesize,
            sink: None,
        }
    }

    #[cfg(test)]
    fn with_synthesizer(mut self, synthesizer: Synthesizer) -> Self {
        self.synthesizer = synthesizer;
        self
    }

    pub fn with_sink(mut self, sink: Arc<dyn ObservationSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    fn observe(&self, observation: Observation) {
        if let Some(sink) = &self.sink {
            sink.record(ObservationRecord::now(observation));
        }
    }

    pub async fn process(&self, request: &AnalysisRequest) -> Result<AnalysisResult, ValidationError> {
        request.validate()?;

        let (cultural, gender) = tokio::join!(
            self.cultural.analyze(request),
            self.gender.analyze_traced(request)
        );
        let mut degraded = false;

        let cultural = match cultural {
            Ok(c) => {
                self.observe(Observation::CulturalAssessed {
                    source_culture: request.source_culture.clone(),
                    context_level: c.context_level,
                    nuances: c.cultural_nuances.len(),
                    suggestions: c.adaptation_suggestions.len(),
                });
                c
            }
            Err(e) => {
                degraded = true;
                self.fallback(Branch::Cultural, &e);
                CulturalAnalysis::fallback()
            }
        };

        let gender = match gender {
            Ok((g, heuristic)) => {
                self.observe(Observation::GenderAssessed {
                    source_gender: request.source_gender.clone(),
                    style: g.communication_style.style,
                    level: g.emotional_expression.level,
                    heuristic,
                });
                g
            }
            Err(e) => {
                degraded = true;
                self.fallback(Branch::Gender, &e);
                GenderAnalysis::fallback()
            }
        };

        let synthesizer = self.synthesizer;
        let result = match catch_unwind(AssertUnwindSafe(move || synthesizer(cultural, gender))) {
            Ok(result) if result.is_well_formed() => result,
            Ok(result) => {
                tracing::error!(
                    target: "parley::orchestrator",
                    model = %request.model,
                    confidence = result.confidence,
                    "synthesized result violates shape invariant; returning error analysis"
                );
                degraded = true;
                AnalysisResult::error()
            }
            Err(_) => {
                tracing::error!(
                    target: "parley::orchestrator",
                    model = %request.model,
                    "synthesis panicked; returning error analysis"
                );
                degraded = true;
                AnalysisResult::error()
            }
        };

        self.observe(Observation::ResultSynthesized {
            model: request.model,
            confidence: result.confidence,
            suggestions: result.suggestions.len(),
            degraded,
        });
        tracing::info!(
            target: "parley::orchestrator",
            model = %request.model,
            confidence = result.confidence,
            degraded,
            "analysis complete"
        );
        Ok(result)
    }

    fn fallback(&self, branch: Branch, e: &AnalysisError) {
        tracing::warn!(target: "parley::orchestrator", ?branch, error = %e, "sub-analysis failed; applying fallback");
        self.observe(Observation::FallbackApplied {
            branch,
            reason: e.to_string(),
        });
    }
}
