//! Cultural sub-analysis: context level, nuances, then adaptation suggestions.

use crate::error::{AnalysisError, ProviderError};
use crate::normalizer::{normalize, AdaptationsResponse, NuancesResponse, PARSED_CONFIDENCE};
use crate::prompts::{build_prompt, PromptKind};
use crate::provider::ProviderGateway;
use crate::types::{AnalysisRequest, ContextLevel, CulturalAnalysis, Suggestion, SuggestionType};

/// Source cultures treated as high-context (compared lowercase).
pub const HIGH_CONTEXT_CULTURES: [&str; 4] = ["japanese", "chinese", "korean", "arab"];

pub fn context_level(culture: &str) -> ContextLevel {
    let lowered = culture.trim().to_lowercase();
    if HIGH_CONTEXT_CULTURES.contains(&lowered.as_str()) {
        ContextLevel::High
    } else {
        ContextLevel::Low
    }
}

/// Substitutes used when the adaptations call fails.
fn default_adaptations() -> Vec<Suggestion> {
    vec![
        Suggestion::new(
            SuggestionType::Cultural,
            "Consider cultural differences",
            1,
            "Default cultural consideration",
        ),
        Suggestion::new(
            SuggestionType::Cultural,
            "Adapt communication style",
            1,
            "Default adaptation suggestion",
        ),
    ]
}

#[derive(Clone)]
pub struct CulturalAnalyzer {
    gateway: ProviderGateway,
}

impl CulturalAnalyzer {
    pub fn new(gateway: ProviderGateway) -> Self {
        Self { gateway }
    }

    /// Two provider calls. A failure of the first is returned; a failure of the
    /// second is replaced by static suggestions.
    pub async fn analyze(&self, request: &AnalysisRequest) -> Result<CulturalAnalysis, AnalysisError> {
        request.validate()?;

        let context_level = context_level(&request.source_culture);

        let prompt = build_prompt(PromptKind::Nuances, request, None);
        let raw = self
            .gateway
            .call(&prompt.system, &prompt.user, request.model)
            .await?;
        let nuances: NuancesResponse = normalize(&raw);

        let partial = serde_json::json!({
            "contextLevel": context_level,
            "implicitMeanings": nuances.implicit_meanings,
            "culturalNuances": nuances.cultural_nuances,
            "adaptationNeeded": true,
            "confidence": PARSED_CONFIDENCE,
        });
        let adaptation_suggestions = self.adaptations(request, &partial).await;

        Ok(CulturalAnalysis {
            context_level,
            implicit_meanings: nuances.implicit_meanings,
            cultural_nuances: nuances.cultural_nuances,
            adaptation_needed: true,
            adaptation_suggestions,
            confidence: PARSED_CONFIDENCE,
            key_insights: nuances.key_insights,
        })
    }

    async fn adaptations(&self, request: &AnalysisRequest, partial: &serde_json::Value) -> Vec<Suggestion> {
        let prompt = build_prompt(PromptKind::Adaptations, request, Some(partial));
        match self.gateway.call(&prompt.system, &prompt.user, request.model).await {
            Ok(raw) => {
                let parsed: AdaptationsResponse = normalize(&raw);
                let from_text = parsed.from_text;
                let reasoning = format!("Generated from cultural analysis using {}", request.model);
                parsed
                    .suggestions
                    .into_iter()
                    .map(|mut s| {
                        s.kind = SuggestionType::Cultural;
                        if from_text && s.reasoning.is_empty() {
                            s.reasoning = reasoning.clone();
                        }
                        s
                    })
                    .collect()
            }
            Err(e) => {
                log_adaptation_failure(&e, request);
                default_adaptations()
            }
        }
    }
}

fn log_adaptation_failure(e: &ProviderError, request: &AnalysisRequest) {
    tracing::warn!(
        target: "parley::cultural",
        model = %request.model,
        error = %e,
        "adaptations call failed; using default suggestions"
    );
}
