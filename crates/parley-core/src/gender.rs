//! Gender sub-analysis: communication dynamics, then suggested adjustments.
//!
//! Unlike the cultural branch, a failed dynamics call does not fail the analysis: the
//! local word-count heuristics stand in for the model and the result carries
//! confidence 0.5.

use crate::error::{AnalysisError, ProviderError};
use crate::heuristics;
use crate::normalizer::{
    normalize, try_normalize, GenderResponse, GenderSuggestionsResponse, PARSED_CONFIDENCE,
};
use crate::prompts::{build_prompt, PromptKind};
use crate::provider::ProviderGateway;
use crate::types::{
    AnalysisRequest, EmotionalAssessment, GenderAnalysis, Recommendation, StyleAssessment,
    Suggestion, SuggestionType,
};

/// Confidence of the heuristic path.
pub const HEURISTIC_CONFIDENCE: f64 = 0.5;

const HEURISTIC_CONSIDERATIONS: &str = "Unable to perform detailed gender analysis.";

/// Dynamics from either the model or the local heuristics.
#[derive(Debug, Clone, PartialEq)]
pub struct GenderDynamics {
    pub communication_style: StyleAssessment,
    pub emotional_expression: EmotionalAssessment,
    pub gender_considerations: String,
    pub recommendations: Vec<Recommendation>,
    pub confidence: f64,
    pub heuristic: bool,
}

impl GenderDynamics {
    fn from_response(resp: GenderResponse) -> Self {
        Self {
            gender_considerations: resp.considerations().to_string(),
            confidence: resp.confidence.unwrap_or(PARSED_CONFIDENCE),
            communication_style: resp.communication_style,
            emotional_expression: resp.emotional_expression,
            recommendations: resp.recommendations,
            heuristic: false,
        }
    }

    /// Local fallback computed from the message text alone.
    pub fn heuristic(message: &str) -> Self {
        Self {
            communication_style: StyleAssessment {
                style: heuristics::communication_style(message),
                explanation: "Estimated from directive and reflective word counts".to_string(),
            },
            emotional_expression: EmotionalAssessment {
                level: heuristics::emotional_level(message),
                explanation: "Estimated from emotion word counts".to_string(),
            },
            gender_considerations: HEURISTIC_CONSIDERATIONS.to_string(),
            recommendations: Vec::new(),
            confidence: HEURISTIC_CONFIDENCE,
            heuristic: true,
        }
    }

    /// Context passed to the suggestions prompt.
    fn as_context(&self) -> serde_json::Value {
        serde_json::json!({
            "communicationStyle": self.communication_style,
            "emotionalExpression": self.emotional_expression,
            "genderConsiderations": self.gender_considerations,
        })
    }
}

#[derive(Clone)]
pub struct GenderAnalyzer {
    gateway: ProviderGateway,
}

impl GenderAnalyzer {
    pub fn new(gateway: ProviderGateway) -> Self {
        Self { gateway }
    }

    /// Only a validation failure is returned as an error; provider failures are absorbed here.
    pub async fn analyze(&self, request: &AnalysisRequest) -> Result<GenderAnalysis, AnalysisError> {
        self.analyze_traced(request).await.map(|(analysis, _)| analysis)
    }

    /// As [`analyze`](Self::analyze), also reporting whether the heuristics stood in for the model.
    pub async fn analyze_traced(
        &self,
        request: &AnalysisRequest,
    ) -> Result<(GenderAnalysis, bool), AnalysisError> {
        request.validate()?;

        let dynamics = self.assess(request).await;
        let suggested_adjustments = self.suggestions(request, &dynamics).await;

        let analysis = GenderAnalysis {
            gender_considerations: dynamics.gender_considerations,
            communication_style: dynamics.communication_style,
            emotional_expression: dynamics.emotional_expression,
            recommendations: dynamics.recommendations,
            suggested_adjustments,
            confidence: dynamics.confidence,
        };
        Ok((analysis, dynamics.heuristic))
    }

    /// Dynamics from the model, or the heuristics when the call fails or the
    /// reply is not JSON.
    pub async fn assess(&self, request: &AnalysisRequest) -> GenderDynamics {
        let prompt = build_prompt(PromptKind::Gender, request, None);
        match self.gateway.call(&prompt.system, &prompt.user, request.model).await {
            Ok(raw) => match try_normalize::<GenderResponse>(&raw) {
                Some(resp) => GenderDynamics::from_response(resp),
                None => {
                    tracing::warn!(
                        target: "parley::gender",
                        model = %request.model,
                        "gender assessment reply was not JSON; using local heuristics"
                    );
                    GenderDynamics::heuristic(&request.message)
                }
            },
            Err(e) => {
                match &e {
                    ProviderError::RateLimited { retry_after_secs } => tracing::warn!(
                        target: "parley::gender",
                        model = %request.model,
                        retry_after_secs,
                        "gender assessment rate limited; using local heuristics"
                    ),
                    ProviderError::InternalError(msg) => tracing::warn!(
                        target: "parley::gender",
                        model = %request.model,
                        error = %msg,
                        "gender assessment failed upstream; using local heuristics"
                    ),
                    ProviderError::Transport(msg) => tracing::warn!(
                        target: "parley::gender",
                        model = %request.model,
                        error = %msg,
                        "gender assessment unreachable; using local heuristics"
                    ),
                }
                GenderDynamics::heuristic(&request.message)
            }
        }
    }

    async fn suggestions(&self, request: &AnalysisRequest, dynamics: &GenderDynamics) -> Vec<Suggestion> {
        let context = dynamics.as_context();
        let prompt = build_prompt(PromptKind::GenderSuggestions, request, Some(&context));
        match self.gateway.call(&prompt.system, &prompt.user, request.model).await {
            Ok(raw) => normalize::<GenderSuggestionsResponse>(&raw).suggestions,
            Err(e) => {
                tracing::warn!(target: "parley::gender", model = %request.model, error = %e, "gender suggestions call failed");
                vec![suggestion_failure(&e, request)]
            }
        }
    }
}

/// Single suggestion describing a failed suggestions call.
fn suggestion_failure(e: &ProviderError, request: &AnalysisRequest) -> Suggestion {
    if e.is_http_status() {
        Suggestion::new(
            SuggestionType::Gender,
            format!("Unable to process gender suggestions using {}", request.model),
            1,
            "API request failed",
        )
    } else {
        Suggestion::new(
            SuggestionType::Gender,
            format!("Unable to generate specific gender suggestions using {}", request.model),
            1,
            "Error during suggestion generation",
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::testing::{gateway, ScriptedBackend};
    use crate::types::{CommunicationStyle, EmotionalLevel, ModelProvider};
    use std::sync::Arc;

    fn request(message: &str) -> AnalysisRequest {
        AnalysisRequest::new(message, "Korean", "American", "male", "female", ModelProvider::MetaLlama)
    }

    const DYNAMICS: &str = r#"{"genderAnalysis":{
        "communicationStyle":{"style":"indirect","explanation":"Hedged phrasing"},
        "emotionalExpression":{"level":"low","explanation":"Neutral"},
        "recommendations":[{"focus":"tone","suggestion":"Be explicit","reasoning":"clarity"}]},
        "confidence":0.9}"#;

    #[tokio::test]
    async fn model_path_uses_reported_confidence() {
        let backend = Arc::new(ScriptedBackend::new(vec![
            Ok(DYNAMICS.into()),
            Ok(r#"{"genderAnalysis":{"recommendations":[{"suggestion":"Be explicit","reasoning":"clarity"}]}}"#.into()),
        ]));
        let out = GenderAnalyzer::new(gateway(backend.clone()))
            .analyze(&request("Maybe we could try later?"))
            .await
            .unwrap();
        assert_eq!(out.confidence, 0.9);
        assert_eq!(out.gender_considerations, "Hedged phrasing");
        assert_eq!(out.communication_style.style, CommunicationStyle::Indirect);
        assert_eq!(out.recommendations.len(), 1);
        assert_eq!(out.suggested_adjustments[0].content, "Be explicit");
        assert_eq!(out.suggested_adjustments[0].kind, SuggestionType::Gender);
        assert!(backend.user_prompts()[1].contains("Hedged phrasing"));
    }

    #[tokio::test]
    async fn missing_confidence_defaults_to_parsed_value() {
        let backend = Arc::new(ScriptedBackend::new(vec![
            Ok(r#"{"genderAnalysis":{}}"#.into()),
            Ok("{}".into()),
        ]));
        let out = GenderAnalyzer::new(gateway(backend))
            .analyze(&request("hello"))
            .await
            .unwrap();
        assert_eq!(out.confidence, 0.8);
        assert_eq!(out.suggested_adjustments[0].content, "No suggestions available");
    }

    #[tokio::test]
    async fn provider_failure_falls_back_to_heuristics() {
        let backend = Arc::new(ScriptedBackend::failing(ProviderError::Transport("eof".into())));
        let out = GenderAnalyzer::new(gateway(backend.clone()))
            .analyze(&request("I need this done now"))
            .await
            .unwrap();
        assert_eq!(backend.calls(), 2);
        assert_eq!(out.confidence, 0.5);
        assert_eq!(out.gender_considerations, "Unable to perform detailed gender analysis.");
        assert_eq!(out.communication_style.style, CommunicationStyle::Direct);
        assert_eq!(out.emotional_expression.level, EmotionalLevel::Low);
        assert_eq!(
            out.suggested_adjustments[0].content,
            "Unable to generate specific gender suggestions using metaLlama"
        );
        assert_eq!(out.suggested_adjustments[0].reasoning, "Error during suggestion generation");
    }

    #[tokio::test]
    async fn non_json_dynamics_reply_uses_heuristics() {
        let backend = Arc::new(ScriptedBackend::new(vec![
            Ok("Sorry, I cannot help with that.".into()),
            Ok("{}".into()),
        ]));
        let (out, heuristic) = GenderAnalyzer::new(gateway(backend.clone()))
            .analyze_traced(&request("I feel worried"))
            .await
            .unwrap();
        assert!(heuristic);
        assert_eq!(out.confidence, 0.5);
        assert_eq!(out.gender_considerations, "Unable to perform detailed gender analysis.");
        assert_eq!(out.communication_style.style, CommunicationStyle::Emotional);
        assert!(backend.user_prompts()[1].contains("Unable to perform detailed gender analysis."));
    }

    #[tokio::test]
    async fn http_failure_on_suggestions_is_api_failure() {
        let backend = Arc::new(ScriptedBackend::new(vec![
            Ok(DYNAMICS.into()),
            Err(ProviderError::RateLimited { retry_after_secs: 30 }),
        ]));
        let out = GenderAnalyzer::new(gateway(backend))
            .analyze(&request("hi"))
            .await
            .unwrap();
        assert_eq!(out.suggested_adjustments.len(), 1);
        assert_eq!(
            out.suggested_adjustments[0].content,
            "Unable to process gender suggestions using metaLlama"
        );
        assert_eq!(out.suggested_adjustments[0].reasoning, "API request failed");
    }

    #[tokio::test]
    async fn missing_gender_is_rejected_before_any_call() {
        let backend = Arc::new(ScriptedBackend::new(Vec::new()));
        let req = AnalysisRequest::new("hi", "Korean", "American", "male", "", ModelProvider::OpenAi);
        let err = GenderAnalyzer::new(gateway(backend.clone())).analyze(&req).await.unwrap_err();
        assert!(matches!(err, AnalysisError::Validation(_)));
        assert_eq!(backend.calls(), 0);
    }
}
