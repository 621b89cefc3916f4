//! Analysis data model: the request, the two sub-analyses, and the merged result.
//!
//! Every type here serializes with camelCase keys so the JSON matches what the
//! browser client renders. Values are built fresh per request and never mutated
//! after construction.

use crate::error::ValidationError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// LLM backend selected by the caller. A pure routing key: no load balancing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ModelProvider {
    #[serde(rename = "openai")]
    OpenAi,
    #[serde(rename = "metaLlama")]
    MetaLlama,
}

impl ModelProvider {
    /// Wire identifier (`openai` / `metaLlama`).
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OpenAi => "openai",
            Self::MetaLlama => "metaLlama",
        }
    }

    /// Parse a model selector. Accepts `openai`, `metaLlama`, `meta-llama` and `llama`, any case.
    pub fn parse(raw: &str) -> Result<Self, ValidationError> {
        match raw.trim().to_lowercase().as_str() {
            "openai" => Ok(Self::OpenAi),
            "metallama" | "meta-llama" | "meta_llama" | "llama" => Ok(Self::MetaLlama),
            _ => Err(ValidationError::UnknownModel(raw.to_string())),
        }
    }
}

impl fmt::Display for ModelProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Wire body of `POST /analyze`. Every field is optional here so that a missing
/// field becomes a [`ValidationError`] instead of a deserialization failure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserMessage {
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub source_culture: Option<String>,
    #[serde(default)]
    pub target_culture: Option<String>,
    #[serde(default)]
    pub source_gender: Option<String>,
    #[serde(default)]
    pub target_gender: Option<String>,
}

/// A validated analysis request.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisRequest {
    pub message: String,
    pub source_culture: String,
    pub target_culture: String,
    pub source_gender: String,
    pub target_gender: String,
    pub model: ModelProvider,
}

impl AnalysisRequest {
    pub fn new(
        message: impl Into<String>,
        source_culture: impl Into<String>,
        target_culture: impl Into<String>,
        source_gender: impl Into<String>,
        target_gender: impl Into<String>,
        model: ModelProvider,
    ) -> Self {
        Self {
            message: message.into(),
            source_culture: source_culture.into(),
            target_culture: target_culture.into(),
            source_gender: source_gender.into(),
            target_gender: target_gender.into(),
            model,
        }
    }

    /// Both genders and both cultures must be non-blank before any provider call.
    /// Requests built with [`AnalysisRequest::new`] skip the wire-level checks, so this runs again.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.source_gender.trim().is_empty() || self.target_gender.trim().is_empty() {
            return Err(ValidationError::GenderRequired);
        }
        if self.source_culture.trim().is_empty() || self.target_culture.trim().is_empty() {
            return Err(ValidationError::CultureRequired);
        }
        Ok(())
    }
}

impl TryFrom<UserMessage> for AnalysisRequest {
    type Error = ValidationError;

    fn try_from(body: UserMessage) -> Result<Self, Self::Error> {
        fn required(value: Option<String>, field: &'static str) -> Result<String, ValidationError> {
            value
                .filter(|v| !v.trim().is_empty())
                .ok_or(ValidationError::MissingField(field))
        }

        let model = required(body.model, "model")?;
        Ok(Self {
            model: ModelProvider::parse(&model)?,
            message: required(body.text, "text")?,
            source_culture: required(body.source_culture, "sourceCulture")?,
            target_culture: required(body.target_culture, "targetCulture")?,
            source_gender: required(body.source_gender, "sourceGender")?,
            target_gender: required(body.target_gender, "targetGender")?,
        })
    }
}

// -----------------------------------------------------------------------------
// Enumerations
// -----------------------------------------------------------------------------

/// High-context cultures lean on implicit meaning; low-context ones on explicit wording.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContextLevel {
    High,
    #[default]
    Low,
}

impl ContextLevel {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_lowercase().as_str() {
            "high" => Some(Self::High),
            "low" => Some(Self::Low),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CommunicationStyle {
    #[default]
    Direct,
    Indirect,
    Emotional,
    Factual,
}

impl CommunicationStyle {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_lowercase().as_str() {
            "direct" => Some(Self::Direct),
            "indirect" => Some(Self::Indirect),
            "emotional" => Some(Self::Emotional),
            "factual" => Some(Self::Factual),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmotionalLevel {
    High,
    #[default]
    Moderate,
    Low,
}

impl EmotionalLevel {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_lowercase().as_str() {
            "high" => Some(Self::High),
            "moderate" | "medium" => Some(Self::Moderate),
            "low" => Some(Self::Low),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SuggestionType {
    Cultural,
    Gender,
    General,
}

impl SuggestionType {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_lowercase().as_str() {
            "cultural" => Some(Self::Cultural),
            "gender" => Some(Self::Gender),
            "general" => Some(Self::General),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InsightCategory {
    #[default]
    CommunicationStyle,
    Hierarchy,
    Values,
    GenderDynamics,
}

impl InsightCategory {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_lowercase().as_str() {
            "communication_style" => Some(Self::CommunicationStyle),
            "hierarchy" => Some(Self::Hierarchy),
            "values" => Some(Self::Values),
            "gender_dynamics" => Some(Self::GenderDynamics),
            _ => None,
        }
    }
}

// -----------------------------------------------------------------------------
// Structures
// -----------------------------------------------------------------------------

/// A single adaptation hint. Two suggestions are the same suggestion when their
/// `content` strings are equal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Suggestion {
    #[serde(rename = "type")]
    pub kind: SuggestionType,
    pub content: String,
    pub priority: u32,
    pub reasoning: String,
}

impl Suggestion {
    pub fn new(
        kind: SuggestionType,
        content: impl Into<String>,
        priority: u32,
        reasoning: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            content: content.into(),
            priority: priority.max(1),
            reasoning: reasoning.into(),
        }
    }

    /// Synthetic entry used wherever a non-empty list is required and nothing usable came back.
    pub fn placeholder(kind: SuggestionType, content: impl Into<String>) -> Self {
        Self::new(kind, content, 1, "Fallback suggestion")
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CulturalNuance {
    pub title: String,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeyInsight {
    pub id: u32,
    pub title: String,
    pub description: String,
    pub category: InsightCategory,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct StyleAssessment {
    pub style: CommunicationStyle,
    pub explanation: String,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct EmotionalAssessment {
    pub level: EmotionalLevel,
    pub explanation: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub focus: String,
    pub suggestion: String,
    pub reasoning: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CulturalAnalysis {
    pub context_level: ContextLevel,
    pub implicit_meanings: Vec<String>,
    pub cultural_nuances: Vec<CulturalNuance>,
    pub adaptation_needed: bool,
    pub adaptation_suggestions: Vec<Suggestion>,
    pub confidence: f64,
    pub key_insights: Vec<KeyInsight>,
}

impl CulturalAnalysis {
    /// Static substitute used by the cascade when the cultural branch fails.
    pub fn fallback() -> Self {
        Self {
            context_level: ContextLevel::Low,
            implicit_meanings: Vec::new(),
            cultural_nuances: vec![CulturalNuance {
                title: "Cultural Analysis Unavailable".to_string(),
                description: "Detailed cultural analysis could not be completed for this message."
                    .to_string(),
            }],
            adaptation_needed: true,
            adaptation_suggestions: vec![Suggestion::placeholder(
                SuggestionType::Cultural,
                "Consider general cultural sensitivity",
            )],
            confidence: 0.5,
            key_insights: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenderAnalysis {
    pub gender_considerations: String,
    pub communication_style: StyleAssessment,
    pub emotional_expression: EmotionalAssessment,
    pub recommendations: Vec<Recommendation>,
    pub suggested_adjustments: Vec<Suggestion>,
    pub confidence: f64,
}

impl GenderAnalysis {
    /// Static substitute used by the cascade when the gender branch fails.
    pub fn fallback() -> Self {
        Self {
            gender_considerations: "Unable to perform detailed gender analysis.".to_string(),
            communication_style: StyleAssessment {
                style: CommunicationStyle::Direct,
                explanation: "Default communication style; analysis unavailable".to_string(),
            },
            emotional_expression: EmotionalAssessment {
                level: EmotionalLevel::Moderate,
                explanation: "Default emotional expression; analysis unavailable".to_string(),
            },
            recommendations: vec![Recommendation {
                focus: "general".to_string(),
                suggestion: "Consider general communication guidelines".to_string(),
                reasoning: "Fallback suggestion".to_string(),
            }],
            suggested_adjustments: vec![Suggestion::placeholder(
                SuggestionType::Gender,
                "Consider general gender-appropriate communication",
            )],
            confidence: 0.5,
        }
    }
}

/// Merged output of both sub-analyses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    pub cultural_analysis: CulturalAnalysis,
    pub gender_analysis: GenderAnalysis,
    pub suggestions: Vec<Suggestion>,
    pub confidence: f64,
}

/// Content of the single suggestion carried by [`AnalysisResult::error`].
pub const SYSTEM_UNAVAILABLE: &str =
    "The analysis system is currently unavailable. Please try again later.";

impl AnalysisResult {
    /// Last-resort result: confidence 0 and one suggestion saying the system is unavailable.
    pub fn error() -> Self {
        Self {
            cultural_analysis: CulturalAnalysis {
                context_level: ContextLevel::Low,
                implicit_meanings: Vec::new(),
                cultural_nuances: vec![CulturalNuance {
                    title: "Analysis Unavailable".to_string(),
                    description: "Unable to perform cultural analysis at this time.".to_string(),
                }],
                adaptation_needed: false,
                adaptation_suggestions: vec![Suggestion::new(
                    SuggestionType::Cultural,
                    "Consider general cultural sensitivity",
                    1,
                    "Error fallback",
                )],
                confidence: 0.0,
                key_insights: Vec::new(),
            },
            gender_analysis: GenderAnalysis {
                gender_considerations: "Unable to analyze gender considerations".to_string(),
                communication_style: StyleAssessment {
                    style: CommunicationStyle::Direct,
                    explanation: "Default communication style due to error".to_string(),
                },
                emotional_expression: EmotionalAssessment {
                    level: EmotionalLevel::Moderate,
                    explanation: "Default emotional expression due to error".to_string(),
                },
                recommendations: vec![Recommendation {
                    focus: "general".to_string(),
                    suggestion: "Consider general communication guidelines".to_string(),
                    reasoning: "Error fallback".to_string(),
                }],
                suggested_adjustments: vec![Suggestion::new(
                    SuggestionType::Gender,
                    "Consider general gender-appropriate communication",
                    1,
                    "Error fallback",
                )],
                confidence: 0.0,
            },
            suggestions: vec![Suggestion::new(
                SuggestionType::General,
                SYSTEM_UNAVAILABLE,
                1,
                "Error fallback",
            )],
            confidence: 0.0,
        }
    }

    /// Shape invariant: confidences finite and within [0, 1], priorities >= 1.
    /// Enum domains are already enforced by the types.
    pub fn is_well_formed(&self) -> bool {
        fn unit(v: f64) -> bool {
            v.is_finite() && (0.0..=1.0).contains(&v)
        }
        fn priorities(list: &[Suggestion]) -> bool {
            list.iter().all(|s| s.priority >= 1)
        }
        unit(self.confidence)
            && unit(self.cultural_analysis.confidence)
            && unit(self.gender_analysis.confidence)
            && priorities(&self.suggestions)
            && priorities(&self.cultural_analysis.adaptation_suggestions)
            && priorities(&self.gender_analysis.suggested_adjustments)
    }
}

/// Body of a successful `POST /analyze`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentResponse {
    pub analysis: AnalysisResult,
    pub suggestions: Vec<Suggestion>,
    pub confidence: f64,
}

impl From<AnalysisResult> for AgentResponse {
    fn from(analysis: AnalysisResult) -> Self {
        Self {
            suggestions: analysis.suggestions.clone(),
            confidence: analysis.confidence,
            analysis,
        }
    }
}
