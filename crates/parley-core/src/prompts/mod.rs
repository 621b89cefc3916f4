//! Prompt templates for the four analysis kinds.
//!
//! Pure string building: request fields are embedded verbatim, nothing is escaped, and
//! any input (including empty strings) is accepted.

pub mod cultural;
pub mod gender;

use crate::types::AnalysisRequest;
use serde::{Deserialize, Serialize};
use std::fmt;

pub use cultural::{ADAPTATIONS_USER_TEMPLATE, NUANCES_USER_TEMPLATE};
pub use gender::{GENDER_SUGGESTIONS_USER_TEMPLATE, GENDER_USER_TEMPLATE};

/// Shared system instruction: JSON only, no prose around it.
pub const ANALYST_SYSTEM: &str = "You are an expert in cross-cultural and gender-aware communication analysis. \
Return your analysis ONLY in the specified JSON format without any markdown, headers, or additional text.";

/// Which slice of the analysis a prompt asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PromptKind {
    Nuances,
    Gender,
    Adaptations,
    GenderSuggestions,
}

impl PromptKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Nuances => "nuances",
            Self::Gender => "gender",
            Self::Adaptations => "adaptations",
            Self::GenderSuggestions => "gender-suggestions",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim() {
            "nuances" => Some(Self::Nuances),
            "gender" => Some(Self::Gender),
            "adaptations" => Some(Self::Adaptations),
            "gender-suggestions" => Some(Self::GenderSuggestions),
            _ => None,
        }
    }
}

impl fmt::Display for PromptKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// System + user instruction pair sent to a provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prompt {
    pub system: String,
    pub user: String,
}

/// Build the prompt for `kind`. `context` is the partial cultural result for
/// `adaptations` and the gender dynamics for `gender-suggestions`; other kinds ignore it.
pub fn build_prompt(
    kind: PromptKind,
    request: &AnalysisRequest,
    context: Option<&serde_json::Value>,
) -> Prompt {
    let context_json = context
        .map(|c| c.to_string())
        .unwrap_or_else(|| "{}".to_string());
    let template = match kind {
        PromptKind::Nuances => NUANCES_USER_TEMPLATE,
        PromptKind::Gender => GENDER_USER_TEMPLATE,
        PromptKind::Adaptations => ADAPTATIONS_USER_TEMPLATE,
        PromptKind::GenderSuggestions => GENDER_SUGGESTIONS_USER_TEMPLATE,
    };
    let user = fill(
        template,
        &[
            ("source_culture", request.source_culture.as_str()),
            ("target_culture", request.target_culture.as_str()),
            ("source_gender", request.source_gender.as_str()),
            ("target_gender", request.target_gender.as_str()),
            ("message", request.message.as_str()),
            ("context", context_json.as_str()),
        ],
    );
    Prompt {
        system: ANALYST_SYSTEM.to_string(),
        user,
    }
}

/// Single-pass `{name}` substitution, so inserted values are never rescanned.
/// Unknown placeholders and JSON braces in the template are left as they are.
fn fill(template: &str, vars: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len() + 256);
    let mut rest = template;
    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        let hit = after.find('}').and_then(|close| {
            let name = &after[..close];
            vars.iter()
                .find(|(k, _)| *k == name)
                .map(|(_, v)| (close, *v))
        });
        match hit {
            Some((close, value)) => {
                out.push_str(value);
                rest = &after[close + 1..];
            }
            None => {
                out.push('{');
                rest = after;
            }
        }
    }
    out.push_str(rest);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ModelProvider;

    fn request(message: &str) -> AnalysisRequest {
        AnalysisRequest::new(message, "Japanese", "Brazilian", "female", "male", ModelProvider::OpenAi)
    }

    #[test]
    fn nuances_prompt_embeds_all_fields() {
        let p = build_prompt(PromptKind::Nuances, &request("Could you review this?"), None);
        assert_eq!(p.system, ANALYST_SYSTEM);
        for needle in ["Japanese", "Brazilian", "female", "male", "\"Could you review this?\""] {
            assert!(p.user.contains(needle), "missing {needle}");
        }
        assert!(p.user.contains("\"culturalAnalysis\""));
    }

    #[test]
    fn inserted_values_are_not_rescanned() {
        let p = build_prompt(PromptKind::Gender, &request("literal {target_culture} here"), None);
        assert!(p.user.contains("literal {target_culture} here"));
    }

    #[test]
    fn empty_strings_accepted() {
        let req = AnalysisRequest::new("", "", "", "", "", ModelProvider::MetaLlama);
        let p = build_prompt(PromptKind::Adaptations, &req, None);
        assert!(p.user.contains("{}"));
    }

    #[test]
    fn context_is_serialized_into_prompt() {
        let ctx = serde_json::json!({"contextLevel": "high"});
        let p = build_prompt(PromptKind::Adaptations, &request("hi"), Some(&ctx));
        assert!(p.user.contains(r#"{"contextLevel":"high"}"#));
    }

    #[test]
    fn kind_round_trips_through_wire_name() {
        for kind in [
            PromptKind::Nuances,
            PromptKind::Gender,
            PromptKind::Adaptations,
            PromptKind::GenderSuggestions,
        ] {
            assert_eq!(PromptKind::parse(kind.as_str()), Some(kind));
        }
        assert_eq!(PromptKind::parse("analysis"), None);
    }
}
