//! Response normalizer: untrusted model text in, fixed-schema values out.
//!
//! Nothing in here returns an error. Each expected key is read when present and
//! well-typed, otherwise the documented default is used; text that is not JSON at
//! all becomes the shape's `unparsable` value.

use crate::types::{
    AnalysisResult, CommunicationStyle, ContextLevel, CulturalAnalysis, CulturalNuance,
    EmotionalAssessment, EmotionalLevel, GenderAnalysis, InsightCategory, KeyInsight,
    Recommendation, StyleAssessment, Suggestion, SuggestionType,
};
use serde_json::Value;
use std::collections::HashSet;

/// Confidence used by every successfully parsed path that does not report its own.
pub const PARSED_CONFIDENCE: f64 = 0.8;

/// Locate the JSON payload inside model output: fenced block first, then the
/// outermost `{ ... }` span, then the trimmed text itself.
pub fn extract_json(raw: &str) -> &str {
    let trimmed = raw.trim();

    if let Some(start) = trimmed.find("```") {
        let after_fence = &trimmed[start + 3..];
        let content_start = after_fence.find('\n').map(|nl| nl + 1).unwrap_or(0);
        let content = &after_fence[content_start..];
        if let Some(end) = content.find("```") {
            let fenced = content[..end].trim();
            if fenced.starts_with('{') {
                return fenced;
            }
        }
    }

    if let (Some(start), Some(end)) = (trimmed.find('{'), trimmed.rfind('}')) {
        if start <= end {
            return &trimmed[start..=end];
        }
    }

    trimmed
}

/// Parse model output as a JSON object. `None` for anything else.
pub fn parse_json(raw: &str) -> Option<Value> {
    serde_json::from_str::<Value>(extract_json(raw))
        .ok()
        .filter(Value::is_object)
}

/// A response shape that can always be produced from model output.
pub trait Normalize: Sized {
    /// Build from a parsed JSON object, defaulting every missing or mistyped key.
    fn from_value(value: &Value) -> Self;

    /// Value used when the text is not JSON.
    fn unparsable(raw: &str) -> Self;
}

/// `None` when the text is not JSON, so the caller can pick its own fallback.
pub fn try_normalize<T: Normalize>(raw: &str) -> Option<T> {
    parse_json(raw).map(|value| T::from_value(&value))
}

/// Total: every input yields a value.
pub fn normalize<T: Normalize>(raw: &str) -> T {
    try_normalize(raw).unwrap_or_else(|| T::unparsable(raw))
}

// -----------------------------------------------------------------------------
// Field helpers
// -----------------------------------------------------------------------------

fn str_field<'a>(value: &'a Value, key: &str) -> Option<&'a str> {
    value.get(key).and_then(Value::as_str)
}

fn string_or_empty(value: &Value, key: &str) -> String {
    str_field(value, key).unwrap_or_default().to_string()
}

fn array_field<'a>(value: &'a Value, key: &str) -> &'a [Value] {
    value
        .get(key)
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or(&[])
}

/// `value[key]` if it is an object, else the value itself. Lets the model omit the wrapper.
fn section<'a>(value: &'a Value, key: &str) -> &'a Value {
    match value.get(key) {
        Some(inner) if inner.is_object() => inner,
        _ => value,
    }
}

/// Clamp into [0, 1]; non-finite or non-numeric values give `None`.
pub fn clamp_confidence(value: Option<&Value>) -> Option<f64> {
    let v = value?;
    let n = v
        .as_f64()
        .or_else(|| v.as_str().and_then(|s| s.trim().parse::<f64>().ok()))?;
    n.is_finite().then(|| n.clamp(0.0, 1.0))
}

/// Positive integer priority; anything else (missing, zero, negative, text) becomes `default`.
pub fn coerce_priority(value: Option<&Value>, default: u32) -> u32 {
    let parsed = value.and_then(|v| {
        v.as_u64()
            .or_else(|| v.as_f64().filter(|f| f.is_finite() && *f >= 1.0).map(|f| f as u64))
            .or_else(|| v.as_str().and_then(|s| s.trim().parse::<u64>().ok()))
    });
    match parsed {
        Some(p) if p >= 1 => u32::try_from(p).unwrap_or(u32::MAX),
        _ => default.max(1),
    }
}

/// Keep the first suggestion for each distinct `content`, preserving order.
pub fn dedupe_suggestions(list: Vec<Suggestion>) -> Vec<Suggestion> {
    let mut seen = HashSet::new();
    list.into_iter()
        .filter(|s| seen.insert(s.content.clone()))
        .collect()
}

fn parse_style(value: &Value) -> StyleAssessment {
    StyleAssessment {
        style: str_field(value, "style")
            .and_then(CommunicationStyle::parse)
            .unwrap_or_default(),
        explanation: string_or_empty(value, "explanation"),
    }
}

fn parse_emotion(value: &Value) -> EmotionalAssessment {
    EmotionalAssessment {
        level: str_field(value, "level")
            .and_then(EmotionalLevel::parse)
            .unwrap_or_default(),
        explanation: string_or_empty(value, "explanation"),
    }
}

fn parse_recommendations(list: &[Value]) -> Vec<Recommendation> {
    list.iter()
        .filter(|r| r.is_object())
        .map(|r| Recommendation {
            focus: string_or_empty(r, "focus"),
            suggestion: string_or_empty(r, "suggestion"),
            reasoning: string_or_empty(r, "reasoning"),
        })
        .collect()
}

/// `{point, reasoning, priority}` entries, re-tagged as `kind`.
fn points_as_suggestions(list: &[Value], kind: SuggestionType) -> Vec<Suggestion> {
    list.iter()
        .filter_map(|r| {
            let content = str_field(r, "point").or_else(|| str_field(r, "content"))?;
            if content.trim().is_empty() {
                return None;
            }
            Some(Suggestion::new(
                kind,
                content,
                coerce_priority(r.get("priority"), 1),
                string_or_empty(r, "reasoning"),
            ))
        })
        .collect()
}

/// Model-authored `{type, content, priority, reasoning}` entries. Only complete
/// entries survive: string content, a known type and a non-empty reasoning.
fn well_formed_suggestions(list: &[Value]) -> Vec<Suggestion> {
    list.iter()
        .filter_map(|s| {
            let content = str_field(s, "content")?;
            let kind = str_field(s, "type").and_then(SuggestionType::parse)?;
            let reasoning = str_field(s, "reasoning").filter(|r| !r.is_empty())?;
            Some(Suggestion::new(
                kind,
                content,
                coerce_priority(s.get("priority"), 1),
                reasoning,
            ))
        })
        .collect()
}

/// Recommendations nested under `adaptations.<group>[].recommendations[]`.
fn adaptation_points(adaptations: &Value, group: &str, kind: SuggestionType) -> Vec<Suggestion> {
    array_field(adaptations, group)
        .iter()
        .flat_map(|category| points_as_suggestions(array_field(category, "recommendations"), kind))
        .collect()
}

// -----------------------------------------------------------------------------
// Per-kind response shapes
// -----------------------------------------------------------------------------

/// Reply to the "nuances" prompt.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct NuancesResponse {
    pub context_level: ContextLevel,
    pub implicit_meanings: Vec<String>,
    pub cultural_nuances: Vec<CulturalNuance>,
    pub key_insights: Vec<KeyInsight>,
}

impl Normalize for NuancesResponse {
    fn from_value(value: &Value) -> Self {
        let body = section(value, "culturalAnalysis");

        // Titles are positional; a model-supplied title is ignored.
        let cultural_nuances = array_field(body, "culturalNuances")
            .iter()
            .filter_map(|n| match n {
                Value::String(s) => Some(s.clone()),
                Value::Object(_) => Some(string_or_empty(n, "description")),
                _ => None,
            })
            .enumerate()
            .map(|(i, description)| CulturalNuance {
                title: format!("Cultural Consideration {}", i + 1),
                description,
            })
            .collect();

        let key_insights = array_field(body, "keyInsights")
            .iter()
            .filter(|k| k.is_object())
            .enumerate()
            .map(|(i, k)| KeyInsight {
                id: k
                    .get("id")
                    .and_then(Value::as_u64)
                    .and_then(|id| u32::try_from(id).ok())
                    .unwrap_or(i as u32 + 1),
                title: string_or_empty(k, "title"),
                description: string_or_empty(k, "description"),
                category: str_field(k, "category")
                    .and_then(InsightCategory::parse)
                    .unwrap_or_default(),
            })
            .collect();

        Self {
            context_level: str_field(body, "contextLevel")
                .and_then(ContextLevel::parse)
                .unwrap_or_default(),
            implicit_meanings: array_field(body, "implicitMeanings")
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect(),
            cultural_nuances,
            key_insights,
        }
    }

    /// Carries the error analysis's nuance so the failure stays visible.
    fn unparsable(_raw: &str) -> Self {
        Self {
            cultural_nuances: AnalysisResult::error().cultural_analysis.cultural_nuances,
            ..Self::default()
        }
    }
}

/// Reply to the "adaptations" prompt.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AdaptationsResponse {
    pub suggestions: Vec<Suggestion>,
    /// True when the reply was plain text split into lines.
    pub from_text: bool,
}

impl Normalize for AdaptationsResponse {
    fn from_value(value: &Value) -> Self {
        let adaptations = section(value, "adaptations");
        let mut suggestions = adaptation_points(adaptations, "cultural", SuggestionType::Cultural);
        // Produced by the cultural analyzer, so gender points are tagged cultural too.
        suggestions.extend(adaptation_points(adaptations, "gender", SuggestionType::Cultural));
        suggestions.extend(
            well_formed_suggestions(array_field(value, "suggestions"))
                .into_iter()
                .map(|s| Suggestion {
                    kind: SuggestionType::Cultural,
                    ..s
                }),
        );
        Self {
            suggestions: dedupe_suggestions(suggestions),
            from_text: false,
        }
    }

    fn unparsable(raw: &str) -> Self {
        let suggestions = raw
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(|line| Suggestion::new(SuggestionType::Cultural, line, 1, ""))
            .collect();
        Self {
            suggestions: dedupe_suggestions(suggestions),
            from_text: true,
        }
    }
}

/// Reply to the "gender" prompt.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct GenderResponse {
    pub communication_style: StyleAssessment,
    pub emotional_expression: EmotionalAssessment,
    pub recommendations: Vec<Recommendation>,
    /// `None` when the model did not report a usable value.
    pub confidence: Option<f64>,
}

impl GenderResponse {
    /// Considerations text shown to the user: the style explanation.
    pub fn considerations(&self) -> &str {
        &self.communication_style.explanation
    }
}

impl Normalize for GenderResponse {
    fn from_value(value: &Value) -> Self {
        let body = section(value, "genderAnalysis");
        Self {
            communication_style: body
                .get("communicationStyle")
                .map(parse_style)
                .unwrap_or_default(),
            emotional_expression: body
                .get("emotionalExpression")
                .map(parse_emotion)
                .unwrap_or_default(),
            recommendations: parse_recommendations(array_field(body, "recommendations")),
            confidence: clamp_confidence(value.get("confidence"))
                .or_else(|| clamp_confidence(body.get("confidence"))),
        }
    }

    fn unparsable(_raw: &str) -> Self {
        Self::default()
    }
}

/// Reply to the "gender-suggestions" prompt.
#[derive(Debug, Clone, PartialEq)]
pub struct GenderSuggestionsResponse {
    pub suggestions: Vec<Suggestion>,
}

impl GenderSuggestionsResponse {
    fn or_placeholder(suggestions: Vec<Suggestion>) -> Self {
        let suggestions = dedupe_suggestions(suggestions);
        if suggestions.is_empty() {
            return Self {
                suggestions: vec![Suggestion::new(
                    SuggestionType::Gender,
                    "No suggestions available",
                    1,
                    "No suggestions could be generated",
                )],
            };
        }
        Self { suggestions }
    }
}

impl Normalize for GenderSuggestionsResponse {
    fn from_value(value: &Value) -> Self {
        let body = section(value, "genderAnalysis");
        let mut suggestions: Vec<Suggestion> = array_field(body, "recommendations")
            .iter()
            .enumerate()
            .filter_map(|(i, r)| {
                let content = str_field(r, "suggestion").filter(|s| !s.trim().is_empty())?;
                Some(Suggestion::new(
                    SuggestionType::Gender,
                    content,
                    i as u32 + 1,
                    string_or_empty(r, "reasoning"),
                ))
            })
            .collect();
        suggestions.extend(well_formed_suggestions(array_field(value, "suggestions")));
        Self::or_placeholder(suggestions)
    }

    fn unparsable(_raw: &str) -> Self {
        Self::or_placeholder(Vec::new())
    }
}

/// Combined single-call shape: `culturalAnalysis`, `genderAnalysis` and `adaptations`
/// in one document. Both confidences are fixed at 0.8; unparsable text gives
/// [`AnalysisResult::error`].
pub fn normalize_analysis(raw: &str) -> AnalysisResult {
    let Some(value) = parse_json(raw) else {
        return AnalysisResult::error();
    };

    let nuances = NuancesResponse::from_value(&value);
    let adaptations = section(&value, "adaptations");
    let cultural = CulturalAnalysis {
        context_level: nuances.context_level,
        implicit_meanings: nuances.implicit_meanings,
        cultural_nuances: nuances.cultural_nuances,
        adaptation_needed: true,
        adaptation_suggestions: dedupe_suggestions(adaptation_points(
            adaptations,
            "cultural",
            SuggestionType::Cultural,
        )),
        confidence: PARSED_CONFIDENCE,
        key_insights: nuances.key_insights,
    };

    let gender_resp = GenderResponse::from_value(&value);
    let gender = GenderAnalysis {
        gender_considerations: gender_resp.considerations().to_string(),
        communication_style: gender_resp.communication_style,
        emotional_expression: gender_resp.emotional_expression,
        recommendations: gender_resp.recommendations,
        suggested_adjustments: dedupe_suggestions(adaptation_points(
            adaptations,
            "gender",
            SuggestionType::Gender,
        )),
        confidence: PARSED_CONFIDENCE,
    };

    let mut suggestions = cultural.adaptation_suggestions.clone();
    suggestions.extend(gender.suggested_adjustments.iter().cloned());
    AnalysisResult {
        confidence: (cultural.confidence + gender.confidence) / 2.0,
        cultural_analysis: cultural,
        gender_analysis: gender,
        suggestions,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn extracts_fenced_and_embedded_json() {
        assert_eq!(extract_json("```json\n{\"a\":1}\n```"), "{\"a\":1}");
        assert_eq!(extract_json("Sure! Here it is: {\"a\":1} Hope that helps."), "{\"a\":1}");
        // Fence without a newline after the language tag.
        assert_eq!(extract_json("```json {\"a\":1} ```"), "{\"a\":1}");
        let n: NuancesResponse =
            normalize("```json {\"culturalAnalysis\":{\"culturalNuances\":[\"x\"]}} ```");
        assert_eq!(n.cultural_nuances[0].description, "x");
        assert!(parse_json("no json here").is_none());
        assert!(parse_json("[1, 2]").is_none());
    }

    #[test]
    fn nuances_defaults_titles_and_categories() {
        let raw = json!({
            "culturalAnalysis": {
                "contextLevel": "HIGH",
                "implicitMeanings": ["politeness", 3],
                "culturalNuances": [
                    {"description": "Indirect refusal"},
                    {"title": "Hierarchy", "description": "Seniority matters"},
                    "plain string nuance"
                ],
                "keyInsights": [{"title": "t", "category": "nonsense"}]
            }
        })
        .to_string();
        let n: NuancesResponse = normalize(&raw);
        assert_eq!(n.context_level, ContextLevel::High);
        assert_eq!(n.implicit_meanings, vec!["politeness".to_string()]);
        assert_eq!(n.cultural_nuances[0].title, "Cultural Consideration 1");
        assert_eq!(n.cultural_nuances[1].title, "Cultural Consideration 2");
        assert_eq!(n.cultural_nuances[1].description, "Seniority matters");
        assert_eq!(n.cultural_nuances[2].title, "Cultural Consideration 3");
        assert_eq!(n.key_insights[0].id, 1);
        assert_eq!(n.key_insights[0].category, InsightCategory::CommunicationStyle);
    }

    #[test]
    fn adaptations_from_json_are_cultural() {
        let raw = json!({
            "adaptations": {
                "cultural": [{"category": "c", "recommendations": [
                    {"point": "Soften the request", "reasoning": "r1", "priority": 2},
                    {"point": "Soften the request", "reasoning": "dup", "priority": 1}
                ]}],
                "gender": [{"category": "g", "recommendations": [
                    {"point": "Use inclusive phrasing", "priority": -4}
                ]}]
            }
        })
        .to_string();
        let a: AdaptationsResponse = normalize(&raw);
        assert!(!a.from_text);
        assert_eq!(a.suggestions.len(), 2);
        assert!(a.suggestions.iter().all(|s| s.kind == SuggestionType::Cultural));
        assert_eq!(a.suggestions[0].priority, 2);
        assert_eq!(a.suggestions[1].priority, 1);
        assert_eq!(a.suggestions[1].reasoning, "");
    }

    #[test]
    fn adaptations_from_plain_text_split_by_line() {
        let a: AdaptationsResponse = normalize("Be polite\n\n  Add a greeting  \n");
        assert!(a.from_text);
        let contents: Vec<_> = a.suggestions.iter().map(|s| s.content.as_str()).collect();
        assert_eq!(contents, vec!["Be polite", "Add a greeting"]);
    }

    #[test]
    fn gender_response_defaults_and_confidence() {
        let g: GenderResponse = normalize(r#"{"genderAnalysis":{"communicationStyle":{"style":"bogus"}},"confidence":1.7}"#);
        assert_eq!(g.communication_style.style, CommunicationStyle::Direct);
        assert_eq!(g.emotional_expression.level, EmotionalLevel::Moderate);
        assert_eq!(g.confidence, Some(1.0));

        let g: GenderResponse = normalize(r#"{"genderAnalysis":{}, "confidence":"n/a"}"#);
        assert_eq!(g.confidence, None);
    }

    #[test]
    fn gender_suggestions_merge_and_dedupe() {
        let raw = json!({
            "genderAnalysis": {"recommendations": [
                {"focus": "tone", "suggestion": "A", "reasoning": "ra"},
                {"focus": "tone", "suggestion": "B", "reasoning": "rb"}
            ]},
            "suggestions": [
                {"type": "gender", "content": "A", "priority": 5, "reasoning": "again"},
                {"type": "cultural", "content": "C", "reasoning": "rc"},
                {"type": "gender", "content": "missing reasoning"},
                {"type": "other", "content": "bad type", "reasoning": "x"}
            ]
        })
        .to_string();
        let s: GenderSuggestionsResponse = normalize(&raw);
        let contents: Vec<_> = s.suggestions.iter().map(|s| s.content.as_str()).collect();
        assert_eq!(contents, vec!["A", "B", "C"]);
        assert_eq!(s.suggestions[1].priority, 2);
        assert_eq!(s.suggestions[2].kind, SuggestionType::Cultural);
    }

    #[test]
    fn gender_suggestions_placeholder_when_empty() {
        let s: GenderSuggestionsResponse = normalize("{}");
        assert_eq!(s.suggestions.len(), 1);
        assert_eq!(s.suggestions[0].content, "No suggestions available");
        let s: GenderSuggestionsResponse = normalize("garbage");
        assert_eq!(s.suggestions[0].reasoning, "No suggestions could be generated");
    }

    #[test]
    fn dedupe_keeps_first_seen() {
        let mk = |c: &str, r: &str| Suggestion::new(SuggestionType::General, c, 1, r);
        let out = dedupe_suggestions(vec![mk("A", "1"), mk("B", "2"), mk("A", "3")]);
        assert_eq!(out, vec![mk("A", "1"), mk("B", "2")]);
    }

    #[test]
    fn combined_analysis_shape() {
        let raw = json!({
            "culturalAnalysis": {"contextLevel": "high", "culturalNuances": [{"title": "x", "description": "y"}]},
            "genderAnalysis": {"communicationStyle": {"style": "factual", "explanation": "plain"}},
            "adaptations": {
                "cultural": [{"recommendations": [{"point": "c1", "reasoning": "r", "priority": 1}]}],
                "gender": [{"recommendations": [{"point": "g1", "reasoning": "r", "priority": 1}]}]
            }
        })
        .to_string();
        let r = normalize_analysis(&raw);
        assert!(r.is_well_formed());
        assert_eq!(r.confidence, 0.8);
        assert_eq!(r.cultural_analysis.context_level, ContextLevel::High);
        assert_eq!(r.gender_analysis.gender_considerations, "plain");
        let contents: Vec<_> = r.suggestions.iter().map(|s| s.content.as_str()).collect();
        assert_eq!(contents, vec!["c1", "g1"]);
        assert_eq!(r.suggestions[1].kind, SuggestionType::Gender);
    }

    #[test]
    fn malformed_inputs_never_panic() {
        for raw in ["", "{", "}", "```", "```json\n```", "null", "{\"culturalAnalysis\": 5}", "\u{0}"] {
            let _: NuancesResponse = normalize(raw);
            let _: AdaptationsResponse = normalize(raw);
            let _: GenderResponse = normalize(raw);
            let s: GenderSuggestionsResponse = normalize(raw);
            assert!(!s.suggestions.is_empty());
            assert!(normalize_analysis(raw).is_well_formed());
        }
    }

    #[test]
    fn unparsable_nuances_carry_unavailable_nuance() {
        let n: NuancesResponse = normalize("I'd rather not.");
        assert_eq!(n.cultural_nuances.len(), 1);
        assert_eq!(n.cultural_nuances[0].description, "Unable to perform cultural analysis at this time.");
        assert!(try_normalize::<NuancesResponse>("I'd rather not.").is_none());
    }

    #[test]
    fn unparsable_combined_is_error_result() {
        assert_eq!(normalize_analysis("not json"), AnalysisResult::error());
    }
}
