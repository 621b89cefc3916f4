//! Merge the two sub-analyses into one result.

use crate::types::{AnalysisResult, CulturalAnalysis, GenderAnalysis};

/// Cultural suggestions first, then gender adjustments; confidence is the mean of both.
/// No deduplication happens here.
pub fn synthesize(cultural: CulturalAnalysis, gender: GenderAnalysis) -> AnalysisResult {
    let suggestions = cultural
        .adaptation_suggestions
        .iter()
        .chain(gender.suggested_adjustments.iter())
        .cloned()
        .collect();
    let confidence = (cultural.confidence + gender.confidence) / 2.0;
    AnalysisResult {
        cultural_analysis: cultural,
        gender_analysis: gender,
        suggestions,
        confidence,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Suggestion, SuggestionType};

    #[test]
    fn concatenates_in_order_and_averages() {
        let mut cultural = CulturalAnalysis::fallback();
        cultural.confidence = 0.8;
        cultural
            .adaptation_suggestions
            .push(Suggestion::new(SuggestionType::Cultural, "shared", 2, "c"));
        let mut gender = GenderAnalysis::fallback();
        gender.confidence = 0.6;
        gender
            .suggested_adjustments
            .push(Suggestion::new(SuggestionType::Gender, "shared", 1, "g"));

        let result = synthesize(cultural, gender);
        let contents: Vec<_> = result.suggestions.iter().map(|s| s.content.as_str()).collect();
        assert_eq!(
            contents,
            vec![
                "Consider general cultural sensitivity",
                "shared",
                "Consider general gender-appropriate communication",
                "shared",
            ]
        );
        assert!((result.confidence - 0.7).abs() < 1e-9);
        assert!(result.is_well_formed());
    }

    #[test]
    fn confidence_is_arithmetic_mean() {
        let mut cultural = CulturalAnalysis::fallback();
        cultural.confidence = 0.8;
        let mut gender = GenderAnalysis::fallback();
        gender.confidence = 0.4;
        assert!((synthesize(cultural, gender).confidence - 0.6).abs() < 1e-9);
    }

    #[test]
    fn fallbacks_synthesize_to_half_confidence() {
        let r = synthesize(CulturalAnalysis::fallback(), GenderAnalysis::fallback());
        assert_eq!(r.confidence, 0.5);
        assert_eq!(r.suggestions.len(), 2);
    }
}
