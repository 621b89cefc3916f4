//! Cultural prompts: nuances of the message, then adaptation suggestions built on that result.

/// Placeholders: `{source_culture}`, `{target_culture}`, `{source_gender}`, `{target_gender}`, `{message}`.
pub const NUANCES_USER_TEMPLATE: &str = r#"Analyze the communication dynamics between:
- Source Culture: {source_culture}
- Target Culture: {target_culture}
- Source Gender: {source_gender}
- Target Gender: {target_gender}

Message: "{message}"

Consider:
- Cultural communication styles
- Gender-specific patterns
- Social hierarchy implications
- Cultural values and beliefs
- Gender-cultural intersectionality

Please return in this exact JSON structure:
{
  "culturalAnalysis": {
    "keyInsights": [
      {
        "id": number,
        "title": "string",
        "description": "string",
        "category": "communication_style" | "hierarchy" | "values" | "gender_dynamics"
      }
    ],
    "contextLevel": "high" | "low",
    "summary": "string",
    "implicitMeanings": ["string"],
    "culturalNuances": [
      {
        "title": "string",
        "description": "string"
      }
    ]
  }
}"#;

/// Placeholders as above plus `{context}` (JSON of the partial cultural analysis).
pub const ADAPTATIONS_USER_TEMPLATE: &str = r#"Based on this analysis:
Cultural Context: {context}
Cultures: {source_culture} to {target_culture}
Gender Context: {source_gender} to {target_gender}
Message: "{message}"

Suggest specific adaptations to improve communication.
Focus on:
1. Cultural sensitivity and adaptation
2. Gender-appropriate communication
3. Combined cultural-gender considerations
4. Practical recommendations

Please return in this exact JSON structure:
{
  "adaptations": {
    "cultural": [{
      "category": "Cultural Sensitivity",
      "recommendations": [
        {
          "point": "string",
          "reasoning": "string",
          "priority": number
        }
      ]
    }],
    "gender": [{
      "category": "Gender Communication",
      "recommendations": [
        {
          "point": "string",
          "reasoning": "string",
          "priority": number
        }
      ]
    }]
  }
}"#;
