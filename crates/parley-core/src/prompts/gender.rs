//! Gender prompts: communication dynamics, then adjustments built on those dynamics.

pub const GENDER_USER_TEMPLATE: &str = r#"Analyze the gender communication dynamics:
Source Gender: {source_gender}
Target Gender: {target_gender}
Cultural Context: {source_culture} to {target_culture}
Message: "{message}"

Consider:
- Gender-specific communication patterns
- Cultural influence on gender expression
- Professional context
- Power dynamics

Please return in this exact JSON structure:
{
  "genderAnalysis": {
    "communicationStyle": {
      "style": "direct" | "indirect" | "emotional" | "factual",
      "explanation": "string"
    },
    "emotionalExpression": {
      "level": "high" | "moderate" | "low",
      "explanation": "string"
    },
    "recommendations": [
      {
        "focus": "string",
        "suggestion": "string",
        "reasoning": "string"
      }
    ]
  },
  "confidence": number
}"#;

/// `{context}` carries the dynamics (style, expression, considerations) from the gender call.
pub const GENDER_SUGGESTIONS_USER_TEMPLATE: &str = r#"Based on these dynamics:
{context}

Sender: {source_gender} ({source_culture})
Recipient: {target_gender} ({target_culture})
Message: "{message}"

Suggest specific adjustments to improve communication.
Focus on:
1. Culturally-aware inclusive language
2. Gender-appropriate communication style
3. Professional context adaptation
4. Cultural sensitivity

Please return in this exact JSON structure:
{
  "genderAnalysis": {
    "recommendations": [
      {
        "focus": "string",
        "suggestion": "string",
        "reasoning": "string"
      }
    ]
  },
  "suggestions": [
    {
      "type": "cultural" | "gender",
      "content": "string",
      "priority": number,
      "reasoning": "string"
    }
  ]
}"#;
