//! Structured output schema requested from the oracle

use serde_json::{json, Value};

/// Schema every analysis reply must satisfy. All fields are required.
pub fn risk_assessment_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "riskScore": {
                "type": "INTEGER",
                "description": "Risk score from 0 to 100"
            },
            "riskLevel": {
                "type": "STRING",
                "description": "LOW, MEDIUM, HIGH, or CRITICAL"
            },
            "analysis": {
                "type": "STRING",
                "description": "Detailed summary of the security analysis"
            },
            "findings": {
                "type": "ARRAY",
                "items": { "type": "STRING" },
                "description": "Specific red flags or positive indicators"
            },
            "recommendations": {
                "type": "ARRAY",
                "items": { "type": "STRING" },
                "description": "Actionable steps for the user"
            }
        },
        "required": ["riskScore", "riskLevel", "analysis", "findings", "recommendations"]
    })
}
