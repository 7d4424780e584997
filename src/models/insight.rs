//! AI-generated article insights.

use serde::{Deserialize, Serialize};

/// Where an insight's text came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InsightOrigin {
    /// Produced by the text-generation model
    Model,
    /// Templated from article metadata because the model was unavailable
    Fallback,
}

/// Summary and key findings for an article
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AiInsight {
    pub summary: String,

    pub key_findings: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pdf_link: Option<String>,

    pub origin: InsightOrigin,
}
