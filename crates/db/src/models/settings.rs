//! Shared AI settings document.

use serde::{Deserialize, Serialize};
use validator::Validate;

/// Credits charged per metered AI operation. Every operation costs
/// something; a free one would bypass the ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreditCosts {
    #[validate(range(min = 1))]
    pub article_generation: u64,
    #[validate(range(min = 1))]
    pub image_generation: u64,
    #[validate(range(min = 1))]
    pub headline_rewrite: u64,
}

impl Default for CreditCosts {
    fn default() -> Self {
        Self {
            article_generation: 10,
            image_generation: 5,
            headline_rewrite: 1,
        }
    }
}

/// The `settings/ai` document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct AiSettings {
    #[validate(length(min = 1, max = 120))]
    pub model: String,
    #[validate(nested)]
    pub credit_costs: CreditCosts,
    #[validate(range(min = 1, max = 200))]
    pub articles_per_category: u32,
}

impl Default for AiSettings {
    fn default() -> Self {
        Self {
            model: "claude-sonnet".to_string(),
            credit_costs: CreditCosts::default(),
            articles_per_category: 3,
        }
    }
}

/// Metered AI operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AiOperation {
    ArticleGeneration,
    ImageGeneration,
    HeadlineRewrite,
}

impl AiOperation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ArticleGeneration => "article_generation",
            Self::ImageGeneration => "image_generation",
            Self::HeadlineRewrite => "headline_rewrite",
        }
    }
}

impl CreditCosts {
    pub fn cost_of(&self, operation: AiOperation) -> u64 {
        match operation {
            AiOperation::ArticleGeneration => self.article_generation,
            AiOperation::ImageGeneration => self.image_generation,
            AiOperation::HeadlineRewrite => self.headline_rewrite,
        }
    }
}
