use serde::{Deserialize, Serialize};

use recap_core::config::{DigestConfig, TIER_CROSSOVER_TOKENS};

/// Completion-service capacity level, picked from the final prompt size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelTier {
    /// Small-context, cheaper model.
    Standard,
    /// Large-context model.
    Extended,
}

impl ModelTier {
    pub fn for_token_count(tokens: usize) -> Self {
        if tokens > TIER_CROSSOVER_TOKENS {
            Self::Extended
        } else {
            Self::Standard
        }
    }

    /// Model identifier configured for this tier.
    pub fn model<'a>(&self, config: &'a DigestConfig) -> &'a str {
        match self {
            Self::Standard => &config.standard_model,
            Self::Extended => &config.extended_model,
        }
    }
}

impl std::fmt::Display for ModelTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Standard => write!(f, "standard"),
            Self::Extended => write!(f, "extended"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crossover_is_inclusive_for_standard() {
        assert_eq!(ModelTier::for_token_count(0), ModelTier::Standard);
        assert_eq!(ModelTier::for_token_count(4096), ModelTier::Standard);
        assert_eq!(ModelTier::for_token_count(4097), ModelTier::Extended);
        assert_eq!(ModelTier::for_token_count(15872), ModelTier::Extended);
    }

    #[test]
    fn tiers_map_to_configured_models() {
        let config = DigestConfig::default();
        assert_eq!(ModelTier::Standard.model(&config), "gpt-3.5-turbo");
        assert_eq!(ModelTier::Extended.model(&config), "gpt-3.5-turbo-16k");
    }
}
