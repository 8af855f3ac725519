//! Cost estimation: static per-model price table and a word-count token heuristic.
//!
//! Estimates are deliberately coarse: tokens are approximated from whitespace-split
//! word counts rather than a real tokenizer. Unknown models cost nothing (logged).

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::ai::features::{AiProfile, Complexity};

/// Words per token used by the token heuristic (1 token ≈ 0.75 words).
const WORDS_PER_TOKEN: f64 = 0.75;

/// Cap on the guessed output length used when ranking models.
const RECOMMENDATION_OUTPUT_TOKEN_CAP: f64 = 1000.0;

/// Identifier fragment that marks a higher-quality tier.
const PREMIUM_TIER_MARKER: &str = "pro";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelPricing {
    pub display_name: String,
    pub input_cost_per_million: f64,
    pub output_cost_per_million: f64,
}

impl ModelPricing {
    pub fn new(display_name: &str, input_cost_per_million: f64, output_cost_per_million: f64) -> Self {
        Self {
            display_name: display_name.to_string(),
            input_cost_per_million,
            output_cost_per_million,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ModelRecommendation {
    pub model: String,
    pub estimated_cost: f64,
    pub reasoning: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BudgetWarning {
    None,
    Low,
    Critical,
}

#[derive(Debug, Clone, Serialize)]
pub struct BudgetCheck {
    pub can_proceed: bool,
    pub remaining_budget: f64,
    pub warning_level: BudgetWarning,
}

/// Immutable pricing table, keyed by exact model identifier.
///
/// A `BTreeMap` keeps iteration order stable so that cost ties in
/// `recommend_model` resolve the same way on every call.
#[derive(Debug, Clone)]
pub struct PricingTable {
    models: BTreeMap<String, ModelPricing>,
}

impl Default for PricingTable {
    fn default() -> Self {
        Self::from_entries([
            ("gemini-1.5-flash", ModelPricing::new("Gemini 1.5 Flash", 0.075, 0.30)),
            ("gemini-1.5-pro", ModelPricing::new("Gemini 1.5 Pro", 3.50, 10.50)),
            ("gemini-1.0-pro", ModelPricing::new("Gemini 1.0 Pro", 0.50, 1.50)),
        ])
    }
}

impl PricingTable {
    pub fn from_entries<'a>(entries: impl IntoIterator<Item = (&'a str, ModelPricing)>) -> Self {
        Self {
            models: entries
                .into_iter()
                .map(|(id, pricing)| (id.to_string(), pricing))
                .collect(),
        }
    }

    pub fn get(&self, model: &str) -> Option<&ModelPricing> {
        self.models.get(model)
    }

    pub fn entries(&self) -> &BTreeMap<String, ModelPricing> {
        &self.models
    }

    /// Cost for explicit token counts. Token counts may be fractional (recommendation guesses).
    pub fn calculate_request_cost(&self, model: &str, input_tokens: f64, output_tokens: f64) -> f64 {
        let Some(pricing) = self.models.get(model) else {
            info!(model, "Unknown model pricing, assuming zero cost");
            return 0.0;
        };

        let input_cost = (input_tokens.max(0.0) / 1_000_000.0) * pricing.input_cost_per_million;
        let output_cost = (output_tokens.max(0.0) / 1_000_000.0) * pricing.output_cost_per_million;
        input_cost + output_cost
    }

    /// `estimate(model, input, output)`: the word-count based estimate used after every call.
    pub fn estimate_cost(&self, model: &str, input_text: &str, output_text: &str) -> f64 {
        self.calculate_request_cost(
            model,
            estimate_tokens(input_text) as f64,
            estimate_tokens(output_text) as f64,
        )
    }

    /// Ranks every known model by estimated cost for `input_text` and picks one per complexity:
    /// cheapest for simple, second-cheapest for medium, cheapest premium-tier model for complex.
    pub fn recommend_model(&self, input_text: &str, complexity: Complexity) -> Option<ModelRecommendation> {
        let input_tokens = estimate_tokens(input_text) as f64;
        let output_tokens = (input_tokens * 0.5).min(RECOMMENDATION_OUTPUT_TOKEN_CAP);

        let mut ranked: Vec<(&str, f64)> = self
            .models
            .keys()
            .map(|model| {
                (
                    model.as_str(),
                    self.calculate_request_cost(model, input_tokens, output_tokens),
                )
            })
            .collect();
        ranked.sort_by(|a, b| a.1.total_cmp(&b.1));

        let cheapest = *ranked.first()?;
        let (selected, reasoning) = match complexity {
            Complexity::Simple => (cheapest, "Simple task - using most cost-effective model"),
            Complexity::Complex => (
                ranked
                    .iter()
                    .copied()
                    .find(|(model, _)| model.contains(PREMIUM_TIER_MARKER))
                    .unwrap_or(cheapest),
                "Complex task - using higher quality model despite cost",
            ),
            Complexity::Medium => (
                ranked.get(1).copied().unwrap_or(cheapest),
                "Medium complexity - balancing cost and quality",
            ),
        };

        Some(ModelRecommendation {
            model: selected.0.to_string(),
            estimated_cost: selected.1,
            reasoning: reasoning.to_string(),
        })
    }
}

/// Token estimate: `ceil(words / 0.75)`; empty or whitespace-only text is zero tokens.
pub fn estimate_tokens(text: &str) -> u64 {
    let words = text.split_whitespace().count() as f64;
    (words / WORDS_PER_TOKEN).ceil() as u64
}

/// Projects today's spend after one more request against the profile's daily
/// budget, flagging it with the profile's warning and critical percentages.
///
/// A zero budget only admits zero-cost requests.
pub fn check_budget(profile: &AiProfile, current_daily_cost: f64, estimated_request_cost: f64) -> BudgetCheck {
    let daily_budget = profile.daily_budget;
    let projected = current_daily_cost + estimated_request_cost;
    let remaining = daily_budget - projected;

    let usage_percent = if daily_budget > 0.0 {
        projected / daily_budget * 100.0
    } else if projected > 0.0 {
        100.0
    } else {
        0.0
    };

    let warning_level = if usage_percent > profile.critical_threshold {
        BudgetWarning::Critical
    } else if usage_percent > profile.warning_threshold {
        BudgetWarning::Low
    } else {
        BudgetWarning::None
    };

    BudgetCheck {
        can_proceed: projected <= daily_budget,
        remaining_budget: remaining.max(0.0),
        warning_level,
    }
}

/// Sub-cent amounts are shown in thousandths of a dollar.
pub fn format_cost(cost: f64) -> String {
    if cost < 0.01 {
        format!("${:.2}‰", cost * 1000.0)
    } else {
        format!("${cost:.4}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::features::AiTier;

    #[test]
    fn test_empty_text_costs_nothing_for_every_model() {
        let table = PricingTable::default();
        for model in table.entries().keys() {
            assert_eq!(table.estimate_cost(model, "", ""), 0.0, "model {model}");
        }
    }

    #[test]
    fn test_token_estimate_rounds_up() {
        assert_eq!(estimate_tokens(""), 0);
        assert_eq!(estimate_tokens("   \n\t "), 0);
        assert_eq!(estimate_tokens("one"), 2); // 1 / 0.75 = 1.33
        assert_eq!(estimate_tokens("one two three"), 4); // 3 / 0.75 = 4
        assert_eq!(estimate_tokens("a  b\n c\td"), 6); // 4 / 0.75 = 5.33
    }

    #[test]
    fn test_flash_cost_matches_price_table() {
        let table = PricingTable::default();
        // 3 words in → 4 tokens, 3 words out → 4 tokens
        let cost = table.estimate_cost("gemini-1.5-flash", "fix this text", "fixed the text");
        let expected = 4.0 / 1_000_000.0 * 0.075 + 4.0 / 1_000_000.0 * 0.30;
        assert!((cost - expected).abs() < 1e-15, "cost was {cost}");
    }

    #[test]
    fn test_unknown_model_costs_zero() {
        let table = PricingTable::default();
        assert_eq!(table.estimate_cost("gpt-unknown", "hello there", "hi"), 0.0);
    }

    #[test]
    fn test_cost_is_monotonic_in_text_length() {
        let table = PricingTable::default();
        let mut last = 0.0;
        let mut input = String::new();
        for i in 0..50 {
            input.push_str("word ");
            let cost = table.estimate_cost("gemini-1.5-pro", &input, &"out ".repeat(i));
            assert!(cost >= last, "cost decreased at step {i}");
            assert!(cost >= 0.0);
            last = cost;
        }
    }

    #[test]
    fn test_recommend_simple_picks_cheapest() {
        let table = PricingTable::default();
        let rec = table.recommend_model("analyze this resume please", Complexity::Simple).unwrap();
        assert_eq!(rec.model, "gemini-1.5-flash");
    }

    #[test]
    fn test_recommend_medium_picks_second_cheapest() {
        let table = PricingTable::default();
        let rec = table.recommend_model("analyze this resume please", Complexity::Medium).unwrap();
        assert_eq!(rec.model, "gemini-1.0-pro");
    }

    #[test]
    fn test_recommend_complex_picks_cheapest_pro_model() {
        let table = PricingTable::default();
        let rec = table.recommend_model("analyze this resume please", Complexity::Complex).unwrap();
        assert_eq!(rec.model, "gemini-1.0-pro");
        assert!(rec.reasoning.contains("Complex"));
    }

    #[test]
    fn test_recommend_complex_falls_back_to_cheapest_without_premium_tier() {
        let table = PricingTable::from_entries([
            ("small-model", ModelPricing::new("Small", 0.1, 0.2)),
            ("large-model", ModelPricing::new("Large", 1.0, 2.0)),
        ]);
        let rec = table.recommend_model("some input", Complexity::Complex).unwrap();
        assert_eq!(rec.model, "small-model");
    }

    #[test]
    fn test_recommend_medium_with_single_model_uses_it() {
        let table = PricingTable::from_entries([("only-model", ModelPricing::new("Only", 1.0, 1.0))]);
        let rec = table.recommend_model("text", Complexity::Medium).unwrap();
        assert_eq!(rec.model, "only-model");
    }

    #[test]
    fn test_recommend_with_empty_table_is_none() {
        let table = PricingTable::from_entries([]);
        assert!(table.recommend_model("text", Complexity::Simple).is_none());
    }

    fn profile_with_budget(tier: AiTier, daily_budget: f64) -> AiProfile {
        AiProfile {
            daily_budget,
            ..AiProfile::for_tier(tier)
        }
    }

    #[test]
    fn test_budget_within_limit() {
        let check = check_budget(&profile_with_budget(AiTier::Basic, 5.0), 2.5, 0.1);
        assert!(check.can_proceed);
        assert!((check.remaining_budget - 2.4).abs() < 1e-9);
        assert_eq!(check.warning_level, BudgetWarning::None);
    }

    #[test]
    fn test_basic_tier_thresholds() {
        let profile = AiProfile::for_tier(AiTier::Basic); // $0.50/day, 75/90
        assert_eq!(check_budget(&profile, 0.35, 0.0).warning_level, BudgetWarning::None); // 70%
        assert_eq!(check_budget(&profile, 0.40, 0.0).warning_level, BudgetWarning::Low); // 80%
        assert_eq!(check_budget(&profile, 0.46, 0.0).warning_level, BudgetWarning::Critical); // 92%
    }

    #[test]
    fn test_premium_tier_warns_earlier() {
        let profile = AiProfile::for_tier(AiTier::Premium); // $2.00/day, 70/85
        assert_eq!(check_budget(&profile, 1.44, 0.0).warning_level, BudgetWarning::Low); // 72%
        assert_eq!(check_budget(&profile, 1.76, 0.0).warning_level, BudgetWarning::Critical); // 88%
    }

    #[test]
    fn test_free_tier_thresholds_apply_to_overridden_budget() {
        let profile = profile_with_budget(AiTier::Free, 1.0); // 80/95
        assert_eq!(check_budget(&profile, 0.77, 0.0).warning_level, BudgetWarning::None);
        assert_eq!(check_budget(&profile, 0.90, 0.0).warning_level, BudgetWarning::Low);
        assert_eq!(check_budget(&profile, 0.96, 0.0).warning_level, BudgetWarning::Critical);
    }

    #[test]
    fn test_budget_exceeded_clamps_remaining() {
        let check = check_budget(&profile_with_budget(AiTier::Basic, 1.0), 0.99, 0.5);
        assert!(!check.can_proceed);
        assert_eq!(check.remaining_budget, 0.0);
        assert_eq!(check.warning_level, BudgetWarning::Critical);
    }

    #[test]
    fn test_zero_budget_admits_only_free_requests() {
        let profile = AiProfile::for_tier(AiTier::Free);
        assert!(check_budget(&profile, 0.0, 0.0).can_proceed);
        assert!(!check_budget(&profile, 0.0, 0.001).can_proceed);
    }

    #[test]
    fn test_format_cost() {
        assert_eq!(format_cost(0.0015), "$1.50‰");
        assert_eq!(format_cost(0.25), "$0.2500");
    }
}
