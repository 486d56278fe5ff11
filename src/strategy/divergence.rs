use crate::core::error::PipelineError;
use crate::core::types::{MarketSnapshot, TokenOutcome};
use crate::forecast::types::Forecast;
use rust_decimal::Decimal;
use serde::Serialize;

/// Distance between the market-implied probability of the forecast's outcome
/// and the forecast itself. `delta` is never negative; the direction is
/// recovered by the strategy from the two prices.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Divergence {
    pub axis: TokenOutcome,
    pub outcome_price: Decimal,
    pub predicted_probability: Decimal,
    pub delta: Decimal,
}

impl Divergence {
    pub fn delta_percent(&self) -> Decimal {
        self.delta * Decimal::ONE_HUNDRED
    }
}

pub fn delta(a: Decimal, b: Decimal) -> Decimal {
    (a - b).abs()
}

pub fn compute_divergence(
    market: &MarketSnapshot,
    forecast: &Forecast,
) -> Result<Divergence, PipelineError> {
    if forecast.probability < Decimal::ZERO || forecast.probability > Decimal::ONE_HUNDRED {
        return Err(PipelineError::InvalidInput(format!(
            "probability {} is outside [0, 100]",
            forecast.probability
        )));
    }

    let axis = forecast.outcome.price_axis();
    let outcome_price = market.price_of(axis).ok_or_else(|| {
        PipelineError::InvalidInput(format!(
            "market {} has no usable price (yesPrice = {:?})",
            market.market_id, market.yes_price
        ))
    })?;
    let predicted_probability = forecast.probability_fraction();

    Ok(Divergence {
        axis,
        outcome_price,
        predicted_probability,
        delta: delta(outcome_price, predicted_probability),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::TokenPair;
    use crate::forecast::types::{DataQuality, Outcome, QualityTier};
    use chrono::Utc;
    use proptest::prelude::*;
    use rust_decimal_macros::dec;

    fn market(yes: Option<Decimal>) -> MarketSnapshot {
        MarketSnapshot {
            market_id: "m1".to_string(),
            question: String::new(),
            description: String::new(),
            yes_price: yes,
            closed: false,
            tokens: TokenPair {
                yes: "y".to_string(),
                no: "n".to_string(),
            },
        }
    }

    fn forecast(outcome: Outcome, probability: Decimal) -> Forecast {
        Forecast {
            outcome,
            probability,
            confidence: dec!(50),
            outcome_reasoning: "reasoning text".to_string(),
            confidence_reasoning: "reasoning text".to_string(),
            key_factors: vec!["x".to_string()],
            data_quality: DataQuality::Tier(QualityTier::Medium),
            last_updated: Utc::now(),
        }
    }

    #[test]
    fn test_yes_uses_yes_price() {
        let d = compute_divergence(&market(Some(dec!(0.40))), &forecast(Outcome::Yes, dec!(70)))
            .unwrap();
        assert_eq!(d.axis, TokenOutcome::Yes);
        assert_eq!(d.outcome_price, dec!(0.40));
        assert_eq!(d.delta, dec!(0.30));
        assert_eq!(d.delta_percent(), dec!(30));
    }

    #[test]
    fn test_no_uses_complement_price() {
        let d = compute_divergence(&market(Some(dec!(0.30))), &forecast(Outcome::No, dec!(80)))
            .unwrap();
        assert_eq!(d.axis, TokenOutcome::No);
        assert_eq!(d.outcome_price, dec!(0.70));
        assert_eq!(d.delta, dec!(0.10));
    }

    #[test]
    fn test_uncertain_reads_yes_axis() {
        let d = compute_divergence(
            &market(Some(dec!(0.55))),
            &forecast(Outcome::Uncertain, dec!(50)),
        )
        .unwrap();
        assert_eq!(d.axis, TokenOutcome::Yes);
        assert_eq!(d.delta, dec!(0.05));
    }

    #[test]
    fn test_delta_is_absolute() {
        let d = compute_divergence(&market(Some(dec!(0.80))), &forecast(Outcome::Yes, dec!(55)))
            .unwrap();
        assert_eq!(d.delta, dec!(0.25));
    }

    #[test]
    fn test_missing_price_is_invalid_not_zero() {
        for yes in [None, Some(dec!(1.5)), Some(dec!(-0.2))] {
            let res = compute_divergence(&market(yes), &forecast(Outcome::Yes, dec!(50)));
            assert!(matches!(res, Err(PipelineError::InvalidInput(_))));
        }
    }

    #[test]
    fn test_probability_out_of_range_is_invalid() {
        let res = compute_divergence(&market(Some(dec!(0.5))), &forecast(Outcome::Yes, dec!(101)));
        assert!(matches!(res, Err(PipelineError::InvalidInput(_))));
    }

    proptest! {
        #[test]
        fn prop_delta_is_symmetric_and_zero_on_equal(p in 0u32..=10_000, q in 0u32..=10_000) {
            let p = Decimal::new(p as i64, 4);
            let q = Decimal::new(q as i64, 4);
            prop_assert_eq!(delta(p, q), delta(q, p));
            prop_assert!(delta(p, q) >= Decimal::ZERO);
            prop_assert!(delta(p, q) <= Decimal::ONE);
            prop_assert_eq!(delta(p, p), Decimal::ZERO);
        }
    }
}
