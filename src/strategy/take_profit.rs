use crate::config::config::StrategyCfg;
use crate::core::error::PipelineError;
use crate::core::types::{OrderType, PlanMode, Side, TokenOutcome, TradeLeg, TradePlan};
use crate::strategy::types::{Branch, Rejection, StrategyDecision, StrategyInput};
use rust_decimal::Decimal;
use tracing::debug;
use uuid::Uuid;

/// Confidence-scaled take-profit strategy.
///
/// Buys whichever side the forecast says is cheap and parks a limit sell part
/// of the way toward the forecast's own price. The share of the edge it tries
/// to capture is `confidence / 200`, so even a fully confident forecast only
/// targets half the predicted move.
pub struct TakeProfitStrategy {
    min_delta_percent: Decimal,
    unit_size: Decimal,
    mode: PlanMode,
}

impl Default for TakeProfitStrategy {
    fn default() -> Self {
        Self::new(&StrategyCfg::default())
    }
}

impl TakeProfitStrategy {
    pub fn new(cfg: &StrategyCfg) -> Self {
        Self {
            min_delta_percent: cfg.min_delta_percent,
            unit_size: cfg.unit_size,
            mode: cfg.mode,
        }
    }

    pub fn evaluate(&self, input: &StrategyInput) -> Result<StrategyDecision, PipelineError> {
        check_inputs(input)?;

        let market = input.current_market_price;
        let prediction = input.prediction_probability;
        let delta_percent = input.delta() * Decimal::ONE_HUNDRED;

        if delta_percent < self.min_delta_percent {
            debug!(
                market_id = %input.market_id,
                %delta_percent,
                min = %self.min_delta_percent,
                "Divergence below threshold"
            );
            return Ok(StrategyDecision::Skip(Rejection::BelowThreshold {
                delta_percent: delta_percent.normalize(),
                min_delta_percent: self.min_delta_percent,
            }));
        }

        let predicted = input.outcome.price_axis();
        let (branch, buy, entry, fair) = match market.cmp(&prediction) {
            std::cmp::Ordering::Less => (Branch::Underpriced, predicted, market, prediction),
            std::cmp::Ordering::Greater => (
                Branch::Overpriced,
                predicted.opposite(),
                Decimal::ONE - market,
                Decimal::ONE - prediction,
            ),
            std::cmp::Ordering::Equal => {
                return Err(PipelineError::InvariantViolation(format!(
                    "market price equals prediction ({}) for {} after the threshold gate",
                    market, input.market_id
                )));
            }
        };

        let profit_fraction = input.confidence / Decimal::from(200);
        // Left unrounded: any rounding can pull a thin target back onto the entry.
        let target = entry + (fair - entry) * profit_fraction;
        if target == entry {
            debug!(
                market_id = %input.market_id,
                %entry,
                confidence = %input.confidence,
                "No room for a profit target"
            );
            return Ok(StrategyDecision::Skip(Rejection::NoProfitTarget {
                entry: entry.normalize(),
                confidence: input.confidence.normalize(),
            }));
        }

        let token_id = input.tokens.token_for(buy).to_string();
        let notes = format!(
            "{}: buy {} at {}, take profit at {} (delta {}%, confidence {})",
            branch,
            buy,
            entry.normalize(),
            target.normalize(),
            delta_percent.normalize(),
            input.confidence.normalize()
        );

        Ok(StrategyDecision::Trade(TradePlan {
            plan_id: self.plan_id(input),
            mode: self.mode,
            notes: Some(notes),
            trades: vec![
                self.leg(&token_id, buy, Side::Buy, OrderType::Market, entry),
                self.leg(&token_id, buy, Side::Sell, OrderType::Limit, target),
            ],
        }))
    }

    fn leg(
        &self,
        token_id: &str,
        outcome: TokenOutcome,
        side: Side,
        order_type: OrderType,
        price: Decimal,
    ) -> TradeLeg {
        TradeLeg {
            market_token_id: token_id.to_string(),
            outcome,
            side,
            order_type,
            size: self.unit_size,
            price: Some(price.normalize()),
        }
    }

    /// Derived from the inputs only, so re-evaluating the same inputs yields
    /// the same id.
    fn plan_id(&self, input: &StrategyInput) -> String {
        let key = format!(
            "{}|{}|{}|{}|{}|{}|{}|{}|{}",
            input.market_id,
            input.tokens.yes,
            input.tokens.no,
            input.outcome,
            input.prediction_probability.normalize(),
            input.current_market_price.normalize(),
            input.confidence.normalize(),
            self.unit_size.normalize(),
            self.mode.as_str(),
        );
        Uuid::new_v5(&Uuid::NAMESPACE_OID, key.as_bytes()).to_string()
    }
}

fn check_inputs(input: &StrategyInput) -> Result<(), PipelineError> {
    let unit = Decimal::ZERO..=Decimal::ONE;
    if !unit.contains(&input.current_market_price) {
        return Err(PipelineError::InvalidInput(format!(
            "market price {} is outside [0, 1]",
            input.current_market_price
        )));
    }
    if !unit.contains(&input.prediction_probability) {
        return Err(PipelineError::InvalidInput(format!(
            "prediction {} is outside [0, 1]",
            input.prediction_probability
        )));
    }
    if !(Decimal::ZERO..=Decimal::ONE_HUNDRED).contains(&input.confidence) {
        return Err(PipelineError::InvalidInput(format!(
            "confidence {} is outside [0, 100]",
            input.confidence
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::TokenPair;
    use crate::forecast::types::Outcome;
    use rust_decimal_macros::dec;

    fn input(outcome: Outcome, market: Decimal, prediction: Decimal, confidence: Decimal) -> StrategyInput {
        StrategyInput {
            market_id: "m1".to_string(),
            tokens: TokenPair {
                yes: "token_yes".to_string(),
                no: "token_no".to_string(),
            },
            outcome,
            prediction_probability: prediction,
            current_market_price: market,
            confidence,
        }
    }

    fn plan(decision: StrategyDecision) -> TradePlan {
        match decision {
            StrategyDecision::Trade(plan) => plan,
            StrategyDecision::Skip(r) => panic!("expected a trade, got {:?}", r),
        }
    }

    #[test]
    fn test_underpriced_buys_predicted_outcome() {
        let strategy = TakeProfitStrategy::default();
        let p = plan(
            strategy
                .evaluate(&input(Outcome::Yes, dec!(0.40), dec!(0.70), dec!(100)))
                .unwrap(),
        );

        assert_eq!(p.trades.len(), 2);
        let entry = &p.trades[0];
        assert_eq!(entry.outcome, TokenOutcome::Yes);
        assert_eq!(entry.market_token_id, "token_yes");
        assert_eq!(entry.side, Side::Buy);
        assert_eq!(entry.order_type, OrderType::Market);
        assert_eq!(entry.price, Some(dec!(0.40)));

        let exit = &p.trades[1];
        assert_eq!(exit.outcome, TokenOutcome::Yes);
        assert_eq!(exit.market_token_id, "token_yes");
        assert_eq!(exit.side, Side::Sell);
        assert_eq!(exit.order_type, OrderType::Limit);
        assert_eq!(exit.price, Some(dec!(0.55)));
        assert_eq!(entry.size, exit.size);
        assert_eq!(p.mode, PlanMode::Paper);
    }

    #[test]
    fn test_overpriced_buys_opposite_outcome() {
        let strategy = TakeProfitStrategy::default();
        let p = plan(
            strategy
                .evaluate(&input(Outcome::Yes, dec!(0.80), dec!(0.55), dec!(60)))
                .unwrap(),
        );

        let entry = &p.trades[0];
        assert_eq!(entry.outcome, TokenOutcome::No);
        assert_eq!(entry.market_token_id, "token_no");
        assert_eq!(entry.price, Some(dec!(0.20)));

        // 0.20 + ((1 - 0.55) - 0.20) * 0.30
        let exit = &p.trades[1];
        assert_eq!(exit.outcome, TokenOutcome::No);
        assert_eq!(exit.market_token_id, "token_no");
        assert_eq!(exit.price, Some(dec!(0.275)));
    }

    #[test]
    fn test_no_forecast_overpriced_buys_yes_token() {
        // Predicted NO, NO trades at 0.70 but forecast says 0.40 -> buy YES at 0.30.
        let strategy = TakeProfitStrategy::default();
        let p = plan(
            strategy
                .evaluate(&input(Outcome::No, dec!(0.70), dec!(0.40), dec!(50)))
                .unwrap(),
        );
        assert_eq!(p.trades[0].outcome, TokenOutcome::Yes);
        assert_eq!(p.trades[0].market_token_id, "token_yes");
        assert_eq!(p.trades[0].price, Some(dec!(0.30)));
        // 0.30 + (0.60 - 0.30) * 0.25
        assert_eq!(p.trades[1].price, Some(dec!(0.375)));
    }

    #[test]
    fn test_half_confidence_captures_quarter_of_edge() {
        let strategy = TakeProfitStrategy::default();
        let p = plan(
            strategy
                .evaluate(&input(Outcome::Yes, dec!(0.40), dec!(0.80), dec!(50)))
                .unwrap(),
        );
        assert_eq!(p.trades[1].price, Some(dec!(0.50)));
    }

    #[test]
    fn test_target_sits_between_entry_and_forecast() {
        let strategy = TakeProfitStrategy::default();
        for conf in [dec!(1), dec!(33), dec!(77), dec!(100)] {
            let p = plan(
                strategy
                    .evaluate(&input(Outcome::Yes, dec!(0.30), dec!(0.62), conf))
                    .unwrap(),
            );
            let target = p.trades[1].price.unwrap();
            assert!(target > dec!(0.30) && target < dec!(0.62), "conf={conf}");
        }
    }

    #[test]
    fn test_low_confidence_target_stays_off_the_entry() {
        let strategy = TakeProfitStrategy::default();
        let p = plan(
            strategy
                .evaluate(&input(Outcome::Yes, dec!(0.40), dec!(0.43), dec!(0.3)))
                .unwrap(),
        );
        let entry = p.trades[0].price.unwrap();
        let exit = p.trades[1].price.unwrap();
        assert_eq!(entry, dec!(0.40));
        // 0.40 + 0.03 * 0.0015
        assert_eq!(exit, dec!(0.400045));
        assert!(exit > entry && exit < dec!(0.43));
    }

    #[test]
    fn test_zero_confidence_is_a_skip() {
        let strategy = TakeProfitStrategy::default();
        let decision = strategy
            .evaluate(&input(Outcome::Yes, dec!(0.40), dec!(0.70), dec!(0)))
            .unwrap();
        assert_eq!(
            decision,
            StrategyDecision::Skip(Rejection::NoProfitTarget {
                entry: dec!(0.4),
                confidence: dec!(0),
            })
        );
    }

    #[test]
    fn test_below_threshold_is_a_skip() {
        let strategy = TakeProfitStrategy::default();
        let decision = strategy
            .evaluate(&input(Outcome::Yes, dec!(0.51), dec!(0.52), dec!(90)))
            .unwrap();
        assert_eq!(
            decision,
            StrategyDecision::Skip(Rejection::BelowThreshold {
                delta_percent: dec!(1),
                min_delta_percent: dec!(2.5),
            })
        );
    }

    #[test]
    fn test_threshold_is_inclusive() {
        let strategy = TakeProfitStrategy::default();
        let decision = strategy
            .evaluate(&input(Outcome::Yes, dec!(0.500), dec!(0.525), dec!(90)))
            .unwrap();
        assert!(matches!(decision, StrategyDecision::Trade(_)));
    }

    #[test]
    fn test_equal_prices_without_gate_is_invariant_violation() {
        let strategy = TakeProfitStrategy::new(&StrategyCfg {
            min_delta_percent: Decimal::ZERO,
            ..Default::default()
        });
        let res = strategy.evaluate(&input(Outcome::Yes, dec!(0.5), dec!(0.5), dec!(80)));
        assert!(matches!(res, Err(PipelineError::InvariantViolation(_))));
    }

    #[test]
    fn test_out_of_range_inputs_are_rejected() {
        let strategy = TakeProfitStrategy::default();
        for bad in [
            input(Outcome::Yes, dec!(1.1), dec!(0.5), dec!(50)),
            input(Outcome::Yes, dec!(0.5), dec!(-0.1), dec!(50)),
            input(Outcome::Yes, dec!(0.2), dec!(0.5), dec!(101)),
        ] {
            assert!(matches!(
                strategy.evaluate(&bad),
                Err(PipelineError::InvalidInput(_))
            ));
        }
    }

    #[test]
    fn test_evaluation_is_idempotent() {
        let strategy = TakeProfitStrategy::default();
        let i = input(Outcome::Yes, dec!(0.40), dec!(0.70), dec!(100));
        let a = strategy.evaluate(&i).unwrap();
        let b = strategy.evaluate(&i).unwrap();
        assert_eq!(a, b);

        let other = strategy
            .evaluate(&input(Outcome::Yes, dec!(0.40), dec!(0.70), dec!(90)))
            .unwrap();
        assert_ne!(plan(a).plan_id, plan(other).plan_id);
    }

    #[test]
    fn test_unit_size_and_mode_come_from_config() {
        let strategy = TakeProfitStrategy::new(&StrategyCfg {
            unit_size: dec!(5),
            mode: PlanMode::Live,
            ..Default::default()
        });
        let p = plan(
            strategy
                .evaluate(&input(Outcome::Yes, dec!(0.40), dec!(0.70), dec!(100)))
                .unwrap(),
        );
        assert_eq!(p.mode, PlanMode::Live);
        assert!(p.trades.iter().all(|t| t.size == dec!(5)));
    }
}
