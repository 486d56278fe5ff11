pub mod divergence;
pub mod take_profit;
pub mod types;

pub use divergence::{Divergence, compute_divergence};
pub use take_profit::TakeProfitStrategy;
pub use types::{Branch, Rejection, StrategyDecision, StrategyInput};
