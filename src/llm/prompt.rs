use crate::core::types::{ChatMessage, MarketSnapshot};
use crate::forecast::types::DataQualityKind;
use chrono::{DateTime, Utc};

const SYSTEM_PROMPT: &str = "You are a careful forecasting analyst for binary prediction markets. \
You estimate how likely a question is to resolve YES and you answer with a single JSON object only.";

fn data_quality_rule(kind: DataQualityKind) -> &'static str {
    match kind {
        DataQualityKind::Tier => {
            "- \"dataQuality\": one of \"HIGH\", \"MEDIUM\", \"LOW\" describing how good the available evidence is"
        }
        DataQualityKind::Score => {
            "- \"dataQuality\": number from 0 to 100 describing how good the available evidence is"
        }
    }
}

/// Chat messages asking for a structured forecast of `market`.
pub fn forecast_messages(
    market: &MarketSnapshot,
    research: Option<&str>,
    data_quality: DataQualityKind,
    now: DateTime<Utc>,
) -> Vec<ChatMessage> {
    let mut user = format!(
        "Today is {}.\n\nMarket question: \"{}\"\n",
        now.format("%Y-%m-%d"),
        market.question
    );
    if !market.description.is_empty() {
        user.push_str(&format!("Resolution details: \"{}\"\n", market.description));
    }
    if let Some(context) = research.filter(|c| !c.trim().is_empty()) {
        user.push_str("\nRecent research:\n");
        user.push_str(context);
        user.push('\n');
    }

    user.push_str(&format!(
        "
Think about base rates, the latest evidence and how the question resolves, then output strictly valid JSON with fields:
- \"outcome\": \"YES\", \"NO\" or \"UNCERTAIN\"
- \"probability\": number from 0 to 100, the probability of your predicted outcome (for UNCERTAIN, the probability of YES)
- \"confidence\": number from 0 to 100, how much you trust this estimate
- \"outcomeReasoning\": a few sentences explaining the outcome
- \"confidenceReasoning\": a few sentences explaining the confidence
- \"keyFactors\": list of the most important factors
{}
- \"lastUpdated\": ISO-8601 timestamp of the newest evidence you relied on
",
        data_quality_rule(data_quality)
    ));

    vec![ChatMessage::system(SYSTEM_PROMPT), ChatMessage::user(user)]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::{Role, TokenPair};
    use chrono::TimeZone;

    fn market() -> MarketSnapshot {
        MarketSnapshot {
            market_id: "1".to_string(),
            question: "Will the Fed cut rates in December?".to_string(),
            description: "Resolves YES on an announced cut.".to_string(),
            yes_price: None,
            closed: false,
            tokens: TokenPair {
                yes: "y".to_string(),
                no: "n".to_string(),
            },
        }
    }

    #[test]
    fn test_prompt_shape() {
        let now = Utc.with_ymd_and_hms(2026, 10, 19, 0, 0, 0).unwrap();
        let msgs = forecast_messages(&market(), Some("- CPI cooled in September"), DataQualityKind::Score, now);
        assert_eq!(msgs.len(), 2);
        assert_eq!(msgs[0].role, Role::System);
        assert_eq!(msgs[1].role, Role::User);
        let user = &msgs[1].content;
        assert!(user.contains("2026-10-19"));
        assert!(user.contains("Will the Fed cut rates in December?"));
        assert!(user.contains("CPI cooled"));
        assert!(user.contains("number from 0 to 100 describing"));
    }

    #[test]
    fn test_blank_research_is_omitted() {
        let msgs = forecast_messages(&market(), Some("  "), DataQualityKind::Tier, Utc::now());
        assert!(!msgs[1].content.contains("Recent research"));
        assert!(msgs[1].content.contains("\"HIGH\", \"MEDIUM\", \"LOW\""));
    }
}
