use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Historical Value-at-Risk at one confidence level.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VarEstimate {
    /// Confidence level, e.g. 0.95
    pub confidence: Decimal,
    /// Period return at the (1 - confidence) percentile; negative for a loss
    pub value_at_risk: Decimal,
    /// Mean of the returns at or below `value_at_risk`
    pub conditional_value_at_risk: Decimal,
}

/// Risk statistics derived from a snapshot history and the live positions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RiskMetrics {
    pub schema_version: u32,
    pub start_timestamp: DateTime<Utc>,
    pub end_timestamp: DateTime<Utc>,
    pub snapshot_count: usize,
    /// One estimate per configured confidence level, ascending by confidence
    pub value_at_risk: Vec<VarEstimate>,
    /// Herfindahl index of position weights (1 = single asset)
    pub concentration_risk: Decimal,
    /// 1 - value-weighted liquidity score (0 = fully liquid)
    pub liquidity_risk: Decimal,
    /// Value-weighted mean pairwise correlation of held assets
    pub correlation_risk: Decimal,
    /// Effective number of assets over actual number of assets
    pub diversification_ratio: Decimal,
    pub tracking_error: Decimal,
    pub asset_count: usize,
    pub benchmark_symbol: Option<String>,
}

impl RiskMetrics {
    /// The estimate for an exact confidence level, if it was computed.
    pub fn var_at(&self, confidence: Decimal) -> Option<&VarEstimate> {
        self.value_at_risk
            .iter()
            .find(|estimate| estimate.confidence == confidence)
    }
}
