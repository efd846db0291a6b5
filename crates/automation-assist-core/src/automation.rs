//! Registration parameters: epoch timing, expiry and fee defaults, duration estimates.

use crate::client::ChainQuery;
use crate::error::{AssistError, Result};
use num_bigint::BigUint;
use serde_json::{json, Value};
use tracing::warn;

pub const RECONFIGURATION_RESOURCE: &str = "0x1::reconfiguration::Configuration";
pub const REGISTRY_CONFIG_RESOURCE: &str = "0x1::automation_registry::ActiveAutomationRegistryConfig";
pub const ESTIMATE_FEE_FUNCTION: &str = "0x1::automation_registry::estimate_automation_fee";
const FRAMEWORK_ADDRESS: &str = "0x1";

pub const EPOCH_INTERVAL_SECS: u64 = 7200;
pub const EXPIRY_BUFFER_SECS: u64 = 300;
/// Used until the registry config has been read.
pub const DEFAULT_TASK_DURATION_CAP_SECS: u64 = 7 * 24 * 60 * 60;
pub const DEFAULT_MAX_GAS_AMOUNT: u64 = 5000;
pub const DEFAULT_GAS_PRICE_CAP: u64 = 200;
pub const FALLBACK_AUTOMATION_FEE: u64 = 1_929_736_800;

/// Base units per whole token.
const TOKEN_DECIMALS_DIVISOR: u64 = 1_000_000;
pub const EXECUTIONS_PER_DAY: u64 = 288;
const SECS_PER_DAY: u64 = 86_400;

/// Gas, fee and expiry fields of a registration, kept as arbitrary-precision integers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AutomationParams {
    pub max_gas_amount: BigUint,
    pub gas_price_cap: BigUint,
    pub automation_fee_cap: BigUint,
    pub expiry_time_secs: BigUint,
}

impl AutomationParams {
    pub fn new(
        max_gas_amount: impl Into<BigUint>,
        gas_price_cap: impl Into<BigUint>,
        automation_fee_cap: impl Into<BigUint>,
        expiry_time_secs: impl Into<BigUint>,
    ) -> Self {
        Self {
            max_gas_amount: max_gas_amount.into(),
            gas_price_cap: gas_price_cap.into(),
            automation_fee_cap: automation_fee_cap.into(),
            expiry_time_secs: expiry_time_secs.into(),
        }
    }

    /// Default gas limits with the given fee cap and expiry.
    pub fn with_defaults(automation_fee_cap: impl Into<BigUint>, expiry_time_secs: u64) -> Self {
        Self::new(
            DEFAULT_MAX_GAS_AMOUNT,
            DEFAULT_GAS_PRICE_CAP,
            automation_fee_cap,
            expiry_time_secs,
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EpochInfo {
    pub last_reconfiguration_secs: u64,
    pub next_epoch_secs: u64,
}

impl EpochInfo {
    /// Reads `last_reconfiguration_time` (microseconds, string or number).
    pub fn from_resource(data: &Value) -> Result<Self> {
        let micros = match data.get("last_reconfiguration_time") {
            Some(Value::String(s)) => s.parse::<u64>().ok(),
            Some(Value::Number(n)) => n.as_u64(),
            _ => None,
        }
        .ok_or_else(|| {
            AssistError::InvalidResponse("missing last_reconfiguration_time".to_string())
        })?;

        let last = micros / 1_000_000;
        Ok(Self {
            last_reconfiguration_secs: last,
            next_epoch_secs: last + EPOCH_INTERVAL_SECS,
        })
    }

    /// Seconds until the next epoch, clamped at zero.
    pub fn time_to_next(&self, now: u64) -> u64 {
        self.next_epoch_secs.saturating_sub(now)
    }

    pub fn expiry_with_buffer(&self) -> u64 {
        self.next_epoch_secs.saturating_add(EXPIRY_BUFFER_SECS)
    }
}

/// Latest expiry allowed by the epoch schedule and the duration cap.
pub fn default_expiry(epoch: Option<&EpochInfo>, duration_cap_secs: u64, now: u64) -> u64 {
    let cap = now.saturating_add(duration_cap_secs);
    match epoch {
        Some(e) => e.expiry_with_buffer().min(cap),
        None => cap,
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeeEstimate {
    Quoted(BigUint),
    /// The view call failed; the amount is the built-in fallback.
    Fallback(BigUint),
}

impl FeeEstimate {
    pub fn amount(&self) -> &BigUint {
        match self {
            FeeEstimate::Quoted(a) | FeeEstimate::Fallback(a) => a,
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, FeeEstimate::Fallback(_))
    }
}

pub async fn fetch_epoch(chain: &dyn ChainQuery) -> Result<EpochInfo> {
    let data = chain
        .resource(FRAMEWORK_ADDRESS, RECONFIGURATION_RESOURCE)
        .await?;
    EpochInfo::from_resource(&data)
}

pub async fn fetch_duration_cap(chain: &dyn ChainQuery) -> Result<u64> {
    let data = chain
        .resource(FRAMEWORK_ADDRESS, REGISTRY_CONFIG_RESOURCE)
        .await?;
    match data.get("task_duration_cap_in_secs") {
        Some(Value::String(s)) => s.parse::<u64>().ok(),
        Some(Value::Number(n)) => n.as_u64(),
        _ => None,
    }
    .ok_or_else(|| AssistError::InvalidResponse("missing task_duration_cap_in_secs".to_string()))
}

pub async fn estimate_fee(chain: &dyn ChainQuery, max_gas_amount: &BigUint) -> FeeEstimate {
    let args = [json!(max_gas_amount.to_string())];
    let quoted = chain
        .view(ESTIMATE_FEE_FUNCTION, &[], &args)
        .await
        .and_then(|result| parse_fee(&result));

    match quoted {
        Ok(fee) => FeeEstimate::Quoted(fee),
        Err(e) => {
            warn!(error = %e, "fee estimate failed, using fallback");
            FeeEstimate::Fallback(BigUint::from(FALLBACK_AUTOMATION_FEE))
        }
    }
}

fn parse_fee(result: &Value) -> Result<BigUint> {
    let first = result
        .get(0)
        .ok_or_else(|| AssistError::InvalidResponse("empty fee result".to_string()))?;
    let text = match first {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        other => return Err(AssistError::InvalidResponse(format!("bad fee {}", other))),
    };
    crate::types::parse_unsigned(&text)
        .ok_or_else(|| AssistError::InvalidResponse(format!("bad fee {}", text)))
}

/// Everything the configure stage needs, gathered in one pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkSnapshot {
    pub epoch: Option<EpochInfo>,
    pub duration_cap_secs: u64,
    pub fee: FeeEstimate,
    pub now: u64,
}

impl NetworkSnapshot {
    pub async fn fetch(chain: &dyn ChainQuery, max_gas_amount: &BigUint, now: u64) -> Self {
        let epoch = match fetch_epoch(chain).await {
            Ok(e) => Some(e),
            Err(e) => {
                warn!(error = %e, "epoch data unavailable");
                None
            }
        };
        let duration_cap_secs = fetch_duration_cap(chain).await.unwrap_or_else(|e| {
            warn!(error = %e, "duration cap unavailable, using default");
            DEFAULT_TASK_DURATION_CAP_SECS
        });
        let fee = estimate_fee(chain, max_gas_amount).await;

        Self {
            epoch,
            duration_cap_secs,
            fee,
            now,
        }
    }

    pub fn default_expiry(&self) -> u64 {
        default_expiry(self.epoch.as_ref(), self.duration_cap_secs, self.now)
    }

    pub fn default_params(&self) -> AutomationParams {
        AutomationParams::with_defaults(self.fee.amount().clone(), self.default_expiry())
    }
}

/// `"1h 2m 3s"`, dropping leading zero units.
pub fn format_duration(seconds: i64) -> String {
    if seconds <= 0 {
        return "Epoch ended".to_string();
    }
    let hours = seconds / 3600;
    let minutes = (seconds % 3600) / 60;
    let secs = seconds % 60;

    if hours > 0 {
        format!("{}h {}m {}s", hours, minutes, secs)
    } else if minutes > 0 {
        format!("{}m {}s", minutes, secs)
    } else {
        format!("{}s", secs)
    }
}

/// Base units as whole tokens with two decimals, rounded half up.
pub fn format_tokens(amount: &BigUint) -> String {
    let cents = (amount + BigUint::from(TOKEN_DECIMALS_DIVISOR / 200))
        / BigUint::from(TOKEN_DECIMALS_DIVISOR / 100);
    let hundred = BigUint::from(100u8);
    format!("{}.{:0>2}", &cents / &hundred, (&cents % &hundred).to_string())
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DurationEstimate {
    pub days: u64,
    pub executions: u64,
    /// At half a token per execution.
    pub cost_tokens: String,
    pub expiry_time_secs: u64,
}

pub fn estimate_duration(days: u64, now: u64) -> DurationEstimate {
    let executions = EXECUTIONS_PER_DAY.saturating_mul(days);
    let whole = executions / 2;
    let cost_tokens = if executions % 2 == 0 {
        format!("{}.00", whole)
    } else {
        format!("{}.50", whole)
    };

    DurationEstimate {
        days,
        executions,
        cost_tokens,
        expiry_time_secs: now.saturating_add(days.saturating_mul(SECS_PER_DAY)),
    }
}

pub fn now_secs() -> u64 {
    chrono::Utc::now().timestamp().max(0) as u64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockChain;

    #[test]
    fn epoch_from_micros() {
        let epoch =
            EpochInfo::from_resource(&json!({"last_reconfiguration_time": "1700000000123456"}))
                .unwrap();
        assert_eq!(epoch.last_reconfiguration_secs, 1_700_000_000);
        assert_eq!(epoch.next_epoch_secs, 1_700_007_200);
        assert_eq!(epoch.time_to_next(1_700_007_000), 200);
        assert_eq!(epoch.time_to_next(1_800_000_000), 0);
        assert!(EpochInfo::from_resource(&json!({})).is_err());
    }

    #[test]
    fn expiry_is_min_of_epoch_and_cap() {
        let epoch = EpochInfo {
            last_reconfiguration_secs: 1000,
            next_epoch_secs: 8200,
        };
        assert_eq!(default_expiry(Some(&epoch), 100_000, 1000), 8500);
        assert_eq!(default_expiry(Some(&epoch), 10, 1000), 1010);
        assert_eq!(default_expiry(None, 600, 1000), 1600);
    }

    #[test]
    fn huge_duration_cap_saturates() {
        assert_eq!(default_expiry(None, u64::MAX, 1000), u64::MAX);
        let epoch = EpochInfo {
            last_reconfiguration_secs: 1000,
            next_epoch_secs: 8200,
        };
        assert_eq!(default_expiry(Some(&epoch), u64::MAX, 1000), 8500);
    }

    #[test]
    fn durations() {
        assert_eq!(format_duration(3723), "1h 2m 3s");
        assert_eq!(format_duration(123), "2m 3s");
        assert_eq!(format_duration(3), "3s");
        assert_eq!(format_duration(0), "Epoch ended");
        assert_eq!(format_duration(-5), "Epoch ended");
    }

    #[test]
    fn token_formatting() {
        assert_eq!(format_tokens(&BigUint::from(FALLBACK_AUTOMATION_FEE)), "1929.74");
        assert_eq!(format_tokens(&BigUint::from(0u8)), "0.00");
        assert_eq!(format_tokens(&BigUint::from(50_000u64)), "0.05");
    }

    #[test]
    fn duration_estimate() {
        let estimate = estimate_duration(3, 1000);
        assert_eq!(estimate.executions, 864);
        assert_eq!(estimate.cost_tokens, "432.00");
        assert_eq!(estimate.expiry_time_secs, 1000 + 3 * 86_400);
    }

    #[tokio::test]
    async fn fee_quote_and_fallback() {
        let chain = MockChain::default();
        chain.set_view_result(Ok(json!(["123456"])));
        let fee = estimate_fee(&chain, &BigUint::from(5000u32)).await;
        assert_eq!(fee, FeeEstimate::Quoted(BigUint::from(123_456u32)));

        chain.set_view_result(Err(AssistError::Timeout));
        let fee = estimate_fee(&chain, &BigUint::from(5000u32)).await;
        assert!(fee.is_fallback());
        assert_eq!(fee.amount(), &BigUint::from(FALLBACK_AUTOMATION_FEE));
    }

    #[tokio::test]
    async fn snapshot_degrades_without_epoch() {
        let chain = MockChain::default();
        chain.set_view_result(Err(AssistError::Timeout));
        let snapshot = NetworkSnapshot::fetch(&chain, &BigUint::from(5000u32), 1000).await;
        assert!(snapshot.epoch.is_none());
        assert_eq!(snapshot.duration_cap_secs, DEFAULT_TASK_DURATION_CAP_SECS);
        assert_eq!(snapshot.default_expiry(), 1000 + DEFAULT_TASK_DURATION_CAP_SECS);

        let params = snapshot.default_params();
        assert_eq!(params.max_gas_amount, BigUint::from(DEFAULT_MAX_GAS_AMOUNT));
        assert_eq!(params.automation_fee_cap, BigUint::from(FALLBACK_AUTOMATION_FEE));
    }

    #[tokio::test]
    async fn snapshot_reads_resources() {
        let chain = MockChain::default();
        chain.insert_resource(
            RECONFIGURATION_RESOURCE,
            json!({"last_reconfiguration_time": "1000000000"}),
        );
        chain.insert_resource(
            REGISTRY_CONFIG_RESOURCE,
            json!({"task_duration_cap_in_secs": "86400"}),
        );
        chain.set_view_result(Ok(json!([77])));

        let snapshot = NetworkSnapshot::fetch(&chain, &BigUint::from(5000u32), 1000).await;
        assert_eq!(snapshot.epoch.map(|e| e.next_epoch_secs), Some(8200));
        assert_eq!(snapshot.duration_cap_secs, 86_400);
        assert_eq!(snapshot.default_expiry(), 8500);
        assert_eq!(snapshot.fee, FeeEstimate::Quoted(BigUint::from(77u8)));
    }
}
