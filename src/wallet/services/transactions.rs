//! Transaction Builder: turns a DEX action plus account context into a
//! transaction object ready for signing.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use thiserror::Error;
use tracing::debug;

use crate::utils::{is_hex_of_len, to_base_units, AmountError};
use crate::wallet::models::{Account, FlowError, TransactionObject};
use crate::wallet::services::fees::FeePolicy;
use crate::wallet::services::schemas::schema_for;

pub const MIN_TICK: i32 = -887_272;
pub const MAX_TICK: i32 = 887_272;
/// Fee tiers in parts per million: 0.01%, 0.05%, 0.3% and 1%.
pub const SUPPORTED_FEE_TIERS: [u64; 4] = [100, 500, 3_000, 10_000];
pub const DEFAULT_MAX_TIMESTAMP_VALID: u64 = 100_000_000_000;
const TOKEN_ID_LENGTH: usize = 8;
// fee tiers are given in percent, ppm is percent with four decimals
const FEE_TIER_DECIMALS: u8 = 4;

pub const DEX_MODULE: &str = "dex";
pub const DEX_GOVERNANCE_MODULE: &str = "dexGovernance";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BuildError {
    #[error("unknown command {module}:{command}")]
    UnknownCommand { module: String, command: String },
    #[error("invalid parameters: {0}")]
    Params(String),
    #[error("invalid {field}: {source}")]
    InvalidAmount {
        field: &'static str,
        #[source]
        source: AmountError,
    },
    #[error("{0} must be greater than zero")]
    NonPositive(&'static str),
    #[error("tick {0} is outside [-887272, 887272]")]
    TickOutOfRange(i32),
    #[error("tickLower {lower} must be below tickUpper {upper}")]
    InvalidTickRange { lower: i32, upper: i32 },
    #[error("unsupported fee tier: {0}%")]
    UnsupportedFeeTier(String),
    #[error("both sides reference token {0}")]
    SameToken(String),
    #[error("swap route is empty")]
    EmptyRoute,
    #[error("invalid token id: {0}")]
    InvalidTokenId(String),
    #[error("invalid {field}: {value}")]
    InvalidId { field: &'static str, value: String },
    #[error("no parameter schema for {0}")]
    MissingSchema(String),
}

impl From<BuildError> for FlowError {
    fn from(e: BuildError) -> Self {
        FlowError::InvalidParams(e.to_string())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DexCommand {
    CreatePool,
    CreatePosition,
    AddLiquidity,
    RemoveLiquidity,
    SwapExactIn,
    VoteOnProposal,
}

impl DexCommand {
    pub const ALL: [DexCommand; 6] = [
        DexCommand::CreatePool,
        DexCommand::CreatePosition,
        DexCommand::AddLiquidity,
        DexCommand::RemoveLiquidity,
        DexCommand::SwapExactIn,
        DexCommand::VoteOnProposal,
    ];

    pub fn module(self) -> &'static str {
        match self {
            DexCommand::VoteOnProposal => DEX_GOVERNANCE_MODULE,
            _ => DEX_MODULE,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            DexCommand::CreatePool => "createPool",
            DexCommand::CreatePosition => "createPosition",
            DexCommand::AddLiquidity => "addLiquidity",
            DexCommand::RemoveLiquidity => "removeLiquidity",
            DexCommand::SwapExactIn => "swapExactIn",
            DexCommand::VoteOnProposal => "voteOnProposal",
        }
    }

    pub fn from_parts(module: &str, command: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|c| c.module() == module && c.name() == command)
    }
}

/// A token as picked by the user, with the decimals used to scale amounts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenRef {
    #[serde(rename = "tokenID")]
    pub token_id: String,
    #[serde(default)]
    pub symbol: String,
    pub decimals: u8,
}

fn zero() -> Decimal {
    Decimal::ZERO
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePoolParams {
    pub token1: TokenRef,
    pub token2: TokenRef,
    pub fee_tier: Decimal,
    pub tick_initial_price: i32,
    pub token1_amount: Decimal,
    pub token2_amount: Decimal,
    #[serde(default)]
    pub tick_lower: Option<i32>,
    #[serde(default)]
    pub tick_upper: Option<i32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePositionParams {
    #[serde(rename = "poolID")]
    pub pool_id: String,
    pub token1: TokenRef,
    pub token2: TokenRef,
    #[serde(default)]
    pub tick_lower: Option<i32>,
    #[serde(default)]
    pub tick_upper: Option<i32>,
    pub token1_amount: Decimal,
    pub token2_amount: Decimal,
    #[serde(default = "zero")]
    pub token1_min: Decimal,
    #[serde(default = "zero")]
    pub token2_min: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddLiquidityParams {
    #[serde(rename = "positionID")]
    pub position_id: String,
    pub token1: TokenRef,
    pub token2: TokenRef,
    pub token1_amount: Decimal,
    pub token2_amount: Decimal,
    #[serde(default = "zero")]
    pub token1_min: Decimal,
    #[serde(default = "zero")]
    pub token2_min: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoveLiquidityParams {
    #[serde(rename = "positionID")]
    pub position_id: String,
    pub token1: TokenRef,
    pub token2: TokenRef,
    /// Liquidity units, already on-chain scale.
    pub liquidity_to_remove: Decimal,
    #[serde(default = "zero")]
    pub token1_min: Decimal,
    #[serde(default = "zero")]
    pub token2_min: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SwapExactInParams {
    pub token_in: TokenRef,
    pub token_out: TokenRef,
    pub amount_in: Decimal,
    #[serde(default = "zero")]
    pub min_amount_out: Decimal,
    pub swap_route: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum VoteDecision {
    Yes,
    No,
    Pass,
}

impl VoteDecision {
    fn as_u32(self) -> u32 {
        match self {
            VoteDecision::Yes => 0,
            VoteDecision::No => 1,
            VoteDecision::Pass => 2,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoteOnProposalParams {
    pub proposal_index: u32,
    pub decision: VoteDecision,
}

/// A user action, one variant per supported command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "command", content = "params", rename_all = "camelCase")]
pub enum DexAction {
    CreatePool(CreatePoolParams),
    CreatePosition(CreatePositionParams),
    AddLiquidity(AddLiquidityParams),
    RemoveLiquidity(RemoveLiquidityParams),
    SwapExactIn(SwapExactInParams),
    VoteOnProposal(VoteOnProposalParams),
}

impl DexAction {
    pub fn command(&self) -> DexCommand {
        match self {
            DexAction::CreatePool(_) => DexCommand::CreatePool,
            DexAction::CreatePosition(_) => DexCommand::CreatePosition,
            DexAction::AddLiquidity(_) => DexCommand::AddLiquidity,
            DexAction::RemoveLiquidity(_) => DexCommand::RemoveLiquidity,
            DexAction::SwapExactIn(_) => DexCommand::SwapExactIn,
            DexAction::VoteOnProposal(_) => DexCommand::VoteOnProposal,
        }
    }

    /// Parses an action from its `module`/`command` names and raw parameters.
    pub fn from_parts(module: &str, command: &str, params: Value) -> Result<Self, BuildError> {
        let dex_command = DexCommand::from_parts(module, command).ok_or_else(|| BuildError::UnknownCommand {
            module: module.to_string(),
            command: command.to_string(),
        })?;
        serde_json::from_value(json!({ "command": dex_command.name(), "params": params }))
            .map_err(|e| BuildError::Params(e.to_string()))
    }
}

/// Nonce and fee token resolved for the sending account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountContext {
    pub account: Account,
    pub nonce: u64,
    pub fee_token_id: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BuiltTransaction {
    pub transaction: TransactionObject,
    /// Every DEX command pays in the chain fee token.
    pub fee_token_id: String,
    pub schema: Value,
}

#[derive(Debug, Clone)]
pub struct TransactionBuilder {
    fees: FeePolicy,
    max_timestamp_valid: u64,
}

impl Default for TransactionBuilder {
    fn default() -> Self {
        Self::new(FeePolicy::default(), DEFAULT_MAX_TIMESTAMP_VALID)
    }
}

fn amount(field: &'static str, value: &Decimal, token: &TokenRef) -> Result<u64, BuildError> {
    to_base_units(*value, token.decimals).map_err(|source| BuildError::InvalidAmount { field, source })
}

fn positive(field: &'static str, value: u64) -> Result<u64, BuildError> {
    if value == 0 {
        return Err(BuildError::NonPositive(field));
    }
    Ok(value)
}

fn token_id(token: &TokenRef) -> Result<String, BuildError> {
    if !is_hex_of_len(&token.token_id, Some(TOKEN_ID_LENGTH)) {
        return Err(BuildError::InvalidTokenId(token.token_id.clone()));
    }
    Ok(token.token_id.to_lowercase())
}

fn distinct_tokens(a: &TokenRef, b: &TokenRef) -> Result<(String, String), BuildError> {
    let (a, b) = (token_id(a)?, token_id(b)?);
    if a == b {
        return Err(BuildError::SameToken(a));
    }
    Ok((a, b))
}

fn hex_id(field: &'static str, value: &str) -> Result<String, BuildError> {
    if !is_hex_of_len(value, None) {
        return Err(BuildError::InvalidId {
            field,
            value: value.to_string(),
        });
    }
    Ok(value.to_lowercase())
}

fn tick(value: i32) -> Result<i32, BuildError> {
    if !(MIN_TICK..=MAX_TICK).contains(&value) {
        return Err(BuildError::TickOutOfRange(value));
    }
    Ok(value)
}

fn tick_range(lower: Option<i32>, upper: Option<i32>) -> Result<(i32, i32), BuildError> {
    let lower = tick(lower.unwrap_or(MIN_TICK))?;
    let upper = tick(upper.unwrap_or(MAX_TICK))?;
    if lower >= upper {
        return Err(BuildError::InvalidTickRange { lower, upper });
    }
    Ok((lower, upper))
}

fn fee_tier(percent: &Decimal) -> Result<u64, BuildError> {
    let ppm = to_base_units(*percent, FEE_TIER_DECIMALS)
        .map_err(|_| BuildError::UnsupportedFeeTier(percent.to_string()))?;
    if !SUPPORTED_FEE_TIERS.contains(&ppm) {
        return Err(BuildError::UnsupportedFeeTier(percent.to_string()));
    }
    Ok(ppm)
}

impl TransactionBuilder {
    pub fn new(fees: FeePolicy, max_timestamp_valid: u64) -> Self {
        Self {
            fees,
            max_timestamp_valid,
        }
    }

    pub fn fees(&self) -> &FeePolicy {
        &self.fees
    }

    /// Validates `action` and renders its on-chain parameters. Pure, so it can
    /// run before any network access.
    pub fn validate(&self, action: &DexAction) -> Result<Value, BuildError> {
        let deadline = self.max_timestamp_valid.to_string();
        let params = match action {
            DexAction::CreatePool(p) => {
                let (token0, token1) = distinct_tokens(&p.token1, &p.token2)?;
                let amount0 = positive("token1Amount", amount("token1Amount", &p.token1_amount, &p.token1)?)?;
                let amount1 = positive("token2Amount", amount("token2Amount", &p.token2_amount, &p.token2)?)?;
                let (tick_lower, tick_upper) = tick_range(p.tick_lower, p.tick_upper)?;
                json!({
                    "tokenID0": token0,
                    "tokenID1": token1,
                    "feeTier": fee_tier(&p.fee_tier)?,
                    "tickInitialPrice": tick(p.tick_initial_price)?,
                    "initialPosition": {
                        "tickLower": tick_lower,
                        "tickUpper": tick_upper,
                        "amount0Desired": amount0.to_string(),
                        "amount1Desired": amount1.to_string(),
                    },
                    "maxTimestampValid": deadline,
                })
            }
            DexAction::CreatePosition(p) => {
                let amount0 = amount("token1Amount", &p.token1_amount, &p.token1)?;
                let amount1 = amount("token2Amount", &p.token2_amount, &p.token2)?;
                if amount0 == 0 && amount1 == 0 {
                    return Err(BuildError::NonPositive("token1Amount or token2Amount"));
                }
                let (tick_lower, tick_upper) = tick_range(p.tick_lower, p.tick_upper)?;
                json!({
                    "poolID": hex_id("poolID", &p.pool_id)?,
                    "tickLower": tick_lower,
                    "tickUpper": tick_upper,
                    "amount0Desired": amount0.to_string(),
                    "amount1Desired": amount1.to_string(),
                    "amount0Min": amount("token1Min", &p.token1_min, &p.token1)?.to_string(),
                    "amount1Min": amount("token2Min", &p.token2_min, &p.token2)?.to_string(),
                    "maxTimestampValid": deadline,
                })
            }
            DexAction::AddLiquidity(p) => {
                let amount0 = positive("token1Amount", amount("token1Amount", &p.token1_amount, &p.token1)?)?;
                let amount1 = positive("token2Amount", amount("token2Amount", &p.token2_amount, &p.token2)?)?;
                json!({
                    "positionID": hex_id("positionID", &p.position_id)?,
                    "amount0Desired": amount0.to_string(),
                    "amount1Desired": amount1.to_string(),
                    "amount0Min": amount("token1Min", &p.token1_min, &p.token1)?.to_string(),
                    "amount1Min": amount("token2Min", &p.token2_min, &p.token2)?.to_string(),
                    "maxTimestampValid": deadline,
                })
            }
            DexAction::RemoveLiquidity(p) => {
                let liquidity = to_base_units(p.liquidity_to_remove, 0).map_err(|source| {
                    BuildError::InvalidAmount {
                        field: "liquidityToRemove",
                        source,
                    }
                })?;
                let liquidity = positive("liquidityToRemove", liquidity)?;
                if liquidity > i64::MAX as u64 {
                    return Err(BuildError::InvalidAmount {
                        field: "liquidityToRemove",
                        source: AmountError::Overflow(p.liquidity_to_remove),
                    });
                }
                json!({
                    "positionID": hex_id("positionID", &p.position_id)?,
                    "liquidityToRemove": liquidity.to_string(),
                    "amount0Min": amount("token1Min", &p.token1_min, &p.token1)?.to_string(),
                    "amount1Min": amount("token2Min", &p.token2_min, &p.token2)?.to_string(),
                    "maxTimestampValid": deadline,
                })
            }
            DexAction::SwapExactIn(p) => {
                let (token_in, token_out) = distinct_tokens(&p.token_in, &p.token_out)?;
                let amount_in = positive("amountIn", amount("amountIn", &p.amount_in, &p.token_in)?)?;
                if p.swap_route.is_empty() {
                    return Err(BuildError::EmptyRoute);
                }
                let route = p
                    .swap_route
                    .iter()
                    .map(|pool| hex_id("swapRoute", pool))
                    .collect::<Result<Vec<_>, _>>()?;
                json!({
                    "tokenIdIn": token_in,
                    "amountTokenIn": amount_in.to_string(),
                    "tokenIdOut": token_out,
                    "minAmountTokenOut": amount("minAmountOut", &p.min_amount_out, &p.token_out)?.to_string(),
                    "swapRoute": route,
                    "maxTimestampValid": deadline,
                })
            }
            DexAction::VoteOnProposal(p) => json!({
                "proposalIndex": p.proposal_index,
                "decision": p.decision.as_u32(),
            }),
        };
        Ok(params)
    }

    /// Builds the transaction object for `action` sent by `ctx.account`.
    pub fn build(&self, action: &DexAction, ctx: &AccountContext) -> Result<BuiltTransaction, BuildError> {
        let command = action.command();
        let params = self.validate(action)?;
        let schema = schema_for(command)
            .cloned()
            .ok_or_else(|| BuildError::MissingSchema(command.name().to_string()))?;

        let transaction = TransactionObject {
            module: command.module().to_string(),
            command: command.name().to_string(),
            sender_public_key: ctx.account.public_key.clone(),
            nonce: ctx.nonce.to_string(),
            fee: self.fees.fee(command).to_string(),
            params,
            signatures: Vec::new(),
        };
        debug!(
            module = %transaction.module,
            command = %transaction.command,
            nonce = ctx.nonce,
            "built transaction"
        );

        Ok(BuiltTransaction {
            transaction,
            fee_token_id: ctx.fee_token_id.clone(),
            schema,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    const LSK: &str = "0000000000000000";
    const USDT: &str = "0000000100000000";

    fn token(id: &str, decimals: u8) -> TokenRef {
        TokenRef {
            token_id: id.to_string(),
            symbol: String::new(),
            decimals,
        }
    }

    fn ctx() -> AccountContext {
        AccountContext {
            account: Account::from_session_account("lisk:1:ab12").unwrap(),
            nonce: 3,
            fee_token_id: LSK.to_string(),
        }
    }

    fn create_pool(token1_amount: Decimal, token2_amount: Decimal) -> DexAction {
        DexAction::CreatePool(CreatePoolParams {
            token1: token(LSK, 8),
            token2: token(USDT, 6),
            fee_tier: dec!(0.3),
            tick_initial_price: 1,
            token1_amount,
            token2_amount,
            tick_lower: None,
            tick_upper: None,
        })
    }

    #[test]
    fn builds_create_pool() {
        let builder = TransactionBuilder::default();
        let built = builder.build(&create_pool(dec!(10), dec!(20)), &ctx()).unwrap();
        let tx = &built.transaction;

        assert_eq!(tx.module, "dex");
        assert_eq!(tx.command, "createPool");
        assert_eq!(tx.sender_public_key, "ab12");
        assert_eq!(tx.nonce, "3");
        assert_eq!(tx.fee, "1000000");
        assert!(tx.signatures.is_empty());
        assert_eq!(tx.params["feeTier"], 3000);
        assert_eq!(tx.params["initialPosition"]["tickLower"], MIN_TICK);
        assert_eq!(tx.params["initialPosition"]["tickUpper"], MAX_TICK);
        assert_eq!(tx.params["initialPosition"]["amount0Desired"], "1000000000");
        assert_eq!(tx.params["initialPosition"]["amount1Desired"], "20000000");
        assert_eq!(tx.params["maxTimestampValid"], "100000000000");
        assert_eq!(built.fee_token_id, LSK);
        assert_eq!(built.schema["$id"], "/dex/createPool");
    }

    #[test]
    fn zero_leg_add_liquidity_is_rejected() {
        let action = DexAction::from_parts(
            "dex",
            "addLiquidity",
            json!({
                "positionID": "00000001000000000000000100000bb800000001",
                "token1": { "tokenID": LSK, "decimals": 8 },
                "token2": { "tokenID": USDT, "decimals": 6 },
                "token1Amount": 0,
                "token2Amount": "5"
            }),
        )
        .unwrap();
        let err = TransactionBuilder::default().validate(&action).unwrap_err();
        assert_eq!(err, BuildError::NonPositive("token1Amount"));
        assert!(matches!(FlowError::from(err), FlowError::InvalidParams(_)));
    }

    #[test]
    fn create_position_needs_one_positive_leg() {
        let mut params = CreatePositionParams {
            pool_id: "00000000000000000000000100000000000001f4".to_string(),
            token1: token(LSK, 8),
            token2: token(USDT, 6),
            tick_lower: Some(-100),
            tick_upper: Some(100),
            token1_amount: Decimal::ZERO,
            token2_amount: Decimal::ZERO,
            token1_min: zero(),
            token2_min: zero(),
        };
        let builder = TransactionBuilder::default();
        assert!(builder.validate(&DexAction::CreatePosition(params.clone())).is_err());

        params.token2_amount = dec!(1.5);
        let value = builder.validate(&DexAction::CreatePosition(params)).unwrap();
        assert_eq!(value["amount1Desired"], "1500000");
        assert_eq!(value["tickLower"], -100);
    }

    #[test]
    fn rejects_bad_ticks_and_fee_tiers() {
        let builder = TransactionBuilder::default();

        let mut action = create_pool(dec!(1), dec!(1));
        if let DexAction::CreatePool(p) = &mut action {
            p.tick_lower = Some(MIN_TICK - 1);
        }
        assert_eq!(builder.validate(&action), Err(BuildError::TickOutOfRange(MIN_TICK - 1)));

        let mut action = create_pool(dec!(1), dec!(1));
        if let DexAction::CreatePool(p) = &mut action {
            p.tick_lower = Some(10);
            p.tick_upper = Some(10);
        }
        assert_eq!(
            builder.validate(&action),
            Err(BuildError::InvalidTickRange { lower: 10, upper: 10 })
        );

        let mut action = create_pool(dec!(1), dec!(1));
        if let DexAction::CreatePool(p) = &mut action {
            p.fee_tier = dec!(0.2);
        }
        assert!(matches!(builder.validate(&action), Err(BuildError::UnsupportedFeeTier(_))));
    }

    #[test]
    fn json_number_amounts_keep_every_digit() {
        let params: Value = serde_json::from_str(&format!(
            r#"{{
                "positionID": "00000001000000000000000100000bb800000001",
                "token1": {{ "tokenID": "{}", "decimals": 9 }},
                "token2": {{ "tokenID": "{}", "decimals": 6 }},
                "token1Amount": 12345678.123456789,
                "token2Amount": "0.000001"
            }}"#,
            LSK, USDT
        ))
        .unwrap();
        let action = DexAction::from_parts("dex", "addLiquidity", params).unwrap();
        let value = TransactionBuilder::default().validate(&action).unwrap();
        assert_eq!(value["amount0Desired"], "12345678123456789");
        assert_eq!(value["amount1Desired"], "1");
    }

    #[test]
    fn malformed_amount_text_is_rejected() {
        let err = DexAction::from_parts(
            "dex",
            "swapExactIn",
            json!({
                "tokenIn": { "tokenID": LSK, "decimals": 8 },
                "tokenOut": { "tokenID": USDT, "decimals": 6 },
                "amountIn": "1.2.3",
                "swapRoute": ["00000000000000000000000100000bb8"]
            }),
        )
        .unwrap_err();
        assert!(matches!(err, BuildError::Params(_)));
    }

    #[test]
    fn excess_precision_is_rejected() {
        let err = TransactionBuilder::default()
            .validate(&create_pool(dec!(1.000000001), dec!(1)))
            .unwrap_err();
        assert!(matches!(err, BuildError::InvalidAmount { field: "token1Amount", .. }));
    }

    #[test]
    fn swap_requires_distinct_tokens_and_route() {
        let builder = TransactionBuilder::default();
        let mut params = SwapExactInParams {
            token_in: token(LSK, 8),
            token_out: token(LSK, 8),
            amount_in: dec!(1),
            min_amount_out: zero(),
            swap_route: vec!["00000000000000000000000100000bb8".to_string()],
        };
        assert_eq!(
            builder.validate(&DexAction::SwapExactIn(params.clone())),
            Err(BuildError::SameToken(LSK.to_string()))
        );

        params.token_out = token(USDT, 6);
        params.swap_route.clear();
        assert_eq!(
            builder.validate(&DexAction::SwapExactIn(params)),
            Err(BuildError::EmptyRoute)
        );
    }

    #[test]
    fn vote_goes_to_governance_module() {
        let action = DexAction::from_parts(
            "dexGovernance",
            "voteOnProposal",
            json!({ "proposalIndex": 4, "decision": "no" }),
        )
        .unwrap();
        let built = TransactionBuilder::default().build(&action, &ctx()).unwrap();
        assert_eq!(built.transaction.module, "dexGovernance");
        assert_eq!(built.transaction.params, json!({ "proposalIndex": 4, "decision": 1 }));

        assert!(DexAction::from_parts("dexGovernance", "voteOnProposal", json!({ "proposalIndex": 4, "decision": "maybe" })).is_err());
    }

    #[test]
    fn unknown_commands_fail() {
        assert!(matches!(
            DexAction::from_parts("dex", "voteOnProposal", json!({})),
            Err(BuildError::UnknownCommand { .. })
        ));
        assert!(matches!(
            DexAction::from_parts("token", "transfer", json!({})),
            Err(BuildError::UnknownCommand { .. })
        ));
    }

    #[test]
    fn creation_fees_are_applied() {
        let builder = TransactionBuilder::new(
            FeePolicy {
                base_fee: 100,
                pool_creation_fee: 1_000,
                position_creation_fee: 0,
            },
            42,
        );
        let built = builder.build(&create_pool(dec!(1), dec!(1)), &ctx()).unwrap();
        assert_eq!(built.transaction.fee, "1100");
        assert_eq!(built.transaction.params["maxTimestampValid"], "42");
    }
}
