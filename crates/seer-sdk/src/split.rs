//! Split-position form: turn collateral into a full set of outcome tokens.

use std::sync::OnceLock;

use serde::{Deserialize, Serialize};

use crate::abi::{self, Function, ParamType, StateMutability, Token};
use crate::error::{Error, Result};
use crate::market::MarketInfo;
use crate::network::ContractAddresses;
use crate::primitives::{Address, H256, ParseUnitsError, U256, parse_units};
use crate::validation::{Field, FieldErrors, ValidationError};

pub const SPLIT_POSITION: &str = "splitPosition";

/// Outcome slots a condition can have; one partition bit per slot.
pub const MIN_OUTCOME_SLOTS: u32 = 2;
pub const MAX_OUTCOME_SLOTS: u32 = 256;

/// Everything about the target market the form needs besides the amount.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SplitContext {
    pub account: Address,
    pub conditional_tokens: Address,
    pub condition_id: H256,
    pub collateral_token: Address,
    pub collateral_decimals: u8,
    pub outcome_slot_count: u32,
}

impl SplitContext {
    pub fn for_market(
        account: Address,
        market: &MarketInfo,
        contracts: &ContractAddresses,
    ) -> Result<Self> {
        let outcome_slot_count = u32::try_from(market.outcomes.len())
            .ok()
            .filter(|n| (MIN_OUTCOME_SLOTS..=MAX_OUTCOME_SLOTS).contains(n))
            .ok_or_else(|| {
                Error::InvalidMarket(format!(
                    "{:?} has {} outcomes",
                    market.id,
                    market.outcomes.len()
                ))
            })?;
        Ok(Self {
            account,
            conditional_tokens: contracts.conditional_tokens,
            condition_id: market.condition_id,
            collateral_token: contracts.collateral_token,
            collateral_decimals: contracts.collateral_decimals,
            outcome_slot_count,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SplitRequest {
    pub account: Address,
    pub conditional_tokens: Address,
    pub condition_id: H256,
    pub collateral_token: Address,
    pub collateral_decimals: u8,
    pub outcome_slot_count: u32,
    /// Base units.
    pub amount: U256,
}

impl SplitRequest {
    /// One index set per outcome slot: `[1, 2, 4, ..]`.
    pub fn partition(&self) -> Result<Vec<U256>> {
        let n = self.outcome_slot_count;
        if !(MIN_OUTCOME_SLOTS..=MAX_OUTCOME_SLOTS).contains(&n) {
            return Err(Error::InvalidMarket(format!("cannot partition {n} outcome slots")));
        }
        Ok((0..n).map(|i| U256::one() << i).collect())
    }

    /// Call data for `ConditionalTokens.splitPosition`, splitting from
    /// collateral (zero parent collection).
    pub fn split_position_call_data(&self) -> Result<Vec<u8>> {
        let partition = self.partition()?.into_iter().map(Token::Uint).collect();
        abi::encode_call(
            split_position_function(),
            &[
                Token::Address(self.collateral_token),
                Token::FixedBytes(H256::zero().as_bytes().to_vec()),
                Token::FixedBytes(self.condition_id.as_bytes().to_vec()),
                Token::Array(partition),
                Token::Uint(self.amount),
            ],
        )
    }
}

pub fn split_position_function() -> &'static Function {
    static FUNCTION: OnceLock<Function> = OnceLock::new();
    FUNCTION.get_or_init(|| {
        abi::function(
            SPLIT_POSITION,
            vec![
                abi::param("collateralToken", ParamType::Address, Some("contract IERC20")),
                abi::param("parentCollectionId", ParamType::FixedBytes(32), Some("bytes32")),
                abi::param("conditionId", ParamType::FixedBytes(32), Some("bytes32")),
                abi::param(
                    "partition",
                    ParamType::Array(Box::new(ParamType::Uint(256))),
                    Some("uint256[]"),
                ),
                abi::param("amount", ParamType::Uint(256), Some("uint256")),
            ],
            Vec::new(),
            StateMutability::NonPayable,
        )
    })
}

/// The amount input of the split form plus its in-flight flag.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SplitForm {
    amount: String,
    pending: bool,
}

impl SplitForm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn amount(&self) -> &str {
        &self.amount
    }

    /// Fails while a submission is in flight.
    pub fn set_amount(&mut self, amount: impl Into<String>) -> Result<()> {
        if self.pending {
            return Err(Error::SubmissionPending);
        }
        self.amount = amount.into();
        Ok(())
    }

    pub fn is_pending(&self) -> bool {
        self.pending
    }

    /// Check the amount against a previously fetched balance (base units).
    pub fn validate(&self, balance: U256, decimals: u8) -> FieldErrors {
        match self.scaled_amount(balance, decimals) {
            Ok(_) => FieldErrors::new(),
            Err(error) => {
                let mut errors = FieldErrors::new();
                errors.insert(Field::Amount, error);
                errors
            }
        }
    }

    fn scaled_amount(
        &self,
        balance: U256,
        decimals: u8,
    ) -> std::result::Result<U256, ValidationError> {
        let amount = parse_units(&self.amount, decimals).map_err(|e| match e {
            ParseUnitsError::Empty => ValidationError::Required,
            ParseUnitsError::TooManyDecimals(_) => ValidationError::TooManyDecimals,
            ParseUnitsError::Overflow => ValidationError::InsufficientBalance,
            ParseUnitsError::Negative | ParseUnitsError::Invalid => {
                ValidationError::AmountNotPositive
            }
        })?;
        if amount.is_zero() {
            return Err(ValidationError::AmountNotPositive);
        }
        if amount > balance {
            return Err(ValidationError::InsufficientBalance);
        }
        Ok(amount)
    }

    pub fn build_request(
        &self,
        ctx: &SplitContext,
        balance: U256,
    ) -> std::result::Result<SplitRequest, FieldErrors> {
        let mut errors = FieldErrors::new();
        if ctx.outcome_slot_count < MIN_OUTCOME_SLOTS {
            errors.insert(
                Field::Outcomes,
                ValidationError::TooFewOutcomes {
                    min: MIN_OUTCOME_SLOTS as usize,
                },
            );
        }
        let amount = match self.scaled_amount(balance, ctx.collateral_decimals) {
            Ok(amount) => Some(amount),
            Err(error) => {
                errors.insert(Field::Amount, error);
                None
            }
        };
        let Some(amount) = amount.filter(|_| errors.is_valid()) else {
            return Err(errors);
        };
        Ok(SplitRequest {
            account: ctx.account,
            conditional_tokens: ctx.conditional_tokens,
            condition_id: ctx.condition_id,
            collateral_token: ctx.collateral_token,
            collateral_decimals: ctx.collateral_decimals,
            outcome_slot_count: ctx.outcome_slot_count,
            amount,
        })
    }

    /// Validate and mark the form as in flight. Fails while another
    /// submission is pending.
    pub fn begin_submission(
        &mut self,
        ctx: &SplitContext,
        balance: U256,
    ) -> Result<std::result::Result<SplitRequest, FieldErrors>> {
        if self.pending {
            return Err(Error::SubmissionPending);
        }
        let request = self.build_request(ctx, balance);
        if request.is_ok() {
            self.pending = true;
        }
        Ok(request)
    }

    /// Clear the in-flight flag; the amount is reset only on success.
    pub fn finish_submission(&mut self, succeeded: bool) {
        self.pending = false;
        if succeeded {
            self.reset();
        }
    }

    pub fn reset(&mut self) {
        self.amount.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx(decimals: u8) -> SplitContext {
        SplitContext {
            account: Address::repeat_byte(0x01),
            conditional_tokens: Address::repeat_byte(0x02),
            condition_id: H256::repeat_byte(0x03),
            collateral_token: Address::repeat_byte(0x04),
            collateral_decimals: decimals,
            outcome_slot_count: 3,
        }
    }

    fn form(amount: &str) -> SplitForm {
        let mut form = SplitForm::new();
        form.set_amount(amount).unwrap();
        form
    }

    #[test]
    fn exact_balance_passes_and_more_fails() {
        let balance = parse_units("10.5", 6).unwrap();
        assert!(form("10.5").validate(balance, 6).is_valid());
        assert_eq!(
            form("10.500001").validate(balance, 6).get(Field::Amount),
            Some(&ValidationError::InsufficientBalance)
        );
    }

    #[test]
    fn amount_errors() {
        let balance = U256::from(1_000_000);
        for (input, expected) in [
            ("", ValidationError::Required),
            ("0", ValidationError::AmountNotPositive),
            ("0.000", ValidationError::AmountNotPositive),
            ("-1", ValidationError::AmountNotPositive),
            ("abc", ValidationError::AmountNotPositive),
            ("0.0000001", ValidationError::TooManyDecimals),
        ] {
            assert_eq!(
                form(input).validate(balance, 6).get(Field::Amount),
                Some(&expected),
                "{input:?}"
            );
        }
    }

    #[test]
    fn request_scales_amount() {
        let request = form("1.5")
            .build_request(&ctx(18), parse_units("2", 18).unwrap())
            .unwrap();
        assert_eq!(request.amount.to_string(), "1500000000000000000");
        assert_eq!(request.condition_id, H256::repeat_byte(0x03));
    }

    #[test]
    fn partition_has_one_bit_per_slot() {
        let request = form("1").build_request(&ctx(0), U256::from(1)).unwrap();
        let partition: Vec<String> = request
            .partition()
            .unwrap()
            .iter()
            .map(|p| p.to_string())
            .collect();
        assert_eq!(partition, vec!["1", "2", "4"]);
    }

    #[test]
    fn split_call_data_layout() {
        let request = form("1").build_request(&ctx(0), U256::from(5)).unwrap();
        let data = request.split_position_call_data().unwrap();
        let function = split_position_function();
        let inputs: Vec<String> = function.inputs.iter().map(|p| p.kind.to_string()).collect();
        assert_eq!(inputs.join(","), "address,bytes32,bytes32,uint256[],uint256");
        assert_eq!(data[..4], function.short_signature());
        // 5 head words + array length + 3 elements
        assert_eq!(data.len(), 4 + (5 + 1 + 3) * 32);
        assert!(data[4 + 32..4 + 64].iter().all(|b| *b == 0));
        assert_eq!(&data[4 + 64..4 + 96], &[0x03; 32]);
        assert_eq!(data[4 + 5 * 32 - 1], 1);
    }

    #[test]
    fn second_submission_is_rejected_while_pending() {
        let mut form = form("1");
        let balance = U256::from(10);
        assert!(form.begin_submission(&ctx(0), balance).unwrap().is_ok());
        assert!(matches!(
            form.begin_submission(&ctx(0), balance),
            Err(Error::SubmissionPending)
        ));

        assert!(matches!(form.set_amount("2"), Err(Error::SubmissionPending)));
        assert_eq!(form.amount(), "1");

        form.finish_submission(false);
        assert_eq!(form.amount(), "1");
        assert!(!form.is_pending());

        form.begin_submission(&ctx(0), balance).unwrap().unwrap();
        form.finish_submission(true);
        assert_eq!(form.amount(), "");
    }

    #[test]
    fn invalid_submission_does_not_mark_pending() {
        let mut form = form("100");
        let result = form.begin_submission(&ctx(0), U256::from(1)).unwrap();
        assert!(result.is_err());
        assert!(!form.is_pending());
    }

    #[test]
    fn context_requires_a_splittable_market() {
        let contracts = crate::testing::sample_contracts();
        let mut market = crate::testing::sample_market();
        let ctx = SplitContext::for_market(Address::repeat_byte(1), &market, &contracts).unwrap();
        assert_eq!(ctx.outcome_slot_count, 2);

        market.outcomes.truncate(1);
        assert!(matches!(
            SplitContext::for_market(Address::repeat_byte(1), &market, &contracts),
            Err(Error::InvalidMarket(_))
        ));
        market.outcomes = vec!["x".to_string(); 257];
        assert!(SplitContext::for_market(Address::repeat_byte(1), &market, &contracts).is_err());
    }

    #[test]
    fn request_without_outcome_slots_is_blocked() {
        let mut ctx = ctx(0);
        ctx.outcome_slot_count = 0;
        let errors = form("1").build_request(&ctx, U256::from(5u64)).unwrap_err();
        assert_eq!(
            errors.get(Field::Outcomes),
            Some(&ValidationError::TooFewOutcomes { min: 2 })
        );
        assert!(errors.get(Field::Amount).is_none());
    }

    #[test]
    fn partition_rejects_empty_condition() {
        let mut request = form("1").build_request(&ctx(0), U256::from(1u64)).unwrap();
        request.outcome_slot_count = 0;
        assert!(request.partition().is_err());
        assert!(request.split_position_call_data().is_err());
        request.outcome_slot_count = 256;
        assert_eq!(request.partition().unwrap()[255], U256::one() << 255);
    }
}
