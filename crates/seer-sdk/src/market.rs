use serde::{Deserialize, Serialize};

use crate::abi::{Fields, FromToken, Token};
use crate::error::Result;
use crate::primitives::{Address, H256, U256};

/// Oracle question as stored by the Reality contract.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionInfo {
    pub content_hash: H256,
    pub arbitrator: Address,
    pub opening_ts: u32,
    pub timeout: u32,
    pub finalize_ts: u32,
    pub is_pending_arbitration: bool,
    pub bounty: U256,
    pub best_answer: H256,
    pub history_hash: H256,
    pub bond: U256,
    pub min_bond: U256,
}

/// Snapshot of one market as returned by the MarketView contract.
///
/// Values are only ever produced by decoding contract return data; nothing in
/// this crate mutates them afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketInfo {
    pub id: Address,
    pub market_name: String,
    pub outcomes: Vec<String>,
    pub condition_id: H256,
    pub question_id: H256,
    pub template_id: U256,
    pub encoded_question: String,
    pub oracle: Address,
    pub pools: Vec<Address>,
    pub question: QuestionInfo,
}

/// Lifecycle of the oracle question backing a market.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MarketStatus {
    /// Opening timestamp not reached; answers are not accepted yet.
    NotOpen,
    /// Open and still unanswered.
    Open,
    /// Answered, but the answer timeout has not elapsed.
    AnswerNotFinal,
    /// Escalated to the arbitrator.
    InDispute,
    /// Answer is final.
    Closed,
}

impl FromToken for QuestionInfo {
    fn from_token(token: Token) -> Result<Self> {
        let mut f = Fields::new(token, "Question", 11)?;
        Ok(QuestionInfo {
            content_hash: f.next()?,
            arbitrator: f.next()?,
            opening_ts: f.next()?,
            timeout: f.next()?,
            finalize_ts: f.next()?,
            is_pending_arbitration: f.next()?,
            bounty: f.next()?,
            best_answer: f.next()?,
            history_hash: f.next()?,
            bond: f.next()?,
            min_bond: f.next()?,
        })
    }
}

impl QuestionInfo {
    pub(crate) fn to_token(&self) -> Token {
        Token::Tuple(vec![
            Token::FixedBytes(self.content_hash.as_bytes().to_vec()),
            Token::Address(self.arbitrator),
            Token::Uint(self.opening_ts.into()),
            Token::Uint(self.timeout.into()),
            Token::Uint(self.finalize_ts.into()),
            Token::Bool(self.is_pending_arbitration),
            Token::Uint(self.bounty),
            Token::FixedBytes(self.best_answer.as_bytes().to_vec()),
            Token::FixedBytes(self.history_hash.as_bytes().to_vec()),
            Token::Uint(self.bond),
            Token::Uint(self.min_bond),
        ])
    }

    /// Finalized: answered, not in arbitration and past the finalize time.
    pub fn is_finalized(&self, now: u64) -> bool {
        !self.is_pending_arbitration && self.finalize_ts > 0 && self.finalize_ts as u64 <= now
    }
}

impl FromToken for MarketInfo {
    fn from_token(token: Token) -> Result<Self> {
        let mut f = Fields::new(token, "MarketInfo", 10)?;
        Ok(MarketInfo {
            id: f.next()?,
            market_name: f.next()?,
            outcomes: f.next()?,
            condition_id: f.next()?,
            question_id: f.next()?,
            template_id: f.next()?,
            encoded_question: f.next()?,
            oracle: f.next()?,
            pools: f.next()?,
            question: f.next()?,
        })
    }
}

impl MarketInfo {
    /// Encode back into the contract's tuple layout. Used to fabricate
    /// return data for mock backends.
    pub fn to_token(&self) -> Token {
        Token::Tuple(vec![
            Token::Address(self.id),
            Token::String(self.market_name.clone()),
            Token::Array(self.outcomes.iter().cloned().map(Token::String).collect()),
            Token::FixedBytes(self.condition_id.as_bytes().to_vec()),
            Token::FixedBytes(self.question_id.as_bytes().to_vec()),
            Token::Uint(self.template_id),
            Token::String(self.encoded_question.clone()),
            Token::Address(self.oracle),
            Token::Array(self.pools.iter().copied().map(Token::Address).collect()),
            self.question.to_token(),
        ])
    }

    pub fn status(&self, now: u64) -> MarketStatus {
        let q = &self.question;
        if (q.opening_ts as u64) > now {
            MarketStatus::NotOpen
        } else if q.is_pending_arbitration {
            MarketStatus::InDispute
        } else if q.finalize_ts == 0 {
            MarketStatus::Open
        } else if (q.finalize_ts as u64) > now {
            MarketStatus::AnswerNotFinal
        } else {
            MarketStatus::Closed
        }
    }

    pub fn current_status(&self) -> MarketStatus {
        self.status(chrono::Utc::now().timestamp().max(0) as u64)
    }

    /// The outcome selected by a final answer, when the answer indexes into
    /// `outcomes`. Invalid answers (`0xff..ff`) and unresolved markets yield
    /// `None`.
    pub fn final_outcome(&self, now: u64) -> Option<&str> {
        if !self.question.is_finalized(now) {
            return None;
        }
        let index = U256::from_big_endian(self.question.best_answer.as_bytes());
        if index.bits() > 32 {
            return None;
        }
        self.outcomes.get(index.low_u32() as usize).map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::sample_market;

    #[test]
    fn token_roundtrip_preserves_every_field() {
        let market = sample_market();
        let parsed = MarketInfo::from_token(market.to_token()).unwrap();
        assert_eq!(parsed, market);
    }

    #[test]
    fn wrong_arity_is_rejected() {
        let err = MarketInfo::from_token(Token::Tuple(vec![Token::Bool(true)])).unwrap_err();
        assert!(err.to_string().contains("MarketInfo has 1 fields"));
    }

    #[test]
    fn oversized_timestamp_is_rejected() {
        let mut market = sample_market().to_token();
        if let Token::Tuple(fields) = &mut market {
            if let Some(Token::Tuple(question)) = fields.last_mut() {
                question[2] = Token::Uint(U256::from(u64::from(u32::MAX) + 1));
            }
        }
        assert!(MarketInfo::from_token(market).is_err());
    }

    #[test]
    fn status_follows_question_timestamps() {
        let mut market = sample_market();
        assert_eq!(market.status(999), MarketStatus::NotOpen);
        assert_eq!(market.status(1_000), MarketStatus::Open);

        market.question.finalize_ts = 5_000;
        assert_eq!(market.status(4_999), MarketStatus::AnswerNotFinal);
        assert_eq!(market.status(5_000), MarketStatus::Closed);

        market.question.is_pending_arbitration = true;
        assert_eq!(market.status(6_000), MarketStatus::InDispute);
    }

    #[test]
    fn final_outcome_reads_answer_index() {
        let mut market = sample_market();
        market.question.finalize_ts = 2_000;
        market.question.best_answer = H256::from_low_u64_be(1);
        assert_eq!(market.final_outcome(1_500), None);
        assert_eq!(market.final_outcome(2_000), Some("No"));

        market.question.best_answer = H256::repeat_byte(0xff);
        assert_eq!(market.final_outcome(2_000), None);
    }

    #[test]
    fn serializes_camel_case_with_snake_question() {
        let json = serde_json::to_value(sample_market()).unwrap();
        assert_eq!(json["marketName"], "Will X happen?");
        assert_eq!(json["question"]["min_bond"], "0xa");
        assert_eq!(json["templateId"], "0x2");
        assert_eq!(json["id"], format!("0x{}", "01".repeat(20)));
    }
}
