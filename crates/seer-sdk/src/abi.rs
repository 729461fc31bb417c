//! Solidity ABI on top of `ethabi`.
//!
//! `ethabi` supplies descriptors, selectors and the head/tail codec. Decoding
//! here is stricter: return data must be exactly what a Solidity encoder
//! produces, and narrow `uint`s must fit their width.

use crate::error::{Error, Result};
use crate::primitives::{Address, H256, U256};

pub use ethabi::{Contract, Function, Param, ParamType, StateMutability, Token};

/// A function descriptor built in code.
pub fn function(
    name: &str,
    inputs: Vec<Param>,
    outputs: Vec<Param>,
    state_mutability: StateMutability,
) -> Function {
    #[allow(deprecated)]
    Function {
        name: name.to_string(),
        inputs,
        outputs,
        constant: None,
        state_mutability,
    }
}

pub fn param(name: &str, kind: ParamType, internal_type: Option<&str>) -> Param {
    Param {
        name: name.to_string(),
        kind,
        internal_type: internal_type.map(str::to_string),
    }
}

/// Selector followed by the arguments, type-checked against the inputs.
pub fn encode_call(function: &Function, args: &[Token]) -> Result<Vec<u8>> {
    function
        .encode_input(args)
        .map_err(|e| Error::AbiEncode(format!("{}: {e}", function.name)))
}

/// Decode return data against the function's outputs.
pub fn decode_output(function: &Function, data: &[u8]) -> Result<Vec<Token>> {
    let kinds: Vec<ParamType> = function.outputs.iter().map(|p| p.kind.clone()).collect();
    decode(&kinds, data)
}

/// Strict decode of a tuple body.
///
/// `ethabi` accepts dirty padding and any non-zero bool word; re-encoding the
/// result must reproduce `data` byte for byte.
pub fn decode(kinds: &[ParamType], data: &[u8]) -> Result<Vec<Token>> {
    let tokens = ethabi::decode(kinds, data)?;
    for (kind, token) in kinds.iter().zip(&tokens) {
        check_width(kind, token)?;
    }
    if ethabi::encode(&tokens) != data {
        return Err(Error::AbiDecode("data is not canonically encoded".to_string()));
    }
    Ok(tokens)
}

fn check_width(kind: &ParamType, token: &Token) -> Result<()> {
    match (kind, token) {
        (ParamType::Uint(bits), Token::Uint(v)) if v.bits() > *bits => {
            Err(Error::AbiDecode(format!("{v} overflows uint{bits}")))
        }
        (ParamType::Array(inner), Token::Array(items))
        | (ParamType::FixedArray(inner, _), Token::FixedArray(items)) => {
            items.iter().try_for_each(|t| check_width(inner, t))
        }
        (ParamType::Tuple(kinds), Token::Tuple(items)) => kinds
            .iter()
            .zip(items)
            .try_for_each(|(k, t)| check_width(k, t)),
        _ => Ok(()),
    }
}

// ── Typed extraction ────────────────────────────────────────────────────────

fn kind_name(token: &Token) -> &'static str {
    match token {
        Token::Address(_) => "address",
        Token::FixedBytes(_) => "fixed bytes",
        Token::Bytes(_) => "bytes",
        Token::Int(_) => "int",
        Token::Uint(_) => "uint",
        Token::Bool(_) => "bool",
        Token::String(_) => "string",
        Token::FixedArray(_) | Token::Array(_) => "array",
        Token::Tuple(_) => "tuple",
    }
}

fn mismatch(expected: &str, found: &Token) -> Error {
    Error::AbiDecode(format!("expected {expected}, found {}", kind_name(found)))
}

/// A Rust value read out of a decoded [`Token`].
pub trait FromToken: Sized {
    fn from_token(token: Token) -> Result<Self>;
}

impl FromToken for Address {
    fn from_token(token: Token) -> Result<Self> {
        match token {
            Token::Address(a) => Ok(a),
            other => Err(mismatch("address", &other)),
        }
    }
}

impl FromToken for H256 {
    fn from_token(token: Token) -> Result<Self> {
        match token {
            Token::FixedBytes(b) if b.len() == 32 => Ok(H256::from_slice(&b)),
            other => Err(mismatch("bytes32", &other)),
        }
    }
}

impl FromToken for U256 {
    fn from_token(token: Token) -> Result<Self> {
        match token {
            Token::Uint(v) => Ok(v),
            other => Err(mismatch("uint", &other)),
        }
    }
}

impl FromToken for u32 {
    fn from_token(token: Token) -> Result<Self> {
        let v = U256::from_token(token)?;
        if v.bits() > 32 {
            return Err(Error::AbiDecode(format!("{v} does not fit in uint32")));
        }
        Ok(v.low_u32())
    }
}

impl FromToken for bool {
    fn from_token(token: Token) -> Result<Self> {
        match token {
            Token::Bool(b) => Ok(b),
            other => Err(mismatch("bool", &other)),
        }
    }
}

impl FromToken for String {
    fn from_token(token: Token) -> Result<Self> {
        match token {
            Token::String(s) => Ok(s),
            other => Err(mismatch("string", &other)),
        }
    }
}

impl<T: FromToken> FromToken for Vec<T> {
    fn from_token(token: Token) -> Result<Self> {
        match token {
            Token::Array(items) => items.into_iter().map(T::from_token).collect(),
            other => Err(mismatch("array", &other)),
        }
    }
}

/// Walks the members of a decoded struct in declaration order.
pub(crate) struct Fields {
    iter: std::vec::IntoIter<Token>,
    what: &'static str,
}

impl Fields {
    pub(crate) fn new(token: Token, what: &'static str, expected: usize) -> Result<Self> {
        let items = match token {
            Token::Tuple(items) => items,
            other => return Err(mismatch("tuple", &other)),
        };
        if items.len() != expected {
            return Err(Error::AbiDecode(format!(
                "{what} has {} fields, expected {expected}",
                items.len()
            )));
        }
        Ok(Self {
            iter: items.into_iter(),
            what,
        })
    }

    pub(crate) fn token(&mut self) -> Result<Token> {
        self.iter
            .next()
            .ok_or_else(|| Error::AbiDecode(format!("{} ended early", self.what)))
    }

    pub(crate) fn next<T: FromToken>(&mut self) -> Result<T> {
        T::from_token(self.token()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WORD: usize = 32;

    fn transfer() -> Function {
        function(
            "transfer",
            vec![
                param("to", ParamType::Address, None),
                param("amount", ParamType::Uint(256), None),
            ],
            vec![param("", ParamType::Bool, None)],
            StateMutability::NonPayable,
        )
    }

    #[test]
    fn erc20_transfer_selector() {
        assert_eq!(hex::encode(transfer().short_signature()), "a9059cbb");
    }

    #[test]
    fn encode_call_rejects_wrong_arguments() {
        let f = transfer();
        assert!(encode_call(&f, &[Token::Bool(true)]).is_err());
        assert!(encode_call(&f, &[Token::Bool(true), Token::Uint(U256::one())]).is_err());
        let args = [Token::Address(Address::repeat_byte(1)), Token::Uint(U256::one())];
        let data = encode_call(&f, &args).unwrap();
        assert_eq!(data.len(), 4 + 2 * WORD);
    }

    #[test]
    fn strings_decode_through_offsets() {
        let kind = ParamType::Array(Box::new(ParamType::String));
        let token = Token::Array(vec![
            Token::String("Yes".to_string()),
            Token::String("No".to_string()),
        ]);
        let encoded = ethabi::encode(std::slice::from_ref(&token));
        // offset, len, 2 element offsets, 2 x (len + data)
        assert_eq!(encoded.len(), WORD * 8);
        assert_eq!(decode(&[kind], &encoded).unwrap(), vec![token]);
    }

    #[test]
    fn rejects_truncated_data() {
        assert!(decode(&[ParamType::Uint(256)], &[0u8; 31]).is_err());
        assert!(decode(&[ParamType::String], &[0u8; WORD]).is_err());
    }

    #[test]
    fn rejects_out_of_range_offset() {
        let mut data = vec![0u8; WORD];
        data[31] = 0xff;
        assert!(decode(&[ParamType::String], &data).is_err());
    }

    #[test]
    fn rejects_dirty_address_padding() {
        let mut data = vec![0u8; WORD];
        data[0] = 1;
        data[31] = 7;
        assert!(decode(&[ParamType::Address], &data).is_err());
        data[0] = 0;
        assert!(decode(&[ParamType::Address], &data).is_ok());
    }

    #[test]
    fn rejects_bool_other_than_zero_or_one() {
        let mut data = vec![0u8; WORD];
        data[31] = 2;
        assert!(decode(&[ParamType::Bool], &data).is_err());
        data[31] = 1;
        assert_eq!(decode(&[ParamType::Bool], &data).unwrap(), vec![Token::Bool(true)]);
    }

    #[test]
    fn rejects_uint32_overflow() {
        let over = ethabi::encode(&[Token::Uint(U256::from(u64::from(u32::MAX) + 1))]);
        assert!(decode(&[ParamType::Uint(32)], &over).is_err());
        let max = ethabi::encode(&[Token::Uint(U256::from(u32::MAX))]);
        assert!(decode(&[ParamType::Uint(32)], &max).is_ok());
    }

    #[test]
    fn rejects_trailing_garbage() {
        let mut data = ethabi::encode(&[Token::Uint(U256::one())]);
        data.extend_from_slice(&[0xee; WORD]);
        assert!(decode(&[ParamType::Uint(256)], &data).is_err());
    }

    #[test]
    fn typed_extraction_reports_mismatch() {
        assert!(Address::from_token(Token::Bool(true)).is_err());
        assert_eq!(u32::from_token(Token::Uint(U256::from(5u64))).unwrap(), 5);
        assert!(u32::from_token(Token::Uint(U256::from(1u64 << 32))).is_err());
        assert!(H256::from_token(Token::FixedBytes(vec![1; 31])).is_err());
        let names = Vec::<String>::from_token(Token::Array(vec![Token::String("a".into())]));
        assert_eq!(names.unwrap(), vec!["a"]);
    }

    #[test]
    fn fields_check_arity() {
        let err = Fields::new(Token::Tuple(vec![Token::Bool(true)]), "Thing", 2)
            .err()
            .unwrap();
        assert!(err.to_string().contains("Thing has 1 fields"));
        let mut f = Fields::new(Token::Tuple(vec![Token::Bool(true)]), "Thing", 1).unwrap();
        assert!(f.next::<bool>().unwrap());
        assert!(f.token().is_err());
    }
}
