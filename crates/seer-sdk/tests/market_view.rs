use seer_sdk::abi::{ParamType, Token};
use seer_sdk::market_view::{self, GET_MARKET, GET_MARKETS};
use seer_sdk::testing::sample_market;
use seer_sdk::{Address, MarketStatus, U256};

// Word offsets into the encoded `getMarket` return: the outer offset, then
// the MarketInfo head with the static question tuple inlined as member 9.
const ID_WORD: usize = 1;
const IS_PENDING_ARBITRATION_WORD: usize = 1 + 9 + 5;

fn word(data: &mut [u8], index: usize) -> &mut [u8] {
    &mut data[index * 32..(index + 1) * 32]
}

#[test]
fn get_market_return_data_decodes() {
    let market = sample_market();
    let data = market_view::encode_market_return(&market);
    let decoded = market_view::decode_get_market(&data).unwrap();
    assert_eq!(decoded, market);
    assert_eq!(decoded.status(1_500), MarketStatus::Open);
}

#[test]
fn get_markets_return_data_decodes() {
    let first = sample_market();
    let mut second = sample_market();
    second.id = Address::repeat_byte(0x02);
    second.market_name = "Who wins?".to_string();
    second.outcomes = vec!["A".into(), "B".into(), "C".into()];
    second.pools.clear();

    let data = market_view::encode_markets_return(&[first.clone(), second.clone()]);
    assert_eq!(
        market_view::decode_get_markets(&data).unwrap(),
        vec![first, second]
    );
    assert!(market_view::decode_get_markets(&market_view::encode_markets_return(&[]))
        .unwrap()
        .is_empty());
}

#[test]
fn truncated_return_data_is_rejected() {
    let data = market_view::encode_market_return(&sample_market());
    for cut in [32, data.len() / 2, data.len() - 1] {
        assert!(market_view::decode_get_market(&data[..cut]).is_err(), "cut at {cut}");
    }
}

#[test]
fn dirty_address_padding_is_rejected() {
    let mut data = market_view::encode_market_return(&sample_market());
    assert_eq!(&word(&mut data, ID_WORD)[12..], &[0x01; 20]);
    word(&mut data, ID_WORD)[0] = 1;
    assert!(market_view::decode_get_market(&data).is_err());
}

#[test]
fn bool_other_than_zero_or_one_is_rejected() {
    let mut data = market_view::encode_market_return(&sample_market());
    assert!(word(&mut data, IS_PENDING_ARBITRATION_WORD).iter().all(|b| *b == 0));
    word(&mut data, IS_PENDING_ARBITRATION_WORD)[31] = 2;
    assert!(market_view::decode_get_market(&data).is_err());

    word(&mut data, IS_PENDING_ARBITRATION_WORD)[31] = 1;
    let decoded = market_view::decode_get_market(&data).unwrap();
    assert!(decoded.question.is_pending_arbitration);
}

#[test]
fn oversized_timestamp_is_rejected() {
    let mut token = sample_market().to_token();
    // question.opening_ts is the third field of the nested question tuple
    if let Token::Tuple(fields) = &mut token {
        if let Some(Token::Tuple(question)) = fields.last_mut() {
            question[2] = Token::Uint(U256::from(u64::from(u32::MAX) + 1));
        }
    }
    let data = ethabi::encode(&[token]);
    assert!(market_view::decode_get_market(&data).is_err());
}

#[test]
fn trailing_data_is_rejected() {
    let mut data = market_view::encode_market_return(&sample_market());
    data.extend_from_slice(&[0u8; 32]);
    assert!(market_view::decode_get_market(&data).is_err());
}

#[test]
fn function_lookup() {
    let get_market = market_view::function(GET_MARKET).unwrap();
    assert_eq!(get_market.inputs.len(), 3);
    assert!(get_market.inputs.iter().all(|p| p.kind == ParamType::Address));
    let get_markets = market_view::function(GET_MARKETS).unwrap();
    let ParamType::Array(inner) = &get_markets.outputs[0].kind else {
        panic!("getMarkets must return an array");
    };
    assert_eq!(**inner, get_market.outputs[0].kind);
}

#[test]
fn json_document_names_both_functions() {
    let json = market_view::abi_json().unwrap();
    let names: Vec<_> = json
        .as_array()
        .unwrap()
        .iter()
        .map(|f| f["name"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(names, vec![GET_MARKET, GET_MARKETS]);
}
