use splits_indexer::domain::{Address, Amount, RawLog, SubCall};
use splits_indexer::engine::{trace, SwapLeg, TraceContext};

fn addr(n: u8) -> Address {
    Address::new(format!("0x{:040x}", n))
}

fn amt(n: u64) -> Amount {
    Amount::from_u64(n)
}

const SWAPPER: u8 = 1;
const BENEFICIARY: u8 = 2;
const VENUE: u8 = 3;
const STRANGER: u8 = 4;
const TOKEN_A: u8 = 10;
const TOKEN_B: u8 = 11;
const TOKEN_C: u8 = 12;
const WETH: u8 = 13;

fn swapper_ctx() -> TraceContext {
    TraceContext::single(addr(SWAPPER), addr(BENEFICIARY))
}

#[test]
fn test_payment_without_input_is_never_fabricated() {
    let logs = vec![RawLog::transfer(
        &addr(TOKEN_A),
        &addr(SWAPPER),
        &addr(BENEFICIARY),
        amt(100),
    )];
    let report = trace(&swapper_ctx(), &[], &logs);
    assert!(report.legs.is_empty());
    assert_eq!(report.dropped, 1);
}

#[test]
fn test_payment_matched_by_later_input() {
    let logs = vec![
        RawLog::transfer(&addr(TOKEN_A), &addr(SWAPPER), &addr(BENEFICIARY), amt(100)),
        RawLog::transfer(&addr(TOKEN_B), &addr(SWAPPER), &addr(VENUE), amt(40)),
    ];
    let report = trace(&swapper_ctx(), &[], &logs);
    assert_eq!(
        report.legs,
        vec![SwapLeg {
            input_token: addr(TOKEN_B),
            input_amount: amt(40),
            output_token: addr(TOKEN_A),
            output_amount: amt(100),
            beneficiary: addr(BENEFICIARY),
        }]
    );
    assert_eq!(report.dropped, 0);
}

#[test]
fn test_consecutive_swaps_in_one_batch() {
    let logs = vec![
        RawLog::transfer(&addr(TOKEN_A), &addr(SWAPPER), &addr(VENUE), amt(1)),
        RawLog::transfer(&addr(TOKEN_C), &addr(VENUE), &addr(BENEFICIARY), amt(10)),
        RawLog::transfer(&addr(TOKEN_B), &addr(SWAPPER), &addr(VENUE), amt(2)),
        RawLog::transfer(&addr(TOKEN_C), &addr(VENUE), &addr(BENEFICIARY), amt(20)),
    ];
    let report = trace(&swapper_ctx(), &[], &logs);
    assert_eq!(report.legs.len(), 2);
    assert_eq!(report.legs[0].input_token, addr(TOKEN_A));
    assert_eq!(report.legs[0].output_amount, amt(10));
    assert_eq!(report.legs[1].input_token, addr(TOKEN_B));
    assert_eq!(report.legs[1].output_amount, amt(20));
}

#[test]
fn test_second_input_drops_first() {
    let logs = vec![
        RawLog::transfer(&addr(TOKEN_A), &addr(SWAPPER), &addr(VENUE), amt(1)),
        RawLog::transfer(&addr(TOKEN_B), &addr(SWAPPER), &addr(VENUE), amt(2)),
        RawLog::transfer(&addr(TOKEN_C), &addr(VENUE), &addr(BENEFICIARY), amt(20)),
    ];
    let report = trace(&swapper_ctx(), &[], &logs);
    assert_eq!(report.legs.len(), 1);
    assert_eq!(report.legs[0].input_token, addr(TOKEN_B));
    assert_eq!(report.dropped, 1);
}

#[test]
fn test_unrelated_transfers_are_ignored() {
    let logs = vec![
        RawLog::transfer(&addr(TOKEN_A), &addr(STRANGER), &addr(VENUE), amt(5)),
        RawLog::transfer(&addr(TOKEN_A), &addr(SWAPPER), &addr(VENUE), amt(5)),
        RawLog::transfer(&addr(TOKEN_B), &addr(VENUE), &addr(STRANGER), amt(9)),
        RawLog::transfer(&addr(TOKEN_B), &addr(VENUE), &addr(BENEFICIARY), amt(9)),
    ];
    let report = trace(&swapper_ctx(), &[], &logs);
    assert_eq!(report.legs.len(), 1);
    assert_eq!(report.legs[0].input_amount, amt(5));
    assert_eq!(report.legs[0].output_amount, amt(9));
}

#[test]
fn test_proceeds_routed_back_go_to_default_beneficiary() {
    let logs = vec![
        RawLog::transfer(&addr(TOKEN_A), &addr(SWAPPER), &addr(VENUE), amt(5)),
        RawLog::transfer(&addr(TOKEN_B), &addr(VENUE), &addr(SWAPPER), amt(50)),
    ];
    let report = trace(&swapper_ctx(), &[], &logs);
    assert_eq!(report.legs.len(), 1);
    assert_eq!(report.legs[0].beneficiary, addr(BENEFICIARY));
    assert_eq!(report.legs[0].output_token, addr(TOKEN_B));
    assert_eq!(report.dropped, 0);
}

#[test]
fn test_routed_back_input_is_not_dropped_when_replaced() {
    let logs = vec![
        RawLog::transfer(&addr(TOKEN_A), &addr(SWAPPER), &addr(VENUE), amt(5)),
        RawLog::transfer(&addr(TOKEN_B), &addr(VENUE), &addr(SWAPPER), amt(50)),
        RawLog::transfer(&addr(TOKEN_B), &addr(SWAPPER), &addr(VENUE), amt(50)),
        RawLog::transfer(&addr(TOKEN_C), &addr(VENUE), &addr(BENEFICIARY), amt(9)),
    ];
    let report = trace(&swapper_ctx(), &[], &logs);
    assert_eq!(report.legs.len(), 2);
    assert_eq!(report.legs[1].input_token, addr(TOKEN_B));
    assert_eq!(report.legs[1].output_token, addr(TOKEN_C));
    assert_eq!(report.dropped, 0);
}

#[test]
fn test_native_sub_calls_and_unwrap() {
    let calls = vec![
        SubCall {
            to: addr(BENEFICIARY),
            value: amt(3),
        },
        SubCall {
            to: addr(BENEFICIARY),
            value: amt(8),
        },
        SubCall {
            to: addr(BENEFICIARY),
            value: Amount::ZERO,
        },
    ];
    let logs = vec![RawLog::withdrawal(&addr(WETH), &addr(SWAPPER), amt(8))];
    let report = trace(&swapper_ctx(), &calls, &logs);

    assert_eq!(report.legs.len(), 2);
    assert_eq!(report.legs[0].input_token, addr(WETH));
    assert_eq!(report.legs[0].output_token, Address::zero());
    assert_eq!(report.legs[0].output_amount, amt(8));
    assert_eq!(report.legs[1].input_token, Address::zero());
    assert_eq!(report.legs[1].input_amount, amt(3));
}

#[test]
fn test_diversifier_beneficiaries() {
    let ctx = TraceContext {
        account: addr(SWAPPER),
        beneficiaries: vec![addr(20), addr(21)],
        round_robin: vec![addr(21)],
        default_beneficiary: None,
    };
    let logs = vec![
        RawLog::transfer(&addr(TOKEN_A), &addr(SWAPPER), &addr(VENUE), amt(5)),
        RawLog::transfer(&addr(TOKEN_B), &addr(VENUE), &addr(21), amt(7)),
        RawLog::transfer(&addr(TOKEN_A), &addr(SWAPPER), &addr(VENUE), amt(6)),
        RawLog::withdrawal(&addr(WETH), &addr(VENUE), amt(60)),
        RawLog::transfer(&addr(TOKEN_C), &addr(SWAPPER), &addr(20), amt(4)),
    ];
    let report = trace(&ctx, &[], &logs);

    assert_eq!(report.legs.len(), 2);
    assert_eq!(report.legs[0].beneficiary, addr(21));
    assert_eq!(report.legs[1].beneficiary, addr(21));
    assert_eq!(report.legs[1].output_token, Address::zero());
    // The payment to 20 had no input to pair with.
    assert_eq!(report.dropped, 1);
}
