use guardian_vault::{
    adapters::{DivestRequest, ExecutionBounds, Side, YieldAdapter},
    constants::RATE_SCALE,
    errors::VaultError,
    state::Position,
};

mod common;

use common::*;

fn assert_bounded(minimum_out: u64, deadline: i64) {
    assert!(minimum_out > 0, "minimum output must never be zero");
    assert!(deadline > NOW, "deadline must lie after the clock reading");
}

#[test]
fn test_liquidity_invest_adds_remaining_asset_and_swap_output() {
    // Invest 1000: 500 swapped for 300 counter, liquidity added with (500, 300)
    let market = MockMarket::new(MarketState {
        vault_asset: 1_000,
        swap_output: Some(300),
        ..MarketState::with_reserves(1_000_000, 600_000)
    });
    let mut adapter = market.adapter();
    let mut position = Position::default();

    let consumed = adapter.invest(&mut position, 1_000, &bounds()).unwrap();

    let state = market.0.borrow();
    assert_eq!(state.swaps.len(), 1);
    assert_eq!(state.swaps[0].input, Side::Asset);
    assert_eq!(state.swaps[0].amount_in, 500);
    assert_eq!(state.swaps[0].minimum_out, 297);

    assert_eq!(state.adds.len(), 1);
    let add = state.adds[0];
    assert_eq!((add.asset_desired, add.counter_desired), (500, 300));
    assert_eq!((add.asset_min, add.counter_min), (495, 297));
    assert_eq!(add.deadline, NOW + 300);

    // The pool took 299 counter; the unit left over stays with the position
    assert_eq!(position.counter, 1);
    assert_eq!(state.vault_counter, 1);

    // Everything the market pulled is booked as the position's cost
    assert_eq!(consumed, 1_000 - state.vault_asset);
    assert_eq!(position.cost_basis, consumed);
    assert_eq!(position.receipt, state.vault_lp);
    assert!(position.receipt > 0);
}

#[test]
fn test_every_market_call_is_bounded() {
    let market = MockMarket::new(MarketState {
        vault_asset: 10_000,
        ..MarketState::with_reserves(1_000_000, 1_000_000)
    });
    let mut adapter = market.adapter();
    let mut position = Position::default();

    adapter.invest(&mut position, 10_000, &bounds()).unwrap();
    assert_eq!(position.counter, 10);
    assert_eq!(market.0.borrow().vault_counter, 10);

    let outcome = adapter
        .divest(&mut position, DivestRequest::All, &bounds())
        .unwrap();

    let state = market.0.borrow();
    // Counter left over from the add goes back out with the last swap
    assert_eq!(state.vault_counter, 0);
    assert_eq!(position.counter, 0);
    assert_eq!(state.swaps.len(), 2);
    assert_eq!(state.swaps[1].input, Side::Counter);
    for swap in &state.swaps {
        assert_bounded(swap.minimum_out, swap.deadline);
    }
    for add in &state.adds {
        assert_bounded(add.asset_min, add.deadline);
        assert_bounded(add.counter_min, add.deadline);
    }
    for remove in &state.removes {
        assert_bounded(remove.asset_min, remove.deadline);
        assert_bounded(remove.counter_min, remove.deadline);
    }

    assert!(!position.is_open());
    assert!(outcome.received > 9_800 && outcome.received < 10_000);
    assert_eq!(outcome.received, state.vault_asset);
}

#[test]
fn test_partial_liquidity_divest_releases_matching_book_value() {
    let market = MockMarket::new(MarketState {
        vault_asset: 10_000,
        ..MarketState::with_reserves(1_000_000, 1_000_000)
    });
    let mut adapter = market.adapter();
    let mut position = Position::default();
    adapter.invest(&mut position, 10_000, &bounds()).unwrap();
    let before = position;

    let outcome = adapter
        .divest(&mut position, DivestRequest::Assets(before.cost_basis / 2), &bounds())
        .unwrap();

    assert_eq!(
        position.receipt,
        before.receipt - market.0.borrow().removes[0].liquidity
    );
    assert_eq!(position.cost_basis + outcome.cost_released, before.cost_basis);
    assert!(outcome.cost_released >= before.cost_basis / 2 - 1);
}

#[test]
fn test_refused_approval_fails_invest() {
    let market = MockMarket::new(MarketState {
        vault_asset: 1_000,
        refuse_approval: true,
        ..MarketState::with_reserves(1_000_000, 1_000_000)
    });
    let mut adapter = market.adapter();
    let mut position = Position::default();

    let err = adapter.invest(&mut position, 1_000, &bounds()).unwrap_err();
    assert_eq!(err, VaultError::ApprovalFailed.into());
    assert_eq!(position, Position::default());
    assert!(market.0.borrow().swaps.is_empty());
}

#[test]
fn test_swap_below_minimum_is_rejected() {
    // Price moves between quote and execution
    let market = MockMarket::new(MarketState {
        vault_asset: 1_000,
        swap_output: Some(300),
        swap_haircut: 10,
        ..MarketState::with_reserves(1_000_000, 600_000)
    });
    let mut adapter = market.adapter();
    let mut position = Position::default();

    let err = adapter.invest(&mut position, 1_000, &bounds()).unwrap_err();
    assert_eq!(err, VaultError::SlippageExceeded.into());
    assert_eq!(position, Position::default());
}

#[test]
fn test_pool_pushed_off_reference_price_is_refused() {
    // Pool trades at 0.9 counter per asset while the caller expects 1.0
    let market = MockMarket::new(MarketState {
        vault_asset: 1_000,
        ..MarketState::with_reserves(1_000_000, 900_000)
    });
    let mut adapter = market.adapter_at(RATE_SCALE);
    let mut position = Position::default();

    let err = adapter.invest(&mut position, 1_000, &bounds()).unwrap_err();
    assert_eq!(err, VaultError::SlippageExceeded.into());
    assert_eq!(position, Position::default());

    let state = market.0.borrow();
    assert_eq!(state.swaps[0].minimum_out, 495);
    assert!(state.adds.is_empty());
}

#[test]
fn test_swap_returning_nothing_is_refused() {
    let market = MockMarket::new(MarketState {
        vault_asset: 1_000,
        swap_output: Some(0),
        ..MarketState::with_reserves(1_000_000, 1_000_000)
    });
    let mut adapter = market.adapter();
    let mut position = Position::default();

    let err = adapter.invest(&mut position, 1_000, &bounds()).unwrap_err();
    assert_eq!(err, VaultError::SlippageExceeded.into());
}

#[test]
fn test_zero_deadline_buffer_is_refused() {
    let market = MockMarket::new(MarketState {
        vault_asset: 1_000,
        ..MarketState::with_reserves(1_000_000, 1_000_000)
    });
    let mut adapter = market.adapter();
    let mut position = Position::default();
    let no_window = ExecutionBounds {
        deadline_buffer: 0,
        ..bounds()
    };

    let err = adapter.invest(&mut position, 1_000, &no_window).unwrap_err();
    assert_eq!(err, VaultError::InvalidDeadlineBuffer.into());
    assert!(market.0.borrow().swaps.is_empty());
}

#[test]
fn test_lending_invest_records_receipt_delta() {
    let pool = MockPool::new(5_000);
    let mut adapter = pool.adapter();
    let mut position = Position::default();

    let consumed = adapter.invest(&mut position, 5_000, &bounds()).unwrap();

    assert_eq!(consumed, 5_000);
    assert_eq!(position.receipt, 5_000);
    assert_eq!(position.cost_basis, 5_000);
    assert_eq!(pool.0.borrow().supplies, vec![5_000]);
}

#[test]
fn test_lending_refused_approval() {
    let pool = MockPool::new(5_000);
    pool.0.borrow_mut().refuse_approval = true;
    let mut adapter = pool.adapter();
    let mut position = Position::default();

    let err = adapter.invest(&mut position, 5_000, &bounds()).unwrap_err();
    assert_eq!(err, VaultError::ApprovalFailed.into());
    assert!(pool.0.borrow().supplies.is_empty());
}

#[test]
fn test_lending_short_withdrawal_is_surfaced() {
    let pool = MockPool::new(5_000);
    let mut adapter = pool.adapter();
    let mut position = Position::default();
    adapter.invest(&mut position, 5_000, &bounds()).unwrap();

    pool.0.borrow_mut().withdraw_shortfall = 1;
    let err = adapter
        .divest(&mut position, DivestRequest::Assets(2_000), &bounds())
        .unwrap_err();

    assert_eq!(err, VaultError::PartialWithdrawal.into());
    assert_eq!(position.receipt, 5_000);
    assert_eq!(position.cost_basis, 5_000);
}

#[test]
fn test_lending_divest_realizes_interest() {
    let pool = MockPool::new(5_000);
    let mut adapter = pool.adapter();
    let mut position = Position::default();
    adapter.invest(&mut position, 5_000, &bounds()).unwrap();
    pool.accrue(500);

    // Half the claimable balance releases half the book value
    let outcome = adapter
        .divest(&mut position, DivestRequest::Assets(2_750), &bounds())
        .unwrap();
    assert_eq!(outcome.received, 2_750);
    assert_eq!(outcome.cost_released, 2_500);

    let outcome = adapter
        .divest(&mut position, DivestRequest::All, &bounds())
        .unwrap();
    assert_eq!(outcome.received, 2_750);
    assert_eq!(outcome.cost_released, 2_500);
    assert!(!position.is_open());
}
