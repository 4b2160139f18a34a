//! CB <-> CBS bridge scenarios

use dsp_core::{AccrualContext, Address, Amount, Partition, Role, RoleGate};
use dsp_ledger::{Ledger, TokenConfig};
use dsp_partition::{PartitionedError, PartitionedLedger, SwapError, TokenSwap};
use dsp_policy::{Policy, PolicyChain, PolicyConfig};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

const JAN_1_2023: i64 = 1_672_531_200;

fn amt(value: Decimal) -> Amount {
    Amount::new(value).unwrap()
}

fn admin() -> Address {
    Address::from_label("admin")
}

struct Bridge {
    ctx: AccrualContext,
    cb: Ledger,
    cbs: PartitionedLedger,
    swap: TokenSwap,
}

/// CB with 1,000,000 held by admin, an empty CBS and a wired-up bridge
fn bridge() -> Bridge {
    let ctx = AccrualContext::at(JAN_1_2023);
    let mut cb = Ledger::new(TokenConfig::default(), admin(), ctx);
    cb.mint(&ctx, &admin(), admin(), amt(dec!(1000000))).unwrap();

    let mut cbs = PartitionedLedger::new(
        admin(),
        "CBSToken",
        "CBST",
        4,
        vec![admin()],
        Partition::defaults(),
    );
    let swap = TokenSwap::new(admin());

    cb.approve(admin(), swap.address(), amt(dec!(10))).unwrap();
    cbs.add_minter(&admin(), swap.address()).unwrap();
    cbs.authorize_operator_by_partition(admin(), Partition::issued(), swap.address());

    Bridge { ctx, cb, cbs, swap }
}

#[test]
fn swaps_cb_to_cbs_and_back() {
    let Bridge {
        ctx,
        mut cb,
        mut cbs,
        swap,
    } = bridge();
    let value = amt(dec!(10));
    assert_eq!(cbs.total_supply(), Amount::ZERO);
    assert!(swap.has_role(Role::SwapCbToCbs, &admin()));

    swap.swap_cb_to_cbs(&ctx, &mut cb, &mut cbs, &admin(), Partition::issued(), value)
        .unwrap();
    assert_eq!(cb.balance_of(&admin()).unwrap(), amt(dec!(999990)));
    assert_eq!(cb.balance_of(&swap.address()).unwrap(), value);
    assert_eq!(cbs.balance_of(&admin()), value);
    assert_eq!(cb.allowance(&admin(), &swap.address()), Amount::ZERO);

    swap.swap_cbs_to_cb(&ctx, &mut cb, &mut cbs, &admin(), Partition::issued(), value)
        .unwrap();
    assert_eq!(cb.balance_of(&admin()).unwrap(), amt(dec!(1000000)));
    assert_eq!(cb.balance_of(&swap.address()).unwrap(), Amount::ZERO);
    assert_eq!(cbs.balance_of(&admin()), Amount::ZERO);
    assert_eq!(cbs.total_supply(), Amount::ZERO);
}

#[test]
fn swapping_requires_the_swap_roles() {
    let Bridge {
        ctx,
        mut cb,
        mut cbs,
        mut swap,
    } = bridge();
    let account_one = Address::from_label("account-one");
    let value = amt(dec!(10));

    let err = swap
        .swap_cb_to_cbs(&ctx, &mut cb, &mut cbs, &account_one, Partition::issued(), value)
        .unwrap_err();
    assert_eq!(
        err,
        SwapError::Unauthorized {
            actor: account_one,
            role: Role::SwapCbToCbs
        }
    );
    assert!(matches!(
        swap.swap_cbs_to_cb(&ctx, &mut cb, &mut cbs, &account_one, Partition::issued(), value),
        Err(SwapError::Unauthorized {
            role: Role::SwapCbsToCb,
            ..
        })
    ));

    swap.grant_role(&admin(), Role::SwapCbToCbs, account_one).unwrap();
    assert!(swap.has_role(Role::SwapCbToCbs, &account_one));
}

#[test]
fn failed_issue_rolls_back_the_cb_leg() {
    let Bridge {
        ctx,
        mut cb,
        mut cbs,
        swap,
    } = bridge();
    cbs.remove_minter(&admin(), &swap.address()).unwrap();
    let (cb_before, cbs_before) = (cb.clone(), cbs.clone());

    let err = swap
        .swap_cb_to_cbs(&ctx, &mut cb, &mut cbs, &admin(), Partition::issued(), amt(dec!(10)))
        .unwrap_err();
    assert_eq!(
        err,
        SwapError::Cbs(PartitionedError::NotIssuer(swap.address()))
    );
    assert_eq!(cb, cb_before);
    assert_eq!(cbs, cbs_before);
    assert_eq!(cb.allowance(&admin(), &swap.address()), amt(dec!(10)));
}

#[test]
fn failed_release_rolls_back_the_redeem() {
    let Bridge {
        ctx,
        mut cb,
        mut cbs,
        swap,
    } = bridge();
    let value = amt(dec!(10));
    swap.swap_cb_to_cbs(&ctx, &mut cb, &mut cbs, &admin(), Partition::issued(), value)
        .unwrap();

    // CBS issued outside the bridge has no CB behind it in escrow
    cbs.issue_by_partition(&admin(), Partition::issued(), admin(), value)
        .unwrap();
    let (cb_before, cbs_before) = (cb.clone(), cbs.clone());

    let err = swap
        .swap_cbs_to_cb(&ctx, &mut cb, &mut cbs, &admin(), Partition::issued(), amt(dec!(20)))
        .unwrap_err();
    assert!(matches!(err, SwapError::Cb(_)));
    assert_eq!(cb, cb_before);
    assert_eq!(cbs, cbs_before);
    assert_eq!(cbs.balance_of(&admin()), amt(dec!(20)));
}

#[test]
fn redeem_needs_operator_rights() {
    let Bridge {
        ctx,
        mut cb,
        mut cbs,
        swap,
    } = bridge();
    let value = amt(dec!(10));
    swap.swap_cb_to_cbs(&ctx, &mut cb, &mut cbs, &admin(), Partition::issued(), value)
        .unwrap();
    cbs.revoke_operator_by_partition(&admin(), &Partition::issued(), &swap.address());

    assert!(matches!(
        swap.swap_cbs_to_cb(&ctx, &mut cb, &mut cbs, &admin(), Partition::issued(), value),
        Err(SwapError::Cbs(PartitionedError::NotOperator { .. }))
    ));
    assert_eq!(cb.balance_of(&swap.address()).unwrap(), value);
}

#[test]
fn capped_escrow_aborts_the_swap() {
    let Bridge {
        ctx,
        mut cb,
        mut cbs,
        swap,
    } = bridge();
    let id = cb
        .register_policy(&admin(), Policy::balance_limit(amt(dec!(5))))
        .unwrap();
    cb.set_default_policy(&admin(), Some(id)).unwrap();
    let cb_before = cb.clone();

    let err = swap
        .swap_cb_to_cbs(&ctx, &mut cb, &mut cbs, &admin(), Partition::issued(), amt(dec!(10)))
        .unwrap_err();
    assert!(matches!(err, SwapError::EscrowCapped { .. }));
    assert_eq!(cb, cb_before);
    assert_eq!(cbs.total_supply(), Amount::ZERO);

    cb.set_exempt(&admin(), swap.address(), true).unwrap();
    swap.swap_cb_to_cbs(&ctx, &mut cb, &mut cbs, &admin(), Partition::issued(), amt(dec!(10)))
        .unwrap();
    assert_eq!(cbs.balance_of(&admin()), amt(dec!(10)));
}

#[test]
fn exempt_escrow_releases_past_the_weekly_limit() {
    let Bridge {
        ctx,
        mut cb,
        mut cbs,
        swap,
    } = bridge();
    let chain = PolicyChain::regulated(admin(), &PolicyConfig::default()).unwrap();
    cb.install_policy_chain(&admin(), chain).unwrap();
    cb.set_exempt(&admin(), swap.address(), true).unwrap();
    let value = amt(dec!(5000));
    cb.approve(admin(), swap.address(), value).unwrap();

    swap.swap_cb_to_cbs(&ctx, &mut cb, &mut cbs, &admin(), Partition::issued(), value)
        .unwrap();
    assert_eq!(cb.balance_of(&swap.address()).unwrap(), value);

    swap.swap_cbs_to_cb(&ctx, &mut cb, &mut cbs, &admin(), Partition::issued(), value)
        .unwrap();
    assert_eq!(cb.balance_of(&admin()).unwrap(), amt(dec!(1000000)));
    assert_eq!(cb.balance_of(&swap.address()).unwrap(), Amount::ZERO);
    assert_eq!(cbs.total_supply(), Amount::ZERO);
}
