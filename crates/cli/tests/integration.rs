//! Integration tests for the DSP CLI
//!
//! Each step opens a fresh context over the same data directory, the way
//! separate `dsp` invocations do.

use dsp_cli::commands::{self, DEV_BANK, DEV_PERSON, DEV_TENOR_MINKENDE};
use dsp_cli::{parse_address, AppContext};
use dsp_core::{Address, Amount, Partition, Role, RoleGate, ONE_YEAR};
use dsp_ledger::{LedgerError, TokenConfig};
use rust_decimal_macros::dec;
use std::path::Path;
use tempfile::TempDir;

const JAN_1_2023: i64 = 1_672_531_200;

fn issuer() -> Address {
    Address::from_label("issuer")
}

fn open(path: &Path, now: i64) -> AppContext {
    AppContext::new(path, Some(now)).unwrap()
}

fn dev_init(path: &Path) {
    let mut ctx = open(path, JAN_1_2023);
    commands::init(&mut ctx, issuer(), TokenConfig::default(), true).unwrap();
}

#[test]
fn test_dev_init_persists_state() {
    let temp_dir = TempDir::new().unwrap();
    dev_init(temp_dir.path());

    let ctx = open(temp_dir.path(), JAN_1_2023 + 60);
    let cb = ctx.cb().unwrap();
    let person = Address::from_label(DEV_PERSON);
    assert_eq!(cb.balance_of(&person).unwrap(), Amount::new(dec!(80000)).unwrap());
    assert_eq!(
        cb.balance_of(&Address::from_label(DEV_TENOR_MINKENDE)).unwrap(),
        Amount::new(dec!(800000)).unwrap()
    );
    assert_eq!(cb.balance_of(&issuer()).unwrap(), Amount::new(dec!(20000)).unwrap());
    assert_eq!(cb.total_supply().unwrap(), Amount::new(dec!(1000000)).unwrap());
    assert!(cb.is_bank(&Address::from_label(DEV_BANK)));
    assert_eq!(cb.policies().len(), 6);

    let records = ctx.journal().read_all().unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].operation, "init");
}

#[test]
fn test_init_twice_fails() {
    let temp_dir = TempDir::new().unwrap();
    dev_init(temp_dir.path());

    let mut ctx = open(temp_dir.path(), JAN_1_2023);
    assert!(commands::init(&mut ctx, issuer(), TokenConfig::default(), false).is_err());
}

#[test]
fn test_commands_require_init() {
    let temp_dir = TempDir::new().unwrap();
    let mut ctx = open(temp_dir.path(), JAN_1_2023);
    assert!(!ctx.is_initialized());
    assert!(commands::supply(&mut ctx).is_err());
}

#[test]
fn test_interest_accrues_across_invocations() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path();
    {
        let mut ctx = open(path, JAN_1_2023);
        commands::init(&mut ctx, issuer(), TokenConfig::default(), false).unwrap();
        commands::mint(&mut ctx, issuer(), parse_address("holder").unwrap(), dec!(1000)).unwrap();
        commands::set_rate(&mut ctx, issuer(), dec!(0.5), false).unwrap();
    }
    {
        let mut ctx = open(path, JAN_1_2023 + ONE_YEAR);
        commands::recalculate(&mut ctx).unwrap();
    }

    let ctx = open(path, JAN_1_2023 + ONE_YEAR);
    let holder = parse_address("holder").unwrap();
    assert_eq!(
        ctx.cb().unwrap().balance_of(&holder).unwrap(),
        Amount::new(dec!(1500)).unwrap()
    );
    assert_eq!(ctx.journal().read_all().unwrap().len(), 4);
}

#[test]
fn test_time_cannot_go_backwards() {
    let temp_dir = TempDir::new().unwrap();
    dev_init(temp_dir.path());
    {
        let mut ctx = open(temp_dir.path(), JAN_1_2023 + 100);
        commands::recalculate(&mut ctx).unwrap();
    }
    assert!(AppContext::new(temp_dir.path(), Some(JAN_1_2023)).is_err());
}

#[test]
fn test_rejected_transfer_is_not_saved() {
    let temp_dir = TempDir::new().unwrap();
    dev_init(temp_dir.path());

    let mut ctx = open(temp_dir.path(), JAN_1_2023);
    let person = parse_address(DEV_PERSON).unwrap();
    let stranger = parse_address("stranger").unwrap();
    let err = commands::transfer(&mut ctx, person, stranger, dec!(11)).unwrap_err();
    assert!(matches!(
        err.downcast_ref::<LedgerError>(),
        Some(LedgerError::LimitExceeded(_))
    ));

    let ctx = open(temp_dir.path(), JAN_1_2023);
    assert_eq!(ctx.cb().unwrap().balance_of(&stranger).unwrap(), Amount::ZERO);
    assert_eq!(ctx.journal().read_all().unwrap().len(), 1);
}

#[test]
fn test_bank_authenticates_person() {
    let temp_dir = TempDir::new().unwrap();
    dev_init(temp_dir.path());
    let bank = parse_address("second-bank").unwrap();
    let person = parse_address("alice").unwrap();

    let mut ctx = open(temp_dir.path(), JAN_1_2023);
    commands::whitelist_bank(&mut ctx, issuer(), bank, "Second Bank ASA").unwrap();
    commands::authenticate_person(&mut ctx, bank, person).unwrap();
    // authenticated on both sides, so the anonymous limits do not apply
    let sender = parse_address(DEV_PERSON).unwrap();
    commands::transfer(&mut ctx, sender, person, dec!(300)).unwrap();
    commands::whitelist_status(&ctx, person).unwrap();

    let ctx = open(temp_dir.path(), JAN_1_2023);
    let cb = ctx.cb().unwrap();
    assert!(cb.has_role(Role::Bank, &bank));
    assert_eq!(cb.balance_of(&person).unwrap(), Amount::new(dec!(300)).unwrap());
}

#[test]
fn test_swap_round_trip() {
    let temp_dir = TempDir::new().unwrap();
    dev_init(temp_dir.path());
    let path = temp_dir.path();

    let mut ctx = open(path, JAN_1_2023);
    commands::init_cbs(&mut ctx, issuer(), vec![], vec![]).unwrap();
    commands::add_cbs_operator(&mut ctx, issuer(), Partition::issued()).unwrap();
    commands::swap_cb_to_cbs(&mut ctx, issuer(), Partition::issued(), dec!(100)).unwrap();

    let mut ctx = open(path, JAN_1_2023);
    let escrow = ctx.swap.as_ref().unwrap().address();
    assert_eq!(
        ctx.cbs().unwrap().balance_of_by_partition(&Partition::issued(), &issuer()),
        Amount::new(dec!(100)).unwrap()
    );
    assert_eq!(
        ctx.cb().unwrap().balance_of(&escrow).unwrap(),
        Amount::new(dec!(100)).unwrap()
    );

    commands::swap_cbs_to_cb(&mut ctx, issuer(), Partition::issued(), dec!(40)).unwrap();
    let ctx = open(path, JAN_1_2023);
    assert_eq!(ctx.cbs().unwrap().total_supply(), Amount::new(dec!(60)).unwrap());
    assert_eq!(
        ctx.cb().unwrap().balance_of(&escrow).unwrap(),
        Amount::new(dec!(60)).unwrap()
    );
}

#[test]
fn test_large_swap_back_through_regulated_chain() {
    let temp_dir = TempDir::new().unwrap();
    dev_init(temp_dir.path());
    let path = temp_dir.path();

    let mut ctx = open(path, JAN_1_2023);
    commands::init_cbs(&mut ctx, issuer(), vec![], vec![]).unwrap();
    commands::add_cbs_operator(&mut ctx, issuer(), Partition::issued()).unwrap();
    commands::swap_cb_to_cbs(&mut ctx, issuer(), Partition::issued(), dec!(5000)).unwrap();

    // the escrow sends more than the weekly limit in one release
    let mut ctx = open(path, JAN_1_2023);
    commands::swap_cbs_to_cb(&mut ctx, issuer(), Partition::issued(), dec!(5000)).unwrap();

    let ctx = open(path, JAN_1_2023);
    assert_eq!(
        ctx.cb().unwrap().balance_of(&issuer()).unwrap(),
        Amount::new(dec!(20000)).unwrap()
    );
    assert_eq!(ctx.cbs().unwrap().total_supply(), Amount::ZERO);
}
