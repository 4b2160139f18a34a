//! CLI commands

use dsp_core::{AccrualContext, Address, Amount, Partition, Role, RoleGate};
use dsp_interest::fraction_to_ray;
use dsp_ledger::{Ledger, TokenConfig};
use dsp_partition::{PartitionedLedger, TokenSwap};
use dsp_policy::PolicyChain;
use rust_decimal::Decimal;
use serde_json::json;

use crate::context::AppContext;

/// Labels of the accounts `init --dev` sets up
pub const DEV_BANK: &str = "dev-bank";
pub const DEV_PERSON: &str = "test-person";
pub const DEV_TENOR_BESKJEDEN: &str = "tenor-beskjeden";
pub const DEV_TENOR_MINKENDE: &str = "tenor-minkende";

/// Issuer distribution made by `init --dev`
const DEV_DISTRIBUTION: [(&str, i64); 4] = [
    (DEV_TENOR_BESKJEDEN, 100_000),
    (DEV_TENOR_MINKENDE, 400_000),
    (DEV_TENOR_MINKENDE, 400_000),
    (DEV_PERSON, 80_000),
];

/// Create the CB token with `issuer` as administrator
pub fn init(
    ctx: &mut AppContext,
    issuer: Address,
    config: TokenConfig,
    dev: bool,
) -> anyhow::Result<()> {
    if ctx.is_initialized() {
        anyhow::bail!("CB token already initialized in {}", ctx.data_path().display());
    }
    let clock = ctx.clock;
    let mut ledger = Ledger::new(config, issuer, clock);

    if dev {
        seed_dev_state(&mut ledger, &clock, issuer)?;
    }

    println!(
        "✅ {} ({}) initialized, issuer {}",
        ledger.name(),
        ledger.symbol(),
        issuer
    );
    ctx.cb = Some(ledger);
    ctx.commit("init", json!({ "issuer": issuer, "dev": dev }))
}

/// Development state: supply, the regulated chain, one bank and one person,
/// and most of the supply handed out by the exempt issuer
fn seed_dev_state(
    ledger: &mut Ledger,
    clock: &AccrualContext,
    issuer: Address,
) -> anyhow::Result<()> {
    ledger.mint(clock, &issuer, issuer, Amount::new(Decimal::from(1_000_000))?)?;

    let chain = PolicyChain::regulated(issuer, &ledger.config().policy)?;
    ledger.install_policy_chain(&issuer, chain)?;

    let bank = Address::from_label(DEV_BANK);
    let person = Address::from_label(DEV_PERSON);
    ledger.authenticate_bank(&issuer, bank, "Dev Bank ASA")?;
    ledger.set_authenticated_person(clock, &bank, person)?;
    for (label, amount) in DEV_DISTRIBUTION {
        let to = Address::from_label(label);
        ledger.transfer(clock, issuer, to, Amount::new(Decimal::from(amount))?)?;
        println!("   Transferred {} to {} ({})", amount, label, to);
    }

    println!("   Minted 1000000, installed {} policies", ledger.policies().len());
    println!("   Bank {} ({}), person {} ({})", DEV_BANK, bank, DEV_PERSON, person);
    Ok(())
}

// === CB supply and transfers ===

pub fn mint(ctx: &mut AppContext, caller: Address, to: Address, amount: Decimal) -> anyhow::Result<()> {
    let amount = Amount::new(amount)?;
    let clock = ctx.clock;
    ctx.cb_mut()?.mint(&clock, &caller, to, amount)?;

    println!("✅ Minted {} to {}", amount, to);
    ctx.commit("mint", json!({ "caller": caller, "to": to, "amount": amount }))
}

pub fn burn(ctx: &mut AppContext, caller: Address, from: Address, amount: Decimal) -> anyhow::Result<()> {
    let amount = Amount::new(amount)?;
    let clock = ctx.clock;
    ctx.cb_mut()?.burn(&clock, &caller, from, amount)?;

    println!("✅ Burned {} from {}", amount, from);
    ctx.commit("burn", json!({ "caller": caller, "from": from, "amount": amount }))
}

pub fn transfer(ctx: &mut AppContext, from: Address, to: Address, amount: Decimal) -> anyhow::Result<()> {
    let amount = Amount::new(amount)?;
    let clock = ctx.clock;
    let receipt = ctx.cb_mut()?.transfer(&clock, from, to, amount)?;

    if receipt.held.is_zero() {
        println!("✅ Transferred {} from {} to {}", amount, from, to);
    } else {
        println!(
            "✅ Transferred {} from {} to {} ({} held as overflow)",
            amount, from, to, receipt.held
        );
    }
    ctx.commit(
        "transfer",
        json!({ "from": from, "to": to, "amount": amount, "held": receipt.held }),
    )
}

/// Pay out the acting account's held overflow, as far as its cap allows
pub fn release_overflow(ctx: &mut AppContext, caller: Address) -> anyhow::Result<()> {
    let clock = ctx.clock;
    let released = ctx.cb_mut()?.release_overflow(&clock, &caller, caller)?;

    println!("✅ Released {} of overflow to {}", released, caller);
    ctx.commit("release-overflow", json!({ "account": caller, "released": released }))
}

// === Reads ===

pub fn balance(ctx: &mut AppContext, account: Address) -> anyhow::Result<()> {
    let clock = ctx.clock;
    let ledger = ctx.cb_mut()?;
    ledger.recalculate_index(&clock)?;

    println!("Balance for {}: {} {}", account, ledger.balance_of(&account)?, ledger.symbol());
    println!("   Principal: {}", ledger.principal_of(&account));
    if let Ok(overflow) = ledger.overflow_balance_of(&account) {
        if !overflow.is_zero() {
            println!("   Overflow:  {}", overflow);
        }
    }
    if let Some(ref cbs) = ctx.cbs {
        for partition in cbs.partitions_of(&account) {
            println!(
                "   {} [{}]: {}",
                cbs.symbol(),
                partition,
                cbs.balance_of_by_partition(&partition, &account)
            );
        }
    }
    Ok(())
}

pub fn supply(ctx: &mut AppContext) -> anyhow::Result<()> {
    let clock = ctx.clock;
    let ledger = ctx.cb_mut()?;
    ledger.recalculate_index(&clock)?;

    println!("{} total supply: {}", ledger.symbol(), ledger.total_supply()?);
    println!("   Principal: {}", ledger.total_principal());
    println!("   Index:     {}", ledger.interest().index());
    println!("   Rate:      {}", ledger.interest().annual_rate());
    if let Some(ref cbs) = ctx.cbs {
        println!("{} total supply: {}", cbs.symbol(), cbs.total_supply());
        for partition in cbs.total_partitions() {
            println!("   [{}]: {}", partition, cbs.total_supply_by_partition(&partition));
        }
    }
    Ok(())
}

// === Interest ===

/// `rate` is the annual fraction, e.g. 0.5 for 50 %
pub fn set_rate(
    ctx: &mut AppContext,
    caller: Address,
    rate: Decimal,
    keep_year_boundary: bool,
) -> anyhow::Result<()> {
    let ray = fraction_to_ray(rate)
        .ok_or_else(|| anyhow::anyhow!("Rate {} cannot be expressed as a ray", rate))?;
    let clock = ctx.clock;
    ctx.cb_mut()?
        .set_interest_rate(&clock, &caller, ray, keep_year_boundary)?;

    println!("✅ Annual rate set to {}", rate);
    ctx.commit(
        "set-rate",
        json!({ "caller": caller, "rate": rate, "ray": ray.to_string(), "keep_year_boundary": keep_year_boundary }),
    )
}

pub fn recalculate(ctx: &mut AppContext) -> anyhow::Result<()> {
    let clock = ctx.clock;
    let ledger = ctx.cb_mut()?;
    ledger.recalculate_index(&clock)?;
    let index = ledger.interest().index();

    println!("✅ Index {} at {}", index, clock.now);
    ctx.commit("recalculate", json!({ "index": index }))
}

pub fn interest(ctx: &mut AppContext, account: Address, year: Option<i32>) -> anyhow::Result<()> {
    let clock = ctx.clock;
    let ledger = ctx.cb_mut()?;
    ledger.recalculate_index(&clock)?;
    let year = year.unwrap_or(clock.year);

    println!(
        "Interest earned by {} in {}: {}",
        account,
        year,
        ledger.interest_earned(&account, year)?
    );
    if let Some(index) = ledger.interest().year_end_index(year) {
        println!("   Year-end index: {}", index);
    }
    Ok(())
}

// === Roles and authentication ===

pub fn grant_role(ctx: &mut AppContext, caller: Address, role: Role, account: Address) -> anyhow::Result<()> {
    let added = ctx.cb_mut()?.grant_role(&caller, role, account)?;
    if added {
        println!("✅ Granted {} to {}", role, account);
    } else {
        println!("{} already holds {}", account, role);
    }
    ctx.commit("grant-role", json!({ "caller": caller, "role": role, "account": account }))
}

pub fn whitelist_bank(ctx: &mut AppContext, caller: Address, bank: Address, name: &str) -> anyhow::Result<()> {
    ctx.cb_mut()?.authenticate_bank(&caller, bank, name)?;

    println!("✅ Bank {} ({}) whitelisted", name, bank);
    ctx.commit("whitelist-bank", json!({ "caller": caller, "bank": bank, "name": name }))
}

pub fn whitelist_status(ctx: &AppContext, account: Address) -> anyhow::Result<()> {
    let ledger = ctx.cb()?;
    let status = ledger.authentication_status(&ctx.clock, &account)?;

    println!("Status for {}:", account);
    println!("   Bank role: {}", ledger.has_role(Role::Bank, &account));
    println!("   Whitelisted bank: {}", ledger.is_bank(&account));
    println!("   Authentication: {}", serde_json::to_string(&status)?);
    Ok(())
}

pub fn authenticate_person(ctx: &mut AppContext, bank: Address, person: Address) -> anyhow::Result<()> {
    let clock = ctx.clock;
    ctx.cb_mut()?.set_authenticated_person(&clock, &bank, person)?;

    println!("✅ {} authenticated by {}", person, bank);
    ctx.commit("authenticate-person", json!({ "bank": bank, "person": person }))
}

// === CBS and the swap bridge ===

/// Create the CBS token and the bridge, administered by `caller`. When the CB
/// chain caps balances or requires authentication, the escrow is admitted.
pub fn init_cbs(
    ctx: &mut AppContext,
    caller: Address,
    controllers: Vec<Address>,
    partitions: Vec<Partition>,
) -> anyhow::Result<()> {
    if ctx.cbs.is_some() {
        anyhow::bail!("CBS token already initialized");
    }
    let clock = ctx.clock;
    let cb = ctx.cb_mut()?;
    let partitions = if partitions.is_empty() {
        Partition::defaults()
    } else {
        partitions
    };
    let controllers = if controllers.is_empty() {
        vec![caller]
    } else {
        controllers
    };

    let swap = TokenSwap::new(caller);
    let escrow = swap.address();
    let mut cbs = PartitionedLedger::new(
        caller,
        format!("{} Securities", cb.name()),
        format!("{}S", cb.symbol()),
        cb.decimals(),
        controllers,
        partitions,
    );
    cbs.add_minter(&caller, escrow)?;

    if cb.policies().balance_limit().is_ok() {
        cb.set_exempt(&caller, escrow, true)?;
    }
    if cb.policies().authenticated().is_ok() {
        cb.set_authenticated_contract(&clock, &caller, escrow)?;
    }

    println!("✅ {} ({}) initialized, swap escrow {}", cbs.name(), cbs.symbol(), escrow);
    ctx.cbs = Some(cbs);
    ctx.swap = Some(swap);
    ctx.commit("init-cbs", json!({ "caller": caller, "escrow": escrow }))
}

pub fn add_cbs_minter(ctx: &mut AppContext, caller: Address, account: Address) -> anyhow::Result<()> {
    ctx.cbs_mut()?.add_minter(&caller, account)?;

    println!("✅ {} may issue CBS", account);
    ctx.commit("add-cbs-minter", json!({ "caller": caller, "account": account }))
}

/// `holder` lets the swap escrow redeem their CBS in `partition`
pub fn add_cbs_operator(ctx: &mut AppContext, holder: Address, partition: Partition) -> anyhow::Result<()> {
    let escrow = ctx
        .swap
        .as_ref()
        .map(TokenSwap::address)
        .ok_or_else(|| anyhow::anyhow!("Swap bridge not initialized, run `dsp init-cbs`"))?;
    let cbs = ctx.cbs_mut()?;
    cbs.authorize_operator_by_partition(holder, partition, escrow);
    let operator = cbs.is_operator_for_partition(&partition, &escrow, &holder);

    println!("✅ isOperator {} for {} in [{}]", operator, holder, partition);
    ctx.commit(
        "add-cbs-operator",
        json!({ "holder": holder, "partition": partition, "operator": escrow }),
    )
}

/// Approve the escrow for `amount` CB, then swap it into CBS
pub fn swap_cb_to_cbs(
    ctx: &mut AppContext,
    caller: Address,
    partition: Partition,
    amount: Decimal,
) -> anyhow::Result<()> {
    let amount = Amount::new(amount)?;
    let clock = ctx.clock;
    let (cb, cbs, swap) = ctx.bridge_mut()?;
    cb.approve(caller, swap.address(), amount)?;
    swap.swap_cb_to_cbs(&clock, cb, cbs, &caller, partition, amount)?;

    println!("✅ Swapped {} CB to CBS [{}] for {}", amount, partition, caller);
    ctx.commit(
        "swap-cb-to-cbs",
        json!({ "caller": caller, "partition": partition, "amount": amount }),
    )
}

pub fn swap_cbs_to_cb(
    ctx: &mut AppContext,
    caller: Address,
    partition: Partition,
    amount: Decimal,
) -> anyhow::Result<()> {
    let amount = Amount::new(amount)?;
    let clock = ctx.clock;
    let (cb, cbs, swap) = ctx.bridge_mut()?;
    swap.swap_cbs_to_cb(&clock, cb, cbs, &caller, partition, amount)?;

    println!("✅ Swapped {} CBS [{}] to CB for {}", amount, partition, caller);
    ctx.commit(
        "swap-cbs-to-cb",
        json!({ "caller": caller, "partition": partition, "amount": amount }),
    )
}
