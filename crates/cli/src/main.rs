//! DSP CLI - Main entry point

use dsp_cli::{commands, parse_address, AppContext};
use dsp_core::{Address, Partition, Role};
use dsp_ledger::TokenConfig;
use clap::{Parser, Subcommand};
use rust_decimal::Decimal;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "dsp")]
#[command(about = "DSP - interest-bearing CB token and partitioned CBS token", long_about = None)]
struct Cli {
    /// Data directory path
    #[arg(short, long, default_value = "./data")]
    data: PathBuf,

    /// Ledger time in unix seconds (defaults to now)
    #[arg(long)]
    now: Option<i64>,

    /// Acting account: 0x address or label
    #[arg(long = "as", default_value = "issuer")]
    actor: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the CB token with the acting account as issuer
    Init {
        /// Token config JSON file
        #[arg(long)]
        config: Option<PathBuf>,
        /// Mint supply, install the regulated chain, add a bank and a person
        #[arg(long)]
        dev: bool,
    },

    /// Mint CB
    Mint { to: String, amount: Decimal },

    /// Burn CB
    Burn { from: String, amount: Decimal },

    /// Transfer CB from the acting account
    Transfer { to: String, amount: Decimal },

    /// Pay out the acting account's held overflow
    ReleaseOverflow,

    /// Show balances for an account
    Balance { account: String },

    /// Show total supplies
    Supply,

    /// Set the annual interest rate as a fraction (0.5 == 50 %)
    SetRate {
        rate: Decimal,
        /// Close the accounting year at this point
        #[arg(long)]
        keep_year_boundary: bool,
    },

    /// Bring the interest index up to date
    Recalculate,

    /// Interest earned by an account in a year
    Interest {
        account: String,
        #[arg(long)]
        year: Option<i32>,
    },

    /// Grant a CB role (e.g. MINTER, BANK)
    GrantRole { role: Role, account: String },

    /// Recognize a bank
    WhitelistBank { bank: String, name: String },

    /// Show bank and authentication status
    WhitelistStatus { account: String },

    /// Authenticate a person, acting as their bank
    AuthenticatePerson { person: String },

    /// Create the CBS token and the swap bridge
    InitCbs {
        /// Controller accounts (defaults to the acting account)
        #[arg(long = "controller")]
        controllers: Vec<String>,
        /// Default partitions (defaults to reserved, issued, locked)
        #[arg(long = "partition")]
        partitions: Vec<Partition>,
    },

    /// Let an account issue CBS
    AddCbsMinter { account: String },

    /// Let the swap escrow redeem the acting account's CBS in a partition
    AddCbsOperator {
        #[arg(default_value = "issued")]
        partition: Partition,
    },

    /// Swap CB into CBS
    SwapCbToCbs {
        amount: Decimal,
        #[arg(long, default_value = "issued")]
        partition: Partition,
    },

    /// Swap CBS back into CB
    SwapCbsToCb {
        amount: Decimal,
        #[arg(long, default_value = "issued")]
        partition: Partition,
    },
}

fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let actor = parse_address(&cli.actor)?;
    let mut ctx = AppContext::new(&cli.data, cli.now)?;

    match cli.command {
        Commands::Init { config, dev } => {
            let config = match config {
                Some(path) => TokenConfig::from_file(&path)?,
                None => TokenConfig::default(),
            };
            commands::init(&mut ctx, actor, config, dev)?;
        }

        Commands::Mint { to, amount } => {
            commands::mint(&mut ctx, actor, parse_address(&to)?, amount)?;
        }

        Commands::Burn { from, amount } => {
            commands::burn(&mut ctx, actor, parse_address(&from)?, amount)?;
        }

        Commands::Transfer { to, amount } => {
            commands::transfer(&mut ctx, actor, parse_address(&to)?, amount)?;
        }

        Commands::ReleaseOverflow => {
            commands::release_overflow(&mut ctx, actor)?;
        }

        Commands::Balance { account } => {
            commands::balance(&mut ctx, parse_address(&account)?)?;
        }

        Commands::Supply => {
            commands::supply(&mut ctx)?;
        }

        Commands::SetRate {
            rate,
            keep_year_boundary,
        } => {
            commands::set_rate(&mut ctx, actor, rate, keep_year_boundary)?;
        }

        Commands::Recalculate => {
            commands::recalculate(&mut ctx)?;
        }

        Commands::Interest { account, year } => {
            commands::interest(&mut ctx, parse_address(&account)?, year)?;
        }

        Commands::GrantRole { role, account } => {
            commands::grant_role(&mut ctx, actor, role, parse_address(&account)?)?;
        }

        Commands::WhitelistBank { bank, name } => {
            commands::whitelist_bank(&mut ctx, actor, parse_address(&bank)?, &name)?;
        }

        Commands::WhitelistStatus { account } => {
            commands::whitelist_status(&ctx, parse_address(&account)?)?;
        }

        Commands::AuthenticatePerson { person } => {
            commands::authenticate_person(&mut ctx, actor, parse_address(&person)?)?;
        }

        Commands::InitCbs {
            controllers,
            partitions,
        } => {
            let controllers = controllers
                .iter()
                .map(|c| parse_address(c))
                .collect::<anyhow::Result<Vec<Address>>>()?;
            commands::init_cbs(&mut ctx, actor, controllers, partitions)?;
        }

        Commands::AddCbsMinter { account } => {
            commands::add_cbs_minter(&mut ctx, actor, parse_address(&account)?)?;
        }

        Commands::AddCbsOperator { partition } => {
            commands::add_cbs_operator(&mut ctx, actor, partition)?;
        }

        Commands::SwapCbToCbs { amount, partition } => {
            commands::swap_cb_to_cbs(&mut ctx, actor, partition, amount)?;
        }

        Commands::SwapCbsToCb { amount, partition } => {
            commands::swap_cbs_to_cb(&mut ctx, actor, partition, amount)?;
        }
    }

    Ok(())
}
