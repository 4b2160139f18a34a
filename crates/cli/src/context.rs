//! Application context - loads the stored tokens, hands them to a command,
//! saves them back

use anyhow::Context as _;
use dsp_core::{AccrualContext, Address};
use dsp_ledger::Ledger;
use dsp_partition::{PartitionedLedger, TokenSwap};
use dsp_store::{Journal, SnapshotStore};
use std::path::{Path, PathBuf};

const CB_SNAPSHOT: &str = "cb";
const CBS_SNAPSHOT: &str = "cbs";
const SWAP_SNAPSHOT: &str = "swap";

pub struct AppContext {
    pub clock: AccrualContext,
    pub cb: Option<Ledger>,
    pub cbs: Option<PartitionedLedger>,
    pub swap: Option<TokenSwap>,
    store: SnapshotStore,
    journal: Journal,
    data_path: PathBuf,
}

impl AppContext {
    /// Open the data directory. `now` defaults to the wall clock.
    pub fn new(data_path: impl AsRef<Path>, now: Option<i64>) -> anyhow::Result<Self> {
        let data_path = data_path.as_ref().to_path_buf();
        let store = SnapshotStore::new(data_path.join("snapshots"))?;
        let journal = Journal::open(data_path.join("journal"))?;

        let cb: Option<Ledger> = store.load(CB_SNAPSHOT)?;
        let cbs = store.load(CBS_SNAPSHOT)?;
        let swap = store.load(SWAP_SNAPSHOT)?;

        let now = now.unwrap_or_else(|| chrono::Utc::now().timestamp());
        let clock = AccrualContext::at(now);
        if let Some(ref ledger) = cb {
            let last = ledger.interest().last_update();
            if now < last {
                anyhow::bail!("Ledger time {} is before the last update at {}", now, last);
            }
        }

        tracing::debug!(path = %data_path.display(), now, "Context opened");
        Ok(Self {
            clock,
            cb,
            cbs,
            swap,
            store,
            journal,
            data_path,
        })
    }

    pub fn data_path(&self) -> &Path {
        &self.data_path
    }

    pub fn is_initialized(&self) -> bool {
        self.cb.is_some()
    }

    pub fn cb(&self) -> anyhow::Result<&Ledger> {
        self.cb.as_ref().context("CB token not initialized, run `dsp init`")
    }

    pub fn cb_mut(&mut self) -> anyhow::Result<&mut Ledger> {
        self.cb.as_mut().context("CB token not initialized, run `dsp init`")
    }

    pub fn cbs(&self) -> anyhow::Result<&PartitionedLedger> {
        self.cbs.as_ref().context("CBS token not initialized, run `dsp init-cbs`")
    }

    pub fn cbs_mut(&mut self) -> anyhow::Result<&mut PartitionedLedger> {
        self.cbs.as_mut().context("CBS token not initialized, run `dsp init-cbs`")
    }

    /// CB, CBS and the bridge together, for swaps
    pub fn bridge_mut(
        &mut self,
    ) -> anyhow::Result<(&mut Ledger, &mut PartitionedLedger, &TokenSwap)> {
        match (self.cb.as_mut(), self.cbs.as_mut(), self.swap.as_ref()) {
            (Some(cb), Some(cbs), Some(swap)) => Ok((cb, cbs, swap)),
            (None, _, _) => anyhow::bail!("CB token not initialized, run `dsp init`"),
            _ => anyhow::bail!("Swap bridge not initialized, run `dsp init-cbs`"),
        }
    }

    /// Persist every aggregate and journal the operation
    pub fn commit(&mut self, operation: &str, detail: serde_json::Value) -> anyhow::Result<()> {
        if let Some(ref cb) = self.cb {
            self.store.save(CB_SNAPSHOT, cb)?;
        }
        if let Some(ref cbs) = self.cbs {
            self.store.save(CBS_SNAPSHOT, cbs)?;
        }
        if let Some(ref swap) = self.swap {
            self.store.save(SWAP_SNAPSHOT, swap)?;
        }
        let record = self.journal.append(self.clock.now, operation, detail)?;
        tracing::info!(sequence = record.sequence, operation, "Committed");
        Ok(())
    }

    pub fn journal(&self) -> &Journal {
        &self.journal
    }
}

/// `0x`-prefixed hex, or any other text as a label hashed into an address
pub fn parse_address(input: &str) -> anyhow::Result<Address> {
    if input.starts_with("0x") {
        Ok(input.parse()?)
    } else {
        Ok(Address::from_label(input))
    }
}
