//! Holder accounts and per-year activity
//!
//! An account stores its principal (rate independent) and, for every
//! accounting year it was touched in, the principal it opened the year with
//! plus the displayed amounts that came in and went out. That is enough to
//! answer "interest earned in year Y" without replaying history.

use dsp_core::Amount;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::{LedgerError, LedgerResult};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct YearRecord {
    /// Principal before the first change in the year
    pub opening_principal: Amount,
    /// Minted or received, in displayed units
    pub received: Amount,
    /// Sent or burned, in displayed units
    pub sent: Amount,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    principal: Amount,
    years: BTreeMap<i32, YearRecord>,
}

impl Account {
    pub fn principal(&self) -> Amount {
        self.principal
    }

    pub fn year(&self, year: i32) -> Option<&YearRecord> {
        self.years.get(&year)
    }

    fn touch(&mut self, year: i32) -> &mut YearRecord {
        let opening = self.principal;
        self.years.entry(year).or_insert(YearRecord {
            opening_principal: opening,
            ..YearRecord::default()
        })
    }

    /// Add principal; `shown` is the displayed amount recorded for the year
    pub fn credit(&mut self, year: i32, principal: Amount, shown: Amount) -> LedgerResult<()> {
        let record = self.touch(year);
        record.received = record
            .received
            .checked_add(&shown)
            .ok_or(LedgerError::Overflow("received"))?;
        self.principal = self
            .principal
            .checked_add(&principal)
            .ok_or(LedgerError::Overflow("principal"))?;
        Ok(())
    }

    /// Remove principal; fails without changes if it exceeds the balance
    pub fn debit(&mut self, year: i32, principal: Amount, shown: Amount) -> LedgerResult<()> {
        let remaining = self
            .principal
            .checked_sub(&principal)
            .ok_or(LedgerError::Overflow("principal underflow"))?;
        let record = self.touch(year);
        record.sent = record
            .sent
            .checked_add(&shown)
            .ok_or(LedgerError::Overflow("sent"))?;
        self.principal = remaining;
        Ok(())
    }

    /// Principal held when `year` closed: the opening of the next touched
    /// year, or the live principal if nothing happened since
    pub fn closing_principal(&self, year: i32) -> Amount {
        self.years
            .range(year + 1..)
            .next()
            .map(|(_, record)| record.opening_principal)
            .unwrap_or(self.principal)
    }

    /// Principal held when `year` opened
    pub fn opening_principal(&self, year: i32) -> Amount {
        match self.years.get(&year) {
            Some(record) => record.opening_principal,
            None => self.closing_principal(year),
        }
    }
}
