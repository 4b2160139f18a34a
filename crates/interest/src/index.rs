//! Interest Index
//!
//! A single global multiplier turns rate-independent principal balances into
//! displayed balances. Accrual touches only this value, never the holders.
//!
//! Interest compounds per recalculation interval:
//! `index = index * (1 + annual_rate * elapsed / SECONDS_PER_YEAR)`.
//! Crossing into a later calendar year first accrues to the 1 January boundary
//! and snapshots the closing index for the year that ended.

use dsp_core::{year_start, AccrualContext, Amount, DECIMALS, SECONDS_PER_YEAR};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::{InterestError, InterestResult};

/// Fixed-point scale of externally supplied rates (1e27 == 100 %)
pub const RAY: u128 = 1_000_000_000_000_000_000_000_000_000;

/// Decimal places kept on the index after each accrual step
pub const INDEX_DP: u32 = 18;

/// Default ceiling for the annual rate (200 %)
pub const DEFAULT_MAX_ANNUAL_RATE: Decimal = Decimal::from_parts(2, 0, 0, false, 0);

/// Convert a ray-scaled rate into a fraction (`5e26` -> `0.5`).
///
/// Returns `None` if the value does not fit a 96-bit mantissa.
pub fn ray_to_fraction(ray: u128) -> Option<Decimal> {
    let mantissa = i128::try_from(ray).ok()?;
    Decimal::try_from_i128_with_scale(mantissa, 27)
        .ok()
        .map(|d| d.normalize())
}

/// Convert a fraction back to its ray-scaled form
pub fn fraction_to_ray(rate: Decimal) -> Option<u128> {
    let scaled = rate.checked_mul(Decimal::from(1_000_000_000_000_000_000u64))?;
    let scaled = scaled.checked_mul(Decimal::from(1_000_000_000u64))?;
    scaled.trunc().to_u128()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InterestIndex {
    /// Annual rate as a fraction (0.5 == 50 %)
    annual_rate: Decimal,
    /// Rate as last supplied by the administrator
    rate_ray: u128,
    max_annual_rate: Decimal,
    index: Decimal,
    initial_index: Decimal,
    inception_year: i32,
    last_update: i64,
    current_year: i32,
    /// Closing index per accounting year
    year_end_index: BTreeMap<i32, Decimal>,
}

impl InterestIndex {
    /// Index at 1.0 with a zero rate, starting at `ctx`
    pub fn new(ctx: AccrualContext) -> Self {
        Self::with_max_rate(ctx, DEFAULT_MAX_ANNUAL_RATE)
    }

    pub fn with_max_rate(ctx: AccrualContext, max_annual_rate: Decimal) -> Self {
        Self {
            annual_rate: Decimal::ZERO,
            rate_ray: 0,
            max_annual_rate,
            index: Decimal::ONE,
            initial_index: Decimal::ONE,
            inception_year: ctx.year,
            last_update: ctx.now,
            current_year: ctx.year,
            year_end_index: BTreeMap::new(),
        }
    }

    /// Bring the index up to `ctx.now`, closing any calendar years crossed.
    ///
    /// Calling it twice at the same timestamp changes nothing.
    pub fn recalculate(&mut self, ctx: &AccrualContext) -> InterestResult<()> {
        if ctx.now < self.last_update {
            return Err(InterestError::NonMonotonicTime {
                last_update: self.last_update,
                now: ctx.now,
            });
        }

        while ctx.year > self.current_year {
            let next = self.current_year + 1;
            let boundary = year_start(next).ok_or(InterestError::YearOutOfRange(next))?;
            self.accrue_to(boundary.min(ctx.now))?;
            self.close_year();
        }

        self.accrue_to(ctx.now)
    }

    /// Change the annual rate. Interest up to `ctx.now` accrues at the old rate.
    ///
    /// With `keep_year_boundary` the current accounting year is closed at
    /// `ctx.now` before the new rate takes effect. A calendar year can be
    /// closed early only once.
    pub fn set_interest_rate(
        &mut self,
        ctx: &AccrualContext,
        ray: u128,
        keep_year_boundary: bool,
    ) -> InterestResult<()> {
        let rate = ray_to_fraction(ray)
            .filter(|rate| *rate <= self.max_annual_rate)
            .ok_or_else(|| InterestError::InvalidRate {
                ray,
                max: self.max_annual_rate.to_string(),
            })?;
        if keep_year_boundary && self.current_year > ctx.year {
            return Err(InterestError::YearAlreadyClosed(ctx.year));
        }

        self.recalculate(ctx)?;
        if keep_year_boundary {
            self.close_year();
        }

        tracing::info!(
            old_rate = %self.annual_rate,
            new_rate = %rate,
            index = %self.index,
            keep_year_boundary,
            "Interest rate changed"
        );
        self.annual_rate = rate;
        self.rate_ray = ray;
        Ok(())
    }

    /// Recalculate, then return the closing index of `year`
    pub fn calculate_eoy_interest(
        &mut self,
        ctx: &AccrualContext,
        year: i32,
    ) -> InterestResult<Decimal> {
        self.recalculate(ctx)?;
        self.year_end_index
            .get(&year)
            .copied()
            .ok_or(InterestError::YearNotClosed(year))
    }

    fn accrue_to(&mut self, timestamp: i64) -> InterestResult<()> {
        if timestamp <= self.last_update {
            return Ok(());
        }
        let elapsed = timestamp - self.last_update;

        if !self.annual_rate.is_zero() {
            let growth = self
                .annual_rate
                .checked_mul(Decimal::from(elapsed))
                .and_then(|v| v.checked_div(Decimal::from(SECONDS_PER_YEAR)))
                .ok_or(InterestError::Overflow("accrual growth"))?;
            self.index = self
                .index
                .checked_mul(Decimal::ONE + growth)
                .ok_or(InterestError::Overflow("index"))?
                .round_dp_with_strategy(INDEX_DP, RoundingStrategy::ToZero);
            tracing::debug!(index = %self.index, elapsed, "Index accrued");
        }

        self.last_update = timestamp;
        Ok(())
    }

    fn close_year(&mut self) {
        self.year_end_index.insert(self.current_year, self.index);
        tracing::info!(year = self.current_year, index = %self.index, "Year closed");
        self.current_year += 1;
    }

    // === Scale conversion ===

    /// Principal that a displayed amount corresponds to at the current index.
    ///
    /// Rounds up at token precision, so `to_scaled(to_principal(x)) >= x`.
    /// It is the smallest principal that displays as at least `x`, which makes
    /// crediting and debiting the same amount move the same principal.
    pub fn to_principal(&self, amount: Amount) -> InterestResult<Amount> {
        let principal = amount
            .value()
            .checked_div(self.index)
            .ok_or(InterestError::Overflow("to_principal"))?
            .round_dp_with_strategy(DECIMALS, RoundingStrategy::ToPositiveInfinity);
        Amount::new(principal).map_err(|_| InterestError::Overflow("to_principal"))
    }

    /// Displayed amount of a principal balance at the current index (rounds down)
    pub fn to_scaled(&self, principal: Amount) -> InterestResult<Amount> {
        Self::scale_with(principal, self.index)
    }

    /// Displayed amount of a principal at an arbitrary index (rounds down)
    pub fn scale_with(principal: Amount, index: Decimal) -> InterestResult<Amount> {
        let scaled = principal
            .value()
            .checked_mul(index)
            .ok_or(InterestError::Overflow("to_scaled"))?;
        Amount::truncated(scaled).map_err(|_| InterestError::Overflow("to_scaled"))
    }

    // === Accessors ===

    pub fn index(&self) -> Decimal {
        self.index
    }

    pub fn annual_rate(&self) -> Decimal {
        self.annual_rate
    }

    pub fn rate_ray(&self) -> u128 {
        self.rate_ray
    }

    /// Derived per-second rate (annual rate / seconds per year)
    pub fn rate_per_second(&self) -> Decimal {
        self.annual_rate / Decimal::from(SECONDS_PER_YEAR)
    }

    pub fn max_annual_rate(&self) -> Decimal {
        self.max_annual_rate
    }

    pub fn last_update(&self) -> i64 {
        self.last_update
    }

    pub fn current_year(&self) -> i32 {
        self.current_year
    }

    pub fn inception_year(&self) -> i32 {
        self.inception_year
    }

    pub fn year_end_index(&self, year: i32) -> Option<Decimal> {
        self.year_end_index.get(&year).copied()
    }

    /// Index in effect when accounting year `year` opened
    pub fn index_at_year_start(&self, year: i32) -> Option<Decimal> {
        if year == self.inception_year {
            return Some(self.initial_index);
        }
        if year < self.inception_year {
            return None;
        }
        self.year_end_index.get(&(year - 1)).copied()
    }

    /// Closing index of `year`, or the live index if `year` is still open
    pub fn index_at_year_end(&self, year: i32) -> Option<Decimal> {
        if year == self.current_year {
            return Some(self.index);
        }
        self.year_end_index.get(&year).copied()
    }
}
