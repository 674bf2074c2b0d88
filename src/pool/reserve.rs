use soroban_sdk::{contracttype, panic_with_error, Address, Env};

use crate::constants::RAY;
use crate::errors::PoolError;
use crate::storage::{self, InterestRateConfig, ReserveData};

use super::config::ReserveConfig;
use super::interest;
use super::math;

/// A reserve with its configuration and accounting state, accrued to the
/// current ledger timestamp on load.
#[derive(Clone, Debug, Eq, PartialEq)]
#[contracttype]
pub struct Reserve {
    pub asset: Address,
    pub config: ReserveConfig,
    pub rate_config: InterestRateConfig,
    pub data: ReserveData,
    /// 10^decimals of the underlying asset
    pub scalar: i128,
}

impl Reserve {
    /// Load a reserve from the ledger and accrue interest to the current
    /// ledger timestamp.
    ///
    /// ### Arguments
    /// * `asset` - The contract address of the underlying asset
    ///
    /// ### Panics
    /// If the reserve does not exist, or if the ledger timestamp regressed
    /// below the reserve's last update
    pub fn load(e: &Env, asset: &Address) -> Reserve {
        if !storage::has_res(e, asset) {
            panic_with_error!(e, PoolError::ReserveNotFound);
        }
        let config = ReserveConfig::decode(&storage::get_res_config(e, asset));
        let rate_config = storage::get_rate_config(e, asset);
        let data = storage::get_res_data(e, asset);
        let scalar = 10i128.pow(config.decimals);
        let mut reserve = Reserve {
            asset: asset.clone(),
            config,
            rate_config,
            data,
            scalar,
        };
        reserve.accrue(e);
        reserve
    }

    /// Store the reserve's accounting state to the ledger
    pub fn store(&self, e: &Env) {
        storage::set_res_data(e, &self.asset, &self.data);
    }

    /// Advance both interest indices to the current ledger timestamp and
    /// recompute the current rates from the post-accrual totals.
    ///
    /// The liquidity index grows by simple interest and the borrow index by
    /// compounded interest. The spread the asymmetry leaves between total
    /// debt owed and total supply credited accumulates as pool margin.
    ///
    /// A no-op when the reserve was already updated this timestamp.
    fn accrue(&mut self, e: &Env) {
        let now = e.ledger().timestamp();
        if now < self.data.last_update {
            panic_with_error!(e, PoolError::InvalidTimestamp);
        }
        if now == self.data.last_update {
            return;
        }
        if self.data.total_scaled_supply == 0 && self.data.total_scaled_debt == 0 {
            self.data.last_update = now;
            return;
        }
        let dt = now - self.data.last_update;

        let linear = math::linear_interest(e, self.data.liquidity_rate, dt);
        self.data.liquidity_index = math::ray_mul(e, self.data.liquidity_index, RAY + linear);

        let compounded = math::compounded_interest(e, self.data.borrow_rate, dt);
        self.data.borrow_index = math::ray_mul(e, self.data.borrow_index, compounded);

        self.data.last_update = now;
        self.update_rates(e);
    }

    /// Recompute the current rates from the reserve's totals. Must be called
    /// after any mutation of the scaled totals.
    pub fn update_rates(&mut self, e: &Env) {
        let (borrow_rate, liquidity_rate) =
            interest::calc_rates(self.total_debt(e), self.total_supply(e), &self.rate_config);
        self.data.borrow_rate = borrow_rate;
        self.data.liquidity_rate = liquidity_rate;
    }

    /// The total supplied amount in underlying, interest accrued
    pub fn total_supply(&self, e: &Env) -> i128 {
        math::ray_mul(e, self.data.total_scaled_supply, self.data.liquidity_index)
    }

    /// The total outstanding debt in underlying, interest accrued
    pub fn total_debt(&self, e: &Env) -> i128 {
        math::ray_mul(e, self.data.total_scaled_debt, self.data.borrow_index)
    }

    /// Convert an underlying amount to a scaled supply amount at the current index
    pub fn to_scaled_supply(&self, e: &Env, amount: i128) -> i128 {
        math::ray_div(e, amount, self.data.liquidity_index)
    }

    /// Convert a scaled supply amount to underlying at the current index
    pub fn to_real_supply(&self, e: &Env, scaled_amount: i128) -> i128 {
        math::ray_mul(e, scaled_amount, self.data.liquidity_index)
    }

    /// Convert an underlying amount to a scaled debt amount at the current index
    pub fn to_scaled_debt(&self, e: &Env, amount: i128) -> i128 {
        math::ray_div(e, amount, self.data.borrow_index)
    }

    /// Convert a scaled debt amount to underlying at the current index
    pub fn to_real_debt(&self, e: &Env, scaled_amount: i128) -> i128 {
        math::ray_mul(e, scaled_amount, self.data.borrow_index)
    }
}
