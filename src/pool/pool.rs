use sep_40_oracle::{Asset, PriceFeedClient};
use soroban_sdk::{map, panic_with_error, unwrap::UnwrapOptimized, vec, Address, Env, Map, Vec};

use crate::{
    errors::PoolError,
    storage::{self, PoolConfig},
};

use super::reserve::Reserve;

/// The pool's configuration and cached working state for the duration of one
/// operation. Reserves are accrued once on first load and written back
/// together, so multi-asset operations observe a single logical timestamp.
pub struct Pool {
    pub config: PoolConfig,
    reserves: Map<Address, Reserve>,
    reserves_to_store: Vec<Address>,
    prices: Map<Address, i128>,
}

impl Pool {
    /// Load the Pool from the ledger
    pub fn load(e: &Env) -> Pool {
        Pool {
            config: storage::get_pool_config(e),
            reserves: map![e],
            reserves_to_store: vec![e],
            prices: map![e],
        }
    }

    /// Fetch a reserve, accrued to the current timestamp. Cached for the
    /// duration of the operation.
    ///
    /// ### Arguments
    /// * `asset` - The contract address of the underlying asset
    pub fn load_reserve(&mut self, e: &Env, asset: &Address) -> Reserve {
        if let Some(reserve) = self.reserves.get(asset.clone()) {
            return reserve;
        }
        let reserve = Reserve::load(e, asset);
        self.reserves.set(asset.clone(), reserve.clone());
        reserve
    }

    /// Cache a mutated reserve and mark it to be written back by
    /// `store_cached_reserves`
    ///
    /// ### Arguments
    /// * `reserve` - The updated reserve
    pub fn cache_reserve(&mut self, reserve: Reserve) {
        if !self.reserves_to_store.contains(&reserve.asset) {
            self.reserves_to_store.push_back(reserve.asset.clone());
        }
        self.reserves.set(reserve.asset.clone(), reserve);
    }

    /// Store all cached reserves marked for write-back to the ledger
    pub fn store_cached_reserves(&self, e: &Env) {
        for asset in self.reserves_to_store.iter() {
            let reserve = self.reserves.get(asset).unwrap_optimized();
            reserve.store(e);
        }
    }

    /// Require that the pool status allows new supplies
    ///
    /// ### Panics
    /// If the pool is frozen
    pub fn require_supply_allowed(&self, e: &Env) {
        if self.config.status > 1 {
            panic_with_error!(e, PoolError::InvalidPoolStatus);
        }
    }

    /// Require that the pool status allows new borrows
    ///
    /// ### Panics
    /// If the pool is on ice or frozen
    pub fn require_borrow_allowed(&self, e: &Env) {
        if self.config.status > 0 {
            panic_with_error!(e, PoolError::InvalidPoolStatus);
        }
    }

    /// Fetch the oracle price of an asset, cached for the duration of the
    /// operation.
    ///
    /// ### Arguments
    /// * `asset` - The contract address of the underlying asset
    ///
    /// ### Panics
    /// If the oracle has no positive price for the asset, or the price is
    /// older than the pool's max price age
    pub fn load_price(&mut self, e: &Env, asset: &Address) -> i128 {
        if let Some(price) = self.prices.get(asset.clone()) {
            return price;
        }
        let oracle_client = PriceFeedClient::new(e, &self.config.oracle);
        match oracle_client.lastprice(&Asset::Stellar(asset.clone())) {
            Some(price_data) => {
                if price_data.price <= 0 {
                    panic_with_error!(e, PoolError::PriceUnavailable);
                }
                if price_data.timestamp + self.config.max_price_age < e.ledger().timestamp() {
                    panic_with_error!(e, PoolError::StalePrice);
                }
                self.prices.set(asset.clone(), price_data.price);
                price_data.price
            }
            None => panic_with_error!(e, PoolError::PriceUnavailable),
        }
    }
}
