#![cfg(test)]

use crate::{
    constants::RAY,
    pool::{Reserve, ReserveConfig},
    storage::{self, InterestRateConfig, ReserveData},
    LendingPoolContract,
};
use sep_40_oracle::testutils::{MockPriceOracleClient, MockPriceOracleWASM};
use sep_41_token::testutils::{MockTokenClient, MockTokenWASM};
use soroban_fixed_point_math::FixedPoint;
use soroban_sdk::{testutils::Address as _, unwrap::UnwrapOptimized, Address, Env, IntoVal};

pub(crate) fn create_pool(e: &Env) -> Address {
    e.register_contract(None, LendingPoolContract {})
}

//************************************************
//           External Contract Helpers
//************************************************

// ***** Token *****

pub(crate) fn create_token_contract<'a>(
    e: &Env,
    admin: &Address,
) -> (Address, MockTokenClient<'a>) {
    let contract_address = Address::generate(e);
    e.register_contract_wasm(&contract_address, MockTokenWASM);
    let client = MockTokenClient::new(e, &contract_address);
    client.initialize(admin, &7, &"unit".into_val(e), &"test".into_val(e));
    (contract_address, client)
}

//***** Oracle ******

pub(crate) fn create_mock_oracle(e: &Env) -> (Address, MockPriceOracleClient) {
    let contract_address = e.register_contract_wasm(None, MockPriceOracleWASM);
    (
        contract_address.clone(),
        MockPriceOracleClient::new(e, &contract_address),
    )
}

//************************************************
//            Object Creation Helpers
//************************************************

//***** Reserve *****

pub(crate) fn default_reserve(e: &Env) -> Reserve {
    let (config, data) = default_reserve_meta();
    Reserve {
        asset: Address::generate(e),
        config,
        rate_config: default_rate_config(),
        data,
        scalar: 1_0000000,
    }
}

pub(crate) fn default_reserve_config() -> ReserveConfig {
    ReserveConfig {
        index: 0,
        decimals: 7,
        ltv: 7500,
        liq_threshold: 8000,
        liq_bonus: 10500,
        supply_cap: 0,
        borrow_cap: 0,
        active: true,
        frozen: false,
        borrowing_enabled: true,
        paused: false,
    }
}

pub(crate) fn default_rate_config() -> InterestRateConfig {
    InterestRateConfig {
        optimal_utilization: 8000,
        base_rate: 10_000_000_000_000_000_000_000_000,
        slope_one: 40_000_000_000_000_000_000_000_000,
        slope_two: 1_000_000_000_000_000_000_000_000_000,
        reserve_factor: 1000,
    }
}

pub(crate) fn default_reserve_meta() -> (ReserveConfig, ReserveData) {
    (
        default_reserve_config(),
        ReserveData {
            liquidity_index: RAY,
            borrow_index: RAY,
            liquidity_rate: 0,
            borrow_rate: 0,
            last_update: 0,
            total_scaled_supply: 100_0000000,
            total_scaled_debt: 75_0000000,
        },
    )
}

/// Create a reserve based on the supplied config and data.
///
/// Mints the idle underlying balance implied by the scaled totals and indices
/// to the pool.
pub(crate) fn create_reserve(
    e: &Env,
    pool_address: &Address,
    token_address: &Address,
    reserve_config: &ReserveConfig,
    reserve_data: &ReserveData,
) {
    let mut new_reserve_config = reserve_config.clone();
    e.as_contract(pool_address, || {
        let index = storage::push_res_list(e, token_address);
        new_reserve_config.index = index;
        storage::set_res_config(e, token_address, &new_reserve_config.encode(e));
        storage::set_rate_config(e, token_address, &default_rate_config());
        storage::set_res_data(e, token_address, reserve_data);
    });
    let underlying_client = MockTokenClient::new(e, token_address);

    // mint the pool the underlying it would hold at the current indices
    let total_supply = reserve_data
        .total_scaled_supply
        .fixed_mul_floor(reserve_data.liquidity_index, RAY)
        .unwrap_optimized();
    let total_debt = reserve_data
        .total_scaled_debt
        .fixed_mul_floor(reserve_data.borrow_index, RAY)
        .unwrap_optimized();
    let to_mint_pool = total_supply - total_debt;
    if to_mint_pool > 0 {
        underlying_client
            .mock_all_auths()
            .mint(pool_address, &to_mint_pool);
    }
}
