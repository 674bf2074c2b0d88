use crate::{
    constants::RAY,
    errors::PoolError,
    storage::{self, InterestRateConfig, PackedReserveConfig, PoolConfig, ReserveData},
};
use soroban_sdk::{contracttype, panic_with_error, Address, Env, Symbol};

use super::pool::Pool;

/// A reserve's risk parameters in field form. The ledger stores the packed
/// word (`PackedReserveConfig`); all business logic operates on this struct.
///
/// Packed bit layout, low limb:
/// * ltv                [0:16)
/// * liq_threshold      [16:32)
/// * liq_bonus          [32:48)
/// * decimals           [48:56)
/// * active             56
/// * frozen             57
/// * borrowing_enabled  58
/// * paused             59
/// * index              [64:72)
///
/// High limb:
/// * supply_cap         [0:48)
/// * borrow_cap         [48:96)
#[derive(Clone, Debug, Eq, PartialEq)]
#[contracttype]
pub struct ReserveConfig {
    /// The reserve's position in the reserve list
    pub index: u32,
    /// The decimals of the underlying asset
    pub decimals: u32,
    /// The loan-to-value ratio new borrows are limited by, in bps
    pub ltv: u32,
    /// The collateral ratio at which a position becomes liquidatable, in bps
    pub liq_threshold: u32,
    /// The premium paid to liquidators in seized collateral, in bps (>= 10000)
    pub liq_bonus: u32,
    /// The maximum amount of underlying that can be supplied, in whole tokens (0 = unlimited)
    pub supply_cap: u64,
    /// The maximum amount of underlying that can be borrowed, in whole tokens (0 = unlimited)
    pub borrow_cap: u64,
    pub active: bool,
    pub frozen: bool,
    pub borrowing_enabled: bool,
    pub paused: bool,
}

const MASK_16: u128 = 0xFFFF;
const MASK_8: u128 = 0xFF;
const MASK_48: u128 = 0xFFFF_FFFF_FFFF;

impl ReserveConfig {
    /// Pack the config into its dense storage word.
    ///
    /// ### Panics
    /// With `FieldOverflow` if any field exceeds its bit width
    pub fn encode(&self, e: &Env) -> PackedReserveConfig {
        if u128::from(self.ltv) > MASK_16
            || u128::from(self.liq_threshold) > MASK_16
            || u128::from(self.liq_bonus) > MASK_16
            || u128::from(self.decimals) > MASK_8
            || u128::from(self.index) > MASK_8
            || u128::from(self.supply_cap) > MASK_48
            || u128::from(self.borrow_cap) > MASK_48
        {
            panic_with_error!(e, PoolError::FieldOverflow);
        }
        let mut lo = u128::from(self.ltv)
            | u128::from(self.liq_threshold) << 16
            | u128::from(self.liq_bonus) << 32
            | u128::from(self.decimals) << 48
            | u128::from(self.index) << 64;
        if self.active {
            lo |= 1 << 56;
        }
        if self.frozen {
            lo |= 1 << 57;
        }
        if self.borrowing_enabled {
            lo |= 1 << 58;
        }
        if self.paused {
            lo |= 1 << 59;
        }
        let hi = u128::from(self.supply_cap) | u128::from(self.borrow_cap) << 48;
        PackedReserveConfig { lo, hi }
    }

    /// Unpack a stored config word. Exact inverse of `encode` for any word it
    /// produced.
    pub fn decode(packed: &PackedReserveConfig) -> Self {
        ReserveConfig {
            ltv: (packed.lo & MASK_16) as u32,
            liq_threshold: (packed.lo >> 16 & MASK_16) as u32,
            liq_bonus: (packed.lo >> 32 & MASK_16) as u32,
            decimals: (packed.lo >> 48 & MASK_8) as u32,
            active: packed.lo >> 56 & 1 == 1,
            frozen: packed.lo >> 57 & 1 == 1,
            borrowing_enabled: packed.lo >> 58 & 1 == 1,
            paused: packed.lo >> 59 & 1 == 1,
            index: (packed.lo >> 64 & MASK_8) as u32,
            supply_cap: (packed.hi & MASK_48) as u64,
            borrow_cap: (packed.hi >> 48 & MASK_48) as u64,
        }
    }
}

/// Initialize the pool
///
/// Panics if the pool is already initialized or the arguments are invalid
pub fn execute_initialize(
    e: &Env,
    admin: &Address,
    name: &Symbol,
    oracle: &Address,
    max_price_age: &u64,
) {
    if storage::has_admin(e) {
        panic_with_error!(e, PoolError::AlreadyInitialized);
    }
    if *max_price_age == 0 {
        panic_with_error!(e, PoolError::InvalidPoolInitArgs);
    }

    storage::set_admin(e, admin);
    storage::set_name(e, name);
    storage::set_pool_config(
        e,
        &PoolConfig {
            oracle: oracle.clone(),
            max_price_age: *max_price_age,
            status: 0,
        },
    );
}

/// Set the pool status
pub fn execute_set_status(e: &Env, status: u32) {
    if status > 2 {
        panic_with_error!(e, PoolError::InvalidPoolStatus);
    }
    let mut pool_config = storage::get_pool_config(e);
    pool_config.status = status;
    storage::set_pool_config(e, &pool_config);
}

/// Initialize a reserve for the pool
pub fn initialize_reserve(
    e: &Env,
    asset: &Address,
    config: &ReserveConfig,
    rate_config: &InterestRateConfig,
) -> u32 {
    if storage::has_res(e, asset) {
        panic_with_error!(e, PoolError::AlreadyInitialized);
    }

    require_valid_reserve_metadata(e, config);
    require_valid_rate_config(e, rate_config);
    let index = storage::push_res_list(e, asset);

    let mut reserve_config = config.clone();
    reserve_config.index = index;
    storage::set_res_config(e, asset, &reserve_config.encode(e));
    storage::set_rate_config(e, asset, rate_config);

    let init_data = ReserveData {
        liquidity_index: RAY,
        borrow_index: RAY,
        liquidity_rate: 0,
        borrow_rate: 0,
        last_update: e.ledger().timestamp(),
        total_scaled_supply: 0,
        total_scaled_debt: 0,
    };
    storage::set_res_data(e, asset, &init_data);
    index
}

/// Update a reserve's risk parameters
pub fn execute_update_reserve(e: &Env, asset: &Address, config: &ReserveConfig) {
    if !storage::has_res(e, asset) {
        panic_with_error!(e, PoolError::ReserveNotFound);
    }
    require_valid_reserve_metadata(e, config);

    let mut pool = Pool::load(e);

    // accrue under the outgoing parameters before they change
    let reserve = pool.load_reserve(e, asset);
    reserve.store(e);

    // force index to remain constant and only allow metadata based changes
    let mut new_config = config.clone();
    new_config.index = reserve.config.index;

    storage::set_res_config(e, asset, &new_config.encode(e));
}

/// Update a reserve's interest rate curve
pub fn execute_update_rate_config(e: &Env, asset: &Address, rate_config: &InterestRateConfig) {
    if !storage::has_res(e, asset) {
        panic_with_error!(e, PoolError::ReserveNotFound);
    }
    require_valid_rate_config(e, rate_config);

    let mut pool = Pool::load(e);

    // accrue under the outgoing curve before it changes
    let reserve = pool.load_reserve(e, asset);
    reserve.store(e);

    storage::set_rate_config(e, asset, rate_config);
}

fn require_valid_reserve_metadata(e: &Env, metadata: &ReserveConfig) {
    // a decimals of 0 cannot be distinguished from an unset field and corrupts
    // every downstream value conversion, so it is rejected outright
    if metadata.decimals == 0
        || metadata.decimals > 18
        || metadata.ltv > 10000
        || metadata.liq_threshold > 10000
        || metadata.liq_threshold < metadata.ltv
        || (metadata.liq_threshold > 0 && metadata.liq_bonus < 10000)
    {
        panic_with_error!(e, PoolError::InvalidReserveMetadata);
    }
}

fn require_valid_rate_config(e: &Env, rate_config: &InterestRateConfig) {
    if rate_config.optimal_utilization == 0
        || rate_config.optimal_utilization > 10000
        || rate_config.base_rate < 0
        || rate_config.slope_one < 0
        || rate_config.slope_one > rate_config.slope_two
        || rate_config.reserve_factor >= 10000
    {
        panic_with_error!(e, PoolError::InvalidReserveMetadata);
    }
}

#[cfg(test)]
mod tests {
    use crate::testutils;

    use super::*;
    use soroban_sdk::testutils::{Address as _, Ledger, LedgerInfo};

    #[test]
    fn test_config_encode_decode_round_trip() {
        let e = Env::default();

        let config = ReserveConfig {
            index: 7,
            decimals: 8,
            ltv: 7500,
            liq_threshold: 8000,
            liq_bonus: 10500,
            supply_cap: 1_000_000,
            borrow_cap: 750_000,
            active: true,
            frozen: false,
            borrowing_enabled: true,
            paused: false,
        };
        assert_eq!(ReserveConfig::decode(&config.encode(&e)), config);
    }

    #[test]
    fn test_config_encode_decode_round_trip_max_fields() {
        let e = Env::default();

        let config = ReserveConfig {
            index: 255,
            decimals: 255,
            ltv: 65535,
            liq_threshold: 65535,
            liq_bonus: 65535,
            supply_cap: 0xFFFF_FFFF_FFFF,
            borrow_cap: 0xFFFF_FFFF_FFFF,
            active: true,
            frozen: true,
            borrowing_enabled: true,
            paused: true,
        };
        assert_eq!(ReserveConfig::decode(&config.encode(&e)), config);

        let config = ReserveConfig {
            index: 0,
            decimals: 0,
            ltv: 0,
            liq_threshold: 0,
            liq_bonus: 0,
            supply_cap: 0,
            borrow_cap: 0,
            active: false,
            frozen: false,
            borrowing_enabled: false,
            paused: false,
        };
        assert_eq!(ReserveConfig::decode(&config.encode(&e)), config);
    }

    #[test]
    #[should_panic(expected = "Error(Contract, #100)")]
    fn test_config_encode_validates_ltv_width() {
        let e = Env::default();

        let mut config = testutils::default_reserve_config();
        config.ltv = 65536;
        config.encode(&e);
    }

    #[test]
    #[should_panic(expected = "Error(Contract, #100)")]
    fn test_config_encode_validates_cap_width() {
        let e = Env::default();

        let mut config = testutils::default_reserve_config();
        config.supply_cap = 0x1_0000_0000_0000;
        config.encode(&e);
    }

    #[test]
    fn test_execute_initialize() {
        let e = Env::default();
        let pool = testutils::create_pool(&e);

        let admin = Address::generate(&e);
        let name = Symbol::new(&e, "pool_name");
        let oracle = Address::generate(&e);
        let max_price_age = 86400u64;

        e.as_contract(&pool, || {
            execute_initialize(&e, &admin, &name, &oracle, &max_price_age);

            assert_eq!(storage::get_admin(&e), admin);
            let pool_config = storage::get_pool_config(&e);
            assert_eq!(pool_config.oracle, oracle);
            assert_eq!(pool_config.max_price_age, max_price_age);
            assert_eq!(pool_config.status, 0);
        });
    }

    #[test]
    #[should_panic(expected = "Error(Contract, #3)")]
    fn test_execute_initialize_already_initialized() {
        let e = Env::default();
        let pool = testutils::create_pool(&e);

        let admin = Address::generate(&e);
        let name = Symbol::new(&e, "pool_name");
        let oracle = Address::generate(&e);

        e.as_contract(&pool, || {
            execute_initialize(&e, &admin, &name, &oracle, &86400);
            execute_initialize(&e, &admin, &name, &oracle, &86400);
        });
    }

    #[test]
    #[should_panic(expected = "Error(Contract, #103)")]
    fn test_execute_initialize_validates_price_age() {
        let e = Env::default();
        let pool = testutils::create_pool(&e);

        let admin = Address::generate(&e);
        let name = Symbol::new(&e, "pool_name");
        let oracle = Address::generate(&e);

        e.as_contract(&pool, || {
            execute_initialize(&e, &admin, &name, &oracle, &0);
        });
    }

    #[test]
    fn test_execute_set_status() {
        let e = Env::default();
        let pool = testutils::create_pool(&e);

        e.as_contract(&pool, || {
            storage::set_pool_config(
                &e,
                &PoolConfig {
                    oracle: Address::generate(&e),
                    max_price_age: 86400,
                    status: 0,
                },
            );
            execute_set_status(&e, 2);
            assert_eq!(storage::get_pool_config(&e).status, 2);
        });
    }

    #[test]
    #[should_panic(expected = "Error(Contract, #116)")]
    fn test_execute_set_status_validates() {
        let e = Env::default();
        let pool = testutils::create_pool(&e);

        e.as_contract(&pool, || {
            storage::set_pool_config(
                &e,
                &PoolConfig {
                    oracle: Address::generate(&e),
                    max_price_age: 86400,
                    status: 0,
                },
            );
            execute_set_status(&e, 3);
        });
    }

    #[test]
    fn test_initialize_reserve() {
        let e = Env::default();
        let pool = testutils::create_pool(&e);
        let bombadil = Address::generate(&e);

        let (asset_id_0, _) = testutils::create_token_contract(&e, &bombadil);
        let (asset_id_1, _) = testutils::create_token_contract(&e, &bombadil);

        let metadata = testutils::default_reserve_config();
        let rate_config = testutils::default_rate_config();
        e.as_contract(&pool, || {
            initialize_reserve(&e, &asset_id_0, &metadata, &rate_config);
            initialize_reserve(&e, &asset_id_1, &metadata, &rate_config);

            let res_config_0 = ReserveConfig::decode(&storage::get_res_config(&e, &asset_id_0));
            let res_config_1 = ReserveConfig::decode(&storage::get_res_config(&e, &asset_id_1));
            assert_eq!(res_config_0.decimals, metadata.decimals);
            assert_eq!(res_config_0.ltv, metadata.ltv);
            assert_eq!(res_config_0.liq_threshold, metadata.liq_threshold);
            assert_eq!(res_config_0.liq_bonus, metadata.liq_bonus);
            assert_eq!(res_config_0.index, 0);
            assert_eq!(res_config_1.index, 1);
            assert_eq!(storage::get_rate_config(&e, &asset_id_0), rate_config);

            let res_data = storage::get_res_data(&e, &asset_id_0);
            assert_eq!(res_data.liquidity_index, RAY);
            assert_eq!(res_data.borrow_index, RAY);
            assert_eq!(res_data.total_scaled_supply, 0);
            assert_eq!(res_data.total_scaled_debt, 0);
        });
    }

    #[test]
    #[should_panic(expected = "Error(Contract, #3)")]
    fn test_initialize_reserve_blocks_duplicates() {
        let e = Env::default();
        let pool = testutils::create_pool(&e);
        let bombadil = Address::generate(&e);
        let (asset_id, _) = testutils::create_token_contract(&e, &bombadil);

        let metadata = testutils::default_reserve_config();
        let rate_config = testutils::default_rate_config();
        e.as_contract(&pool, || {
            initialize_reserve(&e, &asset_id, &metadata, &rate_config);
            initialize_reserve(&e, &asset_id, &metadata, &rate_config);
        });
    }

    #[test]
    fn test_execute_update_reserve() {
        let e = Env::default();
        e.mock_all_auths();
        e.ledger().set(LedgerInfo {
            timestamp: 500,
            protocol_version: 20,
            sequence_number: 100,
            network_id: Default::default(),
            base_reserve: 10,
            min_temp_entry_ttl: 10,
            min_persistent_entry_ttl: 10,
            max_entry_ttl: 2000000,
        });

        let pool = testutils::create_pool(&e);
        let bombadil = Address::generate(&e);

        let (underlying, _) = testutils::create_token_contract(&e, &bombadil);
        let (reserve_config, mut reserve_data) = testutils::default_reserve_meta();
        reserve_data.borrow_rate = 2_000_000_000_000_000_000;
        reserve_data.liquidity_rate = 1_000_000_000_000_000_000;
        reserve_data.last_update = 500;
        testutils::create_reserve(&e, &pool, &underlying, &reserve_config, &reserve_data);

        let mut new_metadata = testutils::default_reserve_config();
        new_metadata.index = 99;
        new_metadata.ltv = 6000;
        new_metadata.liq_threshold = 7000;

        e.ledger().set(LedgerInfo {
            timestamp: 10000,
            protocol_version: 20,
            sequence_number: 100,
            network_id: Default::default(),
            base_reserve: 10,
            min_temp_entry_ttl: 10,
            min_persistent_entry_ttl: 10,
            max_entry_ttl: 2000000,
        });

        let pool_config = PoolConfig {
            oracle: Address::generate(&e),
            max_price_age: 86400,
            status: 0,
        };
        e.as_contract(&pool, || {
            storage::set_pool_config(&e, &pool_config);

            let res_config_old = ReserveConfig::decode(&storage::get_res_config(&e, &underlying));

            execute_update_reserve(&e, &underlying, &new_metadata);
            let res_config_updated =
                ReserveConfig::decode(&storage::get_res_config(&e, &underlying));
            assert_eq!(res_config_updated.ltv, new_metadata.ltv);
            assert_eq!(res_config_updated.liq_threshold, new_metadata.liq_threshold);
            assert_eq!(res_config_updated.index, res_config_old.index);

            // validate interest was accrued
            let res_data = storage::get_res_data(&e, &underlying);
            assert!(res_data.borrow_index > RAY);
            assert_eq!(res_data.last_update, 10000);
        });
    }

    #[test]
    #[should_panic(expected = "Error(Contract, #102)")]
    fn test_execute_update_reserve_requires_reserve() {
        let e = Env::default();
        let pool = testutils::create_pool(&e);

        let metadata = testutils::default_reserve_config();
        e.as_contract(&pool, || {
            execute_update_reserve(&e, &Address::generate(&e), &metadata);
        });
    }

    #[test]
    fn test_validate_reserve_metadata() {
        let e = Env::default();

        let metadata = ReserveConfig {
            index: 0,
            decimals: 18,
            ltv: 7500,
            liq_threshold: 8000,
            liq_bonus: 10500,
            supply_cap: 0,
            borrow_cap: 0,
            active: true,
            frozen: false,
            borrowing_enabled: true,
            paused: false,
        };
        require_valid_reserve_metadata(&e, &metadata);
    }

    #[test]
    #[should_panic(expected = "Error(Contract, #101)")]
    fn test_validate_reserve_metadata_rejects_zero_decimals() {
        let e = Env::default();

        let mut metadata = testutils::default_reserve_config();
        metadata.decimals = 0;
        require_valid_reserve_metadata(&e, &metadata);
    }

    #[test]
    #[should_panic(expected = "Error(Contract, #101)")]
    fn test_validate_reserve_metadata_rejects_high_decimals() {
        let e = Env::default();

        let mut metadata = testutils::default_reserve_config();
        metadata.decimals = 19;
        require_valid_reserve_metadata(&e, &metadata);
    }

    #[test]
    #[should_panic(expected = "Error(Contract, #101)")]
    fn test_validate_reserve_metadata_rejects_threshold_below_ltv() {
        let e = Env::default();

        let mut metadata = testutils::default_reserve_config();
        metadata.ltv = 8500;
        metadata.liq_threshold = 8000;
        require_valid_reserve_metadata(&e, &metadata);
    }

    #[test]
    #[should_panic(expected = "Error(Contract, #101)")]
    fn test_validate_reserve_metadata_rejects_low_bonus() {
        let e = Env::default();

        let mut metadata = testutils::default_reserve_config();
        metadata.liq_bonus = 9999;
        require_valid_reserve_metadata(&e, &metadata);
    }

    #[test]
    #[should_panic(expected = "Error(Contract, #101)")]
    fn test_validate_rate_config_rejects_zero_optimal() {
        let e = Env::default();

        let mut rate_config = testutils::default_rate_config();
        rate_config.optimal_utilization = 0;
        require_valid_rate_config(&e, &rate_config);
    }

    #[test]
    #[should_panic(expected = "Error(Contract, #101)")]
    fn test_validate_rate_config_rejects_slope_order() {
        let e = Env::default();

        let mut rate_config = testutils::default_rate_config();
        rate_config.slope_one = rate_config.slope_two + 1;
        require_valid_rate_config(&e, &rate_config);
    }
}
