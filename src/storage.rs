use soroban_sdk::{
    contracttype, panic_with_error, unwrap::UnwrapOptimized, vec, Address, Env, IntoVal, Symbol,
    TryFromVal, Val, Vec,
};

use crate::constants::MAX_RESERVES;
use crate::errors::PoolError;
use crate::pool::{Positions, UserConfig};

pub(crate) const LEDGER_THRESHOLD_INSTANCE: u32 = 86400; // ~ 5 days
pub(crate) const LEDGER_BUMP_INSTANCE: u32 = 86400 * 2; // ~ 10 days

pub(crate) const LEDGER_THRESHOLD_SHARED: u32 = 172800; // ~ 10 days
pub(crate) const LEDGER_BUMP_SHARED: u32 = 241920; // ~ 14 days

pub(crate) const LEDGER_THRESHOLD_USER: u32 = 518400; // ~ 30 days
pub(crate) const LEDGER_BUMP_USER: u32 = 604800; // ~ 35 days

/********** Storage Types **********/

/// The pool's config
#[derive(Clone)]
#[contracttype]
pub struct PoolConfig {
    pub oracle: Address,
    /// The maximum age of an oracle price before it is considered stale, in seconds
    pub max_price_age: u64,
    /// The pool status
    /// * 0 = active
    /// * 1 = on ice - new borrows are disabled
    /// * 2 = frozen - only withdrawals and repayments are allowed
    pub status: u32,
}

/// A reserve's risk parameters packed into a single dense word, stored as two
/// u128 limbs. See `pool::config` for the bit layout and codec.
#[derive(Clone, Debug, Eq, PartialEq)]
#[contracttype]
pub struct PackedReserveConfig {
    pub lo: u128,
    pub hi: u128,
}

/// The interest rate curve parameters for a reserve
#[derive(Clone, Debug, Eq, PartialEq)]
#[contracttype]
pub struct InterestRateConfig {
    /// The utilization at which the second slope engages, in bps
    pub optimal_utilization: u32,
    /// The borrow rate at zero utilization, annual, in ray
    pub base_rate: i128,
    /// The rate increase across [0, optimal] utilization, annual, in ray
    pub slope_one: i128,
    /// The rate increase across (optimal, 100%] utilization, annual, in ray
    pub slope_two: i128,
    /// The portion of borrow interest withheld from suppliers, in bps
    pub reserve_factor: u32,
}

/// The mutable accounting state of a reserve
#[derive(Clone, Debug, Eq, PartialEq)]
#[contracttype]
pub struct ReserveData {
    /// The cumulative supply-side interest index, in ray
    pub liquidity_index: i128,
    /// The cumulative debt-side interest index, in ray
    pub borrow_index: i128,
    /// The current supply rate, per second, in ray
    pub liquidity_rate: i128,
    /// The current borrow rate, per second, in ray
    pub borrow_rate: i128,
    /// The ledger timestamp the indices were last advanced to
    pub last_update: u64,
    /// The sum of all scaled supply balances
    pub total_scaled_supply: i128,
    /// The sum of all scaled debt balances
    pub total_scaled_debt: i128,
}

/********** Storage Key Types **********/

const ADMIN_KEY: &str = "Admin";
const NAME_KEY: &str = "Name";
const CONFIG_KEY: &str = "Config";
const RES_LIST_KEY: &str = "ResList";

#[derive(Clone)]
#[contracttype]
pub enum PoolDataKey {
    // The packed risk configuration for a reserve
    ResConfig(Address),
    // The interest rate configuration for a reserve
    RateConfig(Address),
    // The accounting state for a reserve
    ResData(Address),
    // The scaled balance positions for a user
    Positions(Address),
    // The 2-bit-per-reserve configuration bitmap for a user
    UserConfig(Address),
}

/****************************
**         Storage         **
****************************/

/// Bump the instance lifetime by the defined amount
pub fn extend_instance(e: &Env) {
    e.storage()
        .instance()
        .extend_ttl(LEDGER_THRESHOLD_INSTANCE, LEDGER_BUMP_INSTANCE);
}

/// Fetch an entry in persistent storage that has a default value if it doesn't exist
fn get_persistent_default<K: IntoVal<Env, Val>, V: TryFromVal<Env, Val>>(
    e: &Env,
    key: &K,
    default: V,
    bump_threshold: u32,
    bump_amount: u32,
) -> V {
    if let Some(result) = e.storage().persistent().get::<K, V>(key) {
        e.storage()
            .persistent()
            .extend_ttl(key, bump_threshold, bump_amount);
        result
    } else {
        default
    }
}

/********** Admin **********/

/// Fetch the current admin Address
///
/// ### Panics
/// If the admin does not exist
pub fn get_admin(e: &Env) -> Address {
    e.storage()
        .instance()
        .get(&Symbol::new(e, ADMIN_KEY))
        .unwrap_optimized()
}

/// Set a new admin
///
/// ### Arguments
/// * `new_admin` - The Address for the admin
pub fn set_admin(e: &Env, new_admin: &Address) {
    e.storage()
        .instance()
        .set::<Symbol, Address>(&Symbol::new(e, ADMIN_KEY), new_admin);
}

/// Checks if an admin is set
pub fn has_admin(e: &Env) -> bool {
    e.storage().instance().has(&Symbol::new(e, ADMIN_KEY))
}

/********** Metadata **********/

/// Set a pool name
///
/// ### Arguments
/// * `name` - The Name of the pool
pub fn set_name(e: &Env, name: &Symbol) {
    e.storage()
        .instance()
        .set::<Symbol, Symbol>(&Symbol::new(e, NAME_KEY), name);
}

/********** Pool Config *********/

/// Fetch the pool configuration
///
/// ### Panics
/// If the pool's config is not set
pub fn get_pool_config(e: &Env) -> PoolConfig {
    e.storage()
        .instance()
        .get(&Symbol::new(e, CONFIG_KEY))
        .unwrap_optimized()
}

/// Set the pool configuration
///
/// ### Arguments
/// * `config` - The contract address of the oracle
pub fn set_pool_config(e: &Env, config: &PoolConfig) {
    e.storage()
        .instance()
        .set::<Symbol, PoolConfig>(&Symbol::new(e, CONFIG_KEY), config);
}

/********** Reserve Config (ResConfig) **********/

/// Fetch the packed reserve configuration for an asset
///
/// ### Arguments
/// * `asset` - The contract address of the asset
///
/// ### Panics
/// If the reserve does not exist
pub fn get_res_config(e: &Env, asset: &Address) -> PackedReserveConfig {
    let key = PoolDataKey::ResConfig(asset.clone());
    e.storage()
        .persistent()
        .extend_ttl(&key, LEDGER_THRESHOLD_SHARED, LEDGER_BUMP_SHARED);
    e.storage()
        .persistent()
        .get::<PoolDataKey, PackedReserveConfig>(&key)
        .unwrap_optimized()
}

/// Set the packed reserve configuration for an asset
///
/// ### Arguments
/// * `asset` - The contract address of the asset
/// * `config` - The packed reserve configuration word
pub fn set_res_config(e: &Env, asset: &Address, config: &PackedReserveConfig) {
    let key = PoolDataKey::ResConfig(asset.clone());
    e.storage()
        .persistent()
        .set::<PoolDataKey, PackedReserveConfig>(&key, config);
    e.storage()
        .persistent()
        .extend_ttl(&key, LEDGER_THRESHOLD_SHARED, LEDGER_BUMP_SHARED);
}

/// Checks if a reserve exists for an asset
///
/// ### Arguments
/// * `asset` - The contract address of the asset
pub fn has_res(e: &Env, asset: &Address) -> bool {
    let key = PoolDataKey::ResConfig(asset.clone());
    e.storage().persistent().has(&key)
}

/********** Rate Config **********/

/// Fetch the interest rate configuration for an asset
///
/// ### Arguments
/// * `asset` - The contract address of the asset
///
/// ### Panics
/// If the rate config does not exist
pub fn get_rate_config(e: &Env, asset: &Address) -> InterestRateConfig {
    let key = PoolDataKey::RateConfig(asset.clone());
    e.storage()
        .persistent()
        .extend_ttl(&key, LEDGER_THRESHOLD_SHARED, LEDGER_BUMP_SHARED);
    e.storage()
        .persistent()
        .get::<PoolDataKey, InterestRateConfig>(&key)
        .unwrap_optimized()
}

/// Set the interest rate configuration for an asset
///
/// ### Arguments
/// * `asset` - The contract address of the asset
/// * `config` - The interest rate configuration
pub fn set_rate_config(e: &Env, asset: &Address, config: &InterestRateConfig) {
    let key = PoolDataKey::RateConfig(asset.clone());
    e.storage()
        .persistent()
        .set::<PoolDataKey, InterestRateConfig>(&key, config);
    e.storage()
        .persistent()
        .extend_ttl(&key, LEDGER_THRESHOLD_SHARED, LEDGER_BUMP_SHARED);
}

/********** Reserve Data (ResData) **********/

/// Fetch the reserve data for an asset
///
/// ### Arguments
/// * `asset` - The contract address of the asset
///
/// ### Panics
/// If the reserve does not exist
pub fn get_res_data(e: &Env, asset: &Address) -> ReserveData {
    let key = PoolDataKey::ResData(asset.clone());
    e.storage()
        .persistent()
        .extend_ttl(&key, LEDGER_THRESHOLD_SHARED, LEDGER_BUMP_SHARED);
    e.storage()
        .persistent()
        .get::<PoolDataKey, ReserveData>(&key)
        .unwrap_optimized()
}

/// Set the reserve data for an asset
///
/// ### Arguments
/// * `asset` - The contract address of the asset
/// * `data` - The reserve data for the asset
pub fn set_res_data(e: &Env, asset: &Address, data: &ReserveData) {
    let key = PoolDataKey::ResData(asset.clone());
    e.storage()
        .persistent()
        .set::<PoolDataKey, ReserveData>(&key, data);
    e.storage()
        .persistent()
        .extend_ttl(&key, LEDGER_THRESHOLD_SHARED, LEDGER_BUMP_SHARED);
}

/********** Reserve List (ResList) **********/

/// Fetch the list of reserves
pub fn get_res_list(e: &Env) -> Vec<Address> {
    get_persistent_default(
        e,
        &Symbol::new(e, RES_LIST_KEY),
        vec![e],
        LEDGER_THRESHOLD_SHARED,
        LEDGER_BUMP_SHARED,
    )
}

/// Add a reserve to the back of the list and returns the index
///
/// ### Arguments
/// * `asset` - The contract address of the underlying asset
///
/// ### Panics
/// If the number of reserves is greater than 63
pub fn push_res_list(e: &Env, asset: &Address) -> u32 {
    let mut res_list = get_res_list(e);
    if res_list.len() >= MAX_RESERVES {
        panic_with_error!(e, PoolError::TooManyReserves);
    }
    res_list.push_back(asset.clone());
    let new_index = res_list.len() - 1;
    e.storage()
        .persistent()
        .set::<Symbol, Vec<Address>>(&Symbol::new(e, RES_LIST_KEY), &res_list);
    e.storage().persistent().extend_ttl(
        &Symbol::new(e, RES_LIST_KEY),
        LEDGER_THRESHOLD_SHARED,
        LEDGER_BUMP_SHARED,
    );
    new_index
}

/********** User Positions **********/

/// Fetch the positions for an address
///
/// ### Arguments
/// * `user` - The address of the user
pub fn get_user_positions(e: &Env, user: &Address) -> Positions {
    let key = PoolDataKey::Positions(user.clone());
    get_persistent_default(
        e,
        &key,
        Positions::env_default(e),
        LEDGER_THRESHOLD_USER,
        LEDGER_BUMP_USER,
    )
}

/// Set the positions for an address
///
/// ### Arguments
/// * `user` - The address of the user
/// * `positions` - The new positions for the user
pub fn set_user_positions(e: &Env, user: &Address, positions: &Positions) {
    let key = PoolDataKey::Positions(user.clone());
    e.storage()
        .persistent()
        .set::<PoolDataKey, Positions>(&key, positions);
    e.storage()
        .persistent()
        .extend_ttl(&key, LEDGER_THRESHOLD_USER, LEDGER_BUMP_USER);
}

/********** User Config **********/

/// Fetch the configuration bitmap for an address
///
/// ### Arguments
/// * `user` - The address of the user
pub fn get_user_config(e: &Env, user: &Address) -> UserConfig {
    let key = PoolDataKey::UserConfig(user.clone());
    get_persistent_default(
        e,
        &key,
        UserConfig::default(),
        LEDGER_THRESHOLD_USER,
        LEDGER_BUMP_USER,
    )
}

/// Set the configuration bitmap for an address
///
/// ### Arguments
/// * `user` - The address of the user
/// * `config` - The new configuration bitmap for the user
pub fn set_user_config(e: &Env, user: &Address, config: &UserConfig) {
    let key = PoolDataKey::UserConfig(user.clone());
    e.storage()
        .persistent()
        .set::<PoolDataKey, UserConfig>(&key, config);
    e.storage()
        .persistent()
        .extend_ttl(&key, LEDGER_THRESHOLD_USER, LEDGER_BUMP_USER);
}
