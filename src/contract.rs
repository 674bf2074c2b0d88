use crate::{
    pool::{self, AccountData, Positions, ReserveConfig, UserConfig},
    storage::{self, InterestRateConfig, ReserveData},
};
use soroban_sdk::{contract, contractclient, contractimpl, Address, Env, Symbol};

/// ### LendingPool
///
/// A pooled money market with rebasing supply and debt balances.
#[contract]
pub struct LendingPoolContract;

#[contractclient(name = "PoolClient")]
pub trait LendingPool {
    /// Initialize the pool
    ///
    /// ### Arguments
    /// * `admin` - The Address for the admin
    /// * `name` - The name of the pool
    /// * `oracle` - The contract address of the oracle
    /// * `max_price_age` - The maximum age of a reported price, in seconds
    ///
    /// ### Panics
    /// If the pool is already initialized or `max_price_age` is zero
    fn initialize(e: Env, admin: Address, name: Symbol, oracle: Address, max_price_age: u64);

    /// (Admin only) Set a new address as the admin of this pool
    ///
    /// ### Arguments
    /// * `new_admin` - The new admin address
    ///
    /// ### Panics
    /// If the caller is not the admin
    fn set_admin(e: Env, new_admin: Address);

    /// (Admin only) Pool status is changed to "pool_status"
    /// * 0 = active
    /// * 1 = on ice (no new borrows)
    /// * 2 = frozen (no new borrows or deposits)
    ///
    /// ### Arguments
    /// * `pool_status` - The pool status to be set
    ///
    /// ### Panics
    /// If the caller is not the admin
    fn set_status(e: Env, pool_status: u32);

    /// (Admin only) Initialize a reserve in the pool
    ///
    /// Returns the index of the new reserve
    ///
    /// ### Arguments
    /// * `asset` - The underlying asset to add as a reserve
    /// * `config` - The ReserveConfig for the reserve
    /// * `rate_config` - The InterestRateConfig for the reserve
    ///
    /// ### Panics
    /// If the caller is not the admin, the reserve is already setup, or the
    /// configuration is invalid
    fn init_reserve(
        e: Env,
        asset: Address,
        config: ReserveConfig,
        rate_config: InterestRateConfig,
    ) -> u32;

    /// (Admin only) Update a reserve in the pool
    ///
    /// ### Arguments
    /// * `asset` - The underlying asset of the reserve
    /// * `config` - The new ReserveConfig for the reserve
    ///
    /// ### Panics
    /// If the caller is not the admin, the reserve does not exist, or the
    /// configuration is invalid
    fn update_reserve(e: Env, asset: Address, config: ReserveConfig);

    /// (Admin only) Update the interest rate configuration of a reserve
    ///
    /// ### Arguments
    /// * `asset` - The underlying asset of the reserve
    /// * `rate_config` - The new InterestRateConfig for the reserve
    ///
    /// ### Panics
    /// If the caller is not the admin, the reserve does not exist, or the
    /// configuration is invalid
    fn update_rate_config(e: Env, asset: Address, rate_config: InterestRateConfig);

    /// Supply `amount` of `asset` into the pool for `from`. The position is
    /// enabled as collateral if it is the user's first deposit of the asset.
    ///
    /// ### Arguments
    /// * `from` - The address supplying, and the owner of the position
    /// * `asset` - The underlying asset to supply
    /// * `amount` - The amount of underlying to supply
    ///
    /// ### Panics
    /// If the supply cannot be completed
    fn supply(e: Env, from: Address, asset: Address, amount: i128);

    /// Withdraw `amount` of `asset` from `from`'s supply position. Requests
    /// above the held balance withdraw everything.
    ///
    /// Returns the amount of underlying withdrawn
    ///
    /// ### Arguments
    /// * `from` - The owner of the position
    /// * `asset` - The underlying asset to withdraw
    /// * `amount` - The amount of underlying to withdraw
    ///
    /// ### Panics
    /// If the withdrawal cannot be completed for cases like insufficient
    /// funds or an invalid health factor
    fn withdraw(e: Env, from: Address, asset: Address, amount: i128) -> i128;

    /// Borrow `amount` of `asset` from the pool against `from`'s collateral
    ///
    /// ### Arguments
    /// * `from` - The owner of the position, and the receiver of the funds
    /// * `asset` - The underlying asset to borrow
    /// * `amount` - The amount of underlying to borrow
    ///
    /// ### Panics
    /// If the borrow cannot be completed for cases like disabled borrowing
    /// or an invalid health factor
    fn borrow(e: Env, from: Address, asset: Address, amount: i128);

    /// Repay `amount` of `asset` against `from`'s debt position. Requests
    /// above the owed balance repay everything and only transfer what is owed.
    ///
    /// Returns the amount of underlying repaid
    ///
    /// ### Arguments
    /// * `from` - The owner of the position, and the source of the funds
    /// * `asset` - The underlying asset to repay
    /// * `amount` - The amount of underlying to repay
    ///
    /// ### Panics
    /// If `from` holds no debt against the reserve
    fn repay(e: Env, from: Address, asset: Address, amount: i128) -> i128;

    /// Toggle whether `from`'s supply of `asset` backs their borrows
    ///
    /// ### Arguments
    /// * `from` - The owner of the position
    /// * `asset` - The underlying asset of the supply position
    /// * `enabled` - Whether the supply is usable as collateral
    ///
    /// ### Panics
    /// If nothing is supplied, or disabling results in an invalid health
    /// factor
    fn set_collateral(e: Env, from: Address, asset: Address, enabled: bool);

    /// Liquidate an unhealthy position, repaying `amount` of `user`'s
    /// `debt_asset` in exchange for a bonus-weighted share of their
    /// `collateral_asset` supply
    ///
    /// Returns the amount of underlying debt repaid
    ///
    /// ### Arguments
    /// * `liquidator` - The address performing and funding the liquidation
    /// * `user` - The owner of the position being liquidated
    /// * `debt_asset` - The underlying asset of the debt being repaid
    /// * `collateral_asset` - The underlying asset of the collateral being
    ///    seized
    /// * `amount` - The maximum amount of debt to repay
    ///
    /// ### Panics
    /// If the position is healthy or the liquidation cannot be completed
    fn liquidate(
        e: Env,
        liquidator: Address,
        user: Address,
        debt_asset: Address,
        collateral_asset: Address,
        amount: i128,
    ) -> i128;

    /// Fetch the positions for an address
    ///
    /// ### Arguments
    /// * `address` - The address to fetch positions for
    fn get_positions(e: Env, address: Address) -> Positions;

    /// Fetch the collateral and borrowing flags for an address
    ///
    /// ### Arguments
    /// * `address` - The address to fetch flags for
    fn get_user_config(e: Env, address: Address) -> UserConfig;

    /// Fetch the aggregated account data for an address, valued at current
    /// prices and interest
    ///
    /// ### Arguments
    /// * `address` - The address to fetch account data for
    fn get_user_account_data(e: Env, address: Address) -> AccountData;

    /// Fetch the state of a reserve, with interest accrued to the current
    /// ledger timestamp
    ///
    /// ### Arguments
    /// * `asset` - The underlying asset of the reserve
    fn get_reserve_data(e: Env, asset: Address) -> ReserveData;

    /// Fetch the configuration of a reserve
    ///
    /// ### Arguments
    /// * `asset` - The underlying asset of the reserve
    fn get_configuration(e: Env, asset: Address) -> ReserveConfig;

    /// Fetch the interest rate configuration of a reserve
    ///
    /// ### Arguments
    /// * `asset` - The underlying asset of the reserve
    fn get_rate_config(e: Env, asset: Address) -> InterestRateConfig;
}

#[contractimpl]
impl LendingPool for LendingPoolContract {
    fn initialize(e: Env, admin: Address, name: Symbol, oracle: Address, max_price_age: u64) {
        storage::extend_instance(&e);

        pool::execute_initialize(&e, &admin, &name, &oracle, &max_price_age);
    }

    fn set_admin(e: Env, new_admin: Address) {
        storage::extend_instance(&e);
        let admin = storage::get_admin(&e);
        admin.require_auth();

        storage::set_admin(&e, &new_admin);

        e.events()
            .publish((Symbol::new(&e, "set_admin"), admin), new_admin);
    }

    fn set_status(e: Env, pool_status: u32) {
        storage::extend_instance(&e);
        let admin = storage::get_admin(&e);
        admin.require_auth();

        pool::execute_set_status(&e, pool_status);

        e.events()
            .publish((Symbol::new(&e, "set_status"), admin), pool_status);
    }

    fn init_reserve(
        e: Env,
        asset: Address,
        config: ReserveConfig,
        rate_config: InterestRateConfig,
    ) -> u32 {
        storage::extend_instance(&e);
        let admin = storage::get_admin(&e);
        admin.require_auth();

        let index = pool::initialize_reserve(&e, &asset, &config, &rate_config);

        e.events()
            .publish((Symbol::new(&e, "init_reserve"), admin), (asset, index));
        index
    }

    fn update_reserve(e: Env, asset: Address, config: ReserveConfig) {
        storage::extend_instance(&e);
        let admin = storage::get_admin(&e);
        admin.require_auth();

        pool::execute_update_reserve(&e, &asset, &config);

        e.events()
            .publish((Symbol::new(&e, "update_reserve"), admin), asset);
    }

    fn update_rate_config(e: Env, asset: Address, rate_config: InterestRateConfig) {
        storage::extend_instance(&e);
        let admin = storage::get_admin(&e);
        admin.require_auth();

        pool::execute_update_rate_config(&e, &asset, &rate_config);

        e.events()
            .publish((Symbol::new(&e, "update_rates"), admin), asset);
    }

    fn supply(e: Env, from: Address, asset: Address, amount: i128) {
        storage::extend_instance(&e);
        from.require_auth();

        pool::execute_supply(&e, &from, &asset, amount);
    }

    fn withdraw(e: Env, from: Address, asset: Address, amount: i128) -> i128 {
        storage::extend_instance(&e);
        from.require_auth();

        pool::execute_withdraw(&e, &from, &asset, amount)
    }

    fn borrow(e: Env, from: Address, asset: Address, amount: i128) {
        storage::extend_instance(&e);
        from.require_auth();

        pool::execute_borrow(&e, &from, &asset, amount);
    }

    fn repay(e: Env, from: Address, asset: Address, amount: i128) -> i128 {
        storage::extend_instance(&e);
        from.require_auth();

        pool::execute_repay(&e, &from, &asset, amount)
    }

    fn set_collateral(e: Env, from: Address, asset: Address, enabled: bool) {
        storage::extend_instance(&e);
        from.require_auth();

        pool::execute_set_collateral(&e, &from, &asset, enabled);
    }

    fn liquidate(
        e: Env,
        liquidator: Address,
        user: Address,
        debt_asset: Address,
        collateral_asset: Address,
        amount: i128,
    ) -> i128 {
        storage::extend_instance(&e);
        liquidator.require_auth();

        pool::execute_liquidate(&e, &liquidator, &user, &debt_asset, &collateral_asset, amount)
    }

    fn get_positions(e: Env, address: Address) -> Positions {
        storage::get_user_positions(&e, &address)
    }

    fn get_user_config(e: Env, address: Address) -> UserConfig {
        storage::get_user_config(&e, &address)
    }

    fn get_user_account_data(e: Env, address: Address) -> AccountData {
        let mut pool = pool::Pool::load(&e);
        let user = pool::User::load(&e, &address);
        AccountData::calculate(&e, &mut pool, &user)
    }

    fn get_reserve_data(e: Env, asset: Address) -> ReserveData {
        pool::Reserve::load(&e, &asset).data
    }

    fn get_configuration(e: Env, asset: Address) -> ReserveConfig {
        ReserveConfig::decode(&storage::get_res_config(&e, &asset))
    }

    fn get_rate_config(e: Env, asset: Address) -> InterestRateConfig {
        storage::get_rate_config(&e, &asset)
    }
}
