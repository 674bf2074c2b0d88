use sep_41_token::TokenClient;
use soroban_sdk::{panic_with_error, Address, Env, Symbol};

use crate::{errors::PoolError, validator::require_nonnegative};

use super::{account::AccountData, pool::Pool, reserve::Reserve, user::User};

/// Require that `reserve` accepts deposits and borrows being serviced against
/// it. Withdrawals and repayments are only blocked by `active` and `paused`.
pub(super) fn require_reserve_usable(e: &Env, reserve: &Reserve) {
    if !reserve.config.active {
        panic_with_error!(e, PoolError::ReserveInactive);
    }
    if reserve.config.paused {
        panic_with_error!(e, PoolError::ReservePaused);
    }
}

fn require_reserve_not_frozen(e: &Env, reserve: &Reserve) {
    if reserve.config.frozen {
        panic_with_error!(e, PoolError::ReserveFrozen);
    }
}

/// Perform a supply of `asset` into the pool on behalf of `from`
///
/// ### Panics
/// If the pool or reserve does not accept deposits, or the supply cap
/// would be exceeded
pub fn execute_supply(e: &Env, from: &Address, asset: &Address, amount: i128) {
    require_nonnegative(e, &amount);
    let mut pool = Pool::load(e);
    pool.require_supply_allowed(e);

    let mut reserve = pool.load_reserve(e, asset);
    require_reserve_usable(e, &reserve);
    require_reserve_not_frozen(e, &reserve);
    if reserve.config.supply_cap > 0 {
        let cap = i128::from(reserve.config.supply_cap) * reserve.scalar;
        if reserve.total_supply(e) + amount > cap {
            panic_with_error!(e, PoolError::SupplyCapExceeded);
        }
    }

    let mut user = User::load(e, from);
    let scaled_amount = reserve.to_scaled_supply(e, amount);
    user.add_supply(e, &mut reserve, scaled_amount);
    reserve.update_rates(e);
    pool.cache_reserve(reserve);

    TokenClient::new(e, asset).transfer(from, &e.current_contract_address(), &amount);

    pool.store_cached_reserves(e);
    user.store(e);

    e.events().publish(
        (Symbol::new(e, "supply"), from.clone()),
        (asset.clone(), amount),
    );
}

/// Perform a withdraw of `asset` from the pool on behalf of `from`. Requests
/// larger than the user's balance withdraw the full balance.
///
/// Returns the amount of underlying withdrawn
///
/// ### Panics
/// If `from` has no balance, or the withdrawal leaves the position
/// undercollateralized
pub fn execute_withdraw(e: &Env, from: &Address, asset: &Address, amount: i128) -> i128 {
    require_nonnegative(e, &amount);
    let mut pool = Pool::load(e);

    let mut reserve = pool.load_reserve(e, asset);
    require_reserve_usable(e, &reserve);

    let mut user = User::load(e, from);
    let scaled_balance = user.get_supply(reserve.config.index);
    let real_balance = reserve.to_real_supply(e, scaled_balance);
    if real_balance == 0 {
        panic_with_error!(e, PoolError::InsufficientBalance);
    }
    let (to_withdraw, scaled_amount) = if amount >= real_balance {
        (real_balance, scaled_balance)
    } else {
        (amount, reserve.to_scaled_supply(e, amount))
    };
    let was_collateral = user.config.is_collateral(reserve.config.index);
    user.remove_supply(e, &mut reserve, scaled_amount);
    reserve.update_rates(e);
    pool.cache_reserve(reserve);

    if was_collateral && user.config.has_debt() {
        AccountData::calculate(e, &mut pool, &user).require_healthy(e);
    }

    TokenClient::new(e, asset).transfer(&e.current_contract_address(), from, &to_withdraw);

    pool.store_cached_reserves(e);
    user.store(e);

    e.events().publish(
        (Symbol::new(e, "withdraw"), from.clone()),
        (asset.clone(), to_withdraw),
    );
    to_withdraw
}

/// Perform a borrow of `asset` from the pool on behalf of `from`
///
/// ### Panics
/// If the pool or reserve does not accept borrows, the borrow cap would be
/// exceeded, or the borrow leaves the position undercollateralized
pub fn execute_borrow(e: &Env, from: &Address, asset: &Address, amount: i128) {
    require_nonnegative(e, &amount);
    let mut pool = Pool::load(e);
    pool.require_borrow_allowed(e);

    let mut reserve = pool.load_reserve(e, asset);
    require_reserve_usable(e, &reserve);
    require_reserve_not_frozen(e, &reserve);
    if !reserve.config.borrowing_enabled {
        panic_with_error!(e, PoolError::BorrowingDisabled);
    }
    if reserve.config.borrow_cap > 0 {
        let cap = i128::from(reserve.config.borrow_cap) * reserve.scalar;
        if reserve.total_debt(e) + amount > cap {
            panic_with_error!(e, PoolError::BorrowCapExceeded);
        }
    }

    let mut user = User::load(e, from);
    let scaled_amount = reserve.to_scaled_debt(e, amount);
    user.add_liabilities(e, &mut reserve, scaled_amount);
    reserve.update_rates(e);
    pool.cache_reserve(reserve);

    AccountData::calculate(e, &mut pool, &user).require_healthy(e);

    TokenClient::new(e, asset).transfer(&e.current_contract_address(), from, &amount);

    pool.store_cached_reserves(e);
    user.store(e);

    e.events().publish(
        (Symbol::new(e, "borrow"), from.clone()),
        (asset.clone(), amount),
    );
}

/// Perform a repayment of `asset` on behalf of `from`. Requests larger than
/// the outstanding debt repay the full debt and only transfer what is owed.
///
/// Returns the amount of underlying repaid
///
/// ### Panics
/// If `from` holds no debt against the reserve
pub fn execute_repay(e: &Env, from: &Address, asset: &Address, amount: i128) -> i128 {
    require_nonnegative(e, &amount);
    let mut pool = Pool::load(e);

    let mut reserve = pool.load_reserve(e, asset);
    require_reserve_usable(e, &reserve);

    let mut user = User::load(e, from);
    let scaled_debt = user.get_liabilities(reserve.config.index);
    let real_debt = reserve.to_real_debt(e, scaled_debt);
    if real_debt == 0 {
        panic_with_error!(e, PoolError::NoDebt);
    }
    let (to_repay, scaled_amount) = if amount >= real_debt {
        (real_debt, scaled_debt)
    } else {
        (amount, reserve.to_scaled_debt(e, amount))
    };
    user.remove_liabilities(e, &mut reserve, scaled_amount);
    reserve.update_rates(e);
    pool.cache_reserve(reserve);

    TokenClient::new(e, asset).transfer(from, &e.current_contract_address(), &to_repay);

    pool.store_cached_reserves(e);
    user.store(e);

    e.events().publish(
        (Symbol::new(e, "repay"), from.clone()),
        (asset.clone(), to_repay),
    );
    to_repay
}

/// Toggle whether `from`'s supply of `asset` backs their borrows
///
/// ### Panics
/// If the reserve is inactive or paused, enabling with no balance supplied,
/// or disabling leaves the position undercollateralized
pub fn execute_set_collateral(e: &Env, from: &Address, asset: &Address, enabled: bool) {
    let mut pool = Pool::load(e);
    let reserve = pool.load_reserve(e, asset);
    require_reserve_usable(e, &reserve);

    let mut user = User::load(e, from);
    let reserve_index = reserve.config.index;
    pool.cache_reserve(reserve);
    if user.config.is_collateral(reserve_index) == enabled {
        // no state change, still acknowledge the request
        e.events().publish(
            (Symbol::new(e, "collateral"), from.clone()),
            (asset.clone(), enabled),
        );
        return;
    }
    if enabled && user.get_supply(reserve_index) == 0 {
        panic_with_error!(e, PoolError::InsufficientBalance);
    }
    user.config.set_collateral(reserve_index, enabled);

    if !enabled && user.config.has_debt() {
        AccountData::calculate(e, &mut pool, &user).require_healthy(e);
    }

    pool.store_cached_reserves(e);
    user.store(e);

    e.events().publish(
        (Symbol::new(e, "collateral"), from.clone()),
        (asset.clone(), enabled),
    );
}
