use sep_41_token::TokenClient;
use soroban_fixed_point_math::FixedPoint;
use soroban_sdk::{panic_with_error, unwrap::UnwrapOptimized, Address, Env, Symbol};

use crate::{
    constants::{CLOSE_FACTOR_BPS, FULL_CLOSE_HF, SCALAR_BPS},
    errors::PoolError,
    validator::require_nonnegative,
};

use super::{account::AccountData, actions::require_reserve_usable, pool::Pool, user::User};

/// Liquidate an unhealthy position. The liquidator repays up to the close
/// factor of `user`'s debt in `debt_asset` and is credited the corresponding
/// value of `user`'s `collateral_asset` supply, plus the liquidation bonus,
/// as a supply position of their own.
///
/// Positions with a health factor under the full close threshold can be
/// closed entirely, otherwise half the debt can be repaid per call. The
/// seizure never exceeds the collateral the user actually holds - when it
/// would, the repayment is scaled back to match.
///
/// Returns the amount of underlying debt repaid
///
/// ### Panics
/// If the position is healthy, the user holds no debt in `debt_asset` or no
/// collateral in `collateral_asset`, either reserve is inactive or paused,
/// or the call is malformed
pub fn execute_liquidate(
    e: &Env,
    liquidator: &Address,
    user_address: &Address,
    debt_asset: &Address,
    collateral_asset: &Address,
    amount: i128,
) -> i128 {
    require_nonnegative(e, &amount);
    if amount == 0 || liquidator == user_address {
        panic_with_error!(e, PoolError::InvalidLiquidation);
    }
    let mut pool = Pool::load(e);
    let mut user = User::load(e, user_address);

    let debt_reserve = pool.load_reserve(e, debt_asset);
    let collateral_reserve = pool.load_reserve(e, collateral_asset);
    require_reserve_usable(e, &debt_reserve);
    require_reserve_usable(e, &collateral_reserve);
    let scaled_debt = user.get_liabilities(debt_reserve.config.index);
    if scaled_debt == 0 {
        panic_with_error!(e, PoolError::NoDebt);
    }
    let scaled_collateral = user.get_supply(collateral_reserve.config.index);
    if scaled_collateral == 0 || !user.config.is_collateral(collateral_reserve.config.index) {
        panic_with_error!(e, PoolError::CollateralRequired);
    }

    let account = AccountData::calculate(e, &mut pool, &user);
    if !account.is_liquidatable() {
        panic_with_error!(e, PoolError::PositionHealthy);
    }
    let close_factor = if account.health_factor < FULL_CLOSE_HF {
        SCALAR_BPS
    } else {
        CLOSE_FACTOR_BPS
    };

    let debt_price = pool.load_price(e, debt_asset);
    let collateral_price = pool.load_price(e, collateral_asset);

    let real_debt = debt_reserve.to_real_debt(e, scaled_debt);
    let max_repay = real_debt
        .fixed_mul_floor(close_factor, SCALAR_BPS)
        .unwrap_optimized();
    let mut to_repay = amount.min(max_repay);

    // value repaid, with bonus, converted into collateral underlying
    let mut to_seize = to_repay
        .fixed_mul_floor(debt_price, debt_reserve.scalar)
        .unwrap_optimized()
        .fixed_mul_floor(i128::from(collateral_reserve.config.liq_bonus), SCALAR_BPS)
        .unwrap_optimized()
        .fixed_div_floor(collateral_price, collateral_reserve.scalar)
        .unwrap_optimized();

    let real_collateral = collateral_reserve.to_real_supply(e, scaled_collateral);
    if to_seize > real_collateral {
        // not enough collateral to cover the full seizure, scale the
        // repayment down to what the held collateral is worth
        to_seize = real_collateral;
        to_repay = to_seize
            .fixed_mul_floor(collateral_price, collateral_reserve.scalar)
            .unwrap_optimized()
            .fixed_div_floor(i128::from(collateral_reserve.config.liq_bonus), SCALAR_BPS)
            .unwrap_optimized()
            .fixed_div_ceil(debt_price, debt_reserve.scalar)
            .unwrap_optimized();
    }

    let scaled_repay = if to_repay == real_debt {
        scaled_debt
    } else {
        debt_reserve.to_scaled_debt(e, to_repay)
    };
    let scaled_seize = if to_seize == real_collateral {
        scaled_collateral
    } else {
        collateral_reserve.to_scaled_supply(e, to_seize)
    };

    // apply debt effects, then re-fetch the collateral reserve through the
    // cache so a shared debt and collateral asset stays consistent
    let mut debt_reserve = pool.load_reserve(e, debt_asset);
    user.remove_liabilities(e, &mut debt_reserve, scaled_repay);
    debt_reserve.update_rates(e);
    pool.cache_reserve(debt_reserve);

    let mut collateral_reserve = pool.load_reserve(e, collateral_asset);
    let mut liquidator_user = User::load(e, liquidator);
    user.remove_supply(e, &mut collateral_reserve, scaled_seize);
    liquidator_user.add_supply(e, &mut collateral_reserve, scaled_seize);
    collateral_reserve.update_rates(e);
    pool.cache_reserve(collateral_reserve);

    TokenClient::new(e, debt_asset).transfer(liquidator, &e.current_contract_address(), &to_repay);

    pool.store_cached_reserves(e);
    user.store(e);
    liquidator_user.store(e);

    e.events().publish(
        (Symbol::new(e, "liquidate"), liquidator.clone(), user_address.clone()),
        (debt_asset.clone(), to_repay, collateral_asset.clone(), to_seize),
    );

    // debt left with no collateral behind it cannot be liquidated again
    if user.config.has_debt() && !user.config.has_collateral() {
        e.events().publish(
            (Symbol::new(e, "bad_debt"), user_address.clone()),
            user.positions.liabilities.clone(),
        );
    }

    to_repay
}
