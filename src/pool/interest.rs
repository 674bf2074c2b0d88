use cast::i128;
use soroban_fixed_point_math::FixedPoint;
use soroban_sdk::unwrap::UnwrapOptimized;

use crate::constants::{SCALAR_BPS, SECONDS_PER_YEAR};
use crate::storage::InterestRateConfig;

/// Calculate a reserve's utilization from its current totals, in bps,
/// clamped to [0, 10000].
pub fn calc_utilization(total_debt: i128, total_supply: i128) -> i128 {
    if total_debt <= 0 {
        return 0;
    }
    if total_supply <= 0 {
        return SCALAR_BPS;
    }
    let util = total_debt
        .fixed_div_ceil(total_supply, SCALAR_BPS)
        .unwrap_optimized();
    util.min(SCALAR_BPS)
}

/// Calculate the current borrow and liquidity rates for a reserve from the
/// piecewise linear curve defined by its rate config.
///
/// Returns (borrow_rate, liquidity_rate), per second, in ray.
///
/// ### Arguments
/// * `total_debt` - The reserve's total outstanding debt, in underlying
/// * `total_supply` - The reserve's total supplied amount, in underlying
/// * `rate_config` - The reserve's interest rate configuration
pub fn calc_rates(
    total_debt: i128,
    total_supply: i128,
    rate_config: &InterestRateConfig,
) -> (i128, i128) {
    let util = calc_utilization(total_debt, total_supply);
    let opt = i128(rate_config.optimal_utilization);

    // `opt == 10000` can never reach the second branch since util is clamped
    // to 10000, keeping its `10000 - opt` divisor nonzero
    let annual_borrow_rate = if util <= opt {
        rate_config.base_rate
            + rate_config
                .slope_one
                .fixed_mul_floor(util, opt)
                .unwrap_optimized()
    } else {
        rate_config.base_rate
            + rate_config.slope_one
            + rate_config
                .slope_two
                .fixed_mul_floor(util - opt, SCALAR_BPS - opt)
                .unwrap_optimized()
    };

    // suppliers earn the borrow rate scaled by utilization, less the reserve factor
    let annual_liquidity_rate = annual_borrow_rate
        .fixed_mul_floor(util, SCALAR_BPS)
        .unwrap_optimized()
        .fixed_mul_floor(SCALAR_BPS - i128(rate_config.reserve_factor), SCALAR_BPS)
        .unwrap_optimized();

    (
        annual_borrow_rate / i128(SECONDS_PER_YEAR),
        annual_liquidity_rate / i128(SECONDS_PER_YEAR),
    )
}
