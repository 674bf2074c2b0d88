use cast::i128;
use soroban_sdk::{panic_with_error, Env};

use crate::constants::RAY;
use crate::errors::PoolError;

/// Multiply two ray fixed-point numbers, rounding half up.
///
/// ### Panics
/// If the intermediate product overflows an i128
pub fn ray_mul(e: &Env, a: i128, b: i128) -> i128 {
    let product = a
        .checked_mul(b)
        .unwrap_or_else(|| panic_with_error!(e, PoolError::ArithmeticOverflow));
    let adjusted = product
        .checked_add(RAY / 2)
        .unwrap_or_else(|| panic_with_error!(e, PoolError::ArithmeticOverflow));
    adjusted / RAY
}

/// Divide two ray fixed-point numbers, rounding half up.
///
/// ### Panics
/// If the divisor is zero or the scaled dividend overflows an i128
pub fn ray_div(e: &Env, a: i128, b: i128) -> i128 {
    if b == 0 {
        panic_with_error!(e, PoolError::DivisionByZero);
    }
    let scaled = a
        .checked_mul(RAY)
        .unwrap_or_else(|| panic_with_error!(e, PoolError::ArithmeticOverflow));
    let adjusted = scaled
        .checked_add(b / 2)
        .unwrap_or_else(|| panic_with_error!(e, PoolError::ArithmeticOverflow));
    adjusted / b
}

/// The interest accumulated by a per-second rate over `dt` seconds without
/// compounding, as a ray fraction.
pub fn linear_interest(e: &Env, rate_per_second: i128, dt: u64) -> i128 {
    rate_per_second
        .checked_mul(i128(dt))
        .unwrap_or_else(|| panic_with_error!(e, PoolError::ArithmeticOverflow))
}

/// The growth factor of a per-second rate compounded every second over `dt`
/// seconds, as a ray number, approximated by a third order binomial expansion:
///
/// (1 + r)^t ~ 1 + rt + t(t-1)/2 r^2 + t(t-1)(t-2)/6 r^3
///
/// The truncation error is strictly positive for the pool (the factor is
/// underestimated for t > 3) and negligible at per-second rate magnitudes.
pub fn compounded_interest(e: &Env, rate_per_second: i128, dt: u64) -> i128 {
    if dt == 0 {
        return RAY;
    }
    let exp = i128(dt);
    let exp_minus_one = exp - 1;
    let exp_minus_two = if exp > 2 { exp - 2 } else { 0 };

    let base_pow_two = ray_mul(e, rate_per_second, rate_per_second);
    let base_pow_three = ray_mul(e, base_pow_two, rate_per_second);

    let first_term = rate_per_second
        .checked_mul(exp)
        .unwrap_or_else(|| panic_with_error!(e, PoolError::ArithmeticOverflow));
    let second_term = exp
        .checked_mul(exp_minus_one)
        .and_then(|x| x.checked_mul(base_pow_two))
        .unwrap_or_else(|| panic_with_error!(e, PoolError::ArithmeticOverflow))
        / 2;
    let third_term = exp
        .checked_mul(exp_minus_one)
        .and_then(|x| x.checked_mul(exp_minus_two))
        .and_then(|x| x.checked_mul(base_pow_three))
        .unwrap_or_else(|| panic_with_error!(e, PoolError::ArithmeticOverflow))
        / 6;

    RAY + first_term + second_term + third_term
}
