/// Fixed-point scalar for rates and indices, 27 decimals
pub const RAY: i128 = 1_000_000_000_000_000_000_000_000_000;

/// Basis point scalar for risk parameters (LTV, thresholds, bonuses)
pub const SCALAR_BPS: i128 = 10_000;

/// Fixed-point scalar for the health factor, 18 decimals
pub const SCALAR_HF: i128 = 1_000_000_000_000_000_000;

/// Seconds in a 365 day year
pub const SECONDS_PER_YEAR: u64 = 31_536_000;

/// Largest fraction of a single debt position one liquidation call may repay,
/// in basis points
pub const CLOSE_FACTOR_BPS: i128 = 5_000;

/// Health factor below which the close factor is lifted to 100%, 18 decimals
pub const FULL_CLOSE_HF: i128 = 950_000_000_000_000_000;

/// Maximum number of listed reserves supported by the 2-bit user bitmap
pub const MAX_RESERVES: u32 = 64;
