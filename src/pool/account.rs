use soroban_fixed_point_math::FixedPoint;
use soroban_sdk::{contracttype, panic_with_error, unwrap::UnwrapOptimized, Env};

use crate::{
    constants::{SCALAR_BPS, SCALAR_HF},
    errors::PoolError,
    storage,
};

use super::{pool::Pool, user::User};

/// A snapshot of a user's aggregated position, denominated in the oracle's
/// base asset decimals except where noted.
#[derive(Clone, Debug, Eq, PartialEq)]
#[contracttype]
pub struct AccountData {
    /// The value of all collateral-enabled supply positions
    pub total_collateral_value: i128,
    /// The value of all debt positions
    pub total_debt_value: i128,
    /// The additional value that can be borrowed before the LTV limit, zero
    /// if the position is already over it
    pub available_borrows: i128,
    /// The collateral-value-weighted average LTV, in bps
    pub avg_ltv: i128,
    /// The collateral-value-weighted average liquidation threshold, in bps
    pub avg_liq_threshold: i128,
    /// The position's health factor, 18 decimal fixed point. `i128::MAX` when
    /// the user holds no debt.
    pub health_factor: i128,
}

impl AccountData {
    /// Aggregate a user's positions into collateral and debt values, weighted
    /// risk parameters, and a health factor.
    ///
    /// Only reserves flagged in the user's bitmap are visited. Each visited
    /// reserve is accrued through the pool cache, so all positions are valued
    /// at one logical timestamp.
    ///
    /// ### Panics
    /// If any required oracle price is unavailable or stale
    pub fn calculate(e: &Env, pool: &mut Pool, user: &User) -> AccountData {
        let reserve_list = storage::get_res_list(e);
        let mut total_collateral_value: i128 = 0;
        let mut total_debt_value: i128 = 0;
        let mut weighted_ltv: i128 = 0;
        let mut weighted_threshold: i128 = 0;

        for reserve_index in 0..reserve_list.len() {
            let has_collateral = user.config.is_collateral(reserve_index);
            let has_debt = user.config.is_borrowing(reserve_index);
            if !has_collateral && !has_debt {
                continue;
            }
            let asset = reserve_list.get_unchecked(reserve_index);
            let reserve = pool.load_reserve(e, &asset);
            let price = pool.load_price(e, &asset);

            if has_collateral {
                let balance = reserve.to_real_supply(e, user.get_supply(reserve_index));
                let value = balance
                    .fixed_mul_floor(price, reserve.scalar)
                    .unwrap_optimized();
                total_collateral_value += value;
                weighted_ltv += value * i128::from(reserve.config.ltv);
                weighted_threshold += value * i128::from(reserve.config.liq_threshold);
            }
            if has_debt {
                let balance = reserve.to_real_debt(e, user.get_liabilities(reserve_index));
                total_debt_value += balance
                    .fixed_mul_ceil(price, reserve.scalar)
                    .unwrap_optimized();
            }
        }

        let (avg_ltv, avg_liq_threshold) = if total_collateral_value == 0 {
            (0, 0)
        } else {
            (
                weighted_ltv / total_collateral_value,
                weighted_threshold / total_collateral_value,
            )
        };

        let borrow_limit = total_collateral_value
            .fixed_mul_floor(avg_ltv, SCALAR_BPS)
            .unwrap_optimized();
        let available_borrows = (borrow_limit - total_debt_value).max(0);

        let health_factor = if total_debt_value == 0 {
            i128::MAX
        } else {
            total_collateral_value
                .fixed_mul_floor(avg_liq_threshold, SCALAR_BPS)
                .unwrap_optimized()
                .fixed_div_floor(total_debt_value, SCALAR_HF)
                .unwrap_optimized()
        };

        AccountData {
            total_collateral_value,
            total_debt_value,
            available_borrows,
            avg_ltv,
            avg_liq_threshold,
            health_factor,
        }
    }

    /// Require that the account's health factor is at or above 1
    ///
    /// ### Panics
    /// With `HealthFactorBelowThreshold` if it is not
    pub fn require_healthy(&self, e: &Env) {
        if self.health_factor < SCALAR_HF {
            panic_with_error!(e, PoolError::HealthFactorBelowThreshold);
        }
    }

    /// Whether the position can be liquidated
    pub fn is_liquidatable(&self) -> bool {
        self.health_factor < SCALAR_HF
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Positions, UserConfig};
    use crate::storage::PoolConfig;
    use crate::testutils;
    use sep_40_oracle::testutils::Asset;
    use soroban_sdk::{testutils::Address as _, vec, Address, Symbol};

    #[test]
    fn test_calculate_single_collateral_position() {
        let e = Env::default();
        e.mock_all_auths();

        let bombadil = Address::generate(&e);
        let samwise = Address::generate(&e);
        let pool_address = testutils::create_pool(&e);
        let (oracle, oracle_client) = testutils::create_mock_oracle(&e);

        // 8 decimal asset at $0.08, ltv 75%, threshold 80%
        let (underlying, _) = testutils::create_token_contract(&e, &bombadil);
        let (mut reserve_config, mut reserve_data) = testutils::default_reserve_meta();
        reserve_config.decimals = 8;
        reserve_config.ltv = 7500;
        reserve_config.liq_threshold = 8000;
        reserve_data.total_scaled_supply = 250_00000000;
        reserve_data.total_scaled_debt = 0;
        testutils::create_reserve(&e, &pool_address, &underlying, &reserve_config, &reserve_data);

        oracle_client.set_data(
            &bombadil,
            &Asset::Other(Symbol::new(&e, "USD")),
            &vec![&e, Asset::Stellar(underlying.clone())],
            &8,
            &300,
        );
        oracle_client.set_price_stable(&vec![&e, 0_08000000]);

        e.as_contract(&pool_address, || {
            storage::set_pool_config(
                &e,
                &PoolConfig {
                    oracle,
                    max_price_age: 86400,
                    status: 0,
                },
            );
            let mut pool = Pool::load(&e);

            // user supplied 250 units at index 1.0
            let mut user = User {
                address: samwise.clone(),
                positions: Positions::env_default(&e),
                config: UserConfig::default(),
            };
            user.positions.supply.set(0, 250_00000000);
            user.config.set_collateral(0, true);

            let account = AccountData::calculate(&e, &mut pool, &user);
            assert_eq!(account.total_collateral_value, 20_00000000);
            assert_eq!(account.total_debt_value, 0);
            assert_eq!(account.available_borrows, 15_00000000);
            assert_eq!(account.avg_ltv, 7500);
            assert_eq!(account.avg_liq_threshold, 8000);
            assert_eq!(account.health_factor, i128::MAX);
            account.require_healthy(&e);
        });
    }

    #[test]
    fn test_calculate_weighted_averages_and_health_factor() {
        let e = Env::default();
        e.mock_all_auths();

        let bombadil = Address::generate(&e);
        let samwise = Address::generate(&e);
        let pool_address = testutils::create_pool(&e);
        let (oracle, oracle_client) = testutils::create_mock_oracle(&e);

        let (underlying_0, _) = testutils::create_token_contract(&e, &bombadil);
        let (mut reserve_config, mut reserve_data) = testutils::default_reserve_meta();
        reserve_config.ltv = 7500;
        reserve_config.liq_threshold = 8000;
        reserve_data.total_scaled_supply = 1_000_0000000;
        testutils::create_reserve(&e, &pool_address, &underlying_0, &reserve_config, &reserve_data);

        let (underlying_1, _) = testutils::create_token_contract(&e, &bombadil);
        let (mut reserve_config, mut reserve_data) = testutils::default_reserve_meta();
        reserve_config.index = 1;
        reserve_config.ltv = 5000;
        reserve_config.liq_threshold = 6000;
        reserve_data.total_scaled_supply = 1_000_0000000;
        reserve_data.total_scaled_debt = 500_0000000;
        testutils::create_reserve(&e, &pool_address, &underlying_1, &reserve_config, &reserve_data);

        oracle_client.set_data(
            &bombadil,
            &Asset::Other(Symbol::new(&e, "USD")),
            &vec![
                &e,
                Asset::Stellar(underlying_0.clone()),
                Asset::Stellar(underlying_1.clone()),
            ],
            &8,
            &300,
        );
        oracle_client.set_price_stable(&vec![&e, 1_00000000, 4_00000000]);

        e.as_contract(&pool_address, || {
            storage::set_pool_config(
                &e,
                &PoolConfig {
                    oracle,
                    max_price_age: 86400,
                    status: 0,
                },
            );
            let mut pool = Pool::load(&e);

            // $100 of asset 0 collateral, $40 of asset 1 collateral,
            // $60 of asset 1 debt, all at index 1.0
            let mut user = User {
                address: samwise.clone(),
                positions: Positions::env_default(&e),
                config: UserConfig::default(),
            };
            user.positions.supply.set(0, 100_0000000);
            user.positions.supply.set(1, 10_0000000);
            user.positions.liabilities.set(1, 15_0000000);
            user.config.set_collateral(0, true);
            user.config.set_collateral(1, true);
            user.config.set_borrowing(1, true);

            let account = AccountData::calculate(&e, &mut pool, &user);
            assert_eq!(account.total_collateral_value, 140_00000000);
            assert_eq!(account.total_debt_value, 60_00000000);
            // (100 * 7500 + 40 * 5000) / 140 = 6785
            assert_eq!(account.avg_ltv, 6785);
            // (100 * 8000 + 40 * 6000) / 140 = 7428
            assert_eq!(account.avg_liq_threshold, 7428);
            // 140 * 0.6785 - 60 = 34.99
            assert_eq!(account.available_borrows, 34_99000000);
            // 140 * 0.7428 / 60 = 1.7332
            assert_eq!(account.health_factor, 1_733_200_000_000_000_000);
            assert!(!account.is_liquidatable());
        });
    }

    #[test]
    fn test_calculate_skips_disabled_collateral() {
        let e = Env::default();
        e.mock_all_auths();

        let bombadil = Address::generate(&e);
        let samwise = Address::generate(&e);
        let pool_address = testutils::create_pool(&e);
        let (oracle, oracle_client) = testutils::create_mock_oracle(&e);

        let (underlying, _) = testutils::create_token_contract(&e, &bombadil);
        let (reserve_config, mut reserve_data) = testutils::default_reserve_meta();
        reserve_data.total_scaled_supply = 1_000_0000000;
        testutils::create_reserve(&e, &pool_address, &underlying, &reserve_config, &reserve_data);

        oracle_client.set_data(
            &bombadil,
            &Asset::Other(Symbol::new(&e, "USD")),
            &vec![&e, Asset::Stellar(underlying.clone())],
            &8,
            &300,
        );
        oracle_client.set_price_stable(&vec![&e, 1_00000000]);

        e.as_contract(&pool_address, || {
            storage::set_pool_config(
                &e,
                &PoolConfig {
                    oracle,
                    max_price_age: 86400,
                    status: 0,
                },
            );
            let mut pool = Pool::load(&e);

            // supply exists but the collateral flag is off
            let mut user = User {
                address: samwise.clone(),
                positions: Positions::env_default(&e),
                config: UserConfig::default(),
            };
            user.positions.supply.set(0, 100_0000000);

            let account = AccountData::calculate(&e, &mut pool, &user);
            assert_eq!(account.total_collateral_value, 0);
            assert_eq!(account.available_borrows, 0);
        });
    }

    #[test]
    fn test_health_factor_below_one_is_liquidatable() {
        let e = Env::default();
        e.mock_all_auths();

        let bombadil = Address::generate(&e);
        let samwise = Address::generate(&e);
        let pool_address = testutils::create_pool(&e);
        let (oracle, oracle_client) = testutils::create_mock_oracle(&e);

        let (underlying, _) = testutils::create_token_contract(&e, &bombadil);
        let (mut reserve_config, mut reserve_data) = testutils::default_reserve_meta();
        reserve_config.liq_threshold = 8000;
        reserve_data.total_scaled_supply = 1_000_0000000;
        reserve_data.total_scaled_debt = 900_0000000;
        testutils::create_reserve(&e, &pool_address, &underlying, &reserve_config, &reserve_data);

        oracle_client.set_data(
            &bombadil,
            &Asset::Other(Symbol::new(&e, "USD")),
            &vec![&e, Asset::Stellar(underlying.clone())],
            &8,
            &300,
        );
        oracle_client.set_price_stable(&vec![&e, 1_00000000]);

        e.as_contract(&pool_address, || {
            storage::set_pool_config(
                &e,
                &PoolConfig {
                    oracle,
                    max_price_age: 86400,
                    status: 0,
                },
            );
            let mut pool = Pool::load(&e);

            // $100 collateral, $90 debt, threshold 80% -> hf 0.888
            let mut user = User {
                address: samwise.clone(),
                positions: Positions::env_default(&e),
                config: UserConfig::default(),
            };
            user.positions.supply.set(0, 100_0000000);
            user.positions.liabilities.set(0, 90_0000000);
            user.config.set_collateral(0, true);
            user.config.set_borrowing(0, true);

            let account = AccountData::calculate(&e, &mut pool, &user);
            assert_eq!(account.health_factor, 888_888_888_888_888_888);
            assert!(account.is_liquidatable());
        });
    }

    #[test]
    #[should_panic(expected = "Error(Contract, #120)")]
    fn test_require_healthy_panics() {
        let e = Env::default();

        let account = AccountData {
            total_collateral_value: 100_00000000,
            total_debt_value: 90_00000000,
            available_borrows: 0,
            avg_ltv: 7500,
            avg_liq_threshold: 8000,
            health_factor: 999_999_999_999_999_999,
        };
        account.require_healthy(&e);
    }
}
