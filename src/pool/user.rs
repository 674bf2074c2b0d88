use soroban_sdk::{contracttype, map, panic_with_error, Address, Env, Map};

use crate::{errors::PoolError, storage, validator::require_nonnegative};

use super::Reserve;

/// A user's scaled balances, keyed by reserve index. Real balances are
/// derived by multiplying by the reserve's current index.
#[derive(Clone, Debug, PartialEq)]
#[contracttype]
pub struct Positions {
    /// Scaled supply balances
    pub supply: Map<u32, i128>,
    /// Scaled debt balances
    pub liabilities: Map<u32, i128>,
}

impl Positions {
    /// Create an empty Positions object in the environment
    pub fn env_default(e: &Env) -> Self {
        Positions {
            supply: map![e],
            liabilities: map![e],
        }
    }
}

const BORROWING_MASK: u128 = 0x55555555555555555555555555555555;
const COLLATERAL_MASK: u128 = 0xAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA;

/// A user's reserve participation bitmap, 2 bits per reserve index: the even
/// bit tracks borrowing, the odd bit tracks use as collateral.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
#[contracttype]
pub struct UserConfig {
    pub map: u128,
}

impl UserConfig {
    pub fn is_borrowing(&self, reserve_index: u32) -> bool {
        self.map >> (reserve_index * 2) & 1 == 1
    }

    pub fn is_collateral(&self, reserve_index: u32) -> bool {
        self.map >> (reserve_index * 2 + 1) & 1 == 1
    }

    pub fn set_borrowing(&mut self, reserve_index: u32, borrowing: bool) {
        let bit = 1u128 << (reserve_index * 2);
        if borrowing {
            self.map |= bit;
        } else {
            self.map &= !bit;
        }
    }

    pub fn set_collateral(&mut self, reserve_index: u32, collateral: bool) {
        let bit = 1u128 << (reserve_index * 2 + 1);
        if collateral {
            self.map |= bit;
        } else {
            self.map &= !bit;
        }
    }

    pub fn has_debt(&self) -> bool {
        self.map & BORROWING_MASK != 0
    }

    pub fn has_collateral(&self) -> bool {
        self.map & COLLATERAL_MASK != 0
    }

    pub fn is_empty(&self) -> bool {
        self.map == 0
    }
}

/// A user of the pool, tracking their positions and configuration bitmap
pub struct User {
    pub address: Address,
    pub positions: Positions,
    pub config: UserConfig,
}

impl User {
    /// Load a user from the ledger
    pub fn load(e: &Env, address: &Address) -> User {
        User {
            address: address.clone(),
            positions: storage::get_user_positions(e, address),
            config: storage::get_user_config(e, address),
        }
    }

    /// Store the user's positions and configuration bitmap to the ledger
    pub fn store(&self, e: &Env) {
        storage::set_user_positions(e, &self.address, &self.positions);
        storage::set_user_config(e, &self.address, &self.config);
    }

    /// Fetch the user's scaled supply balance for a reserve index
    pub fn get_supply(&self, reserve_index: u32) -> i128 {
        self.positions.supply.get(reserve_index).unwrap_or(0)
    }

    /// Fetch the user's scaled debt balance for a reserve index
    pub fn get_liabilities(&self, reserve_index: u32) -> i128 {
        self.positions.liabilities.get(reserve_index).unwrap_or(0)
    }

    /// Mint `scaled_amount` of supply to the user for the reserve. Enables
    /// the reserve as collateral on a zero-to-nonzero transition.
    pub fn add_supply(&mut self, e: &Env, reserve: &mut Reserve, scaled_amount: i128) {
        require_nonnegative(e, &scaled_amount);
        let index = reserve.config.index;
        let balance = self.get_supply(index);
        if balance == 0 && scaled_amount > 0 {
            self.config.set_collateral(index, true);
        }
        self.positions.supply.set(index, balance + scaled_amount);
        reserve.data.total_scaled_supply += scaled_amount;
    }

    /// Burn `scaled_amount` of supply from the user for the reserve. Disables
    /// the reserve as collateral on a nonzero-to-zero transition.
    ///
    /// ### Panics
    /// With `InsufficientBalance` if the user holds less than `scaled_amount`
    pub fn remove_supply(&mut self, e: &Env, reserve: &mut Reserve, scaled_amount: i128) {
        require_nonnegative(e, &scaled_amount);
        let index = reserve.config.index;
        let balance = self.get_supply(index);
        if scaled_amount > balance {
            panic_with_error!(e, PoolError::InsufficientBalance);
        }
        if scaled_amount == balance {
            self.positions.supply.remove(index);
            self.config.set_collateral(index, false);
        } else {
            self.positions.supply.set(index, balance - scaled_amount);
        }
        reserve.data.total_scaled_supply -= scaled_amount;
    }

    /// Mint `scaled_amount` of debt to the user for the reserve
    pub fn add_liabilities(&mut self, e: &Env, reserve: &mut Reserve, scaled_amount: i128) {
        require_nonnegative(e, &scaled_amount);
        let index = reserve.config.index;
        let balance = self.get_liabilities(index);
        if balance == 0 && scaled_amount > 0 {
            self.config.set_borrowing(index, true);
        }
        self.positions.liabilities.set(index, balance + scaled_amount);
        reserve.data.total_scaled_debt += scaled_amount;
    }

    /// Burn `scaled_amount` of debt from the user for the reserve
    ///
    /// ### Panics
    /// With `InsufficientBalance` if the user owes less than `scaled_amount`
    pub fn remove_liabilities(&mut self, e: &Env, reserve: &mut Reserve, scaled_amount: i128) {
        require_nonnegative(e, &scaled_amount);
        let index = reserve.config.index;
        let balance = self.get_liabilities(index);
        if scaled_amount > balance {
            panic_with_error!(e, PoolError::InsufficientBalance);
        }
        if scaled_amount == balance {
            self.positions.liabilities.remove(index);
            self.config.set_borrowing(index, false);
        } else {
            self.positions.liabilities.set(index, balance - scaled_amount);
        }
        reserve.data.total_scaled_debt -= scaled_amount;
    }
}
