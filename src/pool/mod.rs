mod account;
pub use account::AccountData;

mod actions;
pub use actions::{
    execute_borrow, execute_repay, execute_set_collateral, execute_supply, execute_withdraw,
};

mod config;
pub use config::{
    execute_initialize, execute_set_status, execute_update_rate_config, execute_update_reserve,
    initialize_reserve, ReserveConfig,
};

mod interest;

mod liquidation;
pub use liquidation::execute_liquidate;

mod math;

#[allow(clippy::module_inception)]
mod pool;
pub use pool::Pool;

mod reserve;
pub use reserve::Reserve;

mod user;
pub use user::{Positions, User, UserConfig};
