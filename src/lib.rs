#![no_std]

#[cfg(any(test, feature = "testutils"))]
extern crate std;

mod constants;
mod contract;
mod errors;
mod pool;
mod storage;
mod testutils;
mod validator;

pub use contract::*;
pub use errors::PoolError;
pub use pool::{AccountData, Positions, Reserve, ReserveConfig, UserConfig};
pub use storage::{InterestRateConfig, PackedReserveConfig, PoolConfig, ReserveData};
