use soroban_sdk::contracterror;

/// The error codes for the contract.
#[contracterror]
#[derive(Copy, Clone, Debug, Eq, PartialEq, PartialOrd, Ord)]
#[repr(u32)]
pub enum PoolError {
    // Common Errors
    InternalError = 1,
    AlreadyInitialized = 3,
    Unauthorized = 4,
    NegativeAmount = 8,
    InsufficientBalance = 10,
    ArithmeticOverflow = 12,
    DivisionByZero = 13,
    InvalidTimestamp = 14,

    // Configuration Errors (100-109)
    FieldOverflow = 100,
    InvalidReserveMetadata = 101,
    ReserveNotFound = 102,
    InvalidPoolInitArgs = 103,
    TooManyReserves = 104,

    // State Errors (110-119)
    ReserveInactive = 110,
    ReserveFrozen = 111,
    ReservePaused = 112,
    BorrowingDisabled = 113,
    SupplyCapExceeded = 114,
    BorrowCapExceeded = 115,
    InvalidPoolStatus = 116,

    // Risk Errors (120-129)
    HealthFactorBelowThreshold = 120,
    PositionHealthy = 121,
    NoDebt = 122,
    CollateralRequired = 123,
    InvalidLiquidation = 124,

    // Oracle Errors (130-139)
    PriceUnavailable = 130,
    StalePrice = 131,
}
