mod money;

pub mod op;

pub use money::{Money, MoneyConversionError, BPS_DENOMINATOR, CENTS_PER_UNIT};
