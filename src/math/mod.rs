pub mod decimal;

pub use decimal::{MONEY_SCALE, RATE_SCALE, annualize_to_period, clamp, quantize_money,
    quantize_rate, time_factor};
