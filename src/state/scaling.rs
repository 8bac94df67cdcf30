use alloy_primitives::U256;
use bigdecimal::BigDecimal;
use num_bigint::{BigInt, BigUint};

/// Scales a raw token amount by `10^decimals`.
///
/// The raw integer becomes the unscaled part of a `BigDecimal` whose scale is
/// `decimals`, which is exactly `amount / 10^decimals` with no rounding.
/// `decimals = 0` yields the integer itself.
pub fn scale_amount(amount: U256, decimals: u8) -> BigDecimal {
    BigDecimal::new(to_big_int(amount), i64::from(decimals))
}

pub fn to_big_int(amount: U256) -> BigInt {
    BigInt::from(BigUint::from_bytes_be(&amount.to_be_bytes_vec()))
}
