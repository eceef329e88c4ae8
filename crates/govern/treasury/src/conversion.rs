use govern_types::{Amount, AssetId, PriceQuote};

use crate::error::TreasuryError;

/// Unsigned 256-bit intermediate, enough for any `u128 × u128` product.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct U256 {
    hi: u128,
    lo: u128,
}

impl U256 {
    fn mul(a: u128, b: u128) -> Self {
        const MASK: u128 = u64::MAX as u128;
        let (a_hi, a_lo) = (a >> 64, a & MASK);
        let (b_hi, b_lo) = (b >> 64, b & MASK);

        let ll = a_lo * b_lo;
        let lh = a_lo * b_hi;
        let hl = a_hi * b_lo;
        let hh = a_hi * b_hi;

        // Each term is below 2^64, so the sum cannot overflow.
        let mid = (ll >> 64) + (lh & MASK) + (hl & MASK);
        Self {
            hi: hh + (lh >> 64) + (hl >> 64) + (mid >> 64),
            lo: (ll & MASK) | (mid << 64),
        }
    }

    /// Floor division by a non-zero divisor; `None` when the quotient needs more than 128 bits.
    fn div_to_u128(self, divisor: u128) -> Option<u128> {
        if divisor == 0 || self.hi >= divisor {
            return None;
        }
        let mut rem = self.hi;
        let mut quot: u128 = 0;
        for shift in (0..128).rev() {
            let carry = rem >> 127;
            rem = (rem << 1) | ((self.lo >> shift) & 1);
            quot <<= 1;
            // rem < divisor held before the shift, so one subtraction suffices.
            if carry == 1 || rem >= divisor {
                rem = rem.wrapping_sub(divisor);
                quot |= 1;
            }
        }
        Some(quot)
    }
}

/// `10^decimals`, if it fits.
pub fn scale_factor(decimals: u8) -> Option<Amount> {
    10u128.checked_pow(u32::from(decimals))
}

/// `floor(a × b / divisor)` with a 256-bit intermediate product.
pub fn mul_div_floor(a: Amount, b: Amount, divisor: Amount) -> Option<Amount> {
    U256::mul(a, b).div_to_u128(divisor)
}

/// Credit issued for `quantity` units at `quote`: `floor(quantity × 10^decimals / price)`.
pub fn credit_for(
    asset: AssetId,
    quantity: Amount,
    quote: PriceQuote,
) -> Result<Amount, TreasuryError> {
    if quote.price == 0 {
        return Err(TreasuryError::InvalidPrice(asset));
    }
    let scale = scale_factor(quote.decimals).ok_or_else(|| {
        TreasuryError::ArithmeticOverflow(format!("10^{} exceeds 128 bits", quote.decimals))
    })?;
    mul_div_floor(quantity, scale, quote.price).ok_or_else(|| {
        TreasuryError::ArithmeticOverflow(format!(
            "credit for {} units of {} at price {} does not fit",
            quantity, asset, quote.price
        ))
    })
}
