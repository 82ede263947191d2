//! Monetary arithmetic for order lines.

use std::str::FromStr;

use rust_decimal::Decimal;

use crate::error::OrderError;

/// Decimal places kept on line totals (and therefore on order totals).
pub const MONEY_SCALE: u32 = 4;

/// Decimal value of a quantity as written (`5000.0` becomes `5000`, `0.1` stays `0.1`).
pub fn decimal_quantity(quantity: f64) -> Result<Decimal, OrderError> {
    if !quantity.is_finite() {
        return Err(OrderError::validation(format!("quantity {quantity} is not a number")));
    }
    Decimal::from_str(&quantity.to_string())
        .map_err(|_| OrderError::validation(format!("quantity {quantity} is out of range")))
}

/// `quantity * unit_price`, rounded to [`MONEY_SCALE`].
pub fn line_total(unit_price: Decimal, quantity: f64) -> Result<Decimal, OrderError> {
    let quantity = decimal_quantity(quantity)?;
    unit_price
        .checked_mul(quantity)
        .map(|total| total.round_dp(MONEY_SCALE))
        .ok_or_else(|| OrderError::validation("line total overflows"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grams_priced_per_kilogram() {
        let unit_price = Decimal::new(2, 2); // 20 per kg, in grams
        assert_eq!(line_total(unit_price, 5000.0).unwrap(), Decimal::new(100, 0));
    }

    #[test]
    fn totals_round_to_money_scale() {
        let unit_price = Decimal::new(1, 5); // 0.00001
        assert_eq!(line_total(unit_price, 3.0).unwrap(), Decimal::ZERO);
        assert_eq!(line_total(Decimal::new(333333, 5), 1.0).unwrap(), Decimal::new(33333, 4));
    }

    #[test]
    fn fractional_quantities_stay_exact() {
        assert_eq!(decimal_quantity(0.1).unwrap(), Decimal::new(1, 1));
        assert_eq!(line_total(Decimal::new(10, 0), 0.1).unwrap(), Decimal::ONE);
    }

    #[test]
    fn non_finite_quantities_are_rejected() {
        assert!(decimal_quantity(f64::INFINITY).is_err());
        assert!(decimal_quantity(f64::NAN).is_err());
    }
}
