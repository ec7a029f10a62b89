use rust_decimal::Decimal;
use rust_decimal::MathematicalOps;
use rust_decimal_macros::dec;

use crate::error::ProformaError;
use crate::types::{Money, Rate};
use crate::ProformaResult;

/// Payment (PMT), spreadsheet sign convention: a positive present value
/// (money received) yields a negative payment.
pub fn pmt(rate: Rate, nper: u32, present_value: Money, future_value: Money) -> ProformaResult<Money> {
    if nper == 0 {
        return Err(ProformaError::InvalidInput {
            field: "nper".into(),
            reason: "Number of periods must be > 0".into(),
        });
    }

    let overflow = || ProformaError::InvalidInput {
        field: "present_value".into(),
        reason: format!("{present_value} compounded over {nper} periods overflows"),
    };

    if rate.is_zero() {
        let total = present_value.checked_add(future_value).ok_or_else(overflow)?;
        return Ok(-total / Decimal::from(nper));
    }

    let one_plus_r = Decimal::ONE + rate;
    let factor = one_plus_r
        .checked_powu(u64::from(nper))
        .ok_or_else(|| ProformaError::InvalidInput {
            field: "nper".into(),
            reason: format!("(1 + {rate})^{nper} overflows"),
        })?;
    let annuity_factor = (factor - Decimal::ONE) / rate;

    if annuity_factor.is_zero() {
        return Err(ProformaError::InvalidInput {
            field: "rate".into(),
            reason: "PMT annuity factor is zero".into(),
        });
    }

    let compounded = present_value
        .checked_mul(factor)
        .and_then(|v| v.checked_add(future_value))
        .ok_or_else(overflow)?;

    (-compounded).checked_div(annuity_factor).ok_or_else(overflow)
}

/// Future value of a single amount compounded at `rate` for `periods`
/// periods. Negative periods discount back instead.
pub fn escalate(amount: Money, rate: Rate, periods: i32) -> ProformaResult<Money> {
    if rate <= dec!(-1) {
        return Err(ProformaError::InvalidInput {
            field: "rate".into(),
            reason: "Growth rate must be greater than -100%".into(),
        });
    }

    let one_plus_r = Decimal::ONE + rate;
    let mut factor = Decimal::ONE;
    for _ in 0..periods.unsigned_abs() {
        factor = factor
            .checked_mul(one_plus_r)
            .ok_or_else(|| ProformaError::InvalidInput {
                field: "periods".into(),
                reason: format!("Compounding {amount} over {periods} periods overflows"),
            })?;
    }

    let escalated = if periods < 0 {
        amount.checked_div(factor)
    } else {
        amount.checked_mul(factor)
    };
    escalated.ok_or_else(|| ProformaError::InvalidInput {
        field: "periods".into(),
        reason: format!("Escalating {amount} over {periods} periods overflows"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_pmt_thirty_year_mortgage() {
        let result = pmt(dec!(0.04) / dec!(12), 360, dec!(100000), Decimal::ZERO).unwrap();
        // 100k @ 4% over 30 years: 477.42 per month
        assert_eq!(result.round_dp(2), dec!(-477.42));
    }

    #[test]
    fn test_pmt_zero_rate() {
        let result = pmt(Decimal::ZERO, 10, dec!(1000), Decimal::ZERO).unwrap();
        assert_eq!(result, dec!(-100));
    }

    #[test]
    fn test_pmt_zero_periods_error() {
        assert!(pmt(dec!(0.01), 0, dec!(1000), Decimal::ZERO).is_err());
    }

    #[test]
    fn test_escalate_forward() {
        let result = escalate(dec!(1000), dec!(0.10), 2).unwrap();
        assert_eq!(result, dec!(1210));
    }

    #[test]
    fn test_escalate_backward() {
        let result = escalate(dec!(1210), dec!(0.10), -2).unwrap();
        assert_eq!(result, dec!(1000));
    }

    #[test]
    fn test_escalate_zero_periods_is_identity() {
        assert_eq!(escalate(dec!(4600), dec!(0.03), 0).unwrap(), dec!(4600));
    }

    #[test]
    fn test_pmt_overflowing_present_value_error() {
        let result = pmt(dec!(0.04) / dec!(12), 360, dec!(50000000000000000000000000000), Decimal::ZERO);
        assert!(matches!(result, Err(ProformaError::InvalidInput { .. })));
    }

    #[test]
    fn test_escalate_overflowing_amount_error() {
        // 1.03^2081 fits in a Decimal on its own, but not once applied to 4600
        let result = escalate(dec!(4600), dec!(0.03), 2081);
        assert!(matches!(result, Err(ProformaError::InvalidInput { .. })));
    }

    #[test]
    fn test_escalate_discount_to_nothing_error() {
        // Factor underflows to zero, so discounting back cannot divide by it
        assert!(escalate(dec!(100), dec!(-0.9999999999), -5000).is_err());
    }

    #[test]
    fn test_escalate_rejects_total_loss_rate() {
        assert!(escalate(dec!(100), dec!(-1), 3).is_err());
    }
}
