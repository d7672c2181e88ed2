//! Unit tests for Money and ExchangeRate
//!
//! Tests cover creation and rounding, checked arithmetic, and conversions
//! between currencies.

use core_kernel::{Currency, ExchangeRate, Money, MoneyError, MAX_AMOUNT, RATE_SCALE};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

mod creation {
    use super::*;

    #[test]
    fn test_new_rounds_to_four_decimal_places() {
        let m = Money::new(dec!(100.123456789), Currency::USD);
        assert_eq!(m.amount(), dec!(100.1235));
    }

    #[test]
    fn test_zero_creates_zero_amount() {
        let m = Money::zero(Currency::EUR);
        assert!(m.is_zero());
        assert_eq!(m.currency(), Currency::EUR);
    }

    #[test]
    fn test_try_new_rejects_sub_scale_precision() {
        let result = Money::try_new(dec!(0.123456), Currency::USD);
        assert!(matches!(result, Err(MoneyError::InvalidAmount(_))));
    }

    #[test]
    fn test_try_new_rejects_out_of_range_amounts() {
        assert!(Money::try_new(MAX_AMOUNT - dec!(0.0001), Currency::EUR).is_ok());
        assert!(Money::try_new(MAX_AMOUNT, Currency::EUR).is_err());
        assert!(Money::try_new(-MAX_AMOUNT, Currency::EUR).is_err());
    }
}

mod arithmetic {
    use super::*;

    #[test]
    fn test_checked_add_same_currency() {
        let a = Money::new(dec!(200.00), Currency::EUR);
        let b = Money::new(dec!(42.50), Currency::EUR);
        assert_eq!(a.checked_add(&b).unwrap().amount(), dec!(242.50));
    }

    #[test]
    fn test_checked_add_currency_mismatch() {
        let a = Money::new(dec!(1), Currency::EUR);
        let b = Money::new(dec!(1), Currency::USD);
        assert_eq!(
            a.checked_add(&b),
            Err(MoneyError::CurrencyMismatch("EUR".to_string(), "USD".to_string()))
        );
    }

    #[test]
    fn test_multiply_by_quantity() {
        let price = Money::new(dec!(19.99), Currency::USD);
        assert_eq!(price.checked_mul(Decimal::from(3)).unwrap().amount(), dec!(59.97));
    }

    #[test]
    fn test_multiply_keeps_exact_product() {
        let price = Money::try_new(dec!(0.1234), Currency::USD).unwrap();
        assert_eq!(price.checked_mul(Decimal::from(2)).unwrap().amount(), dec!(0.2468));
    }

    #[test]
    fn test_multiply_overflow_is_reported() {
        let price = Money::new(dec!(79228162514264.3375), Currency::EUR);
        assert!(matches!(
            price.checked_mul(Decimal::from(u32::MAX)),
            Err(MoneyError::InvalidAmount(_))
        ));
    }
}

mod conversion {
    use super::*;

    #[test]
    fn test_usd_to_eur_example() {
        let rate = ExchangeRate::new(Currency::USD, Currency::EUR, dec!(0.85)).unwrap();
        let converted = rate.apply(&Money::new(dec!(51.00), Currency::USD)).unwrap();
        assert_eq!(converted.amount(), dec!(43.35));
    }

    #[test]
    fn test_identity_rate() {
        let rate = ExchangeRate::identity(Currency::GBP);
        assert_eq!(rate.rate(), Decimal::ONE);
        assert_eq!(rate.from(), rate.to());
    }

    #[test]
    fn test_inverse_round_trip_is_close() {
        let rate = ExchangeRate::new(Currency::EUR, Currency::USD, dec!(1.25)).unwrap();
        let inverse = rate.inverse();
        assert_eq!(inverse.from(), Currency::USD);
        assert_eq!(inverse.to(), Currency::EUR);
        assert_eq!(inverse.rate(), dec!(0.8));
    }

    #[test]
    fn test_inverse_is_rounded_to_rate_scale() {
        let rate = ExchangeRate::new(Currency::USD, Currency::EUR, dec!(0.85)).unwrap();
        assert_eq!(rate.inverse().rate(), dec!(1.17647059));
        assert!(rate.inverse().rate().scale() <= RATE_SCALE);
    }

    #[test]
    fn test_over_precise_rate_is_rejected() {
        let result = ExchangeRate::new(Currency::USD, Currency::EUR, dec!(0.850000001));
        assert!(matches!(result, Err(MoneyError::InvalidRate(_))));
    }

    #[test]
    fn test_display() {
        let rate = ExchangeRate::new(Currency::USD, Currency::EUR, dec!(0.85)).unwrap();
        assert_eq!(rate.to_string(), "1 USD = 0.85 EUR");
    }
}
