//! Tests for core_kernel error types

use std::error::Error as _;

use core_kernel::error::CoreError;
use core_kernel::money::MoneyError;
use core_kernel::{CurrencyRegistry, PortError};

#[test]
fn test_registry_configuration_error_mentions_code() {
    let err = CurrencyRegistry::from_code("DOGE").unwrap_err();
    assert!(matches!(err, CoreError::InvalidBaseCurrency { .. }));
    assert!(err.to_string().contains("DOGE"));
}

#[test]
fn test_registry_configuration_error_keeps_source() {
    let err = CurrencyRegistry::from_code("BTC").unwrap_err();
    let source = err
        .source()
        .and_then(|s| s.downcast_ref::<MoneyError>())
        .cloned();
    assert_eq!(source, Some(MoneyError::UnsupportedCurrency("BTC".to_string())));
}

#[test]
fn test_port_error_validation_field() {
    let err = PortError::validation_field("must not be empty", "name");
    match err {
        PortError::Validation { message, field } => {
            assert_eq!(message, "must not be empty");
            assert_eq!(field.as_deref(), Some("name"));
        }
        other => panic!("Expected Validation, got {other:?}"),
    }
}

#[test]
fn test_unavailable_port_is_transient() {
    let err = PortError::unavailable("postgres connection pool");
    assert!(err.is_transient());
    assert!(err.to_string().contains("postgres connection pool"));
}
