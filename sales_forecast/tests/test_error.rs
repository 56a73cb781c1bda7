use sales_forecast::error::{FitError, ForecastError};
use sales_forecast::SkipReason;
use std::io;

#[test]
fn test_error_conversion() {
    // Test IO error conversion
    let io_error = io::Error::new(io::ErrorKind::NotFound, "file not found");
    let forecast_error = ForecastError::from(io_error);
    assert!(matches!(forecast_error, ForecastError::IoError(_)));

    // Test fit error conversion
    let forecast_error = ForecastError::from(FitError::SingularSystem);
    match forecast_error {
        ForecastError::Fit(FitError::SingularSystem) => {}
        other => panic!("Expected Fit variant, got {:?}", other),
    }
}

#[test]
fn test_error_display() {
    let error = ForecastError::MissingColumns(vec!["date".to_string(), "units_sold".to_string()]);
    assert_eq!(error.to_string(), "Missing required columns: date, units_sold");

    let error = ForecastError::from(FitError::InsufficientObservations {
        required: 6,
        actual: 2,
    });
    let error_string = format!("{}", error);
    assert!(error_string.contains("Model fitting error"));
    assert!(error_string.contains("need at least 6 observations, got 2"));

    // Test with source error
    let io_error = io::Error::new(io::ErrorKind::PermissionDenied, "permission denied");
    let error_string = ForecastError::from(io_error).to_string();
    assert!(error_string.contains("IO error"));
    assert!(error_string.contains("permission denied"));
}

#[test]
fn test_skip_reason_display() {
    assert_eq!(SkipReason::NoObservations.to_string(), "no observations");
    assert_eq!(
        SkipReason::FitFailed(FitError::TimedOut { limit_ms: 250 }).to_string(),
        "fit failed: fit exceeded its 250 ms time budget"
    );
}
