use crate::error::DemographError;
use serde::{Deserialize, Serialize};

/// A continuous migration rate, per [`TimeUnits`](crate::TimeUnits).
///
/// A rate of zero is valid; it marks the deactivation of a previously
/// active migration.
///
/// # Examples
///
/// ```
/// let rate = demograph::MigrationRate::try_from(1e-4).unwrap();
/// assert_eq!(rate, 1e-4);
/// assert!(demograph::MigrationRate::try_from(-1e-4).is_err());
/// ```
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
#[repr(transparent)]
#[serde(try_from = "f64")]
pub struct MigrationRate(f64);

impl MigrationRate {
    fn validate<F>(&self, f: F) -> Result<(), DemographError>
    where
        F: std::ops::FnOnce(String) -> DemographError,
    {
        if !self.0.is_finite() || self.0 < 0.0 {
            let msg = format!("migration rates must be 0 <= m < Infinity, got: {}", self.0);
            Err(f(msg))
        } else {
            Ok(())
        }
    }
}

impl TryFrom<f64> for MigrationRate {
    type Error = DemographError;
    fn try_from(value: f64) -> Result<Self, Self::Error> {
        let rv = Self(value);
        rv.validate(DemographError::ValueError)?;
        Ok(rv)
    }
}

impl_newtype_traits!(MigrationRate);
