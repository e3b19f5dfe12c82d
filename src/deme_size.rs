use crate::error::DemographError;
use serde::{Deserialize, Serialize};

/// The size of a [`Deme`](crate::Deme) at a given [`Time`](crate::Time).
///
/// This is a newtype wrapper for [`f64`](std::primitive::f64).
///
/// # Notes
///
/// * The size may take on non-integer values.
///
/// # Examples
///
/// ```
/// let size = demograph::DemeSize::try_from(50.0).unwrap();
/// assert_eq!(size, 50.0);
/// assert!(demograph::DemeSize::try_from(0.0).is_err());
/// ```
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
#[serde(try_from = "f64")]
#[repr(transparent)]
pub struct DemeSize(f64);

impl DemeSize {
    fn validate<F>(&self, f: F) -> Result<(), DemographError>
    where
        F: std::ops::FnOnce(String) -> DemographError,
    {
        if self.0.is_nan() || self.0.is_infinite() || self.0 <= 0.0 {
            let msg = format!("deme sizes must be 0 < s < Infinity, got: {}", self.0);
            Err(f(msg))
        } else {
            Ok(())
        }
    }
}

impl TryFrom<f64> for DemeSize {
    type Error = DemographError;
    fn try_from(value: f64) -> Result<Self, Self::Error> {
        let rv = Self(value);
        rv.validate(DemographError::ValueError)?;
        Ok(rv)
    }
}

impl_newtype_traits!(DemeSize);
