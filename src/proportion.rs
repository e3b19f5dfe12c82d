use crate::error::DemographError;
use serde::{Deserialize, Serialize};

/// An ancestry proportion.
///
/// This is a newtype wrapper for [`f64`](std::primitive::f64).
///
/// # Interpretation
///
/// For a [`Pulse`](crate::Pulse), the proportion of the destination
/// deme made up of individuals from the source deme at the instant
/// after the pulse.
///
/// # Examples
///
/// ```
/// let p = demograph::Proportion::try_from(0.5).unwrap();
/// assert_eq!(p, 0.5);
/// assert!(demograph::Proportion::try_from(1.5).is_err());
/// ```
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
#[repr(transparent)]
#[serde(try_from = "f64")]
pub struct Proportion(f64);

impl Proportion {
    fn validate<F>(&self, f: F) -> Result<(), DemographError>
    where
        F: std::ops::FnOnce(String) -> DemographError,
    {
        if !self.0.is_finite() || self.0 < 0.0 || self.0 > 1.0 {
            let msg = format!("proportions must be 0.0 <= p <= 1.0, got: {}", self.0);
            Err(f(msg))
        } else {
            Ok(())
        }
    }
}

impl TryFrom<f64> for Proportion {
    type Error = DemographError;
    fn try_from(value: f64) -> Result<Self, Self::Error> {
        let rv = Self(value);
        rv.validate(DemographError::ValueError)?;
        Ok(rv)
    }
}

impl_newtype_traits!(Proportion);
