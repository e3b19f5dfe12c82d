use crate::error::DemographError;
use serde::{Deserialize, Serialize};

/// Store time values.
///
/// This is a newtype wrapper for [`f64`](std::primitive::f64).
///
/// # Notes
///
/// * Times follow the backwards-in-time convention: values increase
///   from the present (zero) towards the past.
/// * The units are the [`TimeUnits`](crate::TimeUnits) of the
///   [`Graph`](crate::Graph).
/// * A `Time` is always finite and non-negative.  The end of an
///   interval that extends indefinitely into the past is represented
///   by [`EndTime::Unbounded`], never by a stored infinity.
///
/// # Examples
///
/// The only method to create a `Time` is to apply `TryFrom<f64>`:
///
/// ```
/// let t = demograph::Time::try_from(0.0).unwrap();
/// assert_eq!(t, 0.0);
/// assert!(demograph::Time::try_from(-1.0).is_err());
/// assert!(demograph::Time::try_from(f64::INFINITY).is_err());
/// ```
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
#[repr(transparent)]
#[serde(try_from = "f64")]
pub struct Time(f64);

impl_newtype_traits!(Time);

impl Time {
    fn validate<F>(&self, f: F) -> Result<(), DemographError>
    where
        F: std::ops::FnOnce(String) -> DemographError,
    {
        if self.0.is_nan() || self.0.is_infinite() || self.0 < 0.0 {
            Err(f(format!("times must be 0 <= t < Infinity, got: {}", self.0)))
        } else {
            Ok(())
        }
    }
}

impl TryFrom<f64> for Time {
    type Error = DemographError;
    fn try_from(value: f64) -> Result<Self, Self::Error> {
        let rv = Self(value);
        rv.validate(DemographError::ValueError)?;
        Ok(rv)
    }
}

/// The end of a time interval.
///
/// A deme or epoch that still exists at the present has no finite end
/// time; [`EndTime::Unbounded`] is the explicit marker for that case.
/// The marker serializes as the string `"Infinity"`, and
/// `TryFrom<f64>` maps positive infinity to it, so numeric input
/// remains convenient:
///
/// ```
/// let end = demograph::EndTime::try_from(f64::INFINITY).unwrap();
/// assert!(end.is_unbounded());
/// let end = demograph::EndTime::try_from(100.0).unwrap();
/// assert_eq!(end.finite().unwrap(), 100.0);
/// ```
///
/// `Unbounded` compares greater than any finite time.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "EndTimeTrampoline")]
#[serde(into = "EndTimeTrampoline")]
pub enum EndTime {
    #[allow(missing_docs)]
    Finite(Time),
    #[allow(missing_docs)]
    Unbounded,
}

impl EndTime {
    /// `true` if the interval extends indefinitely into the past.
    pub fn is_unbounded(&self) -> bool {
        matches!(self, EndTime::Unbounded)
    }

    /// The finite end time, if there is one.
    pub fn finite(&self) -> Option<Time> {
        match self {
            EndTime::Finite(time) => Some(*time),
            EndTime::Unbounded => None,
        }
    }

    // For interval arithmetic only; the infinity never outlives the
    // enclosing expression.
    pub(crate) fn as_f64(&self) -> f64 {
        match self {
            EndTime::Finite(time) => f64::from(*time),
            EndTime::Unbounded => f64::INFINITY,
        }
    }
}

impl From<Time> for EndTime {
    fn from(value: Time) -> Self {
        Self::Finite(value)
    }
}

impl TryFrom<f64> for EndTime {
    type Error = DemographError;
    fn try_from(value: f64) -> Result<Self, Self::Error> {
        if value.is_infinite() && value.is_sign_positive() {
            Ok(Self::Unbounded)
        } else {
            Ok(Self::Finite(Time::try_from(value)?))
        }
    }
}

impl Ord for EndTime {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        match (self, other) {
            (EndTime::Unbounded, EndTime::Unbounded) => std::cmp::Ordering::Equal,
            (EndTime::Unbounded, EndTime::Finite(_)) => std::cmp::Ordering::Greater,
            (EndTime::Finite(_), EndTime::Unbounded) => std::cmp::Ordering::Less,
            (EndTime::Finite(a), EndTime::Finite(b)) => a.cmp(b),
        }
    }
}

impl PartialOrd for EndTime {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq<Time> for EndTime {
    fn eq(&self, other: &Time) -> bool {
        matches!(self, EndTime::Finite(time) if time == other)
    }
}

impl PartialEq<EndTime> for Time {
    fn eq(&self, other: &EndTime) -> bool {
        other.eq(self)
    }
}

impl PartialOrd<Time> for EndTime {
    fn partial_cmp(&self, other: &Time) -> Option<std::cmp::Ordering> {
        match self {
            EndTime::Finite(time) => time.partial_cmp(other),
            EndTime::Unbounded => Some(std::cmp::Ordering::Greater),
        }
    }
}

impl PartialOrd<EndTime> for Time {
    fn partial_cmp(&self, other: &EndTime) -> Option<std::cmp::Ordering> {
        other.partial_cmp(self).map(std::cmp::Ordering::reverse)
    }
}

impl std::fmt::Display for EndTime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EndTime::Finite(time) => write!(f, "{time}"),
            EndTime::Unbounded => write!(f, "Infinity"),
        }
    }
}

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum EndTimeTrampoline {
    Marker(String),
    Float(f64),
}

impl TryFrom<EndTimeTrampoline> for EndTime {
    type Error = DemographError;

    fn try_from(value: EndTimeTrampoline) -> Result<Self, Self::Error> {
        match value {
            // Handle string inputs
            EndTimeTrampoline::Marker(string) => {
                if &string == "Infinity" {
                    Ok(Self::Unbounded)
                } else {
                    Err(DemographError::ValueError(string))
                }
            }
            EndTimeTrampoline::Float(f) => Self::try_from(f),
        }
    }
}

impl From<EndTime> for EndTimeTrampoline {
    fn from(value: EndTime) -> Self {
        match value {
            EndTime::Unbounded => Self::Marker("Infinity".to_string()),
            EndTime::Finite(time) => Self::Float(f64::from(time)),
        }
    }
}

/// Generation time.
///
/// Must be finite and greater than zero.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
#[repr(transparent)]
#[serde(try_from = "f64")]
pub struct GenerationTime(f64);

impl_newtype_traits!(GenerationTime);

impl GenerationTime {
    fn validate<F: FnOnce(String) -> DemographError>(&self, err: F) -> Result<(), DemographError> {
        if !self.0.is_finite() || !self.0.gt(&0.0) {
            Err(err(format!("generation time must be > 0.0, got: {self}")))
        } else {
            Ok(())
        }
    }
}

impl TryFrom<f64> for GenerationTime {
    type Error = DemographError;
    fn try_from(value: f64) -> Result<GenerationTime, Self::Error> {
        let rv = Self(value);
        rv.validate(Self::Error::GraphError)?;
        Ok(rv)
    }
}

/// The time units of a graph
#[derive(Clone, Debug, Serialize, Deserialize, Eq, PartialEq)]
#[serde(from = "String")]
#[serde(into = "String")]
pub enum TimeUnits {
    #[allow(missing_docs)]
    Generations,
    #[allow(missing_docs)]
    Years,
    /// A "custom" time unit.  It is assumed
    /// that client code knows what to do with this.
    Custom(String),
}

impl From<String> for TimeUnits {
    fn from(value: String) -> Self {
        if &value == "generations" {
            Self::Generations
        } else if &value == "years" {
            Self::Years
        } else {
            Self::Custom(value)
        }
    }
}

impl From<TimeUnits> for String {
    fn from(value: TimeUnits) -> Self {
        value.to_string()
    }
}

impl std::fmt::Display for TimeUnits {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TimeUnits::Generations => write!(f, "generations"),
            TimeUnits::Years => write!(f, "years"),
            TimeUnits::Custom(custom) => write!(f, "{}", &custom),
        }
    }
}

/// Whether a membership test includes the end point of an interval.
///
/// Migrations are checked against the half-open interval; pulses use
/// the closed variant because a pulse at the exact moment a deme ends
/// is meaningful.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum IntervalClosure {
    #[allow(missing_docs)]
    HalfOpen,
    #[allow(missing_docs)]
    Closed,
}

/// A time interval `[start_time, end_time)`.
///
/// Intervals are produced by [`Deme::time_interval`](crate::Deme::time_interval),
/// [`Epoch::time_interval`](crate::Epoch::time_interval), and
/// [`Graph::time_intersection`](crate::Graph::time_intersection).
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct TimeInterval {
    start_time: Time,
    end_time: EndTime,
}

impl TimeInterval {
    pub(crate) fn new(start_time: Time, end_time: EndTime) -> Self {
        Self {
            start_time,
            end_time,
        }
    }

    /// The start (most recent) time of the interval.
    pub fn start_time(&self) -> Time {
        self.start_time
    }

    /// The end (oldest) time of the interval.
    pub fn end_time(&self) -> EndTime {
        self.end_time
    }

    /// `true` if `time` is in `[start_time, end_time)`.
    pub fn contains_half_open<F: Into<f64>>(&self, time: F) -> bool {
        let time = time.into();
        time >= f64::from(self.start_time) && time < self.end_time.as_f64()
    }

    /// `true` if `time` is in `[start_time, end_time]`.
    pub fn contains_closed<F: Into<f64>>(&self, time: F) -> bool {
        let time = time.into();
        time >= f64::from(self.start_time) && time <= self.end_time.as_f64()
    }

    // The interval over which both operands exist.
    pub(crate) fn intersect(&self, other: &Self) -> Self {
        Self {
            start_time: std::cmp::max(self.start_time, other.start_time),
            end_time: std::cmp::min(self.end_time, other.end_time),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn time_rejects_invalid_values() {
        assert!(Time::try_from(-1e-6).is_err());
        assert!(Time::try_from(f64::NAN).is_err());
        assert!(Time::try_from(f64::INFINITY).is_err());
        assert!(Time::try_from(0.0).is_ok());
    }

    #[test]
    fn unbounded_is_greatest() {
        let finite = EndTime::try_from(1e9).unwrap();
        assert!(EndTime::Unbounded > finite);
        assert!(EndTime::Unbounded > Time::try_from(1e9).unwrap());
        assert_eq!(
            std::cmp::min(EndTime::Unbounded, finite),
            EndTime::try_from(1e9).unwrap()
        );
    }

    #[test]
    fn end_time_serializes_as_infinity_marker() {
        let yaml = serde_yaml::to_string(&EndTime::Unbounded).unwrap();
        assert!(yaml.contains("Infinity"));
        let back: EndTime = serde_yaml::from_str(&yaml).unwrap();
        assert!(back.is_unbounded());
        let back: EndTime = serde_yaml::from_str("---\n.inf\n").unwrap();
        assert!(back.is_unbounded());
    }

    #[test]
    fn interval_closure() {
        let interval = TimeInterval::new(
            Time::try_from(10.0).unwrap(),
            EndTime::try_from(50.0).unwrap(),
        );
        assert!(interval.contains_half_open(10.0));
        assert!(!interval.contains_half_open(50.0));
        assert!(interval.contains_closed(50.0));
        assert!(!interval.contains_closed(50.1));
        assert!(!interval.contains_half_open(f64::NAN));
    }

    #[test]
    fn intersection_of_nested_intervals() {
        let a = TimeInterval::new(Time::try_from(0.0).unwrap(), EndTime::Unbounded);
        let b = TimeInterval::new(
            Time::try_from(25.0).unwrap(),
            EndTime::try_from(100.0).unwrap(),
        );
        let i = a.intersect(&b);
        assert_eq!(i.start_time(), 25.0);
        assert_eq!(i.end_time(), Time::try_from(100.0).unwrap());
    }
}
