//! Small utilities which fit nowhere else.

use std::cmp::Ordering;

pub mod in_range_option;

/// A totally ordered `f32` wrapper for use as a priority queue key.
/// Construction fails for NaN, so `Ord` is safe to implement.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct NonNan(f32);

impl NonNan {
    pub fn new(val: f32) -> Option<NonNan> {
        if val.is_nan() {
            None
        } else {
            Some(NonNan(val))
        }
    }

    pub fn value(self) -> f32 {
        self.0
    }
}

impl Eq for NonNan {}

impl Ord for NonNan {
    fn cmp(&self, other: &NonNan) -> Ordering {
        self.partial_cmp(other).unwrap()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_nan_rejects_nan() {
        assert!(NonNan::new(f32::NAN).is_none());
        assert!(NonNan::new(0.0).unwrap() < NonNan::new(1.5).unwrap());
    }
}
