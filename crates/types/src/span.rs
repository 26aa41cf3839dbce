//! Output of a break search: resolved segments of an element sequence.
use serde::{Deserialize, Serialize};
use std::ops::Range;

/// Coarse bucket of an adjustment ratio, used to penalize abrupt changes of
/// spacing between neighbouring lines or pages.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "camelCase")]
pub enum FitnessClass {
    Tight = 0,
    Decent = 1,
    Loose = 2,
    VeryLoose = 3,
}

impl FitnessClass {
    pub const ALL: [FitnessClass; 4] = [
        FitnessClass::Tight,
        FitnessClass::Decent,
        FitnessClass::Loose,
        FitnessClass::VeryLoose,
    ];

    pub fn classify(ratio: f64) -> Self {
        if ratio < -0.5 {
            FitnessClass::Tight
        } else if ratio <= 0.5 {
            FitnessClass::Decent
        } else if ratio <= 1.0 {
            FitnessClass::Loose
        } else {
            FitnessClass::VeryLoose
        }
    }

    pub fn index(self) -> usize {
        self as usize
    }

    /// True when the classes are more than one step apart.
    pub fn is_incompatible_with(self, other: FitnessClass) -> bool {
        (self as i32 - other as i32).abs() > 1
    }
}

/// One line or page chosen by the search.
///
/// `start..end` is a half-open range of element indices; the element at
/// `end - 1` is the break that terminates the span. Consecutive spans of one
/// result are contiguous.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedSpan {
    pub start: usize,
    pub end: usize,
    /// 1-based line or page number within the search.
    pub line: usize,
    pub adjustment_ratio: f64,
    pub fitness: FitnessClass,
    /// Available space minus natural content extent (negative when overfull).
    pub difference: i32,
}

impl ResolvedSpan {
    pub fn range(&self) -> Range<usize> {
        self.start..self.end
    }

    pub fn break_index(&self) -> usize {
        self.end.saturating_sub(1)
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_boundaries() {
        assert_eq!(FitnessClass::classify(-0.8), FitnessClass::Tight);
        assert_eq!(FitnessClass::classify(-0.5), FitnessClass::Decent);
        assert_eq!(FitnessClass::classify(0.5), FitnessClass::Decent);
        assert_eq!(FitnessClass::classify(0.9), FitnessClass::Loose);
        assert_eq!(FitnessClass::classify(1.0), FitnessClass::Loose);
        assert_eq!(FitnessClass::classify(3.0), FitnessClass::VeryLoose);
    }

    #[test]
    fn test_incompatibility_is_more_than_one_step() {
        assert!(FitnessClass::Tight.is_incompatible_with(FitnessClass::Loose));
        assert!(!FitnessClass::Decent.is_incompatible_with(FitnessClass::Loose));
        assert!(FitnessClass::VeryLoose.is_incompatible_with(FitnessClass::Decent));
    }
}
