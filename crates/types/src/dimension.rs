//! A (minimum, optimum, maximum) extent triple.
//!
//! Every measured unit in the engine (box widths, glue, available space budgets)
//! is expressed in millipoints. Arithmetic saturates instead of wrapping so that
//! "infinite" fill glue can be summed without overflow.
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, AddAssign, Mul, Neg, Sub};

#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[serde(from = "RawDimension")]
pub struct Dimension {
    pub min: i32,
    pub opt: i32,
    pub max: i32,
}

/// Wire form of a [`Dimension`]; normalized on the way in.
#[derive(Deserialize)]
struct RawDimension {
    min: i32,
    opt: i32,
    max: i32,
}

impl From<RawDimension> for Dimension {
    fn from(raw: RawDimension) -> Self {
        Dimension::new(raw.min, raw.opt, raw.max)
    }
}

impl Dimension {
    pub const ZERO: Dimension = Dimension { min: 0, opt: 0, max: 0 };

    /// Builds a normalized triple. Bounds that do not enclose `opt` are widened
    /// to reach it; `opt` itself is never moved.
    pub fn new(min: i32, opt: i32, max: i32) -> Self {
        Self { min, opt, max }.normalize()
    }

    /// A rigid extent with no stretch and no shrink.
    pub fn fixed(value: i32) -> Self {
        Self { min: value, opt: value, max: value }
    }

    /// Glue-style constructor: natural width plus stretch and shrink amounts.
    pub fn flexible(natural: i32, stretch: i32, shrink: i32) -> Self {
        Self::new(
            natural.saturating_sub(shrink.max(0)),
            natural,
            natural.saturating_add(stretch.max(0)),
        )
    }

    pub fn stretch(&self) -> i32 {
        self.max.saturating_sub(self.opt)
    }

    pub fn shrink(&self) -> i32 {
        self.opt.saturating_sub(self.min)
    }

    pub fn is_normalized(&self) -> bool {
        self.min <= self.opt && self.opt <= self.max
    }

    pub fn is_rigid(&self) -> bool {
        self.min == self.max
    }

    /// Restores `min <= opt <= max` by widening whichever bound `opt` escaped through.
    pub fn normalize(self) -> Self {
        Self {
            min: self.min.min(self.opt),
            opt: self.opt,
            max: self.max.max(self.opt),
        }
    }

    /// Componentwise difference without renormalization.
    ///
    /// The result may violate the ordering invariant; callers must `normalize`
    /// before treating it as an extent again.
    pub fn sub_raw(self, other: Dimension) -> Self {
        Self {
            min: self.min.saturating_sub(other.min),
            opt: self.opt.saturating_sub(other.opt),
            max: self.max.saturating_sub(other.max),
        }
    }

    pub fn scale(self, factor: i32) -> Self {
        let (lo, hi) = if factor < 0 { (self.max, self.min) } else { (self.min, self.max) };
        Self {
            min: lo.saturating_mul(factor),
            opt: self.opt.saturating_mul(factor),
            max: hi.saturating_mul(factor),
        }
        .normalize()
    }
}

impl Add for Dimension {
    type Output = Dimension;

    fn add(self, rhs: Dimension) -> Dimension {
        Dimension {
            min: self.min.saturating_add(rhs.min),
            opt: self.opt.saturating_add(rhs.opt),
            max: self.max.saturating_add(rhs.max),
        }
        .normalize()
    }
}

impl AddAssign for Dimension {
    fn add_assign(&mut self, rhs: Dimension) {
        *self = *self + rhs;
    }
}

impl Sub for Dimension {
    type Output = Dimension;

    fn sub(self, rhs: Dimension) -> Dimension {
        self.sub_raw(rhs).normalize()
    }
}

impl Mul<i32> for Dimension {
    type Output = Dimension;

    fn mul(self, rhs: i32) -> Dimension {
        self.scale(rhs)
    }
}

impl Neg for Dimension {
    type Output = Dimension;

    fn neg(self) -> Dimension {
        // Bounds swap roles under negation.
        Dimension {
            min: self.max.saturating_neg(),
            opt: self.opt.saturating_neg(),
            max: self.min.saturating_neg(),
        }
        .normalize()
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}, {}]", self.min, self.opt, self.max)
    }
}
