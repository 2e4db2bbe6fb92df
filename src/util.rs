use crate::math::*;
use std::ops::Range;

/// `num` evenly spaced samples from `start` to `end`, inclusive.
pub fn linspace(start: T, end: T, num: usize) -> impl Iterator<Item = T> {
    let step = if num > 1 {
        (end - start) / (num - 1) as T
    } else {
        0.
    };
    (0..num).map(move |i| start + step * i as T)
}

pub trait RangeExt {
    fn contains_point(&self, x: &TV) -> bool;
}

impl RangeExt for Range<TV> {
    /// Note that unlike `Range::contains`, this is inclusive at both ends.
    fn contains_point(&self, x: &TV) -> bool {
        self.start.all_le(x) && x.all_le(&self.end)
    }
}

pub trait VecExt {
    fn all_le(&self, other: &Self) -> bool;

    fn all_finite(&self) -> bool;
}

impl VecExt for TV {
    fn all_le(&self, other: &Self) -> bool {
        self.iter().zip(other.iter()).all(|(a, b)| a <= b)
    }

    fn all_finite(&self) -> bool {
        self.iter().all(|x| x.is_finite())
    }
}
