//! EXIF rational numbers with an explicit zero-denominator policy.

use exif::Value;

/// A numerator/denominator pair as stored in EXIF numeric fields.
///
/// Both unsigned (`RATIONAL`) and signed (`SRATIONAL`) EXIF values widen
/// losslessly into this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rational {
    pub num: i64,
    pub denom: i64,
}

impl Rational {
    pub const fn new(num: i64, denom: i64) -> Self {
        Self { num, denom }
    }

    /// The quotient as a float, or `0.0` when the denominator is zero.
    ///
    /// A zero denominator is substituted rather than rejected, so an image
    /// with a broken component reports a zero for that component.
    pub fn to_f64_or_zero(self) -> f64 {
        if self.denom == 0 {
            0.0
        } else {
            self.num as f64 / self.denom as f64
        }
    }
}

impl From<exif::Rational> for Rational {
    fn from(r: exif::Rational) -> Self {
        Self::new(i64::from(r.num), i64::from(r.denom))
    }
}

impl From<exif::SRational> for Rational {
    fn from(r: exif::SRational) -> Self {
        Self::new(i64::from(r.num), i64::from(r.denom))
    }
}

/// Read a degrees/minutes/seconds triple from an EXIF value.
///
/// Returns `None` for any other value type or for fewer than three
/// components; extra components are ignored.
pub fn dms_triple(value: &Value) -> Option<[Rational; 3]> {
    let parts: Vec<Rational> = match value {
        Value::Rational(v) => v.iter().take(3).map(|&r| r.into()).collect(),
        Value::SRational(v) => v.iter().take(3).map(|&r| r.into()).collect(),
        _ => return None,
    };
    match parts.as_slice() {
        [d, m, s] => Some([*d, *m, *s]),
        _ => None,
    }
}
