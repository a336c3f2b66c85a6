//! Exact Rational Arithmetic for Lycoris
//!
//! Every Lycoris number is a fraction of two arbitrary-precision integers in
//! lowest terms. There is no floating point anywhere in the runtime, not even
//! transiently: decimal and scientific literals are converted exactly, and
//! every operation produces an exact result or a typed error.
//!
//! ## Normalization Invariant
//!
//! A `Rational` always satisfies `den > 0` and `gcd(|num|, den) = 1`. The
//! invariant is established by [`Rational::new`] and preserved by every
//! operation, so equality can be field-wise and display never needs reduction.
//!
//! ## Operations
//!
//! - `add` / `sub` / `mul`: total, always succeed
//! - `div`: fails with `DivisionByZero` when the divisor is zero
//! - `pow`: integer exponents only, magnitude bounded by the evaluator's
//!   configured limit; negative exponents invert first
//! - `rem`: defined only for integer operands (truncated division, remainder
//!   takes the sign of the dividend)
//! - ordering: cross-multiplied big-integer comparison, no division involved

use num_bigint::BigInt;
use num_integer::Integer;
use num_traits::{One, Pow, Signed, ToPrimitive, Zero};
use std::cmp::Ordering;
use std::fmt;

use crate::error::{LycorisError, Result};

/// Default upper bound on the absolute value of a power exponent.
///
/// Also applied to the exponent of scientific literals, since `1e1000000000`
/// is the same catastrophic amount of work spelled differently.
pub const DEFAULT_MAX_EXPONENT: u32 = 10_000;

/// An exact fraction of two arbitrary-precision integers in lowest terms.
///
/// Integers are represented with denominator 1. The numerator carries the
/// sign; the denominator is always positive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rational {
    num: BigInt,
    den: BigInt,
}

/// 10^k as a big integer.
fn pow10(k: u32) -> BigInt {
    Pow::pow(&BigInt::from(10), k)
}

impl Rational {
    /// Creates a rational from a numerator and denominator, normalizing to
    /// lowest terms with a positive denominator.
    ///
    /// # Errors
    /// `DivisionByZero` if the denominator is zero.
    pub fn new(num: BigInt, den: BigInt) -> Result<Self> {
        if den.is_zero() {
            return Err(LycorisError::DivisionByZero);
        }

        let (mut num, mut den) = if den.is_negative() {
            (-num, -den)
        } else {
            (num, den)
        };

        let g = num.gcd(&den);
        if !g.is_one() {
            num = &num / &g;
            den = &den / &g;
        }

        Ok(Self { num, den })
    }

    /// Creates an integer rational (denominator 1).
    pub fn from_integer(num: BigInt) -> Self {
        Self {
            num,
            den: BigInt::one(),
        }
    }

    /// Creates an integer rational from a machine integer.
    pub fn from_i64(num: i64) -> Self {
        Self::from_integer(BigInt::from(num))
    }

    /// Builds the exact rational denoted by a decimal or scientific literal.
    ///
    /// `A.B` becomes `(A * 10^|B| + B) / 10^|B|`, with the sign applied to
    /// the numerator; a base-ten `exponent` then multiplies or divides by a
    /// power of ten. `frac_digits` may be empty for plain integers.
    ///
    /// # Errors
    /// - `LimitExceeded` if the exponent magnitude is above
    ///   [`DEFAULT_MAX_EXPONENT`]
    /// - `SyntaxError` if the digit strings are empty or not decimal digits
    pub fn from_decimal_parts(
        negative: bool,
        int_digits: &str,
        frac_digits: &str,
        exponent: i32,
    ) -> Result<Self> {
        if exponent.unsigned_abs() > DEFAULT_MAX_EXPONENT {
            return Err(LycorisError::LimitExceeded(format!(
                "literal exponent {} exceeds the limit of {}",
                exponent, DEFAULT_MAX_EXPONENT
            )));
        }

        // Concatenating the fractional digits onto the integer digits is
        // exactly A * 10^|B| + B.
        let mut digits = String::new();
        digits.push_str(int_digits);
        digits.push_str(frac_digits);
        let mut num = BigInt::parse_bytes(digits.as_bytes(), 10).ok_or_else(|| {
            LycorisError::SyntaxError(format!("malformed number literal '{}'", digits))
        })?;
        let mut den = pow10(frac_digits.len() as u32);

        if exponent >= 0 {
            num *= pow10(exponent.unsigned_abs());
        } else {
            den *= pow10(exponent.unsigned_abs());
        }
        if negative {
            num = -num;
        }

        Self::new(num, den)
    }

    /// The numerator in lowest terms (carries the sign).
    pub fn numer(&self) -> &BigInt {
        &self.num
    }

    /// The denominator in lowest terms (always positive).
    pub fn denom(&self) -> &BigInt {
        &self.den
    }

    /// Whether this rational is a whole number.
    pub fn is_integer(&self) -> bool {
        self.den.is_one()
    }

    /// Whether this rational is zero.
    pub fn is_zero(&self) -> bool {
        self.num.is_zero()
    }

    /// The integer value, when this rational is a whole number that fits
    /// in an `i64`. Used for vector indices and counts.
    pub fn to_i64(&self) -> Option<i64> {
        if self.is_integer() {
            self.num.to_i64()
        } else {
            None
        }
    }

    /// Exact sum.
    pub fn add(&self, other: &Self) -> Self {
        let num = &self.num * &other.den + &other.num * &self.den;
        let den = &self.den * &other.den;
        Self::normalized(num, den)
    }

    /// Exact difference.
    pub fn sub(&self, other: &Self) -> Self {
        let num = &self.num * &other.den - &other.num * &self.den;
        let den = &self.den * &other.den;
        Self::normalized(num, den)
    }

    /// Exact product.
    pub fn mul(&self, other: &Self) -> Self {
        Self::normalized(&self.num * &other.num, &self.den * &other.den)
    }

    /// Exact quotient.
    ///
    /// # Errors
    /// `DivisionByZero` if `other` is zero.
    pub fn div(&self, other: &Self) -> Result<Self> {
        if other.is_zero() {
            return Err(LycorisError::DivisionByZero);
        }
        Ok(Self::normalized(
            &self.num * &other.den,
            &self.den * &other.num,
        ))
    }

    /// Exact power with an integer exponent.
    ///
    /// `(p/q)^e` is `p^e / q^e`; a negative exponent inverts the base first.
    ///
    /// # Errors
    /// - `DomainError` for a fractional exponent, or a negative exponent on
    ///   zero
    /// - `LimitExceeded` if `|e|` is above `max_exponent`
    pub fn pow(&self, exponent: &Self, max_exponent: u32) -> Result<Self> {
        if !exponent.is_integer() {
            return Err(LycorisError::DomainError(format!(
                "fractional exponent {}",
                exponent
            )));
        }
        let e = exponent.num.to_i64().ok_or_else(|| {
            LycorisError::LimitExceeded(format!(
                "exponent {} exceeds the limit of {}",
                exponent, max_exponent
            ))
        })?;
        if e.unsigned_abs() > u64::from(max_exponent) {
            return Err(LycorisError::LimitExceeded(format!(
                "exponent {} exceeds the limit of {}",
                e, max_exponent
            )));
        }
        if e < 0 && self.is_zero() {
            return Err(LycorisError::DomainError(
                "zero cannot be raised to a negative power".to_string(),
            ));
        }

        let k = e.unsigned_abs() as u32;
        let num = Pow::pow(&self.num, k);
        let den = Pow::pow(&self.den, k);
        if e < 0 {
            Self::new(den, num)
        } else {
            // p and q are coprime, so p^k and q^k are too.
            Ok(Self { num, den })
        }
    }

    /// Integer remainder, truncated toward zero (the remainder takes the
    /// sign of the dividend).
    ///
    /// # Errors
    /// - `DomainError` unless both operands are integers
    /// - `DivisionByZero` if `other` is zero
    pub fn rem(&self, other: &Self) -> Result<Self> {
        if !self.is_integer() || !other.is_integer() {
            return Err(LycorisError::DomainError(format!(
                "mod is defined for integers only, got {} and {}",
                self, other
            )));
        }
        if other.is_zero() {
            return Err(LycorisError::DivisionByZero);
        }
        Ok(Self::from_integer(&self.num % &other.num))
    }

    /// The sign as an integer rational: -1, 0, or 1.
    pub fn sign(&self) -> Self {
        Self::from_integer(self.num.signum())
    }

    /// Normalizes a fraction whose denominator is already known non-zero
    /// (products of non-zero denominators and checked divisors).
    fn normalized(num: BigInt, den: BigInt) -> Self {
        match Self::new(num, den) {
            Ok(r) => r,
            Err(_) => Self::from_integer(BigInt::zero()),
        }
    }
}

impl Ord for Rational {
    /// Cross-multiplied comparison: `a/b < c/d` iff `a*d < c*b`, valid
    /// because denominators are positive.
    fn cmp(&self, other: &Self) -> Ordering {
        (&self.num * &other.den).cmp(&(&other.num * &self.den))
    }
}

impl PartialOrd for Rational {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for Rational {
    /// Canonical textual form: decimal digits for integers, `num/den` in
    /// lowest terms otherwise, sign on the numerator.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.is_integer() {
            write!(f, "{}", self.num)
        } else {
            write!(f, "{}/{}", self.num, self.den)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rat(num: i64, den: i64) -> Rational {
        Rational::new(BigInt::from(num), BigInt::from(den)).unwrap()
    }

    #[test]
    fn test_normalization() {
        assert_eq!(rat(2, 4), rat(1, 2));
        assert_eq!(rat(-2, -4), rat(1, 2));
        assert_eq!(rat(2, -4).to_string(), "-1/2");
        assert_eq!(rat(0, 5), Rational::from_i64(0));
        assert_eq!(rat(0, 5).denom(), &BigInt::from(1));
    }

    #[test]
    fn test_zero_denominator() {
        let err = Rational::new(BigInt::from(1), BigInt::from(0)).unwrap_err();
        assert_eq!(err, LycorisError::DivisionByZero);
    }

    #[test]
    fn test_arithmetic() {
        assert_eq!(rat(1, 3).add(&rat(1, 6)), rat(1, 2));
        assert_eq!(rat(1, 2).sub(&rat(1, 3)), rat(1, 6));
        assert_eq!(rat(2, 3).mul(&rat(3, 4)), rat(1, 2));
        assert_eq!(rat(1, 3).div(&rat(1, 6)).unwrap(), rat(2, 1));
        assert_eq!(
            rat(1, 2).div(&rat(0, 1)).unwrap_err(),
            LycorisError::DivisionByZero
        );
    }

    #[test]
    fn test_third_times_three_is_one() {
        let third = Rational::from_i64(1).div(&Rational::from_i64(3)).unwrap();
        assert_eq!(third.mul(&Rational::from_i64(3)), Rational::from_i64(1));
    }

    #[test]
    fn test_pow() {
        assert_eq!(
            rat(2, 3).pow(&Rational::from_i64(3), 100).unwrap(),
            rat(8, 27)
        );
        assert_eq!(
            rat(2, 3).pow(&Rational::from_i64(-2), 100).unwrap(),
            rat(9, 4)
        );
        assert_eq!(
            rat(5, 1).pow(&Rational::from_i64(0), 100).unwrap(),
            rat(1, 1)
        );
        assert!(matches!(
            rat(2, 1).pow(&rat(1, 2), 100),
            Err(LycorisError::DomainError(_))
        ));
        assert!(matches!(
            rat(0, 1).pow(&Rational::from_i64(-1), 100),
            Err(LycorisError::DomainError(_))
        ));
        assert!(matches!(
            rat(2, 1).pow(&Rational::from_i64(101), 100),
            Err(LycorisError::LimitExceeded(_))
        ));
    }

    #[test]
    fn test_rem() {
        assert_eq!(
            rat(7, 1).rem(&Rational::from_i64(3)).unwrap(),
            Rational::from_i64(1)
        );
        assert_eq!(
            rat(-7, 1).rem(&Rational::from_i64(3)).unwrap(),
            Rational::from_i64(-1)
        );
        assert!(matches!(
            rat(1, 2).rem(&Rational::from_i64(3)),
            Err(LycorisError::DomainError(_))
        ));
        assert_eq!(
            rat(7, 1).rem(&Rational::from_i64(0)).unwrap_err(),
            LycorisError::DivisionByZero
        );
    }

    #[test]
    fn test_ordering() {
        assert!(rat(1, 3) < rat(1, 2));
        assert!(rat(-1, 2) < rat(-1, 3));
        assert!(rat(2, 4) == rat(1, 2));
        assert!(rat(10, 1) > rat(19, 2));
    }

    #[test]
    fn test_decimal_parts() {
        assert_eq!(
            Rational::from_decimal_parts(false, "3", "14", 0).unwrap(),
            rat(157, 50)
        );
        assert_eq!(
            Rational::from_decimal_parts(true, "0", "5", 0).unwrap(),
            rat(-1, 2)
        );
        assert_eq!(
            Rational::from_decimal_parts(false, "1", "", 61).unwrap(),
            Rational::from_integer(pow10(61))
        );
        // 2.5e-1 = 1/4
        assert_eq!(
            Rational::from_decimal_parts(false, "2", "5", -1).unwrap(),
            rat(1, 4)
        );
        assert!(matches!(
            Rational::from_decimal_parts(false, "1", "", 20_000),
            Err(LycorisError::LimitExceeded(_))
        ));
    }

    #[test]
    fn test_sign() {
        assert_eq!(rat(-3, 7).sign(), Rational::from_i64(-1));
        assert_eq!(rat(0, 1).sign(), Rational::from_i64(0));
        assert_eq!(rat(3, 7).sign(), Rational::from_i64(1));
    }

    #[test]
    fn test_display() {
        assert_eq!(rat(8, 1).to_string(), "8");
        assert_eq!(rat(-8, 1).to_string(), "-8");
        assert_eq!(rat(22, 7).to_string(), "22/7");
        assert_eq!(rat(-22, 7).to_string(), "-22/7");
    }
}
