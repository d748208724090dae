//! Fixed-point money type for the aggregation core.
//!
//! # Motivation
//!
//! All money amounts in this crate use a cent (1e-2) fixed-point
//! representation stored as `i64`. Currency rounding is where off-by-one-cent
//! bugs live, so the rule is stated once and enforced in integer arithmetic:
//!
//! **round half away from zero at the cent boundary.**
//!
//! A base price of `"19.995"` is 2000 cents, not 1999 — that exact halfway
//! case is unrepresentable in `f64` (it stores 19.994999…), which is why
//! floats never touch money here. Parsing and percent application both go
//! through `i128` intermediates and apply the rule on the integer remainder.
//!
//! # Scale
//!
//! 1 USD = `Cents(100)`. Quantities, ids, and counts remain plain integers
//! and are never implicitly convertible to money.

use std::fmt;
use std::ops::{Add, AddAssign, Neg, Sub};
use std::str::FromStr;

use serde::{Serialize, Serializer};

// ---------------------------------------------------------------------------
// Cents newtype
// ---------------------------------------------------------------------------

/// A fixed-point monetary amount at 1e-2 scale (cents).
///
/// Construct with [`Cents::new`] (raw cents) or parse a decimal string via
/// [`FromStr`]. There is intentionally no `From<i64>` impl — callers must be
/// deliberate about when a raw integer represents money.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Cents(i64);

impl Cents {
    /// Zero monetary amount.
    pub const ZERO: Cents = Cents(0);

    /// Construct from a raw cent count.
    #[inline]
    pub const fn new(raw: i64) -> Self {
        Cents(raw)
    }

    /// Extract the underlying raw cent count.
    #[inline]
    pub const fn raw(self) -> i64 {
        self.0
    }

    /// `true` if this amount is strictly negative.
    #[inline]
    pub fn is_negative(self) -> bool {
        self.0 < 0
    }

    /// Apply a percent adjustment: `self * (1 + percent/100)`, rounded
    /// half-away-from-zero at the cent boundary.
    ///
    /// Zero maps to zero regardless of percent. A large negative percent can
    /// produce a negative result; it is passed through unclamped — whether to
    /// floor at zero is a caller decision.
    ///
    /// The multiplication runs in `i128`; a result outside `i64` saturates.
    pub fn adjust_by(self, percent: Percent) -> Cents {
        let numer = (self.0 as i128) * (PERCENT_SCALE + percent.basis_points() as i128);
        Cents(clamp_i64(div_round_half_away(numer, PERCENT_SCALE)))
    }
}

/// Basis points per 100% (`1 + percent/100` at basis-point scale).
const PERCENT_SCALE: i128 = 10_000;

/// Integer division rounding half away from zero.
///
/// `denom` must be positive; both callers pass a positive constant.
fn div_round_half_away(numer: i128, denom: i128) -> i128 {
    let q = numer / denom;
    let r = numer % denom;
    if r.abs() * 2 >= denom {
        q + numer.signum()
    } else {
        q
    }
}

fn clamp_i64(x: i128) -> i64 {
    if x > i64::MAX as i128 {
        i64::MAX
    } else if x < i64::MIN as i128 {
        i64::MIN
    } else {
        x as i64
    }
}

impl Add for Cents {
    type Output = Cents;
    #[inline]
    fn add(self, rhs: Cents) -> Cents {
        Cents(self.0.saturating_add(rhs.0))
    }
}

impl AddAssign for Cents {
    #[inline]
    fn add_assign(&mut self, rhs: Cents) {
        self.0 = self.0.saturating_add(rhs.0);
    }
}

impl Sub for Cents {
    type Output = Cents;
    #[inline]
    fn sub(self, rhs: Cents) -> Cents {
        Cents(self.0.saturating_sub(rhs.0))
    }
}

impl Neg for Cents {
    type Output = Cents;
    #[inline]
    fn neg(self) -> Cents {
        Cents(self.0.saturating_neg())
    }
}

// ---------------------------------------------------------------------------
// Parsing
// ---------------------------------------------------------------------------

/// Error parsing a decimal money string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseCentsError {
    input: String,
}

impl fmt::Display for ParseCentsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid money amount: {:?}", self.input)
    }
}

impl std::error::Error for ParseCentsError {}

impl FromStr for Cents {
    type Err = ParseCentsError;

    /// Parse a decimal string (`"19.99"`, `"-0.50"`, `"19.995"`, `"7"`).
    ///
    /// Digits beyond the second decimal place round half-away-from-zero:
    /// `"19.995"` parses to 2000 cents.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || ParseCentsError { input: s.to_string() };
        let t = s.trim();

        let (negative, t) = match t.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, t.strip_prefix('+').unwrap_or(t)),
        };

        let (int_part, frac_part) = match t.split_once('.') {
            Some((i, f)) => (i, f),
            None => (t, ""),
        };
        if int_part.is_empty() && frac_part.is_empty() {
            return Err(err());
        }
        if !int_part.bytes().all(|b| b.is_ascii_digit())
            || !frac_part.bytes().all(|b| b.is_ascii_digit())
        {
            return Err(err());
        }

        let mut cents: i128 = 0;
        for b in int_part.bytes() {
            cents = cents * 10 + (b - b'0') as i128;
            if cents > i64::MAX as i128 {
                return Err(err());
            }
        }
        cents *= 100;

        let mut frac = frac_part.bytes();
        for place in [10, 1] {
            if let Some(b) = frac.next() {
                cents += (b - b'0') as i128 * place;
            }
        }
        // Third decimal digit decides the rounding; anything after it cannot
        // pull a half back below the boundary under half-away-from-zero.
        if let Some(b) = frac.next() {
            if b >= b'5' {
                cents += 1;
            }
        }

        if negative {
            cents = -cents;
        }
        Ok(Cents(clamp_i64(cents)))
    }
}

impl fmt::Display for Cents {
    /// Canonical decimal form with two fraction digits, e.g. `"19.99"`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let dollars = self.0 / 100;
        let frac = (self.0 % 100).abs();
        // When |value| < $1 and negative, the integer part truncates to 0 and
        // loses the sign; emit it explicitly.
        if self.0 < 0 && dollars == 0 {
            write!(f, "-{dollars}.{frac:02}")
        } else {
            write!(f, "{dollars}.{frac:02}")
        }
    }
}

impl Serialize for Cents {
    /// Serializes as the canonical decimal string.
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

// ---------------------------------------------------------------------------
// Percent
// ---------------------------------------------------------------------------

/// A percent adjustment carried in basis points (1 bp = 0.01%).
///
/// Finite by construction: [`Percent::from_f64`] rejects NaN and infinities,
/// so `adjust_by` never has to handle them.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Percent(i64);

impl Percent {
    /// The identity adjustment.
    pub const ZERO: Percent = Percent(0);

    /// Construct from whole basis points.
    #[inline]
    pub const fn from_basis_points(bp: i64) -> Self {
        Percent(bp)
    }

    /// Construct from a percent value (`10.0` means +10%, `-25.0` a 25%
    /// discount). Resolution is one basis point; finer fractions round
    /// half-away-from-zero.
    pub fn from_f64(percent: f64) -> Result<Self, InvalidPercent> {
        if !percent.is_finite() {
            return Err(InvalidPercent { value: percent });
        }
        let bp = percent * 100.0;
        // i64 bounds in bp space are astronomically large; saturate rather
        // than error for values beyond them.
        let rounded = if bp >= i64::MAX as f64 {
            i64::MAX
        } else if bp <= i64::MIN as f64 {
            i64::MIN
        } else {
            bp.round() as i64
        };
        Ok(Percent(rounded))
    }

    #[inline]
    pub const fn basis_points(self) -> i64 {
        self.0
    }
}

/// Error for a non-finite percent (caller contract violation).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InvalidPercent {
    pub value: f64,
}

impl fmt::Display for InvalidPercent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "percent must be finite, got {}", self.value)
    }
}

impl std::error::Error for InvalidPercent {}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
