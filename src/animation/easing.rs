//! The easing menu (spec §4.3 "Easing menu", REDESIGN FLAGS: "the easing
//! descriptor should be a sum type ... with a parser at the boundary, so the
//! interpolation hot path does no string work").
//!
//! [`Easing`] is parsed once (from the string form the external builder API
//! still accepts, e.g. `"quadratic_in_out"`, `"exp_in:1024"`) and stored on
//! the keyframe node as a resolved value; [`Easing::apply`]/[`Easing::invert`]
//! never touch a string again.

use std::f64::consts::PI;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Family {
    Linear,
    Quadratic,
    Cubic,
    Quartic,
    Quintic,
    Sinus,
    Circular,
    Exponential,
    Bounce,
    Elastic,
    Back,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    In,
    Out,
    InOut,
    OutIn,
}

/// Up to two resolved numeric arguments (spec §3.5: "a parsed argument
/// vector (max 2 args)").
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Args {
    pub a0: Option<f64>,
    pub a1: Option<f64>,
}

impl Args {
    pub const NONE: Args = Args { a0: None, a1: None };
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Easing {
    pub family: Family,
    pub direction: Direction,
    pub args: Args,
}

impl Default for Easing {
    fn default() -> Self {
        Self { family: Family::Linear, direction: Direction::In, args: Args::NONE }
    }
}

const DEFAULT_EXP_BASE: f64 = 1024.0;
const DEFAULT_BACK_S: f64 = 1.70158;
/// Spec §4.3: "Back ... argument `s` (default 1.70158), `s` scaled by 1.525
/// in the compound variants [`in_out`/`out_in`]."
const BACK_COMPOUND_SCALE: f64 = 1.525;
const DEFAULT_ELASTIC_AMPLITUDE: f64 = 0.1;
const DEFAULT_ELASTIC_PERIOD: f64 = 0.25;

fn quadratic_in(x: f64) -> f64 {
    x * x
}
fn cubic_in(x: f64) -> f64 {
    x.powi(3)
}
fn quartic_in(x: f64) -> f64 {
    x.powi(4)
}
fn quintic_in(x: f64) -> f64 {
    x.powi(5)
}
fn sinus_in(x: f64) -> f64 {
    1.0 - (x * PI / 2.0).cos()
}
fn sinus_in_inv(x: f64) -> f64 {
    (1.0 - x).acos() * 2.0 / PI
}
fn circular_in(x: f64) -> f64 {
    1.0 - (1.0 - x * x).sqrt()
}
fn circular_in_inv(x: f64) -> f64 {
    (x * (2.0 - x)).sqrt()
}
fn exponential_in(x: f64, base: f64) -> f64 {
    (base.powf(x) - 1.0) / (base - 1.0)
}
fn exponential_in_inv(x: f64, base: f64) -> f64 {
    (x * (base - 1.0) + 1.0).log(base)
}

fn bounce_out(x: f64) -> f64 {
    const N1: f64 = 7.5625;
    const D1: f64 = 2.75;
    if x < 1.0 / D1 {
        N1 * x * x
    } else if x < 2.0 / D1 {
        let x = x - 1.5 / D1;
        N1 * x * x + 0.75
    } else if x < 2.5 / D1 {
        let x = x - 2.25 / D1;
        N1 * x * x + 0.9375
    } else {
        let x = x - 2.625 / D1;
        N1 * x * x + 0.984_375
    }
}
fn bounce_in(x: f64) -> f64 {
    1.0 - bounce_out(1.0 - x)
}

fn elastic_in(x: f64, amplitude: f64, period: f64) -> f64 {
    if x == 0.0 || x == 1.0 {
        return x;
    }
    let s = period / (2.0 * PI) * (1.0 / amplitude).asin();
    -(amplitude * 2f64.powf(10.0 * (x - 1.0)) * ((x - 1.0 - s) * 2.0 * PI / period).sin())
}

fn back_in(x: f64, s: f64) -> f64 {
    x * x * ((s + 1.0) * x - s)
}

fn poly_family_fn(family: Family) -> fn(f64) -> f64 {
    match family {
        Family::Quadratic => quadratic_in,
        Family::Cubic => cubic_in,
        Family::Quartic => quartic_in,
        Family::Quintic => quintic_in,
        _ => unreachable!("poly_family_fn called on non-polynomial family"),
    }
}

fn poly_degree(family: Family) -> f64 {
    match family {
        Family::Quadratic => 2.0,
        Family::Cubic => 3.0,
        Family::Quartic => 4.0,
        Family::Quintic => 5.0,
        _ => unreachable!(),
    }
}

impl Easing {
    #[must_use]
    pub const fn linear() -> Self {
        Self { family: Family::Linear, direction: Direction::In, args: Args::NONE }
    }

    /// Parses the string form (`family[_direction][:arg0,arg1]`) at the API
    /// boundary (spec §3.5); returns `None` on an unrecognized spelling
    /// rather than guessing.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        let (name, args_str) = s.split_once(':').map_or((s, None), |(n, a)| (n, Some(a)));
        let args = match args_str {
            Some(a) => {
                let mut parts = a.split(',');
                let a0 = parts.next().and_then(|p| p.parse().ok());
                let a1 = parts.next().and_then(|p| p.parse().ok());
                Args { a0, a1 }
            }
            None => Args::NONE,
        };

        let (family_str, direction) = if let Some(base) = name.strip_suffix("_in_out") {
            (base, Direction::InOut)
        } else if let Some(base) = name.strip_suffix("_out_in") {
            (base, Direction::OutIn)
        } else if let Some(base) = name.strip_suffix("_in") {
            (base, Direction::In)
        } else if let Some(base) = name.strip_suffix("_out") {
            (base, Direction::Out)
        } else {
            (name, Direction::In)
        };

        let family = match family_str {
            "linear" => Family::Linear,
            "quadratic" => Family::Quadratic,
            "cubic" => Family::Cubic,
            "quartic" => Family::Quartic,
            "quintic" => Family::Quintic,
            "sinus" => Family::Sinus,
            "circular" => Family::Circular,
            "exp" | "exponential" => Family::Exponential,
            "bounce" => Family::Bounce,
            "elastic" => Family::Elastic,
            "back" => Family::Back,
            _ => return None,
        };
        Some(Self { family, direction, args })
    }

    #[must_use]
    pub fn is_monotonic_with_inverse(self) -> bool {
        matches!(self.family, Family::Linear | Family::Quadratic | Family::Cubic | Family::Quartic | Family::Quintic | Family::Sinus | Family::Circular | Family::Exponential)
    }

    fn base_in(self, x: f64) -> f64 {
        match self.family {
            Family::Linear => x,
            Family::Quadratic | Family::Cubic | Family::Quartic | Family::Quintic => poly_family_fn(self.family)(x),
            Family::Sinus => sinus_in(x),
            Family::Circular => circular_in(x),
            Family::Exponential => exponential_in(x, self.args.a0.unwrap_or(DEFAULT_EXP_BASE)),
            Family::Bounce => bounce_in(x),
            Family::Elastic => elastic_in(x, self.args.a0.unwrap_or(DEFAULT_ELASTIC_AMPLITUDE), self.args.a1.unwrap_or(DEFAULT_ELASTIC_PERIOD)),
            Family::Back => back_in(x, self.args.a0.unwrap_or(DEFAULT_BACK_S)),
        }
    }

    fn base_in_inv(self, x: f64) -> f64 {
        match self.family {
            Family::Linear => x,
            Family::Quadratic | Family::Cubic | Family::Quartic | Family::Quintic => x.powf(1.0 / poly_degree(self.family)),
            Family::Sinus => sinus_in_inv(x),
            Family::Circular => circular_in_inv(x),
            Family::Exponential => exponential_in_inv(x, self.args.a0.unwrap_or(DEFAULT_EXP_BASE)),
            Family::Bounce | Family::Elastic | Family::Back => unreachable!("no inverse for this family"),
        }
    }

    /// `base_in`, but with `Family::Back`'s `s` argument scaled by
    /// [`BACK_COMPOUND_SCALE`] — the compound (`in_out`/`out_in`) variants'
    /// half-curves overshoot more than the plain `in`/`out` ones (spec
    /// §4.3), so they must not share `base_in`'s unscaled `s`.
    fn base_in_compound(self, x: f64) -> f64 {
        if self.family == Family::Back {
            let s = self.args.a0.unwrap_or(DEFAULT_BACK_S) * BACK_COMPOUND_SCALE;
            back_in(x, s)
        } else {
            self.base_in(x)
        }
    }

    /// Applies this easing to `x ∈ [0,1]` (spec §4.3).
    #[must_use]
    pub fn apply(self, x: f64) -> f64 {
        match self.direction {
            Direction::In => self.base_in(x),
            Direction::Out => 1.0 - self.base_in(1.0 - x),
            Direction::InOut => {
                if x < 0.5 {
                    self.base_in_compound(2.0 * x) / 2.0
                } else {
                    1.0 - self.base_in_compound(2.0 * (1.0 - x)) / 2.0
                }
            }
            Direction::OutIn => {
                if x < 0.5 {
                    (1.0 - self.base_in_compound(1.0 - 2.0 * x)) / 2.0
                } else {
                    0.5 + self.base_in_compound(2.0 * x - 1.0) / 2.0
                }
            }
        }
    }

    /// The inverse (resolution), for monotonic easings only (spec §4.3).
    #[must_use]
    pub fn invert(self, x: f64) -> Option<f64> {
        if !self.is_monotonic_with_inverse() {
            return None;
        }
        Some(match self.direction {
            Direction::In => self.base_in_inv(x),
            Direction::Out => 1.0 - self.base_in_inv(1.0 - x),
            Direction::InOut => {
                if x < 0.5 {
                    self.base_in_inv(2.0 * x) / 2.0
                } else {
                    1.0 - self.base_in_inv(2.0 * (1.0 - x)) / 2.0
                }
            }
            Direction::OutIn => {
                if x < 0.5 {
                    (1.0 - self.base_in_inv(1.0 - 2.0 * x)) / 2.0
                } else {
                    0.5 + self.base_in_inv(2.0 * x - 1.0) / 2.0
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MONOTONIC_NAMES: &[&str] = &[
        "linear", "quadratic_in", "quadratic_out", "cubic_in_out", "quartic_out_in", "quintic_in",
        "sinus_in", "circular_out", "exp_in",
    ];

    #[test]
    fn endpoints_are_fixed_for_most_families() {
        for name in MONOTONIC_NAMES {
            let e = Easing::parse(name).unwrap();
            assert!((e.apply(0.0)).abs() < 1e-9, "{name} f(0) != 0");
            assert!((e.apply(1.0) - 1.0).abs() < 1e-9, "{name} f(1) != 1");
        }
    }

    #[test]
    fn inverse_round_trips_within_tolerance() {
        for name in MONOTONIC_NAMES {
            let e = Easing::parse(name).unwrap();
            for i in 0..=100 {
                let x = f64::from(i) / 100.0;
                let y = e.apply(x);
                let back = e.invert(y).unwrap();
                assert!((back - x).abs() < 1e-6, "{name} round-trip failed at x={x}: got {back}");
            }
        }
    }

    #[test]
    fn bounce_and_elastic_have_no_inverse() {
        assert!(Easing::parse("bounce_in").unwrap().invert(0.5).is_none());
        assert!(Easing::parse("elastic_out").unwrap().invert(0.5).is_none());
    }

    #[test]
    fn exponential_default_base_matches_spec() {
        let e = Easing::parse("exp_in").unwrap();
        assert_eq!(e.args.a0, None);
        // with no explicit base, falls back to 1024 inside base_in/base_in_inv
        let y = e.apply(0.5);
        assert!((0.0..=1.0).contains(&y));
    }

    #[test]
    fn exponential_explicit_base_is_parsed() {
        let e = Easing::parse("exp_in:2").unwrap();
        assert_eq!(e.args.a0, Some(2.0));
    }

    #[test]
    fn unknown_family_is_rejected() {
        assert!(Easing::parse("not_a_family").is_none());
    }

    #[test]
    fn back_in_out_uses_scaled_s_not_plain_s() {
        let compound = Easing::parse("back_in_out").unwrap();
        // The first half of `in_out` at x=0.25 (-> base_in(0.5)/2) must use
        // `s * 1.525`, not the plain `s` a naive reuse of `apply`'s other
        // branches would produce.
        let got = compound.apply(0.25);
        let scaled_s = DEFAULT_BACK_S * BACK_COMPOUND_SCALE;
        let expected = back_in(0.5, scaled_s) / 2.0;
        let wrong_unscaled = back_in(0.5, DEFAULT_BACK_S) / 2.0;
        assert!((got - expected).abs() < 1e-12);
        assert!((got - wrong_unscaled).abs() > 1e-6);
    }
}
