//! Animation curves.
//!
//! Cubic-bezier curves map a normalized time fraction onto a progress
//! fraction. Interpolating springs integrate a damped harmonic oscillator in
//! closed form; their duration is derived from the spring itself via
//! [`Curve::settle_duration_ms`].

use serde::{Deserialize, Serialize};

use crate::{CoreError, CoreResult};

/// Residual displacement at which a spring counts as settled.
const SPRING_REST_THRESHOLD: f32 = 1e-3;

/// Upper bound for a derived spring duration.
const MAX_SPRING_DURATION_MS: u32 = 10_000;
const MAX_SPRING_SECONDS: f32 = 10.0;

const NEWTON_ITERATIONS: usize = 8;
const BISECTION_ITERATIONS: usize = 32;
const SOLVE_EPSILON: f32 = 1e-6;

/// An easing curve.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Curve {
    /// Identity.
    #[default]
    Linear,
    /// `cubic-bezier(0.33, 0, 0.67, 1)`.
    Sharp,
    /// `cubic-bezier(0.2, 0, 0.2, 1)`: fast start, long gentle tail.
    Friction,
    /// A CSS-style cubic bezier through `(0,0)`, `(x1,y1)`, `(x2,y2)`, `(1,1)`.
    CubicBezier {
        /// First control point x.
        x1: f32,
        /// First control point y.
        y1: f32,
        /// Second control point x.
        x2: f32,
        /// Second control point y.
        y2: f32,
    },
    /// A physical spring released towards its target.
    ///
    /// A non-positive mass or stiffness has no physical solution and falls
    /// back to [`Curve::Friction`].
    InterpolatingSpring {
        /// Initial velocity towards the target, in target units per second.
        velocity: f32,
        /// Mass.
        mass: f32,
        /// Stiffness.
        stiffness: f32,
        /// Damping coefficient.
        damping: f32,
    },
}

impl Curve {
    /// Shorthand for [`Curve::InterpolatingSpring`].
    #[must_use]
    pub const fn spring(velocity: f32, mass: f32, stiffness: f32, damping: f32) -> Self {
        Self::InterpolatingSpring {
            velocity,
            mass,
            stiffness,
            damping,
        }
    }

    /// Parse a curve name: `linear`, `sharp`, `friction`,
    /// `cubic-bezier(x1, y1, x2, y2)` or
    /// `interpolating-spring(velocity, mass, stiffness, damping)`.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidCurve`] for unknown names or malformed
    /// argument lists.
    pub fn from_name(name: &str) -> CoreResult<Self> {
        let name = name.trim();
        match name.to_lowercase().as_str() {
            "linear" => return Ok(Self::Linear),
            "sharp" => return Ok(Self::Sharp),
            "friction" => return Ok(Self::Friction),
            _ => {}
        }

        let (func, args) = name
            .strip_suffix(')')
            .and_then(|s| s.split_once('('))
            .ok_or_else(|| CoreError::InvalidCurve(name.to_string()))?;
        let values = args
            .split(',')
            .map(|v| v.trim().parse::<f32>())
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| CoreError::InvalidCurve(format!("{name}: {e}")))?;
        let &[a, b, c, d] = values.as_slice() else {
            return Err(CoreError::InvalidCurve(format!(
                "{name}: expected 4 arguments, got {}",
                values.len()
            )));
        };

        match func.trim() {
            "cubic-bezier" => Ok(Self::CubicBezier {
                x1: a,
                y1: b,
                x2: c,
                y2: d,
            }),
            "interpolating-spring" => Ok(Self::spring(a, b, c, d)),
            other => Err(CoreError::InvalidCurve(format!("unknown curve {other}"))),
        }
    }

    /// Whether the duration of this curve comes from its own physics.
    #[must_use]
    pub fn is_spring(&self) -> bool {
        self.physical_spring().is_some()
    }

    /// Map normalized time `t` (clamped to `[0, 1]`) to progress.
    ///
    /// Springs may overshoot past `1.0` before settling; `t >= 1` is always
    /// exactly `1.0`.
    #[must_use]
    pub fn transform(&self, t: f32) -> f32 {
        let t = t.clamp(0.0, 1.0);
        if t >= 1.0 {
            return 1.0;
        }
        match *self {
            Self::Linear => t,
            Self::Sharp => cubic_bezier(0.33, 0.0, 0.67, 1.0, t),
            Self::Friction => cubic_bezier(0.2, 0.0, 0.2, 1.0, t),
            Self::CubicBezier { x1, y1, x2, y2 } => cubic_bezier(x1, y1, x2, y2, t),
            Self::InterpolatingSpring { .. } => match self.physical_spring() {
                Some(spring) => spring.value_at(t * spring.settle_seconds()),
                None => Self::Friction.transform(t),
            },
        }
    }

    /// Time a spring needs to come to rest, or `None` for time-based curves.
    #[must_use]
    pub fn settle_duration_ms(&self) -> Option<u32> {
        self.physical_spring().map(|spring| {
            #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
            let ms = (spring.settle_seconds() * 1000.0).ceil() as u32;
            ms.clamp(1, MAX_SPRING_DURATION_MS)
        })
    }

    fn physical_spring(&self) -> Option<Spring> {
        match *self {
            Self::InterpolatingSpring {
                velocity,
                mass,
                stiffness,
                damping,
            } if mass > 0.0 && stiffness > 0.0 && damping >= 0.0 => Some(Spring {
                velocity,
                omega: (stiffness / mass).sqrt(),
                zeta: damping / (2.0 * (stiffness * mass).sqrt()),
            }),
            _ => None,
        }
    }
}

/// Closed-form damped spring, normalized to move from 0 to 1.
#[derive(Debug, Clone, Copy)]
struct Spring {
    velocity: f32,
    omega: f32,
    zeta: f32,
}

impl Spring {
    /// Progress at physical time `secs`.
    fn value_at(self, secs: f32) -> f32 {
        let Self {
            velocity,
            omega,
            zeta,
        } = self;
        let displacement = if zeta < 1.0 {
            let damped = omega * (1.0 - zeta * zeta).sqrt();
            let b = (zeta * omega - velocity) / damped;
            (-zeta * omega * secs).exp() * ((damped * secs).cos() + b * (damped * secs).sin())
        } else if (zeta - 1.0).abs() < f32::EPSILON {
            (1.0 + (omega - velocity) * secs) * (-omega * secs).exp()
        } else {
            let root = (zeta * zeta - 1.0).sqrt();
            let r1 = -omega * (zeta - root);
            let r2 = -omega * (zeta + root);
            let a = (-velocity - r2) / (r1 - r2);
            a * (r1 * secs).exp() + (1.0 - a) * (r2 * secs).exp()
        };
        1.0 - displacement
    }

    /// Seconds until the decay envelope falls under the rest threshold.
    fn settle_seconds(self) -> f32 {
        let decay = if self.zeta <= 1.0 {
            self.zeta * self.omega
        } else {
            self.omega * (self.zeta - (self.zeta * self.zeta - 1.0).sqrt())
        };
        if decay <= 0.0 {
            return MAX_SPRING_SECONDS;
        }
        (1.0 / SPRING_REST_THRESHOLD).ln() / decay
    }
}

/// Evaluate a unit cubic bezier at time fraction `t`.
fn cubic_bezier(x1: f32, y1: f32, x2: f32, y2: f32, t: f32) -> f32 {
    let s = solve_curve_x(x1, x2, t);
    bezier_component(y1, y2, s)
}

fn bezier_component(p1: f32, p2: f32, s: f32) -> f32 {
    let inv = 1.0 - s;
    3.0 * inv * inv * s * p1 + 3.0 * inv * s * s * p2 + s * s * s
}

fn bezier_derivative(p1: f32, p2: f32, s: f32) -> f32 {
    let inv = 1.0 - s;
    3.0 * inv * inv * p1 + 6.0 * inv * s * (p2 - p1) + 3.0 * s * s * (1.0 - p2)
}

/// Find the curve parameter whose x equals `x`.
fn solve_curve_x(x1: f32, x2: f32, x: f32) -> f32 {
    let mut s = x;
    for _ in 0..NEWTON_ITERATIONS {
        let err = bezier_component(x1, x2, s) - x;
        if err.abs() < SOLVE_EPSILON {
            return s;
        }
        let slope = bezier_derivative(x1, x2, s);
        if slope.abs() < SOLVE_EPSILON {
            break;
        }
        s -= err / slope;
    }

    let (mut lo, mut hi) = (0.0_f32, 1.0_f32);
    s = x;
    for _ in 0..BISECTION_ITERATIONS {
        let value = bezier_component(x1, x2, s);
        if (value - x).abs() < SOLVE_EPSILON {
            break;
        }
        if value < x {
            lo = s;
        } else {
            hi = s;
        }
        s = (lo + hi) * 0.5;
    }
    s
}
