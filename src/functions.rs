//! Benchmark objectives commonly used to exercise optimizers.
//!
//! Each function is available as a plain `fn(&[f64]) -> f64` and as a
//! ready-made [`Problem`] through [`Benchmark`], which carries the
//! conventional search domain for the function:
//!
//! ```
//! use swarmlab::functions::{self, Benchmark, BenchmarkKind};
//! use swarmlab::ops::{Problem, ProblemBounds};
//!
//! assert_eq!(functions::sphere(&[1.0, 2.0]), 5.0);
//!
//! let problem = Benchmark::new(BenchmarkKind::Ackley, 3).unwrap();
//! assert_eq!(problem.lower_bounds(), &[-32.768; 3]);
//! assert!(problem.evaluate(&[0.0; 3]).unwrap().abs() < 1e-12);
//! ```
//!
//! All of them are minimised at zero except [`styblinski_tang`], whose
//! minimum is about `-39.166` per coordinate.

use crate::ops::{validate_bound_arrays, Problem, ProblemBounds, ProblemError, ProblemResult};
use crate::util::full_array;
use std::f64::consts::{E, PI};

/// Sum of squares, `sum(x_i^2)`.
pub fn sphere(x: &[f64]) -> f64 {
    x.iter().map(|value| value * value).sum()
}

/// Rastrigin's highly multimodal function.
pub fn rastrigin(x: &[f64]) -> f64 {
    10.0 * len_f64(x)
        + x.iter()
            .map(|value| value * value - 10.0 * (2.0 * PI * value).cos())
            .sum::<f64>()
}

/// Ackley's function with `a = 20`, `b = 0.2`, `c = 2 pi`.
pub fn ackley(x: &[f64]) -> f64 {
    if x.is_empty() {
        return 0.0;
    }
    let n = len_f64(x);
    let squares = x.iter().map(|value| value * value).sum::<f64>() / n;
    let cosines = x.iter().map(|value| (2.0 * PI * value).cos()).sum::<f64>() / n;
    -20.0 * (-0.2 * squares.sqrt()).exp() - cosines.exp() + 20.0 + E
}

/// Rosenbrock's valley.
pub fn rosenbrock(x: &[f64]) -> f64 {
    x.windows(2)
        .map(|pair| {
            let (a, b) = (pair[0], pair[1]);
            100.0 * (b - a * a).powi(2) + (a - 1.0).powi(2)
        })
        .sum()
}

/// Griewank's function.
pub fn griewank(x: &[f64]) -> f64 {
    let sum = x.iter().map(|value| value * value / 4000.0).sum::<f64>();
    let product = x
        .iter()
        .enumerate()
        .map(|(idx, value)| (value / len_f64(&x[..=idx]).sqrt()).cos())
        .product::<f64>();
    sum - product + 1.0
}

/// Schwefel's function (2.26 variant, shifted so the minimum is near zero).
pub fn schwefel(x: &[f64]) -> f64 {
    418.9829 * len_f64(x)
        - x.iter()
            .map(|value| value * value.abs().sqrt().sin())
            .sum::<f64>()
}

/// Zakharov's function.
pub fn zakharov(x: &[f64]) -> f64 {
    let squares = sphere(x);
    let weighted = x
        .iter()
        .enumerate()
        .map(|(idx, value)| 0.5 * len_f64(&x[..=idx]) * value)
        .sum::<f64>();
    squares + weighted.powi(2) + weighted.powi(4)
}

/// Styblinski-Tang function.
pub fn styblinski_tang(x: &[f64]) -> f64 {
    0.5 * x
        .iter()
        .map(|value| value.powi(4) - 16.0 * value * value + 5.0 * value)
        .sum::<f64>()
}

/// Alpine N.1, `sum |x_i sin(x_i) + 0.1 x_i|`.
pub fn alpine(x: &[f64]) -> f64 {
    x.iter()
        .map(|value| (value * value.sin() + 0.1 * value).abs())
        .sum()
}

/// Weighted sphere, `sum i * x_i^2` with `i` starting at one.
pub fn sum_squares(x: &[f64]) -> f64 {
    x.iter()
        .enumerate()
        .map(|(idx, value)| len_f64(&x[..=idx]) * value * value)
        .sum()
}

/// Levy's function.
pub fn levy(x: &[f64]) -> f64 {
    let w: Vec<f64> = x.iter().map(|value| 1.0 + (value - 1.0) / 4.0).collect();
    let (Some(first), Some(last)) = (w.first(), w.last()) else {
        return 0.0;
    };
    let head = (PI * first).sin().powi(2);
    let body = w[..w.len() - 1]
        .iter()
        .map(|wi| (wi - 1.0).powi(2) * (1.0 + 10.0 * (PI * wi + 1.0).sin().powi(2)))
        .sum::<f64>();
    let tail = (last - 1.0).powi(2) * (1.0 + (2.0 * PI * last).sin().powi(2));
    head + body + tail
}

fn len_f64(x: &[f64]) -> f64 {
    #[allow(clippy::cast_precision_loss)]
    {
        x.len() as f64
    }
}

/// Identifies one of the built-in benchmark functions.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BenchmarkKind {
    /// [`sphere`]
    Sphere,
    /// [`rastrigin`]
    Rastrigin,
    /// [`ackley`]
    Ackley,
    /// [`rosenbrock`]
    Rosenbrock,
    /// [`griewank`]
    Griewank,
    /// [`schwefel`]
    Schwefel,
    /// [`zakharov`]
    Zakharov,
    /// [`styblinski_tang`]
    StyblinskiTang,
    /// [`alpine`]
    Alpine,
    /// [`sum_squares`]
    SumSquares,
    /// [`levy`]
    Levy,
}

impl BenchmarkKind {
    /// Every built-in benchmark.
    pub const ALL: [BenchmarkKind; 11] = [
        Self::Sphere,
        Self::Rastrigin,
        Self::Ackley,
        Self::Rosenbrock,
        Self::Griewank,
        Self::Schwefel,
        Self::Zakharov,
        Self::StyblinskiTang,
        Self::Alpine,
        Self::SumSquares,
        Self::Levy,
    ];

    /// Canonical name.
    #[must_use]
    pub fn name(self) -> &'static str {
        self.aliases()[0]
    }

    /// Canonical name followed by accepted aliases.
    #[must_use]
    pub fn aliases(self) -> &'static [&'static str] {
        match self {
            Self::Sphere => &["sphere"],
            Self::Rastrigin => &["rastrigin"],
            Self::Ackley => &["ackley"],
            Self::Rosenbrock => &["rosenbrock"],
            Self::Griewank => &["griewank"],
            Self::Schwefel => &["schwefel"],
            Self::Zakharov => &["zakharov"],
            Self::StyblinskiTang => &["styblinski_tang", "styblinskitang"],
            Self::Alpine => &["alpine", "alpine1"],
            Self::SumSquares => &["sum_squares", "sumsquares"],
            Self::Levy => &["levy"],
        }
    }

    /// Looks a benchmark up by name, ignoring case, `-` and `_`.
    ///
    /// # Examples
    /// ```
    /// use swarmlab::BenchmarkKind;
    /// assert_eq!(BenchmarkKind::from_name("Styblinski-Tang"), Some(BenchmarkKind::StyblinskiTang));
    /// assert_eq!(BenchmarkKind::from_name("nope"), None);
    /// ```
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        let wanted = normalize_name(name);
        Self::ALL.into_iter().find(|kind| {
            kind.aliases()
                .iter()
                .any(|alias| normalize_name(alias) == wanted)
        })
    }

    /// Conventional search domain `(lower, upper)`, the same on every
    /// coordinate.
    #[must_use]
    pub fn default_bounds(self) -> (f64, f64) {
        match self {
            Self::Sphere | Self::Rastrigin => (-5.12, 5.12),
            Self::Ackley => (-32.768, 32.768),
            Self::Rosenbrock => (-30.0, 30.0),
            Self::Griewank => (-100.0, 100.0),
            Self::Schwefel => (-500.0, 500.0),
            Self::Zakharov => (-5.0, 10.0),
            Self::StyblinskiTang => (-5.0, 5.0),
            Self::Alpine | Self::SumSquares | Self::Levy => (-10.0, 10.0),
        }
    }

    /// Evaluates the function.
    #[must_use]
    pub fn evaluate(self, x: &[f64]) -> f64 {
        match self {
            Self::Sphere => sphere(x),
            Self::Rastrigin => rastrigin(x),
            Self::Ackley => ackley(x),
            Self::Rosenbrock => rosenbrock(x),
            Self::Griewank => griewank(x),
            Self::Schwefel => schwefel(x),
            Self::Zakharov => zakharov(x),
            Self::StyblinskiTang => styblinski_tang(x),
            Self::Alpine => alpine(x),
            Self::SumSquares => sum_squares(x),
            Self::Levy => levy(x),
        }
    }
}

pub(crate) fn normalize_name(name: &str) -> String {
    name.chars()
        .filter(|c| !matches!(c, '_' | '-' | ' '))
        .flat_map(char::to_lowercase)
        .collect()
}

/// A built-in benchmark function bound to a dimension and a box.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct Benchmark {
    kind: BenchmarkKind,
    lower: Vec<f64>,
    upper: Vec<f64>,
}

impl Benchmark {
    /// Uses the benchmark's conventional domain.
    ///
    /// # Errors
    /// Returns [`ProblemError::ZeroDimension`] when `dimension` is zero.
    pub fn new(kind: BenchmarkKind, dimension: usize) -> ProblemResult<Self> {
        let (lower, upper) = kind.default_bounds();
        Self::with_bounds(kind, dimension, &[lower], &[upper])
    }

    /// Uses custom bounds; each list is tiled to `dimension` entries.
    ///
    /// # Errors
    /// Fails for a zero dimension, an empty bound list or `lower > upper`.
    pub fn with_bounds(
        kind: BenchmarkKind,
        dimension: usize,
        lower: &[f64],
        upper: &[f64],
    ) -> ProblemResult<Self> {
        if dimension == 0 {
            return Err(ProblemError::ZeroDimension);
        }
        let mismatch = ProblemError::BoundsLengthMismatch {
            expected: dimension,
            lower: lower.len(),
            upper: upper.len(),
        };
        let lower = full_array(lower, dimension).ok_or_else(|| mismatch.clone())?;
        let upper = full_array(upper, dimension).ok_or(mismatch)?;
        validate_bound_arrays(dimension, &lower, &upper)?;
        Ok(Self { kind, lower, upper })
    }

    /// Which function this is.
    #[must_use]
    pub fn kind(&self) -> BenchmarkKind {
        self.kind
    }
}

impl ProblemBounds for Benchmark {
    fn dimensions(&self) -> usize {
        self.lower.len()
    }

    fn lower_bounds(&self) -> &[f64] {
        &self.lower
    }

    fn upper_bounds(&self) -> &[f64] {
        &self.upper
    }
}

impl Problem for Benchmark {
    fn objective(&self, x: &[f64]) -> ProblemResult<f64> {
        Ok(self.kind.evaluate(x))
    }

    fn name(&self) -> &str {
        self.kind.name()
    }
}
