use std::{fmt::Display, str::FromStr};

use anyhow::anyhow;

/// Precision used for every value that was moved to a prefix other than the empty one.
pub const SCALED_PRECISION: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScaleMode {
    /// Steps of 1000: k, M, G... and m, µ, n... below 1.
    Decimal,
    /// Steps of 1024: ki, Mi, Gi... Nothing below 1.
    Binary,
}

impl ScaleMode {
    const NAMES: [(&'static str, ScaleMode); 2] =
        [("decimal", ScaleMode::Decimal), ("binary", ScaleMode::Binary)];

    fn table(self) -> &'static PrefixTable {
        match self {
            ScaleMode::Decimal => &DECIMAL,
            ScaleMode::Binary => &BINARY,
        }
    }
}

impl Display for ScaleMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ScaleMode::Decimal => write!(f, "decimal"),
            ScaleMode::Binary => write!(f, "binary"),
        }
    }
}

impl FromStr for ScaleMode {
    type Err = anyhow::Error;

    /// Accepts any case-insensitive prefix that names exactly one mode, so "d", "Bin" and
    /// "decimal" all work.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lowered = s.to_lowercase();
        let mut matching = ScaleMode::NAMES
            .iter()
            .filter(|(name, _)| name.starts_with(&lowered));
        match (matching.next(), matching.next()) {
            (Some((_, mode)), None) => Ok(*mode),
            (Some(_), Some(_)) => Err(anyhow!(
                "Scale mode \"{s}\" is ambiguous, use decimal or binary"
            )),
            (None, _) => Err(anyhow!(
                "Unknown scale mode \"{s}\", use decimal or binary"
            )),
        }
    }
}

struct PrefixTable {
    base: f64,
    /// Exponent of the first entry in `prefixes`.
    min_exponent: i32,
    prefixes: &'static [&'static str],
}

impl PrefixTable {
    fn max_exponent(&self) -> i32 {
        self.min_exponent + self.prefixes.len() as i32 - 1
    }

    fn prefix(&self, exponent: i32) -> Option<&'static str> {
        let index = usize::try_from(exponent - self.min_exponent).ok()?;
        self.prefixes.get(index).copied()
    }
}

const DECIMAL: PrefixTable = PrefixTable {
    base: 1000.,
    min_exponent: -8,
    prefixes: &[
        "y", "z", "a", "f", "p", "n", "µ", "m", "", "k", "M", "G", "T", "P", "E", "Z", "Y",
    ],
};

const BINARY: PrefixTable = PrefixTable {
    base: 1024.,
    min_exponent: 0,
    prefixes: &["", "ki", "Mi", "Gi", "Ti", "Pi", "Ei", "Zi", "Yi"],
};

/// A value after autoscaling.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Scaled {
    pub value: f64,
    pub prefix: &'static str,
    /// `None` when the value was left as is and should be shown with its usual precision.
    pub precision: Option<usize>,
}

impl Scaled {
    pub fn unscaled(value: f64) -> Self {
        Self {
            value,
            prefix: "",
            precision: None,
        }
    }
}

/// Largest exponent `e` such that `magnitude / base^e` lands in `[1, base)`.
fn magnitude_exponent(magnitude: f64, base: f64) -> i32 {
    let mut exponent = (magnitude.ln() / base.ln()).floor() as i32;
    // The logarithm can be off by one ulp around exact powers.
    if base.powi(exponent) > magnitude {
        exponent -= 1;
    } else if base.powi(exponent + 1) <= magnitude {
        exponent += 1;
    }
    exponent
}

/// Moves `value` to the largest prefix for which its magnitude is at least 1.
///
/// Exponents above the table are clamped to its largest prefix. Exponents below the table, which
/// includes every fraction in binary mode, are left unscaled.
pub fn autoscale(value: f64, mode: ScaleMode) -> Scaled {
    if value == 0. || !value.is_finite() {
        return Scaled::unscaled(value);
    }
    let table = mode.table();
    let magnitude = value.abs();
    let exponent = magnitude_exponent(magnitude, table.base).min(table.max_exponent());
    if exponent == 0 {
        return Scaled::unscaled(value);
    }
    let Some(prefix) = table.prefix(exponent) else {
        return Scaled::unscaled(value);
    };
    Scaled {
        value: (magnitude / table.base.powi(exponent)).copysign(value),
        prefix,
        precision: Some(SCALED_PRECISION),
    }
}
