use std::{fmt::Display, ops::Deref};

#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct Percentage(f64);

impl Display for Percentage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.1}%", self.0)
    }
}

impl Percentage {
    pub fn new_opt(value: f64) -> Option<Percentage> {
        if (0. ..=100.).contains(&value) {
            Some(Percentage(value))
        } else {
            None
        }
    }

    /// `part` out of `whole`, clamped to 0..=100. `None` when `whole` isn't positive.
    pub fn of(part: f64, whole: f64) -> Option<Percentage> {
        if whole > 0. && part.is_finite() {
            Percentage::new_opt((part / whole * 100.).clamp(0., 100.))
        } else {
            None
        }
    }

    /// Position of this percentage on a scale from 0 to `steps`.
    pub fn to_steps(self, steps: u32) -> u32 {
        (self.0 / 100. * steps as f64).round() as u32
    }
}

impl Deref for Percentage {
    type Target = f64;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}
