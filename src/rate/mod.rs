//! Turns extracted values into readings: the current value plus, from the second observation on,
//! its rate of change per second.

pub mod format;
pub mod scale;

use std::{collections::HashMap, fmt::Display};

use format::format_number;
use scale::{autoscale, ScaleMode, Scaled};
use tracing::debug;

use crate::{
    extract::{ExtractedValue, FieldCache, FieldRef, MonitorSpec},
    utils::interval::PollInterval,
};

/// Rates keep at least this many fractional digits, even for integer values.
pub const MIN_RATE_PRECISION: usize = 1;

/// Change per second between two observations taken `interval` apart.
pub fn rate_per_second(current: f64, previous: f64, interval: PollInterval) -> f64 {
    (current - previous) / interval.as_secs_f64()
}

/// Last value seen for every field. Lives only as long as a single run.
#[derive(Debug, Default)]
pub struct PreviousValueTable {
    values: HashMap<FieldRef, f64>,
}

impl PreviousValueTable {
    pub fn get(&self, field: FieldRef) -> Option<f64> {
        self.values.get(&field).copied()
    }

    pub fn insert(&mut self, field: FieldRef, value: f64) {
        self.values.insert(field, value);
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct RateOptions {
    pub interval: PollInterval,
    pub scale: Option<ScaleMode>,
    pub grouping: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Rate {
    pub per_second: f64,
    pub scaled: Scaled,
    precision: usize,
}

impl Rate {
    pub fn new(per_second: f64, value_precision: usize, scale: Option<ScaleMode>) -> Self {
        let scaled = scale
            .map(|mode| autoscale(per_second, mode))
            .unwrap_or_else(|| Scaled::unscaled(per_second));
        Self {
            per_second,
            scaled,
            precision: scaled
                .precision
                .unwrap_or(value_precision.max(MIN_RATE_PRECISION)),
        }
    }

    pub fn precision(&self) -> usize {
        self.precision
    }
}

/// One output line: `label: value (rate)`.
#[derive(Debug, Clone, PartialEq)]
pub struct Reading {
    pub label: String,
    pub value: ExtractedValue,
    pub units: String,
    pub rate: Option<Rate>,
    pub grouping: bool,
}

impl Display for Reading {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}: {}{}",
            self.label,
            format_number(self.value.value, self.value.precision, self.grouping),
            self.units
        )?;
        if let Some(rate) = &self.rate {
            write!(
                f,
                " ({}{}{}/s)",
                format_number(rate.scaled.value, rate.precision(), self.grouping),
                rate.scaled.prefix,
                self.units
            )?;
        }
        Ok(())
    }
}

/// Follows a set of [MonitorSpec] across runs of a command. Given the output of one run it
/// produces the readings for that run and remembers the values for the next one.
pub struct Monitor {
    specs: Vec<MonitorSpec>,
    options: RateOptions,
    previous: PreviousValueTable,
}

impl Monitor {
    pub fn new(specs: Vec<MonitorSpec>, options: RateOptions) -> Self {
        Self {
            specs,
            options,
            previous: PreviousValueTable::default(),
        }
    }

    /// Specs whose field is missing from `output` produce no reading and keep their previous
    /// value. All rates are computed against the values from before this call, so two specs
    /// pointing at the same field see the same change.
    pub fn observe(&mut self, output: &str) -> Vec<Reading> {
        let mut fields = FieldCache::new(output);
        let mut seen = HashMap::new();
        let mut readings = Vec::with_capacity(self.specs.len());

        for spec in &self.specs {
            let Some(current) = fields.get(spec.field).cloned() else {
                debug!("No value at {} for {}", spec.field, spec.label);
                continue;
            };
            let rate = self.previous.get(spec.field).map(|previous| {
                Rate::new(
                    rate_per_second(current.value, previous, self.options.interval),
                    current.precision,
                    self.options.scale,
                )
            });
            seen.insert(spec.field, current.value);
            readings.push(Reading {
                label: spec.label.clone(),
                value: current,
                units: spec.units.clone(),
                rate,
                grouping: self.options.grouping,
            });
        }

        for (field, value) in seen {
            self.previous.insert(field, value);
        }
        readings
    }
}
