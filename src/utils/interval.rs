use std::{fmt::Display, ops::Deref, str::FromStr, time::Duration};

use anyhow::anyhow;

/// Time between two runs of the watched command. Always positive.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct PollInterval(Duration);

impl PollInterval {
    pub fn from_secs_f64(seconds: f64) -> Option<PollInterval> {
        // Anything below a nanosecond rounds down to a zero duration.
        Duration::try_from_secs_f64(seconds)
            .ok()
            .filter(|duration| !duration.is_zero())
            .map(PollInterval)
    }
}

impl Default for PollInterval {
    fn default() -> Self {
        PollInterval(Duration::from_secs(1))
    }
}

impl Display for PollInterval {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.as_secs_f64())
    }
}

impl FromStr for PollInterval {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // Trailing "s" is allowed so that both 1.5 and 1.5s work.
        let seconds = s.trim_end_matches('s').parse::<f64>()?;
        PollInterval::from_secs_f64(seconds)
            .ok_or_else(|| anyhow!("Interval must be a positive number of seconds, got {s}"))
    }
}

impl Deref for PollInterval {
    type Target = Duration;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}
