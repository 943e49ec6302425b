use std::{fmt::Display, num::NonZeroUsize, str::FromStr};

use anyhow::{anyhow, Context};

/// Position of a number in command output. Both indices start at 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FieldRef {
    pub line: NonZeroUsize,
    /// Which numeric occurrence on the line, counted left to right.
    pub field: NonZeroUsize,
}

impl Display for FieldRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.line, self.field)
    }
}

fn parse_index(s: &str, name: &str) -> anyhow::Result<NonZeroUsize> {
    s.parse::<NonZeroUsize>()
        .with_context(|| format!("{name} must be a positive integer, got \"{s}\""))
}

impl FromStr for FieldRef {
    type Err = anyhow::Error;

    /// Parses `line:field`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (line, field) = s
            .split_once(':')
            .ok_or_else(|| anyhow!("Expected line:field, got \"{s}\""))?;
        Ok(FieldRef {
            line: parse_index(line, "line")?,
            field: parse_index(field, "field")?,
        })
    }
}

/// A single number to follow across runs of the command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonitorSpec {
    pub label: String,
    pub field: FieldRef,
    pub units: String,
}

impl FromStr for MonitorSpec {
    type Err = anyhow::Error;

    /// Parses `label:line:field[:units]`. Units are everything after the third colon.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.splitn(4, ':');
        let (Some(label), Some(line), Some(field)) = (parts.next(), parts.next(), parts.next())
        else {
            return Err(anyhow!("Expected label:line:field[:units], got \"{s}\""));
        };
        Ok(MonitorSpec {
            label: label.to_string(),
            field: FieldRef {
                line: parse_index(line, "line")?,
                field: parse_index(field, "field")?,
            },
            units: parts.next().unwrap_or_default().to_string(),
        })
    }
}

#[cfg(test)]
mod monitor_spec_tests {
    use super::{FieldRef, MonitorSpec};

    #[test]
    fn parse_full_spec() {
        let spec: MonitorSpec = "rx:3:2:B".parse().unwrap();
        assert_eq!(spec.label, "rx");
        assert_eq!(spec.field.line.get(), 3);
        assert_eq!(spec.field.field.get(), 2);
        assert_eq!(spec.units, "B");
    }

    #[test]
    fn units_are_optional_and_may_contain_colons() {
        let spec: MonitorSpec = "load:1:1".parse().unwrap();
        assert_eq!(spec.units, "");
        let spec: MonitorSpec = "t:1:1:a:b".parse().unwrap();
        assert_eq!(spec.units, "a:b");
    }

    #[test]
    fn rejects_bad_specs() {
        assert!("rx:3".parse::<MonitorSpec>().is_err());
        assert!("rx:0:1".parse::<MonitorSpec>().is_err());
        assert!("rx:1:-2".parse::<MonitorSpec>().is_err());
        assert!("rx:a:1".parse::<MonitorSpec>().is_err());
    }

    #[test]
    fn parse_field_ref() {
        let field: FieldRef = "2:5".parse().unwrap();
        assert_eq!(field.to_string(), "2:5");
        assert!("2".parse::<FieldRef>().is_err());
        assert!("2:0".parse::<FieldRef>().is_err());
    }
}
