use std::{fmt::Display, path::PathBuf, str::FromStr};

use anyhow::{anyhow, Context};
use sysinfo::{Pid, ProcessStatus, ProcessesToUpdate, System};

/// Decides whether polling should go on. Consulted before every cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LivenessCheck {
    /// Keep going while the file exists.
    File(PathBuf),
    /// Keep going while the process is running.
    Process(u32),
}

impl LivenessCheck {
    pub fn is_alive(&self) -> bool {
        match self {
            LivenessCheck::File(path) => path.exists(),
            LivenessCheck::Process(pid) => process_exists(*pid),
        }
    }
}

/// Zombies are counted as dead, they only wait for their parent to collect them.
pub fn process_exists(pid: u32) -> bool {
    let pid = Pid::from_u32(pid);
    let mut system = System::new();
    system.refresh_processes(ProcessesToUpdate::Some(&[pid]), true);
    system
        .process(pid)
        .is_some_and(|process| process.status() != ProcessStatus::Zombie)
}

impl Display for LivenessCheck {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LivenessCheck::File(path) => write!(f, "file:{}", path.display()),
            LivenessCheck::Process(pid) => write!(f, "pid:{pid}"),
        }
    }
}

impl FromStr for LivenessCheck {
    type Err = anyhow::Error;

    /// Parses `file:<path>` or `pid:<number>`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once(':') {
            Some(("file", path)) if !path.is_empty() => Ok(LivenessCheck::File(path.into())),
            Some(("pid", pid)) => Ok(LivenessCheck::Process(
                pid.parse()
                    .with_context(|| format!("Invalid process id \"{pid}\""))?,
            )),
            _ => Err(anyhow!("Expected file:<path> or pid:<number>, got \"{s}\"")),
        }
    }
}
