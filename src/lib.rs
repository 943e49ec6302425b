//! Re-runs a shell command and follows the numbers in its output. Numbers are addressed by
//! position ("the 2nd number on line 3"), so any tool's output works without a dedicated parser.
//! `numwatch` prints the values and their rates of change, `numwatch-progress` turns a count and a
//! total into a KDE progress dialog.

pub mod cli;
pub mod extract;
pub mod poll;
pub mod progress;
pub mod rate;
pub mod utils;
