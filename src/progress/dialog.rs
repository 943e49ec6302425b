use anyhow::Result;
use async_trait::async_trait;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DialogStatus {
    Alive,
    /// The dialog was closed by the user or its service disappeared.
    Gone,
}

/// A progress bar living outside of this process.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ProgressDialog: Send {
    /// Moves the bar to `value`, which ranges from 0 to the dialog's step count.
    async fn set_value(&mut self, value: u32) -> Result<DialogStatus>;

    /// Whether the dialog closes itself once the bar is full.
    async fn set_auto_close(&mut self, auto_close: bool) -> Result<DialogStatus>;

    async fn is_alive(&mut self) -> bool;

    async fn close(&mut self) -> Result<()>;
}
