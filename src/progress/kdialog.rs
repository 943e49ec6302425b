use std::process::Stdio;

use anyhow::{anyhow, bail, Context, Result};
use async_trait::async_trait;
use tokio::process::Command;
use tracing::{debug, info};

use super::dialog::{DialogStatus, ProgressDialog};

/// KDE progress bar. `kdialog --progressbar` detaches right away and prints the D-Bus address of
/// the dialog, which is then driven through `qdbus`.
pub struct KDialog {
    service: String,
    path: String,
}

/// Splits `org.kde.kdialog-1234 /ProgressDialog` into service and object path.
fn parse_dbus_reference(reference: &str) -> Result<(String, String)> {
    let mut parts = reference.split_whitespace();
    match (parts.next(), parts.next()) {
        (Some(service), Some(path)) if path.starts_with('/') => {
            Ok((service.to_string(), path.to_string()))
        }
        _ => Err(anyhow!(
            "Unexpected D-Bus reference from kdialog: \"{}\"",
            reference.trim()
        )),
    }
}

impl KDialog {
    pub async fn open(message: &str, steps: u32) -> Result<Self> {
        let output = Command::new("kdialog")
            .arg("--progressbar")
            .arg(message)
            .arg(steps.to_string())
            .stdin(Stdio::null())
            .output()
            .await
            .context("Failed to start kdialog")?;
        if !output.status.success() {
            bail!(
                "kdialog exited with {}: {}",
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            );
        }
        let (service, path) = parse_dbus_reference(&String::from_utf8_lossy(&output.stdout))?;
        info!("Opened progress dialog {service} {path}");
        Ok(Self { service, path })
    }

    async fn qdbus(&self, args: &[&str]) -> Result<DialogStatus> {
        let output = Command::new("qdbus")
            .arg(&self.service)
            .arg(&self.path)
            .args(args)
            .stdin(Stdio::null())
            .output()
            .await
            .context("Failed to run qdbus")?;
        if output.status.success() {
            Ok(DialogStatus::Alive)
        } else {
            // Typically "Service ... does not exist", the dialog was closed.
            debug!(
                "qdbus {args:?} failed: {}",
                String::from_utf8_lossy(&output.stderr).trim()
            );
            Ok(DialogStatus::Gone)
        }
    }
}

#[async_trait]
impl ProgressDialog for KDialog {
    async fn set_value(&mut self, value: u32) -> Result<DialogStatus> {
        self.qdbus(&["Set", "", "value", &value.to_string()]).await
    }

    async fn set_auto_close(&mut self, auto_close: bool) -> Result<DialogStatus> {
        self.qdbus(&["Set", "", "autoClose", &auto_close.to_string()]).await
    }

    async fn is_alive(&mut self) -> bool {
        matches!(self.qdbus(&[]).await, Ok(DialogStatus::Alive))
    }

    async fn close(&mut self) -> Result<()> {
        self.qdbus(&["close"]).await?;
        Ok(())
    }
}
