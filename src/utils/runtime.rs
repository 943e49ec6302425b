use anyhow::Result;

/// Polling is strictly sequential, so a single thread is all that's needed.
pub fn single_thread_runtime() -> Result<tokio::runtime::Runtime> {
    Ok(tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?)
}
