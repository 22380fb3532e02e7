//! Runs one download and reports progress.

use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use fastget_session::LocalSession;
use fastget_transfer::{SpeedCalculator, TransferOptions, calculate_file_checksum, fast_get};
use tokio_util::sync::CancellationToken;

use crate::config::Config;

/// Downloads `remote` to `local` using the session described by `config`.
pub async fn run(
    config: &Config,
    options: TransferOptions,
    remote: &str,
    local: &Path,
) -> anyhow::Result<()> {
    let session = LocalSession::new(&config.root, &config.home);
    let cancel = CancellationToken::new();

    let ctrl_c = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("interrupt received, cancelling transfer");
            ctrl_c.cancel();
        }
    });

    let speed = Arc::new(SpeedCalculator::default());
    let last_decile = Arc::new(AtomicU64::new(0));
    let options = options
        .with_cancel(cancel)
        .on_progress(move |p| {
            speed.add_sample(p.chunk_len);
            let decile = p.percentage() as u64 / 10;
            if decile > last_decile.swap(decile, Ordering::Relaxed) {
                tracing::info!(
                    transferred = p.transferred,
                    total = p.total,
                    percent = decile * 10,
                    bytes_per_sec = speed.bytes_per_second() as u64,
                    eta_secs = speed.eta(p.remaining()).map(|d| d.as_secs()),
                    "progress"
                );
            }
        });

    let result = fast_get(&session, remote, local, options).await?;

    let checksum = calculate_file_checksum(local)?;
    tracing::info!(
        bytes = result.bytes_transferred,
        written = result.bytes_written,
        elapsed_ms = result.elapsed.as_millis() as u64,
        sha256 = %checksum,
        "download complete"
    );
    Ok(())
}
