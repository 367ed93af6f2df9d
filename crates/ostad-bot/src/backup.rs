use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::Utc;
use sha2::{Digest, Sha256};
use tracing::{info, warn};

use ostad_types::update::OutgoingMessage;

use crate::AppState;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackupReport {
    pub path: PathBuf,
    pub size: u64,
    pub sha256: String,
}

const SNAPSHOT_PREFIX: &str = "ostadbank-";
const SNAPSHOT_SUFFIX: &str = ".db";

/// Background task that snapshots the database.
///
/// Runs on an interval, writes a fresh copy into `dir`, posts the file
/// name, size and checksum to the backup chat, then prunes everything
/// but the newest `keep` snapshots. Errors are logged and the loop
/// carries on.
pub async fn run_backup_loop(state: AppState, dir: PathBuf, every: Duration, keep: usize) {
    let mut interval = tokio::time::interval(every);
    // the first tick completes immediately
    interval.tick().await;

    loop {
        interval.tick().await;

        match backup_once(&state, &dir).await {
            Ok(report) => {
                info!(
                    "Backup: wrote {} ({} bytes, sha256 {})",
                    report.path.display(),
                    report.size,
                    report.sha256
                );
            }
            Err(e) => {
                warn!("Backup error: {:#}", e);
                continue;
            }
        }

        match prune_snapshots(&dir, keep).await {
            Ok(count) => {
                if count > 0 {
                    info!("Backup: pruned {} old snapshot(s)", count);
                }
            }
            Err(e) => {
                warn!("Backup prune error: {:#}", e);
            }
        }
    }
}

pub async fn backup_once(state: &AppState, dir: &Path) -> anyhow::Result<BackupReport> {
    tokio::fs::create_dir_all(dir).await?;
    let file_name = format!(
        "{SNAPSHOT_PREFIX}{}{SNAPSHOT_SUFFIX}",
        Utc::now().format("%Y%m%d-%H%M%S%.3f")
    );
    let path = dir.join(&file_name);

    let db = state.db.clone();
    let dest = path.clone();
    tokio::task::spawn_blocking(move || db.snapshot(&dest)).await??;

    let bytes = tokio::fs::read(&path).await?;
    let report = BackupReport {
        size: bytes.len() as u64,
        sha256: hex::encode(Sha256::digest(&bytes)),
        path,
    };

    let notice = state.texts.format(
        "backup_completed",
        &[
            ("file", &file_name),
            ("size", &report.size),
            ("sha256", &report.sha256),
        ],
    );
    if let Err(e) = state
        .messenger
        .send(state.config.backup_chat_id, OutgoingMessage::text(notice))
        .await
    {
        warn!("Backup notice could not be delivered: {}", e);
    }

    Ok(report)
}

/// Delete all but the newest `keep` snapshots in `dir`. Snapshot names
/// embed their timestamp, so name order is age order. Other files are
/// left alone.
pub async fn prune_snapshots(dir: &Path, keep: usize) -> anyhow::Result<usize> {
    let mut snapshots = Vec::new();
    let mut entries = tokio::fs::read_dir(dir).await?;
    while let Some(entry) = entries.next_entry().await? {
        let name = entry.file_name().to_string_lossy().into_owned();
        if name.starts_with(SNAPSHOT_PREFIX) && name.ends_with(SNAPSHOT_SUFFIX) {
            snapshots.push(name);
        }
    }
    if snapshots.len() <= keep {
        return Ok(0);
    }

    snapshots.sort();
    let stale = snapshots.len() - keep;
    for name in &snapshots[..stale] {
        tokio::fs::remove_file(dir.join(name)).await?;
    }
    Ok(stale)
}

#[cfg(test)]
mod tests {
    use ostad_db::Database;

    use super::*;
    use crate::testing::{BACKUP_CHAT, seed_registry, test_state};

    #[tokio::test]
    async fn snapshot_is_readable_and_announced() {
        let (state, messenger) = test_state();
        seed_registry(&state);
        let dir = std::env::temp_dir().join(format!("ostad-backup-{}", std::process::id()));

        let report = backup_once(&state, &dir).await.unwrap();

        let bytes = std::fs::read(&report.path).unwrap();
        assert_eq!(report.size, bytes.len() as u64);
        assert_eq!(report.sha256, hex::encode(Sha256::digest(&bytes)));
        assert_eq!(report.sha256.len(), 64);

        let copy = Database::open(&report.path).unwrap();
        let fields = copy.list_fields().unwrap();
        assert_eq!(fields[0].name, "Engineering");

        let notices = messenger.texts_to(BACKUP_CHAT);
        assert_eq!(notices.len(), 1);
        assert!(notices[0].contains(&report.sha256));

        drop(copy);
        std::fs::remove_dir_all(&dir).ok();
    }

    #[tokio::test]
    async fn unreachable_backup_chat_still_succeeds() {
        let (state, messenger) = test_state();
        messenger.make_unreachable(BACKUP_CHAT);
        let dir = std::env::temp_dir().join(format!("ostad-backup-muted-{}", std::process::id()));

        let report = backup_once(&state, &dir).await.unwrap();
        assert!(report.path.exists());

        std::fs::remove_dir_all(&dir).ok();
    }

    #[tokio::test]
    async fn pruning_keeps_newest_snapshots() {
        let dir = std::env::temp_dir().join(format!("ostad-backup-prune-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        for stamp in ["20260101-000000.000", "20260102-000000.000", "20260103-000000.000"] {
            std::fs::write(dir.join(format!("ostadbank-{stamp}.db")), b"x").unwrap();
        }
        std::fs::write(dir.join("notes.txt"), b"keep me").unwrap();

        assert_eq!(prune_snapshots(&dir, 2).await.unwrap(), 1);
        assert!(!dir.join("ostadbank-20260101-000000.000.db").exists());
        assert!(dir.join("ostadbank-20260102-000000.000.db").exists());
        assert!(dir.join("ostadbank-20260103-000000.000.db").exists());
        assert!(dir.join("notes.txt").exists());

        assert_eq!(prune_snapshots(&dir, 2).await.unwrap(), 0);
        std::fs::remove_dir_all(&dir).ok();
    }
}
