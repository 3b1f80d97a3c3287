use crate::events::AppEvent;
use anyhow::Context as _;
use async_channel::{Receiver, Sender};
use std::path::{Path, PathBuf};

/// A request to read the owner avatar's bytes off the UI thread. The
/// generation travels with the result so stale completions can be dropped
/// after the source changed mid-flight.
#[derive(Debug, Clone)]
pub struct FetchRequest {
    pub generation: u64,
    pub source: PathBuf,
}

pub async fn run_fetcher(requests: Receiver<FetchRequest>, tx: Sender<AppEvent>) {
    while let Ok(request) = requests.recv().await {
        let result = read_source(&request.source).await.map_err(|e| {
            log::warn!("Owner avatar fetch failed: {:#}", e);
            format!("{e:#}")
        });

        let event = AppEvent::OwnerAvatarLoaded {
            generation: request.generation,
            result,
        };
        if tx.send(event).await.is_err() {
            break;
        }
    }
}

async fn read_source(source: &Path) -> anyhow::Result<Vec<u8>> {
    tokio::fs::read(source)
        .await
        .with_context(|| format!("reading {}", source.display()))
}
