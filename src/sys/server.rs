use crate::events::AppEvent;
use async_channel::Sender;
use std::path::PathBuf;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::net::UnixListener;

const SOCKET_PATH: &str = "/tmp/orrery.sock";

/// Line protocol for external drivers: `show`, `hide`, `owner <path>` to
/// set the center avatar, bare `owner` to clear it.
pub async fn run_server(tx: Sender<AppEvent>) {
    // Cleanup old socket if it exists
    if std::fs::metadata(SOCKET_PATH).is_ok() {
        let _ = std::fs::remove_file(SOCKET_PATH);
    }

    let listener = match UnixListener::bind(SOCKET_PATH) {
        Ok(l) => l,
        Err(e) => {
            log::error!("Failed to bind unix socket: {}", e);
            return;
        }
    };

    loop {
        match listener.accept().await {
            Ok((mut stream, _)) => {
                let tx = tx.clone();
                tokio::spawn(async move {
                    let reader = BufReader::new(&mut stream);
                    let mut lines = reader.lines();

                    while let Ok(Some(line)) = lines.next_line().await {
                        if let Some(event) = parse_command(line.trim())
                            && tx.send(event).await.is_err()
                        {
                            break;
                        }
                    }
                });
            }
            Err(e) => {
                log::error!("Failed to accept connection: {}", e);
            }
        }
    }
}

fn parse_command(line: &str) -> Option<AppEvent> {
    match line {
        "show" => Some(AppEvent::PlayShow),
        "hide" => Some(AppEvent::PlayHide),
        "owner" => Some(AppEvent::SetOwnerSource(None)),
        _ => line.strip_prefix("owner ").map(|path| {
            AppEvent::SetOwnerSource(Some(PathBuf::from(path.trim())))
        }),
    }
}
