use std::path::PathBuf;

#[derive(Debug, Clone)]
pub enum AppEvent {
    PlayShow,
    PlayHide,
    SetOwnerSource(Option<PathBuf>),
    OwnerAvatarLoaded {
        generation: u64,
        result: Result<Vec<u8>, String>,
    },
    ConfigReload,
}
