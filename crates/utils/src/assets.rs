use std::path::PathBuf;

use directories::ProjectDirs;

const PROJECT_ROOT: &str = env!("CARGO_MANIFEST_DIR");
pub const ASSET_DIR_ENV: &str = "BOARD_ASSET_DIR";

/// Directory holding the default SQLite file and the config file. Created on
/// first use.
pub fn asset_dir() -> std::io::Result<PathBuf> {
    let path = match std::env::var(ASSET_DIR_ENV) {
        Ok(dir) if !dir.trim().is_empty() => PathBuf::from(dir.trim()),
        _ if cfg!(debug_assertions) => PathBuf::from(PROJECT_ROOT).join("../../dev_assets"),
        _ => ProjectDirs::from("dev", "taskboard", "taskboard")
            .ok_or_else(|| {
                std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    "no home directory to store board data in",
                )
            })?
            .data_dir()
            .to_path_buf(),
    };

    if !path.exists() {
        std::fs::create_dir_all(&path)?;
    }
    Ok(path)
}

pub fn config_path() -> std::io::Result<PathBuf> {
    Ok(asset_dir()?.join("config.json"))
}

pub fn database_path() -> std::io::Result<PathBuf> {
    Ok(asset_dir()?.join("board.db"))
}
