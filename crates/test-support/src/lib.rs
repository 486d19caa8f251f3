use tempfile::TempDir;

/// A fresh on-disk SQLite url. Keep the directory alive for as long as the
/// database is in use; it is removed on drop.
pub fn temp_sqlite_url() -> (TempDir, String) {
    let dir = tempfile::tempdir().expect("create temp dir");
    let url = format!("sqlite://{}", dir.path().join("board.db").display());
    (dir, url)
}

pub fn temp_dir() -> TempDir {
    tempfile::tempdir().expect("create temp dir")
}
