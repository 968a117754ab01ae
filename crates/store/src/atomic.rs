use limitboard_core::store::error::StoreError;
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use tracing::debug;

/// 目标文件所在目录；裸文件名时为当前目录。
pub(crate) fn parent_dir(path: &Path) -> PathBuf {
    match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

/// # Summary
/// 先写临时文件、再原子 rename 覆盖目标文件。
///
/// # Logic
/// 1. 确保目标目录存在。
/// 2. 在同目录下创建临时文件（保证 rename 不跨文件系统）。
/// 3. 由 `write` 回调写入内容，随后 fsync。
/// 4. `persist` 一次性替换目标文件；任一步失败时临时文件随 Drop 删除，目标文件不受影响。
///
/// # Arguments
/// * `path`: 目标文件路径。
/// * `write`: 向临时文件写入完整内容的回调。
///
/// # Returns
/// 成功返回 Ok，任何失败均返回 `StoreError::Write`。
pub(crate) fn write_atomic<F>(path: &Path, write: F) -> Result<(), StoreError>
where
    F: FnOnce(&mut File) -> Result<(), StoreError>,
{
    let dir = parent_dir(path);
    fs::create_dir_all(&dir)
        .map_err(|e| StoreError::Write(format!("create dir {}: {}", dir.display(), e)))?;

    let mut tmp = tempfile::Builder::new()
        .prefix(".limitboard-")
        .suffix(".tmp")
        .tempfile_in(&dir)
        .map_err(|e| StoreError::Write(format!("create temp file in {}: {}", dir.display(), e)))?;

    write(tmp.as_file_mut())?;

    tmp.as_file()
        .sync_all()
        .map_err(|e| StoreError::Write(format!("sync temp file: {}", e)))?;

    let tmp_path = tmp.path().to_path_buf();
    tmp.persist(path)
        .map_err(|e| StoreError::Write(format!("rename into {}: {}", path.display(), e.error)))?;
    debug!("Atomically replaced {} via {}", path.display(), tmp_path.display());
    Ok(())
}
