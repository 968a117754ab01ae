use thiserror::Error;

/// # Summary
/// 存储层错误枚举，处理文件读写、解析失败等问题。
///
/// # Invariants
/// - 必须通过 `thiserror` 派生 `Error` trait。
/// - `Write` 必须上抛给调用方，由调用方决定是否重试整个构建。
#[derive(Error, Debug)]
pub enum StoreError {
    /// 落盘文件无法解析或结构不符
    #[error("Corrupt file: {0}")]
    Corrupt(String),
    /// 原子替换失败 (磁盘已满、权限不足等)
    #[error("Write failure: {0}")]
    Write(String),
    /// 读取或目录操作失败
    #[error("IO error: {0}")]
    Io(String),
}
