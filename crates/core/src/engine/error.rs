use crate::cache::error::CacheError;
use crate::store::error::StoreError;
use thiserror::Error;

/// # Summary
/// 快照构建域错误枚举。
///
/// # Invariants
/// - 行级数据问题在构建内部就地恢复，不会出现在此枚举中。
/// - 写入失败经由 `Store` 原样上抛，调用方可重试整个构建。
#[derive(Error, Debug)]
pub enum BuildError {
    // 快照或行情归档读写失败
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
    // 查询缓存失效或读写失败
    #[error("Cache error: {0}")]
    Cache(#[from] CacheError),
}
