use super::error::StoreError;
use crate::market::entity::{DailyBar, Snapshot};
use std::path::PathBuf;

/// # Summary
/// 派生状态快照的持久化接口。
///
/// # Invariants
/// - 写入必须是原子替换：在替换提交之前，旧快照始终完整可读。
/// - 实现者不得在写入失败时破坏旧快照。
pub trait SnapshotStore: Send + Sync {
    /// # Summary
    /// 读取当前快照。
    ///
    /// # Logic
    /// 1. 文件不存在时返回 `Ok(None)`。
    /// 2. 文件无法解析或结构不符时返回 `StoreError::Corrupt`。
    ///
    /// # Returns
    /// 存在则返回快照，否则返回 None。
    fn load(&self) -> Result<Option<Snapshot>, StoreError>;

    /// # Summary
    /// 以原子替换的方式提交新快照。
    ///
    /// # Logic
    /// 1. 写入同目录下的临时文件并刷盘。
    /// 2. 通过 rename 一次性替换目标文件。
    ///
    /// # Arguments
    /// * `snapshot`: 待提交的完整快照。
    ///
    /// # Returns
    /// 成功返回 Ok，失败返回 `StoreError::Write`，旧快照保持不变。
    fn commit(&self, snapshot: &Snapshot) -> Result<(), StoreError>;

    /// # Summary
    /// 将损坏的快照文件移至旁路，供事后排查。
    ///
    /// # Returns
    /// 返回隔离后的文件路径；文件不存在时返回 None。
    fn quarantine(&self) -> Result<Option<PathBuf>, StoreError>;
}

/// # Summary
/// 原始日 K 线归档接口，是全量重建的唯一数据来源。
///
/// # Invariants
/// - 以 (`symbol`, `trade_date`) 为键，重复写入同一键时以新数据为准。
pub trait BarStore: Send + Sync {
    /// # Summary
    /// 读取全部归档的原始行情。
    ///
    /// # Logic
    /// 1. 归档不存在时返回空列表。
    /// 2. 缺失价格或成交量的行记录告警后跳过。
    ///
    /// # Returns
    /// 返回无序的原始行情列表。
    fn load_bars(&self) -> Result<Vec<DailyBar>, StoreError>;

    /// # Summary
    /// 将新抓取的行情按键合并进归档。
    ///
    /// # Arguments
    /// * `bars`: 新行情，顺序任意。
    ///
    /// # Returns
    /// 操作结果。
    fn upsert_bars(&self, bars: &[DailyBar]) -> Result<(), StoreError>;
}
