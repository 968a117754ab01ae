use crate::builder::{SnapshotBuilder, ingest};
use crate::sentiment::{DailyMarketStats, daily_market_stats};
use chrono::NaiveDate;
use limitboard_core::cache::port::{Cache, CacheExt};
use limitboard_core::common::normalize_code;
use limitboard_core::engine::error::BuildError;
use limitboard_core::market::entity::{DailyBar, DerivedState, Snapshot};
use limitboard_core::store::error::StoreError;
use limitboard_core::store::port::{BarStore, SnapshotStore};
use std::sync::{Arc, PoisonError, RwLock};
use tracing::{debug, info, warn};

/// # Summary
/// 快照服务，系统的应用服务层门面 (Facade)。
/// 将纯计算的 `SnapshotBuilder` 与快照存储、行情归档、查询缓存组装在一起。
///
/// # Invariants
/// - 是快照的唯一写入者；每次成功提交后立即替换内存快照并清空查询缓存。
/// - 完整快照只在内存中以 `Arc` 持有，查询缓存只保存单次查询的结果。
/// - 缓存以显式对象注入，不存在进程级共享状态。
pub struct SnapshotService {
    // 派生快照持久化
    store: Arc<dyn SnapshotStore>,
    // 原始行情归档，全量重建的数据来源
    bars: Arc<dyn BarStore>,
    // 查询结果缓存
    cache: Arc<dyn Cache>,
    builder: SnapshotBuilder,
    // 最近一次加载或提交的快照
    loaded: RwLock<Option<Arc<Snapshot>>>,
}

impl SnapshotService {
    /// # Summary
    /// 创建 SnapshotService 实例。
    ///
    /// # Arguments
    /// * `store` - 快照存储的具体实现。
    /// * `bars` - 行情归档的具体实现。
    /// * `cache` - 查询缓存的具体实现。
    /// * `builder` - 计算构建器（决定是否并行）。
    pub fn new(
        store: Arc<dyn SnapshotStore>,
        bars: Arc<dyn BarStore>,
        cache: Arc<dyn Cache>,
        builder: SnapshotBuilder,
    ) -> Self {
        Self {
            store,
            bars,
            cache,
            builder,
            loaded: RwLock::new(None),
        }
    }

    fn remember(&self, snapshot: Arc<Snapshot>) {
        *self.loaded.write().unwrap_or_else(PoisonError::into_inner) = Some(snapshot);
    }

    /// 提交快照，替换内存快照并使查询缓存失效。
    fn commit(&self, snapshot: &Snapshot) -> Result<(), BuildError> {
        self.store.commit(snapshot)?;
        self.remember(Arc::new(snapshot.clone()));
        self.cache.clear()?;
        debug!("Query cache cleared after commit ({} rows)", snapshot.len());
        Ok(())
    }

    /// # Summary
    /// 从行情归档全量重建并提交快照。
    ///
    /// # Returns
    /// * `Result<Snapshot, BuildError>` - 写入失败原样上抛，旧快照保持不变。
    pub fn rebuild_and_commit(&self) -> Result<Snapshot, BuildError> {
        let bars = self.bars.load_bars()?;
        info!("Full rebuild from {} archived bars", bars.len());
        let snapshot = self.builder.rebuild(bars);
        self.commit(&snapshot)?;
        Ok(snapshot)
    }

    /// # Summary
    /// 将新抓取的行情合并进快照与归档。
    ///
    /// # Logic
    /// 1. 取当前快照（内存中没有时从磁盘读取，必要时自动恢复）。
    /// 2. 新批次入库预处理；为空则直接返回当前快照，不产生写入。
    /// 3. 计算合并结果，先写归档再提交快照，最后清空缓存。
    ///
    /// # Arguments
    /// * `new_bars` - 新行情，顺序任意。
    ///
    /// # Returns
    /// * `Result<Snapshot, BuildError>` - 合并后的快照。
    pub fn merge_and_commit(&self, new_bars: Vec<DailyBar>) -> Result<Snapshot, BuildError> {
        let current = self.read_all()?;
        let batch = ingest(new_bars);
        if batch.is_empty() {
            info!("No valid bars in batch, snapshot left as is");
            return Ok(Snapshot::clone(&current));
        }
        let merged = self.builder.merge(&current, batch.clone());
        self.bars.upsert_bars(&batch)?;
        self.commit(&merged)?;
        Ok(merged)
    }

    /// # Summary
    /// 读取已提交的快照，必要时自动恢复。
    ///
    /// # Logic
    /// 1. 快照存在且可解析：直接返回。
    /// 2. 快照不存在：从归档全量重建。
    /// 3. 快照损坏：先将损坏文件移至旁路，再从归档全量重建。
    /// 4. 其余 IO 错误原样上抛。
    pub fn load_or_recover(&self) -> Result<Snapshot, BuildError> {
        match self.store.load() {
            Ok(Some(snapshot)) => Ok(snapshot),
            Ok(None) => {
                info!("No snapshot on disk, building from archive");
                self.rebuild_and_commit()
            }
            Err(StoreError::Corrupt(reason)) => {
                warn!("Snapshot is corrupt ({}), rebuilding from archive", reason);
                if let Some(moved) = self.store.quarantine()? {
                    warn!("Corrupt snapshot kept at {}", moved.display());
                }
                self.rebuild_and_commit()
            }
            Err(e) => Err(e.into()),
        }
    }

    /// # Summary
    /// 全量读取快照。
    ///
    /// # Logic
    /// 1. 内存中已有快照时直接共享。
    /// 2. 否则从磁盘加载（必要时自动恢复）并留存，直到下一次提交替换它。
    pub fn read_all(&self) -> Result<Arc<Snapshot>, BuildError> {
        let held = self
            .loaded
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .map(Arc::clone);
        if let Some(snapshot) = held {
            debug!("Snapshot served from memory");
            return Ok(snapshot);
        }
        let snapshot = Arc::new(self.load_or_recover()?);
        self.remember(Arc::clone(&snapshot));
        Ok(snapshot)
    }

    /// 某一交易日的全部行。
    pub fn by_date(&self, date: NaiveDate) -> Result<Vec<DerivedState>, BuildError> {
        let key = format!("snapshot:date:{}", date);
        if let Some(rows) = self.cache.get::<Vec<DerivedState>>(&key)? {
            return Ok(rows);
        }
        let rows = self.read_all()?.by_date(date);
        self.cache.set(&key, &rows)?;
        Ok(rows)
    }

    /// 单只证券在闭区间 [`start`, `end`] 内的行。
    pub fn by_symbol_range(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<DerivedState>, BuildError> {
        let symbol = normalize_code(symbol);
        let key = format!("snapshot:symbol:{}:{}:{}", symbol, start, end);
        if let Some(rows) = self.cache.get::<Vec<DerivedState>>(&key)? {
            return Ok(rows);
        }
        let rows = self.read_all()?.by_symbol_range(&symbol, start, end);
        self.cache.set(&key, &rows)?;
        Ok(rows)
    }

    /// 某一交易日的市场情绪统计。
    pub fn market_stats(&self, date: NaiveDate) -> Result<DailyMarketStats, BuildError> {
        let key = format!("stats:{}", date);
        if let Some(stats) = self.cache.get::<DailyMarketStats>(&key)? {
            return Ok(stats);
        }
        let stats = daily_market_stats(&*self.read_all()?, date);
        self.cache.set(&key, &stats)?;
        Ok(stats)
    }
}
