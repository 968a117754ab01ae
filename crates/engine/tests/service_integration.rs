use chrono::{Days, NaiveDate};
use limitboard_cache::mem::MemCache;
use limitboard_core::common::round2;
use limitboard_core::engine::error::BuildError;
use limitboard_core::market::entity::DailyBar;
use limitboard_core::store::error::StoreError;
use limitboard_core::store::port::{BarStore, SnapshotStore};
use limitboard_engine::builder::{SnapshotBuilder, rebuild};
use limitboard_engine::service::SnapshotService;
use limitboard_store::bars::ParquetBarStore;
use limitboard_store::snapshot::ParquetSnapshotStore;
use std::fs::{self, File};
use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use tempfile::tempdir;

fn day(offset: u64) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 5, 6)
        .unwrap()
        .checked_add_days(Days::new(offset))
        .unwrap()
}

/// 每个交易日涨停一次的主板证券。
fn rising(symbol: &str, days: u64) -> Vec<DailyBar> {
    let mut prev = 10.0;
    (0..days)
        .map(|i| {
            let close = if i == 0 { prev } else { round2(prev * 1.1) };
            let bar = DailyBar {
                symbol: symbol.to_string(),
                name: "测试股份".to_string(),
                trade_date: day(i),
                open: prev,
                high: close,
                low: prev,
                close,
                volume: 5_000.0,
                amount: close * 5_000.0,
                turnover_pct: None,
            };
            prev = close;
            bar
        })
        .collect()
}

struct Fixture {
    service: SnapshotService,
    store: Arc<ParquetSnapshotStore>,
    bars: Arc<ParquetBarStore>,
}

fn fixture(root: &Path) -> Fixture {
    let store = Arc::new(ParquetSnapshotStore::new(root.join("derived/limit_status.parquet")));
    let bars = Arc::new(ParquetBarStore::new(root.join("raw/daily_bars.parquet")));
    let service = SnapshotService::new(
        store.clone(),
        bars.clone(),
        Arc::new(MemCache::new()),
        SnapshotBuilder::new(true),
    );
    Fixture {
        service,
        store,
        bars,
    }
}

#[test]
fn test_first_load_builds_from_archive() -> anyhow::Result<()> {
    let dir = tempdir()?;
    let fx = fixture(dir.path());
    let mut history = rising("600100", 4);
    history.extend(rising("000200", 3));
    fx.bars.upsert_bars(&history)?;

    let snapshot = fx.service.load_or_recover()?;
    assert_eq!(snapshot, rebuild(history));
    assert!(fx.store.path().exists());
    assert_eq!(fx.store.load()?, Some(snapshot));
    Ok(())
}

#[test]
fn test_corrupt_snapshot_is_quarantined_and_rebuilt() -> anyhow::Result<()> {
    let dir = tempdir()?;
    let fx = fixture(dir.path());
    let history = rising("600100", 5);
    fx.bars.upsert_bars(&history)?;

    fs::create_dir_all(dir.path().join("derived"))?;
    let mut file = File::create(fx.store.path())?;
    file.write_all(b"definitely not parquet")?;
    drop(file);

    let snapshot = fx.service.load_or_recover()?;
    assert_eq!(snapshot, rebuild(history));

    let quarantined: Vec<String> = fs::read_dir(dir.path().join("derived"))?
        .filter_map(|e| e.ok())
        .map(|e| e.file_name().to_string_lossy().into_owned())
        .filter(|n| n.contains(".corrupt-"))
        .collect();
    assert_eq!(quarantined.len(), 1);
    assert!(quarantined[0].starts_with("limit_status.corrupt-"));
    assert_eq!(fx.store.load()?, Some(snapshot));
    Ok(())
}

#[test]
fn test_merge_and_commit_updates_archive_and_cache() -> anyhow::Result<()> {
    let dir = tempdir()?;
    let fx = fixture(dir.path());
    let history = rising("600100", 6);
    let (head, tail) = history.split_at(4);
    fx.bars.upsert_bars(head)?;

    let before = fx.service.read_all()?;
    assert_eq!(before.len(), 4);

    let merged = fx.service.merge_and_commit(tail.to_vec())?;
    assert_eq!(merged, rebuild(history.clone()));
    assert_eq!(fx.bars.load_bars()?.len(), 6);

    // 提交后缓存已失效，读到的是新快照
    let after = fx.service.read_all()?;
    assert_eq!(*after, merged);
    let last = fx.service.by_symbol_range("sh.600100", day(5), day(5))?;
    assert_eq!(last.len(), 1);
    assert_eq!(last[0].board_label.to_string(), "5天5板");

    // 同一批次再次合并不改变快照
    let again = fx.service.merge_and_commit(tail.to_vec())?;
    assert_eq!(again, merged);
    Ok(())
}

#[test]
fn test_empty_batch_leaves_snapshot_untouched() -> anyhow::Result<()> {
    let dir = tempdir()?;
    let fx = fixture(dir.path());
    fx.bars.upsert_bars(&rising("600100", 3))?;
    let base = fx.service.rebuild_and_commit()?;
    let merged = fx.service.merge_and_commit(Vec::new())?;
    assert_eq!(merged, base);
    Ok(())
}

#[test]
fn test_queries_by_date_and_stats() -> anyhow::Result<()> {
    let dir = tempdir()?;
    let fx = fixture(dir.path());
    let mut history = rising("600100", 3);
    history.extend(rising("300200", 3));
    fx.bars.upsert_bars(&history)?;

    let rows = fx.service.by_date(day(2))?;
    assert_eq!(rows.len(), 2);

    let stats = fx.service.market_stats(day(2))?;
    assert_eq!(stats.total, 2);
    assert_eq!(stats.advancing, 2);
    // 创业板 10% 不是涨停
    assert_eq!(stats.limit_up, 1);
    assert_eq!(stats.highest_streak, 2);
    assert_eq!(stats.highest_names, vec!["测试股份".to_string()]);
    assert_eq!(stats.red_ratio_pct, 100.0);
    Ok(())
}

#[test]
fn test_merged_correction_survives_rebuild_of_prefixed_archive() -> anyhow::Result<()> {
    let dir = tempdir()?;
    let fx = fixture(dir.path());
    // 历史归档以带交易所前缀的代码写入
    ParquetBarStore::write_file(fx.bars.path(), &rising("sh.600100", 3))?;

    let mut correction = rising("600100", 3).remove(2);
    correction.close = 11.5;
    let merged = fx.service.merge_and_commit(vec![correction])?;
    let rebuilt = fx.service.rebuild_and_commit()?;

    assert_eq!(merged, rebuilt);
    assert_eq!(fx.bars.load_bars()?.len(), 3);
    let last = fx.service.by_symbol_range("600100", day(2), day(2))?;
    assert_eq!(last[0].close, 11.5);
    assert!(!last[0].is_limit_up);
    Ok(())
}

#[test]
fn test_write_failure_reaches_caller_and_keeps_snapshot() -> anyhow::Result<()> {
    let dir = tempdir()?;
    let fx = fixture(dir.path());
    fx.bars.upsert_bars(&rising("600100", 3))?;
    let committed = fx.service.rebuild_and_commit()?;
    let before = fs::read(fx.store.path())?;

    // 快照路径的父路径是已提交的快照文件，无法创建目录
    let broken = SnapshotService::new(
        Arc::new(ParquetSnapshotStore::new(
            fx.store.path().join("limit_status.parquet"),
        )),
        fx.bars.clone(),
        Arc::new(MemCache::new()),
        SnapshotBuilder::default(),
    );
    let err = broken.rebuild_and_commit();
    assert!(matches!(err, Err(BuildError::Store(StoreError::Write(_)))));
    let err = broken.merge_and_commit(rising("600100", 4));
    assert!(matches!(err, Err(BuildError::Store(StoreError::Write(_)))));

    assert_eq!(fs::read(fx.store.path())?, before);
    assert_eq!(fx.store.load()?, Some(committed));
    Ok(())
}
