use crate::atomic::{parent_dir, write_atomic};
use crate::columns::{column, opt_f64, req_bool, req_date, req_f64, req_str, req_u32};
use arrow::array::{
    ArrayRef, BooleanArray, Date32Array, Float64Array, StringArray, UInt32Array,
};
use arrow::datatypes::{DataType, Date32Type, Field, Schema, SchemaRef};
use arrow::record_batch::RecordBatch;
use chrono::Utc;
use limitboard_core::common::BoardClass;
use limitboard_core::market::entity::{BoardLabel, DerivedState, MaAlignment, Snapshot};
use limitboard_core::store::error::StoreError;
use limitboard_core::store::port::SnapshotStore;
use parquet::arrow::ArrowWriter;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use parquet::basic::Compression;
use parquet::file::properties::WriterProperties;
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};

/// 单个 RecordBatch 的最大行数
const BATCH_ROWS: usize = 65_536;

/// SnapshotStore 的 Parquet 实现，整张派生状态表存为单个列式文件。
///
/// # Summary
/// 读取时做完整的结构校验，写入时走临时文件 + 原子 rename。
///
/// # Invariants
/// * 任意时刻磁盘上的目标文件要么是旧快照，要么是新快照，不存在半写状态。
/// * 损坏文件只会被改名隔离，绝不删除。
pub struct ParquetSnapshotStore {
    path: PathBuf,
}

impl ParquetSnapshotStore {
    /// 创建指向 `path` 的快照存储，不触碰文件系统。
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// 快照文件的 Arrow 结构。
    pub fn schema() -> SchemaRef {
        Arc::new(Schema::new(vec![
            Field::new("symbol", DataType::Utf8, false),
            Field::new("name", DataType::Utf8, false),
            Field::new("trade_date", DataType::Date32, false),
            Field::new("open", DataType::Float64, false),
            Field::new("high", DataType::Float64, false),
            Field::new("low", DataType::Float64, false),
            Field::new("close", DataType::Float64, false),
            Field::new("volume", DataType::Float64, false),
            Field::new("amount", DataType::Float64, false),
            Field::new("turnover_pct", DataType::Float64, true),
            Field::new("prev_close", DataType::Float64, true),
            Field::new("change_pct", DataType::Float64, true),
            Field::new("amplitude_pct", DataType::Float64, false),
            Field::new("board_class", DataType::Utf8, false),
            Field::new("limit_pct", DataType::Float64, false),
            Field::new("limit_up_price", DataType::Float64, true),
            Field::new("limit_down_price", DataType::Float64, true),
            Field::new("is_limit_up", DataType::Boolean, false),
            Field::new("is_limit_down", DataType::Boolean, false),
            Field::new("is_break", DataType::Boolean, false),
            Field::new("streak_len", DataType::UInt32, false),
            Field::new("board_label", DataType::Utf8, false),
            Field::new("ma5", DataType::Float64, false),
            Field::new("ma10", DataType::Float64, false),
            Field::new("ma20", DataType::Float64, false),
            Field::new("rel_ma5", DataType::Float64, false),
            Field::new("rel_ma10", DataType::Float64, false),
            Field::new("rel_ma20", DataType::Float64, false),
            Field::new("ma_alignment", DataType::Utf8, false),
            Field::new("ret5", DataType::Float64, true),
            Field::new("ret10", DataType::Float64, true),
            Field::new("ret20", DataType::Float64, true),
            Field::new("is_up_candle", DataType::Boolean, false),
            Field::new("is_down_candle", DataType::Boolean, false),
            Field::new("up_streak_days", DataType::UInt32, false),
            Field::new("down_streak_days", DataType::UInt32, false),
        ]))
    }

    /// # Summary
    /// 将一段派生行转为 RecordBatch。
    ///
    /// # Logic
    /// 按列收集各字段，列顺序与 `schema()` 一致。
    fn to_batch(schema: &SchemaRef, rows: &[DerivedState]) -> Result<RecordBatch, StoreError> {
        fn f64s(rows: &[DerivedState], f: impl Fn(&DerivedState) -> f64) -> ArrayRef {
            Arc::new(Float64Array::from(rows.iter().map(f).collect::<Vec<_>>()))
        }
        fn opt_f64s(rows: &[DerivedState], f: impl Fn(&DerivedState) -> Option<f64>) -> ArrayRef {
            Arc::new(Float64Array::from(rows.iter().map(f).collect::<Vec<_>>()))
        }
        fn bools(rows: &[DerivedState], f: impl Fn(&DerivedState) -> bool) -> ArrayRef {
            Arc::new(BooleanArray::from(rows.iter().map(f).collect::<Vec<_>>()))
        }
        fn u32s(rows: &[DerivedState], f: impl Fn(&DerivedState) -> u32) -> ArrayRef {
            Arc::new(UInt32Array::from(rows.iter().map(f).collect::<Vec<_>>()))
        }
        fn strs(rows: &[DerivedState], f: impl Fn(&DerivedState) -> String) -> ArrayRef {
            Arc::new(StringArray::from(rows.iter().map(f).collect::<Vec<_>>()))
        }

        let columns: Vec<ArrayRef> = vec![
            strs(rows, |r| r.symbol.clone()),
            strs(rows, |r| r.name.clone()),
            Arc::new(Date32Array::from(
                rows.iter()
                    .map(|r| Date32Type::from_naive_date(r.trade_date))
                    .collect::<Vec<_>>(),
            )),
            f64s(rows, |r| r.open),
            f64s(rows, |r| r.high),
            f64s(rows, |r| r.low),
            f64s(rows, |r| r.close),
            f64s(rows, |r| r.volume),
            f64s(rows, |r| r.amount),
            opt_f64s(rows, |r| r.turnover_pct),
            opt_f64s(rows, |r| r.prev_close),
            opt_f64s(rows, |r| r.change_pct),
            f64s(rows, |r| r.amplitude_pct),
            strs(rows, |r| r.board_class.to_string()),
            f64s(rows, |r| r.limit_pct),
            opt_f64s(rows, |r| r.limit_up_price),
            opt_f64s(rows, |r| r.limit_down_price),
            bools(rows, |r| r.is_limit_up),
            bools(rows, |r| r.is_limit_down),
            bools(rows, |r| r.is_break),
            u32s(rows, |r| r.streak_len),
            strs(rows, |r| r.board_label.to_string()),
            f64s(rows, |r| r.ma5),
            f64s(rows, |r| r.ma10),
            f64s(rows, |r| r.ma20),
            f64s(rows, |r| r.rel_ma5),
            f64s(rows, |r| r.rel_ma10),
            f64s(rows, |r| r.rel_ma20),
            strs(rows, |r| r.ma_alignment.to_string()),
            opt_f64s(rows, |r| r.ret5),
            opt_f64s(rows, |r| r.ret10),
            opt_f64s(rows, |r| r.ret20),
            bools(rows, |r| r.is_up_candle),
            bools(rows, |r| r.is_down_candle),
            u32s(rows, |r| r.up_streak_days),
            u32s(rows, |r| r.down_streak_days),
        ];

        RecordBatch::try_new(schema.clone(), columns)
            .map_err(|e| StoreError::Write(format!("build record batch: {}", e)))
    }

    /// # Summary
    /// 将 RecordBatch 还原为派生行。
    ///
    /// # Logic
    /// 1. 逐列按名称、类型取出，任何缺失或类型不符视为损坏。
    /// 2. 逐行组装；非空列出现 null、枚举或标签无法解析同样视为损坏。
    fn from_batch(batch: &RecordBatch, out: &mut Vec<DerivedState>) -> Result<(), StoreError> {
        let symbol = column::<StringArray>(batch, "symbol")?;
        let name = column::<StringArray>(batch, "name")?;
        let trade_date = column::<Date32Array>(batch, "trade_date")?;
        let open = column::<Float64Array>(batch, "open")?;
        let high = column::<Float64Array>(batch, "high")?;
        let low = column::<Float64Array>(batch, "low")?;
        let close = column::<Float64Array>(batch, "close")?;
        let volume = column::<Float64Array>(batch, "volume")?;
        let amount = column::<Float64Array>(batch, "amount")?;
        let turnover_pct = column::<Float64Array>(batch, "turnover_pct")?;
        let prev_close = column::<Float64Array>(batch, "prev_close")?;
        let change_pct = column::<Float64Array>(batch, "change_pct")?;
        let amplitude_pct = column::<Float64Array>(batch, "amplitude_pct")?;
        let board_class = column::<StringArray>(batch, "board_class")?;
        let limit_pct = column::<Float64Array>(batch, "limit_pct")?;
        let limit_up_price = column::<Float64Array>(batch, "limit_up_price")?;
        let limit_down_price = column::<Float64Array>(batch, "limit_down_price")?;
        let is_limit_up = column::<BooleanArray>(batch, "is_limit_up")?;
        let is_limit_down = column::<BooleanArray>(batch, "is_limit_down")?;
        let is_break = column::<BooleanArray>(batch, "is_break")?;
        let streak_len = column::<UInt32Array>(batch, "streak_len")?;
        let board_label = column::<StringArray>(batch, "board_label")?;
        let ma5 = column::<Float64Array>(batch, "ma5")?;
        let ma10 = column::<Float64Array>(batch, "ma10")?;
        let ma20 = column::<Float64Array>(batch, "ma20")?;
        let rel_ma5 = column::<Float64Array>(batch, "rel_ma5")?;
        let rel_ma10 = column::<Float64Array>(batch, "rel_ma10")?;
        let rel_ma20 = column::<Float64Array>(batch, "rel_ma20")?;
        let ma_alignment = column::<StringArray>(batch, "ma_alignment")?;
        let ret5 = column::<Float64Array>(batch, "ret5")?;
        let ret10 = column::<Float64Array>(batch, "ret10")?;
        let ret20 = column::<Float64Array>(batch, "ret20")?;
        let is_up_candle = column::<BooleanArray>(batch, "is_up_candle")?;
        let is_down_candle = column::<BooleanArray>(batch, "is_down_candle")?;
        let up_streak_days = column::<UInt32Array>(batch, "up_streak_days")?;
        let down_streak_days = column::<UInt32Array>(batch, "down_streak_days")?;

        for i in 0..batch.num_rows() {
            let class = req_str(board_class, "board_class", i)?
                .parse::<BoardClass>()
                .map_err(StoreError::Corrupt)?;
            let label = req_str(board_label, "board_label", i)?
                .parse::<BoardLabel>()
                .map_err(StoreError::Corrupt)?;
            let alignment = req_str(ma_alignment, "ma_alignment", i)?
                .parse::<MaAlignment>()
                .map_err(StoreError::Corrupt)?;

            out.push(DerivedState {
                symbol: req_str(symbol, "symbol", i)?,
                name: req_str(name, "name", i)?,
                trade_date: req_date(trade_date, "trade_date", i)?,
                open: req_f64(open, "open", i)?,
                high: req_f64(high, "high", i)?,
                low: req_f64(low, "low", i)?,
                close: req_f64(close, "close", i)?,
                volume: req_f64(volume, "volume", i)?,
                amount: req_f64(amount, "amount", i)?,
                turnover_pct: opt_f64(turnover_pct, i),
                prev_close: opt_f64(prev_close, i),
                change_pct: opt_f64(change_pct, i),
                amplitude_pct: req_f64(amplitude_pct, "amplitude_pct", i)?,
                board_class: class,
                limit_pct: req_f64(limit_pct, "limit_pct", i)?,
                limit_up_price: opt_f64(limit_up_price, i),
                limit_down_price: opt_f64(limit_down_price, i),
                is_limit_up: req_bool(is_limit_up, "is_limit_up", i)?,
                is_limit_down: req_bool(is_limit_down, "is_limit_down", i)?,
                is_break: req_bool(is_break, "is_break", i)?,
                streak_len: req_u32(streak_len, "streak_len", i)?,
                board_label: label,
                ma5: req_f64(ma5, "ma5", i)?,
                ma10: req_f64(ma10, "ma10", i)?,
                ma20: req_f64(ma20, "ma20", i)?,
                rel_ma5: req_f64(rel_ma5, "rel_ma5", i)?,
                rel_ma10: req_f64(rel_ma10, "rel_ma10", i)?,
                rel_ma20: req_f64(rel_ma20, "rel_ma20", i)?,
                ma_alignment: alignment,
                ret5: opt_f64(ret5, i),
                ret10: opt_f64(ret10, i),
                ret20: opt_f64(ret20, i),
                is_up_candle: req_bool(is_up_candle, "is_up_candle", i)?,
                is_down_candle: req_bool(is_down_candle, "is_down_candle", i)?,
                up_streak_days: req_u32(up_streak_days, "up_streak_days", i)?,
                down_streak_days: req_u32(down_streak_days, "down_streak_days", i)?,
            });
        }
        Ok(())
    }
}

impl SnapshotStore for ParquetSnapshotStore {
    /// # Summary
    /// 读取并校验快照文件。
    ///
    /// # Logic
    /// 1. 文件不存在返回 None。
    /// 2. Parquet 元数据、RecordBatch 解码或逐行校验失败均返回 `Corrupt`。
    /// 3. 经 `Snapshot::from_rows` 恢复排序不变量。
    fn load(&self) -> Result<Option<Snapshot>, StoreError> {
        if !self.path.exists() {
            return Ok(None);
        }
        let file = File::open(&self.path)
            .map_err(|e| StoreError::Io(format!("open {}: {}", self.path.display(), e)))?;
        let reader = ParquetRecordBatchReaderBuilder::try_new(file)
            .map_err(|e| StoreError::Corrupt(e.to_string()))?
            .build()
            .map_err(|e| StoreError::Corrupt(e.to_string()))?;

        let mut rows = Vec::new();
        for batch in reader {
            let batch = batch.map_err(|e| StoreError::Corrupt(e.to_string()))?;
            Self::from_batch(&batch, &mut rows)?;
        }
        info!("Loaded snapshot {} ({} rows)", self.path.display(), rows.len());
        Ok(Some(Snapshot::from_rows(rows)))
    }

    /// # Summary
    /// 原子提交快照。
    ///
    /// # Logic
    /// 1. 按 `BATCH_ROWS` 分块编码为 RecordBatch。
    /// 2. 经 `write_atomic` 写临时文件并 rename 覆盖。
    fn commit(&self, snapshot: &Snapshot) -> Result<(), StoreError> {
        let schema = Self::schema();
        let props = WriterProperties::builder()
            .set_compression(Compression::SNAPPY)
            .build();

        write_atomic(&self.path, |file| {
            let mut writer = ArrowWriter::try_new(file, schema.clone(), Some(props))
                .map_err(|e| StoreError::Write(e.to_string()))?;
            for chunk in snapshot.rows().chunks(BATCH_ROWS) {
                let batch = Self::to_batch(&schema, chunk)?;
                writer
                    .write(&batch)
                    .map_err(|e| StoreError::Write(e.to_string()))?;
            }
            writer
                .close()
                .map_err(|e| StoreError::Write(e.to_string()))?;
            Ok(())
        })?;

        info!(
            "Committed snapshot {} ({} rows)",
            self.path.display(),
            snapshot.len()
        );
        Ok(())
    }

    /// # Summary
    /// 隔离损坏的快照文件。
    ///
    /// # Logic
    /// 1. 文件不存在时返回 None。
    /// 2. 在同目录下改名为 `<stem>.corrupt-<UTC 时间戳>.parquet`。
    fn quarantine(&self) -> Result<Option<PathBuf>, StoreError> {
        if !self.path.exists() {
            return Ok(None);
        }
        let stem = self
            .path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "snapshot".to_string());
        let stamp = Utc::now().format("%Y%m%dT%H%M%S%.3f");
        let target = parent_dir(&self.path).join(format!("{}.corrupt-{}.parquet", stem, stamp));

        fs::rename(&self.path, &target).map_err(|e| {
            StoreError::Io(format!(
                "quarantine {} -> {}: {}",
                self.path.display(),
                target.display(),
                e
            ))
        })?;
        warn!(
            "Corrupt snapshot moved aside: {} -> {}",
            self.path.display(),
            target.display()
        );
        Ok(Some(target))
    }
}
