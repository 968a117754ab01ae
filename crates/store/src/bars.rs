use crate::atomic::write_atomic;
use crate::columns::{column, opt_date, opt_f64};
use arrow::array::{Array, ArrayRef, Date32Array, Float64Array, StringArray};
use arrow::datatypes::{DataType, Date32Type, Field, Schema, SchemaRef};
use arrow::record_batch::RecordBatch;
use chrono::NaiveDate;
use limitboard_core::common::normalize_code;
use limitboard_core::market::entity::DailyBar;
use limitboard_core::store::error::StoreError;
use limitboard_core::store::port::BarStore;
use parquet::arrow::ArrowWriter;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use parquet::basic::Compression;
use parquet::file::properties::WriterProperties;
use std::collections::BTreeMap;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};

/// BarStore 的 Parquet 实现，原始日 K 归档存为单个列式文件。
///
/// # Summary
/// 全量重建（包括快照损坏后的自动恢复）均从这里读取历史。
///
/// # Invariants
/// * 价格与成交量列允许为 null，读取时 null 行作为畸形行跳过。
/// * 代码一律以 6 位纯数字形式作为键，带交易所前缀的旧数据在读取时即标准化。
/// * 写入与快照相同，走临时文件 + 原子 rename。
pub struct ParquetBarStore {
    path: PathBuf,
}

impl ParquetBarStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// 归档文件的 Arrow 结构。
    pub fn schema() -> SchemaRef {
        Arc::new(Schema::new(vec![
            Field::new("symbol", DataType::Utf8, true),
            Field::new("name", DataType::Utf8, true),
            Field::new("trade_date", DataType::Date32, true),
            Field::new("open", DataType::Float64, true),
            Field::new("high", DataType::Float64, true),
            Field::new("low", DataType::Float64, true),
            Field::new("close", DataType::Float64, true),
            Field::new("volume", DataType::Float64, true),
            Field::new("amount", DataType::Float64, true),
            Field::new("turnover_pct", DataType::Float64, true),
        ]))
    }

    /// # Summary
    /// 从任意 Parquet 文件读取原始行情，供归档读取与外部新批次导入共用。
    ///
    /// # Logic
    /// 1. 结构不符（缺列、类型不符）返回 `Corrupt`。
    /// 2. 代码或日期缺失、价格或成交量为 null 的行记录告警后跳过。
    /// 3. 代码标准化为 6 位纯数字形式。
    ///
    /// # Arguments
    /// * `path`: Parquet 文件路径。
    ///
    /// # Returns
    /// 无序的原始行情列表。
    pub fn read_file(path: &Path) -> Result<Vec<DailyBar>, StoreError> {
        let file = File::open(path)
            .map_err(|e| StoreError::Io(format!("open {}: {}", path.display(), e)))?;
        let reader = ParquetRecordBatchReaderBuilder::try_new(file)
            .map_err(|e| StoreError::Corrupt(e.to_string()))?
            .build()
            .map_err(|e| StoreError::Corrupt(e.to_string()))?;

        let mut bars = Vec::new();
        let mut skipped = 0usize;
        for batch in reader {
            let batch = batch.map_err(|e| StoreError::Corrupt(e.to_string()))?;
            skipped += Self::from_batch(&batch, &mut bars)?;
        }
        if skipped > 0 {
            warn!(
                "Skipped {} malformed rows with null fields in {}",
                skipped,
                path.display()
            );
        }
        info!("Read {} bars from {}", bars.len(), path.display());
        Ok(bars)
    }

    /// # Summary
    /// 解码单个 RecordBatch。
    ///
    /// # Returns
    /// 本批次因 null 字段被跳过的行数。
    fn from_batch(batch: &RecordBatch, out: &mut Vec<DailyBar>) -> Result<usize, StoreError> {
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

        let mut skipped = 0;
        for i in 0..batch.num_rows() {
            let sym = if symbol.is_null(i) { None } else { Some(symbol.value(i)) };
            let date: Option<NaiveDate> = opt_date(trade_date, i);
            let fields = (
                opt_f64(open, i),
                opt_f64(high, i),
                opt_f64(low, i),
                opt_f64(close, i),
                opt_f64(volume, i),
            );
            match (sym, date, fields) {
                (Some(sym), Some(date), (Some(o), Some(h), Some(l), Some(c), Some(v))) => {
                    out.push(DailyBar {
                        symbol: normalize_code(sym),
                        name: if name.is_null(i) {
                            String::new()
                        } else {
                            name.value(i).to_string()
                        },
                        trade_date: date,
                        open: o,
                        high: h,
                        low: l,
                        close: c,
                        volume: v,
                        amount: opt_f64(amount, i).unwrap_or(0.0),
                        turnover_pct: opt_f64(turnover_pct, i),
                    });
                }
                (sym, date, _) => {
                    warn!(
                        "Malformed row {}@{}: null price or volume, skipped",
                        sym.unwrap_or("?"),
                        date.map(|d| d.to_string()).unwrap_or_else(|| "?".to_string())
                    );
                    skipped += 1;
                }
            }
        }
        Ok(skipped)
    }

    /// # Summary
    /// 将行情写入任意 Parquet 文件（原子替换）。
    ///
    /// # Arguments
    /// * `path`: 目标文件。
    /// * `bars`: 待写入的行情，按给定顺序写出。
    pub fn write_file(path: &Path, bars: &[DailyBar]) -> Result<(), StoreError> {
        let schema = Self::schema();
        let props = WriterProperties::builder()
            .set_compression(Compression::SNAPPY)
            .build();
        let columns: Vec<ArrayRef> = vec![
            Arc::new(StringArray::from(
                bars.iter().map(|b| b.symbol.clone()).collect::<Vec<_>>(),
            )),
            Arc::new(StringArray::from(
                bars.iter().map(|b| b.name.clone()).collect::<Vec<_>>(),
            )),
            Arc::new(Date32Array::from(
                bars.iter()
                    .map(|b| Date32Type::from_naive_date(b.trade_date))
                    .collect::<Vec<_>>(),
            )),
            Arc::new(Float64Array::from(bars.iter().map(|b| b.open).collect::<Vec<_>>())),
            Arc::new(Float64Array::from(bars.iter().map(|b| b.high).collect::<Vec<_>>())),
            Arc::new(Float64Array::from(bars.iter().map(|b| b.low).collect::<Vec<_>>())),
            Arc::new(Float64Array::from(bars.iter().map(|b| b.close).collect::<Vec<_>>())),
            Arc::new(Float64Array::from(bars.iter().map(|b| b.volume).collect::<Vec<_>>())),
            Arc::new(Float64Array::from(bars.iter().map(|b| b.amount).collect::<Vec<_>>())),
            Arc::new(Float64Array::from(
                bars.iter().map(|b| b.turnover_pct).collect::<Vec<_>>(),
            )),
        ];
        let batch = RecordBatch::try_new(schema.clone(), columns)
            .map_err(|e| StoreError::Write(format!("build record batch: {}", e)))?;

        write_atomic(path, |file| {
            let mut writer = ArrowWriter::try_new(file, schema, Some(props))
                .map_err(|e| StoreError::Write(e.to_string()))?;
            writer
                .write(&batch)
                .map_err(|e| StoreError::Write(e.to_string()))?;
            writer
                .close()
                .map_err(|e| StoreError::Write(e.to_string()))?;
            Ok(())
        })
    }
}

impl BarStore for ParquetBarStore {
    fn load_bars(&self) -> Result<Vec<DailyBar>, StoreError> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        Self::read_file(&self.path)
    }

    /// # Summary
    /// 按 (`symbol`, `trade_date`) 合并新行情进归档。
    ///
    /// # Logic
    /// 1. 读取现有归档，与新行情一并放入有序映射，后写入者覆盖先写入者。
    /// 2. 键使用标准化代码，`sh.600000` 与 `600000` 视为同一证券。
    /// 3. 按键序原子重写整个归档文件。
    fn upsert_bars(&self, bars: &[DailyBar]) -> Result<(), StoreError> {
        if bars.is_empty() {
            return Ok(());
        }
        let mut merged: BTreeMap<(String, NaiveDate), DailyBar> = BTreeMap::new();
        for mut bar in self.load_bars()?.into_iter().chain(bars.iter().cloned()) {
            bar.symbol = normalize_code(&bar.symbol);
            merged.insert((bar.symbol.clone(), bar.trade_date), bar);
        }
        let rows: Vec<DailyBar> = merged.into_values().collect();
        Self::write_file(&self.path, &rows)?;
        info!(
            "Bar archive {} now holds {} rows ({} upserted)",
            self.path.display(),
            rows.len(),
            bars.len()
        );
        Ok(())
    }
}
