//! RecordBatch 列访问辅助函数，所有结构不符的情况统一映射为 `StoreError::Corrupt`。

use arrow::array::{Array, BooleanArray, Date32Array, Float64Array, StringArray, UInt32Array};
use arrow::record_batch::RecordBatch;
use chrono::NaiveDate;
use limitboard_core::store::error::StoreError;

/// # Summary
/// 按列名取出指定类型的列。
///
/// # Logic
/// 1. 按名称查找列，缺失即视为损坏。
/// 2. 向下转型为期望的数组类型，类型不符即视为损坏。
pub(crate) fn column<'a, A: Array + 'static>(
    batch: &'a RecordBatch,
    name: &str,
) -> Result<&'a A, StoreError> {
    batch
        .column_by_name(name)
        .ok_or_else(|| StoreError::Corrupt(format!("missing column `{}`", name)))?
        .as_any()
        .downcast_ref::<A>()
        .ok_or_else(|| StoreError::Corrupt(format!("unexpected type for column `{}`", name)))
}

fn null_error(name: &str, row: usize) -> StoreError {
    StoreError::Corrupt(format!("null value in column `{}` at row {}", name, row))
}

pub(crate) fn req_str(a: &StringArray, name: &str, row: usize) -> Result<String, StoreError> {
    if a.is_null(row) {
        return Err(null_error(name, row));
    }
    Ok(a.value(row).to_string())
}

pub(crate) fn req_f64(a: &Float64Array, name: &str, row: usize) -> Result<f64, StoreError> {
    if a.is_null(row) {
        return Err(null_error(name, row));
    }
    Ok(a.value(row))
}

pub(crate) fn opt_f64(a: &Float64Array, row: usize) -> Option<f64> {
    if a.is_null(row) { None } else { Some(a.value(row)) }
}

pub(crate) fn req_bool(a: &BooleanArray, name: &str, row: usize) -> Result<bool, StoreError> {
    if a.is_null(row) {
        return Err(null_error(name, row));
    }
    Ok(a.value(row))
}

pub(crate) fn req_u32(a: &UInt32Array, name: &str, row: usize) -> Result<u32, StoreError> {
    if a.is_null(row) {
        return Err(null_error(name, row));
    }
    Ok(a.value(row))
}

pub(crate) fn opt_date(a: &Date32Array, row: usize) -> Option<NaiveDate> {
    if a.is_null(row) { None } else { a.value_as_date(row) }
}

pub(crate) fn req_date(a: &Date32Array, name: &str, row: usize) -> Result<NaiveDate, StoreError> {
    opt_date(a, row).ok_or_else(|| null_error(name, row))
}
