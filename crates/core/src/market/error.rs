use chrono::NaiveDate;
use thiserror::Error;

/// # Summary
/// 行情数据域错误枚举，描述无法参与计算的原始行。
///
/// # Invariants
/// - 必须通过 `thiserror` 派生 `Error` trait。
/// - 行级错误均为非致命错误，调用方记录告警后跳过该行。
#[derive(Error, Debug, PartialEq)]
pub enum BarError {
    // 价格或成交量缺失、为负或非有限值
    #[error("Malformed row {symbol}@{trade_date}: {reason}")]
    MalformedRow {
        symbol: String,
        trade_date: NaiveDate,
        reason: String,
    },
}
