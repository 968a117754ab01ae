use crate::common::BoardClass;
use crate::market::error::BarError;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// # Summary
/// 单只证券单个交易日的原始日 K 线，由外部抓取层提供。
///
/// # Invariants
/// - 以 (`symbol`, `trade_date`) 为唯一键，创建后不可变。
/// - 价格必须为有限正数，成交量与成交额非负，否则视为畸形行。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyBar {
    // 证券代码 (例如: 600000)
    pub symbol: String,
    // 证券名称，用于识别 ST 状态
    pub name: String,
    // 交易日
    pub trade_date: NaiveDate,
    // 开盘价
    pub open: f64,
    // 最高价
    pub high: f64,
    // 最低价
    pub low: f64,
    // 收盘价
    pub close: f64,
    // 成交量
    pub volume: f64,
    // 成交额
    pub amount: f64,
    // 换手率 (百分比，可缺失)
    pub turnover_pct: Option<f64>,
}

impl DailyBar {
    /// # Summary
    /// 校验单行行情是否可参与计算。
    ///
    /// # Logic
    /// 1. 四个价格必须是有限正数。
    /// 2. 成交量、成交额必须是有限非负数。
    ///
    /// # Returns
    /// 合法返回 Ok，否则返回 `BarError::MalformedRow`。
    pub fn validate(&self) -> Result<(), BarError> {
        let prices = [
            ("open", self.open),
            ("high", self.high),
            ("low", self.low),
            ("close", self.close),
        ];
        for (field, value) in prices {
            if !value.is_finite() || value <= 0.0 {
                return Err(self.malformed(format!("{} is not a positive price: {}", field, value)));
            }
        }
        for (field, value) in [("volume", self.volume), ("amount", self.amount)] {
            if !value.is_finite() || value < 0.0 {
                return Err(self.malformed(format!("{} is negative or not finite: {}", field, value)));
            }
        }
        Ok(())
    }

    fn malformed(&self, reason: String) -> BarError {
        BarError::MalformedRow {
            symbol: self.symbol.clone(),
            trade_date: self.trade_date,
            reason,
        }
    }
}

/// # Summary
/// 连板梯队标签，渲染为 `"{D}天{B}板"`。
///
/// # Invariants
/// - `boards <= days`。
/// - 非涨停行恒为哨兵值 `0天0板`。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub struct BoardLabel {
    // 跨越的行数 (D)
    pub days: u32,
    // 区间内涨停行数 (B)
    pub boards: u32,
}

impl BoardLabel {
    /// 非涨停行的哨兵值。
    pub const NONE: BoardLabel = BoardLabel { days: 0, boards: 0 };
    /// 孤立涨停。
    pub const SINGLE: BoardLabel = BoardLabel { days: 1, boards: 1 };

    pub fn new(days: u32, boards: u32) -> Self {
        Self { days, boards }
    }
}

impl std::fmt::Display for BoardLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}天{}板", self.days, self.boards)
    }
}

impl FromStr for BoardLabel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let body = s
            .strip_suffix('板')
            .ok_or_else(|| format!("Invalid board label: {}", s))?;
        let (days, boards) = body
            .split_once('天')
            .ok_or_else(|| format!("Invalid board label: {}", s))?;
        let days = days
            .parse::<u32>()
            .map_err(|e| format!("Invalid board label {}: {}", s, e))?;
        let boards = boards
            .parse::<u32>()
            .map_err(|e| format!("Invalid board label {}: {}", s, e))?;
        Ok(Self { days, boards })
    }
}

/// # Summary
/// 均线排列状态。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MaAlignment {
    // MA5 > MA10 > MA20
    Bullish,
    // MA5 < MA10 < MA20
    Bearish,
    // 其余情况
    Mixed,
}

impl MaAlignment {
    pub fn as_str(self) -> &'static str {
        match self {
            MaAlignment::Bullish => "多头排列",
            MaAlignment::Bearish => "空头排列",
            MaAlignment::Mixed => "均线混乱",
        }
    }
}

impl FromStr for MaAlignment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "多头排列" => Ok(MaAlignment::Bullish),
            "空头排列" => Ok(MaAlignment::Bearish),
            "均线混乱" => Ok(MaAlignment::Mixed),
            _ => Err(format!("Unknown MaAlignment: {}", s)),
        }
    }
}

impl std::fmt::Display for MaAlignment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// # Summary
/// 单只证券单个交易日的完整派生状态，是所有下游消费者的唯一数据来源。
///
/// # Invariants
/// - 同一证券内 `trade_date` 严格递增。
/// - `is_limit_up` 与 `is_limit_down` 互斥。
/// - `streak_len > 0` 蕴含 `is_limit_up`。
/// - `is_limit_up == false` 时 `board_label` 为 `0天0板`。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DerivedState {
    pub symbol: String,
    pub name: String,
    pub trade_date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
    pub amount: f64,
    pub turnover_pct: Option<f64>,
    // 昨收，首行缺失
    pub prev_close: Option<f64>,
    // 收盘涨跌幅 (%)
    pub change_pct: Option<f64>,
    // 振幅 (%)，以最低价为分母
    pub amplitude_pct: f64,
    pub board_class: BoardClass,
    pub limit_pct: f64,
    pub limit_up_price: Option<f64>,
    pub limit_down_price: Option<f64>,
    pub is_limit_up: bool,
    pub is_limit_down: bool,
    // 炸板：盘中触及涨停价但收盘未封住
    pub is_break: bool,
    // 当前连续涨停行数
    pub streak_len: u32,
    pub board_label: BoardLabel,
    pub ma5: f64,
    pub ma10: f64,
    pub ma20: f64,
    pub rel_ma5: f64,
    pub rel_ma10: f64,
    pub rel_ma20: f64,
    pub ma_alignment: MaAlignment,
    pub ret5: Option<f64>,
    pub ret10: Option<f64>,
    pub ret20: Option<f64>,
    pub is_up_candle: bool,
    pub is_down_candle: bool,
    pub up_streak_days: u32,
    pub down_streak_days: u32,
}

impl DerivedState {
    /// # Summary
    /// 从派生行还原原始日 K 线。
    ///
    /// # Logic
    /// 派生行完整保留了原始行情字段，增量合并借此重建单只证券的历史序列。
    pub fn to_bar(&self) -> DailyBar {
        DailyBar {
            symbol: self.symbol.clone(),
            name: self.name.clone(),
            trade_date: self.trade_date,
            open: self.open,
            high: self.high,
            low: self.low,
            close: self.close,
            volume: self.volume,
            amount: self.amount,
            turnover_pct: self.turnover_pct,
        }
    }
}

/// # Summary
/// 完整的派生状态表快照。
///
/// # Invariants
/// - `rows` 按 (`symbol`, `trade_date`) 升序排列，且键唯一。
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Snapshot {
    rows: Vec<DerivedState>,
}

impl Snapshot {
    /// # Summary
    /// 由任意顺序的派生行构造快照。
    ///
    /// # Logic
    /// 1. 按 (`symbol`, `trade_date`) 稳定排序。
    /// 2. 相同键只保留最后出现的一行。
    pub fn from_rows(mut rows: Vec<DerivedState>) -> Self {
        rows.sort_by(|a, b| {
            a.symbol
                .cmp(&b.symbol)
                .then_with(|| a.trade_date.cmp(&b.trade_date))
        });
        let mut deduped: Vec<DerivedState> = Vec::with_capacity(rows.len());
        for row in rows {
            match deduped.last_mut() {
                Some(last) if last.symbol == row.symbol && last.trade_date == row.trade_date => {
                    *last = row;
                }
                _ => deduped.push(row),
            }
        }
        Self { rows: deduped }
    }

    pub fn rows(&self) -> &[DerivedState] {
        &self.rows
    }

    pub fn into_rows(self) -> Vec<DerivedState> {
        self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// 某一交易日的全部行。
    pub fn by_date(&self, date: NaiveDate) -> Vec<DerivedState> {
        self.rows
            .iter()
            .filter(|r| r.trade_date == date)
            .cloned()
            .collect()
    }

    /// # Summary
    /// 单只证券在闭区间 [`start`, `end`] 内的行。
    ///
    /// # Logic
    /// 利用排序不变量二分定位该证券的行区间，再按日期过滤。
    pub fn by_symbol_range(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Vec<DerivedState> {
        self.symbol_rows(symbol)
            .iter()
            .filter(|r| r.trade_date >= start && r.trade_date <= end)
            .cloned()
            .collect()
    }

    /// 单只证券的全部行（按日期升序）。
    pub fn symbol_rows(&self, symbol: &str) -> &[DerivedState] {
        let lo = self.rows.partition_point(|r| r.symbol.as_str() < symbol);
        let hi = self.rows.partition_point(|r| r.symbol.as_str() <= symbol);
        &self.rows[lo..hi]
    }

    /// 快照中的最新交易日。
    pub fn latest_date(&self) -> Option<NaiveDate> {
        self.rows.iter().map(|r| r.trade_date).max()
    }

    /// 去重后的证券代码（升序）。
    pub fn symbols(&self) -> Vec<&str> {
        let mut symbols: Vec<&str> = Vec::new();
        for row in &self.rows {
            if symbols.last() != Some(&row.symbol.as_str()) {
                symbols.push(row.symbol.as_str());
            }
        }
        symbols
    }
}
