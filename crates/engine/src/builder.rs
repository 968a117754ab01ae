use crate::candle::compute_candles;
use crate::indicator::compute_indicators;
use crate::limit::{change_pct, classify_board, classify_limits, limit_bounds};
use crate::streak::compute_streaks;
use chrono::NaiveDate;
use limitboard_core::common::{normalize_code, round2};
use limitboard_core::market::entity::{DailyBar, DerivedState, Snapshot};
use rayon::prelude::*;
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, info, warn};

/// # Summary
/// 入库预处理：标准化、校验、去重、排序。
///
/// # Logic
/// 1. 代码统一为 6 位纯数字形式。
/// 2. 畸形行（价格非正、非有限，成交量为负）记录告警后丢弃，批次继续。
/// 3. 按 (`symbol`, `trade_date`) 稳定排序，同键只保留输入中最后出现的一行。
///
/// # Arguments
/// * `bars`: 顺序任意的原始行情。
///
/// # Returns
/// 按 (`symbol`, `trade_date`) 严格升序的合法行情。
pub fn ingest(bars: Vec<DailyBar>) -> Vec<DailyBar> {
    let total = bars.len();
    let mut valid: Vec<DailyBar> = bars
        .into_iter()
        .map(|mut bar| {
            bar.symbol = normalize_code(&bar.symbol);
            bar
        })
        .filter(|bar| match bar.validate() {
            Ok(()) => true,
            Err(e) => {
                warn!("Skip row: {}", e);
                false
            }
        })
        .collect();

    valid.sort_by(|a, b| {
        a.symbol
            .cmp(&b.symbol)
            .then_with(|| a.trade_date.cmp(&b.trade_date))
    });

    let mut deduped: Vec<DailyBar> = Vec::with_capacity(valid.len());
    for bar in valid {
        match deduped.last_mut() {
            Some(last) if last.symbol == bar.symbol && last.trade_date == bar.trade_date => {
                *last = bar;
            }
            _ => deduped.push(bar),
        }
    }
    if deduped.len() != total {
        debug!("Ingested {} of {} rows after validation and dedup", deduped.len(), total);
    }
    deduped
}

/// 将已排序的行情切分为逐证券的连续片段。
fn split_by_symbol(bars: &[DailyBar]) -> Vec<&[DailyBar]> {
    bars.chunk_by(|a, b| a.symbol == b.symbol).collect()
}

/// # Summary
/// 对单只证券的完整历史运行全部计算器。
///
/// # Logic
/// 1. 逐行：以前一行收盘为昨收，按当行名称与代码判定板块，得出涨跌停价与三个标记。
/// 2. 整列：连板状态机、技术指标、K 线方向计数。
/// 3. 逐行拼装为 `DerivedState`。
///
/// # Arguments
/// * `bars`: 同一证券、按日期严格升序的行情。
///
/// # Invariants
/// - 首行没有昨收，涨跌停价为 None，标记全部为 false，不产生错误。
pub fn derive_symbol(bars: &[DailyBar]) -> Vec<DerivedState> {
    let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();

    let limits: Vec<_> = bars
        .iter()
        .enumerate()
        .map(|(i, bar)| {
            let prev_close = i.checked_sub(1).and_then(|p| closes.get(p)).copied();
            let board_class = classify_board(&bar.symbol, &bar.name);
            let limit_pct = board_class.limit_pct();
            let bounds = limit_bounds(prev_close, limit_pct);
            let flags = classify_limits(bar.high, bar.close, prev_close, limit_pct, bounds);
            (prev_close, board_class, limit_pct, bounds, flags)
        })
        .collect();

    let limit_up: Vec<bool> = limits.iter().map(|l| l.4.is_limit_up).collect();
    let streaks = compute_streaks(&limit_up);
    let indicators = compute_indicators(&closes);
    let candles = compute_candles(&bars.iter().map(|b| (b.open, b.close)).collect::<Vec<_>>());

    bars.iter()
        .zip(limits)
        .zip(streaks)
        .zip(indicators)
        .zip(candles)
        .map(
            |((((bar, (prev_close, board_class, limit_pct, bounds, flags)), streak), ind), candle)| {
                DerivedState {
                    symbol: bar.symbol.clone(),
                    name: bar.name.clone(),
                    trade_date: bar.trade_date,
                    open: bar.open,
                    high: bar.high,
                    low: bar.low,
                    close: bar.close,
                    volume: bar.volume,
                    amount: bar.amount,
                    turnover_pct: bar.turnover_pct,
                    prev_close,
                    change_pct: change_pct(bar.close, prev_close),
                    amplitude_pct: round2((bar.high - bar.low) / bar.low * 100.0),
                    board_class,
                    limit_pct,
                    limit_up_price: bounds.map(|b| b.limit_up_price),
                    limit_down_price: bounds.map(|b| b.limit_down_price),
                    is_limit_up: flags.is_limit_up,
                    is_limit_down: flags.is_limit_down,
                    is_break: flags.is_break,
                    streak_len: streak.streak_len,
                    board_label: streak.board_label,
                    ma5: ind.ma5,
                    ma10: ind.ma10,
                    ma20: ind.ma20,
                    rel_ma5: ind.rel_ma5,
                    rel_ma10: ind.rel_ma10,
                    rel_ma20: ind.rel_ma20,
                    ma_alignment: ind.ma_alignment,
                    ret5: ind.ret5,
                    ret10: ind.ret10,
                    ret20: ind.ret20,
                    is_up_candle: candle.is_up_candle,
                    is_down_candle: candle.is_down_candle,
                    up_streak_days: candle.up_streak_days,
                    down_streak_days: candle.down_streak_days,
                }
            },
        )
        .collect()
}

/// # Summary
/// 快照构建器：全量重建与增量合并的纯计算入口，不涉及任何 IO。
///
/// # Invariants
/// - 输出只取决于输入数据，与是否并行、线程调度无关。
#[derive(Debug, Clone, Copy)]
pub struct SnapshotBuilder {
    // 是否在 rayon 线程池上逐证券并行计算
    parallel: bool,
}

impl Default for SnapshotBuilder {
    fn default() -> Self {
        Self { parallel: true }
    }
}

impl SnapshotBuilder {
    pub fn new(parallel: bool) -> Self {
        Self { parallel }
    }

    /// 对已排序、去重的行情逐证券计算，按证券顺序拼接结果。
    fn derive_all(&self, bars: &[DailyBar]) -> Vec<DerivedState> {
        let groups = split_by_symbol(bars);
        let per_symbol: Vec<Vec<DerivedState>> = if self.parallel {
            groups.par_iter().map(|g| derive_symbol(g)).collect()
        } else {
            groups.iter().map(|g| derive_symbol(g)).collect()
        };
        per_symbol.into_iter().flatten().collect()
    }

    /// # Summary
    /// 从完整原始历史全量重建快照。
    ///
    /// # Arguments
    /// * `bars`: 全部原始行情，顺序任意。
    ///
    /// # Returns
    /// 新快照。
    pub fn rebuild(&self, bars: Vec<DailyBar>) -> Snapshot {
        let bars = ingest(bars);
        let rows = self.derive_all(&bars);
        let snapshot = Snapshot::from_rows(rows);
        info!(
            "Rebuilt snapshot: {} rows, {} symbols",
            snapshot.len(),
            snapshot.symbols().len()
        );
        snapshot
    }

    /// # Summary
    /// 将新抓取的行情增量合并进已有快照。
    ///
    /// # Logic
    /// 1. 新批次经入库预处理后为空则原样返回已有快照。
    /// 2. 对受影响的证券：由快照行还原原始行情，按日期 upsert 新行情（新数据优先），
    ///    整段重算该证券。
    /// 3. 未受影响证券的行原样保留。
    ///
    /// # Arguments
    /// * `existing`: 已有快照。
    /// * `new_bars`: 新行情，顺序任意。
    ///
    /// # Returns
    /// 合并后的快照；同一批次重复合并结果不变。
    pub fn merge(&self, existing: &Snapshot, new_bars: Vec<DailyBar>) -> Snapshot {
        let new_bars = ingest(new_bars);
        if new_bars.is_empty() {
            debug!("Merge called with empty batch, snapshot unchanged");
            return existing.clone();
        }

        let affected: BTreeSet<&str> = new_bars.iter().map(|b| b.symbol.as_str()).collect();

        let mut histories: BTreeMap<&str, BTreeMap<NaiveDate, DailyBar>> = BTreeMap::new();
        for &symbol in &affected {
            let history = histories.entry(symbol).or_default();
            for row in existing.symbol_rows(symbol) {
                history.insert(row.trade_date, row.to_bar());
            }
        }
        for bar in &new_bars {
            histories
                .entry(bar.symbol.as_str())
                .or_default()
                .insert(bar.trade_date, bar.clone());
        }
        let recompute: Vec<DailyBar> = histories
            .into_values()
            .flat_map(|h| h.into_values())
            .collect();

        let mut rows: Vec<DerivedState> = existing
            .rows()
            .iter()
            .filter(|r| !affected.contains(r.symbol.as_str()))
            .cloned()
            .collect();
        let recomputed = self.derive_all(&recompute);
        let recomputed_len = recomputed.len();
        rows.extend(recomputed);

        let snapshot = Snapshot::from_rows(rows);
        info!(
            "Merged {} new bars across {} symbols, {} rows recomputed, snapshot now {} rows",
            new_bars.len(),
            affected.len(),
            recomputed_len,
            snapshot.len()
        );
        snapshot
    }
}

/// 以默认配置全量重建。
pub fn rebuild(all_bars: Vec<DailyBar>) -> Snapshot {
    SnapshotBuilder::default().rebuild(all_bars)
}

/// 以默认配置增量合并。
pub fn merge(existing: &Snapshot, new_bars: Vec<DailyBar>) -> Snapshot {
    SnapshotBuilder::default().merge(existing, new_bars)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bar(symbol: &str, day: u32, close: f64) -> DailyBar {
        DailyBar {
            symbol: symbol.to_string(),
            name: "测试".to_string(),
            trade_date: NaiveDate::from_ymd_opt(2024, 3, day).unwrap(),
            open: close,
            high: close,
            low: close,
            close,
            volume: 100.0,
            amount: close * 100.0,
            turnover_pct: None,
        }
    }

    #[test]
    fn test_ingest_sorts_dedupes_and_normalizes() {
        let out = ingest(vec![
            bar("sz.000002", 2, 5.0),
            bar("600000", 2, 10.0),
            bar("600000", 1, 9.0),
            bar("600000", 2, 10.5),
            bar("600000", 3, -1.0),
        ]);
        let keys: Vec<(String, u32, f64)> = out
            .iter()
            .map(|b| (b.symbol.clone(), chrono::Datelike::day(&b.trade_date), b.close))
            .collect();
        assert_eq!(
            keys,
            vec![
                ("000002".to_string(), 2, 5.0),
                ("600000".to_string(), 1, 9.0),
                ("600000".to_string(), 2, 10.5),
            ]
        );
    }

    #[test]
    fn test_split_by_symbol() {
        let bars = ingest(vec![bar("600000", 1, 1.0), bar("000001", 1, 1.0), bar("600000", 2, 1.0)]);
        let groups = split_by_symbol(&bars);
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[1].len(), 2);
    }
}
