//! 按交易日汇总的市场情绪统计，消费快照中的派生状态。

use chrono::NaiveDate;
use limitboard_core::common::{PRICE_EPS, round2};
use limitboard_core::market::entity::{DerivedState, Snapshot};
use serde::{Deserialize, Serialize};

/// 连板高度分布的桶数：1..=5 各一桶，6 及以上合并为最后一桶。
pub const STREAK_BUCKETS: usize = 6;

/// # Summary
/// 单个交易日的全市场情绪统计。
///
/// # Invariants
/// - `advancing + declining + flat <= total`（首行无涨跌幅的证券不计入三者）。
/// - `streak_distribution` 各桶之和等于 `streak_rows`。
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DailyMarketStats {
    pub trade_date: Option<NaiveDate>,
    pub total: usize,
    pub advancing: usize,
    pub declining: usize,
    pub flat: usize,
    // 红盘率 (%)
    pub red_ratio_pct: f64,
    pub limit_up: usize,
    pub limit_down: usize,
    pub breaks: usize,
    // 地天板：最低触及跌停价，收盘封于涨停价
    pub floor_to_ceiling: usize,
    // 成交总额 (亿元)
    pub turnover_yi: f64,
    // [1板, 2板, 3板, 4板, 5板, 6板及以上]
    pub streak_distribution: [usize; STREAK_BUCKETS],
    pub highest_streak: u32,
    // 最高连板证券的名称，按代码升序
    pub highest_names: Vec<String>,
    pub streak_rows: usize,
}

fn count_f64(n: usize) -> f64 {
    f64::from(u32::try_from(n).unwrap_or(u32::MAX))
}

fn is_floor_to_ceiling(row: &DerivedState) -> bool {
    match (row.limit_down_price, row.limit_up_price) {
        (Some(down), Some(up)) => {
            (round2(row.low) - down).abs() < PRICE_EPS && (round2(row.close) - up).abs() < PRICE_EPS
        }
        _ => false,
    }
}

/// # Summary
/// 汇总某一交易日的市场情绪。
///
/// # Logic
/// 1. 以涨跌幅符号统计上涨、下跌、平盘家数，红盘率 = 上涨 / 总数 × 100。
/// 2. 直接读取涨停、跌停、炸板标记计数。
/// 3. 按 `streak_len` 分桶统计连板高度，记录最高连板高度及持有该高度的证券名称。
///
/// # Arguments
/// * `snapshot`: 完整快照。
/// * `date`: 交易日。
///
/// # Returns
/// 该日没有任何行时返回全零统计。
pub fn daily_market_stats(snapshot: &Snapshot, date: NaiveDate) -> DailyMarketStats {
    let rows = snapshot.by_date(date);
    if rows.is_empty() {
        return DailyMarketStats {
            trade_date: Some(date),
            ..DailyMarketStats::default()
        };
    }

    let mut stats = DailyMarketStats {
        trade_date: Some(date),
        total: rows.len(),
        ..DailyMarketStats::default()
    };
    let mut amount = 0.0;

    for row in &rows {
        match row.change_pct {
            Some(c) if c > 0.0 => stats.advancing += 1,
            Some(c) if c < 0.0 => stats.declining += 1,
            Some(_) => stats.flat += 1,
            None => {}
        }
        if row.is_limit_up {
            stats.limit_up += 1;
        }
        if row.is_limit_down {
            stats.limit_down += 1;
        }
        if row.is_break {
            stats.breaks += 1;
        }
        if is_floor_to_ceiling(row) {
            stats.floor_to_ceiling += 1;
        }
        amount += row.amount;

        if row.streak_len > 0 {
            stats.streak_rows += 1;
            let bucket = usize::try_from(row.streak_len)
                .unwrap_or(STREAK_BUCKETS)
                .min(STREAK_BUCKETS)
                - 1;
            if let Some(slot) = stats.streak_distribution.get_mut(bucket) {
                *slot += 1;
            }
            if row.streak_len > stats.highest_streak {
                stats.highest_streak = row.streak_len;
                stats.highest_names.clear();
            }
            if row.streak_len == stats.highest_streak {
                stats.highest_names.push(row.name.clone());
            }
        }
    }

    stats.red_ratio_pct = round2(count_f64(stats.advancing) / count_f64(stats.total) * 100.0);
    stats.turnover_yi = round2(amount / 1e8);
    stats
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_date_is_all_zero() {
        let date = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
        let stats = daily_market_stats(&Snapshot::default(), date);
        assert_eq!(stats.total, 0);
        assert_eq!(stats.red_ratio_pct, 0.0);
        assert_eq!(stats.streak_distribution, [0; STREAK_BUCKETS]);
        assert!(stats.highest_names.is_empty());
    }
}
