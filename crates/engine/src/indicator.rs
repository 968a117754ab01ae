use crate::window::RollingWindow;
use limitboard_core::common::round2;
use limitboard_core::market::entity::MaAlignment;

/// 收益率与均线的统计周期。
pub const PERIODS: [usize; 3] = [5, 10, 20];

/// 单行的技术指标。
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IndicatorRow {
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
}

/// # Summary
/// P 行收益率 (%)。
///
/// # Returns
/// 前方不足 P 行时返回 None。
pub fn period_return(closes: &[f64], i: usize, period: usize) -> Option<f64> {
    if i < period {
        return None;
    }
    let base = closes.get(i - period)?;
    let close = closes.get(i)?;
    Some(round2((close / base - 1.0) * 100.0))
}

/// 收盘价相对均线的偏离 (%)。
pub fn relative_to_ma(close: f64, ma: f64) -> f64 {
    round2((close / ma - 1.0) * 100.0)
}

/// # Summary
/// 由 MA5 / MA10 / MA20 的两两大小关系判定均线排列。
pub fn ma_alignment(ma5: f64, ma10: f64, ma20: f64) -> MaAlignment {
    if ma5 > ma10 && ma10 > ma20 {
        MaAlignment::Bullish
    } else if ma5 < ma10 && ma10 < ma20 {
        MaAlignment::Bearish
    } else {
        MaAlignment::Mixed
    }
}

/// # Summary
/// 计算单只证券的收益率、均线与相对指标。
///
/// # Logic
/// 1. 三条均线各自维护一个滚动窗口，最小周期为 1，均值保留两位小数。
/// 2. 相对指标基于已舍入的均线计算。
/// 3. 收益率按行回看 P 行，行数不足为 None。
///
/// # Arguments
/// * `closes`: 按日期升序排列的收盘价。
pub fn compute_indicators(closes: &[f64]) -> Vec<IndicatorRow> {
    let mut w5 = RollingWindow::new(PERIODS[0]);
    let mut w10 = RollingWindow::new(PERIODS[1]);
    let mut w20 = RollingWindow::new(PERIODS[2]);

    let mut rows = Vec::with_capacity(closes.len());
    for (i, &close) in closes.iter().enumerate() {
        w5.push(close);
        w10.push(close);
        w20.push(close);
        let ma5 = round2(w5.mean().unwrap_or(close));
        let ma10 = round2(w10.mean().unwrap_or(close));
        let ma20 = round2(w20.mean().unwrap_or(close));

        rows.push(IndicatorRow {
            ma5,
            ma10,
            ma20,
            rel_ma5: relative_to_ma(close, ma5),
            rel_ma10: relative_to_ma(close, ma10),
            rel_ma20: relative_to_ma(close, ma20),
            ma_alignment: ma_alignment(ma5, ma10, ma20),
            ret5: period_return(closes, i, PERIODS[0]),
            ret10: period_return(closes, i, PERIODS[1]),
            ret20: period_return(closes, i, PERIODS[2]),
        });
    }
    rows
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_returns_need_full_lookback() {
        let closes: Vec<f64> = (1..=25).map(f64::from).collect();
        let rows = compute_indicators(&closes);
        assert_eq!(rows[4].ret5, None);
        // 第 5 行: 6 / 1 - 1 = 500%
        assert_eq!(rows[5].ret5, Some(500.0));
        assert_eq!(rows[9].ret10, None);
        assert_eq!(rows[10].ret10, Some(1000.0));
        assert_eq!(rows[19].ret20, None);
        assert_eq!(rows[20].ret20, Some(2000.0));
    }

    #[test]
    fn test_ma_min_period_one() {
        let rows = compute_indicators(&[10.0, 12.0, 14.0]);
        assert_eq!(rows[0].ma5, 10.0);
        assert_eq!(rows[1].ma5, 11.0);
        assert_eq!(rows[2].ma20, 12.0);
        assert_eq!(rows[0].rel_ma5, 0.0);
    }

    #[test]
    fn test_alignment() {
        // 持续上涨：短均线在上
        let up: Vec<f64> = (1..=30).map(f64::from).collect();
        assert_eq!(compute_indicators(&up)[29].ma_alignment, MaAlignment::Bullish);
        let down: Vec<f64> = (1..=30).rev().map(f64::from).collect();
        assert_eq!(compute_indicators(&down)[29].ma_alignment, MaAlignment::Bearish);
        // 首行三条均线相等
        assert_eq!(compute_indicators(&[5.0])[0].ma_alignment, MaAlignment::Mixed);
    }
}
