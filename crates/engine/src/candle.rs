/// 单行的 K 线方向与连续计数。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CandleMark {
    pub is_up_candle: bool,
    pub is_down_candle: bool,
    pub up_streak_days: u32,
    pub down_streak_days: u32,
}

/// # Summary
/// 计算单只证券的阳线 / 阴线连续天数。
///
/// # Logic
/// 1. 收盘 > 开盘为阳线，收盘 < 开盘为阴线，相等两者皆否。
/// 2. 两个计数器相互独立，各自在本方向中断时归零；平盘日两者同时归零。
///
/// # Arguments
/// * `bars`: 按日期升序排列的 (开盘价, 收盘价)。
pub fn compute_candles(bars: &[(f64, f64)]) -> Vec<CandleMark> {
    let mut up = 0u32;
    let mut down = 0u32;
    bars.iter()
        .map(|&(open, close)| {
            let is_up_candle = close > open;
            let is_down_candle = close < open;
            up = if is_up_candle { up.saturating_add(1) } else { 0 };
            down = if is_down_candle { down.saturating_add(1) } else { 0 };
            CandleMark {
                is_up_candle,
                is_down_candle,
                up_streak_days: up,
                down_streak_days: down,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters_reset_independently() {
        let marks = compute_candles(&[
            (10.0, 11.0),
            (11.0, 12.0),
            (12.0, 11.5),
            (11.5, 11.0),
            (11.0, 11.0),
            (11.0, 11.2),
        ]);
        let up: Vec<u32> = marks.iter().map(|m| m.up_streak_days).collect();
        let down: Vec<u32> = marks.iter().map(|m| m.down_streak_days).collect();
        assert_eq!(up, vec![1, 2, 0, 0, 0, 1]);
        assert_eq!(down, vec![0, 0, 1, 2, 0, 0]);
        assert!(!marks[4].is_up_candle && !marks[4].is_down_candle);
    }
}
