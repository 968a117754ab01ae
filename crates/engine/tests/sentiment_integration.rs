use chrono::NaiveDate;
use limitboard_core::market::entity::DailyBar;
use limitboard_engine::builder::rebuild;
use limitboard_engine::sentiment::daily_market_stats;

fn date(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 7, d).unwrap()
}

fn bar(symbol: &str, d: u32, ohlc: (f64, f64, f64, f64)) -> DailyBar {
    let (open, high, low, close) = ohlc;
    DailyBar {
        symbol: symbol.to_string(),
        name: format!("样本{}", &symbol[4..]),
        trade_date: date(d),
        open,
        high,
        low,
        close,
        volume: 1_000_000.0,
        amount: 100_000_000.0,
        turnover_pct: None,
    }
}

fn flat(symbol: &str, d: u32) -> DailyBar {
    bar(symbol, d, (10.0, 10.0, 10.0, 10.0))
}

#[test]
fn test_daily_stats_match_hand_count() {
    let bars = vec![
        flat("600001", 1),
        flat("600002", 1),
        flat("600003", 1),
        flat("600004", 1),
        flat("600005", 1),
        // 600001: 第 2、3 日连续涨停
        bar("600001", 2, (10.0, 11.0, 10.0, 11.0)),
        bar("600001", 3, (11.0, 12.1, 11.0, 12.1)),
        // 600002: 第 2 日地天板，第 3 日再涨停
        bar("600002", 2, (9.5, 11.0, 9.0, 11.0)),
        bar("600002", 3, (11.0, 12.1, 11.0, 12.1)),
        // 600003: 第 3 日炸板
        flat("600003", 2),
        bar("600003", 3, (10.0, 11.0, 10.0, 10.8)),
        // 600004: 第 3 日跌停
        flat("600004", 2),
        bar("600004", 3, (10.0, 10.0, 9.0, 9.0)),
        // 600005: 平盘
        flat("600005", 2),
        flat("600005", 3),
    ];
    let snapshot = rebuild(bars);

    let day2 = daily_market_stats(&snapshot, date(2));
    assert_eq!(day2.limit_up, 2);
    assert_eq!(day2.floor_to_ceiling, 1);
    assert_eq!(day2.flat, 3);

    let stats = daily_market_stats(&snapshot, date(3));
    assert_eq!(stats.total, 5);
    assert_eq!(stats.advancing, 3);
    assert_eq!(stats.declining, 1);
    assert_eq!(stats.flat, 1);
    assert_eq!(stats.red_ratio_pct, 60.0);
    assert_eq!(stats.limit_up, 2);
    assert_eq!(stats.limit_down, 1);
    assert_eq!(stats.breaks, 1);
    assert_eq!(stats.floor_to_ceiling, 0);
    assert_eq!(stats.turnover_yi, 5.0);
    assert_eq!(stats.streak_distribution, [0, 2, 0, 0, 0, 0]);
    assert_eq!(stats.streak_rows, 2);
    assert_eq!(stats.highest_streak, 2);
    assert_eq!(
        stats.highest_names,
        vec!["样本01".to_string(), "样本02".to_string()]
    );
}

#[test]
fn test_first_day_has_no_direction() {
    let snapshot = rebuild(vec![flat("600001", 1), flat("000001", 1)]);
    let stats = daily_market_stats(&snapshot, date(1));
    assert_eq!(stats.total, 2);
    assert_eq!(stats.advancing + stats.declining + stats.flat, 0);
    assert_eq!(stats.red_ratio_pct, 0.0);
}

#[test]
fn test_unknown_date_is_all_zero() {
    let snapshot = rebuild(vec![flat("600001", 1)]);
    let stats = daily_market_stats(&snapshot, date(20));
    assert_eq!(stats.total, 0);
    assert_eq!(stats.limit_up, 0);
    assert_eq!(stats.turnover_yi, 0.0);
    assert_eq!(stats.trade_date, Some(date(20)));
}
