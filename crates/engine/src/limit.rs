//! 涨跌停价计算与涨停 / 跌停 / 炸板判定。

use limitboard_core::common::{BoardClass, PRICE_EPS, round2};

/// # Summary
/// 板块判定规则：(谓词, 类别)。
///
/// # Invariants
/// - 谓词入参为 (代码, 名称)。
pub struct BoardRule {
    pub class: BoardClass,
    pub matches: fn(&str, &str) -> bool,
}

/// 按优先级从上到下求值，首个命中者生效；均未命中时为主板。
pub const BOARD_RULES: &[BoardRule] = &[
    BoardRule {
        class: BoardClass::SpecialTreatment,
        matches: |_, name| name.contains("ST"),
    },
    BoardRule {
        class: BoardClass::ChiNextOrStar,
        matches: |code, _| code.starts_with("68") || code.starts_with("30"),
    },
    BoardRule {
        class: BoardClass::Neeq,
        matches: |code, _| code.starts_with('8') || code.starts_with('4') || code.starts_with('9'),
    },
];

/// # Summary
/// 判定单行所属板块。
///
/// # Logic
/// 顺序遍历 `BOARD_RULES`，返回首个命中规则的类别，否则为 `MainBoard`。
pub fn classify_board(code: &str, name: &str) -> BoardClass {
    BOARD_RULES
        .iter()
        .find(|rule| (rule.matches)(code, name))
        .map(|rule| rule.class)
        .unwrap_or(BoardClass::MainBoard)
}

/// 涨跌停价格阈值。
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LimitBounds {
    pub limit_up_price: f64,
    pub limit_down_price: f64,
}

/// # Summary
/// 由昨收与涨跌幅限制计算涨跌停价。
///
/// # Logic
/// 涨停价 = round(昨收 × (1 + pct), 2)；跌停价 = round(昨收 × (1 − pct), 2)。
///
/// # Returns
/// 首行没有昨收时返回 None（非致命，该行按非涨跌停处理）。
pub fn limit_bounds(prev_close: Option<f64>, limit_pct: f64) -> Option<LimitBounds> {
    let prev = prev_close?;
    Some(LimitBounds {
        limit_up_price: round2(prev * (1.0 + limit_pct)),
        limit_down_price: round2(prev * (1.0 - limit_pct)),
    })
}

/// 单行的涨停 / 跌停 / 炸板标记。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LimitFlags {
    pub is_limit_up: bool,
    pub is_limit_down: bool,
    pub is_break: bool,
}

/// 收盘涨跌幅 (%)，保留两位小数。
pub fn change_pct(close: f64, prev_close: Option<f64>) -> Option<f64> {
    prev_close.map(|prev| round2((close / prev - 1.0) * 100.0))
}

/// # Summary
/// 纯函数：按阈值判定涨停、跌停与炸板。
///
/// # Logic
/// 1. 涨停：收盘价(两位小数) ≥ 涨停价，或收盘涨跌幅(两位小数, %) ≥ 限制 × 100。
/// 2. 跌停：仅在非涨停时对称判定，保证二者互斥。
/// 3. 炸板：最高价(两位小数)等于涨停价，且收盘价(两位小数)严格低于涨停价。
///
/// # Arguments
/// * `high`, `close`: 当日最高、收盘价。
/// * `prev_close`: 昨收，首行为 None。
/// * `limit_pct`: 涨跌幅限制（小数形式）。
/// * `bounds`: 由 `limit_bounds` 计算的阈值。
pub fn classify_limits(
    high: f64,
    close: f64,
    prev_close: Option<f64>,
    limit_pct: f64,
    bounds: Option<LimitBounds>,
) -> LimitFlags {
    let Some(bounds) = bounds else {
        return LimitFlags::default();
    };
    let close_r = round2(close);
    let high_r = round2(high);
    let limit_pct_r = round2(limit_pct * 100.0);
    let change = change_pct(close, prev_close);

    let is_limit_up = close_r >= bounds.limit_up_price - PRICE_EPS
        || change.is_some_and(|c| c >= limit_pct_r - PRICE_EPS);
    let is_limit_down = !is_limit_up
        && (close_r <= bounds.limit_down_price + PRICE_EPS
            || change.is_some_and(|c| c <= -limit_pct_r + PRICE_EPS));
    let is_break = (high_r - bounds.limit_up_price).abs() < PRICE_EPS
        && close_r < bounds.limit_up_price - PRICE_EPS;

    LimitFlags {
        is_limit_up,
        is_limit_down,
        is_break,
    }
}
