use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// # Summary
/// 板块类别枚举，决定单行行情的涨跌幅限制。
///
/// # Invariants
/// - 类别由代码前缀与名称共同决定，名称可能随时间变化（如被标记为 ST），
///   因此必须逐行判定，不得跨行缓存。
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum BoardClass {
    // 沪深主板 10%
    MainBoard,
    // 创业板 / 科创板 20%
    ChiNextOrStar,
    // 北交所 / 新三板 30%
    Neeq,
    // 风险警示股 (ST / *ST) 5%
    SpecialTreatment,
}

impl BoardClass {
    /// 该类别对应的涨跌幅限制（小数形式，例如 0.10）。
    pub fn limit_pct(self) -> f64 {
        match self {
            BoardClass::MainBoard => 0.10,
            BoardClass::ChiNextOrStar => 0.20,
            BoardClass::Neeq => 0.30,
            BoardClass::SpecialTreatment => 0.05,
        }
    }
}

impl FromStr for BoardClass {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "main" => Ok(BoardClass::MainBoard),
            "chinext_star" => Ok(BoardClass::ChiNextOrStar),
            "neeq" => Ok(BoardClass::Neeq),
            "st" => Ok(BoardClass::SpecialTreatment),
            _ => Err(format!("Unknown BoardClass: {}", s)),
        }
    }
}

impl std::fmt::Display for BoardClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BoardClass::MainBoard => write!(f, "main"),
            BoardClass::ChiNextOrStar => write!(f, "chinext_star"),
            BoardClass::Neeq => write!(f, "neeq"),
            BoardClass::SpecialTreatment => write!(f, "st"),
        }
    }
}

/// # Summary
/// 将价格或百分比四舍五入到 2 位小数。
///
/// # Logic
/// 放大 100 倍后取整再缩回，远离零方向舍入半分位。
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// 两位小数价格的比较容差。
pub const PRICE_EPS: f64 = 1e-6;

/// # Summary
/// 标准化证券代码。
///
/// # Logic
/// 1. 去除 `sh.` / `sz.` / `bj.` 或 `SH` / `SZ` / `BJ` 形式的交易所前缀。
/// 2. 纯数字代码左侧补零至 6 位。
///
/// # Arguments
/// * `raw`: 原始代码字符串。
///
/// # Returns
/// 标准化后的代码。
pub fn normalize_code(raw: &str) -> String {
    let trimmed = raw.trim();
    let mut code = trimmed;
    for prefix in ["sh.", "sz.", "bj.", "SH.", "SZ.", "BJ.", "sh", "sz", "bj", "SH", "SZ", "BJ"] {
        if let Some(rest) = trimmed.strip_prefix(prefix)
            && !rest.is_empty()
            && rest.chars().all(|c| c.is_ascii_digit())
        {
            code = rest;
            break;
        }
    }
    if !code.is_empty() && code.len() < 6 && code.chars().all(|c| c.is_ascii_digit()) {
        format!("{:0>6}", code)
    } else {
        code.to_string()
    }
}
