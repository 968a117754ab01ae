//! 涨跌停派生状态表的领域核心：实体、端口 (trait) 与各域错误定义。

pub mod cache;
pub mod common;
pub mod config;
pub mod engine;
pub mod market;
pub mod store;
