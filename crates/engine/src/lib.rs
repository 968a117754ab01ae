pub mod builder;
pub mod candle;
pub mod indicator;
pub mod limit;
pub mod sentiment;
pub mod service;
pub mod streak;
pub mod window;
