use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// 全局应用配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub storage: StorageConfig,
    pub build: BuildConfig,
    pub log: LogConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    // 数据根目录
    pub data_dir: String,
    // 派生状态快照文件，相对于 data_dir
    pub snapshot_file: String,
    // 原始日 K 归档文件，相对于 data_dir
    pub bars_file: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildConfig {
    // 是否按证券并行计算
    pub parallel: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    // 默认日志级别，RUST_LOG 优先
    pub level: String,
    // 滚动日志目录，缺省时只输出到终端
    pub dir: Option<String>,
}

impl StorageConfig {
    pub fn snapshot_path(&self) -> PathBuf {
        PathBuf::from(&self.data_dir).join(&self.snapshot_file)
    }

    pub fn bars_path(&self) -> PathBuf {
        PathBuf::from(&self.data_dir).join(&self.bars_file)
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            storage: StorageConfig {
                data_dir: "data".to_string(),
                snapshot_file: "derived/limit_status.parquet".to_string(),
                bars_file: "raw/daily_bars.parquet".to_string(),
            },
            build: BuildConfig { parallel: true },
            log: LogConfig {
                level: "info".to_string(),
                dir: None,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.storage.data_dir, "data");
        assert_eq!(
            config.storage.snapshot_path(),
            PathBuf::from("data").join("derived/limit_status.parquet")
        );
        assert_eq!(
            config.storage.bars_path(),
            PathBuf::from("data").join("raw/daily_bars.parquet")
        );
        assert!(config.build.parallel);
        assert_eq!(config.log.level, "info");
        assert!(config.log.dir.is_none());
    }
}
