use config::{Config, ConfigError, Environment, File};
use limitboard_core::config::AppConfig;
use std::path::Path;

/// 默认配置文件名（不含扩展名），位于工作目录。
const DEFAULT_CONFIG_NAME: &str = "limitboard";

/// # Summary
/// 分层加载应用配置。
///
/// # Logic
/// 1. 以 `AppConfig::default()` 作为最底层。
/// 2. 指定了 `path` 时该文件必须存在；否则尝试可选的 `./limitboard.toml`。
/// 3. 环境变量 `LIMITBOARD__<SECTION>__<KEY>` 覆盖文件中的值。
/// 4. 命令行给出的数据目录最后覆盖。
///
/// # Arguments
/// * `path` - 命令行 `--config` 指定的文件。
/// * `data_dir` - 命令行 `--data-dir` 覆盖值。
pub fn load(path: Option<&Path>, data_dir: Option<&Path>) -> Result<AppConfig, ConfigError> {
    let defaults = Config::try_from(&AppConfig::default())?;
    let file = match path {
        Some(p) => File::from(p).required(true),
        None => File::with_name(DEFAULT_CONFIG_NAME).required(false),
    };

    let mut builder = Config::builder()
        .add_source(defaults)
        .add_source(file)
        .add_source(Environment::with_prefix("LIMITBOARD").separator("__"));
    if let Some(dir) = data_dir {
        builder = builder.set_override("storage.data_dir", dir.to_string_lossy().into_owned())?;
    }
    builder.build()?.try_deserialize()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_file_overrides_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("custom.toml");
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(b"[storage]\ndata_dir = \"/srv/limitboard\"\n\n[build]\nparallel = false\n")
            .unwrap();

        let config = load(Some(&path), None).unwrap();
        assert_eq!(config.storage.data_dir, "/srv/limitboard");
        assert_eq!(config.storage.snapshot_file, "derived/limit_status.parquet");
        assert!(!config.build.parallel);
        assert_eq!(config.log.level, "info");
    }

    #[test]
    fn test_cli_data_dir_wins() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("custom.toml");
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(b"[storage]\ndata_dir = \"/srv/limitboard\"\n").unwrap();

        let config = load(Some(&path), Some(Path::new("/tmp/override"))).unwrap();
        assert_eq!(config.storage.data_dir, "/tmp/override");
    }

    #[test]
    fn test_missing_explicit_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load(Some(&dir.path().join("absent.toml")), None).is_err());
    }
}
