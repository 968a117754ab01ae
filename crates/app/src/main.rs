mod cli;
mod settings;

use std::sync::Arc;

use chrono::NaiveDate;
use clap::Parser;
use cli::{Cli, Commands};
use limitboard_cache::mem::MemCache;
use limitboard_core::config::LogConfig;
use limitboard_engine::builder::SnapshotBuilder;
use limitboard_engine::service::SnapshotService;
use limitboard_store::bars::ParquetBarStore;
use limitboard_store::snapshot::ParquetSnapshotStore;
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, prelude::*};

/// # Summary
/// 初始化日志：终端输出，配置了日志目录时另加按天滚动的文件输出。
///
/// # Returns
/// 文件输出的 WorkerGuard，必须持有到进程退出以保证日志刷盘。
fn init_tracing(log: &LogConfig) -> Result<Option<WorkerGuard>, Box<dyn std::error::Error>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&log.level));
    let stdout_layer = tracing_subscriber::fmt::layer().with_writer(std::io::stderr);

    match &log.dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, "limitboard.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let file_layer = tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(writer);
            tracing_subscriber::registry()
                .with(filter)
                .with(stdout_layer)
                .with(file_layer)
                .try_init()?;
            Ok(Some(guard))
        }
        None => {
            tracing_subscriber::registry()
                .with(filter)
                .with(stdout_layer)
                .try_init()?;
            Ok(None)
        }
    }
}

/// # Summary
/// 应用启动入口，纯粹的 DI 容器。
/// 负责实例化所有具体实现组件并通过 Arc<dyn Trait> 注入到 SnapshotService。
///
/// # Logic
/// 1. 解析命令行并分层加载配置。
/// 2. 初始化全局日志。
/// 3. 实例化基础设施层（快照存储、行情归档、查询缓存）。
/// 4. 构造应用服务层（SnapshotService）并执行子命令。
fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1. 命令行与配置
    let cli = Cli::parse();
    let config = settings::load(cli.config.as_deref(), cli.data_dir.as_deref())?;

    // 2. 初始化日志
    let _guard = init_tracing(&config.log)?;
    info!("LimitBoard starting, data dir {}", config.storage.data_dir);

    // 3. 实例化基础设施层
    let snapshot_store = Arc::new(ParquetSnapshotStore::new(config.storage.snapshot_path()));
    let bar_store = Arc::new(ParquetBarStore::new(config.storage.bars_path()));
    let cache = Arc::new(MemCache::new());

    // 4. 构造应用服务层
    let service = SnapshotService::new(
        snapshot_store,
        bar_store,
        cache,
        SnapshotBuilder::new(config.build.parallel),
    );

    match cli.command {
        Commands::Rebuild => {
            let snapshot = service.rebuild_and_commit()?;
            info!(
                "Rebuild finished: {} rows, latest trade date {:?}",
                snapshot.len(),
                snapshot.latest_date()
            );
        }
        Commands::Merge { bars } => {
            let batch = ParquetBarStore::read_file(&bars)?;
            let snapshot = service.merge_and_commit(batch)?;
            info!(
                "Merge finished: {} rows, latest trade date {:?}",
                snapshot.len(),
                snapshot.latest_date()
            );
        }
        Commands::Show { symbol, start, end } => {
            let rows = service.by_symbol_range(
                &symbol,
                start.unwrap_or(NaiveDate::MIN),
                end.unwrap_or(NaiveDate::MAX),
            )?;
            if rows.is_empty() {
                warn!("No rows for {}", symbol);
            }
            for row in rows {
                println!("{}", serde_json::to_string(&row)?);
            }
        }
        Commands::Stats { date } => {
            let date = match date {
                Some(d) => Some(d),
                None => service.read_all()?.latest_date(),
            };
            match date {
                Some(d) => {
                    let stats = service.market_stats(d)?;
                    println!("{}", serde_json::to_string_pretty(&stats)?);
                }
                None => warn!("Snapshot is empty, nothing to report"),
            }
        }
    }

    Ok(())
}
