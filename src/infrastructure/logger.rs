//! 日志基础设施

use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::{non_blocking, rolling};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use super::config::LoggingConfig;

pub struct Logger;

impl Logger {
    /// 初始化日志系统
    ///
    /// 控制台始终输出；配置了 `log_dir` 时额外按日期分割写入文件。
    /// `RUST_LOG` 优先于配置中的级别。返回的 guard 必须在进程退出前保持存活，
    /// 否则文件日志会丢失。
    pub fn init(config: &LoggingConfig) -> std::io::Result<Option<WorkerGuard>> {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(&config.level));

        let (file_layer, guard) = match &config.log_dir {
            Some(dir) => {
                std::fs::create_dir_all(dir)?;
                let (writer, guard) = non_blocking(rolling::daily(dir, "wishlist"));
                let layer = fmt::layer()
                    .with_writer(writer)
                    .with_ansi(false) // 文件中不使用颜色
                    .with_target(false)
                    .with_thread_names(true);
                (Some(layer), Some(guard))
            }
            None => (None, None),
        };

        // 测试中可能重复初始化，忽略已存在的全局 subscriber
        let _ = tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_writer(std::io::stdout).with_ansi(true))
            .with(file_layer)
            .try_init();

        Ok(guard)
    }
}
