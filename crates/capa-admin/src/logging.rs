//! 日志初始化
//!
//! tracing-subscriber 一次性初始化；RUST_LOG 环境变量优先于配置级别。

use anyhow::{Context, Result};
use tracing_subscriber::EnvFilter;

/// 初始化全局日志订阅器
pub fn init_logging(level: &str, format: &str) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .context("Invalid log filter")?;

    match format {
        "json" => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .try_init()
            .map_err(|e| anyhow::anyhow!("Failed to init logging: {}", e))?,
        _ => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .try_init()
            .map_err(|e| anyhow::anyhow!("Failed to init logging: {}", e))?,
    }

    Ok(())
}
