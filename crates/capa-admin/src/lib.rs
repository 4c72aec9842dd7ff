//! # Capa Admin
//!
//! 运维支撑：应用配置管理、日志初始化与 Prometheus 指标。

pub mod config;
pub mod logging;
pub mod monitoring;

pub use config::AppConfig;
pub use logging::init_logging;
pub use monitoring::DashboardMetrics;
