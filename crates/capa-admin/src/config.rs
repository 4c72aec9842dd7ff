//! 配置管理
//!
//! 分层加载应用配置：TOML 文件 + CAPA_ 前缀环境变量覆盖，带取值校验。

use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use tracing::info;

/// 应用完整配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// 服务器配置
    #[serde(default)]
    pub server: ServerConfig,
    /// 模拟默认值
    #[serde(default)]
    pub simulation: SimulationConfig,
    /// 日志配置
    #[serde(default)]
    pub logging: LoggingConfig,
    /// 监控配置
    #[serde(default)]
    pub monitoring: MonitoringConfig,
}

/// 服务器配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// 监听主机
    pub host: String,
    /// 监听端口
    pub port: u16,
    /// 静态文件目录
    pub static_dir: String,
    /// 启用CORS
    pub enable_cors: bool,
}

/// 模拟默认值
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationConfig {
    /// 会话初始种子
    pub default_seed: u64,
    /// 模拟年份（为空取当前年份）
    pub year: Option<i32>,
}

/// 日志配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// 日志级别
    pub level: String,
    /// 日志格式（pretty | json）
    pub format: String,
}

/// 监控配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitoringConfig {
    /// 启用指标端点
    pub enabled: bool,
}

impl AppConfig {
    /// 从文件与环境变量加载配置；path 为空时仅用默认值与环境变量
    pub fn load(path: Option<&str>) -> Result<AppConfig> {
        let mut builder = Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(File::with_name(path));
        }
        let settings = builder
            .add_source(Environment::with_prefix("CAPA").separator("_"))
            .build()
            .context("Failed to build configuration sources")?;

        let config: AppConfig = match settings.try_deserialize() {
            Ok(config) => config,
            // 无文件且无环境覆盖时回落到内置默认
            Err(_) if path.is_none() => AppConfig::default(),
            Err(e) => return Err(e).context("Failed to deserialize configuration"),
        };

        config.validate()?;
        if let Some(path) = path {
            info!("Configuration loaded from: {}", path);
        }
        Ok(config)
    }

    /// 校验配置
    pub fn validate(&self) -> Result<()> {
        if self.server.port == 0 {
            anyhow::bail!("server.port 不能为 0");
        }
        const LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];
        if !LEVELS.contains(&self.logging.level.as_str()) {
            anyhow::bail!("logging.level 无效: {}", self.logging.level);
        }
        if !["pretty", "json"].contains(&self.logging.format.as_str()) {
            anyhow::bail!("logging.format 无效: {}", self.logging.format);
        }
        if let Some(year) = self.simulation.year {
            if !(2020..=2035).contains(&year) {
                anyhow::bail!("simulation.year 超出范围: {}", year);
            }
        }
        Ok(())
    }

    /// 保存配置到 TOML 文件
    pub fn save(&self, path: &str) -> Result<()> {
        let text = toml::to_string_pretty(self).context("Failed to serialize configuration")?;
        std::fs::write(path, text).context("Failed to write configuration file")?;
        info!("Configuration saved to: {}", path);
        Ok(())
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            simulation: SimulationConfig::default(),
            logging: LoggingConfig::default(),
            monitoring: MonitoringConfig::default(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            static_dir: "./static".to_string(),
            enable_cors: true,
        }
    }
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            default_seed: 42,
            year: None,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

impl Default for MonitoringConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}
