//! 错误定义模块

use thiserror::Error;

/// 容量规划系统统一错误类型
#[derive(Error, Debug)]
pub enum CapaError {
    #[error("配置错误: {0}")]
    Config(String),

    #[error("配置项超出取值范围: {field} = {value}，允许范围 [{min}, {max}]")]
    InvalidConfig {
        field: String,
        value: f64,
        min: f64,
        max: f64,
    },

    #[error("模拟错误: {0}")]
    Simulation(String),

    #[error("序列化错误: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("导出错误: {0}")]
    Export(String),

    #[error("验证错误: {0}")]
    Validation(String),

    #[error("资源未找到: {0}")]
    NotFound(String),

    #[error("IO错误: {0}")]
    Io(#[from] std::io::Error),

    #[error("系统内部错误: {0}")]
    Internal(String),
}

/// 容量规划系统统一结果类型
pub type Result<T> = std::result::Result<T, CapaError>;
