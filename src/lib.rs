//! # Capa
//!
//! 医院容量规划仪表板（合成数据 MVP）的根 crate，汇聚核心流水线：
//! 配置 → 生成 → 同化 → 分类 → 聚合。

pub use capa_analytics;
pub use capa_core;
pub use capa_export;
pub use capa_sim;
