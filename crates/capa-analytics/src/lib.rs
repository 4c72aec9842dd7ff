//! # Capa Analytics
//!
//! 派生视图：红绿灯分类与建议、周聚合、KPI 汇总。全部为纯函数，
//! 每次渲染重算，不持有状态。

pub mod aggregate;
pub mod classify;
pub mod kpi;

pub use aggregate::{weekly_gaps, weekly_sparkline, WeeklyGap};
pub use classify::{classify, classify_gap, recommendation};
pub use kpi::summarize;
