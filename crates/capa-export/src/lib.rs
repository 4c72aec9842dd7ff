//! # Capa Export
//!
//! 仪表板数据导出：按日明细的 CSV 表格与单资源年度曲线的 SVG 矢量图。

pub mod csv_export;
pub mod svg;

pub use csv_export::{export_csv, parse_csv, CsvRow};
pub use svg::export_svg;
