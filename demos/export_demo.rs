//! 导出功能演示程序
//!
//! 生成场景后导出 CSV 表格与各资源的 SVG 年度曲线到 ./exports/。

use capa_core::{DriverConfig, ResourceKind};
use capa_export::{export_csv, export_svg, parse_csv};
use capa_sim::generate;
use chrono::NaiveDate;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    println!("📦 导出功能演示\n");

    let config = DriverConfig {
        year: 2025,
        today: Some(NaiveDate::from_ymd_opt(2025, 6, 30).unwrap()),
        ..DriverConfig::default()
    };
    let scenario = generate(42, &config)?;

    std::fs::create_dir_all("exports")?;

    // CSV 导出 + 往返校验
    let csv_text = export_csv(&scenario)?;
    std::fs::write("exports/capacity_dashboard.csv", &csv_text)?;
    let rows = parse_csv(&csv_text)?;
    println!("✅ CSV 导出: exports/capacity_dashboard.csv ({} 行)", rows.len());

    // 每类资源一张 SVG
    for resource in ResourceKind::ALL {
        let svg = export_svg(&scenario, resource)?;
        let path = format!("exports/annual_{}.svg", resource.as_str());
        std::fs::write(&path, &svg)?;
        println!("✅ SVG 导出: {} ({} 字节)", path, svg.len());
    }

    println!("\n✅ 演示完成");
    Ok(())
}
