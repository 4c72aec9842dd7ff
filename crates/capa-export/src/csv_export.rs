//! CSV 表格导出
//!
//! 每行一个 (日期, 资源)，列覆盖计划/预测/容量/实际值与全部驱动因子
//! 分解。数值保留 3 位小数；重新解析应在浮点容差内还原。

use capa_core::{CapaError, Result, Scenario};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// 导出行（同时作为重新解析的目标结构）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CsvRow {
    pub date: String,
    pub resource: String,
    pub plan: f64,
    pub forecast: f64,
    pub capacity: f64,
    pub actuals: f64,
    /// 已观测实际值；today 之后为空
    pub actuals_to_date: Option<f64>,
    pub gap: f64,
    pub norm_gap: f64,
    pub driver_epidemic: f64,
    pub driver_weather: f64,
    pub driver_events: f64,
    pub driver_length_of_stay: f64,
    pub driver_or_time: f64,
    pub driver_nurse_ratio: f64,
    pub driver_absences: f64,
    pub driver_cluster: f64,
    pub driver_residual: f64,
}

const HEADER: [&str; 18] = [
    "date",
    "resource",
    "plan",
    "forecast",
    "capacity",
    "actuals",
    "actuals_to_date",
    "gap",
    "norm_gap",
    "driver_epidemic",
    "driver_weather",
    "driver_events",
    "driver_length_of_stay",
    "driver_or_time",
    "driver_nurse_ratio",
    "driver_absences",
    "driver_cluster",
    "driver_residual",
];

fn fmt(value: f64) -> String {
    format!("{:.3}", value)
}

/// 导出整个场景为 CSV 文本
pub fn export_csv(scenario: &Scenario) -> Result<String> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer
        .write_record(HEADER)
        .map_err(|e| CapaError::Export(format!("CSV写入失败: {}", e)))?;

    for series in &scenario.series {
        for t in 0..series.len() {
            let date = series.dates[t];
            let gap = series.gap(t);
            let norm_gap = series.norm_gap(t);
            let observed = if date <= scenario.today {
                fmt(series.actuals[t])
            } else {
                String::new()
            };
            let d = &series.drivers[t];

            writer
                .write_record([
                    date.format("%Y-%m-%d").to_string(),
                    series.resource.as_str().to_string(),
                    fmt(series.plan[t]),
                    fmt(series.forecast[t]),
                    fmt(series.capacity[t]),
                    fmt(series.actuals[t]),
                    observed,
                    fmt(gap),
                    fmt(norm_gap),
                    fmt(d.epidemic),
                    fmt(d.weather),
                    fmt(d.events),
                    fmt(d.length_of_stay),
                    fmt(d.or_time),
                    fmt(d.nurse_ratio),
                    fmt(d.absences),
                    fmt(d.cluster),
                    fmt(d.residual),
                ])
                .map_err(|e| CapaError::Export(format!("CSV写入失败: {}", e)))?;
        }
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| CapaError::Export(format!("CSV缓冲回收失败: {}", e)))?;
    let text = String::from_utf8(bytes)
        .map_err(|e| CapaError::Export(format!("CSV编码失败: {}", e)))?;

    debug!("Exported CSV: {} bytes", text.len());
    Ok(text)
}

/// 重新解析导出的 CSV（往返测试与外部工具对接用）
pub fn parse_csv(data: &str) -> Result<Vec<CsvRow>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_reader(data.as_bytes());

    let mut rows = Vec::new();
    for record in reader.deserialize() {
        let row: CsvRow = record.map_err(|e| CapaError::Export(format!("CSV解析失败: {}", e)))?;
        rows.push(row);
    }
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use capa_core::{DriverConfig, ResourceKind};
    use capa_sim::generate;
    use chrono::NaiveDate;

    fn scenario() -> Scenario {
        let config = DriverConfig {
            year: 2025,
            today: Some(NaiveDate::from_ymd_opt(2025, 6, 30).unwrap()),
            ..DriverConfig::default()
        };
        generate(42, &config).unwrap()
    }

    #[test]
    fn test_export_shape() {
        let scenario = scenario();
        let text = export_csv(&scenario).unwrap();
        let rows = parse_csv(&text).unwrap();

        // 5 类资源 × 365 天
        assert_eq!(rows.len(), 5 * 365);
        assert!(text.starts_with("date,resource,plan"));
    }

    #[test]
    fn test_roundtrip_within_tolerance() {
        let scenario = scenario();
        let text = export_csv(&scenario).unwrap();
        let rows = parse_csv(&text).unwrap();

        let beds: Vec<&CsvRow> = rows
            .iter()
            .filter(|r| r.resource == ResourceKind::Beds.as_str())
            .collect();
        let series = scenario.series_for(ResourceKind::Beds).unwrap();
        assert_eq!(beds.len(), series.len());

        for (t, row) in beds.iter().enumerate() {
            assert_eq!(row.date, series.dates[t].format("%Y-%m-%d").to_string());
            assert!((row.plan - series.plan[t]).abs() < 1e-3);
            assert!((row.forecast - series.forecast[t]).abs() < 1e-3);
            assert!((row.capacity - series.capacity[t]).abs() < 1e-3);
            assert!((row.gap - series.gap(t)).abs() < 2e-3);
        }
    }

    #[test]
    fn test_unobserved_days_have_empty_actuals() {
        let scenario = scenario();
        let text = export_csv(&scenario).unwrap();
        let rows = parse_csv(&text).unwrap();

        for row in &rows {
            let date = NaiveDate::parse_from_str(&row.date, "%Y-%m-%d").unwrap();
            if date <= scenario.today {
                assert!(row.actuals_to_date.is_some());
            } else {
                assert!(row.actuals_to_date.is_none());
            }
        }
    }
}
