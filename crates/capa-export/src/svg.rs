//! SVG 矢量图导出
//!
//! 单资源的计划/预测/容量年度折线图，自包含文档：固定 viewBox、通用
//! 字体族，不引用外部字体或网络资源，可直接静态嵌入。

use capa_core::{ResourceKind, Result, Scenario};
use chrono::Datelike;
use tracing::debug;

const WIDTH: f64 = 960.0;
const HEIGHT: f64 = 420.0;
const MARGIN_LEFT: f64 = 64.0;
const MARGIN_RIGHT: f64 = 24.0;
const MARGIN_TOP: f64 = 48.0;
const MARGIN_BOTTOM: f64 = 52.0;

/// 三条曲线的固定样式：计划实线、预测虚线、容量点线
const CURVES: [(&str, &str, &str); 3] = [
    ("plan", "#424242", ""),
    ("forecast", "#1b5e20", "8 5"),
    ("capacity", "#0d47a1", "2 5"),
];

/// 导出单资源年度曲线为 SVG 文档
pub fn export_svg(scenario: &Scenario, resource: ResourceKind) -> Result<String> {
    let series = scenario.series_for(resource)?;
    let n = series.len();

    let plot_width = WIDTH - MARGIN_LEFT - MARGIN_RIGHT;
    let plot_height = HEIGHT - MARGIN_TOP - MARGIN_BOTTOM;

    let max_value = series
        .plan
        .iter()
        .chain(&series.forecast)
        .chain(&series.capacity)
        .fold(0.0_f64, |acc, v| acc.max(*v));
    let y_max = (max_value * 1.1).max(1.0);

    let x = |t: usize| MARGIN_LEFT + plot_width * t as f64 / (n.max(2) - 1) as f64;
    let y = |value: f64| MARGIN_TOP + plot_height * (1.0 - value / y_max);

    let mut svg = String::with_capacity(64 * 1024);
    svg.push_str(&format!(
        r#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 {} {}" font-family="sans-serif">"#,
        WIDTH, HEIGHT
    ));
    svg.push('\n');
    svg.push_str(&format!(
        r##"<rect width="{}" height="{}" fill="#ffffff"/>"##,
        WIDTH, HEIGHT
    ));
    svg.push('\n');

    // 标题
    svg.push_str(&format!(
        r##"<text x="{}" y="24" font-size="16" fill="#212121">{} 年度曲线（{}）</text>"##,
        MARGIN_LEFT,
        resource.label(),
        scenario.config.year
    ));
    svg.push('\n');

    // 水平网格与数值刻度
    for i in 0..=4 {
        let value = y_max * i as f64 / 4.0;
        let yy = y(value);
        svg.push_str(&format!(
            r##"<line x1="{}" y1="{:.1}" x2="{}" y2="{:.1}" stroke="#e0e0e0" stroke-width="1"/>"##,
            MARGIN_LEFT,
            yy,
            WIDTH - MARGIN_RIGHT,
            yy
        ));
        svg.push('\n');
        svg.push_str(&format!(
            r##"<text x="{}" y="{:.1}" font-size="11" fill="#757575" text-anchor="end">{:.0}</text>"##,
            MARGIN_LEFT - 8.0,
            yy + 4.0,
            value
        ));
        svg.push('\n');
    }

    // 月份刻度
    for (t, date) in series.dates.iter().enumerate() {
        if date.day() == 1 {
            let xx = x(t);
            svg.push_str(&format!(
                r##"<line x1="{:.1}" y1="{}" x2="{:.1}" y2="{}" stroke="#eeeeee" stroke-width="1"/>"##,
                xx,
                MARGIN_TOP,
                xx,
                HEIGHT - MARGIN_BOTTOM
            ));
            svg.push('\n');
            svg.push_str(&format!(
                r##"<text x="{:.1}" y="{}" font-size="11" fill="#757575" text-anchor="middle">{}月</text>"##,
                xx,
                HEIGHT - MARGIN_BOTTOM + 18.0,
                date.month()
            ));
            svg.push('\n');
        }
    }

    // 三条折线
    for (name, color, dash) in CURVES {
        let values = match name {
            "plan" => &series.plan,
            "forecast" => &series.forecast,
            _ => &series.capacity,
        };
        let points: Vec<String> = values
            .iter()
            .enumerate()
            .map(|(t, v)| format!("{:.1},{:.1}", x(t), y(*v)))
            .collect();
        let dash_attr = if dash.is_empty() {
            String::new()
        } else {
            format!(r#" stroke-dasharray="{}""#, dash)
        };
        svg.push_str(&format!(
            r#"<polyline fill="none" stroke="{}" stroke-width="2"{} points="{}"/>"#,
            color,
            dash_attr,
            points.join(" ")
        ));
        svg.push('\n');
    }

    // 图例
    let legend = [
        ("计划", "#424242"),
        ("预测", "#1b5e20"),
        ("可用容量", "#0d47a1"),
    ];
    let mut legend_x = WIDTH - MARGIN_RIGHT - 270.0;
    for (label, color) in legend {
        svg.push_str(&format!(
            r#"<rect x="{:.1}" y="14" width="14" height="4" fill="{}"/>"#,
            legend_x, color
        ));
        svg.push('\n');
        svg.push_str(&format!(
            r##"<text x="{:.1}" y="24" font-size="12" fill="#424242">{}</text>"##,
            legend_x + 20.0,
            label
        ));
        svg.push('\n');
        legend_x += 90.0;
    }

    svg.push_str("</svg>\n");
    debug!(
        "Exported SVG chart for {}: {} bytes",
        resource,
        svg.len()
    );
    Ok(svg)
}

#[cfg(test)]
mod tests {
    use super::*;
    use capa_core::DriverConfig;
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
    fn test_svg_document_shape() {
        let svg = export_svg(&scenario(), ResourceKind::Beds).unwrap();

        assert!(svg.starts_with("<svg"));
        assert!(svg.trim_end().ends_with("</svg>"));
        // 三条曲线各一条折线
        assert_eq!(svg.matches("<polyline").count(), 3);
        assert!(svg.contains("床位"));
    }

    #[test]
    fn test_svg_is_self_contained() {
        let svg = export_svg(&scenario(), ResourceKind::Emergency).unwrap();

        // 除命名空间外不引用任何外部资源
        assert!(!svg.contains("http://")
            || svg.matches("http://").count() == svg.matches("http://www.w3.org").count());
        assert!(!svg.contains("https://"));
        assert!(!svg.contains("@font-face"));
        assert!(!svg.contains("<script"));
        assert!(svg.contains(r#"font-family="sans-serif""#));
    }

    #[test]
    fn test_svg_covers_horizon() {
        let scenario = scenario();
        let svg = export_svg(&scenario, ResourceKind::Beds).unwrap();
        let series = scenario.series_for(ResourceKind::Beds).unwrap();

        // 每条折线逐日取点
        let first_polyline = svg
            .split("<polyline")
            .nth(1)
            .and_then(|s| s.split("points=\"").nth(1))
            .and_then(|s| s.split('"').next())
            .unwrap();
        assert_eq!(first_polyline.split(' ').count(), series.len());
    }
}
