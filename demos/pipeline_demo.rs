//! 容量规划流水线演示程序
//!
//! 展示核心流水线：生成合成场景、红绿灯分类、KPI 汇总与实际值同化。

use capa_analytics::{classify, summarize};
use capa_core::{ActualsPoint, DriverConfig, ResourceKind};
use capa_sim::{generate, Assimilator};
use chrono::NaiveDate;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 初始化日志
    tracing_subscriber::fmt::init();

    println!("🏥 容量规划流水线演示\n");

    // 1. 生成合成场景
    let config = DriverConfig {
        year: 2025,
        today: Some(NaiveDate::from_ymd_opt(2025, 6, 30).unwrap()),
        ..DriverConfig::default()
    };
    let mut scenario = generate(42, &config)?;
    println!("✅ 场景生成完成: seed=42, {} 类资源, {} 天", scenario.series.len(), scenario.series[0].len());

    // 2. 红绿灯看板
    let records = classify(&scenario);
    println!("\n📊 红绿灯看板（前 5 条，按严重度排序）:");
    for record in records.iter().take(5) {
        println!(
            "   KW {} - {}: {} • 缺口 {:.1} ({:.1}%) → {}",
            record.week,
            record.resource.label(),
            record.level.label(),
            record.gap,
            record.gap_norm * 100.0,
            record.recommendation
        );
    }

    // 3. KPI 汇总
    let kpis = summarize(&scenario);
    println!("\n📈 KPI 汇总:");
    println!("   利用率: {:.1}%", kpis.utilization_pct);
    println!("   预测误差 (MAPE): {:.1}%", kpis.mape_pct);
    println!("   等待天数: {:.0}", kpis.wait_days);
    println!("   取消率: {:.2}%", kpis.cancellation_rate_pct);
    println!("   护理瓶颈评分: {:.0}", kpis.nurse_shortage_score);
    println!("   缺口驱动 Top-3:");
    for share in &kpis.top_drivers {
        println!("     • {}: {:.1}", share.label, share.amount);
    }

    // 4. 上报一个实际值并同化
    let boundary = NaiveDate::from_ymd_opt(2025, 6, 29).unwrap(); // 周日
    let beds = scenario.series_for(ResourceKind::Beds)?;
    let idx = beds.dates.iter().position(|d| *d == boundary).unwrap();
    let reported = beds.forecast_raw[idx] * 1.2;

    let mut assimilator = Assimilator::new();
    let applied = assimilator.assimilate(
        &mut scenario,
        ActualsPoint {
            resource: ResourceKind::Beds,
            period_end: boundary,
            reported,
        },
    )?;
    println!("\n🔄 同化上报实际值: {} (applied={})", reported.round(), applied);

    let beds = scenario.series_for(ResourceKind::Beds)?;
    println!("   结算日预测: {:.1} (原始 {:.1})", beds.forecast[idx], beds.forecast_raw[idx]);

    println!("\n✅ 演示完成");
    Ok(())
}
