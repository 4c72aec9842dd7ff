//! 周聚合
//!
//! 把每日序列滚入 ISO 周桶，供红绿灯热力图与迷你趋势图使用。

use std::collections::BTreeMap;

use capa_core::utils::iso_week;
use capa_core::{ResourceKind, Scenario, WeeklyAggregate};
use serde::{Deserialize, Serialize};

/// 每周每资源的缺口聚合
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeeklyGap {
    pub resource: ResourceKind,
    /// ISO 周序号
    pub week: u32,
    /// 周内绝对缺口合计
    pub gap: f64,
    /// 周内容量合计
    pub capacity: f64,
    /// 归一化缺口
    pub norm_gap: f64,
    /// 桶内天数
    pub days: usize,
}

/// 按 (资源, ISO 周) 聚合缺口
///
/// 容量在生成端钳制为正，周合计必然为正，无除零分支。
pub fn weekly_gaps(scenario: &Scenario) -> Vec<WeeklyGap> {
    let mut out = Vec::new();

    for series in &scenario.series {
        let mut buckets: BTreeMap<u32, (f64, f64, usize)> = BTreeMap::new();
        for t in 0..series.len() {
            let week = iso_week(series.dates[t]);
            let entry = buckets.entry(week).or_insert((0.0, 0.0, 0));
            entry.0 += series.forecast[t] - series.capacity[t];
            entry.1 += series.capacity[t];
            entry.2 += 1;
        }

        for (week, (gap, capacity, days)) in buckets {
            out.push(WeeklyGap {
                resource: series.resource,
                week,
                gap,
                capacity,
                norm_gap: gap / capacity,
                days,
            });
        }
    }

    out
}

/// 已观测周的实际/预测/容量合计（跨资源），迷你趋势图数据
///
/// 尚无已观测日期时回退为年初 30 天。
pub fn weekly_sparkline(scenario: &Scenario) -> Vec<WeeklyAggregate> {
    let mut buckets: BTreeMap<u32, (f64, f64, f64)> = BTreeMap::new();

    for series in &scenario.series {
        let elapsed: Vec<usize> = (0..series.len())
            .filter(|t| series.dates[*t] <= scenario.today)
            .collect();
        let indices = if elapsed.is_empty() {
            (0..series.len().min(30)).collect()
        } else {
            elapsed
        };

        for t in indices {
            let week = iso_week(series.dates[t]);
            let entry = buckets.entry(week).or_insert((0.0, 0.0, 0.0));
            entry.0 += series.actuals[t];
            entry.1 += series.forecast[t];
            entry.2 += series.capacity[t];
        }
    }

    buckets
        .into_iter()
        .map(|(week, (actuals, forecast, capacity))| WeeklyAggregate {
            week,
            actuals,
            forecast,
            capacity,
        })
        .collect()
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
    fn test_weekly_gaps_cover_all_resources() {
        let gaps = weekly_gaps(&scenario());
        for resource in ResourceKind::ALL {
            assert!(gaps.iter().any(|g| g.resource == resource));
        }
        // 跨年 ISO 周（周序号 1）会同时吸收年初与年末的数天
        for gap in &gaps {
            assert!(gap.capacity > 0.0);
            assert!(gap.days >= 1 && gap.days <= 10);
            assert!((gap.norm_gap - gap.gap / gap.capacity).abs() < 1e-12);
        }
    }

    #[test]
    fn test_sparkline_limited_to_observed_weeks() {
        let scenario = scenario();
        let spark = weekly_sparkline(&scenario);
        assert!(!spark.is_empty());
        // 6 月底为止约 26-27 个观测周
        assert!(spark.len() <= 28);
        for w in &spark {
            assert!(w.capacity > 0.0);
        }
    }

    #[test]
    fn test_sparkline_fallback_without_observations() {
        let config = DriverConfig {
            year: 2025,
            // 在模拟年之前，一天都未观测
            today: Some(NaiveDate::from_ymd_opt(2024, 6, 1).unwrap()),
            ..DriverConfig::default()
        };
        let scenario = generate(42, &config).unwrap();
        let spark = weekly_sparkline(&scenario);
        // 回退为年初 30 天，约 5 周
        assert!(!spark.is_empty());
        assert!(spark.len() <= 6);
    }
}
