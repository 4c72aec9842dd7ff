//! KPI 汇总
//!
//! 利用率、预测误差、等待天数、取消率与护理瓶颈指标，全部由场景序列
//! 纯函数派生。

use std::collections::BTreeMap;

use capa_core::utils::iso_week;
use capa_core::{
    DriverKind, DriverShare, KpiSummary, ResourceKind, Scenario, SAFE_NURSE_RATIO,
};
use tracing::debug;

use crate::aggregate::{weekly_gaps, weekly_sparkline};

/// 计算场景的 KPI 汇总
pub fn summarize(scenario: &Scenario) -> KpiSummary {
    let utilization_pct = utilization(scenario) * 100.0;
    let mape_pct = mape(scenario) * 100.0;
    let wait_days = wait_days(scenario);
    let cancellation_rate_pct = cancellation_rate(scenario) * 100.0;
    let (nurse_shortage_score, nurse_shortage_weeks) = nurse_shortage(scenario);
    let top_drivers = top_drivers(scenario, 3);
    let weekly = weekly_sparkline(scenario);

    debug!(
        "KPI summary: utilization={:.1}% mape={:.1}% wait_days={:.0}",
        utilization_pct, mape_pct, wait_days
    );

    KpiSummary {
        utilization_pct,
        mape_pct,
        wait_days,
        cancellation_rate_pct,
        nurse_shortage_score,
        nurse_shortage_weeks,
        top_drivers,
        weekly,
    }
}

/// 已观测日期索引；一天未观测时回退为前 7 天
fn elapsed_indices(scenario: &Scenario) -> Vec<usize> {
    let series = &scenario.series[0];
    let elapsed: Vec<usize> = (0..series.len())
        .filter(|t| series.dates[*t] <= scenario.today)
        .collect();
    if elapsed.is_empty() {
        (0..series.len().min(7)).collect()
    } else {
        elapsed
    }
}

/// 本周利用率：已观测实际值 / 容量，封顶 1.0
fn utilization(scenario: &Scenario) -> f64 {
    let current_week = iso_week(scenario.today);
    let mut actual_sum = 0.0;
    let mut capacity_sum = 0.0;

    for series in &scenario.series {
        for t in 0..series.len() {
            if iso_week(series.dates[t]) == current_week && series.dates[t] <= scenario.today {
                actual_sum += series.actuals[t];
                capacity_sum += series.capacity[t];
            }
        }
    }

    if capacity_sum <= 0.0 {
        return 0.0;
    }
    (actual_sum / capacity_sum).min(1.0)
}

/// MAPE：按 (周, 资源) 求和后的平均绝对百分比误差，零实际值的周计 0
fn mape(scenario: &Scenario) -> f64 {
    let indices = elapsed_indices(scenario);
    let mut groups: BTreeMap<(u32, ResourceKind), (f64, f64)> = BTreeMap::new();

    for series in &scenario.series {
        for &t in &indices {
            let key = (iso_week(series.dates[t]), series.resource);
            let entry = groups.entry(key).or_insert((0.0, 0.0));
            entry.0 += series.actuals[t];
            entry.1 += series.forecast[t];
        }
    }

    if groups.is_empty() {
        return 0.0;
    }

    let sum: f64 = groups
        .values()
        .map(|(actual, forecast)| {
            if *actual > 0.0 {
                (actual - forecast).abs() / actual
            } else {
                0.0
            }
        })
        .sum();
    sum / groups.len() as f64
}

/// 等待天数估算：已观测正缺口的累计
fn wait_days(scenario: &Scenario) -> f64 {
    let indices = elapsed_indices(scenario);
    scenario
        .series
        .iter()
        .map(|series| {
            indices
                .iter()
                .map(|&t| (series.forecast[t] - series.capacity[t]).max(0.0))
                .sum::<f64>()
        })
        .sum()
}

/// 取消率估算：基础率 0.5% 加上正归一化缺口的线性项
fn cancellation_rate(scenario: &Scenario) -> f64 {
    let indices = elapsed_indices(scenario);
    let mut sum = 0.0;
    let mut count = 0usize;

    for series in &scenario.series {
        for &t in &indices {
            let norm_gap = (series.forecast[t] - series.capacity[t]) / series.capacity[t];
            sum += 0.005 + 0.05 * norm_gap.max(0.0);
            count += 1;
        }
    }

    if count == 0 {
        return 0.0;
    }
    sum / count as f64
}

/// 护理瓶颈：0-100 评分 + 触发标记的 ISO 周
///
/// 评分由护理资源已观测平均归一化缺口分段线性映射；标记周要求
/// staff 周缺口达到黄色阈值且护患比超出安全上限。
fn nurse_shortage(scenario: &Scenario) -> (f64, Vec<u32>) {
    let indices = elapsed_indices(scenario);
    let score = match scenario.series_for(ResourceKind::Staff) {
        Ok(series) => {
            let mean_norm = indices
                .iter()
                .map(|&t| (series.forecast[t] - series.capacity[t]) / series.capacity[t])
                .sum::<f64>()
                / indices.len().max(1) as f64;
            interp(
                mean_norm,
                &[-0.1, 0.0, 0.3, 0.6],
                &[10.0, 30.0, 70.0, 95.0],
            )
        }
        Err(_) => 0.0,
    };

    let mut weeks = Vec::new();
    if scenario.config.nurse_ratio > SAFE_NURSE_RATIO {
        let yellow = scenario.config.thresholds.yellow_threshold;
        for gap in weekly_gaps(scenario) {
            if gap.resource == ResourceKind::Staff && gap.norm_gap >= yellow {
                weeks.push(gap.week);
            }
        }
    }

    (score, weeks)
}

/// 参考日各驱动因子贡献的 Top-N（按绝对值）
fn top_drivers(scenario: &Scenario, n: usize) -> Vec<DriverShare> {
    let series = &scenario.series[0];
    if series.is_empty() {
        return Vec::new();
    }
    // 参考日取 today，超出年度范围时取最近一端
    let reference = scenario
        .today
        .clamp(series.dates[0], *series.dates.last().expect("non-empty dates"));
    let idx = series
        .dates
        .iter()
        .position(|d| *d == reference)
        .unwrap_or(series.len() - 1);

    let mut shares: Vec<DriverShare> = DriverKind::ALL
        .iter()
        .map(|kind| {
            let amount: f64 = scenario
                .series
                .iter()
                .map(|s| s.drivers[idx].get(*kind))
                .sum();
            DriverShare {
                kind: *kind,
                label: kind.label().to_string(),
                amount,
            }
        })
        .collect();

    shares.sort_by(|a, b| {
        b.amount
            .abs()
            .partial_cmp(&a.amount.abs())
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    shares.truncate(n);
    shares
}

/// np.interp 风格的分段线性插值，端点外取端点值
fn interp(x: f64, xs: &[f64], ys: &[f64]) -> f64 {
    debug_assert_eq!(xs.len(), ys.len());
    if x <= xs[0] {
        return ys[0];
    }
    if x >= xs[xs.len() - 1] {
        return ys[ys.len() - 1];
    }
    for i in 1..xs.len() {
        if x <= xs[i] {
            let fraction = (x - xs[i - 1]) / (xs[i] - xs[i - 1]);
            return ys[i - 1] + fraction * (ys[i] - ys[i - 1]);
        }
    }
    ys[ys.len() - 1]
}
