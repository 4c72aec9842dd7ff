//! 合成序列生成器
//!
//! 由 (seed, DriverConfig) 生成五类资源的年度计划/容量/预测序列。
//! 同一 (seed, config) 必须产生逐位相同的输出，这是正确性要求而非优化。

use std::collections::BTreeMap;

use capa_core::utils::date_range_for_year;
use capa_core::{
    DriverConfig, DriverContributions, ResourceKind, ResourceSeries, Result, Scenario,
    BASE_ABSENCE_RATE, BASE_CLUSTER_COUNT, BASE_NURSE_RATIO, MIN_AVAILABILITY,
};
use chrono::{Datelike, NaiveDate, Weekday};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::info;

use crate::assimilate::{smooth_forecast, SMOOTHING_ALPHA};
use crate::drivers::{build_external_indices, external_weights, internal_weights, ExternalIndices};

/// 合成实际值的噪声幅度（基线的比例）
const NOISE_SCALE_RATIO: f64 = 0.08;

/// 生成一个完整场景
///
/// 生成后立即以合成实际值在 today 之前的各结算点做一轮自动同化，
/// 使 forecast 列处于"当前认知"状态。
pub fn generate(seed: u64, config: &DriverConfig) -> Result<Scenario> {
    config.validate()?;

    let dates = date_range_for_year(config.year);
    let today = config.resolve_today();
    let mut rng = StdRng::seed_from_u64(seed);
    let external = build_external_indices(&dates, config, &mut rng);

    let mut series = Vec::with_capacity(ResourceKind::ALL.len());
    for resource in ResourceKind::ALL {
        series.push(generate_resource(
            resource, &dates, today, config, &external, &mut rng,
        ));
    }

    info!(
        "Generated scenario: seed={} year={} horizon={} days, {} resources",
        seed,
        config.year,
        dates.len(),
        series.len()
    );

    Ok(Scenario {
        seed,
        config: config.clone(),
        today,
        series,
    })
}

fn generate_resource(
    resource: ResourceKind,
    dates: &[NaiveDate],
    today: NaiveDate,
    config: &DriverConfig,
    external: &ExternalIndices,
    rng: &mut StdRng,
) -> ResourceSeries {
    let base = resource.baseline();
    let ew = external_weights(resource);
    let iw = internal_weights(resource);
    let total_days = dates.len();
    let noise_scale = base * NOISE_SCALE_RATIO;

    let mut plan = Vec::with_capacity(total_days);
    let mut capacity = Vec::with_capacity(total_days);
    let mut forecast_raw = Vec::with_capacity(total_days);
    let mut actuals = Vec::with_capacity(total_days);
    let mut drivers = Vec::with_capacity(total_days);

    // 可用度由缺勤率决定，钳制在正下限之上：capacity[t] > 0 恒成立
    let availability =
        (0.9 + 0.1 * (1.0 - config.absence_rate / 0.12)).max(MIN_AVAILABILITY);

    for (idx, date) in dates.iter().enumerate() {
        let year_progress = idx as f64 / (total_days.max(2) - 1) as f64;
        let weekend_term = if matches!(date.weekday(), Weekday::Sat | Weekday::Sun) {
            0.05
        } else {
            -0.03
        };
        let trend_term = 0.05 * (year_progress - 0.5);

        let season = external.seasonality[idx];
        let flu = external.epidemic[idx];
        let weather = external.weather[idx];
        let events = external.events[idx];

        // 计划曲线：预算增长 + 季节性 + 周末/趋势修正
        let plan_base = base * (1.0 + config.budget_growth);
        let plan_value = plan_base * (1.0 + 0.25 * season + weekend_term + 0.3 * trend_term);

        // 内部因子按资源权重折算为百分比调整
        let los_pct = iw.length_of_stay * config.los_delta_days * 0.02;
        let or_pct = iw.or_time * (config.or_time_delta_min / 60.0) * 0.05;
        let nurse_pct =
            iw.nurse_ratio * ((BASE_NURSE_RATIO - config.nurse_ratio) / BASE_NURSE_RATIO) * 0.6;
        let absence_pct = iw.absences
            * ((config.absence_rate - BASE_ABSENCE_RATE) / BASE_ABSENCE_RATE.max(1e-3))
            * 0.4;
        let cluster_pct = iw.cluster
            * ((config.cluster_count as f64 - BASE_CLUSTER_COUNT as f64)
                / (BASE_CLUSTER_COUNT as f64))
            * 0.05;
        let internal_pct = los_pct + or_pct + nurse_pct + absence_pct + cluster_pct;

        // 外部因子
        let epidemic_pct = ew.epidemic * flu * 0.4;
        let weather_pct = ew.weather * weather * 0.3;
        let events_pct = ew.events * events * 0.2;
        let external_pct = epidemic_pct + weather_pct + events_pct;

        let raw = plan_value * (1.0 + internal_pct + external_pct);

        let capacity_value = (base * availability * (1.0 + 0.15 * season - 0.5 * weekend_term))
            .max(base * MIN_AVAILABILITY);

        let actual = (raw + next_gaussian(rng) * noise_scale).max(0.0);

        let mut contributions = DriverContributions {
            epidemic: plan_value * epidemic_pct,
            weather: plan_value * weather_pct,
            events: plan_value * events_pct,
            length_of_stay: plan_value * los_pct,
            or_time: plan_value * or_pct,
            nurse_ratio: plan_value * nurse_pct,
            absences: plan_value * absence_pct,
            cluster: plan_value * cluster_pct,
            residual: 0.0,
        };
        let explained = contributions.epidemic
            + contributions.weather
            + contributions.events
            + contributions.length_of_stay
            + contributions.or_time
            + contributions.nurse_ratio
            + contributions.absences
            + contributions.cluster;
        // 余项闭合分解：各因子之和等于 forecast_raw - plan
        contributions.residual = (raw - plan_value) - explained;

        plan.push(plan_value);
        capacity.push(capacity_value);
        forecast_raw.push(raw);
        actuals.push(actual);
        drivers.push(contributions);
    }

    // 自动同化：合成实际值在已结算周期并入预测
    let forecast = smooth_forecast(
        dates,
        &forecast_raw,
        &actuals,
        config.cadence,
        today,
        SMOOTHING_ALPHA,
        &BTreeMap::new(),
    );

    ResourceSeries {
        resource,
        dates: dates.to_vec(),
        plan,
        capacity,
        forecast_raw,
        forecast,
        actuals,
        drivers,
    }
}

/// Box–Muller 变换：由播种均匀源生成标准正态样本
fn next_gaussian(rng: &mut StdRng) -> f64 {
    let mut u1: f64 = rng.gen();
    while u1 < f64::MIN_POSITIVE {
        u1 = rng.gen();
    }
    let u2: f64 = rng.gen();
    (-2.0 * u1.ln()).sqrt() * (std::f64::consts::TAU * u2).cos()
}

#[cfg(test)]
mod tests {
    use super::*;
    use capa_core::{Cadence, StatusThresholds};

    fn pinned_config() -> DriverConfig {
        DriverConfig {
            year: 2025,
            today: Some(NaiveDate::from_ymd_opt(2025, 12, 31).unwrap()),
            ..DriverConfig::default()
        }
    }

    #[test]
    fn test_generation_is_deterministic() {
        let config = pinned_config();
        let a = generate(42, &config).unwrap();
        let b = generate(42, &config).unwrap();

        for (sa, sb) in a.series.iter().zip(&b.series) {
            assert_eq!(sa.resource, sb.resource);
            // 逐位一致
            assert_eq!(sa.plan, sb.plan);
            assert_eq!(sa.capacity, sb.capacity);
            assert_eq!(sa.forecast_raw, sb.forecast_raw);
            assert_eq!(sa.forecast, sb.forecast);
            assert_eq!(sa.actuals, sb.actuals);
        }
    }

    #[test]
    fn test_different_seeds_differ() {
        let config = pinned_config();
        let a = generate(42, &config).unwrap();
        let b = generate(43, &config).unwrap();
        assert_ne!(a.series[0].actuals, b.series[0].actuals);
    }

    #[test]
    fn test_series_are_parallel() {
        let scenario = generate(42, &pinned_config()).unwrap();
        assert_eq!(scenario.series.len(), ResourceKind::ALL.len());
        for series in &scenario.series {
            let n = series.dates.len();
            assert_eq!(n, 365);
            assert_eq!(series.plan.len(), n);
            assert_eq!(series.capacity.len(), n);
            assert_eq!(series.forecast_raw.len(), n);
            assert_eq!(series.forecast.len(), n);
            assert_eq!(series.actuals.len(), n);
            assert_eq!(series.drivers.len(), n);
        }
    }

    #[test]
    fn test_capacity_stays_positive_at_extremes() {
        // 网格覆盖滑块极值
        for absence in [0.0, 0.10, 0.20] {
            for season in [0.0, 2.0] {
                for cluster in [2, 10] {
                    let config = DriverConfig {
                        absence_rate: absence,
                        seasonality_strength: season,
                        cluster_count: cluster,
                        ..pinned_config()
                    };
                    let scenario = generate(7, &config).unwrap();
                    for series in &scenario.series {
                        assert!(
                            series.capacity.iter().all(|c| *c > 0.0),
                            "capacity must stay positive for absence={} season={}",
                            absence,
                            season
                        );
                    }
                }
            }
        }

        // 种子随机模糊测试：在合法范围内随机取值
        let mut rng = StdRng::seed_from_u64(99);
        for _ in 0..25 {
            let config = DriverConfig {
                budget_growth: rng.gen_range(0.0..=0.20),
                los_delta_days: rng.gen_range(-1.0..=2.0),
                or_time_delta_min: rng.gen_range(-20.0..=25.0),
                nurse_ratio: rng.gen_range(3.0..=8.0),
                absence_rate: rng.gen_range(0.0..=0.20),
                cluster_count: rng.gen_range(2..=10),
                seasonality_strength: rng.gen_range(0.0..=2.0),
                seasonality_phase: rng.gen_range(0.0..=1.0),
                epidemic_strength: rng.gen_range(0.0..=1.5),
                weather_strength: rng.gen_range(0.0..=1.5),
                cadence: Cadence::Weekly,
                thresholds: StatusThresholds::default(),
                ..pinned_config()
            };
            let scenario = generate(rng.gen(), &config).unwrap();
            for series in &scenario.series {
                assert!(series.capacity.iter().all(|c| *c > 0.0));
            }
        }
    }

    #[test]
    fn test_forecast_mean_tracks_plan_mean() {
        // seed=42、默认旋钮：合成噪声不应使预测均值偏离计划均值 ±5% 以上
        let scenario = generate(42, &pinned_config()).unwrap();
        let beds = scenario.series_for(ResourceKind::Beds).unwrap();

        let mean = |v: &[f64]| v.iter().sum::<f64>() / v.len() as f64;
        let plan_mean = mean(&beds.plan);
        let forecast_mean = mean(&beds.forecast);

        let ratio = forecast_mean / plan_mean;
        assert!(
            (ratio - 1.0).abs() < 0.05,
            "forecast mean drifted: ratio={}",
            ratio
        );
    }

    #[test]
    fn test_driver_decomposition_closes() {
        let scenario = generate(42, &pinned_config()).unwrap();
        for series in &scenario.series {
            for t in 0..series.len() {
                let d = &series.drivers[t];
                let sum = d.epidemic
                    + d.weather
                    + d.events
                    + d.length_of_stay
                    + d.or_time
                    + d.nurse_ratio
                    + d.absences
                    + d.cluster
                    + d.residual;
                let gap = series.forecast_raw[t] - series.plan[t];
                assert!((sum - gap).abs() < 1e-9);
            }
        }
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = DriverConfig {
            nurse_ratio: 20.0,
            ..pinned_config()
        };
        assert!(generate(42, &config).is_err());
    }

    #[test]
    fn test_actuals_nonnegative() {
        let scenario = generate(42, &pinned_config()).unwrap();
        for series in &scenario.series {
            assert!(series.actuals.iter().all(|a| *a >= 0.0));
        }
    }
}
