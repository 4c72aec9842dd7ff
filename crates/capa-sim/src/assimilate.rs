//! 实际值同化
//!
//! 以固定权重指数平滑把上报实际值并入预测曲线。修正量在每个结算点更新并
//! 向后延续；预测序列始终由原始预测与实际值历史纯函数式重算，因此对同一
//! 周期重复同化是幂等的。

use std::collections::{BTreeMap, HashMap};

use capa_core::{ActualsPoint, CapaError, Cadence, ResourceKind, Result, Scenario};
use chrono::NaiveDate;
use tracing::{debug, warn};

/// 指数平滑权重 α
pub const SMOOTHING_ALPHA: f64 = 0.3;

/// 由原始预测与实际值重算同化后的预测序列
///
/// 结算点处 correction ← (1-α)·correction + α·(actual - raw)，其余日期
/// 沿用当前修正量。`overrides` 中的上报值优先于合成实际值。
pub(crate) fn smooth_forecast(
    dates: &[NaiveDate],
    forecast_raw: &[f64],
    actuals: &[f64],
    cadence: Cadence,
    today: NaiveDate,
    alpha: f64,
    overrides: &BTreeMap<NaiveDate, f64>,
) -> Vec<f64> {
    let mut correction = 0.0;
    let mut forecast = Vec::with_capacity(dates.len());

    for (t, date) in dates.iter().enumerate() {
        if cadence.is_boundary(*date) && *date <= today {
            let actual = overrides.get(date).copied().unwrap_or(actuals[t]);
            correction = (1.0 - alpha) * correction + alpha * (actual - forecast_raw[t]);
        }
        forecast.push(forecast_raw[t] + correction);
    }

    forecast
}

/// 实际值同化器
///
/// 持有会话内已同化周期的集合（系统中唯一跨调用状态）。
#[derive(Debug, Clone)]
pub struct Assimilator {
    alpha: f64,
    /// 每资源的上报值覆盖，按结算日排序
    overrides: HashMap<ResourceKind, BTreeMap<NaiveDate, f64>>,
}

impl Assimilator {
    /// 创建使用缺省 α 的同化器
    pub fn new() -> Self {
        Self::with_alpha(SMOOTHING_ALPHA)
    }

    pub fn with_alpha(alpha: f64) -> Self {
        Self {
            alpha,
            overrides: HashMap::new(),
        }
    }

    /// 把一个上报实际值并入场景预测
    ///
    /// 返回是否实际生效：非结算日或尚未结束的周期按无操作处理（预测原样
    /// 通过），不视为错误。
    pub fn assimilate(&mut self, scenario: &mut Scenario, point: ActualsPoint) -> Result<bool> {
        if !point.reported.is_finite() || point.reported < 0.0 {
            return Err(CapaError::Validation(format!(
                "实际值必须为非负有限数: {}",
                point.reported
            )));
        }

        let cadence = scenario.config.cadence;
        if !cadence.is_boundary(point.period_end) {
            warn!(
                "Ignoring actuals for {} at {}: not a {:?} period boundary",
                point.resource, point.period_end, cadence
            );
            return Ok(false);
        }
        if point.period_end > scenario.today {
            warn!(
                "Ignoring actuals for {} at {}: period has not elapsed yet",
                point.resource, point.period_end
            );
            return Ok(false);
        }

        self.overrides
            .entry(point.resource)
            .or_default()
            .insert(point.period_end, point.reported);

        self.recompute_resource(scenario, point.resource)?;
        debug!(
            "Assimilated actuals for {} at {}: {}",
            point.resource, point.period_end, point.reported
        );
        Ok(true)
    }

    /// 已同化周期（单调增长，不回溯删除）
    pub fn assimilated_periods(&self, resource: ResourceKind) -> Vec<NaiveDate> {
        self.overrides
            .get(&resource)
            .map(|m| m.keys().copied().collect())
            .unwrap_or_default()
    }

    pub fn is_assimilated(&self, resource: ResourceKind, period_end: NaiveDate) -> bool {
        self.overrides
            .get(&resource)
            .is_some_and(|m| m.contains_key(&period_end))
    }

    /// 丢弃全部上报历史（场景重新生成后调用）
    pub fn clear(&mut self) {
        self.overrides.clear();
    }

    fn recompute_resource(&self, scenario: &mut Scenario, resource: ResourceKind) -> Result<()> {
        let empty = BTreeMap::new();
        let overrides = self.overrides.get(&resource).unwrap_or(&empty);
        let cadence = scenario.config.cadence;
        let today = scenario.today;
        let alpha = self.alpha;

        let series = scenario
            .series
            .iter_mut()
            .find(|s| s.resource == resource)
            .ok_or_else(|| CapaError::NotFound(format!("资源序列不存在: {}", resource)))?;

        series.forecast = smooth_forecast(
            &series.dates,
            &series.forecast_raw,
            &series.actuals,
            cadence,
            today,
            alpha,
            overrides,
        );
        Ok(())
    }
}

impl Default for Assimilator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generator::generate;
    use capa_core::{Cadence, DriverConfig, ResourceKind};

    fn config_with_today(today: NaiveDate) -> DriverConfig {
        DriverConfig {
            year: 2025,
            today: Some(today),
            ..DriverConfig::default()
        }
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_alpha_blend_at_boundary() {
        // 第 10 个周日：2025-03-09
        let boundary = date(2025, 3, 9);
        let day_before = date(2025, 3, 8);

        // 参照场景止于结算日前一天，此时 boundary 处尚无任何同化
        let reference = generate(42, &config_with_today(day_before)).unwrap();
        let scenario_cfg = config_with_today(boundary);
        let mut scenario = generate(42, &scenario_cfg).unwrap();

        let idx = reference.series[0]
            .dates
            .iter()
            .position(|d| *d == boundary)
            .unwrap();
        let forecast_prev = reference.series[0].forecast[idx];
        let raw = scenario.series[0].forecast_raw[idx];
        let actual = raw * 1.2;

        let mut assimilator = Assimilator::new();
        let applied = assimilator
            .assimilate(
                &mut scenario,
                ActualsPoint {
                    resource: ResourceKind::Beds,
                    period_end: boundary,
                    reported: actual,
                },
            )
            .unwrap();
        assert!(applied);

        // 结算日取 0.3·actual + 0.7·旧预测
        let blended = scenario.series[0].forecast[idx];
        assert!((blended - (0.7 * forecast_prev + 0.3 * actual)).abs() < 1e-9);

        // 其后日期平移同一修正量（today 之后无新结算点）
        let shift = blended - raw;
        for t in (idx + 1)..scenario.series[0].len() {
            let observed = scenario.series[0].forecast[t] - scenario.series[0].forecast_raw[t];
            assert!((observed - shift).abs() < 1e-9);
        }
    }

    #[test]
    fn test_assimilation_is_idempotent() {
        let boundary = date(2025, 3, 9);
        let mut scenario = generate(42, &config_with_today(boundary)).unwrap();
        let mut assimilator = Assimilator::new();

        let point = ActualsPoint {
            resource: ResourceKind::Emergency,
            period_end: boundary,
            reported: 70.0,
        };

        assimilator.assimilate(&mut scenario, point).unwrap();
        let first_pass = scenario.series_for(ResourceKind::Emergency).unwrap().clone();

        assimilator.assimilate(&mut scenario, point).unwrap();
        let second_pass = scenario.series_for(ResourceKind::Emergency).unwrap();

        assert_eq!(first_pass.forecast, second_pass.forecast);
    }

    #[test]
    fn test_non_boundary_is_noop() {
        let today = date(2025, 3, 9);
        let mut scenario = generate(42, &config_with_today(today)).unwrap();
        let before = scenario.series[0].forecast.clone();

        let mut assimilator = Assimilator::new();
        // 周一不是周节奏的结算日
        let applied = assimilator
            .assimilate(
                &mut scenario,
                ActualsPoint {
                    resource: ResourceKind::Beds,
                    period_end: date(2025, 3, 10),
                    reported: 100.0,
                },
            )
            .unwrap();

        assert!(!applied);
        assert_eq!(before, scenario.series[0].forecast);
    }

    #[test]
    fn test_future_period_is_noop() {
        let today = date(2025, 3, 9);
        let mut scenario = generate(42, &config_with_today(today)).unwrap();
        let before = scenario.series[0].forecast.clone();

        let mut assimilator = Assimilator::new();
        let applied = assimilator
            .assimilate(
                &mut scenario,
                ActualsPoint {
                    resource: ResourceKind::Beds,
                    period_end: date(2025, 3, 16),
                    reported: 100.0,
                },
            )
            .unwrap();

        assert!(!applied);
        assert_eq!(before, scenario.series[0].forecast);
    }

    #[test]
    fn test_monthly_cadence_boundary() {
        let mut config = config_with_today(date(2025, 3, 15));
        config.cadence = Cadence::Monthly;
        let mut scenario = generate(42, &config).unwrap();
        let mut assimilator = Assimilator::new();

        let applied = assimilator
            .assimilate(
                &mut scenario,
                ActualsPoint {
                    resource: ResourceKind::Beds,
                    period_end: date(2025, 3, 1),
                    reported: 130.0,
                },
            )
            .unwrap();
        assert!(applied);
        assert!(assimilator.is_assimilated(ResourceKind::Beds, date(2025, 3, 1)));

        let ignored = assimilator
            .assimilate(
                &mut scenario,
                ActualsPoint {
                    resource: ResourceKind::Beds,
                    period_end: date(2025, 3, 2),
                    reported: 130.0,
                },
            )
            .unwrap();
        assert!(!ignored);
    }

    #[test]
    fn test_negative_actual_rejected() {
        let mut scenario = generate(42, &config_with_today(date(2025, 3, 9))).unwrap();
        let mut assimilator = Assimilator::new();

        let err = assimilator.assimilate(
            &mut scenario,
            ActualsPoint {
                resource: ResourceKind::Beds,
                period_end: date(2025, 3, 9),
                reported: -5.0,
            },
        );
        assert!(err.is_err());
    }
}
