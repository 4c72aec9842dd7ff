//! 驱动因子曲线与资源权重表
//!
//! 外部指数（季节性、流行病、天气、活动）按日生成；内部/外部权重决定
//! 每类资源对各驱动因子的敏感度。

use capa_core::utils::days_in_year;
use capa_core::{DriverConfig, ResourceKind};
use chrono::{Datelike, NaiveDate};
use rand::rngs::StdRng;
use rand::Rng;

/// 外部驱动因子权重
#[derive(Debug, Clone, Copy)]
pub struct ExternalWeights {
    pub epidemic: f64,
    pub weather: f64,
    pub events: f64,
}

/// 内部驱动因子权重
#[derive(Debug, Clone, Copy)]
pub struct InternalWeights {
    pub length_of_stay: f64,
    pub or_time: f64,
    pub nurse_ratio: f64,
    pub absences: f64,
    pub cluster: f64,
}

/// 每类资源对外部因子的敏感度
pub fn external_weights(resource: ResourceKind) -> ExternalWeights {
    match resource {
        ResourceKind::Beds => ExternalWeights {
            epidemic: 0.9,
            weather: 0.5,
            events: 0.3,
        },
        ResourceKind::OperatingRoom => ExternalWeights {
            epidemic: 0.4,
            weather: 0.2,
            events: 0.5,
        },
        ResourceKind::Staff => ExternalWeights {
            epidemic: 0.3,
            weather: 0.2,
            events: 0.4,
        },
        ResourceKind::Outpatient => ExternalWeights {
            epidemic: 0.2,
            weather: 0.2,
            events: 0.6,
        },
        ResourceKind::Emergency => ExternalWeights {
            epidemic: 0.7,
            weather: 0.8,
            events: 0.4,
        },
    }
}

/// 每类资源对内部因子的敏感度
pub fn internal_weights(resource: ResourceKind) -> InternalWeights {
    match resource {
        ResourceKind::Beds => InternalWeights {
            length_of_stay: 0.7,
            or_time: 0.2,
            nurse_ratio: 0.4,
            absences: 0.6,
            cluster: 0.1,
        },
        ResourceKind::OperatingRoom => InternalWeights {
            length_of_stay: 0.1,
            or_time: 0.8,
            nurse_ratio: 0.3,
            absences: 0.4,
            cluster: 0.2,
        },
        ResourceKind::Staff => InternalWeights {
            length_of_stay: 0.2,
            or_time: 0.2,
            nurse_ratio: 0.9,
            absences: 0.7,
            cluster: 0.3,
        },
        ResourceKind::Outpatient => InternalWeights {
            length_of_stay: 0.3,
            or_time: 0.3,
            nurse_ratio: 0.4,
            absences: 0.5,
            cluster: 0.4,
        },
        ResourceKind::Emergency => InternalWeights {
            length_of_stay: 0.4,
            or_time: 0.2,
            nurse_ratio: 0.5,
            absences: 0.5,
            cluster: 0.2,
        },
    }
}

/// 按日生成的外部指数曲线
#[derive(Debug, Clone)]
pub struct ExternalIndices {
    /// 季节性（已乘强度）
    pub seasonality: Vec<f64>,
    /// 流行病/流感指数
    pub epidemic: Vec<f64>,
    /// 天气/事故风险
    pub weather: Vec<f64>,
    /// 节假日与活动脉冲
    pub events: Vec<f64>,
}

/// 节假日中心点（月, 日），前后各 2 天受影响
const HOLIDAYS: [(u32, u32); 5] = [(1, 1), (12, 24), (12, 31), (4, 1), (8, 1)];
/// 每年随机活动脉冲的数量
const IMPULSE_COUNT: usize = 6;

/// 生成全年外部指数
///
/// 季节性为年周期正弦；流感指数为冬季/晚秋两个高斯峰；天气风险为冬季
/// 余弦轮廓；活动脉冲由固定节假日加上种子随机的临时事件构成。
pub fn build_external_indices(
    dates: &[NaiveDate],
    config: &DriverConfig,
    rng: &mut StdRng,
) -> ExternalIndices {
    let n = dates.len();
    let days = days_in_year(config.year) as f64;

    let mut seasonality = Vec::with_capacity(n);
    let mut epidemic = Vec::with_capacity(n);
    let mut weather = Vec::with_capacity(n);
    let mut events = vec![0.0; n];

    for date in dates {
        let doy = date.ordinal() as f64;
        let base = (std::f64::consts::TAU * (doy / days + config.seasonality_phase)).sin();

        // 流感：冬季主峰 + 晚秋次峰
        let winter_peak = (-0.5 * ((doy - 15.0) / 18.0).powi(2)).exp();
        let autumn_peak = (-0.5 * ((doy - 330.0) / 20.0).powi(2)).exp();
        let flu = config.epidemic_strength * (0.7 * winter_peak + 0.5 * autumn_peak);

        // 天气：冬季风险轮廓（冰雪）叠加季节性残余
        let winter_profile = 0.5 * (1.0 + (std::f64::consts::TAU * (doy - 20.0) / days).cos());
        let weather_risk = config.weather_strength * (0.6 * winter_profile + 0.1 * base);

        seasonality.push(config.seasonality_strength * base);
        epidemic.push(flu);
        weather.push(weather_risk);
    }

    // 流感与天气曲线围绕年均值居中：外部因子重新分布季节性需求，
    // 不改变预测的年度总量
    center(&mut epidemic);
    center(&mut weather);

    // 固定节假日脉冲
    for (idx, date) in dates.iter().enumerate() {
        for (month, day) in HOLIDAYS {
            if date.month() == month && (date.day() as i64 - day as i64).abs() <= 2 {
                events[idx] += 0.4;
            }
        }
    }

    // 种子随机的临时活动（马拉松、展会等），影响当日与次日
    let impulse_days = rand::seq::index::sample(rng, n, IMPULSE_COUNT.min(n));
    for idx in impulse_days.iter() {
        let amplitude = rng.gen_range(0.2..0.5);
        events[idx] += amplitude;
        if idx + 1 < n {
            events[idx + 1] += amplitude;
        }
    }

    ExternalIndices {
        seasonality,
        epidemic,
        weather,
        events,
    }
}

fn center(values: &mut [f64]) {
    if values.is_empty() {
        return;
    }
    let mean = values.iter().sum::<f64>() / values.len() as f64;
    for v in values.iter_mut() {
        *v -= mean;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use capa_core::utils::date_range_for_year;
    use rand::SeedableRng;

    fn test_config() -> DriverConfig {
        DriverConfig {
            year: 2025,
            ..DriverConfig::default()
        }
    }

    #[test]
    fn test_indices_cover_horizon() {
        let config = test_config();
        let dates = date_range_for_year(config.year);
        let mut rng = StdRng::seed_from_u64(7);
        let indices = build_external_indices(&dates, &config, &mut rng);

        assert_eq!(indices.seasonality.len(), dates.len());
        assert_eq!(indices.epidemic.len(), dates.len());
        assert_eq!(indices.weather.len(), dates.len());
        assert_eq!(indices.events.len(), dates.len());
    }

    #[test]
    fn test_flu_peaks_in_winter() {
        let config = test_config();
        let dates = date_range_for_year(config.year);
        let mut rng = StdRng::seed_from_u64(7);
        let indices = build_external_indices(&dates, &config, &mut rng);

        // 冬季高于年均值，盛夏低于年均值
        let mid_january = indices.epidemic[14];
        let mid_july = indices.epidemic[195];
        assert!(mid_january > 0.0);
        assert!(mid_july < 0.0);
        assert!(mid_january - mid_july > 0.2);
    }

    #[test]
    fn test_curves_are_centered() {
        let config = test_config();
        let dates = date_range_for_year(config.year);
        let mut rng = StdRng::seed_from_u64(7);
        let indices = build_external_indices(&dates, &config, &mut rng);

        let mean = |v: &[f64]| v.iter().sum::<f64>() / v.len() as f64;
        assert!(mean(&indices.epidemic).abs() < 1e-9);
        assert!(mean(&indices.weather).abs() < 1e-9);
    }

    #[test]
    fn test_zero_strength_flattens_curves() {
        let mut config = test_config();
        config.epidemic_strength = 0.0;
        config.weather_strength = 0.0;
        config.seasonality_strength = 0.0;

        let dates = date_range_for_year(config.year);
        let mut rng = StdRng::seed_from_u64(7);
        let indices = build_external_indices(&dates, &config, &mut rng);

        assert!(indices.epidemic.iter().all(|v| *v == 0.0));
        assert!(indices.weather.iter().all(|v| *v == 0.0));
        assert!(indices.seasonality.iter().all(|v| *v == 0.0));
    }

    #[test]
    fn test_new_year_holiday_impulse() {
        let config = test_config();
        let dates = date_range_for_year(config.year);
        let mut rng = StdRng::seed_from_u64(7);
        let indices = build_external_indices(&dates, &config, &mut rng);

        // 1 月 1 日带固定节假日脉冲
        assert!(indices.events[0] >= 0.4);
    }
}
