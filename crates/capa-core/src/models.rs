//! 核心数据模型定义

use chrono::{Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{CapaError, Result};

/// 基准护患比（内部驱动因子的参考点）
pub const BASE_NURSE_RATIO: f64 = 5.0;
/// 基准缺勤率
pub const BASE_ABSENCE_RATE: f64 = 0.05;
/// 基准病区集群数
pub const BASE_CLUSTER_COUNT: u32 = 4;
/// 护患比安全上限，超出后建议文本附加人力提示
pub const SAFE_NURSE_RATIO: f64 = 6.0;
/// 可用度下限，保证 capacity[t] > 0
pub const MIN_AVAILABILITY: f64 = 0.05;

/// 资源类型
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    Beds,          // 床位
    OperatingRoom, // 手术室
    Staff,         // 护理人员
    Outpatient,    // 门诊
    Emergency,     // 急诊
}

impl ResourceKind {
    /// 固定遍历顺序（决定性要求：生成顺序不可依赖哈希）
    pub const ALL: [ResourceKind; 5] = [
        ResourceKind::Beds,
        ResourceKind::OperatingRoom,
        ResourceKind::Staff,
        ResourceKind::Outpatient,
        ResourceKind::Emergency,
    ];

    /// 每日需求基线（单位/天）
    pub fn baseline(&self) -> f64 {
        match self {
            ResourceKind::Beds => 120.0,
            ResourceKind::OperatingRoom => 75.0,
            ResourceKind::Staff => 90.0,
            ResourceKind::Outpatient => 60.0,
            ResourceKind::Emergency => 55.0,
        }
    }

    /// 接口层标识符
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceKind::Beds => "beds",
            ResourceKind::OperatingRoom => "operating_room",
            ResourceKind::Staff => "staff",
            ResourceKind::Outpatient => "outpatient",
            ResourceKind::Emergency => "emergency",
        }
    }

    /// 仪表板显示名称
    pub fn label(&self) -> &'static str {
        match self {
            ResourceKind::Beds => "床位",
            ResourceKind::OperatingRoom => "手术室",
            ResourceKind::Staff => "护理人员",
            ResourceKind::Outpatient => "门诊",
            ResourceKind::Emergency => "急诊",
        }
    }

    /// 从接口层标识符解析
    pub fn parse(s: &str) -> Result<ResourceKind> {
        ResourceKind::ALL
            .iter()
            .copied()
            .find(|r| r.as_str() == s)
            .ok_or_else(|| CapaError::NotFound(format!("未知资源类型: {}", s)))
    }
}

impl std::fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 实际值上报节奏
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Cadence {
    Weekly,
    Monthly,
}

impl Cadence {
    /// 该日期是否为一个上报周期的结算点
    ///
    /// 周节奏在周日结算，月节奏在次月 1 日结算（上一周期刚刚结束）。
    pub fn is_boundary(&self, date: NaiveDate) -> bool {
        match self {
            Cadence::Weekly => date.weekday() == chrono::Weekday::Sun,
            Cadence::Monthly => date.day() == 1,
        }
    }
}

/// 红绿灯阈值
///
/// `blue_threshold` 为空时取 `yellow_threshold` 的镜像作为蓝色（过剩）阈值。
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct StatusThresholds {
    /// 绿色缓冲区半宽
    pub green_buffer: f64,
    /// 黄色起始阈值，同时是红色下界
    pub yellow_threshold: f64,
    /// 蓝色（过剩）阈值，负方向取值；缺省镜像黄色阈值
    pub blue_threshold: Option<f64>,
}

impl StatusThresholds {
    /// 生效的蓝色阈值（正数表示，判断时取负）
    pub fn resolved_blue(&self) -> f64 {
        self.blue_threshold.unwrap_or(self.yellow_threshold)
    }

    /// 阈值区间校验
    pub fn validate(&self) -> Result<()> {
        check_range("thresholds.green_buffer", self.green_buffer, 0.01, 0.10)?;
        check_range(
            "thresholds.yellow_threshold",
            self.yellow_threshold,
            0.05,
            0.30,
        )?;
        if let Some(blue) = self.blue_threshold {
            check_range("thresholds.blue_threshold", blue, 0.05, 0.30)?;
        }
        if self.green_buffer >= self.yellow_threshold {
            return Err(CapaError::Validation(format!(
                "绿色缓冲 {} 必须小于黄色阈值 {}",
                self.green_buffer, self.yellow_threshold
            )));
        }
        Ok(())
    }
}

impl Default for StatusThresholds {
    fn default() -> Self {
        Self {
            green_buffer: 0.05,
            yellow_threshold: 0.15,
            blue_threshold: None,
        }
    }
}

/// 驱动因子配置
///
/// 一次仪表板会话的全部旋钮，由默认值创建、经 UI 修改，进程内有效，无持久化。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DriverConfig {
    /// 模拟年份
    pub year: i32,
    /// 预算增长率
    pub budget_growth: f64,
    /// 住院时长变化（天）
    pub los_delta_days: f64,
    /// 手术时长变化（分钟）
    pub or_time_delta_min: f64,
    /// 护患比
    pub nurse_ratio: f64,
    /// 缺勤/休假率
    pub absence_rate: f64,
    /// 病区集群数
    pub cluster_count: u32,
    /// 季节性强度
    pub seasonality_strength: f64,
    /// 季节性相位（年周期的比例，0 表示与自然年对齐）
    pub seasonality_phase: f64,
    /// 流行病/流感指数强度
    pub epidemic_strength: f64,
    /// 天气/事故驱动强度
    pub weather_strength: f64,
    /// 实际值上报节奏
    pub cadence: Cadence,
    /// 红绿灯阈值
    pub thresholds: StatusThresholds,
    /// 固定"今天"（测试与复现用；为空则取系统日期）
    pub today: Option<NaiveDate>,
}

impl DriverConfig {
    /// 校验全部旋钮是否落在 UI 允许的取值范围内
    pub fn validate(&self) -> Result<()> {
        check_range("year", self.year as f64, 2020.0, 2035.0)?;
        check_range("budget_growth", self.budget_growth, 0.0, 0.20)?;
        check_range("los_delta_days", self.los_delta_days, -1.0, 2.0)?;
        check_range("or_time_delta_min", self.or_time_delta_min, -20.0, 25.0)?;
        check_range("nurse_ratio", self.nurse_ratio, 3.0, 8.0)?;
        check_range("absence_rate", self.absence_rate, 0.0, 0.20)?;
        check_range("cluster_count", self.cluster_count as f64, 2.0, 10.0)?;
        check_range("seasonality_strength", self.seasonality_strength, 0.0, 2.0)?;
        check_range("seasonality_phase", self.seasonality_phase, 0.0, 1.0)?;
        check_range("epidemic_strength", self.epidemic_strength, 0.0, 1.5)?;
        check_range("weather_strength", self.weather_strength, 0.0, 1.5)?;
        self.thresholds.validate()
    }

    /// 解析"今天"：显式覆盖优先，其次当前日期（若落在模拟年内），否则年末
    pub fn resolve_today(&self) -> NaiveDate {
        if let Some(today) = self.today {
            return today;
        }
        let current = Utc::now().date_naive();
        if current.year() == self.year {
            current
        } else {
            NaiveDate::from_ymd_opt(self.year, 12, 31).expect("valid year-end date")
        }
    }
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            year: Utc::now().year(),
            budget_growth: 0.03,
            los_delta_days: 0.2,
            or_time_delta_min: 5.0,
            nurse_ratio: BASE_NURSE_RATIO,
            absence_rate: BASE_ABSENCE_RATE,
            cluster_count: BASE_CLUSTER_COUNT,
            seasonality_strength: 1.0,
            seasonality_phase: 0.0,
            epidemic_strength: 0.8,
            weather_strength: 0.6,
            cadence: Cadence::Weekly,
            thresholds: StatusThresholds::default(),
            today: None,
        }
    }
}

fn check_range(field: &str, value: f64, min: f64, max: f64) -> Result<()> {
    if !value.is_finite() || value < min || value > max {
        return Err(CapaError::InvalidConfig {
            field: field.to_string(),
            value,
            min,
            max,
        });
    }
    Ok(())
}

/// 缺口驱动因子
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum DriverKind {
    Epidemic,
    Weather,
    Events,
    LengthOfStay,
    OrTime,
    NurseRatio,
    Absences,
    Cluster,
    Residual,
}

impl DriverKind {
    pub const ALL: [DriverKind; 9] = [
        DriverKind::Epidemic,
        DriverKind::Weather,
        DriverKind::Events,
        DriverKind::LengthOfStay,
        DriverKind::OrTime,
        DriverKind::NurseRatio,
        DriverKind::Absences,
        DriverKind::Cluster,
        DriverKind::Residual,
    ];

    /// 仪表板显示名称
    pub fn label(&self) -> &'static str {
        match self {
            DriverKind::Epidemic => "流行病/流感",
            DriverKind::Weather => "天气/事故",
            DriverKind::Events => "活动效应",
            DriverKind::LengthOfStay => "住院时长",
            DriverKind::OrTime => "手术时长",
            DriverKind::NurseRatio => "护患比",
            DriverKind::Absences => "缺勤",
            DriverKind::Cluster => "病区集群",
            DriverKind::Residual => "其他",
        }
    }
}

/// 单日预测缺口按驱动因子的分解（单位与计划值相同）
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct DriverContributions {
    pub epidemic: f64,
    pub weather: f64,
    pub events: f64,
    pub length_of_stay: f64,
    pub or_time: f64,
    pub nurse_ratio: f64,
    pub absences: f64,
    pub cluster: f64,
    /// 余项，使分解之和等于 forecast_raw - plan
    pub residual: f64,
}

impl DriverContributions {
    /// 按因子取值
    pub fn get(&self, kind: DriverKind) -> f64 {
        match kind {
            DriverKind::Epidemic => self.epidemic,
            DriverKind::Weather => self.weather,
            DriverKind::Events => self.events,
            DriverKind::LengthOfStay => self.length_of_stay,
            DriverKind::OrTime => self.or_time,
            DriverKind::NurseRatio => self.nurse_ratio,
            DriverKind::Absences => self.absences,
            DriverKind::Cluster => self.cluster,
            DriverKind::Residual => self.residual,
        }
    }
}

/// 单一资源的年度序列
///
/// 不变式：所有序列共享同一时间索引且等长；capacity[t] > 0。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceSeries {
    pub resource: ResourceKind,
    pub dates: Vec<NaiveDate>,
    /// 计划（预算）曲线
    pub plan: Vec<f64>,
    /// 可用容量曲线
    pub capacity: Vec<f64>,
    /// 未同化的原始预测
    pub forecast_raw: Vec<f64>,
    /// 同化后的预测曲线
    pub forecast: Vec<f64>,
    /// 合成实际值（全年生成，today 之后视为未观测）
    pub actuals: Vec<f64>,
    /// 每日驱动因子分解
    pub drivers: Vec<DriverContributions>,
}

impl ResourceSeries {
    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    /// 单日绝对缺口
    pub fn gap(&self, t: usize) -> f64 {
        self.forecast[t] - self.capacity[t]
    }

    /// 单日归一化缺口
    pub fn norm_gap(&self, t: usize) -> f64 {
        self.gap(t) / self.capacity[t]
    }
}

/// 一次完整生成的结果：配置快照 + 各资源序列
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scenario {
    pub seed: u64,
    pub config: DriverConfig,
    /// 生成时解析出的"今天"
    pub today: NaiveDate,
    pub series: Vec<ResourceSeries>,
}

impl Scenario {
    /// 按资源取序列
    pub fn series_for(&self, resource: ResourceKind) -> Result<&ResourceSeries> {
        self.series
            .iter()
            .find(|s| s.resource == resource)
            .ok_or_else(|| CapaError::NotFound(format!("资源序列不存在: {}", resource)))
    }
}

/// 上报的实际值点，按节奏追加，不回溯修改
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct ActualsPoint {
    pub resource: ResourceKind,
    /// 周期结算日
    pub period_end: NaiveDate,
    pub reported: f64,
}

/// 红绿灯状态
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum StatusLevel {
    Green,
    Yellow,
    Red,
    Blue,
}

impl StatusLevel {
    /// 短缺方向的严重度排序：Blue < Green < Yellow < Red
    pub fn shortage_severity(&self) -> i8 {
        match self {
            StatusLevel::Blue => -1,
            StatusLevel::Green => 0,
            StatusLevel::Yellow => 1,
            StatusLevel::Red => 2,
        }
    }

    /// 仪表板颜色
    pub fn color(&self) -> &'static str {
        match self {
            StatusLevel::Green => "#2e7d32",
            StatusLevel::Yellow => "#f9a825",
            StatusLevel::Red => "#c62828",
            StatusLevel::Blue => "#1565c0",
        }
    }

    /// 仪表板显示名称
    pub fn label(&self) -> &'static str {
        match self {
            StatusLevel::Green => "绿",
            StatusLevel::Yellow => "黄",
            StatusLevel::Red => "红",
            StatusLevel::Blue => "蓝",
        }
    }
}

/// 每周每资源的红绿灯记录，渲染时重算，不落盘
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusRecord {
    pub resource: ResourceKind,
    /// ISO 周序号
    pub week: u32,
    /// 周内绝对缺口合计
    pub gap: f64,
    /// 归一化缺口
    pub gap_norm: f64,
    pub level: StatusLevel,
    /// 启发式建议文本
    pub recommendation: String,
}

/// 周聚合（迷你趋势图数据）
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct WeeklyAggregate {
    pub week: u32,
    pub actuals: f64,
    pub forecast: f64,
    pub capacity: f64,
}

/// 缺口驱动因子贡献（排行用）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DriverShare {
    pub kind: DriverKind,
    pub label: String,
    pub amount: f64,
}

/// KPI 汇总，纯派生数据
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KpiSummary {
    /// 本周利用率（%）
    pub utilization_pct: f64,
    /// 预测误差 MAPE（%）
    pub mape_pct: f64,
    /// 等待天数估算
    pub wait_days: f64,
    /// 取消率估算（%）
    pub cancellation_rate_pct: f64,
    /// 护理瓶颈评分（0-100）
    pub nurse_shortage_score: f64,
    /// 触发护理瓶颈标记的 ISO 周
    pub nurse_shortage_weeks: Vec<u32>,
    /// 缺口驱动因子 Top-3
    pub top_drivers: Vec<DriverShare>,
    /// 周聚合序列
    pub weekly: Vec<WeeklyAggregate>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resource_parse_roundtrip() {
        for r in ResourceKind::ALL {
            assert_eq!(ResourceKind::parse(r.as_str()).unwrap(), r);
        }
        assert!(ResourceKind::parse("icu").is_err());
    }

    #[test]
    fn test_default_config_is_valid() {
        let mut config = DriverConfig::default();
        config.year = 2025;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_out_of_range_rejected() {
        let mut config = DriverConfig {
            year: 2025,
            ..DriverConfig::default()
        };
        config.nurse_ratio = 11.0;
        let err = config.validate().unwrap_err();
        assert!(matches!(err, CapaError::InvalidConfig { .. }));

        let mut config = DriverConfig {
            year: 2025,
            ..DriverConfig::default()
        };
        config.absence_rate = -0.01;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_threshold_ordering_rejected() {
        let thresholds = StatusThresholds {
            green_buffer: 0.10,
            yellow_threshold: 0.08,
            blue_threshold: None,
        };
        assert!(thresholds.validate().is_err());
    }

    #[test]
    fn test_blue_threshold_mirrors_yellow() {
        let thresholds = StatusThresholds::default();
        assert_eq!(thresholds.resolved_blue(), thresholds.yellow_threshold);

        let asymmetric = StatusThresholds {
            blue_threshold: Some(0.10),
            ..StatusThresholds::default()
        };
        assert_eq!(asymmetric.resolved_blue(), 0.10);
    }

    #[test]
    fn test_cadence_boundaries() {
        // 2025-01-05 是周日
        let sunday = NaiveDate::from_ymd_opt(2025, 1, 5).unwrap();
        let monday = NaiveDate::from_ymd_opt(2025, 1, 6).unwrap();
        assert!(Cadence::Weekly.is_boundary(sunday));
        assert!(!Cadence::Weekly.is_boundary(monday));

        let first = NaiveDate::from_ymd_opt(2025, 2, 1).unwrap();
        let second = NaiveDate::from_ymd_opt(2025, 2, 2).unwrap();
        assert!(Cadence::Monthly.is_boundary(first));
        assert!(!Cadence::Monthly.is_boundary(second));
    }

    #[test]
    fn test_resolve_today_respects_override() {
        let pinned = NaiveDate::from_ymd_opt(2025, 6, 15).unwrap();
        let config = DriverConfig {
            year: 2025,
            today: Some(pinned),
            ..DriverConfig::default()
        };
        assert_eq!(config.resolve_today(), pinned);
    }
}
