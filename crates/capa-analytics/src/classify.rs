//! 红绿灯分类与处置建议
//!
//! 归一化缺口映射到四级状态；建议文本由 (资源, 状态) 查表生成，
//! 护患比超出安全上限时附加人力条款。

use capa_core::{
    ResourceKind, Scenario, StatusLevel, StatusRecord, StatusThresholds, SAFE_NURSE_RATIO,
};
use tracing::debug;

use crate::aggregate::weekly_gaps;

/// 归一化缺口映射为红绿灯状态
///
/// 边界归入更严重一侧：gap_norm == green_buffer 判黄，== yellow_threshold
/// 判红，== -blue_threshold 判蓝。蓝色阈值与绿色缓冲之间的轻度过剩视为绿。
pub fn classify_gap(gap_norm: f64, thresholds: &StatusThresholds) -> StatusLevel {
    if gap_norm >= thresholds.yellow_threshold {
        StatusLevel::Red
    } else if gap_norm >= thresholds.green_buffer {
        StatusLevel::Yellow
    } else if gap_norm <= -thresholds.resolved_blue() {
        StatusLevel::Blue
    } else {
        StatusLevel::Green
    }
}

/// 生成启发式处置建议
pub fn recommendation(
    resource: ResourceKind,
    gap: f64,
    capacity: f64,
    nurse_ratio: f64,
    thresholds: &StatusThresholds,
) -> String {
    if capacity <= 0.0 {
        return "容量未知，需人工核查。".to_string();
    }

    let gap_norm = gap / capacity;
    let level = classify_gap(gap_norm, thresholds);

    if level == StatusLevel::Green {
        return "无需干预，处于缓冲区间内。".to_string();
    }

    // 黄色状态只按 35% 力度干预
    let factor = if level == StatusLevel::Yellow { 0.35 } else { 1.0 };

    if level == StatusLevel::Blue {
        let release = (gap.abs() * factor / 2.0).ceil() as i64;
        return format!(
            "利用过剩产能：提前安排 {} 个预约，储备人力按需排班，弹性关闭闲置床位。",
            release
        );
    }

    let shortage = gap.max(0.0);
    let op_shift = (shortage * factor / capacity.max(1.0) * 100.0).ceil() as i64;
    let open_beds = (shortage * factor / 2.0).ceil() as i64;
    let staff_reassign = (shortage * factor / nurse_ratio.max(1e-6)).ceil() as i64;

    let mut suggestions = Vec::new();
    if matches!(
        resource,
        ResourceKind::OperatingRoom | ResourceKind::Outpatient
    ) && op_shift > 0
    {
        suggestions.push(format!("手术/门诊排程平滑 {}%", op_shift));
    }
    if matches!(resource, ResourceKind::Beds | ResourceKind::Emergency) && open_beds > 0 {
        suggestions.push(format!("临时开放 {} 张床位", open_beds));
    }
    if staff_reassign > 0 {
        suggestions.push(format!("改排 {} 个护理班次", staff_reassign));
    }
    if suggestions.is_empty() {
        let units = (gap_norm.abs() * 10.0).ceil().max(1.0) as i64;
        suggestions.push(format!("容量调整 {} 个单位", units));
    }

    let mut text = suggestions.join("，");
    if nurse_ratio > SAFE_NURSE_RATIO {
        text.push_str(&format!(
            "；护患比 {:.1} 已超安全上限，优先补充护理人力",
            nurse_ratio
        ));
    }
    text
}

/// 计算整个场景的红绿灯看板
///
/// 每周每资源一条记录，按严重度降序、缺口幅度降序排列。
pub fn classify(scenario: &Scenario) -> Vec<StatusRecord> {
    let thresholds = &scenario.config.thresholds;
    let nurse_ratio = scenario.config.nurse_ratio;

    let mut records: Vec<StatusRecord> = weekly_gaps(scenario)
        .into_iter()
        .map(|g| {
            let level = classify_gap(g.norm_gap, thresholds);
            let text = recommendation(g.resource, g.gap, g.capacity, nurse_ratio, thresholds);
            StatusRecord {
                resource: g.resource,
                week: g.week,
                gap: g.gap,
                gap_norm: g.norm_gap,
                level,
                recommendation: text,
            }
        })
        .collect();

    records.sort_by(|a, b| {
        b.level
            .shortage_severity()
            .cmp(&a.level.shortage_severity())
            .then(
                b.gap_norm
                    .abs()
                    .partial_cmp(&a.gap_norm.abs())
                    .unwrap_or(std::cmp::Ordering::Equal),
            )
    });

    debug!("Classified {} weekly status records", records.len());
    records
}
