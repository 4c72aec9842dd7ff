//! HTTP处理器

use axum::{
    extract::{Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Json, Response},
};
use capa_analytics::{classify, summarize};
use capa_core::{ActualsPoint, CapaError, DriverConfig, ResourceKind};
use capa_export::{export_csv, export_svg};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::time::Instant;
use tracing::info;

use crate::session::AppState;

/// API 错误包装（把核心错误映射为 HTTP 响应）
pub struct ApiError(pub CapaError);

impl From<CapaError> for ApiError {
    fn from(err: CapaError) -> Self {
        ApiError(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            CapaError::NotFound(_) => StatusCode::NOT_FOUND,
            CapaError::InvalidConfig { .. }
            | CapaError::Validation(_)
            | CapaError::Config(_) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = Json(json!({
            "error": true,
            "message": self.0.to_string(),
            "status": status.as_u16()
        }));

        (status, body).into_response()
    }
}

type ApiResult<T> = std::result::Result<T, ApiError>;

/// API根路径处理器
pub async fn api_root(State(state): State<AppState>) -> impl IntoResponse {
    let session = state.session.read().await;
    Json(json!({
        "service": "Capa Dashboard API",
        "version": "1.0.0",
        "status": "running",
        "session_id": session.id(),
        "endpoints": {
            "health": "/health",
            "api": "/api/v1",
            "metrics": "/metrics",
            "dashboard": "/static/index.html"
        }
    }))
}

/// 健康检查处理器
pub async fn health() -> impl IntoResponse {
    Json(json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "version": "1.0.0"
    }))
}

/// 当前配置响应
#[derive(Debug, Serialize)]
pub struct ConfigResponse {
    pub session_id: uuid::Uuid,
    pub seed: u64,
    pub config: DriverConfig,
}

/// 读取当前驱动因子配置
pub async fn get_config(State(state): State<AppState>) -> impl IntoResponse {
    let session = state.session.read().await;
    Json(ConfigResponse {
        session_id: session.id(),
        seed: session.seed(),
        config: session.config().clone(),
    })
}

/// 替换驱动因子配置并重算
pub async fn put_config(
    State(state): State<AppState>,
    Json(config): Json<DriverConfig>,
) -> ApiResult<impl IntoResponse> {
    let started = Instant::now();
    let mut session = state.session.write().await;
    session.update_config(config)?;

    state.metrics.recompute_total.inc();
    state
        .metrics
        .recompute_duration_seconds
        .observe(started.elapsed().as_secs_f64());

    Ok(Json(json!({ "updated": true, "seed": session.seed() })))
}

/// 恢复默认配置
pub async fn reset_config(State(state): State<AppState>) -> ApiResult<impl IntoResponse> {
    let mut session = state.session.write().await;
    session.reset()?;
    state.metrics.recompute_total.inc();
    info!("Configuration reset to defaults");
    Ok(Json(json!({ "reset": true, "seed": session.seed() })))
}

/// 以新随机种子重绘
pub async fn refresh(State(state): State<AppState>) -> ApiResult<impl IntoResponse> {
    let started = Instant::now();
    let mut session = state.session.write().await;
    let seed = session.refresh()?;

    state.metrics.recompute_total.inc();
    state
        .metrics
        .recompute_duration_seconds
        .observe(started.elapsed().as_secs_f64());

    Ok(Json(json!({ "refreshed": true, "seed": seed })))
}

/// 序列查询参数
#[derive(Debug, Deserialize)]
pub struct SeriesQueryParams {
    pub resource: String,
}

/// 单资源序列响应
#[derive(Debug, Serialize)]
pub struct SeriesResponse {
    pub resource: ResourceKind,
    pub label: String,
    pub dates: Vec<NaiveDate>,
    pub plan: Vec<f64>,
    pub capacity: Vec<f64>,
    pub forecast: Vec<f64>,
    /// 已观测实际值；today 之后为 null
    pub actuals_to_date: Vec<Option<f64>>,
}

/// 单资源年度序列查询
pub async fn get_series(
    State(state): State<AppState>,
    Query(params): Query<SeriesQueryParams>,
) -> ApiResult<impl IntoResponse> {
    let resource = ResourceKind::parse(&params.resource)?;
    let session = state.session.read().await;
    let scenario = session.scenario();
    let series = scenario.series_for(resource)?;

    let actuals_to_date = series
        .dates
        .iter()
        .zip(&series.actuals)
        .map(|(date, actual)| {
            if *date <= scenario.today {
                Some(*actual)
            } else {
                None
            }
        })
        .collect();

    Ok(Json(SeriesResponse {
        resource,
        label: resource.label().to_string(),
        dates: series.dates.clone(),
        plan: series.plan.clone(),
        capacity: series.capacity.clone(),
        forecast: series.forecast.clone(),
        actuals_to_date,
    }))
}

/// 红绿灯看板
pub async fn get_status(State(state): State<AppState>) -> impl IntoResponse {
    let session = state.session.read().await;
    let records = classify(session.scenario());
    Json(records)
}

/// KPI 汇总
pub async fn get_kpis(State(state): State<AppState>) -> impl IntoResponse {
    let session = state.session.read().await;
    Json(summarize(session.scenario()))
}

/// 实际值上报请求
#[derive(Debug, Deserialize)]
pub struct AssimilateRequest {
    pub resource: String,
    pub period_end: NaiveDate,
    pub reported: f64,
}

/// 上报实际值并同化
pub async fn post_assimilate(
    State(state): State<AppState>,
    Json(request): Json<AssimilateRequest>,
) -> ApiResult<impl IntoResponse> {
    let resource = ResourceKind::parse(&request.resource)?;
    let mut session = state.session.write().await;
    let applied = session.assimilate(ActualsPoint {
        resource,
        period_end: request.period_end,
        reported: request.reported,
    })?;

    Ok(Json(json!({
        "applied": applied,
        "resource": resource,
        "period_end": request.period_end
    })))
}

/// CSV 导出
pub async fn export_csv_handler(State(state): State<AppState>) -> ApiResult<impl IntoResponse> {
    let session = state.session.read().await;
    let text = export_csv(session.scenario())?;
    state.metrics.exports_total.inc();

    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"capacity_dashboard.csv\"".to_string(),
            ),
        ],
        text,
    ))
}

/// SVG 导出查询参数
#[derive(Debug, Deserialize)]
pub struct SvgQueryParams {
    pub resource: String,
}

/// SVG 矢量图导出
pub async fn export_svg_handler(
    State(state): State<AppState>,
    Query(params): Query<SvgQueryParams>,
) -> ApiResult<impl IntoResponse> {
    let resource = ResourceKind::parse(&params.resource)?;
    let session = state.session.read().await;
    let svg = export_svg(session.scenario(), resource)?;
    state.metrics.exports_total.inc();

    Ok((
        [
            (header::CONTENT_TYPE, "image/svg+xml".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("inline; filename=\"annual_{}.svg\"", resource.as_str()),
            ),
        ],
        svg,
    ))
}

/// Prometheus 指标端点
pub async fn metrics_handler(State(state): State<AppState>) -> ApiResult<impl IntoResponse> {
    let text = state
        .metrics
        .gather()
        .map_err(|e| ApiError(CapaError::Internal(e.to_string())))?;
    Ok((
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        text,
    ))
}
