//! 系统监控
//!
//! Prometheus 指标：请求计数、重算计数与耗时、导出计数。

use anyhow::{Context, Result};
use prometheus::{Encoder, Histogram, HistogramOpts, IntCounter, Opts, Registry, TextEncoder};

/// 仪表板指标收集器
pub struct DashboardMetrics {
    /// Prometheus指标注册表
    registry: Registry,
    /// HTTP请求计数器
    pub http_requests_total: IntCounter,
    /// 场景重算计数器
    pub recompute_total: IntCounter,
    /// 场景重算耗时直方图
    pub recompute_duration_seconds: Histogram,
    /// 导出请求计数器
    pub exports_total: IntCounter,
}

impl DashboardMetrics {
    /// 创建并注册全部指标
    pub fn new() -> Result<Self> {
        let registry = Registry::new();

        let http_requests_total = IntCounter::with_opts(Opts::new(
            "capa_http_requests_total",
            "Total HTTP requests handled",
        ))
        .context("Failed to create http_requests_total")?;
        registry
            .register(Box::new(http_requests_total.clone()))
            .context("Failed to register http_requests_total")?;

        let recompute_total = IntCounter::with_opts(Opts::new(
            "capa_recompute_total",
            "Total scenario recomputations",
        ))
        .context("Failed to create recompute_total")?;
        registry
            .register(Box::new(recompute_total.clone()))
            .context("Failed to register recompute_total")?;

        let recompute_duration_seconds = Histogram::with_opts(HistogramOpts::new(
            "capa_recompute_duration_seconds",
            "Scenario recomputation duration",
        ))
        .context("Failed to create recompute_duration_seconds")?;
        registry
            .register(Box::new(recompute_duration_seconds.clone()))
            .context("Failed to register recompute_duration_seconds")?;

        let exports_total = IntCounter::with_opts(Opts::new(
            "capa_exports_total",
            "Total export requests (CSV + SVG)",
        ))
        .context("Failed to create exports_total")?;
        registry
            .register(Box::new(exports_total.clone()))
            .context("Failed to register exports_total")?;

        Ok(Self {
            registry,
            http_requests_total,
            recompute_total,
            recompute_duration_seconds,
            exports_total,
        })
    }

    /// Prometheus 文本格式输出
    pub fn gather(&self) -> Result<String> {
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        TextEncoder::new()
            .encode(&metric_families, &mut buffer)
            .context("Failed to encode metrics")?;
        String::from_utf8(buffer).context("Metrics output is not valid UTF-8")
    }
}
