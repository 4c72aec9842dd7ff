//! Web服务器

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
    routing::{get, post},
    Router,
};
use capa_core::Result;
use std::net::SocketAddr;
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    services::ServeDir,
    trace::TraceLayer,
};
use tracing::info;

use crate::handlers::{
    api_root, export_csv_handler, export_svg_handler, get_config, get_kpis, get_series,
    get_status, health, metrics_handler, post_assimilate, put_config, refresh, reset_config,
};
use crate::session::AppState;
use crate::static_files::create_default_static_files;

pub struct WebServer {
    addr: SocketAddr,
    app: Router,
}

impl WebServer {
    pub fn new(addr: SocketAddr, state: AppState, static_dir: &str, enable_cors: bool) -> Self {
        create_default_static_files(static_dir);
        let app = Self::create_app(state, static_dir, enable_cors);
        Self { addr, app }
    }

    fn create_app(state: AppState, static_dir: &str, enable_cors: bool) -> Router {
        let mut app = Router::new()
            // 根路径与健康检查
            .route("/", get(api_root))
            .route("/health", get(health))
            // 指标端点
            .route("/metrics", get(metrics_handler))
            // API路由
            .nest("/api/v1", api_routes())
            // 静态仪表板页面
            .nest_service("/static", ServeDir::new(static_dir))
            // 请求计数
            .layer(axum::middleware::from_fn_with_state(
                state.clone(),
                track_requests,
            ))
            .with_state(state)
            .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()));

        if enable_cors {
            app = app.layer(
                CorsLayer::new()
                    .allow_origin(Any)
                    .allow_methods(Any)
                    .allow_headers(Any),
            );
        }

        app
    }

    pub async fn run(self) -> Result<()> {
        info!("Starting dashboard web server on {}", self.addr);

        let listener = tokio::net::TcpListener::bind(self.addr).await?;
        axum::serve(listener, self.app).await?;

        Ok(())
    }
}

/// API v1 路由
fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/config", get(get_config).put(put_config))
        .route("/config/reset", post(reset_config))
        .route("/refresh", post(refresh))
        .route("/series", get(get_series))
        .route("/status", get(get_status))
        .route("/kpis", get(get_kpis))
        .route("/assimilate", post(post_assimilate))
        .route("/export/csv", get(export_csv_handler))
        .route("/export/svg", get(export_svg_handler))
}

/// 全局请求计数中间件
async fn track_requests(State(state): State<AppState>, request: Request, next: Next) -> Response {
    state.metrics.http_requests_total.inc();
    next.run(request).await
}
