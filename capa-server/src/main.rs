//! 容量规划服务器主程序

use std::net::SocketAddr;

use capa_admin::{init_logging, AppConfig, DashboardMetrics};
use capa_core::DriverConfig;
use capa_web::{AppState, DashboardSession, WebServer};
use clap::Parser;
use tracing::{error, info};

/// 容量规划服务器命令行参数
#[derive(Parser, Debug)]
#[command(name = "capa-server")]
#[command(about = "医院容量规划仪表板服务器（合成数据 MVP）")]
struct Args {
    /// 监听主机
    #[arg(long)]
    host: Option<String>,

    /// 服务器端口
    #[arg(short, long)]
    port: Option<u16>,

    /// 配置文件路径
    #[arg(short, long)]
    config: Option<String>,

    /// 日志级别（覆盖配置文件）
    #[arg(short, long)]
    log_level: Option<String>,

    /// 会话初始种子（覆盖配置文件）
    #[arg(short, long)]
    seed: Option<u64>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // 加载配置并套用命令行覆盖
    let mut app_config = AppConfig::load(args.config.as_deref())?;
    if let Some(host) = args.host {
        app_config.server.host = host;
    }
    if let Some(port) = args.port {
        app_config.server.port = port;
    }
    if let Some(level) = args.log_level {
        app_config.logging.level = level;
    }
    if let Some(seed) = args.seed {
        app_config.simulation.default_seed = seed;
    }
    app_config.validate()?;

    // 初始化日志
    init_logging(&app_config.logging.level, &app_config.logging.format)?;

    info!("启动容量规划仪表板服务器...");
    info!("服务器配置:");
    info!("  监听地址: {}:{}", app_config.server.host, app_config.server.port);
    info!("  静态目录: {}", app_config.server.static_dir);
    info!("  初始种子: {}", app_config.simulation.default_seed);

    // 引导会话：默认驱动配置 + 配置文件中的年份覆盖
    let mut driver_config = DriverConfig::default();
    if let Some(year) = app_config.simulation.year {
        driver_config.year = year;
    }
    let session = DashboardSession::new(app_config.simulation.default_seed, driver_config)?;
    let metrics = DashboardMetrics::new()?;
    let state = AppState::new(session, metrics);

    let addr: SocketAddr = format!("{}:{}", app_config.server.host, app_config.server.port)
        .parse()
        .map_err(|e| anyhow::anyhow!("无效监听地址: {}", e))?;

    let server = WebServer::new(
        addr,
        state,
        &app_config.server.static_dir,
        app_config.server.enable_cors,
    );

    if let Err(e) = server.run().await {
        error!("服务器启动失败: {}", e);
        return Err(e.into());
    }

    Ok(())
}
