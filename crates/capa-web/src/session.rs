//! 会话状态
//!
//! 每个服务进程持有一份会话：配置 + 种子 + 生成的场景 + 同化器。
//! 浏览器标签页即会话，无多用户共享状态。任何变更都触发一次同步的
//! 全量重算。

use std::sync::Arc;

use capa_admin::DashboardMetrics;
use capa_core::{ActualsPoint, DriverConfig, Result, Scenario};
use capa_sim::{generate, Assimilator};
use tokio::sync::RwLock;
use tracing::info;
use uuid::Uuid;

/// 仪表板会话
#[derive(Debug)]
pub struct DashboardSession {
    id: Uuid,
    config: DriverConfig,
    seed: u64,
    default_seed: u64,
    scenario: Scenario,
    assimilator: Assimilator,
}

impl DashboardSession {
    /// 以给定种子和配置创建会话并完成首次生成
    pub fn new(seed: u64, config: DriverConfig) -> Result<Self> {
        let scenario = generate(seed, &config)?;
        Ok(Self {
            id: Uuid::new_v4(),
            config,
            seed,
            default_seed: seed,
            scenario,
            assimilator: Assimilator::new(),
        })
    }

    /// 会话标识
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn scenario(&self) -> &Scenario {
        &self.scenario
    }

    pub fn config(&self) -> &DriverConfig {
        &self.config
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// 替换配置并重算；上报历史随旧场景一并丢弃
    pub fn update_config(&mut self, config: DriverConfig) -> Result<()> {
        config.validate()?;
        self.scenario = generate(self.seed, &config)?;
        self.config = config;
        self.assimilator.clear();
        info!("Session reconfigured, seed={}", self.seed);
        Ok(())
    }

    /// 恢复内置默认配置与初始种子
    pub fn reset(&mut self) -> Result<()> {
        self.seed = self.default_seed;
        self.update_config(DriverConfig::default())
    }

    /// 以新的随机种子重新生成
    pub fn refresh(&mut self) -> Result<u64> {
        self.seed = rand::random();
        self.scenario = generate(self.seed, &self.config)?;
        self.assimilator.clear();
        info!("Session refreshed, new seed={}", self.seed);
        Ok(self.seed)
    }

    /// 上报一个实际值并同化进预测
    pub fn assimilate(&mut self, point: ActualsPoint) -> Result<bool> {
        self.assimilator.assimilate(&mut self.scenario, point)
    }
}

/// 处理器共享状态
#[derive(Clone)]
pub struct AppState {
    pub session: Arc<RwLock<DashboardSession>>,
    pub metrics: Arc<DashboardMetrics>,
}

impl AppState {
    pub fn new(session: DashboardSession, metrics: DashboardMetrics) -> Self {
        Self {
            session: Arc::new(RwLock::new(session)),
            metrics: Arc::new(metrics),
        }
    }
}
