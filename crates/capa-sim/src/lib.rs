//! # Capa Sim
//!
//! 合成数据模拟：驱动因子曲线、年度序列生成器与实际值同化。

pub mod assimilate;
pub mod drivers;
pub mod generator;

pub use assimilate::{Assimilator, SMOOTHING_ALPHA};
pub use drivers::{ExternalIndices, ExternalWeights, InternalWeights};
pub use generator::generate;
