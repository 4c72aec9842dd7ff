//! # Capa Web
//!
//! 仪表板 HTTP 层：会话状态、JSON API、静态页面与指标端点。

pub mod handlers;
pub mod server;
pub mod session;
pub mod static_files;

pub use server::WebServer;
pub use session::{AppState, DashboardSession};
