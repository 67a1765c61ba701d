//! # IP Jurisdiction Lookup
//!
//! 读取表格中的 IP，逐行查询所在地址，再按参考表找到管辖警察署并写回
//!
//! ## 架构设计
//!
//! 本系统采用四层架构：
//!
//! ### ① 基础设施层（Infrastructure）
//! - `infrastructure/` - 持有稀缺资源（浏览器会话、页面），只暴露能力
//! - `StepExecutor` - 导航 / 等待 / 输入 / 点击 / 取值，带显式超时
//! - `ScopedPage` / `SessionGuard` - 页面和会话的释放保证
//!
//! ### ② 业务能力层（Services）
//! - `services/` - 描述"我能做什么"，只处理单个 IP
//! - `PrimaryLookup` / `SecondaryLookup` - 两个站点的查询流程
//! - `ResultClassifier` - 把查询结果归为地址或标记文本
//! - `jurisdiction_resolver` - 地址 → 警察署
//! - `ArtifactCapture` - 截图留档
//!
//! ### ③ 流程层（Workflow）
//! - `RowCtx` - 上下文封装（行号 + IP）
//! - `RowFlow` - 单行查询顺序（交叉核对 → 主查询 → 归类）
//!
//! ### ④ 编排层（Orchestration）
//! - `orchestrator/run_driver` - 初始化、加载数据、持有会话、处理中断
//! - `orchestrator/row_processor` - 续跑起点、逐行处理、写回和失败升级
//!
//! ## 模块结构

pub mod browser;
pub mod clients;
pub mod config;
pub mod error;
pub mod infrastructure;

pub mod models;
pub mod orchestrator;
pub mod services;
pub mod utils;
pub mod workflow;

// 重新导出常用类型
pub use browser::open_session;
pub use config::Config;
pub use error::{AppError, AppResult, StepError};
pub use infrastructure::{BrowserSession, PageDriver, StepExecutor};
pub use models::{AutomationOutcome, JobRow, JurisdictionRecord};
pub use orchestrator::{App, RowProcessor, RunStats};
pub use workflow::{RowCtx, RowFlow};
