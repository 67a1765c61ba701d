//! 编排层（Orchestration Layer）
//!
//! ## 模块划分
//!
//! ### `run_driver` - 运行驱动
//! - 管理应用生命周期（初始化、运行、拆除）
//! - 整体读取参考表和任务表
//! - 持有浏览器会话，处理中断信号
//!
//! ### `row_processor` - 行处理器
//! - 确定续跑起点，逐行处理
//! - 调用管辖查找，写回结果或错误
//! - 区分普通失败和致命会话错误
//!
//! ## 层次关系
//!
//! ```text
//! run_driver (持有会话)
//!     ↓
//! row_processor (处理 Vec<JobRow>)
//!     ↓
//! workflow::RowFlow (处理单行)
//!     ↓
//! services (能力层：lookup / classifier / resolver / capture)
//!     ↓
//! infrastructure (基础设施：StepExecutor / PageDriver)
//! ```

pub mod row_processor;
pub mod run_driver;

pub use row_processor::{RowProcessor, RunStats, ERROR_PREFIX};
pub use run_driver::{drive, exit_code_for, App};
