//! 流程层
//!
//! 定义单行的处理顺序，只依赖 services 和 infrastructure 的 trait。

pub mod row_ctx;
pub mod row_flow;

pub use row_ctx::RowCtx;
pub use row_flow::{RowFlow, RowVerdict};
