//! 自动化流程的结果

use crate::error::StepError;

/// 一次查询流程的结果，只会是其中一种
#[derive(Debug)]
pub enum AutomationOutcome {
    /// 查到了位置文字
    Located { location_text: String },
    /// 非国内 IP
    Overseas,
    /// 移动网络 IP
    Mobile,
    /// 流程失败
    Failed { error: StepError },
}

impl AutomationOutcome {
    /// 是否为无需查找管辖的状态结果
    pub fn is_status(&self) -> bool {
        matches!(self, AutomationOutcome::Overseas | AutomationOutcome::Mobile)
    }

    /// 日志用名称
    pub fn label(&self) -> &'static str {
        match self {
            AutomationOutcome::Located { .. } => "正常",
            AutomationOutcome::Overseas => "海外",
            AutomationOutcome::Mobile => "移动网络",
            AutomationOutcome::Failed { .. } => "错误",
        }
    }
}
