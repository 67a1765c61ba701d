//! 日志工具模块
//!
//! 初始化 tracing，并提供日志格式化和输出的辅助函数

use std::fs::{self, OpenOptions};
use std::sync::Mutex;

use anyhow::{Context, Result};
use tracing::info;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

use crate::config::Config;
use crate::orchestrator::RunStats;
use crate::workflow::RowCtx;

/// 初始化日志：终端输出 + 追加到日志文件
///
/// `RUST_LOG` 优先；否则 verbose_logging 为真时使用 debug 级别。
pub fn init(config: &Config) -> Result<()> {
    init_log_file(&config.output_log_file)?;
    let file = OpenOptions::new()
        .append(true)
        .open(&config.output_log_file)
        .with_context(|| format!("无法打开日志文件: {}", config.output_log_file))?;

    let default_level = if config.verbose_logging { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false))
        .with(fmt::layer().with_target(false).with_ansi(false).with_writer(Mutex::new(file)))
        .try_init()
        .context("日志系统初始化失败")?;
    Ok(())
}

/// 初始化日志文件
pub fn init_log_file(log_file_path: &str) -> Result<()> {
    let log_header = format!(
        "{}\nIP 管辖查询日志 - {}\n{}\n\n",
        "=".repeat(60),
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
        "=".repeat(60)
    );
    fs::write(log_file_path, log_header).with_context(|| format!("无法写入日志文件: {}", log_file_path))?;
    Ok(())
}

/// 记录程序启动信息
pub fn log_startup(config: &Config) {
    info!("{}", "=".repeat(60));
    info!("🚀 程序启动 - IP 管辖查询");
    info!("📄 表格: {} / {}", config.spreadsheet_id, config.job_sheet);
    info!(
        "🔍 交叉核对: {}",
        if config.secondary.enabled { "启用" } else { "关闭" }
    );
    info!("{}", "=".repeat(60));
}

/// 记录数据加载信息
pub fn log_rows_loaded(rows: usize, records: usize) {
    info!("✓ 读取到 {} 行任务", rows);
    info!("✓ 读取到 {} 条管辖记录\n", records);
}

/// 记录续跑起点
pub fn log_resume_point(index: usize, row_number: usize) {
    info!("\n{}", "─".repeat(60));
    info!("▶ 从第 {} 行继续处理（跳过前 {} 行）", row_number, index);
    info!("{}", "─".repeat(60));
}

/// 记录单行开始
pub fn log_row_start(ctx: &RowCtx) {
    info!("\n{} ===== 开始处理 {} =====", ctx, ctx.ip_address);
}

/// 打印最终统计信息
pub fn print_final_stats(stats: &RunStats, log_file_path: &str) {
    info!("\n{}", "=".repeat(60));
    info!("📊 全部处理完成统计");
    info!(
        "完成时间: {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    info!("{}", "=".repeat(60));
    info!("✅ 已写入: {}/{}", stats.written(), stats.total);
    info!("📍 查到地址: {}（未匹配管辖 {}）", stats.located, stats.unmatched);
    info!("🌐 标记文本: {}", stats.status);
    info!("❌ 失败: {}", stats.failed);
    info!("⏭ 跳过: {}", stats.skipped);
    info!("{}", "=".repeat(60));
    info!("\n日志已保存至: {}", log_file_path);
}

/// 截断长文本用于日志显示
pub fn truncate_text(text: &str, max_len: usize) -> String {
    if text.chars().count() > max_len {
        text.chars().take(max_len).collect::<String>() + "..."
    } else {
        text.to_string()
    }
}
