//! 运行失败时的诊断信息
//!
//! 错误类别与消息链、宿主环境信息，以及截断后的调用栈

use sysinfo::System;

use crate::error::RunError;
use crate::utils::logging::truncate_text;

/// 调用栈保留的最大字符数
pub const TRACE_LIMIT: usize = 3000;

/// 宿主进程与环境信息
pub fn host_info() -> Vec<String> {
    let exe = std::env::current_exe()
        .map(|p| p.display().to_string())
        .unwrap_or_else(|_| "unknown".to_string());
    vec![
        format!("executable={}", exe),
        format!("pid={}", std::process::id()),
        format!(
            "os={}",
            System::long_os_version().unwrap_or_else(|| std::env::consts::OS.to_string())
        ),
        format!("host={}", System::host_name().unwrap_or_else(|| "unknown".to_string())),
        format!("version={}", env!("CARGO_PKG_VERSION")),
    ]
}

/// 生成写入 Run.error 的诊断文本
pub fn error_report(err: &anyhow::Error) -> String {
    let kind = err
        .downcast_ref::<RunError>()
        .map(RunError::kind)
        .unwrap_or("Error");
    let trace = err.backtrace().to_string();

    format!(
        "{}: {:#}\n{}\n{}",
        kind,
        err,
        host_info().join("\n"),
        truncate_text(&trace, TRACE_LIMIT)
    )
}
