use std::time::Duration;

/// 程序配置
#[derive(Clone, Debug)]
pub struct Config {
    /// CSV 输出目录
    pub export_dir: String,
    /// HTTP 服务监听地址
    pub bind_addr: String,
    /// 浏览器可执行文件路径（为空时由 chromiumoxide 自动查找）
    pub chrome_executable: Option<String>,
    /// 设置后连接到该调试端口上的浏览器，而不是自行启动
    pub browser_debug_port: Option<u16>,
    /// 单个字段提取的等待上限（毫秒），不超过运行的单步超时
    pub field_wait_ms: u64,
    /// 搜索框可见性的快速探测时长（毫秒）
    pub search_probe_ms: u64,
    /// 设置后以任务文件模式运行（文件或文件夹），不启动 HTTP 服务
    pub job_file: Option<String>,
    /// 是否输出每个字段的提取结果
    pub verbose_logging: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            export_dir: "./exports".to_string(),
            bind_addr: "127.0.0.1:8002".to_string(),
            chrome_executable: None,
            browser_debug_port: None,
            field_wait_ms: 2_000,
            search_probe_ms: 1_500,
            job_file: None,
            verbose_logging: false,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let default = Self::default();
        Self {
            export_dir: std::env::var("EXPORT_DIR").unwrap_or(default.export_dir),
            bind_addr: std::env::var("BIND_ADDR").unwrap_or(default.bind_addr),
            chrome_executable: std::env::var("CHROME_EXECUTABLE").ok().filter(|v| !v.is_empty()).or(default.chrome_executable),
            browser_debug_port: std::env::var("BROWSER_DEBUG_PORT").ok().and_then(|v| v.parse().ok()).or(default.browser_debug_port),
            field_wait_ms: std::env::var("FIELD_WAIT_MS").ok().and_then(|v| v.parse().ok()).unwrap_or(default.field_wait_ms),
            search_probe_ms: std::env::var("SEARCH_PROBE_MS").ok().and_then(|v| v.parse().ok()).unwrap_or(default.search_probe_ms),
            job_file: std::env::var("JOB_FILE").ok().filter(|v| !v.is_empty()).or(default.job_file),
            verbose_logging: std::env::var("VERBOSE_LOGGING").ok().and_then(|v| v.parse().ok()).unwrap_or(default.verbose_logging),
        }
    }

    pub fn field_wait(&self) -> Duration {
        Duration::from_millis(self.field_wait_ms)
    }

    pub fn search_probe(&self) -> Duration {
        Duration::from_millis(self.search_probe_ms)
    }
}
