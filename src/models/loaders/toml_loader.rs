use crate::models::request::RunRequest;
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tokio::fs;

/// 从 TOML 任务文件加载运行请求
pub async fn load_run_request(toml_file_path: &Path) -> Result<RunRequest> {
    let content = fs::read_to_string(toml_file_path)
        .await
        .with_context(|| format!("无法读取TOML文件: {}", toml_file_path.display()))?;

    let request: RunRequest = toml::from_str(&content)
        .with_context(|| format!("无法解析TOML文件: {}", toml_file_path.display()))?;

    Ok(request)
}

/// 加载任务文件
///
/// `path` 为文件时只加载该文件；为文件夹时加载其中所有 `.toml`（按文件名排序），
/// 解析失败的文件记录警告后跳过
pub async fn load_job_files(path: &str) -> Result<Vec<(PathBuf, RunRequest)>> {
    let target = PathBuf::from(path);

    if !target.exists() {
        anyhow::bail!("任务路径不存在: {}", path);
    }

    if target.is_file() {
        let request = load_run_request(&target).await?;
        return Ok(vec![(target, request)]);
    }

    let mut toml_files = Vec::new();
    let mut entries = fs::read_dir(&target)
        .await
        .with_context(|| format!("无法读取文件夹: {}", path))?;

    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        if path.extension().and_then(|s| s.to_str()) == Some("toml") {
            toml_files.push(path);
        }
    }
    toml_files.sort();

    let mut jobs = Vec::new();
    for path in toml_files {
        tracing::info!(
            "正在加载: {}",
            path.file_name().unwrap_or_default().to_string_lossy()
        );

        match load_run_request(&path).await {
            Ok(request) => {
                tracing::info!("成功加载 {} 条输入", request.input_list.len());
                jobs.push((path, request));
            }
            Err(e) => {
                tracing::warn!("加载文件失败 {}: {:#}", path.display(), e);
            }
        }
    }

    Ok(jobs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::request::NavConfig;

    const JOB: &str = r##"
mode = "search"
start_url = "https://s.test/"
input_selector = "#q"
submit_selector = "#go"
input_list = ["alpha", "beta"]
delay_ms_min = 0
delay_ms_max = 0

[[selectors]]
name = "title"
selector = "h1"

[[selectors]]
name = "link"
selector = "a.more"
type = "attr"
attr = "href"
"##;

    #[tokio::test]
    async fn loads_single_job_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("job.toml");
        std::fs::write(&path, JOB).unwrap();

        let request = load_run_request(&path).await.unwrap();
        assert!(matches!(request.navigation, NavConfig::Search(_)));
        assert_eq!(request.selectors.len(), 2);
        assert_eq!(request.options.delay_ms_max, 0);
        assert!(request.validate().is_ok());
    }

    #[tokio::test]
    async fn folder_skips_broken_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.toml"), JOB).unwrap();
        std::fs::write(dir.path().join("b.toml"), "mode = ").unwrap();
        std::fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let jobs = load_job_files(dir.path().to_str().unwrap()).await.unwrap();
        assert_eq!(jobs.len(), 1);
        assert!(jobs[0].0.ends_with("a.toml"));
    }

    #[tokio::test]
    async fn missing_path_is_an_error() {
        assert!(load_job_files("/definitely/not/here.toml").await.is_err());
    }
}
