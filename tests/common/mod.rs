//! 内存中的假浏览器
//!
//! 站点由 `url -> FakeDoc` 的闭包描述；每个页面维护自己的历史栈，
//! 所有操作写入共享的动作日志，缺失的元素会一直等到超时。

#![allow(dead_code)]

use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use batch_scrape::browser::{BrowserLauncher, BrowserSession, LaunchOptions};
use batch_scrape::error::{DriverError, DriverResult, RunError};
use batch_scrape::models::{FieldKind, FieldSpec};
use batch_scrape::orchestrator::{RunManager, RunRegistry};
use batch_scrape::{Config, PageDriver, Run};
use tokio::sync::Notify;
use uuid::Uuid;

/// 点击 / 回车触发的动作
#[derive(Debug, Clone)]
pub enum Action {
    /// 跳转到固定 URL
    Navigate(String),
    /// 跳转到 前缀 + 已输入的值
    SubmitTo(String),
}

#[derive(Debug, Clone, Default)]
pub struct FakeElement {
    pub text: String,
    pub html: String,
    pub attrs: HashMap<String, String>,
    pub on_activate: Option<Action>,
}

impl FakeElement {
    pub fn text(text: &str) -> Self {
        Self {
            text: text.to_string(),
            html: format!("<span>{}</span>", text),
            ..Default::default()
        }
    }

    pub fn with_attr(mut self, name: &str, value: &str) -> Self {
        self.attrs.insert(name.to_string(), value.to_string());
        self
    }

    pub fn activates(mut self, action: Action) -> Self {
        self.on_activate = Some(action);
        self
    }
}

#[derive(Debug, Clone, Default)]
pub struct FakeDoc {
    pub elements: HashMap<String, FakeElement>,
}

impl FakeDoc {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, selector: &str, element: FakeElement) -> Self {
        self.elements.insert(selector.to_string(), element);
        self
    }
}

/// `None` 表示导航失败
pub type Site = Arc<dyn Fn(&str) -> Option<FakeDoc> + Send + Sync>;

#[derive(Default)]
pub struct Shared {
    pub actions: Mutex<Vec<String>>,
    pub pages_opened: Mutex<usize>,
    pub pages_closed: Mutex<usize>,
    pub sessions_closed: Mutex<usize>,
}

impl Shared {
    fn log(&self, entry: String) {
        self.actions.lock().unwrap().push(entry);
    }

    pub fn actions(&self) -> Vec<String> {
        self.actions.lock().unwrap().clone()
    }

    pub fn count(&self, entry: &str) -> usize {
        self.actions().iter().filter(|a| a.as_str() == entry).count()
    }
}

pub struct FakePage {
    site: Site,
    shared: Arc<Shared>,
    history: Mutex<Vec<(String, FakeDoc)>>,
    typed: Mutex<String>,
}

impl FakePage {
    fn current_doc(&self) -> Option<FakeDoc> {
        self.history.lock().unwrap().last().map(|(_, doc)| doc.clone())
    }

    fn element(&self, selector: &str) -> Option<FakeElement> {
        self.current_doc()
            .and_then(|doc| doc.elements.get(selector).cloned())
    }

    fn navigate(&self, url: &str) -> DriverResult<()> {
        match (self.site)(url) {
            Some(doc) => {
                self.history.lock().unwrap().push((url.to_string(), doc));
                Ok(())
            }
            None => Err(DriverError::Navigation {
                url: url.to_string(),
                message: "net::ERR_NAME_NOT_RESOLVED".to_string(),
            }),
        }
    }

    async fn find(&self, selector: &str, timeout: Duration) -> DriverResult<FakeElement> {
        match self.element(selector) {
            Some(element) => Ok(element),
            None => {
                tokio::time::sleep(timeout).await;
                Err(DriverError::timeout(format!("等待 {} 可见", selector), timeout))
            }
        }
    }

    fn activate(&self, element: &FakeElement) -> DriverResult<()> {
        match &element.on_activate {
            Some(Action::Navigate(url)) => self.navigate(url),
            Some(Action::SubmitTo(prefix)) => {
                let url = format!("{}{}", prefix, self.typed.lock().unwrap());
                self.navigate(&url)
            }
            None => Ok(()),
        }
    }
}

#[async_trait]
impl PageDriver for FakePage {
    async fn goto(&self, url: &str, _timeout: Duration) -> DriverResult<()> {
        self.shared.log(format!("goto {}", url));
        self.navigate(url)
    }

    async fn wait_for_content_loaded(&self, _timeout: Duration) -> DriverResult<()> {
        Ok(())
    }

    async fn wait_visible(&self, selector: &str, timeout: Duration) -> DriverResult<()> {
        self.find(selector, timeout).await.map(|_| ())
    }

    async fn fill(&self, selector: &str, value: &str, timeout: Duration) -> DriverResult<()> {
        self.find(selector, timeout).await?;
        *self.typed.lock().unwrap() = value.to_string();
        self.shared.log(format!("fill {}={}", selector, value));
        Ok(())
    }

    async fn press_enter(&self, selector: &str, timeout: Duration) -> DriverResult<()> {
        let element = self.find(selector, timeout).await?;
        self.shared.log(format!("enter {}", selector));
        self.activate(&element)
    }

    async fn click(&self, selector: &str, timeout: Duration) -> DriverResult<()> {
        let element = self.find(selector, timeout).await?;
        self.shared.log(format!("click {}", selector));
        self.activate(&element)
    }

    async fn go_back(&self, _timeout: Duration) -> DriverResult<()> {
        self.shared.log("back".to_string());
        let mut history = self.history.lock().unwrap();
        if history.len() < 2 {
            return Err(DriverError::NoHistory);
        }
        history.pop();
        Ok(())
    }

    async fn current_url(&self) -> Option<String> {
        self.history.lock().unwrap().last().map(|(url, _)| url.clone())
    }

    async fn read_field(&self, spec: &FieldSpec, _timeout: Duration) -> DriverResult<Option<String>> {
        let element = self.element(&spec.selector).ok_or(DriverError::ElementNotFound {
            selector: spec.selector.clone(),
        })?;
        Ok(match spec.kind {
            FieldKind::Text => Some(element.text.trim().to_string()),
            FieldKind::Attribute => spec
                .attribute_name
                .as_ref()
                .and_then(|name| element.attrs.get(name).cloned()),
            FieldKind::Html => Some(element.html.clone()),
        })
    }

    async fn close(&self) -> DriverResult<()> {
        *self.shared.pages_closed.lock().unwrap() += 1;
        Ok(())
    }
}

pub struct FakeSession {
    site: Site,
    shared: Arc<Shared>,
}

#[async_trait]
impl BrowserSession for FakeSession {
    async fn new_page(&self) -> DriverResult<Box<dyn PageDriver>> {
        *self.shared.pages_opened.lock().unwrap() += 1;
        Ok(Box::new(FakePage {
            site: self.site.clone(),
            shared: self.shared.clone(),
            history: Mutex::new(vec![("about:blank".to_string(), FakeDoc::new())]),
            typed: Mutex::new(String::new()),
        }))
    }

    async fn close(&mut self) {
        *self.shared.sessions_closed.lock().unwrap() += 1;
    }
}

pub struct FakeLauncher {
    pub site: Site,
    pub shared: Arc<Shared>,
    pub fail: bool,
    /// 设置后启动会一直等到收到通知
    pub gate: Option<Arc<Notify>>,
}

impl FakeLauncher {
    pub fn new(site: Site) -> Self {
        Self {
            site,
            shared: Arc::new(Shared::default()),
            fail: false,
            gate: None,
        }
    }
}

#[async_trait]
impl BrowserLauncher for FakeLauncher {
    async fn launch(&self, _options: &LaunchOptions) -> Result<Box<dyn BrowserSession>, RunError> {
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        if self.fail {
            return Err(RunError::BrowserLaunch("chrome executable not found".to_string()));
        }
        Ok(Box::new(FakeSession {
            site: self.site.clone(),
            shared: self.shared.clone(),
        }))
    }
}

pub fn manager(export_dir: &Path, launcher: FakeLauncher) -> RunManager {
    let config = Config {
        export_dir: export_dir.display().to_string(),
        ..Config::default()
    };
    RunManager::new(config, Arc::new(RunRegistry::new()), Arc::new(launcher))
}

/// 轮询直到运行进入终态
pub async fn wait_terminal(manager: &RunManager, run_id: &Uuid) -> Run {
    loop {
        if let Some(run) = manager.status(run_id) {
            if run.status.is_terminal() {
                return run;
            }
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}

pub fn read_csv(path: &Path) -> Vec<String> {
    std::fs::read_to_string(path)
        .unwrap()
        .split("\r\n")
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}
