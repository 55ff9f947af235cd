//! Search 导航流程
//!
//! 状态：`start → (disclaimer) → search_ready → submitted → (results_list) → detail_ready
//! → extracted → returned`
//!
//! 整个批次复用同一个页面。每条输入结束后尽力回到搜索页，但回退失败一律吞掉，
//! 真正的保障是下一条输入开始时的搜索框检查。

use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, info, warn};

use crate::browser::BrowserSession;
use crate::error::{DriverError, DriverResult, ItemError, ItemStage, RunError};
use crate::infrastructure::PageDriver;
use crate::models::field_spec::FieldSpec;
use crate::models::request::SearchConfig;
use crate::models::row::ExtractionRow;
use crate::services::{FieldExtractor, Pacer};
use crate::workflow::item_ctx::ItemCtx;
use crate::workflow::{ItemResult, NavigationFlow};

pub struct SearchFlow {
    config: SearchConfig,
    specs: Vec<FieldSpec>,
    extractor: FieldExtractor,
    pacer: Pacer,
    step_timeout: Duration,
    /// 搜索框快速探测时长
    probe: Duration,
    page: Box<dyn PageDriver>,
    /// 页面是否已成功到达过 start_url
    landed: bool,
}

impl SearchFlow {
    /// 打开批次共用的页面并进入起始页
    ///
    /// 只有拿不到页面才是致命错误；起始页加载失败会在第一条输入时重试
    pub async fn open(
        session: &dyn BrowserSession,
        config: SearchConfig,
        specs: Vec<FieldSpec>,
        extractor: FieldExtractor,
        pacer: Pacer,
        step_timeout: Duration,
        probe: Duration,
    ) -> Result<Self, RunError> {
        let page = session.new_page().await.map_err(RunError::PageOpen)?;

        let mut flow = Self {
            config,
            specs,
            extractor,
            pacer,
            step_timeout,
            probe: probe.min(step_timeout),
            page,
            landed: false,
        };

        if !flow.config.disclaimer_dismiss_per_item {
            match flow.open_start().await {
                Ok(()) => flow.landed = true,
                Err(e) => warn!("⚠️ 打开起始页失败，将在第一条输入时重试: {}", e),
            }
        }

        Ok(flow)
    }

    /// 导航到起始页，等待加载，并尝试关闭免责声明
    async fn open_start(&self) -> DriverResult<()> {
        let page = self.page.as_ref();
        page.goto(&self.config.start_url, self.step_timeout).await?;
        page.wait_for_content_loaded(self.step_timeout).await?;
        self.dismiss_disclaimer().await;
        Ok(())
    }

    /// 关闭免责声明（尽力而为，可能已经接受过）
    async fn dismiss_disclaimer(&self) {
        let Some(selector) = self.config.disclaimer_selector.as_deref() else {
            return;
        };
        let page = self.page.as_ref();

        if let Err(e) = page.click(selector, self.probe).await {
            debug!("免责声明未关闭（可能已接受）: {}", e);
        }
        if let Err(e) = page
            .wait_visible(&self.config.input_selector, self.step_timeout)
            .await
        {
            debug!("关闭免责声明后搜索框仍不可见: {}", e);
        }
    }

    /// 确认搜索框可见，否则后退一次再用完整超时检查
    async fn ensure_search_ready(&self) -> DriverResult<()> {
        let page = self.page.as_ref();
        let input = &self.config.input_selector;

        if page.wait_visible(input, self.probe).await.is_ok() {
            return Ok(());
        }

        debug!("搜索框不可见，尝试后退恢复");
        if let Err(e) = page.go_back(self.step_timeout).await {
            debug!("恢复后退失败: {}", e);
        }
        page.wait_visible(input, self.step_timeout).await
    }

    /// 第 1-6 步：到达详情页并提取字段
    async fn search_item(&mut self, value: &str) -> Result<ExtractionRow, (ItemStage, DriverError)> {
        if self.config.disclaimer_dismiss_per_item || !self.landed {
            self.open_start().await.map_err(|e| (ItemStage::Start, e))?;
            self.landed = true;
        }

        self.ensure_search_ready()
            .await
            .map_err(|e| (ItemStage::SearchReady, e))?;

        let page = self.page.as_ref();
        let timeout = self.step_timeout;
        let input = &self.config.input_selector;

        page.fill(input, value, timeout)
            .await
            .map_err(|e| (ItemStage::Submit, e))?;
        let submitted = match self.config.submit_selector.as_deref() {
            Some(submit) => page.click(submit, timeout).await,
            None => page.press_enter(input, timeout).await,
        };
        submitted.map_err(|e| (ItemStage::Submit, e))?;

        if let Some(results) = self.config.results_selector.as_deref() {
            page.wait_visible(results, timeout)
                .await
                .map_err(|e| (ItemStage::ResultsList, e))?;
            self.pacer.dwell().await;
            page.click(results, timeout)
                .await
                .map_err(|e| (ItemStage::ResultsList, e))?;
        }

        let ready = match self.config.detail_ready_selector.as_deref() {
            Some(detail) => page.wait_visible(detail, timeout).await,
            None => page.wait_for_content_loaded(timeout).await,
        };
        ready.map_err(|e| (ItemStage::DetailReady, e))?;

        let values = self.extractor.extract(page, &self.specs).await;
        let url = self.last_known_url().await;
        Ok(ExtractionRow::success(values, url))
    }

    /// 第 7 步：回到搜索页，所有失败都吞掉
    async fn return_to_search(&self) {
        let page = self.page.as_ref();
        let input = &self.config.input_selector;
        let timeout = self.step_timeout;

        if let Some(back) = self.config.back_to_search_selector.as_deref() {
            self.pacer.dwell().await;
            if let Err(e) = page.click(back, timeout).await {
                debug!("点击返回按钮失败: {}", e);
                return;
            }
            if let Err(e) = page.wait_visible(input, timeout).await {
                debug!("返回后搜索框不可见: {}", e);
            }
            return;
        }

        if let Err(e) = page.go_back(timeout).await {
            debug!("历史后退失败: {}", e);
            return;
        }
        if page.wait_visible(input, self.probe).await.is_ok() {
            return;
        }
        // 两跳：详情 → 结果列表 → 搜索页
        if let Err(e) = page.go_back(timeout).await {
            debug!("第二次历史后退失败: {}", e);
            return;
        }
        if let Err(e) = page.wait_visible(input, timeout).await {
            debug!("两次后退后搜索框仍不可见: {}", e);
        }
    }

    async fn last_known_url(&self) -> String {
        self.page
            .current_url()
            .await
            .filter(|u| !u.is_empty() && u != "about:blank")
            .unwrap_or_else(|| self.config.start_url.clone())
    }
}

#[async_trait]
impl NavigationFlow for SearchFlow {
    async fn run_item(&mut self, _session: &dyn BrowserSession, ctx: &ItemCtx) -> ItemResult {
        info!("{} 🔍 搜索: {}", ctx, ctx.value);

        match self.search_item(&ctx.value).await {
            Ok(row) => {
                self.return_to_search().await;
                Ok(row)
            }
            Err((stage, e)) => {
                let url = self.last_known_url().await;
                self.return_to_search().await;
                Err(ItemError::new(stage, url, e))
            }
        }
    }

    async fn finish(&mut self) {
        if let Err(e) = self.page.close().await {
            debug!("关闭搜索页失败: {}", e);
        }
    }
}
