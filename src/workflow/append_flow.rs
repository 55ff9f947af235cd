//! Append 导航流程
//!
//! 每条输入：`navigate → wait_loaded → extract → recorded`，各自使用独立标签页

use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, info};

use crate::browser::BrowserSession;
use crate::error::{ItemError, ItemStage};
use crate::infrastructure::PageDriver;
use crate::models::field_spec::FieldSpec;
use crate::models::request::AppendConfig;
use crate::models::row::ExtractionRow;
use crate::services::FieldExtractor;
use crate::workflow::item_ctx::ItemCtx;
use crate::workflow::{ItemResult, NavigationFlow};

pub struct AppendFlow {
    config: AppendConfig,
    specs: Vec<FieldSpec>,
    extractor: FieldExtractor,
    step_timeout: Duration,
}

impl AppendFlow {
    pub fn new(
        config: AppendConfig,
        specs: Vec<FieldSpec>,
        extractor: FieldExtractor,
        step_timeout: Duration,
    ) -> Self {
        Self {
            config,
            specs,
            extractor,
            step_timeout,
        }
    }

    /// 目标 URL：直接字符串拼接，不做任何编码或规范化
    pub fn target_url(&self, value: &str) -> String {
        format!("{}{}", self.config.base_url, value)
    }

    async fn visit(&self, page: &dyn PageDriver, url: &str) -> ItemResult {
        page.goto(url, self.step_timeout)
            .await
            .map_err(|e| ItemError::new(ItemStage::Navigate, url, e))?;
        page.wait_for_content_loaded(self.step_timeout)
            .await
            .map_err(|e| ItemError::new(ItemStage::WaitLoaded, url, e))?;

        let values = self.extractor.extract(page, &self.specs).await;
        Ok(ExtractionRow::success(values, url))
    }
}

#[async_trait]
impl NavigationFlow for AppendFlow {
    async fn run_item(&mut self, session: &dyn BrowserSession, ctx: &ItemCtx) -> ItemResult {
        let url = self.target_url(&ctx.value);
        info!("{} 🔗 {}", ctx, url);

        let page = session
            .new_page()
            .await
            .map_err(|e| ItemError::new(ItemStage::OpenTab, &url, e))?;

        let result = self.visit(page.as_ref(), &url).await;

        if let Err(e) = page.close().await {
            debug!("{} 关闭标签页失败: {}", ctx, e);
        }
        result
    }

    async fn finish(&mut self) {}
}
