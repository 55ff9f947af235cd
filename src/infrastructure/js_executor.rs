//! JS 执行器 - 基础设施层
//!
//! 持有 page，所有需要在页面里跑脚本的操作都从这里走

use chromiumoxide::Page;
use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::error::{DriverError, DriverResult};

/// 元素脚本的返回包装：`found` 区分"没有匹配元素"和"脚本返回了 null"
#[derive(Deserialize)]
struct ElementReply<T> {
    found: bool,
    value: Option<T>,
}

/// JS 执行器
///
/// 唯一的 page owner，不认识字段规格和导航模式
pub struct JsExecutor {
    page: Page,
}

impl JsExecutor {
    pub fn new(page: Page) -> Self {
        Self { page }
    }

    /// 原生 CDP 操作使用
    pub fn page(&self) -> &Page {
        &self.page
    }

    /// 执行表达式，结果按值返回并反序列化
    pub async fn eval<T: DeserializeOwned>(&self, expression: impl Into<String>) -> DriverResult<T> {
        let result = self.page.evaluate(expression.into()).await?;
        Ok(result.into_value()?)
    }

    /// 对第一个匹配 `selector` 的元素执行 `body`，`body` 中以 `el` 引用该元素并 `return` 结果
    pub async fn with_element<T: DeserializeOwned>(&self, selector: &str, body: &str) -> DriverResult<T> {
        let reply: ElementReply<T> = self.eval(element_script(selector, body)).await?;
        if !reply.found {
            return Err(DriverError::ElementNotFound {
                selector: selector.to_string(),
            });
        }
        reply
            .value
            .ok_or_else(|| DriverError::Script(format!("{} 的脚本没有返回值", selector)))
    }
}

/// 生成元素脚本：查不到元素时返回 `{found: false}`
pub fn element_script(selector: &str, body: &str) -> String {
    format!(
        "(() => {{ const el = document.querySelector({}); \
         if (!el) return {{ found: false, value: null }}; \
         const value = (() => {{ {} }})(); \
         return {{ found: true, value: value === undefined ? null : value }}; }})()",
        js_string(selector),
        body
    )
}

/// 把选择器编码为 JS 字符串字面量
pub fn js_string(value: &str) -> String {
    serde_json::to_string(value).unwrap_or_else(|_| "\"\"".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quotes_selectors_safely() {
        assert_eq!(js_string("a[href='x']"), r#""a[href='x']""#);
        assert_eq!(js_string("say \"hi\""), r#""say \"hi\"""#);
    }

    #[test]
    fn element_script_scopes_body_to_first_match() {
        let script = element_script("#q", "return el.textContent;");
        assert!(script.contains(r##"document.querySelector("#q")"##));
        assert!(script.contains("return el.textContent;"));
        assert!(script.contains("found: false"));
    }

    #[test]
    fn reply_distinguishes_missing_element() {
        let missing: ElementReply<String> =
            serde_json::from_str(r#"{"found":false,"value":null}"#).unwrap();
        assert!(!missing.found);
        let text: ElementReply<String> =
            serde_json::from_str(r#"{"found":true,"value":" hi "}"#).unwrap();
        assert_eq!(text.value.as_deref(), Some(" hi "));
    }
}
