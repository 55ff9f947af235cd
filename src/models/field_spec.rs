use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::models::row::TRAILING_COLUMNS;

/// 字段提取方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    /// 元素文本（去除首尾空白）
    #[default]
    Text,
    /// 指定属性的值
    #[serde(rename = "attr", alias = "attribute")]
    Attribute,
    /// 元素内部 HTML
    Html,
}

/// 字段规格：一条具名的 CSS 选择器提取规则
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldSpec {
    pub name: String,
    pub selector: String,
    #[serde(rename = "type", default)]
    pub kind: FieldKind,
    #[serde(
        rename = "attr",
        alias = "attribute_name",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub attribute_name: Option<String>,
}

impl FieldSpec {
    pub fn text(name: impl Into<String>, selector: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            selector: selector.into(),
            kind: FieldKind::Text,
            attribute_name: None,
        }
    }

    pub fn attribute(
        name: impl Into<String>,
        selector: impl Into<String>,
        attribute_name: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            selector: selector.into(),
            kind: FieldKind::Attribute,
            attribute_name: Some(attribute_name.into()),
        }
    }

    pub fn html(name: impl Into<String>, selector: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            selector: selector.into(),
            kind: FieldKind::Html,
            attribute_name: None,
        }
    }

    /// 校验单条规格
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.name.trim().is_empty() {
            return Err(ConfigError::EmptyFieldName);
        }
        if self.selector.trim().is_empty() {
            return Err(ConfigError::EmptySelector(self.name.clone()));
        }
        if self.kind == FieldKind::Attribute
            && self
                .attribute_name
                .as_deref()
                .map_or(true, |a| a.trim().is_empty())
        {
            return Err(ConfigError::MissingAttributeName(self.name.clone()));
        }
        Ok(())
    }
}

/// 校验整组规格：逐条合法，字段名在一次运行内唯一且不占用固定列名
pub fn validate_field_specs(specs: &[FieldSpec]) -> Result<(), ConfigError> {
    if specs.is_empty() {
        return Err(ConfigError::EmptySelectors);
    }
    let mut seen = std::collections::HashSet::new();
    for spec in specs {
        spec.validate()?;
        if TRAILING_COLUMNS.contains(&spec.name.as_str()) {
            return Err(ConfigError::ReservedFieldName(spec.name.clone()));
        }
        if !seen.insert(spec.name.as_str()) {
            return Err(ConfigError::DuplicateField(spec.name.clone()));
        }
    }
    Ok(())
}
