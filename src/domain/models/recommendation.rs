// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

/// 请求中服装类型字段名
pub const CLOTHING_TYPE_FIELD: &str = "Clothing Type";
/// 请求中颜色字段名
pub const COLOR_FIELD: &str = "Color";

static COLOR_SEPARATOR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\s+or\s+").expect("Failed to compile color separator regex"));

/// 推荐条目
///
/// 一件推荐服装，`color` 可能包含以 " or " 连接的多个候选颜色
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecommendationItem {
    /// 服装类型，例如 "T-shirt"
    pub clothing_type: String,
    /// 颜色描述，例如 "Blue or Black"
    pub color: String,
}

impl RecommendationItem {
    pub fn new(clothing_type: impl Into<String>, color: impl Into<String>) -> Self {
        Self {
            clothing_type: clothing_type.into(),
            color: color.into(),
        }
    }

    /// 从调用方提交的 JSON 条目解析
    ///
    /// 两个字段都必须是非空字符串，否则返回 `None`
    pub fn from_value(value: &Value) -> Option<Self> {
        let clothing_type = non_empty_str(value.get(CLOTHING_TYPE_FIELD))?;
        let color = non_empty_str(value.get(COLOR_FIELD))?;
        Some(Self::new(clothing_type, color))
    }

    /// 拆分出的颜色候选
    pub fn color_alternatives(&self) -> Vec<String> {
        split_colors(&self.color)
    }

    /// 为某个颜色候选生成搜索词
    ///
    /// 颜色已出现在服装类型中时（不区分大小写）不再重复拼接
    pub fn search_query(&self, color: &str, gender: &str) -> String {
        if self
            .clothing_type
            .to_lowercase()
            .contains(&color.to_lowercase())
        {
            format!("{} for {}", self.clothing_type, gender)
        } else {
            format!("{} {} for {}", color, self.clothing_type, gender)
        }
    }
}

/// 按 " or "（不区分大小写）拆分颜色描述，去除两侧空白并丢弃空项
pub fn split_colors(color: &str) -> Vec<String> {
    COLOR_SEPARATOR
        .split(color.trim())
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .map(str::to_string)
        .collect()
}

fn non_empty_str(value: Option<&Value>) -> Option<String> {
    value
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}
