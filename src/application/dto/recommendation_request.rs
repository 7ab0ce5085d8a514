// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// 未指定性别时使用的值
pub const DEFAULT_GENDER: &str = "unisex";

/// 推荐查询请求数据传输对象
///
/// `recommendations` 为 `{分类: [条目]}`，保持宽松类型，
/// 非法结构在处理阶段被跳过而不是在反序列化阶段拒绝
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RecommendationRequestDto {
    /// 分类到推荐条目列表的映射
    #[serde(default)]
    pub recommendations: Option<Value>,
    /// 性别，接受字符串、数字或布尔值
    #[serde(default)]
    pub gender: Option<Value>,
}

impl RecommendationRequestDto {
    /// 有效的性别文本
    ///
    /// 数字和布尔值按字面转为文本；缺失、为空或为数组/对象时为 `unisex`
    pub fn gender(&self) -> String {
        let text = match &self.gender {
            Some(Value::String(gender)) => gender.trim().to_string(),
            Some(Value::Number(gender)) => gender.to_string(),
            Some(Value::Bool(gender)) => gender.to_string(),
            _ => String::new(),
        };

        if text.is_empty() {
            DEFAULT_GENDER.to_string()
        } else {
            text
        }
    }
}

/// 后台任务受理响应
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BatchAcceptedDto {
    pub message: String,
    pub job_id: Uuid,
}

impl BatchAcceptedDto {
    pub fn new(job_id: Uuid) -> Self {
        Self {
            message: "Recommendations are being processed in the background".to_string(),
            job_id,
        }
    }
}
