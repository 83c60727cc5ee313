//! 题型与答案数据模型

use serde::Serialize;
use serde_json::Value as JsonValue;

/// 题型标签
///
/// 由 `classify` 从快照确定性推导，无独立身份
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum QuestionKind {
    /// 演示页（含已知演示标记短语）
    Demo,
    /// 文件题（快照中有文件链接）
    File,
    /// 数学题（有数字且有运算意图关键词）
    Math,
    /// 仅提交（有端点且文本提到 answer，但以上均不匹配）
    SubmitOnly,
    /// 文本题（兜底）
    Text,
}

/// 计算出的答案
///
/// 由 AnswerDispatcher 产出，由 SubmitClient 消费一次
#[derive(Debug, Clone, Serialize)]
pub struct ComputedAnswer {
    /// 任意结构化答案载荷
    pub payload: JsonValue,
    /// 可选的推理说明
    pub rationale: Option<String>,
}

impl ComputedAnswer {
    pub fn new(payload: JsonValue) -> Self {
        Self {
            payload,
            rationale: None,
        }
    }

    pub fn with_rationale(payload: JsonValue, rationale: impl Into<String>) -> Self {
        Self {
            payload,
            rationale: Some(rationale.into()),
        }
    }
}
