//! 会话轨迹数据模型与状态机
//!
//! 一次会话 = 从起始 URL 到终止的多步提交链，
//! 轨迹长度受硬性步数上限约束（服务器返回的续接 URL 不可信任其自行终止）

use chrono::{DateTime, Local};
use serde::Serialize;
use serde_json::Value as JsonValue;

use crate::models::answer::{ComputedAnswer, QuestionKind};
use crate::models::snapshot::PageSnapshot;

/// 提交结果
#[derive(Debug, Clone, Serialize)]
pub struct SubmissionResult {
    /// 服务器是否接受（HTTP 层面成功）
    pub accepted: bool,
    /// 服务器原始响应（不做解释，原样透传进轨迹）
    pub raw_response: Option<JsonValue>,
    /// 下一步 URL（不校验可达性，下一轮提取时自然解决）
    pub next_url: Option<String>,
    /// 失败原因
    pub failure_reason: Option<String>,
}

impl SubmissionResult {
    /// 未发起网络调用的本地失败结果
    pub fn not_attempted(reason: impl Into<String>) -> Self {
        Self {
            accepted: false,
            raw_response: None,
            next_url: None,
            failure_reason: Some(reason.into()),
        }
    }
}

/// 单步记录：每次循环迭代产出一条，失败也产出
#[derive(Debug, Clone, Serialize)]
pub struct StepRecord {
    pub task_url: String,
    pub kind: QuestionKind,
    pub snapshot: PageSnapshot,
    pub answer: ComputedAnswer,
    pub submission: SubmissionResult,
    pub recorded_at: DateTime<Local>,
}

/// 会话轨迹：有序的单步记录序列，长度不超过步数上限
pub type SessionTrace = Vec<StepRecord>;

/// 会话状态机
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    /// 运行中（当前步序号 + 当前任务 URL）
    Running { step_index: usize, url: String },
    /// 已完成（终态）
    Completed,
}

impl SessionState {
    /// 初始状态：第 0 步，起始 URL
    pub fn start(url: impl Into<String>) -> Self {
        SessionState::Running {
            step_index: 0,
            url: url.into(),
        }
    }

    /// 单步状态转移
    ///
    /// 提交结果带 next_url 且未达步数上限 → 继续运行；否则终止。
    /// 步内不重试：失败的提取/提交同样走这里，没有可用的 next_url 就结束
    pub fn advance(self, submission: &SubmissionResult, max_steps: usize) -> Self {
        let SessionState::Running { step_index, .. } = self else {
            return SessionState::Completed;
        };
        match &submission.next_url {
            Some(next) if step_index + 1 < max_steps => SessionState::Running {
                step_index: step_index + 1,
                url: next.clone(),
            },
            _ => SessionState::Completed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn with_next(url: Option<&str>) -> SubmissionResult {
        SubmissionResult {
            accepted: true,
            raw_response: None,
            next_url: url.map(|s| s.to_string()),
            failure_reason: None,
        }
    }

    #[test]
    fn test_no_next_url_completes() {
        let state = SessionState::start("http://example.com/q1");
        let next = state.advance(&with_next(None), 10);
        assert_eq!(next, SessionState::Completed);
    }

    #[test]
    fn test_next_url_keeps_running() {
        let state = SessionState::start("http://example.com/q1");
        let next = state.advance(&with_next(Some("http://example.com/q2")), 10);
        assert_eq!(
            next,
            SessionState::Running {
                step_index: 1,
                url: "http://example.com/q2".to_string()
            }
        );
    }

    #[test]
    fn test_step_cap_bounds_trace_length() {
        // 服务器每步都给 next_url，轨迹仍不得超过上限
        let max_steps = 10;
        let mut state = SessionState::start("http://example.com/q0");
        let mut steps = 0;
        while let SessionState::Running { .. } = state {
            steps += 1;
            state = state.advance(&with_next(Some("http://example.com/again")), max_steps);
        }
        assert_eq!(steps, max_steps);
    }

    #[test]
    fn test_two_step_session_scenario() {
        // 第 1 步给出 next_url，第 2 步没有 → 恰好 2 步后终止
        let mut state = SessionState::start("http://example.com/step1");
        state = state.advance(&with_next(Some("http://example.com/step2")), 10);
        assert!(matches!(
            state,
            SessionState::Running { step_index: 1, .. }
        ));
        state = state.advance(&with_next(None), 10);
        assert_eq!(state, SessionState::Completed);
    }

    #[test]
    fn test_failed_submission_also_evaluates_next_url() {
        // 失败不自动终止会话，只要响应里有可用的 next_url 就继续
        let submission = SubmissionResult {
            accepted: false,
            raw_response: None,
            next_url: Some("http://example.com/retry".to_string()),
            failure_reason: Some("服务器 500".to_string()),
        };
        let state = SessionState::start("http://example.com/q1").advance(&submission, 10);
        assert!(matches!(state, SessionState::Running { step_index: 1, .. }));
    }
}
