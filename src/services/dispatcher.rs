//! 答案分派 - 业务能力层
//!
//! 分类到计算的映射收拢在一个显式 match 里，
//! 保证可审计、可穷尽测试，不散落条件分支

use serde_json::json;
use tracing::debug;

use crate::config::Config;
use crate::models::{ComputedAnswer, PageSnapshot, QuestionKind};
use crate::services::file_solver::FileSolver;
use crate::services::math_solver::solve_math;
use crate::services::text_solver::solve_text;

/// 答案分派器
pub struct AnswerDispatcher {
    file_solver: FileSolver,
}

impl AnswerDispatcher {
    pub fn new(config: &Config) -> Self {
        Self {
            file_solver: FileSolver::new(config.http_timeout_secs),
        }
    }

    /// 按题型路由到对应求解策略
    ///
    /// 任何分支都返回载荷，不向会话抛错
    pub async fn compute(&self, kind: QuestionKind, snapshot: &PageSnapshot) -> ComputedAnswer {
        debug!("分派题型: {:?}", kind);
        match kind {
            // 固定应答，仅记录"识别到演示页"这一事实
            QuestionKind::Demo => ComputedAnswer::with_rationale(
                json!({
                    "question_type": "demo",
                    "answer": "demo page acknowledged",
                }),
                "命中演示页标记",
            ),
            QuestionKind::File => self.file_solver.solve(&snapshot.file_links).await,
            QuestionKind::Math => solve_math(&snapshot.question_text),
            QuestionKind::SubmitOnly => ComputedAnswer::with_rationale(
                json!({
                    "question_type": "submit_only",
                    "answer": "auto-submit",
                }),
                "页面只要求提交",
            ),
            QuestionKind::Text => solve_text(&snapshot.question_text),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dispatcher() -> AnswerDispatcher {
        AnswerDispatcher::new(&Config::default())
    }

    fn snapshot(text: &str, links: &[&str]) -> PageSnapshot {
        PageSnapshot {
            question_text: text.to_string(),
            file_links: links.iter().map(|s| s.to_string()).collect(),
            submit_url: None,
            render_failure: None,
        }
    }

    #[tokio::test]
    async fn test_demo_routes_to_canned_answer() {
        let answer = dispatcher()
            .compute(QuestionKind::Demo, &snapshot("anything you want", &[]))
            .await;
        assert_eq!(answer.payload["answer"], "demo page acknowledged");
    }

    #[tokio::test]
    async fn test_math_routes_to_math_solver() {
        let answer = dispatcher()
            .compute(
                QuestionKind::Math,
                &snapshot("Please compute the sum of 3, 4.5 and 10", &[]),
            )
            .await;
        assert_eq!(answer.payload["answer"], 17.5);
    }

    #[tokio::test]
    async fn test_file_delegates_first_link() {
        // 单个 pdf 链接交给文件求解器
        let answer = dispatcher()
            .compute(QuestionKind::File, &snapshot("see attachment", &["report.pdf"]))
            .await;
        assert_eq!(answer.payload["question_type"], "file");
        assert_eq!(answer.payload["file"], "report.pdf");
    }

    #[tokio::test]
    async fn test_submit_only_canned_payload() {
        let answer = dispatcher()
            .compute(QuestionKind::SubmitOnly, &snapshot("submit your answer", &[]))
            .await;
        assert_eq!(answer.payload["answer"], "auto-submit");
    }

    #[tokio::test]
    async fn test_text_fallback_is_explicit() {
        let answer = dispatcher()
            .compute(QuestionKind::Text, &snapshot("riddle me this", &[]))
            .await;
        assert_eq!(answer.payload["answer"], "Unable to determine text answer");
    }
}
