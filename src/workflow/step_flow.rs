//! 单步处理流程 - 流程层
//!
//! 核心职责：定义"一步"的完整处理流程
//!
//! 流程顺序：提取 → 分类 → 计算 → 提交
//!
//! 步内不重试、不中止：提取或提交失败同样产出 StepRecord
//! （带失败标记），是否继续由会话层看 next_url 决定

use chrono::Local;
use tracing::{info, warn};

use crate::browser::BrowserSession;
use crate::clients::SubmitClient;
use crate::config::Config;
use crate::models::{PageSnapshot, StepRecord};
use crate::services::{classify, AnswerDispatcher, ContentExtractor};
use crate::utils::truncate_text;
use crate::workflow::session_ctx::SessionCtx;

/// 单步处理流程
///
/// - 编排一步的完整处理
/// - 不持有任何资源（浏览器归会话层）
/// - 只依赖业务能力（services / clients）
pub struct StepFlow {
    extractor: ContentExtractor,
    dispatcher: AnswerDispatcher,
    submit_client: SubmitClient,
}

impl StepFlow {
    pub fn new(config: &Config) -> Self {
        Self {
            extractor: ContentExtractor::new(config),
            dispatcher: AnswerDispatcher::new(config),
            submit_client: SubmitClient::new(config),
        }
    }

    /// 执行一步：总是产出一条记录
    ///
    /// 浏览器不可用（启动失败）时走降级快照，流程照常走完
    pub async fn run(
        &self,
        session: Option<&BrowserSession>,
        ctx: &SessionCtx,
        task_url: &str,
    ) -> StepRecord {
        info!(
            "[会话 {}] 📄 第 {} 步: {}",
            ctx.session_id,
            ctx.step_index + 1,
            task_url
        );

        // ========== 提取 ==========
        let snapshot = match session {
            Some(session) => self.extractor.extract(session, task_url).await,
            None => PageSnapshot::degraded("browser session unavailable"),
        };
        if let Some(reason) = &snapshot.render_failure {
            warn!("[会话 {}] ⚠️ 渲染降级: {}", ctx.session_id, reason);
        } else {
            info!(
                "[会话 {}] 题目: {}",
                ctx.session_id,
                truncate_text(&snapshot.question_text, 80)
            );
        }

        // ========== 分类 ==========
        let kind = classify(&snapshot);
        info!("[会话 {}] 🏷️ 题型: {:?}", ctx.session_id, kind);

        // ========== 计算 ==========
        let answer = self.dispatcher.compute(kind, &snapshot).await;

        // ========== 提交 ==========
        let submission = self.submit_client.submit(&snapshot, &answer).await;
        match (&submission.accepted, &submission.failure_reason) {
            (true, _) => info!(
                "[会话 {}] ✓ 提交成功, next_url: {:?}",
                ctx.session_id, submission.next_url
            ),
            (false, Some(reason)) => {
                warn!("[会话 {}] ⚠️ 提交未成功: {}", ctx.session_id, reason)
            }
            (false, None) => warn!("[会话 {}] ⚠️ 提交未成功", ctx.session_id),
        }

        StepRecord {
            task_url: task_url.to_string(),
            kind,
            snapshot,
            answer,
            submission,
            recorded_at: Local::now(),
        }
    }
}
