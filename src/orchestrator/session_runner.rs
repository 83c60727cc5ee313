//! 会话执行器 - 编排层
//!
//! 驱动一次完整会话：从起始 URL 出发，逐步执行单步流程，
//! 依据提交结果里的 next_url 决定是否续接，直到终止或达到步数上限。
//!
//! 浏览器实例在会话开始时获取、会话结束时释放；
//! 启动失败不中止会话，只是每一步都走降级快照

use tracing::{error, info};

use crate::browser::BrowserSession;
use crate::config::Config;
use crate::models::{SessionState, SessionTrace};
use crate::workflow::{SessionCtx, StepFlow};

/// 会话执行器
///
/// - 持有单步流程，不持有浏览器（浏览器随会话生灭）
/// - 每次 run 是一个独立会话，互不共享状态
pub struct SessionRunner {
    flow: StepFlow,
    max_steps: usize,
}

impl SessionRunner {
    pub fn new(config: &Config) -> Self {
        Self {
            flow: StepFlow::new(config),
            max_steps: config.max_session_steps,
        }
    }

    /// 执行一次会话，返回完整轨迹
    ///
    /// 永不失败：浏览器启动失败、提取失败、提交失败都体现在轨迹里
    pub async fn run(&self, config: &Config, session_id: u64, start_url: &str) -> SessionTrace {
        info!(
            "[会话 {}] 🎬 会话开始: {} (步数上限 {})",
            session_id, start_url, self.max_steps
        );

        let browser = match BrowserSession::launch(config).await {
            Ok(session) => Some(session),
            Err(e) => {
                error!("[会话 {}] ❌ 浏览器启动失败，全程降级: {}", session_id, e);
                None
            }
        };

        let mut trace: SessionTrace = Vec::new();
        let mut ctx = SessionCtx::new(session_id);
        let mut state = SessionState::start(start_url);

        while let SessionState::Running { step_index, url } = state {
            ctx.step_index = step_index;
            let record = self.flow.run(browser.as_ref(), &ctx, &url).await;

            state = SessionState::Running { step_index, url }
                .advance(&record.submission, self.max_steps);
            trace.push(record);
        }

        if let Some(session) = browser {
            session.close().await;
        }

        let accepted = trace.iter().filter(|r| r.submission.accepted).count();
        info!(
            "[会话 {}] 🏁 会话结束: 共 {} 步, {} 步提交成功",
            session_id,
            trace.len(),
            accepted
        );
        trace
    }
}
