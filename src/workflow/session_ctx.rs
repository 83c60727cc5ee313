//! 会话上下文封装

/// 会话上下文
///
/// 只携带日志定位所需的标识，不持有任何资源
#[derive(Debug, Clone)]
pub struct SessionCtx {
    /// 会话编号（每个 /solve 请求一个）
    pub session_id: u64,
    /// 当前步序号（从 0 开始）
    pub step_index: usize,
}

impl SessionCtx {
    pub fn new(session_id: u64) -> Self {
        Self {
            session_id,
            step_index: 0,
        }
    }
}
