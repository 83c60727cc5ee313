//! # Quiz Auto Submit
//!
//! 一个用于自动化解答多步网页测验的 Rust 应用程序：
//! 渲染页面、提取题目、分类题型、计算答案、提交并沿 next_url 续接
//!
//! ## 架构设计
//!
//! 本系统采用严格的四层架构：
//!
//! ### ① 基础设施层（Infrastructure）
//! - `browser/` - 浏览器会话守卫，资源随会话生灭
//! - `infrastructure/` - 持有稀缺资源（Page），只暴露能力
//! - `PageInspector` - 唯一的 page owner，提供 eval / 捕获能力
//!
//! ### ② 业务能力层（Services / Clients）
//! - `services/` - 描述"我能做什么"，只处理单个快照
//! - `ContentExtractor` - 分层提取能力（DOM / frame / shadow / 网络 / 控制台）
//! - `classify` / `resolve_submit_url` - 纯函数能力
//! - `AnswerDispatcher` - 题型到解答策略的分发能力
//! - `clients/SubmitClient` - 答案提交能力
//!
//! ### ③ 流程层（Workflow）
//! - `workflow/` - 定义"一步"的完整处理流程
//! - `SessionCtx` - 上下文封装（session_id + step_index）
//! - `StepFlow` - 流程编排（提取 → 分类 → 计算 → 提交）
//!
//! ### ④ 编排层（Orchestration）
//! - `orchestrator/session_runner` - 会话状态机，管理浏览器资源和步数上限
//!
//! ### 接入层
//! - `api/` - HTTP 传输壳（/solve、/quiz），密钥校验后调用编排层

pub mod api;
pub mod browser;
pub mod clients;
pub mod config;
pub mod error;
pub mod infrastructure;
pub mod models;
pub mod orchestrator;
pub mod services;
pub mod utils;
pub mod workflow;

// 重新导出常用类型
pub use browser::BrowserSession;
pub use config::Config;
pub use error::{AppError, AppResult};
pub use models::{ComputedAnswer, PageSnapshot, QuestionKind, SessionTrace, StepRecord};
pub use orchestrator::SessionRunner;
pub use workflow::{SessionCtx, StepFlow};
