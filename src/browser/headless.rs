//! 无头浏览器会话 - 基础设施层
//!
//! 每个会话独占一个浏览器实例：会话开始时获取，
//! 任何退出路径（成功、超时、异常）都释放，不做共享的全局句柄

use std::path::Path;

use chromiumoxide::{Browser, BrowserConfig, Page};
use futures::StreamExt;
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tracing::{debug, error, info};

use crate::config::Config;
use crate::error::{AppError, AppResult, BrowserError};

/// 浏览器会话守卫
///
/// 持有 Browser 和它的事件处理任务；Drop 时兜底中止事件任务
pub struct BrowserSession {
    browser: Browser,
    handler_task: JoinHandle<()>,
}

impl BrowserSession {
    /// 启动无头浏览器
    pub async fn launch(config: &Config) -> AppResult<Self> {
        info!("🚀 启动无头浏览器...");

        let mut builder = BrowserConfig::builder().new_headless_mode().args(vec![
            "--disable-gpu",
            "--no-sandbox",            // 禁用沙盒，防止权限问题导致的崩溃
            "--disable-dev-shm-usage", // 防止共享内存不足
            "--remote-debugging-port=0",
        ]);
        if let Some(exe) = &config.chrome_executable {
            builder = builder.chrome_executable(Path::new(exe));
        }
        let browser_config = builder.build().map_err(|message| {
            error!("配置无头浏览器失败: {}", message);
            AppError::Browser(BrowserError::ConfigurationFailed { message })
        })?;

        let (browser, mut handler) = Browser::launch(browser_config).await.map_err(|e| {
            error!("启动无头浏览器失败: {}", e);
            AppError::browser_launch_failed(e)
        })?;
        debug!("无头浏览器启动成功");

        // 在后台消费浏览器事件，否则 CDP 通道会阻塞
        let handler_task = tokio::spawn(async move {
            while let Some(h) = handler.next().await {
                if h.is_err() {
                    break;
                }
            }
        });

        // 短暂延迟等待浏览器状态同步
        sleep(tokio::time::Duration::from_millis(300)).await;

        Ok(Self {
            browser,
            handler_task,
        })
    }

    /// 打开一个空白页
    ///
    /// 导航交给提取器：它需要先挂好控制台/网络监听再 goto
    pub async fn new_blank_page(&self) -> AppResult<Page> {
        self.browser.new_page("about:blank").await.map_err(|e| {
            error!("创建页面失败: {}", e);
            AppError::Browser(BrowserError::PageCreationFailed {
                source: Box::new(e),
            })
        })
    }

    /// 关闭浏览器并回收事件任务
    pub async fn close(mut self) {
        if let Err(e) = self.browser.close().await {
            debug!("关闭浏览器失败（忽略）: {}", e);
        }
        self.handler_task.abort();
        info!("✅ 浏览器会话已关闭");
    }
}

impl Drop for BrowserSession {
    fn drop(&mut self) {
        // close() 已经 abort 过也没关系，abort 幂等
        self.handler_task.abort();
    }
}
