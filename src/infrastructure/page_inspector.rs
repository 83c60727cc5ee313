//! 页面探查器 - 基础设施层
//!
//! 持有唯一的 Page 资源，只暴露能力：执行 JS、读取各层文本、
//! 捕获控制台/网络通道。不认识 Snapshot / Session，不处理业务流程

use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use chromiumoxide::cdp::browser_protocol::network::{
    EnableParams, EventResponseReceived, GetResponseBodyParams, RequestId,
};
use chromiumoxide::cdp::js_protocol::runtime::EventConsoleApiCalled;
use chromiumoxide::Page;
use futures::StreamExt;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value as JsonValue;
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tracing::debug;

/// 页面主文档可见文本
const VISIBLE_TEXT_JS: &str = r#"
    (function() {
        return document.body ? document.body.innerText : '';
    })()
"#;

/// 深度遍历整棵节点树（含嵌套 shadow root），按文档序拼接文本节点
const DEEP_TEXT_JS: &str = r#"
    (function() {
        const parts = [];
        function walk(root) {
            for (const node of root.childNodes) {
                if (node.nodeType === Node.TEXT_NODE) {
                    const t = node.textContent.trim();
                    if (t) parts.push(t);
                } else if (node.nodeType === Node.ELEMENT_NODE) {
                    const tag = node.tagName.toLowerCase();
                    if (tag === 'script' || tag === 'style') continue;
                    if (node.shadowRoot) walk(node.shadowRoot);
                    walk(node);
                }
            }
        }
        walk(document.body || document);
        return parts.join('\n');
    })()
"#;

/// 每个 frame 的可见文本（跨域 frame 读不到，贡献空串）
const FRAME_TEXTS_JS: &str = r#"
    (function() {
        const out = [];
        for (const f of document.querySelectorAll('iframe, frame')) {
            try {
                const d = f.contentDocument;
                out.push(d && d.body ? (d.body.innerText || '') : '');
            } catch (e) {
                out.push('');
            }
        }
        return out;
    })()
"#;

/// 每个 frame 的自身 URL 与完整标记（跨域 frame 标记为空，URL 取 src）
const FRAME_DOCUMENTS_JS: &str = r#"
    (function() {
        const out = [];
        for (const f of document.querySelectorAll('iframe, frame')) {
            let url = '';
            let markup = '';
            try {
                const d = f.contentDocument;
                if (d) {
                    url = d.location.href;
                    markup = d.documentElement ? d.documentElement.outerHTML : '';
                }
            } catch (e) { /* 跨域 frame */ }
            if (!url) url = f.src || '';
            out.push({ url: url, markup: markup });
        }
        return out;
    })()
"#;

/// 主文档 + 可达 frame 内的全部超链接 href
const ALL_LINKS_JS: &str = r#"
    (function() {
        const out = [];
        const collect = (doc) => {
            for (const a of doc.querySelectorAll('a[href]')) {
                if (a.href) out.push(a.href);
            }
        };
        collect(document);
        for (const f of document.querySelectorAll('iframe, frame')) {
            try {
                if (f.contentDocument) collect(f.contentDocument);
            } catch (e) { /* 跨域 frame */ }
        }
        return out;
    })()
"#;

/// 页面稳定探针：readyState + 已加载资源数
const STABILITY_PROBE_JS: &str = r#"
    (function() {
        return {
            ready: document.readyState,
            resources: performance.getEntriesByType('resource').length,
        };
    })()
"#;

#[derive(Debug, Deserialize)]
struct StabilityProbe {
    ready: String,
    resources: u64,
}

/// 一个 frame 的文档视图（跨域 frame 的 markup 为空，URL 仍可用）
#[derive(Debug, Clone, Deserialize)]
pub struct FrameDocument {
    pub url: String,
    pub markup: String,
}

/// 页面探查器
pub struct PageInspector {
    page: Page,
}

impl PageInspector {
    pub fn new(page: Page) -> Self {
        Self { page }
    }

    /// 导航到目标 URL
    pub async fn goto(&self, url: &str) -> Result<()> {
        self.page
            .goto(url)
            .await
            .with_context(|| format!("导航到 {} 失败", url))?;
        Ok(())
    }

    /// 执行 JS 并返回 JSON 结果
    pub async fn eval(&self, js_code: impl Into<String>) -> Result<JsonValue> {
        let result = self.page.evaluate(js_code.into()).await?;
        let json_value = result.into_value()?;
        Ok(json_value)
    }

    /// 执行 JS 并反序列化为指定类型
    pub async fn eval_as<T: DeserializeOwned>(&self, js_code: impl Into<String>) -> Result<T> {
        let json_value = self.eval(js_code).await?;
        let typed_value = serde_json::from_value(json_value)?;
        Ok(typed_value)
    }

    /// 等待页面达到"内容稳定"：
    /// readyState 完成且资源数在静默窗口内不再变化，或到达最长等待
    pub async fn wait_until_stable(&self, quiet: Duration, poll: Duration, max_wait: Duration) {
        let started = Instant::now();
        let mut last_resources: Option<u64> = None;
        let mut last_change = Instant::now();

        while started.elapsed() < max_wait {
            match self.eval_as::<StabilityProbe>(STABILITY_PROBE_JS).await {
                Ok(probe) => {
                    if last_resources != Some(probe.resources) {
                        last_resources = Some(probe.resources);
                        last_change = Instant::now();
                    }
                    if probe.ready == "complete" && last_change.elapsed() >= quiet {
                        debug!(
                            "页面已稳定 ({} 个资源, 耗时 {:?})",
                            probe.resources,
                            started.elapsed()
                        );
                        return;
                    }
                }
                Err(e) => {
                    // 探针失败不终止等待，页面可能还在跳转
                    debug!("稳定探针失败: {}", e);
                }
            }
            sleep(poll).await;
        }
        debug!("页面稳定等待超时 ({:?})", max_wait);
    }

    /// 主文档可见文本
    pub async fn visible_text(&self) -> Result<String> {
        self.eval_as(VISIBLE_TEXT_JS).await
    }

    /// 深度遍历文本（含 shadow DOM）
    pub async fn deep_text(&self) -> Result<String> {
        self.eval_as(DEEP_TEXT_JS).await
    }

    /// 各 frame 的文本，按遍历顺序
    pub async fn frame_texts(&self) -> Result<Vec<String>> {
        self.eval_as(FRAME_TEXTS_JS).await
    }

    /// 各 frame 的自身 URL + 标记，按遍历顺序
    ///
    /// frame 内的相对端点要按 frame 自己的 URL 解析，不能用外层页面
    pub async fn frame_documents(&self) -> Result<Vec<FrameDocument>> {
        self.eval_as(FRAME_DOCUMENTS_JS).await
    }

    /// 主文档完整标记
    pub async fn page_markup(&self) -> Result<String> {
        let html = self.page.content().await?;
        Ok(html)
    }

    /// 主文档 + frame 内全部链接
    pub async fn all_link_hrefs(&self) -> Result<Vec<String>> {
        self.eval_as(ALL_LINKS_JS).await
    }

    // ========== 控制台捕获 ==========

    /// 开始捕获控制台输出（需在导航前挂上）
    pub async fn start_console_capture(&self) -> Result<ConsoleCapture> {
        let mut events = self.page.event_listener::<EventConsoleApiCalled>().await?;
        let buffer: Arc<Mutex<Vec<String>>> = Arc::new(Mutex::new(Vec::new()));
        let sink = buffer.clone();

        let task = tokio::spawn(async move {
            while let Some(event) = events.next().await {
                let mut parts = Vec::new();
                for arg in &event.args {
                    if let Some(value) = &arg.value {
                        match value {
                            JsonValue::String(s) => parts.push(s.clone()),
                            other => parts.push(other.to_string()),
                        }
                    }
                }
                if !parts.is_empty() {
                    if let Ok(mut buf) = sink.lock() {
                        buf.push(parts.join(" "));
                    }
                }
            }
        });

        Ok(ConsoleCapture { buffer, task })
    }

    // ========== 网络捕获 ==========

    /// 开始记录网络响应（需在导航前挂上）
    pub async fn start_network_capture(&self) -> Result<NetworkCapture> {
        self.page.execute(EnableParams::default()).await?;
        let mut events = self.page.event_listener::<EventResponseReceived>().await?;
        let entries: Arc<Mutex<Vec<NetworkEntry>>> = Arc::new(Mutex::new(Vec::new()));
        let sink = entries.clone();

        let task = tokio::spawn(async move {
            while let Some(event) = events.next().await {
                let entry = NetworkEntry {
                    request_id: event.request_id.clone(),
                    mime_type: event.response.mime_type.clone(),
                    url: event.response.url.clone(),
                };
                if let Ok(mut buf) = sink.lock() {
                    buf.push(entry);
                }
            }
        });

        Ok(NetworkCapture { entries, task })
    }

    /// 关闭底层页面（页面随每步用完即弃）
    pub async fn close(self) {
        if let Err(e) = self.page.close().await {
            debug!("关闭页面失败（忽略）: {}", e);
        }
    }

    /// 取某次响应的正文（base64 正文跳过，标记类内容不会是二进制）
    pub async fn response_body(&self, request_id: &RequestId) -> Result<Option<String>> {
        let resp = self
            .page
            .execute(GetResponseBodyParams::new(request_id.clone()))
            .await?;
        if resp.result.base64_encoded {
            return Ok(None);
        }
        Ok(Some(resp.result.body.clone()))
    }
}

/// 控制台捕获句柄
pub struct ConsoleCapture {
    buffer: Arc<Mutex<Vec<String>>>,
    task: JoinHandle<()>,
}

impl ConsoleCapture {
    /// 停止捕获并取回全部输出
    ///
    /// 并发收集必须在快照组装前收束，不允许晚到的数据漏进后续步骤
    pub fn finish(self) -> Vec<String> {
        self.task.abort();
        match self.buffer.lock() {
            Ok(buf) => buf.clone(),
            Err(_) => Vec::new(),
        }
    }
}

/// 一条被观测到的网络响应
#[derive(Debug, Clone)]
pub struct NetworkEntry {
    pub request_id: RequestId,
    pub mime_type: String,
    pub url: String,
}

/// 网络捕获句柄
pub struct NetworkCapture {
    entries: Arc<Mutex<Vec<NetworkEntry>>>,
    task: JoinHandle<()>,
}

impl NetworkCapture {
    /// 停止捕获并取回观测记录
    pub fn finish(self) -> Vec<NetworkEntry> {
        self.task.abort();
        match self.entries.lock() {
            Ok(buf) => buf.clone(),
            Err(_) => Vec::new(),
        }
    }
}
