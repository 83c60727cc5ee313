//! 内容提取 - 业务能力层
//!
//! 把一个 URL 渲染成规范化的 PageSnapshot。
//!
//! 真实目标页面把题目藏在不同的层里：纯文本、迟到的异步文本、
//! frame 内容、shadow 子树、甚至只在网络通道上可见的响应体。
//! 任何单一策略都会在某类页面上悄悄失效，所以各层是"并集合并"，
//! 不是逐个回退到第一个成功为止：不同层承载的信息不可互换。
//!
//! 跨域 frame 是网络层存在的主要原因：DOM 侧读不到它们的文档，
//! 但它们的 HTML 响应体在网络通道上完整可见，端点和文件链接
//! 照样要在这些正文里扫描

use std::sync::OnceLock;
use std::time::{Duration, Instant};

use anyhow::Result;
use regex::Regex;
use tokio::time::sleep;
use tracing::{debug, warn};

use crate::browser::BrowserSession;
use crate::config::Config;
use crate::infrastructure::{FrameDocument, PageInspector};
use crate::models::PageSnapshot;
use crate::services::endpoint_resolver::{resolve_against, resolve_submit_url};

/// 认定为数据文件的扩展名（表格、文档、电子表格、结构化数据）
const DATA_FILE_EXTENSIONS: &[&str] = &[".csv", ".pdf", ".xlsx", ".json"];

/// 内容提取器
pub struct ContentExtractor {
    text_cap: usize,
    quiet: Duration,
    poll: Duration,
    max_wait: Duration,
    frame_max_wait: Duration,
}

impl ContentExtractor {
    pub fn new(config: &Config) -> Self {
        Self {
            text_cap: config.question_text_cap,
            quiet: Duration::from_millis(config.stabilize_quiet_ms),
            poll: Duration::from_millis(config.stabilize_poll_ms),
            max_wait: Duration::from_millis(config.stabilize_max_wait_ms),
            frame_max_wait: Duration::from_millis(config.frame_max_wait_ms),
        }
    }

    /// 提取页面快照
    ///
    /// 永不失败：渲染/网络错误就地降级为空快照 + 失败标记
    pub async fn extract(&self, session: &BrowserSession, url: &str) -> PageSnapshot {
        match self.try_extract(session, url).await {
            Ok(snapshot) => snapshot,
            Err(e) => {
                warn!("⚠️ 页面提取失败 ({}): {}", url, e);
                PageSnapshot::degraded(e.to_string())
            }
        }
    }

    async fn try_extract(&self, session: &BrowserSession, url: &str) -> Result<PageSnapshot> {
        let page = session.new_blank_page().await?;
        let inspector = PageInspector::new(page);

        // 监听必须在导航前挂上，否则错过加载期的控制台输出和响应
        let console = inspector.start_console_capture().await?;
        let network = inspector.start_network_capture().await?;

        inspector.goto(url).await?;
        inspector
            .wait_until_stable(self.quiet, self.poll, self.max_wait)
            .await;

        // ---------- 各提取层，单层失败不拖垮整体 ----------
        let body_text = log_layer_err("body", inspector.visible_text().await);
        self.wait_for_frames_settled(&inspector).await;
        let frame_texts = log_layer_err("frames", inspector.frame_texts().await);
        let shadow_text = log_layer_err("shadow", inspector.deep_text().await);
        let frame_docs = log_layer_err("frame-docs", inspector.frame_documents().await);
        let main_markup = log_layer_err("markup", inspector.page_markup().await);
        let hrefs = log_layer_err("links", inspector.all_link_hrefs().await);

        // 并发收集在组装快照前收束，不允许部分结果漏进后续步骤
        let console_lines = console.finish();
        let network_entries = network.finish();

        // 网络通道里观测到的标记类响应体：跨域 frame 的文档 DOM 侧完全
        // 读不到，只能在这里拿到；保留每份正文自己的 URL 作解析基准
        let mut network_docs: Vec<(String, String)> = Vec::new();
        for entry in &network_entries {
            if !entry.mime_type.contains("html") {
                continue;
            }
            match inspector.response_body(&entry.request_id).await {
                Ok(Some(body)) => network_docs.push((entry.url.clone(), body)),
                Ok(None) => {}
                Err(e) => debug!("读取响应体失败 ({}): {}", entry.url, e),
            }
        }

        // ---------- 组装快照 ----------
        let mut snapshot = PageSnapshot::empty();

        // 固定拼接顺序：主体 → frame → shadow → 网络 → 控制台
        let mut sections: Vec<String> = vec![body_text.unwrap_or_default()];
        sections.extend(frame_texts.unwrap_or_default());
        sections.push(shadow_text.unwrap_or_default());
        sections.extend(
            network_docs
                .iter()
                .map(|(_, body)| strip_markup(body))
                .filter(|t| !t.is_empty()),
        );
        sections.extend(console_lines);
        snapshot.question_text = truncate_chars(
            &sections
                .iter()
                .filter(|s| !s.is_empty())
                .cloned()
                .collect::<Vec<_>>()
                .join("\n"),
            self.text_cap,
        );

        for href in hrefs.unwrap_or_default() {
            if has_data_extension(&href) {
                snapshot.push_file_link(href);
            }
        }

        // 端点解析：frame 优先（按遍历顺序，首个命中生效，相对路径按
        // frame 自身 URL 解析），主文档兜底
        for frame in frame_docs.unwrap_or_default() {
            if frame.markup.is_empty() {
                continue;
            }
            let base = frame_base(&frame, url);
            if let Some(found) = resolve_submit_url(&frame.markup, base) {
                snapshot.submit_url = Some(found);
                break;
            }
        }
        if snapshot.submit_url.is_none() {
            snapshot.submit_url = resolve_submit_url(&main_markup.unwrap_or_default(), url);
        }

        // 网络层兜底：端点或文件链接可能只在跨域 frame 的正文里出现
        for (doc_url, body) in &network_docs {
            scan_markup_document(&mut snapshot, doc_url, body);
        }

        inspector.close().await;

        debug!(
            "快照完成: 文本 {} 字符, {} 个文件链接, 端点 {:?}",
            snapshot.question_text.chars().count(),
            snapshot.file_links.len(),
            snapshot.submit_url
        );
        Ok(snapshot)
    }

    /// 等待各 frame 各自安定：每个 frame 独立判定，文本长度在一次
    /// 轮询间隔内不变即算安定，忙碌的 frame 不占用其他 frame 的判定。
    /// 永不安定的 frame 到时拿多少算多少，不中止整次提取
    async fn wait_for_frames_settled(&self, inspector: &PageInspector) {
        let started = Instant::now();
        let mut tracker = FrameSettle::new();

        while started.elapsed() < self.frame_max_wait {
            let lengths = match inspector.frame_texts().await {
                Ok(texts) => texts.iter().map(|t| t.len()).collect::<Vec<_>>(),
                Err(_) => return,
            };
            if tracker.observe(&lengths) {
                return;
            }
            sleep(self.poll).await;
        }
        debug!("frame 安定等待超时 ({:?})", self.frame_max_wait);
    }
}

/// 逐 frame 的安定判定
///
/// 每个 frame 维护自己的"已安定"标记：长度在相邻两次观测间不变
/// 即置位，之后不再清除。全部置位才算整体安定
struct FrameSettle {
    last: Vec<usize>,
    settled: Vec<bool>,
    primed: bool,
}

impl FrameSettle {
    fn new() -> Self {
        Self {
            last: Vec::new(),
            settled: Vec::new(),
            primed: false,
        }
    }

    /// 喂入一次观测，返回是否全部 frame 已安定
    fn observe(&mut self, lengths: &[usize]) -> bool {
        if !self.primed || lengths.len() != self.last.len() {
            // 首次观测，或 frame 数量变化（页面还在注入 frame）：重新基线
            self.last = lengths.to_vec();
            self.settled = vec![false; lengths.len()];
            self.primed = true;
            return false;
        }
        for (i, len) in lengths.iter().enumerate() {
            if *len == self.last[i] {
                self.settled[i] = true;
            } else {
                self.last[i] = *len;
            }
        }
        self.settled.iter().all(|s| *s)
    }
}

fn log_layer_err<T>(layer: &str, result: Result<T>) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(e) => {
            debug!("提取层 {} 失败: {}", layer, e);
            None
        }
    }
}

/// frame 内相对路径的解析基准：frame 自身 URL，取不到时退回外层页面
fn frame_base<'a>(frame: &'a FrameDocument, page_url: &'a str) -> &'a str {
    if frame.url.is_empty() {
        page_url
    } else {
        &frame.url
    }
}

/// 对一份网络通道拿到的标记文档扫描文件链接与端点。
/// 相对路径按该文档自身的 URL 解析，不是外层页面的
fn scan_markup_document(snapshot: &mut PageSnapshot, doc_url: &str, body: &str) {
    for href in collect_hrefs(body) {
        let absolute = resolve_against(doc_url, &href);
        if has_data_extension(&absolute) {
            snapshot.push_file_link(absolute);
        }
    }
    if snapshot.submit_url.is_none() {
        snapshot.submit_url = resolve_submit_url(body, doc_url);
    }
}

/// 从原始标记里收集 href 属性值
fn collect_hrefs(html: &str) -> Vec<String> {
    static HREF_RE: OnceLock<Regex> = OnceLock::new();
    let href_re = HREF_RE
        .get_or_init(|| Regex::new(r#"(?i)href\s*=\s*["']([^"']+)["']"#).expect("内置正则必须合法"));
    href_re
        .captures_iter(html)
        .filter_map(|caps| caps.get(1).map(|m| m.as_str().to_string()))
        .collect()
}

/// 链接目标是否为数据文件（忽略 query/fragment）
fn has_data_extension(href: &str) -> bool {
    let path = href.split(['?', '#']).next().unwrap_or(href);
    let path_lower = path.to_lowercase();
    DATA_FILE_EXTENSIONS.iter().any(|ext| path_lower.ends_with(ext))
}

/// 剥掉脚本/样式/标签，回收纯文本
fn strip_markup(html: &str) -> String {
    static SCRIPT_RE: OnceLock<Regex> = OnceLock::new();
    static TAG_RE: OnceLock<Regex> = OnceLock::new();
    static WS_RE: OnceLock<Regex> = OnceLock::new();

    let script_re = SCRIPT_RE.get_or_init(|| {
        Regex::new(r"(?is)<(script|style)[^>]*>.*?</(script|style)>|<!--.*?-->")
            .expect("内置正则必须合法")
    });
    let tag_re = TAG_RE.get_or_init(|| Regex::new(r"(?s)<[^>]*>").expect("内置正则必须合法"));
    let ws_re = WS_RE.get_or_init(|| Regex::new(r"\s+").expect("内置正则必须合法"));

    let no_scripts = script_re.replace_all(html, " ");
    let no_tags = tag_re.replace_all(&no_scripts, " ");
    ws_re.replace_all(&no_tags, " ").trim().to_string()
}

/// 按字符截断到上限
fn truncate_chars(text: &str, cap: usize) -> String {
    if text.chars().count() > cap {
        text.chars().take(cap).collect()
    } else {
        text.to_string()
    }
}
