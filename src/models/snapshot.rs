//! 页面快照数据模型
//!
//! 一次页面渲染/提取的规范化结果，由 ContentExtractor 产出，
//! 产出后不可变，由请求提取的一方持有

use serde::Serialize;

/// 页面快照
///
/// 不变量：
/// - `question_text` 永远不为 null（失败时为空字符串），且已截断到配置上限
/// - `file_links` 去重，保留首次发现顺序
/// - `submit_url` 存在时必为带 scheme 的绝对 URL
#[derive(Debug, Clone, Serialize)]
pub struct PageSnapshot {
    /// 聚合后的题目文本
    pub question_text: String,
    /// 发现的数据文件链接
    pub file_links: Vec<String>,
    /// 解析出的提交端点
    pub submit_url: Option<String>,
    /// 渲染失败标记（导航/超时等被就地吸收的错误）
    pub render_failure: Option<String>,
}

impl PageSnapshot {
    /// 创建一个空快照（无文本、无链接、无端点）
    pub fn empty() -> Self {
        Self {
            question_text: String::new(),
            file_links: Vec::new(),
            submit_url: None,
            render_failure: None,
        }
    }

    /// 创建一个带失败标记的降级快照
    ///
    /// 提取过程中的任何渲染/网络错误都降级为此形态，绝不向会话抛出
    pub fn degraded(reason: impl Into<String>) -> Self {
        Self {
            render_failure: Some(reason.into()),
            ..Self::empty()
        }
    }

    /// 追加一个文件链接，保持去重和首次发现顺序
    pub fn push_file_link(&mut self, link: String) {
        if !self.file_links.contains(&link) {
            self.file_links.push(link);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_degraded_snapshot_has_empty_text() {
        let snap = PageSnapshot::degraded("导航超时");
        assert_eq!(snap.question_text, "");
        assert!(snap.file_links.is_empty());
        assert!(snap.submit_url.is_none());
        assert!(snap.render_failure.is_some());
    }

    #[test]
    fn test_push_file_link_dedup_keeps_first_order() {
        let mut snap = PageSnapshot::empty();
        snap.push_file_link("a.csv".to_string());
        snap.push_file_link("b.pdf".to_string());
        snap.push_file_link("a.csv".to_string());
        assert_eq!(snap.file_links, vec!["a.csv", "b.pdf"]);
    }
}
