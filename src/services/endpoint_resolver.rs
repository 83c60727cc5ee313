//! 提交端点解析 - 业务能力层
//!
//! 在原始标记/文本中按固定优先级扫描提交端点。
//! 规则有序，第一个命中即返回：不打分、不选"最优"，
//! 靠前的模式更具体、更权威

use regex::Regex;
use std::sync::OnceLock;

/// 模式规则，优先级从高到低：
/// 1. 已知的规范提交端点（完整 URL）
/// 2. 双引号键值对 "submit": "..."
/// 3. 单引号键值对 'submit': '...'
/// 4. 自然语言指令 POST this JSON to <路径或 URL>
fn patterns() -> &'static [Regex] {
    static PATTERNS: OnceLock<Vec<Regex>> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        [
            r"https://tds-llm-analysis\.s-anand\.net/submit\S*",
            r#""submit"\s*:\s*"([^"]+)""#,
            r"'submit'\s*:\s*'([^']+)'",
            r"POST this JSON to\s+(\S+)",
        ]
        .iter()
        .map(|p| Regex::new(p).expect("内置正则必须合法"))
        .collect()
    })
}

/// 在标记中解析提交端点
///
/// 返回绝对 URL；没有规则命中时返回 None
pub fn resolve_submit_url(markup: &str, base_url: &str) -> Option<String> {
    for pattern in patterns() {
        if let Some(caps) = pattern.captures(markup) {
            // 有捕获组取组，否则取整体匹配
            let raw = caps
                .get(1)
                .or_else(|| caps.get(0))
                .map(|m| m.as_str())
                .unwrap_or_default();
            let clean = sanitize(raw);
            if clean.is_empty() {
                continue;
            }
            return Some(resolve_against(base_url, &clean));
        }
    }
    None
}

/// 清洗候选：在第一个尖括号或引号处截断（防止标记泄漏进匹配）
fn sanitize(candidate: &str) -> String {
    let cut = candidate
        .find(['<', '>', '"', '\''])
        .unwrap_or(candidate.len());
    candidate[..cut].trim().to_string()
}

/// 将候选解析为绝对 URL（相对路径按页面自身 URL 解析）。
/// 链接扫描同样用它把相对 href 归一成绝对形式
pub(crate) fn resolve_against(base_url: &str, candidate: &str) -> String {
    if candidate.starts_with("http://") || candidate.starts_with("https://") {
        return candidate.to_string();
    }
    let Some(origin) = origin_of(base_url) else {
        return candidate.to_string();
    };
    if let Some(rest) = candidate.strip_prefix("//") {
        let scheme = base_url.split("://").next().unwrap_or("https");
        return format!("{}://{}", scheme, rest);
    }
    if candidate.starts_with('/') {
        return format!("{}{}", origin, candidate);
    }
    // 相对路径：挂到 base 的目录部分
    let dir_end = base_url.rfind('/').map(|i| i + 1).unwrap_or(base_url.len());
    let dir = if dir_end > origin.len() {
        &base_url[..dir_end]
    } else {
        base_url
    };
    if dir.ends_with('/') {
        format!("{}{}", dir, candidate)
    } else {
        format!("{}/{}", dir, candidate)
    }
}

/// 取 base URL 的 origin 部分（scheme://host[:port]）
fn origin_of(base_url: &str) -> Option<&str> {
    let scheme_end = base_url.find("://")? + 3;
    let rest = &base_url[scheme_end..];
    match rest.find('/') {
        Some(i) => Some(&base_url[..scheme_end + i]),
        None => Some(base_url),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canonical_endpoint_wins_first() {
        let markup = r#"<p>see "submit": "/other"</p> https://tds-llm-analysis.s-anand.net/submit?id=7"#;
        let url = resolve_submit_url(markup, "https://example.com/task");
        assert_eq!(
            url.as_deref(),
            Some("https://tds-llm-analysis.s-anand.net/submit?id=7")
        );
    }

    #[test]
    fn test_double_quoted_submit_field() {
        let markup = r#"{"question": "q", "submit": "https://api.example.com/answer"}"#;
        let url = resolve_submit_url(markup, "https://example.com/task");
        assert_eq!(url.as_deref(), Some("https://api.example.com/answer"));
    }

    #[test]
    fn test_single_quoted_submit_field() {
        let markup = "config = {'submit': '/api/submit'}";
        let url = resolve_submit_url(markup, "https://example.com/quiz/page1");
        assert_eq!(url.as_deref(), Some("https://example.com/api/submit"));
    }

    #[test]
    fn test_natural_language_instruction_relative() {
        let markup = "anything you want, just POST this JSON to /submit";
        let url = resolve_submit_url(markup, "https://example.com/quiz/demo");
        assert_eq!(url.as_deref(), Some("https://example.com/submit"));
    }

    #[test]
    fn test_sanitize_truncates_at_angle_bracket() {
        let markup = r#"POST this JSON to /submit</p>"#;
        let url = resolve_submit_url(markup, "https://example.com/t");
        assert_eq!(url.as_deref(), Some("https://example.com/submit"));
    }

    #[test]
    fn test_no_match_returns_none() {
        assert!(resolve_submit_url("<p>nothing here</p>", "https://example.com").is_none());
    }

    #[test]
    fn test_resolution_is_idempotent() {
        let markup = r#""submit": "/submit""#;
        let first = resolve_submit_url(markup, "https://example.com/q");
        let second = resolve_submit_url(markup, "https://example.com/q");
        assert_eq!(first, second);
    }

    #[test]
    fn test_relative_path_without_slash() {
        let markup = "POST this JSON to answers/check";
        let url = resolve_submit_url(markup, "https://example.com/quiz/page");
        assert_eq!(url.as_deref(), Some("https://example.com/quiz/answers/check"));
    }

    #[test]
    fn test_origin_of_handles_port() {
        assert_eq!(
            origin_of("http://localhost:8000/a/b"),
            Some("http://localhost:8000")
        );
        assert_eq!(origin_of("no-scheme"), None);
    }
}
