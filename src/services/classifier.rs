//! 题型分类 - 业务能力层
//!
//! 纯函数，全函数（总有返回值），优先级固定，首个命中即返回

use crate::models::{PageSnapshot, QuestionKind};
use crate::services::math_solver::contains_number;

/// 已知演示页标记短语
const DEMO_MARKERS: &[&str] = &["anything you want"];

/// 运算意图关键词（仅用于分类；求解时的分派词表由 math_solver 管理）
const MATH_KEYWORDS: &[&str] = &["sum", "total", "mean", "average", "count", "difference"];

/// 对快照分类
///
/// 优先级：Demo → File → Math → SubmitOnly → Text（兜底）。
/// 文件链接优先于数学/文本规则：页面给了文件，答案就在文件里
pub fn classify(snapshot: &PageSnapshot) -> QuestionKind {
    let text_lower = snapshot.question_text.to_lowercase();

    if DEMO_MARKERS.iter().any(|m| text_lower.contains(m)) {
        return QuestionKind::Demo;
    }

    if !snapshot.file_links.is_empty() {
        return QuestionKind::File;
    }

    if contains_number(&snapshot.question_text)
        && MATH_KEYWORDS.iter().any(|k| text_lower.contains(k))
    {
        return QuestionKind::Math;
    }

    if snapshot.submit_url.is_some() && text_lower.contains("answer") {
        return QuestionKind::SubmitOnly;
    }

    QuestionKind::Text
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(text: &str, links: &[&str], submit: Option<&str>) -> PageSnapshot {
        PageSnapshot {
            question_text: text.to_string(),
            file_links: links.iter().map(|s| s.to_string()).collect(),
            submit_url: submit.map(|s| s.to_string()),
            render_failure: None,
        }
    }

    #[test]
    fn test_demo_marker_beats_submit_mention() {
        // 演示标记优先于端点提及
        let snap = snapshot(
            "anything you want, just POST this JSON to /submit",
            &[],
            Some("https://example.com/submit"),
        );
        assert_eq!(classify(&snap), QuestionKind::Demo);
    }

    #[test]
    fn test_file_links_beat_math_and_text() {
        // 只要有文件链接就归为 File，与文本内容无关
        let snap = snapshot("compute the sum of 1 2 3", &["data.csv"], None);
        assert_eq!(classify(&snap), QuestionKind::File);
    }

    #[test]
    fn test_pdf_link_without_demo_marker_is_file() {
        let snap = snapshot("read the attached report", &["report.pdf"], None);
        assert_eq!(classify(&snap), QuestionKind::File);
    }

    #[test]
    fn test_math_needs_number_and_keyword() {
        let snap = snapshot("Please compute the sum of 3, 4.5 and 10", &[], None);
        assert_eq!(classify(&snap), QuestionKind::Math);

        // 有关键词没数字 → 不是数学题
        let snap = snapshot("what is the sum of everything", &[], None);
        assert_eq!(classify(&snap), QuestionKind::Text);

        // 有数字没关键词 → 不是数学题
        let snap = snapshot("there are 42 reasons", &[], None);
        assert_eq!(classify(&snap), QuestionKind::Text);
    }

    #[test]
    fn test_decimal_and_signed_tokens_count_as_numeric() {
        let snap = snapshot("what is the total of -1.5 and +2?", &[], None);
        assert_eq!(classify(&snap), QuestionKind::Math);
    }

    #[test]
    fn test_submit_only_requires_endpoint_and_answer_marker() {
        let snap = snapshot(
            "send your answer now",
            &[],
            Some("https://example.com/submit"),
        );
        assert_eq!(classify(&snap), QuestionKind::SubmitOnly);

        // 没有端点则落到 Text
        let snap = snapshot("send your answer now", &[], None);
        assert_eq!(classify(&snap), QuestionKind::Text);
    }

    #[test]
    fn test_empty_snapshot_defaults_to_text() {
        assert_eq!(classify(&PageSnapshot::empty()), QuestionKind::Text);
    }
}
