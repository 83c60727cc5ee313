//! 数学题求解 - 业务能力层
//!
//! 从题目文本提取全部数字，按关键词分派运算。
//! 数字提取规则与分类器共用同一条正则，保证两边口径一致

use regex::Regex;
use serde_json::{json, Value as JsonValue};
use std::sync::OnceLock;

use crate::models::ComputedAnswer;

/// 数字字面量：整数或小数，可带符号
fn number_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"[-+]?\d*\.\d+|[-+]?\d+").expect("内置正则必须合法"))
}

/// 提取文本中的全部数字
pub fn extract_numbers(text: &str) -> Vec<f64> {
    number_pattern()
        .find_iter(text)
        .filter_map(|m| m.as_str().parse::<f64>().ok())
        .collect()
}

/// 文本中是否含有数字
pub fn contains_number(text: &str) -> bool {
    number_pattern().is_match(text)
}

/// 求解数学题
///
/// 分派规则：sum/total/add → 求和；mean/average → 均值；
/// count/how many → 计数。没有数字或识别不出运算时，
/// 返回显式的错误载荷而不是崩溃
pub fn solve_math(text: &str) -> ComputedAnswer {
    let text_lower = text.to_lowercase();
    let numbers = extract_numbers(text);

    if numbers.is_empty() {
        return ComputedAnswer::new(json!({
            "question_type": "math",
            "error": "No numeric values detected",
        }));
    }

    if contains_any(&text_lower, &["sum", "total", "add"]) {
        let answer: f64 = numbers.iter().sum();
        return ComputedAnswer::with_rationale(
            json!({
                "question_type": "math",
                "operation": "sum",
                "numbers": numbers,
                "answer": answer,
            }),
            format!("对 {} 个数字求和", numbers.len()),
        );
    }

    if contains_any(&text_lower, &["mean", "average"]) {
        let answer = numbers.iter().sum::<f64>() / numbers.len() as f64;
        return ComputedAnswer::with_rationale(
            json!({
                "question_type": "math",
                "operation": "average",
                "numbers": numbers,
                "answer": answer,
            }),
            format!("对 {} 个数字取均值", numbers.len()),
        );
    }

    if contains_any(&text_lower, &["count", "how many"]) {
        return ComputedAnswer::with_rationale(
            json!({
                "question_type": "math",
                "operation": "count",
                "numbers": numbers,
                "answer": numbers.len(),
            }),
            "统计数字个数",
        );
    }

    // 有数字但识别不出运算
    ComputedAnswer::new(json!({
        "question_type": "math",
        "error": "Could not determine math operation",
        "numbers": numbers,
    }))
}

fn contains_any(text: &str, keywords: &[&str]) -> bool {
    keywords.iter().any(|k| text.contains(k))
}
