//! 文件题求解 - 业务能力层
//!
//! 取首个发现的文件链接，下载并按扩展名解析。
//! CSV 出逐列统计，JSON 出结构汇总，PDF 出开头文本摘录；
//! 不支持的扩展名返回显式 "unsupported" 载荷，绝不让整次会话失败

use std::time::Duration;

use serde_json::{json, Map, Value as JsonValue};
use tracing::{debug, warn};

use crate::models::ComputedAnswer;

/// PDF 文本摘录长度（字符）
const PDF_EXCERPT_CHARS: usize = 500;

/// 文件题求解服务
///
/// 职责：
/// - 只处理单个题目的文件链接列表
/// - 下载 + 解析 + 汇总
/// - 不关心流程顺序，不出现会话概念
pub struct FileSolver {
    client: reqwest::Client,
    timeout: Duration,
}

impl FileSolver {
    pub fn new(timeout_secs: u64) -> Self {
        Self {
            client: reqwest::Client::new(),
            timeout: Duration::from_secs(timeout_secs),
        }
    }

    /// 求解文件题
    ///
    /// 使用第一个链接；下载/解析错误降级为显式错误载荷
    pub async fn solve(&self, file_links: &[String]) -> ComputedAnswer {
        let Some(file_url) = file_links.first() else {
            return ComputedAnswer::new(json!({
                "question_type": "file",
                "answer": "No file links found",
            }));
        };

        // 先看扩展名，不支持的类型连下载都不发起
        let kind = FileKind::from_url(file_url);
        if kind == FileKind::Unsupported {
            return ComputedAnswer::new(json!({
                "question_type": "file",
                "answer": "Unsupported file type",
                "file": file_url,
            }));
        }

        let raw = match self.download(file_url).await {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!("⚠️ 文件下载失败 ({}): {}", file_url, e);
                return ComputedAnswer::new(json!({
                    "question_type": "file",
                    "error": format!("download failed: {}", e),
                    "file": file_url,
                }));
            }
        };
        debug!("文件下载完成: {} ({} 字节)", file_url, raw.len());

        let payload = match kind {
            FileKind::Csv => match String::from_utf8(raw) {
                Ok(text) => json!({
                    "question_type": "file",
                    "answer": "csv-summary",
                    "summary": describe_csv(&text),
                    "file": file_url,
                }),
                Err(_) => json!({
                    "question_type": "file",
                    "error": "csv is not valid utf-8",
                    "file": file_url,
                }),
            },
            FileKind::Json => match serde_json::from_slice::<JsonValue>(&raw) {
                Ok(value) => json!({
                    "question_type": "file",
                    "answer": "json-summary",
                    "summary": summarize_json(&value),
                    "file": file_url,
                }),
                Err(e) => json!({
                    "question_type": "file",
                    "error": format!("json parse failed: {}", e),
                    "file": file_url,
                }),
            },
            FileKind::Pdf => match pdf_excerpt(&raw) {
                Ok(text) => json!({
                    "question_type": "file",
                    "answer": text,
                    "file": file_url,
                }),
                Err(e) => json!({
                    "question_type": "file",
                    "error": format!("pdf parse failed: {}", e),
                    "file": file_url,
                }),
            },
            // 前面已拦截，这里只为穷尽匹配
            FileKind::Unsupported => json!({
                "question_type": "file",
                "answer": "Unsupported file type",
                "file": file_url,
            }),
        };

        ComputedAnswer::new(payload)
    }

    async fn download(&self, url: &str) -> Result<Vec<u8>, reqwest::Error> {
        let resp = self
            .client
            .get(url)
            .timeout(self.timeout)
            .send()
            .await?
            .error_for_status()?;
        Ok(resp.bytes().await?.to_vec())
    }
}

/// 可解析的文件类型
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FileKind {
    Csv,
    Json,
    Pdf,
    /// xlsx 等：本服务不内置电子表格解析，显式报告 unsupported
    Unsupported,
}

impl FileKind {
    fn from_url(url: &str) -> Self {
        // 去掉 query/fragment 再看扩展名
        let path = url.split(['?', '#']).next().unwrap_or(url);
        if path.ends_with(".csv") {
            FileKind::Csv
        } else if path.ends_with(".json") {
            FileKind::Json
        } else if path.ends_with(".pdf") {
            FileKind::Pdf
        } else {
            FileKind::Unsupported
        }
    }
}

/// 提取 PDF 文本并截取开头一段作答案
fn pdf_excerpt(raw: &[u8]) -> Result<String, pdf_extract::OutputError> {
    let text = pdf_extract::extract_text_from_mem(raw)?;
    Ok(text.trim().chars().take(PDF_EXCERPT_CHARS).collect())
}

/// 对 CSV 文本做逐列描述统计（count / mean / std / min / max）
///
/// 简单按逗号切分，非数值列只报 count
fn describe_csv(text: &str) -> JsonValue {
    let mut lines = text.lines().filter(|l| !l.trim().is_empty());
    let Some(header) = lines.next() else {
        return json!({});
    };
    let columns: Vec<&str> = header.split(',').map(|s| s.trim()).collect();
    let mut values: Vec<Vec<Option<f64>>> = vec![Vec::new(); columns.len()];
    let mut row_count = 0usize;

    for line in lines {
        row_count += 1;
        for (i, cell) in line.split(',').enumerate() {
            if i < values.len() {
                values[i].push(cell.trim().parse::<f64>().ok());
            }
        }
    }

    let mut summary = Map::new();
    for (i, name) in columns.iter().enumerate() {
        let nums: Vec<f64> = values[i].iter().flatten().copied().collect();
        let mut col = Map::new();
        col.insert("count".to_string(), json!(row_count));
        if !nums.is_empty() {
            let mean = nums.iter().sum::<f64>() / nums.len() as f64;
            let var = nums.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / nums.len() as f64;
            let min = nums.iter().cloned().fold(f64::INFINITY, f64::min);
            let max = nums.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
            col.insert("mean".to_string(), json!(mean));
            col.insert("std".to_string(), json!(var.sqrt()));
            col.insert("min".to_string(), json!(min));
            col.insert("max".to_string(), json!(max));
        }
        summary.insert(name.to_string(), JsonValue::Object(col));
    }
    JsonValue::Object(summary)
}

/// 汇总 JSON 文档的结构（顶层类型、键列表/长度）
fn summarize_json(value: &JsonValue) -> JsonValue {
    match value {
        JsonValue::Object(map) => json!({
            "type": "object",
            "keys": map.keys().collect::<Vec<_>>(),
        }),
        JsonValue::Array(arr) => json!({
            "type": "array",
            "length": arr.len(),
        }),
        other => json!({
            "type": "scalar",
            "value": other,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unsupported_extension_without_download() {
        // xlsx 链接直接返回 unsupported，不发起网络调用
        let solver = FileSolver::new(1);
        let answer = tokio_test::block_on(solver.solve(&["sheet.xlsx".to_string()]));
        assert_eq!(answer.payload["answer"], "Unsupported file type");
    }

    #[test]
    fn test_empty_links_explicit_payload() {
        let solver = FileSolver::new(1);
        let answer = tokio_test::block_on(solver.solve(&[]));
        assert_eq!(answer.payload["answer"], "No file links found");
    }

    #[test]
    fn test_file_kind_ignores_query_string() {
        assert_eq!(
            FileKind::from_url("https://x.com/data.csv?v=2"),
            FileKind::Csv
        );
        assert_eq!(
            FileKind::from_url("https://x.com/d.json#frag"),
            FileKind::Json
        );
        assert_eq!(
            FileKind::from_url("https://x.com/report.pdf?dl=1"),
            FileKind::Pdf
        );
        assert_eq!(
            FileKind::from_url("https://x.com/sheet.xlsx"),
            FileKind::Unsupported
        );
    }

    #[test]
    fn test_malformed_pdf_yields_explicit_error() {
        // 解析失败降级为错误载荷，不是 panic
        assert!(pdf_excerpt(b"this is not a pdf document").is_err());
    }

    #[test]
    fn test_describe_csv_numeric_column() {
        let summary = describe_csv("a,b\n1,x\n2,y\n3,z\n");
        assert_eq!(summary["a"]["count"], 3);
        assert_eq!(summary["a"]["mean"], 2.0);
        assert_eq!(summary["a"]["min"], 1.0);
        assert_eq!(summary["a"]["max"], 3.0);
        // 非数值列只有 count
        assert_eq!(summary["b"]["count"], 3);
        assert!(summary["b"].get("mean").is_none());
    }

    #[test]
    fn test_summarize_json_shapes() {
        assert_eq!(summarize_json(&json!({"k": 1}))["type"], "object");
        assert_eq!(summarize_json(&json!([1, 2]))["length"], 2);
        assert_eq!(summarize_json(&json!(5))["type"], "scalar");
    }
}
