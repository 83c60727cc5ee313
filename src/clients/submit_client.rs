//! 提交客户端
//!
//! 封装把答案 POST 到解析出的端点、并从响应里取下一步 URL 的逻辑

use std::time::Duration;

use serde_json::{json, Value as JsonValue};
use tracing::{debug, warn};

use crate::config::Config;
use crate::models::{ComputedAnswer, PageSnapshot, SubmissionResult};

/// 响应中可能承载下一步 URL 的字段名，按序探测
const NEXT_URL_KEYS: &[&str] = &["url", "next_url", "nextUrl", "next"];

/// 提交客户端
pub struct SubmitClient {
    client: reqwest::Client,
    timeout: Duration,
    email: String,
    secret: String,
}

impl SubmitClient {
    pub fn new(config: &Config) -> Self {
        Self {
            client: reqwest::Client::new(),
            timeout: Duration::from_secs(config.http_timeout_secs),
            email: config.email.clone(),
            secret: config.secret.clone(),
        }
    }

    /// 提交答案
    ///
    /// 快照没有端点时直接返回本地失败结果，不发起网络调用。
    /// 网络失败记入 failure_reason，不向上抛：本步没有 next_url，
    /// 会话自然优雅终止
    pub async fn submit(
        &self,
        snapshot: &PageSnapshot,
        answer: &ComputedAnswer,
    ) -> SubmissionResult {
        let Some(submit_url) = &snapshot.submit_url else {
            return SubmissionResult::not_attempted("no endpoint discovered");
        };

        let body = json!({
            "email": self.email,
            "secret": self.secret,
            "answer": answer.payload,
        });

        debug!("提交到 {}", submit_url);
        let resp = match self
            .client
            .post(submit_url)
            .timeout(self.timeout)
            .json(&body)
            .send()
            .await
        {
            Ok(resp) => resp,
            Err(e) => {
                warn!("⚠️ 提交请求失败 ({}): {}", submit_url, e);
                return SubmissionResult {
                    accepted: false,
                    raw_response: None,
                    next_url: None,
                    failure_reason: Some(format!("submit request failed: {}", e)),
                };
            }
        };

        let accepted = resp.status().is_success();
        let status = resp.status();

        // 响应是任意结构化文档：解析失败就退化成原文透传
        let raw_response = match resp.json::<JsonValue>().await {
            Ok(value) => Some(value),
            Err(e) => {
                debug!("响应不是合法 JSON: {}", e);
                None
            }
        };

        let next_url = raw_response.as_ref().and_then(extract_next_url);
        let failure_reason = if accepted {
            None
        } else {
            Some(format!("server returned status {}", status))
        };

        SubmissionResult {
            accepted,
            raw_response,
            next_url,
            failure_reason,
        }
    }
}

/// 从响应文档中提取下一步 URL；其余字段一概不解释
fn extract_next_url(response: &JsonValue) -> Option<String> {
    for key in NEXT_URL_KEYS {
        if let Some(url) = response.get(key).and_then(|v| v.as_str()) {
            if !url.is_empty() {
                return Some(url.to_string());
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PageSnapshot;

    #[test]
    fn test_missing_endpoint_short_circuits() {
        // submit_url 为空 → accepted=false 且不发网络调用
        let client = SubmitClient::new(&Config::default());
        let snapshot = PageSnapshot::empty();
        let answer = ComputedAnswer::new(json!({"answer": 1}));
        let result = tokio_test::block_on(client.submit(&snapshot, &answer));
        assert!(!result.accepted);
        assert_eq!(result.failure_reason.as_deref(), Some("no endpoint discovered"));
        assert!(result.raw_response.is_none());
        assert!(result.next_url.is_none());
    }

    #[test]
    fn test_extract_next_url_key_order() {
        let v = json!({"next_url": "b", "url": "a"});
        assert_eq!(extract_next_url(&v).as_deref(), Some("a"));

        let v = json!({"nextUrl": "c"});
        assert_eq!(extract_next_url(&v).as_deref(), Some("c"));

        let v = json!({"correct": true});
        assert!(extract_next_url(&v).is_none());
    }

    #[test]
    fn test_extract_next_url_ignores_empty_string() {
        let v = json!({"url": ""});
        assert!(extract_next_url(&v).is_none());
    }
}
