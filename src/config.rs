use serde::Deserialize;
use tracing::{info, warn};

use crate::error::{AppError, AppResult, ConfigError};

/// 程序配置
#[derive(Clone, Debug)]
pub struct Config {
    /// 共享密钥（调用 /solve 前校验）
    pub secret: String,
    /// 操作者邮箱（随答案一起提交）
    pub email: String,
    /// HTTP 服务监听地址
    pub bind_addr: String,
    /// 每个会话的最大步数
    pub max_session_steps: usize,
    /// 题目文本长度上限（字符）
    pub question_text_cap: usize,
    /// 页面稳定判定的静默窗口（毫秒）
    pub stabilize_quiet_ms: u64,
    /// 页面稳定轮询间隔（毫秒）
    pub stabilize_poll_ms: u64,
    /// 页面稳定最长等待（毫秒）
    pub stabilize_max_wait_ms: u64,
    /// 单个 frame 的最长等待（毫秒）
    pub frame_max_wait_ms: u64,
    /// 提交/下载请求超时（秒）
    pub http_timeout_secs: u64,
    /// 浏览器可执行文件路径（留空则用系统默认 Chromium）
    pub chrome_executable: Option<String>,
    /// 是否显示详细日志
    pub verbose_logging: bool,
    /// 输出日志文件
    pub output_log_file: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            secret: "change-me".to_string(),
            email: "solver@example.com".to_string(),
            bind_addr: "0.0.0.0:8000".to_string(),
            max_session_steps: 10,
            question_text_cap: 8000,
            stabilize_quiet_ms: 800,
            stabilize_poll_ms: 250,
            stabilize_max_wait_ms: 10_000,
            frame_max_wait_ms: 3_000,
            http_timeout_secs: 20,
            chrome_executable: None,
            verbose_logging: false,
            output_log_file: "output.txt".to_string(),
        }
    }
}

/// config.toml 的可选字段（缺省字段回退到默认值）
#[derive(Debug, Deserialize, Default)]
struct ConfigFile {
    secret: Option<String>,
    email: Option<String>,
    bind_addr: Option<String>,
    max_session_steps: Option<usize>,
    question_text_cap: Option<usize>,
    stabilize_quiet_ms: Option<u64>,
    stabilize_poll_ms: Option<u64>,
    stabilize_max_wait_ms: Option<u64>,
    frame_max_wait_ms: Option<u64>,
    http_timeout_secs: Option<u64>,
    chrome_executable: Option<String>,
    verbose_logging: Option<bool>,
    output_log_file: Option<String>,
}

impl Config {
    /// 加载配置：默认值 <- config.toml <- 环境变量，后者覆盖前者
    pub fn load() -> Self {
        let base = match Self::from_toml_file("config.toml") {
            Ok(Some(config)) => {
                info!("✓ 已加载 config.toml");
                config
            }
            Ok(None) => Self::default(),
            Err(e) => {
                warn!("⚠️ config.toml 解析失败，使用默认配置: {}", e);
                Self::default()
            }
        };
        base.with_env_overrides()
    }

    /// 从 TOML 文件加载（文件不存在时返回 Ok(None)）
    fn from_toml_file(path: &str) -> AppResult<Option<Self>> {
        if !std::path::Path::new(path).exists() {
            return Ok(None);
        }
        let content = std::fs::read_to_string(path)?;
        let file = Self::parse_toml(&content).map_err(|e| {
            AppError::Config(ConfigError::FileParseFailed {
                path: path.to_string(),
                source: Box::new(e),
            })
        })?;
        Ok(Some(Self::default().merge_file(file)))
    }

    fn parse_toml(content: &str) -> Result<ConfigFile, toml::de::Error> {
        toml::from_str(content)
    }

    fn merge_file(self, file: ConfigFile) -> Self {
        Self {
            secret: file.secret.unwrap_or(self.secret),
            email: file.email.unwrap_or(self.email),
            bind_addr: file.bind_addr.unwrap_or(self.bind_addr),
            max_session_steps: file.max_session_steps.unwrap_or(self.max_session_steps),
            question_text_cap: file.question_text_cap.unwrap_or(self.question_text_cap),
            stabilize_quiet_ms: file.stabilize_quiet_ms.unwrap_or(self.stabilize_quiet_ms),
            stabilize_poll_ms: file.stabilize_poll_ms.unwrap_or(self.stabilize_poll_ms),
            stabilize_max_wait_ms: file
                .stabilize_max_wait_ms
                .unwrap_or(self.stabilize_max_wait_ms),
            frame_max_wait_ms: file.frame_max_wait_ms.unwrap_or(self.frame_max_wait_ms),
            http_timeout_secs: file.http_timeout_secs.unwrap_or(self.http_timeout_secs),
            chrome_executable: file.chrome_executable.or(self.chrome_executable),
            verbose_logging: file.verbose_logging.unwrap_or(self.verbose_logging),
            output_log_file: file.output_log_file.unwrap_or(self.output_log_file),
        }
    }

    fn with_env_overrides(self) -> Self {
        Self {
            secret: std::env::var("QUIZ_SECRET").unwrap_or(self.secret),
            email: std::env::var("QUIZ_EMAIL").unwrap_or(self.email),
            bind_addr: std::env::var("BIND_ADDR").unwrap_or(self.bind_addr),
            max_session_steps: env_parse("MAX_SESSION_STEPS", self.max_session_steps),
            question_text_cap: env_parse("QUESTION_TEXT_CAP", self.question_text_cap),
            stabilize_quiet_ms: env_parse("STABILIZE_QUIET_MS", self.stabilize_quiet_ms),
            stabilize_poll_ms: env_parse("STABILIZE_POLL_MS", self.stabilize_poll_ms),
            stabilize_max_wait_ms: env_parse("STABILIZE_MAX_WAIT_MS", self.stabilize_max_wait_ms),
            frame_max_wait_ms: env_parse("FRAME_MAX_WAIT_MS", self.frame_max_wait_ms),
            http_timeout_secs: env_parse("HTTP_TIMEOUT_SECS", self.http_timeout_secs),
            chrome_executable: std::env::var("CHROME_EXECUTABLE")
                .ok()
                .or(self.chrome_executable),
            verbose_logging: env_parse("VERBOSE_LOGGING", self.verbose_logging),
            output_log_file: std::env::var("OUTPUT_LOG_FILE").unwrap_or(self.output_log_file),
        }
    }
}

/// 解析环境变量；值非法时告警并回退到默认值
fn env_parse<T: std::str::FromStr>(var_name: &str, default: T) -> T {
    let Ok(value) = std::env::var(var_name) else {
        return default;
    };
    match value.parse() {
        Ok(parsed) => parsed,
        Err(_) => {
            warn!(
                "⚠️ {}",
                ConfigError::EnvVarParseFailed {
                    var_name: var_name.to_string(),
                    value,
                    expected_type: std::any::type_name::<T>().to_string(),
                }
            );
            default
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_step_cap_is_ten() {
        let config = Config::default();
        assert_eq!(config.max_session_steps, 10);
        assert_eq!(config.question_text_cap, 8000);
    }

    #[test]
    fn test_toml_partial_merge() {
        let file = Config::parse_toml(
            r#"
            secret = "s3cr3t"
            max_session_steps = 5
            "#,
        )
        .expect("应能解析");
        let config = Config::default().merge_file(file);
        assert_eq!(config.secret, "s3cr3t");
        assert_eq!(config.max_session_steps, 5);
        // 未指定字段保持默认
        assert_eq!(config.question_text_cap, 8000);
    }

    #[test]
    fn test_toml_bad_type_is_error() {
        assert!(Config::parse_toml("max_session_steps = \"abc\"").is_err());
    }
}
