use quiz_auto_submit::browser::BrowserSession;
use quiz_auto_submit::config::Config;
use quiz_auto_submit::orchestrator::SessionRunner;
use quiz_auto_submit::services::ContentExtractor;
use quiz_auto_submit::utils;

#[tokio::test]
#[ignore] // 默认忽略，需要本机有 Chromium：cargo test -- --ignored
async fn test_browser_launch() {
    // 初始化日志
    utils::logging::init(true);

    // 加载配置
    let config = Config::load();

    // 测试浏览器启动与关闭
    let session = BrowserSession::launch(&config).await;
    assert!(session.is_ok(), "应该能够启动无头浏览器");
    session.unwrap().close().await;
}

#[tokio::test]
#[ignore]
async fn test_extract_static_page() {
    // 初始化日志
    utils::logging::init(true);

    // 加载配置
    let config = Config::load();

    // 启动浏览器并提取一个真实页面
    let session = BrowserSession::launch(&config)
        .await
        .expect("启动浏览器失败");

    let extractor = ContentExtractor::new(&config);
    let snapshot = extractor.extract(&session, "https://example.com/").await;

    session.close().await;

    assert!(snapshot.render_failure.is_none(), "静态页面提取不应降级");
    assert!(
        snapshot.question_text.contains("Example Domain"),
        "应该提取到页面主体文本"
    );
}

#[tokio::test]
#[ignore]
async fn test_unreachable_url_degrades_session() {
    // 初始化日志
    utils::logging::init(true);

    // 加载配置
    let config = Config::load();

    // 不可达的起始 URL：会话仍然完整结束，轨迹恰好一步
    let runner = SessionRunner::new(&config);
    let trace = runner
        .run(&config, 1, "http://127.0.0.1:9/unreachable")
        .await;

    assert_eq!(trace.len(), 1, "没有 next_url 时会话应该恰好一步结束");
    let record = &trace[0];
    assert!(record.snapshot.render_failure.is_some(), "提取应该降级");
    assert!(!record.submission.accepted, "没有端点时提交不应成功");
}
