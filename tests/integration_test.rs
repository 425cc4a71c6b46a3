use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde_json::json;
use tempfile::TempDir;
use tokio_test::assert_ok;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use transcript_summarizer::clients::gemini::{GeminiClient, GenerateReply, GenerativeClient};
use transcript_summarizer::config::{ApiMode, Config};
use transcript_summarizer::error::{AppError, AppResult, ConfigError, FileError, SummarizeError};
use transcript_summarizer::models::{BatchReport, TokenUsage, UsageMetadata};
use transcript_summarizer::orchestrator::{discover_transcripts, BatchProcessor};
use transcript_summarizer::services::output_path::{resolve_output_path, sanitize_model_name};
use transcript_summarizer::services::summary_service::SummaryService;
use transcript_summarizer::services::transcript_reader::read_transcript;

// ========== 测试用假客户端 ==========

/// 脚本化的单次调用结果
enum FakeReply {
    /// 返回给定文本
    Text(&'static str),
    /// 返回给定文本和用量元数据
    TextWithUsage(&'static str, UsageMetadata),
    /// 返回空文本（应触发重试）
    Empty,
    /// 服务端错误 500（瞬时失败，应触发重试）
    ServerError,
    /// 客户端错误 400（致命失败，不应重试）
    BadRequest,
}

/// 按脚本依次应答的假客户端，并记录调用次数
///
/// 内部用 Arc 共享状态，克隆后仍指向同一份脚本与计数
#[derive(Clone)]
struct FakeClient {
    script: Arc<Mutex<Vec<FakeReply>>>,
    calls: Arc<Mutex<usize>>,
}

impl FakeClient {
    fn new(script: Vec<FakeReply>) -> Self {
        Self {
            script: Arc::new(Mutex::new(script)),
            calls: Arc::new(Mutex::new(0)),
        }
    }

    fn call_count(&self) -> usize {
        *self.calls.lock().expect("lock")
    }
}

impl GenerativeClient for FakeClient {
    async fn generate(&self, _prompt: &str) -> AppResult<GenerateReply> {
        *self.calls.lock().expect("lock") += 1;

        let mut script = self.script.lock().expect("lock");
        assert!(!script.is_empty(), "脚本应答已耗尽，调用次数超出预期");

        match script.remove(0) {
            FakeReply::Text(text) => Ok(GenerateReply {
                text: text.to_string(),
                usage: None,
            }),
            FakeReply::TextWithUsage(text, usage) => Ok(GenerateReply {
                text: text.to_string(),
                usage: Some(usage),
            }),
            FakeReply::Empty => Ok(GenerateReply {
                text: String::new(),
                usage: None,
            }),
            FakeReply::ServerError => Err(AppError::Summarize(SummarizeError::BadStatus {
                status: 500,
                message: "internal error".to_string(),
            })),
            FakeReply::BadRequest => Err(AppError::Summarize(SummarizeError::BadStatus {
                status: 400,
                message: "invalid key".to_string(),
            })),
        }
    }
}

/// 回显正文的假客户端（去掉提示词与分隔符）
struct EchoClient;

impl GenerativeClient for EchoClient {
    async fn generate(&self, prompt: &str) -> AppResult<GenerateReply> {
        let text = prompt
            .split_once("\n\n")
            .map(|(_, content)| content)
            .unwrap_or(prompt)
            .to_string();
        Ok(GenerateReply { text, usage: None })
    }
}

/// 构造测试用摘要服务（零基础间隔，便于计时断言）
fn test_service<C: GenerativeClient>(client: C, max_retries: usize) -> SummaryService<C> {
    test_service_with_delay(client, max_retries, Duration::ZERO)
}

fn test_service_with_delay<C: GenerativeClient>(
    client: C,
    max_retries: usize,
    base_delay: Duration,
) -> SummaryService<C> {
    SummaryService::with_client(client, "摘要", "test-model", max_retries, base_delay)
}

// ========== 输出路径解析 ==========

#[test]
fn sanitize_model_name_replaces_unsafe_chars() {
    assert_eq!(
        sanitize_model_name("gemini-1.5-flash-latest"),
        "gemini_1_5_flash_latest"
    );
    assert_eq!(sanitize_model_name("plain"), "plain");
}

#[test]
fn resolve_output_path_mirrors_directory_structure() {
    let input_root = Path::new("/data/in");
    let output_root = Path::new("/data/out");

    let top = resolve_output_path(
        Path::new("/data/in/a.txt"),
        input_root,
        output_root,
        "gemini-1.5-flash-latest",
    )
    .expect("解析顶层文件路径");
    assert_eq!(
        top,
        PathBuf::from("/data/out/a_summary_gemini_1_5_flash_latest.txt")
    );

    let nested = resolve_output_path(
        Path::new("/data/in/sub/deep/b.txt"),
        input_root,
        output_root,
        "gemini-1.5-flash-latest",
    )
    .expect("解析嵌套文件路径");
    assert_eq!(
        nested,
        PathBuf::from("/data/out/sub/deep/b_summary_gemini_1_5_flash_latest.txt")
    );
}

#[test]
fn resolve_output_path_is_idempotent() {
    let first = resolve_output_path(
        Path::new("/data/in/sub/b.txt"),
        Path::new("/data/in"),
        Path::new("/data/out"),
        "gemini-2.5-flash-preview-05-20",
    )
    .expect("第一次解析");
    let second = resolve_output_path(
        Path::new("/data/in/sub/b.txt"),
        Path::new("/data/in"),
        Path::new("/data/out"),
        "gemini-2.5-flash-preview-05-20",
    )
    .expect("第二次解析");

    assert_eq!(first, second);
}

#[test]
fn resolve_output_path_rejects_file_outside_root() {
    let result = resolve_output_path(
        Path::new("/elsewhere/a.txt"),
        Path::new("/data/in"),
        Path::new("/data/out"),
        "m",
    );

    assert!(matches!(
        result,
        Err(AppError::File(FileError::OutsideRoot { .. }))
    ));
}

// ========== 编码容错读取 ==========

#[tokio::test]
async fn read_transcript_roundtrips_utf8() {
    let dir = TempDir::new().expect("临时目录");
    let file = dir.path().join("meeting.txt");
    let text = "안녕하세요, 회의를 시작하겠습니다。\n今天的议题有三项。";
    std::fs::write(&file, text.as_bytes()).expect("写入测试文件");

    let content = read_transcript(&file).await.expect("读取 UTF-8 文件");
    assert_eq!(content, text);
}

#[tokio::test]
async fn read_transcript_decodes_legacy_korean_encoding() {
    let dir = TempDir::new().expect("临时目录");
    let file = dir.path().join("legacy.txt");
    let text = "안녕하세요 회의록입니다";
    let (bytes, _, had_errors) = encoding_rs::EUC_KR.encode(text);
    assert!(!had_errors);
    std::fs::write(&file, &bytes).expect("写入测试文件");

    let content = read_transcript(&file).await.expect("读取 EUC-KR 文件");
    assert_eq!(content, text);
}

#[tokio::test]
async fn read_transcript_fails_when_no_encoding_matches() {
    let dir = TempDir::new().expect("临时目录");
    let file = dir.path().join("garbage.txt");
    // 0x80 既不是合法的 UTF-8，也不是合法的 EUC-KR 前导字节
    std::fs::write(&file, [0x80u8, 0x80, 0x80]).expect("写入测试文件");

    let result = read_transcript(&file).await;
    assert!(matches!(
        result,
        Err(AppError::File(FileError::DecodeFailed { .. }))
    ));
}

#[tokio::test]
async fn read_transcript_fails_immediately_for_missing_file() {
    let dir = TempDir::new().expect("临时目录");

    let result = read_transcript(&dir.path().join("不存在.txt")).await;
    assert!(matches!(
        result,
        Err(AppError::File(FileError::ReadFailed { .. }))
    ));
}

// ========== 摘要服务的重试与退避 ==========

#[tokio::test(start_paused = true)]
async fn summarize_succeeds_after_transient_failures() {
    let fake = FakeClient::new(vec![
        FakeReply::ServerError,
        FakeReply::Empty,
        FakeReply::Text("会议摘要"),
    ]);
    let service = test_service(fake.clone(), 3);
    let mut usage = TokenUsage::default();

    let summary = service
        .summarize("正文", &mut usage)
        .await
        .expect("第三次尝试应成功");

    assert_eq!(summary, "会议摘要");
    assert_eq!(fake.call_count(), 3);
}

#[tokio::test(start_paused = true)]
async fn summarize_waits_exponential_backoff_between_attempts() {
    let fake = FakeClient::new(vec![
        FakeReply::ServerError,
        FakeReply::ServerError,
        FakeReply::Text("好"),
    ]);
    let service = test_service(fake.clone(), 3);
    let mut usage = TokenUsage::default();

    let start = tokio::time::Instant::now();
    service
        .summarize("正文", &mut usage)
        .await
        .expect("最终应成功");

    // 基础间隔为零时，两次失败的退避分别为 2^0 和 2^1 秒
    assert_eq!(start.elapsed(), Duration::from_secs(3));
}

#[tokio::test(start_paused = true)]
async fn summarize_backoff_includes_per_mode_floor() {
    let fake = FakeClient::new(vec![FakeReply::Empty, FakeReply::Text("好")]);
    let service = test_service_with_delay(fake.clone(), 3, Duration::from_secs(10));
    let mut usage = TokenUsage::default();

    let start = tokio::time::Instant::now();
    service
        .summarize("正文", &mut usage)
        .await
        .expect("最终应成功");

    // 失败后退避 2^0 + 10 秒，第二次调用前再等基础间隔 10 秒
    assert_eq!(start.elapsed(), Duration::from_secs(21));
    assert_eq!(fake.call_count(), 2);
}

#[tokio::test(start_paused = true)]
async fn summarize_exhausts_retries_and_reports_attempts() {
    let fake = FakeClient::new(vec![FakeReply::Empty, FakeReply::Empty, FakeReply::Empty]);
    let service = test_service(fake.clone(), 3);
    let mut usage = TokenUsage::default();

    let result = service.summarize("正文", &mut usage).await;

    match result {
        Err(AppError::Summarize(SummarizeError::RetriesExhausted { attempts, .. })) => {
            assert_eq!(attempts, 3);
        }
        other => panic!("预期重试耗尽错误，实际: {:?}", other.map(|_| ())),
    }
    assert_eq!(fake.call_count(), 3);
}

#[tokio::test(start_paused = true)]
async fn summarize_aborts_immediately_on_fatal_error() {
    let fake = FakeClient::new(vec![FakeReply::BadRequest, FakeReply::Text("不应到达")]);
    let service = test_service(fake.clone(), 3);
    let mut usage = TokenUsage::default();

    let result = service.summarize("正文", &mut usage).await;

    assert!(matches!(
        result,
        Err(AppError::Summarize(SummarizeError::BadStatus {
            status: 400,
            ..
        }))
    ));
    assert_eq!(fake.call_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn summarize_accumulates_token_usage_across_calls() {
    let fake = FakeClient::new(vec![
        FakeReply::TextWithUsage(
            "第一篇",
            UsageMetadata {
                prompt_token_count: 10,
                candidates_token_count: 5,
                total_token_count: 15,
            },
        ),
        FakeReply::TextWithUsage(
            "第二篇",
            UsageMetadata {
                prompt_token_count: 7,
                candidates_token_count: 3,
                total_token_count: 10,
            },
        ),
        FakeReply::Text("第三篇没有用量信息"),
    ]);
    let service = test_service(fake.clone(), 3);
    let mut usage = TokenUsage::default();

    for _ in 0..3 {
        service
            .summarize("正文", &mut usage)
            .await
            .expect("调用应成功");
    }

    assert_eq!(usage.total_input_tokens, 17);
    assert_eq!(usage.total_output_tokens, 8);
    assert_eq!(usage.total(), 25);
}

#[test]
fn usage_metadata_tolerates_missing_or_malformed_fields() {
    // 整体不是对象视为无效
    assert_eq!(UsageMetadata::from_value(&json!("oops")), None);
    assert_eq!(UsageMetadata::from_value(&json!(42)), None);

    // 缺失字段按 0 计
    let partial = UsageMetadata::from_value(&json!({ "promptTokenCount": 10 })).expect("部分字段");
    assert_eq!(partial.prompt_token_count, 10);
    assert_eq!(partial.candidates_token_count, 0);
    assert_eq!(partial.total_token_count, 0);

    let full = UsageMetadata::from_value(&json!({
        "promptTokenCount": 10,
        "candidatesTokenCount": 5,
        "totalTokenCount": 15
    }))
    .expect("完整字段");
    assert_eq!(full.total_token_count, 15);
}

// ========== 文件发现 ==========

#[test]
fn discover_transcripts_sorts_and_filters_by_extension() {
    let dir = TempDir::new().expect("临时目录");
    std::fs::write(dir.path().join("b.txt"), "b").expect("写入");
    std::fs::write(dir.path().join("a.txt"), "a").expect("写入");
    std::fs::write(dir.path().join("note.md"), "md").expect("写入");
    std::fs::write(dir.path().join("UPPER.TXT"), "大写扩展名").expect("写入");
    std::fs::create_dir_all(dir.path().join("sub")).expect("创建子目录");
    std::fs::write(dir.path().join("sub/c.txt"), "c").expect("写入");

    let files = discover_transcripts(dir.path()).expect("发现文件");

    let relative: Vec<_> = files
        .iter()
        .map(|f| f.relative_path.to_string_lossy().to_string())
        .collect();
    // 扩展名为字面量精确匹配，.md 与 .TXT 都被排除；结果按相对路径排序
    assert_eq!(relative, vec!["a.txt", "b.txt", "sub/c.txt"]);
}

// ========== 批处理场景 ==========

#[tokio::test]
async fn process_folder_mirrors_tree_and_reports_counts() {
    let input = TempDir::new().expect("输入目录");
    let output = TempDir::new().expect("输出目录");
    std::fs::write(input.path().join("a.txt"), "hello").expect("写入");
    std::fs::create_dir_all(input.path().join("sub")).expect("创建子目录");
    std::fs::write(input.path().join("sub/b.txt"), "world").expect("写入");

    let processor = BatchProcessor::with_service(test_service(EchoClient, 3));
    let report = assert_ok!(processor.process_folder(input.path(), output.path()).await);

    assert_eq!(report.total, 2);
    assert_eq!(report.processed, 2);
    assert_eq!(report.failed, 0);
    assert!(report.success);
    assert_eq!(report.processed + report.failed, report.total);

    let a_out = output.path().join("a_summary_test_model.txt");
    let b_out = output.path().join("sub/b_summary_test_model.txt");
    assert_eq!(std::fs::read_to_string(a_out).expect("读取输出"), "hello");
    assert_eq!(std::fs::read_to_string(b_out).expect("读取输出"), "world");
}

#[tokio::test]
async fn process_folder_rerun_overwrites_previous_output() {
    let input = TempDir::new().expect("输入目录");
    let output = TempDir::new().expect("输出目录");
    let source = input.path().join("a.txt");
    std::fs::write(&source, "第一版").expect("写入");

    let processor = BatchProcessor::with_service(test_service(EchoClient, 3));
    assert_ok!(processor.process_folder(input.path(), output.path()).await);

    // 修改源文件后重跑：输出被覆盖，不产生新文件
    std::fs::write(&source, "第二版").expect("改写");
    let report = assert_ok!(processor.process_folder(input.path(), output.path()).await);
    assert_eq!(report.processed, 1);

    let out_file = output.path().join("a_summary_test_model.txt");
    assert_eq!(
        std::fs::read_to_string(&out_file).expect("读取输出"),
        "第二版"
    );
    let entries = std::fs::read_dir(output.path()).expect("列出输出").count();
    assert_eq!(entries, 1);
}

#[tokio::test]
async fn process_folder_counts_undecodable_file_as_failed() {
    let input = TempDir::new().expect("输入目录");
    let output = TempDir::new().expect("输出目录");
    std::fs::write(input.path().join("bad.txt"), [0x80u8, 0x80, 0x80]).expect("写入");

    let processor = BatchProcessor::with_service(test_service(EchoClient, 3));
    let report = assert_ok!(processor.process_folder(input.path(), output.path()).await);

    assert_eq!(report.total, 1);
    assert_eq!(report.processed, 0);
    assert_eq!(report.failed, 1);
    assert!(report.success);
}

#[tokio::test(start_paused = true)]
async fn process_folder_isolates_per_file_failures() {
    let input = TempDir::new().expect("输入目录");
    let output = TempDir::new().expect("输出目录");
    std::fs::write(input.path().join("a.txt"), "甲").expect("写入");
    std::fs::write(input.path().join("b.txt"), "乙").expect("写入");

    // a.txt 的调用全部失败（重试耗尽），b.txt 成功
    let fake = FakeClient::new(vec![
        FakeReply::Empty,
        FakeReply::Empty,
        FakeReply::Text("乙的摘要"),
    ]);
    let processor = BatchProcessor::with_service(test_service(fake.clone(), 2));
    let report = assert_ok!(processor.process_folder(input.path(), output.path()).await);

    assert_eq!(report.total, 2);
    assert_eq!(report.processed, 1);
    assert_eq!(report.failed, 1);
    assert_eq!(fake.call_count(), 3);
    assert!(output.path().join("b_summary_test_model.txt").exists());
    assert!(!output.path().join("a_summary_test_model.txt").exists());
}

#[tokio::test]
async fn process_folder_returns_success_for_empty_input() {
    let input = TempDir::new().expect("输入目录");
    let output = TempDir::new().expect("输出目录");

    let processor = BatchProcessor::with_service(test_service(EchoClient, 3));
    let report = assert_ok!(processor.process_folder(input.path(), output.path()).await);

    assert_eq!(report, BatchReport::empty());
    assert!(report.success);
}

#[tokio::test]
async fn process_folder_rejects_missing_input_root() {
    let dir = TempDir::new().expect("临时目录");
    let missing = dir.path().join("不存在的目录");
    let output = dir.path().join("out");

    let processor = BatchProcessor::with_service(test_service(EchoClient, 3));
    let result = processor.process_folder(&missing, &output).await;

    assert!(matches!(
        result,
        Err(AppError::Config(ConfigError::InputDirNotFound { .. }))
    ));
    // 预检失败时不应创建输出目录
    assert!(!output.exists());
}

#[tokio::test]
async fn process_folder_rejects_non_directory_input_root() {
    let dir = TempDir::new().expect("临时目录");
    let file = dir.path().join("file.txt");
    std::fs::write(&file, "不是目录").expect("写入");

    let processor = BatchProcessor::with_service(test_service(EchoClient, 3));
    let result = processor.process_folder(&file, &dir.path().join("out")).await;

    assert!(matches!(
        result,
        Err(AppError::Config(ConfigError::NotADirectory { .. }))
    ));
}

// ========== Gemini 客户端 ==========

fn gemini_test_client(server_uri: &str) -> GeminiClient {
    let config = Config::with_api_key(ApiMode::Free, "test-key");
    GeminiClient::with_model(&config, "test-model").with_api_base(server_uri)
}

#[tokio::test]
async fn gemini_client_parses_text_and_usage_metadata() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/models/test-model:generateContent"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "candidates": [{
                "content": { "parts": [{ "text": "这是" }, { "text": "摘要" }] }
            }],
            "usageMetadata": {
                "promptTokenCount": 10,
                "candidatesTokenCount": 5,
                "totalTokenCount": 15
            }
        })))
        .mount(&server)
        .await;

    let client = gemini_test_client(&server.uri());
    let reply = client.generate("请总结").await.expect("调用应成功");

    assert_eq!(reply.text, "这是摘要");
    let usage = reply.usage.expect("应带用量元数据");
    assert_eq!(usage.prompt_token_count, 10);
    assert_eq!(usage.candidates_token_count, 5);
    assert_eq!(usage.total_token_count, 15);
}

#[tokio::test]
async fn gemini_client_returns_empty_text_for_missing_candidates() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/models/test-model:generateContent"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .mount(&server)
        .await;

    let client = gemini_test_client(&server.uri());
    let reply = client.generate("请总结").await.expect("调用应成功");

    // 空文本由摘要服务按瞬时失败处理
    assert!(reply.text.is_empty());
    assert!(reply.usage.is_none());
}

#[tokio::test]
async fn gemini_client_maps_server_error_to_retryable() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/models/test-model:generateContent"))
        .respond_with(ResponseTemplate::new(503).set_body_string("overloaded"))
        .mount(&server)
        .await;

    let client = gemini_test_client(&server.uri());
    let result = client.generate("请总结").await;

    match result {
        Err(AppError::Summarize(e)) => {
            assert!(e.is_retryable());
        }
        other => panic!("预期摘要错误，实际: {:?}", other.map(|_| ())),
    }
}

#[tokio::test]
async fn gemini_client_maps_client_error_to_fatal() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/models/test-model:generateContent"))
        .respond_with(ResponseTemplate::new(400).set_body_string("API key not valid"))
        .mount(&server)
        .await;

    let client = gemini_test_client(&server.uri());
    let result = client.generate("请总结").await;

    match result {
        Err(AppError::Summarize(e)) => {
            assert!(!e.is_retryable());
            assert!(matches!(
                e,
                SummarizeError::BadStatus { status: 400, .. }
            ));
        }
        other => panic!("预期摘要错误，实际: {:?}", other.map(|_| ())),
    }
}

// ========== 配置加载 ==========

#[test]
fn config_from_env_reads_mode_specific_key() {
    std::env::set_var("GOOGLE_API_KEY_FREE", "free-key-123");

    let config = Config::from_env(ApiMode::Free, None).expect("加载免费模式配置");
    assert_eq!(config.api_key, "free-key-123");
    assert_eq!(config.api_mode.model_name(), "gemini-1.5-flash-latest");
    assert!(config.max_retries >= 1);

    std::env::remove_var("GOOGLE_API_KEY_FREE");
}

#[test]
fn config_from_env_fails_without_key() {
    std::env::remove_var("GOOGLE_API_KEY_PAID");

    let result = Config::from_env(ApiMode::Paid, None);
    assert!(matches!(
        result,
        Err(AppError::Config(ConfigError::MissingApiKey { .. }))
    ));
}

#[test]
fn config_prompt_prefers_custom_over_default() {
    let mut config = Config::with_api_key(ApiMode::Free, "k");
    assert_eq!(config.prompt(), transcript_summarizer::DEFAULT_PROMPT);

    config.custom_prompt = Some("自定义提示词".to_string());
    assert_eq!(config.prompt(), "自定义提示词");
}
