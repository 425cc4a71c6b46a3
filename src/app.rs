//! 交互式应用入口
//!
//! 负责菜单交互：选择 API 模式、录入自定义提示词、
//! 录入输入 / 输出目录，然后把批处理交给编排层。
//! 本层只做输入收集与结果展示，不含流水线逻辑

use anyhow::{bail, Result};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing::{error, info};

use crate::config::{ApiMode, Config, DEFAULT_PROMPT};
use crate::error::ConfigError;
use crate::models::BatchReport;
use crate::orchestrator::BatchProcessor;

/// 默认输出子目录名（相对输入目录）
const DEFAULT_OUTPUT_DIR_NAME: &str = "summarized_results";

/// 应用主结构
pub struct App {
    config: Config,
    input_root: PathBuf,
    output_root: PathBuf,
}

impl App {
    /// 通过交互式菜单收集配置并初始化应用
    pub fn from_interactive() -> Result<Self> {
        print_banner();

        let api_mode = select_api_mode()?;
        let custom_prompt = read_custom_prompt()?;
        let config = Config::from_env(api_mode, custom_prompt)?;

        let input_root = read_input_folder()?;
        let output_root = read_output_folder(&input_root)?;

        Ok(Self {
            config,
            input_root,
            output_root,
        })
    }

    /// 运行批处理并展示结果
    pub async fn run(&self) -> Result<()> {
        info!(
            "🧠 API 模式: {}，模型: {}",
            self.config.api_mode,
            self.config.api_mode.model_name()
        );

        let processor = BatchProcessor::new(&self.config);

        let report = match processor
            .process_folder(&self.input_root, &self.output_root)
            .await
        {
            Ok(report) => report,
            Err(e) => {
                error!("❌ 批处理中止: {}", e);
                BatchReport::failure(e.to_string())
            }
        };

        print_report(&report, &self.output_root);

        Ok(())
    }
}

// ========== 菜单辅助函数 ==========

fn print_banner() {
    println!("{}", "=".repeat(60));
    println!("    AI 会议转写稿批量摘要系统");
    println!("{}", "=".repeat(60));
    println!();
}

/// 读取一行输入（去掉首尾空白）
///
/// 输入流关闭（如管道结束）视为错误，避免菜单循环空转
fn read_line(prompt: &str) -> Result<String> {
    print!("{}", prompt);
    io::stdout().flush()?;

    let mut line = String::new();
    if io::stdin().read_line(&mut line)? == 0 {
        bail!("输入流已关闭");
    }

    Ok(line.trim().to_string())
}

/// 选择 API 模式
fn select_api_mode() -> Result<ApiMode> {
    loop {
        println!("请选择 API 模式:");
        println!("1. {}", ApiMode::Free);
        println!("2. {}", ApiMode::Paid);
        println!();

        let choice = read_line("选择 (1 或 2): ")?;

        match choice.as_str() {
            "1" => return Ok(ApiMode::Free),
            "2" => return Ok(ApiMode::Paid),
            other => {
                // 也接受直接输入 free / paid
                if let Some(mode) = ApiMode::from_str(other) {
                    return Ok(mode);
                }
                println!(
                    "{}",
                    ConfigError::UnsupportedMode {
                        mode: other.to_string(),
                    }
                );
                println!();
            }
        }
    }
}

/// 录入自定义提示词
///
/// 支持多行输入，连续两个空行结束；
/// 直接回车（无内容）表示使用默认提示词
fn read_custom_prompt() -> Result<Option<String>> {
    println!("请输入 AI 摘要使用的提示词。");
    println!("(直接回车使用默认提示词)");
    println!();
    println!("默认提示词:");
    println!("{}", "-".repeat(40));
    println!("{}", DEFAULT_PROMPT);
    println!("{}", "-".repeat(40));
    println!();
    println!("请输入新的提示词 (可多行，连续两个空行结束输入):");

    let mut lines: Vec<String> = Vec::new();

    loop {
        let mut line = String::new();
        if io::stdin().read_line(&mut line)? == 0 {
            break;
        }
        let line = line.trim_end_matches(['\r', '\n']).to_string();

        if line.trim().is_empty() && lines.last().is_some_and(|last| last.trim().is_empty()) {
            // 连续两个空行，结束输入，去掉末尾空行
            lines.pop();
            break;
        }
        lines.push(line);
    }

    let custom_prompt = lines.join("\n").trim().to_string();

    if custom_prompt.is_empty() {
        println!("将使用默认提示词。");
        Ok(None)
    } else {
        println!("将使用自定义提示词。");
        Ok(Some(custom_prompt))
    }
}

/// 录入输入目录（必须存在且为目录）
fn read_input_folder() -> Result<PathBuf> {
    loop {
        println!("请输入转写文件所在的目录路径。");

        let folder = read_line("输入目录: ")?;
        let folder = folder.trim_matches('"');

        if folder.is_empty() {
            println!("请输入路径。");
            println!();
            continue;
        }

        let path = PathBuf::from(folder);

        if !path.exists() {
            println!(
                "{}",
                ConfigError::InputDirNotFound {
                    path: path.display().to_string(),
                }
            );
            println!();
            continue;
        }

        if !path.is_dir() {
            println!(
                "{}",
                ConfigError::NotADirectory {
                    path: path.display().to_string(),
                }
            );
            println!();
            continue;
        }

        return Ok(path);
    }
}

/// 录入输出目录（回车使用默认值）
fn read_output_folder(input_root: &Path) -> Result<PathBuf> {
    let default_output = input_root.join(DEFAULT_OUTPUT_DIR_NAME);

    println!("请输入摘要结果的保存目录。");
    println!("默认值: {}", default_output.display());

    let folder = read_line("输出目录 (回车使用默认值): ")?;
    let folder = folder.trim_matches('"');

    if folder.is_empty() {
        Ok(default_output)
    } else {
        Ok(PathBuf::from(folder))
    }
}

/// 展示最终报告
fn print_report(report: &BatchReport, output_root: &Path) {
    println!();
    println!("{}", "=".repeat(60));

    if report.success {
        println!("✅ 批处理完成");
        println!(
            "总计: {}，成功: {}，失败: {}",
            report.total, report.processed, report.failed
        );
        if report.total > 0 {
            println!("摘要保存在: {}", output_root.display());
        }
    } else {
        println!("❌ 批处理失败");
        if let Some(error) = &report.error {
            println!("原因: {}", error);
        }
    }

    println!("{}", "=".repeat(60));
}
