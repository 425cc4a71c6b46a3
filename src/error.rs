use std::fmt;
use std::path::Path;

/// 应用程序错误类型
#[derive(Debug)]
pub enum AppError {
    /// 配置错误
    Config(ConfigError),
    /// 文件操作错误
    File(FileError),
    /// 摘要调用错误
    Summarize(SummarizeError),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Config(e) => write!(f, "配置错误: {}", e),
            AppError::File(e) => write!(f, "文件错误: {}", e),
            AppError::Summarize(e) => write!(f, "摘要错误: {}", e),
        }
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AppError::Config(e) => Some(e),
            AppError::File(e) => Some(e),
            AppError::Summarize(e) => Some(e),
        }
    }
}

/// 配置错误
///
/// 批处理开始前的预检失败，属于致命错误，直接中止整个批次
#[derive(Debug)]
pub enum ConfigError {
    /// 不支持的 API 模式
    UnsupportedMode {
        mode: String,
    },
    /// 环境变量中缺少 API 密钥
    MissingApiKey {
        env_key: String,
        display_name: String,
    },
    /// 输入目录不存在
    InputDirNotFound {
        path: String,
    },
    /// 输入路径不是目录
    NotADirectory {
        path: String,
    },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::UnsupportedMode { mode } => {
                write!(f, "不支持的 API 模式: {} (支持: free / paid)", mode)
            }
            ConfigError::MissingApiKey {
                env_key,
                display_name,
            } => {
                write!(
                    f,
                    "{} 的 API 密钥未配置，请在 .env 中设置环境变量 {}",
                    display_name, env_key
                )
            }
            ConfigError::InputDirNotFound { path } => {
                write!(f, "输入目录不存在: {}", path)
            }
            ConfigError::NotADirectory { path } => {
                write!(f, "输入路径不是目录: {}", path)
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// 文件操作错误
///
/// 单个文件级别的错误，由编排层捕获并计入失败数，不中止批次
#[derive(Debug)]
pub enum FileError {
    /// 读取文件失败
    ReadFailed {
        path: String,
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// 写入文件失败
    WriteFailed {
        path: String,
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// 创建目录失败
    CreateDirFailed {
        path: String,
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// 所有候选编码都无法解码文件
    DecodeFailed {
        path: String,
        encodings: Vec<&'static str>,
    },
    /// 文件不在输入根目录之下
    OutsideRoot {
        path: String,
        root: String,
    },
}

impl fmt::Display for FileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FileError::ReadFailed { path, source } => {
                write!(f, "读取文件失败 ({}): {}", path, source)
            }
            FileError::WriteFailed { path, source } => {
                write!(f, "写入文件失败 ({}): {}", path, source)
            }
            FileError::CreateDirFailed { path, source } => {
                write!(f, "创建目录失败 ({}): {}", path, source)
            }
            FileError::DecodeFailed { path, encodings } => {
                write!(
                    f,
                    "无法解码文件 {} (已尝试编码: {})",
                    path,
                    encodings.join(", ")
                )
            }
            FileError::OutsideRoot { path, root } => {
                write!(f, "文件 {} 不在输入根目录 {} 之下", path, root)
            }
        }
    }
}

impl std::error::Error for FileError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            FileError::ReadFailed { source, .. }
            | FileError::WriteFailed { source, .. }
            | FileError::CreateDirFailed { source, .. } => {
                Some(source.as_ref() as &(dyn std::error::Error + 'static))
            }
            _ => None,
        }
    }
}

/// 摘要调用错误
#[derive(Debug)]
pub enum SummarizeError {
    /// 网络请求失败
    RequestFailed {
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// API 返回非成功状态码
    BadStatus {
        status: u16,
        message: String,
    },
    /// API 返回内容为空
    EmptyResponse,
    /// 重试次数耗尽
    RetriesExhausted {
        attempts: usize,
        last_error: String,
    },
}

impl SummarizeError {
    /// 判断该错误是否值得重试
    ///
    /// 网络故障、限流 (429) 和服务端错误 (5xx) 视为瞬时故障；
    /// 其余客户端错误（如无效密钥）重试也不会成功
    pub fn is_retryable(&self) -> bool {
        match self {
            SummarizeError::RequestFailed { .. } => true,
            SummarizeError::BadStatus { status, .. } => *status == 429 || *status >= 500,
            SummarizeError::EmptyResponse => true,
            SummarizeError::RetriesExhausted { .. } => false,
        }
    }
}

impl fmt::Display for SummarizeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SummarizeError::RequestFailed { source } => {
                write!(f, "API 请求失败: {}", source)
            }
            SummarizeError::BadStatus { status, message } => {
                write!(f, "API 返回错误状态 {}: {}", status, message)
            }
            SummarizeError::EmptyResponse => {
                write!(f, "API 响应为空")
            }
            SummarizeError::RetriesExhausted {
                attempts,
                last_error,
            } => {
                write!(f, "API 请求在 {} 次尝试后失败: {}", attempts, last_error)
            }
        }
    }
}

impl std::error::Error for SummarizeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SummarizeError::RequestFailed { source } => {
                Some(source.as_ref() as &(dyn std::error::Error + 'static))
            }
            _ => None,
        }
    }
}

// ========== 便捷构造函数 ==========

impl AppError {
    /// 创建文件读取错误
    pub fn file_read_failed(
        path: &Path,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        AppError::File(FileError::ReadFailed {
            path: path.display().to_string(),
            source: Box::new(source),
        })
    }

    /// 创建文件写入错误
    pub fn file_write_failed(
        path: &Path,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        AppError::File(FileError::WriteFailed {
            path: path.display().to_string(),
            source: Box::new(source),
        })
    }

    /// 创建目录创建错误
    pub fn create_dir_failed(
        path: &Path,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        AppError::File(FileError::CreateDirFailed {
            path: path.display().to_string(),
            source: Box::new(source),
        })
    }

    /// 创建解码失败错误
    pub fn decode_failed(path: &Path, encodings: Vec<&'static str>) -> Self {
        AppError::File(FileError::DecodeFailed {
            path: path.display().to_string(),
            encodings,
        })
    }

    /// 创建 API 请求失败错误
    pub fn request_failed(source: impl std::error::Error + Send + Sync + 'static) -> Self {
        AppError::Summarize(SummarizeError::RequestFailed {
            source: Box::new(source),
        })
    }
}

// ========== Result 类型别名 ==========

/// 应用程序结果类型
pub type AppResult<T> = Result<T, AppError>;
