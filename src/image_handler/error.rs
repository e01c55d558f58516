//! # 错误模型模块
//!
//! ## 设计思路
//!
//! 使用单一错误枚举承载加载/预览链路中的所有错误来源，避免字符串拼接式错误处理。
//! 通过 `thiserror` 保持人类可读错误，同时让调用侧可按分支匹配。
//!
//! 错误分两类：
//! - 预期内的环境问题（找不到、超时、网络失败……）：提示用户后仅中止当前区域
//! - `Internal`：说明代码有缺陷，提示用户后继续向上返回

/// 图片加载与预览统一错误类型。
#[derive(Debug, thiserror::Error)]
pub enum ImageError {
    #[error("文件不存在：{0}")]
    NotFound(String),

    #[error("网络错误：{0}")]
    Network(String),

    #[error("超时错误：{0}")]
    Timeout(String),

    #[error("文件错误：{0}")]
    FileSystem(String),

    #[error("格式错误：{0}")]
    InvalidFormat(String),

    #[error("资源限制：{0}")]
    ResourceLimit(String),

    #[error("剪贴板错误：{0}")]
    Clipboard(String),

    #[error("内部错误：{0}")]
    Internal(String),
}

impl ImageError {
    /// 稳定错误码，供宿主侧匹配。
    pub fn code(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "E_NOT_FOUND",
            Self::Network(_) => "E_NETWORK",
            Self::Timeout(_) => "E_TIMEOUT",
            Self::FileSystem(_) => "E_FILE_SYSTEM",
            Self::InvalidFormat(_) => "E_INVALID_FORMAT",
            Self::ResourceLimit(_) => "E_RESOURCE_LIMIT",
            Self::Clipboard(_) => "E_CLIPBOARD",
            Self::Internal(_) => "E_INTERNAL",
        }
    }

    /// 出错所在阶段。
    pub fn stage(&self) -> &'static str {
        match self {
            Self::NotFound(_) | Self::FileSystem(_) => "load_file",
            Self::Network(_) | Self::Timeout(_) => "load_url",
            Self::InvalidFormat(_) | Self::ResourceLimit(_) => "validate",
            Self::Clipboard(_) => "clipboard",
            Self::Internal(_) => "internal",
        }
    }

    /// 是否属于预期内的环境错误。
    pub fn is_expected(&self) -> bool {
        !matches!(self, Self::Internal(_))
    }

    /// 给用户看的提示文案。
    pub fn user_message(&self, locator: &str) -> String {
        match self {
            Self::Timeout(_) | Self::Network(_) => format!("打开图片 '{}' 超时！", locator),
            Self::NotFound(_) | Self::FileSystem(_) => format!("打开图片 '{}' 失败！", locator),
            other => format!("打开图片失败！{}", other),
        }
    }
}
