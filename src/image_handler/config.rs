//! # 配置模块
//!
//! ## 设计思路
//!
//! 将所有“可调策略”集中到 `ImageConfig`，保证运行时行为可观测、可调整、可测试。
//!
//! ## 实现思路
//!
//! - `Default` 提供生产可用的配置：5 秒加载超时、100 边距。
//! - `apply_settings` 把用户设置文件里的代理/超时覆盖进来。
//! - `validate` 在写入前做范围校验，避免把明显错误的值带到网络层。

use super::pipeline::PREVIEW_MARGIN;
use super::ImageError;
use crate::settings::PreviewSettings;

/// 默认网络加载超时（毫秒）。
pub const DEFAULT_LOAD_TIMEOUT_MS: u64 = 5_000;

/// 图片加载与预览配置。
#[derive(Debug, Clone)]
pub struct ImageConfig {
    /// 读取原始字节时允许的最大体积（字节）。
    pub max_file_size: u64,
    /// 网络加载总超时（毫秒）。
    pub load_timeout_ms: u64,
    /// 建立连接超时（毫秒）。
    pub connect_timeout_ms: u64,
    /// 最大重定向次数。
    pub max_redirects: usize,
    /// HTTP 代理地址。
    pub http_proxy: Option<String>,
    /// HTTPS 代理地址。
    pub https_proxy: Option<String>,
    /// 适配视口时预留的边距。
    pub preview_margin: f64,
}

impl Default for ImageConfig {
    fn default() -> Self {
        Self {
            max_file_size: 50 * 1024 * 1024,
            load_timeout_ms: DEFAULT_LOAD_TIMEOUT_MS,
            connect_timeout_ms: DEFAULT_LOAD_TIMEOUT_MS,
            max_redirects: 5,
            http_proxy: None,
            https_proxy: None,
            preview_margin: PREVIEW_MARGIN,
        }
    }
}

impl ImageConfig {
    /// 应用用户设置。未设置的字段保持当前值。
    pub(crate) fn apply_settings(&mut self, settings: &PreviewSettings) -> Result<(), ImageError> {
        if let Some(timeout) = settings.load_timeout_ms {
            if !(100..=120_000).contains(&timeout) {
                return Err(ImageError::InvalidFormat(
                    "load_timeout_ms 必须在 100~120000 毫秒之间".to_string(),
                ));
            }
            self.load_timeout_ms = timeout;
            self.connect_timeout_ms = timeout;
        }

        self.http_proxy = non_empty(settings.http_proxy.as_deref());
        self.https_proxy = non_empty(settings.https_proxy.as_deref());
        Ok(())
    }

    pub(crate) fn has_proxy(&self) -> bool {
        self.http_proxy.is_some() || self.https_proxy.is_some()
    }
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}
