//! # 加载模块
//!
//! ## 设计思路
//!
//! 统一处理两种来源（URL / 本地文件）的原始字节加载。加载只负责拿到字节，
//! 不做图片类型判定：识别不了的内容也要交给解析器降级为“未知”，
//! 这样宿主仍能显示兜底预览。
//!
//! ## 实现思路
//!
//! - URL：协议校验 + 可选代理（仅取自设置，不读环境变量）+ 固定超时 + 流式读取与体积上限。
//! - 文件：存在性 + metadata 体积限制 + 异步读取，不阻塞运行时线程。
//! - 网络错误统一映射到 `ImageError`，由上层决定是否提示用户。

use std::path::Path;
use std::time::Duration;

use super::source::RawImageData;
use super::{ImageConfig, ImageError, ImageHandler};

const BUFFER_INITIAL_CAPACITY: usize = 16 * 1024;

impl ImageHandler {
    /// 从 URL 加载图片原始字节。
    pub(super) async fn load_from_url(
        &self,
        url: &str,
        config: &ImageConfig,
    ) -> Result<RawImageData, ImageError> {
        log::info!("🌐 开始下载图片 - URL: {}", Self::redact_url_for_log(url));

        let parsed = reqwest::Url::parse(url)
            .map_err(|e| ImageError::InvalidFormat(format!("URL 格式错误：{}", e)))?;
        if parsed.scheme() != "http" && parsed.scheme() != "https" {
            return Err(ImageError::InvalidFormat("仅支持 HTTP/HTTPS".to_string()));
        }

        let client = Self::build_http_client(config)?;
        let timeout = Duration::from_millis(config.load_timeout_ms);
        let bytes = tokio::time::timeout(timeout, self.download(&client, parsed, config))
            .await
            .map_err(|_| ImageError::Timeout(format!("下载超时（{}ms）", config.load_timeout_ms)))??;

        log::debug!("✅ 下载完成 - {} bytes", bytes.len());
        Ok(RawImageData {
            bytes,
            source_hint: "url",
        })
    }

    /// 从本地路径加载图片原始字节。
    pub(super) async fn load_from_file(
        &self,
        path: &Path,
        config: &ImageConfig,
    ) -> Result<RawImageData, ImageError> {
        log::info!("📁 开始读取本地图片 - 路径: {}", path.display());

        let metadata = match tokio::fs::metadata(path).await {
            Ok(metadata) => metadata,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(ImageError::NotFound(path.display().to_string()));
            }
            Err(e) => {
                return Err(ImageError::FileSystem(format!("无法读取文件信息：{}", e)));
            }
        };

        if !metadata.is_file() {
            return Err(ImageError::FileSystem(format!("不是普通文件：{}", path.display())));
        }

        if metadata.len() > config.max_file_size {
            return Err(ImageError::ResourceLimit(format!(
                "文件过大：{:.2} MB（限制：{:.2} MB）",
                metadata.len() as f64 / 1024.0 / 1024.0,
                config.max_file_size as f64 / 1024.0 / 1024.0
            )));
        }

        let bytes = tokio::fs::read(path)
            .await
            .map_err(|e| ImageError::FileSystem(format!("无法读取图片文件：{}", e)))?;

        Ok(RawImageData {
            bytes,
            source_hint: "file",
        })
    }

    async fn download(
        &self,
        client: &reqwest::Client,
        url: reqwest::Url,
        config: &ImageConfig,
    ) -> Result<Vec<u8>, ImageError> {
        log::debug!("📡 发送 HTTP 请求...");
        let url_text = url.to_string();

        let mut response = client
            .get(url)
            .header(reqwest::header::ACCEPT, "image/*,*/*;q=0.8")
            .send()
            .await
            .map_err(|e| Self::map_reqwest_error(e, &url_text, config))?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(ImageError::NotFound(Self::redact_url_for_log(&url_text)));
        }
        if !status.is_success() {
            return Err(ImageError::Network(format!(
                "HTTP {}: {}",
                status.as_u16(),
                Self::status_message(status.as_u16())
            )));
        }

        let total_len = response.content_length();
        if let Some(size) = total_len {
            if size > config.max_file_size {
                return Err(ImageError::ResourceLimit(format!(
                    "文件过大：{:.2} MB（限制：{:.2} MB）",
                    size as f64 / 1024.0 / 1024.0,
                    config.max_file_size as f64 / 1024.0 / 1024.0
                )));
            }
        }

        let initial_capacity = total_len
            .map(|len| len.min(config.max_file_size).min(usize::MAX as u64) as usize)
            .filter(|len| *len > 0)
            .unwrap_or(BUFFER_INITIAL_CAPACITY);
        let mut buffer = Vec::with_capacity(initial_capacity);
        let mut total: u64 = 0;

        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|e| Self::map_reqwest_error(e, &url_text, config))?
        {
            total = total.saturating_add(chunk.len() as u64);
            if total > config.max_file_size {
                return Err(ImageError::ResourceLimit("下载后文件超过大小限制".to_string()));
            }
            buffer.extend_from_slice(&chunk);
        }

        Ok(buffer)
    }

    fn build_http_client(config: &ImageConfig) -> Result<reqwest::Client, ImageError> {
        let mut builder = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.load_timeout_ms))
            .connect_timeout(Duration::from_millis(config.connect_timeout_ms))
            .redirect(reqwest::redirect::Policy::limited(config.max_redirects))
            .no_proxy();

        if let Some(proxy) = &config.http_proxy {
            let proxy = reqwest::Proxy::http(proxy)
                .map_err(|e| ImageError::InvalidFormat(format!("HTTP 代理地址无效：{}", e)))?;
            builder = builder.proxy(proxy);
        }
        if let Some(proxy) = &config.https_proxy {
            let proxy = reqwest::Proxy::https(proxy)
                .map_err(|e| ImageError::InvalidFormat(format!("HTTPS 代理地址无效：{}", e)))?;
            builder = builder.proxy(proxy);
        }

        builder
            .build()
            .map_err(|e| ImageError::Network(format!("无法创建 HTTP 客户端：{}", e)))
    }

    pub(crate) fn redact_url_for_log(url: &str) -> String {
        let Ok(parsed) = reqwest::Url::parse(url) else {
            return "<invalid-url>".to_string();
        };

        let host = parsed.host_str().unwrap_or("<unknown-host>");
        let port = parsed.port().map(|p| format!(":{}", p)).unwrap_or_default();
        let path = parsed.path();

        format!("{}://{}{}{}", parsed.scheme(), host, port, path)
    }

    /// 统一映射 reqwest 错误到业务错误。
    fn map_reqwest_error(e: reqwest::Error, url: &str, config: &ImageConfig) -> ImageError {
        let err_msg = Self::sanitize_error_message_with_redacted_url(&e.to_string(), url);

        if e.is_timeout() {
            ImageError::Timeout(format!("下载超时（{}ms）", config.load_timeout_ms))
        } else if e.is_connect() {
            ImageError::Network(format!("无法连接：{}", err_msg))
        } else {
            ImageError::Network(format!("请求失败：{}", err_msg))
        }
    }

    fn sanitize_error_message_with_redacted_url(error_msg: &str, url: &str) -> String {
        let redacted = Self::redact_url_for_log(url);
        error_msg.replace(url, &redacted)
    }

    /// 常见 HTTP 状态码本地化文案。
    fn status_message(code: u16) -> &'static str {
        match code {
            404 => "未找到",
            403 => "访问被拒绝",
            500..=599 => "服务器错误",
            _ => "请求失败",
        }
    }
}
