//! # 核心编排模块
//!
//! ## 设计思路
//!
//! `ImageHandler` 只负责流程编排与配置管理，不直接与宿主编辑器绑定。
//! 处理链路固定为：
//! 1. 读取配置快照
//! 2. 按来源加载原始字节
//! 3. 解析文件头并编码为 `PreviewContent`
//!
//! ## 实现思路
//!
//! - 配置通过 `Arc<RwLock<ImageConfig>>` 支持运行时更新代理与超时。
//! - 单次请求内使用“同一配置快照”，避免处理中途配置漂移。
//! - 记录 `load/parse/total` 阶段耗时，便于性能诊断。

use std::sync::{Arc, RwLock};
use std::time::Instant;

use super::source::RawImageData;
use super::{ImageConfig, ImageError, ImageSource, PreviewContent};
use crate::settings::PreviewSettings;

/// 图片处理器。
///
/// 多个文档会话共享同一个实例。
pub struct ImageHandler {
    pub(super) config: Arc<RwLock<ImageConfig>>,
}

impl ImageHandler {
    /// 根据初始配置创建处理器。
    ///
    /// # 示例
    /// ```rust,ignore
    /// use note_preview::image_handler::{ImageConfig, ImageHandler};
    ///
    /// let handler = ImageHandler::new(ImageConfig::default())?;
    /// # Ok::<(), note_preview::image_handler::ImageError>(())
    /// ```
    pub fn new(config: ImageConfig) -> Result<Self, ImageError> {
        Ok(Self {
            config: Arc::new(RwLock::new(config)),
        })
    }

    /// 获取配置快照。
    ///
    /// 作用：保证单次请求链路使用一致参数。
    pub(crate) fn config_snapshot(&self) -> Result<ImageConfig, ImageError> {
        self.config
            .read()
            .map(|cfg| cfg.clone())
            .map_err(|_| ImageError::Internal("配置读取锁已中毒".to_string()))
    }

    /// 应用用户设置（代理、超时）。
    pub fn apply_settings(&self, settings: &PreviewSettings) -> Result<(), ImageError> {
        let mut config = self
            .config
            .write()
            .map_err(|_| ImageError::Internal("配置写入锁已中毒".to_string()))?;
        config.apply_settings(settings)?;

        log::info!(
            "⚙️ 已应用预览设置（proxy={}, load_timeout={}ms）",
            config.has_proxy(),
            config.load_timeout_ms
        );
        Ok(())
    }

    pub(crate) async fn load(&self, source: &ImageSource, config: &ImageConfig) -> Result<RawImageData, ImageError> {
        match source {
            ImageSource::Url(url) => self.load_from_url(url, config).await,
            ImageSource::FilePath(path) => self.load_from_file(path, config).await,
        }
    }

    /// 处理主入口：加载来源并生成可复用的预览内容。
    ///
    /// # 示例
    /// ```rust,ignore
    /// use note_preview::image_handler::{ImageConfig, ImageHandler, ImageSource};
    ///
    /// # async fn demo() -> Result<(), note_preview::image_handler::ImageError> {
    /// let handler = ImageHandler::new(ImageConfig::default())?;
    /// let content = handler
    ///     .load_preview(&ImageSource::FilePath("/tmp/test.png".into()))
    ///     .await?;
    /// println!("{:?}", content.metadata());
    /// # Ok(())
    /// # }
    /// ```
    pub async fn load_preview(&self, source: &ImageSource) -> Result<PreviewContent, ImageError> {
        let config = self.config_snapshot()?;
        let total_start = Instant::now();

        let load_start = Instant::now();
        let raw = self.load(source, &config).await?;
        let load_elapsed = load_start.elapsed();
        let source_hint = raw.source_hint;

        let parse_start = Instant::now();
        let content = PreviewContent::from_raw(source.locator(), raw, config.preview_margin);
        let parse_elapsed = parse_start.elapsed();

        let metadata = content.metadata();
        log::info!(
            "✅ 预览内容就绪 - 来源: {} 格式: {:?} 尺寸: {}x{} load={}ms parse={}ms total={}ms",
            source_hint,
            metadata.format(),
            metadata.width(),
            metadata.height(),
            load_elapsed.as_millis(),
            parse_elapsed.as_millis(),
            total_start.elapsed().as_millis()
        );

        Ok(content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image_handler::ImageFormat;
    use std::fs;
    use std::time::{SystemTime, UNIX_EPOCH};

    fn temp_file(name: &str, bytes: &[u8]) -> std::path::PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos())
            .unwrap_or(0);
        let path = std::env::temp_dir().join(format!("note-preview-{}-{}", nanos, name));
        fs::write(&path, bytes).expect("write temp file failed");
        path
    }

    #[tokio::test]
    async fn load_preview_parses_local_gif() {
        let path = temp_file("a.gif", b"GIF87a\x0a\x00\x05\x00rest");
        let handler = ImageHandler::new(ImageConfig::default()).expect("handler init failed");

        let content = handler
            .load_preview(&ImageSource::FilePath(path.clone()))
            .await
            .expect("load should succeed");

        assert_eq!(content.metadata().format(), ImageFormat::Gif);
        assert_eq!(content.metadata().width(), 10);
        assert_eq!(content.metadata().height(), 5);
        assert_eq!(content.locator(), path.to_string_lossy());
        let _ = fs::remove_file(path);
    }

    #[tokio::test]
    async fn load_preview_keeps_unrecognized_bytes_as_unknown() {
        let path = temp_file("notes.gif", b"plain text pretending to be a gif");
        let handler = ImageHandler::new(ImageConfig::default()).expect("handler init failed");

        let content = handler
            .load_preview(&ImageSource::FilePath(path.clone()))
            .await
            .expect("unknown content still loads");

        assert_eq!(content.metadata().format(), ImageFormat::Unknown);
        let _ = fs::remove_file(path);
    }

    #[test]
    fn apply_settings_updates_snapshot() {
        let handler = ImageHandler::new(ImageConfig::default()).expect("handler init failed");
        let settings = PreviewSettings {
            https_proxy: Some("http://127.0.0.1:8080".to_string()),
            load_timeout_ms: Some(1_000),
            ..PreviewSettings::default()
        };

        handler.apply_settings(&settings).expect("apply should succeed");
        let snapshot = handler.config_snapshot().expect("snapshot failed");

        assert_eq!(snapshot.https_proxy.as_deref(), Some("http://127.0.0.1:8080"));
        assert_eq!(snapshot.load_timeout_ms, 1_000);
    }
}
