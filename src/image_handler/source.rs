//! # 数据源与中间模型
//!
//! ## 设计思路
//!
//! 将“外部输入类型”和“流水线中间结果”解耦：
//! - `ImageSource` 表示已解析好的资源定位（URL 或本地绝对路径）
//! - `RawImageData` 表示已加载但未解析的字节
//!
//! 文档里写的路径可能是相对路径、带转义反斜杠，或者是 URL，
//! 统一在 `ImageSource::resolve` 里处理成可直接加载的形式。

use std::path::{Path, PathBuf};

const IMAGE_EXTENSIONS: [&str; 4] = ["png", "jpg", "jpeg", "gif"];

/// 图片输入来源。
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ImageSource {
    /// 网络地址来源。
    Url(String),
    /// 本地文件路径来源（已解析为绝对路径）。
    FilePath(PathBuf),
}

impl ImageSource {
    /// 把文档里的原始路径解析为可加载的来源。
    ///
    /// - 去掉所有反斜杠（Markdown 转义）
    /// - `http://` / `https://` 保持原样
    /// - 相对路径优先相对文档所在目录；不存在时再相对当前工作目录
    pub fn resolve(document: Option<&Path>, raw: &str) -> Self {
        let path = remove_backslash(raw);
        if is_url(&path) {
            return Self::Url(path);
        }
        Self::FilePath(abspath_near(document, &path))
    }

    /// 作为缓存键与状态栏键使用的稳定字符串。
    pub fn locator(&self) -> String {
        match self {
            Self::Url(url) => url.clone(),
            Self::FilePath(path) => path.to_string_lossy().into_owned(),
        }
    }

    pub fn is_url(&self) -> bool {
        matches!(self, Self::Url(_))
    }

    /// 扩展名是否为支持预览的图片类型。
    pub fn is_image(&self) -> bool {
        match self {
            Self::Url(url) => is_image_path(url),
            Self::FilePath(path) => has_image_extension(path),
        }
    }
}

/// 加载阶段输出：原始字节与来源标识。
pub(crate) struct RawImageData {
    /// 原始图片字节。
    pub(crate) bytes: Vec<u8>,
    /// 来源提示（用于日志与诊断）。
    pub(crate) source_hint: &'static str,
}

pub fn remove_backslash(path: &str) -> String {
    path.replace('\\', "")
}

pub fn is_url(path: &str) -> bool {
    path.starts_with("http://") || path.starts_with("https://")
}

pub fn is_image_path(path: &str) -> bool {
    has_image_extension(Path::new(path))
}

fn has_image_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            let ext = ext.to_ascii_lowercase();
            IMAGE_EXTENSIONS.contains(&ext.as_str())
        })
        .unwrap_or(false)
}

fn abspath_near(document: Option<&Path>, path: &str) -> PathBuf {
    if let Some(basedir) = document.and_then(absolute_parent) {
        let candidate = basedir.join(path);
        if candidate.exists() {
            return candidate;
        }
    }

    std::path::absolute(path).unwrap_or_else(|_| PathBuf::from(path))
}

fn absolute_parent(document: &Path) -> Option<PathBuf> {
    let absolute = std::path::absolute(document).ok()?;
    absolute.parent().map(Path::to_path_buf)
}
