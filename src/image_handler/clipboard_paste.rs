//! # 剪贴板图片粘贴模块
//!
//! ## 设计思路
//!
//! 把系统剪贴板里的位图另存为 PNG，放在当前文档旁边，方便随后用链接引用。
//! 剪贴板访问与 PNG 编码都是阻塞操作，放进 `spawn_blocking` 执行，避免阻塞 async 运行时。
//!
//! ## 实现思路
//!
//! - 目标文件名：`<文档文件名>.png`（例如 `notes.md` → `notes.md.png`）
//! - `arboard` 读取 RGBA 像素，`image` 负责编码 PNG

use std::path::{Path, PathBuf};

use super::ImageError;

/// 文档对应的粘贴目标路径。
pub fn paste_target_for(document: &Path) -> Result<PathBuf, ImageError> {
    let absolute = std::path::absolute(document)
        .map_err(|e| ImageError::FileSystem(format!("无法解析文档路径：{}", e)))?;
    let file_name = absolute
        .file_name()
        .ok_or_else(|| ImageError::FileSystem(format!("文档路径缺少文件名：{}", absolute.display())))?;

    let mut target_name = file_name.to_os_string();
    target_name.push(".png");
    Ok(absolute.with_file_name(target_name))
}

/// 读取剪贴板图片并保存为文档旁的 PNG，返回写入的路径。
pub async fn paste_clipboard_image(document: &Path) -> Result<PathBuf, ImageError> {
    let target = paste_target_for(document)?;
    let output = target.clone();

    tokio::task::spawn_blocking(move || save_clipboard_png(&output))
        .await
        .map_err(|e| ImageError::Internal(format!("剪贴板任务异常退出：{}", e)))??;

    log::info!("📋 已保存剪贴板图片 - 路径: {}", target.display());
    Ok(target)
}

fn save_clipboard_png(target: &Path) -> Result<(), ImageError> {
    let mut clipboard = arboard::Clipboard::new()
        .map_err(|e| ImageError::Clipboard(format!("无法访问剪贴板：{}", e)))?;
    let image_data = clipboard
        .get_image()
        .map_err(|e| ImageError::Clipboard(format!("剪贴板中没有图片：{}", e)))?;

    let width = u32::try_from(image_data.width)
        .map_err(|_| ImageError::ResourceLimit("剪贴板图片宽度溢出".to_string()))?;
    let height = u32::try_from(image_data.height)
        .map_err(|_| ImageError::ResourceLimit("剪贴板图片高度溢出".to_string()))?;

    let buffer = image::RgbaImage::from_raw(width, height, image_data.bytes.into_owned())
        .ok_or_else(|| ImageError::InvalidFormat("剪贴板像素数据长度异常".to_string()))?;

    buffer
        .save_with_format(target, image::ImageFormat::Png)
        .map_err(|e| ImageError::FileSystem(format!("保存 PNG 失败：{}", e)))
}
