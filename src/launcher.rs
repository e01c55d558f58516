//! 系统启动器
//!
//! 用平台自带的打开命令（`xdg-open` / `open` / `cmd /C start`）打开网址与文件。
//! 配置了编辑器命令时，本地文件改用该编辑器打开。

use std::path::Path;
use std::process::Command;

use crate::document::Launcher;
use crate::error::AppError;

#[derive(Debug, Clone, Default)]
pub struct SystemLauncher {
    editor: Option<String>,
}

impl SystemLauncher {
    pub fn new() -> Self {
        Self::default()
    }

    /// 本地文件使用指定编辑器命令打开（例如 `code`、`subl`）。
    pub fn with_editor(editor: impl Into<String>) -> Self {
        Self {
            editor: Some(editor.into()),
        }
    }
}

#[cfg(target_os = "windows")]
fn opener_command(target: &str) -> Command {
    let mut command = Command::new("cmd");
    command.args(["/C", "start", "", target]);
    command
}

#[cfg(target_os = "macos")]
fn opener_command(target: &str) -> Command {
    let mut command = Command::new("open");
    command.arg(target);
    command
}

#[cfg(not(any(target_os = "windows", target_os = "macos")))]
fn opener_command(target: &str) -> Command {
    let mut command = Command::new("xdg-open");
    command.arg(target);
    command
}

impl Launcher for SystemLauncher {
    fn open_url(&self, url: &str) -> Result<(), AppError> {
        opener_command(url)
            .spawn()
            .map_err(|e| AppError::Launch(format!("打开网址失败: {}", e)))?;
        log::info!("🌐 已在浏览器中打开 - {}", url);
        Ok(())
    }

    fn open_file(&self, path: &Path) -> Result<(), AppError> {
        let target = path.to_string_lossy();
        let mut command = match &self.editor {
            Some(editor) => {
                let mut command = Command::new(editor);
                command.arg(target.as_ref());
                command
            }
            None => opener_command(&target),
        };

        command
            .spawn()
            .map_err(|e| AppError::Launch(format!("打开文件失败: {}", e)))?;
        log::info!("📄 已打开文件 - {}", path.display());
        Ok(())
    }
}
