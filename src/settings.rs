//! 预览设置模块
//!
//! # 设计思路
//!
//! 设置文件是一个可选的 JSON 文件，只包含代理与超时这类少量字段。
//! 文件不存在时使用默认值；文件存在但格式错误时返回错误，避免静默忽略用户配置。

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// 用户可配置的预览设置。
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreviewSettings {
    #[serde(default)]
    pub http_proxy: Option<String>,
    #[serde(default)]
    pub https_proxy: Option<String>,
    #[serde(default)]
    pub load_timeout_ms: Option<u64>,
}

impl PreviewSettings {
    pub fn from_json(content: &str) -> Result<Self, AppError> {
        serde_json::from_str(content)
            .map_err(|e| AppError::Settings(format!("解析设置文件失败: {}", e)))
    }

    /// 从路径加载设置；文件不存在时返回默认值。
    pub fn load(path: &Path) -> Result<Self, AppError> {
        if !path.exists() {
            log::debug!("设置文件不存在，使用默认值: {}", path.display());
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)?;
        Self::from_json(&content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_default_to_none() {
        let settings = PreviewSettings::from_json(r#"{"http_proxy": "http://p:1"}"#)
            .expect("parse should succeed");

        assert_eq!(settings.http_proxy.as_deref(), Some("http://p:1"));
        assert_eq!(settings.https_proxy, None);
        assert_eq!(settings.load_timeout_ms, None);
    }

    #[test]
    fn malformed_json_is_a_settings_error() {
        let result = PreviewSettings::from_json("{ not json");
        assert!(matches!(result, Err(AppError::Settings(_))));
    }

    #[test]
    fn missing_file_yields_defaults() {
        let path = std::env::temp_dir().join("note-preview-no-such-settings.json");
        let settings = PreviewSettings::load(&path).expect("load should succeed");
        assert_eq!(settings, PreviewSettings::default());
    }
}
