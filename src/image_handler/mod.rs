//! # 图片处理模块（image_handler）
//!
//! ## 设计思路
//!
//! 该模块将“来源解析 → 字节加载 → 文件头解析 → 视口适配 → HTML 生成”
//! 按职责拆分为多个子模块，避免单文件膨胀与耦合。
//!
//! - `handler`：编排整条加载链路
//! - `loader`：负责 URL/本地文件加载（代理、超时、体积上限）
//! - `header`：不依赖图像库的文件头解析（GIF / PNG / JPEG）
//! - `pipeline`：视口适配与 HTML 片段生成
//! - `clipboard_paste`：把剪贴板图片另存为 PNG
//! - `config/error/source`：配置、错误、来源与中间数据模型
//!
//! ## 调用链
//!
//! ```text
//! document::DocumentSession
//!    ↓
//! handler.rs（配置快照 + 阶段耗时日志）
//!    ├─ loader.rs（文件 / URL 加载）
//!    └─ pipeline.rs（header 解析 + base64）
//!    ↓
//! PreviewContent::gen_html(max_w, max_h)
//! ```

pub mod clipboard_paste;
mod config;
mod error;
mod handler;
mod header;
mod loader;
mod pipeline;
mod source;

pub use clipboard_paste::{paste_clipboard_image, paste_target_for};
pub use config::{DEFAULT_LOAD_TIMEOUT_MS, ImageConfig};
pub use error::ImageError;
pub use handler::ImageHandler;
pub use header::{ImageFormat, ImageMetadata, UNKNOWN_DIMENSION, parse as parse_header};
pub use pipeline::{FitDimensions, PREVIEW_MARGIN, PreviewContent, fit, fit_with_margin};
pub use source::{ImageSource, is_image_path, is_url, remove_backslash};
