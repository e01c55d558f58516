//! # 笔记图片预览 — 库入口
//!
//! ## 架构总览
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │              宿主编辑器 / 命令行 (HeadlessView)           │
//! │   BufferView (缓冲区·叠加层·状态栏)   Launcher (外部打开) │
//! └───────┬──────────────────────────────────────────────────┘
//!         ↕ trait 调用 (Result<T, AppError>)
//! ┌───────┼──────────────────────────────────────────────────┐
//! │       ↕            核心 (Rust)                           │
//! │                                                          │
//! │  ┌─ service ──── PreviewService (文档会话注册表)          │
//! │  ├─ document ─── DocumentSession                          │
//! │  │   ├─ links         链接识别·路径提取                   │
//! │  │   ├─ phantom       叠加层身份·失效                     │
//! │  │   └─ status        StatusGuard (RAII)                  │
//! │  ├─ image_handler      加载·文件头解析·视口适配·HTML      │
//! │  ├─ settings           代理 / 超时设置 (JSON)             │
//! │  ├─ launcher           xdg-open / open / start            │
//! │  └─ error ────── AppError (统一错误类型)                  │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! ## 模块职责
//!
//! | 模块 | 职责 |
//! |------|------|
//! | [`error`] | 统一错误类型 `AppError` |
//! | [`image_handler`] | 从 URL/文件加载图片，解析 GIF/PNG/JPEG 文件头，生成预览 HTML |
//! | [`document`] | 单文档会话：预览/隐藏、全部切换、编辑失效、打开、粘贴 |
//! | [`service`] | 文档打开/关闭时创建/销毁会话，共享处理器配置 |
//! | [`settings`] | 用户设置的读取与解析 |
//! | [`launcher`] | 调用系统命令打开网址与文件 |

pub mod document;
pub mod error;
pub mod image_handler;
pub mod launcher;
pub mod service;
pub mod settings;
