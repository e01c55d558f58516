//! # 文档层（document）
//!
//! ## 设计思路
//!
//! 宿主编辑器的能力（缓冲区、叠加层、状态栏、提示框、外部打开）通过 trait 抽象，
//! 本模块只负责“在哪里预览、何时失效、如何并发”的逻辑。
//!
//! - `view`：宿主能力 trait（`BufferView` / `Launcher`）与 `Region`
//! - `links`：链接识别与路径提取
//! - `phantom`：叠加层身份与失效判断
//! - `status`：加载状态 RAII 守卫
//! - `session`：单文档会话（预览/隐藏、全部切换、打开、粘贴）
//! - `headless`：纯内存视图，供命令行与测试使用

mod headless;
pub mod links;
mod phantom;
mod session;
mod status;
mod view;

pub use headless::{HeadlessView, Overlay};
pub use phantom::{Phantom, PhantomId, RegionSnapshot};
pub use session::{DocumentSession, OpenAction, PreviewOutcome, ToggleReport};
pub use status::StatusGuard;
pub use view::{BufferView, Launcher, Region};
