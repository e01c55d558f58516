//! 加载状态守卫
//!
//! # 设计思路
//!
//! 开始加载时在状态栏显示“正在加载”，无论成功、失败、超时还是 panic，
//! 都必须清除。使用 RAII：构造时设置，`Drop` 时清除。
//!
//! 状态键是叠加层身份而不是资源定位：同一张图片被多个区域同时加载时，
//! 先结束的任务不会擦掉其他任务的提示。

use std::sync::Arc;

use super::view::BufferView;

/// 状态栏“加载中”提示的 RAII 守卫
///
/// # 示例
/// ```rust,ignore
/// let _status = StatusGuard::loading(view.clone(), snapshot.id().as_str(), &locator);
/// // ... 加载 ...
/// // 离开作用域时状态自动清除
/// ```
pub struct StatusGuard {
    view: Arc<dyn BufferView>,
    key: String,
}

impl StatusGuard {
    /// 创建守卫并立即以 `key` 显示加载提示
    pub fn loading(view: Arc<dyn BufferView>, key: &str, locator: &str) -> Self {
        view.set_status(key, &format!("正在加载图片 '{}'...", locator));
        Self {
            view,
            key: key.to_string(),
        }
    }
}

impl Drop for StatusGuard {
    fn drop(&mut self) {
        self.view.erase_status(&self.key);
    }
}
