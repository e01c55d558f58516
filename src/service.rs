//! # 服务层（会话注册表）
//!
//! ## 设计思路
//!
//! `PreviewService` 由宿主持有，替代“按视图 id 存全局字典”的做法：
//! 1. 文档打开时创建 `DocumentSession`，关闭时销毁并擦除其叠加层
//! 2. 所有会话共享同一个 `ImageHandler`（代理、超时配置一致）
//! 3. 测试可创建独立实例，互不影响
//!
//! ## 实现思路
//!
//! 对外仅暴露少量稳定 API：
//! - `open_document` / `close_document` / `session`：会话生命周期
//! - `apply_settings`：把用户设置同步到处理器

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use crate::document::{BufferView, DocumentSession, Launcher};
use crate::error::AppError;
use crate::image_handler::{ImageConfig, ImageHandler};
use crate::settings::PreviewSettings;

pub struct PreviewService {
    handler: Arc<ImageHandler>,
    launcher: Arc<dyn Launcher>,
    sessions: Mutex<HashMap<u64, Arc<DocumentSession>>>,
}

impl PreviewService {
    /// 使用自定义配置创建服务。
    ///
    /// # 示例
    /// ```rust,no_run
    /// use note_preview::image_handler::ImageConfig;
    /// use note_preview::launcher::SystemLauncher;
    /// use note_preview::service::PreviewService;
    /// use std::sync::Arc;
    ///
    /// let service = PreviewService::with_config(ImageConfig::default(), Arc::new(SystemLauncher::new()))?;
    /// # Ok::<(), note_preview::error::AppError>(())
    /// ```
    pub fn with_config(config: ImageConfig, launcher: Arc<dyn Launcher>) -> Result<Self, AppError> {
        let handler = ImageHandler::new(config)?;
        Ok(Self {
            handler: Arc::new(handler),
            launcher,
            sessions: Mutex::new(HashMap::new()),
        })
    }

    fn sessions(&self) -> Result<MutexGuard<'_, HashMap<u64, Arc<DocumentSession>>>, AppError> {
        self.sessions
            .lock()
            .map_err(|_| AppError::Session("会话表锁已中毒".to_string()))
    }

    /// 文档打开：返回该文档的会话（已存在则复用）。
    pub fn open_document(&self, view: Arc<dyn BufferView>) -> Result<Arc<DocumentSession>, AppError> {
        let id = view.id();
        let mut sessions = self.sessions()?;
        let session = sessions
            .entry(id)
            .or_insert_with(|| {
                log::info!("📗 文档会话已创建 - view={}", id);
                Arc::new(DocumentSession::new(view, self.handler.clone(), self.launcher.clone()))
            })
            .clone();
        Ok(session)
    }

    pub fn session(&self, view_id: u64) -> Result<Arc<DocumentSession>, AppError> {
        self.sessions()?
            .get(&view_id)
            .cloned()
            .ok_or_else(|| AppError::Session(format!("view={}", view_id)))
    }

    /// 文档关闭：擦除叠加层并释放缓存。
    pub fn close_document(&self, view_id: u64) -> Result<(), AppError> {
        let removed = self.sessions()?.remove(&view_id);
        match removed {
            Some(session) => Ok(session.close()?),
            None => Err(AppError::Session(format!("view={}", view_id))),
        }
    }

    pub fn session_count(&self) -> Result<usize, AppError> {
        Ok(self.sessions()?.len())
    }

    pub fn apply_settings(&self, settings: &PreviewSettings) -> Result<(), AppError> {
        Ok(self.handler.apply_settings(settings)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::HeadlessView;
    use crate::launcher::SystemLauncher;

    fn service() -> PreviewService {
        PreviewService::with_config(ImageConfig::default(), Arc::new(SystemLauncher::new()))
            .expect("service init failed")
    }

    #[test]
    fn open_document_reuses_session_per_view() {
        let service = service();
        let view = Arc::new(HeadlessView::new(7, "text"));

        let first = service.open_document(view.clone()).expect("open failed");
        let second = service.open_document(view).expect("open failed");

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(service.session_count().expect("count failed"), 1);
    }

    #[test]
    fn close_document_drops_session() {
        let service = service();
        service
            .open_document(Arc::new(HeadlessView::new(3, "text")))
            .expect("open failed");

        service.close_document(3).expect("close failed");

        assert!(matches!(service.session(3), Err(AppError::Session(_))));
        assert!(matches!(service.close_document(3), Err(AppError::Session(_))));
    }

    #[test]
    fn invalid_settings_are_rejected() {
        let service = service();
        let settings = PreviewSettings {
            load_timeout_ms: Some(0),
            ..PreviewSettings::default()
        };

        assert!(matches!(service.apply_settings(&settings), Err(AppError::Image(_))));
    }
}
