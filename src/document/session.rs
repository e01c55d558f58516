//! # 文档会话
//!
//! ## 设计思路
//!
//! 每个打开的文档对应一个 `DocumentSession`，显式持有：
//! - 当前激活的叠加层集合 `phantoms`（身份 → 叠加层）
//! - 预览内容缓存 `contents`（资源定位 → 已解析内容）
//!
//! 会话在文档打开时创建、关闭时销毁，缓存与叠加层不会挂在宿主视图对象上。
//!
//! ## 实现思路
//!
//! - 每个区域的预览/隐藏是一个独立的 tokio 任务，互不影响。
//! - “全部预览/隐藏”把每个区域派发进 `JoinSet`，再由一个监督任务等待全部完成，
//!   之后才把视图滚回原来的位置；调用方不会被阻塞。
//! - 两张表都由 `Mutex` 保护，持锁期间不调用宿主接口。
//! - 叠加层只在字节加载并解析成功后插入，不做“先插入后回填”。

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard};

use serde::Serialize;
use tokio::task::{JoinHandle, JoinSet};

use super::links::{self, LinkKind};
use super::phantom::{Phantom, PhantomId, RegionSnapshot};
use super::status::StatusGuard;
use super::view::{BufferView, Launcher, Region};
use crate::error::AppError;
use crate::image_handler::{self, ImageError, ImageHandler, ImageSource, PreviewContent};

const NOTE_SYNTAXES: [&str; 2] = ["Note.tmLanguage", "Note.sublime-syntax"];

/// 单个区域任务的结果。
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", content = "code", rename_all = "snake_case")]
pub enum PreviewOutcome {
    /// 叠加层已插入。
    Shown,
    /// 叠加层已移除。
    Hidden,
    /// 无事可做（已显示 / 本就未显示）。
    Skipped,
    /// 预期内的加载失败，已提示用户；携带错误码。
    Failed(&'static str),
}

/// “全部预览/隐藏”的汇总。
#[derive(Debug, Clone, Serialize)]
pub struct ToggleReport {
    /// 本次是预览（`true`）还是隐藏（`false`）。
    pub is_preview: bool,
    pub outcomes: Vec<PreviewOutcome>,
}

impl ToggleReport {
    pub fn count(&self, outcome: &PreviewOutcome) -> usize {
        self.outcomes.iter().filter(|o| *o == outcome).count()
    }
}

/// 打开命令实际执行的动作。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OpenAction {
    Preview(PreviewOutcome),
    Browser(String),
    Editor(PathBuf),
}

fn lock<'a, T>(mutex: &'a Mutex<T>, what: &str) -> Result<MutexGuard<'a, T>, ImageError> {
    mutex
        .lock()
        .map_err(|_| ImageError::Internal(format!("{}锁已中毒", what)))
}

/// 单个文档的预览会话。
pub struct DocumentSession {
    view: Arc<dyn BufferView>,
    handler: Arc<ImageHandler>,
    launcher: Arc<dyn Launcher>,
    phantoms: Mutex<HashMap<PhantomId, Phantom>>,
    contents: Mutex<HashMap<String, Arc<PreviewContent>>>,
}

impl DocumentSession {
    pub fn new(view: Arc<dyn BufferView>, handler: Arc<ImageHandler>, launcher: Arc<dyn Launcher>) -> Self {
        Self {
            view,
            handler,
            launcher,
            phantoms: Mutex::new(HashMap::new()),
            contents: Mutex::new(HashMap::new()),
        }
    }

    pub fn view(&self) -> &Arc<dyn BufferView> {
        &self.view
    }

    /// 命令是否对该文档可用（按语法名判断）。
    pub fn is_enabled(&self) -> bool {
        let syntax = self.view.syntax();
        NOTE_SYNTAXES.iter().any(|s| syntax.ends_with(s)) || syntax.to_lowercase().contains("markdown")
    }

    /// 当前激活的叠加层数量。
    pub fn active_count(&self) -> Result<usize, ImageError> {
        Ok(lock(&self.phantoms, "叠加层")?.len())
    }

    /// 已缓存的预览内容数量。
    pub fn cached_count(&self) -> Result<usize, ImageError> {
        Ok(lock(&self.contents, "预览缓存")?.len())
    }

    /// 当前激活叠加层的身份列表。
    pub fn active_ids(&self) -> Result<Vec<PhantomId>, ImageError> {
        Ok(lock(&self.phantoms, "叠加层")?.keys().cloned().collect())
    }

    /// 把区域文本解析成可加载的来源。
    pub fn source_for_region(&self, region: Region) -> ImageSource {
        let raw = links::path_from_region_text(&self.view.substr(region));
        ImageSource::resolve(self.view.file_name().as_deref(), &raw)
    }

    /// 预览或隐藏某个区域的图片。
    ///
    /// `is_preview`：`None` 按当前是否已显示来切换，`Some(true)` 强制预览，`Some(false)` 强制隐藏。
    /// 身份与是否切换在调用时同步决定，加载在后台任务中完成。
    ///
    /// # 示例
    /// ```rust,ignore
    /// let handle = session.preview_or_hide_image(source, region, None)?;
    /// let outcome = handle.await??;
    /// ```
    pub fn preview_or_hide_image(
        self: &Arc<Self>,
        source: ImageSource,
        region: Region,
        is_preview: Option<bool>,
    ) -> Result<JoinHandle<Result<PreviewOutcome, ImageError>>, ImageError> {
        let snapshot = RegionSnapshot::capture(self.view.as_ref(), region);
        let is_preview = match is_preview {
            Some(forced) => forced,
            None => !lock(&self.phantoms, "叠加层")?.contains_key(snapshot.id()),
        };

        Ok(tokio::spawn(self.clone().run_unit(snapshot, source, is_preview)))
    }

    async fn run_unit(
        self: Arc<Self>,
        snapshot: RegionSnapshot,
        source: ImageSource,
        is_preview: bool,
    ) -> Result<PreviewOutcome, ImageError> {
        let locator = source.locator();
        let result = if is_preview {
            self.show(snapshot, &source).await
        } else {
            self.hide(snapshot.id())
        };
        self.settle(&locator, result)
    }

    /// 按身份隐藏一个激活的叠加层（“全部隐藏”使用）。
    async fn hide_unit(self: Arc<Self>, id: PhantomId) -> Result<PreviewOutcome, ImageError> {
        let result = self.hide(&id);
        self.settle(id.as_str(), result)
    }

    /// 预期内的错误提示后降级为 `Failed`，内部错误提示后继续返回。
    fn settle(
        &self,
        locator: &str,
        result: Result<PreviewOutcome, ImageError>,
    ) -> Result<PreviewOutcome, ImageError> {
        match result {
            Ok(outcome) => Ok(outcome),
            Err(e) if e.is_expected() => {
                log::warn!("⚠️ 预览失败 - 来源: {} 阶段: {} 错误: {}", locator, e.stage(), e);
                self.view.error_message(&e.user_message(locator));
                Ok(PreviewOutcome::Failed(e.code()))
            }
            Err(e) => {
                log::error!("❌ 预览内部错误 - 来源: {} 错误: {}", locator, e);
                self.view.error_message(&e.user_message(locator));
                Err(e)
            }
        }
    }

    async fn show(&self, snapshot: RegionSnapshot, source: &ImageSource) -> Result<PreviewOutcome, ImageError> {
        let locator = source.locator();
        let _status = StatusGuard::loading(self.view.clone(), snapshot.id().as_str(), &locator);

        let already_shown = lock(&self.phantoms, "叠加层")?.contains_key(snapshot.id());
        if already_shown {
            log::debug!("🔁 叠加层已存在，跳过 - {}", snapshot.id());
            return Ok(PreviewOutcome::Skipped);
        }

        let content = self.content_for(source, &locator).await?;
        let phantom = Phantom::new(snapshot, content);

        {
            let mut phantoms = lock(&self.phantoms, "叠加层")?;
            if phantoms.contains_key(phantom.id()) {
                return Ok(PreviewOutcome::Skipped);
            }
            phantoms.insert(phantom.id().clone(), phantom.clone());
        }

        phantom.preview(self.view.as_ref());
        log::info!("🖼️ 已显示预览 - {}", phantom.id());
        Ok(PreviewOutcome::Shown)
    }

    /// 命中缓存直接复用，否则加载并写入缓存。
    async fn content_for(&self, source: &ImageSource, locator: &str) -> Result<Arc<PreviewContent>, ImageError> {
        let cached = lock(&self.contents, "预览缓存")?.get(locator).cloned();
        if let Some(cached) = cached {
            log::debug!("📦 命中预览缓存 - {}", locator);
            return Ok(cached);
        }

        let content = Arc::new(self.handler.load_preview(source).await?);
        let mut contents = lock(&self.contents, "预览缓存")?;
        Ok(contents.entry(locator.to_string()).or_insert(content).clone())
    }

    fn hide(&self, id: &PhantomId) -> Result<PreviewOutcome, ImageError> {
        let removed = lock(&self.phantoms, "叠加层")?.remove(id);
        match removed {
            Some(phantom) => {
                phantom.hide(self.view.as_ref());
                log::info!("🙈 已隐藏预览 - {}", id);
                Ok(PreviewOutcome::Hidden)
            }
            None => Ok(PreviewOutcome::Skipped),
        }
    }

    /// 擦除区域文本已被编辑的叠加层，返回擦除数量。
    pub fn refresh_phantoms(&self) -> Result<usize, ImageError> {
        let current: Vec<Phantom> = lock(&self.phantoms, "叠加层")?.values().cloned().collect();
        let stale: Vec<Phantom> = current
            .into_iter()
            .filter(|phantom| phantom.is_stale(self.view.as_ref()))
            .collect();

        if stale.is_empty() {
            return Ok(0);
        }

        {
            let mut phantoms = lock(&self.phantoms, "叠加层")?;
            for phantom in &stale {
                phantoms.remove(phantom.id());
            }
        }

        for phantom in &stale {
            phantom.hide(self.view.as_ref());
        }
        log::debug!("🧹 已擦除 {} 个失效叠加层", stale.len());
        Ok(stale.len())
    }

    /// 文档修改通知。
    pub fn on_modified(&self) -> Result<usize, ImageError> {
        self.refresh_phantoms()
    }

    /// 全部预览或全部隐藏。
    ///
    /// 没有任何激活叠加层时预览全部候选；否则隐藏全部激活的叠加层，
    /// 包括不在候选行上的（例如通过打开命令预览的裸路径）。
    /// 返回监督任务的句柄：它等待所有区域任务结束后，把视图滚回调用时的光标位置。
    pub fn toggle_all(self: &Arc<Self>) -> Result<JoinHandle<Result<ToggleReport, ImageError>>, ImageError> {
        self.refresh_phantoms()?;
        let active = self.active_ids()?;
        let is_preview = active.is_empty();
        let selection = self.view.selection_point();

        let mut units = JoinSet::new();
        if is_preview {
            for region in links::preview_regions(self.view.as_ref()) {
                let snapshot = RegionSnapshot::capture(self.view.as_ref(), region);
                let source = self.source_for_region(region);
                units.spawn(self.clone().run_unit(snapshot, source, true));
            }
        } else {
            for id in active {
                units.spawn(self.clone().hide_unit(id));
            }
        }

        log::info!(
            "🚀 {}全部图片 - 区域数: {}",
            if is_preview { "预览" } else { "隐藏" },
            units.len()
        );

        let view = self.view.clone();
        Ok(tokio::spawn(async move {
            let mut outcomes = Vec::with_capacity(units.len());
            let mut first_error = None;

            while let Some(joined) = units.join_next().await {
                match joined {
                    Ok(Ok(outcome)) => outcomes.push(outcome),
                    Ok(Err(e)) => {
                        first_error.get_or_insert(e);
                    }
                    Err(join_error) => {
                        let e = ImageError::Internal(format!("预览任务异常退出：{}", join_error));
                        log::error!("❌ {}", e);
                        view.error_message(&e.to_string());
                        first_error.get_or_insert(e);
                    }
                }
            }

            view.show_at_center(selection);

            match first_error {
                Some(e) => Err(e),
                None => Ok(ToggleReport { is_preview, outcomes }),
            }
        }))
    }

    /// 打开光标处的链接或路径。
    ///
    /// - URL 图片链接 / 本地图片：切换该行的预览
    /// - 其他 URL：交给浏览器
    /// - 其他本地路径：在编辑器中打开（文件必须存在）
    ///
    /// 任何失败都会提示 `打开 '<path>' 失败！` 并返回给调用方。
    pub async fn open_at_selection(self: &Arc<Self>) -> Result<OpenAction, AppError> {
        let point = self.view.selection_point();
        let candidate = links::link_at(self.view.as_ref(), point);
        let region = match &candidate {
            Some(link) => self.view.line(link.region),
            None => self.view.line(Region::new(point, point)),
        };
        let raw = match &candidate {
            Some(link) => link.target.clone(),
            None => links::path_from_region_text(&self.view.substr(region)),
        };
        let source = ImageSource::resolve(self.view.file_name().as_deref(), &raw);
        let is_image_link = candidate.as_ref().is_some_and(|link| link.kind == LinkKind::Image);

        let result = self.dispatch_open(source.clone(), region, is_image_link).await;
        if let Err(e) = &result {
            log::warn!("⚠️ 打开失败 - {}: {}", source.locator(), e);
            self.view
                .error_message(&format!("打开 '{}' 失败！", source.locator()));
        }
        result
    }

    async fn dispatch_open(
        self: &Arc<Self>,
        source: ImageSource,
        region: Region,
        is_image_link: bool,
    ) -> Result<OpenAction, AppError> {
        match &source {
            ImageSource::Url(url) if !is_image_link => {
                self.launcher.open_url(url)?;
                Ok(OpenAction::Browser(url.clone()))
            }
            ImageSource::FilePath(path) if !source.is_image() => {
                if !tokio::fs::try_exists(path).await.unwrap_or(false) {
                    return Err(ImageError::NotFound(path.display().to_string()).into());
                }
                self.launcher.open_file(path)?;
                Ok(OpenAction::Editor(path.clone()))
            }
            _ => {
                let outcome = self
                    .preview_or_hide_image(source, region, None)?
                    .await
                    .map_err(|e| ImageError::Internal(format!("预览任务异常退出：{}", e)))??;
                Ok(OpenAction::Preview(outcome))
            }
        }
    }

    /// 把剪贴板图片保存到文档旁边。
    pub async fn paste_image(&self) -> Result<PathBuf, AppError> {
        let document = self
            .view
            .file_name()
            .ok_or_else(|| AppError::Session("文档尚未保存，无法确定图片位置".to_string()))?;
        Ok(image_handler::paste_clipboard_image(&document).await?)
    }

    /// 关闭会话：擦除所有叠加层并清空缓存。
    pub fn close(&self) -> Result<(), ImageError> {
        let drained: Vec<Phantom> = lock(&self.phantoms, "叠加层")?.drain().map(|(_, p)| p).collect();
        lock(&self.contents, "预览缓存")?.clear();

        for phantom in &drained {
            phantom.hide(self.view.as_ref());
        }
        log::info!("📕 文档会话已关闭 - view={} 擦除叠加层: {}", self.view.id(), drained.len());
        Ok(())
    }
}
