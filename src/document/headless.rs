//! 无界面视图
//!
//! 纯内存的 `BufferView` 实现：记录叠加层、状态栏与提示信息。
//! 命令行工具与测试都通过它驱动完整的预览流程。

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Mutex;

use super::view::{BufferView, Region};

/// 已插入的叠加层。
#[derive(Debug, Clone, PartialEq)]
pub struct Overlay {
    pub region: Region,
    pub html: String,
}

#[derive(Default)]
struct HeadlessState {
    text: String,
    selection: usize,
    overlays: HashMap<String, Overlay>,
    statuses: HashMap<String, String>,
    status_history: Vec<String>,
    alerts: Vec<String>,
    centered: Vec<usize>,
}

pub struct HeadlessView {
    id: u64,
    file_name: Option<PathBuf>,
    syntax: String,
    viewport: (f64, f64),
    state: Mutex<HeadlessState>,
}

impl HeadlessView {
    pub fn new(id: u64, text: &str) -> Self {
        Self {
            id,
            file_name: None,
            syntax: "Packages/Markdown/Markdown.sublime-syntax".to_string(),
            viewport: (1280.0, 800.0),
            state: Mutex::new(HeadlessState {
                text: text.to_string(),
                ..HeadlessState::default()
            }),
        }
    }

    pub fn with_file_name(mut self, path: impl Into<PathBuf>) -> Self {
        self.file_name = Some(path.into());
        self
    }

    pub fn with_syntax(mut self, syntax: &str) -> Self {
        self.syntax = syntax.to_string();
        self
    }

    pub fn with_viewport(mut self, width: f64, height: f64) -> Self {
        self.viewport = (width, height);
        self
    }

    fn with_state<R>(&self, f: impl FnOnce(&mut HeadlessState) -> R) -> R {
        let mut guard = match self.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        f(&mut guard)
    }

    pub fn replace_text(&self, text: &str) {
        self.with_state(|s| s.text = text.to_string());
    }

    /// 把 `region` 替换为 `replacement`，模拟用户编辑。
    pub fn edit(&self, region: Region, replacement: &str) {
        self.with_state(|s| {
            let begin = region.begin().min(s.text.len());
            let end = region.end().min(s.text.len());
            s.text.replace_range(begin..end, replacement);
        });
    }

    pub fn set_selection(&self, point: usize) {
        self.with_state(|s| s.selection = point);
    }

    pub fn text(&self) -> String {
        self.with_state(|s| s.text.clone())
    }

    pub fn overlays(&self) -> HashMap<String, Overlay> {
        self.with_state(|s| s.overlays.clone())
    }

    pub fn overlay_count(&self) -> usize {
        self.with_state(|s| s.overlays.len())
    }

    pub fn status(&self, key: &str) -> Option<String> {
        self.with_state(|s| s.statuses.get(key).cloned())
    }

    pub fn active_status_count(&self) -> usize {
        self.with_state(|s| s.statuses.len())
    }

    /// 曾经设置过的所有状态文案（按时间顺序）。
    pub fn status_history(&self) -> Vec<String> {
        self.with_state(|s| s.status_history.clone())
    }

    pub fn alerts(&self) -> Vec<String> {
        self.with_state(|s| s.alerts.clone())
    }

    pub fn centered_points(&self) -> Vec<usize> {
        self.with_state(|s| s.centered.clone())
    }
}

/// 把偏移收紧到合法的字符边界。
fn clamp_to_boundary(text: &str, point: usize) -> usize {
    let mut point = point.min(text.len());
    while !text.is_char_boundary(point) {
        point -= 1;
    }
    point
}

impl BufferView for HeadlessView {
    fn id(&self) -> u64 {
        self.id
    }

    fn file_name(&self) -> Option<PathBuf> {
        self.file_name.clone()
    }

    fn syntax(&self) -> String {
        self.syntax.clone()
    }

    fn size(&self) -> usize {
        self.with_state(|s| s.text.len())
    }

    fn substr(&self, region: Region) -> String {
        self.with_state(|s| {
            let begin = clamp_to_boundary(&s.text, region.begin());
            let end = clamp_to_boundary(&s.text, region.end());
            s.text[begin..end].to_string()
        })
    }

    fn line(&self, region: Region) -> Region {
        self.with_state(|s| {
            let begin = clamp_to_boundary(&s.text, region.begin());
            let end = clamp_to_boundary(&s.text, region.end());
            let line_begin = s.text[..begin].rfind('\n').map(|i| i + 1).unwrap_or(0);
            let line_end = s.text[end..]
                .find('\n')
                .map(|i| end + i)
                .unwrap_or(s.text.len());
            Region::new(line_begin, line_end)
        })
    }

    fn selection_point(&self) -> usize {
        self.with_state(|s| s.selection)
    }

    fn viewport_extent(&self) -> (f64, f64) {
        self.viewport
    }

    fn add_phantom(&self, key: &str, region: Region, html: &str) {
        self.with_state(|s| {
            s.overlays.insert(
                key.to_string(),
                Overlay {
                    region,
                    html: html.to_string(),
                },
            );
        });
    }

    fn erase_phantoms(&self, key: &str) {
        self.with_state(|s| {
            s.overlays.remove(key);
        });
    }

    fn set_status(&self, key: &str, message: &str) {
        self.with_state(|s| {
            s.statuses.insert(key.to_string(), message.to_string());
            s.status_history.push(message.to_string());
        });
    }

    fn erase_status(&self, key: &str) {
        self.with_state(|s| {
            s.statuses.remove(key);
        });
    }

    fn show_at_center(&self, point: usize) {
        self.with_state(|s| s.centered.push(point));
    }

    fn error_message(&self, message: &str) {
        log::warn!("⚠️ {}", message);
        self.with_state(|s| s.alerts.push(message.to_string()));
    }
}
