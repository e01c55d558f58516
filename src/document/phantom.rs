//! 预览叠加层（phantom）及其身份
//!
//! # 设计思路
//!
//! 叠加层身份由“区域文本 + 区域偏移”共同决定：文本或位置任一变化，身份即失效。
//! 每次文档修改通知时重新读取区域文本，与创建时的快照比较，不一致就擦除叠加层。

use std::fmt;
use std::sync::Arc;

use super::view::{BufferView, Region};
use crate::image_handler::PreviewContent;

/// 叠加层身份（交给宿主的不透明字符串键）。
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PhantomId(String);

impl PhantomId {
    fn derive(region_str: &str, region: Region) -> Self {
        Self(format!("{:?}@{}..{}", region_str, region.a, region.b))
    }

    /// 按视图当前文本计算某区域的身份。
    pub fn compute(view: &dyn BufferView, region: Region) -> Self {
        Self::derive(&view.substr(region), region)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PhantomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// 区域快照：创建预览任务时捕获，加载完成后用来插入叠加层。
#[derive(Debug, Clone)]
pub struct RegionSnapshot {
    region: Region,
    region_str: String,
    id: PhantomId,
}

impl RegionSnapshot {
    pub fn capture(view: &dyn BufferView, region: Region) -> Self {
        let region_str = view.substr(region);
        let id = PhantomId::derive(&region_str, region);
        Self {
            region,
            region_str,
            id,
        }
    }

    pub fn id(&self) -> &PhantomId {
        &self.id
    }
}

/// 已显示的预览。
#[derive(Clone)]
pub struct Phantom {
    snapshot: RegionSnapshot,
    content: Arc<PreviewContent>,
}

impl Phantom {
    pub fn new(snapshot: RegionSnapshot, content: Arc<PreviewContent>) -> Self {
        Self { snapshot, content }
    }

    pub fn id(&self) -> &PhantomId {
        &self.snapshot.id
    }

    pub fn region(&self) -> Region {
        self.snapshot.region
    }

    pub fn preview(&self, view: &dyn BufferView) {
        let (max_w, max_h) = view.viewport_extent();
        let html = self.content.gen_html(max_w, max_h);
        view.add_phantom(self.id().as_str(), self.region(), &html);
    }

    pub fn hide(&self, view: &dyn BufferView) {
        view.erase_phantoms(self.id().as_str());
    }

    /// 区域文本是否已被编辑。
    pub fn is_stale(&self, view: &dyn BufferView) -> bool {
        view.substr(self.region()) != self.snapshot.region_str
    }
}
