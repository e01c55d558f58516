//! 链接识别
//!
//! # 设计思路
//!
//! 在缓冲区文本中找出行内图片链接 `![alt](target)` 与普通链接 `[text](target)`。
//! 图片链接一律是候选；普通链接只有目标扩展名为图片时才是候选。
//!
//! # 实现思路
//!
//! - 正则预编译为 `Lazy<Regex>`，避免每次扫描重复编译。
//! - 候选的锚定区域为其所在整行，同一行只保留第一个候选。

use std::collections::HashSet;

use once_cell::sync::Lazy;
use regex::Regex;

use super::view::{BufferView, Region};
use crate::image_handler::is_image_path;

/// 行内链接：第 1 组为可选的 `!`，第 2 组为目标。
static INLINE_LINK: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(!?)\[[^\]\n]*\]\(([^)\n]*)\)").expect("inline link pattern is valid")
});

/// 从一段文本中取出链接目标（贪婪匹配，一行多个链接时取最后一个）。
static REGION_LINK_TARGET: Lazy<Regex> =
    Lazy::new(|| Regex::new(r".*\[.*\]\((.*)\).*").expect("region target pattern is valid"));

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkKind {
    Image,
    Link,
}

/// 扫描得到的链接。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkCandidate {
    /// 链接本身的区域。
    pub region: Region,
    pub kind: LinkKind,
    pub target: String,
}

impl LinkCandidate {
    /// 是否应作为图片预览候选。
    pub fn is_previewable(&self) -> bool {
        match self.kind {
            LinkKind::Image => true,
            LinkKind::Link => is_image_path(&crate::image_handler::remove_backslash(&self.target)),
        }
    }
}

/// 扫描文本中的所有行内链接（偏移为字节偏移）。
pub fn scan_links(text: &str) -> Vec<LinkCandidate> {
    INLINE_LINK
        .captures_iter(text)
        .filter_map(|caps| {
            let whole = caps.get(0)?;
            let kind = if caps.get(1).is_some_and(|m| !m.as_str().is_empty()) {
                LinkKind::Image
            } else {
                LinkKind::Link
            };
            let target = caps.get(2)?.as_str().trim().to_string();
            Some(LinkCandidate {
                region: Region::new(whole.start(), whole.end()),
                kind,
                target,
            })
        })
        .collect()
}

/// 从区域文本中取出路径：优先取 `[..](..)` 里的目标，并去掉所有括号。
pub fn path_from_region_text(text: &str) -> String {
    let path = REGION_LINK_TARGET
        .captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
        .unwrap_or(text);

    path.chars().filter(|c| *c != '(' && *c != ')').collect::<String>().trim().to_string()
}

/// 预览候选所在的行区域（去重，保持出现顺序）。
pub fn preview_regions(view: &dyn BufferView) -> Vec<Region> {
    let text = view.substr(Region::new(0, view.size()));
    let mut seen = HashSet::new();

    scan_links(&text)
        .into_iter()
        .filter(LinkCandidate::is_previewable)
        .map(|candidate| view.line(candidate.region))
        .filter(|line| seen.insert(*line))
        .collect()
}

/// 光标所在的链接；不在任何链接上时返回 `None`。
pub fn link_at(view: &dyn BufferView, point: usize) -> Option<LinkCandidate> {
    let line = view.line(Region::new(point, point));
    let text = view.substr(line);

    scan_links(&text).into_iter().find_map(|mut candidate| {
        candidate.region = Region::new(
            candidate.region.begin() + line.begin(),
            candidate.region.end() + line.begin(),
        );
        candidate.region.contains(point).then_some(candidate)
    })
}
