//! 宿主视图抽象
//!
//! 缓冲区、叠加层、状态栏与提示框都由宿主编辑器提供，这里只定义所需能力。
//! 位置均为缓冲区文本的字节偏移。

use std::path::PathBuf;

/// 缓冲区中的一段区域，`a` 可以大于 `b`（反向选择）。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Region {
    pub a: usize,
    pub b: usize,
}

impl Region {
    pub fn new(a: usize, b: usize) -> Self {
        Self { a, b }
    }

    pub fn begin(&self) -> usize {
        self.a.min(self.b)
    }

    pub fn end(&self) -> usize {
        self.a.max(self.b)
    }

    pub fn contains(&self, point: usize) -> bool {
        self.begin() <= point && point <= self.end()
    }
}

/// 文档视图（宿主实现）。
///
/// 所有方法都可能在后台任务中调用，实现方需要自行保证线程安全。
pub trait BufferView: Send + Sync {
    /// 视图的稳定标识，用于会话注册表。
    fn id(&self) -> u64;

    /// 文档对应的文件路径；未保存的缓冲区返回 `None`。
    fn file_name(&self) -> Option<PathBuf>;

    /// 语法定义名称，用于判断命令是否可用。
    fn syntax(&self) -> String;

    /// 缓冲区长度（字节）。
    fn size(&self) -> usize;

    fn substr(&self, region: Region) -> String;

    /// 覆盖 `region` 的完整行（不含换行符）。
    fn line(&self, region: Region) -> Region;

    /// 第一个选区的起点。
    fn selection_point(&self) -> usize;

    /// 视口尺寸 `(宽, 高)`，单位与叠加层一致。
    fn viewport_extent(&self) -> (f64, f64);

    fn add_phantom(&self, key: &str, region: Region, html: &str);

    fn erase_phantoms(&self, key: &str);

    fn set_status(&self, key: &str, message: &str);

    fn erase_status(&self, key: &str);

    fn show_at_center(&self, point: usize);

    /// 非阻塞的用户提示。
    fn error_message(&self, message: &str);
}

/// 打开外部资源的能力（浏览器、编辑器）。
pub trait Launcher: Send + Sync {
    fn open_url(&self, url: &str) -> Result<(), crate::error::AppError>;

    fn open_file(&self, path: &std::path::Path) -> Result<(), crate::error::AppError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reversed_region_normalizes_bounds() {
        let region = Region::new(12, 4);
        assert_eq!(region.begin(), 4);
        assert_eq!(region.end(), 12);
        assert!(region.contains(4));
        assert!(region.contains(12));
        assert!(!region.contains(13));
    }
}
