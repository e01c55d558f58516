//! # 预览流水线模块
//!
//! ## 设计思路
//!
//! 把“原始字节 → 头信息 → 适配尺寸 → HTML 片段”集中在一处。
//! 只解析文件头，不解码像素；图片本身以 base64 内联进 `<img>`。
//!
//! ## 实现思路
//!
//! 1. `header::parse` 得到格式与尺寸
//! 2. base64 编码原始字节，得到 `PreviewContent`（可缓存、可复用）
//! 3. 每次渲染时按当前视口调用 `fit`，再拼出 HTML

use base64::{Engine as _, engine::general_purpose};

use super::header::{self, ImageMetadata};
use super::source::RawImageData;

/// 预留给视口的边距（显示单位）。
pub const PREVIEW_MARGIN: f64 = 100.0;

/// 适配后的显示尺寸。
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FitDimensions {
    pub width: f64,
    pub height: f64,
}

/// 按默认边距把图片适配进视口。
///
/// - `width <= max_w` 时原样返回，从不放大
/// - 否则保持宽高比，在扣除边距后的视口里缩小
///
/// 前置条件：需要缩小时 `height > 0`，调用方不得传入零高度。
pub fn fit(width: f64, height: f64, max_w: f64, max_h: f64) -> FitDimensions {
    fit_with_margin(width, height, max_w, max_h, PREVIEW_MARGIN)
}

/// 同 [`fit`]，边距由调用方指定。
pub fn fit_with_margin(width: f64, height: f64, max_w: f64, max_h: f64, margin: f64) -> FitDimensions {
    if width <= max_w {
        return FitDimensions { width, height };
    }

    debug_assert!(height > 0.0, "fit 需要非零高度");
    let ratio = width / height;

    if max_w >= max_h {
        let width = max_w - margin;
        FitDimensions {
            width,
            height: width / ratio,
        }
    } else {
        let height = max_h - margin;
        FitDimensions {
            width: height * ratio,
            height,
        }
    }
}

/// 已加载并解析过头信息的预览内容。
///
/// 与视口无关，可以在同一文档的多次预览之间复用。
#[derive(Debug, Clone)]
pub struct PreviewContent {
    locator: String,
    metadata: ImageMetadata,
    data_in_base64: String,
    margin: f64,
}

impl PreviewContent {
    pub(crate) fn from_raw(locator: impl Into<String>, raw: RawImageData, margin: f64) -> Self {
        let metadata = header::parse(&raw.bytes);
        let data_in_base64 = general_purpose::STANDARD.encode(&raw.bytes);

        Self {
            locator: locator.into(),
            metadata,
            data_in_base64,
            margin,
        }
    }

    pub fn locator(&self) -> &str {
        &self.locator
    }

    pub fn metadata(&self) -> &ImageMetadata {
        &self.metadata
    }

    /// 按视口计算显示尺寸；尺寸未知或高度为零时返回 `None`。
    pub fn preview_dimensions(&self, max_w: f64, max_h: f64) -> Option<FitDimensions> {
        let (width, height) = self.metadata.dimensions()?;
        if height == 0 {
            return None;
        }
        Some(fit_with_margin(
            f64::from(width),
            f64::from(height),
            max_w,
            max_h,
            self.margin,
        ))
    }

    /// 生成给宿主叠加层渲染的 HTML 片段。
    ///
    /// 尺寸未知时不输出 `width`/`height` 属性，交给渲染器按原始大小显示。
    pub fn gen_html(&self, max_w: f64, max_h: f64) -> String {
        let size_attrs = match self.preview_dimensions(max_w, max_h) {
            Some(dims) => format!(r#"width="{}" height="{}" "#, dims.width, dims.height),
            None => String::new(),
        };

        format!(
            "<style>body, html {{margin: 0; padding: 0}}</style>\n<img {}src=\"data:{};base64,{}\">\n",
            size_attrs,
            self.metadata.content_type(),
            self.data_in_base64
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn gif_content(width: u16, height: u16) -> PreviewContent {
        let mut bytes = b"GIF89a".to_vec();
        bytes.extend_from_slice(&width.to_le_bytes());
        bytes.extend_from_slice(&height.to_le_bytes());
        PreviewContent::from_raw(
            "/tmp/a.gif",
            RawImageData {
                bytes,
                source_hint: "test",
            },
            PREVIEW_MARGIN,
        )
    }

    #[test]
    fn fit_keeps_images_that_already_fit() {
        let dims = fit(640.0, 480.0, 1280.0, 800.0);
        assert_eq!(dims, FitDimensions { width: 640.0, height: 480.0 });
    }

    #[test]
    fn fit_landscape_viewport_binds_width() {
        let dims = fit(2000.0, 1000.0, 1200.0, 800.0);
        assert_eq!(dims.width, 1100.0);
        assert_eq!(dims.height, 550.0);
    }

    #[test]
    fn fit_portrait_viewport_binds_height() {
        let dims = fit(1000.0, 2000.0, 600.0, 900.0);
        assert_eq!(dims.height, 800.0);
        assert_eq!(dims.width, 400.0);
    }

    #[test]
    fn gen_html_embeds_base64_and_fitted_size() {
        let content = gif_content(2000, 1000);
        let html = content.gen_html(1200.0, 800.0);

        assert!(html.starts_with("<style>body, html {margin: 0; padding: 0}</style>"));
        assert!(html.contains(r#"width="1100" height="550""#));
        assert!(html.contains("src=\"data:image/gif;base64,R0lGODlh"));
    }

    #[test]
    fn gen_html_omits_size_for_unknown_images() {
        let content = PreviewContent::from_raw(
            "/tmp/unknown.bin",
            RawImageData {
                bytes: b"not an image".to_vec(),
                source_hint: "test",
            },
            PREVIEW_MARGIN,
        );

        let html = content.gen_html(1200.0, 800.0);

        assert!(!html.contains("width="));
        assert!(html.contains("src=\"data:;base64,"));
    }

    #[test]
    fn zero_height_image_is_not_fitted() {
        let content = gif_content(5000, 0);
        assert_eq!(content.preview_dimensions(1200.0, 800.0), None);
    }

    proptest! {
        #[test]
        fn fit_never_touches_images_within_max_width(
            width in 1.0f64..4000.0,
            height in 1.0f64..4000.0,
            extra in 0.0f64..4000.0,
            max_h in 101.0f64..4000.0,
        ) {
            let max_w = width + extra;
            let dims = fit(width, height, max_w, max_h);
            prop_assert_eq!(dims, FitDimensions { width, height });
        }

        #[test]
        fn fit_binds_one_axis_and_keeps_ratio(
            max_w in 200.0f64..4000.0,
            max_h in 200.0f64..4000.0,
            overflow in 1.0f64..8000.0,
            height in 1.0f64..8000.0,
        ) {
            let width = max_w + overflow;
            let dims = fit(width, height, max_w, max_h);

            if max_w >= max_h {
                prop_assert_eq!(dims.width, max_w - PREVIEW_MARGIN);
            } else {
                prop_assert_eq!(dims.height, max_h - PREVIEW_MARGIN);
            }

            let expected = width / height;
            let actual = dims.width / dims.height;
            prop_assert!((expected - actual).abs() <= expected * 1e-9);
        }
    }
}
