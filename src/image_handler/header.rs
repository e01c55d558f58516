//! # 图片头解析模块
//!
//! ## 设计思路
//!
//! 预览只需要“格式 + 宽高”，不需要像素数据，因此这里不引入任何图像库，
//! 直接按已知二进制布局读取文件头。解析永远不会失败：任何不一致都降级为
//! “格式未知 / 尺寸未知”，让上层仍然可以渲染兜底内容。
//!
//! ## 实现思路
//!
//! 按固定优先级依次尝试：
//! 1. GIF：`GIF87a` / `GIF89a`，偏移 6、8 处的小端 u16
//! 2. PNG：签名 + `IHDR`，偏移 16、20 处的大端 u32
//! 3. 旧版 PNG：仅签名匹配，偏移 8、12 处的大端 u32
//! 4. JPEG：`FF D8` 开头，逐段扫描直到 SOF（`C0..=C3`）
//! 5. 其他：未知
//!
//! 长度不足的 GIF/PNG 头会继续落入后面的分支，而不是报错。

const GIF87A: &[u8; 6] = b"GIF87a";
const GIF89A: &[u8; 6] = b"GIF89a";
const PNG_SIGNATURE: &[u8; 8] = b"\x89PNG\r\n\x1a\n";
const PNG_IHDR: &[u8; 4] = b"IHDR";

const JPEG_SOI: [u8; 2] = [0xFF, 0xD8];
const JPEG_MARKER_PREFIX: u8 = 0xFF;
const JPEG_SOS: u8 = 0xDA;
const JPEG_EOI: u8 = 0xD9;
const JPEG_SOF_RANGE: std::ops::RangeInclusive<u8> = 0xC0..=0xC3;

/// 未知尺寸的哨兵值。
pub const UNKNOWN_DIMENSION: i64 = -1;

/// 能识别的图片格式。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ImageFormat {
    Gif,
    Png,
    Jpeg,
    Unknown,
}

impl ImageFormat {
    /// 用于 data URI 的 MIME 类型，未知格式返回空串。
    pub fn content_type(self) -> &'static str {
        match self {
            Self::Gif => "image/gif",
            Self::Png => "image/png",
            Self::Jpeg => "image/jpeg",
            Self::Unknown => "",
        }
    }
}

/// 图片头解析结果。
///
/// 字段私有，只能由 [`parse`] 构造，保证格式与尺寸总是同时得出。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageMetadata {
    format: ImageFormat,
    dimensions: Option<(u32, u32)>,
}

impl ImageMetadata {
    fn unknown() -> Self {
        Self {
            format: ImageFormat::Unknown,
            dimensions: None,
        }
    }

    fn recognized(format: ImageFormat, dimensions: Option<(u32, u32)>) -> Self {
        Self { format, dimensions }
    }

    pub fn format(&self) -> ImageFormat {
        self.format
    }

    /// 宽度（像素），未知时为 `-1`。
    pub fn width(&self) -> i64 {
        self.dimensions
            .map(|(w, _)| i64::from(w))
            .unwrap_or(UNKNOWN_DIMENSION)
    }

    /// 高度（像素），未知时为 `-1`。
    pub fn height(&self) -> i64 {
        self.dimensions
            .map(|(_, h)| i64::from(h))
            .unwrap_or(UNKNOWN_DIMENSION)
    }

    pub fn dimensions(&self) -> Option<(u32, u32)> {
        self.dimensions
    }

    pub fn content_type(&self) -> &'static str {
        self.format.content_type()
    }
}

/// 从原始字节解析图片格式与尺寸。
///
/// # 示例
/// ```rust
/// use note_preview::image_handler::{parse_header, ImageFormat};
///
/// let mut gif = b"GIF89a".to_vec();
/// gif.extend_from_slice(&[64, 0, 32, 0]);
///
/// let meta = parse_header(&gif);
/// assert_eq!(meta.format(), ImageFormat::Gif);
/// assert_eq!((meta.width(), meta.height()), (64, 32));
/// ```
pub fn parse(bytes: &[u8]) -> ImageMetadata {
    if let Some(meta) = parse_gif(bytes) {
        return meta;
    }
    if let Some(meta) = parse_png(bytes) {
        return meta;
    }
    if let Some(meta) = parse_legacy_png(bytes) {
        return meta;
    }
    if bytes.len() >= 2 && bytes.starts_with(&JPEG_SOI) {
        return ImageMetadata::recognized(ImageFormat::Jpeg, scan_jpeg_dimensions(bytes));
    }
    ImageMetadata::unknown()
}

fn parse_gif(bytes: &[u8]) -> Option<ImageMetadata> {
    if bytes.len() < 10 {
        return None;
    }
    let magic = &bytes[..6];
    if magic != GIF87A && magic != GIF89A {
        return None;
    }

    let width = u16::from_le_bytes([bytes[6], bytes[7]]);
    let height = u16::from_le_bytes([bytes[8], bytes[9]]);
    Some(ImageMetadata::recognized(
        ImageFormat::Gif,
        Some((u32::from(width), u32::from(height))),
    ))
}

fn parse_png(bytes: &[u8]) -> Option<ImageMetadata> {
    if bytes.len() < 24 || !bytes.starts_with(PNG_SIGNATURE) || &bytes[12..16] != PNG_IHDR {
        return None;
    }

    let width = read_u32_be(&bytes[16..20])?;
    let height = read_u32_be(&bytes[20..24])?;
    Some(ImageMetadata::recognized(ImageFormat::Png, Some((width, height))))
}

/// 部分早期 PNG 没有标准的 chunk 长度 + `IHDR` 框架，宽高紧跟在签名之后。
fn parse_legacy_png(bytes: &[u8]) -> Option<ImageMetadata> {
    if bytes.len() < 16 || !bytes.starts_with(PNG_SIGNATURE) {
        return None;
    }

    let width = read_u32_be(&bytes[8..12])?;
    let height = read_u32_be(&bytes[12..16])?;
    Some(ImageMetadata::recognized(ImageFormat::Png, Some((width, height))))
}

fn read_u32_be(slice: &[u8]) -> Option<u32> {
    let array: [u8; 4] = slice.try_into().ok()?;
    Some(u32::from_be_bytes(array))
}

/// 扫描 JPEG 段流，返回 `(width, height)`。
///
/// SOF 段里高度在前、宽度在后，与 GIF/PNG 相反。
/// 遇到 SOS / EOI、数据耗尽或任何越界读取都返回 `None`。
fn scan_jpeg_dimensions(bytes: &[u8]) -> Option<(u32, u32)> {
    let mut cursor = ByteCursor::new(bytes);
    cursor.skip(JPEG_SOI.len())?;

    loop {
        let mut byte = cursor.read_u8()?;
        while byte != JPEG_MARKER_PREFIX {
            byte = cursor.read_u8()?;
        }
        while byte == JPEG_MARKER_PREFIX {
            byte = cursor.read_u8()?;
        }

        let marker = byte;
        if marker == JPEG_SOS || marker == JPEG_EOI {
            return None;
        }

        if JPEG_SOF_RANGE.contains(&marker) {
            // 段长度（2 字节）+ 采样精度（1 字节）
            cursor.skip(3)?;
            let height = cursor.read_u16_be()?;
            let width = cursor.read_u16_be()?;
            return Some((u32::from(width), u32::from(height)));
        }

        let length = usize::from(cursor.read_u16_be()?);
        let payload = length.checked_sub(2)?;
        cursor.skip(payload)?;
    }
}

/// 只读游标，所有读取在越界时返回 `None`。
struct ByteCursor<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> ByteCursor<'a> {
    fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    fn read_u8(&mut self) -> Option<u8> {
        let byte = *self.data.get(self.pos)?;
        self.pos += 1;
        Some(byte)
    }

    fn read_u16_be(&mut self) -> Option<u16> {
        let hi = self.read_u8()?;
        let lo = self.read_u8()?;
        Some(u16::from_be_bytes([hi, lo]))
    }

    fn skip(&mut self, count: usize) -> Option<()> {
        let next = self.pos.checked_add(count)?;
        if next > self.data.len() {
            return None;
        }
        self.pos = next;
        Some(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let mut bytes = PNG_SIGNATURE.to_vec();
        bytes.extend_from_slice(&13u32.to_be_bytes());
        bytes.extend_from_slice(PNG_IHDR);
        bytes.extend_from_slice(&width.to_be_bytes());
        bytes.extend_from_slice(&height.to_be_bytes());
        bytes.extend_from_slice(&[8, 6, 0, 0, 0]);
        bytes
    }

    /// SOI + APP0 + SOF + SOS 的最小 JPEG 头。
    fn jpeg_bytes(sof_marker: u8, width: u16, height: u16) -> Vec<u8> {
        let mut bytes = vec![0xFF, 0xD8];
        bytes.extend_from_slice(&[0xFF, 0xE0, 0x00, 0x10]);
        bytes.extend_from_slice(b"JFIF\0");
        bytes.extend_from_slice(&[1, 1, 0, 0, 1, 0, 1, 0, 0]);
        bytes.extend_from_slice(&[0xFF, sof_marker, 0x00, 0x11, 0x08]);
        bytes.extend_from_slice(&height.to_be_bytes());
        bytes.extend_from_slice(&width.to_be_bytes());
        bytes.extend_from_slice(&[3, 1, 0x22, 0, 2, 0x11, 1, 3, 0x11, 1]);
        bytes.extend_from_slice(&[0xFF, 0xDA, 0x00, 0x02]);
        bytes
    }

    #[test]
    fn gif89a_scenario_reads_little_endian_dimensions() {
        let mut bytes = b"GIF89a".to_vec();
        bytes.extend_from_slice(&[64, 0, 32, 0]);

        let meta = parse(&bytes);

        assert_eq!(meta.format(), ImageFormat::Gif);
        assert_eq!(meta.width(), 64);
        assert_eq!(meta.height(), 32);
        assert_eq!(meta.content_type(), "image/gif");
    }

    #[test]
    fn truncated_gif_header_is_unknown() {
        let meta = parse(b"GIF89a\x40\x00");

        assert_eq!(meta.format(), ImageFormat::Unknown);
        assert_eq!((meta.width(), meta.height()), (-1, -1));
        assert_eq!(meta.content_type(), "");
    }

    #[test]
    fn empty_input_is_unknown() {
        let meta = parse(&[]);
        assert_eq!(meta.format(), ImageFormat::Unknown);
        assert_eq!(meta.dimensions(), None);
    }

    #[test]
    fn png_with_ihdr_reads_offsets_16_and_20() {
        let meta = parse(&png_bytes(800, 600));

        assert_eq!(meta.format(), ImageFormat::Png);
        assert_eq!((meta.width(), meta.height()), (800, 600));
    }

    #[test]
    fn png_dimensions_above_i32_range_are_preserved() {
        let meta = parse(&png_bytes(u32::MAX, 1));
        assert_eq!(meta.width(), i64::from(u32::MAX));
    }

    #[test]
    fn legacy_png_without_ihdr_reads_offsets_8_and_12() {
        let mut bytes = PNG_SIGNATURE.to_vec();
        bytes.extend_from_slice(&320u32.to_be_bytes());
        bytes.extend_from_slice(&240u32.to_be_bytes());

        let meta = parse(&bytes);

        assert_eq!(meta.format(), ImageFormat::Png);
        assert_eq!((meta.width(), meta.height()), (320, 240));
    }

    #[test]
    fn png_signature_alone_is_unknown() {
        let meta = parse(PNG_SIGNATURE);
        assert_eq!(meta.format(), ImageFormat::Unknown);
    }

    #[test]
    fn jpeg_sof0_decodes_height_before_width() {
        let meta = parse(&jpeg_bytes(0xC0, 1024, 768));

        assert_eq!(meta.format(), ImageFormat::Jpeg);
        assert_eq!(meta.width(), 1024);
        assert_eq!(meta.height(), 768);
    }

    #[test]
    fn jpeg_progressive_sof2_is_supported() {
        let meta = parse(&jpeg_bytes(0xC2, 17, 9));
        assert_eq!((meta.width(), meta.height()), (17, 9));
    }

    #[test]
    fn jpeg_marker_padding_is_skipped() {
        let mut bytes = vec![0xFF, 0xD8, 0xFF, 0xFF, 0xFF, 0xC0, 0x00, 0x11, 0x08];
        bytes.extend_from_slice(&[0x00, 0x20, 0x00, 0x40]);

        let meta = parse(&bytes);
        assert_eq!((meta.width(), meta.height()), (64, 32));
    }

    #[test]
    fn jpeg_stops_at_start_of_scan() {
        let bytes = [0xFF, 0xD8, 0xFF, 0xDA, 0x00, 0x08, 0xFF, 0xC0, 0, 0x11, 8, 0, 1, 0, 1];

        let meta = parse(&bytes);

        assert_eq!(meta.format(), ImageFormat::Jpeg);
        assert_eq!(meta.dimensions(), None);
    }

    #[test]
    fn jpeg_stops_at_end_of_image() {
        let bytes = [0xFF, 0xD8, 0xFF, 0xD9, 0xFF, 0xC0, 0, 0x11, 8, 0, 20, 0, 40];

        let meta = parse(&bytes);

        assert_eq!(meta.format(), ImageFormat::Jpeg);
        assert_eq!(meta.dimensions(), None);
        assert_eq!((meta.width(), meta.height()), (UNKNOWN_DIMENSION, UNKNOWN_DIMENSION));
    }

    #[test]
    fn jpeg_truncated_segment_degrades_to_unknown_size() {
        let mut bytes = jpeg_bytes(0xC0, 10, 10);
        bytes.truncate(20);

        let meta = parse(&bytes);

        assert_eq!(meta.format(), ImageFormat::Jpeg);
        assert_eq!((meta.width(), meta.height()), (-1, -1));
    }

    #[test]
    fn jpeg_bogus_segment_length_does_not_panic() {
        let bytes = [0xFF, 0xD8, 0xFF, 0xE1, 0x00, 0x01, 0xFF, 0xC0];
        let meta = parse(&bytes);
        assert_eq!(meta.dimensions(), None);
    }

    #[test]
    fn bare_soi_is_jpeg_with_unknown_size() {
        let meta = parse(&[0xFF, 0xD8]);
        assert_eq!(meta.format(), ImageFormat::Jpeg);
        assert_eq!(meta.width(), -1);
    }

    proptest! {
        #[test]
        fn gif_headers_always_yield_little_endian_dimensions(
            use_87a in any::<bool>(),
            width in any::<u16>(),
            height in any::<u16>(),
            tail in proptest::collection::vec(any::<u8>(), 0..32),
        ) {
            let mut bytes = if use_87a { GIF87A.to_vec() } else { GIF89A.to_vec() };
            bytes.extend_from_slice(&width.to_le_bytes());
            bytes.extend_from_slice(&height.to_le_bytes());
            bytes.extend_from_slice(&tail);

            let meta = parse(&bytes);
            prop_assert_eq!(meta.format(), ImageFormat::Gif);
            prop_assert_eq!(meta.width(), i64::from(width));
            prop_assert_eq!(meta.height(), i64::from(height));
        }

        #[test]
        fn png_headers_always_yield_big_endian_dimensions(width in any::<u32>(), height in any::<u32>()) {
            let meta = parse(&png_bytes(width, height));
            prop_assert_eq!(meta.format(), ImageFormat::Png);
            prop_assert_eq!(meta.width(), i64::from(width));
            prop_assert_eq!(meta.height(), i64::from(height));
        }

        #[test]
        fn arbitrary_bytes_never_panic(bytes in proptest::collection::vec(any::<u8>(), 0..256)) {
            let meta = parse(&bytes);
            prop_assert_eq!(meta.dimensions().is_none(), meta.width() == -1);
        }

        #[test]
        fn arbitrary_jpeg_bodies_never_panic(body in proptest::collection::vec(any::<u8>(), 0..256)) {
            let mut bytes = JPEG_SOI.to_vec();
            bytes.extend_from_slice(&body);
            prop_assert_eq!(parse(&bytes).format(), ImageFormat::Jpeg);
        }
    }
}
