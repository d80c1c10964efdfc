//! The table of supported texture formats.
//!
//! Every row pairs a [`TextureFormat`] with the function that turns its raw
//! texture data into a [`PixelBuffer`] in storage order.  Supporting a new
//! format means adding a row here; the assembler never matches on formats.


use surety::Ensure;

use crate::{GxtResult, TextureInfo, TextureFormat, ChannelOrder};
use crate::GxtError::*;
use crate::dxt::{self, DxtVariant};
use crate::pixel::*;
use crate::pvrtc::{self, PvrtcMode};


/// Decode raw texture data into a buffer of the texture's storage
/// dimensions.
pub(crate) type DecodeFn = fn(&[u8], &TextureInfo) -> GxtResult<PixelBuffer>;


/// One registered texture format
#[derive(Clone, Copy)]
pub(crate) struct FormatEntry {
	/// Working layout produced by [`decode`][Self::decode].
	pub(crate) layout: PixelLayout,
	pub(crate) decode: DecodeFn,
	/// How raw palette words resolve to colours, for indexed layouts.
	pub(crate) palette_order: Option<ChannelOrder>,
}


const fn direct(decode: DecodeFn) -> FormatEntry {
	FormatEntry { layout: PixelLayout::Bgra8888, decode, palette_order: None }
}


const fn indexed(decode: DecodeFn, order: ChannelOrder) -> FormatEntry {
	FormatEntry { layout: PixelLayout::Indexed8, decode, palette_order: Some(order) }
}


static REGISTRY: &[(TextureFormat, FormatEntry)] = &[
	(TextureFormat::U8_1RRR, direct(decode_u8_1rrr)),
	(TextureFormat::U8_R000, direct(decode_u8_r000)),
	(TextureFormat::U8U8_RGGG, direct(decode_u8u8_rggg)),
	(TextureFormat::U8U8_00GR, direct(decode_u8u8_00gr)),
	(TextureFormat::U1U5U5U5_ARGB, direct(decode_packed::<Argb1555Pixel>)),
	(TextureFormat::U4U4U4U4_ARGB, direct(decode_packed::<Argb4444Pixel>)),
	(TextureFormat::U5U6U5_RGB, direct(decode_packed::<Rgb565Pixel>)),
	(TextureFormat::U5U6U5_BGR, direct(decode_packed::<Bgr565Pixel>)),
	(TextureFormat::U8U8U8_RGB, direct(decode_u8u8u8_rgb)),
	(TextureFormat::U8U8U8_BGR, direct(decode_u8u8u8_bgr)),

	(TextureFormat::U8U8U8U8_ABGR, direct(decode_u8u8u8u8)),
	(TextureFormat::U8U8U8U8_ARGB, direct(decode_u8u8u8u8)),
	(TextureFormat::U8U8U8U8_RGBA, direct(decode_u8u8u8u8)),
	(TextureFormat::U8U8U8U8_BGRA, direct(decode_u8u8u8u8)),
	(TextureFormat::X8U8U8U8_1BGR, direct(decode_u8u8u8u8)),
	(TextureFormat::X8U8U8U8_1RGB, direct(decode_u8u8u8u8)),
	(TextureFormat::U8U8U8X8_RGB1, direct(decode_u8u8u8u8)),
	(TextureFormat::U8U8U8X8_BGR1, direct(decode_u8u8u8u8)),

	(TextureFormat::UBC1_ABGR, direct(decode_ubc1)),
	(TextureFormat::UBC2_ABGR, direct(decode_ubc2)),
	(TextureFormat::UBC3_ABGR, direct(decode_ubc3)),

	(TextureFormat::PVRT2BPP_ABGR, direct(decode_pvrt2bpp)),
	(TextureFormat::PVRT2BPP_1BGR, direct(decode_pvrt2bpp)),
	(TextureFormat::PVRT4BPP_ABGR, direct(decode_pvrt4bpp)),
	(TextureFormat::PVRT4BPP_1BGR, direct(decode_pvrt4bpp)),

	(TextureFormat::P4_ABGR, indexed(decode_p4, ChannelOrder::Abgr)),
	(TextureFormat(0x9400_1000), indexed(decode_p4, ChannelOrder::Argb)),
	(TextureFormat(0x9400_2000), indexed(decode_p4, ChannelOrder::Rgba)),
	(TextureFormat(0x9400_3000), indexed(decode_p4, ChannelOrder::Bgra)),
	(TextureFormat(0x9400_4000), indexed(decode_p4, ChannelOrder::OneBgr)),
	(TextureFormat(0x9400_5000), indexed(decode_p4, ChannelOrder::OneRgb)),
	(TextureFormat(0x9400_6000), indexed(decode_p4, ChannelOrder::RgbOne)),
	(TextureFormat(0x9400_7000), indexed(decode_p4, ChannelOrder::BgrOne)),

	(TextureFormat::P8_ABGR, indexed(decode_p8, ChannelOrder::Abgr)),
	(TextureFormat(0x9500_1000), indexed(decode_p8, ChannelOrder::Argb)),
	(TextureFormat(0x9500_2000), indexed(decode_p8, ChannelOrder::Rgba)),
	(TextureFormat(0x9500_3000), indexed(decode_p8, ChannelOrder::Bgra)),
	(TextureFormat(0x9500_4000), indexed(decode_p8, ChannelOrder::OneBgr)),
	(TextureFormat(0x9500_5000), indexed(decode_p8, ChannelOrder::OneRgb)),
	(TextureFormat(0x9500_6000), indexed(decode_p8, ChannelOrder::RgbOne)),
	(TextureFormat(0x9500_7000), indexed(decode_p8, ChannelOrder::BgrOne)),
];


/// Find the registry row for `format`.
///
/// # Errors
/// - [`FormatNotImplemented`]: `format` has no row.
pub(crate) fn lookup(format: TextureFormat) -> GxtResult<&'static FormatEntry> {
	REGISTRY.iter()
		.find(|(f, _)| *f == format)
		.map(|(_, entry)| entry)
		.ok_or(FormatNotImplemented(format))
}


/// Return true if textures of `format` can be decoded.
///
/// # Example
/// ```
/// # use vita_gxt::{is_supported, TextureFormat};
/// assert!(is_supported(TextureFormat::UBC3_ABGR));
/// assert!(!is_supported(TextureFormat::PVRTII4BPP_ABGR));
/// ```
pub fn is_supported(format: TextureFormat) -> bool {
	lookup(format).is_ok()
}


/// Iterate over every supported format, in registry order.
pub fn supported_formats() -> impl Iterator<Item = TextureFormat> {
	REGISTRY.iter().map(|(format, _)| *format)
}


fn pixel_count(info: &TextureInfo) -> GxtResult<(u32, u32, usize)> {
	let (width, height) = info.storage_dimensions();
	let count = (usize::try_from(width)?.checked() * usize::try_from(height)?).ok_or(ArithmeticOverflow)?;
	Ok((width, height, count))
}


fn take(data: &[u8], len: usize) -> GxtResult<&[u8]> {
	data.get(..len).ok_or(UnexpectedEof)
}


/// Map every `N`-byte source pixel to a `[b, g, r, a]` pixel.
fn decode_with<const N: usize, F>(data: &[u8], info: &TextureInfo, convert: F) -> GxtResult<PixelBuffer>
where
	F: Fn(&[u8]) -> [u8; 4],
{
	let (width, height, count) = pixel_count(info)?;
	let input = take(data, (count.checked() * N).ok_or(ArithmeticOverflow)?)?;
	let output = input.chunks_exact(N).flat_map(convert).collect();
	PixelBuffer::from_data(width, height, PixelLayout::Bgra8888, output)
}


fn decode_u8_1rrr(data: &[u8], info: &TextureInfo) -> GxtResult<PixelBuffer> {
	decode_with::<1, _>(data, info, |p| [p[0], p[0], p[0], 0xFF])
}


fn decode_u8_r000(data: &[u8], info: &TextureInfo) -> GxtResult<PixelBuffer> {
	decode_with::<1, _>(data, info, |p| [0, 0, 0, p[0]])
}


fn decode_u8u8_rggg(data: &[u8], info: &TextureInfo) -> GxtResult<PixelBuffer> {
	decode_with::<2, _>(data, info, |p| [p[1], p[1], p[1], p[0]])
}


fn decode_u8u8_00gr(data: &[u8], info: &TextureInfo) -> GxtResult<PixelBuffer> {
	decode_with::<2, _>(data, info, |p| [0, p[0], p[1], 0])
}


fn decode_u8u8u8_rgb(data: &[u8], info: &TextureInfo) -> GxtResult<PixelBuffer> {
	decode_with::<3, _>(data, info, |p| [p[0], p[1], p[2], 0xFF])
}


fn decode_u8u8u8_bgr(data: &[u8], info: &TextureInfo) -> GxtResult<PixelBuffer> {
	decode_with::<3, _>(data, info, |p| [p[2], p[1], p[0], 0xFF])
}


fn decode_u8u8u8u8(data: &[u8], info: &TextureInfo) -> GxtResult<PixelBuffer> {
	let order = info.format().channel_order();
	decode_with::<4, _>(data, info, |p| order.to_bgra(u32::from_le_bytes([p[0], p[1], p[2], p[3]])))
}


fn decode_packed<P: PackedPixel>(data: &[u8], info: &TextureInfo) -> GxtResult<PixelBuffer> {
	let (width, height, count) = pixel_count(info)?;
	let output = P::convert_to_bgra8_slice(data, count)?;
	PixelBuffer::from_data(width, height, PixelLayout::Bgra8888, output)
}


fn decode_ubc1(data: &[u8], info: &TextureInfo) -> GxtResult<PixelBuffer> {
	dxt::decode(data, info, DxtVariant::Bc1)
}


fn decode_ubc2(data: &[u8], info: &TextureInfo) -> GxtResult<PixelBuffer> {
	dxt::decode(data, info, DxtVariant::Bc2)
}


fn decode_ubc3(data: &[u8], info: &TextureInfo) -> GxtResult<PixelBuffer> {
	dxt::decode(data, info, DxtVariant::Bc3)
}


fn decode_pvrtc(data: &[u8], info: &TextureInfo, mode: PvrtcMode) -> GxtResult<PixelBuffer> {
	let (width, height) = (info.width_rounded(), info.height_rounded());
	let mut output = pvrtc::decompress(data, width, height, mode)?;

	if info.format().channel_order() == ChannelOrder::OneBgr {
		output.chunks_exact_mut(4).for_each(|p| p[3] = 0xFF);
	};

	PixelBuffer::from_data(width, height, PixelLayout::Bgra8888, output)
}


fn decode_pvrt2bpp(data: &[u8], info: &TextureInfo) -> GxtResult<PixelBuffer> {
	decode_pvrtc(data, info, PvrtcMode::TwoBpp)
}


fn decode_pvrt4bpp(data: &[u8], info: &TextureInfo) -> GxtResult<PixelBuffer> {
	decode_pvrtc(data, info, PvrtcMode::FourBpp)
}


/// Two indices per byte, low nibble first.
fn decode_p4(data: &[u8], info: &TextureInfo) -> GxtResult<PixelBuffer> {
	let (width, height, count) = pixel_count(info)?;
	let input = take(data, (count.checked() + 1).ok_or(ArithmeticOverflow)? / 2)?;

	let output = input.iter()
		.flat_map(|b| [b & 0x0F, b >> 4])
		.take(count)
		.collect();

	PixelBuffer::from_data(width, height, PixelLayout::Indexed8, output)
}


fn decode_p8(data: &[u8], info: &TextureInfo) -> GxtResult<PixelBuffer> {
	let (width, height, count) = pixel_count(info)?;
	let input = take(data, count)?;
	PixelBuffer::from_data(width, height, PixelLayout::Indexed8, input.to_vec())
}


#[cfg(test)]
fn linear_info(format: TextureFormat, width: u32, height: u32) -> TextureInfo {
	use crate::{RawTextureInfo, Revision, TextureType};

	let raw = RawTextureInfo {
		control_words: [TextureType::LINEAR.0, format.0, (height << 16) | width, 0],
		..RawTextureInfo::default()
	};

	TextureInfo::new(raw, Revision::Rev3)
}


#[cfg(test)]
fn decode_linear(format: TextureFormat, width: u32, height: u32, data: &[u8]) -> GxtResult<PixelBuffer> {
	let info = linear_info(format, width, height);
	(lookup(format)?.decode)(data, &info)
}


#[test]
fn registry_rows_are_unique() {
	let formats = supported_formats().collect::<Vec<_>>();

	for (i, f) in formats.iter().enumerate() {
		assert!(!formats[i + 1..].contains(f), "{} registered twice", f);
	};

	assert_eq!(formats.len(), 41);
}


#[test]
fn unregistered_formats() {
	for format in [TextureFormat::PVRTII2BPP_ABGR, TextureFormat::PVRTII4BPP_ABGR, TextureFormat(0x1234_5000)] {
		assert!(matches!(lookup(format), Err(FormatNotImplemented(f)) if f == format));
	};
}


#[test]
fn single_channel_formats() {
	let buffer = decode_linear(TextureFormat::U8_1RRR, 2, 1, &[0x10, 0x80]).unwrap();
	assert_eq!(buffer.data, vec![0x10, 0x10, 0x10, 0xFF, 0x80, 0x80, 0x80, 0xFF]);

	let buffer = decode_linear(TextureFormat::U8_R000, 1, 1, &[0x42]).unwrap();
	assert_eq!(buffer.data, vec![0, 0, 0, 0x42]);
}


#[test]
fn two_channel_formats() {
	let buffer = decode_linear(TextureFormat::U8U8_RGGG, 1, 1, &[0x80, 0x33]).unwrap();
	assert_eq!(buffer.data, vec![0x33, 0x33, 0x33, 0x80]);

	let buffer = decode_linear(TextureFormat::U8U8_00GR, 1, 1, &[0x11, 0x22]).unwrap();
	assert_eq!(buffer.data, vec![0x00, 0x11, 0x22, 0x00]);
}


#[test]
fn three_channel_formats() {
	let buffer = decode_linear(TextureFormat::U8U8U8_RGB, 1, 1, &[0x01, 0x02, 0x03]).unwrap();
	assert_eq!(buffer.data, vec![0x01, 0x02, 0x03, 0xFF]);

	let buffer = decode_linear(TextureFormat::U8U8U8_BGR, 1, 1, &[0x01, 0x02, 0x03]).unwrap();
	assert_eq!(buffer.data, vec![0x03, 0x02, 0x01, 0xFF]);
}


#[test]
fn four_channel_formats() {
	let data = 0x4433_2211u32.to_le_bytes();

	let buffer = decode_linear(TextureFormat::U8U8U8U8_ARGB, 1, 1, &data).unwrap();
	assert_eq!(buffer.data, vec![0x11, 0x22, 0x33, 0x44]);

	let buffer = decode_linear(TextureFormat::U8U8U8U8_ABGR, 1, 1, &data).unwrap();
	assert_eq!(buffer.data, vec![0x33, 0x22, 0x11, 0x44]);

	let buffer = decode_linear(TextureFormat::X8U8U8U8_1RGB, 1, 1, &data).unwrap();
	assert_eq!(buffer.data, vec![0x11, 0x22, 0x33, 0xFF]);
}


#[test]
fn rgb1_ignores_low_byte() {
	// swizzle names run from the most significant byte down, so X is byte 0
	let data = [0x11, 0x22, 0x33, 0x44];

	let buffer = decode_linear(TextureFormat::U8U8U8X8_RGB1, 1, 1, &data).unwrap();
	assert_eq!(buffer.data, vec![0x22, 0x33, 0x44, 0xFF]);

	let buffer = decode_linear(TextureFormat::U8U8U8X8_BGR1, 1, 1, &data).unwrap();
	assert_eq!(buffer.data, vec![0x44, 0x33, 0x22, 0xFF]);
}


#[test]
fn argb4444_alpha_is_high_nibble() {
	// 0x8421: a=8, r=4, g=2, b=1
	let buffer = decode_linear(TextureFormat::U4U4U4U4_ARGB, 1, 1, &[0x21, 0x84]).unwrap();
	assert_eq!(buffer.data, vec![0x11, 0x22, 0x44, 0x88]);
}


#[test]
fn p4_low_nibble_first() {
	let buffer = decode_linear(TextureFormat::P4_ABGR, 4, 1, &[0xA5, 0x3C]).unwrap();
	assert_eq!(buffer.data, vec![0x5, 0xA, 0xC, 0x3]);
}


#[test]
fn indexed_formats() {
	let buffer = decode_linear(TextureFormat::P4_ABGR, 3, 1, &[0x21, 0x0F]).unwrap();
	assert_eq!(buffer.layout, PixelLayout::Indexed8);
	assert_eq!(buffer.data, vec![0x1, 0x2, 0xF]);

	let buffer = decode_linear(TextureFormat::P8_ABGR, 2, 1, &[7, 9, 11]).unwrap();
	assert_eq!(buffer.data, vec![7, 9]);

	assert_eq!(lookup(TextureFormat(0x9500_1000)).unwrap().palette_order, Some(ChannelOrder::Argb));
	assert_eq!(lookup(TextureFormat::U8U8U8U8_ARGB).unwrap().palette_order, None);
}


#[test]
fn short_data_is_eof() {
	assert!(matches!(decode_linear(TextureFormat::P8_ABGR, 2, 2, &[0, 1, 2]), Err(UnexpectedEof)));
	assert!(matches!(decode_linear(TextureFormat::U5U6U5_RGB, 2, 1, &[0, 1, 2]), Err(UnexpectedEof)));
	assert!(matches!(decode_linear(TextureFormat::UBC2_ABGR, 4, 4, &[0; 8]), Err(UnexpectedEof)));
}


#[test]
fn pvrtc_1bgr_is_opaque() {
	// punch-through words decode to transparent pixels
	let data = [0xAA, 0xAA, 0xAA, 0xAA, 0x01, 0x80, 0xFF, 0xFF].repeat(4);

	let buffer = decode_linear(TextureFormat::PVRT4BPP_ABGR, 8, 8, &data).unwrap();
	assert!(buffer.data.chunks_exact(4).all(|p| p[3] == 0));

	let buffer = decode_linear(TextureFormat::PVRT4BPP_1BGR, 8, 8, &data).unwrap();
	assert!(buffer.data.chunks_exact(4).all(|p| p[3] == 0xFF));
}
