use crate::GxtResult;
use crate::GxtError::*;


use deku::{prelude::*, DekuContainerRead};
use derive_more::Display;
use surety::Ensure;
use tap::prelude::*;


/// Byte layout of a [`PixelBuffer`]
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq)]
pub enum PixelLayout {
	/// Four bytes per pixel in B, G, R, A order.
	Bgra8888,
	/// One palette index per byte.
	Indexed8,
}


impl PixelLayout {
	/// Size of a single pixel in bytes.
	pub const fn bytes_per_pixel(self) -> usize {
		match self {
			PixelLayout::Bgra8888 => 4,
			PixelLayout::Indexed8 => 1,
		}
	}
}


/// Row-major pixel data in a fixed working [`PixelLayout`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelBuffer {
	/// Width in pixels.
	pub width: u32,
	/// Height in pixels.
	pub height: u32,
	/// Layout of [`data`][Self::data].
	pub layout: PixelLayout,
	/// Pixel bytes, `width * height * layout.bytes_per_pixel()` long.
	pub data: Vec<u8>,
}


impl PixelBuffer {
	/// Create a zero-filled buffer.
	///
	/// # Errors
	/// - [`ArithmeticOverflow`]: Buffer size overflows a [`usize`].
	pub fn new(width: u32, height: u32, layout: PixelLayout) -> GxtResult<Self> {
		let len = Self::byte_len(width, height, layout)?;
		Ok(Self { width, height, layout, data: vec![0u8; len] })
	}


	/// Wrap existing pixel bytes.
	///
	/// # Errors
	/// - [`UnexpectedEof`]: `data` is shorter than the dimensions require.
	/// - [`ArithmeticOverflow`]: Buffer size overflows a [`usize`].
	pub fn from_data(width: u32, height: u32, layout: PixelLayout, mut data: Vec<u8>) -> GxtResult<Self> {
		let len = Self::byte_len(width, height, layout)?;

		if data.len() < len {
			return Err(UnexpectedEof);
		};

		data.truncate(len);
		Ok(Self { width, height, layout, data })
	}


	pub(crate) fn byte_len(width: u32, height: u32, layout: PixelLayout) -> GxtResult<usize> {
		let width = usize::try_from(width)?;
		let height = usize::try_from(height)?;
		(width.checked() * height * layout.bytes_per_pixel()).ok_or(ArithmeticOverflow)
	}


	/// Number of pixels in the buffer.
	pub fn pixel_count(&self) -> usize {
		self.data.len() / self.layout.bytes_per_pixel()
	}


	/// Source row stride in bytes.
	///
	/// Indexed buffers derive it from the data length, every other layout
	/// from the width.
	pub fn stride(&self) -> usize {
		match self.layout {
			PixelLayout::Indexed8 if self.height > 0 => self.data.len() / self.height as usize,
			layout => layout.bytes_per_pixel() * self.width as usize,
		}
	}


	/// Copy the top-left `width` x `height` region into a new buffer.
	///
	/// # Errors
	/// - [`UnexpectedEof`]: The region does not fit inside the buffer.
	/// - [`ArithmeticOverflow`]: Region size overflows a [`usize`].
	pub fn crop(&self, width: u32, height: u32) -> GxtResult<Self> {
		if width == self.width && height == self.height {
			return Ok(self.clone());
		};

		let stride = self.stride();
		let row_len = Self::byte_len(width, 1, self.layout)?;
		let mut result = Self::new(width, height, self.layout)?;

		if row_len > stride || height > self.height {
			return Err(UnexpectedEof);
		};

		for (y, row) in result.data.chunks_exact_mut(row_len.max(1)).enumerate().take(height as usize) {
			let start = (y.checked() * stride).ok_or(ArithmeticOverflow)?;
			let src = self.data.get(start..start + row_len).ok_or(UnexpectedEof)?;
			row.copy_from_slice(src);
		};

		Ok(result)
	}
}


/// A packed 16-bit pixel, read from little-endian storage through a deku
/// bitfield declared MSB-first
#[allow(clippy::cast_possible_truncation)]
pub(crate) trait PackedPixel: for<'a> DekuContainerRead<'a> + Sized {
	/// Bit widths of the red, green, blue and alpha fields.
	const WIDTHS: [u8; 4];

	/// Raw `[r, g, b, a]` field values.
	fn channels(&self) -> [u8; 4];


	const PIXEL_WIDTH: usize = (Self::WIDTHS[0] + Self::WIDTHS[1] + Self::WIDTHS[2] + Self::WIDTHS[3]) as usize;
	const PIXEL_WIDTH_BYTES: usize = (Self::PIXEL_WIDTH + 7) / 8;


	fn uint_range(width: u8) -> u8 { (2u16.pow(width.into()) - 1) as u8 }


	fn from_data(data: &[u8]) -> GxtResult<Self> {
		let data = data.get(0..Self::PIXEL_WIDTH_BYTES)
			.ok_or(PixelReadError)?
			.to_owned()
			.tap_mut(|d| d.reverse());

		let (_, result) = <Self as DekuContainerRead>::from_bytes((&data, 0))
			.map_err(|_| PixelReadError)?;
		Ok(result)
	}


	fn convert_u8(value: u8, from_width: u8) -> u8 {
		if from_width == 0 {
			return 0xFF;
		};

		let range_from = u16::from(Self::uint_range(from_width));
		let bias = range_from / 2;
		((u16::from(value) * 0xFF + bias) / range_from) as u8
	}


	fn to_bgra(&self) -> [u8; 4] {
		let [r, g, b, a] = self.channels();
		let [rw, gw, bw, aw] = Self::WIDTHS;
		[Self::convert_u8(b, bw), Self::convert_u8(g, gw), Self::convert_u8(r, rw), Self::convert_u8(a, aw)]
	}


	/// Convert `count` packed pixels into [`PixelLayout::Bgra8888`] bytes.
	fn convert_to_bgra8_slice(data: &[u8], count: usize) -> GxtResult<Vec<u8>> {
		let input_len = (count.checked() * Self::PIXEL_WIDTH_BYTES).ok_or(ArithmeticOverflow)?;
		let input = data.get(..input_len).ok_or(UnexpectedEof)?;
		let mut result = Vec::with_capacity((count.checked() * 4).ok_or(ArithmeticOverflow)?);

		for pixdata in input.chunks_exact(Self::PIXEL_WIDTH_BYTES) {
			result.extend(Self::from_data(pixdata)?.to_bgra());
		};

		Ok(result)
	}
}


#[derive(Debug, Clone, Copy, PartialEq, Eq, DekuRead)]
pub(crate) struct Argb1555Pixel {
	#[deku(bits = "1")]
	a: u8,
	#[deku(bits = "5")]
	r: u8,
	#[deku(bits = "5")]
	g: u8,
	#[deku(bits = "5")]
	b: u8,
}


impl PackedPixel for Argb1555Pixel {
	const WIDTHS: [u8; 4] = [5, 5, 5, 1];
	fn channels(&self) -> [u8; 4] { [self.r, self.g, self.b, self.a] }
}


#[derive(Debug, Clone, Copy, PartialEq, Eq, DekuRead)]
pub(crate) struct Argb4444Pixel {
	#[deku(bits = "4")]
	a: u8,
	#[deku(bits = "4")]
	r: u8,
	#[deku(bits = "4")]
	g: u8,
	#[deku(bits = "4")]
	b: u8,
}


impl PackedPixel for Argb4444Pixel {
	const WIDTHS: [u8; 4] = [4, 4, 4, 4];
	fn channels(&self) -> [u8; 4] { [self.r, self.g, self.b, self.a] }
}


#[derive(Debug, Clone, Copy, PartialEq, Eq, DekuRead)]
pub(crate) struct Rgb565Pixel {
	#[deku(bits = "5")]
	r: u8,
	#[deku(bits = "6")]
	g: u8,
	#[deku(bits = "5")]
	b: u8,
}


impl PackedPixel for Rgb565Pixel {
	const WIDTHS: [u8; 4] = [5, 6, 5, 0];
	fn channels(&self) -> [u8; 4] { [self.r, self.g, self.b, 0] }
}


#[derive(Debug, Clone, Copy, PartialEq, Eq, DekuRead)]
pub(crate) struct Bgr565Pixel {
	#[deku(bits = "5")]
	b: u8,
	#[deku(bits = "6")]
	g: u8,
	#[deku(bits = "5")]
	r: u8,
}


impl PackedPixel for Bgr565Pixel {
	const WIDTHS: [u8; 4] = [5, 6, 5, 0];
	fn channels(&self) -> [u8; 4] { [self.r, self.g, self.b, 0] }
}


#[test]
fn argb1555_to_bgra() {
	// 0xB412: a=1, r=0b01101, g=0b00000, b=0b10010
	let data = [0x12, 0xB4];
	assert_eq!(Argb1555Pixel::convert_to_bgra8_slice(&data, 1).unwrap(), vec![0x94, 0x00, 0x6B, 0xFF]);

	let data = [0x12, 0x34];
	assert_eq!(Argb1555Pixel::convert_to_bgra8_slice(&data, 1).unwrap(), vec![0x94, 0x00, 0x6B, 0x00]);
}


#[test]
fn argb4444_alpha_in_high_nibble() {
	let data = [0x21, 0xF3];
	assert_eq!(Argb4444Pixel::convert_to_bgra8_slice(&data, 1).unwrap(), vec![0x11, 0x22, 0x33, 0xFF]);
}


#[test]
fn rgb565_channel_order() {
	let red = 0xF800u16.to_le_bytes();
	assert_eq!(Rgb565Pixel::convert_to_bgra8_slice(&red, 1).unwrap(), vec![0x00, 0x00, 0xFF, 0xFF]);
	assert_eq!(Bgr565Pixel::convert_to_bgra8_slice(&red, 1).unwrap(), vec![0xFF, 0x00, 0x00, 0xFF]);

	let green = 0x07E0u16.to_le_bytes();
	assert_eq!(Rgb565Pixel::convert_to_bgra8_slice(&green, 1).unwrap(), vec![0x00, 0xFF, 0x00, 0xFF]);
}


#[test]
fn packed_pixel_short_input() {
	assert!(matches!(Rgb565Pixel::convert_to_bgra8_slice(&[0x00, 0x00, 0x00], 2), Err(UnexpectedEof)));
}


#[test]
fn crop_uses_stride() {
	let buffer = PixelBuffer::from_data(4, 2, PixelLayout::Indexed8, (0u8..8).collect()).unwrap();
	assert_eq!(buffer.stride(), 4);
	let cropped = buffer.crop(2, 2).unwrap();
	assert_eq!(cropped.data, vec![0, 1, 4, 5]);

	let buffer = PixelBuffer::from_data(2, 2, PixelLayout::Bgra8888, (0u8..16).collect()).unwrap();
	assert_eq!(buffer.stride(), 8);
	let cropped = buffer.crop(1, 2).unwrap();
	assert_eq!(cropped.data, vec![0, 1, 2, 3, 8, 9, 10, 11]);

	assert!(matches!(buffer.crop(3, 1), Err(UnexpectedEof)));
}
