//! DXTn (UBC1/UBC2/UBC3) block decoding.
//!
//! Every block decodes to 16 pixels in [`PixelLayout::Bgra8888`] order.  For
//! swizzled and tiled textures, blocks are emitted as 16-pixel runs in the
//! GPU's in-block Morton order ([`BLOCK_ORDER`]), so the pixel-level
//! un-scrambler in [`crate::arrange`] turns the whole surface into raster
//! order.  Linear textures are written straight to raster positions.


use byteorder::{ByteOrder, LittleEndian};
use surety::Ensure;

use crate::{GxtResult, TextureInfo, TextureType};
use crate::GxtError::*;
use crate::pixel::{PixelBuffer, PixelLayout};
use crate::macros;


/// Position of in-block raster pixel `i` (`y * 4 + x`) within the
/// block's 16-pixel run
pub const BLOCK_ORDER: [usize; 16] = [
	0, 2, 8, 10,
	1, 3, 9, 11,
	4, 6, 12, 14,
	5, 7, 13, 15,
];


/// The three DXTn block encodings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DxtVariant {
	/// UBC1: 8-byte blocks, colour only.
	Bc1,
	/// UBC2: 16-byte blocks, explicit 4-bit alpha.
	Bc2,
	/// UBC3: 16-byte blocks, interpolated alpha.
	Bc3,
}


impl DxtVariant {
	/// Size of one encoded 4x4 block in bytes.
	pub const fn block_size(self) -> usize {
		match self {
			DxtVariant::Bc1 => 8,
			DxtVariant::Bc2 | DxtVariant::Bc3 => 16,
		}
	}


	/// Decode a single block to 16 `[b, g, r, a]` pixels in raster order.
	///
	/// # Errors
	/// - [`UnexpectedEof`]: `block` is shorter than [`block_size`][Self::block_size].
	pub fn decode_block(self, block: &[u8]) -> GxtResult<[[u8; 4]; 16]> {
		let block = block.get(..self.block_size()).ok_or(UnexpectedEof)?;

		let pixels = match self {
			DxtVariant::Bc1 => decode_color(block, true),

			DxtVariant::Bc2 => {
				let (alpha, color) = block.split_at(8);
				let mut pixels = decode_color(color, false);
				let mut alpha = LittleEndian::read_u64(alpha);

				for pixel in pixels.iter_mut() {
					#[allow(clippy::cast_possible_truncation)]
					let a = (alpha & 0xF) as u8;
					pixel[3] = (a << 4) | a;
					alpha >>= 4;
				};

				pixels
			},

			DxtVariant::Bc3 => {
				let (alpha, color) = block.split_at(8);
				let mut pixels = decode_color(color, false);
				let table = bc3_alpha_table(alpha[0], alpha[1]);
				let codes = LittleEndian::read_u48(&alpha[2..8]);

				for (i, pixel) in pixels.iter_mut().enumerate() {
					#[allow(clippy::cast_possible_truncation)]
					let code = ((codes >> (3 * i)) & 0x7) as usize;
					pixel[3] = table[code];
				};

				pixels
			},
		};

		Ok(pixels)
	}
}


/// Expand a 5-bit channel to 8 bits by bit replication.
///
/// # Example
/// ```
/// # use vita_gxt::dxt::expand5;
/// assert_eq!(expand5(0b11111), 255);
/// assert_eq!(expand5(0b10000), 0b1000_0100);
/// ```
pub const fn expand5(value: u8) -> u8 {
	let value = value & 0x1F;
	(value << 3) | (value >> 2)
}


/// Expand a 6-bit channel to 8 bits by bit replication.
pub const fn expand6(value: u8) -> u8 {
	let value = value & 0x3F;
	(value << 2) | (value >> 4)
}


/// Unpack an RGB565 endpoint to `[b, g, r]`.
#[allow(clippy::cast_possible_truncation)]
pub const fn unpack_565(color: u16) -> [u8; 3] {
	let r = expand5((color >> 11) as u8);
	let g = expand6((color >> 5) as u8);
	let b = expand5(color as u8);
	[b, g, r]
}


/// The four-entry colour palette of a block, as `[b, g, r, a]`.
///
/// UBC1 is RGB-only on this hardware: its third entry is the midpoint, its
/// fourth is black, and all entries are opaque regardless of how the
/// endpoints compare.
#[allow(clippy::cast_possible_truncation)]
pub fn color_table(color0: u16, color1: u16, bc1: bool) -> [[u8; 4]; 4] {
	let c0 = unpack_565(color0).map(u16::from);
	let c1 = unpack_565(color1).map(u16::from);
	let mut table = [[0u8, 0, 0, 0xFF]; 4];

	for ch in 0..3 {
		table[0][ch] = c0[ch] as u8;
		table[1][ch] = c1[ch] as u8;

		if bc1 {
			table[2][ch] = ((c0[ch] + c1[ch]) / 2) as u8;
		}
		else {
			table[2][ch] = ((2 * c0[ch] + c1[ch]) / 3) as u8;
			table[3][ch] = ((c0[ch] + 2 * c1[ch]) / 3) as u8;
		};
	};

	table
}


/// The eight interpolated UBC3 alpha values for endpoints `a0` and `a1`.
///
/// # Example
/// ```
/// # use vita_gxt::dxt::bc3_alpha_table;
/// let table = bc3_alpha_table(255, 0);
/// assert_eq!(table[2], 218);
/// assert_eq!(table[7], 36);
/// ```
#[allow(clippy::cast_possible_truncation)]
pub fn bc3_alpha_table(a0: u8, a1: u8) -> [u8; 8] {
	let (a0w, a1w) = (u16::from(a0), u16::from(a1));

	if a0 > a1 {
		[
			a0,
			a1,
			((6 * a0w + a1w) / 7) as u8,
			((5 * a0w + 2 * a1w) / 7) as u8,
			((4 * a0w + 3 * a1w) / 7) as u8,
			((3 * a0w + 4 * a1w) / 7) as u8,
			((2 * a0w + 5 * a1w) / 7) as u8,
			((a0w + 6 * a1w) / 7) as u8,
		]
	}
	else {
		[
			a0,
			a1,
			((4 * a0w + a1w) / 5) as u8,
			((3 * a0w + 2 * a1w) / 5) as u8,
			((2 * a0w + 3 * a1w) / 5) as u8,
			((a0w + 4 * a1w) / 5) as u8,
			0x00,
			0xFF,
		]
	}
}


fn decode_color(block: &[u8], bc1: bool) -> [[u8; 4]; 16] {
	let color0 = LittleEndian::read_u16(&block[0..2]);
	let color1 = LittleEndian::read_u16(&block[2..4]);
	let codes = LittleEndian::read_u32(&block[4..8]);
	let table = color_table(color0, color1, bc1);

	let mut pixels = [[0u8; 4]; 16];

	for (i, pixel) in pixels.iter_mut().enumerate() {
		let code = ((codes >> (2 * i)) & 0x3) as usize;
		*pixel = table[code];
	};

	pixels
}


/// Decode a DXTn surface of `info`'s rounded dimensions (at least one block
/// in each direction).
///
/// # Errors
/// - [`UnexpectedEof`]: `data` holds fewer blocks than the surface needs.
/// - [`ArithmeticOverflow`]: Surface size overflows a [`usize`].
pub(crate) fn decode(data: &[u8], info: &TextureInfo, variant: DxtVariant) -> GxtResult<PixelBuffer> {
	let width = info.width_rounded().max(4);
	let height = info.height_rounded().max(4);
	let blocks_x = (width / 4) as usize;
	let blocks_y = (height / 4) as usize;
	let block_count = (blocks_x.checked() * blocks_y).ok_or(ArithmeticOverflow)?;
	let needed = (block_count.checked() * variant.block_size()).ok_or(ArithmeticOverflow)?;
	let data = data.get(..needed).ok_or(UnexpectedEof)?;
	let raster = info.texture_type() == TextureType::LINEAR;

	macros::log!(trace, "{:?}: {} x {} blocks, raster placement: {}", variant, blocks_x, blocks_y, raster);

	let mut buffer = PixelBuffer::new(width, height, PixelLayout::Bgra8888)?;
	let row_bytes = width as usize * 4;

	for (index, block) in data.chunks_exact(variant.block_size()).enumerate() {
		let pixels = variant.decode_block(block)?;

		for (i, pixel) in pixels.iter().enumerate() {
			let offset = if raster {
				let (bx, by) = (index % blocks_x, index / blocks_x);
				let (x, y) = (bx * 4 + i % 4, by * 4 + i / 4);
				y * row_bytes + x * 4
			}
			else {
				(index * 16 + BLOCK_ORDER[i]) * 4
			};

			buffer.data[offset..offset + 4].copy_from_slice(pixel);
		};
	};

	Ok(buffer)
}


#[test]
fn expand_replicates_bits() {
	assert_eq!(expand5(0), 0);
	assert_eq!(expand5(0b11111), 255);
	assert_eq!(expand6(0), 0);
	assert_eq!(expand6(0b111111), 255);

	for v in 0u8..32 {
		assert_eq!(expand5(v), (v << 3) | (v >> 2));
		assert_eq!(expand5(v) >> 3, v);
	};

	for v in 0u8..64 {
		assert_eq!(expand6(v), (v << 2) | (v >> 4));
		assert_eq!(expand6(v) >> 2, v);
	};
}


#[test]
fn block_order_is_a_permutation() {
	let mut seen = [false; 16];

	for &p in BLOCK_ORDER.iter() {
		assert!(!seen[p]);
		seen[p] = true;
	};

	assert!(seen.iter().all(|s| *s));
}


#[test]
fn block_order_is_in_block_morton() {
	for (i, &p) in BLOCK_ORDER.iter().enumerate() {
		let (x, y) = (i % 4, i / 4);
		let morton = (y & 1) | ((x & 1) << 1) | ((y & 2) << 1) | ((x & 2) << 2);
		assert_eq!(p, morton);
	};
}


#[test]
fn bc1_table_ignores_endpoint_order() {
	let white = 0xFFFF;
	let red = 0xF800;

	for (c0, c1) in [(white, red), (red, white), (red, red)] {
		let table = color_table(c0, c1, true);
		let [b0, g0, r0] = unpack_565(c0);
		let [b1, g1, r1] = unpack_565(c1);

		assert_eq!(table[0], [b0, g0, r0, 0xFF]);
		assert_eq!(table[1], [b1, g1, r1, 0xFF]);
		assert_eq!(table[2][2], ((u16::from(r0) + u16::from(r1)) / 2) as u8);
		assert_eq!(table[3], [0, 0, 0, 0xFF]);
	};
}


#[test]
fn bc1_block_is_opaque() {
	// color0 < color1 would select the transparent mode in desktop BC1
	let mut block = [0u8; 8];
	LittleEndian::write_u16(&mut block[0..2], 0x001F);
	LittleEndian::write_u16(&mut block[2..4], 0xF800);
	LittleEndian::write_u32(&mut block[4..8], 0xFFFF_FFFF);

	let pixels = DxtVariant::Bc1.decode_block(&block).unwrap();
	assert!(pixels.iter().all(|p| *p == [0, 0, 0, 0xFF]));

	LittleEndian::write_u32(&mut block[4..8], 0xAAAA_AAAA);
	let pixels = DxtVariant::Bc1.decode_block(&block).unwrap();
	assert!(pixels.iter().all(|p| *p == [127, 0, 127, 0xFF]));
}


#[test]
fn bc2_alpha_nibbles() {
	let mut block = [0u8; 16];
	LittleEndian::write_u64(&mut block[0..8], 0xFEDC_BA98_7654_3210);

	let pixels = DxtVariant::Bc2.decode_block(&block).unwrap();

	for (i, pixel) in pixels.iter().enumerate() {
		let a = i as u8;
		assert_eq!(pixel[3], (a << 4) | a);
	};
}


#[test]
fn bc3_alpha_tables() {
	let table = bc3_alpha_table(255, 0);
	assert_eq!(table, [255, 0, 218, 182, 145, 109, 72, 36]);

	let table = bc3_alpha_table(0, 255);
	assert_eq!(table, [0, 255, 51, 102, 153, 204, 0, 255]);

	let mut block = [0u8; 16];
	block[0] = 255;
	block[1] = 0;
	// pixel 0: code 2, pixel 1: code 7
	LittleEndian::write_u48(&mut block[2..8], 0b111_010);

	let pixels = DxtVariant::Bc3.decode_block(&block).unwrap();
	assert_eq!(pixels[0][3], 218);
	assert_eq!(pixels[1][3], 36);
	assert_eq!(pixels[2][3], 255);
}


#[test]
fn short_block_is_eof() {
	assert!(matches!(DxtVariant::Bc3.decode_block(&[0u8; 8]), Err(UnexpectedEof)));
}
