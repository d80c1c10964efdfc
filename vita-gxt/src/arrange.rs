//! Conversion of GPU memory arrangements into row-major raster order.


use crate::{GxtResult, TextureType};
use crate::GxtError::*;
use crate::pixel::PixelBuffer;
use crate::macros;


/// Edge length of a tile in [`TextureType::TILED`] surfaces.
pub const TILE_SIZE: u32 = 32;


/// Rearrange `buffer` from the memory arrangement `kind` into raster order.
///
/// [`TextureType::SWIZZLED_ARBITRARY`] is decoded as
/// [`TextureType::SWIZZLED`]; this mapping is unconfirmed and logged as a
/// warning.
///
/// # Errors
/// - [`UnsupportedArrangement`]: No un-scrambler exists for `kind`.
pub fn unscramble(buffer: PixelBuffer, kind: TextureType) -> GxtResult<PixelBuffer> {
	let unscrambler = unscrambler(kind)?;

	if kind == TextureType::SWIZZLED_ARBITRARY {
		macros::log!(warn, "Treating arrangement {} as swizzled", kind);
	};

	Ok(match unscrambler {
		Some(f) => f(&buffer),
		None => buffer,
	})
}


/// Fail early for an arrangement that [`unscramble`] would reject, before
/// any texture data is decoded for it.
pub(crate) fn check(kind: TextureType) -> GxtResult<()> {
	unscrambler(kind).map(|_| ())
}


/// `None` for arrangements that are already in raster order.
fn unscrambler(kind: TextureType) -> GxtResult<Option<fn(&PixelBuffer) -> PixelBuffer>> {
	match kind {
		TextureType::LINEAR => Ok(None),
		TextureType::SWIZZLED | TextureType::CUBE | TextureType::SWIZZLED_ARBITRARY => Ok(Some(unswizzle)),
		TextureType::TILED => Ok(Some(untile)),
		kind => Err(UnsupportedArrangement(kind)),
	}
}


/// Gather the even bits of `x` into the low half.
///
/// # Example
/// ```
/// # use vita_gxt::arrange::compact_1by1;
/// assert_eq!(compact_1by1(0b0101), 0b11);
/// assert_eq!(compact_1by1(0b1010), 0b00);
/// ```
pub const fn compact_1by1(x: u32) -> u32 {
	let mut x = x & 0x5555_5555;
	x = (x ^ (x >> 1)) & 0x3333_3333;
	x = (x ^ (x >> 2)) & 0x0F0F_0F0F;
	x = (x ^ (x >> 4)) & 0x00FF_00FF;
	x = (x ^ (x >> 8)) & 0x0000_FFFF;
	x
}


/// Position of the `index`th stored pixel of a `width` x `height` Morton
/// surface, both dimensions being powers of two.
///
/// `y` takes the even bits and `x` the odd bits of the low
/// `2 * log2(min(width, height))` bits of `index`; the remaining high bits
/// extend the larger dimension.
///
/// # Example
/// ```
/// # use vita_gxt::arrange::morton_to_xy;
/// assert_eq!(morton_to_xy(1, 4, 4), (0, 1));
/// assert_eq!(morton_to_xy(2, 4, 4), (1, 0));
/// assert_eq!(morton_to_xy(5, 4, 2), (2, 1));
/// ```
pub const fn morton_to_xy(index: u32, width: u32, height: u32) -> (u32, u32) {
	let min = if width < height { width } else { height };
	let k = min.trailing_zeros();
	let mask = if 2 * k >= 32 { u32::MAX } else { (1u32 << (2 * k)) - 1 };
	let low = index & mask;
	let high = if 2 * k >= 32 { 0 } else { (index >> (2 * k)) << k };

	let x = compact_1by1(low >> 1);
	let y = compact_1by1(low);

	if width > height {
		(x | high, y)
	}
	else {
		(x, y | high)
	}
}


/// Convert a Morton-swizzled surface to raster order.  Both buffer
/// dimensions must be powers of two.
pub fn unswizzle(buffer: &PixelBuffer) -> PixelBuffer {
	let bpp = buffer.layout.bytes_per_pixel();
	let (width, height) = (buffer.width, buffer.height);
	let mut result = buffer.clone();

	for (index, pixel) in buffer.data.chunks_exact(bpp).enumerate() {
		#[allow(clippy::cast_possible_truncation)]
		let (x, y) = morton_to_xy(index as u32, width, height);

		if x < width && y < height {
			let offset = (y as usize * width as usize + x as usize) * bpp;
			result.data[offset..offset + bpp].copy_from_slice(pixel);
		};
	};

	result
}


/// Convert a tiled surface to raster order.
///
/// Tiles are [`TILE_SIZE`] pixels square (clamped to the surface size),
/// stored in raster tile order, each one Morton-swizzled internally.
pub fn untile(buffer: &PixelBuffer) -> PixelBuffer {
	let bpp = buffer.layout.bytes_per_pixel();
	let (width, height) = (buffer.width, buffer.height);
	let tile_w = TILE_SIZE.min(width).max(1);
	let tile_h = TILE_SIZE.min(height).max(1);
	let tile_area = (tile_w * tile_h) as usize;
	let tiles_per_row = (width / tile_w).max(1) as usize;
	let mut result = buffer.clone();

	for (index, pixel) in buffer.data.chunks_exact(bpp).enumerate() {
		let tile = index / tile_area;
		#[allow(clippy::cast_possible_truncation)]
		let (tx, ty) = morton_to_xy((index % tile_area) as u32, tile_w, tile_h);
		let x = (tile % tiles_per_row) as u32 * tile_w + tx;
		let y = (tile / tiles_per_row) as u32 * tile_h + ty;

		if x < width && y < height {
			let offset = (y as usize * width as usize + x as usize) * bpp;
			result.data[offset..offset + bpp].copy_from_slice(pixel);
		};
	};

	result
}


#[cfg(test)]
fn numbered(width: u32, height: u32) -> PixelBuffer {
	use crate::pixel::PixelLayout;

	let data = (0..width * height).flat_map(|i| i.to_le_bytes()).collect::<Vec<u8>>();
	PixelBuffer::from_data(width, height, PixelLayout::Bgra8888, data).unwrap()
}


#[cfg(test)]
fn assert_bijection(buffer: &PixelBuffer) {
	let mut seen = vec![false; buffer.pixel_count()];

	for pixel in buffer.data.chunks_exact(4) {
		let i = u32::from_le_bytes(pixel.try_into().unwrap()) as usize;
		assert!(!seen[i], "pixel {} appears twice", i);
		seen[i] = true;
	};

	assert!(seen.iter().all(|s| *s));
}


#[test]
fn linear_is_identity() {
	let buffer = numbered(8, 4);
	let result = unscramble(buffer.clone(), TextureType::LINEAR).unwrap();
	assert_eq!(result, buffer);
}


#[test]
fn unswizzle_is_bijection() {
	for (w, h) in [(1, 1), (4, 4), (8, 2), (2, 16), (64, 64), (128, 32)] {
		assert_bijection(&unswizzle(&numbered(w, h)));
	};
}


#[test]
fn untile_is_bijection() {
	for (w, h) in [(4, 4), (32, 32), (64, 32), (32, 128), (128, 64)] {
		assert_bijection(&untile(&numbered(w, h)));
	};
}


#[test]
fn unswizzle_square_order() {
	let result = unswizzle(&numbered(4, 4));
	let order = result.data.chunks_exact(4)
		.map(|p| u32::from_le_bytes(p.try_into().unwrap()))
		.collect::<Vec<u32>>();

	assert_eq!(order, vec![
		0, 2, 8, 10,
		1, 3, 9, 11,
		4, 6, 12, 14,
		5, 7, 13, 15,
	]);
}


#[test]
fn unswizzle_wide_extends_x() {
	// 4x2: two 2x2 Morton squares side by side
	let result = unswizzle(&numbered(4, 2));
	let order = result.data.chunks_exact(4)
		.map(|p| u32::from_le_bytes(p.try_into().unwrap()))
		.collect::<Vec<u32>>();

	assert_eq!(order, vec![0, 2, 4, 6, 1, 3, 5, 7]);
}


#[test]
fn untile_places_tiles_in_raster_order() {
	let result = untile(&numbered(64, 32));
	let at = |x: usize, y: usize| {
		let offset = (y * 64 + x) * 4;
		u32::from_le_bytes(result.data[offset..offset + 4].try_into().unwrap())
	};

	assert_eq!(at(0, 0), 0);
	assert_eq!(at(32, 0), 1024);
	assert_eq!(at(0, 1), 1);
	assert_eq!(at(33, 0), 1026);
}


#[test]
fn unsupported_arrangements() {
	for kind in [TextureType::LINEAR_STRIDED, TextureType::CUBE_ARBITRARY, TextureType(0x2000_0000)] {
		assert!(matches!(unscramble(numbered(4, 4), kind), Err(UnsupportedArrangement(k)) if k == kind));
		assert!(matches!(check(kind), Err(UnsupportedArrangement(k)) if k == kind));
	};

	for kind in [TextureType::LINEAR, TextureType::SWIZZLED, TextureType::TILED, TextureType::CUBE, TextureType::SWIZZLED_ARBITRARY] {
		assert!(check(kind).is_ok(), "{} rejected", kind);
	};
}


#[test]
fn cube_and_arbitrary_decode_as_swizzled() {
	for (w, h) in [(4, 4), (16, 8), (8, 32)] {
		let swizzled = unscramble(numbered(w, h), TextureType::SWIZZLED).unwrap();
		assert_eq!(unscramble(numbered(w, h), TextureType::CUBE).unwrap(), swizzled);
		assert_eq!(unscramble(numbered(w, h), TextureType::SWIZZLED_ARBITRARY).unwrap(), swizzled);
		assert_ne!(swizzled, numbered(w, h));
	};
}


#[test]
fn tiled_uses_untile() {
	let buffer = numbered(64, 32);
	assert_eq!(unscramble(buffer.clone(), TextureType::TILED).unwrap(), untile(&buffer));
}
