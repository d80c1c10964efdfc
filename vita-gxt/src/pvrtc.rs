//! PVRTC1 (PVRT2BPP / PVRT4BPP) decoding.
//!
//! Each 64-bit word holds 32 bits of modulation data followed by 32 bits of
//! colour data describing two low-resolution colours.  A pixel is a blend of
//! those colours, bilinearly upscaled from the 2x2 neighbourhood of words
//! around it, so decoding walks overlapping word quadrants rather than
//! independent blocks.  Words are stored Morton-twiddled.


use std::ops::{Add, Sub, Mul, AddAssign};

use byteorder::{ByteOrder, LittleEndian};
use surety::Ensure;

use crate::GxtResult;
use crate::GxtError::*;
use crate::macros;


/// Bits per pixel of a PVRTC1 surface
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PvrtcMode {
	/// 8x4 pixels per word.
	TwoBpp,
	/// 4x4 pixels per word.
	FourBpp,
}


impl PvrtcMode {
	/// Width of the pixel area covered by one word.
	pub const fn word_width(self) -> u32 {
		match self {
			PvrtcMode::TwoBpp => 8,
			PvrtcMode::FourBpp => 4,
		}
	}


	/// Height of the pixel area covered by one word.
	pub const fn word_height(self) -> u32 {
		4
	}


	/// Smallest surface the word grid can describe; smaller textures are
	/// decoded at this size and cropped.
	pub const fn min_dimensions(self) -> (u32, u32) {
		match self {
			PvrtcMode::TwoBpp => (16, 8),
			PvrtcMode::FourBpp => (8, 8),
		}
	}
}


#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct Color {
	r: i32,
	g: i32,
	b: i32,
	a: i32,
}


impl Add for Color {
	type Output = Self;
	fn add(self, o: Self) -> Self { Color { r: self.r + o.r, g: self.g + o.g, b: self.b + o.b, a: self.a + o.a } }
}


impl Sub for Color {
	type Output = Self;
	fn sub(self, o: Self) -> Self { Color { r: self.r - o.r, g: self.g - o.g, b: self.b - o.b, a: self.a - o.a } }
}


impl Mul<i32> for Color {
	type Output = Self;
	fn mul(self, k: i32) -> Self { Color { r: self.r * k, g: self.g * k, b: self.b * k, a: self.a * k } }
}


impl AddAssign for Color {
	fn add_assign(&mut self, o: Self) { *self = *self + o; }
}


#[derive(Debug, Clone, Copy)]
struct Word {
	modulation: u32,
	color: u32,
}


/// Colour A: RGB554 when opaque, ARGB3443 otherwise; 5-bit colour and
/// 4-bit alpha channels.
#[allow(clippy::cast_possible_wrap)]
fn color_a(data: u32) -> Color {
	if data & 0x8000 != 0 {
		Color {
			r: ((data & 0x7C00) >> 10) as i32,
			g: ((data & 0x3E0) >> 5) as i32,
			b: ((data & 0x1E) | ((data & 0x1E) >> 4)) as i32,
			a: 0xF,
		}
	}
	else {
		Color {
			r: (((data & 0xF00) >> 7) | ((data & 0xF00) >> 11)) as i32,
			g: (((data & 0xF0) >> 3) | ((data & 0xF0) >> 7)) as i32,
			b: (((data & 0xE) << 1) | ((data & 0xE) >> 2)) as i32,
			a: ((data & 0x7000) >> 11) as i32,
		}
	}
}


/// Colour B: RGB555 when opaque, ARGB3444 otherwise.
#[allow(clippy::cast_possible_wrap)]
fn color_b(data: u32) -> Color {
	if data & 0x8000_0000 != 0 {
		Color {
			r: ((data & 0x7C00_0000) >> 26) as i32,
			g: ((data & 0x03E0_0000) >> 21) as i32,
			b: ((data & 0x001F_0000) >> 16) as i32,
			a: 0xF,
		}
	}
	else {
		Color {
			r: (((data & 0x0F00_0000) >> 23) | ((data & 0x0F00_0000) >> 27)) as i32,
			g: (((data & 0x00F0_0000) >> 19) | ((data & 0x00F0_0000) >> 23)) as i32,
			b: (((data & 0x000F_0000) >> 15) | ((data & 0x000F_0000) >> 19)) as i32,
			a: ((data & 0x7000_0000) >> 27) as i32,
		}
	}
}


/// Bilinearly upscale one colour of the four words to a word-sized area
/// centred between them, scaled to 8 bits per channel.
#[allow(clippy::many_single_char_names, clippy::cast_possible_wrap)]
fn interpolate_colors(p: Color, q: Color, r: Color, s: Color, mode: PvrtcMode) -> [Color; 32] {
	let ww = mode.word_width() as usize;
	let wh = mode.word_height() as usize;
	let mut pixels = [Color::default(); 32];

	let q_minus_p = q - p;
	let s_minus_r = s - r;
	let mut hp = p * ww as i32;
	let mut hr = r * ww as i32;

	for x in 0..ww {
		let mut result = hp * 4;
		let dy = hr - hp;

		for y in 0..wh {
			pixels[y * ww + x] = match mode {
				PvrtcMode::TwoBpp => Color {
					r: (result.r >> 7) + (result.r >> 2),
					g: (result.g >> 7) + (result.g >> 2),
					b: (result.b >> 7) + (result.b >> 2),
					a: (result.a >> 5) + (result.a >> 1),
				},
				PvrtcMode::FourBpp => Color {
					r: (result.r >> 6) + (result.r >> 1),
					g: (result.g >> 6) + (result.g >> 1),
					b: (result.b >> 6) + (result.b >> 1),
					a: (result.a >> 4) + result.a,
				},
			};

			result += dy;
		};

		hp += q_minus_p;
		hr += s_minus_r;
	};

	pixels
}


type ModulationGrid = [[i32; 8]; 16];


/// Unpack one word's modulation data into the `[x][y]` grids at the given
/// offset.
fn unpack_modulations(word: Word, off_x: usize, off_y: usize, values: &mut ModulationGrid, modes: &mut ModulationGrid, mode: PvrtcMode) {
	let mut word_mode = (word.color & 0x1) as i32;
	let mut bits = word.modulation;

	match mode {
		PvrtcMode::TwoBpp if word_mode != 0 => {
			// Interpolated: bit 0 selects between H+V and a single direction,
			// in which case the centre texel's low bit picks H or V.
			if bits & 0x1 != 0 {
				word_mode = if bits & (0x1 << 20) != 0 { 3 } else { 2 };

				if bits & (0x1 << 21) != 0 {
					bits |= 0x1 << 20;
				}
				else {
					bits &= !(0x1 << 20);
				};
			};

			if bits & 0x2 != 0 {
				bits |= 0x1;
			}
			else {
				bits &= !0x1;
			};

			for y in 0..4 {
				for x in 0..8 {
					modes[x + off_x][y + off_y] = word_mode;

					if (x ^ y) & 1 == 0 {
						values[x + off_x][y + off_y] = (bits & 0x3) as i32;
						bits >>= 2;
					};
				};
			};
		},

		PvrtcMode::TwoBpp => {
			for y in 0..4 {
				for x in 0..8 {
					modes[x + off_x][y + off_y] = word_mode;
					values[x + off_x][y + off_y] = if bits & 1 != 0 { 0x3 } else { 0x0 };
					bits >>= 1;
				};
			};
		},

		PvrtcMode::FourBpp => {
			for y in 0..4 {
				for x in 0..4 {
					let code = (bits & 0x3) as i32;

					values[x + off_x][y + off_y] = if word_mode != 0 {
						// 14 = 4/8 with punch-through alpha
						[0, 4, 14, 8][code as usize]
					}
					else {
						[0, 3, 5, 8][code as usize]
					};

					bits >>= 2;
				};
			};
		},
	};
}


fn modulation_value(values: &ModulationGrid, modes: &ModulationGrid, x: usize, y: usize, mode: PvrtcMode) -> i32 {
	const REP_VALS: [i32; 4] = [0, 3, 5, 8];
	let rep = |x: usize, y: usize| REP_VALS[(values[x][y] & 0x3) as usize];

	match mode {
		PvrtcMode::FourBpp => values[x][y],

		PvrtcMode::TwoBpp => {
			if modes[x][y] == 0 || (x ^ y) & 1 == 0 {
				return rep(x, y);
			};

			match modes[x][y] {
				1 => (rep(x, y - 1) + rep(x, y + 1) + rep(x - 1, y) + rep(x + 1, y) + 2) / 4,
				2 => (rep(x - 1, y) + rep(x + 1, y) + 1) / 2,
				_ => (rep(x, y - 1) + rep(x, y + 1) + 1) / 2,
			}
		},
	}
}


/// Decode the word-sized area centred between words P (top left), Q (top
/// right), R (bottom left) and S (bottom right) to `[b, g, r, a]` pixels.
#[allow(clippy::many_single_char_names, clippy::cast_sign_loss, clippy::cast_possible_truncation)]
fn decode_quad(p: Word, q: Word, r: Word, s: Word, mode: PvrtcMode) -> [[u8; 4]; 32] {
	let ww = mode.word_width() as usize;
	let wh = mode.word_height() as usize;

	let mut values: ModulationGrid = [[0; 8]; 16];
	let mut modes: ModulationGrid = [[0; 8]; 16];
	unpack_modulations(p, 0, 0, &mut values, &mut modes, mode);
	unpack_modulations(q, ww, 0, &mut values, &mut modes, mode);
	unpack_modulations(r, 0, wh, &mut values, &mut modes, mode);
	unpack_modulations(s, ww, wh, &mut values, &mut modes, mode);

	let upscaled_a = interpolate_colors(color_a(p.color), color_a(q.color), color_a(r.color), color_a(s.color), mode);
	let upscaled_b = interpolate_colors(color_b(p.color), color_b(q.color), color_b(r.color), color_b(s.color), mode);

	let mut pixels = [[0u8; 4]; 32];

	for y in 0..wh {
		for x in 0..ww {
			let mut modulation = modulation_value(&values, &modes, x + ww / 2, y + wh / 2, mode);
			let punch_through = modulation > 10;

			if punch_through {
				modulation -= 10;
			};

			let a = upscaled_a[y * ww + x];
			let b = upscaled_b[y * ww + x];
			let blend = |ca: i32, cb: i32| ((ca * (8 - modulation) + cb * modulation) / 8).clamp(0, 255) as u8;

			let alpha = if punch_through { 0 } else { blend(a.a, b.a) };
			pixels[y * ww + x] = [blend(a.b, b.b), blend(a.g, b.g), blend(a.r, b.r), alpha];
		};
	};

	pixels
}


/// Morton index of word `(x, y)` in an `x_size` x `y_size` word grid, with
/// `y` in the lower bit of each pair.
///
/// # Example
/// ```
/// # use vita_gxt::pvrtc::twiddle_uv;
/// assert_eq!(twiddle_uv(4, 4, 0, 1), 1);
/// assert_eq!(twiddle_uv(4, 4, 1, 0), 2);
/// assert_eq!(twiddle_uv(4, 2, 2, 0), 4);
/// ```
pub const fn twiddle_uv(x_size: u32, y_size: u32, x: u32, y: u32) -> u32 {
	let (min_dimension, mut max_value) = if y_size < x_size { (y_size, x) } else { (x_size, y) };
	let mut twiddled = 0;
	let mut src_bit = 1;
	let mut dst_bit = 1;
	let mut shift = 0;

	while src_bit < min_dimension {
		if y & src_bit != 0 {
			twiddled |= dst_bit;
		};

		if x & src_bit != 0 {
			twiddled |= dst_bit << 1;
		};

		src_bit <<= 1;
		dst_bit <<= 2;
		shift += 1;
	};

	max_value >>= shift;
	twiddled | (max_value << (2 * shift))
}


/// Decode a `width` x `height` PVRTC1 surface (dimensions must be powers of
/// two) into [`PixelLayout::Bgra8888`][crate::PixelLayout::Bgra8888] bytes.
///
/// # Errors
/// - [`UnexpectedEof`]: `data` holds fewer words than the surface needs.
/// - [`ArithmeticOverflow`]: Surface size overflows a [`usize`].
#[allow(clippy::cast_possible_wrap, clippy::cast_sign_loss)]
pub fn decompress(data: &[u8], width: u32, height: u32, mode: PvrtcMode) -> GxtResult<Vec<u8>> {
	let (min_w, min_h) = mode.min_dimensions();
	let true_w = width.max(min_w);
	let true_h = height.max(min_h);
	let ww = mode.word_width();
	let wh = mode.word_height();
	let words_x = true_w / ww;
	let words_y = true_h / wh;

	let word_count = (words_x as usize).checked() * words_y as usize;
	let needed = (word_count * 8).ok_or(ArithmeticOverflow)?;

	if data.len() < needed {
		return Err(UnexpectedEof);
	};

	macros::log!(trace, "PVRTC {:?}: {} x {} words for {}x{}", mode, words_x, words_y, width, height);

	let read_word = |x: u32, y: u32| {
		let offset = twiddle_uv(words_x, words_y, x, y) as usize * 8;
		Word {
			modulation: LittleEndian::read_u32(&data[offset..offset + 4]),
			color: LittleEndian::read_u32(&data[offset + 4..offset + 8]),
		}
	};

	let wrap = |size: u32, v: i64| (v.rem_euclid(i64::from(size))) as u32;
	let out_len = (true_w as usize).checked() * true_h as usize * 4;
	let mut out = vec![0u8; out_len.ok_or(ArithmeticOverflow)?];
	let row = true_w as usize * 4;
	let (ww, wh) = (ww as usize, wh as usize);

	for word_y in -1..i64::from(words_y) - 1 {
		for word_x in -1..i64::from(words_x) - 1 {
			let (x0, y0) = (wrap(words_x, word_x), wrap(words_y, word_y));
			let (x1, y1) = (wrap(words_x, word_x + 1), wrap(words_y, word_y + 1));

			let pixels = decode_quad(read_word(x0, y0), read_word(x1, y0), read_word(x0, y1), read_word(x1, y1), mode);
			let (x0, y0, x1, y1) = (x0 as usize, y0 as usize, x1 as usize, y1 as usize);

			let mut put = |px: usize, py: usize, pixel: [u8; 4]| {
				let offset = py * row + px * 4;
				out[offset..offset + 4].copy_from_slice(&pixel);
			};

			for y in 0..wh / 2 {
				for x in 0..ww / 2 {
					put(x0 * ww + x + ww / 2, y0 * wh + y + wh / 2, pixels[y * ww + x]);
					put(x1 * ww + x, y0 * wh + y + wh / 2, pixels[y * ww + x + ww / 2]);
					put(x0 * ww + x + ww / 2, y1 * wh + y, pixels[(y + wh / 2) * ww + x]);
					put(x1 * ww + x, y1 * wh + y, pixels[(y + wh / 2) * ww + x + ww / 2]);
				};
			};
		};
	};

	if true_w == width && true_h == height {
		return Ok(out);
	};

	let mut cropped = Vec::with_capacity(width as usize * height as usize * 4);

	for y in 0..height as usize {
		cropped.extend_from_slice(&out[y * row..y * row + width as usize * 4]);
	};

	Ok(cropped)
}


#[cfg(test)]
fn solid(words: usize, modulation: u32, color: u32) -> Vec<u8> {
	let mut data = vec![0u8; words * 8];

	for word in data.chunks_exact_mut(8) {
		LittleEndian::write_u32(&mut word[0..4], modulation);
		LittleEndian::write_u32(&mut word[4..8], color);
	};

	data
}


#[test]
fn twiddle_matches_morton() {
	use crate::arrange::morton_to_xy;

	for (w, h) in [(4, 4), (8, 2), (2, 8)] {
		for i in 0..w * h {
			let (x, y) = morton_to_xy(i, w, h);
			assert_eq!(twiddle_uv(w, h, x, y), i);
		};
	};
}


#[test]
fn solid_white_both_modes() {
	// opaque white in both colours, modulation 0
	let color = 0xFFFF_FFFE;

	let out = decompress(&solid(4, 0, color), 8, 8, PvrtcMode::FourBpp).unwrap();
	assert_eq!(out.len(), 8 * 8 * 4);
	assert!(out.iter().all(|b| *b == 0xFF));

	let out = decompress(&solid(4, 0, color), 16, 8, PvrtcMode::TwoBpp).unwrap();
	assert_eq!(out.len(), 16 * 8 * 4);
	assert!(out.iter().all(|b| *b == 0xFF));
}


#[test]
fn modulation_selects_color() {
	// colour A opaque black, colour B opaque white
	let color = 0xFFFF_8000;

	let out = decompress(&solid(4, 0, color), 8, 8, PvrtcMode::FourBpp).unwrap();
	assert!(out.chunks_exact(4).all(|p| p == [0, 0, 0, 0xFF]));

	let out = decompress(&solid(4, 0xFFFF_FFFF, color), 8, 8, PvrtcMode::FourBpp).unwrap();
	assert!(out.chunks_exact(4).all(|p| p == [0xFF, 0xFF, 0xFF, 0xFF]));

	let out = decompress(&solid(4, 0xFFFF_FFFF, color), 16, 8, PvrtcMode::TwoBpp).unwrap();
	assert!(out.chunks_exact(4).all(|p| p == [0xFF, 0xFF, 0xFF, 0xFF]));
}


#[test]
fn punch_through_alpha() {
	let out = decompress(&solid(4, 0xAAAA_AAAA, 0xFFFF_8001), 8, 8, PvrtcMode::FourBpp).unwrap();
	assert!(out.chunks_exact(4).all(|p| p == [0x7F, 0x7F, 0x7F, 0x00]));
}


#[test]
fn small_surface_is_cropped() {
	let out = decompress(&solid(4, 0, 0xFFFF_FFFE), 4, 4, PvrtcMode::FourBpp).unwrap();
	assert_eq!(out.len(), 4 * 4 * 4);

	assert!(matches!(decompress(&solid(3, 0, 0), 8, 8, PvrtcMode::FourBpp), Err(UnexpectedEof)));
}
