use std::io::{Read, Seek, SeekFrom};

use image::RgbaImage;
use surety::Ensure;

use crate::{GxtResult, ReadExt, TextureInfo, TextureFormat, ChannelOrder, Palettes};
use crate::GxtError::*;
use crate::arrange;
use crate::pixel::{PixelBuffer, PixelLayout};
use crate::registry;
use crate::macros;


/// A decoded texture
///
/// Keeps the cropped pixels as they were before palette resolution, so the
/// texture can be [rendered][Self::render] again with a different palette.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GxtTexture {
	/// The texture info record this texture was decoded from.
	pub info: TextureInfo,
	/// Raster-order pixels at native size, palette indices not yet resolved.
	pub pixels: PixelBuffer,
	palette_order: Option<ChannelOrder>,
	image: RgbaImage,
}


impl GxtTexture {
	/// Decode the texture described by `info`.
	///
	/// Runs the whole pipeline: read the data region, decode through the
	/// format registry, un-scramble the memory arrangement (PVRTC excepted),
	/// resolve the palette and crop to native dimensions.
	///
	/// # Errors
	/// - [`FormatNotImplemented`]: The format has no registered decoder.
	/// - [`UnsupportedArrangement`]: The memory arrangement cannot be un-scrambled.
	/// - [`PaletteNotImplemented`]: A palette is set on a non-indexed texture.
	/// - [`PaletteIndexOutOfRange`]: The palette index has no table.
	/// - [`PaletteRequired`]: An indexed texture has no palette.
	/// - [`UnexpectedEof`]: The data region is truncated or too short for the format.
	/// - [`ArithmeticOverflow`]: Data region or surface size overflow.
	pub(crate) fn read_from<R: Read + Seek>(input: &mut R, info: TextureInfo, palettes: &Palettes, stream_len: u64) -> GxtResult<Self> {
		let format = info.format();
		let base = info.base_format();
		let entry = registry::lookup(format)?;

		if !base.is_pvrtc() {
			arrange::check(info.texture_type())?;
		};

		macros::log!(trace, "Texture {}x{} {} {} at 0x{:X}, {} bytes",
			info.width(), info.height(), format, info.texture_type(), info.raw.data_offset, info.raw.data_size);

		let end = (u64::from(info.raw.data_offset).checked() + u64::from(info.raw.data_size))
			.ok_or(ArithmeticOverflow)?;

		if end > stream_len {
			return Err(UnexpectedEof);
		};

		let _ = input.seek(SeekFrom::Start(info.raw.data_offset.into()))?;
		let data = input.read_exact_buffered(info.raw.data_size.try_into()?)?;

		let decoded = (entry.decode)(&data, &info)?;
		debug_assert_eq!(decoded.layout, entry.layout);

		let arranged = if base.is_pvrtc() {
			decoded
		}
		else {
			arrange::unscramble(decoded, info.texture_type())?
		};

		let palette = palettes.fetch(base, info.palette_index())?;
		let pixels = arranged.crop(info.width(), info.height())?;
		let image = resolve(&pixels, format, entry.palette_order, palette)?;

		Ok(Self { info, pixels, palette_order: entry.palette_order, image })
	}


	/// Texture format.
	pub fn format(&self) -> TextureFormat {
		self.info.format()
	}


	/// The decoded image, with the texture's own palette applied.
	pub fn image(&self) -> &RgbaImage {
		&self.image
	}


	/// Consume the texture, returning the decoded image.
	pub fn into_image(self) -> RgbaImage {
		self.image
	}


	/// Produce the image again, resolving palette indices through
	/// `palette` instead of the texture's own palette.
	///
	/// # Errors
	/// - [`PaletteRequired`]: `palette` is `None` for an indexed texture.
	/// - [`PaletteNotImplemented`]: `palette` is given for a non-indexed texture.
	pub fn render(&self, palette: Option<&[u32]>) -> GxtResult<RgbaImage> {
		resolve(&self.pixels, self.format(), self.palette_order, palette)
	}
}


fn resolve(pixels: &PixelBuffer, format: TextureFormat, order: Option<ChannelOrder>, palette: Option<&[u32]>) -> GxtResult<RgbaImage> {
	let data = match (pixels.layout, order, palette) {
		(PixelLayout::Bgra8888, _, None) => pixels.data
			.chunks_exact(4)
			.flat_map(|p| [p[2], p[1], p[0], p[3]])
			.collect::<Vec<u8>>(),

		(PixelLayout::Indexed8, Some(order), Some(palette)) => pixels.data
			.iter()
			.flat_map(|i| order.to_rgba(palette.get(usize::from(*i)).copied().unwrap_or(0)))
			.collect::<Vec<u8>>(),

		(PixelLayout::Indexed8, _, None) => return Err(PaletteRequired(format)),
		(_, _, Some(_)) => return Err(PaletteNotImplemented(format.base())),
	};

	RgbaImage::from_raw(pixels.width, pixels.height, data).ok_or(UnexpectedEof)
}


#[test]
fn resolve_indexed() {
	let pixels = PixelBuffer::from_data(2, 1, PixelLayout::Indexed8, vec![1, 0]).unwrap();
	let palette = [0xFF10_2030, 0x8000_00FF];

	let image = resolve(&pixels, TextureFormat::P4_ABGR, Some(ChannelOrder::Abgr), Some(&palette)).unwrap();
	assert_eq!(image.as_raw(), &vec![0xFF, 0x00, 0x00, 0x80, 0x30, 0x20, 0x10, 0xFF]);

	let image = resolve(&pixels, TextureFormat(0x9400_1000), Some(ChannelOrder::Argb), Some(&palette)).unwrap();
	assert_eq!(image.get_pixel(1, 0).0, [0x10, 0x20, 0x30, 0xFF]);

	assert!(matches!(resolve(&pixels, TextureFormat::P4_ABGR, Some(ChannelOrder::Abgr), None),
		Err(PaletteRequired(TextureFormat::P4_ABGR))));
}


#[test]
fn resolve_direct() {
	let pixels = PixelBuffer::from_data(1, 1, PixelLayout::Bgra8888, vec![1, 2, 3, 4]).unwrap();

	let image = resolve(&pixels, TextureFormat::UBC1_ABGR, None, None).unwrap();
	assert_eq!(image.as_raw(), &vec![3, 2, 1, 4]);

	assert!(matches!(resolve(&pixels, TextureFormat::UBC1_ABGR, None, Some(&[0; 16])),
		Err(PaletteNotImplemented(crate::BaseFormat::UBC1))));
}
