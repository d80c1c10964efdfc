#![warn(missing_docs, unreachable_pub, clippy::all)]
#![allow(clippy::wildcard_imports, clippy::enum_glob_use)]
#![warn(clippy::missing_errors_doc, clippy::missing_panics_doc)]
#![allow(clippy::must_use_candidate)]


#![doc = include_str!("../../README.md")]


mod macros;
mod format;
mod header;
mod texinfo;
mod palette;
mod pixel;
mod registry;
mod texture;
mod buv;
pub mod arrange;
pub mod dxt;
pub mod pvrtc;

pub use format::*;
pub use header::*;
pub use texinfo::*;
pub use palette::*;
pub use pixel::{PixelBuffer, PixelLayout};
pub use registry::{is_supported, supported_formats};
pub use texture::*;
pub use buv::*;


use std::io::{Read, Seek, SeekFrom, Cursor};

use derive_more::{Display, Error};
use image::RgbaImage;
#[cfg(test)] use static_assertions::assert_impl_all;

use GxtError::*;

/// [`std::result::Result`] parameterized with [`GxtError`]
pub type GxtResult<T> = Result<T, GxtError>;


/// `vita_gxt`'s [`std::error::Error`]
#[derive(Debug, Display, Error, Clone)]
#[non_exhaustive]
pub enum GxtError {
	/// A function that reads from [`std::io::Read`] encountered early EOF.
	#[display(fmt = "Unexpected end of input file")]
	UnexpectedEof,

	/// Unexpected I/O error that is not UnexpectedEof.
	#[display(fmt = "Unexpected I/O error: {}", _0)]
	UnexpectedIoError(#[error(ignore)] std::io::ErrorKind),

	/// Unexpected integer conversion error.
	#[display(fmt = "Unexpected integer conversion error: {}", _0)]
	UnexpectedTryFromIntError(std::num::TryFromIntError),

	/// The archive does not start with [`GxtHeader::MAGIC`].
	#[display(fmt = "Unknown magic: {:02x?}", _0)]
	UnknownMagic(#[error(ignore)] [u8; 4]),

	/// The header version is not a known [`Revision`].
	#[display(fmt = "Unsupported GXT version: 0x{:08X}", _0)]
	UnsupportedRevision(#[error(ignore)] u32),

	/// No decoder is registered for this texture format.
	#[display(fmt = "Texture format not implemented: {}", _0)]
	FormatNotImplemented(#[error(ignore)] TextureFormat),

	/// No un-scrambler exists for this memory arrangement.
	#[display(fmt = "Texture type not implemented: {}", _0)]
	UnsupportedArrangement(#[error(ignore)] TextureType),

	/// A palette was requested for a base format that is not indexed.
	#[display(fmt = "Palette not implemented for base format {}", _0)]
	PaletteNotImplemented(#[error(ignore)] BaseFormat),

	/// An indexed texture has no palette to resolve its indices through.
	#[display(fmt = "Texture format {} requires a palette", _0)]
	PaletteRequired(#[error(ignore)] TextureFormat),

	/// The palette index does not name a table of the archive.  Enum
	/// members are the base format and the index.
	#[error(ignore)]
	#[display(fmt = "No {} palette with index {}", _0, _1)]
	PaletteIndexOutOfRange(BaseFormat, i32),

	/// The archive has an atlas table but no texture to cut it from.
	#[display(fmt = "Atlas table present, but the archive has no textures")]
	MissingAtlasBase,

	/// Atlas entry with this index reaches outside the base texture.
	#[display(fmt = "Atlas entry {} lies outside the base texture", _0)]
	AtlasRegionOutOfBounds(#[error(ignore)] usize),

	/// A checked arithmetic operation triggered an unexpected under/overflow.
	#[display(fmt = "A checked arithmetic operation triggered an unexpected under/overflow")]
	ArithmeticOverflow,

	/// A fixed-size record could not be parsed.
	#[display(fmt = "Could not parse a fixed-size record")]
	DescriptorReadError,

	/// Attempted to read a packed pixel from invalid data.
	#[doc(hidden)]
	#[display(fmt = "Attempted to read a packed pixel from invalid data")]
	PixelReadError,
}


impl From<std::io::Error> for GxtError {
	fn from(error: std::io::Error) -> Self {
		match error.kind() {
			std::io::ErrorKind::UnexpectedEof => UnexpectedEof,
			kind => UnexpectedIoError(kind),
		}
	}
}


impl From<std::num::TryFromIntError> for GxtError {
	fn from(error: std::num::TryFromIntError) -> Self {
		UnexpectedTryFromIntError(error)
	}
}


/// The table part of a GXT archive: header, texture info records and atlas
/// table, without any texture data decoded
///
/// Reading a directory succeeds for archives whose formats or arrangements
/// are not supported, which makes it suitable for inspection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GxtDirectory {
	#[allow(missing_docs)]
	pub header: GxtHeader,
	/// Revision selected by [`GxtHeader::version`].
	pub revision: Revision,
	/// One record per texture, in archive order.
	pub infos: Vec<TextureInfo>,
	/// Atlas table following the records, if present.
	pub atlas: Option<BuvChunk>,
	/// Total length of the archive stream.
	pub stream_len: u64,
}


impl GxtDirectory {
	/// Read the archive tables.  The archive must start at the beginning
	/// of `input`; all offsets in it are absolute.
	///
	/// # Errors
	/// - [`UnexpectedEof`]: Unexpected end of file.
	/// - [`UnexpectedIoError`]: Unexpected read error.
	/// - [`UnknownMagic`]: The archive does not start with [`GxtHeader::MAGIC`].
	/// - [`UnsupportedRevision`]: The header version is not a known [`Revision`].
	pub fn read_from<R: Read + Seek>(input: &mut R) -> GxtResult<Self> {
		let stream_len = input.seek(SeekFrom::End(0))?;
		let _ = input.seek(SeekFrom::Start(0))?;

		let (header, revision) = GxtHeader::read_from(input)?;

		let infos = (0..header.num_textures)
			.map(|_| TextureInfo::read_from(input, revision))
			.collect::<GxtResult<Vec<_>>>()?;

		let atlas = BuvChunk::read_from(input, stream_len)?;

		Ok(Self { header, revision, infos, atlas, stream_len })
	}
}


/// A fully decoded GXT archive
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GxtArchive {
	/// Archive tables.
	pub directory: GxtDirectory,
	/// Palette tables from the end of the archive.
	pub palettes: Palettes,
	/// One texture per [`TextureInfo`], in archive order.
	pub textures: Vec<GxtTexture>,
	/// One image per atlas entry, cut from the first texture.
	pub atlas_images: Vec<RgbaImage>,
}


impl GxtArchive {
	/// Read and decode a whole archive.
	///
	/// Decoding stops at the first texture that fails; textures decoded
	/// before it are discarded along with the archive.
	///
	/// # Errors
	/// - [`UnexpectedEof`]: Unexpected end of file, or a texture's data is
	///   shorter than its format requires.
	/// - [`UnexpectedIoError`]: Unexpected read error.
	/// - [`UnknownMagic`]: The archive does not start with [`GxtHeader::MAGIC`].
	/// - [`UnsupportedRevision`]: The header version is not a known [`Revision`].
	/// - [`FormatNotImplemented`]: A texture format has no registered decoder.
	/// - [`UnsupportedArrangement`]: A memory arrangement cannot be un-scrambled.
	/// - [`PaletteNotImplemented`]: A palette is set on a non-indexed texture.
	/// - [`PaletteIndexOutOfRange`]: A palette index has no table.
	/// - [`PaletteRequired`]: An indexed texture has no palette.
	/// - [`MissingAtlasBase`]: The archive has an atlas table but no textures.
	/// - [`AtlasRegionOutOfBounds`]: An atlas entry reaches outside the first texture.
	/// - [`ArithmeticOverflow`]: Texture data region or surface sizes overflow.
	pub fn read_from<R: Read + Seek>(input: &mut R) -> GxtResult<Self> {
		let directory = GxtDirectory::read_from(input)?;
		let palettes = Palettes::read_from(input, &directory.header)?;

		let textures = directory.infos
			.iter()
			.map(|info| GxtTexture::read_from(input, *info, &palettes, directory.stream_len))
			.collect::<GxtResult<Vec<_>>>()?;

		let atlas_images = match &directory.atlas {
			Some(atlas) => {
				let base = textures.first().ok_or(MissingAtlasBase)?;
				atlas.extract(base, &palettes)?
			},
			None => vec![],
		};

		Ok(Self { directory, palettes, textures, atlas_images })
	}


	/// Same as [`read_from`][Self::read_from], reading from a byte slice.
	///
	/// # Errors
	/// See [`read_from`][Self::read_from].
	pub fn from_bytes(data: &[u8]) -> GxtResult<Self> {
		Self::read_from(&mut Cursor::new(data))
	}


	/// Look up the palette `info` refers to, `None` if it has none.
	///
	/// # Errors
	/// - [`PaletteNotImplemented`]: `info` sets a palette on a non-indexed format.
	/// - [`PaletteIndexOutOfRange`]: The archive has no such palette.
	pub fn palette_for(&self, info: &TextureInfo) -> GxtResult<Option<&[u32]>> {
		self.palettes.fetch(info.base_format(), info.palette_index())
	}


	/// Iterate over the decoded texture images.
	pub fn images(&self) -> impl Iterator<Item = &RgbaImage> {
		self.textures.iter().map(GxtTexture::image)
	}
}


trait ReadExt: Read {
	const SINGLE_READ_SIZE: usize = 64;
	const MAX_PREALLOCATION: usize = 1 << 20;

	/// Read exactly `len` bytes without trusting `len` for allocation.
	fn read_exact_buffered(&mut self, len: usize) -> GxtResult<Vec<u8>> {
		let mut data: Vec<u8> = Vec::with_capacity(len.min(Self::MAX_PREALLOCATION));
		let mut buf = vec![0u8; Self::SINGLE_READ_SIZE];
		let mut total = 0usize;

		loop {
			if total == len {
				break;
			};

			let bufsize = std::cmp::min(Self::SINGLE_READ_SIZE, len - total);
			self.read_exact(&mut buf[..bufsize])?;
			data.extend(&buf[..bufsize]);
			total += bufsize;
		};

		Ok(data)
	}
}


impl<T> ReadExt for T where T: Read { }


#[test]
fn test_read_exact_buffered() {
	let mut input = Cursor::new(vec![0x41u8, 0x42, 0x43, 0x44, 0x45, 0x46]);
	assert_eq!(input.read_exact_buffered(1).unwrap(), vec![0x41u8]);
	assert_eq!(input.read_exact_buffered(2).unwrap(), vec![0x42u8, 0x43]);
	assert_eq!(input.read_exact_buffered(3).unwrap(), vec![0x44u8, 0x45, 0x46]);
	assert!(matches!(input.read_exact_buffered(1), Err(UnexpectedEof)));

	let mut input = Cursor::new(vec![0u8; 200]);
	assert_eq!(input.read_exact_buffered(150).unwrap().len(), 150);
	assert!(matches!(input.read_exact_buffered(usize::MAX), Err(UnexpectedEof)));
}


#[test]
fn error_display() {
	assert_eq!(UnsupportedRevision(0x1000_0004).to_string(), "Unsupported GXT version: 0x10000004");
	assert_eq!(FormatNotImplemented(TextureFormat::PVRTII4BPP_ABGR).to_string(),
		"Texture format not implemented: PVRTII4BPP_ABGR (0x83000000)");
	assert_eq!(UnsupportedArrangement(TextureType::LINEAR_STRIDED).to_string(),
		"Texture type not implemented: LinearStrided");
	assert_eq!(PaletteIndexOutOfRange(BaseFormat::P8, 3).to_string(), "No P8 palette with index 3");
}


#[test]
fn assert_traits() {
	use std::fmt::{Debug, Display};
	use std::error::Error;
	use std::panic::{UnwindSafe, RefUnwindSafe};

	assert_impl_all!(GxtError: Debug, Display, Error, Send, Sync, UnwindSafe, RefUnwindSafe);
	assert_impl_all!(GxtArchive: Debug, Clone, Send, Sync);
}
