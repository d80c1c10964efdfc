use std::io::Read;

use deku::prelude::*;
use static_assertions::const_assert_eq;

use crate::{GxtResult, ReadExt, Revision, TextureFormat, TextureType, BaseFormat};
use crate::GxtError::*;


/// A 32-byte texture info record, as stored
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq, DekuRead)]
#[deku(endian = "little")]
pub struct RawTextureInfo {
	/// Offset of the texture data from the start of the archive.
	pub data_offset: u32,
	/// Size of the texture data in bytes.
	pub data_size: u32,
	/// Palette table index, `-1` if the texture has no palette.
	pub palette_index: i32,
	/// Unknown flags.
	pub flags: u32,
	/// Revision-dependent encoding of type, format and dimensions.
	pub control_words: [u32; 4],
}


const_assert_eq!(std::mem::size_of::<RawTextureInfo>(), RawTextureInfo::SIZE);


impl RawTextureInfo {
	/// Size of the record in bytes.
	pub const SIZE: usize = 32;
}


/// Field accessors over the control words of one revision
struct ControlWordLayout {
	texture_type: fn(&[u32; 4]) -> TextureType,
	format: fn(&[u32; 4]) -> TextureFormat,
	width: fn(&[u32; 4]) -> u16,
	height: fn(&[u32; 4]) -> u16,
}


impl std::fmt::Debug for ControlWordLayout {
	fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
		f.write_str("ControlWordLayout")
	}
}


#[allow(clippy::cast_possible_truncation)]
mod rev3 {
	use crate::{TextureFormat, TextureType};

	pub(super) fn texture_type(cw: &[u32; 4]) -> TextureType { TextureType(cw[0]) }
	pub(super) fn format(cw: &[u32; 4]) -> TextureFormat { TextureFormat(cw[1]) }
	pub(super) fn width(cw: &[u32; 4]) -> u16 { (cw[2] & 0xFFFF) as u16 }
	pub(super) fn height(cw: &[u32; 4]) -> u16 { (cw[2] >> 16) as u16 }
}


// Only the compressed formats can be expressed: the format nibble is placed
// over base 0x80000000, and dimensions are log2-encoded.
mod rev2 {
	use crate::{TextureFormat, TextureType};

	pub(super) fn texture_type(cw: &[u32; 4]) -> TextureType { TextureType(cw[2]) }
	pub(super) fn format(cw: &[u32; 4]) -> TextureFormat { TextureFormat(0x8000_0000 | (((cw[1] >> 24) & 0xF) << 24)) }
	pub(super) fn width(cw: &[u32; 4]) -> u16 { 1 << ((cw[1] >> 16) & 0xF) }
	pub(super) fn height(cw: &[u32; 4]) -> u16 { 1 << (cw[1] & 0xF) }
}


// No Rev1 archives have been seen; assumed to match Rev2.
mod rev1 {
	use crate::{TextureFormat, TextureType};

	pub(super) fn texture_type(cw: &[u32; 4]) -> TextureType { TextureType(cw[2]) }
	pub(super) fn format(cw: &[u32; 4]) -> TextureFormat { TextureFormat(0x8000_0000 | (((cw[1] >> 24) & 0xF) << 24)) }
	pub(super) fn width(cw: &[u32; 4]) -> u16 { 1 << ((cw[1] >> 16) & 0xF) }
	pub(super) fn height(cw: &[u32; 4]) -> u16 { 1 << (cw[1] & 0xF) }
}


static REV1_LAYOUT: ControlWordLayout = ControlWordLayout {
	texture_type: rev1::texture_type,
	format: rev1::format,
	width: rev1::width,
	height: rev1::height,
};


static REV2_LAYOUT: ControlWordLayout = ControlWordLayout {
	texture_type: rev2::texture_type,
	format: rev2::format,
	width: rev2::width,
	height: rev2::height,
};


static REV3_LAYOUT: ControlWordLayout = ControlWordLayout {
	texture_type: rev3::texture_type,
	format: rev3::format,
	width: rev3::width,
	height: rev3::height,
};


impl Revision {
	fn layout(self) -> &'static ControlWordLayout {
		match self {
			Revision::Rev1 => &REV1_LAYOUT,
			Revision::Rev2 => &REV2_LAYOUT,
			Revision::Rev3 => &REV3_LAYOUT,
		}
	}
}


/// A texture info record bound to the [`Revision`] of its archive
#[derive(Debug, Clone, Copy)]
pub struct TextureInfo {
	/// The record as stored.
	pub raw: RawTextureInfo,
	/// The revision whose layout interprets [`raw`][Self::raw].
	pub revision: Revision,
	layout: &'static ControlWordLayout,
}


impl PartialEq for TextureInfo {
	fn eq(&self, other: &Self) -> bool {
		self.raw == other.raw && self.revision == other.revision
	}
}


impl Eq for TextureInfo {}


impl TextureInfo {
	/// Bind a raw record to `revision`.
	pub fn new(raw: RawTextureInfo, revision: Revision) -> Self {
		Self { raw, revision, layout: revision.layout() }
	}


	/// Read a single record.
	///
	/// # Errors
	/// - [`UnexpectedEof`]: Unexpected end of file.
	/// - [`UnexpectedIoError`]: Unexpected read error.
	pub fn read_from<R: Read>(input: &mut R, revision: Revision) -> GxtResult<Self> {
		let buf = input.read_exact_buffered(RawTextureInfo::SIZE)?;
		let (_, raw) = RawTextureInfo::from_bytes((&buf, 0))
			.map_err(|_| DescriptorReadError)?;
		Ok(Self::new(raw, revision))
	}


	/// Memory arrangement of the texture data.
	pub fn texture_type(&self) -> TextureType {
		(self.layout.texture_type)(&self.raw.control_words)
	}


	/// Full format code.
	pub fn format(&self) -> TextureFormat {
		(self.layout.format)(&self.raw.control_words)
	}


	/// Base format, without swizzle.
	pub fn base_format(&self) -> BaseFormat {
		self.format().base()
	}


	/// Width in pixels.
	pub fn width(&self) -> u32 {
		(self.layout.width)(&self.raw.control_words).into()
	}


	/// Height in pixels.
	pub fn height(&self) -> u32 {
		(self.layout.height)(&self.raw.control_words).into()
	}


	/// Width rounded up to a power of two.
	pub fn width_rounded(&self) -> u32 {
		self.width().next_power_of_two()
	}


	/// Height rounded up to a power of two.
	pub fn height_rounded(&self) -> u32 {
		self.height().next_power_of_two()
	}


	/// Palette table index, `-1` for none.
	pub fn palette_index(&self) -> i32 {
		self.raw.palette_index
	}


	/// Dimensions of the stored surface: native for linear textures,
	/// rounded up to powers of two for every other arrangement.
	pub fn storage_dimensions(&self) -> (u32, u32) {
		if self.texture_type() == TextureType::LINEAR {
			(self.width(), self.height())
		}
		else {
			(self.width_rounded(), self.height_rounded())
		}
	}
}


#[cfg(test)]
fn info_with(revision: Revision, control_words: [u32; 4]) -> TextureInfo {
	TextureInfo::new(RawTextureInfo { control_words, ..RawTextureInfo::default() }, revision)
}


#[test]
fn rev3_layout() {
	let info = info_with(Revision::Rev3, [0x6000_0000, 0x8500_0000, (48 << 16) | 100, 0]);
	assert_eq!(info.texture_type(), TextureType::LINEAR);
	assert_eq!(info.format(), TextureFormat::UBC1_ABGR);
	assert_eq!(info.width(), 100);
	assert_eq!(info.height(), 48);
	assert_eq!(info.width_rounded(), 128);
	assert_eq!(info.height_rounded(), 64);
}


#[test]
fn rev2_layout() {
	let info = info_with(Revision::Rev2, [0, 0x0107_0005, 0x8000_0000, 0]);
	assert_eq!(info.texture_type(), TextureType::TILED);
	assert_eq!(info.format(), TextureFormat::PVRT4BPP_ABGR);
	assert_eq!(info.width(), 128);
	assert_eq!(info.height(), 32);

	let rev1 = info_with(Revision::Rev1, info.raw.control_words);
	assert_eq!(rev1.format(), info.format());
	assert_eq!((rev1.width(), rev1.height()), (128, 32));
}


#[test]
fn layouts_are_not_interchangeable() {
	let cw = [0x6000_0000, 0x9500_0000, (4 << 16) | 4, 0];
	let rev3 = info_with(Revision::Rev3, cw);
	let rev2 = info_with(Revision::Rev2, cw);
	assert_ne!(rev3.texture_type(), rev2.texture_type());
	assert_ne!(rev3.format(), rev2.format());
	assert_ne!(rev3.width(), rev2.width());
}


#[test]
fn read_record() {
	use std::io::Cursor;

	let mut data = vec![];

	for v in [0x40u32, 0x10, 0xFFFF_FFFF, 0, 0x6000_0000, 0x9500_0000, (2 << 16) | 2, 0] {
		data.extend(v.to_le_bytes());
	};

	let info = TextureInfo::read_from(&mut Cursor::new(data), Revision::Rev3).unwrap();
	assert_eq!(info.raw.data_offset, 0x40);
	assert_eq!(info.raw.data_size, 0x10);
	assert_eq!(info.palette_index(), -1);
	assert_eq!(info.base_format(), BaseFormat::P8);
	assert_eq!(info.storage_dimensions(), (2, 2));
}
