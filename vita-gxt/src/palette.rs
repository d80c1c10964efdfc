use std::io::{Read, Seek, SeekFrom};

use byteorder::{LittleEndian, ReadBytesExt};
use surety::Ensure;

use crate::{GxtResult, GxtHeader, BaseFormat};
use crate::GxtError::*;
use crate::macros;


/// The palette tables stored at the end of a GXT archive
///
/// Colours are kept as raw little-endian words.  Their meaning depends on
/// the swizzle of the texture format that references them, see
/// [`ChannelOrder`][crate::ChannelOrder].
#[derive(Default, Debug, Clone, PartialEq, Eq)]
pub struct Palettes {
	/// 16-colour tables for [`BaseFormat::P4`] textures.
	pub p4: Vec<Vec<u32>>,
	/// 256-colour tables for [`BaseFormat::P8`] textures.
	pub p8: Vec<Vec<u32>>,
}


impl Palettes {
	/// Number of colours in a [`BaseFormat::P4`] palette.
	pub const P4_COLORS: usize = 16;
	/// Number of colours in a [`BaseFormat::P8`] palette.
	pub const P8_COLORS: usize = 256;


	/// Read the palette tables described by `header` from the end of
	/// `input`: all 16-colour tables, then all 256-colour tables.
	///
	/// # Errors
	/// - [`UnexpectedEof`]: The palette region is larger than the stream, or
	///   unexpected end of file.
	/// - [`UnexpectedIoError`]: Unexpected read error.
	pub fn read_from<R: Read + Seek>(input: &mut R, header: &GxtHeader) -> GxtResult<Self> {
		let stream_len = input.seek(SeekFrom::End(0))?;
		let p4_count = u64::from(header.num_p4_palettes);
		let p8_count = u64::from(header.num_p8_palettes);

		let offset = stream_len.checked()
			- p8_count * Self::P8_COLORS as u64 * 4
			- p4_count * Self::P4_COLORS as u64 * 4;
		let offset = offset.ok_or(UnexpectedEof)?;

		macros::log!(trace, "Palettes at 0x{:X}: {} P4, {} P8", offset, p4_count, p8_count);

		let _ = input.seek(SeekFrom::Start(offset))?;

		let p4 = (0..p4_count)
			.map(|_| Self::read_table(input, Self::P4_COLORS))
			.collect::<GxtResult<Vec<_>>>()?;
		let p8 = (0..p8_count)
			.map(|_| Self::read_table(input, Self::P8_COLORS))
			.collect::<GxtResult<Vec<_>>>()?;

		Ok(Self { p4, p8 })
	}


	fn read_table<R: Read>(input: &mut R, colors: usize) -> GxtResult<Vec<u32>> {
		let mut table = vec![0u32; colors];
		input.read_u32_into::<LittleEndian>(&mut table)?;
		Ok(table)
	}


	/// Look up palette `index` for a texture of base format `base`.
	///
	/// An index of `-1` means the texture has no palette and returns
	/// `Ok(None)` without looking at the tables.
	///
	/// # Errors
	/// - [`PaletteNotImplemented`]: `base` is not an indexed format.
	/// - [`PaletteIndexOutOfRange`]: The archive has no such palette.
	pub fn fetch(&self, base: BaseFormat, index: i32) -> GxtResult<Option<&[u32]>> {
		if index == -1 {
			return Ok(None);
		};

		let tables = match base {
			BaseFormat::P4 => &self.p4,
			BaseFormat::P8 => &self.p8,
			_ => return Err(PaletteNotImplemented(base)),
		};

		usize::try_from(index).ok()
			.and_then(|i| tables.get(i))
			.map(|t| Some(&t[..]))
			.ok_or(PaletteIndexOutOfRange(base, index))
	}
}


#[cfg(test)]
fn header_with(p4: u32, p8: u32) -> GxtHeader {
	GxtHeader { num_p4_palettes: p4, num_p8_palettes: p8, ..GxtHeader::default() }
}


#[test]
fn reads_p4_before_p8() {
	use std::io::Cursor;

	let mut data = vec![0xEEu8; 10];
	data.extend((0..16u32).flat_map(|i| i.to_le_bytes()));
	data.extend((0..256u32).flat_map(|i| (i | 0x8000_0000).to_le_bytes()));

	let palettes = Palettes::read_from(&mut Cursor::new(data), &header_with(1, 1)).unwrap();
	assert_eq!(palettes.p4.len(), 1);
	assert_eq!(palettes.p8.len(), 1);
	assert_eq!(palettes.p4[0][15], 15);
	assert_eq!(palettes.p8[0][0], 0x8000_0000);
	assert_eq!(palettes.p8[0][255], 0x8000_00FF);
}


#[test]
fn palette_region_larger_than_stream() {
	use std::io::Cursor;

	let result = Palettes::read_from(&mut Cursor::new(vec![0u8; 100]), &header_with(0, 1));
	assert!(matches!(result, Err(UnexpectedEof)));

	let result = Palettes::read_from(&mut Cursor::new(vec![0u8; 1024]), &header_with(0, u32::MAX));
	assert!(matches!(result, Err(UnexpectedEof)));
}


#[test]
fn fetch_rules() {
	let palettes = Palettes { p4: vec![vec![0; 16]], p8: vec![] };

	assert!(matches!(palettes.fetch(BaseFormat::P4, -1), Ok(None)));
	assert!(matches!(palettes.fetch(BaseFormat::UBC1, -1), Ok(None)));
	assert_eq!(palettes.fetch(BaseFormat::P4, 0).unwrap().map(<[u32]>::len), Some(16));
	assert!(matches!(palettes.fetch(BaseFormat::P4, 1), Err(PaletteIndexOutOfRange(BaseFormat::P4, 1))));
	assert!(matches!(palettes.fetch(BaseFormat::P8, 0), Err(PaletteIndexOutOfRange(BaseFormat::P8, 0))));
	assert!(matches!(palettes.fetch(BaseFormat::P4, -2), Err(PaletteIndexOutOfRange(_, -2))));
	assert!(matches!(palettes.fetch(BaseFormat::UBC1, 0), Err(PaletteNotImplemented(BaseFormat::UBC1))));
}
