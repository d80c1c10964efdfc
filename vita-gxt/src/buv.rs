use std::borrow::Cow;
use std::io::{Read, Seek, SeekFrom};

use byteorder::{LittleEndian, ReadBytesExt};
use deku::prelude::*;
use image::RgbaImage;
use image::imageops::crop_imm;
use static_assertions::const_assert_eq;
use surety::Ensure;

use crate::{GxtResult, ReadExt, GxtTexture, Palettes};
use crate::GxtError::*;
use crate::macros;


/// A rectangle of the base texture addressed by a [`BuvChunk`]
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq, DekuRead)]
#[deku(endian = "little")]
pub struct BuvEntry {
	#[allow(missing_docs)]
	pub x: u16,
	#[allow(missing_docs)]
	pub y: u16,
	#[allow(missing_docs)]
	pub width: u16,
	#[allow(missing_docs)]
	pub height: u16,
	/// Palette used instead of the base texture's own, `-1` for none.
	pub palette_index: i16,
	#[allow(missing_docs)]
	pub unknown: u16,
}


const_assert_eq!(std::mem::size_of::<BuvEntry>(), BuvEntry::SIZE);


impl BuvEntry {
	/// Size of an entry in bytes.
	pub const SIZE: usize = 12;
}


/// Atlas table that cuts sub-images out of the archive's first texture
#[derive(Default, Debug, Clone, PartialEq, Eq)]
pub struct BuvChunk {
	#[allow(missing_docs)]
	pub entries: Vec<BuvEntry>,
}


impl BuvChunk {
	/// `"BUV\0"`
	pub const MAGIC: [u8; 4] = *b"BUV\0";


	/// Read an atlas table at the current position of `input`, if there is
	/// one.  When the next four bytes are not [`BuvChunk::MAGIC`] (or fewer
	/// than four bytes remain before `stream_len`), the position is left
	/// unchanged and `Ok(None)` is returned.
	///
	/// # Errors
	/// - [`UnexpectedEof`]: The table is truncated.
	/// - [`UnexpectedIoError`]: Unexpected read error.
	/// - [`ArithmeticOverflow`]: Entry table size overflows a [`usize`].
	pub fn read_from<R: Read + Seek>(input: &mut R, stream_len: u64) -> GxtResult<Option<Self>> {
		let start = input.stream_position()?;

		if stream_len.saturating_sub(start) < 4 {
			return Ok(None);
		};

		let mut magic = [0u8; 4];
		input.read_exact(&mut magic)?;

		if magic != Self::MAGIC {
			let _ = input.seek(SeekFrom::Start(start))?;
			return Ok(None);
		};

		let count = usize::try_from(input.read_u32::<LittleEndian>()?)?;
		let len = (count.checked() * BuvEntry::SIZE).ok_or(ArithmeticOverflow)?;
		let data = input.read_exact_buffered(len)?;

		let entries = data.chunks_exact(BuvEntry::SIZE)
			.map(|chunk| BuvEntry::from_bytes((chunk, 0))
				.map(|(_, entry)| entry)
				.map_err(|_| DescriptorReadError))
			.collect::<GxtResult<Vec<_>>>()?;

		macros::log!(trace, "BUV chunk with {} entries", entries.len());

		Ok(Some(Self { entries }))
	}


	/// Cut every entry out of `base`.  Entries with a palette override are
	/// cut from `base` rendered with that palette.
	///
	/// # Errors
	/// - [`AtlasRegionOutOfBounds`]: An entry reaches outside `base`.
	/// - [`PaletteNotImplemented`]: An override is set on a non-indexed texture.
	/// - [`PaletteIndexOutOfRange`]: An override has no palette table.
	pub fn extract(&self, base: &GxtTexture, palettes: &Palettes) -> GxtResult<Vec<RgbaImage>> {
		self.entries.iter()
			.enumerate()
			.map(|(i, entry)| {
				let image = match palettes.fetch(base.info.base_format(), entry.palette_index.into())? {
					Some(palette) => Cow::Owned(base.render(Some(palette))?),
					None => Cow::Borrowed(base.image()),
				};

				let (x, y) = (u32::from(entry.x), u32::from(entry.y));
				let (w, h) = (u32::from(entry.width), u32::from(entry.height));

				if x + w > image.width() || y + h > image.height() {
					return Err(AtlasRegionOutOfBounds(i));
				};

				Ok(crop_imm(&*image, x, y, w, h).to_image())
			})
			.collect()
	}
}


#[test]
fn absent_chunk_leaves_position() {
	use std::io::Cursor;

	let mut input = Cursor::new(b"xxBUV\x01\0\0\0\0".to_vec());
	input.set_position(2);
	assert_eq!(BuvChunk::read_from(&mut input, 10).unwrap(), None);
	assert_eq!(input.position(), 2);

	input.set_position(7);
	assert_eq!(BuvChunk::read_from(&mut input, 10).unwrap(), None);
	assert_eq!(input.position(), 7);
}


#[test]
fn read_entries() {
	use std::io::Cursor;

	let mut data = b"BUV\0".to_vec();
	data.extend(2u32.to_le_bytes());

	for v in [1u16, 2, 3, 4, 0xFFFF, 0, 5, 6, 7, 8, 2, 0] {
		data.extend(v.to_le_bytes());
	};

	let len = data.len() as u64;
	let chunk = BuvChunk::read_from(&mut Cursor::new(&data), len).unwrap().unwrap();
	assert_eq!(chunk.entries, vec![
		BuvEntry { x: 1, y: 2, width: 3, height: 4, palette_index: -1, unknown: 0 },
		BuvEntry { x: 5, y: 6, width: 7, height: 8, palette_index: 2, unknown: 0 },
	]);

	assert!(matches!(BuvChunk::read_from(&mut Cursor::new(&data[..20]), 20), Err(UnexpectedEof)));
}
