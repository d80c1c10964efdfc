use std::io::Read;

use deku::prelude::*;
use derive_more::Display;
use static_assertions::const_assert_eq;

use crate::{GxtResult, ReadExt};
use crate::GxtError::*;
use crate::macros;


/// The fixed 32-byte header at the start of every GXT archive
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq, DekuRead)]
#[deku(endian = "little")]
pub struct GxtHeader {
	/// Must be [`GxtHeader::MAGIC`].
	pub magic: [u8; 4],
	/// Format version, see [`Revision`].
	pub version: u32,
	/// Number of texture info records following the header.
	pub num_textures: u32,
	/// Offset of the texture data region.
	pub texture_data_offset: u32,
	/// Size of the texture data region.
	pub texture_data_size: u32,
	/// Number of 16-colour palettes at the end of the archive.
	pub num_p4_palettes: u32,
	/// Number of 256-colour palettes at the end of the archive.
	pub num_p8_palettes: u32,
	#[allow(missing_docs)]
	pub padding: u32,
}


const_assert_eq!(std::mem::size_of::<GxtHeader>(), GxtHeader::SIZE);


impl GxtHeader {
	/// `"GXT\0"`
	pub const MAGIC: [u8; 4] = *b"GXT\0";
	/// Size of the header in bytes.
	pub const SIZE: usize = 32;


	/// Read and validate a header.
	///
	/// # Errors
	/// - [`UnexpectedEof`]: Input is shorter than a header.
	/// - [`UnexpectedIoError`]: Unexpected read error.
	/// - [`UnknownMagic`]: The archive does not start with [`GxtHeader::MAGIC`].
	/// - [`UnsupportedRevision`]: [`version`][Self::version] is not a known [`Revision`].
	pub fn read_from<R: Read>(input: &mut R) -> GxtResult<(Self, Revision)> {
		let buf = input.read_exact_buffered(Self::SIZE)?;
		let (_, header) = GxtHeader::from_bytes((&buf, 0))
			.map_err(|_| DescriptorReadError)?;

		if header.magic != Self::MAGIC {
			return Err(UnknownMagic(header.magic));
		};

		let revision = Revision::try_from(header.version)?;

		macros::log!(trace, "GXT {}: {} textures, {} P4 and {} P8 palettes",
			revision, header.num_textures, header.num_p4_palettes, header.num_p8_palettes);

		Ok((header, revision))
	}
}


/// GXT format revision, which selects how texture info control words are
/// interpreted
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq)]
pub enum Revision {
	/// `0x10000001`.
	#[display(fmt = "1.01")]
	Rev1,
	/// `0x10000002`; dimensions stored as powers of two.
	#[display(fmt = "2.01")]
	Rev2,
	/// `0x10000003`; full format code and literal dimensions.
	#[display(fmt = "3.01")]
	Rev3,
}


impl Revision {
	/// The raw version value of this revision.
	pub const fn version(self) -> u32 {
		match self {
			Revision::Rev1 => 0x1000_0001,
			Revision::Rev2 => 0x1000_0002,
			Revision::Rev3 => 0x1000_0003,
		}
	}
}


impl TryFrom<u32> for Revision {
	type Error = crate::GxtError;

	fn try_from(version: u32) -> GxtResult<Self> {
		match version {
			0x1000_0001 => Ok(Revision::Rev1),
			0x1000_0002 => Ok(Revision::Rev2),
			0x1000_0003 => Ok(Revision::Rev3),
			v => Err(UnsupportedRevision(v)),
		}
	}
}


#[test]
fn header_errors() {
	use std::io::Cursor;

	let mut data = b"GXT\0".to_vec();
	data.extend(0x1000_0004u32.to_le_bytes());
	data.resize(32, 0);
	assert!(matches!(GxtHeader::read_from(&mut Cursor::new(&data)), Err(UnsupportedRevision(0x1000_0004))));

	data[0..4].copy_from_slice(b"DDS ");
	assert!(matches!(GxtHeader::read_from(&mut Cursor::new(&data)), Err(UnknownMagic(m)) if &m == b"DDS "));

	assert!(matches!(GxtHeader::read_from(&mut Cursor::new(&data[..20])), Err(UnexpectedEof)));
}


#[test]
fn header_fields() {
	use std::io::Cursor;

	let mut data = b"GXT\0".to_vec();

	for v in [0x1000_0003u32, 2, 0x60, 0x200, 3, 4, 0] {
		data.extend(v.to_le_bytes());
	};

	let (header, revision) = GxtHeader::read_from(&mut Cursor::new(&data)).unwrap();
	assert_eq!(revision, Revision::Rev3);
	assert_eq!(revision.version(), header.version);
	assert_eq!(header.num_textures, 2);
	assert_eq!(header.texture_data_offset, 0x60);
	assert_eq!(header.texture_data_size, 0x200);
	assert_eq!(header.num_p4_palettes, 3);
	assert_eq!(header.num_p8_palettes, 4);
}
