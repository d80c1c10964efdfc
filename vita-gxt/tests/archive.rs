use std::io::Write;

use byteorder::{LittleEndian, WriteBytesExt};
use vita_gxt::*;
use vita_gxt::GxtError::*;


struct TestTexture {
	control_words: [u32; 4],
	palette_index: i32,
	data: Vec<u8>,
}


impl TestTexture {
	fn rev3(format: TextureFormat, kind: TextureType, width: u32, height: u32, palette_index: i32, data: Vec<u8>) -> Self {
		Self { control_words: [kind.0, format.0, (height << 16) | width, 0], palette_index, data }
	}
}


#[derive(Default)]
struct TestArchive {
	version: u32,
	textures: Vec<TestTexture>,
	atlas: Option<Vec<BuvEntry>>,
	p4: Vec<Vec<u32>>,
	p8: Vec<Vec<u32>>,
}


impl TestArchive {
	fn new(textures: Vec<TestTexture>) -> Self {
		Self { version: Revision::Rev3.version(), textures, ..Self::default() }
	}


	fn build(&self) -> Vec<u8> {
		let atlas_len = self.atlas.as_ref().map_or(0, |a| 8 + a.len() * BuvEntry::SIZE);
		let tables_len = GxtHeader::SIZE + self.textures.len() * RawTextureInfo::SIZE + atlas_len;
		let data_len = self.textures.iter().map(|t| t.data.len()).sum::<usize>();

		let mut out = vec![];
		out.write_all(&GxtHeader::MAGIC).unwrap();

		for v in [self.version, self.textures.len() as u32, tables_len as u32, data_len as u32, self.p4.len() as u32, self.p8.len() as u32, 0] {
			out.write_u32::<LittleEndian>(v).unwrap();
		};

		let mut offset = tables_len;

		for t in self.textures.iter() {
			out.write_u32::<LittleEndian>(offset as u32).unwrap();
			out.write_u32::<LittleEndian>(t.data.len() as u32).unwrap();
			out.write_i32::<LittleEndian>(t.palette_index).unwrap();
			out.write_u32::<LittleEndian>(0).unwrap();

			for cw in t.control_words {
				out.write_u32::<LittleEndian>(cw).unwrap();
			};

			offset += t.data.len();
		};

		if let Some(atlas) = &self.atlas {
			out.write_all(&BuvChunk::MAGIC).unwrap();
			out.write_u32::<LittleEndian>(atlas.len() as u32).unwrap();

			for e in atlas.iter() {
				for v in [e.x, e.y, e.width, e.height] {
					out.write_u16::<LittleEndian>(v).unwrap();
				};

				out.write_i16::<LittleEndian>(e.palette_index).unwrap();
				out.write_u16::<LittleEndian>(e.unknown).unwrap();
			};
		};

		for t in self.textures.iter() {
			out.write_all(&t.data).unwrap();
		};

		for table in self.p4.iter().chain(self.p8.iter()) {
			for color in table.iter() {
				out.write_u32::<LittleEndian>(*color).unwrap();
			};
		};

		out
	}
}


fn bc1_block(color0: u16, color1: u16, codes: u32) -> Vec<u8> {
	let mut block = vec![];
	block.write_u16::<LittleEndian>(color0).unwrap();
	block.write_u16::<LittleEndian>(color1).unwrap();
	block.write_u32::<LittleEndian>(codes).unwrap();
	block
}


fn gray_palette(len: usize) -> Vec<u32> {
	(0..len as u32).map(|i| 0xFF00_0000 | i).collect()
}


#[test]
fn bc1_linear_single_block() {
	// pixel i selects table entry i % 4
	let codes = (0..16).fold(0u32, |acc, i| acc | ((i % 4) << (2 * i)));
	let texture = TestTexture::rev3(TextureFormat::UBC1_ABGR, TextureType::LINEAR, 4, 4, -1, bc1_block(0xF800, 0x001F, codes));
	let archive = GxtArchive::from_bytes(&TestArchive::new(vec![texture]).build()).unwrap();

	assert_eq!(archive.directory.revision, Revision::Rev3);
	assert_eq!(archive.textures.len(), 1);

	let image = archive.textures[0].image();
	assert_eq!(image.dimensions(), (4, 4));

	let table = [[255, 0, 0, 255], [0, 0, 255, 255], [127, 0, 127, 255], [0, 0, 0, 255]];

	for (i, pixel) in image.pixels().enumerate() {
		assert_eq!(pixel.0, table[i % 4], "pixel {}", i);
	};
}


#[test]
fn bc1_ignores_endpoint_order() {
	let a = TestTexture::rev3(TextureFormat::UBC1_ABGR, TextureType::LINEAR, 4, 4, -1, bc1_block(0x001F, 0xF800, 0x5555_5555));
	let b = TestTexture::rev3(TextureFormat::UBC1_ABGR, TextureType::LINEAR, 4, 4, -1, bc1_block(0xF800, 0x001F, 0x0000_0000));
	let archive = GxtArchive::from_bytes(&TestArchive::new(vec![a, b]).build()).unwrap();

	assert_eq!(archive.textures[0].image(), archive.textures[1].image());
	assert!(archive.textures[0].image().pixels().all(|p| p.0 == [255, 0, 0, 255]));
}


#[test]
fn p8_linear_palette() {
	let texture = TestTexture::rev3(TextureFormat::P8_ABGR, TextureType::LINEAR, 2, 2, 0, vec![0, 0, 0, 0]);
	let mut palette = vec![0u32; 256];
	palette[0] = u32::from_le_bytes([0x30, 0x20, 0x10, 0xFF]);

	let archive = TestArchive { p8: vec![palette], ..TestArchive::new(vec![texture]) };
	let archive = GxtArchive::from_bytes(&archive.build()).unwrap();

	let image = archive.textures[0].image();
	assert_eq!(image.dimensions(), (2, 2));
	assert!(image.pixels().all(|p| p.0 == [0x30, 0x20, 0x10, 0xFF]));
}


#[test]
fn p4_without_palette() {
	let texture = TestTexture::rev3(TextureFormat::P4_ABGR, TextureType::LINEAR, 2, 2, -1, vec![0x10, 0x32]);
	let data = TestArchive::new(vec![texture]).build();

	assert!(matches!(GxtArchive::from_bytes(&data), Err(PaletteRequired(TextureFormat::P4_ABGR))));
}


#[test]
fn palette_on_direct_format() {
	let texture = TestTexture::rev3(TextureFormat::UBC1_ABGR, TextureType::LINEAR, 4, 4, 0, bc1_block(0, 0, 0));
	let archive = TestArchive { p4: vec![gray_palette(16)], ..TestArchive::new(vec![texture]) };

	assert!(matches!(GxtArchive::from_bytes(&archive.build()), Err(PaletteNotImplemented(BaseFormat::UBC1))));
}


#[test]
fn palette_index_out_of_range() {
	let texture = TestTexture::rev3(TextureFormat::P4_ABGR, TextureType::LINEAR, 2, 1, 1, vec![0x10]);
	let archive = TestArchive { p4: vec![gray_palette(16)], ..TestArchive::new(vec![texture]) };

	assert!(matches!(GxtArchive::from_bytes(&archive.build()), Err(PaletteIndexOutOfRange(BaseFormat::P4, 1))));
}


#[test]
fn swizzled_bc1_matches_linear() {
	let blocks = [0xF800u16, 0x07E0, 0x001F, 0xFFFF].map(|c| bc1_block(c, c, 0));
	let linear = blocks.concat();
	// 2x2 blocks in Morton order: (0,0), (0,1), (1,0), (1,1)
	let swizzled = [&blocks[0], &blocks[2], &blocks[1], &blocks[3]].map(|b| b.clone()).concat();

	let textures = vec![
		TestTexture::rev3(TextureFormat::UBC1_ABGR, TextureType::LINEAR, 8, 8, -1, linear),
		TestTexture::rev3(TextureFormat::UBC1_ABGR, TextureType::SWIZZLED, 8, 8, -1, swizzled),
	];

	let archive = GxtArchive::from_bytes(&TestArchive::new(textures).build()).unwrap();
	let linear = archive.textures[0].image();

	assert_eq!(linear.get_pixel(0, 0).0, [255, 0, 0, 255]);
	assert_eq!(linear.get_pixel(7, 0).0, [0, 255, 0, 255]);
	assert_eq!(linear.get_pixel(0, 7).0, [0, 0, 255, 255]);
	assert_eq!(linear.get_pixel(7, 7).0, [255, 255, 255, 255]);
	assert_eq!(linear, archive.textures[1].image());
}


#[test]
fn swizzled_indexed_is_cropped() {
	let texture = TestTexture::rev3(TextureFormat::P8_ABGR, TextureType::SWIZZLED, 3, 3, 0, (0u8..16).collect());
	let archive = TestArchive { p8: vec![gray_palette(256)], ..TestArchive::new(vec![texture]) };
	let archive = GxtArchive::from_bytes(&archive.build()).unwrap();

	let image = archive.textures[0].image();
	assert_eq!(image.dimensions(), (3, 3));
	assert_eq!(image.get_pixel(0, 0).0[0], 0);
	assert_eq!(image.get_pixel(1, 0).0[0], 2);
	assert_eq!(image.get_pixel(0, 1).0[0], 1);
	assert_eq!(image.get_pixel(2, 2).0[0], 12);
}


#[test]
fn rev2_dimensions() {
	let texture = TestTexture {
		control_words: [0, (5 << 24) | (3 << 16) | 2, TextureType::LINEAR.0, 0],
		palette_index: -1,
		data: [bc1_block(0xFFFF, 0xFFFF, 0), bc1_block(0, 0, 0)].concat(),
	};

	let archive = TestArchive { version: Revision::Rev2.version(), ..TestArchive::new(vec![texture]) };
	let archive = GxtArchive::from_bytes(&archive.build()).unwrap();

	let info = &archive.directory.infos[0];
	assert_eq!(archive.directory.revision, Revision::Rev2);
	assert_eq!(info.format(), TextureFormat::UBC1_ABGR);
	assert_eq!((info.width(), info.height()), (8, 4));

	let image = archive.textures[0].image();
	assert_eq!(image.get_pixel(3, 3).0, [255, 255, 255, 255]);
	assert_eq!(image.get_pixel(4, 0).0, [0, 0, 0, 255]);
}


#[test]
fn header_failures() {
	let mut data = TestArchive::new(vec![]).build();
	assert!(GxtArchive::from_bytes(&data).unwrap().textures.is_empty());

	data[4..8].copy_from_slice(&0x1000_0004u32.to_le_bytes());
	assert!(matches!(GxtArchive::from_bytes(&data), Err(UnsupportedRevision(0x1000_0004))));

	data[0..4].copy_from_slice(b"GXT1");
	assert!(matches!(GxtArchive::from_bytes(&data), Err(UnknownMagic(m)) if &m == b"GXT1"));

	assert!(matches!(GxtArchive::from_bytes(&data[..16]), Err(UnexpectedEof)));
}


#[test]
fn unsupported_format_and_arrangement() {
	let texture = TestTexture::rev3(TextureFormat::PVRTII4BPP_ABGR, TextureType::LINEAR, 8, 8, -1, vec![0; 32]);
	let data = TestArchive::new(vec![texture]).build();
	assert!(matches!(GxtArchive::from_bytes(&data), Err(FormatNotImplemented(TextureFormat::PVRTII4BPP_ABGR))));

	let directory = GxtDirectory::read_from(&mut std::io::Cursor::new(&data)).unwrap();
	assert_eq!(directory.infos.len(), 1);
	assert_eq!(directory.infos[0].width(), 8);

	let texture = TestTexture::rev3(TextureFormat::UBC1_ABGR, TextureType::LINEAR_STRIDED, 4, 4, -1, bc1_block(0, 0, 0));
	let data = TestArchive::new(vec![texture]).build();
	assert!(matches!(GxtArchive::from_bytes(&data), Err(UnsupportedArrangement(TextureType::LINEAR_STRIDED))));
}


#[test]
fn unsupported_arrangement_is_checked_before_decoding() {
	// 3x3 data only: the rounded 4x4 surface would run out of bytes first
	let texture = TestTexture::rev3(TextureFormat::P8_ABGR, TextureType::LINEAR_STRIDED, 3, 3, 0, vec![0; 9]);
	let archive = TestArchive { p8: vec![gray_palette(256)], ..TestArchive::new(vec![texture]) };
	assert!(matches!(GxtArchive::from_bytes(&archive.build()), Err(UnsupportedArrangement(TextureType::LINEAR_STRIDED))));

	let texture = TestTexture::rev3(TextureFormat::U8U8U8U8_ABGR, TextureType::CUBE_ARBITRARY, 3, 3, -1, vec![0; 36]);
	let data = TestArchive::new(vec![texture]).build();
	assert!(matches!(GxtArchive::from_bytes(&data), Err(UnsupportedArrangement(TextureType::CUBE_ARBITRARY))));

	let texture = TestTexture::rev3(TextureFormat::U8_1RRR, TextureType(0x2000_0000), 5, 1, -1, vec![0; 5]);
	let data = TestArchive::new(vec![texture]).build();
	assert!(matches!(GxtArchive::from_bytes(&data), Err(UnsupportedArrangement(TextureType(0x2000_0000)))));
}


#[test]
fn tiled_texture_is_raster_ordered() {
	// 32x32 tiles left to right, y in the even and x in the odd index bits
	let tile_xy = |i: u32| (0..5).fold((0u32, 0u32), |(x, y), bit| (
		x | (((i >> (2 * bit + 1)) & 1) << bit),
		y | (((i >> (2 * bit)) & 1) << bit),
	));

	let data = (0..64 * 32u32)
		.flat_map(|i| {
			let (tx, ty) = tile_xy(i % 1024);
			[((i / 1024) * 32 + tx) as u8, ty as u8, 0x80, 0xFF]
		})
		.collect();

	let texture = TestTexture::rev3(TextureFormat::U8U8U8U8_ABGR, TextureType::TILED, 64, 32, -1, data);
	let archive = GxtArchive::from_bytes(&TestArchive::new(vec![texture]).build()).unwrap();
	let image = archive.textures[0].image();

	assert_eq!(image.dimensions(), (64, 32));

	for (x, y, pixel) in image.enumerate_pixels() {
		assert_eq!(pixel.0, [x as u8, y as u8, 0x80, 0xFF], "pixel ({}, {})", x, y);
	};
}


#[test]
fn pvrtc_ignores_arrangement() {
	let data = (0u8..32).map(|i| i.wrapping_mul(37) ^ 0x5A).collect::<Vec<u8>>();

	let textures = vec![
		TestTexture::rev3(TextureFormat::PVRT4BPP_ABGR, TextureType::LINEAR, 8, 8, -1, data.clone()),
		TestTexture::rev3(TextureFormat::PVRT4BPP_ABGR, TextureType::SWIZZLED, 8, 8, -1, data.clone()),
		TestTexture::rev3(TextureFormat::PVRT4BPP_ABGR, TextureType::LINEAR_STRIDED, 8, 8, -1, data.clone()),
	];

	let archive = GxtArchive::from_bytes(&TestArchive::new(textures).build()).unwrap();

	let expected = pvrtc::decompress(&data, 8, 8, pvrtc::PvrtcMode::FourBpp).unwrap()
		.chunks_exact(4)
		.flat_map(|p| [p[2], p[1], p[0], p[3]])
		.collect::<Vec<u8>>();

	for texture in archive.textures.iter() {
		assert_eq!(texture.image().as_raw(), &expected, "{}", texture.info.texture_type());
	};
}


#[test]
fn failure_forfeits_whole_archive() {
	let textures = vec![
		TestTexture::rev3(TextureFormat::UBC1_ABGR, TextureType::LINEAR, 4, 4, -1, bc1_block(0, 0, 0)),
		TestTexture::rev3(TextureFormat::PVRTII2BPP_ABGR, TextureType::LINEAR, 16, 8, -1, vec![0; 32]),
	];

	let data = TestArchive::new(textures).build();
	assert!(matches!(GxtArchive::from_bytes(&data), Err(FormatNotImplemented(_))));
}


#[test]
fn truncated_texture_data() {
	let texture = TestTexture::rev3(TextureFormat::UBC1_ABGR, TextureType::LINEAR, 8, 8, -1, bc1_block(0, 0, 0));
	let data = TestArchive::new(vec![texture]).build();
	assert!(matches!(GxtArchive::from_bytes(&data), Err(UnexpectedEof)));

	let texture = TestTexture::rev3(TextureFormat::UBC1_ABGR, TextureType::LINEAR, 4, 4, -1, bc1_block(0, 0, 0));
	let data = TestArchive::new(vec![texture]).build();
	assert!(matches!(GxtArchive::from_bytes(&data[..data.len() - 1]), Err(UnexpectedEof)));
}


#[test]
fn atlas_extraction() {
	let indices = vec![0, 1, 2, 3, 4, 5, 6, 7];
	let texture = TestTexture::rev3(TextureFormat::P8_ABGR, TextureType::LINEAR, 4, 2, 0, indices);
	let inverted = (0..256u32).map(|i| 0xFF00_0000 | (255 - i)).collect();

	let atlas = vec![
		BuvEntry { x: 0, y: 0, width: 2, height: 2, palette_index: -1, unknown: 0 },
		BuvEntry { x: 2, y: 0, width: 2, height: 2, palette_index: 1, unknown: 0 },
	];

	let archive = TestArchive {
		atlas: Some(atlas.clone()),
		p8: vec![gray_palette(256), inverted],
		..TestArchive::new(vec![texture])
	};

	let archive = GxtArchive::from_bytes(&archive.build()).unwrap();
	assert_eq!(archive.directory.atlas.as_ref().map(|a| &a.entries), Some(&atlas));
	assert_eq!(archive.atlas_images.len(), 2);

	let reds = |image: &image::RgbaImage| image.pixels().map(|p| p.0[0]).collect::<Vec<u8>>();
	assert_eq!(reds(&archive.atlas_images[0]), vec![0, 1, 4, 5]);
	assert_eq!(reds(&archive.atlas_images[1]), vec![253, 252, 249, 248]);

	let palette = archive.palette_for(&archive.directory.infos[0]).unwrap();
	assert_eq!(palette.map(<[u32]>::len), Some(256));

	let rerendered = archive.textures[0].render(Some(&archive.palettes.p8[1])).unwrap();
	assert_eq!(rerendered.get_pixel(0, 0).0, [255, 0, 0, 255]);
}


#[test]
fn atlas_failures() {
	let entry = BuvEntry { x: 3, y: 0, width: 2, height: 1, palette_index: -1, unknown: 0 };
	let texture = TestTexture::rev3(TextureFormat::U8_1RRR, TextureType::LINEAR, 4, 1, -1, vec![0; 4]);
	let archive = TestArchive { atlas: Some(vec![entry]), ..TestArchive::new(vec![texture]) };
	assert!(matches!(GxtArchive::from_bytes(&archive.build()), Err(AtlasRegionOutOfBounds(0))));

	let archive = TestArchive { atlas: Some(vec![entry]), ..TestArchive::new(vec![]) };
	assert!(matches!(GxtArchive::from_bytes(&archive.build()), Err(MissingAtlasBase)));
}
