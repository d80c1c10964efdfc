#![no_main]
use libfuzzer_sys::fuzz_target;
use arbitrary::Arbitrary;

use vita_gxt::{PixelBuffer, PixelLayout, TextureType};
use vita_gxt::arrange::unscramble;

#[derive(Arbitrary, Debug)]
struct Input {
	width_log2: u8,
	height_log2: u8,
	tiled: bool,
}

fuzz_target!(|input: Input| {
	let width = 1u32 << (input.width_log2 % 9);
	let height = 1u32 << (input.height_log2 % 9);
	let kind = if input.tiled { TextureType::TILED } else { TextureType::SWIZZLED };

	let data = (0..width * height).flat_map(u32::to_le_bytes).collect::<Vec<u8>>();
	let buffer = PixelBuffer::from_data(width, height, PixelLayout::Bgra8888, data).unwrap();
	let result = unscramble(buffer, kind).unwrap();

	let mut seen = vec![false; (width * height) as usize];

	for pixel in result.data.chunks_exact(4) {
		let i = u32::from_le_bytes(pixel.try_into().unwrap()) as usize;
		assert!(!seen[i]);
		seen[i] = true;
	};
});
