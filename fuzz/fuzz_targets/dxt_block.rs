#![no_main]
use libfuzzer_sys::fuzz_target;
use arbitrary::Arbitrary;

use vita_gxt::dxt::DxtVariant;

#[derive(Arbitrary, Debug)]
enum Variant {
	Bc1,
	Bc2,
	Bc3,
}

#[derive(Arbitrary, Debug)]
struct Input {
	variant: Variant,
	block: [u8; 16],
}

fuzz_target!(|input: Input| {
	let variant = match input.variant {
		Variant::Bc1 => DxtVariant::Bc1,
		Variant::Bc2 => DxtVariant::Bc2,
		Variant::Bc3 => DxtVariant::Bc3,
	};

	let pixels = variant.decode_block(&input.block).expect("a 16-byte block always decodes");

	if variant == DxtVariant::Bc1 {
		assert!(pixels.iter().all(|p| p[3] == 0xFF));
	};
});
