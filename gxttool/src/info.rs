use std::io::BufReader;

use anyhow::{Context, Result as AnyhowResult};
use vita_gxt::*;


pub fn command_info(matches: &clap::ArgMatches) -> AnyhowResult<()> {
	let brief = matches.is_present("brief");
	let inputs = matches.values_of("input").expect("INPUT required").collect::<Vec<_>>();

	let failed = print_all(&inputs, brief);

	if failed > 0 {
		tracing::warn!("{failed} of {} input(s) could not be parsed", inputs.len());
	};

	Ok(())
}


/// Print every input, logging the ones that fail.  Returns the number of
/// failures.
fn print_all(inputs: &[&str], brief: bool) -> usize {
	inputs.iter()
		.filter(|path| match gxt_path_info(path, brief) {
			Ok(()) => false,
			Err(e) => {
				tracing::error!("{path}: {e:#}");
				true
			},
		})
		.count()
}


fn gxt_path_info(path: &str, brief: bool) -> AnyhowResult<()> {
	let brief_prefix = if brief {
		"".to_string()
	}
	else {
		format!("{}: ", path)
	};

	let file = std::fs::File::open(path).with_context(|| format!("Could not open file: {path}"))?;
	let filesize = file.metadata().with_context(|| format!("Could not read metadata to determine size: {path}"))?.len();
	let directory = GxtDirectory::read_from(&mut BufReader::new(file))
		.with_context(|| format!("Could not read GXT tables: {path}"))?;
	let header = &directory.header;

	println!("{brief_prefix}File size: {filesize} (0x{filesize:X})");
	println!("{brief_prefix}Revision: {} (0x{:08X})", directory.revision, header.version);
	println!("{brief_prefix}Textures: {}, P4 palettes: {}, P8 palettes: {}",
		header.num_textures, header.num_p4_palettes, header.num_p8_palettes);

	for (pos, info) in directory.infos.iter().enumerate() {
		let pos = pos + 1;
		let support = if is_supported(info.format()) { "" } else { " [not supported]" };

		println!("{brief_prefix}Texture #{pos}: {}x{} ({}, {}), offset=0x{:X}, size={}, palette={}{support}",
			info.width(),
			info.height(),
			info.format(),
			info.texture_type(),
			info.raw.data_offset,
			info.raw.data_size,
			info.palette_index());
	};

	if let Some(atlas) = &directory.atlas {
		for (pos, entry) in atlas.entries.iter().enumerate() {
			println!("{brief_prefix}Block #{}: {}x{} (Origin X:{}, Y:{}), palette={}",
				pos + 1,
				entry.width,
				entry.height,
				entry.x,
				entry.y,
				entry.palette_index);
		};
	};

	Ok(())
}


#[test]
fn failed_inputs_are_counted() {
	let dir = std::env::temp_dir().join(format!("gxttool-info-{}", std::process::id()));
	std::fs::create_dir_all(&dir).unwrap();
	let garbage = dir.join("garbage.gxt");
	std::fs::write(&garbage, b"not a texture archive").unwrap();

	let missing = dir.join("missing.gxt");
	let inputs = [garbage.to_str().unwrap(), missing.to_str().unwrap()];
	assert_eq!(print_all(&inputs, true), 2);

	let matches = crate::construct_app().get_matches_from(["gxttool", "info", inputs[0], inputs[1]]);
	let (_, matches) = matches.subcommand().unwrap();
	assert!(command_info(matches).is_ok());

	std::fs::remove_dir_all(&dir).unwrap();
}
