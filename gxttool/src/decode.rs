use std::io::BufReader;

use anyhow::{Context, Result as AnyhowResult};
use vita_gxt::*;


pub fn command_decode(matches: &clap::ArgMatches) -> AnyhowResult<()> {
	let gxt_path = matches.value_of("gxt").expect("GXT required");
	let png_path = matches.value_of("png").expect("PNG required");
	let tex_idx_str = matches.value_of("texture").unwrap_or("1");
	let tex_idx = tex_idx_str.parse::<usize>()
		.with_context(|| format!("Could not parse texture index from \"{tex_idx_str}\""))
		.and_then(|i| if i > 0 { Ok(i) } else { Err(anyhow::anyhow!("Texture index cannot be 0")) })?;

	let gxt_file = std::fs::File::open(gxt_path).with_context(|| format!("Could not open file: {gxt_path}"))?;
	let archive = GxtArchive::read_from(&mut BufReader::new(gxt_file))
		.with_context(|| format!("Could not read GxtArchive: {gxt_path}"))?;
	let tex_count = archive.textures.len();

	let texture = archive.textures.into_iter()
		.nth(tex_idx - 1)
		.with_context(|| format!("No texture #{tex_idx} (should be in [1..{tex_count}])"))?;

	texture.into_image().save_with_format(png_path, image::ImageFormat::Png)
		.with_context(|| format!("save_with_format to path failed: {png_path}"))?;

	Ok(())
}
