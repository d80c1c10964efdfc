use std::fs;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{Context, Result as AnyhowResult};
#[cfg(feature = "multithreaded")] use rayon::prelude::*;
use tap::prelude::*;
use vita_gxt::*;


/// A single archive to convert
#[derive(Debug)]
struct Job {
	path: PathBuf,
	/// Directory of `path` relative to the input root, mirrored under the
	/// output directory.
	relative_dir: PathBuf,
}


pub fn command_convert(matches: &clap::ArgMatches) -> AnyhowResult<()> {
	let start = Instant::now();
	let output = matches.value_of("output").expect("OUTDIR required");
	let keep = matches.is_present("keep");

	fs::create_dir_all(output).with_context(|| format!("Could not create output directory: {output}"))?;
	let output = Path::new(output).canonicalize()
		.with_context(|| format!("Could not resolve output directory: {output}"))?;

	let mut jobs = vec![];

	for input in matches.values_of("input").expect("INPUT required") {
		let root = Path::new(input).canonicalize()
			.with_context(|| format!("Input path not found: {input}"))?;

		if root.is_dir() {
			let mut entries = vec![];
			find_all_files(&root, &mut entries).with_context(|| format!("Could not walk directory: {input}"))?;

			jobs.extend(entries.iter()
				.map(fs::DirEntry::path)
				.filter(|p| !p.starts_with(&output))
				.map(|path| {
					let relative_dir = path.parent()
						.and_then(|p| p.strip_prefix(&root).ok())
						.map(Path::to_path_buf)
						.unwrap_or_default();
					Job { path, relative_dir }
				}));
		}
		else {
			jobs.push(Job { path: root, relative_dir: PathBuf::new() });
		};
	};

	tracing::info!("Found {} file(s)", jobs.len());

	#[cfg(feature = "multithreaded")]
	let iter = jobs.par_iter();
	#[cfg(not(feature = "multithreaded"))]
	let iter = jobs.iter();

	iter.for_each(|job| {
		if let Err(e) = convert_archive(job, &output, keep) {
			tracing::error!("{}: {:#}", job.path.display(), e);
		};
	});

	tracing::info!("Operation completed in {:.2?}", start.elapsed());

	Ok(())
}


fn convert_archive(job: &Job, output: &Path, keep: bool) -> AnyhowResult<()> {
	let path = &job.path;
	let stem = path.file_stem()
		.with_context(|| format!("No file name: {}", path.display()))?
		.to_string_lossy()
		.into_owned();
	let out_dir = output.join(&job.relative_dir);

	if keep && has_output(&out_dir, &stem) {
		tracing::info!("{}: already exists", path.display());
		return Ok(());
	};

	let archive = fs::File::open(path)
		.with_context(|| format!("Could not open file: {}", path.display()))?
		.pipe(BufReader::new)
		.pipe(|mut reader| GxtArchive::read_from(&mut reader))
		.context("Could not decode GXT archive")?;

	fs::create_dir_all(&out_dir).with_context(|| format!("Could not create directory: {}", out_dir.display()))?;

	for (i, texture) in archive.textures.iter().enumerate() {
		let info = &texture.info;
		tracing::debug!("{}: Texture #{}: {}x{} ({}, {})",
			path.display(), i + 1, info.width(), info.height(), info.format(), info.texture_type());

		save_png(texture.image(), &out_dir.join(format!("{stem} (Texture {i}).png")))?;
	};

	if let Some(atlas) = &archive.directory.atlas {
		for (i, (image, entry)) in archive.atlas_images.iter().zip(atlas.entries.iter()).enumerate() {
			tracing::debug!("{}: Block #{}: {}x{} (Origin X:{}, Y:{})",
				path.display(), i + 1, entry.width, entry.height, entry.x, entry.y);

			save_png(image, &out_dir.join(format!("{stem} (Block {i}).png")))?;
		};
	};

	tracing::info!("{}: {} texture(s), {} block(s)", path.display(), archive.textures.len(), archive.atlas_images.len());

	Ok(())
}


fn save_png(image: &image::RgbaImage, path: &Path) -> AnyhowResult<()> {
	image.save_with_format(path, image::ImageFormat::Png)
		.with_context(|| format!("save_with_format to path failed: {}", path.display()))
}


/// Return true if `dir` holds a file whose name starts with `stem`.
fn has_output(dir: &Path, stem: &str) -> bool {
	fs::read_dir(dir)
		.map(|entries| entries
			.filter_map(Result::ok)
			.any(|e| e.file_name().to_string_lossy().starts_with(stem)))
		.unwrap_or(false)
}


/// Recursively collect the files under `dir`.  Unreadable directories and
/// entries are skipped.
fn find_all_files(dir: &Path, entries: &mut Vec<fs::DirEntry>) -> std::io::Result<()> {
	let dir_entries = match fs::read_dir(dir) {
		Ok(entries) => entries,
		Err(_) => return Ok(()),
	};

	for entry in dir_entries {
		let entry = match entry {
			Ok(entry) => entry,
			Err(_) => continue,
		};

		if entry.path().is_dir() {
			find_all_files(&entry.path(), entries)?;
		}
		else {
			entries.push(entry);
		};
	};

	Ok(())
}


#[test]
fn finds_nested_files_and_existing_output() {
	let root = std::env::temp_dir().join(format!("gxttool-test-{}", std::process::id()));
	fs::create_dir_all(root.join("a/b")).unwrap();
	fs::write(root.join("top.gxt"), b"").unwrap();
	fs::write(root.join("a/b/nested.gxt"), b"").unwrap();
	fs::write(root.join("a/b/nested (Texture 0).png"), b"").unwrap();

	let mut entries = vec![];
	find_all_files(&root, &mut entries).unwrap();
	assert_eq!(entries.len(), 3);

	assert!(has_output(&root.join("a/b"), "nested"));
	assert!(!has_output(&root.join("a/b"), "top"));
	assert!(!has_output(&root.join("missing"), "top"));

	fs::remove_dir_all(&root).unwrap();
}
