#![no_main]
use libfuzzer_sys::fuzz_target;

use std::io::Cursor;

use vita_gxt::{GxtArchive, GxtDirectory};

fuzz_target!(|data: &[u8]| {
	let directory = GxtDirectory::read_from(&mut Cursor::new(data));
	let archive = GxtArchive::from_bytes(data);

	if let Ok(archive) = archive {
		assert_eq!(Ok(&archive.directory), directory.as_ref().map_err(|_| ()));
		assert_eq!(archive.textures.len(), archive.directory.infos.len());

		for texture in archive.textures.iter() {
			assert_eq!(texture.image().dimensions(), (texture.info.width(), texture.info.height()));
		};
	};
});
