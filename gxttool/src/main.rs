use anyhow::{Context, Result as AnyhowResult};

mod convert;
mod decode;
mod info;


fn construct_app() -> clap::Command<'static> {
	clap::Command::new("gxttool")
		.version(clap::crate_version!())
		.setting(clap::AppSettings::DeriveDisplayOrder)
		.arg(clap::arg!(loglevel: -L "Global log verbosity level")
			.ignore_case(true)
			.possible_values(["Error", "Warn", "Info", "Debug", "Trace"])
			.default_value("Info"))
		.subcommand(clap::Command::new("convert")
			.about("Convert GXT archives to PNG, one file per texture and atlas entry")
			.arg(clap::arg!(output: -o --output <OUTDIR> "Output directory"))
			.arg(clap::arg!(keep: -k --keep "Skip archives that already have output files").takes_value(false))
			.arg(clap::arg!(input: <INPUT> ... "GXT file or directory to convert recursively")))
		.subcommand(clap::Command::new("decode")
			.about("Decode a single GXT texture to PNG")
			.arg(clap::arg!(texture: -t "1-based texture index").default_value("1"))
			.arg(clap::arg!(gxt: <GXT> "GXT input file"))
			.arg(clap::arg!(png: <PNG> "PNG output path")))
		.subcommand(clap::Command::new("info")
			.about("Parse GXT archive tables and print details")
			.arg(clap::arg!(brief: -b --brief "Do not prepend file name to output").takes_value(false))
			.arg(clap::arg!(input: <INPUT> ... "GXT file to parse")))
}


fn gxttool() -> AnyhowResult<()> {
	let matches = construct_app().get_matches_from(wild::args());
	let loglevel_str = matches.value_of("loglevel")
		.unwrap_or("Info");
	let loglevel = loglevel_str
		.parse::<tracing::Level>()
		.with_context(|| format!("Failed to parse loglevel from -L{}", loglevel_str))?;

	tracing_subscriber::fmt()
		.with_max_level(loglevel)
		.init();

	tracing::trace!("Global loglevel set to {:?}", loglevel);

	match matches.subcommand() {
		Some(("convert", matches)) => {
			convert::command_convert(matches)
		},

		Some(("decode", matches)) => {
			decode::command_decode(matches)
		},

		Some(("info", matches)) => {
			info::command_info(matches)
		},

		Some((&_, _)) => unreachable!(),

		None => {
			let _ = construct_app().print_help();
			Ok(())
		},
	}
}


fn main() -> AnyhowResult<()> {
	match gxttool() {
		Ok(()) => Ok(()),
		Err(e) => { tracing::error!("{:?}", e); Err(e) },
	}
}


#[test]
fn app_is_valid() {
	construct_app().debug_assert();
}
