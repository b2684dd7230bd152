use std::path::Path;

use anyhow::{Context, Result};
use clap::{App, Arg, ArgMatches};
use spdlog::{error, Level, LevelFilter};

use inkpress::build::build_site;
use inkpress::config::Config;

fn main() {
    let matches = App::new("inkpress")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Builds a static blog from Markdown posts")
        .arg(
            Arg::with_name("project")
                .short("p")
                .long("project")
                .value_name("DIR")
                .default_value(".")
                .help("The project directory, or any directory beneath it"),
        )
        .arg(
            Arg::with_name("output")
                .short("o")
                .long("output")
                .value_name("DIR")
                .help("Where to write the site (defaults to `output` in the project)"),
        )
        .arg(
            Arg::with_name("prod")
                .long("prod")
                .help("Marks the build as a production build for templates"),
        )
        .arg(
            Arg::with_name("verbose")
                .short("v")
                .long("verbose")
                .conflicts_with("quiet")
                .help("Logs debug output"),
        )
        .arg(
            Arg::with_name("quiet")
                .short("q")
                .long("quiet")
                .help("Only logs warnings and errors"),
        )
        .get_matches();

    set_log_level(&matches);

    if let Err(e) = run(&matches) {
        error!("{:#}", e);
        std::process::exit(1);
    }
}

fn set_log_level(matches: &ArgMatches) {
    let level = if matches.is_present("verbose") {
        Level::Debug
    } else if matches.is_present("quiet") {
        Level::Warn
    } else {
        Level::Info
    };
    spdlog::default_logger().set_level_filter(LevelFilter::MoreSevereEqual(level));
}

fn run(matches: &ArgMatches) -> Result<()> {
    // `project` has a default value.
    let project = Path::new(matches.value_of("project").unwrap_or("."));
    let project = std::fs::canonicalize(project)
        .with_context(|| format!("Resolving project directory `{}`", project.display()))?;
    let config = Config::from_directory(
        &project,
        matches.value_of("output").map(Path::new),
        matches.is_present("prod"),
    )?;
    build_site(&config)?;
    Ok(())
}
