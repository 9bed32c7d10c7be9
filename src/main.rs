use blogsplice::config::Config;
use blogsplice::update::{update_blog, Options};
use clap::{App, Arg, ArgMatches};
use log::{error, warn};
use std::path::{Path, PathBuf};

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let matches = App::new("blogsplice")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Splices the most recent document in a folder into a blog page")
        .arg(
            Arg::with_name("config")
                .long("config")
                .short("c")
                .takes_value(true)
                .value_name("FILE")
                .help("Path to blogsplice.yaml (default: searched upward from the current directory)"),
        )
        .arg(
            Arg::with_name("folder")
                .long("folder")
                .takes_value(true)
                .value_name("DIR")
                .help("Folder scanned for the most recent document"),
        )
        .arg(
            Arg::with_name("page")
                .long("page")
                .takes_value(true)
                .value_name("FILE")
                .help("The HTML page to insert the post into"),
        )
        .arg(
            Arg::with_name("anchor")
                .long("anchor")
                .takes_value(true)
                .value_name("TEXT")
                .help("The literal text after which the post is inserted"),
        )
        .arg(
            Arg::with_name("extension")
                .long("extension")
                .takes_value(true)
                .value_name("EXT")
                .help("Extension of candidate documents (docx, txt, md)"),
        )
        .arg(
            Arg::with_name("dry-run")
                .long("dry-run")
                .help("Print the post that would be inserted without writing or committing"),
        )
        .arg(
            Arg::with_name("no-publish")
                .long("no-publish")
                .help("Write the page but don't commit or push it"),
        )
        .get_matches();

    match run(&matches) {
        Ok(status) => println!("{}", status),
        Err(e) => {
            error!("{}", e);
            let mut source = e.source();
            while let Some(cause) = source {
                error!("  caused by: {}", cause);
                source = cause.source();
            }
            std::process::exit(1);
        }
    }
}

fn run(matches: &ArgMatches) -> Result<String, Box<dyn std::error::Error>> {
    let mut config = load_config(matches.value_of("config"))?;

    if let Some(folder) = matches.value_of("folder") {
        config.document_folder = PathBuf::from(folder);
    }
    if let Some(page) = matches.value_of("page") {
        config.page_path = PathBuf::from(page);
    }
    if let Some(anchor) = matches.value_of("anchor") {
        config.anchor_marker = anchor.to_owned();
    }
    if let Some(extension) = matches.value_of("extension") {
        config.extension_filter = extension.trim_start_matches('.').to_owned();
    }

    let options = Options {
        dry_run: matches.is_present("dry-run"),
        publish: !matches.is_present("no-publish"),
    };
    Ok(update_blog(&config, &options)?.to_string())
}

fn load_config(path: Option<&str>) -> Result<Config, Box<dyn std::error::Error>> {
    if let Some(path) = path {
        return Ok(Config::from_project_file(Path::new(path))?);
    }
    let cwd = std::env::current_dir()?;
    match Config::from_directory(&cwd)? {
        Some(config) => Ok(config),
        None => {
            warn!(
                "no `{}` found; using defaults relative to `{}`",
                blogsplice::config::PROJECT_FILE,
                cwd.display()
            );
            Ok(Config::with_defaults(&cwd))
        }
    }
}
