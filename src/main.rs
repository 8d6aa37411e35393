mod cli;
mod error;
mod generator;
mod xsd;

use std::path::{Path, PathBuf};

use clap::Parser;
use log::{debug, LevelFilter};
use simplelog::{Config, SimpleLogger};

use error::Error;
use xsd::Schema;

fn main() {
    init_logger();

    let cli = match cli::Cli::try_parse() {
        Ok(cli) => cli,
        Err(error) => {
            let _ = error.print();
            std::process::exit(1);
        }
    };

    if let Err(error) = run(cli) {
        eprintln!("{error}");
        std::process::exit(1);
    }
}

/// Logging is opt-in via `XSDCPP_LOG` (e.g. `debug`); stderr stays
/// silent on a successful run otherwise.
fn init_logger() {
    let level = std::env::var("XSDCPP_LOG")
        .ok()
        .and_then(|level| level.parse().ok())
        .unwrap_or(LevelFilter::Off);
    let _ = SimpleLogger::init(level, Config::default());
}

fn run(cli: cli::Cli) -> Result<(), Error> {
    let package = cli
        .package
        .ok_or_else(|| Error::Usage("missing required option --package".to_string()))?;
    if cli.java {
        return Err(Error::Usage(
            "the java backend is not built into this binary".to_string(),
        ));
    }

    let schema = Schema::load(&cli.input)?;

    let options = generator::Options {
        package,
        writer: cli.writer,
        boolean_getter: cli.boolean_getter,
        tinyxml: cli.tinyxml,
        enums_only: cli.gen_enums_only,
        parser_only: cli.gen_parser_only,
        roots: cli.root,
    };
    let files = generator::generate(&schema, &options)?;

    let include_dir = cli.out_dir.join("include");
    create_dir(&include_dir)?;
    let stem = &files.file_stem;
    write_output(
        &include_dir.join(format!("{stem}_enums.h")),
        &files.enums_header,
    )?;
    write_output(&include_dir.join(format!("{stem}.h")), &files.parser_header)?;
    write_output(
        &cli.out_dir.join(format!("{stem}_enums.cpp")),
        &files.enums_impl,
    )?;
    write_output(&cli.out_dir.join(format!("{stem}.cpp")), &files.parser_impl)?;

    if let Some(depfile) = cli.depfile.as_ref() {
        write_depfile(
            depfile,
            &cli.out_dir.join(format!("{stem}.cpp")),
            &cli.input,
            &schema.included_files,
        )?;
    }

    debug!("generated {stem} into {}", cli.out_dir.display());
    Ok(())
}

fn create_dir(path: &Path) -> Result<(), Error> {
    std::fs::create_dir_all(path).map_err(|e| Error::Output {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })
}

fn write_output(path: &Path, content: &str) -> Result<(), Error> {
    std::fs::write(path, content).map_err(|e| Error::Output {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })
}

/// One ninja-style line: the generated parser depends on the input
/// schema and everything it included.
fn write_depfile(
    path: &Path,
    target: &Path,
    input: &Path,
    included: &[PathBuf],
) -> Result<(), Error> {
    let mut dependencies = vec![input.display().to_string()];
    dependencies.extend(included.iter().map(|p| p.display().to_string()));
    let content = format!(
        "{}: {}\n",
        target.display(),
        dependencies.join(" \\\n  ")
    );
    std::fs::write(path, content).map_err(|e| Error::Output {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })
}
