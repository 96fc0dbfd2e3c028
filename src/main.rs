// SPDX-License-Identifier: GPL-3.0-only
// Copyright (C) 2025 Brian Hetro <whee@smaertness.net>

//! Command-line interface for bpschema.
//!
//! This binary provides the `bpschema` command, which reads every Soong
//! reference page in a directory and writes one schema file.

use bpschema::{parser, writer};
use lexopt::prelude::*;
use log::{LevelFilter, info};
use snafu::{OptionExt, ensure, prelude::*};
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

struct Cli {
    input: Option<PathBuf>,
    output: Option<PathBuf>,
    format: writer::OutputFormat,
    quiet: bool,
}

#[derive(Debug, Snafu)]
enum Error {
    #[snafu(display("failed to parse arguments: {source}"))]
    ParseArgs { source: lexopt::Error },

    #[snafu(display("input folder is not specified (use --in)"))]
    MissingInput,

    #[snafu(display("output file is not specified (use --out)"))]
    MissingOutput,

    #[snafu(display("input folder {} does not exist", path.display()))]
    InputNotFound { path: PathBuf },

    #[snafu(display("there is a folder with the output file name {}", path.display()))]
    OutputIsDirectory { path: PathBuf },

    #[snafu(display("output folder {} does not exist", path.display()))]
    OutputDirNotFound { path: PathBuf },

    #[snafu(display("failed to create {}: {source}", path.display()))]
    CreateOutput {
        path: PathBuf,
        source: std::io::Error,
    },

    #[snafu(display("failed to list {}: {source}", path.display()))]
    ListInput {
        path: PathBuf,
        source: walkdir::Error,
    },

    #[snafu(display("failed to read {}: {source}", path.display()))]
    ReadFile {
        path: PathBuf,
        source: std::io::Error,
    },

    #[snafu(display("failed to parse {}: {source}", path.display()))]
    ParseFile {
        path: PathBuf,
        source: parser::ParseError,
    },

    #[snafu(display("failed to write {}: {source}", path.display()))]
    WriteOutput {
        path: PathBuf,
        source: writer::WriteError,
    },
}

fn print_help() {
    println!(
        "\
{name} {version}
Extract Soong blueprint field schemas from reference HTML docs

Usage: {name} --in <DIR> --out <FILE> [OPTIONS]

Options:
  -i, --in <DIR>         Folder containing the *.html reference pages
  -o, --out <FILE>       Schema file to write
      --format <FORMAT>  Output format: xml or text (default: xml)
  -q, --quiet            Suppress progress messages
  -h, --help             Print help
  -V, --version          Print version",
        name = env!("CARGO_PKG_NAME"),
        version = env!("CARGO_PKG_VERSION"),
    );
}

fn parse_args() -> Result<Cli, lexopt::Error> {
    let mut input = None;
    let mut output = None;
    let mut format = writer::OutputFormat::default();
    let mut quiet = false;

    let mut parser = lexopt::Parser::from_env();
    while let Some(arg) = parser.next()? {
        match arg {
            Short('i') | Long("in") => input = Some(parser.value()?.parse()?),
            Short('o') | Long("out") => output = Some(parser.value()?.parse()?),
            Long("format") => format = parser.value()?.parse()?,
            Short('q') | Long("quiet") => quiet = true,
            Short('h') | Long("help") => {
                print_help();
                std::process::exit(0);
            }
            Short('V') | Long("version") => {
                println!("{} {}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"));
                std::process::exit(0);
            }
            _ => return Err(arg.unexpected()),
        }
    }

    Ok(Cli {
        input,
        output,
        format,
        quiet,
    })
}

fn init_logger(quiet: bool) {
    let level = if quiet {
        LevelFilter::Warn
    } else {
        LevelFilter::Info
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_env("RUST_LOG")
        .format_timestamp(None)
        .format_target(false)
        .init();
}

fn main() -> Result<(), Error> {
    let cli = parse_args().context(ParseArgsSnafu)?;
    init_logger(cli.quiet);

    let input = cli.input.context(MissingInputSnafu)?;
    let output = cli.output.context(MissingOutputSnafu)?;
    ensure!(input.is_dir(), InputNotFoundSnafu { path: input });
    ensure!(!output.is_dir(), OutputIsDirectorySnafu { path: output });
    if let Some(parent) = output.parent()
        && !parent.as_os_str().is_empty()
    {
        ensure!(parent.is_dir(), OutputDirNotFoundSnafu { path: parent });
    }

    let files = collect_input_files(&input)?;
    convert(&files, &output, cli.format)
}

/// Collects the HTML pages directly inside `dir`, sorted by file name.
fn collect_input_files(dir: &Path) -> Result<Vec<PathBuf>, Error> {
    let mut files = Vec::new();
    for entry in WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
    {
        let entry = entry.context(ListInputSnafu { path: dir })?;
        let path = entry.path();
        if entry.file_type().is_file() && path.extension().is_some_and(|ext| ext == "html") {
            files.push(path.to_path_buf());
        }
    }
    Ok(files)
}

/// Parses every page in order and writes all blueprints to `out_path`.
fn convert(files: &[PathBuf], out_path: &Path, format: writer::OutputFormat) -> Result<(), Error> {
    let out = File::create(out_path).context(CreateOutputSnafu { path: out_path })?;
    let mut schema = format.writer(BufWriter::new(out));
    schema.start().context(WriteOutputSnafu { path: out_path })?;

    let mut total = 0;
    for path in files {
        info!("Reading {}...", path.display());
        let file = File::open(path).context(ReadFileSnafu { path })?;
        let blueprints =
            parser::parse_reader(BufReader::new(file)).context(ParseFileSnafu { path })?;

        for blueprint in &blueprints {
            blueprint
                .print(schema.as_mut())
                .context(WriteOutputSnafu { path: out_path })?;
        }
        total += blueprints.len();
    }

    schema.end().context(WriteOutputSnafu { path: out_path })?;
    info!(
        "Wrote {} ({total} blueprints from {} files)",
        out_path.display(),
        files.len()
    );
    Ok(())
}
