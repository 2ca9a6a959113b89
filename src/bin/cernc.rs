use std::{fs, path::PathBuf, process::ExitCode};

use cern::{
    codegen::Backend,
    session::{self, Options},
};
use clap::Parser;
use log::LevelFilter;

/// Compiles a cern source file into C++ source or x86-64 assembly.
#[derive(Parser, Debug)]
#[command(name = "cernc", version)]
struct Args {
    /// Source file.
    file: PathBuf,

    /// Output form: `text` (C++) or `stack` (NASM).
    #[arg(short, long, default_value = "text")]
    backend: Backend,

    /// Output file. Defaults to `out.cpp` or `out.asm`, after the backend.
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Maximum number of tree nodes of each kind.
    #[arg(long, default_value_t = Options::default().max_nodes)]
    max_nodes: usize,

    /// Verbose mode (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

impl Args {
    fn enable_log(&self) {
        let mut builder = env_logger::Builder::from_default_env();
        match self.verbose {
            0 => {}
            1 => {
                builder.filter_level(LevelFilter::Info);
            }
            2 => {
                builder.filter_level(LevelFilter::Debug);
            }
            _ => {
                builder.filter_level(LevelFilter::Trace);
            }
        }
        builder.init();
    }
}

fn main() -> ExitCode {
    let args = Args::parse();
    args.enable_log();

    let src = match fs::read_to_string(&args.file) {
        Ok(src) => src,
        Err(error) => {
            eprintln!("[Error] can't read {}: {error}", args.file.display());
            return ExitCode::FAILURE;
        }
    };

    let options = Options {
        backend: args.backend,
        max_nodes: args.max_nodes,
    };
    let output = match session::compile(&src, &options) {
        Ok(output) => output,
        Err(diagnostic) => {
            eprintln!("{diagnostic}");
            return ExitCode::FAILURE;
        }
    };

    let path = args
        .output
        .unwrap_or_else(|| PathBuf::from(options.backend.default_output()));
    if let Err(error) = fs::write(&path, output) {
        eprintln!("[Error] can't write {}: {error}", path.display());
        return ExitCode::FAILURE;
    }
    log::info!("wrote {}", path.display());
    ExitCode::SUCCESS
}
