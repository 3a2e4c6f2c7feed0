use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::Parser;
use jackc::cli::{Cli, Emit};

/// The `.jack` files to compile: the path itself, or the files directly inside it sorted by
/// name.
fn input_files(path: &Path) -> Result<Vec<PathBuf>> {
    if !path.is_dir() {
        return Ok(vec![path.to_path_buf()]);
    }
    let mut files = Vec::new();
    let entries = std::fs::read_dir(path)
        .with_context(|| format!("Failed to read directory '{}'", path.display()))?;
    for entry in entries {
        let file = entry?.path();
        if file.is_file() && file.extension().is_some_and(|ext| ext == "jack") {
            files.push(file);
        }
    }
    files.sort();
    Ok(files)
}

fn compile_file(cli: &Cli, source_path: &Path) -> Result<PathBuf> {
    let file_contents = std::fs::read_to_string(source_path)
        .with_context(|| format!("Failed to open input file '{}'", source_path.display()))?;
    let filename = source_path.display().to_string();
    let output = match cli.emit {
        Emit::Vm => jackc::compile(&file_contents, &filename)?,
        Emit::Tokens => jackc::tokens_xml(&file_contents, &filename)?,
    };
    let output_path = cli.output_path(source_path);
    std::fs::write(&output_path, output)
        .with_context(|| format!("Failed to write '{}'", output_path.display()))?;
    Ok(output_path)
}

fn run(cli: &Cli) -> Result<()> {
    if let Some(dir) = &cli.out_dir {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create '{}'", dir.display()))?;
    }
    let files = input_files(&cli.path)?;
    if files.is_empty() {
        bail!("No .jack files found in '{}'", cli.path.display());
    }
    let mut failures = 0;
    // Every class is independent, so one failure does not stop the others.
    for source_path in &files {
        match compile_file(cli, source_path) {
            Ok(output_path) => log::info!(
                "compiled '{}' to '{}'",
                source_path.display(),
                output_path.display()
            ),
            Err(err) => {
                eprintln!("{:#}", err);
                failures += 1;
            }
        }
    }
    if failures > 0 {
        bail!("{} of {} files failed to compile", failures, files.len());
    }
    Ok(())
}

fn main() {
    let cli = Cli::parse();
    env_logger::Builder::new()
        .filter_level(cli.log_level())
        .parse_default_env()
        .init();

    if let Err(err) = run(&cli) {
        eprintln!("{:#}", err);
        std::process::exit(1);
    }
}
