use std::path::{Path, PathBuf};

use clap::{ArgAction, Parser, ValueEnum};
use log::LevelFilter;

#[derive(Parser, Debug)]
#[command(name = "jackc", version, about = "Compiles Jack classes into VM code.")]
pub struct Cli {
    /// A .jack file, or a directory whose .jack files are all compiled
    pub path: PathBuf,
    /// Where to write output files (default: next to each source file)
    #[arg(short, long)]
    pub out_dir: Option<PathBuf>,
    /// What to write for each class
    #[arg(long, value_enum, default_value_t = Emit::Vm)]
    pub emit: Emit,
    /// Log more (-v for progress, -vv for compiler internals)
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,
}

impl Cli {
    /// Logging level before `RUST_LOG` is applied.
    pub fn log_level(&self) -> LevelFilter {
        match self.verbose {
            0 => LevelFilter::Warn,
            1 => LevelFilter::Info,
            2 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        }
    }

    /// Where the output for `source` goes.
    pub fn output_path(&self, source: &Path) -> PathBuf {
        let stem = source
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let file_name = match self.emit {
            Emit::Vm => format!("{}.vm", stem),
            Emit::Tokens => format!("{}T.xml", stem),
        };
        let dir = match &self.out_dir {
            Some(dir) => dir.as_path(),
            None => source.parent().unwrap_or_else(|| Path::new("")),
        };
        dir.join(file_name)
    }
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum Emit {
    /// VM instructions (`Name.vm`)
    Vm,
    /// The token listing (`NameT.xml`)
    Tokens,
}
