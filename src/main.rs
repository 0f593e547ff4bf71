use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, bail};
use clap::Parser;
use log::{Level, LevelFilter, Log, Metadata, Record};

use exx::types::SignatureTable;
use exx::{CodegenOptions, Compiler, CompilerOptions};

#[derive(Parser)]
#[command(name = "exx", about = "Compile exx modules to Lua")]
struct Cli {
    /// Source files, compiled in the given order
    #[arg(required = true)]
    files: Vec<PathBuf>,
    /// Output directory (defaults to next to each source file)
    #[arg(short, long)]
    output: Option<PathBuf>,
    /// Additional foreign signatures (`name: type;` and `lua.path as name: type;` lines)
    #[arg(long)]
    signatures: Option<PathBuf>,
    /// Always call functions through their curried form
    #[arg(long)]
    no_flatten: bool,
    /// Log compiler decisions to stderr (repeat for more)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

struct StderrLogger;

impl Log for StderrLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            let level = match record.level() {
                Level::Error => "error",
                Level::Warn => "warn",
                Level::Info => "info",
                Level::Debug => "debug",
                Level::Trace => "trace",
            };
            eprintln!("[{}] {}", level, record.args());
        }
    }

    fn flush(&self) {}
}

static LOGGER: StderrLogger = StderrLogger;

fn module_name(file: &Path) -> anyhow::Result<String> {
    file.file_stem()
        .and_then(|stem| stem.to_str())
        .map(str::to_string)
        .with_context(|| format!("cannot derive a module name from {}", file.display()))
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    log::set_logger(&LOGGER).map_err(|e| anyhow::anyhow!("failed to install logger: {}", e))?;
    log::set_max_level(match cli.verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    });

    let mut signatures = SignatureTable::try_prelude().context("built-in foreign signatures")?;
    if let Some(path) = &cli.signatures {
        let source = fs::read_to_string(path).with_context(|| format!("could not read {}", path.display()))?;
        signatures.extend(SignatureTable::parse(&source).with_context(|| format!("in {}", path.display()))?);
    }

    let mut compiler = Compiler::new(CompilerOptions {
        codegen: CodegenOptions {
            flatten_calls: !cli.no_flatten,
            ..Default::default()
        },
        signatures,
    });

    if let Some(dir) = &cli.output {
        fs::create_dir_all(dir).with_context(|| format!("could not create {}", dir.display()))?;
    }

    for file in &cli.files {
        let name = module_name(file)?;
        let source = fs::read_to_string(file).with_context(|| format!("could not read {}", file.display()))?;

        let compiled = match compiler.compile_source(&name, &source) {
            Ok(compiled) => compiled,
            Err(err) => {
                eprintln!("{}: {}", file.display(), err.render());
                bail!("compilation of {} failed", file.display());
            }
        };

        let target = match &cli.output {
            Some(dir) => dir.join(format!("{}.lua", name)),
            None => file.with_extension("lua"),
        };
        fs::write(&target, &compiled.lua).with_context(|| format!("could not write {}", target.display()))?;
        log::info!("wrote {}", target.display());
    }

    Ok(())
}
