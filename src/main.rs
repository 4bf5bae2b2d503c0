use anyhow::{Context, Result};
use camino::{Utf8Path, Utf8PathBuf};
use clap::{Parser, Subcommand};
use std::process::ExitCode;
use tiaprobe::config::{self, Config};
use tiaprobe::export::{ContentSource, ExportedProject, FsSource, PlcSoftware, ZipSource};
use tiaprobe::library::check_library;
use tiaprobe::model::BlockGroup;
use tiaprobe::BlockParameterResolver;
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[derive(Parser, Debug)]
#[command(author, version, about = "Inspect exported TIA Portal program blocks", long_about = None)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "tiaprobe.toml")]
    config: Utf8PathBuf,

    /// Directory exported block files are written to (overrides the config)
    #[arg(long)]
    export_dir: Option<Utf8PathBuf>,

    /// Log level (trace, debug, info, warn, error) or filter directives
    #[arg(short, long, default_value = "warn")]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the program block tree
    Blocks {
        /// Directory or .zip of exported block XML files
        #[arg(value_name = "SOURCE")]
        source: Utf8PathBuf,
        /// Output JSON instead of human-readable text
        #[arg(long)]
        json: bool,
    },
    /// Resolve the literal value feeding a network parameter
    Para {
        #[arg(value_name = "SOURCE")]
        source: Utf8PathBuf,
        /// Block name
        block: String,
        /// Parameter (tag) name
        parameter: String,
    },
    /// Check library blocks against the versions in the config
    Library {
        #[arg(value_name = "SOURCE")]
        source: Utf8PathBuf,
        /// Output JSON instead of human-readable text
        #[arg(long)]
        json: bool,
    },
}

/// Filter for `--log-level`, which also accepts directives such as
/// `tiaprobe=debug`. Unparsable input falls back to `warn`.
fn log_filter(level: &str) -> EnvFilter {
    EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("warn"))
}

fn init_logging(level: &str) -> Result<()> {
    // RUST_LOG wins over the command line.
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| log_filter(level));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}

fn open_project(path: &Utf8Path) -> Result<ExportedProject<Box<dyn ContentSource>>> {
    if path.extension() == Some("zip") {
        let file = std::fs::File::open(path).with_context(|| format!("Open {}", path))?;
        let reader = std::io::BufReader::new(file);
        let source: Box<dyn ContentSource> = Box::new(ZipSource::new(reader)?);
        ExportedProject::open(source, "")
    } else {
        let source: Box<dyn ContentSource> = Box::new(FsSource);
        ExportedProject::open(source, path)
    }
}

fn print_tree(group: &BlockGroup, depth: usize) {
    println!("{}{}/", "  ".repeat(depth), group.name);
    for block in &group.blocks {
        println!(
            "{}{:<40} {}{:<6} {}",
            "  ".repeat(depth + 1),
            block.name,
            block.kind.prefix(),
            block.number,
            block.language.as_deref().unwrap_or("")
        );
    }
    for sub in &group.groups {
        print_tree(sub, depth + 1);
    }
}

fn run(cli: Cli) -> Result<ExitCode> {
    let mut cfg: Config = config::load_config(&cli.config)?;
    if let Some(dir) = cli.export_dir {
        cfg.export.dir = dir;
    }
    info!(export_dir = %cfg.export.dir, "configuration loaded");

    match cli.command {
        Command::Blocks { source, json } => {
            let project = open_project(&source)?;
            if json {
                println!("{}", serde_json::to_string_pretty(project.block_tree())?);
            } else {
                print_tree(project.block_tree(), 0);
            }
        }
        Command::Para {
            source,
            block,
            parameter,
        } => {
            let project = open_project(&source)?;
            let mut resolver = BlockParameterResolver::new(project, &cfg.export.dir, cfg.function_port_table());
            let value = resolver.get_nwk_para(&block, &parameter)?;
            println!("{}", value);
        }
        Command::Library { source, json } => {
            let project = open_project(&source)?;
            let mut resolver = BlockParameterResolver::new(project, &cfg.export.dir, cfg.function_port_table());
            let findings = check_library(&mut resolver, &cfg.library, &cfg.resolver.version_parameter);
            if json {
                println!("{}", serde_json::to_string_pretty(&findings)?);
            } else {
                for f in &findings {
                    println!("{:<40} expected {:<12} {:?}", f.block, f.expected, f.status);
                }
            }
            if !findings.iter().all(|f| f.is_current()) {
                return Ok(ExitCode::FAILURE);
            }
        }
    }
    Ok(ExitCode::SUCCESS)
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    init_logging(&cli.log_level)?;
    run(cli)
}
