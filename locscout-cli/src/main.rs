use clap::{Args, Parser, Subcommand, ValueEnum};
use colored::Colorize;
use locscout::{
    config::{ConfigOverrides, ScanConfig},
    filters::FileSelector,
    pipeline,
    results::AbilityRecord,
    AbilityStore, ScanError, SearchCase, StoredAbility,
};
use std::{num::NonZeroUsize, path::PathBuf, process::ExitCode};
use tracing_subscriber::EnvFilter;

type Result<T> = std::result::Result<T, ScanError>;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Configuration file (YAML)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error); RUST_LOG takes precedence
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct StoreArgs {
    /// SQLite database (default: xcom2_mods.db)
    #[arg(long)]
    db: Option<PathBuf>,
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    Json,
    Yaml,
    Table,
}

#[derive(Subcommand)]
enum Commands {
    /// Scan a mod directory and merge its abilities into the database
    Scan {
        /// Root directory holding the mods
        path: PathBuf,

        #[command(flatten)]
        store: StoreArgs,

        /// Parse files with this extension (default: int)
        #[arg(short = 'e', long, conflicts_with = "file_name")]
        extension: Option<String>,

        /// Parse only files with exactly this name, e.g. XComGame.int
        #[arg(short = 'f', long)]
        file_name: Option<String>,

        /// Patterns to ignore (glob format)
        #[arg(short, long)]
        ignore: Vec<String>,

        /// Number of threads to use
        #[arg(short = 'j', long)]
        threads: Option<NonZeroUsize>,

        /// Show a progress bar
        #[arg(long)]
        progress: bool,
    },

    /// List stored abilities, optionally filtered by name
    List {
        /// Substring to look for in friendly and template names
        search: Option<String>,

        #[command(flatten)]
        store: StoreArgs,

        /// Match the search term case-sensitively
        #[arg(long)]
        case_sensitive: bool,

        /// Output format
        #[arg(long, value_enum, default_value = "json")]
        format: OutputFormat,
    },

    /// Print the abilities parsed from one file without storing them
    Parse {
        /// Localization file to parse
        file: PathBuf,

        /// Output format
        #[arg(long, value_enum, default_value = "json")]
        format: OutputFormat,
    },
}

fn main() -> ExitCode {
    match run() {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{} {}", "error:".red().bold(), e);
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<ExitCode> {
    let cli = Cli::parse();

    let config = ScanConfig::load_from(cli.config.as_deref())
        .map_err(|e| ScanError::config_error(e.to_string()))?;

    match cli.command {
        Commands::Scan {
            path,
            store,
            extension,
            file_name,
            ignore,
            threads,
            progress,
        } => {
            let selector = match (file_name, extension) {
                (Some(name), _) => Some(FileSelector::FileName(name)),
                (None, Some(ext)) => Some(FileSelector::Extension(ext)),
                (None, None) => None,
            };
            let config = config.merge_with_cli(ConfigOverrides {
                root_path: Some(path),
                selector,
                ignore_patterns: ignore,
                thread_count: threads,
                db_path: store.db,
                show_progress: progress,
                log_level: cli.log_level,
                ..ConfigOverrides::default()
            });
            init_logging(&config.log_level);

            let mut store = AbilityStore::open(&config.db_path)?;
            let summary = pipeline::scan_and_store(&config, &mut store)?;
            println!("{}", serde_json::to_string_pretty(&summary)?);

            Ok(if summary.is_success() {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            })
        }
        Commands::List {
            search,
            store,
            case_sensitive,
            format,
        } => {
            let config = config.merge_with_cli(ConfigOverrides {
                db_path: store.db,
                search_case: case_sensitive.then_some(SearchCase::Sensitive),
                log_level: cli.log_level,
                ..ConfigOverrides::default()
            });
            init_logging(&config.log_level);

            let store = AbilityStore::open(&config.db_path)?.with_search_case(config.search_case);
            let abilities = pipeline::list(&store, search.as_deref())?;
            print_stored(&abilities, format)?;
            Ok(ExitCode::SUCCESS)
        }
        Commands::Parse { file, format } => {
            let config = config.merge_with_cli(ConfigOverrides {
                log_level: cli.log_level,
                ..ConfigOverrides::default()
            });
            init_logging(&config.log_level);

            let records = pipeline::parse_file(&config, &file)?;
            print_records(&records, format)?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn print_stored(abilities: &[StoredAbility], format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(abilities)?),
        OutputFormat::Yaml => print!("{}", serde_yaml::to_string(abilities)?),
        OutputFormat::Table => {
            for ability in abilities {
                print_record_row(&ability.record);
            }
            println!("\n{} abilities", abilities.len());
        }
    }
    Ok(())
}

fn print_records(records: &[AbilityRecord], format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(records)?),
        OutputFormat::Yaml => print!("{}", serde_yaml::to_string(records)?),
        OutputFormat::Table => {
            for record in records {
                print_record_row(record);
            }
            println!("\n{} abilities", records.len());
        }
    }
    Ok(())
}

fn print_record_row(record: &AbilityRecord) {
    println!(
        "\n{} {}",
        record.template_name.blue(),
        record.friendly_name.green()
    );
    for (label, text) in [
        ("description", &record.description),
        ("help", &record.help_text),
        ("promotion", &record.promotion_text),
        ("flyover", &record.flyover_text),
    ] {
        if !text.is_empty() {
            println!("  {}: {}", label.dimmed(), text);
        }
    }
    println!("  {}: {}", "source".dimmed(), record.source_file.display());
}
