use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::debug;

use partlog::cli::{
    handle_element_command, handle_export_command, handle_log_command, ElementCommands,
    ExportArgs, LogCommands,
};
use partlog::config::{PartLogPaths, Settings};
use partlog::logging::init_tracing;
use partlog::models::{TARGET_TYPE_TABLE, TARGET_TYPE_TABLE_VERSION};
use partlog::storage::Storage;

#[derive(Parser)]
#[command(
    name = "partlog",
    version,
    about = "Audit log and history for Part-DB elements",
    long_about = "partlog records every creation, edit and deletion of inventory \
                  elements together with the acting user, and answers history \
                  questions from that log: who changed what and when, and what \
                  an element looked like at any point in time."
)]
struct Cli {
    /// Only log errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,

    /// Log debug output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Element management commands
    #[command(subcommand)]
    Element(ElementCommands),

    /// History and attribution queries
    #[command(subcommand)]
    Log(LogCommands),

    /// Export history as CSV, JSON or YAML
    Export(ExportArgs),

    /// Initialize the data directory
    Init,

    /// Show current configuration and paths
    Config,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize paths and settings
    let paths = PartLogPaths::new()?;
    let settings = Settings::load_or_create(&paths)?;
    init_tracing(cli.quiet, cli.verbose, &settings.log_filter)?;
    debug!(base_dir = %paths.base_dir().display(), "resolved paths");

    // Initialize storage
    let storage = Storage::new(paths.clone())?;
    storage.load_all()?;

    match cli.command {
        Some(Commands::Element(cmd)) => handle_element_command(&storage, cmd)?,
        Some(Commands::Log(cmd)) => handle_log_command(&storage, &settings, cmd)?,
        Some(Commands::Export(args)) => handle_export_command(&storage, &settings, args)?,
        Some(Commands::Init) => {
            println!("Initializing partlog at: {}", paths.base_dir().display());
            settings.save(&paths)?;
            storage.elements.save()?;
            println!("Initialization complete!");
            println!();
            println!("Run 'partlog element create part \"My part\"' to track your first element.");
        }
        Some(Commands::Config) => {
            println!("partlog Configuration");
            println!("=====================");
            println!("Base directory:   {}", paths.base_dir().display());
            println!("Log file:         {}", paths.log_file().display());
            println!("Elements file:    {}", paths.elements_file().display());
            println!("Export directory: {}", paths.export_dir().display());
            println!("Initialized:      {}", storage.is_initialized());
            println!();
            println!("Settings:");
            println!("  History page size:     {}", settings.history_page_size);
            println!("  Default order:         {:?}", settings.default_order);
            println!("  Log filter:            {}", settings.log_filter);
            println!("  Default export format: {}", settings.default_export_format);
            println!();
            println!("Target types (table v{}):", TARGET_TYPE_TABLE_VERSION);
            for (_, code, name) in TARGET_TYPE_TABLE.iter() {
                println!("  {:>2}  {}", code, name);
            }
        }
        None => {
            println!("partlog - audit log and history for Part-DB elements");
            println!();
            println!("Run 'partlog --help' for usage information.");
        }
    }

    Ok(())
}
