use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};
use tracing_subscriber::EnvFilter;

mod commands;

/// toothpm - a manifest-driven package manager
#[derive(Parser)]
#[command(name = "toothpm")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Install packages from archive files
    Install {
        /// Package archives (.tar, .tar.gz, .tgz or .zip)
        #[arg(required = true)]
        archives: Vec<String>,

        /// Variant label to install (defaults to the default variant)
        #[arg(long, default_value = "")]
        variant: String,

        /// Show what would be installed without actually installing
        #[arg(long)]
        dry_run: bool,

        /// Skip all lifecycle scripts
        #[arg(long)]
        ignore_scripts: bool,
    },

    /// Uninstall installed packages
    Uninstall {
        /// Package identifiers (tooth or tooth#variant)
        #[arg(required = true)]
        packages: Vec<String>,

        /// Show what would be removed without actually removing
        #[arg(long)]
        dry_run: bool,

        /// Skip all lifecycle scripts
        #[arg(long)]
        ignore_scripts: bool,
    },

    /// List installed packages
    List,

    /// Generate shell completion scripts
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_env("TOOTHPM_LOG").unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_target(false)
        .without_time()
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Install {
            archives,
            variant,
            dry_run,
            ignore_scripts,
        } => commands::install::run(archives, variant, dry_run, ignore_scripts),
        Commands::Uninstall {
            packages,
            dry_run,
            ignore_scripts,
        } => commands::uninstall::run(packages, dry_run, ignore_scripts),
        Commands::List => commands::list::run(),
        Commands::Completions { shell } => {
            let mut cmd = Cli::command();
            generate(shell, &mut cmd, "toothpm", &mut std::io::stdout());
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
