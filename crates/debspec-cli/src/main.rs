mod check;
mod config;
mod installed;
mod output;

use anyhow::Result;
use clap::{ArgAction, Parser, Subcommand};
use config::DebspecConfig;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser, Debug)]
#[command(name = "debspec")]
#[command(about = "Check Debian package versions against version specifiers")]
#[command(version)]
struct Args {
    #[command(subcommand)]
    command: Commands,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    /// Print reports as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Configuration file (default: debspec.toml, searched upward)
    #[arg(short, long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Check whether a version meets specifiers
    Check(check::CheckArgs),

    /// Compare two versions, printing -1, 0 or 1
    Compare(check::CompareArgs),

    /// Intersect specifier sets into a reduced set
    Intersect(check::IntersectArgs),

    /// Merge specifier sets without reducing them
    Union(check::UnionArgs),

    /// Show the installed version of a package from its changelog
    Installed(installed::InstalledArgs),

    /// Check every configured package against its specifiers
    ///
    /// Without a [packages] table the yunohost, yunohost-admin, moulinette and
    /// ssowat packages are listed with no requirement.
    Verify(installed::VerifyArgs),
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp(None)
        .init();
}

fn load_config(path: Option<&PathBuf>) -> Result<DebspecConfig> {
    match path {
        Some(path) => DebspecConfig::from_path(path),
        None => Ok(DebspecConfig::load_from_cwd()?.unwrap_or_default()),
    }
}

fn run() -> Result<i32> {
    let args = Args::parse();
    init_logging(args.verbose);

    match args.command {
        Commands::Check(check_args) => check::check(check_args, args.json),
        Commands::Compare(compare_args) => check::compare(compare_args, args.json),
        Commands::Intersect(intersect_args) => check::intersect(intersect_args, args.json),
        Commands::Union(union_args) => check::union(union_args, args.json),
        Commands::Installed(installed_args) => {
            let config = load_config(args.config.as_ref())?;
            installed::installed(installed_args, &config, args.json)
        }
        Commands::Verify(verify_args) => {
            let config = load_config(args.config.as_ref())?;
            installed::verify(verify_args, &config, args.json)
        }
    }
}

fn main() -> ExitCode {
    match run() {
        Ok(code) => ExitCode::from(code as u8),
        Err(e) => {
            eprintln!("Error: {}", e);
            for cause in e.chain().skip(1) {
                eprintln!("  Caused by: {}", cause);
            }
            ExitCode::FAILURE
        }
    }
}
