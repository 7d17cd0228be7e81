//! git-versioned - inspect and restore a versioned record repository.
//!
//! This is the command-line entry point. Record types are discovered from
//! the top-level directories of the working tree.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use git_versioned::versioning::TypeName;
use git_versioned::{BlobPath, CommitInfo, Versioning, VersioningConfig};

#[derive(Debug, Parser)]
#[command(name = "git-versioned", version, about = "Git-backed versioned records")]
struct Cli {
    /// Path to the repository working tree
    #[arg(short = 'd', long = "repository", default_value = "acts_as_git_versioned.git")]
    repository: PathBuf,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// List snapshots, most recent first
    Log {
        /// Show at most this many commits
        #[arg(short = 'n', long)]
        limit: Option<usize>,
    },
    /// Show whether the working tree has uncommitted changes
    Status,
    /// Print a record's stored attributes
    Show {
        type_name: String,
        id: String,
        /// Revision to read from
        #[arg(long, default_value = "HEAD")]
        at: String,
    },
    /// Commit every outstanding change
    Commit {
        /// Message body
        #[arg(short, long)]
        message: Option<String>,
        /// Summary line
        #[arg(short, long)]
        summary: Option<String>,
    },
    /// Restore the whole working tree from an earlier commit
    Revert {
        /// Target revision (defaults to the parent of HEAD)
        rev: Option<String>,
        /// Record the restoration as a new commit
        #[arg(long)]
        commit: bool,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "git_versioned=debug" } else { "git_versioned=warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run(cli: Cli) -> Result<()> {
    let config = VersioningConfig::new(&cli.repository).create_if_missing(false);
    let versioning = Versioning::open(config)
        .with_context(|| format!("opening {}", cli.repository.display()))?;
    track_existing_types(&versioning)?;

    match cli.command {
        Command::Log { limit } => {
            let history = versioning.history()?;
            if history.is_empty() {
                println!("(no commits)");
            }
            for commit in history.iter().take(limit.unwrap_or(usize::MAX)) {
                print_commit(commit);
            }
        }
        Command::Status => {
            if versioning.repository().is_dirty()? {
                println!("uncommitted changes");
            } else {
                println!("clean");
            }
        }
        Command::Show { type_name, id, at } => {
            let path = BlobPath::resolve(&type_name, &id)?;
            let commit = versioning.repository().resolve(&at)?;
            match versioning.read_path_at(&path, commit)? {
                Some(attributes) => println!("{}", serde_json::to_string_pretty(&attributes)?),
                None => anyhow::bail!("no {} '{}' at {}", type_name, id, commit.short()),
            }
        }
        Command::Commit { message, summary } => {
            let id = versioning.commit(message.as_deref(), summary.as_deref())?;
            print_commit(&versioning.repository().get_commit(id)?);
        }
        Command::Revert { rev, commit } => {
            let target = rev
                .map(|rev| versioning.repository().resolve(&rev))
                .transpose()?;
            if commit {
                let id = versioning.revert_and_commit(&mut [], target)?;
                print_commit(&versioning.repository().get_commit(id)?);
            } else {
                let restored = versioning.revert(&mut [], target)?;
                println!("working tree restored to {}", restored.short());
            }
        }
    }

    Ok(())
}

/// Every valid top-level directory of the working tree is a record type.
fn track_existing_types(versioning: &Versioning) -> Result<()> {
    for entry in std::fs::read_dir(versioning.repository().path())? {
        let entry = entry?;
        if !entry.file_type()?.is_dir() {
            continue;
        }
        // .git and other non-type directories fail validation
        if let Some(name) = entry.file_name().to_str() {
            if TypeName::new(name).is_ok() {
                versioning.track(name)?;
            }
        }
    }
    Ok(())
}

fn print_commit(commit: &CommitInfo) {
    println!(
        "{} {} {} <{}>",
        commit.id.short(),
        commit.timestamp.format("%Y-%m-%d %H:%M:%S"),
        commit.author_name,
        commit.author_email
    );
    println!("    {}", commit.summary());
    if let Some(body) = commit.body() {
        for line in body.lines() {
            println!("    {}", line);
        }
    }
}
