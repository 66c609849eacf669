//! CLI for the codepolish tool.

use anyhow::{Context, Result};
use clap::{ArgAction, Parser, Subcommand};
use codepolish::prelude::*;
use std::path::PathBuf;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Parser)]
#[command(name = "codepolish")]
#[command(author, version, about = "Batch source-code improvement tool", long_about = None)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Improve every file under a directory or zip archive
    Improve {
        /// Input directory or .zip archive
        path: PathBuf,

        /// Output directory (recreated on each run)
        #[arg(short, long)]
        output: PathBuf,

        /// Which rewrites to apply: security, performance or readability
        #[arg(short, long)]
        priority: Option<Priority>,

        /// Only process files with this extension (repeatable)
        #[arg(short, long = "lang")]
        languages: Vec<String>,

        /// Glob pattern to exclude (repeatable)
        #[arg(short, long)]
        exclude: Vec<String>,

        /// YAML or JSON run configuration
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Preview changes without writing the output tree
        #[arg(long)]
        dry_run: bool,

        /// Write Markdown and JSON reports into this directory
        #[arg(long)]
        report_dir: Option<PathBuf>,
    },

    /// Summarize files and lines of code per language
    Analyze {
        /// Directory to analyze
        #[arg(default_value = ".")]
        path: PathBuf,
    },

    /// Show registered processors
    Languages,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Improve {
            path,
            output,
            priority,
            languages,
            exclude,
            config,
            dry_run,
            report_dir,
        } => {
            let mut run = match config {
                Some(ref file) => RunConfig::load(file)
                    .with_context(|| format!("Failed to load config {}", file.display()))?,
                None => RunConfig::default(),
            };
            if let Some(priority) = priority {
                run.priority = priority;
            }
            if !languages.is_empty() {
                run = run.with_languages(languages);
            }
            run = run.with_exclude(exclude);
            if dry_run {
                run = run.dry_run();
            }
            cmd_improve(path, output, run, report_dir)
        }
        Commands::Analyze { path } => cmd_analyze(path),
        Commands::Languages => cmd_languages(),
    }
}

fn init_logging(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}

fn cmd_improve(
    path: PathBuf,
    output: PathBuf,
    config: RunConfig,
    report_dir: Option<PathBuf>,
) -> Result<()> {
    let registry = ProcessorRegistry::new();
    let summary = improve_codebase(&path, &output, &config, &registry)
        .with_context(|| format!("Failed to improve {}", path.display()))?;

    if config.dry_run {
        for preview in &summary.previews {
            println!("{}", preview.colored);
        }
        println!("\n{}", summary.diff);
    } else {
        println!(
            "Improved {} file(s), modified {}, copied {} into {}",
            summary.results.len(),
            summary.modified(),
            summary.copied,
            output.display()
        );
    }

    for result in &summary.results {
        for warning in &result.warnings {
            println!("{}: {}", result.file_path.display(), warning);
        }
    }

    if let Some(dir) = report_dir {
        let stats = if path.is_dir() {
            Some(analyze_codebase(&path).context("Failed to analyze input")?)
        } else {
            None
        };
        let paths = write_reports(
            &dir,
            &summary,
            stats.as_ref(),
            chrono::Local::now().naive_local(),
        )
        .context("Failed to write reports")?;
        println!("Reports: {} and {}", paths.markdown.display(), paths.json.display());
    }

    Ok(())
}

fn cmd_analyze(path: PathBuf) -> Result<()> {
    let stats = analyze_codebase(&path)
        .with_context(|| format!("Failed to analyze {}", path.display()))?;

    println!("{} file(s) in {}", stats.total_files, path.display());
    for (language, lang) in &stats.languages {
        println!("  {:<12} {:>6} file(s) {:>8} lines", language, lang.files, lang.loc);
    }
    Ok(())
}

fn cmd_languages() -> Result<()> {
    let registry = ProcessorRegistry::new();
    println!("Registered processors:");

    let mut grouped: Vec<(&str, Vec<&str>)> = Vec::new();
    for (ext, name) in registry.entries() {
        match grouped.iter_mut().find(|(n, _)| *n == name) {
            Some((_, exts)) => exts.push(ext),
            None => grouped.push((name, vec![ext])),
        }
    }
    for (name, exts) in grouped {
        println!("  {} (extensions: {})", name, exts.join(", "));
    }
    println!("  other files pass through unchanged");
    Ok(())
}
