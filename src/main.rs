use clap::{Parser, Subcommand};
use fedata::config::Config;
use fedata::consolidate::Consolidator;
use fedata::error::{FdError, Result};
use fedata::registry::{self, DatasetSpec};
use fedata::{download, logging};
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use tracing::error;

#[derive(Parser)]
#[command(name = "fedata")]
#[command(about = "Provide analysis ready US federal data")]
#[command(version = "0.1.0")]
struct Cli {
    /// Root data directory (default: $HOME/fdata, or fd.toml override)
    #[arg(short, long)]
    directory: Option<PathBuf>,

    /// Do not print status along the way
    #[arg(short, long)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List available agencies or an agency's datasets
    Available {
        /// Agency to list datasets for
        agency: Option<String>,
    },
    /// Download an agency's dataset, e.g. `fedata download bls:cew`
    Download {
        /// Agency and dataset of interest, as agency:dataset
        dataset: String,
    },
    /// Consolidate a downloaded dataset into one data.csv
    Consolidate {
        /// Agency and dataset of interest, as agency:dataset
        dataset: String,
        /// Override the fact-table rows held per fragment
        #[arg(long)]
        chunk_size: Option<usize>,
    },
    /// Detail information about an agency's dataset
    Detail {
        /// Agency and dataset of interest, as agency:dataset
        dataset: String,
    },
}

fn main() {
    let cli = Cli::parse();
    logging::init_logging(cli.quiet);

    if let Err(e) = run(cli) {
        error!("{}", e);
        eprintln!("fedata: {}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let config = Config::load()?;
    let root = resolve_root(cli.directory, &config);
    let status = Status { quiet: cli.quiet };

    match cli.command {
        Commands::Available { agency } => {
            available(agency.as_deref(), &status);
            Ok(())
        }
        Commands::Download { dataset } => {
            let spec = lookup(&dataset)?;
            let dir = check_download_directory(&root.join(spec.subdir))?;
            status.say(format!("{} -> {}", spec.id, dir.display()));
            download::download(spec, &dir)?;
            status.say(format!("{} data downloaded.", spec.id));
            Ok(())
        }
        Commands::Consolidate {
            dataset,
            chunk_size,
        } => {
            let spec = lookup(&dataset)?;
            let dir = check_consolidate_directory(&root.join(spec.subdir))?;
            status.say(format!("Consolidating {}...", dir.display()));

            let mut consolidator = Consolidator::new(spec, &dir);
            if let Some(size) = chunk_size.or(config.chunk_size) {
                consolidator = consolidator.with_chunk_size(size);
            }
            consolidator.run()?;
            status.say(format!("{} data consolidated.", spec.id));
            Ok(())
        }
        Commands::Detail { dataset } => {
            let spec = lookup(&dataset)?;
            detail(spec, &status)
        }
    }
}

/// Console status output; `--quiet` silences it without touching the
/// tracing layers.
struct Status {
    quiet: bool,
}

impl Status {
    fn say(&self, msg: impl std::fmt::Display) {
        self.write_to(&mut io::stdout(), msg).ok();
    }

    fn write_to<W: Write>(&self, out: &mut W, msg: impl std::fmt::Display) -> io::Result<()> {
        if !self.quiet {
            writeln!(out, "{}", msg)?;
        }
        Ok(())
    }
}

fn resolve_root(flag: Option<PathBuf>, config: &Config) -> PathBuf {
    flag.or_else(|| config.directory.clone()).unwrap_or_else(|| {
        std::env::var_os("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("."))
            .join("fdata")
    })
}

fn lookup(dataset: &str) -> Result<&'static DatasetSpec> {
    registry::get(dataset).ok_or_else(|| {
        let known: Vec<_> = registry::REGISTRY.keys().copied().collect();
        FdError::UnknownDataset(format!("{} (expected one of: {})", dataset, known.join(", ")))
    })
}

fn available(agency: Option<&str>, status: &Status) {
    match agency {
        Some(agency) => {
            let datasets = registry::datasets_for(agency);
            if datasets.is_empty() {
                status.say(format!("fedata doesn't know how to work with {}, yet.", agency));
                return;
            }
            status.say(format!("{} has available datasets:", agency.to_uppercase()));
            for spec in datasets {
                status.say(format!("\t{:4} - {}", spec.dataset, spec.title));
            }
        }
        None => {
            let agencies: Vec<_> = registry::agencies()
                .iter()
                .map(|a| a.to_uppercase())
                .collect();
            status.say(format!(
                "fedata plays nicely with some of the datasets from the following agencies:\n  {}",
                agencies.join(", ")
            ));
        }
    }
}

fn detail(spec: &DatasetSpec, status: &Status) -> Result<()> {
    status.say(format!("{} dataset info:", spec.id));
    status.say(format!("* website: {}", spec.website));
    status.say(format!("* docs: {}", spec.docs));
    status.say("* dataset URLs:");
    for (i, url) in download::resolve_urls(spec)?.iter().enumerate() {
        status.say(format!("{}. {}", i, url));
    }
    Ok(())
}

/// A download directory must already exist; re-downloading into a
/// non-empty one overwrites files, so ask first.
fn check_download_directory(path: &Path) -> Result<PathBuf> {
    if !path.is_dir() {
        return Err(FdError::Directory(format!(
            "directory {} does not exist; make it and try again",
            path.display()
        )));
    }
    let occupied = path.read_dir()?.next().is_some();
    if occupied {
        let prompt = format!(
            "Directory {} is not empty -- files will be overwritten. Proceed anyway?",
            path.display()
        );
        if !proceed(&prompt)? {
            return Err(FdError::Directory("download cancelled".to_string()));
        }
    }
    Ok(path.to_path_buf())
}

/// Consolidation needs the downloaded files in place: the directory
/// must exist and be non-empty. The engine itself never creates
/// directories.
fn check_consolidate_directory(path: &Path) -> Result<PathBuf> {
    if !path.is_dir() {
        return Err(FdError::Directory(format!(
            "directory {} does not exist; download data first and try again",
            path.display()
        )));
    }
    if path.read_dir()?.next().is_none() {
        return Err(FdError::Directory(format!(
            "directory {} is empty; download data first and try again",
            path.display()
        )));
    }
    Ok(path.to_path_buf())
}

/// Yes/no confirmation on stdin. End of input counts as a refusal.
fn proceed(prompt: &str) -> Result<bool> {
    let stdin = io::stdin();
    confirm(&mut stdin.lock(), prompt)
}

fn confirm<R: BufRead>(input: &mut R, prompt: &str) -> Result<bool> {
    loop {
        print!("{} [y/n] ", prompt);
        io::stdout().flush()?;
        let mut answer = String::new();
        if input.read_line(&mut answer)? == 0 {
            return Ok(false);
        }
        match answer.trim().to_lowercase().as_str() {
            "y" | "yes" | "t" | "true" | "1" => return Ok(true),
            "n" | "no" | "f" | "false" | "0" => return Ok(false),
            _ => println!("Please respond with 'yes' or 'no'."),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn confirm_accepts_and_refuses() {
        assert!(confirm(&mut Cursor::new("y\n"), "go?").expect("answer"));
        assert!(!confirm(&mut Cursor::new("no\n"), "go?").expect("answer"));
    }

    #[test]
    fn confirm_reprompts_until_a_recognized_answer() {
        assert!(confirm(&mut Cursor::new("maybe\nyes\n"), "go?").expect("answer"));
    }

    #[test]
    fn confirm_treats_end_of_input_as_refusal() {
        assert!(!confirm(&mut Cursor::new(""), "go?").expect("answer"));
    }

    #[test]
    fn quiet_suppresses_status_output() {
        let mut out = Vec::new();
        Status { quiet: true }
            .write_to(&mut out, "downloading")
            .expect("write");
        assert!(out.is_empty());
        Status { quiet: false }
            .write_to(&mut out, "downloading")
            .expect("write");
        assert_eq!(String::from_utf8(out).expect("utf8"), "downloading\n");
    }
}
