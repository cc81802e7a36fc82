//! probekit — command-line front end for the check-plugin helpers.
//!
//! Thin binary entry point. All logic lives in the `probekit-core` crate.
//! Results go to stdout, logs to stderr. Any failure prints the diagnostic
//! and exits with the monitoring `UNKNOWN` state.

use anyhow::Result;
use clap::{Parser, Subcommand};
use probekit_core::platform;
use probekit_core::scanner::{self, WalkOptions};
use probekit_core::state::{STATE_OK, STATE_UNKNOWN};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "probekit")]
#[command(about = "Helpers for monitoring check plugins", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Debug logging on stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Print results as JSON
    #[arg(long, global = true)]
    json: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Recursively list the files under a directory
    Walk {
        /// Directory to walk
        root: PathBuf,

        /// Skip files whose full path matches this regex (from the start)
        #[arg(long)]
        exclude: Option<String>,

        /// Keep only files whose full path matches this regex (from the start)
        #[arg(long)]
        include: Option<String>,

        /// Print full paths instead of paths relative to ROOT
        #[arg(long)]
        absolute: bool,

        /// Follow symbolic links (links back to an ancestor are skipped)
        #[arg(long)]
        follow_links: bool,
    },

    /// Print the first capture group of PATTERN found in FILE
    Grep {
        file: PathBuf,
        pattern: String,
    },

    /// List physical partitions
    Partitions {
        /// Skip partitions whose mount point contains this text (repeatable)
        #[arg(long = "ignore")]
        ignore: Vec<String>,
    },

    /// Print a writable temp directory
    Tmpdir,

    /// Print the current working directory
    Cwd,

    /// Print the content of a file on an SMB share
    #[cfg(feature = "smb")]
    SmbCat {
        /// UNC path, e.g. \\server\share\dir\file
        path: String,
        #[command(flatten)]
        auth: SmbArgs,
    },

    /// List entries of a directory on an SMB share
    #[cfg(feature = "smb")]
    SmbGlob {
        /// UNC path, e.g. \\server\share\dir
        path: String,

        /// Shell-style pattern applied to entry names
        #[arg(long, default_value = "*")]
        pattern: String,

        #[command(flatten)]
        auth: SmbArgs,
    },
}

#[cfg(feature = "smb")]
#[derive(clap::Args)]
struct SmbArgs {
    #[arg(long, short = 'u')]
    username: String,

    #[arg(long, short = 'p', env = "PROBEKIT_SMB_PASSWORD", hide_env_values = true)]
    password: String,

    /// Connection timeout in seconds
    #[arg(long, default_value_t = 3)]
    timeout: u64,

    /// NetBIOS workgroup / domain
    #[arg(long)]
    workgroup: Option<String>,

    /// Do not require an encrypted session
    #[arg(long)]
    no_encrypt: bool,
}

#[cfg(feature = "smb")]
impl SmbArgs {
    fn connect_options(&self) -> probekit_core::smb::SmbConnectOptions {
        probekit_core::smb::SmbConnectOptions::new(
            &self.username,
            &self.password,
            std::time::Duration::from_secs(self.timeout),
        )
        .encrypt(!self.no_encrypt)
    }

    fn backend(&self) -> probekit_core::smb::client::PavaoBackend {
        match &self.workgroup {
            Some(workgroup) => probekit_core::smb::client::PavaoBackend::with_workgroup(workgroup),
            None => probekit_core::smb::client::PavaoBackend::new(),
        }
    }
}

fn main() {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_max_level(if cli.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        })
        .with_writer(std::io::stderr)
        .init();

    if let Err(err) = run(cli) {
        println!("{err:#}");
        std::process::exit(STATE_UNKNOWN);
    }
    std::process::exit(STATE_OK);
}

fn run(cli: Cli) -> Result<()> {
    let json = cli.json;
    match cli.command {
        Commands::Walk {
            root,
            exclude,
            include,
            absolute,
            follow_links,
        } => {
            let mut options = WalkOptions::new(root)
                .relative(!absolute)
                .follow_links(follow_links);
            options.exclude = exclude;
            options.include = include;
            let files = scanner::walk_with(&options)?;
            print_lines(&files, json)?;
        }

        Commands::Grep { file, pattern } => {
            let value = probekit_core::grep::grep_file(&file, &pattern)?;
            print_value(&value, json)?;
        }

        Commands::Partitions { ignore } => {
            let partitions = platform::list_partitions(&ignore)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&partitions)?);
            } else {
                for p in &partitions {
                    println!("{}\t{}\t{}\t{}", p.device, p.mountpoint, p.fstype, p.opts);
                }
            }
        }

        Commands::Tmpdir => {
            let dir = platform::temp_dir();
            print_value(&dir.to_string_lossy(), json)?;
        }

        Commands::Cwd => {
            let dir = platform::current_dir()?;
            print_value(&dir.to_string_lossy(), json)?;
        }

        #[cfg(feature = "smb")]
        Commands::SmbCat { path, auth } => {
            use std::io::{Read, Write};
            let mut file =
                probekit_core::smb::open_file(&auth.backend(), &path, &auth.connect_options())?;
            let mut data = Vec::new();
            file.read_to_end(&mut data)?;
            std::io::stdout().write_all(&data)?;
        }

        #[cfg(feature = "smb")]
        Commands::SmbGlob {
            path,
            pattern,
            auth,
        } => {
            let entries =
                probekit_core::smb::glob(&auth.backend(), &path, &pattern, &auth.connect_options())?;
            if json {
                println!("{}", serde_json::to_string_pretty(&entries)?);
            } else {
                for entry in &entries {
                    println!("{}", entry.path);
                }
            }
        }
    }
    Ok(())
}

fn print_lines(lines: &[String], json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(lines)?);
    } else {
        for line in lines {
            println!("{line}");
        }
    }
    Ok(())
}

fn print_value(value: &str, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string(value)?);
    } else {
        println!("{value}");
    }
    Ok(())
}
