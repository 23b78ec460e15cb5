use clap::{Parser, Subcommand};
use skylink::encoding::from_hex_array;
use skylink::options::upload_path;
use skylink::path::download_path;
use skylink::{Bitfield, MultiFileUploadOptions, Skylink, UploadOptions, UploadResponse};
use std::io::Read;
use std::path::PathBuf;
use tracing::Level;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "skylink", about = "Inspect, build and verify Skynet skylinks")]
struct Cli {
    /// Log validation details to stderr
    #[arg(short, long, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Decode a skylink (bare or sia://) and show its fields
    Decode {
        skylink: String,
    },
    /// Build a skylink from a raw bitfield and a hex Merkle root
    Encode {
        #[arg(short, long, default_value = "0")]
        bitfield: u16,
        /// 64 hex characters
        #[arg(long)]
        hash: String,
    },
    /// Cross-check an upload response JSON (reads stdin when FILE is omitted)
    Verify {
        file: Option<PathBuf>,
    },
    /// Print the download path for a skylink and optional sub-path
    Path {
        skylink: String,
        #[arg(default_value = "")]
        sub_path: String,
    },
    /// Print the upload endpoint path for the given options
    Query {
        #[arg(long)]
        dry_run: bool,
        #[arg(long)]
        filename: Option<String>,
        #[arg(long)]
        default_path: Option<String>,
        #[arg(long)]
        disable_default_path: bool,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {

        // ── Decode ───────────────────────────────────────────────────────────
        Commands::Decode { skylink } => {
            let skylink: Skylink = skylink.parse()?;
            let bitfield = skylink.bitfield();
            println!("── Skylink ──────────────────────────────────────────────");
            println!("  Skylink        {}", skylink);
            println!("  Version        {}", bitfield.version());
            println!("  Bitfield       {} ({:#018b})", bitfield.raw(), bitfield.raw());
            println!("  Mode bits      {}", bitfield.mode_bits());
            println!("  Offset         {} B", bitfield.offset());
            println!("  Fetch size     {} B", bitfield.fetch_size());
            println!("  Merkle root    {}", skylink.merkleroot_hex());
        }

        // ── Encode ───────────────────────────────────────────────────────────
        Commands::Encode { bitfield, hash } => {
            let bitfield = Bitfield::new(bitfield)?;
            let skylink = Skylink::new(bitfield, from_hex_array(&hash)?);
            println!("{}", skylink);
        }

        // ── Verify ───────────────────────────────────────────────────────────
        Commands::Verify { file } => {
            let response = match file {
                Some(path) => UploadResponse::from_reader(std::fs::File::open(path)?)?,
                None => {
                    let mut buf = Vec::new();
                    std::io::stdin().read_to_end(&mut buf)?;
                    UploadResponse::from_slice(&buf)?
                }
            };
            let skylink = response.parse_and_validate()?;
            println!("{}", skylink);
        }

        // ── Path ─────────────────────────────────────────────────────────────
        Commands::Path { skylink, sub_path } => {
            let skylink: Skylink = skylink.parse()?;
            println!("{}", download_path(&skylink, &sub_path)?);
        }

        // ── Query ────────────────────────────────────────────────────────────
        Commands::Query { dry_run, filename, default_path, disable_default_path } => {
            let mut opts = MultiFileUploadOptions::default();
            opts.base = UploadOptions { dry_run };
            opts.disable_default_path = disable_default_path;
            opts.set_file_name(filename.as_deref())?;
            opts.set_default_path(default_path.as_deref())?;
            println!("{}", upload_path(&opts)?);
        }
    }

    Ok(())
}

// ── helpers ──────────────────────────────────────────────────────────────────

fn init_logging(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::WARN };
    let filter = EnvFilter::builder()
        .with_default_directive(level.into())
        .from_env_lossy();
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .init();
}
