use clap::{Parser, Subcommand, ValueEnum};
use mikrotik_wg_gen::client::PortPlan;
use mikrotik_wg_gen::{derive_values, ArtifactBundle, ClientRecord, Config, Profile};
use std::path::{Path, PathBuf};
use tracing::{error, info, warn, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser)]
#[command(name = "mikrotik-wg-gen")]
#[command(about = "RouterOS script generator for WireGuard clients with camera port-forwarding")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Clone, Copy, Debug, Default, ValueEnum)]
enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(clap::Args)]
struct OutputArgs {
    /// Client description file (default: ./mikrotik-client.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Write one file per script into this directory instead of stdout
    #[arg(short, long)]
    out_dir: Option<PathBuf>,

    /// Output format for stdout
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a default client description file
    Init {
        /// Where to write the file
        #[arg(short, long, default_value = "mikrotik-client.toml")]
        path: PathBuf,
    },
    /// Generate every script: base, WireGuard, DNAT, watchdog, server, URLs
    Generate(OutputArgs),
    /// Generate only the client WireGuard script and the server commands
    Tunnel(OutputArgs),
    /// Generate only the camera DNAT rules
    Dnat(OutputArgs),
    /// Show the derived tunnel address and camera ports
    Ports {
        /// Client description file (default: ./mikrotik-client.toml)
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}

fn main() {
    let cli = Cli::parse();

    // stdout carries the scripts, logs go to stderr
    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();
    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set up logging: {}", e);
    }

    if let Err(e) = run(cli.command) {
        error!("{}", e);
        std::process::exit(1);
    }
}

fn run(command: Commands) -> Result<(), Box<dyn std::error::Error>> {
    match command {
        Commands::Init { path } => {
            if path.exists() {
                warn!("{} already exists, leaving it untouched", path.display());
                return Ok(());
            }
            Config::default().save(&path)?;
            info!("Created default client config: {}", path.display());
        }
        Commands::Generate(args) => emit(&args, Profile::Complete)?,
        Commands::Tunnel(args) => emit(&args, Profile::Tunnel)?,
        Commands::Dnat(args) => emit(&args, Profile::Dnat)?,
        Commands::Ports { config } => {
            let record = load_record(config.as_deref())?;
            print_ports(&record);
        }
    }

    Ok(())
}

fn load_record(path: Option<&Path>) -> Result<ClientRecord, Box<dyn std::error::Error>> {
    let (config, used) = Config::find(path)?;
    let record = derive_values(&config.to_raw())?;
    info!(
        "Client {} -> {} ({})",
        record.id(),
        record.tunnel_address(),
        used.display()
    );
    Ok(record)
}

fn emit(args: &OutputArgs, profile: Profile) -> Result<(), Box<dyn std::error::Error>> {
    let record = load_record(args.config.as_deref())?;
    if profile == Profile::Dnat && !record.dnat_enabled() {
        warn!("Cameras are not enabled for {}, no DNAT rules to generate", record.id());
    }

    let bundle = ArtifactBundle::generate(&record, profile)?;

    if let Some(dir) = &args.out_dir {
        let written = bundle.write_to_dir(dir)?;
        for path in written {
            println!("{}", path.display());
        }
        return Ok(());
    }

    match args.format {
        OutputFormat::Text => print!("{}", bundle.render_text()),
        OutputFormat::Json => println!("{}", bundle.to_json()?),
    }
    Ok(())
}

fn print_ports(record: &ClientRecord) {
    println!("Client: {}", record.id());
    println!("  Tunnel address: {}", record.tunnel_address());
    match record.lan_prefix() {
        Some(lan) => println!("  LAN: {}.0/24", lan),
        None => println!("  LAN: (not routed)"),
    }

    let Some(cameras) = record.cameras() else {
        println!("  DNAT: disabled");
        return;
    };

    println!("  Port base: {}", cameras.ports.base());
    if PortPlan::overlaps_next_client(cameras.count) {
        println!(
            "  Warning: {} cameras overlap the port block of suffix {}",
            cameras.count,
            u16::from(record.tunnel_suffix()) + 1
        );
    }
    for (n, address, ports) in cameras.cameras() {
        println!(
            "    Cam{} {} -> http {} / rtsp {}",
            n, address, ports.http, ports.rtsp
        );
    }
}
