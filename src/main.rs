use std::path::PathBuf;

use cantiere_maps::config::ResolverConfig;
use cantiere_maps::maplink::{
    format_coords, generate_maps_link, validate_coordinates, MapLinkResolver,
};
use cantiere_maps::server;
use clap::{Parser, Subcommand};
use serde::Serialize;
use serde_json::json;

/// Cantiere Maps: resolve map links for construction-site records
///
/// Turns Google/Apple Maps links into coordinates, geocodes addresses,
/// and builds driving-directions links for drivers.
///
/// Examples:
///   cantiere parse "https://maps.google.com/?q=46.0569,13.2348"
///   cantiere parse https://maps.app.goo.gl/Nz3qn49qHQ6ds31J8
///   cantiere geocode "Via Roma 12, Udine"
///   cantiere reverse --lat 46.0569 --lng 13.2348
///   cantiere link --lat 46.0569 --lng 13.2348
///   cantiere serve --port 8080
#[derive(Parser)]
#[command(name = "cantiere", version, about, long_about = None)]
struct Cli {
    /// Config file. Defaults to ~/.cantiere/config.json.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// User-Agent sent to the geocoding service.
    #[arg(long, global = true)]
    user_agent: Option<String>,

    /// Base URL of a Nominatim-compatible geocoder.
    #[arg(long, global = true)]
    nominatim_url: Option<String>,

    /// Per-request timeout in seconds.
    #[arg(long, global = true)]
    timeout_secs: Option<u64>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Extract coordinates from a map link (expands short links, geocodes address links).
    Parse { link: String },

    /// Expand a short link and parse where it lands.
    Expand { url: String },

    /// Forward-geocode an address.
    Geocode { address: String },

    /// Reverse-geocode a coordinate into an address.
    Reverse {
        #[arg(long, allow_hyphen_values = true)]
        lat: f64,
        #[arg(long, allow_hyphen_values = true)]
        lng: f64,
    },

    /// Print a driving-directions link from the current location.
    Link {
        #[arg(long, allow_hyphen_values = true)]
        lat: f64,
        #[arg(long, allow_hyphen_values = true)]
        lng: f64,
    },

    /// Check that a coordinate pair is in range.
    Validate {
        #[arg(long, allow_hyphen_values = true)]
        lat: f64,
        #[arg(long, allow_hyphen_values = true)]
        lng: f64,
    },

    /// Parse a link and fill in navigation link and address for a site record.
    Site { link: String },

    /// Serve the resolver as a JSON API.
    Serve {
        #[arg(long, default_value = "127.0.0.1")]
        host: String,
        #[arg(long, default_value_t = 8080)]
        port: u16,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info,ureq=warn")),
        )
        .init();

    let cli = Cli::parse();
    let config = load_config(&cli);

    match cli.command {
        Command::Parse { link } => {
            let resolver = MapLinkResolver::new(config);
            let parsed = resolver.parse_map_link(&link).unwrap_or_else(|e| fail(e));
            eprintln!("  \u{1F4CD} {}", format_coords(parsed.lat, parsed.lng));
            print_json(&parsed);
        }
        Command::Expand { url } => {
            let resolver = MapLinkResolver::new(config);
            let parsed = resolver.expand_short_link(&url).unwrap_or_else(|e| fail(e));
            print_json(&parsed);
        }
        Command::Geocode { address } => {
            let resolver = MapLinkResolver::new(config);
            let coord = resolver.geocode_address(&address).unwrap_or_else(|e| fail(e));
            eprintln!("  \u{1F4CD} {}", format_coords(coord.lat, coord.lng));
            print_json(&coord);
        }
        Command::Reverse { lat, lng } => {
            let resolver = MapLinkResolver::new(config);
            let address = resolver.reverse_geocode(lat, lng).unwrap_or_else(|e| fail(e));
            print_json(&json!({ "address": address }));
        }
        Command::Link { lat, lng } => {
            println!("{}", generate_maps_link(lat, lng));
        }
        Command::Validate { lat, lng } => match validate_coordinates(lat, lng) {
            Ok(_) => print_json(&json!({ "valid": true })),
            Err(e) => {
                print_json(&json!({ "valid": false, "error": e.to_string() }));
                std::process::exit(1);
            }
        },
        Command::Site { link } => {
            let resolver = MapLinkResolver::new(config);
            let site = resolver.resolve_site_location(&link).unwrap_or_else(|e| fail(e));
            print_json(&site);
        }
        Command::Serve { host, port } => {
            let resolver = server::default_resolver(config);
            let runtime = tokio::runtime::Runtime::new().unwrap_or_else(|e| fail(e));
            if let Err(e) = runtime.block_on(server::start(&host, port, resolver)) {
                fail(format!("cannot serve on {}:{}: {}", host, port, e));
            }
        }
    }
}

/// File config (or defaults), then command-line overrides.
fn load_config(cli: &Cli) -> ResolverConfig {
    let loaded = match &cli.config {
        Some(path) => ResolverConfig::load_from(path),
        None => ResolverConfig::load(),
    };
    let mut config = loaded.unwrap_or_else(|e| fail(e));

    if let Some(ref ua) = cli.user_agent {
        config.user_agent = ua.clone();
    }
    if let Some(ref url) = cli.nominatim_url {
        config.nominatim_url = url.clone();
    }
    if let Some(secs) = cli.timeout_secs {
        config.timeout_secs = secs;
    }
    config
}

fn print_json<T: Serialize>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(s) => println!("{}", s),
        Err(e) => fail(e),
    }
}

fn fail(e: impl std::fmt::Display) -> ! {
    eprintln!("Error: {}", e);
    std::process::exit(1);
}
