//! Server configuration and CLI argument parsing
//!
//! Every option can be set on the command line or through an environment
//! variable with the `SPINWHEEL_` prefix.
//!
//! # Configuration Priority
//!
//! 1. CLI arguments (highest priority)
//! 2. Environment variables
//! 3. Default values (lowest priority)
//!
//! The prize catalog is the one piece of configuration that does not fit on a
//! command line. It defaults to the built-in catalog and can be replaced by a
//! TOML, JSON or YAML file passed with `--catalog-file`:
//!
//! ```toml
//! [[prizes]]
//! code = "COMBO"
//! weight = 35.0
//! sector = 5
//!
//! [[prizes]]
//! code = "XTUDO"
//! weight = 32.5
//! sector = 3
//!
//! [[prizes]]
//! code = "HOTDOG"
//! weight = 32.5
//! sector = 1
//! ```
//!
//! # Example Usage
//!
//! ```bash
//! # Using CLI arguments
//! spinwheel --http-port 9090 --store sqlite --database-url sqlite://spinwheel.db
//!
//! # Using environment variables
//! export SPINWHEEL_HTTP_PORT=8080
//! export SPINWHEEL_STORE=sqlite
//! spinwheel
//! ```

use crate::service::Rules;
use anyhow::{Context, Result, anyhow};
use clap::Parser;
use serde::Deserialize;
use spinwheel::{PrizeCatalog, PrizeEntry, Quota, QuotaWindow, WheelLayout};
use std::path::{Path, PathBuf};

/// Longest accepted spin window: one year
const MAX_SPIN_WINDOW_HOURS: u32 = 366 * 24;

/// Main configuration structure for the server
#[derive(Debug, Clone)]
pub struct Config {
    pub http: HttpConfig,
    pub store: StoreConfig,
    pub rules: RulesConfig,
    /// Logging level (error, warn, info, debug, trace)
    pub log_level: String,
}

/// HTTP transport configuration
#[derive(Debug, Clone, Deserialize)]
pub struct HttpConfig {
    /// Host address to bind to (e.g., "0.0.0.0")
    pub host: String,
    /// Port number to listen on
    pub port: u16,
}

/// Record store configuration
#[derive(Debug, Clone, Deserialize)]
pub struct StoreConfig {
    pub store_type: StoreType,
    /// sqlx connection URL for the SQLite backend
    pub database_url: String,
    /// Connection pool size for the SQLite backend
    pub max_connections: u32,
    /// Initial participant capacity of the memory backend
    pub capacity: usize,
    /// Channel buffer size of the memory backend's actor
    pub buffer_size: usize,
}

/// Available record store backends
#[derive(Debug, Clone, Copy, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum StoreType {
    /// Single actor task owning an in-memory ledger, not durable
    Memory,
    /// SQLite database through an sqlx pool
    Sqlite,
}

impl std::str::FromStr for StoreType {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "memory" => Ok(StoreType::Memory),
            "sqlite" => Ok(StoreType::Sqlite),
            _ => Err(anyhow!(
                "Invalid store type: {}. Valid options are: memory, sqlite",
                s
            )),
        }
    }
}

/// Promotion rules: quotas, wheel geometry and coupon format
#[derive(Debug, Clone)]
pub struct RulesConfig {
    pub spin_limit: u32,
    pub spin_window_hours: u32,
    pub claim_limit: u32,
    /// Offset of the local calendar day east of UTC, in minutes
    pub utc_offset_minutes: i32,
    pub wheel_sectors: usize,
    /// Degrees kept clear of each sector edge when picking a landing angle
    pub edge_margin: f64,
    pub coupon_prefix: String,
    pub catalog_file: Option<PathBuf>,
}

#[derive(Debug, Deserialize)]
struct CatalogFile {
    prizes: Vec<CatalogLine>,
}

#[derive(Debug, Deserialize)]
struct CatalogLine {
    code: String,
    weight: f64,
    sector: usize,
}

impl RulesConfig {
    /// Resolve into validated [`Rules`], loading the catalog file if one is set
    pub fn load(&self) -> Result<Rules> {
        let catalog = match &self.catalog_file {
            Some(path) => load_catalog(path)?,
            None => PrizeCatalog::default(),
        };

        let layout = WheelLayout {
            sectors: self.wheel_sectors,
            edge_margin: self.edge_margin,
            ..WheelLayout::default()
        };

        let rules = Rules {
            catalog,
            layout,
            spin_quota: Quota::new(
                self.spin_limit,
                QuotaWindow::sliding_hours(self.spin_window_hours),
            ),
            claim_quota: Quota::new(
                self.claim_limit,
                QuotaWindow::calendar_day(self.utc_offset_minutes)?,
            ),
            coupon_prefix: self.coupon_prefix.clone(),
        };
        rules.validate()?;
        Ok(rules)
    }
}

fn load_catalog(path: &Path) -> Result<PrizeCatalog> {
    let file: CatalogFile = ::config::Config::builder()
        .add_source(::config::File::from(path))
        .build()
        .and_then(|settings| settings.try_deserialize())
        .with_context(|| format!("Failed to read prize catalog {}", path.display()))?;

    let entries = file
        .prizes
        .into_iter()
        .map(|line| {
            Ok(PrizeEntry {
                prize: line.code.parse()?,
                weight: line.weight,
                sector: line.sector,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(PrizeCatalog::new(entries)?)
}

/// Command-line arguments for the server
///
/// All arguments can also be set via environment variables with the
/// SPINWHEEL_ prefix. CLI arguments take precedence over environment variables.
#[derive(Parser, Debug)]
#[command(
    name = "spinwheel",
    about = "Spin-to-win prize allocation service",
    long_about = "Allocates weighted prizes to registered participants, enforces spin and claim quotas and issues sequential coupon numbers.\n\nEnvironment variables with SPINWHEEL_ prefix are supported. CLI arguments take precedence over environment variables."
)]
pub struct Args {
    // HTTP Transport
    #[arg(
        long,
        value_name = "HOST",
        help = "HTTP host",
        default_value = "127.0.0.1",
        env = "SPINWHEEL_HTTP_HOST"
    )]
    pub http_host: String,
    #[arg(
        long,
        value_name = "PORT",
        help = "HTTP port",
        default_value_t = 8080,
        env = "SPINWHEEL_HTTP_PORT"
    )]
    pub http_port: u16,

    // Store Configuration
    #[arg(
        long,
        value_name = "TYPE",
        help = "Store type: memory, sqlite",
        default_value = "memory",
        env = "SPINWHEEL_STORE"
    )]
    pub store: StoreType,
    #[arg(
        long,
        value_name = "URL",
        help = "SQLite database URL",
        default_value = "sqlite://spinwheel.db",
        env = "SPINWHEEL_DATABASE_URL"
    )]
    pub database_url: String,
    #[arg(
        long,
        value_name = "N",
        help = "SQLite connection pool size",
        default_value_t = 5,
        env = "SPINWHEEL_MAX_CONNECTIONS"
    )]
    pub max_connections: u32,
    #[arg(
        long,
        value_name = "SIZE",
        help = "Initial participant capacity of the memory store",
        default_value_t = 10_000,
        env = "SPINWHEEL_STORE_CAPACITY"
    )]
    pub store_capacity: usize,
    #[arg(
        long,
        value_name = "SIZE",
        help = "Memory store channel buffer size",
        default_value_t = 10_000,
        env = "SPINWHEEL_BUFFER_SIZE"
    )]
    pub buffer_size: usize,

    // Promotion rules
    #[arg(
        long,
        value_name = "N",
        help = "Spins allowed per sliding window",
        default_value_t = 3,
        env = "SPINWHEEL_SPIN_LIMIT"
    )]
    pub spin_limit: u32,
    #[arg(
        long,
        value_name = "HOURS",
        help = "Length of the sliding spin window in hours",
        default_value_t = 12,
        env = "SPINWHEEL_SPIN_WINDOW_HOURS"
    )]
    pub spin_window_hours: u32,
    #[arg(
        long,
        value_name = "N",
        help = "Claims allowed per local calendar day",
        default_value_t = 3,
        env = "SPINWHEEL_CLAIM_LIMIT"
    )]
    pub claim_limit: u32,
    #[arg(
        long,
        value_name = "MINUTES",
        help = "Local day offset from UTC in minutes",
        default_value_t = -180,
        allow_negative_numbers = true,
        env = "SPINWHEEL_UTC_OFFSET_MINUTES"
    )]
    pub utc_offset_minutes: i32,
    #[arg(
        long,
        value_name = "N",
        help = "Number of sectors painted on the wheel",
        default_value_t = 6,
        env = "SPINWHEEL_WHEEL_SECTORS"
    )]
    pub wheel_sectors: usize,
    #[arg(
        long,
        value_name = "DEGREES",
        help = "Landing margin kept from sector edges",
        default_value_t = 5.0,
        env = "SPINWHEEL_EDGE_MARGIN"
    )]
    pub edge_margin: f64,
    #[arg(
        long,
        value_name = "PREFIX",
        help = "Coupon code prefix",
        default_value = "TOP",
        env = "SPINWHEEL_COUPON_PREFIX"
    )]
    pub coupon_prefix: String,
    #[arg(
        long,
        value_name = "PATH",
        help = "Prize catalog file (toml, json or yaml)",
        env = "SPINWHEEL_CATALOG_FILE"
    )]
    pub catalog_file: Option<PathBuf>,

    // General options
    #[arg(
        long,
        value_name = "LEVEL",
        help = "Log level: error, warn, info, debug, trace",
        default_value = "info",
        env = "SPINWHEEL_LOG_LEVEL"
    )]
    pub log_level: String,

    // Utility options
    #[arg(
        long,
        help = "List all environment variables and exit",
        action = clap::ArgAction::SetTrue
    )]
    pub list_env_vars: bool,
}

impl From<Args> for Config {
    fn from(args: Args) -> Self {
        Config {
            http: HttpConfig {
                host: args.http_host,
                port: args.http_port,
            },
            store: StoreConfig {
                store_type: args.store,
                database_url: args.database_url,
                max_connections: args.max_connections,
                capacity: args.store_capacity,
                buffer_size: args.buffer_size,
            },
            rules: RulesConfig {
                spin_limit: args.spin_limit,
                spin_window_hours: args.spin_window_hours,
                claim_limit: args.claim_limit,
                utc_offset_minutes: args.utc_offset_minutes,
                wheel_sectors: args.wheel_sectors,
                edge_margin: args.edge_margin,
                coupon_prefix: args.coupon_prefix,
                catalog_file: args.catalog_file,
            },
            log_level: args.log_level,
        }
    }
}

impl Config {
    /// Build configuration from environment variables and CLI arguments
    ///
    /// # Errors
    ///
    /// Returns an error if a value is out of range. Catalog and wheel
    /// consistency is checked later by [`RulesConfig::load`].
    pub fn from_env_and_args() -> Result<Self> {
        let args = Args::parse();

        if args.list_env_vars {
            Self::print_env_vars();
            std::process::exit(0);
        }

        let config = Config::from(args);
        config.validate()?;

        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.rules.spin_limit == 0 || self.rules.claim_limit == 0 {
            return Err(anyhow!("Spin and claim limits must be at least 1"));
        }
        if !(1..=MAX_SPIN_WINDOW_HOURS).contains(&self.rules.spin_window_hours) {
            return Err(anyhow!(
                "Spin window must be between 1 and {} hours",
                MAX_SPIN_WINDOW_HOURS
            ));
        }
        if self.rules.coupon_prefix.trim().is_empty() {
            return Err(anyhow!("Coupon prefix must not be empty"));
        }
        if self.store.buffer_size == 0 {
            return Err(anyhow!("Buffer size must be at least 1"));
        }
        if self.store.store_type == StoreType::Sqlite {
            if self.store.database_url.is_empty() {
                return Err(anyhow!("--database-url is required for the sqlite store"));
            }
            if self.store.max_connections == 0 {
                return Err(anyhow!("SQLite pool needs at least one connection"));
            }
        }

        Ok(())
    }

    /// Print all available environment variables and their descriptions
    fn print_env_vars() {
        println!("Spinwheel Environment Variables");
        println!("===============================");
        println!();
        println!("All environment variables use the SPINWHEEL_ prefix.");
        println!("CLI arguments take precedence over environment variables.");
        println!();

        println!("HTTP Transport:");
        println!("  SPINWHEEL_HTTP_HOST=<host>            HTTP host [default: 127.0.0.1]");
        println!("  SPINWHEEL_HTTP_PORT=<port>            HTTP port [default: 8080]");
        println!();

        println!("Store Configuration:");
        println!("  SPINWHEEL_STORE=<type>                Store type: memory, sqlite [default: memory]");
        println!(
            "  SPINWHEEL_DATABASE_URL=<url>          SQLite URL [default: sqlite://spinwheel.db]"
        );
        println!("  SPINWHEEL_MAX_CONNECTIONS=<n>         SQLite pool size [default: 5]");
        println!("  SPINWHEEL_STORE_CAPACITY=<size>       Memory store capacity [default: 10000]");
        println!("  SPINWHEEL_BUFFER_SIZE=<size>          Memory store channel buffer [default: 10000]");
        println!();

        println!("Promotion Rules:");
        println!("  SPINWHEEL_SPIN_LIMIT=<n>              Spins per window [default: 3]");
        println!("  SPINWHEEL_SPIN_WINDOW_HOURS=<hours>   Sliding spin window [default: 12]");
        println!("  SPINWHEEL_CLAIM_LIMIT=<n>             Claims per local day [default: 3]");
        println!("  SPINWHEEL_UTC_OFFSET_MINUTES=<min>    Local day offset [default: -180]");
        println!("  SPINWHEEL_WHEEL_SECTORS=<n>           Wheel sectors [default: 6]");
        println!("  SPINWHEEL_EDGE_MARGIN=<degrees>       Sector edge margin [default: 5]");
        println!("  SPINWHEEL_COUPON_PREFIX=<prefix>      Coupon code prefix [default: TOP]");
        println!("  SPINWHEEL_CATALOG_FILE=<path>         Prize catalog file [default: built-in]");
        println!();

        println!("General Configuration:");
        println!(
            "  SPINWHEEL_LOG_LEVEL=<level>           Log level: error, warn, info, debug, trace [default: info]"
        );
        println!();

        println!("Examples:");
        println!("  # Persist records in SQLite");
        println!("  export SPINWHEEL_STORE=sqlite");
        println!("  export SPINWHEEL_DATABASE_URL=sqlite:///var/lib/spinwheel/records.db");
        println!();
        println!("  # Run server (CLI args override env vars)");
        println!("  spinwheel --http-port 9090");
    }
}
