//! permstore operations binary
//!
//! Inspects a permission store through the permission cache.
//!
//! # Usage
//!
//! ```bash
//! # Compare cache and storage, exit code 1 on drift
//! permstore --config permstore.yaml consistency --full
//!
//! # Merged permissions of groups 2 and 3 on folder 5
//! permstore merged --groups 2,3 --type folder --id 5
//!
//! # Groups that may view pages in folder 5, in language 2
//! permstore who-can --type folder --id 5 --bit 11 --role-bit 10 --check-type page --language 2
//!
//! # Type tree
//! PERMSTORE_LOGGING__LEVEL=warn permstore types --inactive
//! ```

use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing::info;

use permstore_domain::model::{Bit, GroupId, LanguageId, ObjectId};
use permstore_domain::{register_cache_metrics, TypeRegistry};
use permstore_server::commands::{self, WhoCanQuery};
use permstore_server::{init_logging, LoggingConfig, PermstoreConfig};

/// permstore - permission cache inspection tool
#[derive(Parser, Debug)]
#[command(name = "permstore")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to configuration file (YAML)
    #[arg(short, long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Compare the cache with storage
    Consistency {
        /// Diff every group in both directions
        #[arg(long)]
        full: bool,
        /// Render the report as HTML
        #[arg(long)]
        html: bool,
    },
    /// Print the merged permission bits of groups
    Merged {
        /// Comma separated group ids
        #[arg(long, value_delimiter = ',', required = true)]
        groups: Vec<GroupId>,
        /// Object type name or number
        #[arg(long = "type")]
        obj_type: String,
        /// Object id; type-level permissions without it
        #[arg(long)]
        id: Option<ObjectId>,
    },
    /// List the groups holding a bit on an object
    WhoCan {
        /// Object type name or number
        #[arg(long = "type")]
        obj_type: String,
        /// Object id
        #[arg(long)]
        id: ObjectId,
        /// Group bit to check
        #[arg(long)]
        bit: Bit,
        /// Role bit to check
        #[arg(long)]
        role_bit: Option<Bit>,
        /// Type the role side is evaluated for (page, file, image)
        #[arg(long)]
        check_type: Option<String>,
        /// Content language for page role permissions
        #[arg(long, default_value_t = 0)]
        language: LanguageId,
    },
    /// Print the type tree with declared bits
    Types {
        /// Include types and bits of disabled features
        #[arg(long)]
        inactive: bool,
    },
}

fn main() -> anyhow::Result<ExitCode> {
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => PermstoreConfig::load(path)?,
        None => PermstoreConfig::from_env()?,
    };
    init_logging(&LoggingConfig::from(&config.logging));
    register_cache_metrics();
    info!(version = env!("CARGO_PKG_VERSION"), "starting permstore");

    let registry = TypeRegistry::with_defaults(config.features.clone());

    match args.command {
        Command::Types { inactive } => {
            print!("{}", commands::type_tree(&registry, inactive));
        }
        Command::Consistency { full, html } => {
            let cache = commands::open_cache(&config)?;
            let report = commands::consistency(&cache, full, html)?;
            println!("{}", report.render());
            if !report.consistent {
                return Ok(ExitCode::FAILURE);
            }
        }
        Command::Merged {
            groups,
            obj_type,
            id,
        } => {
            let cache = commands::open_cache(&config)?;
            println!(
                "{}",
                commands::merged(&cache, &registry, &groups, &obj_type, id)?
            );
        }
        Command::WhoCan {
            obj_type,
            id,
            bit,
            role_bit,
            check_type,
            language,
        } => {
            let cache = commands::open_cache(&config)?;
            let query = WhoCanQuery {
                type_key: obj_type,
                obj_id: id,
                bit,
                role_bit,
                check_type,
                language_id: language,
            };
            let groups = commands::who_can(&cache, &registry, &query)?;
            let listed: Vec<String> = groups.iter().map(ToString::to_string).collect();
            println!("{}", listed.join(","));
        }
    }
    Ok(ExitCode::SUCCESS)
}
