//! IPFS Rent Command Line Interface
//!
//! Registers, inspects and removes file records in a local registry.

mod settings;

use crate::settings::{AppConfig, LogFormat, StoreBackend};
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use ipfs_rent_registry::{
    ActorId, ContentHash, FileRegistry, FileStore, FileSummary, MemoryFileStore, SledFileStore,
};
use serde_json::json;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(name = "ipfs-rent")]
#[command(about = "IPFS Rent file registry", long_about = None)]
#[command(version)]
struct Cli {
    /// Path to a TOML configuration file
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Directory of the sled database (overrides configuration)
    #[arg(long, global = true, value_name = "PATH")]
    data_dir: Option<PathBuf>,

    /// Caller identity used for ownership checks
    #[arg(long = "as", global = true, value_name = "ACTOR")]
    actor: Option<String>,

    /// Print results as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
enum Commands {
    /// Register a new file owned by the caller
    Upload {
        /// Content hash (e.g. IPFS CID)
        hash: String,
        /// Declared size in bytes
        #[arg(long)]
        size: u64,
        /// Category tag
        #[arg(long)]
        category: u64,
    },
    /// Delete a file (owner only)
    Delete {
        /// Content hash
        hash: String,
    },
    /// Show the owner of a file
    Owner { hash: String },
    /// Show the category of a file
    Category { hash: String },
    /// Show the declared size of a file
    Size { hash: String },
    /// Show the access counter of a file
    Accesses { hash: String },
    /// Show the full record of a file
    Show { hash: String },
    /// List registered files
    List {
        #[arg(long, default_value_t = 0)]
        offset: usize,
        #[arg(long, default_value_t = 50)]
        limit: usize,
        /// Only files owned by this actor
        #[arg(long)]
        owner: Option<String>,
    },
    /// Count registered files
    Count,
}

impl Commands {
    fn is_mutating(&self) -> bool {
        matches!(self, Commands::Upload { .. } | Commands::Delete { .. })
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = AppConfig::load(cli.config.as_deref())?;
    if let Some(dir) = &cli.data_dir {
        config.data_dir = dir.clone();
    }
    init_logging(&config);

    let caller = cli
        .actor
        .clone()
        .or_else(|| config.default_actor.clone())
        .map(ActorId::new);

    info!(
        backend = %config.backend,
        access_counting = %config.access_counting,
        "opening registry"
    );
    let output = match config.backend {
        StoreBackend::Sled => {
            let store = SledFileStore::open(&config.data_dir)?;
            info!(path = %config.data_dir.display(), "using sled file store");
            let registry = FileRegistry::with_config(store, config.registry_config());
            execute(&registry, cli.command, caller.as_ref(), cli.json)?
        }
        StoreBackend::Memory => {
            let registry =
                FileRegistry::with_config(MemoryFileStore::new(), config.registry_config());
            execute(&registry, cli.command, caller.as_ref(), cli.json)?
        }
    };

    println!("{output}");
    Ok(())
}

fn init_logging(config: &AppConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    match config.log_format {
        LogFormat::Compact => tracing_subscriber::registry()
            .with(filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .compact()
                    .with_writer(std::io::stderr),
            )
            .init(),
        LogFormat::Pretty => tracing_subscriber::registry()
            .with(filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .pretty()
                    .with_writer(std::io::stderr),
            )
            .init(),
    }
}

/// Run one command against `registry` and render its result.
fn execute<S: FileStore>(
    registry: &FileRegistry<S>,
    command: Commands,
    caller: Option<&ActorId>,
    as_json: bool,
) -> Result<String> {
    let mutating = command.is_mutating();

    let output = match command {
        Commands::Upload {
            hash,
            size,
            category,
        } => {
            let hash = ContentHash::parse(hash)?;
            let caller = require_caller(caller)?;
            registry.upload_file(caller, &hash, size, category)?;
            render(
                as_json,
                json!({ "uploaded": hash, "owner": caller, "size": size, "category": category }),
                format!("File uploaded: {hash} (owner {caller}, size {size}, category {category})"),
            )?
        }
        Commands::Delete { hash } => {
            let hash = ContentHash::parse(hash)?;
            let caller = require_caller(caller)?;
            registry.delete_file(caller, &hash)?;
            render(
                as_json,
                json!({ "deleted": hash }),
                format!("File deleted: {hash}"),
            )?
        }
        Commands::Owner { hash } => {
            let owner = registry.get_file_owner(&ContentHash::parse(hash)?)?;
            render(as_json, json!({ "owner": owner }), owner.to_string())?
        }
        Commands::Category { hash } => {
            let category = registry.get_file_category(&ContentHash::parse(hash)?)?;
            render(as_json, json!({ "category": category }), category.to_string())?
        }
        Commands::Size { hash } => {
            let size = registry.get_file_size(&ContentHash::parse(hash)?)?;
            render(as_json, json!({ "size": size }), size.to_string())?
        }
        Commands::Accesses { hash } => {
            let accesses = registry.get_file_number_accesses(&ContentHash::parse(hash)?)?;
            render(as_json, json!({ "accesses": accesses }), accesses.to_string())?
        }
        Commands::Show { hash } => {
            let hash = ContentHash::parse(hash)?;
            let record = registry.get_file(&hash)?;
            render(
                as_json,
                serde_json::to_value(&record)?,
                format!(
                    "{hash}\n  owner:    {}\n  size:     {}\n  category: {}\n  accesses: {}",
                    record.owner, record.size, record.category, record.access_count
                ),
            )?
        }
        Commands::List {
            offset,
            limit,
            owner,
        } => {
            let files: Vec<FileSummary> = match owner {
                Some(owner) => registry
                    .list_files_by_owner(&ActorId::new(owner))?
                    .into_iter()
                    .skip(offset)
                    .take(limit)
                    .collect(),
                None => registry.list_files(offset, limit)?,
            };
            let text = files
                .iter()
                .map(|f| {
                    format!(
                        "{}\towner={}\tsize={}\tcategory={}\taccesses={}",
                        f.hash,
                        f.record.owner,
                        f.record.size,
                        f.record.category,
                        f.record.access_count
                    )
                })
                .collect::<Vec<_>>()
                .join("\n");
            render(as_json, serde_json::to_value(&files)?, text)?
        }
        Commands::Count => {
            let count = registry.file_count()?;
            render(as_json, json!({ "count": count }), count.to_string())?
        }
    };

    if mutating {
        registry.flush().context("failed to flush file store")?;
    }

    Ok(output)
}

fn require_caller(caller: Option<&ActorId>) -> Result<&ActorId> {
    caller.context(
        "no caller identity: pass --as <ACTOR> or set default_actor in the configuration",
    )
}

fn render(as_json: bool, value: serde_json::Value, text: String) -> Result<String> {
    if as_json {
        Ok(serde_json::to_string_pretty(&value)?)
    } else {
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ipfs_rent_registry::RegistryError;

    fn deployer() -> ActorId {
        ActorId::new("deployer")
    }

    fn upload(hash: &str) -> Commands {
        Commands::Upload {
            hash: hash.to_string(),
            size: 10,
            category: 2,
        }
    }

    #[test]
    fn test_parse_upload_command() {
        let cli = Cli::try_parse_from([
            "ipfs-rent", "--as", "deployer", "upload", "123", "--size", "10", "--category", "2",
        ])
        .unwrap();
        assert_eq!(cli.actor.as_deref(), Some("deployer"));
        assert_eq!(cli.command, upload("123"));
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["ipfs-rent", "owner", "123", "--json"]).unwrap();
        assert!(cli.json);
        assert_eq!(
            cli.command,
            Commands::Owner {
                hash: "123".to_string()
            }
        );
    }

    #[test]
    fn test_upload_requires_size_and_category() {
        assert!(Cli::try_parse_from(["ipfs-rent", "upload", "123"]).is_err());
    }

    #[test]
    fn test_execute_full_lifecycle() {
        let registry = FileRegistry::in_memory();
        let caller = deployer();

        let out = execute(&registry, upload("123"), Some(&caller), false).unwrap();
        assert!(out.starts_with("File uploaded: 123"));

        let owner = execute(
            &registry,
            Commands::Owner {
                hash: "123".to_string(),
            },
            None,
            false,
        )
        .unwrap();
        assert_eq!(owner, "deployer");

        let accesses = execute(
            &registry,
            Commands::Accesses {
                hash: "123".to_string(),
            },
            None,
            true,
        )
        .unwrap();
        let value: serde_json::Value = serde_json::from_str(&accesses).unwrap();
        assert_eq!(value["accesses"], 1);

        let err = execute(&registry, upload("123"), Some(&caller), false).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<RegistryError>(),
            Some(RegistryError::FileAlreadyExists { .. })
        ));

        execute(
            &registry,
            Commands::Delete {
                hash: "123".to_string(),
            },
            Some(&caller),
            false,
        )
        .unwrap();
        let count = execute(&registry, Commands::Count, None, false).unwrap();
        assert_eq!(count, "0");
    }

    #[test]
    fn test_mutations_need_a_caller() {
        let registry = FileRegistry::in_memory();
        let err = execute(&registry, upload("123"), None, false).unwrap_err();
        assert!(err.to_string().contains("no caller identity"));
        assert_eq!(registry.file_count().unwrap(), 0);
    }

    #[test]
    fn test_stranger_delete_is_rejected() {
        let registry = FileRegistry::in_memory();
        execute(&registry, upload("123"), Some(&deployer()), false).unwrap();

        let stranger = ActorId::new("account2");
        let err = execute(
            &registry,
            Commands::Delete {
                hash: "123".to_string(),
            },
            Some(&stranger),
            false,
        )
        .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<RegistryError>(),
            Some(RegistryError::NotOwner { .. })
        ));
    }

    #[test]
    fn test_list_filters_by_owner() {
        let registry = FileRegistry::in_memory();
        execute(&registry, upload("a"), Some(&deployer()), false).unwrap();
        execute(&registry, upload("b"), Some(&ActorId::new("other")), false).unwrap();

        let out = execute(
            &registry,
            Commands::List {
                offset: 0,
                limit: 10,
                owner: Some("deployer".to_string()),
            },
            None,
            true,
        )
        .unwrap();
        let value: serde_json::Value = serde_json::from_str(&out).unwrap();
        let files = value.as_array().unwrap();
        assert_eq!(files.len(), 1);
        assert_eq!(files[0]["hash"], "a");
    }
}
