//! sidecar-store CLI
//!
//! Command-line access to a content store on local disk.

use std::io::{self, Write};
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use serde_json::json;
use sidecar_store::{Config, Content, ContentStore, MetaDatum, Payload, StoreError};
use tracing_subscriber::{fmt, EnvFilter};

/// sidecar-store CLI
#[derive(Parser, Debug)]
#[command(name = "sidecar-store-cli")]
#[command(about = "Hierarchical content store with inherited metadata")]
#[command(version)]
struct Args {
    /// Storage root directory
    #[arg(short, long, default_value = "./content_data")]
    root: PathBuf,

    /// Delete the storage root when done
    #[arg(long)]
    delete_on_shutdown: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print an item: header, effective metadata and payload
    Read {
        path: String,
    },

    /// Print an item's header
    Header {
        path: String,
    },

    /// Print an item's effective metadata
    Meta {
        path: String,
    },

    /// Replace an item's own metadata entries
    SetMeta {
        path: String,

        /// Entries as key=value
        entries: Vec<String>,
    },

    /// List the children of a folder
    Ls {
        #[arg(default_value = "/")]
        path: String,
    },

    /// Create a folder
    Mkdir {
        parent: String,
        name: String,
    },

    /// Create a leaf from a local file
    Put {
        parent: String,

        /// Local file to upload
        file: PathBuf,

        /// Item name (defaults to the file name)
        #[arg(short, long)]
        name: Option<String>,

        /// Declared media type
        #[arg(short, long)]
        media_type: Option<String>,
    },

    /// Overwrite a leaf from a local file, optionally renaming it
    Update {
        path: String,

        /// Local file with the new content
        file: PathBuf,

        /// New item name
        #[arg(short, long)]
        name: Option<String>,

        /// Declared media type
        #[arg(short, long)]
        media_type: Option<String>,
    },

    /// Write a leaf's raw bytes to stdout
    Cat {
        path: String,
    },
}

fn main() {
    // Initialize tracing/logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,sidecar_store=debug"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();

    tracing::debug!("sidecar-store CLI v{}", sidecar_store::VERSION);

    let config = Config::builder()
        .storage_root(&args.root)
        .delete_on_shutdown(args.delete_on_shutdown)
        .build();

    let store = match ContentStore::open(config) {
        Ok(store) => store,
        Err(e) => {
            tracing::error!("Failed to open store: {}", e);
            std::process::exit(1);
        }
    };

    let result = run(&store, args.command);

    if let Err(e) = store.close() {
        tracing::error!("Failed to close store: {}", e);
    }

    if let Err(e) = result {
        tracing::error!("[{}] {}", e.code(), e);
        std::process::exit(if e.is_recoverable() { 2 } else { 1 });
    }
}

fn run(store: &ContentStore, command: Commands) -> Result<(), StoreError> {
    match command {
        Commands::Read { path } => {
            let content = store.read(&path)?;
            let payload = match &content.payload {
                Payload::Structured(document) => json!(document),
                Payload::Binary(bytes) => json!({ "binaryLength": bytes.len() }),
            };
            print_json(&json!({
                "header": content.header,
                "metaData": content.metadata,
                "content": payload,
            }))
        }
        Commands::Header { path } => print_json(&json!(store.load_header(&path)?)),
        Commands::Meta { path } => print_json(&json!(store.load_metadata(&path)?.entries())),
        Commands::SetMeta { path, entries } => {
            let entries = entries
                .iter()
                .map(|raw| parse_entry(raw))
                .collect::<Result<Vec<_>, _>>()?;
            store.write_metadata_only(&path, entries)
        }
        Commands::Ls { path } => print_json(&json!(store.list_children(&path)?)),
        Commands::Mkdir { parent, name } => {
            let path = store.create(&parent, Content::node(name))?;
            println!("{}", path);
            Ok(())
        }
        Commands::Put {
            parent,
            file,
            name,
            media_type,
        } => {
            let name = match name {
                Some(name) => name,
                None => file_name(&file)?,
            };
            let bytes = std::fs::read(&file)?;
            let path = store.create(&parent, Content::upload(name, media_type, bytes))?;
            println!("{}", path);
            Ok(())
        }
        Commands::Update {
            path,
            file,
            name,
            media_type,
        } => {
            let bytes = std::fs::read(&file)?;
            let content = Content::upload(name.unwrap_or_default(), media_type, bytes);
            let path = store.write(&path, content)?;
            println!("{}", path);
            Ok(())
        }
        Commands::Cat { path } => {
            let mut file = store.load_payload(&path)?;
            let mut stdout = io::stdout().lock();
            io::copy(&mut file, &mut stdout)?;
            stdout.flush()?;
            Ok(())
        }
    }
}

fn parse_entry(raw: &str) -> Result<MetaDatum, StoreError> {
    raw.split_once('=')
        .map(|(key, value)| MetaDatum::new(key, value))
        .ok_or_else(|| StoreError::Config(format!("expected key=value, got '{}'", raw)))
}

fn file_name(file: &std::path::Path) -> Result<String, StoreError> {
    file.file_name()
        .and_then(|name| name.to_str())
        .map(str::to_string)
        .ok_or_else(|| StoreError::InvalidPath(format!("no file name in {}", file.display())))
}

fn print_json(value: &serde_json::Value) -> Result<(), StoreError> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
