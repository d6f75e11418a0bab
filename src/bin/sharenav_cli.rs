//! ShareNav CLI — browse and curate a remote file share
//!
//! Usage:
//!   sharenav-cli ls [path]                 List a folder
//!   sharenav-cli search <query> [--folder <path>]  Search the share
//!   sharenav-cli mv <file> <folder>        Move a file to another folder
//!   sharenav-cli rm <path>                 Delete a file or folder
//!   sharenav-cli mkdir <parent> <name>     Create a folder
//!   sharenav-cli server <url>              Save the server base URL

use std::sync::Arc;

use anyhow::{anyhow, Context};
use clap::{Parser, Subcommand};

use sharenav::{
    path, ClientConfig, Entry, HttpStore, NavigationContext, RelocateWorkflow, RemoteStore,
    SearchController, TreeCache,
};

#[derive(Parser)]
#[command(
    name = "sharenav-cli",
    about = "ShareNav CLI — browse and curate a remote file share",
    version
)]
struct Cli {
    /// Server base URL (overrides the saved config)
    #[arg(long, global = true)]
    server: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List a folder
    Ls {
        /// Folder path (default: share root)
        #[arg(default_value = "")]
        path: String,
    },
    /// Search the share
    Search {
        /// Query text
        query: String,
        /// Folder to scope the search to
        #[arg(long, default_value = "")]
        folder: String,
    },
    /// Move a file to another folder
    Mv {
        /// Current path of the file
        file: String,
        /// Destination folder path
        folder: String,
    },
    /// Delete a file or folder
    Rm {
        /// Path of the entry to delete
        path: String,
    },
    /// Create a folder
    Mkdir {
        /// Parent folder path
        parent: String,
        /// New folder name
        name: String,
    },
    /// Save the server base URL to the client config
    Server {
        /// Base URL (e.g. http://localhost:8000)
        url: String,
    },
}

struct Session {
    store: Arc<dyn RemoteStore>,
    cache: Arc<TreeCache>,
}

impl Session {
    fn open(config: &ClientConfig) -> anyhow::Result<Self> {
        let store = HttpStore::new(config).context("failed to build store client")?;
        Ok(Self {
            store: Arc::new(store),
            cache: Arc::new(TreeCache::new()),
        })
    }

    async fn context_at(&self, folder: &str) -> anyhow::Result<Arc<NavigationContext>> {
        let context = Arc::new(NavigationContext::new(
            self.store.clone(),
            self.cache.clone(),
        ));
        context.open_folder(folder).await?;
        Ok(context)
    }

    /// Locate a file entry by its full path via its parent's listing.
    async fn find_file(&self, file_path: &str) -> anyhow::Result<(Arc<NavigationContext>, Entry)> {
        let file_path = path::normalize(file_path);
        let context = self.context_at(&path::parent(&file_path)).await?;
        let listing = context
            .listing()
            .await
            .ok_or_else(|| anyhow!("no listing for '{}'", path::parent(&file_path)))?;
        let entry = listing
            .files
            .iter()
            .find(|f| f.path == file_path)
            .cloned()
            .ok_or_else(|| anyhow!("no file at '{}'", file_path))?;
        Ok((context, entry))
    }
}

fn print_entries(entries: &[Entry]) {
    for entry in entries {
        if entry.is_folder {
            println!("{:>10}  {}/", "-", entry.path);
        } else {
            let uploaded = entry
                .uploaded_at
                .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
                .unwrap_or_default();
            println!("{:>10}  {}  {}", entry.size, entry.path, uploaded);
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let mut config = ClientConfig::load();
    if let Some(server) = &cli.server {
        config.base_url = server.clone();
    }

    match cli.command {
        Commands::Ls { path: folder } => {
            let session = Session::open(&config)?;
            let context = session.context_at(&folder).await?;
            let confirmed = context.current_path().await;
            let entries = context.visible().await;
            println!(
                "{} ({} entries)",
                if confirmed.is_empty() { "/" } else { confirmed.as_str() },
                entries.len()
            );
            print_entries(&entries);
        }
        Commands::Search { query, folder } => {
            let session = Session::open(&config)?;
            let context = session.context_at(&folder).await?;
            let controller = SearchController::new(
                session.store.clone(),
                session.cache.clone(),
                context,
            );
            controller
                .set_query(&query)
                .await
                .map_err(|e| anyhow!("search task failed: {}", e))?;
            match controller.results() {
                Some(results) => {
                    println!("{} results ({:?})", results.entries.len(), results.provenance);
                    print_entries(&results.entries);
                }
                None => println!("no results"),
            }
        }
        Commands::Mv { file, folder } => {
            let session = Session::open(&config)?;
            let (context, entry) = session.find_file(&file).await?;
            let workflow = RelocateWorkflow::begin(
                session.store.clone(),
                session.cache.clone(),
                context,
                &entry,
            )
            .await?;
            workflow.picker().open_folder(&folder).await?;
            let message = workflow.commit().await?;
            println!("{}", message);
        }
        Commands::Rm { path: item } => {
            let session = Session::open(&config)?;
            let item = path::normalize(&item);
            let context = session.context_at(&path::parent(&item)).await?;
            let listing = context
                .listing()
                .await
                .ok_or_else(|| anyhow!("no listing for '{}'", path::parent(&item)))?;
            let entry = listing
                .folders
                .iter()
                .chain(listing.files.iter())
                .find(|e| e.path == item)
                .cloned()
                .ok_or_else(|| anyhow!("no entry at '{}'", item))?;
            context.delete_entry(&entry).await?;
            println!("Deleted '{}'", item);
        }
        Commands::Mkdir { parent, name } => {
            let session = Session::open(&config)?;
            let context = session.context_at(&parent).await?;
            let message = context.create_folder(&name).await?;
            println!("{}", message);
        }
        Commands::Server { url } => {
            config.base_url = url;
            config.save()?;
            println!("Server set to {}", config.base_url);
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::WARN)
        .init();

    let cli = Cli::parse();
    if let Err(e) = run(cli).await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
