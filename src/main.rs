use clap::{Parser, Subcommand};
use colored::Colorize;
use eyre::{Result, eyre};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;
use wishstore::config::default_store_path;
use wishstore::{BackendKind, Config, Item, ItemDetail, ItemStore, View};

#[derive(Parser)]
#[command(name = "wishstore")]
#[command(about = "WishStore CLI - Keep track of the things you wish for")]
#[command(version = env!("GIT_DESCRIBE"))]
struct Cli {
    /// Path to the store directory (default: platform data directory)
    #[arg(short, long)]
    store_path: Option<PathBuf>,

    /// Storage backend, overriding config.yaml
    #[arg(short, long)]
    backend: Option<BackendKind>,

    /// Storage key, overriding config.yaml
    #[arg(short, long)]
    key: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List wishes, grouped into sections unless a view is given
    List {
        #[arg(short, long)]
        view: Option<View>,
    },

    /// Add a wish with a picture (URI or local file path)
    Add { text: String, image: String },

    /// Mark a wish as fulfilled, or back to pending
    Toggle { id: String },

    /// Add or remove a wish from favorites
    Favorite { id: String },

    /// Delete a wish
    Remove {
        id: String,

        /// Also delete fulfilled wishes
        #[arg(long)]
        force: bool,
    },

    /// Show the detail page of a wish
    Show { id: String },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .init();

    let cli = Cli::parse();

    let store_path = cli.store_path.unwrap_or_else(default_store_path);
    let mut config = Config::load(&store_path)?;
    if let Some(backend) = cli.backend {
        config.backend = backend;
    }
    if let Some(key) = cli.key {
        config.key = key;
    }

    if !config.backend.is_durable() {
        eprintln!(
            "{}",
            "warning: memory backend in use, nothing is kept after this command exits".yellow()
        );
    }

    let backend = config.open_backend(&store_path)?;
    let mut store = ItemStore::load_with_key(backend, &config.key);

    match cli.command {
        Commands::List { view: Some(view) } => print_section(view, &store.view(view)),
        Commands::List { view: None } => {
            let favorites = store.favorites();
            if !favorites.is_empty() {
                print_section(View::Favorites, &favorites);
            }
            print_section(View::Pending, &store.pending());
            print_section(View::Fulfilled, &store.fulfilled());
        }
        Commands::Add { text, image } => {
            let image = image_uri(&image);
            let item = store.add(&text, &image).map_err(|e| eyre!("Cannot add wish: {}", e))?;
            println!("Added {} ({})", item.text().bold(), item.id());
        }
        Commands::Toggle { id } => {
            let item = store.toggle_completed(&id).ok_or_else(|| unknown(&id))?;
            let state = if item.completed() { "fulfilled" } else { "pending" };
            println!("{} is now {}", item.text().bold(), state);
        }
        Commands::Favorite { id } => {
            let item = store.toggle_favorite(&id).ok_or_else(|| unknown(&id))?;
            let state = if item.favorite() { "added to" } else { "removed from" };
            println!("{} {} favorites", item.text().bold(), state);
        }
        Commands::Remove { id, force } => {
            let item = store.get(&id).ok_or_else(|| unknown(&id))?;
            check_removable(item, force)?;
            if let Some(removed) = store.remove(&id) {
                println!("Removed {}", removed.text().bold());
            }
        }
        Commands::Show { id } => {
            let item = store.get(&id).ok_or_else(|| unknown(&id))?;
            println!("{}", ItemDetail::from(item));
            if let Some(created) = item.created_at() {
                println!("\nAdded {}", created.format("%Y-%m-%d %H:%M"));
            }
        }
    }

    if !store.is_synced() {
        return Err(eyre!("Changes could not be saved to {}", store_path.display()));
    }

    Ok(())
}

fn unknown(id: &str) -> eyre::Report {
    eyre!("No item with id {}", id)
}

/// Fulfilled wishes stay on the list unless removal is forced
fn check_removable(item: &Item, force: bool) -> Result<()> {
    if item.completed() && !force {
        return Err(eyre!(
            "{} is already fulfilled; use --force to delete it",
            item.text()
        ));
    }
    Ok(())
}

/// Local files become file:// URIs, anything else is taken as a URI already
fn image_uri(image: &str) -> String {
    let path = Path::new(image);
    if path.exists() {
        if let Ok(absolute) = path.canonicalize() {
            return format!("file://{}", absolute.display());
        }
    }
    image.to_string()
}

fn print_section(view: View, items: &[&Item]) {
    println!("{} ({})", view.title().bold().underline(), items.len());
    if items.is_empty() {
        println!("  {}", "nothing here yet".dimmed());
    }
    for item in items {
        print_item(item);
    }
    println!();
}

fn print_item(item: &Item) {
    let star = if item.favorite() { "★".yellow() } else { " ".normal() };
    let check = if item.completed() { "[x]".green() } else { "[ ]".normal() };
    let text = if item.completed() {
        item.text().strikethrough().dimmed()
    } else {
        item.text().normal()
    };
    println!("  {} {} {} {}", star, check, text, item.id().dimmed());
}
