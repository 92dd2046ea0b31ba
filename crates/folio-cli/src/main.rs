use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use folio_cache::{EnvelopeCache, SqliteStore};
use folio_core::{
    BlogList, BlogListRoot, Config, ControlEvent, DataAcquirer, Element, ListOptions, Role,
};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::{mpsc, oneshot};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod browse;

use browse::BrowseCommand;

#[derive(Parser)]
#[command(name = "folio")]
#[command(version, about = "Blog listing for the portfolio page: fetch, cache, filter, render", long_about = None)]
struct Cli {
    /// Config file to use instead of the default location
    #[arg(long, global = true, env = "FOLIO_CONFIG")]
    config: Option<PathBuf>,

    /// Blog endpoint, overrides the config file
    #[arg(long, global = true, env = "FOLIO_ENDPOINT")]
    endpoint: Option<String>,

    /// Skip the local cache entirely
    #[arg(long, global = true)]
    no_cache: bool,

    /// Entries per page
    #[arg(long, global = true)]
    per_page: Option<usize>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(clap::Subcommand)]
enum Commands {
    /// Render the blog listing markup
    Render {
        /// Sort by: date, reading_time or category
        #[arg(long)]
        sort: Option<String>,
        /// Keep entries with this category or tag
        #[arg(long)]
        filter: Option<String>,
        /// Keep entries whose title or content contains this
        #[arg(long)]
        search: Option<String>,
        /// How many pages to reveal
        #[arg(long, default_value_t = 1)]
        pages: usize,
        /// Write markup here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Drive the listing interactively from stdin
    Browse,
    /// Inspect or clear the local cache
    Cache {
        #[command(subcommand)]
        action: CacheAction,
    },
    /// Show or create the config file
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(clap::Subcommand)]
enum CacheAction {
    /// Show what is cached and how old it is
    Show,
    /// Remove the cached envelope
    Clear,
}

#[derive(clap::Subcommand)]
enum ConfigAction {
    /// Print the effective configuration
    Show,
    /// Write a config file with default values
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Logs go to stderr so rendered markup on stdout stays clean
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "folio_cli=info,folio_core=info,folio_api=info,folio_cache=info".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let config_path = match &cli.config {
        Some(path) => path.clone(),
        None => Config::config_path()?,
    };
    let config = effective_config(&cli, &config_path)?;

    match cli.command {
        Some(Commands::Render {
            sort,
            filter,
            search,
            pages,
            output,
        }) => {
            let mut list = initialized_list(&config).await?;

            if let Some(filter) = filter {
                list.dispatch(ControlEvent::FilterChanged(filter));
            }
            if let Some(search) = search {
                list.apply_search(&search);
            }
            if let Some(sort) = sort {
                list.dispatch(ControlEvent::SortChanged(sort));
            }
            for _ in 1..pages.max(1) {
                list.dispatch(ControlEvent::LoadMore);
            }

            let html = list.root().content().inner_html();
            match output {
                Some(path) => {
                    std::fs::write(&path, html)
                        .with_context(|| format!("Failed to write {}", path.display()))?;
                    tracing::info!("Wrote {} entries to {}", list.state().visible().len(), path.display());
                }
                None => println!("{}", html),
            }
        }
        Some(Commands::Browse) => browse(&config).await?,
        Some(Commands::Cache { action }) => cache_command(&config, action)?,
        Some(Commands::Config { action }) => match action {
            ConfigAction::Show => print!("{}", toml::to_string_pretty(&config)?),
            ConfigAction::Init { force } => {
                if config_path.exists() && !force {
                    anyhow::bail!(
                        "{} already exists, pass --force to overwrite",
                        config_path.display()
                    );
                }
                Config::default().save_to(&config_path)?;
                println!("Wrote {}", config_path.display());
            }
        },
        None => {
            println!("No command specified. Try --help");
        }
    }

    Ok(())
}

/// File values with command-line overrides applied
fn effective_config(cli: &Cli, path: &std::path::Path) -> anyhow::Result<Config> {
    let mut config = Config::load_from(path)?;

    if let Some(endpoint) = &cli.endpoint {
        config.source.endpoint = endpoint.clone();
    }
    if cli.no_cache {
        config.cache.enabled = false;
    }
    if let Some(per_page) = cli.per_page {
        config.list.per_page = per_page;
    }

    Ok(config)
}

fn page_root() -> BlogListRoot {
    let element = |tag: &str, role: Role| Element::new(tag).with_class(role.class_name());

    BlogListRoot::new(element("div", Role::Content))
        .with(Role::Loading, element("div", Role::Loading))
        .with(Role::Error, element("div", Role::Error).with_class("hidden"))
        .with(Role::Sort, element("select", Role::Sort))
        .with(Role::Filter, element("select", Role::Filter))
        .with(Role::Search, element("input", Role::Search))
        .with(Role::LoadMore, element("button", Role::LoadMore))
}

async fn initialized_list(config: &Config) -> anyhow::Result<BlogList> {
    let acquirer = DataAcquirer::from_config(config)?;
    let mut list = BlogList::new(page_root(), acquirer, ListOptions::from(&config.list));

    if list.initialize().await.is_err() {
        let message = list
            .root()
            .element(Role::Error)
            .map(|el| el.text().to_string())
            .unwrap_or_default();
        anyhow::bail!(message);
    }

    Ok(list)
}

async fn browse(config: &Config) -> anyhow::Result<()> {
    let mut list = initialized_list(config).await?;
    println!("{}", list.root().content().inner_html());
    eprintln!("{}", browse::HELP);

    let mut renders = list.subscribe_renders();
    let printer = tokio::spawn(async move {
        while renders.changed().await.is_ok() {
            let html = renders.borrow_and_update().clone();
            println!("{}", html);
        }
    });

    let (tx, rx) = mpsc::channel(32);
    let (quit_tx, quit_rx) = oneshot::channel();
    let reader = tokio::spawn(async move {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        while let Ok(Some(line)) = lines.next_line().await {
            match BrowseCommand::parse(&line) {
                Some(BrowseCommand::Quit) => {
                    let _ = quit_tx.send(());
                    return;
                }
                Some(BrowseCommand::Event(event)) => {
                    if tx.send(event).await.is_err() {
                        return;
                    }
                }
                None => eprintln!("Unknown command: {}\n{}", line.trim(), browse::HELP),
            }
        }
    });

    // End of input lets a pending search finish; an explicit quit tears down at once
    tokio::select! {
        _ = list.run(rx) => {}
        Ok(()) = quit_rx => tracing::debug!("Quit requested"),
    }
    list.destroy();
    drop(list);

    reader.await?;
    printer.await?;
    Ok(())
}

fn cache_command(config: &Config, action: CacheAction) -> anyhow::Result<()> {
    let path = config.cache.resolved_path()?;
    let store = SqliteStore::open(&path)?;
    let cache = EnvelopeCache::new(Arc::new(store), config.cache.key.clone(), config.cache.ttl());

    match action {
        CacheAction::Show => match cache.inspect(chrono::Utc::now().timestamp_millis())? {
            Some(info) => {
                let captured = chrono::DateTime::from_timestamp_millis(info.timestamp)
                    .map(|dt| dt.to_rfc3339())
                    .unwrap_or_else(|| info.timestamp.to_string());
                println!("Key:      {}", cache.key());
                println!("Entries:  {}", info.entries);
                println!("Captured: {} ({}s ago)", captured, info.age_ms / 1000);
                println!("Status:   {}", if info.fresh { "fresh" } else { "stale" });
            }
            None => println!("Nothing cached under '{}' in {}", cache.key(), path.display()),
        },
        CacheAction::Clear => {
            cache.clear()?;
            println!("Cleared '{}'", cache.key());
        }
    }

    Ok(())
}
