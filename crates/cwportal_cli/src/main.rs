//! Admin command line over a SQLite-backed article store.
//!
//! # Responsibility
//! - Map subcommands onto `ArticleService` use-cases.
//! - Keep output line-oriented so it can be piped.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use cwportal_core::{
    init_logging, Article, ArticleDraft, ArticlePatch, ArticleService, ArticleStatus,
    LocationState, MemoryStorage, PersistentArticleStore, SqliteStorage, StoreConfig,
};
use log::info;
use std::path::PathBuf;

type Service = ArticleService<SqliteStorage, MemoryStorage>;

#[derive(Parser, Debug)]
#[command(name = "cwportal", version, about = "Manage portal articles stored with redundant backups")]
struct Cli {
    /// SQLite file holding the persistent storage partition.
    #[arg(long, default_value = "cwportal.sqlite3")]
    db: PathBuf,

    /// JSON store configuration (key names, schema version, defaults).
    #[arg(long)]
    config: Option<PathBuf>,

    /// Absolute directory for rolling log files. Logging is off when omitted.
    #[arg(long)]
    log_dir: Option<PathBuf>,

    #[arg(long, default_value_t = cwportal_core::default_log_level().to_string())]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List articles, optionally filtered by status.
    List {
        #[arg(long, value_enum)]
        status: Option<StatusArg>,
    },
    /// Print one article as JSON.
    Show { id_or_slug: String },
    /// Create an article.
    Create {
        #[arg(long)]
        title: String,
        #[arg(long)]
        content: Option<String>,
        #[arg(long)]
        excerpt: Option<String>,
        #[arg(long)]
        category: Option<String>,
        #[arg(long)]
        author: Option<String>,
        #[arg(long)]
        draft: bool,
    },
    /// Update fields of an existing article.
    Update {
        id: String,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        slug: Option<String>,
        #[arg(long)]
        content: Option<String>,
        #[arg(long)]
        category: Option<String>,
        #[arg(long, value_enum)]
        status: Option<StatusArg>,
    },
    /// Delete an article by id.
    Delete { id: String },
    /// Write the export document to a file or stdout.
    Export {
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Replace the whole collection from an export document or JSON array.
    Import { file: PathBuf },
    /// Show what each storage location holds.
    Info,
    /// Run the schema check and migration step explicitly.
    Migrate,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum StatusArg {
    Draft,
    Published,
}

impl From<StatusArg> for ArticleStatus {
    fn from(value: StatusArg) -> Self {
        match value {
            StatusArg::Draft => ArticleStatus::Draft,
            StatusArg::Published => ArticleStatus::Published,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    if let Some(log_dir) = cli.log_dir.as_ref() {
        let log_dir = log_dir
            .to_str()
            .context("log directory must be valid UTF-8")?;
        init_logging(&cli.log_level, log_dir).context("failed to initialize logging")?;
    }

    let config = match cli.config.as_ref() {
        Some(path) => StoreConfig::from_json_file(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => StoreConfig::default(),
    };
    let persistent = SqliteStorage::open(&cli.db)
        .with_context(|| format!("failed to open {}", cli.db.display()))?;
    let store = PersistentArticleStore::new(config, persistent, MemoryStorage::new());
    let mut service = ArticleService::new(store);

    info!("event=cli_command module=cli status=start db={}", cli.db.display());
    run(&mut service, cli.command)
}

fn run(service: &mut Service, command: Command) -> Result<()> {
    match command {
        Command::List { status } => {
            let articles = match status {
                Some(status) => service.get_articles_by_status(status.into()),
                None => service.get_articles(),
            };
            for article in &articles {
                print_row(article);
            }
        }
        Command::Show { id_or_slug } => {
            let Some(article) = service.find_article(&id_or_slug) else {
                bail!("no article with id or slug `{id_or_slug}`");
            };
            println!("{}", serde_json::to_string_pretty(&article)?);
        }
        Command::Create {
            title,
            content,
            excerpt,
            category,
            author,
            draft,
        } => {
            let article = service.save_article(ArticleDraft {
                title: Some(title),
                content,
                excerpt,
                category,
                author,
                status: Some(if draft {
                    ArticleStatus::Draft
                } else {
                    ArticleStatus::Published
                }),
            });
            print_row(&article);
        }
        Command::Update {
            id,
            title,
            slug,
            content,
            category,
            status,
        } => {
            let patch = ArticlePatch {
                title,
                slug,
                content,
                category,
                status: status.map(Into::into),
                ..ArticlePatch::default()
            };
            if patch.is_empty() {
                bail!("nothing to update; pass at least one field");
            }
            let Some(article) = service.update_article(&id, patch) else {
                bail!("no article with id `{id}`");
            };
            print_row(&article);
        }
        Command::Delete { id } => {
            if !service.delete_article(&id) {
                bail!("no article with id `{id}`");
            }
            println!("deleted {id}");
        }
        Command::Export { out } => {
            let json = service.export_articles();
            match out {
                Some(path) => {
                    std::fs::write(&path, json)
                        .with_context(|| format!("failed to write {}", path.display()))?;
                    println!("exported to {}", path.display());
                }
                None => println!("{json}"),
            }
        }
        Command::Import { file } => {
            let json = std::fs::read_to_string(&file)
                .with_context(|| format!("failed to read {}", file.display()))?;
            if !service.import_articles(&json) {
                bail!("{} is not a valid article export", file.display());
            }
            println!("imported {} articles", service.get_articles().len());
        }
        Command::Info => {
            let info = service.store().storage_info();
            println!(
                "schema expected={} stored={}",
                info.expected_schema,
                info.stored_schema.as_deref().unwrap_or("none")
            );
            for location in info.locations {
                let state = match location.state {
                    LocationState::Missing => "missing".to_string(),
                    LocationState::Articles(count) => format!("{count} articles"),
                    LocationState::Unreadable(reason) => format!("unreadable ({reason})"),
                };
                println!("{}\t{} bytes\t{}", location.location, location.bytes, state);
            }
        }
        Command::Migrate => match service.store_mut().initialize() {
            Some(outcome) => println!("migrated: {outcome:?}"),
            None => println!("schema up to date"),
        },
    }
    Ok(())
}

fn print_row(article: &Article) {
    println!(
        "{}\t{}\t{}\tv{}\t{}",
        article.id,
        article.status.as_str(),
        article.slug,
        article.version,
        article.title
    );
}
