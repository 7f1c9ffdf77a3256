use chrono::{Duration, NaiveDate, Utc};
use clap::{Parser, Subcommand};
use gazette::{
    CategoryRegistry, Config, ContentStore, Lookup, MigrationRunner, PgStore, PostSummary, Site,
    TracedPool, Video, create_pool,
};
use owo_colors::OwoColorize;
use std::sync::Arc;
use uuid::Uuid;

mod seed;

/// Longest range `stats` will report, in days.
const MAX_STATS_DAYS: u32 = 366;

/// Operator tool for a gazette content database.
#[derive(Parser, Debug)]
#[command(name = "gazette", version)]
struct Cli {
    /// Database connection URL (defaults to DATABASE_URL)
    #[arg(long, global = true)]
    database_url: Option<String>,

    /// Use a seeded in-memory store instead of Postgres
    #[arg(long, global = true)]
    memory: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run pending migrations
    Migrate,
    /// Show migration status
    Status,
    /// Print the category tree
    Categories,
    /// Show one page of a category
    Category {
        slug: String,
        #[arg(long, default_value_t = 1)]
        page: i64,
    },
    /// Show a post, counting a view
    Post {
        post_id: Uuid,
        /// Visitor token from a previous view
        #[arg(long)]
        token: Option<String>,
    },
    /// Show the home page lists
    Home,
    /// List videos
    Videos {
        #[arg(long)]
        category: Option<String>,
        #[arg(long, default_value_t = 1)]
        page: i64,
    },
    /// Site-wide views per day
    Stats {
        /// Last day to show (defaults to today, UTC)
        #[arg(long)]
        date: Option<NaiveDate>,
        /// Number of days to show, ending at --date (at most 366)
        #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u32).range(1..=MAX_STATS_DAYS as i64))]
        days: u32,
    },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("gazette=info")),
        )
        .init();

    let cli = Cli::parse();
    if let Err(e) = run(cli).await {
        eprintln!("{} {}", "error:".red().bold(), e);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    if cli.memory && matches!(cli.command, Commands::Migrate | Commands::Status) {
        return Err("--memory has no schema to migrate; run migrate/status against Postgres".into());
    }

    let mut config = Config::from_env()?;
    if let Some(url) = cli.database_url {
        config.database_url = Some(url);
    }

    match cli.command {
        Commands::Migrate => {
            let pool = connect(&config)?;
            let mut conn = pool.get().await?;
            let applied = MigrationRunner::new(&mut conn).migrate().await?;
            if applied.is_empty() {
                println!("{}", "Schema is up to date.".green());
            }
            for version in applied {
                println!("{} {}", "applied".green(), version);
            }
        }
        Commands::Status => {
            let pool = connect(&config)?;
            let mut conn = pool.get().await?;
            for status in MigrationRunner::new(&mut conn).status().await? {
                let mark = if status.applied {
                    "applied".green().to_string()
                } else {
                    "pending".yellow().to_string()
                };
                println!("  {} {} {}", mark, status.version.dimmed(), status.name);
            }
        }
        Commands::Categories => print_categories(&CategoryRegistry::builtin()),
        command => {
            let site = open_site(&config, cli.memory)?;
            run_site_command(&site, command).await?;
        }
    }
    Ok(())
}

fn connect(config: &Config) -> gazette::Result<TracedPool> {
    let url = config.require_database_url()?;
    println!("{} {}", "database:".dimmed(), mask_password(url));
    create_pool(config)
}

fn open_site(config: &Config, memory: bool) -> gazette::Result<Site<dyn ContentStore>> {
    let store: Arc<dyn ContentStore> = if memory {
        Arc::new(seed::demo_store())
    } else {
        let url = config.require_database_url()?;
        tracing::info!(database = %mask_password(url), "using postgres store");
        Arc::new(PgStore::new(create_pool(config)?))
    };
    Ok(Site::new(store, CategoryRegistry::builtin(), config))
}

async fn run_site_command(site: &Site<dyn ContentStore>, command: Commands) -> gazette::Result<()> {
    match command {
        Commands::Category { slug, page } => match site.category_page(&slug, page).await? {
            Lookup::NotFound => println!("{} unknown category '{}'", "404".red(), slug),
            Lookup::Found(page) => {
                let name = site.registry().display_name(&page.slug);
                println!("{} ({})", name.bold(), page.slug.dimmed());
                for post in &page.posts {
                    print_summary(post);
                }
                let p = page.pagination;
                println!(
                    "{}",
                    format!(
                        "page {}/{} - {} posts{}{}",
                        p.current_page,
                        p.total_pages,
                        p.total_posts,
                        if p.has_prev_page { " - has previous" } else { "" },
                        if p.has_next_page { " - has next" } else { "" },
                    )
                    .dimmed()
                );
            }
        },
        Commands::Post { post_id, token } => {
            let token = site.parse_token(token.as_deref());
            match site.post_page(post_id, token).await? {
                Lookup::NotFound => println!("{} no post {}", "404".red(), post_id),
                Lookup::Found(page) => {
                    let post = &page.record.post;
                    println!("{}", post.title.bold());
                    println!(
                        "by {} - {} min read - {} views",
                        page.author.cyan(),
                        page.reading_time,
                        post.views
                    );
                    if let Some(category) = &page.category_name {
                        println!("in {}", category);
                    }
                    println!("{} {}", "token:".dimmed(), page.token);
                }
            }
        }
        Commands::Home => {
            let home = site.home_page().await?;
            for (title, list) in [
                ("Featured", &home.featured),
                ("Latest", &home.latest),
                ("Popular", &home.popular),
                ("Trending", &home.trending),
            ] {
                println!("{}", title.bold());
                for post in list {
                    print_summary(post);
                }
            }
        }
        Commands::Videos { category, page } => {
            for video in site.videos(category.as_deref(), page).await? {
                print_video(&video);
            }
        }
        Commands::Stats { date, days } => {
            let to = date.unwrap_or_else(|| Utc::now().date_naive());
            let from = stats_range_start(to, days)?;
            for stat in site.daily_stats(from, to).await? {
                println!("  {}  {}", stat.date, stat.views.to_string().bold());
            }
        }
        Commands::Migrate | Commands::Status | Commands::Categories => {}
    }
    Ok(())
}

/// First day of a `days`-long range ending at `to`.
fn stats_range_start(to: NaiveDate, days: u32) -> gazette::Result<NaiveDate> {
    let days = days.clamp(1, MAX_STATS_DAYS);
    to.checked_sub_signed(Duration::days(i64::from(days) - 1))
        .ok_or_else(|| gazette::Error::config(format!("{days} days before {to} is out of range")))
}

fn print_categories(registry: &CategoryRegistry) {
    let hierarchy = registry.hierarchy();
    for main in &hierarchy.mains {
        println!("{} {}", main.display_name.bold(), main.slug.dimmed());
        for sub in hierarchy.subs_by_parent.get(main.slug.as_str()).into_iter().flatten() {
            println!("  {} {}", sub.display_name, sub.slug.dimmed());
        }
    }
}

fn print_summary(post: &PostSummary) {
    let marker = if post.featured {
        "*".yellow().to_string()
    } else {
        " ".to_string()
    };
    println!(
        "  {} {} {} {}",
        marker,
        post.title,
        format!("by {}", post.author).dimmed(),
        post.post_id.dimmed()
    );
}

fn print_video(video: &Video) {
    println!(
        "  {} {} {}",
        video.title,
        video.category.as_deref().unwrap_or("-").dimmed(),
        format!("{} views", video.views).dimmed()
    );
}

/// Mask password in database URL for display
fn mask_password(url: &str) -> String {
    let Some(start) = url.find("://") else {
        return url.to_string();
    };
    let Some(at) = url.rfind('@') else {
        return url.to_string();
    };
    if at < start + 3 {
        return url.to_string();
    }
    let credentials = &url[start + 3..at];
    match credentials.find(':') {
        Some(colon) => format!(
            "{}{}:***{}",
            &url[..start + 3],
            &credentials[..colon],
            &url[at..]
        ),
        None => url.to_string(),
    }
}
