use std::time::Duration;

use chrono::Local;
use clap::{Args, Parser, Subcommand};
use playscrape::cache::CacheOptions;
use playscrape::constants::{Age, Collection, SearchPrice, Sort};
use playscrape::options::{
    AppOptions, CallOptions, CategoriesOptions, DataSafetyOptions, DeveloperOptions, ListOptions, PermissionsOptions,
    ReviewsOptions, SearchOptions, SimilarOptions, SuggestOptions,
};
use playscrape::{info_time, Client, ClientOptions, Result};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "storescrape", about = "Fetch app store records and print them as JSON", version)]
struct Cli {
    /// Request timeout in seconds.
    #[arg(long, default_value_t = 15)]
    timeout: u64,

    /// Retries for timeouts, connection errors, 429 and 503.
    #[arg(long, default_value_t = 0)]
    retries: u32,

    /// Requests per second, 0 for no limit.
    #[arg(long, default_value_t = 0)]
    throttle: usize,

    #[arg(long)]
    proxy: Option<String>,

    /// Memoize results for this many seconds within the run.
    #[arg(long)]
    cache_secs: Option<u64>,

    #[command(subcommand)]
    command: Command,
}

/// Locale flags shared by most commands.
#[derive(Args)]
struct Locale {
    #[arg(long, default_value = playscrape::DEFAULT_LANG)]
    lang: String,
    #[arg(long, default_value = playscrape::DEFAULT_COUNTRY)]
    country: String,
}

#[derive(Subcommand)]
enum Command {
    /// Full details of one app.
    App {
        app_id: String,
        #[command(flatten)]
        locale: Locale,
    },
    /// A top chart of a category.
    List {
        #[arg(long, default_value = "TOP_FREE")]
        collection: Collection,
        #[arg(long, default_value = playscrape::constants::CATEGORY_APPLICATION)]
        category: String,
        #[arg(long)]
        age: Option<Age>,
        #[arg(long, default_value_t = playscrape::options::DEFAULT_LIST_NUM)]
        num: usize,
        #[arg(long)]
        full_detail: bool,
        #[command(flatten)]
        locale: Locale,
    },
    /// Apps matching a search term.
    Search {
        term: String,
        #[arg(long, default_value_t = playscrape::options::DEFAULT_SEARCH_NUM)]
        num: usize,
        #[arg(long, default_value = "all")]
        price: SearchPrice,
        #[arg(long)]
        full_detail: bool,
        #[command(flatten)]
        locale: Locale,
    },
    /// Apps of one developer, by name or numeric id.
    Developer {
        dev_id: String,
        #[arg(long, default_value_t = playscrape::options::DEFAULT_DEVELOPER_NUM)]
        num: usize,
        #[arg(long)]
        full_detail: bool,
        #[command(flatten)]
        locale: Locale,
    },
    /// Apps similar to one app.
    Similar {
        app_id: String,
        #[arg(long, default_value_t = playscrape::options::DEFAULT_SIMILAR_NUM)]
        num: usize,
        #[arg(long)]
        full_detail: bool,
        #[command(flatten)]
        locale: Locale,
    },
    /// Reviews of one app.
    Reviews {
        app_id: String,
        #[arg(long, default_value = "NEWEST")]
        sort: Sort,
        #[arg(long, default_value_t = playscrape::options::DEFAULT_REVIEWS_NUM)]
        num: usize,
        /// Fetch one page and print its continuation token.
        #[arg(long)]
        paginate: bool,
        #[arg(long)]
        token: Option<String>,
        #[command(flatten)]
        locale: Locale,
    },
    /// Permissions an app requests.
    Permissions {
        app_id: String,
        #[arg(long)]
        short: bool,
        #[command(flatten)]
        locale: Locale,
    },
    /// The data safety declaration of an app.
    Datasafety {
        app_id: String,
        #[arg(long, default_value = playscrape::DEFAULT_LANG)]
        lang: String,
    },
    /// Search term completions.
    Suggest {
        term: String,
        #[command(flatten)]
        locale: Locale,
    },
    /// Category ids of the store.
    Categories,
}

fn print_json(value: &impl Serialize) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let start_time = Local::now();
    let client = Client::new(ClientOptions {
        timeout: Duration::from_secs(cli.timeout),
        retry_count: cli.retries,
        proxy_url: cli.proxy,
        cache: cli.cache_secs.map(|secs| CacheOptions {
            max_age: Duration::from_secs(secs),
            ..Default::default()
        }),
        ..Default::default()
    })?;
    let call = CallOptions {
        throttle: cli.throttle,
        ..Default::default()
    };

    match cli.command {
        Command::App { app_id, locale } => {
            let app = client
                .app(AppOptions {
                    app_id,
                    lang: locale.lang,
                    country: locale.country,
                    call,
                })
                .await?;
            print_json(&app)?;
        }
        Command::List {
            collection,
            category,
            age,
            num,
            full_detail,
            locale,
        } => {
            let apps = client
                .list(ListOptions {
                    collection,
                    category,
                    age,
                    num,
                    lang: locale.lang,
                    country: locale.country,
                    full_detail,
                    call,
                })
                .await?;
            print_json(&apps)?;
        }
        Command::Search {
            term,
            num,
            price,
            full_detail,
            locale,
        } => {
            let apps = client
                .search(SearchOptions {
                    term,
                    num,
                    price,
                    lang: locale.lang,
                    country: locale.country,
                    full_detail,
                    call,
                })
                .await?;
            print_json(&apps)?;
        }
        Command::Developer {
            dev_id,
            num,
            full_detail,
            locale,
        } => {
            let apps = client
                .developer(DeveloperOptions {
                    dev_id,
                    num,
                    lang: locale.lang,
                    country: locale.country,
                    full_detail,
                    call,
                })
                .await?;
            print_json(&apps)?;
        }
        Command::Similar {
            app_id,
            num,
            full_detail,
            locale,
        } => {
            let apps = client
                .similar(SimilarOptions {
                    app_id,
                    num,
                    lang: locale.lang,
                    country: locale.country,
                    full_detail,
                    call,
                })
                .await?;
            print_json(&apps)?;
        }
        Command::Reviews {
            app_id,
            sort,
            num,
            paginate,
            token,
            locale,
        } => {
            let reviews = client
                .reviews(ReviewsOptions {
                    app_id,
                    sort,
                    num,
                    paginate,
                    next_pagination_token: token,
                    lang: locale.lang,
                    country: locale.country,
                    call,
                })
                .await?;
            print_json(&reviews)?;
        }
        Command::Permissions { app_id, short, locale } => {
            let permissions = client
                .permissions(PermissionsOptions {
                    app_id,
                    short,
                    lang: locale.lang,
                    country: locale.country,
                    call,
                })
                .await?;
            print_json(&permissions)?;
        }
        Command::Datasafety { app_id, lang } => {
            let safety = client.data_safety(DataSafetyOptions { app_id, lang, call }).await?;
            print_json(&safety)?;
        }
        Command::Suggest { term, locale } => {
            let terms = client
                .suggest(SuggestOptions {
                    term,
                    lang: locale.lang,
                    country: locale.country,
                    call,
                })
                .await?;
            print_json(&terms)?;
        }
        Command::Categories => {
            let categories = client.categories(CategoriesOptions { call }).await?;
            print_json(&categories)?;
        }
    }

    info_time!(start_time, "Full program time:");
    Ok(())
}
