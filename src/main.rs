use clap::{Args as ClapArgs, Parser, Subcommand};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use litfinder::favorites::{FavoritesStore, JsonFavoritesStore};
use litfinder::{build_service, identity, parse_timeout, report, FinderConfig, LiteraryRecord, RecordStatus};
use std::process::ExitCode;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "litfinder")]
#[command(version = "0.1.0")]
#[command(about = "Search books across several online catalogs and keep a list of favorites", long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// User whose favorites to use (defaults to this machine's anonymous id)
    #[arg(long, global = true)]
    user: Option<String>,

    /// Verbose output
    #[arg(long, short, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Search all catalogs for books
    Search(SearchArgs),
    /// Manage saved favorites
    #[command(subcommand)]
    Favorites(FavoritesCommand),
}

#[derive(ClapArgs, Debug)]
struct SearchArgs {
    /// Free-text query (title, author, ...)
    query: String,

    /// Disable Google Books
    #[arg(long)]
    no_google_books: bool,

    /// Disable Open Library
    #[arg(long)]
    no_open_library: bool,

    /// Google Books API key (overrides API_KEY)
    #[arg(long)]
    api_key: Option<String>,

    /// Preferred Open Library edition language, e.g. "ru"
    #[arg(long)]
    lang: Option<String>,

    /// Per-catalog timeout in seconds
    #[arg(long)]
    timeout: Option<String>,

    /// Print results as JSON
    #[arg(long)]
    json: bool,

    /// Save the N-th result(s) as favorites (1-based)
    #[arg(long, value_name = "N")]
    save: Vec<usize>,
}

#[derive(Subcommand, Debug)]
enum FavoritesCommand {
    /// List saved favorites, newest first
    List {
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
    /// Save a book by hand
    Add {
        #[arg(long)]
        id: String,
        #[arg(long)]
        title: String,
        #[arg(long = "author")]
        authors: Vec<String>,
        #[arg(long, default_value = "")]
        year: String,
        #[arg(long)]
        thumbnail: Option<String>,
        #[arg(long, default_value = "")]
        link: String,
    },
    /// Remove a saved book by id
    Remove { id: String },
    /// Remove all saved books
    Clear,
}

fn fail(message: impl std::fmt::Display) -> ExitCode {
    eprintln!("{} {}", "Error:".red().bold(), message);
    ExitCode::FAILURE
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    // Initialize logging
    let filter = if args.verbose {
        EnvFilter::new("litfinder=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("litfinder=warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match args.command {
        Command::Search(search) => run_search(search, args.user).await,
        Command::Favorites(command) => run_favorites(command, args.user),
    }
}

async fn run_search(args: SearchArgs, user: Option<String>) -> ExitCode {
    let mut config = match FinderConfig::from_env() {
        Ok(c) => c,
        Err(e) => return fail(e),
    };
    config.use_google_books = !args.no_google_books;
    config.use_open_library = !args.no_open_library;
    if args.api_key.is_some() {
        config.google_books_api_key = args.api_key;
    }
    if args.lang.is_some() {
        config.open_library_language = args.lang;
    }
    if let Some(timeout) = &args.timeout {
        match parse_timeout("--timeout", timeout) {
            Ok(t) => config.timeout = t,
            Err(e) => return fail(e),
        }
    }

    let service = match build_service(&config) {
        Ok(s) => s,
        Err(e) => return fail(format!("Failed to initialize search: {}", e)),
    };

    let spinner = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.green} {msg}") {
        spinner.set_style(style);
    }
    spinner.set_message(format!("Searching for \"{}\"...", args.query));
    spinner.enable_steady_tick(Duration::from_millis(100));

    let result = service.search_detailed(&args.query).await;
    spinner.finish_and_clear();

    let outcome = match result {
        Ok(o) => o,
        Err(e) => return fail(e),
    };

    if args.json {
        match serde_json::to_string_pretty(&outcome.records) {
            Ok(json) => println!("{}", json),
            Err(e) => return fail(e),
        }
    } else {
        report::print_results(&format!("Results for \"{}\"", args.query), &outcome.records);
    }
    report::print_failures(&outcome.failures);

    if args.save.is_empty() {
        return ExitCode::SUCCESS;
    }

    let (store, user_id) = match open_favorites(user) {
        Ok(v) => v,
        Err(code) => return code,
    };
    for n in args.save {
        let Some(record) = n.checked_sub(1).and_then(|i| outcome.records.get(i)) else {
            return fail(format!("There is no result number {}", n));
        };
        match store.save_record(&user_id, record) {
            Ok(true) => println!("Saved {}", record.title.green()),
            Ok(false) => println!("Already saved: {}", record.title),
            Err(e) => return fail(e),
        }
    }

    ExitCode::SUCCESS
}

fn run_favorites(command: FavoritesCommand, user: Option<String>) -> ExitCode {
    let (store, user_id) = match open_favorites(user) {
        Ok(v) => v,
        Err(code) => return code,
    };

    match command {
        FavoritesCommand::List { json } => {
            let records = match store.list_records(&user_id, RecordStatus::Favorite) {
                Ok(r) => r,
                Err(e) => return fail(e),
            };
            if json {
                match serde_json::to_string_pretty(&records) {
                    Ok(out) => println!("{}", out),
                    Err(e) => return fail(e),
                }
            } else {
                report::print_results("Favorites", &records);
            }
        }
        FavoritesCommand::Add {
            id,
            title,
            authors,
            year,
            thumbnail,
            link,
        } => {
            let mut record = LiteraryRecord::new(id, title);
            record.authors = authors;
            record.year = year;
            record.thumbnail_url = litfinder::record::thumbnail_or_placeholder(thumbnail.as_deref());
            record.detail_url = link;
            record.status = RecordStatus::Favorite;

            match store.save_record(&user_id, &record) {
                Ok(true) => println!("Saved {}", record.title.green()),
                Ok(false) => println!("Already saved: {}", record.title),
                Err(e) => return fail(e),
            }
        }
        FavoritesCommand::Remove { id } => match store.delete_record(&user_id, &id) {
            Ok(true) => println!("Removed {}", id),
            Ok(false) => println!("{}", format!("Nothing saved with id {}", id).yellow()),
            Err(e) => return fail(e),
        },
        FavoritesCommand::Clear => {
            if let Err(e) = store.clear_records(&user_id) {
                return fail(e);
            }
            println!("Favorites cleared");
        }
    }

    ExitCode::SUCCESS
}

fn open_favorites(user: Option<String>) -> Result<(JsonFavoritesStore, String), ExitCode> {
    let user_id = match user {
        Some(u) => u,
        None => identity::load_or_create_user_id(&identity::default_dir()).map_err(fail)?,
    };
    let store = JsonFavoritesStore::open_default()
        .map_err(|e| fail(format!("Failed to open favorites: {}", e)))?;
    Ok((store, user_id))
}
