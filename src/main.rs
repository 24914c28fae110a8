use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Error, Result};
use log::{error, warn};
use structopt::StructOpt;

use shopfront::config::{self, Config};
use shopfront::listing::{render_detail, render_list, render_status};
use shopfront::model::product::parse_amount;
use shopfront::session::{self, Session};
use shopfront::{Catalog, FilterConfig, ImageSource, ProductDraft, RestGateway, SnapshotCache, SortMode};

#[derive(Debug, StructOpt)]
#[structopt(name = "shopfront", about = "Browse and manage the product catalog")]
struct Opt {
    /// Config file, defaults to ~/.config/shopfront/config.json
    #[structopt(long, parse(from_os_str))]
    config: Option<PathBuf>,
    /// Snapshot file, defaults to ~/.config/shopfront/products.json
    #[structopt(long, parse(from_os_str))]
    snapshot: Option<PathBuf>,
    #[structopt(subcommand)]
    command: Command,
}

#[derive(Debug, StructOpt)]
enum Command {
    /// List products, amounts are in major units (e.g. 12500 or 12.50)
    List {
        #[structopt(short, long, default_value = "")]
        search: String,
        /// newest, price-asc or price-desc
        #[structopt(long, default_value = "newest")]
        sort: SortMode,
        #[structopt(long, parse(try_from_str = parse_amount))]
        min_price: Option<u64>,
        #[structopt(long, parse(try_from_str = parse_amount))]
        max_price: Option<u64>,
        /// Hide products without a real picture
        #[structopt(long)]
        require_image: bool,
        /// Only show the local snapshot
        #[structopt(long)]
        offline: bool,
    },
    /// Show one product in full
    Show {
        id: String,
        #[structopt(long)]
        offline: bool,
    },
    /// Create a product (admin)
    Add {
        #[structopt(long)]
        name: String,
        #[structopt(long, default_value = "")]
        short_description: String,
        #[structopt(long, default_value = "")]
        full_description: String,
        #[structopt(long, parse(try_from_str = parse_amount))]
        price: u64,
        #[structopt(long, conflicts_with = "image-file")]
        image_url: Option<String>,
        /// Uploaded to image storage before the product is created
        #[structopt(long, parse(from_os_str))]
        image_file: Option<PathBuf>,
    },
    /// Delete a product (admin)
    Delete { id: String },
    /// Sign in as admin
    ///
    /// The password is read as one line from stdin. A terminal echoes what is typed,
    /// so pipe it in instead: printf '%s\n' "$PW" | shopfront login --email me@example.com
    Login {
        #[structopt(long)]
        email: String,
    },
    Logout,
}

fn main() {
    pretty_env_logger::init();
    if let Err(e) = run(Opt::from_args()) {
        error!("{:#}", e);
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

fn run(opt: Opt) -> Result<()> {
    let session_path = session::default_path()?;
    if let Command::Logout = opt.command {
        session::clear(&session_path)?;
        println!("Signed out");
        return Ok(());
    }
    let config_path = match &opt.config {
        Some(p) => p.clone(),
        None => config::default_path()?,
    };
    let config = config::read(&config_path)?;
    let snapshot = match &opt.snapshot {
        Some(p) => SnapshotCache::new(p),
        None => SnapshotCache::default_location().with_context(|| "No snapshot location")?,
    };

    match opt.command {
        Command::List {
            search,
            sort,
            min_price,
            max_price,
            require_image,
            offline,
        } => {
            let mut catalog = Catalog::open(RestGateway::new(&config)?, snapshot);
            if !offline {
                refresh_or_fall_back(&mut catalog);
            }
            let filter = FilterConfig {
                search_text: search,
                sort,
                min_price,
                max_price,
                require_image,
            };
            let shown = catalog.view(&filter);
            println!("{}", render_list(&shown, &config.currency_symbol));
            println!();
            println!("{}", render_status(shown.len(), catalog.products().len(), catalog.freshness()));
        }
        Command::Show { id, offline } => {
            let mut catalog = Catalog::open(RestGateway::new(&config)?, snapshot);
            if !offline {
                refresh_or_fall_back(&mut catalog);
            }
            let product = catalog
                .find(&id)
                .ok_or_else(|| Error::msg(format!("No product with id {}", id)))?;
            println!("{}", render_detail(product, &config.currency_symbol));
        }
        Command::Add {
            name,
            short_description,
            full_description,
            price,
            image_url,
            image_file,
        } => {
            let mut catalog = admin_catalog(&config, &session_path, snapshot)?;
            let image = match (image_url, image_file) {
                (Some(url), _) => ImageSource::Url(url),
                (None, Some(path)) => ImageSource::File(path),
                (None, None) => ImageSource::None,
            };
            let draft = ProductDraft {
                name,
                short_description,
                full_description,
                price,
            };
            let product = catalog.create(draft, image)?;
            println!("Created {} ({})", product.name, product.id);
        }
        Command::Delete { id } => {
            let mut catalog = admin_catalog(&config, &session_path, snapshot)?;
            catalog.delete(&id)?;
            println!("Deleted {}", id);
        }
        Command::Login { email } => {
            eprint!("Password (input is not hidden): ");
            io::stderr().flush()?;
            let mut password = String::new();
            io::stdin().lock().read_line(&mut password)?;
            let token = RestGateway::new(&config)?.sign_in(&email, password.trim_end_matches(&['\r', '\n'][..]))?;
            session::write(
                &session_path,
                &Session {
                    email: email.clone(),
                    access_token: token,
                },
            )?;
            println!("Signed in as {}", email);
        }
        // Handled before the config is read
        Command::Logout => {}
    }
    Ok(())
}

fn admin_catalog(config: &Config, session_path: &Path, snapshot: SnapshotCache) -> Result<Catalog<RestGateway>> {
    let session = session::require(session_path)?;
    let gateway = RestGateway::new(config)?.with_session(&session.access_token);
    let mut catalog = Catalog::open(gateway, snapshot);
    // Edits splice into the list, so start from what the backend has
    catalog.refresh()?;
    Ok(catalog)
}

// Fetch errors are shown, then the snapshot stands in
fn refresh_or_fall_back(catalog: &mut Catalog<RestGateway>) {
    if let Err(e) = catalog.refresh() {
        warn!("Fetch failed: {}", e);
        eprintln!("Could not load products: {}", e);
    }
}
