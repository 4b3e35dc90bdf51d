use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use miette::{IntoDiagnostic, Result, miette};
use orderflow::application::{FulfillmentCore, Gateway};
use orderflow::config::{AppConfig, ENV_ADMIN_PASSWORD, ENV_ADMIN_USERNAME, ENV_DB_PATH};
use orderflow::domain::delivery::DeliveryRequest;
use orderflow::domain::id::{CustomerId, OrderId, SessionKey};
use orderflow::domain::identity::AdminIdentity;
use orderflow::domain::order::OrderStatus;
use orderflow::domain::ports::CredentialVerifier;
use orderflow::infrastructure::clock::SystemClock;
use orderflow::infrastructure::credentials::hash_password;
use orderflow::infrastructure::in_memory::{
    InMemoryAuditLog, InMemoryCartStore, InMemoryCatalog, InMemoryLoyaltyStore, InMemoryOrderStore,
};
use orderflow::interfaces::csv::cart_reader::CartReader;
use orderflow::interfaces::csv::catalog_reader::CatalogReader;
use orderflow::interfaces::csv::report_writer::ReportWriter;
use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "Order fulfillment core", long_about = None)]
struct Cli {
    /// Path to persistent database (optional). If provided, uses RocksDB.
    #[arg(long, global = true, env = ENV_DB_PATH)]
    db_path: Option<PathBuf>,

    /// Product catalog CSV (`id, name, price, available`) loaded before the command runs.
    #[arg(long, global = true)]
    catalog: Option<PathBuf>,

    /// Administrator login for admin commands.
    #[arg(long, global = true, env = ENV_ADMIN_USERNAME)]
    admin_user: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List orderable products
    Products,
    /// Place an order from a cart CSV (`product, quantity`)
    Place(PlaceArgs),
    /// Attach a payment reference to a pending order
    SubmitPayment {
        #[arg(long)]
        customer: CustomerId,
        #[arg(long)]
        order: OrderId,
    },
    /// Confirm a submitted payment (admin)
    ConfirmPayment {
        #[arg(long)]
        order: OrderId,
        #[arg(long)]
        note: Option<String>,
    },
    /// Move an order to its next status (admin)
    Advance {
        #[arg(long)]
        order: OrderId,
        #[arg(long)]
        to: OrderStatus,
        #[arg(long)]
        note: Option<String>,
    },
    /// List a customer's orders, or every order for an admin
    Orders {
        #[arg(long)]
        customer: Option<CustomerId>,
    },
    /// Dashboard statistics (admin)
    Stats {
        /// Calendar day to report on, YYYY-MM-DD. Defaults to today (UTC).
        #[arg(long)]
        as_of: Option<NaiveDate>,
    },
    /// Audit trail of one order (admin)
    Audit {
        #[arg(long)]
        order: OrderId,
    },
    /// Loyalty balance and tier of a customer
    Loyalty {
        #[arg(long)]
        customer: CustomerId,
    },
    /// Print an Argon2 hash of the admin password for ORDERFLOW_ADMIN_PASSWORD_HASH
    HashPassword,
}

#[derive(Args)]
struct PlaceArgs {
    #[arg(long)]
    customer: CustomerId,
    /// Cart lines CSV
    #[arg(long)]
    cart: PathBuf,
    /// Session the cart is mirrored under. Defaults to the customer id.
    #[arg(long)]
    session: Option<String>,
    #[arg(long)]
    address: String,
    #[arg(long)]
    pincode: String,
    /// Delivery date, YYYY-MM-DD. Must be after today.
    #[arg(long)]
    date: String,
    /// One of the delivery time slots, e.g. "2:00 PM - 4:00 PM"
    #[arg(long)]
    slot: String,
    #[arg(long)]
    message: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    let config = AppConfig::from_env().into_diagnostic()?;

    if let Command::HashPassword = cli.command {
        let password = config
            .admin_password
            .as_ref()
            .ok_or_else(|| miette!("Set {ENV_ADMIN_PASSWORD} to the password to hash"))?;
        let hash = hash_password(password).into_diagnostic()?;
        println!("{hash}");
        return Ok(());
    }

    let gateway = open_gateway(cli.db_path)?;
    if let Some(path) = &cli.catalog {
        load_catalog(&gateway, path).await?;
    }
    let core = FulfillmentCore::new(gateway, Arc::new(SystemClock));

    let admin = || -> Result<AdminIdentity> {
        let username = cli.admin_user.as_deref().ok_or_else(|| {
            miette!("Admin command: set {ENV_ADMIN_USERNAME} or pass --admin-user")
        })?;
        let password = config
            .admin_password
            .as_ref()
            .ok_or_else(|| miette!("Admin command: set {ENV_ADMIN_PASSWORD}"))?;
        let verifier = config.credential_verifier().into_diagnostic()?;
        verifier.verify(username, password).into_diagnostic()
    };

    let stdout = io::stdout();
    let mut writer = ReportWriter::new(stdout.lock());

    match &cli.command {
        Command::Products => {
            let products = core.products().await.into_diagnostic()?;
            writer.write_products(&products).into_diagnostic()?;
        }
        Command::Place(args) => {
            let session = SessionKey::new(
                args.session
                    .clone()
                    .unwrap_or_else(|| args.customer.to_string()),
            );
            let mut cart = core.open_cart(session).await;
            let file = File::open(&args.cart).into_diagnostic()?;
            for line in CartReader::new(file).lines() {
                let line = line.into_diagnostic()?;
                let product = core
                    .catalog()
                    .get_product(line.product_id)
                    .await
                    .into_diagnostic()?;
                cart.add(product, line.quantity).await.into_diagnostic()?;
            }
            let request = DeliveryRequest {
                address: args.address.clone(),
                pincode: args.pincode.clone(),
                date: args.date.clone(),
                time_slot: args.slot.clone(),
                message: args.message.clone(),
            };
            let placed = core
                .lifecycle()
                .place_order(args.customer, &mut cart, &request)
                .await
                .into_diagnostic()?;
            writer.write_placed(&placed).into_diagnostic()?;
        }
        Command::SubmitPayment { customer, order } => {
            let order = core
                .payments()
                .submit_payment(*customer, *order)
                .await
                .into_diagnostic()?;
            writer.write_orders([&order]).into_diagnostic()?;
        }
        Command::ConfirmPayment { order, note } => {
            let admin = admin()?;
            let order = core
                .admin()
                .confirm_payment(&admin, *order, note.as_deref())
                .await
                .into_diagnostic()?;
            writer.write_orders([&order]).into_diagnostic()?;
        }
        Command::Advance { order, to, note } => {
            let admin = admin()?;
            let order = core
                .admin()
                .advance(&admin, *order, *to, note.as_deref())
                .await
                .into_diagnostic()?;
            writer.write_orders([&order]).into_diagnostic()?;
        }
        Command::Orders { customer: Some(customer) } => {
            let orders = core
                .lifecycle()
                .orders_for_customer(*customer)
                .await
                .into_diagnostic()?;
            writer.write_orders(&orders).into_diagnostic()?;
        }
        Command::Orders { customer: None } => {
            let admin = admin()?;
            let orders = core
                .admin()
                .list_all_orders(&admin)
                .await
                .into_diagnostic()?;
            writer.write_orders(&orders).into_diagnostic()?;
        }
        Command::Stats { as_of } => {
            let admin = admin()?;
            let stats = core
                .admin()
                .dashboard_stats(&admin, *as_of)
                .await
                .into_diagnostic()?;
            writer.write_stats(&stats).into_diagnostic()?;
        }
        Command::Audit { order } => {
            let admin = admin()?;
            let entries = core
                .admin()
                .audit_trail(&admin, *order)
                .await
                .into_diagnostic()?;
            writer.write_audit(&entries).into_diagnostic()?;
        }
        Command::Loyalty { customer } => {
            let standing = core
                .loyalty()
                .standing(*customer)
                .await
                .into_diagnostic()?;
            writer.write_loyalty(*customer, &standing).into_diagnostic()?;
        }
        Command::HashPassword => {}
    }

    Ok(())
}

fn in_memory_gateway() -> Gateway {
    Gateway {
        orders: Arc::new(InMemoryOrderStore::new()),
        loyalty: Arc::new(InMemoryLoyaltyStore::new()),
        catalog: Arc::new(InMemoryCatalog::new()),
        carts: Arc::new(InMemoryCartStore::new()),
        audit: Arc::new(InMemoryAuditLog::new()),
    }
}

#[cfg(feature = "storage-rocksdb")]
fn open_gateway(db_path: Option<PathBuf>) -> Result<Gateway> {
    use orderflow::infrastructure::rocksdb::RocksDBStore;

    let Some(db_path) = db_path else {
        return Ok(in_memory_gateway());
    };
    let store = Arc::new(RocksDBStore::open(&db_path).into_diagnostic()?);
    info!(path = %db_path.display(), "Using RocksDB storage");
    Ok(Gateway {
        orders: store.clone(),
        loyalty: store.clone(),
        catalog: store.clone(),
        carts: store.clone(),
        audit: store,
    })
}

#[cfg(not(feature = "storage-rocksdb"))]
fn open_gateway(db_path: Option<PathBuf>) -> Result<Gateway> {
    if db_path.is_some() {
        warn!(
            "Persistent storage requested via --db-path, but 'storage-rocksdb' feature is not enabled. Falling back to In-Memory storage."
        );
    }
    Ok(in_memory_gateway())
}

async fn load_catalog(gateway: &Gateway, path: &Path) -> Result<()> {
    let file = File::open(path).into_diagnostic()?;
    let mut loaded = 0usize;
    for product in CatalogReader::new(file).products() {
        match product {
            Ok(product) => {
                gateway
                    .catalog
                    .upsert_product(product)
                    .await
                    .into_diagnostic()?;
                loaded += 1;
            }
            Err(e) => warn!(error = %e, "Skipping catalog row"),
        }
    }
    info!(loaded, "Catalog loaded");
    Ok(())
}
