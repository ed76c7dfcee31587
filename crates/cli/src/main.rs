//! Template Shop CLI - drive the storefront and admin stores from a terminal.
//!
//! # Usage
//!
//! ```bash
//! # Browse the catalog
//! shop-cli products list --category E-commerce
//! shop-cli products search booking
//!
//! # Cart and checkout
//! shop-cli cart add 3 --quantity 2
//! shop-cli checkout --name "Nguyễn Văn An" --email an@example.com \
//!     --phone 0901234567 --address "123 Lê Lợi" --payment momo
//!
//! # Admin
//! shop-cli orders status ORD003 processing
//! shop-cli settings set payments freeShippingThreshold 1000000
//! shop-cli dashboard
//! ```
//!
//! # Environment Variables
//!
//! See `template_shop_storefront::config` (`SHOP_API_BASE_URL`,
//! `SHOP_STORAGE_DIR`, ...). `RUST_LOG` overrides the default log filter,
//! `SHOP_LOG_FORMAT=json` selects JSON logs and `SHOP_PASSWORD` skips the
//! login prompt.

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};
use template_shop_core::{
    OrderCode, OrderStatus, PaymentMethod, PostId, ProductId, SettingsSection, TestimonialId,
    UserId, UserRole, UserStatus,
};
use template_shop_storefront::config::ShopConfig;
use template_shop_storefront::state::AppState;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

mod commands;
mod output;

const DEFAULT_LOG_FILTER: &str = "template_shop_storefront=info,template_shop_cli=info";

#[derive(Parser)]
#[command(name = "shop-cli")]
#[command(author, version, about = "Template Shop CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Browse the product catalog
    Products {
        #[command(subcommand)]
        action: ProductAction,
    },
    /// Manage the shopping cart
    Cart {
        #[command(subcommand)]
        action: CartAction,
    },
    /// Place an order from the current cart
    Checkout(CheckoutArgs),
    /// Manage orders
    Orders {
        #[command(subcommand)]
        action: OrderAction,
    },
    /// Manage user accounts
    Users {
        #[command(subcommand)]
        action: UserAction,
    },
    /// Read and edit site settings
    Settings {
        #[command(subcommand)]
        action: SettingsAction,
    },
    /// Manage testimonials
    Testimonials {
        #[command(subcommand)]
        action: TestimonialAction,
    },
    /// Read blog posts
    Blog {
        #[command(subcommand)]
        action: BlogAction,
    },
    /// Show admin dashboard figures
    Dashboard,
    /// Log in and store the session token
    Login {
        /// Account email
        #[arg(short, long)]
        email: String,
    },
    /// End the session
    Logout,
}

#[derive(Subcommand)]
enum ProductAction {
    /// List products
    List {
        /// Only this category
        #[arg(short, long)]
        category: Option<String>,
        /// Only products in stock
        #[arg(long)]
        in_stock: bool,
        /// Only products with a badge
        #[arg(long)]
        featured: bool,
    },
    /// Search name, description and category
    Search { term: String },
    /// Show one product with related products
    Show { id: ProductId },
    /// List categories
    Categories,
}

#[derive(Subcommand)]
enum CartAction {
    /// Show the cart
    Show,
    /// Add a product
    Add {
        id: ProductId,
        /// Units to add
        #[arg(short, long, default_value_t = 1)]
        quantity: u32,
    },
    /// Set a line's quantity (0 or less removes it)
    Set {
        id: ProductId,
        #[arg(allow_negative_numbers = true)]
        quantity: i64,
    },
    /// Remove a line
    Remove { id: ProductId },
    /// Empty the cart
    Clear,
}

#[derive(clap::Args)]
struct CheckoutArgs {
    #[arg(long)]
    name: String,
    #[arg(long)]
    email: String,
    #[arg(long)]
    phone: String,
    #[arg(long)]
    address: String,
    /// `cod`, `bank_transfer`, `momo` or `vnpay`
    #[arg(long, default_value = "cod")]
    payment: PaymentMethod,
    #[arg(long, default_value = "")]
    notes: String,
    /// Product to put in the cart first; repeat to add more units
    #[arg(long = "item", value_name = "PRODUCT_ID")]
    items: Vec<ProductId>,
}

#[derive(Subcommand)]
enum OrderAction {
    /// List orders
    List {
        #[arg(short, long)]
        status: Option<OrderStatus>,
        /// Match order code, customer name or email
        #[arg(short, long)]
        query: Option<String>,
    },
    /// Change an order's status
    Status {
        id: OrderCode,
        status: OrderStatus,
        /// Refuse moves the admin flow does not offer
        #[arg(long)]
        strict: bool,
    },
    /// Delete an order
    Delete { id: OrderCode },
}

#[derive(Subcommand)]
enum UserAction {
    /// List users
    List {
        #[arg(short, long)]
        status: Option<UserStatus>,
        #[arg(short, long)]
        query: Option<String>,
    },
    /// Show a user with statistics derived from orders
    Show { id: UserId },
    /// Change a user's status
    Status { id: UserId, status: UserStatus },
    /// Change a user's role
    Role { id: UserId, role: UserRole },
}

#[derive(Subcommand)]
enum SettingsAction {
    /// Print one section, or every section
    Get { section: Option<SettingsSection> },
    /// Set one field (value is JSON; bare words are taken as strings) and save
    Set {
        section: SettingsSection,
        field: String,
        value: String,
    },
    /// Revert to defaults
    Reset,
}

#[derive(Subcommand)]
enum TestimonialAction {
    /// List testimonials
    List {
        /// Only active testimonials
        #[arg(long)]
        active: bool,
    },
    /// Add a testimonial
    Add {
        #[arg(long)]
        name: String,
        #[arg(long)]
        rating: u8,
        #[arg(long)]
        content: String,
        #[arg(long, default_value = "")]
        product: String,
    },
    /// Show or hide a testimonial
    Toggle { id: TestimonialId },
    /// Delete a testimonial
    Delete { id: TestimonialId },
}

#[derive(Subcommand)]
enum BlogAction {
    /// List published posts, newest first
    List {
        #[arg(long)]
        tag: Option<String>,
    },
    /// Print a post's content
    Show { slug: String },
    /// Delete a post
    Delete { id: PostId },
}

#[tokio::main]
async fn main() {
    init_tracing();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

/// Logs go to stderr so command output stays clean. `SHOP_LOG_FORMAT=json`
/// switches to JSON lines.
fn init_tracing() {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| DEFAULT_LOG_FILTER.into());
    let json = std::env::var("SHOP_LOG_FORMAT").is_ok_and(|f| f.eq_ignore_ascii_case("json"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(json.then(|| fmt::layer().json().with_writer(std::io::stderr)))
        .with((!json).then(|| fmt::layer().with_writer(std::io::stderr)))
        .init();
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let config = ShopConfig::from_env()?;
    let state = AppState::new(config).await?;

    match cli.command {
        Commands::Products { action } => match action {
            ProductAction::List {
                category,
                in_stock,
                featured,
            } => commands::catalog::list(&state, category.as_deref(), in_stock, featured).await,
            ProductAction::Search { term } => commands::catalog::search(&state, &term).await,
            ProductAction::Show { id } => commands::catalog::show(&state, id).await?,
            ProductAction::Categories => commands::catalog::categories(&state).await,
        },
        Commands::Cart { action } => match action {
            CartAction::Show => commands::cart::show(&state).await,
            CartAction::Add { id, quantity } => commands::cart::add(&state, id, quantity).await?,
            CartAction::Set { id, quantity } => commands::cart::set(&state, id, quantity).await,
            CartAction::Remove { id } => commands::cart::remove(&state, id).await,
            CartAction::Clear => commands::cart::clear(&state).await,
        },
        Commands::Checkout(args) => {
            let form = template_shop_storefront::checkout::CheckoutForm {
                name: args.name,
                email: args.email,
                phone: args.phone,
                address: args.address,
                payment_method: args.payment,
                notes: args.notes,
            };
            commands::orders::checkout(&state, &form, &args.items).await?;
        }
        Commands::Orders { action } => match action {
            OrderAction::List { status, query } => {
                commands::orders::list(&state, status, query.as_deref()).await;
            }
            OrderAction::Status { id, status, strict } => {
                commands::orders::set_status(&state, &id, status, strict).await?;
            }
            OrderAction::Delete { id } => commands::orders::delete(&state, &id).await?,
        },
        Commands::Users { action } => match action {
            UserAction::List { status, query } => {
                commands::admin::list_users(&state, status, query.as_deref()).await;
            }
            UserAction::Show { id } => commands::admin::show_user(&state, id).await?,
            UserAction::Status { id, status } => {
                commands::admin::set_user_status(&state, id, status).await?;
            }
            UserAction::Role { id, role } => commands::admin::set_user_role(&state, id, role).await?,
        },
        Commands::Settings { action } => match action {
            SettingsAction::Get { section } => commands::admin::show_settings(&state, section).await?,
            SettingsAction::Set {
                section,
                field,
                value,
            } => commands::admin::set_setting(&state, section, &field, &value).await?,
            SettingsAction::Reset => commands::admin::reset_settings(&state).await?,
        },
        Commands::Testimonials { action } => match action {
            TestimonialAction::List { active } => commands::content::list_testimonials(&state, active).await,
            TestimonialAction::Add {
                name,
                rating,
                content,
                product,
            } => commands::content::add_testimonial(&state, name, rating, content, product).await?,
            TestimonialAction::Toggle { id } => commands::content::toggle_testimonial(&state, id).await?,
            TestimonialAction::Delete { id } => commands::content::delete_testimonial(&state, id).await?,
        },
        Commands::Blog { action } => match action {
            BlogAction::List { tag } => commands::content::list_posts(&state, tag.as_deref()).await,
            BlogAction::Show { slug } => commands::content::show_post(&state, &slug).await?,
            BlogAction::Delete { id } => commands::content::delete_post(&state, id).await?,
        },
        Commands::Dashboard => commands::admin::dashboard(&state).await,
        Commands::Login { email } => commands::session::login(&state, &email).await?,
        Commands::Logout => commands::session::logout(&state).await?,
    }
    Ok(())
}
