//! Storefront CLI
//!
//! Browses the catalog, keeps a local cart, wishlist and order history, and
//! signs in against the API with an emailed one-time code.

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use pranjay_storefront::{
    models::{ShippingAddress, UserType},
    pricing::format_inr,
    storefront::{
        ApiClient, CartStore, CatalogSource, LocalStore, OrderHistory, Product, SessionStore,
        StorefrontError, WishlistStore,
    },
};

#[derive(Parser)]
#[command(name = "pranjay")]
#[command(author, version, about = "Pranjay storefront", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// API base URL
    #[arg(long, global = true, env = "PRANJAY_API_URL", default_value = "http://localhost:8000")]
    api_url: String,

    /// Directory for the local cart, wishlist, orders and session
    #[arg(long, global = true, env = "PRANJAY_DATA_DIR", default_value = ".pranjay")]
    data_dir: String,

    /// Use the bundled catalog only
    #[arg(long, global = true)]
    offline: bool,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// List products
    Products {
        /// Filter by name, SKU or description
        #[arg(short, long)]
        search: Option<String>,

        /// Filter by category slug
        #[arg(short, long)]
        category: Option<String>,
    },

    /// List featured products
    Featured,

    /// Show one product
    Show { slug: String },

    /// List categories
    Categories,

    /// Manage the local cart
    Cart {
        #[command(subcommand)]
        action: CartAction,
    },

    /// Manage the local wishlist
    Wishlist {
        #[command(subcommand)]
        action: WishlistAction,
    },

    /// Place an order from the local cart
    Checkout {
        #[arg(long)]
        name: String,
        #[arg(long)]
        phone: String,
        #[arg(long)]
        line1: String,
        #[arg(long)]
        line2: Option<String>,
        #[arg(long)]
        city: String,
        #[arg(long)]
        state: String,
        #[arg(long)]
        postal_code: String,
        /// Payment method, `cod` for cash on delivery
        #[arg(long, default_value = "cod")]
        payment: String,
    },

    /// List local orders, or show one
    Orders { id: Option<String> },

    /// Request a sign-in code
    Login { email: String },

    /// Verify a sign-in code
    Verify { email: String, otp: String },

    /// Show the signed-in profile
    Whoami,

    /// Sign out
    Logout,
}

#[derive(Subcommand)]
enum CartAction {
    /// Show the cart
    List,
    /// Add a product by slug
    Add {
        slug: String,
        #[arg(short, long, default_value_t = 1)]
        quantity: i32,
    },
    /// Set a line's quantity; 0 removes it
    Set { product_id: String, quantity: i32 },
    /// Remove a line
    Remove { product_id: String },
    /// Empty the cart
    Clear,
}

#[derive(Subcommand)]
enum WishlistAction {
    List,
    Add { slug: String },
    Remove { product_id: String },
    /// Move a saved product into the cart
    Move { product_id: String },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let store = LocalStore::open(&cli.data_dir)?;
    let mut session = SessionStore::load(store.clone());
    let mut client =
        ApiClient::new(&cli.api_url)?.with_token(session.access_token().map(str::to_string));
    let catalog = if cli.offline {
        CatalogSource::offline()
    } else {
        CatalogSource::new(Some(client.clone()))
    };

    match cli.command {
        Commands::Products { search, category } => {
            let products = match category {
                Some(slug) => catalog.by_category(&slug).await,
                None => catalog.products(search.as_deref()).await,
            };
            print_products(&products);
        }
        Commands::Featured => print_products(&catalog.featured().await),
        Commands::Show { slug } => {
            let product = catalog
                .product(&slug)
                .await
                .with_context(|| format!("no product with slug {slug}"))?;
            let tier = session.session().user.as_ref().map(|u| u.user_type);
            print_product(&product, tier);
        }
        Commands::Categories => {
            for category in catalog.categories().await {
                println!("{:<14} {}", category.slug, category.name);
            }
        }
        Commands::Cart { action } => {
            let mut cart = CartStore::load(store);
            match action {
                CartAction::List => {}
                CartAction::Add { slug, quantity } => {
                    let product = catalog
                        .product(&slug)
                        .await
                        .with_context(|| format!("no product with slug {slug}"))?;
                    if quantity < 1 {
                        bail!("quantity must be at least 1");
                    }
                    cart.add_item(product, quantity)?;
                }
                CartAction::Set { product_id, quantity } => {
                    cart.update_quantity(&product_id, quantity)?
                }
                CartAction::Remove { product_id } => cart.remove_item(&product_id)?,
                CartAction::Clear => cart.clear()?,
            }
            print_cart(&cart);
        }
        Commands::Wishlist { action } => {
            let mut wishlist = WishlistStore::load(store.clone());
            match action {
                WishlistAction::List => {}
                WishlistAction::Add { slug } => {
                    let product = catalog
                        .product(&slug)
                        .await
                        .with_context(|| format!("no product with slug {slug}"))?;
                    if !wishlist.add_item(product)? {
                        println!("Already in wishlist");
                    }
                }
                WishlistAction::Remove { product_id } => wishlist.remove_item(&product_id)?,
                WishlistAction::Move { product_id } => {
                    let product = wishlist
                        .items()
                        .iter()
                        .find(|p| p.id == product_id)
                        .cloned()
                        .with_context(|| format!("{product_id} is not in the wishlist"))?;
                    let mut cart = CartStore::load(store);
                    cart.add_item(product, 1)?;
                    wishlist.remove_item(&product_id)?;
                }
            }
            for product in wishlist.items() {
                println!("{:<4} {:<40} {}", product.id, product.name, format_inr(product.selling_price));
            }
        }
        Commands::Checkout {
            name,
            phone,
            line1,
            line2,
            city,
            state,
            postal_code,
            payment,
        } => {
            let mut cart = CartStore::load(store.clone());
            let mut history = OrderHistory::load(store);
            let address = ShippingAddress {
                full_name: name,
                phone,
                address_line1: line1,
                address_line2: line2,
                city,
                state,
                postal_code,
                country: "India".to_string(),
            };
            match history.place_order(&mut cart, address, &payment) {
                Ok(order) => {
                    println!("Order {} placed", order.order_number);
                    println!("Total: {}", format_inr(order.total));
                }
                Err(StorefrontError::EmptyCart) => bail!("your cart is empty"),
                Err(err) => return Err(err.into()),
            }
        }
        Commands::Orders { id } => {
            let history = OrderHistory::load(store);
            match id {
                Some(id) => {
                    let order = history
                        .order_by_id(&id)
                        .with_context(|| format!("no order {id}"))?;
                    println!("{} [{}] {}", order.order_number, order.status, order.created_at);
                    for item in &order.items {
                        println!(
                            "  {} x{} {}",
                            item.product_name,
                            item.quantity,
                            format_inr(item.total_price)
                        );
                    }
                    println!("  Subtotal {}", format_inr(order.subtotal));
                    println!("  GST      {}", format_inr(order.tax));
                    println!("  Total    {}", format_inr(order.total));
                }
                None => {
                    for order in history.orders() {
                        println!(
                            "{} {:<10} {:>12} {}",
                            order.order_number,
                            order.status,
                            format_inr(order.total),
                            order.created_at.format("%Y-%m-%d")
                        );
                    }
                }
            }
        }
        Commands::Login { email } => {
            let sent = client.request_otp(&email).await?;
            println!(
                "Code sent to {}; valid for {} minutes",
                sent.email, sent.expires_in_minutes
            );
        }
        Commands::Verify { email, otp } => {
            let login = client.verify_otp(&email, &otp).await?;
            session.set_tokens(&login.tokens)?;
            session.set_user(login.user.clone())?;
            println!("Signed in as {}", login.user.email);
        }
        Commands::Whoami => {
            if !session.is_authenticated() {
                bail!(StorefrontError::NotAuthenticated);
            }
            let user = match client.me().await {
                Err(err) if err.status() == Some(401) => {
                    if !client.refresh_tokens(&mut session).await? {
                        bail!("session expired, sign in again");
                    }
                    client.me().await?
                }
                other => other?,
            };
            session.set_user(user.clone())?;
            println!("{} ({}, {})", user.email, user.role, user.user_type);
        }
        Commands::Logout => {
            session.logout()?;
            println!("Signed out");
        }
    }

    Ok(())
}

fn print_products(products: &[Product]) {
    for product in products {
        println!(
            "{:<36} {:<10} {:>10} {:>4}% off",
            product.slug,
            product.sku,
            format_inr(product.selling_price),
            product.discount_percentage()
        );
    }
}

fn print_product(product: &Product, tier: Option<UserType>) {
    println!("{} ({})", product.name, product.sku);
    if let Some(short) = &product.short_description {
        println!("{short}");
    }
    println!(
        "MRP {}  Price {}  ({}% off)",
        format_inr(product.mrp),
        format_inr(product.selling_price),
        product.discount_percentage()
    );
    match tier {
        Some(tier) => println!("Your price ({tier}) {}", format_inr(product.price_for(tier))),
        None => {
            if let Some(b2b) = product.b2b_price {
                println!("B2B price {}", format_inr(b2b));
            }
        }
    }
    println!(
        "Minimum order {} {}, {} in stock",
        product.min_order_quantity,
        product.unit,
        product.stock_quantity
    );
    if let Some(url) = product.image_url() {
        println!("{url}");
    }
}

fn print_cart(cart: &CartStore) {
    if cart.is_empty() {
        println!("Cart is empty");
        return;
    }
    for line in cart.items() {
        println!(
            "{:<4} {:<40} x{:<4} {:>12}",
            line.id,
            line.product.name,
            line.quantity,
            format_inr(line.line_total())
        );
    }
    let totals = cart.totals();
    println!("Items    {}", totals.item_count);
    println!("Subtotal {}", format_inr(totals.subtotal));
    println!("GST      {}", format_inr(totals.tax_amount));
    println!("Total    {}", format_inr(totals.total_amount));
}
