//! The `orders` command: list, annotate, and advance storefront orders.

use clap::{Args, Subcommand};

use pimsync_core::SiteKey;
use pimsync_engine::Engine;

#[derive(Debug, Args)]
pub struct OrdersArgs {
    #[command(subcommand)]
    command: OrdersCommand,
}

#[derive(Debug, Subcommand)]
enum OrdersCommand {
    /// List one page of orders on a site
    List {
        /// Site key
        #[arg(long)]
        site: String,
        /// Filter by status, e.g. processing
        #[arg(long)]
        status: Option<String>,
        #[arg(long, default_value_t = 1)]
        page: usize,
    },
    /// Show one order
    Get {
        #[arg(long)]
        site: String,
        order_id: i64,
    },
    /// Update an order's status
    UpdateStatus {
        #[arg(long)]
        site: String,
        order_id: i64,
        /// New status, e.g. completed
        status: String,
    },
    /// Attach a note to an order
    Note {
        #[arg(long)]
        site: String,
        order_id: i64,
        note: String,
        /// Make the note visible to the buyer
        #[arg(long)]
        customer: bool,
    },
}

pub async fn run(engine: &Engine, args: OrdersArgs) -> anyhow::Result<()> {
    match args.command {
        OrdersCommand::List { site, status, page } => {
            let client = engine.client(&SiteKey::from(site.as_str()))?;
            let orders = client.list_orders(page, status.as_deref()).await?;
            if orders.is_empty() {
                println!("no orders on page {page}");
                return Ok(());
            }
            for order in orders {
                println!(
                    "#{} {} {} {} {}",
                    order.number,
                    order.status,
                    order.total,
                    order.currency,
                    order.date_created.as_deref().unwrap_or("-")
                );
            }
        }
        OrdersCommand::Get { site, order_id } => {
            let client = engine.client(&SiteKey::from(site.as_str()))?;
            let order = client.get_order(order_id).await?;
            println!(
                "#{} {} {} {} {}",
                order.number,
                order.status,
                order.total,
                order.currency,
                order.date_created.as_deref().unwrap_or("-")
            );
        }
        OrdersCommand::UpdateStatus {
            site,
            order_id,
            status,
        } => {
            let client = engine.client(&SiteKey::from(site.as_str()))?;
            let order = client.update_order_status(order_id, &status).await?;
            println!("order #{} is now {}", order.number, order.status);
        }
        OrdersCommand::Note {
            site,
            order_id,
            note,
            customer,
        } => {
            let client = engine.client(&SiteKey::from(site.as_str()))?;
            let created = client.add_order_note(order_id, &note, customer).await?;
            println!("note {} added to order {order_id}", created.id);
        }
    }
    Ok(())
}
