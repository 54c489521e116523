//! The `webhooks` command: inspect and register storefront webhooks.

use clap::{Args, Subcommand};

use pimsync_core::SiteKey;
use pimsync_engine::Engine;

#[derive(Debug, Args)]
pub struct WebhooksArgs {
    #[command(subcommand)]
    command: WebhooksCommand,
}

#[derive(Debug, Subcommand)]
enum WebhooksCommand {
    /// List webhooks registered on a site
    List {
        #[arg(long)]
        site: String,
    },
    /// Register a webhook, skipping when an identical one exists
    Create {
        #[arg(long)]
        site: String,
        /// Topic, e.g. order.created
        #[arg(long)]
        topic: String,
        #[arg(long)]
        delivery_url: String,
    },
}

pub async fn run(engine: &Engine, args: WebhooksArgs) -> anyhow::Result<()> {
    match args.command {
        WebhooksCommand::List { site } => {
            let client = engine.client(&SiteKey::from(site.as_str()))?;
            let hooks = client.list_webhooks().await?;
            if hooks.is_empty() {
                println!("no webhooks registered");
                return Ok(());
            }
            for hook in hooks {
                println!(
                    "{} {} -> {} ({})",
                    hook.id, hook.topic, hook.delivery_url, hook.status
                );
            }
        }
        WebhooksCommand::Create {
            site,
            topic,
            delivery_url,
        } => {
            let client = engine.client(&SiteKey::from(site.as_str()))?;
            let existing = client.list_webhooks().await?;
            if let Some(hook) = existing
                .iter()
                .find(|h| h.topic == topic && h.delivery_url == delivery_url)
            {
                println!("webhook {} already covers {topic}", hook.id);
                return Ok(());
            }
            let hook = client.create_webhook(&topic, &delivery_url).await?;
            println!("webhook {} registered for {topic}", hook.id);
        }
    }
    Ok(())
}
