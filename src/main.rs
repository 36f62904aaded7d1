use std::path::Path;

use anyhow::Context;
use clap::{Parser, Subcommand};
use nh::api::{ApiSource, CrmApi};
use nh::cache::CacheStore;
use nh::channel::{Event, FetchOptions, PollingChannel};
use nh::config::{Config, PathOpt, USizeOpt};
use nh::log::Log;
use nh::net::Net;
use nh::notification::{Filter, NotificationItem, NotificationView, Role};
use nh::utils::install_panic_hook;
use nh::{ArcPath, ArcStr};
use tokio::sync::mpsc::{UnboundedReceiver, unbounded_channel};

type Channel = PollingChannel<ApiSource<NotificationItem>>;

const SCOPE: &str = "cli";

#[derive(Parser)]
#[command(name = "notify-hub")]
#[command(about = "Poll CRM notifications and show them with an unread badge")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch the notifications of an endpoint once
    List {
        /// The endpoint (e.g., "notifications", "manager/report-flags")
        #[arg(required = true)]
        endpoint: String,
        /// Notification type to show, or "all"
        #[arg(short, long, default_value = "all")]
        filter: Filter,
        /// Dashboard style: "employee" or "manager"
        #[arg(short, long, default_value = "employee")]
        role: Role,
    },
    /// Keep polling an endpoint and print every update
    Watch {
        /// The endpoint (e.g., "notifications", "manager/report-flags")
        #[arg(required = true)]
        endpoint: String,
        /// Notification type to show, or "all"
        #[arg(short, long, default_value = "all")]
        filter: Filter,
        /// Dashboard style: "employee" or "manager"
        #[arg(short, long, default_value = "employee")]
        role: Role,
        /// Stop after this many refreshes
        #[arg(short, long)]
        ticks: Option<usize>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    install_panic_hook()?;

    let cli = Cli::parse();

    let home = std::env::var_os("HOME").context("HOME is not set")?;
    let config_path = Path::new(&home)
        .join(".config")
        .join("notify-hub")
        .join("config.toml");
    let config = Config::spawn(ArcPath::from(config_path));

    if config.load().await.is_err() {
        config.save().await.context("Writing the default configuration")?;
    }

    let log = Log::spawn(
        config.log_level().await,
        config.usize(USizeOpt::MaxAge).await,
        config.path(PathOpt::LogDir).await,
    )
    .await?;
    log.collect_garbage().await;

    let net = Net::spawn(config.clone(), log.clone()).await?;
    let api = CrmApi::spawn(net, config.clone(), log.clone()).await;
    let channel = PollingChannel::new(
        api.records::<NotificationItem>(),
        CacheStore::new(config.seconds(USizeOpt::CacheTtl).await),
        config.seconds(USizeOpt::RefreshInterval).await,
        log.clone(),
    );

    log.info(SCOPE, "Starting notify-hub CLI");

    let result = match cli.command {
        Commands::List {
            endpoint,
            filter,
            role,
        } => handle_list_command(&channel, endpoint, filter, role).await,
        Commands::Watch {
            endpoint,
            filter,
            role,
            ticks,
        } => handle_watch_command(&channel, endpoint, filter, role, ticks).await,
    };

    channel.stop();
    log.flush().await;
    result
}

/// Forwards the channel's events to a receiver the CLI can await on.
fn forward_events(channel: &Channel) -> UnboundedReceiver<Event<NotificationItem>> {
    let (tx, rx) = unbounded_channel();
    let _ = channel.subscribe(move |event: &Event<NotificationItem>| {
        tx.send(event.clone())
            .map_err(|_| anyhow::anyhow!("Event receiver dropped"))
    });
    rx
}

/// Handle the list command: one fetch, one render
async fn handle_list_command(
    channel: &Channel,
    endpoint: String,
    filter: Filter,
    role: Role,
) -> anyhow::Result<()> {
    let mut events = forward_events(channel);
    let items = channel.fetch(endpoint.as_str(), FetchOptions::new()).await;

    while let Ok(event) = events.try_recv() {
        if let Event::Error(error) = event {
            anyhow::bail!("Fetching '{}' failed: {}", endpoint, error);
        }
    }

    let mut view = NotificationView::new(role);
    view.set_filter(filter);
    view.render(items);
    print_view(&view);

    Ok(())
}

/// Handle the watch command: render the first fetch, then every refresh
async fn handle_watch_command(
    channel: &Channel,
    endpoint: String,
    filter: Filter,
    role: Role,
    ticks: Option<usize>,
) -> anyhow::Result<()> {
    let endpoint = ArcStr::from(endpoint);
    let mut events = forward_events(channel);
    let mut view = NotificationView::new(role);
    view.set_filter(filter);

    let items = channel.fetch(endpoint.clone(), FetchOptions::new()).await;
    while events.try_recv().is_ok() {}
    view.render(items);
    print_view(&view);

    println!(
        "Refreshing '{}' every {}s, press Ctrl-C to stop",
        endpoint,
        channel.refresh_interval().as_secs()
    );
    channel.watch(endpoint, FetchOptions::new());

    let mut seen = 0;
    while ticks.is_none_or(|ticks| seen < ticks) {
        let event = tokio::select! {
            event = events.recv() => event,
            _ = tokio::signal::ctrl_c() => break,
        };
        let Some(event) = event else {
            break;
        };

        match event {
            Event::Update(items) => {
                view.render(items);
                print_view(&view);
            }
            Event::Error(error) => eprintln!("Refresh failed: {}", error),
        }
        seen += 1;
    }

    Ok(())
}

fn print_view(view: &NotificationView) {
    println!();
    println!("Notifications ({}): {} unread", view.filter(), view.unread());
    if view.rows().is_empty() {
        println!("No notifications");
    }
    for row in view.rows() {
        println!("{}", row);
    }
}
