use anyhow::Context;
use clap::{Parser, Subcommand};
use hrsaas_config::Settings;
use hrsaas_model::DepartmentNode;
use hrsaas_services::{
    NotificationApi, NotificationBridge, NotificationStore, RealtimeClient, StaticToken,
    Subscription, TokenProvider, badge_label, count_nodes, filter_tree, normalize_payload,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "hrsaas-notify")]
#[command(about = "HR SaaS notification pipeline tools")]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Subscribe to the notification stream and print the unread badge
    Listen {
        /// Access token; falls back to auth.access_token from config
        #[arg(long)]
        token: Option<String>,
    },
    /// Filter an organization chart JSON file by department name
    OrgFilter {
        #[arg(long, value_name = "PATH")]
        file: PathBuf,
        #[arg(long, default_value = "")]
        keyword: String,
    },
    /// Show how a push payload would be displayed
    PushPreview {
        /// Raw push body (JSON or plain text); omitted means an empty push
        #[arg(long)]
        payload: Option<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file (silently ignore if missing)
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "hrsaas_notify=info,hrsaas_services=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();
    let settings = Settings::load()?;

    match args.command {
        Command::Listen { token } => listen(settings, token).await,
        Command::OrgFilter { file, keyword } => org_filter(&file, &keyword),
        Command::PushPreview { payload } => {
            let display = normalize_payload(payload.as_deref().map(str::as_bytes), &settings.push);
            println!("{}", serde_json::to_string_pretty(&display)?);
            Ok(())
        }
    }
}

async fn listen(settings: Settings, token: Option<String>) -> anyhow::Result<()> {
    let tokens: Arc<dyn TokenProvider> = Arc::new(StaticToken::new(
        token.or_else(|| settings.auth.access_token.clone()),
    ));
    if tokens.access_token().is_none() {
        anyhow::bail!("No access token: pass --token or set HRSAAS__AUTH__ACCESS_TOKEN");
    }

    let client = RealtimeClient::new(&settings, tokens.clone());
    let api = NotificationApi::new(&settings.api, tokens)?;
    let store = NotificationStore::new();
    let _bridge = NotificationBridge::attach(&client, store.clone(), Some(api));

    let _incoming = client.on_notification(|n| {
        info!(id = %n.id, kind = n.notification_type.as_str(), "{}", n.title);
    });
    let _approvals = client.on_approval_new_request(|request| {
        info!(
            approval = %request.approval_id,
            requester = %request.requester_name,
            "New approval request: {}",
            request.title
        );
    });
    let _attendance = client.on_attendance(|event, checked_in| {
        let action = if checked_in { "checked in" } else { "checked out" };
        info!(employee = %event.employee_name, time = %event.time, "{action}");
    });

    let mut changes = store.subscribe();
    let (_ended, mut done_rx) = stream_end(&client);

    client.connect();
    info!(url = %settings.realtime.subscribe_url(&settings.api), "Listening for notifications");

    loop {
        tokio::select! {
            changed = changes.changed() => {
                if changed.is_err() {
                    break;
                }
                let summary = *changes.borrow_and_update();
                let badge = badge_label(summary.unread_count).unwrap_or_else(|| "-".to_string());
                let latest = store
                    .recent(1)
                    .into_iter()
                    .next()
                    .map(|n| n.title)
                    .unwrap_or_default();
                println!("[{badge}] {} notifications {latest}", summary.total);
            }
            reason = done_rx.recv() => {
                info!(reason = reason.as_deref().unwrap_or("unknown"), "Stream ended");
                break;
            }
            _ = tokio::signal::ctrl_c() => {
                client.disconnect("interrupted");
                break;
            }
        }
    }

    Ok(())
}

/// Yields a reason once the stream is gone for good. The client does not
/// reconnect, so a transport error ends it just like a disconnect, even
/// when the first connect never opened the stream.
fn stream_end(client: &RealtimeClient) -> (Vec<Subscription>, mpsc::UnboundedReceiver<String>) {
    let (done_tx, done_rx) = mpsc::unbounded_channel();
    let on_error = done_tx.clone();
    let subscriptions = vec![
        client.on_error(move |message| {
            warn!(%message, "Stream error");
            let _ = on_error.send(format!("error: {message}"));
        }),
        client.on_disconnect(move |reason| {
            let _ = done_tx.send(reason.to_string());
        }),
    ];
    (subscriptions, done_rx)
}

fn org_filter(file: &Path, keyword: &str) -> anyhow::Result<()> {
    let raw = std::fs::read_to_string(file)
        .with_context(|| format!("Failed to read {}", file.display()))?;
    let forest: Vec<DepartmentNode> =
        serde_json::from_str(&raw).context("Organization chart is not a department array")?;

    let filtered = filter_tree(&forest, keyword);
    info!(
        keyword,
        total = count_nodes(&forest),
        kept = count_nodes(&filtered),
        "Filtered organization chart"
    );
    println!("{}", serde_json::to_string_pretty(filtered.as_ref())?);
    Ok(())
}
