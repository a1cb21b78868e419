use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use page_ui::{
    launch_http, load_ui_config, persistence::describe_persist_failure, Document, DomEvent,
    HttpThemePersistence, MemoryDocument, NodeId, ThemePersistence, UiController,
};
use shared::{domain::Theme, protocol::PREFS_COOKIE};
use storage::{system_clock, CookieJar, KeyValueStore, MemoryStore, PreferenceCache};
use tracing::info;
use tracing_subscriber::EnvFilter;
use url::Url;

#[derive(Parser, Debug)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Submits a theme to the preference endpoint once.
    SetTheme {
        theme: String,
        #[arg(long, default_value = "http://127.0.0.1:8080/nastavenia/vzhlad")]
        endpoint: String,
        /// Raw `Cookie:` header to send, e.g. `session=abc`.
        #[arg(long)]
        cookie: Option<String>,
        #[arg(long, default_value_t = 10_000)]
        timeout_ms: u64,
    },
    /// Prints the preference object carried by a `Cookie:` header.
    DecodeCookie { header: String },
    /// Drives a demo page through the controller and prints what changed.
    Simulate {
        #[arg(long, default_value = "dark")]
        theme: String,
        /// Skip the persistence worker.
        #[arg(long)]
        offline: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();
    let cli = Cli::parse();

    match cli.command {
        Command::SetTheme {
            theme,
            endpoint,
            cookie,
            timeout_ms,
        } => {
            let theme: Theme = theme.parse()?;
            let endpoint = Url::parse(&endpoint).with_context(|| format!("invalid endpoint '{endpoint}'"))?;
            let mut persistence =
                HttpThemePersistence::new(endpoint, Duration::from_millis(timeout_ms))?;
            if let Some(cookie) = cookie {
                persistence = persistence.with_session_cookie(cookie);
            }
            match persistence.submit(theme).await {
                Ok(()) => println!("persisted theme={theme}"),
                Err(err) => {
                    return Err(anyhow!("{}: {err}", describe_persist_failure(&err)));
                }
            }
        }
        Command::DecodeCookie { header } => {
            let cache = PreferenceCache::new(CookieJar::from_header(&header, system_clock()));
            let prefs = cache.load();
            println!("{}", serde_json::to_string_pretty(&prefs)?);
            match prefs.theme() {
                Some(theme) => println!("theme={theme}"),
                None => println!("theme=<none>"),
            }
        }
        Command::Simulate { theme, offline } => {
            tokio::task::spawn_blocking(move || simulate(&theme, offline)).await??;
        }
    }

    Ok(())
}

struct DemoPage {
    doc: MemoryDocument,
    login_trigger: NodeId,
    reply_trigger: NodeId,
    theme_select: NodeId,
}

fn demo_page() -> DemoPage {
    let mut doc = MemoryDocument::new();
    let body = doc.body_node();
    let login_trigger = doc.element(body, "button").id("btn-login").build();
    let reply_trigger = doc
        .element(body, "span")
        .attr("data-open", "reply-modal")
        .attr("data-prefill-id", "7")
        .attr("data-prefill-typ", "Ples")
        .attr("data-prefill-miesto", "Žilina")
        .attr("data-prefill-meno", "Peter")
        .build();

    let login = doc.element(body, "div").id("modal-login").build();
    doc.element(login, "input").attr("name", "email").build();
    let reply = doc.element(body, "div").id("reply-modal").build();
    for name in ["dopyt_id", "predmet", "sprava"] {
        doc.element(reply, "textarea").attr("name", name).build();
    }
    let theme_select = doc
        .element(body, "select")
        .attr("name", "theme")
        .value("system")
        .build();

    DemoPage {
        doc,
        login_trigger,
        reply_trigger,
        theme_select,
    }
}

fn simulate(theme: &str, offline: bool) -> Result<()> {
    let config = load_ui_config();
    let backend = if offline {
        None
    } else {
        Some(launch_http(&config).context("failed to start persistence worker")?)
    };

    let page = demo_page();
    let mut ui = UiController::start(page.doc, MemoryStore::new(), &config, backend);

    ui.handle_event(DomEvent::click(page.login_trigger));
    ui.tick(Duration::from_millis(16));
    println!("open after login click: {:?}", ui.panels().open_panels());

    ui.handle_event(DomEvent::click(page.reply_trigger));
    ui.tick(Duration::from_millis(32));
    println!("open after reply click: {:?}", ui.panels().open_panels());
    if let Some(reply) = ui.panels().anchor("reply-modal") {
        for name in ["dopyt_id", "predmet", "sprava"] {
            let value = ui
                .document()
                .field(reply, name)
                .and_then(|field| ui.document().value(field))
                .unwrap_or_default();
            println!("  {name} = {value:?}");
        }
    }

    ui.document_mut().set_value(page.theme_select, theme);
    ui.handle_event(DomEvent::change(page.theme_select));
    let settled = ui.wait_until_settled(config.request_timeout());
    let root = ui.document().root();
    info!(settled, "theme change finished");
    println!(
        "data-theme = {:?}, state = {:?}",
        ui.document().attribute(root, "data-theme"),
        ui.preferences().state()
    );
    println!(
        "{PREFS_COOKIE} = {}",
        ui.preferences().cache().store().get(PREFS_COOKIE).unwrap_or_default()
    );
    Ok(())
}
