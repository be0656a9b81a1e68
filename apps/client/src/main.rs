use std::sync::Arc;

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use print_slots_client::clock::SystemClock;
use print_slots_client::prefs::Prefs;
use print_slots_client::terminal::{self, TerminalDialogs};
use print_slots_client::{identity, spawn_refresh, ApiClient, App, AppOptions, Config};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // ── Tracing: stderr, so the document on stdout stays readable ──
    let env_filter = EnvFilter::from_default_env().add_directive("info".parse()?);
    let fmt_layer = tracing_subscriber::fmt::layer().with_writer(std::io::stderr);
    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .init();

    let config = Config::from_env()?;
    let prefs = Prefs::load(config.prefs_path.clone());
    let identity = identity::resolve(&config.host);
    tracing::info!(
        api = %config.api_base_url,
        anonymous = identity.is_anonymous(),
        "starting print-slots client"
    );

    let api = ApiClient::new(config.api_base_url.clone(), &identity)?;
    let input = terminal::stdin_lines();
    let dialogs = Arc::new(TerminalDialogs::new(input.clone()));
    let app = App::new(
        api,
        identity,
        dialogs,
        AppOptions {
            locale: config.locale,
            timings: config.timings,
            clock: Arc::new(SystemClock),
            prefs,
            host_color_scheme: config.host.color_scheme.clone(),
        },
    );

    app.bootstrap().await;
    let refresh = spawn_refresh(app.clone(), config.timings.refresh_interval);

    let result = terminal::run(app, input).await;
    refresh.abort();
    tracing::info!("client stopped");
    result
}
