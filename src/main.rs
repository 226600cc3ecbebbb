// src/main.rs
use std::sync::Arc;

use env_logger::Env;
use futures::future::join_all;
use log::{error, info, warn};
use parking_lot::Mutex;

use vsdirectory::models::server::Server;
use vsdirectory::storage::mod_cache::find_short;
use vsdirectory::view::selection::{LookupState, ModSelection};
use vsdirectory::view::tooltip::ModTooltip;
use vsdirectory::{
    Config, HttpTransport, ModInfoCache, ServerDirectoryStore, Transport, ViewPipeline, ViewState,
};

#[tokio::main]
async fn main() -> std::io::Result<()> {
    // Initialize logger only once at the start
    env_logger::init_from_env(Env::default().default_filter_or("info"));

    dotenv::dotenv().ok();
    let config = Config::from_env();

    // Optional view state in query-string form, e.g. "mod=carryon&sort=players&dir=desc"
    let query = std::env::args().nth(1).unwrap_or_default();
    let state = ViewState::from_query_with_defaults(&query, config.default_page_size);

    let transport: Arc<dyn Transport> = match HttpTransport::new(&config) {
        Ok(transport) => Arc::new(transport),
        Err(e) => {
            error!("Failed to build HTTP client: {}", e);
            return Err(std::io::Error::new(
                std::io::ErrorKind::Other,
                format!("Failed to build HTTP client: {}", e),
            ));
        }
    };

    let store = Arc::new(ServerDirectoryStore::new(transport.clone(), &config));
    let mods = ModInfoCache::new(transport, &config);
    let view = Arc::new(Mutex::new(ViewPipeline::new(state)));

    let _subscription = store.subscribe({
        let view = view.clone();
        let default_page_size = config.default_page_size;
        move |snapshot| {
            let mut view = view.lock();
            view.set_servers(snapshot);
            print_page(&view, default_page_size);
        }
    });

    info!("Using directory API at {}", config.api_base_url);
    store.start();

    let catalog = mods.get_all().await;
    info!("Mod catalog holds {} entries", catalog.len());

    // Describe the mods of the top row whenever a new snapshot lands.
    let mut updates = store.watch();
    let describe = tokio::spawn({
        let view = view.clone();
        let mods = mods.clone();
        let api_base = config.api_base_url.clone();
        let detail_base = config.mod_detail_base_url.clone();
        async move {
            while updates.changed().await.is_ok() {
                let top: Option<Server> = view.lock().visible().first().map(|s| (*s).clone());
                if let Some(server) = top {
                    describe_mods(&mods, &server, &api_base, &detail_base).await;
                }
            }
        }
    });

    tokio::signal::ctrl_c().await?;
    info!("Shutting down");
    store.stop();
    describe.abort();
    Ok(())
}

fn print_page(view: &ViewPipeline, default_page_size: usize) {
    let state = view.state();
    println!(
        "\n== page {}/{} ({} of {} servers{}) [{}]",
        view.page(),
        view.page_count(),
        view.filtered_count(),
        view.servers().len(),
        if state.filter.is_active() { ", filtered" } else { "" },
        state.to_query_with_defaults(default_page_size)
    );
    for server in view.visible() {
        println!(
            "{:<40} {:>3}/{:<3} {:<10} {:>3} mods {}{}",
            server.name,
            server.players,
            server.max_players,
            server.game_version,
            server.mod_count(),
            if server.has_password { "[pw]" } else { "" },
            if server.whitelisted { "[wl]" } else { "" },
        );
    }
}

async fn describe_mods(mods: &ModInfoCache, server: &Server, api_base: &str, detail_base: &str) {
    let catalog = mods.get_all().await;
    println!("-- mods on {}", server.name);
    for m in server.sorted_mods() {
        let tip = ModTooltip::build(m, find_short(&catalog, &m.id), api_base);
        println!("   {}", tip.label().replace('\n', " | "));
    }

    // Warm the detail cache for the whole manifest; duplicates coalesce.
    let lookups = server.mods.iter().map(|m| mods.get(&m.id));
    let failed = join_all(lookups).await.iter().filter(|r| r.is_err()).count();
    if failed > 0 {
        warn!("{} of {} mod lookups failed", failed, server.mods.len());
    }

    let mut selection = ModSelection::new(detail_base);
    if let Some(first) = server.sorted_mods().first() {
        if let Some(ticket) = selection.select((*first).clone()) {
            let result = mods.get(ticket.id()).await;
            selection.resolve(&ticket, result);
        }
    }
    match selection.state() {
        LookupState::Ready(info) => println!(
            "   first mod: {} {}",
            info.name.as_deref().unwrap_or("?"),
            selection.detail_url().unwrap_or_default()
        ),
        LookupState::Failed(e) => println!("   first mod: lookup failed ({})", e),
        LookupState::Idle | LookupState::Loading => {}
    }
}
