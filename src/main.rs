use actix_web::{middleware, web, App, HttpServer};
use log::{info, warn};
use std::path::Path;

use vndb_proxy::app_state::AppState;
use vndb_proxy::config::Config;
use vndb_proxy::routes;

fn init_logging() {
    let log_config = Path::new("log4rs.yml");
    if log_config.exists() {
        match log4rs::init_file(log_config, Default::default()) {
            Ok(()) => return,
            Err(e) => eprintln!("Failed to load log4rs.yml, falling back to env_logger: {}", e),
        }
    }
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    init_logging();

    let cfg = Config::load();
    let state = AppState::from_config(cfg.clone())
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e.to_string()))?;

    info!("Upstream initialized:");
    info!("  Kana API: {}", state.kana.base_url());
    info!("  Legacy API: {}", state.legacy.addr());
    info!("  Timeout: {}s", cfg.upstream.timeout_secs);
    info!("  Tags loaded: {}", state.tags.len());

    let data = web::Data::new(state);

    // Try consecutive ports starting at the configured one
    let mut last_err: Option<std::io::Error> = None;
    let first = cfg.server.port;
    let last = first.saturating_add(cfg.server.port_attempts.saturating_sub(1));
    for port in first..=last {
        let data_clone = data.clone();
        let addr = format!("{}:{}", cfg.server.host, port);
        match HttpServer::new(move || {
            App::new()
                .app_data(data_clone.clone())
                .wrap(middleware::Logger::default())
                .configure(routes::configure)
        })
        .bind(&addr)
        {
            Ok(server) => {
                info!("Listening on {}", addr);
                let result = server.run().await;
                data.metrics.log_summary();
                return result;
            }
            Err(e) => {
                warn!("Could not bind {}: {}", addr, e);
                last_err = Some(e);
                continue;
            }
        }
    }
    Err(last_err.unwrap_or_else(|| {
        std::io::Error::new(
            std::io::ErrorKind::AddrInUse,
            format!("No available ports {}-{}", first, last),
        )
    }))
}
