use std::env;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use catalog::Catalog;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

mod config;

use config::{config_path_from_env, load_or_create_config, media_roots, parse_media_arg, resolve_path};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into());
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let config_path = config_path_from_env();
    let (config, created) = load_or_create_config(&config_path)?;
    if created {
        info!("Created default config at {:?}", config_path);
    } else {
        info!("Loaded config from {:?}", config_path);
    }

    let args: Vec<String> = env::args().skip(1).collect();
    let roots = if args.is_empty() {
        media_roots(&config_path, &config)
    } else {
        args.iter().filter_map(|arg| parse_media_arg(arg)).collect()
    };
    if roots.is_empty() {
        return Err("no media directories configured and no path argument".into());
    }

    let index_path = resolve_path(&config_path, config.index_path.trim());
    if let Some(parent) = index_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    let catalog = Catalog::open(&index_path)?;

    let cancel = Arc::new(AtomicBool::new(false));
    let signal_cancel = cancel.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("Interrupted; stopping after the current entry");
                signal_cancel.store(true, Ordering::Relaxed);
            }
            Err(err) => warn!("Failed to listen for ctrl-c: {}", err),
        }
    });

    let merge = config.merge_media_dirs;
    let worker_cancel = cancel.clone();
    let built = tokio::task::spawn_blocking(move || {
        catalog.load_or_build(&roots, merge, &worker_cancel)
    })
    .await??;

    let stats = match built {
        Some(stats) => stats,
        None => {
            info!("Catalog up to date");
            return Ok(());
        }
    };
    info!(
        "Catalog built: {} files, {} directories, {} skipped, {} errors",
        stats.files, stats.directories, stats.skipped, stats.errors
    );
    if stats.canceled {
        warn!("Scan canceled; the catalog will be rebuilt on the next run");
    }
    Ok(())
}
