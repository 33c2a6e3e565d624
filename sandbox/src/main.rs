// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

mod file_resource;

use anyhow::{Context, Result};
use clap::Parser;
use file_resource::{FileLoader, FILE};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tackle_data::ResourceCache;
use tackle_io::{ResourceManager, ResourceSystemConfig};

/// Loads every file of a directory through the resource manager and caches the results.
#[derive(Debug, Parser)]
#[command(name = "sandbox")]
struct Cli {
    /// Directory whose files are loaded
    #[arg(value_name = "ROOT", default_value = ".")]
    root: PathBuf,

    /// RON configuration for the manager and the cache
    #[arg(long, value_name = "CONFIG")]
    config: Option<PathBuf>,

    /// Override the cache budget, in bytes
    #[arg(long)]
    cache_limit: Option<usize>,
}

fn main() -> Result<()> {
    use env_logger::{Builder, Env};

    Builder::from_env(Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => ResourceSystemConfig::load(path)
            .with_context(|| format!("reading {}", path.display()))?,
        None => ResourceSystemConfig::default(),
    };
    if let Some(limit) = cli.cache_limit {
        config.cache.size_limit_bytes = limit;
    }

    let manager = ResourceManager::new(config.manager)?;
    manager.set_loader(FILE, Arc::new(FileLoader::new(&cli.root)));
    manager.init()?;
    let cache = ResourceCache::new(config.cache);

    let preload = manager.preload_configured();
    for (path, error) in &preload.failed {
        log::warn!("Preload of '{}' failed: {}", path, error);
    }

    let mut files = Vec::new();
    for entry in std::fs::read_dir(&cli.root)
        .with_context(|| format!("listing {}", cli.root.display()))?
    {
        let entry = entry?;
        if entry.file_type()?.is_file() {
            files.push(entry.file_name().to_string_lossy().into_owned());
        }
    }
    files.sort();

    let (tx, rx) = crossbeam_channel::unbounded();
    for file in &files {
        let tx = tx.clone();
        let path = file.clone();
        manager.load_resource_async(file.as_str(), FILE, move |result| {
            let _ = tx.send((path, result));
        });
    }
    drop(tx);

    for _ in 0..files.len() {
        let (path, result) = rx
            .recv_timeout(Duration::from_secs(30))
            .context("timed out waiting for the resource worker")?;
        match result {
            Ok(handle) => {
                let size = handle.size();
                if cache.cache_resource(path.as_str(), handle) {
                    log::info!("Cached '{}' ({} bytes)", path, size);
                } else {
                    log::info!("'{}' ({} bytes) does not fit in the cache", path, size);
                }
            }
            Err(e) => log::warn!("Could not load '{}': {}", path, e),
        }
    }

    println!(
        "Manager: {} resources, {} bytes",
        manager.loaded_resource_count(),
        manager.total_memory_usage()
    );
    println!("Cache: {}", cache.stats());
    for metric in manager.metrics_registry().namespace_metrics("resources") {
        println!("  {} = {:?}", metric.metadata.id, metric.value);
    }

    cache.clear_cache();
    manager.cleanup();
    Ok(())
}
