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

mod common;

use common::{wait_until, CountingLoader, GatedLoader, PanicOnceLoader, TEXTURE};
use crossbeam_channel::{Receiver, Sender};
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tackle_core::resource::{ResourceError, ResourceHandle};
use tackle_io::{LoadResult, ResourceManager, ResourceManagerConfig};

const TIMEOUT: Duration = Duration::from_secs(5);
const WORKER_NAME: &str = "test-resource-worker";

type Completion = (String, LoadResult, Option<String>);

fn manager() -> ResourceManager {
    ResourceManager::new(ResourceManagerConfig {
        worker_thread_name: WORKER_NAME.to_string(),
        ..ResourceManagerConfig::default()
    })
    .unwrap()
}

/// Queues an async load that reports its path, result and executing thread name.
fn queue(manager: &ResourceManager, path: &str, results: &Sender<Completion>) {
    let results = results.clone();
    let owned = path.to_string();
    manager.load_resource_async(path, TEXTURE, move |result| {
        let thread_name = thread::current().name().map(str::to_string);
        let _ = results.send((owned, result, thread_name));
    });
}

fn collect(results: &Receiver<Completion>, count: usize) -> Vec<Completion> {
    (0..count)
        .map(|_| results.recv_timeout(TIMEOUT).expect("callback was not invoked"))
        .collect()
}

#[test]
fn test_callbacks_run_on_the_worker_in_fifo_order() -> anyhow::Result<()> {
    let manager = manager();
    manager.set_loader(TEXTURE, CountingLoader::new(10));
    manager.init()?;
    let (tx, rx) = crossbeam_channel::unbounded();

    for path in ["a.png", "b.png", "c.png", "d.png"] {
        queue(&manager, path, &tx);
    }
    let completions = collect(&rx, 4);

    let order: Vec<_> = completions.iter().map(|(path, _, _)| path.as_str()).collect();
    assert_eq!(order, vec!["a.png", "b.png", "c.png", "d.png"]);
    for (_, result, thread_name) in &completions {
        assert!(result.is_ok());
        assert_eq!(thread_name.as_deref(), Some(WORKER_NAME));
    }
    assert_eq!(manager.loaded_resource_count(), 4);
    Ok(())
}

#[test]
fn test_already_loaded_path_still_goes_through_the_worker() -> anyhow::Result<()> {
    let manager = manager();
    let loader = CountingLoader::new(10);
    manager.set_loader(TEXTURE, loader.clone());
    let loaded = manager.load_resource("a.png", &TEXTURE)?;
    manager.init()?;
    let (tx, rx) = crossbeam_channel::unbounded();

    queue(&manager, "a.png", &tx);
    let (_, result, thread_name) = rx.recv_timeout(TIMEOUT)?;

    assert!(ResourceHandle::ptr_eq(&result?, &loaded));
    assert_eq!(thread_name.as_deref(), Some(WORKER_NAME));
    assert_eq!(loader.load_calls(), 1);
    Ok(())
}

#[test]
fn test_async_failure_is_delivered_to_the_callback() -> anyhow::Result<()> {
    let manager = manager();
    manager.set_loader(TEXTURE, CountingLoader::failing(10));
    manager.init()?;
    let (tx, rx) = crossbeam_channel::unbounded();

    queue(&manager, "foo.png", &tx);
    let (_, result, _) = rx.recv_timeout(TIMEOUT)?;

    assert!(matches!(result, Err(ResourceError::LoadFailed { .. })));
    assert_eq!(manager.loaded_resource_count(), 0);
    Ok(())
}

#[test]
fn test_cleanup_fails_requests_queued_without_a_worker() {
    let manager = manager();
    let loader = CountingLoader::new(10);
    manager.set_loader(TEXTURE, loader.clone());
    let (tx, rx) = crossbeam_channel::unbounded();

    for path in ["a.png", "b.png", "c.png"] {
        queue(&manager, path, &tx);
    }
    assert_eq!(manager.pending_request_count(), 3);

    manager.cleanup();

    let completions: Vec<_> = rx.try_iter().collect();
    assert_eq!(completions.len(), 3);
    for ((path, result, _), expected) in completions.iter().zip(["a.png", "b.png", "c.png"]) {
        assert_eq!(path, expected);
        assert!(matches!(result, Err(ResourceError::ShuttingDown { path }) if path == expected));
    }
    assert_eq!(loader.load_calls(), 0);
    assert_eq!(manager.pending_request_count(), 0);
}

#[test]
fn test_cleanup_lets_the_current_load_finish_and_fails_the_rest() -> anyhow::Result<()> {
    let manager = Arc::new(manager());
    let (loader, started, gate) = GatedLoader::new();
    manager.set_loader(TEXTURE, loader);
    manager.init()?;
    let (tx, rx) = crossbeam_channel::unbounded();

    for path in ["r1.png", "r2.png", "r3.png"] {
        queue(&manager, path, &tx);
    }
    assert_eq!(started.recv_timeout(TIMEOUT)?, "r1.png");

    let stopper = {
        let manager = Arc::clone(&manager);
        thread::spawn(move || manager.cleanup())
    };
    assert!(wait_until(TIMEOUT, || !manager.is_running()));
    gate.send(())?;
    stopper.join().expect("cleanup panicked");

    let completions: Vec<_> = rx.try_iter().collect();
    let order: Vec<_> = completions.iter().map(|(path, _, _)| path.as_str()).collect();
    assert_eq!(order, vec!["r1.png", "r2.png", "r3.png"]);
    assert!(completions[0].1.is_ok());
    for (_, result, _) in &completions[1..] {
        assert!(matches!(result, Err(ResourceError::ShuttingDown { .. })));
    }
    assert!(started.try_recv().is_err());
    Ok(())
}

#[test]
fn test_init_is_idempotent() -> anyhow::Result<()> {
    let manager = manager();
    assert!(!manager.is_running());

    manager.init()?;
    manager.init()?;
    assert!(manager.is_running());

    manager.cleanup();
    assert!(!manager.is_running());
    Ok(())
}

#[test]
fn test_manager_can_restart_after_cleanup() -> anyhow::Result<()> {
    let manager = manager();
    manager.init()?;
    manager.cleanup();

    manager.set_loader(TEXTURE, CountingLoader::new(10));
    manager.init()?;
    assert!(manager.is_running());

    let (tx, rx) = crossbeam_channel::unbounded();
    queue(&manager, "a.png", &tx);
    let (_, result, thread_name) = rx.recv_timeout(TIMEOUT)?;

    assert!(result.is_ok());
    assert_eq!(thread_name.as_deref(), Some(WORKER_NAME));
    Ok(())
}

#[test]
fn test_requests_queued_before_init_are_served_once_it_starts() -> anyhow::Result<()> {
    let manager = manager();
    manager.set_loader(TEXTURE, CountingLoader::new(10));
    let (tx, rx) = crossbeam_channel::unbounded();

    queue(&manager, "early.png", &tx);
    assert!(rx.try_recv().is_err());

    manager.init()?;
    let (path, result, _) = rx.recv_timeout(TIMEOUT)?;

    assert_eq!(path, "early.png");
    assert!(result.is_ok());
    Ok(())
}

#[test]
fn test_dropping_the_manager_fails_pending_requests() {
    let manager = manager();
    let (tx, rx) = crossbeam_channel::unbounded();
    queue(&manager, "late.png", &tx);

    drop(manager);

    let (_, result, _) = rx.try_recv().expect("callback was not invoked on drop");
    assert!(matches!(result, Err(ResourceError::ShuttingDown { .. })));
}

#[test]
fn test_panicking_loader_fails_only_its_own_request() -> anyhow::Result<()> {
    let manager = manager();
    let loader = PanicOnceLoader::new();
    manager.set_loader(TEXTURE, loader.clone());
    let (tx, rx) = crossbeam_channel::unbounded();

    for path in ["a.png", "b.png", "c.png"] {
        queue(&manager, path, &tx);
    }
    manager.init()?;

    let completions = collect(&rx, 3);
    let order: Vec<_> = completions.iter().map(|(path, _, _)| path.as_str()).collect();
    assert_eq!(order, vec!["a.png", "b.png", "c.png"]);
    assert!(matches!(
        &completions[0].1,
        Err(ResourceError::Interrupted { path }) if path == "a.png"
    ));
    assert!(completions[1].1.is_ok());
    assert!(completions[2].1.is_ok());
    assert!(manager.is_running());

    queue(&manager, "d.png", &tx);
    let (path, result, thread_name) = collect(&rx, 1).remove(0);
    assert_eq!(path, "d.png");
    assert!(result.is_ok());
    assert_eq!(thread_name.as_deref(), Some(WORKER_NAME));
    assert_eq!(loader.calls(), 4);
    assert_eq!(manager.loaded_resource_count(), 3);
    Ok(())
}

#[test]
fn test_sync_load_finishing_after_cleanup_is_released() -> anyhow::Result<()> {
    let manager = Arc::new(manager());
    let (loader, started, gate) = GatedLoader::new();
    manager.set_loader(TEXTURE, loader);

    let loading = {
        let manager = Arc::clone(&manager);
        thread::spawn(move || manager.load_resource("x.png", &TEXTURE))
    };
    assert_eq!(started.recv_timeout(TIMEOUT)?, "x.png");

    manager.cleanup();
    gate.send(())?;
    let result = loading.join().expect("load panicked");

    assert!(matches!(result, Err(ResourceError::ShuttingDown { path }) if path == "x.png"));
    assert!(!manager.is_resource_loaded("x.png"));
    assert_eq!(manager.loaded_resource_count(), 0);
    assert_eq!(manager.total_memory_usage(), 0);
    Ok(())
}
