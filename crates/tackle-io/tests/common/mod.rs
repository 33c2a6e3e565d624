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

#![allow(dead_code)]

use crossbeam_channel::{Receiver, Sender};
use std::any::Any;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tackle_core::resource::{
    BoxedError, Resource, ResourceInfo, ResourceLoader, ResourceType,
};

pub const TEXTURE: ResourceType = ResourceType::new("texture");
pub const SOUND: ResourceType = ResourceType::new("sound");

/// A resource whose size is fixed by its loader and whose `load()` can be made to fail.
#[derive(Debug)]
pub struct TestResource {
    info: ResourceInfo,
    bytes: AtomicUsize,
    fail_load: bool,
    pub unloaded: AtomicBool,
}

impl TestResource {
    pub fn new(path: &str, resource_type: &ResourceType, bytes: usize, fail_load: bool) -> Self {
        Self {
            info: ResourceInfo::new(path, path, resource_type.clone()),
            bytes: AtomicUsize::new(bytes),
            fail_load,
            unloaded: AtomicBool::new(false),
        }
    }

    /// Changes the reported size after registration.
    pub fn resize(&self, bytes: usize) {
        self.bytes.store(bytes, Ordering::SeqCst);
    }
}

impl Resource for TestResource {
    fn info(&self) -> &ResourceInfo {
        &self.info
    }

    fn load(&mut self) -> Result<(), BoxedError> {
        if self.fail_load {
            Err("corrupt data".into())
        } else {
            Ok(())
        }
    }

    fn unload(&self) {
        self.unloaded.store(true, Ordering::SeqCst);
    }

    fn size(&self) -> usize {
        self.bytes.load(Ordering::SeqCst)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// A loader producing [`TestResource`]s and counting how it is used.
///
/// Paths starting with `missing/` do not exist and fail to be created.
#[derive(Debug, Default)]
pub struct CountingLoader {
    pub size: usize,
    pub fail_load: bool,
    pub delay: Duration,
    pub load_calls: AtomicUsize,
    pub unload_calls: AtomicUsize,
}

impl CountingLoader {
    pub fn new(size: usize) -> Arc<Self> {
        Arc::new(Self {
            size,
            ..Self::default()
        })
    }

    pub fn failing(size: usize) -> Arc<Self> {
        Arc::new(Self {
            size,
            fail_load: true,
            ..Self::default()
        })
    }

    pub fn slow(size: usize, delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            size,
            delay,
            ..Self::default()
        })
    }

    pub fn load_calls(&self) -> usize {
        self.load_calls.load(Ordering::SeqCst)
    }

    pub fn unload_calls(&self) -> usize {
        self.unload_calls.load(Ordering::SeqCst)
    }
}

impl ResourceLoader for CountingLoader {
    fn load(
        &self,
        path: &str,
        resource_type: &ResourceType,
    ) -> Result<Box<dyn Resource>, BoxedError> {
        self.load_calls.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            std::thread::sleep(self.delay);
        }
        if !self.exists(path) {
            return Err(format!("no such resource: {path}").into());
        }
        Ok(Box::new(TestResource::new(
            path,
            resource_type,
            self.size,
            self.fail_load,
        )))
    }

    fn unload(&self, _resource: &dyn Resource) {
        self.unload_calls.fetch_add(1, Ordering::SeqCst);
    }

    fn exists(&self, path: &str) -> bool {
        !path.starts_with("missing/")
    }

    fn size_of(&self, path: &str) -> Option<usize> {
        self.exists(path).then_some(self.size)
    }
}

/// A loader that reports each path it starts on and then blocks until released.
pub struct GatedLoader {
    started: Sender<String>,
    gate: Receiver<()>,
}

impl GatedLoader {
    /// Returns the loader, a receiver of started paths and the gate sender.
    pub fn new() -> (Arc<Self>, Receiver<String>, Sender<()>) {
        let (started_tx, started_rx) = crossbeam_channel::unbounded();
        let (gate_tx, gate_rx) = crossbeam_channel::unbounded();
        let loader = Arc::new(Self {
            started: started_tx,
            gate: gate_rx,
        });
        (loader, started_rx, gate_tx)
    }
}

impl ResourceLoader for GatedLoader {
    fn load(
        &self,
        path: &str,
        resource_type: &ResourceType,
    ) -> Result<Box<dyn Resource>, BoxedError> {
        let _ = self.started.send(path.to_string());
        self.gate.recv()?;
        Ok(Box::new(TestResource::new(path, resource_type, 10, false)))
    }

    fn exists(&self, _path: &str) -> bool {
        true
    }
}

/// Panics on its first call, then behaves.
#[derive(Default)]
pub struct PanicOnceLoader {
    calls: AtomicUsize,
}

impl PanicOnceLoader {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl ResourceLoader for PanicOnceLoader {
    fn load(
        &self,
        path: &str,
        resource_type: &ResourceType,
    ) -> Result<Box<dyn Resource>, BoxedError> {
        if self.calls.fetch_add(1, Ordering::SeqCst) == 0 {
            panic!("loader exploded");
        }
        Ok(Box::new(TestResource::new(path, resource_type, 10, false)))
    }

    fn exists(&self, _path: &str) -> bool {
        true
    }
}

/// Waits up to `timeout` for `condition` to hold.
pub fn wait_until(timeout: Duration, mut condition: impl FnMut() -> bool) -> bool {
    let deadline = std::time::Instant::now() + timeout;
    while std::time::Instant::now() < deadline {
        if condition() {
            return true;
        }
        std::thread::sleep(Duration::from_millis(1));
    }
    condition()
}
