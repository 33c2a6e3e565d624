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

//! A resource type holding the raw bytes of a file under a root directory.

use std::any::Any;
use std::path::PathBuf;
use std::sync::RwLock;
use tackle_core::resource::{BoxedError, Resource, ResourceInfo, ResourceLoader, ResourceType};

pub const FILE: ResourceType = ResourceType::new("file");

#[derive(Debug)]
pub struct FileResource {
    info: ResourceInfo,
    location: PathBuf,
    bytes: RwLock<Vec<u8>>,
}

impl Resource for FileResource {
    fn info(&self) -> &ResourceInfo {
        &self.info
    }

    fn load(&mut self) -> Result<(), BoxedError> {
        let bytes = std::fs::read(&self.location)?;
        *self.bytes.get_mut().map_err(|_| "file buffer lock poisoned")? = bytes;
        Ok(())
    }

    fn unload(&self) {
        if let Ok(mut bytes) = self.bytes.write() {
            *bytes = Vec::new();
        }
    }

    fn size(&self) -> usize {
        self.bytes.read().map(|b| b.len()).unwrap_or(0)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Serves paths relative to `root`.
pub struct FileLoader {
    root: PathBuf,
}

impl FileLoader {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl ResourceLoader for FileLoader {
    fn load(&self, path: &str, resource_type: &ResourceType) -> Result<Box<dyn Resource>, BoxedError> {
        let location = self.root.join(path);
        if !location.is_file() {
            return Err(format!("'{}' is not a file", location.display()).into());
        }
        let name = location
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.to_string());
        Ok(Box::new(FileResource {
            info: ResourceInfo::new(name, path, resource_type.clone()),
            location,
            bytes: RwLock::new(Vec::new()),
        }))
    }

    fn exists(&self, path: &str) -> bool {
        self.root.join(path).is_file()
    }

    fn size_of(&self, path: &str) -> Option<usize> {
        let metadata = std::fs::metadata(self.root.join(path)).ok()?;
        usize::try_from(metadata.len()).ok()
    }
}
