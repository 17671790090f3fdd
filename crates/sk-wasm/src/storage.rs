//! Storage backends available to a page script

use js_sys::{Function, JSON};
use sk_core::{MemoryBackend, StorageBackend, StorageError};
use wasm_bindgen::JsValue;
use web_sys::Storage;

fn describe(error: JsValue) -> String {
    format!("{:?}", error)
}

/// `window.localStorage`, values kept as JSON text.
#[derive(Debug, Clone)]
pub struct LocalStorageBackend(pub Storage);

impl StorageBackend for LocalStorageBackend {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        self.0.get_item(key).map_err(|e| StorageError::Read {
            key: key.to_string(),
            message: describe(e),
        })
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        self.0.set_item(key, value).map_err(|e| StorageError::Write {
            key: key.to_string(),
            message: describe(e),
        })
    }
}

/// Userscript manager storage reached through a `getValue(key)` /
/// `setValue(key, value)` function pair.
///
/// The manager stores structured values, so JSON text is parsed on the way
/// in and stringified on the way out. Values written by earlier installs
/// read back unchanged.
#[derive(Debug, Clone)]
pub struct UserscriptBackend {
    get_value: Function,
    set_value: Function,
}

impl UserscriptBackend {
    pub fn new(get_value: Function, set_value: Function) -> Self {
        Self {
            get_value,
            set_value,
        }
    }
}

impl StorageBackend for UserscriptBackend {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let read_error = |e: JsValue| StorageError::Read {
            key: key.to_string(),
            message: describe(e),
        };

        let value = self
            .get_value
            .call1(&JsValue::NULL, &JsValue::from_str(key))
            .map_err(read_error)?;
        if value.is_undefined() || value.is_null() {
            return Ok(None);
        }

        let text = JSON::stringify(&value).map_err(read_error)?;
        Ok(Some(String::from(text)))
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        let write_error = |e: JsValue| StorageError::Write {
            key: key.to_string(),
            message: describe(e),
        };

        let parsed = JSON::parse(value).map_err(write_error)?;
        self.set_value
            .call2(&JsValue::NULL, &JsValue::from_str(key), &parsed)
            .map_err(write_error)?;
        Ok(())
    }
}

/// Backend selected at startup.
#[derive(Debug, Clone)]
pub enum PageStorage {
    Userscript(UserscriptBackend),
    Local(LocalStorageBackend),
    /// No durable storage reachable; state lasts for the page lifetime
    Memory(MemoryBackend),
}

impl PageStorage {
    /// Prefer the userscript pair, then `localStorage`, then memory.
    pub fn select(
        window: &web_sys::Window,
        get_value: Option<Function>,
        set_value: Option<Function>,
    ) -> Self {
        if let (Some(get_value), Some(set_value)) = (get_value, set_value) {
            return Self::Userscript(UserscriptBackend::new(get_value, set_value));
        }

        match window.local_storage() {
            Ok(Some(storage)) => Self::Local(LocalStorageBackend(storage)),
            Ok(None) | Err(_) => {
                log::warn!("No persistent storage available; settings last until reload");
                Self::Memory(MemoryBackend::new())
            }
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::Userscript(_) => "userscript",
            Self::Local(_) => "localStorage",
            Self::Memory(_) => "memory",
        }
    }
}

impl StorageBackend for PageStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        match self {
            Self::Userscript(backend) => backend.get(key),
            Self::Local(backend) => backend.get(key),
            Self::Memory(backend) => backend.get(key),
        }
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        match self {
            Self::Userscript(backend) => backend.set(key, value),
            Self::Local(backend) => backend.set(key, value),
            Self::Memory(backend) => backend.set(key, value),
        }
    }
}
