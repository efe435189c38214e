//! Persistent storage on the ESP32's NVS flash partition.
//!
//! [`ConfigPort`] backed by a single postcard blob under the
//! `glucomatrix` namespace. Saves validate the config first; a blob
//! that fails validation never reaches flash. Off-target the store is
//! a `HashMap`, which is enough for the host test suite.

use log::info;
#[cfg(target_os = "espidf")]
use log::warn;

use crate::app::ports::{ConfigError, ConfigPort};
use crate::config::AppConfig;

#[cfg(not(target_os = "espidf"))]
use std::collections::HashMap;

#[cfg(target_os = "espidf")]
use esp_idf_svc::sys::*;

const CONFIG_NAMESPACE: &str = "glucomatrix";
const CONFIG_KEY: &str = "appcfg";

/// Upper bound on a stored config blob; anything larger is treated as
/// corruption rather than read into RAM.
#[allow(dead_code)]
const MAX_BLOB_SIZE: usize = 4000;

/// NVS limits both namespace and key names to 15 bytes.
#[cfg(target_os = "espidf")]
const NVS_NAME_MAX: usize = 15;

pub struct NvsAdapter {
    #[cfg(not(target_os = "espidf"))]
    store: std::cell::RefCell<HashMap<String, Vec<u8>>>,
}

impl NvsAdapter {
    /// Initialise the NVS flash partition. A partition left over from
    /// an older IDF layout (no free pages / new version found) is
    /// erased and re-created rather than treated as fatal.
    pub fn new() -> Result<Self, ConfigError> {
        #[cfg(target_os = "espidf")]
        {
            // SAFETY: called once from the main task before any other
            // NVS user exists.
            let ret = unsafe { nvs_flash_init() };
            if ret == ESP_ERR_NVS_NO_FREE_PAGES || ret == ESP_ERR_NVS_NEW_VERSION_FOUND {
                warn!("NVS: stale partition layout, erasing");
                if unsafe { nvs_flash_erase() } != ESP_OK || unsafe { nvs_flash_init() } != ESP_OK {
                    return Err(ConfigError::IoError);
                }
            } else if ret != ESP_OK {
                return Err(ConfigError::IoError);
            }
            info!("NVS: flash partition ready");
        }

        #[cfg(not(target_os = "espidf"))]
        info!("NVS: in-memory backend (host)");

        Ok(Self {
            #[cfg(not(target_os = "espidf"))]
            store: std::cell::RefCell::new(HashMap::new()),
        })
    }

    #[cfg(not(target_os = "espidf"))]
    fn slot(namespace: &str, key: &str) -> String {
        format!("{namespace}/{key}")
    }
}

// ── ESP-IDF plumbing ──────────────────────────────────────────────
//
// The raw nvs_* API wants NUL-terminated names and an open/close pair
// around every access; `with_namespace` and `c_name` hide that so the
// port impls below stay readable.

#[cfg(target_os = "espidf")]
fn c_name(name: &str) -> [u8; NVS_NAME_MAX + 1] {
    let mut buf = [0u8; NVS_NAME_MAX + 1];
    let n = name.len().min(NVS_NAME_MAX);
    buf[..n].copy_from_slice(&name.as_bytes()[..n]);
    buf
}

#[cfg(target_os = "espidf")]
fn with_namespace<T>(
    namespace: &str,
    write: bool,
    f: impl FnOnce(nvs_handle_t) -> Result<T, i32>,
) -> Result<T, i32> {
    let ns = c_name(namespace);
    let mode = if write { nvs_open_mode_t_NVS_READWRITE } else { nvs_open_mode_t_NVS_READONLY };
    let mut handle: nvs_handle_t = 0;
    let ret = unsafe { nvs_open(ns.as_ptr() as *const _, mode, &mut handle) };
    if ret != ESP_OK {
        return Err(ret);
    }
    let out = f(handle);
    unsafe { nvs_close(handle) };
    out
}

/// `nvs_get_blob` into `buf`; returns the written length.
#[cfg(target_os = "espidf")]
fn get_blob(handle: nvs_handle_t, key: &str, buf: &mut [u8]) -> Result<usize, i32> {
    let k = c_name(key);
    let mut size = buf.len();
    let ret =
        unsafe { nvs_get_blob(handle, k.as_ptr() as *const _, buf.as_mut_ptr() as *mut _, &mut size) };
    if ret != ESP_OK {
        return Err(ret);
    }
    Ok(size)
}

/// Size query without reading the payload.
#[cfg(target_os = "espidf")]
fn blob_size(handle: nvs_handle_t, key: &str) -> Result<usize, i32> {
    let k = c_name(key);
    let mut size: usize = 0;
    let ret = unsafe { nvs_get_blob(handle, k.as_ptr() as *const _, core::ptr::null_mut(), &mut size) };
    if ret != ESP_OK {
        return Err(ret);
    }
    Ok(size)
}

/// `nvs_set_blob` followed by a commit; the write is not durable until
/// the commit returns.
#[cfg(target_os = "espidf")]
fn put_blob(handle: nvs_handle_t, key: &str, data: &[u8]) -> Result<(), i32> {
    let k = c_name(key);
    let ret =
        unsafe { nvs_set_blob(handle, k.as_ptr() as *const _, data.as_ptr() as *const _, data.len()) };
    if ret != ESP_OK {
        return Err(ret);
    }
    let ret = unsafe { nvs_commit(handle) };
    if ret != ESP_OK {
        return Err(ret);
    }
    Ok(())
}

impl ConfigPort for NvsAdapter {
    fn load(&self) -> Result<AppConfig, ConfigError> {
        #[cfg(not(target_os = "espidf"))]
        {
            match self.store.borrow().get(&Self::slot(CONFIG_NAMESPACE, CONFIG_KEY)) {
                Some(bytes) => {
                    let cfg = postcard::from_bytes(bytes).map_err(|_| ConfigError::Corrupted)?;
                    info!("NVS: config loaded");
                    Ok(cfg)
                }
                None => {
                    info!("NVS: no stored config, starting from defaults");
                    Ok(AppConfig::default())
                }
            }
        }

        #[cfg(target_os = "espidf")]
        {
            let read = with_namespace(CONFIG_NAMESPACE, false, |handle| {
                let size = blob_size(handle, CONFIG_KEY)?;
                if size == 0 || size > MAX_BLOB_SIZE {
                    return Err(ESP_FAIL);
                }
                let mut buf = vec![0u8; size];
                let n = get_blob(handle, CONFIG_KEY, &mut buf)?;
                buf.truncate(n);
                Ok(buf)
            });
            match read {
                Ok(bytes) => {
                    let cfg =
                        postcard::from_bytes(&bytes).map_err(|_| ConfigError::Corrupted)?;
                    info!("NVS: config loaded ({} bytes)", bytes.len());
                    Ok(cfg)
                }
                Err(ESP_ERR_NVS_NOT_FOUND) => {
                    info!("NVS: no stored config, starting from defaults");
                    Ok(AppConfig::default())
                }
                Err(e) => {
                    warn!("NVS: config read failed ({e}), starting from defaults");
                    Ok(AppConfig::default())
                }
            }
        }
    }

    fn save(&self, config: &AppConfig) -> Result<(), ConfigError> {
        config.validate().map_err(ConfigError::ValidationFailed)?;
        let bytes = postcard::to_allocvec(config).map_err(|_| ConfigError::IoError)?;

        #[cfg(not(target_os = "espidf"))]
        {
            self.store.borrow_mut().insert(Self::slot(CONFIG_NAMESPACE, CONFIG_KEY), bytes);
            info!("NVS: config saved (host)");
            Ok(())
        }

        #[cfg(target_os = "espidf")]
        {
            match with_namespace(CONFIG_NAMESPACE, true, |h| put_blob(h, CONFIG_KEY, &bytes)) {
                Ok(()) => {
                    info!("NVS: config saved ({} bytes)", bytes.len());
                    Ok(())
                }
                Err(e) => {
                    warn!("NVS: config write failed ({e})");
                    Err(ConfigError::IoError)
                }
            }
        }
    }
}
