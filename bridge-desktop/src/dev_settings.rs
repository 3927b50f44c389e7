//! DevSettings for desktop hosts
//!
//! Desktop builds have no packager connection of their own, so every setter
//! records its value in [`DevSettingsState`] and reload requests are counted
//! and handed to an optional host callback. `onFastRefresh` is deliberately
//! not implemented; callers see it as a missing optional method.

use async_trait::async_trait;
use bridge_traits::contracts::dev_settings::*;
use bridge_traits::error::{BridgeError, Result};
use bridge_traits::{EventSink, NativeModule};
use parking_lot::RwLock;
use serde::Serialize;
use serde_json::{json, Value};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info};

type ReloadHook = Box<dyn Fn(Option<&str>) + Send + Sync>;

/// Snapshot of the developer settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DevSettingsState {
    pub reload_count: u32,
    pub last_reload_reason: Option<String>,
    pub hot_loading_enabled: bool,
    pub debugging_remotely: bool,
    pub profiling_enabled: bool,
    pub element_inspector_shown: bool,
    pub shake_to_show_dev_menu: bool,
    pub secondary_click_to_show_dev_menu: bool,
    /// Custom dev menu items, in insertion order
    pub menu_items: Vec<String>,
    /// At least one listener is registered on the bridge side
    pub observing: bool,
}

impl Default for DevSettingsState {
    fn default() -> Self {
        Self {
            reload_count: 0,
            last_reload_reason: None,
            hot_loading_enabled: false,
            debugging_remotely: false,
            profiling_enabled: false,
            element_inspector_shown: false,
            shake_to_show_dev_menu: true,
            secondary_click_to_show_dev_menu: true,
            menu_items: Vec::new(),
            observing: false,
        }
    }
}

const IMPLEMENTED: &[&str] = &[
    RELOAD,
    RELOAD_WITH_REASON,
    SET_HOT_LOADING_ENABLED,
    SET_IS_DEBUGGING_REMOTELY,
    SET_PROFILING_ENABLED,
    TOGGLE_ELEMENT_INSPECTOR,
    ADD_MENU_ITEM,
    ADD_LISTENER,
    REMOVE_LISTENERS,
    SET_IS_SHAKE_TO_SHOW_DEV_MENU_ENABLED,
    SET_IS_SECONDARY_CLICK_TO_SHOW_DEV_MENU_ENABLED,
];

#[derive(Default)]
pub struct DesktopDevSettings {
    state: RwLock<DevSettingsState>,
    events: RwLock<Option<Arc<dyn EventSink>>>,
    on_reload: Option<ReloadHook>,
}

impl DesktopDevSettings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `hook` on every reload request, with the reason if one was given.
    pub fn on_reload<F>(mut self, hook: F) -> Self
    where
        F: Fn(Option<&str>) + Send + Sync + 'static,
    {
        self.on_reload = Some(Box::new(hook));
        self
    }

    pub fn state(&self) -> DevSettingsState {
        self.state.read().clone()
    }

    /// Report a press on a custom dev menu item.
    ///
    /// Returns whether the `didPressMenuItem` event reached a listener.
    pub fn press_menu_item(&self, title: &str) -> Result<bool> {
        if !self.state.read().menu_items.iter().any(|item| item == title) {
            return Err(BridgeError::InvalidArgument(format!(
                "no dev menu item titled {:?}",
                title
            )));
        }

        let Some(events) = self.events.read().clone() else {
            debug!(title, "Dev menu item pressed before initialization");
            return Ok(false);
        };
        Ok(events.emit(DID_PRESS_MENU_ITEM, json!({ "title": title })))
    }

    fn reload(&self, reason: Option<String>) {
        {
            let mut state = self.state.write();
            state.reload_count += 1;
            state.last_reload_reason = reason.clone();
        }
        info!(reason = reason.as_deref().unwrap_or("unspecified"), "Reload requested");
        if let Some(hook) = &self.on_reload {
            hook(reason.as_deref());
        }
    }

    fn set_flag(
        &self,
        method: &str,
        args: &[Value],
        update: impl FnOnce(&mut DevSettingsState, bool),
    ) -> Result<()> {
        let enabled = bool_arg(method, args)?;
        update(&mut self.state.write(), enabled);
        debug!(method, enabled, "Dev setting updated");
        Ok(())
    }
}

#[async_trait]
impl NativeModule for DesktopDevSettings {
    fn implements(&self, method: &str) -> bool {
        IMPLEMENTED.contains(&method)
    }

    async fn initialize(&self, events: Arc<dyn EventSink>) -> Result<()> {
        *self.events.write() = Some(events);
        Ok(())
    }

    async fn invoke(&self, method: &str, args: Vec<Value>) -> Result<Value> {
        match method {
            RELOAD => self.reload(None),
            RELOAD_WITH_REASON => self.reload(Some(string_arg(method, &args)?)),
            SET_HOT_LOADING_ENABLED => {
                self.set_flag(method, &args, |s, v| s.hot_loading_enabled = v)?
            }
            SET_IS_DEBUGGING_REMOTELY => {
                self.set_flag(method, &args, |s, v| s.debugging_remotely = v)?
            }
            SET_PROFILING_ENABLED => {
                self.set_flag(method, &args, |s, v| s.profiling_enabled = v)?
            }
            SET_IS_SHAKE_TO_SHOW_DEV_MENU_ENABLED => {
                self.set_flag(method, &args, |s, v| s.shake_to_show_dev_menu = v)?
            }
            SET_IS_SECONDARY_CLICK_TO_SHOW_DEV_MENU_ENABLED => {
                self.set_flag(method, &args, |s, v| s.secondary_click_to_show_dev_menu = v)?
            }
            TOGGLE_ELEMENT_INSPECTOR => {
                let mut state = self.state.write();
                state.element_inspector_shown = !state.element_inspector_shown;
            }
            ADD_MENU_ITEM => {
                let title = string_arg(method, &args)?;
                let mut state = self.state.write();
                if !state.menu_items.contains(&title) {
                    state.menu_items.push(title);
                }
            }
            // Listener bookkeeping lives on the bridge side.
            ADD_LISTENER | REMOVE_LISTENERS => {}
            other => {
                return Err(BridgeError::NotAvailable(format!(
                    "DevSettings.{} is not implemented on desktop",
                    other
                )))
            }
        }
        Ok(Value::Null)
    }

    fn start_observing(&self) {
        self.state.write().observing = true;
    }

    fn stop_observing(&self) {
        self.state.write().observing = false;
    }

    async fn invalidate(&self) {
        self.events.write().take();
    }
}

impl fmt::Debug for DesktopDevSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DesktopDevSettings")
            .field("state", &*self.state.read())
            .field("initialized", &self.events.read().is_some())
            .finish()
    }
}

fn bool_arg(method: &str, args: &[Value]) -> Result<bool> {
    args.first().and_then(Value::as_bool).ok_or_else(|| {
        BridgeError::InvalidArgument(format!("{} expects a boolean argument", method))
    })
}

fn string_arg(method: &str, args: &[Value]) -> Result<String> {
    args.first()
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| BridgeError::InvalidArgument(format!("{} expects a string argument", method)))
}
