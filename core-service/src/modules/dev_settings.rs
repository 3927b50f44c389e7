//! Typed `DevSettings` façade

use bridge_traits::contracts::dev_settings::*;
use core_registry::ModuleProxy;
use core_runtime::events::{BridgeEvent, EventStream, ModuleEvent, RecvError};
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{debug, warn};

use crate::error::Result;

/// Developer settings of the host: reload, debugging toggles, dev menu.
#[derive(Debug, Clone)]
pub struct DevSettings {
    proxy: Arc<ModuleProxy>,
}

impl DevSettings {
    pub fn new(proxy: Arc<ModuleProxy>) -> Self {
        Self { proxy }
    }

    pub fn proxy(&self) -> &Arc<ModuleProxy> {
        &self.proxy
    }

    pub fn reload(&self) -> Result<()> {
        self.send(RELOAD, vec![])
    }

    /// Reload with a reason, falling back to a plain reload on hosts that
    /// cannot take one.
    pub fn reload_with_reason(&self, reason: &str) -> Result<()> {
        match self.send(RELOAD_WITH_REASON, vec![json!(reason)]) {
            Err(err) if err.is_missing_method() => {
                debug!(reason, "reloadWithReason unavailable, reloading without reason");
                self.reload()
            }
            other => other,
        }
    }

    /// Notify the host of a fast refresh. Fails with a missing-method error
    /// on hosts without fast refresh support.
    pub fn on_fast_refresh(&self) -> Result<()> {
        self.send(ON_FAST_REFRESH, vec![])
    }

    pub fn set_hot_loading_enabled(&self, enabled: bool) -> Result<()> {
        self.send(SET_HOT_LOADING_ENABLED, vec![json!(enabled)])
    }

    pub fn set_is_debugging_remotely(&self, enabled: bool) -> Result<()> {
        self.send(SET_IS_DEBUGGING_REMOTELY, vec![json!(enabled)])
    }

    pub fn set_profiling_enabled(&self, enabled: bool) -> Result<()> {
        self.send(SET_PROFILING_ENABLED, vec![json!(enabled)])
    }

    pub fn toggle_element_inspector(&self) -> Result<()> {
        self.send(TOGGLE_ELEMENT_INSPECTOR, vec![])
    }

    /// Add a custom dev menu item; presses arrive as `didPressMenuItem`.
    pub fn add_menu_item(&self, title: &str) -> Result<()> {
        self.send(ADD_MENU_ITEM, vec![json!(title)])
    }

    /// iOS hosts only.
    pub fn set_is_shake_to_show_dev_menu_enabled(&self, enabled: bool) -> Result<()> {
        self.send(SET_IS_SHAKE_TO_SHOW_DEV_MENU_ENABLED, vec![json!(enabled)])
    }

    /// macOS hosts only.
    pub fn set_is_secondary_click_to_show_dev_menu_enabled(&self, enabled: bool) -> Result<()> {
        self.send(
            SET_IS_SECONDARY_CLICK_TO_SHOW_DEV_MENU_ENABLED,
            vec![json!(enabled)],
        )
    }

    pub fn add_listener(&self, event_name: &str) -> Result<()> {
        Ok(self.proxy.add_listener(event_name)?)
    }

    pub fn remove_listeners(&self, count: usize) -> Result<()> {
        Ok(self.proxy.remove_listeners(count)?)
    }

    /// Listen for dev menu item presses.
    ///
    /// Registers one `didPressMenuItem` listener; the caller balances it with
    /// `remove_listeners(1)` when done.
    pub fn menu_item_presses(&self) -> Result<MenuItemPresses> {
        // Subscribe first so no press between the two calls is lost.
        let events = self.proxy.events().emitted(DID_PRESS_MENU_ITEM);
        self.add_listener(DID_PRESS_MENU_ITEM)?;
        Ok(MenuItemPresses { events })
    }

    fn send(&self, method: &str, args: Vec<Value>) -> Result<()> {
        Ok(self.proxy.send(method, args)?)
    }
}

/// Stream of pressed dev menu item titles.
pub struct MenuItemPresses {
    events: EventStream,
}

impl MenuItemPresses {
    /// Next pressed title; `None` once the bridge is gone.
    pub async fn next(&mut self) -> Option<String> {
        loop {
            match self.events.recv().await {
                Ok(BridgeEvent::Module(ModuleEvent::Emitted { payload, .. })) => {
                    match payload.get("title").and_then(Value::as_str) {
                        Some(title) => return Some(title.to_string()),
                        None => warn!(%payload, "didPressMenuItem without a title"),
                    }
                }
                Ok(_) => {}
                Err(RecvError::Lagged(skipped)) => {
                    warn!(skipped, "Dev menu presses dropped by a slow consumer");
                }
                Err(RecvError::Closed) => return None,
            }
        }
    }
}
