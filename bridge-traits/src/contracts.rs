//! Built-in Capability Contracts
//!
//! Declarations for the developer-tooling capabilities every host is expected
//! to ship. Method name constants are shared by the native implementations and
//! the typed façades so the two cannot drift apart.

use crate::contract::{CapabilityContract, MethodSignature, ReturnKind, ValueType};

/// Developer settings: reload, debugging toggles, dev menu.
pub mod dev_settings {
    pub const NAME: &str = "DevSettings";

    pub const RELOAD: &str = "reload";
    pub const RELOAD_WITH_REASON: &str = "reloadWithReason";
    pub const ON_FAST_REFRESH: &str = "onFastRefresh";
    pub const SET_HOT_LOADING_ENABLED: &str = "setHotLoadingEnabled";
    pub const SET_IS_DEBUGGING_REMOTELY: &str = "setIsDebuggingRemotely";
    pub const SET_PROFILING_ENABLED: &str = "setProfilingEnabled";
    pub const TOGGLE_ELEMENT_INSPECTOR: &str = "toggleElementInspector";
    pub const ADD_MENU_ITEM: &str = "addMenuItem";
    pub use super::{ADD_LISTENER, REMOVE_LISTENERS};
    /// iOS hosts only
    pub const SET_IS_SHAKE_TO_SHOW_DEV_MENU_ENABLED: &str = "setIsShakeToShowDevMenuEnabled";
    /// macOS hosts only
    pub const SET_IS_SECONDARY_CLICK_TO_SHOW_DEV_MENU_ENABLED: &str =
        "setIsSecondaryClickToShowDevMenuEnabled";

    /// Emitted when a custom dev menu item is pressed. Payload: `{ "title": string }`.
    pub const DID_PRESS_MENU_ITEM: &str = "didPressMenuItem";
}

/// Screen capture, used by the snapshot tooling.
pub mod screenshot_manager {
    pub const NAME: &str = "ScreenshotManager";

    pub const TAKE_SCREENSHOT: &str = "takeScreenshot";
}

/// Event-channel method names shared by every contract that emits events.
pub const ADD_LISTENER: &str = "addListener";
pub const REMOVE_LISTENERS: &str = "removeListeners";

pub fn dev_settings_contract() -> CapabilityContract {
    use dev_settings::*;

    CapabilityContract::from_parts(
        NAME,
        vec![
            MethodSignature::new(RELOAD),
            MethodSignature::new(RELOAD_WITH_REASON)
                .param("reason", ValueType::String)
                .optional(),
            MethodSignature::new(ON_FAST_REFRESH).optional(),
            MethodSignature::new(SET_HOT_LOADING_ENABLED)
                .param("isHotLoadingEnabled", ValueType::Boolean),
            MethodSignature::new(SET_IS_DEBUGGING_REMOTELY)
                .param("isDebuggingRemotelyEnabled", ValueType::Boolean),
            MethodSignature::new(SET_PROFILING_ENABLED)
                .param("isProfilingEnabled", ValueType::Boolean),
            MethodSignature::new(TOGGLE_ELEMENT_INSPECTOR),
            MethodSignature::new(ADD_MENU_ITEM).param("title", ValueType::String),
            MethodSignature::new(ADD_LISTENER).param("eventName", ValueType::String),
            MethodSignature::new(REMOVE_LISTENERS).param("count", ValueType::Number),
            MethodSignature::new(SET_IS_SHAKE_TO_SHOW_DEV_MENU_ENABLED)
                .param("enabled", ValueType::Boolean),
            MethodSignature::new(SET_IS_SECONDARY_CLICK_TO_SHOW_DEV_MENU_ENABLED)
                .param("enabled", ValueType::Boolean),
        ],
    )
}

pub fn screenshot_manager_contract() -> CapabilityContract {
    CapabilityContract::from_parts(
        screenshot_manager::NAME,
        vec![MethodSignature::new(screenshot_manager::TAKE_SCREENSHOT)
            .param("target", ValueType::String)
            .param("options", ValueType::Object)
            .returns(ReturnKind::Promise(ValueType::String))],
    )
}

/// Every contract declared by default.
pub fn builtin_contracts() -> Vec<CapabilityContract> {
    vec![dev_settings_contract(), screenshot_manager_contract()]
}
