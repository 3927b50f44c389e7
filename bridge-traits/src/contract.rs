//! Capability Contract Declarations
//!
//! A capability contract is the declarative half of the bridge: a named set of
//! method signatures that a native implementation must satisfy. Contracts are
//! plain data, so they can be declared in code, shipped as JSON next to a host
//! build, or compared against what a native module reports at runtime.
//!
//! ## Example
//!
//! ```rust
//! use bridge_traits::contract::{CapabilityContract, MethodSignature, ReturnKind, ValueType};
//!
//! let contract = CapabilityContract::builder("Clipboard")
//!     .method(MethodSignature::new("setString").param("content", ValueType::String))
//!     .method(
//!         MethodSignature::new("getString").returns(ReturnKind::Promise(ValueType::String)),
//!     )
//!     .method(MethodSignature::new("clear").optional())
//!     .build()
//!     .unwrap();
//!
//! assert_eq!(contract.required_methods().count(), 2);
//! assert!(contract.method("clear").unwrap().optional);
//! ```

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashSet;
use std::fmt;
use thiserror::Error;

use crate::contracts::{ADD_LISTENER, REMOVE_LISTENERS};

/// Type of a value crossing the bridge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ValueType {
    Boolean,
    Number,
    String,
    Object,
    Array,
    /// Any JSON value, including `null`
    Any,
}

impl ValueType {
    /// Whether `value` is an instance of this type.
    pub fn accepts(&self, value: &Value) -> bool {
        match self {
            ValueType::Boolean => value.is_boolean(),
            ValueType::Number => value.is_number(),
            ValueType::String => value.is_string(),
            ValueType::Object => value.is_object(),
            ValueType::Array => value.is_array(),
            ValueType::Any => true,
        }
    }

    /// Short name for the runtime type of `value`, used in diagnostics.
    pub fn describe(value: &Value) -> &'static str {
        match value {
            Value::Null => "null",
            Value::Bool(_) => "boolean",
            Value::Number(_) => "number",
            Value::String(_) => "string",
            Value::Array(_) => "array",
            Value::Object(_) => "object",
        }
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ValueType::Boolean => "boolean",
            ValueType::Number => "number",
            ValueType::String => "string",
            ValueType::Object => "object",
            ValueType::Array => "array",
            ValueType::Any => "any",
        };
        f.write_str(name)
    }
}

/// How a method hands its result back to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "type")]
pub enum ReturnKind {
    /// Fire-and-forget: no value, no completion acknowledgment
    Void,
    /// Value returned inline; expected to be near-instant on the native side
    Sync(ValueType),
    /// Value delivered asynchronously after a round-trip to native code
    Promise(ValueType),
}

impl ReturnKind {
    pub fn is_fire_and_forget(&self) -> bool {
        matches!(self, ReturnKind::Void)
    }

    pub fn is_promise(&self) -> bool {
        matches!(self, ReturnKind::Promise(_))
    }

    /// Declared type of the returned value, if any.
    pub fn value_type(&self) -> Option<ValueType> {
        match self {
            ReturnKind::Void => None,
            ReturnKind::Sync(ty) | ReturnKind::Promise(ty) => Some(*ty),
        }
    }
}

impl fmt::Display for ReturnKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReturnKind::Void => f.write_str("void"),
            ReturnKind::Sync(ty) => write!(f, "{}", ty),
            ReturnKind::Promise(ty) => write!(f, "Promise<{}>", ty),
        }
    }
}

/// A single positional parameter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParamSpec {
    pub name: String,
    pub ty: ValueType,
    /// Whether `null` is accepted in place of a value
    #[serde(default)]
    pub nullable: bool,
}

impl ParamSpec {
    pub fn new(name: impl Into<String>, ty: ValueType) -> Self {
        Self {
            name: name.into(),
            ty,
            nullable: false,
        }
    }

    pub fn accepts(&self, value: &Value) -> bool {
        (self.nullable && value.is_null()) || self.ty.accepts(value)
    }
}

/// Signature of one contract method.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MethodSignature {
    pub name: String,
    #[serde(default)]
    pub params: Vec<ParamSpec>,
    pub returns: ReturnKind,
    /// Optional methods may be absent on the native side
    #[serde(default)]
    pub optional: bool,
}

impl MethodSignature {
    /// A required, parameterless, fire-and-forget method.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            params: Vec::new(),
            returns: ReturnKind::Void,
            optional: false,
        }
    }

    pub fn param(mut self, name: impl Into<String>, ty: ValueType) -> Self {
        self.params.push(ParamSpec::new(name, ty));
        self
    }

    pub fn nullable_param(mut self, name: impl Into<String>, ty: ValueType) -> Self {
        let mut param = ParamSpec::new(name, ty);
        param.nullable = true;
        self.params.push(param);
        self
    }

    pub fn returns(mut self, returns: ReturnKind) -> Self {
        self.returns = returns;
        self
    }

    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    pub fn arity(&self) -> usize {
        self.params.len()
    }
}

impl fmt::Display for MethodSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}(", self.name, if self.optional { "?" } else { "" })?;
        for (idx, param) in self.params.iter().enumerate() {
            if idx > 0 {
                f.write_str(", ")?;
            }
            write!(
                f,
                "{}: {}{}",
                param.name,
                if param.nullable { "?" } else { "" },
                param.ty
            )?;
        }
        write!(f, ") => {}", self.returns)
    }
}

/// Reasons a contract declaration is malformed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ContractError {
    #[error("Contract name must not be empty")]
    EmptyName,

    #[error("Contract {contract} declares a method with an empty name")]
    EmptyMethodName { contract: String },

    #[error("Contract {contract} declares method {method} more than once")]
    DuplicateMethod { contract: String, method: String },

    #[error("Contract {contract} declares event-channel method {method} as {signature}; expected one parameter and a void return")]
    MalformedEventChannel {
        contract: String,
        method: String,
        signature: String,
    },
}

/// A named, immutable set of method signatures.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapabilityContract {
    name: String,
    methods: Vec<MethodSignature>,
}

impl CapabilityContract {
    pub fn builder(name: impl Into<String>) -> ContractBuilder {
        ContractBuilder {
            name: name.into(),
            methods: Vec::new(),
        }
    }

    /// Assemble a contract from known-good parts without validation.
    ///
    /// Used for the built-in declarations, which are covered by tests.
    pub(crate) fn from_parts(name: &str, methods: Vec<MethodSignature>) -> Self {
        Self {
            name: name.to_string(),
            methods,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Methods in declaration order.
    pub fn methods(&self) -> &[MethodSignature] {
        &self.methods
    }

    pub fn method(&self, name: &str) -> Option<&MethodSignature> {
        self.methods.iter().find(|m| m.name == name)
    }

    pub fn method_names(&self) -> impl Iterator<Item = &str> {
        self.methods.iter().map(|m| m.name.as_str())
    }

    pub fn required_methods(&self) -> impl Iterator<Item = &MethodSignature> {
        self.methods.iter().filter(|m| !m.optional)
    }

    pub fn optional_methods(&self) -> impl Iterator<Item = &MethodSignature> {
        self.methods.iter().filter(|m| m.optional)
    }

    /// Check structural well-formedness.
    ///
    /// Contracts produced by [`ContractBuilder::build`] are always valid;
    /// this exists for contracts deserialized from an external declaration.
    pub fn validate(&self) -> Result<(), ContractError> {
        if self.name.trim().is_empty() {
            return Err(ContractError::EmptyName);
        }

        let mut seen = HashSet::new();
        for method in &self.methods {
            if method.name.trim().is_empty() {
                return Err(ContractError::EmptyMethodName {
                    contract: self.name.clone(),
                });
            }
            if !seen.insert(method.name.as_str()) {
                return Err(ContractError::DuplicateMethod {
                    contract: self.name.clone(),
                    method: method.name.clone(),
                });
            }
            let event_channel = method.name == ADD_LISTENER || method.name == REMOVE_LISTENERS;
            if event_channel && (method.arity() != 1 || !method.returns.is_fire_and_forget()) {
                return Err(ContractError::MalformedEventChannel {
                    contract: self.name.clone(),
                    method: method.name.clone(),
                    signature: method.to_string(),
                });
            }
        }

        Ok(())
    }
}

/// Builder for [`CapabilityContract`].
#[derive(Debug, Clone)]
pub struct ContractBuilder {
    name: String,
    methods: Vec<MethodSignature>,
}

impl ContractBuilder {
    pub fn method(mut self, signature: MethodSignature) -> Self {
        self.methods.push(signature);
        self
    }

    pub fn build(self) -> Result<CapabilityContract, ContractError> {
        let contract = CapabilityContract {
            name: self.name,
            methods: self.methods,
        };
        contract.validate()?;
        Ok(contract)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> CapabilityContract {
        CapabilityContract::builder("Sample")
            .method(MethodSignature::new("reload"))
            .method(
                MethodSignature::new("reloadWithReason")
                    .param("reason", ValueType::String)
                    .optional(),
            )
            .method(
                MethodSignature::new("fetch")
                    .param("key", ValueType::String)
                    .nullable_param("options", ValueType::Object)
                    .returns(ReturnKind::Promise(ValueType::Any)),
            )
            .build()
            .unwrap()
    }

    #[test]
    fn test_builder_preserves_declaration_order() {
        let contract = sample();
        let names: Vec<_> = contract.method_names().collect();
        assert_eq!(names, vec!["reload", "reloadWithReason", "fetch"]);
    }

    #[test]
    fn test_required_and_optional_partition() {
        let contract = sample();
        let required: Vec<_> = contract.required_methods().map(|m| m.name.as_str()).collect();
        let optional: Vec<_> = contract.optional_methods().map(|m| m.name.as_str()).collect();
        assert_eq!(required, vec!["reload", "fetch"]);
        assert_eq!(optional, vec!["reloadWithReason"]);
    }

    #[test]
    fn test_duplicate_method_rejected() {
        let err = CapabilityContract::builder("Dup")
            .method(MethodSignature::new("reload"))
            .method(MethodSignature::new("reload").optional())
            .build()
            .unwrap_err();
        assert_eq!(
            err,
            ContractError::DuplicateMethod {
                contract: "Dup".to_string(),
                method: "reload".to_string(),
            }
        );
    }

    #[test]
    fn test_event_channel_methods_take_one_argument() {
        let err = CapabilityContract::builder("Emitter")
            .method(MethodSignature::new(ADD_LISTENER))
            .build()
            .unwrap_err();
        assert!(matches!(
            err,
            ContractError::MalformedEventChannel { ref method, .. } if method == ADD_LISTENER
        ));

        let err = CapabilityContract::builder("Emitter")
            .method(
                MethodSignature::new(REMOVE_LISTENERS)
                    .param("count", ValueType::Number)
                    .returns(ReturnKind::Promise(ValueType::Any)),
            )
            .build()
            .unwrap_err();
        assert!(matches!(err, ContractError::MalformedEventChannel { .. }));

        assert!(CapabilityContract::builder("Emitter")
            .method(MethodSignature::new(ADD_LISTENER).param("eventName", ValueType::String))
            .method(MethodSignature::new(REMOVE_LISTENERS).param("count", ValueType::Number))
            .build()
            .is_ok());
    }

    #[test]
    fn test_empty_names_rejected() {
        assert_eq!(
            CapabilityContract::builder("  ").build().unwrap_err(),
            ContractError::EmptyName
        );
        assert!(matches!(
            CapabilityContract::builder("X")
                .method(MethodSignature::new(""))
                .build()
                .unwrap_err(),
            ContractError::EmptyMethodName { .. }
        ));
    }

    #[test]
    fn test_param_acceptance() {
        let contract = sample();
        let fetch = contract.method("fetch").unwrap();
        assert!(fetch.params[0].accepts(&json!("k")));
        assert!(!fetch.params[0].accepts(&Value::Null));
        assert!(fetch.params[1].accepts(&Value::Null));
        assert!(fetch.params[1].accepts(&json!({"a": 1})));
        assert!(!fetch.params[1].accepts(&json!([1])));
    }

    #[test]
    fn test_signature_display() {
        let contract = sample();
        assert_eq!(contract.method("reload").unwrap().to_string(), "reload() => void");
        assert_eq!(
            contract.method("reloadWithReason").unwrap().to_string(),
            "reloadWithReason?(reason: string) => void"
        );
        assert_eq!(
            contract.method("fetch").unwrap().to_string(),
            "fetch(key: string, options: ?object) => Promise<any>"
        );
    }

    #[test]
    fn test_deserialized_contract_is_validated() {
        let raw = json!({
            "name": "FromJson",
            "methods": [
                { "name": "ping", "returns": { "kind": "Void" } },
                { "name": "ping", "returns": { "kind": "Sync", "type": "Boolean" } }
            ]
        });
        let contract: CapabilityContract = serde_json::from_value(raw).unwrap();
        assert!(matches!(
            contract.validate(),
            Err(ContractError::DuplicateMethod { .. })
        ));
    }
}
