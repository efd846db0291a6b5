//! Normalizes the module and ABI shapes returned by the v2 and v3 account APIs.

use crate::types::is_signer_tag;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Module names some endpoints emit as pagination or wrapper artefacts.
const IGNORED_MODULE_NAMES: &[&str] = &["", "Unknown", "cursor", "modules"];

const DEMO_MODULES: &[&str] = &[
    "auto_incr",
    "auto_counter",
    "auto_topup",
    "dice_roll",
    "HelloWorld",
    "Counter",
];

/// Where a listing came from. Anything other than `Live` must be shown as such.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataSource {
    Live,
    Demo,
    Fallback,
}

impl fmt::Display for DataSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            DataSource::Live => "live",
            DataSource::Demo => "demo",
            DataSource::Fallback => "fallback",
        };
        write!(f, "{}", s)
    }
}

/// A list of items tagged with the source it was produced from.
#[derive(Debug, Clone, PartialEq)]
pub struct Listing<T> {
    pub items: Vec<T>,
    pub source: DataSource,
}

impl<T> Listing<T> {
    pub fn live(items: Vec<T>) -> Self {
        Self {
            items,
            source: DataSource::Live,
        }
    }

    pub fn demo(items: Vec<T>) -> Self {
        Self {
            items,
            source: DataSource::Demo,
        }
    }

    pub fn fallback(items: Vec<T>) -> Self {
        Self {
            items,
            source: DataSource::Fallback,
        }
    }

    pub fn is_live(&self) -> bool {
        self.source == DataSource::Live
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ModuleSummary {
    pub name: String,
    pub raw: Value,
}

/// An entry function with the implicit signer parameter already removed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionDescriptor {
    pub name: String,
    pub parameter_type_tags: Vec<String>,
    pub generic_parameter_count: usize,
    pub is_entry: bool,
}

impl FunctionDescriptor {
    /// `name<T0, T1>(u64, address)` style rendering for listings.
    pub fn signature(&self) -> String {
        let generics = if self.generic_parameter_count > 0 {
            let names: Vec<String> = (0..self.generic_parameter_count)
                .map(|i| format!("T{}", i))
                .collect();
            format!("<{}>", names.join(", "))
        } else {
            String::new()
        };
        format!(
            "{}{}({})",
            self.name,
            generics,
            self.parameter_type_tags.join(", ")
        )
    }
}

/// Returns the module collection in priority order: bare array, `data`, `modules`.
fn module_collection(raw: &Value) -> &[Value] {
    if let Some(arr) = raw.as_array() {
        return arr;
    }
    for key in ["data", "modules"] {
        if let Some(arr) = raw.get(key).and_then(Value::as_array) {
            return arr;
        }
    }
    &[]
}

pub fn list_modules(raw: &Value) -> Vec<ModuleSummary> {
    module_collection(raw)
        .iter()
        .enumerate()
        .map(|(i, entry)| {
            let name = entry
                .as_str()
                .or_else(|| entry.pointer("/abi/name").and_then(Value::as_str))
                .map(str::to_string)
                .unwrap_or_else(|| format!("Module_{}", i + 1));
            ModuleSummary {
                name,
                raw: entry.clone(),
            }
        })
        .collect()
}

/// Drops wrapper artefacts such as `cursor` that are not real modules.
pub fn retain_named_modules(modules: Vec<ModuleSummary>) -> Vec<ModuleSummary> {
    modules
        .into_iter()
        .filter(|m| !IGNORED_MODULE_NAMES.contains(&m.name.as_str()))
        .collect()
}

/// Finds a module in a full listing by its `name` or `abi.name`.
pub fn find_module(raw_list: &Value, module_name: &str) -> Option<Value> {
    module_collection(raw_list)
        .iter()
        .find(|entry| {
            entry.get("name").and_then(Value::as_str) == Some(module_name)
                || entry.pointer("/abi/name").and_then(Value::as_str) == Some(module_name)
        })
        .cloned()
}

/// Unwraps the ABI from a single-module response.
pub fn extract_abi(raw: &Value) -> &Value {
    if let Some(abi) = raw.get("abi").filter(|v| v.is_object()) {
        return abi;
    }
    if let Some(abi) = raw.pointer("/module/abi").filter(|v| v.is_object()) {
        return abi;
    }
    raw
}

fn function_collection(abi: &Value) -> &[Value] {
    if let Some(arr) = abi.get("exposed_functions").and_then(Value::as_array) {
        return arr;
    }
    if let Some(arr) = abi.as_array() {
        return arr;
    }
    abi.get("functions")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or(&[])
}

fn parameter_tags(function: &Value) -> Vec<String> {
    let raw_params = ["params", "parameters", "arguments"]
        .iter()
        .filter_map(|key| function.get(*key).and_then(Value::as_array))
        .find(|arr| !arr.is_empty())
        .map(Vec::as_slice)
        .unwrap_or(&[]);

    let mut tags: Vec<String> = raw_params
        .iter()
        .filter_map(|p| {
            p.as_str()
                .or_else(|| p.get("type").and_then(Value::as_str))
                .map(str::to_string)
        })
        .collect();

    if tags.first().map(|t| is_signer_tag(t)).unwrap_or(false) {
        tags.remove(0);
    }
    tags
}

fn generic_count(function: &Value) -> usize {
    match function.get("generic_type_params") {
        Some(Value::Array(arr)) => arr.len(),
        Some(Value::Number(n)) => n.as_u64().unwrap_or(0) as usize,
        _ => 0,
    }
}

/// Entry functions only: anything whose `is_entry` is not exactly `true` is dropped.
pub fn list_entry_functions(abi: &Value) -> Vec<FunctionDescriptor> {
    function_collection(abi)
        .iter()
        .filter(|f| f.get("is_entry") == Some(&Value::Bool(true)))
        .filter_map(|f| {
            let name = f.get("name").and_then(Value::as_str)?;
            Some(FunctionDescriptor {
                name: name.to_string(),
                parameter_type_tags: parameter_tags(f),
                generic_parameter_count: generic_count(f),
                is_entry: true,
            })
        })
        .collect()
}

pub fn demo_modules() -> Listing<ModuleSummary> {
    Listing::demo(
        DEMO_MODULES
            .iter()
            .map(|name| ModuleSummary {
                name: name.to_string(),
                raw: Value::String(name.to_string()),
            })
            .collect(),
    )
}

pub fn demo_functions() -> Listing<FunctionDescriptor> {
    Listing::demo(vec![
        FunctionDescriptor {
            name: "execute".to_string(),
            parameter_type_tags: Vec::new(),
            generic_parameter_count: 0,
            is_entry: true,
        },
        FunctionDescriptor {
            name: "process".to_string(),
            parameter_type_tags: vec!["u64".to_string()],
            generic_parameter_count: 0,
            is_entry: true,
        },
    ])
}
