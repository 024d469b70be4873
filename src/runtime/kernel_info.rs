//! Kernel description for notebook front ends

use serde::Serialize;

use crate::runtime::RUNTIME_VERSION;
use crate::VERSION;

/// Jupyter messaging protocol version the results are shaped for.
pub const PROTOCOL_VERSION: &str = "5.3";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct KernelInfo {
    pub protocol_version: String,
    pub implementation: String,
    pub implementation_version: String,
    pub banner: String,
    pub language_info: LanguageInfo,
    pub help_links: Vec<HelpLink>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LanguageInfo {
    pub name: String,
    pub version: String,
    pub file_extension: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HelpLink {
    pub text: String,
    pub url: String,
}

impl KernelInfo {
    pub fn current() -> Self {
        Self {
            protocol_version: PROTOCOL_VERSION.to_string(),
            implementation: "ipylua".to_string(),
            implementation_version: VERSION.to_string(),
            banner: format!("Lua kernel: ipylua - v{} ({})", VERSION, RUNTIME_VERSION),
            language_info: LanguageInfo {
                name: "lua".to_string(),
                version: RUNTIME_VERSION.trim_start_matches("Lua ").to_string(),
                file_extension: ".lua".to_string(),
            },
            help_links: vec![HelpLink {
                text: "Lua 5.4 Reference Manual".to_string(),
                url: "https://www.lua.org/manual/5.4/".to_string(),
            }],
        }
    }
}
