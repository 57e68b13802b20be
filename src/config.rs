// SPDX-FileCopyrightText: 2025 Alexandre Gomes Gaigalas <alganet@gmail.com>
//
// SPDX-License-Identifier: ISC

//! Configuration loading.

use crate::mask::{MaskRules, DEFAULT_MASK_TOKEN};
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct GeneralConfig {
    /// Decode-layer executable.
    #[serde(default = "default_tshark")]
    pub tshark: String,

    /// Extra TCP ports decoded as HTTP.
    #[serde(default)]
    pub decode_ports: Vec<u16>,

    /// Keep only exchanges where the request or response is `application/json`.
    #[serde(default = "default_content_type_filter")]
    pub content_type_filter: bool,

    /// Append to the output file instead of truncating it.
    #[serde(default)]
    pub append: bool,
}

fn default_tshark() -> String {
    "tshark".to_string()
}

fn default_content_type_filter() -> bool {
    true
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            tshark: default_tshark(),
            decode_ports: Vec::new(),
            content_type_filter: default_content_type_filter(),
            append: false,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct MaskingConfig {
    /// Masked names in addition to the built-in ones.
    #[serde(default)]
    pub keys: Vec<String>,

    #[serde(default = "default_token")]
    pub token: String,
}

fn default_token() -> String {
    DEFAULT_MASK_TOKEN.to_string()
}

impl Default for MaskingConfig {
    fn default() -> Self {
        Self {
            keys: Vec::new(),
            token: default_token(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub general: GeneralConfig,

    #[serde(default)]
    pub masking: MaskingConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    ///
    /// ```toml
    /// [general]
    /// decode_ports = [8080]
    /// content_type_filter = false
    ///
    /// [masking]
    /// keys = ["pin", "cvv"]
    /// token = "[redacted]"
    /// ```
    pub async fn load_from_path<P: AsRef<std::path::Path>>(path: P) -> anyhow::Result<Self> {
        let path_ref = path.as_ref();
        let s = tokio::fs::read_to_string(path_ref).await?;
        let cfg: Self = toml::from_str(&s)?;
        if cfg.masking.token.is_empty() {
            anyhow::bail!("masking.token must not be empty");
        }
        Ok(cfg)
    }

    pub fn mask_rules(&self) -> MaskRules {
        MaskRules::with_extra_keys(&self.masking.keys, &self.masking.token)
    }
}
