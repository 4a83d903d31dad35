//! Optional RON settings file. Every field may be left out; present fields
//! override the built-in defaults and are in turn overridden by CLI flags.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use mediaharvest_engine::HarvestConfig;
use serde::Deserialize;
use url::Url;

use crate::cli::ConfigError;

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    pub output: Option<PathBuf>,
    pub count: Option<i64>,
    pub base_url: Option<String>,
    pub max_pages: Option<u32>,
    pub fetch: FetchSection,
    pub page: PageSection,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FetchSection {
    pub connect_timeout_secs: Option<u64>,
    pub request_timeout_secs: Option<u64>,
    pub redirect_limit: Option<usize>,
    pub max_page_bytes: Option<u64>,
    pub max_media_bytes: Option<u64>,
    pub page_content_types: Option<Vec<String>>,
    pub media_content_types: Option<Vec<String>>,
    pub user_agent: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PageSection {
    pub image_selector: Option<String>,
    pub page_param: Option<String>,
}

pub fn load_file_config(path: &Path) -> Result<FileConfig, ConfigError> {
    let content = fs::read_to_string(path).map_err(|source| ConfigError::ReadFile {
        path: path.to_path_buf(),
        source,
    })?;
    ron::from_str(&content).map_err(|source| ConfigError::ParseFile {
        path: path.to_path_buf(),
        source,
    })
}

impl FileConfig {
    /// Copies every present field onto `config`. `count` is validated with the
    /// CLI value, so it is left to the caller.
    pub fn apply_to(&self, config: &mut HarvestConfig) -> Result<(), ConfigError> {
        if let Some(output) = &self.output {
            config.output_dir = output.clone();
        }
        if let Some(raw) = &self.base_url {
            config.base_url = Url::parse(raw).map_err(|source| ConfigError::BaseUrl {
                value: raw.clone(),
                source,
            })?;
        }
        if self.max_pages.is_some() {
            config.max_pages = self.max_pages;
        }

        let fetch = &mut config.fetch;
        if let Some(secs) = self.fetch.connect_timeout_secs {
            fetch.connect_timeout = Duration::from_secs(secs);
        }
        if let Some(secs) = self.fetch.request_timeout_secs {
            fetch.request_timeout = Duration::from_secs(secs);
        }
        if let Some(limit) = self.fetch.redirect_limit {
            fetch.redirect_limit = limit;
        }
        if let Some(max) = self.fetch.max_page_bytes {
            fetch.max_page_bytes = max;
        }
        if let Some(max) = self.fetch.max_media_bytes {
            fetch.max_media_bytes = max;
        }
        if let Some(types) = &self.fetch.page_content_types {
            fetch.page_content_types = types.clone();
        }
        if let Some(types) = &self.fetch.media_content_types {
            fetch.media_content_types = types.clone();
        }
        if let Some(agent) = &self.fetch.user_agent {
            fetch.user_agent = agent.clone();
        }

        if let Some(selector) = &self.page.image_selector {
            config.page.image_selector = selector.clone();
        }
        if let Some(param) = &self.page.page_param {
            config.page.page_param = param.clone();
        }
        Ok(())
    }
}
