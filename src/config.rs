//! Configuration file and per-blog settings resolution.
//!
//! ```toml
//! [global]
//! default = "example"
//!
//! [site.test]
//! url = "http://example.com/mt/mt-xmlrpc.cgi"
//! username = "foo"
//! password = "bar"
//!
//! [blog.example]
//! site = "test"
//! blogid = 3
//! ```
//!
//! A setting is looked up in the blog's table, then its site's table, then
//! `[global]`; the first hit wins.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use directories::BaseDirs;
use serde::Deserialize;

use crate::error::{Error, Result};

/// File name looked up in the home directory when `-c` is not given.
pub const CONFIG_FILE_NAME: &str = ".mtpost.toml";

type Table = BTreeMap<String, toml::Value>;

/// The parsed configuration file.
#[derive(Debug, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub global: Table,
    #[serde(default)]
    pub site: BTreeMap<String, Table>,
    #[serde(default)]
    pub blog: BTreeMap<String, Table>,
}

impl Config {
    /// `$HOME/.mtpost.toml`
    pub fn default_path() -> Result<PathBuf> {
        BaseDirs::new()
            .map(|dirs| dirs.home_dir().join(CONFIG_FILE_NAME))
            .ok_or_else(|| Error::Config("Cannot determine the home directory".to_string()))
    }

    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!(
                "Configuration file \"{}\" is not readable: {}",
                path.display(),
                e
            ))
        })?;

        Self::parse(&content).map_err(|e| {
            Error::Config(format!("Failed to parse \"{}\": {}", path.display(), e))
        })
    }

    /// Parse configuration text.
    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::Config(e.to_string()))
    }

    /// Resolve the settings for one blog.
    ///
    /// # Arguments
    ///
    /// * `alias` - Blog alias from the command line; `[global] default` is
    ///   used when absent.
    /// * `site` - Explicit site name. When given, no blog alias is needed and
    ///   the blog layer is only consulted if an alias resolves.
    pub fn profile(&self, alias: Option<&str>, site: Option<&str>) -> Result<Profile<'_>> {
        let global_default = self.global.get("default").and_then(scalar);
        let alias = alias.map(str::to_string).or(global_default);

        let blog = match (&alias, site) {
            (Some(alias), _) => match self.blog.get(alias) {
                Some(table) => Some(table),
                None if site.is_some() => None,
                None => {
                    return Err(Error::Config(format!(
                        "Blog alias \"{}\" has no [blog.{}] section",
                        alias, alias
                    )));
                }
            },
            (None, Some(_)) => None,
            (None, None) => {
                return Err(Error::Config(
                    "Blog alias has not been specified.".to_string(),
                ));
            }
        };

        let site_name = match site {
            Some(site) => site.to_string(),
            None => blog
                .and_then(|table| table.get("site"))
                .and_then(scalar)
                .ok_or_else(|| {
                    Error::Config(format!(
                        "Blog \"{}\" does not name its site",
                        alias.as_deref().unwrap_or_default()
                    ))
                })?,
        };

        let site_table = self.site.get(&site_name).ok_or_else(|| {
            Error::Config(format!("Site \"{}\" has no [site.{}] section", site_name, site_name))
        })?;

        Ok(Profile {
            alias,
            site: site_name,
            blog,
            site_table,
            global: &self.global,
        })
    }
}

/// Settings for one blog, layered blog > site > global.
#[derive(Debug)]
pub struct Profile<'a> {
    alias: Option<String>,
    site: String,
    blog: Option<&'a Table>,
    site_table: &'a Table,
    global: &'a Table,
}

impl Profile<'_> {
    pub fn alias(&self) -> Option<&str> {
        self.alias.as_deref()
    }

    pub fn site(&self) -> &str {
        &self.site
    }

    fn from_blog(&self, key: &str) -> Option<String> {
        self.blog.and_then(|table| table.get(key)).and_then(scalar)
    }

    fn from_site(&self, key: &str) -> Option<String> {
        self.site_table.get(key).and_then(scalar)
    }

    fn from_global(&self, key: &str) -> Option<String> {
        self.global.get(key).and_then(scalar)
    }

    /// Look a setting up, most specific layer first.
    pub fn get(&self, key: &str) -> Option<String> {
        self.from_blog(key)
            .or_else(|| self.from_site(key))
            .or_else(|| self.from_global(key))
    }

    /// Like [`Profile::get`], but a missing setting is an error.
    pub fn require(&self, key: &str) -> Result<String> {
        self.get(key).ok_or_else(|| {
            Error::Config(format!(
                "Setting \"{}\" is missing for site \"{}\"",
                key, self.site
            ))
        })
    }

    pub fn url(&self) -> Result<String> {
        self.require("url")
    }

    pub fn username(&self) -> Result<String> {
        self.require("username")
    }

    pub fn password(&self) -> Result<String> {
        self.require("password")
    }
}

fn scalar(value: &toml::Value) -> Option<String> {
    match value {
        toml::Value::String(s) => Some(s.clone()),
        toml::Value::Integer(i) => Some(i.to_string()),
        toml::Value::Float(f) => Some(f.to_string()),
        toml::Value::Boolean(b) => Some(b.to_string()),
        _ => None,
    }
}
