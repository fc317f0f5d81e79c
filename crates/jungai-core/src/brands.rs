use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::ConfigError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrandConfig {
    pub name: String,
    #[serde(default)]
    pub aliases: Vec<String>,
    #[serde(default)]
    pub domains: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct BrandsFile {
    pub brands: Vec<BrandConfig>,
}

impl BrandsFile {
    /// Find a configured brand by name or slug (case-insensitive).
    #[must_use]
    pub fn find(&self, name_or_slug: &str) -> Option<&BrandConfig> {
        let wanted = slugify(name_or_slug);
        self.brands.iter().find(|b| slugify(&b.name) == wanted)
    }
}

/// The brand under analysis for one pipeline run.
///
/// Built once from config or command input and never changed afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BrandQuery {
    name: String,
    aliases: Vec<String>,
    domains: Vec<String>,
}

impl BrandQuery {
    /// A query with no aliases or domains.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into().trim().to_string(),
            aliases: Vec::new(),
            domains: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_aliases(mut self, aliases: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.aliases = clean_list(aliases);
        self
    }

    #[must_use]
    pub fn with_domains(mut self, domains: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.domains = clean_list(domains);
        self
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn aliases(&self) -> &[String] {
        &self.aliases
    }

    #[must_use]
    pub fn domains(&self) -> &[String] {
        &self.domains
    }

    /// URL-safe slug of the brand name, used as a log and lookup key.
    #[must_use]
    pub fn slug(&self) -> String {
        slugify(&self.name)
    }

    /// Name followed by aliases, case-insensitively de-duplicated.
    #[must_use]
    pub fn terms(&self) -> Vec<&str> {
        let mut seen = HashSet::new();
        std::iter::once(self.name.as_str())
            .chain(self.aliases.iter().map(String::as_str))
            .filter(|t| seen.insert(t.to_lowercase()))
            .collect()
    }
}

impl From<&BrandConfig> for BrandQuery {
    fn from(config: &BrandConfig) -> Self {
        BrandQuery::new(config.name.clone())
            .with_aliases(config.aliases.iter().cloned())
            .with_domains(config.domains.iter().cloned())
    }
}

fn clean_list(items: impl IntoIterator<Item = impl Into<String>>) -> Vec<String> {
    items
        .into_iter()
        .map(|s| s.into().trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

/// Generate a URL-safe slug: lower-case ASCII alphanumerics joined by dashes.
#[must_use]
pub fn slugify(name: &str) -> String {
    name.to_lowercase()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' {
                c
            } else if c == ' ' {
                '-'
            } else {
                '\0'
            }
        })
        .filter(|&c| c != '\0')
        .collect::<String>()
        .split('-')
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("-")
}

/// Load and validate the brands configuration from a YAML file.
///
/// # Errors
///
/// Returns `ConfigError` if the file cannot be read, parsed, or fails validation.
pub fn load_brands(path: &Path) -> Result<BrandsFile, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::BrandsFileIo {
        path: path.display().to_string(),
        source: e,
    })?;

    let brands_file: BrandsFile =
        serde_yaml::from_str(&content).map_err(ConfigError::BrandsFileParse)?;

    validate_brands(&brands_file)?;

    Ok(brands_file)
}

fn validate_brands(brands_file: &BrandsFile) -> Result<(), ConfigError> {
    let mut seen_slugs = HashSet::new();

    for brand in &brands_file.brands {
        if brand.name.trim().is_empty() {
            return Err(ConfigError::Validation(
                "brand name must be non-empty".to_string(),
            ));
        }

        let slug = slugify(&brand.name);
        if slug.is_empty() {
            return Err(ConfigError::Validation(format!(
                "brand '{}' has no ASCII letters or digits to build a slug from",
                brand.name
            )));
        }

        if !seen_slugs.insert(slug.clone()) {
            return Err(ConfigError::Validation(format!(
                "duplicate brand slug: '{}' (from brand '{}')",
                slug, brand.name
            )));
        }

        if brand.aliases.iter().any(|a| a.trim().is_empty()) {
            return Err(ConfigError::Validation(format!(
                "brand '{}' has an empty alias",
                brand.name
            )));
        }

        if let Some(bad) = brand
            .domains
            .iter()
            .find(|d| d.trim().is_empty() || d.contains('/') || d.contains(' '))
        {
            return Err(ConfigError::Validation(format!(
                "brand '{}' has invalid domain '{}'; use a bare host such as example.com",
                brand.name, bad
            )));
        }
    }

    Ok(())
}

#[cfg(test)]
#[path = "brands_test.rs"]
mod tests;
