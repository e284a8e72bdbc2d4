use crate::url::netloc;
use crate::ConfigError;
use std::collections::HashSet;
use url::Url;

/// The set of network locations a crawl is allowed to expand into
///
/// Built once from the configured allow-list of base URLs and immutable for
/// the lifetime of the run. A discovered link is in scope iff its netloc is a
/// member of this set; the scheme and path of the allow-list entries are
/// ignored.
#[derive(Debug, Clone)]
pub struct ScopeSet {
    netlocs: HashSet<String>,
}

impl ScopeSet {
    /// Builds the scope set from allow-list base URLs
    ///
    /// # Arguments
    ///
    /// * `allowed` - Base URLs whose network locations define the scope
    ///
    /// # Returns
    ///
    /// * `Ok(ScopeSet)` - Every entry parsed and had a host
    /// * `Err(ConfigError)` - An entry was unparseable or host-less
    pub fn from_allowed<S: AsRef<str>>(allowed: &[S]) -> Result<Self, ConfigError> {
        let mut netlocs = HashSet::new();
        for entry in allowed {
            let entry = entry.as_ref();
            let url = Url::parse(entry)
                .map_err(|e| ConfigError::InvalidUrl(format!("{} ({})", entry, e)))?;
            let loc = netloc(&url).ok_or_else(|| {
                ConfigError::InvalidUrl(format!("{} (no host component)", entry))
            })?;
            netlocs.insert(loc);
        }
        Ok(Self { netlocs })
    }

    /// Returns true if the URL's network location is in scope
    pub fn contains(&self, url: &Url) -> bool {
        match netloc(url) {
            Some(loc) => self.netlocs.contains(&loc),
            None => false,
        }
    }

    /// Number of distinct network locations in scope
    pub fn len(&self) -> usize {
        self.netlocs.len()
    }

    /// Returns true if no network locations are in scope
    pub fn is_empty(&self) -> bool {
        self.netlocs.is_empty()
    }

    /// Iterates the network locations (for diagnostics output)
    pub fn netlocs(&self) -> impl Iterator<Item = &str> {
        self.netlocs.iter().map(String::as_str)
    }
}
