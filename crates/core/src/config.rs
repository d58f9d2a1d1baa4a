//! Core runtime configuration.
//!
//! This module defines configuration that should be resolved once at process startup and then
//! passed into core services. Request handling never reads process-wide environment variables,
//! which keeps behaviour consistent in multi-threaded runtimes and test harnesses.
//!
//! The `*_from_env_value` helpers take the raw variable value so they can be tested without
//! touching the environment; [`CoreConfig::from_env`] composes them.

use crate::constants::{
    DEFAULT_BUSY_TIMEOUT_MS, DEFAULT_DATABASE_PATH, DEFAULT_NPA, DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE,
};
use crate::validation::validate_npa_code;
use crate::{CoreError, CoreResult};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Core configuration resolved at startup.
#[derive(Clone, Debug)]
pub struct CoreConfig {
    database_path: PathBuf,
    pagination: PaginationConfig,
    busy_timeout: Duration,
    npa_catalogue: NpaCatalogue,
}

impl CoreConfig {
    /// Create a new `CoreConfig` with default pagination and busy timeout.
    pub fn new(database_path: PathBuf, npa_catalogue: NpaCatalogue) -> Self {
        Self {
            database_path,
            pagination: PaginationConfig::default(),
            busy_timeout: Duration::from_millis(DEFAULT_BUSY_TIMEOUT_MS),
            npa_catalogue,
        }
    }

    pub fn with_pagination(mut self, pagination: PaginationConfig) -> Self {
        self.pagination = pagination;
        self
    }

    pub fn with_busy_timeout(mut self, busy_timeout: Duration) -> Self {
        self.busy_timeout = busy_timeout;
        self
    }

    /// Resolve the configuration from `LAWMARK_*` environment variables.
    ///
    /// Call this once at startup.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::InvalidInput` for unparsable values, and catalogue errors if
    /// `LAWMARK_NPA_FILE` cannot be read or parsed.
    pub fn from_env() -> CoreResult<Self> {
        let var = |name: &str| std::env::var(name).ok();

        let database_path = var("LAWMARK_DATABASE")
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| DEFAULT_DATABASE_PATH.into());

        let npa_catalogue = match var("LAWMARK_NPA_FILE").filter(|v| !v.trim().is_empty()) {
            Some(path) => NpaCatalogue::load(Path::new(path.trim()))?,
            None => NpaCatalogue::builtin(),
        };

        let pagination = PaginationConfig::new(
            page_size_from_env_value(var("LAWMARK_PAGE_SIZE"), DEFAULT_PAGE_SIZE)?,
            page_size_from_env_value(var("LAWMARK_MAX_PAGE_SIZE"), MAX_PAGE_SIZE)?,
            bool_from_env_value(var("LAWMARK_PAGINATE"), true)?,
        )?;

        let busy_timeout = millis_from_env_value(
            var("LAWMARK_BUSY_TIMEOUT_MS"),
            Duration::from_millis(DEFAULT_BUSY_TIMEOUT_MS),
        )?;

        Ok(Self::new(PathBuf::from(database_path), npa_catalogue)
            .with_pagination(pagination)
            .with_busy_timeout(busy_timeout))
    }

    pub fn database_path(&self) -> &Path {
        &self.database_path
    }

    pub fn pagination(&self) -> &PaginationConfig {
        &self.pagination
    }

    pub fn busy_timeout(&self) -> Duration {
        self.busy_timeout
    }

    pub fn npa_catalogue(&self) -> &NpaCatalogue {
        &self.npa_catalogue
    }
}

/// Page-size policy for listings and search.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PaginationConfig {
    default_page_size: u32,
    max_page_size: u32,
    enabled: bool,
}

impl PaginationConfig {
    /// # Errors
    ///
    /// Returns `CoreError::InvalidInput` if either size is zero or the default exceeds the
    /// maximum.
    pub fn new(default_page_size: u32, max_page_size: u32, enabled: bool) -> CoreResult<Self> {
        if default_page_size == 0 || max_page_size == 0 {
            return Err(CoreError::InvalidInput(
                "page sizes must be greater than zero".into(),
            ));
        }
        if default_page_size > max_page_size {
            return Err(CoreError::InvalidInput(format!(
                "default page size {} exceeds maximum page size {}",
                default_page_size, max_page_size
            )));
        }
        Ok(Self {
            default_page_size,
            max_page_size,
            enabled,
        })
    }

    pub fn default_page_size(&self) -> u32 {
        self.default_page_size
    }

    pub fn max_page_size(&self) -> u32 {
        self.max_page_size
    }

    /// When `false`, search returns the whole filtered set without page metadata.
    pub fn enabled(&self) -> bool {
        self.enabled
    }
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self {
            default_page_size: DEFAULT_PAGE_SIZE,
            max_page_size: MAX_PAGE_SIZE,
            enabled: true,
        }
    }
}

/// One normative-act source: a stable code and its human-readable name.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NpaEntry {
    pub code: String,
    pub name: String,
}

/// The closed NPA vocabulary a document's `NPA` label must come from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NpaCatalogue {
    entries: Vec<NpaEntry>,
}

impl NpaCatalogue {
    /// Builds a catalogue, validating every code.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::InvalidInput` if a code is malformed or duplicated, or if the
    /// catalogue lacks the default code `NOTSELECTED`.
    pub fn new(entries: Vec<NpaEntry>) -> CoreResult<Self> {
        let mut seen = HashSet::new();
        for entry in &entries {
            validate_npa_code(&entry.code)?;
            if !seen.insert(entry.code.to_ascii_lowercase()) {
                return Err(CoreError::InvalidInput(format!(
                    "duplicate NPA code '{}'",
                    entry.code
                )));
            }
        }
        if !entries.iter().any(|e| e.code == DEFAULT_NPA) {
            return Err(CoreError::InvalidInput(format!(
                "NPA catalogue must contain the default code '{}'",
                DEFAULT_NPA
            )));
        }
        Ok(Self { entries })
    }

    /// The catalogue used when no `LAWMARK_NPA_FILE` is configured.
    pub fn builtin() -> Self {
        let entries = [
            (DEFAULT_NPA, "Не выбрано"),
            ("CONSTITUTION", "Конституция Российской Федерации"),
            ("FKZ", "Федеральный конституционный закон"),
            ("FZ", "Федеральный закон"),
            ("CODEX", "Кодекс"),
            ("DECREE", "Указ Президента"),
            ("RESOLUTION", "Постановление Правительства"),
            ("ORDER", "Приказ федерального органа исполнительной власти"),
            ("REGIONAL", "Закон субъекта Российской Федерации"),
            ("MUNICIPAL", "Муниципальный правовой акт"),
            ("OTHER", "Иное"),
        ]
        .into_iter()
        .map(|(code, name)| NpaEntry {
            code: code.into(),
            name: name.into(),
        })
        .collect();

        Self { entries }
    }

    /// Parses a YAML sequence of `{code, name}` mappings.
    pub fn from_yaml(yaml_text: &str) -> CoreResult<Self> {
        let entries: Vec<NpaEntry> =
            serde_yaml::from_str(yaml_text).map_err(CoreError::CatalogueParse)?;
        Self::new(entries)
    }

    pub fn load(path: &Path) -> CoreResult<Self> {
        let yaml_text = std::fs::read_to_string(path).map_err(CoreError::CatalogueRead)?;
        Self::from_yaml(&yaml_text)
    }

    pub fn entries(&self) -> &[NpaEntry] {
        &self.entries
    }

    pub fn contains(&self, code: &str) -> bool {
        self.entries.iter().any(|e| e.code == code)
    }

    /// Checks that `code` names a catalogue entry.
    pub fn validate(&self, code: &str) -> CoreResult<()> {
        if self.contains(code) {
            Ok(())
        } else {
            Err(CoreError::InvalidInput(format!("unknown NPA code '{}'", code)))
        }
    }
}

/// Parse a page size, falling back to `default` when unset or blank.
pub fn page_size_from_env_value(value: Option<String>, default: u32) -> CoreResult<u32> {
    let Some(value) = value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty()) else {
        return Ok(default);
    };
    match value.parse::<u32>() {
        Ok(size) if size > 0 => Ok(size),
        _ => Err(CoreError::InvalidInput(format!(
            "page size must be a positive integer, got '{}'",
            value
        ))),
    }
}

/// Parse a boolean flag (`true/false`, `1/0`, `yes/no`, `on/off`).
pub fn bool_from_env_value(value: Option<String>, default: bool) -> CoreResult<bool> {
    let Some(value) = value.map(|v| v.trim().to_ascii_lowercase()).filter(|v| !v.is_empty())
    else {
        return Ok(default);
    };
    match value.as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        other => Err(CoreError::InvalidInput(format!(
            "expected a boolean flag, got '{}'",
            other
        ))),
    }
}

/// Parse a duration given in milliseconds.
pub fn millis_from_env_value(value: Option<String>, default: Duration) -> CoreResult<Duration> {
    let Some(value) = value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty()) else {
        return Ok(default);
    };
    value
        .parse::<u64>()
        .map(Duration::from_millis)
        .map_err(|_| {
            CoreError::InvalidInput(format!(
                "expected a duration in milliseconds, got '{}'",
                value
            ))
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_size_from_env_value_defaults_when_unset_or_blank() {
        assert_eq!(page_size_from_env_value(None, 25).unwrap(), 25);
        assert_eq!(page_size_from_env_value(Some("  ".into()), 25).unwrap(), 25);
        assert_eq!(page_size_from_env_value(Some(" 40 ".into()), 25).unwrap(), 40);
    }

    #[test]
    fn test_page_size_from_env_value_rejects_zero_and_garbage() {
        assert!(page_size_from_env_value(Some("0".into()), 25).is_err());
        assert!(page_size_from_env_value(Some("-3".into()), 25).is_err());
        assert!(page_size_from_env_value(Some("many".into()), 25).is_err());
    }

    #[test]
    fn test_bool_from_env_value() {
        assert!(bool_from_env_value(None, true).unwrap());
        assert!(!bool_from_env_value(Some("OFF".into()), true).unwrap());
        assert!(bool_from_env_value(Some("1".into()), false).unwrap());
        assert!(bool_from_env_value(Some("maybe".into()), false).is_err());
    }

    #[test]
    fn test_millis_from_env_value() {
        assert_eq!(
            millis_from_env_value(Some("250".into()), Duration::ZERO).unwrap(),
            Duration::from_millis(250)
        );
        assert!(millis_from_env_value(Some("soon".into()), Duration::ZERO).is_err());
    }

    #[test]
    fn test_pagination_config_rejects_default_above_max() {
        assert!(PaginationConfig::new(50, 10, true).is_err());
        assert!(PaginationConfig::new(0, 10, true).is_err());
        assert!(PaginationConfig::new(10, 10, false).is_ok());
    }

    #[test]
    fn test_builtin_catalogue_is_valid() {
        let builtin = NpaCatalogue::builtin();
        let rebuilt =
            NpaCatalogue::new(builtin.entries().to_vec()).expect("builtin should validate");
        assert!(rebuilt.contains(DEFAULT_NPA));
    }

    #[test]
    fn test_catalogue_from_yaml() {
        let yaml =
            "- code: NOTSELECTED\n  name: Не выбрано\n- code: FZ\n  name: Федеральный закон\n";
        let catalogue = NpaCatalogue::from_yaml(yaml).expect("catalogue should parse");
        assert_eq!(catalogue.entries().len(), 2);
        assert!(catalogue.validate("FZ").is_ok());
        assert!(matches!(
            catalogue.validate("fz"),
            Err(CoreError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_catalogue_requires_default_code() {
        let yaml = "- code: FZ\n  name: Федеральный закон\n";
        assert!(matches!(
            NpaCatalogue::from_yaml(yaml),
            Err(CoreError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_catalogue_rejects_duplicates_and_unknown_keys() {
        let duplicate = "- code: NOTSELECTED\n  name: a\n- code: notselected\n  name: b\n";
        assert!(NpaCatalogue::from_yaml(duplicate).is_err());

        let unknown_key = "- code: NOTSELECTED\n  name: a\n  extra: 1\n";
        assert!(matches!(
            NpaCatalogue::from_yaml(unknown_key),
            Err(CoreError::CatalogueParse(_))
        ));
    }
}
