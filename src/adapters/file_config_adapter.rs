//! INI configuration with environment overrides.
//!
//! A variable named `MACROSS__<SECTION>__<KEY>` replaces the file value for
//! that key, so secrets such as `MACROSS__ALPHA_VANTAGE__API_KEY` can stay
//! out of the file. Every lookup is trimmed and a blank value reads as unset.

use configparser::ini::Ini;
use log::warn;
use std::collections::HashMap;
use std::path::Path;

use crate::domain::error::MacrossError;
use crate::ports::config_port::ConfigPort;

pub const ENV_PREFIX: &str = "MACROSS__";

pub struct FileConfigAdapter {
    ini: Ini,
    overrides: HashMap<(String, String), String>,
}

impl FileConfigAdapter {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, MacrossError> {
        let path = path.as_ref();
        let mut ini = Ini::new();
        ini.load(path).map_err(|reason| MacrossError::ConfigParse {
            file: path.display().to_string(),
            reason,
        })?;
        Ok(Self::from_ini(ini))
    }

    pub fn from_string(content: &str) -> Result<Self, MacrossError> {
        let mut ini = Ini::new();
        ini.read(content.to_string())
            .map_err(|reason| MacrossError::ConfigParse {
                file: "<inline>".into(),
                reason,
            })?;
        Ok(Self::from_ini(ini))
    }

    fn from_ini(ini: Ini) -> Self {
        Self {
            ini,
            overrides: HashMap::new(),
        }
    }

    /// Layer the process environment over the file.
    pub fn with_env(self) -> Self {
        self.with_env_vars(std::env::vars())
    }

    /// Layer `MACROSS__SECTION__KEY=value` pairs over the file. Names are
    /// matched case-insensitively; anything without the prefix is ignored.
    pub fn with_env_vars<I, K, V>(mut self, vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        for (name, value) in vars {
            let Some(rest) = name.as_ref().strip_prefix(ENV_PREFIX) else {
                continue;
            };
            match rest.split_once("__") {
                Some((section, key)) if !section.is_empty() && !key.is_empty() => {
                    self.overrides
                        .insert((section.to_lowercase(), key.to_lowercase()), value.into());
                }
                _ => warn!("ignoring {}: expected {ENV_PREFIX}<SECTION>__<KEY>", name.as_ref()),
            }
        }
        self
    }

    fn raw(&self, section: &str, key: &str) -> Option<String> {
        self.overrides
            .get(&(section.to_lowercase(), key.to_lowercase()))
            .cloned()
            .or_else(|| self.ini.get(section, key))
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.to_lowercase().as_str() {
        "true" | "yes" | "on" | "1" => Some(true),
        "false" | "no" | "off" | "0" => Some(false),
        _ => None,
    }
}

impl ConfigPort for FileConfigAdapter {
    fn get_string(&self, section: &str, key: &str) -> Option<String> {
        self.raw(section, key)
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
    }

    fn get_int(&self, section: &str, key: &str, default: i64) -> i64 {
        let Some(value) = self.get_string(section, key) else {
            return default;
        };
        value.parse().unwrap_or_else(|_| {
            warn!("[{section}] {key} = {value:?} is not an integer, using {default}");
            default
        })
    }

    fn get_bool(&self, section: &str, key: &str, default: bool) -> bool {
        let Some(value) = self.get_string(section, key) else {
            return default;
        };
        parse_bool(&value).unwrap_or_else(|| {
            warn!("[{section}] {key} = {value:?} is not a boolean, using {default}");
            default
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const SAMPLE: &str = r#"
[data]
source = sqlite
symbol = AAPL

[sqlite]
path = /var/lib/macross/bars.db
pool_size = 8

[alpha_vantage]
api_key =
"#;

    #[test]
    fn file_values_are_trimmed() {
        let adapter = FileConfigAdapter::from_string("[data]\nsymbol =   AAPL  \n").unwrap();
        assert_eq!(adapter.get_string("data", "symbol"), Some("AAPL".to_string()));
        assert_eq!(adapter.get_string("data", "missing"), None);
        assert_eq!(adapter.get_string("missing_section", "key"), None);
    }

    #[test]
    fn blank_value_reads_as_unset() {
        let adapter = FileConfigAdapter::from_string(SAMPLE).unwrap();
        assert_eq!(adapter.get_string("alpha_vantage", "api_key"), None);
        assert_eq!(adapter.get_int("sqlite", "pool_size", 4), 8);
    }

    #[test]
    fn environment_overrides_file_values() {
        let adapter = FileConfigAdapter::from_string(SAMPLE).unwrap().with_env_vars([
            ("MACROSS__ALPHA_VANTAGE__API_KEY", "secret"),
            ("MACROSS__sqlite__POOL_SIZE", "2"),
            ("MACROSS__REFRESH__ENABLED", "yes"),
            ("ALPHA_VANTAGE_API_KEY", "ignored"),
            ("MACROSS__NOKEY", "ignored"),
        ]);

        assert_eq!(
            adapter.get_string("alpha_vantage", "api_key"),
            Some("secret".to_string())
        );
        assert_eq!(adapter.get_int("sqlite", "pool_size", 4), 2);
        assert!(adapter.get_bool("refresh", "enabled", false));
        assert_eq!(
            adapter.get_string("data", "symbol"),
            Some("AAPL".to_string())
        );
    }

    #[test]
    fn blank_override_hides_the_file_value() {
        let adapter = FileConfigAdapter::from_string(SAMPLE)
            .unwrap()
            .with_env_vars([("MACROSS__DATA__SYMBOL", " ")]);
        assert_eq!(adapter.get_string("data", "symbol"), None);
    }

    #[test]
    fn unparsable_numbers_and_flags_fall_back() {
        let adapter =
            FileConfigAdapter::from_string("[refresh]\nhour = midnight\nenabled = maybe\n")
                .unwrap();
        assert_eq!(adapter.get_int("refresh", "hour", 3), 3);
        assert!(!adapter.get_bool("refresh", "enabled", false));
        assert!(adapter.get_bool("refresh", "missing", true));
    }

    #[test]
    fn flag_spellings() {
        let adapter = FileConfigAdapter::from_string(
            "[f]\na = true\nb = Yes\nc = 1\nd = ON\ne = false\nf = no\ng = 0\nh = Off\n",
        )
        .unwrap();
        for key in ["a", "b", "c", "d"] {
            assert!(adapter.get_bool("f", key, false), "{key}");
        }
        for key in ["e", "f", "g", "h"] {
            assert!(!adapter.get_bool("f", key, true), "{key}");
        }
    }

    #[test]
    fn from_file_reads_config() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "[web]\nlisten = 0.0.0.0:8000\n").unwrap();

        let adapter = FileConfigAdapter::from_file(file.path()).unwrap();
        assert_eq!(
            adapter.get_string("web", "listen"),
            Some("0.0.0.0:8000".to_string())
        );
    }

    #[test]
    fn missing_file_is_a_parse_error_naming_the_file() {
        match FileConfigAdapter::from_file("/nonexistent/path/config.ini") {
            Err(MacrossError::ConfigParse { file, .. }) => {
                assert_eq!(file, "/nonexistent/path/config.ini")
            }
            Ok(_) => panic!("expected ConfigParse"),
            Err(other) => panic!("expected ConfigParse, got: {other:?}"),
        }
    }
}
