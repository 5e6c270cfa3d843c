//! MySQL connection settings.

use serde::{Deserialize, Serialize};

use crate::serde_helpers::lenient_string;

fn default_alias() -> String {
    String::from("read_replica")
}

fn default_client() -> String {
    String::from("mysql")
}

/// Connection overrides for the LMS database.
///
/// Empty strings mean "not set": the resolver fills them from the LMS
/// configuration files, then from built-in fallbacks for host and database.
/// Every field also accepts a bare number, as env overrides deliver them.
#[derive(Clone, Deserialize, Serialize)]
pub struct MysqlConfig {
    #[serde(default, deserialize_with = "lenient_string")]
    pub host: String,

    #[serde(default, deserialize_with = "lenient_string")]
    pub user: String,

    #[serde(default, deserialize_with = "lenient_string")]
    pub password: String,

    /// Database (schema) name.
    #[serde(default, deserialize_with = "lenient_string")]
    pub database: String,

    /// Entry under `DATABASES` to scrape when no user is given.
    /// Falls back to `default` when the alias is absent.
    #[serde(default = "default_alias", deserialize_with = "lenient_string")]
    pub alias: String,

    /// MySQL client binary.
    #[serde(default = "default_client", deserialize_with = "lenient_string")]
    pub client: String,
}

impl Default for MysqlConfig {
    fn default() -> Self {
        Self {
            host: String::new(),
            user: String::new(),
            password: String::new(),
            database: String::new(),
            alias: default_alias(),
            client: default_client(),
        }
    }
}

impl MysqlConfig {
    /// Both halves of the login are supplied, so no password scraping is needed.
    #[must_use]
    pub fn has_login(&self) -> bool {
        !self.user.is_empty() && !self.password.is_empty()
    }
}

impl std::fmt::Debug for MysqlConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MysqlConfig")
            .field("host", &self.host)
            .field("user", &self.user)
            .field("password", &if self.password.is_empty() { "" } else { "***" })
            .field("database", &self.database)
            .field("alias", &self.alias)
            .field("client", &self.client)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_has_no_login() {
        let config = MysqlConfig::default();
        assert!(!config.has_login());
        assert_eq!(config.alias, "read_replica");
        assert_eq!(config.client, "mysql");
    }

    #[test]
    fn debug_redacts_password() {
        let config = MysqlConfig {
            user: "reader".into(),
            password: "hunter2".into(),
            ..Default::default()
        };
        let rendered = format!("{config:?}");
        assert!(!rendered.contains("hunter2"));
        assert!(rendered.contains("***"));
        assert!(config.has_login());
    }

    #[test]
    fn numeric_credentials_read_as_text() {
        let config: MysqlConfig =
            serde_json::from_str(r#"{"user": 1001, "password": 12345678}"#).expect("deserializes");
        assert_eq!(config.user, "1001");
        assert_eq!(config.password, "12345678");
        assert_eq!(config.alias, "read_replica");
    }
}
