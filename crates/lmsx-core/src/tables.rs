//! Declarative table export specs.
//!
//! Adding a table to the export is a data change: append a
//! [`TableExportSpec`] to the configured list. The default list covers the
//! learner, enrollment, courseware and certificate tables downstream
//! analytics jobs read.

use serde::{Deserialize, Serialize};

use crate::CoreError;

/// Tables exported when the configuration does not supply its own list.
pub const DEFAULT_TABLES: [&str; 10] = [
    "auth_user",
    "auth_userprofile",
    "certificates_generatedcertificate",
    "course_groups_cohortmembership",
    "course_groups_courseusergroup",
    "courseware_studentmodule",
    "student_anonymoususerid",
    "student_courseaccessrole",
    "student_courseenrollment",
    "user_api_userpreference",
];

/// Output path template, relative to the report root.
///
/// `{table}` expands to the table name, `{lms}` to the deployment identity.
pub const DEFAULT_OUTPUT_TEMPLATE: &str = "{table}/lms={lms}/{table}.csv";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableExportSpec {
    /// Table name; also the first path segment of the output file.
    pub name: String,

    /// Custom query. Empty means a full-table `SELECT *`.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub query: String,

    /// Custom output template. Empty means [`DEFAULT_OUTPUT_TEMPLATE`].
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub output: String,
}

impl TableExportSpec {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            query: String::new(),
            output: String::new(),
        }
    }

    /// The row query sent to the database.
    #[must_use]
    pub fn query(&self) -> String {
        if self.query.trim().is_empty() {
            format!("SELECT * FROM {}", self.name)
        } else {
            self.query.trim().trim_end_matches(';').to_string()
        }
    }

    /// The row-count probe issued instead of [`Self::query`] in dry mode.
    #[must_use]
    pub fn count_query(&self) -> String {
        if self.query.trim().is_empty() {
            format!("SELECT COUNT(*) FROM {}", self.name)
        } else {
            format!("SELECT COUNT(*) FROM ({}) AS export_rows", self.query())
        }
    }

    #[must_use]
    pub fn output_template(&self) -> &str {
        if self.output.trim().is_empty() {
            DEFAULT_OUTPUT_TEMPLATE
        } else {
            self.output.trim()
        }
    }

    /// Check the name is a plain SQL identifier.
    ///
    /// The name is interpolated into the default query and the output path,
    /// so anything beyond `[A-Za-z0-9_]` is rejected.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidTable`] for empty or non-identifier names.
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.name.is_empty() {
            return Err(CoreError::InvalidTable {
                table: self.name.clone(),
                reason: "name is empty".to_string(),
            });
        }
        if !self
            .name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_')
        {
            return Err(CoreError::InvalidTable {
                table: self.name.clone(),
                reason: "name must contain only letters, digits and underscores".to_string(),
            });
        }
        Ok(())
    }
}

/// The ten default table specs, in export order.
#[must_use]
pub fn default_tables() -> Vec<TableExportSpec> {
    DEFAULT_TABLES.iter().map(|name| TableExportSpec::new(*name)).collect()
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn default_list_has_ten_valid_tables() {
        let tables = default_tables();
        assert_eq!(tables.len(), 10);
        for spec in &tables {
            spec.validate().expect("default tables are valid");
        }
    }

    #[test]
    fn default_query_is_full_table_select() {
        let spec = TableExportSpec::new("auth_user");
        assert_eq!(spec.query(), "SELECT * FROM auth_user");
        assert_eq!(spec.count_query(), "SELECT COUNT(*) FROM auth_user");
        assert_eq!(spec.output_template(), DEFAULT_OUTPUT_TEMPLATE);
    }

    #[test]
    fn custom_query_is_wrapped_for_counting() {
        let spec = TableExportSpec {
            name: "active_users".into(),
            query: "SELECT id FROM auth_user WHERE is_active = 1;".into(),
            output: String::new(),
        };
        assert_eq!(spec.query(), "SELECT id FROM auth_user WHERE is_active = 1");
        assert_eq!(
            spec.count_query(),
            "SELECT COUNT(*) FROM (SELECT id FROM auth_user WHERE is_active = 1) AS export_rows"
        );
    }

    #[test]
    fn validate_rejects_injection_shaped_names() {
        assert!(TableExportSpec::new("").validate().is_err());
        assert!(TableExportSpec::new("auth_user; DROP").validate().is_err());
        assert!(TableExportSpec::new("../etc").validate().is_err());
    }
}
