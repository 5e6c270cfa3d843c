//! Report tree layout.
//!
//! The report root mirrors the data bucket:
//! `<root>/<table>/lms=<identity>/<table>.csv` for every table and
//! `<root>/course_structures/lms=<identity>/course_structures.csv` for the
//! structure dump.

use std::path::{Component, Path, PathBuf};

use crate::{CoreError, DeploymentIdentity, TableExportSpec};

/// Name of the structure-dump subtree and file stem.
pub const STRUCTURES_NAME: &str = "course_structures";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportLayout {
    root: PathBuf,
}

impl ReportLayout {
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Output file for one table.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::PathEscapesRoot`] when the rendered template is
    /// absolute or climbs out of the root.
    pub fn table_file(
        &self,
        spec: &TableExportSpec,
        lms: &DeploymentIdentity,
    ) -> Result<PathBuf, CoreError> {
        self.resolve(&render_template(spec.output_template(), &spec.name, lms))
    }

    /// Output file for the course structure dump.
    #[must_use]
    pub fn structures_file(&self, lms: &DeploymentIdentity) -> PathBuf {
        self.root
            .join(STRUCTURES_NAME)
            .join(lms.partition())
            .join(format!("{STRUCTURES_NAME}.csv"))
    }

    /// First directory below the root that contains `file`.
    ///
    /// This is the subtree handed to the output owner after a write. Falls
    /// back to the file's parent for paths outside the root.
    #[must_use]
    pub fn subtree_of(&self, file: &Path) -> PathBuf {
        if let Ok(relative) = file.strip_prefix(&self.root) {
            let mut components = relative.components();
            if let (Some(first), Some(_)) = (components.next(), components.next()) {
                return self.root.join(first);
            }
        }
        file.parent()
            .map_or_else(|| self.root.clone(), Path::to_path_buf)
    }

    fn resolve(&self, relative: &str) -> Result<PathBuf, CoreError> {
        let candidate = Path::new(relative);
        let escapes = candidate.components().any(|component| {
            matches!(
                component,
                Component::ParentDir | Component::RootDir | Component::Prefix(_)
            )
        });
        if escapes || relative.trim().is_empty() {
            return Err(CoreError::PathEscapesRoot {
                path: relative.to_string(),
            });
        }
        Ok(self.root.join(candidate))
    }
}

/// Expand `{table}` and `{lms}` placeholders.
#[must_use]
pub fn render_template(template: &str, table: &str, lms: &DeploymentIdentity) -> String {
    template
        .replace("{table}", table)
        .replace("{lms}", lms.as_str())
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn lms() -> DeploymentIdentity {
        DeploymentIdentity::parse("campus.example.com").expect("valid")
    }

    #[test]
    fn table_file_follows_partition_convention() {
        let layout = ReportLayout::new("/reports");
        let path = layout
            .table_file(&TableExportSpec::new("auth_user"), &lms())
            .expect("inside root");
        assert_eq!(
            path,
            PathBuf::from("/reports/auth_user/lms=campus.example.com/auth_user.csv")
        );
    }

    #[test]
    fn structures_file_follows_partition_convention() {
        let layout = ReportLayout::new("/reports");
        assert_eq!(
            layout.structures_file(&lms()),
            PathBuf::from(
                "/reports/course_structures/lms=campus.example.com/course_structures.csv"
            )
        );
    }

    #[test]
    fn custom_template_is_rendered() {
        let layout = ReportLayout::new("/reports");
        let spec = TableExportSpec {
            name: "auth_user".into(),
            query: String::new(),
            output: "users/{lms}/{table}.tsv".into(),
        };
        assert_eq!(
            layout.table_file(&spec, &lms()).expect("inside root"),
            PathBuf::from("/reports/users/campus.example.com/auth_user.tsv")
        );
    }

    #[test]
    fn escaping_templates_are_rejected() {
        let layout = ReportLayout::new("/reports");
        for output in ["../{table}.csv", "/etc/{table}", "{table}/../../x"] {
            let spec = TableExportSpec {
                name: "auth_user".into(),
                query: String::new(),
                output: output.into(),
            };
            assert!(
                layout.table_file(&spec, &lms()).is_err(),
                "template {output} should be rejected"
            );
        }
    }

    #[test]
    fn subtree_is_first_directory_under_root() {
        let layout = ReportLayout::new("/reports");
        let file = PathBuf::from("/reports/auth_user/lms=campus.example.com/auth_user.csv");
        assert_eq!(layout.subtree_of(&file), PathBuf::from("/reports/auth_user"));
    }

    #[test]
    fn subtree_falls_back_to_parent_outside_root() {
        let layout = ReportLayout::new("/reports");
        let file = PathBuf::from("/elsewhere/out.csv");
        assert_eq!(layout.subtree_of(&file), PathBuf::from("/elsewhere"));
    }
}
