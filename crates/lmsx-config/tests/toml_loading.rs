//! Integration tests for TOML configuration loading.
//!
//! Uses figment::Jail for sandboxed working directory and env var manipulation.

use std::path::{Path, PathBuf};

use figment::{
    Figment, Jail,
    providers::{Format, Serialized, Toml},
};
use lmsx_config::ExportConfig;
use lmsx_core::{BucketAmbiguity, HaltPolicy};
use pretty_assertions::assert_eq;

#[test]
fn loads_mysql_and_bucket_sections_from_toml() {
    Jail::expect_with(|jail| {
        jail.create_file(
            "config.toml",
            r#"
[mysql]
host = "db.internal"
user = "reader"
password = "s3cr3t"
database = "edxapp"

[buckets]
data = "lms-abcd1234-raw-data-x1-1600000000"
logs = "lms-abcd1234-raw-logs-x1-1600000000"
ambiguity = "first"
"#,
        )?;

        let config: ExportConfig = Figment::from(Serialized::defaults(ExportConfig::default()))
            .merge(Toml::file("config.toml"))
            .extract()?;

        assert_eq!(config.mysql.host, "db.internal");
        assert_eq!(config.mysql.user, "reader");
        assert_eq!(config.mysql.password, "s3cr3t");
        assert_eq!(config.mysql.database, "edxapp");
        assert_eq!(config.mysql.alias, "read_replica");
        assert_eq!(config.buckets.data, "lms-abcd1234-raw-data-x1-1600000000");
        assert_eq!(config.buckets.logs, "lms-abcd1234-raw-logs-x1-1600000000");
        assert_eq!(config.buckets.ambiguity, BucketAmbiguity::First);
        Ok(())
    });
}

#[test]
fn table_list_replaces_defaults() {
    Jail::expect_with(|jail| {
        jail.create_file(
            "lmsx.toml",
            r#"
[[tables]]
name = "auth_user"

[[tables]]
name = "active_users"
query = "SELECT id, username FROM auth_user WHERE is_active = 1"
output = "active/lms={lms}/{table}.csv"
"#,
        )?;

        let config = ExportConfig::load(None).expect("config loads");
        assert_eq!(config.tables.len(), 2);
        assert_eq!(config.tables[0].name, "auth_user");
        assert!(config.tables[0].query.is_empty());
        assert_eq!(config.tables[1].output, "active/lms={lms}/{table}.csv");
        config.validate().expect("valid tables");
        Ok(())
    });
}

#[test]
fn local_file_is_picked_up_from_working_directory() {
    Jail::expect_with(|jail| {
        jail.create_file(
            "lmsx.toml",
            r#"
[paths]
report_root = "/srv/reports"
output_owner = "hadoop"
use_sudo = true

[run]
halt = "halt"
"#,
        )?;

        let config = ExportConfig::load(None).expect("config loads");
        assert_eq!(config.paths.report_root, PathBuf::from("/srv/reports"));
        assert_eq!(config.paths.output_owner, "hadoop");
        assert!(config.paths.use_sudo);
        assert_eq!(config.run.halt, HaltPolicy::Halt);
        Ok(())
    });
}

#[test]
fn explicit_file_beats_local_file() {
    Jail::expect_with(|jail| {
        jail.create_file("lmsx.toml", "[lms]\nhost = \"local.example.com\"\n")?;
        jail.create_file("prod.toml", "[lms]\nhost = \"prod.example.com\"\n")?;

        let config = ExportConfig::load(Some(Path::new("prod.toml"))).expect("config loads");
        assert_eq!(config.lms.host, "prod.example.com");
        Ok(())
    });
}

#[test]
fn structures_section_can_disable_the_dump() {
    Jail::expect_with(|jail| {
        jail.create_file(
            "lmsx.toml",
            r#"
[structures]
enabled = false
app_user = "edxapp"
"#,
        )?;

        let config = ExportConfig::load(None).expect("config loads");
        assert!(!config.structures.enabled);
        assert_eq!(config.structures.app_user, "edxapp");
        assert_eq!(config.structures.settings, "production");
        Ok(())
    });
}

#[test]
fn invalid_table_name_fails_validation() {
    Jail::expect_with(|jail| {
        jail.create_file("lmsx.toml", "[[tables]]\nname = \"auth_user; DROP\"\n")?;

        let config = ExportConfig::load(None).expect("config loads");
        assert!(config.validate().is_err());
        Ok(())
    });
}
