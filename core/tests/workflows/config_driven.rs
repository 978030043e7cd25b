// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

//! Configuration-driven behavior workflow tests.
//!
//! These tests validate how configuration selects accounts and kids and where
//! their archives end up.

use plansync_core::{
    AccountFilter, ArchiveStore, Config, JsonFileExtractor, SourceKind, import_owner,
};

use crate::common::{TestConfigBuilder, assert_file_exists, setup_temp_dirs, test_batch};

#[tokio::test]
async fn configured_kids_are_imported_into_their_own_directories() {
    // Arrange
    let temp_dirs = setup_temp_dirs().await.unwrap();
    let mut config = TestConfigBuilder::new()
        .with_archive_dir(&temp_dirs.archive_dir)
        .with_incoming_dir(&temp_dirs.incoming_dir)
        .build();
    config.normalize().unwrap();
    temp_dirs.write_batch(7, &test_batch()).await.unwrap();

    let store = ArchiveStore::new(&config.archive_dir);
    let extractor = JsonFileExtractor::new(config.incoming_dir());

    // Act
    for ctx in AccountFilter::default().select(&config.accounts) {
        import_owner(&store, &extractor, &ctx, &SourceKind::ALL)
            .await
            .unwrap();
    }

    // Assert
    let kid_dir = temp_dirs.archive_dir.join("6a_mia_beispiel");
    assert_file_exists(&kid_dir.join("vertretungsplan.json"));
    assert_file_exists(&kid_dir.join("schulaufgaben.json"));
    assert_file_exists(&kid_dir.join("termine.json"));

    let keys = store.keys(SourceKind::Exams).await.unwrap();
    assert_eq!(keys.len(), 1);
    let archive = store.load(&keys[0]).await.unwrap().unwrap();
    assert_eq!(archive.metadata.calendar_name(), "6A – School A");
    assert_eq!(archive.metadata.owner.first_name.as_deref(), Some("Mia"));
}

#[tokio::test]
async fn filter_excludes_other_schools() {
    // Arrange
    let temp_dirs = setup_temp_dirs().await.unwrap();
    let config: Config = toml::from_str(&format!(
        r#"
archive_dir = "{}"

[accounts]
short = "schoolA"
school_name = "School A"
kids = [{{ id = 7, first_name = "Mia" }}]
"#,
        temp_dirs.archive_dir.to_str().unwrap().replace('\\', "/")
    ))
    .unwrap();

    // Act
    let other = AccountFilter {
        schools: vec!["schoolB".to_string()],
        ..Default::default()
    }
    .select(&config.accounts);
    let same = AccountFilter {
        schools: vec!["SCHOOLA".to_string()],
        kid_names: vec!["mia".to_string()],
        ..Default::default()
    }
    .select(&config.accounts);

    // Assert
    assert!(other.is_empty());
    assert_eq!(same.len(), 1);
    assert_eq!(same[0].owner.slug(), "mia");
}
