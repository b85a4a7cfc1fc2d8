// ABOUTME: Tests for manifest discovery and the init template.
// ABOUTME: Uses temporary directories to exercise the on-disk lookup order.

use slipway::config::{MANIFEST_FILENAME, Manifest, init_manifest};
use slipway::model::BuildPack;

const MINIMAL_MANIFEST: &str = r#"
application:
  uuid: app-1
  name: App
  build_pack: nixpacks
  git_repository: https://github.com/acme/app
servers:
  - name: s1
    host: s1.internal
"#;

/// Test: discovery finds slipway.yml in the given directory.
#[test]
fn discover_finds_manifest() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join(MANIFEST_FILENAME), MINIMAL_MANIFEST).unwrap();

    let manifest = Manifest::discover(dir.path()).unwrap();
    assert_eq!(manifest.application.uuid, "app-1");
}

/// Test: discovery falls back to the .slipway directory.
#[test]
fn discover_falls_back_to_dotdir() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::create_dir(dir.path().join(".slipway")).unwrap();
    std::fs::write(dir.path().join(".slipway/config.yml"), MINIMAL_MANIFEST).unwrap();

    let manifest = Manifest::discover(dir.path()).unwrap();
    assert_eq!(manifest.application.name, "App");
}

/// Test: a directory without a manifest is a clear error.
#[test]
fn discover_without_manifest_fails() {
    let dir = tempfile::tempdir().unwrap();
    let err = Manifest::discover(dir.path()).unwrap_err();
    assert!(err.to_string().contains("manifest not found"));
}

/// Test: init writes a template that parses, and refuses to overwrite it
/// without force.
#[test]
fn init_writes_parseable_template_once() {
    let dir = tempfile::tempdir().unwrap();

    init_manifest(dir.path(), false).unwrap();
    let manifest = Manifest::discover(dir.path()).unwrap();
    assert_eq!(manifest.application.build_pack, BuildPack::Nixpacks);

    assert!(init_manifest(dir.path(), false).is_err());
    init_manifest(dir.path(), true).unwrap();
}

/// Test: an empty server list is rejected at parse time.
#[test]
fn empty_server_list_is_rejected() {
    let yaml = r#"
application:
  uuid: app-1
  name: App
  build_pack: static
  git_repository: https://github.com/acme/site
servers: []
"#;
    assert!(Manifest::from_yaml(yaml).is_err());
}
