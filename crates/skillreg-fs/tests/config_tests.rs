use pretty_assertions::assert_eq;
use rstest::rstest;
use serde::{Deserialize, Serialize};
use skillreg_fs::{ConfigStore, Error, NormalizedPath};
use tempfile::TempDir;

#[derive(Debug, Serialize, Deserialize, PartialEq)]
struct Limits {
    max_slug_len: usize,
    label: String,
}

fn write(temp: &TempDir, name: &str, content: &str) -> NormalizedPath {
    let path = temp.path().join(name);
    std::fs::write(&path, content).unwrap();
    NormalizedPath::new(path)
}

#[rstest]
#[case("limits.toml", "max_slug_len = 12\nlabel = \"x\"\n")]
#[case("limits.json", r#"{"max_slug_len": 12, "label": "x"}"#)]
#[case("limits.yaml", "max_slug_len: 12\nlabel: x\n")]
#[case("limits.YML", "max_slug_len: 12\nlabel: x\n")]
fn test_load_by_extension(#[case] name: &str, #[case] content: &str) {
    let temp = TempDir::new().unwrap();
    let path = write(&temp, name, content);

    let limits: Limits = ConfigStore::new().load(&path).unwrap();
    assert_eq!(limits, Limits { max_slug_len: 12, label: "x".into() });
}

#[rstest]
#[case("limits.toml")]
#[case("limits.json")]
#[case("limits.yml")]
fn test_save_then_load(#[case] name: &str) {
    let temp = TempDir::new().unwrap();
    let path = NormalizedPath::new(temp.path().join(name));
    let limits = Limits { max_slug_len: 7, label: "pdf".into() };

    let store = ConfigStore::new();
    store.save(&path, &limits).unwrap();
    assert_eq!(store.load::<Limits>(&path).unwrap(), limits);
}

#[test]
fn test_unsupported_extension() {
    let temp = TempDir::new().unwrap();
    let path = write(&temp, "limits.ini", "max_slug_len=1");

    let result: Result<Limits, _> = ConfigStore::new().load(&path);
    assert!(matches!(result, Err(Error::UnsupportedFormat { extension }) if extension == "ini"));
}

#[test]
fn test_parse_error_names_format() {
    let temp = TempDir::new().unwrap();
    let path = write(&temp, "limits.toml", "max_slug_len = [unclosed");

    match ConfigStore::new().load::<Limits>(&path) {
        Err(Error::ConfigParse { format, .. }) => assert_eq!(format, "TOML"),
        other => panic!("expected ConfigParse, got {:?}", other),
    }
}

#[test]
fn test_missing_file_is_not_found() {
    let temp = TempDir::new().unwrap();
    let path = NormalizedPath::new(temp.path().join("absent.toml"));

    let err = ConfigStore::new().load::<Limits>(&path).unwrap_err();
    assert!(err.is_not_found());
}
