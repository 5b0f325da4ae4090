//! エラーケーステスト
//!
//! 各種エラー条件でのエラーハンドリングを検証

use std::collections::BTreeSet;
use std::path::Path;
use tempfile::tempdir;
use wafer_deck::config::ReportConfig;
use wafer_deck::error::WaferDeckError;
use wafer_deck::scanner::FileCatalog;

fn whitelist(names: &[&str]) -> BTreeSet<String> {
    names.iter().map(|s| s.to_string()).collect()
}

/// 存在しないフォルダをスキャンした場合
#[test]
fn test_scan_nonexistent_folder() {
    let result = FileCatalog::scan(Path::new("/nonexistent/path/12345"), "png", &whitelist(&["A"]), 4);
    assert!(matches!(result, Err(WaferDeckError::InvalidPath(_))));
}

/// ファイルをフォルダとして渡した場合
#[test]
fn test_scan_file_as_root() {
    let dir = tempdir().expect("Failed to create temp dir");
    let file = dir.path().join("not_a_dir.png");
    std::fs::write(&file, b"x").unwrap();

    let result = FileCatalog::scan(&file, "png", &whitelist(&["A"]), 4);
    assert!(matches!(result, Err(WaferDeckError::InvalidPath(_))));
}

/// 空のフォルダは0件エラー
#[test]
fn test_scan_empty_folder() {
    let dir = tempdir().expect("Failed to create temp dir");
    let result = FileCatalog::scan(dir.path(), "png", &whitelist(&["A"]), 4);
    assert!(matches!(result, Err(WaferDeckError::EmptyCatalog(_))));
}

/// 対象拡張子のないフォルダ
#[test]
fn test_scan_folder_no_images() {
    let dir = tempdir().expect("Failed to create temp dir");
    let folder = dir.path().join("A");
    std::fs::create_dir(&folder).unwrap();

    // 命名規則には合うが拡張子が違う
    std::fs::write(folder.join("P_L1_W-01-x.txt"), "hello").unwrap();
    std::fs::write(folder.join("data.json"), "{}").unwrap();

    let result = FileCatalog::scan(dir.path(), "png", &whitelist(&["A"]), 4);
    assert!(matches!(result, Err(WaferDeckError::EmptyCatalog(_))));
}

/// ホワイトリスト外のフォルダしか無い場合
#[test]
fn test_scan_all_folders_filtered() {
    let dir = tempdir().expect("Failed to create temp dir");
    let folder = dir.path().join("Z");
    std::fs::create_dir(&folder).unwrap();
    std::fs::write(folder.join("P_L1_W-01-x.png"), b"x").unwrap();

    let result = FileCatalog::scan(dir.path(), "png", &whitelist(&["A"]), 4);
    assert!(matches!(result, Err(WaferDeckError::EmptyCatalog(_))));
}

/// 不正なJSON設定
#[test]
fn test_load_invalid_config() {
    let dir = tempdir().expect("Failed to create temp dir");
    let path = dir.path().join("config.json");
    std::fs::write(&path, "{ invalid json }").unwrap();

    let result = ReportConfig::load(Some(&path));
    assert!(matches!(result, Err(WaferDeckError::JsonParse(_))));
}

/// 検証に失敗する設定
#[test]
fn test_load_config_fails_validation() {
    let dir = tempdir().expect("Failed to create temp dir");
    let path = dir.path().join("config.json");
    std::fs::write(&path, r#"{ "input_validation": [] }"#).unwrap();

    let result = ReportConfig::load(Some(&path));
    assert!(matches!(result, Err(WaferDeckError::Config(_))));
}

/// エラーメッセージの表示
#[test]
fn test_error_display() {
    let err = WaferDeckError::AmbiguousPivot {
        lot: "L1".into(),
        wafer: "01".into(),
        folder: "25C".into(),
    };
    let message = err.to_string();
    assert!(message.contains("lot=L1"));
    assert!(message.contains("wafer=01"));
    assert!(message.contains("folder=25C"));

    let err = WaferDeckError::image_access("/data/a.png", "broken");
    assert_eq!(err.to_string(), "画像にアクセスできません: /data/a.png: broken");

    let err = WaferDeckError::Busy("/data/.wafer-deck.lock".into());
    assert!(err.to_string().contains(".wafer-deck.lock"));
}

/// IOエラーからの変換
#[test]
fn test_io_error_conversion() {
    let io = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
    let err: WaferDeckError = io.into();
    assert!(matches!(err, WaferDeckError::Io(_)));
    assert!(err.to_string().starts_with("IOエラー"));
}

/// 読めないサブフォルダがあれば部分的なカタログを返さない
#[cfg(unix)]
#[test]
fn test_scan_unreadable_subfolder() {
    use std::os::unix::fs::PermissionsExt;

    let dir = tempdir().expect("Failed to create temp dir");
    for folder in ["A", "B"] {
        let path = dir.path().join(folder);
        std::fs::create_dir(&path).unwrap();
        std::fs::write(path.join("P_L1_W-01-x.png"), b"x").unwrap();
        std::fs::write(path.join("P_L1_W-02-x.png"), b"x").unwrap();
    }
    let locked = dir.path().join("B");
    std::fs::set_permissions(&locked, std::fs::Permissions::from_mode(0o000)).unwrap();

    // root 権限では読めてしまうので検証できない
    if std::fs::read_dir(&locked).is_ok() {
        std::fs::set_permissions(&locked, std::fs::Permissions::from_mode(0o755)).unwrap();
        return;
    }

    let result = FileCatalog::scan(dir.path(), "png", &whitelist(&["A", "B"]), 4);
    std::fs::set_permissions(&locked, std::fs::Permissions::from_mode(0o755)).unwrap();

    match result {
        Err(WaferDeckError::CatalogScan { path, .. }) => assert_eq!(path, locked),
        other => panic!("expected CatalogScan, got {:?}", other.map(|c| c.len())),
    }
}
