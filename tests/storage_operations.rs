use std::fs;

use cloud_drive::DriveConfig;
use cloud_drive::error::StorageError;
use cloud_drive::storage::{
    EntryKind, PathResolver, UploadItem, delete_entry, list_directory, make_directory,
    prepare_download, read_text_file, rename_entry, save_uploads, stat_entry, write_text_file,
};
use tempfile::TempDir;

fn setup() -> (TempDir, PathResolver, DriveConfig) {
    cloud_drive::utils::setup_test_logging();
    let temp = TempDir::new().expect("Failed to create temp dir");
    let resolver = PathResolver::new(temp.path().join("storage")).unwrap();
    let config = DriveConfig {
        storage_root: resolver.root().to_string_lossy().into_owned(),
        ..DriveConfig::default()
    };
    (temp, resolver, config)
}

fn names(resolver: &PathResolver, path: &str) -> Vec<String> {
    list_directory(resolver, path)
        .unwrap()
        .into_iter()
        .map(|e| e.name)
        .collect()
}

#[test]
fn test_traversal_never_escapes_root() {
    let (_temp, resolver, _config) = setup();
    let inputs = [
        "..",
        "../",
        "/..",
        "../../etc/passwd",
        "a/../..",
        "a/b/../../../c",
        "./../x",
        "/a/./../../b",
        "a/..",
        "a/b/c/../../..",
        "x/../y/../z/..",
    ];
    for input in inputs {
        match resolver.resolve(input) {
            Ok(path) => assert!(path.starts_with(resolver.root()), "{input:?} escaped"),
            Err(StorageError::PathTraversal(_)) => {}
            Err(other) => panic!("{input:?}: unexpected error {other}"),
        }
    }
}

#[test]
fn test_lexical_normalization_equivalence() {
    let (_temp, resolver, _config) = setup();
    assert_eq!(
        resolver.resolve("/a/./b/../c").unwrap(),
        resolver.resolve("/a/c").unwrap()
    );
}

#[test]
fn test_empty_directory_lists_nothing() {
    let (_temp, resolver, _config) = setup();
    make_directory(&resolver, "/", "empty").unwrap();
    assert!(list_directory(&resolver, "/empty").unwrap().is_empty());
}

#[test]
fn test_listing_order_dirs_first() {
    let (_temp, resolver, _config) = setup();
    fs::write(resolver.root().join("b.txt"), "b").unwrap();
    fs::create_dir(resolver.root().join("A")).unwrap();
    fs::write(resolver.root().join("a.txt"), "a").unwrap();

    let listing = list_directory(&resolver, "/").unwrap();
    let names: Vec<_> = listing.iter().map(|e| e.name.as_str()).collect();
    assert_eq!(names, ["A", "a.txt", "b.txt"]);
    assert_eq!(listing[0].kind, EntryKind::Dir);
    assert_eq!(listing[0].size, 0);
    assert_eq!(listing[1].size, 1);
}

#[test]
fn test_list_errors() {
    let (_temp, resolver, _config) = setup();
    fs::write(resolver.root().join("file.txt"), "x").unwrap();

    assert!(matches!(
        list_directory(&resolver, "/missing"),
        Err(StorageError::NotFound(_))
    ));
    assert!(matches!(
        list_directory(&resolver, "/file.txt"),
        Err(StorageError::NotADirectory(_))
    ));
}

#[test]
fn test_write_then_read_round_trip() {
    let (_temp, resolver, config) = setup();
    let content = "# Notes\n\nline two with unicode ✓\n";
    write_text_file(&resolver, &config, "/notes.txt", content).unwrap();
    assert_eq!(read_text_file(&resolver, &config, "/notes.txt").unwrap(), content);
}

#[test]
fn test_write_creates_parents_and_overwrites() {
    let (_temp, resolver, config) = setup();
    write_text_file(&resolver, &config, "/deep/er/doc.md", "v1").unwrap();
    write_text_file(&resolver, &config, "/deep/er/doc.md", "v2").unwrap();
    assert_eq!(read_text_file(&resolver, &config, "/deep/er/doc.md").unwrap(), "v2");
    assert_eq!(names(&resolver, "/deep/er"), ["doc.md"]);
}

#[test]
fn test_write_extension_gate() {
    let (_temp, resolver, config) = setup();
    assert!(matches!(
        write_text_file(&resolver, &config, "/tool.exe", "MZ"),
        Err(StorageError::UnsupportedType(_))
    ));
    assert!(!resolver.root().join("tool.exe").exists());
    assert!(write_text_file(&resolver, &config, "/readme.md", "ok").is_ok());
}

#[test]
fn test_write_too_large_keeps_previous_content() {
    let (_temp, resolver, config) = setup();
    let config = DriveConfig {
        max_edit_size_bytes: 8,
        ..config
    };
    write_text_file(&resolver, &config, "/small.txt", "before").unwrap();

    let result = write_text_file(&resolver, &config, "/small.txt", "way too long");
    assert!(matches!(result, Err(StorageError::TooLarge { .. })));
    assert_eq!(read_text_file(&resolver, &config, "/small.txt").unwrap(), "before");
}

#[test]
fn test_read_errors() {
    let (_temp, resolver, config) = setup();
    fs::create_dir(resolver.root().join("dir.txt")).unwrap();
    fs::write(resolver.root().join("image.png"), [0x89, 0x50]).unwrap();
    fs::write(resolver.root().join("bad.txt"), [0xff, 0xfe, 0x00]).unwrap();
    fs::write(resolver.root().join("big.log"), vec![b'x'; 64]).unwrap();

    let small = DriveConfig {
        max_edit_size_bytes: 16,
        ..config.clone()
    };

    assert!(matches!(
        read_text_file(&resolver, &config, "/nope.txt"),
        Err(StorageError::NotFound(_))
    ));
    assert!(matches!(
        read_text_file(&resolver, &config, "/dir.txt"),
        Err(StorageError::IsADirectory(_))
    ));
    assert!(matches!(
        read_text_file(&resolver, &config, "/image.png"),
        Err(StorageError::UnsupportedType(_))
    ));
    assert!(matches!(
        read_text_file(&resolver, &config, "/bad.txt"),
        Err(StorageError::InvalidUtf8(_))
    ));
    assert!(matches!(
        read_text_file(&resolver, &small, "/big.log"),
        Err(StorageError::TooLarge { size: 64, limit: 16, .. })
    ));
}

#[test]
fn test_download_any_type() {
    let (_temp, resolver, _config) = setup();
    fs::create_dir(resolver.root().join("bin")).unwrap();
    fs::write(resolver.root().join("bin/app.exe"), [1, 2, 3]).unwrap();

    let target = prepare_download(&resolver, "bin//app.exe").unwrap();
    assert_eq!(target.file_name, "app.exe");
    assert_eq!(target.size, 3);
    assert_eq!(target.virtual_path, "/bin/app.exe");

    assert!(matches!(
        prepare_download(&resolver, "/bin"),
        Err(StorageError::IsADirectory(_))
    ));
}

#[test]
fn test_mkdir_nested_and_idempotent() {
    let (_temp, resolver, _config) = setup();
    let created = make_directory(&resolver, "/", "a/b/c").unwrap();
    assert_eq!(created, "/a/b/c");
    assert!(resolver.root().join("a/b/c").is_dir());
    assert_eq!(make_directory(&resolver, "/a/b", "c").unwrap(), "/a/b/c");
}

#[test]
fn test_mkdir_rejects_escaping_name() {
    let (_temp, resolver, _config) = setup();
    make_directory(&resolver, "/", "docs").unwrap();
    for name in ["../evil", "..", "x/../../evil"] {
        assert!(
            matches!(
                make_directory(&resolver, "/docs", name),
                Err(StorageError::PathTraversal(_))
            ),
            "{name:?}"
        );
    }
    assert!(matches!(
        make_directory(&resolver, "/docs", ""),
        Err(StorageError::InvalidPath(_))
    ));
    assert_eq!(names(&resolver, "/"), ["docs"]);
}

#[test]
fn test_mkdir_over_file_fails() {
    let (_temp, resolver, _config) = setup();
    fs::write(resolver.root().join("taken"), "x").unwrap();
    assert!(matches!(
        make_directory(&resolver, "/", "taken"),
        Err(StorageError::NotADirectory(_))
    ));
}

#[test]
fn test_rename_within_parent() {
    let (_temp, resolver, config) = setup();
    write_text_file(&resolver, &config, "/docs/old.txt", "data").unwrap();

    let renamed = rename_entry(&resolver, "/docs/old.txt", "new.txt").unwrap();
    assert_eq!(renamed, "/docs/new.txt");
    assert_eq!(names(&resolver, "/docs"), ["new.txt"]);
    assert_eq!(read_text_file(&resolver, &config, "/docs/new.txt").unwrap(), "data");
}

#[test]
fn test_rename_collision_is_blocked() {
    let (_temp, resolver, config) = setup();
    write_text_file(&resolver, &config, "/docs/a.txt", "a").unwrap();
    write_text_file(&resolver, &config, "/docs/b.txt", "b").unwrap();
    make_directory(&resolver, "/docs", "folder").unwrap();

    assert!(matches!(
        rename_entry(&resolver, "/docs/a.txt", "b.txt"),
        Err(StorageError::AlreadyExists(_))
    ));
    assert!(matches!(
        rename_entry(&resolver, "/docs/a.txt", "folder"),
        Err(StorageError::AlreadyExists(_))
    ));
    assert!(matches!(
        rename_entry(&resolver, "/docs/folder", "b.txt"),
        Err(StorageError::AlreadyExists(_))
    ));

    assert_eq!(read_text_file(&resolver, &config, "/docs/a.txt").unwrap(), "a");
    assert_eq!(read_text_file(&resolver, &config, "/docs/b.txt").unwrap(), "b");
}

#[test]
fn test_rename_errors() {
    let (_temp, resolver, config) = setup();
    write_text_file(&resolver, &config, "/docs/a.txt", "a").unwrap();

    assert!(matches!(
        rename_entry(&resolver, "/docs/missing.txt", "x.txt"),
        Err(StorageError::NotFound(_))
    ));
    assert!(matches!(
        rename_entry(&resolver, "/docs/a.txt", "../a.txt"),
        Err(StorageError::InvalidPath(_))
    ));
    assert!(matches!(
        rename_entry(&resolver, "/", "root2"),
        Err(StorageError::InvalidPath(_))
    ));
    assert!(rename_entry(&resolver, "/docs/a.txt", "a.txt").is_ok());
}

#[test]
fn test_delete_removes_subtree() {
    let (_temp, resolver, config) = setup();
    write_text_file(&resolver, &config, "/projects/one/readme.md", "1").unwrap();
    write_text_file(&resolver, &config, "/projects/one/deep/notes.txt", "2").unwrap();
    write_text_file(&resolver, &config, "/projects/two/log.log", "3").unwrap();
    write_text_file(&resolver, &config, "/keep.txt", "keep").unwrap();

    let result = delete_entry(&resolver, "/projects").unwrap();
    assert_eq!(result.virtual_path, "/projects");

    assert_eq!(names(&resolver, "/"), ["keep.txt"]);
    for path in ["/projects", "/projects/one", "/projects/one/deep", "/projects/two"] {
        assert!(
            matches!(list_directory(&resolver, path), Err(StorageError::NotFound(_))),
            "{path}"
        );
    }
}

#[test]
fn test_delete_errors() {
    let (_temp, resolver, _config) = setup();
    assert!(matches!(
        delete_entry(&resolver, "/ghost"),
        Err(StorageError::NotFound(_))
    ));
    assert!(matches!(
        delete_entry(&resolver, "/"),
        Err(StorageError::InvalidPath(_))
    ));
    assert!(matches!(
        delete_entry(&resolver, "/../.."),
        Err(StorageError::PathTraversal(_))
    ));
    assert!(resolver.root().exists());
}

#[test]
fn test_upload_rejects_escaping_item_and_keeps_sibling() {
    let (temp, resolver, _config) = setup();
    let config = DriveConfig::default();
    make_directory(&resolver, "/", "inbox").unwrap();

    let items = vec![
        UploadItem::new("photo.jpg", vec![1, 2, 3]),
        UploadItem::new("../escape.txt", b"gotcha".to_vec()),
    ];
    let report = save_uploads(&resolver, &config, "/inbox", &items).unwrap();

    assert_eq!(report.saved, ["photo.jpg"]);
    assert_eq!(report.rejected.len(), 1);
    assert_eq!(report.rejected[0].name, "../escape.txt");
    assert!(matches!(report.rejected[0].error, StorageError::PathTraversal(_)));

    assert_eq!(fs::read(resolver.root().join("inbox/photo.jpg")).unwrap(), [1, 2, 3]);
    assert!(!resolver.root().join("escape.txt").exists());
    assert!(!temp.path().join("escape.txt").exists());
    assert_eq!(names(&resolver, "/"), ["inbox"]);
}

#[test]
fn test_upload_overwrites_and_enforces_limits() {
    let (_temp, resolver, config) = setup();
    let config = DriveConfig {
        max_upload_file_bytes: 4,
        max_upload_files: 2,
        ..config
    };
    fs::write(resolver.root().join("a.bin"), "old").unwrap();

    let report = save_uploads(
        &resolver,
        &config,
        "/",
        &[UploadItem::new("a.bin", "new!"), UploadItem::new("b.bin", "12345")],
    )
    .unwrap();
    assert_eq!(report.saved, ["a.bin"]);
    assert!(matches!(report.rejected[0].error, StorageError::TooLarge { .. }));
    assert_eq!(fs::read_to_string(resolver.root().join("a.bin")).unwrap(), "new!");
    assert!(!resolver.root().join("b.bin").exists());

    let too_many = vec![UploadItem::new("x", "1"); 3];
    assert!(matches!(
        save_uploads(&resolver, &config, "/", &too_many),
        Err(StorageError::TooManyFiles { count: 3, limit: 2 })
    ));
}

#[test]
fn test_upload_target_must_be_directory() {
    let (_temp, resolver, config) = setup();
    fs::write(resolver.root().join("file.txt"), "x").unwrap();
    let items = [UploadItem::new("a.txt", "a")];

    assert!(matches!(
        save_uploads(&resolver, &config, "/missing", &items),
        Err(StorageError::NotFound(_))
    ));
    assert!(matches!(
        save_uploads(&resolver, &config, "/file.txt", &items),
        Err(StorageError::NotADirectory(_))
    ));
}

#[test]
fn test_stat_entry() {
    let (_temp, resolver, config) = setup();
    write_text_file(&resolver, &config, "/a/b.txt", "hello").unwrap();

    let file = stat_entry(&resolver, "/a/b.txt").unwrap();
    assert_eq!(file.name, "b.txt");
    assert_eq!(file.kind, EntryKind::File);
    assert_eq!(file.size, 5);
    assert!(file.modified_ms > 0);

    assert!(stat_entry(&resolver, "/a").unwrap().is_dir());
}

#[cfg(unix)]
#[test]
fn test_delete_stops_at_first_failure() {
    use std::os::unix::fs::PermissionsExt;

    let (_temp, resolver, config) = setup();
    write_text_file(&resolver, &config, "/tree/first.txt", "1").unwrap();
    write_text_file(&resolver, &config, "/tree/locked/inner.txt", "2").unwrap();
    let locked = resolver.root().join("tree/locked");
    fs::set_permissions(&locked, fs::Permissions::from_mode(0o500)).unwrap();

    // Privileged users ignore directory write bits; nothing to observe then.
    if fs::write(locked.join("write-check"), "x").is_ok() {
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();
        return;
    }

    let result = delete_entry(&resolver, "/tree");
    fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();

    match result {
        Err(StorageError::Io { path, .. }) => assert_eq!(path, "/tree/locked/inner.txt"),
        other => panic!("expected an IO failure, got {other:?}"),
    }
    assert!(!resolver.root().join("tree/first.txt").exists());
    assert!(resolver.root().join("tree/locked/inner.txt").exists());
    assert!(resolver.root().join("tree").is_dir());
}

#[cfg(unix)]
#[test]
fn test_writes_keep_file_mode() {
    use std::os::unix::fs::PermissionsExt;

    let (_temp, resolver, config) = setup();
    let mode = |name: &str| {
        fs::metadata(resolver.root().join(name))
            .unwrap()
            .permissions()
            .mode()
            & 0o777
    };

    fs::write(resolver.root().join("notes.txt"), "old").unwrap();
    fs::set_permissions(
        resolver.root().join("notes.txt"),
        fs::Permissions::from_mode(0o644),
    )
    .unwrap();
    write_text_file(&resolver, &config, "/notes.txt", "new").unwrap();
    assert_eq!(mode("notes.txt"), 0o644);

    fs::write(resolver.root().join("plain.bin"), "x").unwrap();
    save_uploads(&resolver, &config, "/", &[UploadItem::new("up.bin", "x")]).unwrap();
    assert_eq!(mode("up.bin"), mode("plain.bin"));
}
