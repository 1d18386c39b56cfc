//! End-to-end runs against a shell script standing in for `dotnet new`

#![cfg(unix)]

use std::io::Cursor;
use std::os::unix::fs::PermissionsExt;
use std::path::Path;
use toolservice_core::{FailureKind, ProcessExecutor, ServiceConfig, TemplateService};

const FAKE_TOOL: &str = r#"#!/bin/sh
[ "$1" = "new" ] || exit 64
shift
row() { printf '%-16s%-12s%-10s%s\n' "$1" "$2" "$3" "$4"; }
case "$1" in
  --list)
    echo
    row "Template Name" "Short Name" "Language" "Tags"
    row "-------------" "----------" "--------" "----"
    row "Console App" "console" "[C#],F#" "Common/Console"
    row "Class Library" "classlib" "[C#]" "Common/Library"
    exit 0 ;;
  --install|--uninstall)
    exit 0 ;;
esac
template="$1"
shift
case "$template" in
  console|classlib) ;;
  *)
    printf "No templates found matching: '%s'.\n" "$template" >&2
    exit 14 ;;
esac
case "$1" in
  --help)
    printf '\nConsole App (C#)\nAuthor: Example\n\n'
    exit 0 ;;
  --output=*)
    name="${1#--output=}"
    mkdir -p "$name/Properties"
    echo 'class Program {}' > "$name/Program.cs"
    echo '{}' > "$name/Properties/launchSettings.json"
    echo "The template \"Console App\" was created successfully."
    exit 0 ;;
esac
exit 1
"#;

fn install_fake_tool(dir: &Path) -> String {
    let path = dir.join("fake-dotnet");
    std::fs::write(&path, FAKE_TOOL).unwrap();
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
    path.to_string_lossy().into_owned()
}

#[tokio::test]
async fn test_operations_against_fake_tool() {
    let tool_dir = tempfile::tempdir().unwrap();
    let work_root = tempfile::tempdir().unwrap();

    let config = ServiceConfig {
        command: install_fake_tool(tool_dir.path()),
        work_root: Some(work_root.path().to_path_buf()),
        ..ServiceConfig::default()
    };
    let service = TemplateService::new(config, ProcessExecutor::new());

    // list
    let templates = service.list().await.unwrap();
    assert_eq!(templates.keys().collect::<Vec<_>>(), ["classlib", "console"]);
    assert_eq!(templates["console"].name, "Console App");
    assert_eq!(templates["console"].languages, "[C#],F#");
    assert_eq!(templates["console"].tags, "Common/Console");

    // reinstalling a pack whose templates are already listed adds nothing new
    assert!(service.install("Example.Templates").await.unwrap().is_empty());

    // help
    let help = service.help("console").await.unwrap();
    assert_eq!(help, "Console App (C#)\nAuthor: Example");

    let err = service.help("nosuch").await.unwrap_err();
    assert_eq!(err.kind(), FailureKind::NotFound);
    assert_eq!(err.to_string(), "No templates found matching: 'nosuch'.");

    // generate
    let project = service
        .generate_project("console", Some("output=Joe,framework=net6.0"), "zip")
        .await
        .unwrap();
    assert_eq!(project.file_name, "Joe.zip");

    let mut archive = zip::ZipArchive::new(Cursor::new(project.bytes)).unwrap();
    let mut names: Vec<_> = (0..archive.len())
        .map(|i| archive.by_index(i).unwrap().name().to_string())
        .collect();
    names.sort();
    assert_eq!(
        names,
        [
            "Joe/",
            "Joe/Program.cs",
            "Joe/Properties/",
            "Joe/Properties/launchSettings.json",
        ]
    );

    let err = service
        .generate_project("nosuch", None, "zip")
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "Template 'nosuch' not found.");

    // every scratch directory was removed
    assert_eq!(std::fs::read_dir(work_root.path()).unwrap().count(), 0);

    // missing tool
    let missing = TemplateService::new(
        ServiceConfig {
            command: tool_dir.path().join("missing").to_string_lossy().into_owned(),
            ..ServiceConfig::default()
        },
        ProcessExecutor::new(),
    );
    assert_eq!(missing.list().await.unwrap_err().kind(), FailureKind::Unavailable);
}
