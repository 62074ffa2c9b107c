//! Integration tests for the pcat binary
//!
//! Each test copies the fixture personas into a temp directory and drives
//! the real binary against it:
//! - Listing and resolving personas
//! - Creating and editing persona documents
//! - Image bookkeeping
//! - Offline startup validation

use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use tempfile::TempDir;
use walkdir::WalkDir;

const API_VARS: &[&str] = &[
    "MEETING_BAAS_API_KEY",
    "OPENAI_API_KEY",
    "CARTESIA_API_KEY",
    "DEEPGRAM_API_KEY",
    "GLADIA_API_KEY",
    "PORT",
];

/// Helper to get the pcat binary path
fn pcat_binary() -> PathBuf {
    // When running tests, the binary is in target/debug/pcat
    let mut path = std::env::current_exe().unwrap();
    path.pop(); // Remove test binary name
    path.pop(); // Remove deps
    path.push("pcat");
    path
}

/// Temp workspace: a pcat home with an empty config and a copy of the fixture personas
struct Workspace {
    dir: TempDir,
}

impl Workspace {
    fn new() -> Self {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("home")).unwrap();
        fs::write(dir.path().join("home").join("pcat.yaml"), "log_level: debug\n").unwrap();

        let fixtures = Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/personas");
        copy_tree(&fixtures, &dir.path().join("personas"));

        Self { dir }
    }

    fn personas(&self) -> PathBuf {
        self.dir.path().join("personas")
    }

    fn command(&self, args: &[&str]) -> Command {
        let mut cmd = Command::new(pcat_binary());
        cmd.current_dir(self.dir.path())
            .env("PCAT_DIR", self.dir.path().join("home"))
            .env("XDG_DATA_HOME", self.dir.path().join("data"))
            .env("NO_COLOR", "1")
            .env_remove("PCAT_CONFIG")
            .env_remove("RUST_LOG")
            .arg("--personas")
            .arg(self.personas())
            .args(args);
        for var in API_VARS {
            cmd.env_remove(var);
        }
        cmd
    }

    fn run(&self, args: &[&str]) -> Output {
        self.command(args).output().expect("Failed to execute pcat")
    }

    fn run_json(&self, args: &[&str]) -> serde_json::Value {
        let output = self.run(args);
        assert!(
            output.status.success(),
            "pcat {:?} failed: {}",
            args,
            String::from_utf8_lossy(&output.stderr)
        );
        serde_json::from_slice(&output.stdout).expect("stdout should be JSON")
    }

    fn readme(&self, key: &str) -> String {
        fs::read_to_string(self.personas().join(key).join("README.md")).unwrap()
    }
}

fn copy_tree(from: &Path, to: &Path) {
    for entry in WalkDir::new(from) {
        let entry = entry.unwrap();
        let target = to.join(entry.path().strip_prefix(from).unwrap());
        if entry.file_type().is_dir() {
            fs::create_dir_all(&target).unwrap();
        } else {
            fs::copy(entry.path(), &target).unwrap();
        }
    }
}

#[test]
fn test_list_skips_broken_personas() {
    let ws = Workspace::new();

    let output = ws.run(&["list", "-o", "json"]);
    assert!(output.status.success());

    let listed: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let keys: Vec<&str> = listed
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["key"].as_str().unwrap())
        .collect();
    assert_eq!(keys, vec!["friendly_coach", "tech_guru"]);

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("broken_title_only"));
    assert!(stderr.contains("no_readme"));
}

#[test]
fn test_list_quiet_hides_skip_warnings() {
    let ws = Workspace::new();

    let output = ws.run(&["--quiet", "list", "-o", "json"]);
    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).trim().is_empty());
}

#[test]
fn test_show_exact_key() {
    let ws = Workspace::new();

    let shown = ws.run_json(&["show", "tech_guru", "-o", "json"]);

    assert_eq!(shown["key"], "tech_guru");
    assert_eq!(shown["name"], "Tech Guru");
    assert_eq!(shown["gender"], "MALE");
    assert_eq!(shown["cartesia_voice_id"], "3b2a0f1e-guru");
    assert_eq!(shown["relevant_links"].as_array().unwrap().len(), 2);
    assert!(shown["path"].as_str().unwrap().ends_with("tech_guru"));

    let prompt = shown["prompt"].as_str().unwrap();
    assert!(prompt.starts_with("You are a seasoned software engineer"));
    assert!(prompt.contains("Remember:"));

    let extra = shown["additional_content"].as_str().unwrap();
    assert!(extra.starts_with("# Content from war_stories.md"));
}

#[test]
fn test_show_display_name_and_fuzzy_words() {
    let ws = Workspace::new();

    let by_name = ws.run_json(&["show", "Friendly Coach", "-o", "json"]);
    assert_eq!(by_name["key"], "friendly_coach");

    let fuzzy = ws.run_json(&["show", "the guru of tech", "-o", "json"]);
    assert_eq!(fuzzy["key"], "tech_guru");
}

#[test]
fn test_show_unknown_persona_lists_options() {
    let ws = Workspace::new();

    let output = ws.run(&["show", "pirate captain", "-o", "json"]);
    assert!(!output.status.success());

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Persona 'pirate captain' not found"));
    assert!(stderr.contains("friendly_coach, tech_guru"));
}

#[test]
fn test_show_seeded_random_is_repeatable() {
    let ws = Workspace::new();

    let first = ws.run_json(&["show", "--seed", "42", "-o", "json"]);
    let second = ws.run_json(&["show", "--seed", "42", "-o", "json"]);

    assert_eq!(first["key"], second["key"]);
    let key = first["key"].as_str().unwrap();
    assert!(key == "friendly_coach" || key == "tech_guru");
}

#[test]
fn test_show_seeded_reports_skipped_personas() {
    let ws = Workspace::new();

    let output = ws.run(&["show", "--seed", "7", "-o", "json"]);
    assert!(output.status.success());

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Skipped persona"));
    assert!(stderr.contains("broken_title_only"));
    assert!(stderr.contains("no_readme"));
}

#[test]
fn test_find_by_display_name() {
    let ws = Workspace::new();

    let found = ws.run_json(&["find", "Friendly Coach", "-o", "json"]);
    assert_eq!(found["gender"], "FEMALE");
    assert_eq!(found["image"], "https://cdn.example.com/coach.jpg");

    let output = ws.run(&["find", "friendly coach", "-o", "json"]);
    assert!(!output.status.success());
}

#[test]
fn test_edit_creates_new_persona() {
    let ws = Workspace::new();

    let output = ws.run(&[
        "edit",
        "night_owl",
        "--name",
        "Night Owl",
        "--prompt",
        "You only come alive after midnight.",
        "--gender",
        "female",
        "--link",
        "https://example.com/owls",
    ]);
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));

    let readme = ws.readme("night_owl");
    assert!(readme.starts_with("# Night Owl\n\nYou only come alive after midnight."));
    assert!(readme.contains("- gender: FEMALE"));
    assert!(readme.contains("- relevant_links: https://example.com/owls"));
    assert!(readme.contains("- entry_message: Hello everyone, I'm here to listen"));

    let shown = ws.run_json(&["show", "night_owl", "-o", "json"]);
    assert_eq!(shown["name"], "Night Owl");
}

#[test]
fn test_edit_new_persona_requires_name() {
    let ws = Workspace::new();

    let output = ws.run(&["edit", "ghost", "--prompt", "Boo."]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("needs --name"));
    assert!(!ws.personas().join("ghost").exists());
}

#[test]
fn test_edit_rejects_key_outside_root() {
    let ws = Workspace::new();

    let output = ws.run(&["edit", "../escaped", "--name", "Escapee", "--prompt", "Out."]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("Invalid persona key '../escaped'"));
    assert!(!ws.dir.path().join("escaped").exists());
}

#[test]
fn test_edit_rejects_prompt_with_section_heading() {
    let ws = Workspace::new();

    let output = ws.run(&["edit", "night_owl", "--name", "Night Owl", "--prompt", "Awake.\n## Notes\nlate"]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("line starting with '## '"));
    assert!(!ws.personas().join("night_owl").exists());
}

#[test]
fn test_edit_existing_keeps_unset_fields() {
    let ws = Workspace::new();

    let output = ws.run(&["edit", "tech_guru", "--voice-id", "new-voice"]);
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));

    let readme = ws.readme("tech_guru");
    assert!(readme.contains("- cartesia_voice_id: new-voice"));
    assert!(readme.contains("- image: https://utfs.uploadthing.com/f/tech-guru.png"));
    assert!(readme.contains("- entry_message: Hey folks, the guru is in."));
    assert!(readme.contains("- gender: MALE"));

    // Extra markdown files are never rewritten
    assert!(ws.personas().join("tech_guru").join("war_stories.md").exists());
}

#[test]
fn test_image_set_and_pending() {
    let ws = Workspace::new();

    let pending = ws.run_json(&["image", "pending", "-o", "json"]);
    let pending = pending.as_object().unwrap();
    assert_eq!(pending.len(), 1);
    assert!(pending.contains_key("friendly_coach"));

    let output = ws.run(&["image", "set", "friendly_coach", "https://utfs.uploadthing.com/f/coach.png"]);
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    assert!(ws.readme("friendly_coach").contains("- image: https://utfs.uploadthing.com/f/coach.png"));

    let pending = ws.run_json(&["image", "pending", "-o", "json"]);
    assert!(pending.as_object().unwrap().is_empty());

    let output = ws.run(&["image", "set", "nobody", "x.png"]);
    assert!(!output.status.success());
}

#[test]
fn test_save_rewrites_with_template() {
    let ws = Workspace::new();

    let output = ws.run(&["save"]);
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));

    let coach = ws.readme("friendly_coach");
    assert!(coach.contains("## Characteristics"));
    assert!(coach.contains("## Voice\nFriendly Coach speaks with:"));
    assert!(coach.contains("- gender: FEMALE"));

    // A second save leaves the documents unchanged
    let guru = ws.readme("tech_guru");
    let output = ws.run(&["save"]);
    assert!(output.status.success());
    assert_eq!(ws.readme("friendly_coach"), coach);
    assert_eq!(ws.readme("tech_guru"), guru);
}

#[test]
fn test_validate_offline_passes_with_keys() {
    let ws = Workspace::new();

    let output = ws
        .command(&["validate", "--offline", "-o", "json"])
        .env("MEETING_BAAS_API_KEY", "mb-key")
        .env("OPENAI_API_KEY", "sk-key")
        .env("CARTESIA_API_KEY", "ca-key")
        .env("GLADIA_API_KEY", "gl-key")
        .env("PORT", "8123")
        .output()
        .unwrap();
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));

    let result: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert!(result["report"]["env_errors"].as_array().unwrap().is_empty());
    assert_eq!(result["report"]["personas"]["count"], 2);
    assert_eq!(
        result["report"]["personas"]["skipped"],
        serde_json::json!(["broken_title_only", "no_readme"])
    );
    assert_eq!(result["summary"]["persona_count"], 2);
    assert_eq!(result["summary"]["port"], 8123);
}

#[test]
fn test_validate_missing_keys_fails() {
    let ws = Workspace::new();

    let output = ws.run(&["validate", "--offline", "-o", "json"]);
    assert!(!output.status.success());

    let result: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let errors = result["report"]["env_errors"].as_array().unwrap();
    assert!(errors.iter().any(|e| e.as_str().unwrap().contains("OPENAI_API_KEY")));
    assert!(errors.iter().any(|e| e.as_str().unwrap().contains("Missing STT provider")));
    assert!(result["summary"].is_null());
}

#[test]
fn test_validate_empty_catalog_fails() {
    let ws = Workspace::new();
    fs::remove_dir_all(ws.personas()).unwrap();
    fs::create_dir_all(ws.personas()).unwrap();

    let output = ws
        .command(&["validate", "--offline", "-o", "json"])
        .env("MEETING_BAAS_API_KEY", "mb-key")
        .env("OPENAI_API_KEY", "sk-key")
        .env("CARTESIA_API_KEY", "ca-key")
        .env("DEEPGRAM_API_KEY", "dg-key")
        .output()
        .unwrap();
    assert!(!output.status.success());

    let result: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(result["report"]["personas"]["valid"], false);
}

#[test]
fn test_config_get_reads_pcat_dir_config() {
    let ws = Workspace::new();

    let output = ws.run(&["config", "get", "log_level"]);
    assert!(output.status.success());
    assert_eq!(String::from_utf8_lossy(&output.stdout).trim(), "debug");
}
