//! Integration tests for Hoard

mod cli_tests {
    use assert_cmd::{cargo::cargo_bin_cmd, Command};
    use predicates::prelude::*;
    use std::path::Path;
    use tempfile::TempDir;

    /// A hoard command isolated from the user's config and CI environment
    fn hoard(config_dir: &Path) -> Command {
        let mut cmd = cargo_bin_cmd!("hoard");
        cmd.arg("--config")
            .arg(config_dir.join("config.toml"))
            .env_remove("HOARD_CACHE_PATH")
            .env_remove("GITHUB_ACTIONS")
            .env_remove("GITLAB_CI")
            .env_remove("RUST_LOG");
        cmd
    }

    #[test]
    fn help_displays() {
        let temp = TempDir::new().unwrap();
        hoard(temp.path())
            .arg("--help")
            .assert()
            .success()
            .stdout(predicate::str::contains("package-manager caches"));
    }

    #[test]
    fn version_displays() {
        let temp = TempDir::new().unwrap();
        hoard(temp.path())
            .arg("--version")
            .assert()
            .success()
            .stdout(predicate::str::contains("hoard"));
    }

    #[test]
    fn config_path() {
        let temp = TempDir::new().unwrap();
        hoard(temp.path())
            .args(["config", "path"])
            .assert()
            .success()
            .stdout(predicate::str::contains("config.toml"));
    }

    #[test]
    fn config_show_defaults() {
        let temp = TempDir::new().unwrap();
        hoard(temp.path())
            .args(["config", "show"])
            .assert()
            .success()
            .stdout(predicate::str::contains("[general]"))
            .stdout(predicate::str::contains("[cache]"));
    }

    #[test]
    fn invalid_config_fails() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join("config.toml"), "[cache\n").unwrap();
        hoard(temp.path())
            .args(["config", "show"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("Error:"));
    }

    #[test]
    fn modes_json_lists_every_mode() {
        let temp = TempDir::new().unwrap();
        let output = hoard(temp.path())
            .current_dir(temp.path())
            .args(["cache", "modes", "-o", "json"])
            .output()
            .unwrap();
        assert!(output.status.success());

        let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
        let modes = json["modes"].as_object().unwrap();
        assert_eq!(modes.len(), 22);
        for name in ["apt", "go", "pnpm", "rust", "xcode"] {
            assert!(modes[name]["detected"].is_boolean(), "{name}");
        }
    }

    #[test]
    fn mount_requires_modes_or_paths() {
        let temp = TempDir::new().unwrap();
        hoard(temp.path())
            .args(["cache", "mount"])
            .assert()
            .failure()
            .stderr(predicate::str::contains(
                "at least one cache mode or path must be specified",
            ))
            .stderr(predicate::str::contains("Hint:"));
    }

    #[test]
    fn mount_unknown_mode() {
        let temp = TempDir::new().unwrap();
        hoard(temp.path())
            .args(["cache", "mount", "--mode", "npm", "--cache-root"])
            .arg(temp.path())
            .assert()
            .failure()
            .stderr(predicate::str::contains("unknown mode: npm"));
    }

    #[test]
    fn mount_wildcard_mixed_with_names() {
        let temp = TempDir::new().unwrap();
        hoard(temp.path())
            .args(["cache", "mount", "--detect", "*,go", "--cache-root"])
            .arg(temp.path())
            .assert()
            .failure()
            .stderr(predicate::str::contains("unknown mode: *"));
    }

    #[test]
    fn mount_missing_cache_root() {
        let temp = TempDir::new().unwrap();
        hoard(temp.path())
            .args(["cache", "mount", "--path", "/data", "--cache-root"])
            .arg(temp.path().join("missing"))
            .assert()
            .failure()
            .stderr(predicate::str::contains("invalid cache root"));
    }

    #[test]
    fn mount_dry_run_reports_without_mounting() {
        let temp = TempDir::new().unwrap();
        let root = temp.path().join("cache");
        std::fs::create_dir(&root).unwrap();
        let target = temp.path().join("work").join("data");
        let eval_file = temp.path().join("env.sh");

        let output = hoard(temp.path())
            .args(["cache", "mount", "--dry-run", "true", "-o", "json", "--path"])
            .arg(&target)
            .arg("--cache-root")
            .arg(&root)
            .arg("--eval-file")
            .arg(&eval_file)
            .output()
            .unwrap();
        assert!(
            output.status.success(),
            "{}",
            String::from_utf8_lossy(&output.stderr)
        );

        let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
        assert_eq!(json["output"]["destructive_mode"], false);
        let mounts = json["output"]["mounts"].as_array().unwrap();
        assert_eq!(mounts.len(), 1);
        assert_eq!(mounts[0]["mount_path"], target.to_str().unwrap());
        assert_eq!(mounts[0]["cache_hit"], false);

        // Nothing touched on disk
        assert!(!target.exists());
        assert!(!root.join(".hoard").exists());
        assert!(!eval_file.exists());
    }

    #[test]
    fn mount_plain_summary() {
        let temp = TempDir::new().unwrap();
        let root = temp.path().join("cache");
        std::fs::create_dir(&root).unwrap();

        hoard(temp.path())
            .args(["cache", "mount", "--path", "/data", "--cache-root"])
            .arg(&root)
            .assert()
            .success()
            .stdout(predicate::str::contains("Dry run"))
            .stdout(predicate::str::contains("Mounts:"));
    }
}
