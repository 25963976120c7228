use std::path::PathBuf;
use std::process::{Command, Output};

use tempfile::TempDir;

pub fn run_thryve(args: &[&str]) -> Output {
    TestEnv::new().run(args)
}

pub struct TestEnv {
    home: TempDir,
    config: TempDir,
    data: TempDir,
}

impl TestEnv {
    pub fn new() -> Self {
        Self {
            home: tempfile::tempdir().expect("create temporary HOME dir"),
            config: tempfile::tempdir().expect("create temporary XDG config dir"),
            data: tempfile::tempdir().expect("create temporary XDG data dir"),
        }
    }

    pub fn run(&self, args: &[&str]) -> Output {
        Command::new(env!("CARGO_BIN_EXE_thryve"))
            .args(args)
            .env("HOME", self.home.path())
            .env("XDG_CONFIG_HOME", self.config.path())
            .env("XDG_DATA_HOME", self.data.path())
            .env_remove("RUST_LOG")
            .env_remove("THRYVE_RETELL_API_KEY")
            .env_remove("THRYVE_AGENT_ID")
            .env_remove("THRYVE_FROM_NUMBER")
            .env_remove("THRYVE_GEMINI_API_KEY")
            .output()
            .expect("failed to execute thryve binary")
    }

    #[allow(dead_code)]
    pub fn config_path(&self) -> PathBuf {
        let output = self.run(&["config", "path"]);
        assert!(
            output.status.success(),
            "config path should succeed\nstdout:\n{}\nstderr:\n{}",
            String::from_utf8_lossy(&output.stdout),
            String::from_utf8_lossy(&output.stderr),
        );

        let path = String::from_utf8_lossy(&output.stdout);
        PathBuf::from(path.trim())
    }

    #[allow(dead_code)]
    pub fn write_config(&self, contents: &str) {
        let config_path = self.config_path();
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent).expect("create config parent directory");
        }
        std::fs::write(&config_path, contents).expect("write config file");
    }

    /// Point the provider at `endpoint` with fast polling.
    #[allow(dead_code)]
    pub fn write_provider_config(&self, endpoint: &str) {
        self.write_config(&format!(
            r#"
[provider]
api_key = "key_test"
agent_id = "agent_health"
from_number = "+14155550100"
endpoint = "{}"
request_timeout_secs = 2

[polling]
interval_ms = 10
analysis_pending_limit = 3
"#,
            endpoint
        ));
    }
}
