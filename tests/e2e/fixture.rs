//! E2E test fixture with step logging and checkpointing.

use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::{Duration, Instant};

use rusqlite::Connection;
use tempfile::TempDir;

/// Checkpoint snapshot for test debugging.
#[derive(Debug, Clone)]
pub struct Checkpoint {
    pub name: String,
    pub timestamp: Duration,
    pub step_count: usize,
    pub db_state: Option<String>,
    pub files: Vec<PathBuf>,
}

#[derive(Debug, Clone)]
pub struct StepResult {
    pub name: String,
    pub success: bool,
    pub duration: Duration,
    pub output_summary: String,
}

/// Isolated data root plus a log of every command run against it.
pub struct E2EFixture {
    pub scenario_name: String,
    pub temp_dir: TempDir,
    /// Data root handed to jt through `JT_ROOT`
    pub root: PathBuf,
    pub config_path: PathBuf,
    /// Extra environment for every command, e.g. backend overrides
    pub env: Vec<(String, String)>,
    start_time: Instant,
    step_count: usize,
    checkpoints: Vec<Checkpoint>,
    step_results: Vec<StepResult>,
}

impl E2EFixture {
    pub fn new(scenario_name: &str) -> Self {
        let start_time = Instant::now();
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let root = temp_dir.path().join("data");
        let config_path = root.join("config.toml");
        std::fs::create_dir_all(&root).expect("Failed to create data root");

        println!();
        println!("{}", "█".repeat(70));
        println!("█ E2E SCENARIO: {scenario_name}");
        println!("{}", "█".repeat(70));
        println!("[E2E] Root: {root:?}");
        println!("[E2E] Config: {config_path:?}");

        Self {
            scenario_name: scenario_name.to_string(),
            temp_dir,
            root,
            config_path,
            env: Vec::new(),
            start_time,
            step_count: 0,
            checkpoints: Vec::new(),
            step_results: Vec::new(),
        }
    }

    /// Set an environment variable for subsequent commands.
    pub fn set_env(&mut self, key: &str, value: &str) {
        self.env.retain(|(k, _)| k != key);
        self.env.push((key.to_string(), value.to_string()));
        println!("[ENV] {key}={value}");
    }

    pub fn log_step(&mut self, description: &str) {
        self.step_count += 1;
        let elapsed = self.start_time.elapsed();

        println!();
        println!("┌{}", "─".repeat(68));
        println!("│ STEP {}: {}", self.step_count, description);
        println!("│ Time: {elapsed:?}");
        println!("└{}", "─".repeat(68));
    }

    pub fn checkpoint(&mut self, name: &str) {
        let mut files = Vec::new();
        collect_files(&self.root, &mut files);
        let db_state = self.db_state();

        println!("[CHECKPOINT] {name}");
        println!("[CHECKPOINT] Files: {}", files.len());
        if let Some(state) = &db_state {
            println!("[CHECKPOINT] DB: {state}");
        }

        self.checkpoints.push(Checkpoint {
            name: name.to_string(),
            timestamp: self.start_time.elapsed(),
            step_count: self.step_count,
            db_state,
            files,
        });
    }

    /// Run jt and capture its output.
    pub fn run_jt(&mut self, args: &[&str]) -> CommandOutput {
        let step_name = format!("jt {}", args.join(" "));
        let start = Instant::now();
        println!("[CMD] {step_name}");

        let mut command = Command::new(env!("CARGO_BIN_EXE_jt"));
        command
            .args(args)
            .env("JT_ROOT", &self.root)
            .env("JT_CONFIG", &self.config_path)
            .env_remove("RUST_LOG")
            .current_dir(self.temp_dir.path());
        for (key, value) in &self.env {
            command.env(key, value);
        }
        let output = command.output().expect("Failed to execute jt");

        let elapsed = start.elapsed();
        let result = CommandOutput {
            success: output.status.success(),
            exit_code: output.status.code().unwrap_or(-1),
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            elapsed,
        };

        println!("[CMD] Exit: {} ({elapsed:?})", result.exit_code);
        if !result.stdout.is_empty() {
            println!("[STDOUT] {}", truncate(&result.stdout, 500));
        }
        if !result.stderr.is_empty() {
            println!("[STDERR] {}", result.stderr);
        }

        let output_summary = if result.success {
            format!("OK ({})", truncate(&result.stdout, 50))
        } else {
            format!("FAIL: {}", truncate(&result.stderr, 100))
        };
        self.step_results.push(StepResult {
            name: step_name,
            success: result.success,
            duration: elapsed,
            output_summary,
        });
        result
    }

    /// Run jt in robot mode, assert success and return the `data` payload.
    pub fn robot(&mut self, args: &[&str]) -> serde_json::Value {
        let mut full = vec!["--robot"];
        full.extend_from_slice(args);
        let output = self.run_jt(&full);
        self.assert_success(&output, &args.join(" "));
        let json = output.json();
        assert_eq!(json["status"], "ok", "unexpected envelope: {json}");
        json["data"].clone()
    }

    pub fn write_file(&self, name: &str, content: &str) -> PathBuf {
        let path = self.temp_dir.path().join(name);
        std::fs::write(&path, content).expect("Failed to write file");
        println!("[FILE] {} ({} bytes)", path.display(), content.len());
        path
    }

    pub fn db_path(&self) -> PathBuf {
        self.root.join("jt.db")
    }

    pub fn assert_success(&self, output: &CommandOutput, operation: &str) {
        assert!(
            output.success,
            "[E2E] {operation} failed with exit code {}: {}",
            output.exit_code, output.stderr
        );
        println!("[ASSERT] {operation} - SUCCESS");
    }

    pub fn assert_output_contains(&self, output: &CommandOutput, expected: &str) {
        let found = output.stdout.contains(expected) || output.stderr.contains(expected);
        assert!(
            found,
            "[E2E] Output does not contain '{expected}'\nStdout: {}\nStderr: {}",
            truncate(&output.stdout, 500),
            truncate(&output.stderr, 500)
        );
        println!("[ASSERT] Output contains '{expected}' - PASSED");
    }

    /// Run `check` against the database file, if one exists.
    pub fn verify_db_state(&self, check: impl FnOnce(&Connection) -> bool, description: &str) {
        let db = Connection::open(self.db_path()).expect("Failed to open db");
        assert!(check(&db), "[E2E] Database check failed: {description}");
        println!("[ASSERT] DB: {description} - PASSED");
    }

    fn db_state(&self) -> Option<String> {
        let path = self.db_path();
        if !path.exists() {
            return None;
        }
        let db = Connection::open(path).ok()?;
        let count = db
            .query_row::<i64, _, _>("SELECT COUNT(*) FROM applications", [], |r| r.get(0))
            .ok()?;
        Some(format!("applications={count}"))
    }

    pub fn generate_report(&self) {
        println!();
        println!("{}", "█".repeat(70));
        println!("█ E2E REPORT: {}", self.scenario_name);
        println!("{}", "█".repeat(70));
        println!("Total Steps: {}", self.step_count);
        println!("Checkpoints: {}", self.checkpoints.len());
        println!("Total Time:  {:?}", self.start_time.elapsed());
        println!();
        for (i, step) in self.step_results.iter().enumerate() {
            let status = if step.success { "✓" } else { "✗" };
            println!("{:2}. {status} {} ({:?})", i + 1, step.name, step.duration);
            if !step.success {
                println!("     └─ {}", step.output_summary);
            }
        }
        for checkpoint in &self.checkpoints {
            println!(
                "  [{:?}] {} (step {}, {} files{})",
                checkpoint.timestamp,
                checkpoint.name,
                checkpoint.step_count,
                checkpoint.files.len(),
                checkpoint
                    .db_state
                    .as_deref()
                    .map(|s| format!(", {s}"))
                    .unwrap_or_default()
            );
        }
    }
}

impl Drop for E2EFixture {
    fn drop(&mut self) {
        println!();
        println!("█ E2E CLEANUP: {}", self.scenario_name);
        println!("█ Total time: {:?}", self.start_time.elapsed());
    }
}

pub struct CommandOutput {
    pub success: bool,
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
    pub elapsed: Duration,
}

impl CommandOutput {
    pub fn json(&self) -> serde_json::Value {
        serde_json::from_str(&self.stdout).expect("stdout should be valid JSON")
    }
}

fn collect_files(dir: &Path, out: &mut Vec<PathBuf>) {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return;
    };
    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            collect_files(&path, out);
        } else {
            out.push(path);
        }
    }
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        return s.to_string();
    }
    let cut: String = s.chars().take(max_len).collect();
    format!("{cut}...")
}
