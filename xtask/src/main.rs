use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::fs;
use std::path::Path;
use std::process::{Command, Stdio};

const DIST_DIR: &str = "dist";
const STATIC_DIR: &str = "extension/static";

#[derive(Parser)]
#[command(name = "xtask")]
#[command(about = "Explaina task runner", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the unpacked extension into dist/
    Build {
        /// Build wasm in release mode
        #[arg(short, long)]
        release: bool,
    },

    /// Run the explanation API server
    Serve {
        /// Config file (overrides CONFIG_PATH)
        #[arg(short, long)]
        config: Option<String>,
    },

    /// Run tests
    Test {
        #[command(subcommand)]
        test_type: Option<TestType>,
    },

    /// Run clippy linter
    Clippy,

    /// Remove build output
    Clean,
}

#[derive(Subcommand)]
enum TestType {
    /// Run all Rust tests
    Unit,

    /// Hit a running API server with a few requests
    Api {
        /// Server base URL
        #[arg(long, default_value = "http://127.0.0.1:8000")]
        url: String,

        /// Number of /explain requests
        #[arg(short, long, default_value = "3")]
        iterations: u64,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Build { release } => build(release),
        Commands::Serve { config } => serve(config),
        Commands::Test { test_type } => test(test_type),
        Commands::Clippy => clippy(),
        Commands::Clean => clean(),
    }
}

fn build(release: bool) -> Result<()> {
    println!("🔨 Building extension wasm...");
    let out_dir = format!("../{}/pkg", DIST_DIR);
    let mut args = vec!["build", "extension", "--target", "no-modules"];
    args.push(if release { "--release" } else { "--dev" });
    args.extend(["--out-dir", out_dir.as_str(), "--no-typescript"]);
    run_cmd("wasm-pack", &args)?;

    println!("📦 Copying static assets...");
    let entries = fs::read_dir(STATIC_DIR)
        .with_context(|| format!("Failed to read {}", STATIC_DIR))?;
    for entry in entries {
        let entry = entry?;
        let target = Path::new(DIST_DIR).join(entry.file_name());
        fs::copy(entry.path(), &target)
            .with_context(|| format!("Failed to copy {}", entry.path().display()))?;
    }

    // wasm-pack writes its own .gitignore and package.json
    let _ = fs::remove_file(Path::new(DIST_DIR).join("pkg/.gitignore"));
    let _ = fs::remove_file(Path::new(DIST_DIR).join("pkg/package.json"));

    println!("✅ Load {}/ as an unpacked extension", DIST_DIR);
    Ok(())
}

fn serve(config: Option<String>) -> Result<()> {
    println!("🚀 Starting Explaina API server...");
    let mut cmd = Command::new("cargo");
    cmd.args(["run", "-p", "explain-server"]);
    if let Some(path) = config {
        cmd.env("CONFIG_PATH", path);
    }
    let status = cmd
        .status()
        .context("Failed to run: cargo run -p explain-server")?;
    if !status.success() {
        anyhow::bail!("explain-server exited with {}", status);
    }
    Ok(())
}

fn test(test_type: Option<TestType>) -> Result<()> {
    match test_type {
        Some(TestType::Api { url, iterations }) => test_api(&url, iterations),
        Some(TestType::Unit) | None => {
            println!("🧪 Running all tests...");
            run_cmd("cargo", &["test", "--workspace"])
        }
    }
}

fn test_api(url: &str, iterations: u64) -> Result<()> {
    println!("🧪 Checking {}/health...", url);
    run_cmd("curl", &["-s", &format!("{}/health", url)])?;
    println!();

    let mut total_ms = 0;
    for i in 1..=iterations {
        print!("  Request {}/{}: ", i, iterations);
        let start = std::time::Instant::now();

        let output = Command::new("curl")
            .args([
                "-s",
                "-X",
                "POST",
                &format!("{}/explain", url),
                "-H",
                "Content-Type: application/json",
                "-d",
                r#"{"text": "photosynthesis", "context": "Plants rely on photosynthesis.", "style": "simple"}"#,
            ])
            .output()?;

        let duration_ms = start.elapsed().as_millis() as u64;
        total_ms += duration_ms;

        let response = String::from_utf8_lossy(&output.stdout);
        if response.contains("\"explanation\"") {
            println!("✅ ({}ms)", duration_ms);
        } else {
            println!("❌ Failed: {}", response);
        }
    }

    if iterations > 0 {
        println!();
        println!("  Average: {}ms per explanation", total_ms / iterations);
    }
    Ok(())
}

fn clippy() -> Result<()> {
    println!("🔍 Running clippy on workspace (warnings as errors)...");
    run_cmd(
        "cargo",
        &[
            "clippy",
            "--workspace",
            "--all-targets",
            "--",
            "-D",
            "warnings",
        ],
    )?;
    println!("🔍 Running clippy on the wasm target...");
    run_cmd(
        "cargo",
        &[
            "clippy",
            "-p",
            "explaina-extension",
            "--target",
            "wasm32-unknown-unknown",
            "--",
            "-D",
            "warnings",
        ],
    )?;
    Ok(())
}

fn clean() -> Result<()> {
    println!("🧹 Removing {}/ ...", DIST_DIR);
    // Ignore error if it was never built
    let _ = fs::remove_dir_all(DIST_DIR);

    run_cmd("cargo", &["clean"])?;
    Ok(())
}

// Helper functions

fn run_cmd(program: &str, args: &[&str]) -> Result<()> {
    let status = Command::new(program)
        .args(args)
        .stdin(Stdio::inherit())
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit())
        .status()
        .with_context(|| format!("Failed to run: {} {}", program, args.join(" ")))?;

    if !status.success() {
        anyhow::bail!("Command failed: {} {}", program, args.join(" "));
    }

    Ok(())
}
