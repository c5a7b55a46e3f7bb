use serde_json::Value;
use std::fs::{self, File};
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use tilecheck_kernel::token::has_image_extension;
use tilecheck_kernel::{LogHead, RunConfig};
use tracing_subscriber::EnvFilter;
use walkdir::WalkDir;

const LOG_EXTENSION: &str = "log";

pub fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

pub fn existing_dir_or_exit(path: &str, label: &str) -> PathBuf {
    let dir = PathBuf::from(path.trim());
    if !dir.is_dir() {
        eprintln!("error: confirm that the {label} folder ({}) exists", dir.display());
        std::process::exit(1);
    }
    dir
}

pub fn load_config_or_exit(path: Option<&str>) -> RunConfig {
    let Some(path) = path else {
        return RunConfig::default();
    };
    RunConfig::load(path).unwrap_or_else(|e| {
        eprintln!("error: {e}");
        std::process::exit(1);
    })
}

pub fn image_basenames_or_exit(dir: &Path) -> Vec<String> {
    let names = scan_image_basenames(dir).unwrap_or_else(|e| {
        eprintln!("error: failed to scan {}: {e}", dir.display());
        std::process::exit(1);
    });
    if names.is_empty() {
        eprintln!("error: no files to process in {}", dir.display());
        std::process::exit(1);
    }
    names
}

/// Basenames of every image file below `dir`, sorted. Symlinks are not
/// followed.
fn scan_image_basenames(dir: &Path) -> Result<Vec<String>, walkdir::Error> {
    let mut names = Vec::new();
    for entry in WalkDir::new(dir).follow_links(false) {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }
        if let Some(name) = entry.file_name().to_str()
            && has_image_extension(name)
        {
            names.push(name.to_string());
        }
    }
    names.sort();
    Ok(names)
}

/// First line of every `*.log` file directly inside `dir`.
pub fn read_log_heads(dir: &Path) -> Result<Vec<LogHead>, String> {
    let entries =
        fs::read_dir(dir).map_err(|e| format!("failed to read {}: {e}", dir.display()))?;
    let mut heads = Vec::new();
    for entry in entries {
        let path = entry
            .map_err(|e| format!("failed to read {}: {e}", dir.display()))?
            .path();
        if path.extension().and_then(|e| e.to_str()) != Some(LOG_EXTENSION) {
            continue;
        }
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        let file =
            File::open(&path).map_err(|e| format!("failed to open {}: {e}", path.display()))?;
        let mut first_line = String::new();
        BufReader::new(file)
            .read_line(&mut first_line)
            .map_err(|e| format!("failed to read {}: {e}", path.display()))?;
        heads.push(LogHead {
            name: name.to_string(),
            first_line,
        });
    }
    heads.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(heads)
}

pub fn print_json_or_exit(payload: &Value, label: &str) {
    let rendered = serde_json::to_string_pretty(payload).unwrap_or_else(|e| {
        eprintln!("error: failed to render {label} payload: {e}");
        std::process::exit(2);
    });
    println!("{rendered}");
}

pub fn join_display<T: ToString>(items: impl IntoIterator<Item = T>) -> String {
    items
        .into_iter()
        .map(|i| i.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}
