use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use env_logger::Env;

mod cli;

use cli::{Cli, load_render_config, run_cli};

fn xdg_config_dir() -> PathBuf {
    std::env::var_os("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .or_else(|| std::env::var_os("HOME").map(|home| PathBuf::from(home).join(".config")))
        .unwrap_or_else(|| PathBuf::from("/tmp"))
}

fn config_path_candidates() -> Vec<PathBuf> {
    vec![
        PathBuf::from("mailcanvas.toml"),
        xdg_config_dir().join("mailcanvas").join("mailcanvas.toml"),
    ]
}

fn load_config_text() -> Option<String> {
    for path in config_path_candidates() {
        if let Ok(content) = std::fs::read_to_string(&path) {
            log::debug!("using config {}", path.display());
            return Some(content);
        }
    }
    None
}

fn env_flag(name: &str) -> bool {
    std::env::var(name)
        .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
        .unwrap_or(false)
}

fn init_logging() {
    let default = if env_flag("MAILCANVAS_LOG") { "debug" } else { "warn" };
    env_logger::Builder::from_env(Env::default().default_filter_or(default)).init();
}

fn main() -> Result<()> {
    init_logging();
    let cli = Cli::parse();
    let config = load_render_config(load_config_text().as_deref(), |name| std::env::var(name).ok());
    run_cli(cli, config)
}
