//! CLI arguments and deployment/server defaults.

use clap::{Args, Parser, Subcommand};
use shadow_rs::formatcp;

use crate::build;

const VERSION_INFO: &str = formatcp!(
    r#"{}\ncommit_hash: {}\nbuild_time: {}\nbuild_env: {},{}"#,
    build::PKG_VERSION,
    build::SHORT_COMMIT,
    build::BUILD_TIME,
    build::RUST_VERSION,
    build::RUST_CHANNEL
);

/// 上传扫描时排除的名称，对文件与目录做精确匹配。
pub const IGNORE_LIST: &[&str] = &[
    ".git",
    ".vscode",
    "node_modules",
    "__pycache__",
    "server.py",
    "deploy.py",
    "hash_calc.py",
    ".antigravityignore",
    "hash_output.txt",
    "new_hash.txt",
];
pub const BATCH_SIZE: usize = 10;
pub const DEFAULT_API_URL: &str = "https://neocities.org/api/upload";
pub const DEFAULT_PORT: u16 = 3000;
pub const SHUTDOWN_GRACE_SECS: u64 = 10;

#[derive(Parser, Debug)]
#[command(name = "sitekit", version = VERSION_INFO, about = "Static site deploy and admin tools")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Upload the site tree to the hosting API
    Deploy(DeployArgs),
    /// Serve the site locally with the admin save endpoint
    Serve(ServeArgs),
}

#[derive(Args, Debug, Clone)]
pub struct DeployArgs {
    #[arg(
        short = 'r',
        long,
        env = "SITEKIT_ROOT",
        default_value = ".",
        help = "Site root to upload"
    )]
    pub root: String,
    #[arg(
        long,
        env = "SITEKIT_API_URL",
        default_value = DEFAULT_API_URL,
        help = "Upload API endpoint"
    )]
    pub api_url: String,
    #[arg(
        long,
        env = "SITEKIT_API_KEY",
        hide_env_values = true,
        help = "API key (prompted for when absent)"
    )]
    pub api_key: Option<String>,
}

#[derive(Args, Debug, Clone)]
pub struct ServeArgs {
    #[arg(
        short = 'r',
        long,
        env = "SITEKIT_ROOT",
        default_value = ".",
        help = "Directory to serve and save into"
    )]
    pub root: String,
    #[arg(
        short = 'b',
        long,
        env = "SITEKIT_BIND",
        default_value = "0.0.0.0",
        help = "Bind address"
    )]
    pub host: String,
    #[arg(
        short = 'p',
        long,
        env = "SITEKIT_PORT",
        default_value_t = DEFAULT_PORT,
        help = "HTTP port"
    )]
    pub port: u16,
}
