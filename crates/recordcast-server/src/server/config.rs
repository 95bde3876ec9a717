use anyhow::bail;
use clap::{Parser, ValueEnum};
use core::time::Duration;

/// Deployment environment; selects the log format and default level.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    /// Pretty human-readable logs at `debug`.
    Local,
    /// JSON logs at `debug`.
    Dev,
    /// JSON logs at `info`.
    Prod,
}

/// Runtime configuration for the `recordcast-server` binary.
///
/// All values are parsed from CLI arguments or environment variables (a
/// `.env` file is loaded first), with defaults suitable for local runs.
#[derive(Parser, Debug, Clone)]
#[command(
    name = "recordcast-server",
    version,
    about = "An HTTP record service that encodes every record as JSON, XML and TOML"
)]
pub struct CliArgs {
    /// Deployment environment.
    ///
    /// Environment variable: `APP_ENV`
    #[arg(long, env = "APP_ENV", value_enum, default_value_t = Environment::Local)]
    pub env: Environment,

    /// Host to listen on. `localhost` listens on every interface.
    ///
    /// Environment variable: `SERVER_HOST`
    #[arg(long, env = "SERVER_HOST", default_value_t = String::from("localhost"))]
    pub host: String,

    /// Port to listen on.
    ///
    /// Environment variable: `SERVER_PORT`
    #[arg(long, env = "SERVER_PORT", default_value_t = 8080)]
    pub port: u16,

    /// Prefix every route is mounted under. Empty or `/` mounts at the root.
    ///
    /// Environment variable: `BASE_PATH`
    #[arg(long, env = "BASE_PATH", default_value_t = String::from("/test_task/api"))]
    pub base_path: String,

    /// Deadline for a whole request, covering the store read and the
    /// encode/collect phase.
    ///
    /// Environment variable: `REQUEST_TIMEOUT_MS`
    #[arg(long, env = "REQUEST_TIMEOUT_MS", default_value_t = 5_000)]
    pub request_timeout_ms: u64,

    /// SQLite database file. `:memory:` opens a private in-memory database.
    ///
    /// Environment variable: `DATABASE_PATH`
    #[arg(long, env = "DATABASE_PATH", default_value_t = String::from("recordcast.db"))]
    pub database_path: String,

    /// Number of encode worker tasks.
    ///
    /// Environment variable: `NUM_WORKERS`
    #[arg(long, env = "NUM_WORKERS", default_value_t = num_cpus::get())]
    pub num_workers: usize,

    /// Capacity of each worker's queue of pending encode tasks.
    ///
    /// A full queue applies backpressure to the dispatching request.
    ///
    /// Environment variable: `WORK_REQUEST_BUFFER_SIZE`
    #[arg(long, env = "WORK_REQUEST_BUFFER_SIZE", default_value_t = 64)]
    pub work_request_buffer_size: usize,

    /// Seconds to wait for each worker to acknowledge shutdown.
    ///
    /// Environment variable: `SHUTDOWN_TIMEOUT`
    #[arg(long, env = "SHUTDOWN_TIMEOUT", default_value_t = 3)]
    pub shutdown_timeout: u64,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub env: Environment,
    pub server_addr: String,
    pub base_path: String,
    pub request_timeout: Duration,
    pub database_path: String,
    pub num_workers: usize,
    pub work_request_buffer_size: usize,
    pub shutdown_timeout: Duration,
}

impl TryFrom<CliArgs> for ServerConfig {
    type Error = anyhow::Error;

    fn try_from(args: CliArgs) -> Result<Self, Self::Error> {
        if args.num_workers == 0 {
            bail!("NUM_WORKERS must be greater than 0");
        }

        if args.work_request_buffer_size == 0 {
            bail!("WORK_REQUEST_BUFFER_SIZE must be greater than 0");
        }

        if args.request_timeout_ms == 0 {
            bail!("REQUEST_TIMEOUT_MS must be greater than 0");
        }

        if args.database_path.is_empty() {
            bail!("DATABASE_PATH must not be empty");
        }

        Ok(Self {
            env: args.env,
            server_addr: server_addr(&args.host, args.port),
            base_path: normalize_base_path(&args.base_path)?,
            request_timeout: Duration::from_millis(args.request_timeout_ms),
            database_path: args.database_path,
            num_workers: args.num_workers,
            work_request_buffer_size: args.work_request_buffer_size,
            shutdown_timeout: Duration::from_secs(args.shutdown_timeout),
        })
    }
}

fn server_addr(host: &str, port: u16) -> String {
    if host == "localhost" {
        format!("0.0.0.0:{port}")
    } else {
        format!("{host}:{port}")
    }
}

/// Returns `""` for a root mount, otherwise `/segment[/segment...]` without a
/// trailing slash.
fn normalize_base_path(raw: &str) -> anyhow::Result<String> {
    let trimmed = raw.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        return Ok(String::new());
    }
    if trimmed.contains(['{', '}', '*']) {
        bail!("BASE_PATH ({raw}) must not contain route parameters or wildcards");
    }
    if trimmed.starts_with('/') {
        Ok(trimmed.to_string())
    } else {
        Ok(format!("/{trimmed}"))
    }
}

#[cfg(test)]
pub(crate) fn test_config() -> ServerConfig {
    ServerConfig {
        env: Environment::Local,
        server_addr: "127.0.0.1:0".to_string(),
        base_path: "/test_task/api".to_string(),
        request_timeout: Duration::from_secs(5),
        database_path: ":memory:".to_string(),
        num_workers: 2,
        work_request_buffer_size: 4,
        shutdown_timeout: Duration::from_secs(1),
    }
}
