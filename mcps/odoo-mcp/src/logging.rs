//! Tracing setup
//!
//! Logs go to stderr; stdout carries the MCP stdio channel. `RUST_LOG` is
//! honoured, with `odoo_mcp` and `odoo_rpc` pinned to the configured level.
//! Set `LOG_FORMAT=json` for JSON lines.

use tracing_subscriber::filter::{Directive, LevelFilter};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const CRATES: [&str; 2] = ["odoo_mcp", "odoo_rpc"];

/// Per-crate filter directives for `level`
pub fn crate_directives(level: &str) -> anyhow::Result<Vec<Directive>> {
    level
        .parse::<LevelFilter>()
        .map_err(|_| anyhow::anyhow!("invalid log level '{}'", level))?;
    let level = level.to_ascii_lowercase();

    CRATES
        .iter()
        .map(|krate| -> anyhow::Result<Directive> {
            Ok(format!("{}={}", krate, level).parse()?)
        })
        .collect()
}

/// Install the global subscriber
pub fn init_tracing(level: &str) -> anyhow::Result<()> {
    let filter = crate_directives(level)?
        .into_iter()
        .fold(EnvFilter::from_default_env(), EnvFilter::add_directive);

    let use_json = std::env::var("LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    let registry = tracing_subscriber::registry().with(filter);

    if use_json {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr),
            )
            .init();
    } else {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_ansi(false),
            )
            .init();
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_directives_cover_both_crates() {
        let directives = crate_directives("debug").unwrap();
        let rendered: Vec<String> = directives
            .iter()
            .map(|d| d.to_string().to_ascii_lowercase())
            .collect();
        assert_eq!(rendered, vec!["odoo_mcp=debug", "odoo_rpc=debug"]);
    }

    #[test]
    fn test_unknown_level_is_rejected() {
        assert!(crate_directives("chatty").is_err());
    }
}
