use author_gender::config::VerbositySetting;

use crate::cli::Cli;

pub(crate) fn no_color_env_requested() -> bool {
    std::env::var_os("NO_COLOR").is_some_and(|value| !value.is_empty())
}

pub(crate) fn is_dumb_terminal() -> bool {
    std::env::var("TERM")
        .map(|value| value.eq_ignore_ascii_case("dumb"))
        .unwrap_or(false)
}

pub(crate) fn should_disable_color(
    no_color_flag: bool,
    no_color_env: bool,
    dumb_terminal: bool,
) -> bool {
    no_color_flag || no_color_env || dumb_terminal
}

pub(crate) fn is_no_color_requested(cli: &Cli) -> bool {
    should_disable_color(cli.no_color, no_color_env_requested(), is_dumb_terminal())
}

pub(crate) fn should_use_spinner(
    stderr_is_terminal: bool,
    quiet: bool,
    dumb_terminal: bool,
) -> bool {
    stderr_is_terminal && !quiet && !dumb_terminal
}

/// Default log level: CLI `-q`/`-v` first, then the config file, then `info`.
///
/// `RUST_LOG` still wins over the result, see [`init_tracing`].
pub(crate) fn resolve_default_log_level(
    quiet: bool,
    verbose: u8,
    config: Option<VerbositySetting>,
) -> &'static str {
    if quiet {
        return "error";
    }
    match verbose {
        0 => config.map_or("info", VerbositySetting::tracing_level),
        1 => "debug",
        _ => "trace",
    }
}

pub(crate) fn init_tracing(default_level: &str, no_color: bool) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_ansi(!no_color)
        .with_env_filter(filter)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_should_disable_color_any_source() {
        assert!(!should_disable_color(false, false, false));
        assert!(should_disable_color(true, false, false));
        assert!(should_disable_color(false, true, false));
        assert!(should_disable_color(false, false, true));
    }

    #[test]
    fn test_should_use_spinner_only_on_interactive_terminal() {
        assert!(should_use_spinner(true, false, false));
        assert!(!should_use_spinner(false, false, false));
        assert!(!should_use_spinner(true, true, false));
        assert!(!should_use_spinner(true, false, true));
    }

    #[test]
    fn test_resolve_default_log_level_priority() {
        assert_eq!(resolve_default_log_level(false, 0, None), "info");
        assert_eq!(
            resolve_default_log_level(false, 0, Some(VerbositySetting::Verbose)),
            "debug"
        );
        assert_eq!(
            resolve_default_log_level(false, 2, Some(VerbositySetting::Quiet)),
            "trace"
        );
        assert_eq!(
            resolve_default_log_level(true, 0, Some(VerbositySetting::Debug)),
            "error"
        );
    }
}
