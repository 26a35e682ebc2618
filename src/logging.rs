use std::path::{Path, PathBuf};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::EnvFilter;

/// Initialise logging. Without `debug` the level is forced to `info`, with it
/// `RUST_LOG` may override the default `debug` level. When `log_file` is set
/// output goes to that file instead of stderr. Calling this twice is a no-op.
pub fn init(debug: bool, log_file: Option<PathBuf>) {
    let level = if debug { "debug" } else { "info" };

    let filter = if debug {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level))
    } else {
        EnvFilter::new(level)
    };

    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    let mut file_error = None;
    let appender = log_file.and_then(|path| match file_appender(&path) {
        Ok(appender) => Some(appender),
        Err(err) => {
            file_error = Some((path, err));
            None
        }
    });

    let _ = match appender {
        Some(appender) => builder.with_writer(appender).with_ansi(false).try_init(),
        None => builder.try_init(),
    };

    if let Some((path, err)) = file_error {
        tracing::warn!(path = %path.display(), %err, "log file unavailable, logging to stderr");
    }
}

fn file_appender(path: &Path) -> Result<RollingFileAppender, tracing_appender::rolling::InitError> {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "pixel_converge.log".to_string());
    let dir = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
        _ => PathBuf::from("."),
    };
    RollingFileAppender::builder()
        .rotation(Rotation::NEVER)
        .filename_prefix(name)
        .build(dir)
}
