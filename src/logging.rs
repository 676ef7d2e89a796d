use std::sync::Mutex;
use log::LevelFilter;
use log4rs::append::console::ConsoleAppender;
use log4rs::append::file::FileAppender;
use log4rs::config::{Appender, Config, Root};
use log4rs::encode::pattern::PatternEncoder;
use log4rs::Handle;
use thiserror::Error;

const PATTERN: &str = "{d(%Y-%m-%d %H:%M:%S)} {l} - {m}{n}";

// log4rs can only be installed once per process, later setups swap the config on this handle
static LOGGER: Mutex<Option<Handle>> = Mutex::new(None);

/// Sets up log4rs with an optional file appender and an optional stdout appender.
/// If the logger is already installed its configuration is replaced.
///
/// # Arguments
///
/// * 'log_path' - file to append log lines to, if any
/// * 'log_level' - root log level
/// * 'log_to_stdout' - whether to also log to stdout
pub fn setup_logger(log_path: Option<&str>, log_level: LevelFilter, log_to_stdout: bool) -> Result<(), LoggerError> {
    let mut builder = Config::builder();
    let mut root = Root::builder();

    if let Some(path) = log_path {
        let file = FileAppender::builder()
            .encoder(Box::new(PatternEncoder::new(PATTERN)))
            .build(path)
            .map_err(|e| LoggerError(format!("error creating log file {}: {}", path, e)))?;

        builder = builder.appender(Appender::builder().build("file", Box::new(file)));
        root = root.appender("file");
    }

    if log_to_stdout {
        let stdout = ConsoleAppender::builder()
            .encoder(Box::new(PatternEncoder::new(PATTERN)))
            .build();

        builder = builder.appender(Appender::builder().build("stdout", Box::new(stdout)));
        root = root.appender("stdout");
    }

    let config = builder
        .build(root.build(log_level))
        .map_err(|e| LoggerError(e.to_string()))?;

    let mut logger = LOGGER.lock()
        .map_err(|e| LoggerError(format!("logger lock poisoned: {}", e)))?;

    if let Some(handle) = logger.as_ref() {
        handle.set_config(config);
        return Ok(());
    }

    let handle = log4rs::init_config(config).map_err(|e| LoggerError(e.to_string()))?;
    *logger = Some(handle);

    Ok(())
}

/// Error depicting errors that occur while setting up the logger
///
#[derive(Debug, Error)]
#[error("LoggerError: {0}")]
pub struct LoggerError(pub String);
