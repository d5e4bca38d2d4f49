use crate::format_now;
use ansi_term::Color::{Blue, Cyan, Green, Red, Yellow};
use log::{Level, LevelFilter, Log, Metadata, Record, SetLoggerError};

/// Colored stdout logger used by the packaging tools.
/// Every line looks like `[time][thread][level]: message [file:line]`.
pub struct CommonLogger;

static LOGGER: CommonLogger = CommonLogger;

impl CommonLogger {
    /// Installs the logger globally and sets the max level.
    /// Fails if another logger has already been installed.
    pub fn install(level: LevelFilter) -> Result<(), SetLoggerError> {
        log::set_logger(&LOGGER)?;
        log::set_max_level(level);
        Ok(())
    }
}

fn colored_level(level: Level) -> ansi_term::Colour {
    match level {
        Level::Error => Red,
        Level::Warn => Yellow,
        Level::Info => Green,
        Level::Debug => Blue,
        Level::Trace => Cyan,
    }
}

impl Log for CommonLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }

        let formatted_date = format_now().unwrap_or("unknown".to_string());

        println!(
            "[{}][{:>8}][{:>14}]: {} [{}:{}]",
            Cyan.paint(formatted_date),
            Yellow
                .paint(std::thread::current().name().unwrap_or("main"))
                .to_string(),
            colored_level(record.level())
                .paint(record.level().to_string())
                .to_string(),
            record.args(),
            Green.paint(record.file().unwrap_or("unknown")),
            Green.paint(record.line().unwrap_or(0).to_string())
        );
    }

    fn flush(&self) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn levels_have_distinct_colors() {
        let levels = [
            Level::Error,
            Level::Warn,
            Level::Info,
            Level::Debug,
            Level::Trace,
        ];
        for (i, a) in levels.iter().enumerate() {
            for b in &levels[i + 1..] {
                assert_ne!(colored_level(*a), colored_level(*b));
            }
        }
    }
}
