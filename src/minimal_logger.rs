use log::{Level, LevelFilter, Metadata, Record};

pub struct MinimalLogger;

static LOGGER: MinimalLogger = MinimalLogger;

impl log::Log for MinimalLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        // stdout is reserved for the score, which sweep scripts parse.
        if record.level() > Level::Info {
            eprintln!("{:<5} [{}] {}", record.level(), record.target(), record.args())
        } else {
            eprintln!("{:<5} {}", record.level(), record.args())
        }
    }

    fn flush(&self) {}
}

pub fn init(level: LevelFilter) {
    if log::set_logger(&LOGGER).is_ok() {
        log::set_max_level(level);
    }
}
