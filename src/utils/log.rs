//! Simple logging module with macros.
//!
//! Lines go to stderr, coloured by level. The minimum level is read once from the
//! `QUOHA_LOG` environment variable (`debug`, `info`, `warn`, `error`, `off`) and
//! defaults to `info`.

use std::fmt::Display;
use std::io::Write;
use std::str::FromStr;
use std::sync::OnceLock;
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use termcolor::{Color, ColorChoice, ColorSpec, StandardStream, WriteColor};

/// Environment variable holding the minimum level.
pub const LEVEL_ENV: &str = "QUOHA_LOG";

/// Log level for filtering messages.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Level {
    Debug = 0,
    Info = 1,
    Warn = 2,
    Error = 3,
}

impl Display for Level {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Level::Debug => write!(f, "DEBUG"),
            Level::Info => write!(f, "INFO"),
            Level::Warn => write!(f, "WARN"),
            Level::Error => write!(f, "ERROR"),
        }
    }
}

/// Threshold value that suppresses every level.
const OFF: u8 = u8::MAX;

/// Parsed value of [`LEVEL_ENV`]: a level, or `None` for `off`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Threshold(pub Option<Level>);

impl FromStr for Threshold {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "debug" => Ok(Threshold(Some(Level::Debug))),
            "info" => Ok(Threshold(Some(Level::Info))),
            "warn" | "warning" => Ok(Threshold(Some(Level::Warn))),
            "error" => Ok(Threshold(Some(Level::Error))),
            "off" | "none" => Ok(Threshold(None)),
            other => Err(format!("unknown log level '{other}'")),
        }
    }
}

impl Threshold {
    fn as_u8(self) -> u8 {
        self.0.map_or(OFF, |level| level as u8)
    }
}

/// Converts days since Unix epoch to (year, month, day).
fn days_to_date(days: u64) -> (u32, u32, u32) {
    // Howard Hinnant's civil_from_days
    let z = days as i64 + 719468;
    let era = z.div_euclid(146097);
    let doe = z.rem_euclid(146097) as u32;
    let yoe = (doe - doe / 1460 + doe / 36524 - doe / 146096) / 365;
    let y = yoe as i64 + era * 400;
    let doy = doe - (365 * yoe + yoe / 4 - yoe / 100);
    let mp = (5 * doy + 2) / 153;
    let d = doy - (153 * mp + 2) / 5 + 1;
    let m = if mp < 10 { mp + 3 } else { mp - 9 };
    let y = if m <= 2 { y + 1 } else { y };
    (y as u32, m, d)
}

pub static SHOW_TIMESTAMP: AtomicBool = AtomicBool::new(true);
pub static SHOW_TYPE: AtomicBool = AtomicBool::new(true);

static MIN_LEVEL: AtomicU8 = AtomicU8::new(Level::Info as u8);
static ENV_LOADED: OnceLock<()> = OnceLock::new();

/// Overrides the minimum level; `None` silences the logger.
pub fn set_threshold(threshold: Threshold) {
    ENV_LOADED.get_or_init(|| ());
    MIN_LEVEL.store(threshold.as_u8(), Ordering::Relaxed);
}

/// Returns whether a message at `level` would be written.
pub fn enabled(level: Level) -> bool {
    ENV_LOADED.get_or_init(load_env);
    level as u8 >= MIN_LEVEL.load(Ordering::Relaxed)
}

fn load_env() {
    let Ok(raw) = std::env::var(LEVEL_ENV) else {
        return;
    };
    match raw.parse::<Threshold>() {
        Ok(threshold) => MIN_LEVEL.store(threshold.as_u8(), Ordering::Relaxed),
        Err(err) => {
            let _ = writeln!(std::io::stderr(), "{LEVEL_ENV}: {err}, keeping INFO");
        }
    }
}

/// Internal logging function. Use the `debug!`, `info!`, `warn!`, or `error!` macros instead.
#[doc(hidden)]
pub fn log(level: Level, message: &str) {
    if !enabled(level) {
        return;
    }
    let now = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default();
    let secs = now.as_secs();
    let days = secs / 86400;
    let (year, month, day) = days_to_date(days);
    let hours = (secs / 3600) % 24;
    let mins = (secs / 60) % 60;
    let s = secs % 60;
    let millis = now.subsec_millis();

    let mut stderr = StandardStream::stderr(ColorChoice::Auto);
    let mut spec = ColorSpec::new();
    match level {
        Level::Debug => {
            spec.set_fg(Some(Color::Cyan)).set_dimmed(true);
        }
        Level::Warn => {
            spec.set_fg(Some(Color::Yellow)).set_bold(true);
        }
        Level::Error => {
            spec.set_fg(Some(Color::Red)).set_bold(true);
        }
        Level::Info => {
            spec.clear();
        }
    }
    let _ = stderr.set_color(&spec);

    if SHOW_TIMESTAMP.load(Ordering::Relaxed) {
        let _ = write!(
            stderr,
            "{:04}-{:02}-{:02} {:02}:{:02}:{:02}.{:03} ",
            year, month, day, hours, mins, s, millis
        );
    }
    if SHOW_TYPE.load(Ordering::Relaxed) {
        let _ = write!(stderr, "[{:5}] ", level);
    }
    let _ = writeln!(stderr, "{}", message);
    let _ = stderr.reset();
}

/// Logs a debug-level message.
#[macro_export]
macro_rules! debug {
    ($($arg:tt)*) => {{
        if cfg!(not(test)) && $crate::utils::log::enabled($crate::utils::log::Level::Debug) {
            $crate::utils::log::log($crate::utils::log::Level::Debug, &format!($($arg)*))
        }
    }};
}

/// Logs an info-level message.
#[macro_export]
macro_rules! info {
    ($($arg:tt)*) => {{
        if cfg!(not(test)) {
            $crate::utils::log::log($crate::utils::log::Level::Info, &format!($($arg)*))
        }
    }};
}

/// Logs a warning-level message.
#[macro_export]
macro_rules! warn {
    ($($arg:tt)*) => {{
        if cfg!(not(test)) {
            $crate::utils::log::log($crate::utils::log::Level::Warn, &format!($($arg)*))
        }
    }};
}

/// Logs an error-level message.
#[macro_export]
macro_rules! error {
    ($($arg:tt)*) => {{
        if cfg!(not(test)) {
            $crate::utils::log::log($crate::utils::log::Level::Error, &format!($($arg)*))
        }
    }};
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn level_ordering() {
        assert!(Level::Debug < Level::Info);
        assert!(Level::Info < Level::Warn);
        assert!(Level::Warn < Level::Error);
    }

    #[test]
    fn level_display() {
        assert_eq!(format!("{}", Level::Debug), "DEBUG");
        assert_eq!(format!("{}", Level::Info), "INFO");
        assert_eq!(format!("{}", Level::Warn), "WARN");
        assert_eq!(format!("{}", Level::Error), "ERROR");
    }

    #[test]
    fn threshold_parsing() {
        assert_eq!("debug".parse(), Ok(Threshold(Some(Level::Debug))));
        assert_eq!(" WARN ".parse(), Ok(Threshold(Some(Level::Warn))));
        assert_eq!("error".parse(), Ok(Threshold(Some(Level::Error))));
        assert_eq!("off".parse(), Ok(Threshold(None)));
        assert!("verbose".parse::<Threshold>().is_err());
    }

    #[test]
    fn threshold_encoding() {
        assert_eq!(Threshold(Some(Level::Info)).as_u8(), 1);
        assert_eq!(Threshold(None).as_u8(), OFF);
        assert!(Level::Error as u8 > Level::Warn as u8);
    }

    #[test]
    fn threshold_filters_levels() {
        set_threshold(Threshold(Some(Level::Warn)));
        assert!(!enabled(Level::Debug));
        assert!(!enabled(Level::Info));
        assert!(enabled(Level::Warn));
        assert!(enabled(Level::Error));

        set_threshold(Threshold(None));
        for level in [Level::Debug, Level::Info, Level::Warn, Level::Error] {
            assert!(!enabled(level));
        }

        set_threshold(Threshold(Some(Level::Debug)));
        assert!(enabled(Level::Debug));

        set_threshold(Threshold(Some(Level::Info)));
    }

    #[test]
    fn days_to_date_epoch() {
        let (year, month, day) = days_to_date(0);
        assert_eq!(year, 1970);
        assert_eq!(month, 1);
        assert_eq!(day, 1);
    }

    #[test]
    fn days_to_date_known_date() {
        // 2024-01-01 is 19723 days after epoch
        let (year, month, day) = days_to_date(19723);
        assert_eq!(year, 2024);
        assert_eq!(month, 1);
        assert_eq!(day, 1);
    }

    #[test]
    fn days_to_date_leap_year() {
        // 2024-02-29 (leap day) is 19782 days after epoch
        let (year, month, day) = days_to_date(19782);
        assert_eq!(year, 2024);
        assert_eq!(month, 2);
        assert_eq!(day, 29);
    }
}
