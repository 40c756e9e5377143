use crate::config::{Config, schema::LogConfig};
use candid::CandidType;
use derive_more::Display;
use serde::{Deserialize, Serialize};
use std::{cell::RefCell, collections::VecDeque};

///
/// Level
///

#[derive(
    Debug, Clone, Copy, Eq, PartialEq, Ord, PartialOrd, CandidType, Display, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Debug, // least severe
    Info,
    Ok,
    Warn,
    Error, // most severe
}

///
/// Topic
///

#[derive(Clone, Copy, Debug, Display, Eq, PartialEq)]
#[remain::sorted]
pub enum Topic {
    Access,
    Config,
    Deploy,
    Instance,
    Ledger,
    Registry,
}

///
/// LogEntry
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct LogEntry {
    pub crate_name: String,
    pub topic: Option<String>,
    pub level: Level,
    pub message: String,
}

//
// LOG_BUFFER
//

thread_local! {
    static LOG_BUFFER: RefCell<VecDeque<LogEntry>> = const { RefCell::new(VecDeque::new()) };
}

#[macro_export]
macro_rules! log {
    // =========================================
    // (1) With topic (normal + trailing comma)
    // =========================================
    ($topic:expr, $level:ident, $fmt:expr $(, $arg:expr)* $(,)?) => {{
        let topic = $topic.to_string();
        $crate::log!(@inner Some(topic.as_str()), $crate::log::Level::$level, $fmt $(, $arg)*);
    }};

    // =========================================
    // (2) No topic (normal + trailing comma)
    // =========================================
    ($level:ident, $fmt:expr $(, $arg:expr)* $(,)?) => {{
        $crate::log!(@inner None::<&str>, $crate::log::Level::$level, $fmt $(, $arg)*);
    }};

    // =========================================
    // INTERNAL
    // =========================================
    (@inner $topic:expr, $level:expr, $fmt:expr $(, $arg:expr)*) => {{
        let level = $level;
        let topic_opt: Option<&str> = $topic;
        let message = format!($fmt $(, $arg)*);

        // append entry; print only what passes the configured level
        let crate_name = env!("CARGO_PKG_NAME");
        if $crate::log::__append_to_buffer(crate_name, topic_opt, level, &message) {
            let topic_centered = format!("{:^9}", topic_opt.unwrap_or("..."));

            let (color, reset) = match level {
                $crate::log::Level::Ok    => ("\x1b[32m", "\x1b[0m"),
                $crate::log::Level::Info  => ("\x1b[34m", "\x1b[0m"),
                $crate::log::Level::Warn  => ("\x1b[33m", "\x1b[0m"),
                $crate::log::Level::Error => ("\x1b[31m", "\x1b[0m"),
                $crate::log::Level::Debug => ("", ""),
            };

            let label = format!("{color}{:^5}{reset}", level.to_string().to_uppercase());
            eprintln!("{label}|{topic_centered}| {message}");
        }
    }};
}

///
/// Buffer access
///

/// Snapshot of the buffered entries on the current thread, oldest first.
#[must_use]
pub fn entries() -> Vec<LogEntry> {
    LOG_BUFFER.with_borrow(|buf| buf.iter().cloned().collect())
}

pub fn clear() {
    LOG_BUFFER.with_borrow_mut(VecDeque::clear);
}

///
/// Helpers
///

#[doc(hidden)]
pub fn __append_to_buffer(
    crate_name: &str,
    topic: Option<&str>,
    level: Level,
    message: &str,
) -> bool {
    let cfg = Config::try_get().map_or_else(LogConfig::default, |cfg| cfg.log.clone());
    if level < cfg.level {
        return false;
    }

    let max_entries = usize::try_from(cfg.max_entries).unwrap_or(usize::MAX);
    LOG_BUFFER.with_borrow_mut(|buf| {
        buf.push_back(LogEntry {
            crate_name: crate_name.to_string(),
            topic: topic.map(str::to_string),
            level,
            message: message.to_string(),
        });
        while buf.len() > max_entries {
            buf.pop_front();
        }
    });

    true
}

///
/// TESTS
///

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entries_are_buffered_with_topic() {
        clear();
        crate::log!(Topic::Registry, Info, "registry {} ready", 7);
        crate::log!(Warn, "untagged");

        let entries = entries();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].topic.as_deref(), Some("Registry"));
        assert_eq!(entries[0].message, "registry 7 ready");
        assert_eq!(entries[1].topic, None);
        assert_eq!(entries[1].level, Level::Warn);
    }

    #[test]
    fn debug_is_filtered_by_default_level() {
        clear();
        crate::log!(Topic::Ledger, Debug, "noise");
        assert!(entries().is_empty());
    }
}
