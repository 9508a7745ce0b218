/// Similar to `info!` macro in tracing.
/// You can pass in the starting time and it will log how long it took from starting time to now.
/// ```
/// use chrono::Local;
/// use playscrape::info_time;
///
/// info_time!("str {}, {}", 1, 2);
/// let time = Local::now();
/// info_time!(time, "str {}, {}", 1, 2);
/// ```
#[macro_export]
macro_rules! info_time {
    ($strfm:literal $(,)? $($arg:expr),*) => {{
        ::tracing::info!("{}", format!($strfm, $($arg),*));
    }};
    ($time:expr, $strfm:literal $(,)? $($arg:expr),*) => {{
        let run_time = (::chrono::Local::now() - $time)
                .num_microseconds()
                .map(|n| n as f64 / 1_000_000.0)
                .unwrap_or(0.0);
        ::tracing::info!(run_time_secs = run_time, "{}", format!($strfm, $($arg),*));
    }};
}

/// Builds an extraction path out of string keys and integer indexes.
/// ```
/// use playscrape::{extract::Segment, path};
///
/// let p = path!["ds:5", 1, 2];
/// assert_eq!(p[0], Segment::Key("ds:5".into()));
/// assert_eq!(p[2], Segment::Index(2));
/// ```
#[macro_export]
macro_rules! path {
    ($($seg:expr),* $(,)?) => {
        ::std::vec![$($crate::extract::Segment::from($seg)),*]
    };
}

/// Static regex that is compiled on first use.
macro_rules! define_regex {
    ($name:ident, $pattern:expr) => {
        static $name: ::std::sync::LazyLock<::regex::Regex> = ::std::sync::LazyLock::new(|| {
            ::regex::Regex::new($pattern).expect(concat!("invalid pattern for ", stringify!($name)))
        });
    };
}

pub(crate) use define_regex;
