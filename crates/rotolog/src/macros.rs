//! Call-site capture and per-level logging macros

/// Last path segment of a function path as produced by `type_name`,
/// skipping closure frames.
#[doc(hidden)]
pub fn short_function_name(path: &'static str) -> &'static str {
    let mut path = path.strip_suffix("::__f").unwrap_or(path);
    while let Some(outer) = path.strip_suffix("::{{closure}}") {
        path = outer;
    }
    path.rsplit("::").next().unwrap_or(path)
}

/// Name of the enclosing function
#[macro_export]
macro_rules! function_name {
    () => {{
        fn __f() {}
        $crate::macros::short_function_name(::std::any::type_name_of_val(&__f))
    }};
}

/// [`CallSite`](crate::CallSite) of the macro invocation
#[macro_export]
macro_rules! call_site {
    () => {
        $crate::CallSite::new($crate::function_name!(), file!(), line!())
    };
}

/// Log at `level` through `logger` with `format!`-style arguments.
///
/// Nothing is evaluated when the level is compiled out or below the
/// logger's floor.
#[macro_export]
macro_rules! log {
    ($logger:expr, $level:expr, $($arg:tt)+) => {{
        let level: $crate::Level = $level;
        if level.is_enabled_static() {
            let logger = &$logger;
            if logger.is_enabled(level) {
                logger.log(level, &$crate::call_site!(), format_args!($($arg)+));
            }
        }
    }};
}

/// Log a trace record
#[macro_export]
macro_rules! trace {
    ($logger:expr, $($arg:tt)+) => { $crate::log!($logger, $crate::Level::Trace, $($arg)+) };
}

/// Log a debug record
#[macro_export]
macro_rules! debug {
    ($logger:expr, $($arg:tt)+) => { $crate::log!($logger, $crate::Level::Debug, $($arg)+) };
}

/// Log an info record
#[macro_export]
macro_rules! info {
    ($logger:expr, $($arg:tt)+) => { $crate::log!($logger, $crate::Level::Info, $($arg)+) };
}

/// Log a warning record
#[macro_export]
macro_rules! warn {
    ($logger:expr, $($arg:tt)+) => { $crate::log!($logger, $crate::Level::Warning, $($arg)+) };
}

/// Log an error record
#[macro_export]
macro_rules! error {
    ($logger:expr, $($arg:tt)+) => { $crate::log!($logger, $crate::Level::Error, $($arg)+) };
}

/// Log a fatal record
#[macro_export]
macro_rules! fatal {
    ($logger:expr, $($arg:tt)+) => { $crate::log!($logger, $crate::Level::Fatal, $($arg)+) };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_function_name() {
        assert_eq!(short_function_name("app::server::handle::__f"), "handle");
        assert_eq!(
            short_function_name("app::main::{{closure}}::{{closure}}::__f"),
            "main"
        );
        assert_eq!(short_function_name("main::__f"), "main");
    }

    #[test]
    fn test_function_name_macro() {
        assert_eq!(crate::function_name!(), "test_function_name_macro");
        let from_closure = || crate::function_name!();
        assert_eq!(from_closure(), "test_function_name_macro");
    }

    #[test]
    fn test_call_site_macro() {
        let site = crate::call_site!();
        assert_eq!(site.function, "test_call_site_macro");
        assert_eq!(site.file, "macros.rs");
        assert_eq!(site.line, line!() - 3);
    }
}
