use crate::host::Host;

/// Writes to the script log, and to the terminal as well when `verbose`.
pub fn emit(
    host: &impl Host,
    verbose: bool,
    message: &str,
) {
    if verbose {
        host.tprint(message);
    }

    host.print(message);
}

#[macro_export]
macro_rules! info {
    ($host:expr, $verbose:expr, $($arg:tt)*) => {
        $crate::log::emit($host, $verbose, &format!($($arg)*))
    };
}

#[macro_export]
macro_rules! warn {
    ($host:expr, $verbose:expr, $($arg:tt)*) => {
        $crate::log::emit(
            $host,
            $verbose,
            &format!("WARNING: {}", format_args!($($arg)*)),
        )
    };
}

/// Script log only; never reaches the terminal.
#[macro_export]
macro_rules! debug {
    ($host:expr, $($arg:tt)*) => {
        $crate::log::emit($host, false, &format!($($arg)*))
    };
}
