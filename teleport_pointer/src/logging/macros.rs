/// Log through `tracing` only when the scope's configured level allows it.
#[macro_export]
macro_rules! scoped_log {
    ($level:ident, $scope:expr, $($arg:tt)*) => {{
        let log_config = $crate::logging::get_log_config();
        if log_config.should_log($scope, $crate::logging::Level::$level) {
            tracing::event!($crate::logging::Level::$level, scope = $scope, $($arg)*);
        }
    }};
}

#[macro_export]
macro_rules! pointer_log {
    ($level:ident, $($arg:tt)*) => {
        $crate::scoped_log!($level, $crate::logging::POINTER_SCOPE, $($arg)*);
    };
}

#[macro_export]
macro_rules! beam_log {
    ($level:ident, $($arg:tt)*) => {
        $crate::scoped_log!($level, $crate::logging::BEAM_SCOPE, $($arg)*);
    };
}

#[macro_export]
macro_rules! zone_log {
    ($level:ident, $($arg:tt)*) => {
        $crate::scoped_log!($level, $crate::logging::ZONE_SCOPE, $($arg)*);
    };
}

#[macro_export]
macro_rules! marker_log {
    ($level:ident, $($arg:tt)*) => {
        $crate::scoped_log!($level, $crate::logging::MARKER_SCOPE, $($arg)*);
    };
}
