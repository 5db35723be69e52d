//! Convenience macros for Warden.

/// Log an event with the given level.
///
/// The current module path is prepended to the message, and any trailing
/// `key => value` pairs are rendered as `key=value` metadata.
///
/// # Examples
///
/// ```
/// use warden_core::log_event;
/// use warden_core::utils::LogLevel;
///
/// log_event!(LogLevel::Info, "World loaded");
///
/// log_event!(LogLevel::Warning, "Recursive group detected",
///     world => "survival",
///     cycle => "a -> b -> a",
/// );
/// ```
#[macro_export]
macro_rules! log_event {
    ($level:expr, $message:expr) => {
        {
            use $crate::utils::LogLevel;
            match $level {
                LogLevel::Error => log::error!("[{}] {}", module_path!(), $message),
                LogLevel::Warning => log::warn!("[{}] {}", module_path!(), $message),
                LogLevel::Info => log::info!("[{}] {}", module_path!(), $message),
                LogLevel::Debug => log::debug!("[{}] {}", module_path!(), $message),
                LogLevel::Trace => log::trace!("[{}] {}", module_path!(), $message),
            }
        }
    };

    ($level:expr, $message:expr, $($key:ident => $value:expr),+ $(,)?) => {
        {
            use $crate::utils::LogLevel;
            let metadata = vec![$(format!("{}={}", stringify!($key), $value)),+].join(" ");
            match $level {
                LogLevel::Error => log::error!("[{}] {}: {}", module_path!(), $message, metadata),
                LogLevel::Warning => log::warn!("[{}] {}: {}", module_path!(), $message, metadata),
                LogLevel::Info => log::info!("[{}] {}: {}", module_path!(), $message, metadata),
                LogLevel::Debug => log::debug!("[{}] {}: {}", module_path!(), $message, metadata),
                LogLevel::Trace => log::trace!("[{}] {}: {}", module_path!(), $message, metadata),
            }
        }
    };
}

/// Return early with an `EntityError::NotFound` if the option is empty.
///
/// # Examples
///
/// ```
/// use warden_core::{require_entity, EntityKind, Result};
///
/// fn first(groups: &[String]) -> Result<&String> {
///     let group = require_entity!(groups.first(), EntityKind::Group, "<first>");
///     Ok(group)
/// }
///
/// assert!(first(&[]).is_err());
/// ```
#[macro_export]
macro_rules! require_entity {
    ($option:expr, $kind:expr, $name:expr) => {
        match $option {
            Some(value) => value,
            None => {
                return Err($crate::error::EntityError::NotFound {
                    kind: $kind,
                    name: $name.to_string(),
                }
                .into())
            }
        }
    };
}
