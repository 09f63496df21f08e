/// Vulkan Debug Messenger - routes validation layer messages into the engine logger
///
/// Messages are filtered by the configured severity, counted in process-wide
/// statistics and forwarded to `lumen_engine::log` at the matching level.
/// Identical messages are grouped so repeats are easy to spot.

use ash::vk;
use colored::*;
use lumen_engine::lumen::render::{DebugSeverity, ValidationStats};
use lumen_engine::{engine_error, engine_info, engine_trace, engine_warn};
use std::borrow::Cow;
use std::collections::HashMap;
use std::ffi::CStr;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;

const SOURCE: &str = "lumen::vulkan::validation";

/// Installed while a messenger exists; `None` mutes the callback
static DEBUG_CONFIG: Mutex<Option<Config>> = Mutex::new(None);

/// Message counts, indexed by `Bucket`
static COUNTERS: [AtomicU32; 4] = [
    AtomicU32::new(0),
    AtomicU32::new(0),
    AtomicU32::new(0),
    AtomicU32::new(0),
];

/// Occurrences per message text
static SEEN: Mutex<Option<HashMap<String, u32>>> = Mutex::new(None);

/// Debug configuration for the callback
#[derive(Debug, Clone, Copy)]
pub struct Config {
    pub severity: DebugSeverity,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Bucket {
    Error,
    Warning,
    Info,
    Verbose,
}

impl Bucket {
    fn of(severity: vk::DebugUtilsMessageSeverityFlagsEXT) -> Self {
        if severity.contains(vk::DebugUtilsMessageSeverityFlagsEXT::ERROR) {
            Bucket::Error
        } else if severity.contains(vk::DebugUtilsMessageSeverityFlagsEXT::WARNING) {
            Bucket::Warning
        } else if severity.contains(vk::DebugUtilsMessageSeverityFlagsEXT::INFO) {
            Bucket::Info
        } else {
            Bucket::Verbose
        }
    }

    fn count(self) -> u32 {
        COUNTERS[self as usize].load(Ordering::Relaxed)
    }

    fn bump(self) {
        COUNTERS[self as usize].fetch_add(1, Ordering::Relaxed);
    }
}

/// Install the configuration and zero the counters
pub fn init_debug_config(config: Config) {
    for counter in &COUNTERS {
        counter.store(0, Ordering::Relaxed);
    }
    if let Ok(mut seen) = SEEN.lock() {
        *seen = Some(HashMap::new());
    }
    if let Ok(mut current) = DEBUG_CONFIG.lock() {
        *current = Some(config);
    }
}

/// Drop the configuration so late callbacks during teardown are ignored
pub fn cleanup_debug_config() {
    if let Ok(mut current) = DEBUG_CONFIG.lock() {
        *current = None;
    }
}

/// Validation messages counted since the last device was created
pub fn get_validation_stats() -> ValidationStats {
    ValidationStats {
        errors: Bucket::Error.count(),
        warnings: Bucket::Warning.count(),
        info: Bucket::Info.count(),
        verbose: Bucket::Verbose.count(),
    }
}

/// Print a colored summary of the validation counters to stdout
pub fn print_validation_stats_report() {
    let stats = get_validation_stats();
    if stats.total() == 0 {
        println!("\n{}", "Validation: clean".green().bold());
        return;
    }

    println!("\n{}", "-- Vulkan validation --".bright_blue().bold());
    let rows = [
        ("errors", stats.errors, Color::Red),
        ("warnings", stats.warnings, Color::Yellow),
        ("info", stats.info, Color::Cyan),
        ("verbose", stats.verbose, Color::BrightBlack),
    ];
    for (label, count, color) in rows {
        if count > 0 {
            println!("  {:<10}{}", label.color(color).bold(), count);
        }
    }
    println!("  {:<10}{}", "total".bold(), stats.total());

    let repeated = SEEN
        .lock()
        .ok()
        .and_then(|seen| seen.as_ref().map(|m| m.values().filter(|&&n| n > 1).count()))
        .unwrap_or(0);
    if repeated > 0 {
        println!("  {} distinct message(s) repeated", repeated);
    }
    println!();
}

/// Whether a message of this severity passes the configured filter
pub(crate) fn passes_filter(filter: DebugSeverity, severity: vk::DebugUtilsMessageSeverityFlagsEXT) -> bool {
    match filter {
        DebugSeverity::ErrorsOnly => severity.contains(vk::DebugUtilsMessageSeverityFlagsEXT::ERROR),
        DebugSeverity::ErrorsAndWarnings => {
            severity.contains(vk::DebugUtilsMessageSeverityFlagsEXT::ERROR)
                || severity.contains(vk::DebugUtilsMessageSeverityFlagsEXT::WARNING)
        }
        DebugSeverity::All => true,
    }
}

/// Messenger severity flags to request from the driver for a filter
pub(crate) fn severity_flags(filter: DebugSeverity) -> vk::DebugUtilsMessageSeverityFlagsEXT {
    match filter {
        DebugSeverity::ErrorsOnly => vk::DebugUtilsMessageSeverityFlagsEXT::ERROR,
        DebugSeverity::ErrorsAndWarnings => {
            vk::DebugUtilsMessageSeverityFlagsEXT::ERROR | vk::DebugUtilsMessageSeverityFlagsEXT::WARNING
        }
        DebugSeverity::All => {
            vk::DebugUtilsMessageSeverityFlagsEXT::ERROR
                | vk::DebugUtilsMessageSeverityFlagsEXT::WARNING
                | vk::DebugUtilsMessageSeverityFlagsEXT::INFO
                | vk::DebugUtilsMessageSeverityFlagsEXT::VERBOSE
        }
    }
}

/// Count and log one validation message
///
/// Returns false when no configuration is installed or the filter rejects it.
pub(crate) fn route_message(
    severity: vk::DebugUtilsMessageSeverityFlagsEXT,
    message_type: vk::DebugUtilsMessageTypeFlagsEXT,
    message_id_name: &str,
    message: &str,
) -> bool {
    let config = match DEBUG_CONFIG.lock().ok().and_then(|guard| *guard) {
        Some(cfg) => cfg,
        None => return false,
    };

    if !passes_filter(config.severity, severity) {
        return false;
    }

    let kind = if message_type.contains(vk::DebugUtilsMessageTypeFlagsEXT::VALIDATION) {
        "Validation"
    } else if message_type.contains(vk::DebugUtilsMessageTypeFlagsEXT::PERFORMANCE) {
        "Performance"
    } else {
        "General"
    };

    let occurrences = match SEEN.lock() {
        Ok(mut seen) => {
            let count = seen.get_or_insert_with(HashMap::new).entry(message.to_string()).or_insert(0);
            *count += 1;
            *count
        }
        Err(_) => 1,
    };
    let repeats = if occurrences > 1 {
        format!(" (x{})", occurrences)
    } else {
        String::new()
    };

    let bucket = Bucket::of(severity);
    bucket.bump();
    match bucket {
        Bucket::Error => engine_error!(SOURCE, "[{}]{} {}: {}", kind, repeats, message_id_name, message),
        Bucket::Warning => engine_warn!(SOURCE, "[{}]{} {}: {}", kind, repeats, message_id_name, message),
        Bucket::Info => engine_info!(SOURCE, "[{}]{} {}: {}", kind, repeats, message_id_name, message),
        Bucket::Verbose => engine_trace!(SOURCE, "[{}]{} {}: {}", kind, repeats, message_id_name, message),
    }

    true
}

/// `PFN_vkDebugUtilsMessengerCallbackEXT` installed on the messenger
///
/// Always returns `VK_FALSE` so the triggering call proceeds.
pub unsafe extern "system" fn vulkan_debug_callback(
    message_severity: vk::DebugUtilsMessageSeverityFlagsEXT,
    message_type: vk::DebugUtilsMessageTypeFlagsEXT,
    p_callback_data: *const vk::DebugUtilsMessengerCallbackDataEXT<'_>,
    _user_data: *mut std::ffi::c_void,
) -> vk::Bool32 {
    if p_callback_data.is_null() {
        return vk::FALSE;
    }
    let callback_data = &*p_callback_data;

    let message_id_name = if callback_data.p_message_id_name.is_null() {
        Cow::Borrowed("Unknown")
    } else {
        CStr::from_ptr(callback_data.p_message_id_name).to_string_lossy()
    };
    let message = if callback_data.p_message.is_null() {
        Cow::Borrowed("No message")
    } else {
        CStr::from_ptr(callback_data.p_message).to_string_lossy()
    };

    route_message(message_severity, message_type, &message_id_name, &message);

    vk::FALSE
}

#[cfg(test)]
#[path = "debug_tests.rs"]
mod tests;
