/// Context configuration

use crate::backend::BackendLimits;
use crate::debug_report::DebugReportFlags;

/// Context configuration
#[derive(Debug, Clone)]
pub struct ContextConfig {
    /// Check pipelines against the subpasses they are used in
    pub enable_validation: bool,
    /// Application name, used in log lines
    pub app_name: String,
    /// Diagnostic severities the context forwards to its reporter
    pub report_flags: DebugReportFlags,
    /// Replace the limits reported by the backend
    pub limits: Option<BackendLimits>,
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self {
            enable_validation: cfg!(debug_assertions),
            app_name: "vkshim Application".to_string(),
            report_flags: DebugReportFlags::ERROR
                | DebugReportFlags::WARNING
                | DebugReportFlags::PERFORMANCE_WARNING,
            limits: None,
        }
    }
}
