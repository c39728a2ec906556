/// GL error checking and the capability report
///
/// With the `gl-call-trace` feature every call made through [`gl!`] and
/// [`gl_opt!`] is logged at trace level and followed by a `glGetError` check.

use colored::*;
use vkshim_core::backend::{BackendCaps, BackendLimits};
use crate::gl_functions::GlFunctions;
use crate::gl_types::*;

/// Call a required entry point
macro_rules! gl {
    ($gl:expr => $func:ident ( $($arg:expr),* $(,)? )) => {{
        // SAFETY: entry point resolved at load time with this signature; arguments are
        // built by the backend from validated ops.
        #[allow(unused_unsafe)]
        let result = unsafe { ($gl.$func)($($arg),*) };
        #[cfg(feature = "gl-call-trace")]
        $crate::gl_debug::trace_call(&$gl, stringify!($func));
        result
    }};
}

/// Call an optional entry point; `None` when the driver lacks it
macro_rules! gl_opt {
    ($gl:expr => $func:ident ( $($arg:expr),* $(,)? )) => {{
        match $gl.$func {
            Some(function) => {
                // SAFETY: as for `gl!`.
                #[allow(unused_unsafe)]
                let result = unsafe { function($($arg),*) };
                #[cfg(feature = "gl-call-trace")]
                $crate::gl_debug::trace_call(&$gl, stringify!($func));
                Some(result)
            }
            None => None,
        }
    }};
}

pub(crate) use gl;
pub(crate) use gl_opt;

pub fn error_name(code: GLenum) -> &'static str {
    match code {
        0x0500 => "GL_INVALID_ENUM",
        0x0501 => "GL_INVALID_VALUE",
        0x0502 => "GL_INVALID_OPERATION",
        0x0503 => "GL_STACK_OVERFLOW",
        0x0504 => "GL_STACK_UNDERFLOW",
        0x0505 => "GL_OUT_OF_MEMORY",
        0x0506 => "GL_INVALID_FRAMEBUFFER_OPERATION",
        0x0507 => "GL_CONTEXT_LOST",
        _ => "unknown GL error",
    }
}

/// Drain the GL error queue, logging each error against `call`
///
/// Returns the number of errors found.
pub fn check_errors(gl: &GlFunctions, call: &str) -> u32 {
    let mut count = 0;
    loop {
        // SAFETY: glGetError has no preconditions.
        let code = unsafe { (gl.get_error)() };
        // A lost context keeps reporting the same error.
        if code == GL_NO_ERROR || count >= 16 {
            break;
        }
        vkshim_core::vks_error!("vkshim::gl", "{} after {} (0x{:04X})", error_name(code), call, code);
        count += 1;
    }
    count
}

#[cfg(feature = "gl-call-trace")]
pub fn trace_call(gl: &GlFunctions, call: &str) {
    vkshim_core::vks_trace!("vkshim::gl", "{}", call);
    check_errors(gl, call);
}

/// Driver identification and feature summary of a GL backend
#[derive(Debug, Clone)]
pub struct CapabilityReport {
    pub vendor: String,
    pub renderer: String,
    pub version: String,
    pub caps: BackendCaps,
    pub limits: BackendLimits,
    pub missing_entry_points: Vec<&'static str>,
}

impl CapabilityReport {
    pub fn collect(gl: &GlFunctions, limits: BackendLimits) -> Self {
        Self {
            vendor: gl.string(GL_VENDOR),
            renderer: gl.string(GL_RENDERER),
            version: gl.string(GL_VERSION),
            caps: gl.capabilities(),
            limits,
            missing_entry_points: gl.missing_optional(),
        }
    }

    /// Print the report with colors
    pub fn print(&self) {
        println!("\n{}", "=== GL Backend Report ===".bright_blue().bold());
        println!("  {} {}", "Vendor:".white().bold(), self.vendor);
        println!("  {} {}", "Renderer:".white().bold(), self.renderer);
        println!("  {} {}", "Version:".white().bold(), self.version);

        println!("  {}", "Features:".white().bold());
        for (name, _) in self.caps.iter_names() {
            println!("    {} {}", "✓".green(), name.to_lowercase());
        }
        let missing = BackendCaps::all().difference(self.caps);
        for (name, _) in missing.iter_names() {
            println!("    {} {}", "✗".red(), name.to_lowercase());
        }

        println!(
            "  {} viewports {}, color attachments {}, vertex bindings {}",
            "Limits:".white().bold(),
            self.limits.max_viewports,
            self.limits.max_color_attachments,
            self.limits.max_vertex_bindings
        );

        if !self.missing_entry_points.is_empty() {
            println!(
                "\n  {} {} optional entry point(s) unavailable",
                "ℹ".cyan(),
                self.missing_entry_points.len()
            );
        }
        println!("{}\n", "=========================".bright_blue().bold());
    }
}
