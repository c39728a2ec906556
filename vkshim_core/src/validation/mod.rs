//! Pipeline/render pass interface validation, run once per pairing

pub mod shader_interface;

pub use shader_interface::{
    check_fragment_outputs, check_vertex_inputs, formats_compatible, FindingSeverity,
    InterfaceFinding,
};

use std::sync::{Arc, Weak};
use rustc_hash::FxHashMap;
use crate::debug_report::{message_code, DebugReportFlags, DebugReporter};
use crate::resource::{GraphicsPipeline, ObjectId, ObjectType, RenderPass};

type Pairing = (ObjectId, ObjectId, u32);

/// Pipeline / render pass / subpass pairings already validated on a context
///
/// Entries hold weak references; pairings whose pipeline or render pass was
/// dropped are evicted whenever a new pairing is recorded.
#[derive(Debug, Default)]
pub struct ValidationCache {
    enabled: bool,
    validated: FxHashMap<Pairing, (Weak<GraphicsPipeline>, Weak<RenderPass>)>,
}

impl ValidationCache {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            validated: FxHashMap::default(),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn len(&self) -> usize {
        self.validated.len()
    }

    pub fn is_empty(&self) -> bool {
        self.validated.is_empty()
    }

    pub fn clear(&mut self) {
        self.validated.clear();
    }

    /// Drop pairings whose pipeline or render pass no longer exists
    pub fn evict_dropped(&mut self) {
        self.validated
            .retain(|_, (pipeline, render_pass)| pipeline.strong_count() > 0 && render_pass.strong_count() > 0);
    }

    /// Check `pipeline` used in `subpass` of `render_pass`, once per pairing
    ///
    /// Findings go to the reporter. Returns whether checks ran.
    pub fn validate(
        &mut self,
        pipeline: &Arc<GraphicsPipeline>,
        render_pass: &Arc<RenderPass>,
        subpass: u32,
        reporter: &DebugReporter,
    ) -> bool {
        let pairing = (pipeline.id(), render_pass.id(), subpass);
        if !self.enabled || self.validated.contains_key(&pairing) {
            return false;
        }
        self.evict_dropped();
        self.validated
            .insert(pairing, (Arc::downgrade(pipeline), Arc::downgrade(render_pass)));
        let findings = check_vertex_inputs(pipeline.interface(), pipeline.vertex_input())
            .into_iter()
            .chain(check_fragment_outputs(pipeline.interface(), render_pass, subpass));
        for finding in findings {
            let flags = match finding.severity {
                FindingSeverity::Error => DebugReportFlags::ERROR,
                FindingSeverity::Warning => DebugReportFlags::WARNING,
            };
            reporter.report_message(
                flags,
                ObjectType::Pipeline,
                pipeline.id().raw(),
                message_code::INTERFACE_MISMATCH,
                "vkshim::validation",
                finding.message,
            );
        }
        true
    }
}
