//! Context state stack
//!
//! Tracks the ambient state last applied to a native context and turns a
//! requested state into the minimal ordered list of [`NativeOp`]s.
//!
//! Pipeline categories are compared by generation first: a category whose
//! requested generation equals the applied one is skipped without looking at
//! its fields. Other categories are flagged dirty, diffed field by field and
//! the flag is cleared once applied.

use bitflags::bitflags;
use rustc_hash::FxHashMap;
use crate::backend::{
    AttachmentPoint, BackendCaps, BackendLimits, FboAttachment, FramebufferObject,
    FramebufferTarget, NativeOp, NativeOpList, StencilFace,
};
use crate::command::StencilFaceFlags;
use crate::debug_report::{message_code, DebugReportFlags, DebugReporter};
use crate::resource::{
    ColorBlendAttachmentState, ColorBlendState, ColorComponentFlags, DepthStencilState,
    DynamicState, IndexType, InputAssemblyState, MultisampleState, NativeHandle, ObjectType,
    RasterizationState, Rect2D, SampleCount, StencilOpState, TessellationState, VertexInputRate,
    VertexInputState, Viewport, ViewportState,
};
use crate::state::{ContextState, Snapshot};

bitflags! {
    /// Pipeline state categories waiting to be applied
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct DirtyCategories: u32 {
        const COLOR_BLEND = 0x01;
        const DEPTH_STENCIL = 0x02;
        const MULTISAMPLE = 0x04;
        const TESSELLATION = 0x08;
        const INPUT_ASSEMBLY = 0x10;
        const VIEWPORT = 0x20;
        const RASTERIZATION = 0x40;
        const DYNAMIC_STATES = 0x80;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct VertexBufferBinding {
    buffer: NativeHandle,
    offset: u64,
    stride: u32,
    input_rate: VertexInputRate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct IndexBufferBinding {
    buffer: NativeHandle,
    offset: u64,
    index_type: IndexType,
}

/// What is attached to one framebuffer object
#[derive(Debug, Clone, Default)]
struct FramebufferObjectState {
    attachments: FxHashMap<AttachmentPoint, FboAttachment>,
    draw_buffers: Option<Vec<AttachmentPoint>>,
    read_buffer: Option<AttachmentPoint>,
}

/// Applied ambient state of one native context
pub struct ContextStateStack {
    current: ContextState,
    dirty: DirtyCategories,
    caps: BackendCaps,
    limits: BackendLimits,
    reporter: DebugReporter,

    program: Option<NativeHandle>,
    vertex_layout: Option<VertexInputState>,
    vertex_buffers: FxHashMap<u32, VertexBufferBinding>,
    index_buffer: Option<IndexBufferBinding>,

    draw_framebuffer: Option<FramebufferObject>,
    read_framebuffer: Option<FramebufferObject>,
    framebuffer_objects: FxHashMap<FramebufferObject, FramebufferObjectState>,
    render_area: Option<Rect2D>,
    srgb: Option<bool>,
}

impl ContextStateStack {
    /// Stack for a context sitting in the deactivated state
    pub fn new(caps: BackendCaps, limits: BackendLimits, reporter: DebugReporter) -> Self {
        Self {
            current: ContextState::deactivated(),
            dirty: DirtyCategories::empty(),
            caps,
            limits,
            reporter,
            program: None,
            vertex_layout: None,
            vertex_buffers: FxHashMap::default(),
            index_buffer: None,
            draw_framebuffer: None,
            read_framebuffer: None,
            framebuffer_objects: FxHashMap::default(),
            render_area: None,
            srgb: None,
        }
    }

    // ===== ACCESSORS =====

    pub fn current(&self) -> &ContextState {
        &self.current
    }

    pub fn dirty(&self) -> DirtyCategories {
        self.dirty
    }

    pub fn capabilities(&self) -> BackendCaps {
        self.caps
    }

    pub fn limits(&self) -> BackendLimits {
        self.limits
    }

    pub fn program(&self) -> Option<NativeHandle> {
        self.program
    }

    pub fn render_area(&self) -> Option<Rect2D> {
        self.render_area
    }

    pub fn is_srgb(&self) -> Option<bool> {
        self.srgb
    }

    pub fn bound_framebuffer(&self, target: FramebufferTarget) -> Option<FramebufferObject> {
        match target {
            FramebufferTarget::Draw | FramebufferTarget::Both => self.draw_framebuffer,
            FramebufferTarget::Read => self.read_framebuffer,
        }
    }

    /// Attachments currently bound to `framebuffer`, ordered by point
    pub fn attachments(&self, framebuffer: FramebufferObject) -> Vec<FboAttachment> {
        let mut attachments: Vec<FboAttachment> = self
            .framebuffer_objects
            .get(&framebuffer)
            .map(|state| state.attachments.values().copied().collect())
            .unwrap_or_default();
        attachments.sort_by_key(|attachment| attachment.point);
        attachments
    }

    fn report(&self, code: i32, message: String) {
        self.reporter.report_message(
            DebugReportFlags::WARNING,
            ObjectType::Context,
            0,
            code,
            "vkshim::state",
            message,
        );
    }

    // ===== PIPELINE STATE =====

    /// Bring every pipeline category to `requested`
    ///
    /// Fields listed in the requested dynamic states keep their applied values.
    pub fn apply_pipeline_state(&mut self, requested: &ContextState, ops: &mut NativeOpList) {
        self.mark_dirty(requested);
        let dynamic = requested.dynamic_states.value().clone();
        let is_dynamic = |state: DynamicState| dynamic.contains(&state);

        if self.dirty.contains(DirtyCategories::COLOR_BLEND) {
            let mut effective = self.clamp_color_blend(requested.color_blend.value());
            if is_dynamic(DynamicState::BlendConstants) {
                effective.blend_constants = self.current.color_blend.value().blend_constants;
            }
            self.diff_color_blend(&effective, ops);
            self.current.color_blend = keep_generation(&requested.color_blend, effective);
            self.dirty.remove(DirtyCategories::COLOR_BLEND);
        }

        if self.dirty.contains(DirtyCategories::DEPTH_STENCIL) {
            let mut effective = *requested.depth_stencil.value();
            let applied = *self.current.depth_stencil.value();
            if is_dynamic(DynamicState::DepthBounds) {
                effective.min_depth_bounds = applied.min_depth_bounds;
                effective.max_depth_bounds = applied.max_depth_bounds;
            }
            for (face, applied_face) in [(&mut effective.front, applied.front), (&mut effective.back, applied.back)] {
                if is_dynamic(DynamicState::StencilCompareMask) {
                    face.compare_mask = applied_face.compare_mask;
                }
                if is_dynamic(DynamicState::StencilWriteMask) {
                    face.write_mask = applied_face.write_mask;
                }
                if is_dynamic(DynamicState::StencilReference) {
                    face.reference = applied_face.reference;
                }
            }
            diff_depth_stencil(&applied, &effective, self.caps, ops);
            self.current.depth_stencil = keep_generation(&requested.depth_stencil, effective);
            self.dirty.remove(DirtyCategories::DEPTH_STENCIL);
        }

        if self.dirty.contains(DirtyCategories::MULTISAMPLE) {
            let effective = *requested.multisample.value();
            diff_multisample(self.current.multisample.value(), &effective, ops);
            self.current.multisample = requested.multisample.clone();
            self.dirty.remove(DirtyCategories::MULTISAMPLE);
        }

        if self.dirty.contains(DirtyCategories::TESSELLATION) {
            diff_tessellation(self.current.tessellation.value(), requested.tessellation.value(), ops);
            self.current.tessellation = requested.tessellation.clone();
            self.dirty.remove(DirtyCategories::TESSELLATION);
        }

        if self.dirty.contains(DirtyCategories::INPUT_ASSEMBLY) {
            diff_input_assembly(self.current.input_assembly.value(), requested.input_assembly.value(), ops);
            self.current.input_assembly = requested.input_assembly.clone();
            self.dirty.remove(DirtyCategories::INPUT_ASSEMBLY);
        }

        if self.dirty.contains(DirtyCategories::VIEWPORT) {
            let mut effective = requested.viewport.value().clone();
            let applied = self.current.viewport.value();
            if is_dynamic(DynamicState::Viewport) {
                effective.viewports = applied.viewports.clone();
            }
            if is_dynamic(DynamicState::Scissor) {
                effective.scissors = applied.scissors.clone();
            }
            let effective = self.clamp_viewport_state(effective);
            self.diff_viewport_state(&effective, ops);
            self.current.viewport = keep_generation(&requested.viewport, effective);
            self.dirty.remove(DirtyCategories::VIEWPORT);
        }

        if self.dirty.contains(DirtyCategories::RASTERIZATION) {
            let mut effective = *requested.rasterization.value();
            let applied = *self.current.rasterization.value();
            if is_dynamic(DynamicState::LineWidth) {
                effective.line_width = applied.line_width;
            }
            if is_dynamic(DynamicState::DepthBias) {
                effective.depth_bias_constant_factor = applied.depth_bias_constant_factor;
                effective.depth_bias_clamp = applied.depth_bias_clamp;
                effective.depth_bias_slope_factor = applied.depth_bias_slope_factor;
            }
            diff_rasterization(&applied, &effective, ops);
            self.current.rasterization = keep_generation(&requested.rasterization, effective);
            self.dirty.remove(DirtyCategories::RASTERIZATION);
        }

        if self.dirty.contains(DirtyCategories::DYNAMIC_STATES) {
            self.current.dynamic_states = requested.dynamic_states.clone();
            self.dirty.remove(DirtyCategories::DYNAMIC_STATES);
        }
    }

    fn mark_dirty(&mut self, requested: &ContextState) {
        let current = &self.current;
        let checks = [
            (current.color_blend.same_generation(&requested.color_blend), DirtyCategories::COLOR_BLEND),
            (current.depth_stencil.same_generation(&requested.depth_stencil), DirtyCategories::DEPTH_STENCIL),
            (current.multisample.same_generation(&requested.multisample), DirtyCategories::MULTISAMPLE),
            (current.tessellation.same_generation(&requested.tessellation), DirtyCategories::TESSELLATION),
            (current.input_assembly.same_generation(&requested.input_assembly), DirtyCategories::INPUT_ASSEMBLY),
            (current.viewport.same_generation(&requested.viewport), DirtyCategories::VIEWPORT),
            (current.rasterization.same_generation(&requested.rasterization), DirtyCategories::RASTERIZATION),
            (current.dynamic_states.same_generation(&requested.dynamic_states), DirtyCategories::DYNAMIC_STATES),
        ];
        for (same, category) in checks {
            if !same {
                self.dirty.insert(category);
            }
        }
    }

    fn clamp_color_blend(&self, requested: &ColorBlendState) -> ColorBlendState {
        let mut state = requested.clone();
        let max = self.limits.max_color_attachments as usize;
        if state.attachments.len() > max {
            self.report(
                message_code::LIMIT_EXCEEDED,
                format!("{} blend attachments requested, backend supports {}", state.attachments.len(), max),
            );
            state.attachments.truncate(max);
        }
        if state.logic_op_enable && !self.caps.contains(BackendCaps::LOGIC_OP) {
            self.report(message_code::UNSUPPORTED_COMMAND, "logic ops are not supported".to_string());
            state.logic_op_enable = false;
        }
        state
    }

    fn clamp_viewport_state(&self, mut state: ViewportState) -> ViewportState {
        let max = self.limits.max_viewports;
        if state.viewport_count > max || state.viewports.len() > max as usize {
            self.report(
                message_code::LIMIT_EXCEEDED,
                format!("{} viewports requested, backend supports {}", state.viewport_count, max),
            );
            state.viewport_count = state.viewport_count.min(max);
            state.viewports.truncate(max as usize);
        }
        if state.scissor_count > max || state.scissors.len() > max as usize {
            self.report(
                message_code::LIMIT_EXCEEDED,
                format!("{} scissors requested, backend supports {}", state.scissor_count, max),
            );
            state.scissor_count = state.scissor_count.min(max);
            state.scissors.truncate(max as usize);
        }
        state
    }

    fn diff_color_blend(&self, requested: &ColorBlendState, ops: &mut NativeOpList) {
        let applied = self.current.color_blend.value();
        let logic_changed = applied.logic_op_enable != requested.logic_op_enable
            || (requested.logic_op_enable && applied.logic_op != requested.logic_op);
        if logic_changed {
            ops.push(NativeOp::SetLogicOp(requested.logic_op_enable.then_some(requested.logic_op)));
        }
        if applied.blend_constants != requested.blend_constants {
            ops.push(NativeOp::SetBlendConstants(requested.blend_constants));
        }
        let shared = applied.attachments.len().min(requested.attachments.len());
        for (index, new) in requested.attachments.iter().enumerate() {
            let old = (index < shared).then(|| applied.attachments[index]);
            diff_blend_attachment(index as u32, old.as_ref(), new, ops);
        }
    }

    fn diff_viewport_state(&self, requested: &ViewportState, ops: &mut NativeOpList) {
        let applied = self.current.viewport.value();
        if applied.viewport_count != requested.viewport_count {
            ops.push(NativeOp::SetViewportCount(requested.viewport_count));
        }
        for (index, viewport) in requested.viewports.iter().enumerate() {
            if applied.viewports.get(index) != Some(viewport) {
                ops.push(NativeOp::SetViewport { index: index as u32, viewport: *viewport });
            }
        }
        if applied.scissor_count != requested.scissor_count {
            ops.push(NativeOp::SetScissorCount(requested.scissor_count));
        }
        for (index, rect) in requested.scissors.iter().enumerate() {
            if applied.scissors.get(index) != Some(rect) {
                ops.push(NativeOp::SetScissor { index: index as u32, rect: *rect });
            }
        }
    }

    // ===== DYNAMIC STATE =====

    /// Overwrite viewports `first..first + viewports.len()`
    pub fn set_viewports(&mut self, first: u32, viewports: &[Viewport], ops: &mut NativeOpList) {
        let mut state = self.current.viewport.value().clone();
        let end = first as usize + viewports.len();
        if state.viewports.len() < end {
            state.viewports.resize(end, Viewport::default());
        }
        state.viewports[first as usize..end].copy_from_slice(viewports);
        state.viewport_count = state.viewport_count.max(end as u32);
        self.update_viewport_state(state, ops);
    }

    /// Overwrite scissors `first..first + scissors.len()`
    pub fn set_scissors(&mut self, first: u32, scissors: &[Rect2D], ops: &mut NativeOpList) {
        let mut state = self.current.viewport.value().clone();
        let end = first as usize + scissors.len();
        if state.scissors.len() < end {
            state.scissors.resize(end, Rect2D::default());
        }
        state.scissors[first as usize..end].copy_from_slice(scissors);
        state.scissor_count = state.scissor_count.max(end as u32);
        self.update_viewport_state(state, ops);
    }

    fn update_viewport_state(&mut self, state: ViewportState, ops: &mut NativeOpList) {
        let state = self.clamp_viewport_state(state);
        if state != *self.current.viewport.value() {
            self.diff_viewport_state(&state, ops);
            self.current.viewport = Snapshot::new(state);
        }
    }

    pub fn set_line_width(&mut self, width: f32, ops: &mut NativeOpList) {
        self.update_rasterization(|state| state.line_width = width, ops);
    }

    pub fn set_depth_bias(&mut self, constant_factor: f32, clamp: f32, slope_factor: f32, ops: &mut NativeOpList) {
        self.update_rasterization(
            |state| {
                state.depth_bias_constant_factor = constant_factor;
                state.depth_bias_clamp = clamp;
                state.depth_bias_slope_factor = slope_factor;
            },
            ops,
        );
    }

    fn update_rasterization(&mut self, update: impl FnOnce(&mut RasterizationState), ops: &mut NativeOpList) {
        let applied = *self.current.rasterization.value();
        let mut state = applied;
        update(&mut state);
        if state != applied {
            diff_rasterization(&applied, &state, ops);
            self.current.rasterization = Snapshot::new(state);
        }
    }

    pub fn set_blend_constants(&mut self, constants: [f32; 4], ops: &mut NativeOpList) {
        let mut state = self.current.color_blend.value().clone();
        if state.blend_constants != constants {
            state.blend_constants = constants;
            ops.push(NativeOp::SetBlendConstants(constants));
            self.current.color_blend = Snapshot::new(state);
        }
    }

    pub fn set_depth_bounds(&mut self, min: f32, max: f32, ops: &mut NativeOpList) {
        self.update_depth_stencil(
            |state| {
                state.min_depth_bounds = min;
                state.max_depth_bounds = max;
            },
            ops,
        );
    }

    pub fn set_stencil_compare_mask(&mut self, faces: StencilFaceFlags, mask: u32, ops: &mut NativeOpList) {
        self.update_stencil_faces(faces, |face| face.compare_mask = mask, ops);
    }

    pub fn set_stencil_write_mask(&mut self, faces: StencilFaceFlags, mask: u32, ops: &mut NativeOpList) {
        self.update_stencil_faces(faces, |face| face.write_mask = mask, ops);
    }

    pub fn set_stencil_reference(&mut self, faces: StencilFaceFlags, reference: u32, ops: &mut NativeOpList) {
        self.update_stencil_faces(faces, |face| face.reference = reference, ops);
    }

    fn update_stencil_faces(
        &mut self,
        faces: StencilFaceFlags,
        update: impl Fn(&mut StencilOpState),
        ops: &mut NativeOpList,
    ) {
        self.update_depth_stencil(
            |state| {
                if faces.contains(StencilFaceFlags::FRONT) {
                    update(&mut state.front);
                }
                if faces.contains(StencilFaceFlags::BACK) {
                    update(&mut state.back);
                }
            },
            ops,
        );
    }

    fn update_depth_stencil(&mut self, update: impl FnOnce(&mut DepthStencilState), ops: &mut NativeOpList) {
        let applied = *self.current.depth_stencil.value();
        let mut state = applied;
        update(&mut state);
        if state != applied {
            diff_depth_stencil(&applied, &state, self.caps, ops);
            self.current.depth_stencil = Snapshot::new(state);
        }
    }

    // ===== PROGRAM / GEOMETRY =====

    pub fn use_program(&mut self, program: NativeHandle, ops: &mut NativeOpList) {
        if self.program != Some(program) {
            ops.push(NativeOp::UseProgram(program));
            self.program = Some(program);
        }
    }

    pub fn set_vertex_layout(&mut self, layout: &VertexInputState, ops: &mut NativeOpList) {
        if self.vertex_layout.as_ref() != Some(layout) {
            ops.push(NativeOp::SetVertexLayout(layout.clone()));
            self.vertex_layout = Some(layout.clone());
        }
    }

    pub fn bind_vertex_buffer(
        &mut self,
        binding: u32,
        buffer: NativeHandle,
        offset: u64,
        stride: u32,
        input_rate: VertexInputRate,
        ops: &mut NativeOpList,
    ) {
        if binding >= self.limits.max_vertex_bindings {
            self.report(
                message_code::LIMIT_EXCEEDED,
                format!(
                    "vertex binding {} exceeds the backend's {} bindings",
                    binding, self.limits.max_vertex_bindings
                ),
            );
            return;
        }
        let requested = VertexBufferBinding { buffer, offset, stride, input_rate };
        if self.vertex_buffers.get(&binding) != Some(&requested) {
            ops.push(NativeOp::BindVertexBuffer { binding, buffer, offset, stride, input_rate });
            self.vertex_buffers.insert(binding, requested);
        }
    }

    pub fn bind_index_buffer(&mut self, buffer: NativeHandle, offset: u64, index_type: IndexType, ops: &mut NativeOpList) {
        let requested = IndexBufferBinding { buffer, offset, index_type };
        if self.index_buffer != Some(requested) {
            ops.push(NativeOp::BindIndexBuffer { buffer, offset, index_type });
            self.index_buffer = Some(requested);
        }
    }

    // ===== RENDER PASS SUPPORT =====

    /// Turn blending off on every attachment that has it on
    pub fn apply_disable_blend(&mut self, ops: &mut NativeOpList) {
        let mut state = self.current.color_blend.value().clone();
        let mut changed = false;
        for (index, attachment) in state.attachments.iter_mut().enumerate() {
            if attachment.blend_enable {
                ops.push(NativeOp::SetBlendEnabled { attachment: index as u32, enabled: false });
                attachment.blend_enable = false;
                changed = true;
            }
        }
        if changed {
            self.current.color_blend = Snapshot::new(state);
        }
    }

    /// Open the write masks a clear of these attachments needs
    pub fn apply_clear_masks(&mut self, color_slots: &[u32], depth: bool, stencil: bool, ops: &mut NativeOpList) {
        let mut blend = self.current.color_blend.value().clone();
        let mut blend_changed = false;
        for &slot in color_slots {
            if blend.attachments.len() <= slot as usize {
                blend.attachments.resize(slot as usize + 1, ColorBlendAttachmentState::disabled());
                blend_changed = true;
            }
            let attachment = &mut blend.attachments[slot as usize];
            if attachment.color_write_mask != ColorComponentFlags::all() {
                ops.push(NativeOp::SetColorWriteMask { attachment: slot, mask: ColorComponentFlags::all() });
                attachment.color_write_mask = ColorComponentFlags::all();
                blend_changed = true;
            }
        }
        if blend_changed {
            self.current.color_blend = Snapshot::new(blend);
        }

        let mut depth_stencil = *self.current.depth_stencil.value();
        let mut depth_changed = false;
        if depth && !depth_stencil.depth_write_enable {
            ops.push(NativeOp::SetDepthWriteEnabled(true));
            depth_stencil.depth_write_enable = true;
            depth_changed = true;
        }
        if stencil {
            for (face, state) in [
                (StencilFace::Front, &mut depth_stencil.front),
                (StencilFace::Back, &mut depth_stencil.back),
            ] {
                if state.write_mask != u32::MAX {
                    ops.push(NativeOp::SetStencilWriteMask { face, mask: u32::MAX });
                    state.write_mask = u32::MAX;
                    depth_changed = true;
                }
            }
        }
        if depth_changed {
            self.current.depth_stencil = Snapshot::new(depth_stencil);
        }
    }

    /// Record the render area and reset viewport 0 and scissor 0 to it
    pub fn set_render_area(&mut self, area: Rect2D, ops: &mut NativeOpList) {
        self.render_area = Some(area);
        let state = ViewportState::single(Viewport::from_rect(area), area);
        if state != *self.current.viewport.value() {
            self.diff_viewport_state(&state, ops);
            self.current.viewport = Snapshot::new(state);
        }
    }

    pub fn apply_srgb(&mut self, enabled: bool, ops: &mut NativeOpList) {
        if !self.caps.contains(BackendCaps::FRAMEBUFFER_SRGB) || self.srgb == Some(enabled) {
            return;
        }
        ops.push(NativeOp::SetFramebufferSrgb(enabled));
        self.srgb = Some(enabled);
    }

    // ===== FRAMEBUFFERS =====

    /// Bind `framebuffer`, skipped when it is already bound to `target`
    pub fn bind_framebuffer(&mut self, target: FramebufferTarget, framebuffer: FramebufferObject, ops: &mut NativeOpList) {
        let bound = match target {
            FramebufferTarget::Draw => self.draw_framebuffer == Some(framebuffer),
            FramebufferTarget::Read => self.read_framebuffer == Some(framebuffer),
            FramebufferTarget::Both => {
                self.draw_framebuffer == Some(framebuffer) && self.read_framebuffer == Some(framebuffer)
            }
        };
        if bound {
            return;
        }
        ops.push(NativeOp::BindFramebuffer { target, framebuffer });
        if matches!(target, FramebufferTarget::Draw | FramebufferTarget::Both) {
            self.draw_framebuffer = Some(framebuffer);
        }
        if matches!(target, FramebufferTarget::Read | FramebufferTarget::Both) {
            self.read_framebuffer = Some(framebuffer);
        }
    }

    /// Make `attachments` the exact attachment set of `framebuffer`
    ///
    /// Points no longer used are detached first, then changed or new points are
    /// attached. Unchanged points emit nothing.
    pub fn attach(&mut self, framebuffer: FramebufferObject, attachments: &[FboAttachment], ops: &mut NativeOpList) {
        let max_color = self.limits.max_color_attachments;
        let mut requested: Vec<FboAttachment> = Vec::with_capacity(attachments.len());
        for attachment in attachments {
            match attachment.point {
                AttachmentPoint::Color(index) if index >= max_color => self.report(
                    message_code::LIMIT_EXCEEDED,
                    format!("color attachment {} exceeds the backend's {} attachments", index, max_color),
                ),
                _ => requested.push(*attachment),
            }
        }

        let state = self.framebuffer_objects.entry(framebuffer).or_default();
        let mut stale: Vec<AttachmentPoint> = state
            .attachments
            .keys()
            .filter(|point| !requested.iter().any(|attachment| attachment.point == **point))
            .copied()
            .collect();
        stale.sort();
        for point in stale {
            ops.push(NativeOp::DetachImage { framebuffer, point });
            state.attachments.remove(&point);
        }
        for attachment in requested {
            if state.attachments.get(&attachment.point) != Some(&attachment) {
                ops.push(NativeOp::AttachImage { framebuffer, attachment });
                state.attachments.insert(attachment.point, attachment);
            }
        }
    }

    pub fn set_draw_buffers(&mut self, framebuffer: FramebufferObject, points: &[AttachmentPoint], ops: &mut NativeOpList) {
        let state = self.framebuffer_objects.entry(framebuffer).or_default();
        if state.draw_buffers.as_deref() != Some(points) {
            ops.push(NativeOp::SetDrawBuffers { framebuffer, points: points.to_vec() });
            state.draw_buffers = Some(points.to_vec());
        }
    }

    pub fn set_read_buffer(&mut self, framebuffer: FramebufferObject, point: AttachmentPoint, ops: &mut NativeOpList) {
        let state = self.framebuffer_objects.entry(framebuffer).or_default();
        if state.read_buffer != Some(point) {
            ops.push(NativeOp::SetReadBuffer { framebuffer, point });
            state.read_buffer = Some(point);
        }
    }
}

/// Store `value` under the requested generation when nothing was overridden
fn keep_generation<T: Clone + PartialEq>(requested: &Snapshot<T>, value: T) -> Snapshot<T> {
    if *requested.value() == value {
        Snapshot::with_generation(value, requested.generation())
    } else {
        Snapshot::new(value)
    }
}

fn diff_blend_attachment(
    index: u32,
    applied: Option<&ColorBlendAttachmentState>,
    requested: &ColorBlendAttachmentState,
    ops: &mut NativeOpList,
) {
    if applied.map(|a| a.blend_enable) != Some(requested.blend_enable) {
        ops.push(NativeOp::SetBlendEnabled { attachment: index, enabled: requested.blend_enable });
    }
    let func = |s: &ColorBlendAttachmentState| {
        (s.src_color_blend_factor, s.dst_color_blend_factor, s.src_alpha_blend_factor, s.dst_alpha_blend_factor)
    };
    if applied.map(func) != Some(func(requested)) {
        ops.push(NativeOp::SetBlendFunc {
            attachment: index,
            src_color: requested.src_color_blend_factor,
            dst_color: requested.dst_color_blend_factor,
            src_alpha: requested.src_alpha_blend_factor,
            dst_alpha: requested.dst_alpha_blend_factor,
        });
    }
    if applied.map(|a| (a.color_blend_op, a.alpha_blend_op)) != Some((requested.color_blend_op, requested.alpha_blend_op)) {
        ops.push(NativeOp::SetBlendEquation {
            attachment: index,
            color_op: requested.color_blend_op,
            alpha_op: requested.alpha_blend_op,
        });
    }
    if applied.map(|a| a.color_write_mask) != Some(requested.color_write_mask) {
        ops.push(NativeOp::SetColorWriteMask { attachment: index, mask: requested.color_write_mask });
    }
}

fn diff_depth_stencil(applied: &DepthStencilState, requested: &DepthStencilState, caps: BackendCaps, ops: &mut NativeOpList) {
    if applied.depth_test_enable != requested.depth_test_enable {
        ops.push(NativeOp::SetDepthTestEnabled(requested.depth_test_enable));
    }
    if applied.depth_write_enable != requested.depth_write_enable {
        ops.push(NativeOp::SetDepthWriteEnabled(requested.depth_write_enable));
    }
    if applied.depth_compare_op != requested.depth_compare_op {
        ops.push(NativeOp::SetDepthCompareOp(requested.depth_compare_op));
    }
    if caps.contains(BackendCaps::DEPTH_BOUNDS) {
        if applied.depth_bounds_test_enable != requested.depth_bounds_test_enable {
            ops.push(NativeOp::SetDepthBoundsTestEnabled(requested.depth_bounds_test_enable));
        }
        if (applied.min_depth_bounds, applied.max_depth_bounds) != (requested.min_depth_bounds, requested.max_depth_bounds) {
            ops.push(NativeOp::SetDepthBounds { min: requested.min_depth_bounds, max: requested.max_depth_bounds });
        }
    }
    if applied.stencil_test_enable != requested.stencil_test_enable {
        ops.push(NativeOp::SetStencilTestEnabled(requested.stencil_test_enable));
    }
    for (face, old, new) in [
        (StencilFace::Front, &applied.front, &requested.front),
        (StencilFace::Back, &applied.back, &requested.back),
    ] {
        if (old.fail_op, old.depth_fail_op, old.pass_op) != (new.fail_op, new.depth_fail_op, new.pass_op) {
            ops.push(NativeOp::SetStencilOps {
                face,
                fail: new.fail_op,
                depth_fail: new.depth_fail_op,
                pass: new.pass_op,
            });
        }
        if (old.compare_op, old.reference, old.compare_mask) != (new.compare_op, new.reference, new.compare_mask) {
            ops.push(NativeOp::SetStencilFunc {
                face,
                compare_op: new.compare_op,
                reference: new.reference,
                compare_mask: new.compare_mask,
            });
        }
        if old.write_mask != new.write_mask {
            ops.push(NativeOp::SetStencilWriteMask { face, mask: new.write_mask });
        }
    }
}

fn diff_multisample(applied: &MultisampleState, requested: &MultisampleState, ops: &mut NativeOpList) {
    let enabled = |s: &MultisampleState| s.rasterization_samples != SampleCount::S1;
    if enabled(applied) != enabled(requested) {
        ops.push(NativeOp::SetMultisampleEnabled(enabled(requested)));
    }
    if (applied.sample_shading_enable, applied.min_sample_shading)
        != (requested.sample_shading_enable, requested.min_sample_shading)
    {
        ops.push(NativeOp::SetSampleShading {
            enabled: requested.sample_shading_enable,
            min_fraction: requested.min_sample_shading,
        });
    }
    if applied.sample_mask != requested.sample_mask {
        ops.push(NativeOp::SetSampleMask(requested.sample_mask));
    }
    if applied.alpha_to_coverage_enable != requested.alpha_to_coverage_enable {
        ops.push(NativeOp::SetAlphaToCoverageEnabled(requested.alpha_to_coverage_enable));
    }
    if applied.alpha_to_one_enable != requested.alpha_to_one_enable {
        ops.push(NativeOp::SetAlphaToOneEnabled(requested.alpha_to_one_enable));
    }
}

fn diff_tessellation(applied: &TessellationState, requested: &TessellationState, ops: &mut NativeOpList) {
    if applied.patch_control_points != requested.patch_control_points {
        ops.push(NativeOp::SetPatchControlPoints(requested.patch_control_points));
    }
}

// Topology is consumed by draws, only primitive restart is context state
fn diff_input_assembly(applied: &InputAssemblyState, requested: &InputAssemblyState, ops: &mut NativeOpList) {
    if applied.primitive_restart_enable != requested.primitive_restart_enable {
        ops.push(NativeOp::SetPrimitiveRestartEnabled(requested.primitive_restart_enable));
    }
}

fn diff_rasterization(applied: &RasterizationState, requested: &RasterizationState, ops: &mut NativeOpList) {
    if applied.depth_clamp_enable != requested.depth_clamp_enable {
        ops.push(NativeOp::SetDepthClampEnabled(requested.depth_clamp_enable));
    }
    if applied.rasterizer_discard_enable != requested.rasterizer_discard_enable {
        ops.push(NativeOp::SetRasterizerDiscardEnabled(requested.rasterizer_discard_enable));
    }
    if applied.polygon_mode != requested.polygon_mode {
        ops.push(NativeOp::SetPolygonMode(requested.polygon_mode));
    }
    if applied.cull_mode != requested.cull_mode {
        ops.push(NativeOp::SetCullMode(requested.cull_mode));
    }
    if applied.front_face != requested.front_face {
        ops.push(NativeOp::SetFrontFace(requested.front_face));
    }
    if applied.depth_bias_enable != requested.depth_bias_enable {
        ops.push(NativeOp::SetDepthBiasEnabled(requested.depth_bias_enable));
    }
    let bias = |s: &RasterizationState| (s.depth_bias_constant_factor, s.depth_bias_clamp, s.depth_bias_slope_factor);
    if bias(applied) != bias(requested) {
        ops.push(NativeOp::SetDepthBias {
            constant_factor: requested.depth_bias_constant_factor,
            clamp: requested.depth_bias_clamp,
            slope_factor: requested.depth_bias_slope_factor,
        });
    }
    if applied.line_width != requested.line_width {
        ops.push(NativeOp::SetLineWidth(requested.line_width));
    }
}

#[cfg(test)]
#[path = "context_state_stack_tests.rs"]
mod tests;
