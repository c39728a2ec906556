//! Context state snapshots and their deactivated defaults

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::LazyLock;
use crate::resource::{
    ColorBlendState, CompareOp, CullModeFlags, DepthStencilState, DynamicState, FrontFace,
    InputAssemblyState, LogicOp, MultisampleState, PolygonMode, PrimitiveTopology,
    RasterizationState, SampleCount, StencilOpState, TessellationState, ViewportState,
};

static NEXT_GENERATION: AtomicU64 = AtomicU64::new(1);

/// A state category value tagged with a generation
///
/// Two snapshots with the same generation hold the same value, so the state
/// stack can skip a category without comparing its fields. A new value always
/// gets a new generation.
#[derive(Debug, Clone)]
pub struct Snapshot<T> {
    value: T,
    generation: u64,
}

impl<T> Snapshot<T> {
    pub fn new(value: T) -> Self {
        Self {
            value,
            generation: NEXT_GENERATION.fetch_add(1, Ordering::Relaxed),
        }
    }

    pub fn value(&self) -> &T {
        &self.value
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn same_generation(&self, other: &Snapshot<T>) -> bool {
        self.generation == other.generation
    }

    /// Keep the value but carry another snapshot's generation
    pub(crate) fn with_generation(value: T, generation: u64) -> Self {
        Self { value, generation }
    }
}

/// Full ambient state of a native context, one snapshot per category
#[derive(Debug, Clone)]
pub struct ContextState {
    pub color_blend: Snapshot<ColorBlendState>,
    pub depth_stencil: Snapshot<DepthStencilState>,
    pub multisample: Snapshot<MultisampleState>,
    pub tessellation: Snapshot<TessellationState>,
    pub input_assembly: Snapshot<InputAssemblyState>,
    pub viewport: Snapshot<ViewportState>,
    pub rasterization: Snapshot<RasterizationState>,
    pub dynamic_states: Snapshot<Vec<DynamicState>>,
}

static DEACTIVATED: LazyLock<ContextState> = LazyLock::new(|| ContextState {
    color_blend: Snapshot::new(deactivated_color_blend_state()),
    depth_stencil: Snapshot::new(deactivated_depth_stencil_state()),
    multisample: Snapshot::new(deactivated_multisample_state()),
    tessellation: Snapshot::new(deactivated_tessellation_state()),
    input_assembly: Snapshot::new(deactivated_input_assembly_state()),
    viewport: Snapshot::new(deactivated_viewport_state()),
    rasterization: Snapshot::new(deactivated_rasterization_state()),
    dynamic_states: Snapshot::new(Vec::new()),
});

impl ContextState {
    /// State requested by a pipeline
    ///
    /// Categories left out share the generation of the deactivated default.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        color_blend: Option<&ColorBlendState>,
        depth_stencil: Option<&DepthStencilState>,
        multisample: Option<&MultisampleState>,
        tessellation: Option<&TessellationState>,
        input_assembly: &InputAssemblyState,
        viewport: Option<&ViewportState>,
        rasterization: &RasterizationState,
        dynamic_states: &[DynamicState],
    ) -> Self {
        let defaults = Self::deactivated();
        Self {
            color_blend: color_blend.map(|s| Snapshot::new(s.clone())).unwrap_or(defaults.color_blend),
            depth_stencil: depth_stencil.map(|s| Snapshot::new(*s)).unwrap_or(defaults.depth_stencil),
            multisample: multisample.map(|s| Snapshot::new(*s)).unwrap_or(defaults.multisample),
            tessellation: tessellation.map(|s| Snapshot::new(*s)).unwrap_or(defaults.tessellation),
            input_assembly: Snapshot::new(*input_assembly),
            viewport: viewport.map(|s| Snapshot::new(s.clone())).unwrap_or(defaults.viewport),
            rasterization: Snapshot::new(*rasterization),
            dynamic_states: if dynamic_states.is_empty() {
                defaults.dynamic_states
            } else {
                Snapshot::new(dynamic_states.to_vec())
            },
        }
    }

    /// The canonical all-off state every context starts in
    pub fn deactivated() -> Self {
        DEACTIVATED.clone()
    }
}

pub fn deactivated_color_blend_state() -> ColorBlendState {
    ColorBlendState {
        logic_op_enable: false,
        logic_op: LogicOp::Copy,
        attachments: Vec::new(),
        blend_constants: [0.0; 4],
    }
}

pub fn deactivated_depth_stencil_state() -> DepthStencilState {
    DepthStencilState {
        depth_test_enable: false,
        depth_write_enable: true,
        depth_compare_op: CompareOp::Less,
        depth_bounds_test_enable: false,
        stencil_test_enable: false,
        front: StencilOpState::keep(),
        back: StencilOpState::keep(),
        min_depth_bounds: 0.0,
        max_depth_bounds: 1.0,
    }
}

pub fn deactivated_multisample_state() -> MultisampleState {
    MultisampleState {
        rasterization_samples: SampleCount::S1,
        sample_shading_enable: false,
        min_sample_shading: 1.0,
        sample_mask: 0xFFFF_FFFF,
        alpha_to_coverage_enable: false,
        alpha_to_one_enable: false,
    }
}

pub fn deactivated_tessellation_state() -> TessellationState {
    TessellationState { patch_control_points: 3 }
}

pub fn deactivated_input_assembly_state() -> InputAssemblyState {
    InputAssemblyState {
        topology: PrimitiveTopology::TriangleList,
        primitive_restart_enable: false,
    }
}

pub fn deactivated_viewport_state() -> ViewportState {
    ViewportState {
        viewport_count: 0,
        viewports: Vec::new(),
        scissor_count: 0,
        scissors: Vec::new(),
    }
}

pub fn deactivated_rasterization_state() -> RasterizationState {
    RasterizationState {
        depth_clamp_enable: false,
        rasterizer_discard_enable: false,
        polygon_mode: PolygonMode::Fill,
        cull_mode: CullModeFlags::empty(),
        front_face: FrontFace::CounterClockwise,
        depth_bias_enable: false,
        depth_bias_constant_factor: 0.0,
        depth_bias_clamp: 0.0,
        depth_bias_slope_factor: 0.0,
        line_width: 1.0,
    }
}
