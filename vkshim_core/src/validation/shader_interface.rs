//! Shader interface checks
//!
//! Vertex inputs are checked against the pipeline's vertex attributes, fragment
//! outputs against the color attachments of the subpass the pipeline is used in.

use rustc_hash::FxHashSet;
use crate::resource::{Format, RenderPass, ShaderInterface, ShaderVariable, VertexInputState};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FindingSeverity {
    Error,
    Warning,
}

/// One mismatch between a shader interface and what feeds or receives it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterfaceFinding {
    pub severity: FindingSeverity,
    pub message: String,
}

impl InterfaceFinding {
    fn error(message: String) -> Self {
        Self { severity: FindingSeverity::Error, message }
    }

    fn warning(message: String) -> Self {
        Self { severity: FindingSeverity::Warning, message }
    }
}

/// Whether a shader variable and a resource of these formats can be connected
///
/// Identical formats, or two uncompressed color formats with the same channel
/// count. The relation is symmetric.
pub fn formats_compatible(a: Format, b: Format) -> bool {
    a == b
        || (a.is_color()
            && b.is_color()
            && !a.is_compressed()
            && !b.is_compressed()
            && a.component_count() == b.component_count())
}

fn is_builtin(variable: &ShaderVariable) -> bool {
    variable.name.starts_with("gl_")
}

/// Vertex shader inputs against declared vertex attributes
///
/// Matrices take one location per column. Built-ins are ignored.
pub fn check_vertex_inputs(interface: &ShaderInterface, vertex_input: &VertexInputState) -> Vec<InterfaceFinding> {
    let mut findings = Vec::new();
    let mut used: FxHashSet<u32> = FxHashSet::default();

    for input in interface.inputs.iter().filter(|input| !is_builtin(input)) {
        let Some(location) = input.location else {
            findings.push(InterfaceFinding::error(format!("vertex input '{}' has no location", input.name)));
            continue;
        };
        let (column_type, count) = input.data_type.locations();
        let expected = column_type.natural_format();
        for column in 0..count {
            let location = location + column;
            used.insert(location);
            match vertex_input.attributes.iter().find(|attribute| attribute.location == location) {
                None => findings.push(InterfaceFinding::error(format!(
                    "vertex input '{}' at location {} has no vertex attribute",
                    input.name, location
                ))),
                Some(attribute) if !formats_compatible(attribute.format, expected) => {
                    findings.push(InterfaceFinding::error(format!(
                        "vertex input '{}' at location {} expects {:?}, attribute provides {:?}",
                        input.name, location, expected, attribute.format
                    )))
                }
                Some(_) => {}
            }
        }
    }

    for attribute in vertex_input.attributes.iter().filter(|attribute| !used.contains(&attribute.location)) {
        findings.push(InterfaceFinding::warning(format!(
            "vertex attribute at location {} is not read by the shader",
            attribute.location
        )));
    }
    findings
}

/// Fragment shader outputs against the color attachments of `subpass`
///
/// An output with a location must match the attachment at that location. An
/// output without one takes the first compatible attachment still free.
pub fn check_fragment_outputs(interface: &ShaderInterface, render_pass: &RenderPass, subpass: u32) -> Vec<InterfaceFinding> {
    let colors: Vec<Option<Format>> = render_pass
        .subpass(subpass)
        .color_attachments
        .iter()
        .map(|reference| (!reference.is_unused()).then(|| render_pass.attachment(reference.attachment).format))
        .collect();
    let mut written = vec![false; colors.len()];
    let mut findings = Vec::new();
    let outputs = || interface.outputs.iter().filter(|output| !is_builtin(output));

    for output in outputs() {
        let Some(location) = output.location else { continue };
        let (column_type, count) = output.data_type.locations();
        let format = column_type.natural_format();
        for column in 0..count {
            let location = location + column;
            match colors.get(location as usize).copied().flatten() {
                Some(attachment) if formats_compatible(attachment, format) => written[location as usize] = true,
                Some(attachment) => findings.push(InterfaceFinding::error(format!(
                    "fragment output '{}' at location {} writes {:?} to a {:?} attachment",
                    output.name, location, format, attachment
                ))),
                None => findings.push(InterfaceFinding::error(format!(
                    "fragment output '{}' at location {} has no color attachment",
                    output.name, location
                ))),
            }
        }
    }

    for output in outputs().filter(|output| output.location.is_none()) {
        let format = output.data_type.locations().0.natural_format();
        let slot = colors
            .iter()
            .zip(written.iter())
            .position(|(attachment, written)| {
                !*written && attachment.is_some_and(|attachment| formats_compatible(attachment, format))
            });
        match slot {
            Some(slot) => written[slot] = true,
            None => findings.push(InterfaceFinding::error(format!(
                "fragment output '{}' has no compatible color attachment",
                output.name
            ))),
        }
    }

    for (slot, format) in colors.iter().enumerate() {
        if let Some(format) = format {
            if !written[slot] {
                findings.push(InterfaceFinding::warning(format!(
                    "color attachment {} ({:?}) is not written by the shader",
                    slot, format
                )));
            }
        }
    }
    findings
}

#[cfg(test)]
#[path = "shader_interface_tests.rs"]
mod tests;
