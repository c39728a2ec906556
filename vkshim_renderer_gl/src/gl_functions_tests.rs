//! Unit tests for entry point loading and feature detection

use super::*;
use crate::fake_gl;

fn load_without(missing: &'static [&'static str]) -> GlFunctions {
    fake_gl::reset();
    GlFunctions::load(fake_gl::resolver_without(missing)).unwrap()
}

// ============================================================================
// LOADING
// ============================================================================

#[test]
fn test_full_driver_has_every_feature() {
    let functions = load_without(&[]);
    assert_eq!(functions.capabilities(), BackendCaps::all());
    assert!(functions.missing_optional().is_empty());
}

#[test]
fn test_missing_required_entry_points_are_listed() {
    fake_gl::reset();
    let result = GlFunctions::load(fake_gl::resolver_without(&["glFlush", "glBindTexture"]));
    match result {
        Err(Error::InitializationFailed(message)) => {
            assert!(message.contains("glFlush"));
            assert!(message.contains("glBindTexture"));
        }
        _ => panic!("loading should fail"),
    }
}

#[test]
fn test_sentinel_addresses_count_as_missing() {
    fake_gl::reset();
    let functions = GlFunctions::load(|name: &str| {
        if name == "glLogicOp" {
            usize::MAX as *const c_void
        } else if name == "glQueryCounter" {
            1 as *const c_void
        } else {
            fake_gl::resolve(name)
        }
    })
    .unwrap();
    assert!(functions.logic_op.is_none());
    assert!(functions.query_counter.is_none());
    assert_eq!(functions.missing_optional(), vec!["glQueryCounter", "glLogicOp"]);
}

#[test]
fn test_bare_core_driver_has_only_srgb() {
    let functions = load_without(fake_gl::OPTIONAL_ENTRY_POINTS);
    assert_eq!(functions.capabilities(), BackendCaps::FRAMEBUFFER_SRGB);
    assert_eq!(functions.missing_optional().len(), fake_gl::OPTIONAL_ENTRY_POINTS.len());
}

// ============================================================================
// FEATURE GROUPS
// ============================================================================

#[test]
fn test_features_need_every_entry_point_of_their_group() {
    let cases: [(&'static [&'static str], BackendCaps); 5] = [
        (&["glColorMaski"], BackendCaps::INDEXED_BLEND),
        (&["glDepthRangeIndexed"], BackendCaps::VIEWPORT_ARRAY),
        (&["glDispatchComputeIndirect"], BackendCaps::COMPUTE),
        (&["glDeleteSync"], BackendCaps::FENCE_SYNC),
        (&["glMultiDrawElementsIndirect"], BackendCaps::DRAW_INDIRECT),
    ];
    for (missing, feature) in cases {
        let caps = load_without(missing).capabilities();
        assert!(!caps.contains(feature), "{:?} without {:?}", feature, missing);
        assert_eq!(caps, BackendCaps::all().difference(feature));
    }
}

// ============================================================================
// QUERIES
// ============================================================================

#[test]
fn test_string_and_integer_queries() {
    let functions = load_without(&[]);
    assert_eq!(functions.string(GL_VENDOR), "Fake Vendor");
    // Unknown names come back null
    assert_eq!(functions.string(0x1234), "");
    assert_eq!(functions.integer(GL_MAX_COLOR_ATTACHMENTS), 8);

    fake_gl::set_integer(GL_MAX_COLOR_ATTACHMENTS, 4);
    assert_eq!(functions.integer(GL_MAX_COLOR_ATTACHMENTS), 4);
}
