//! GLSL sources shared by the filter programs.
//!
//! Every fragment shader samples its input through `set = 0` (texture at
//! binding 0, sampler at binding 1). Filters with per-pass parameters read
//! them from a uniform block at `set = 1, binding = 0`.

use std::fmt::Write as _;

use crate::kernel::GaussianKernel;

/// Quad vertex shader: forwards clip-space position and texture coordinate.
pub(crate) const VERTEX_SHADER_GLSL: &str = r"#version 450
layout(location = 0) in vec2 a_position;
layout(location = 1) in vec2 a_tex_coord;
layout(location = 0) out vec2 v_tex_coord;

void main() {
    gl_Position = vec4(a_position, 0.0, 1.0);
    v_tex_coord = a_tex_coord;
}
";

/// Samples the input at the interpolated coordinate and writes it unchanged.
pub(crate) const PASSTHROUGH_FRAGMENT_GLSL: &str = r"#version 450
layout(location = 0) in vec2 v_tex_coord;
layout(location = 0) out vec4 frag_color;

layout(set = 0, binding = 0) uniform texture2D input_texture;
layout(set = 0, binding = 1) uniform sampler input_sampler;

void main() {
    frag_color = texture(sampler2D(input_texture, input_sampler), v_tex_coord);
}
";

/// Prologue of the generated blur shader. `pixel_delta` is one texel along
/// the blur axis; `padding` keeps the block at 16 bytes for std140.
const BLUR_HEADER: &str = r"#version 450
layout(location = 0) in vec2 v_tex_coord;
layout(location = 0) out vec4 frag_color;

layout(set = 0, binding = 0) uniform texture2D input_texture;
layout(set = 0, binding = 1) uniform sampler input_sampler;

layout(std140, set = 1, binding = 0) uniform BlurParams {
    vec2 pixel_delta;
    vec2 padding;
} params;

void main() {
    vec4 color = vec4(0.0);
";

const BLUR_FOOTER: &str = "    frag_color = color;\n}\n";

/// Generates the unrolled 1-D convolution shader for `kernel`.
///
/// One accumulation line is emitted per tap in `-radius..=radius`; there is
/// no runtime loop.
pub(crate) fn blur_fragment_source(kernel: &GaussianKernel) -> String {
    let taps = 2 * kernel.radius() as usize + 1;
    let mut source = String::with_capacity(BLUR_HEADER.len() + BLUR_FOOTER.len() + taps * 112);
    source.push_str(BLUR_HEADER);
    for (offset, weight) in kernel.taps() {
        // Writing into a String cannot fail.
        let _ = writeln!(
            source,
            "    color += texture(sampler2D(input_texture, input_sampler), v_tex_coord + {offset}.0 * params.pixel_delta) * {weight:.9};"
        );
    }
    source.push_str(BLUR_FOOTER);
    source
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compile::{validate_glsl, ShaderStage};
    use crate::types::KernelNormalization;

    fn tap_lines(source: &str) -> usize {
        source
            .lines()
            .filter(|line| line.trim_start().starts_with("color +="))
            .count()
    }

    #[test]
    fn blur_source_unrolls_every_tap() {
        for radius in [0, 1, 4, 12] {
            let kernel = GaussianKernel::new(radius, KernelNormalization::Exact);
            let source = blur_fragment_source(&kernel);
            assert_eq!(tap_lines(&source), 2 * radius as usize + 1);
            assert!(!source.contains("for ("));
        }
    }

    #[test]
    fn blur_source_orders_offsets_from_negative_to_positive() {
        let kernel = GaussianKernel::new(2, KernelNormalization::Exact);
        let source = blur_fragment_source(&kernel);
        let first = source.find("v_tex_coord + -2.0").expect("first tap");
        let centre = source.find("v_tex_coord + 0.0").expect("centre tap");
        let last = source.find("v_tex_coord + 2.0").expect("last tap");
        assert!(first < centre && centre < last);
    }

    #[test]
    fn zero_radius_blur_samples_once_at_full_weight() {
        let kernel = GaussianKernel::new(0, KernelNormalization::Exact);
        let source = blur_fragment_source(&kernel);
        assert!(source.contains("v_tex_coord + 0.0 * params.pixel_delta) * 1.000000000;"));
    }

    #[test]
    fn generated_shaders_validate() {
        validate_glsl(ShaderStage::Vertex, "quad vertex", VERTEX_SHADER_GLSL)
            .expect("vertex shader");
        validate_glsl(
            ShaderStage::Fragment,
            "passthrough fragment",
            PASSTHROUGH_FRAGMENT_GLSL,
        )
        .expect("passthrough shader");
        for radius in [0, 1, 5, 32] {
            let kernel = GaussianKernel::new(radius, KernelNormalization::Legacy);
            let source = blur_fragment_source(&kernel);
            validate_glsl(ShaderStage::Fragment, "blur fragment", &source)
                .unwrap_or_else(|err| panic!("radius {radius}: {err}"));
        }
    }
}
