use bytemuck::{Pod, Zeroable};
use wgpu::util::DeviceExt;

/// Interleaved quad vertex: clip-space position followed by texture coordinate.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub(crate) struct QuadVertex {
    pub position: [f32; 2],
    pub tex_coord: [f32; 2],
}

impl QuadVertex {
    const ATTRIBUTES: [wgpu::VertexAttribute; 2] =
        wgpu::vertex_attr_array![0 => Float32x2, 1 => Float32x2];

    pub fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<QuadVertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRIBUTES,
        }
    }
}

/// Full-screen triangle strip. Texture coordinates use the `wgpu` convention
/// (origin at the top-left), so `(0, 0)` lands on the first row of every
/// texture and no pass flips the image.
pub(crate) const QUAD_VERTICES: [QuadVertex; 4] = [
    QuadVertex {
        position: [1.0, 1.0],
        tex_coord: [1.0, 0.0],
    },
    QuadVertex {
        position: [-1.0, 1.0],
        tex_coord: [0.0, 0.0],
    },
    QuadVertex {
        position: [1.0, -1.0],
        tex_coord: [1.0, 1.0],
    },
    QuadVertex {
        position: [-1.0, -1.0],
        tex_coord: [0.0, 1.0],
    },
];

/// Vertex buffer holding [`QUAD_VERTICES`], created once per pipeline.
pub(crate) struct QuadGeometry {
    pub buffer: wgpu::Buffer,
}

impl QuadGeometry {
    pub fn new(device: &wgpu::Device) -> Self {
        let buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("full-screen quad"),
            contents: bytemuck::cast_slice(&QUAD_VERTICES),
            usage: wgpu::BufferUsages::VERTEX,
        });
        Self { buffer }
    }

    pub fn vertex_count(&self) -> u32 {
        QUAD_VERTICES.len() as u32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quad_vertex_is_sixteen_bytes() {
        assert_eq!(std::mem::size_of::<QuadVertex>(), 16);
        assert_eq!(QuadVertex::layout().attributes[1].offset, 8);
    }

    #[test]
    fn strip_winds_counter_clockwise() {
        // Both triangles of the strip must face the camera under back-face culling.
        for (index, window) in QUAD_VERTICES.windows(3).enumerate() {
            let [a, b, c] = [window[0].position, window[1].position, window[2].position];
            let cross = (b[0] - a[0]) * (c[1] - a[1]) - (b[1] - a[1]) * (c[0] - a[0]);
            let ccw = if index % 2 == 0 { cross > 0.0 } else { cross < 0.0 };
            assert!(ccw, "triangle {index} has the wrong winding");
        }
    }

    #[test]
    fn tex_coords_follow_top_left_origin() {
        for vertex in QUAD_VERTICES {
            let expected = [
                (vertex.position[0] + 1.0) * 0.5,
                (1.0 - vertex.position[1]) * 0.5,
            ];
            assert_eq!(vertex.tex_coord, expected);
        }
    }
}
