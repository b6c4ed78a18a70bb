//! Shader module composition.
//!
//! A scene supplies a main vertex and fragment body plus a list of named
//! [`ShaderModule`]s. [`ShaderAssembler`] registers the modules with a
//! `naga_oil` composer and composes one validated naga module per stage,
//! generating the vertex input struct from the bound attributes and the
//! inter-stage struct from the modules' varyings.
//!
//! Contract for the main sources:
//! - vertex: `fn vertex_main(in: VertexInput) -> vec4<f32>` returning the clip position
//! - fragment: `fn fragment_main() -> vec4<f32>` returning the output color
//! - module functions are imported by path, e.g. `#import color::{set_center}`
//!
//! Both stages see the `viewport` uniform; the fragment stage also sees
//! `frag_coord` and `frag_coord_gl()` (bottom-left origin).

mod assembler;
mod ident;
mod module;

pub use assembler::{AssembledShader, ShaderAssembler, FS_ENTRY, PRELUDE_PATH, VS_ENTRY};
pub use module::{ShaderModule, Varying};
