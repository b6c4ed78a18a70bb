use std::collections::HashSet;
use std::fmt::Write;

use anyhow::{anyhow, bail, Result};
use naga::valid::{Capabilities, ValidationFlags, Validator};
use naga_oil::compose::{
    ComposableModuleDescriptor, Composer, NagaModuleDescriptor, ShaderLanguage, ShaderType,
};

use super::ident::{check_identifier, VARYINGS_BUILTINS, VERTEX_INPUT_BUILTINS};
use super::{ShaderModule, Varying};
use crate::render::AttributeFormat;

/// Entry point of the assembled vertex stage.
pub const VS_ENTRY: &str = "vs_main";

/// Entry point of the assembled fragment stage.
pub const FS_ENTRY: &str = "fs_main";

/// Import path of the built-in prelude. Shader modules may `#import` from it.
pub const PRELUDE_PATH: &str = "phyllo";

const PRELUDE: &str = "\
#define_import_path phyllo

struct Viewport {
    size: vec2<f32>,
    scale: f32,
    pad: f32,
}

@group(0) @binding(0) var<uniform> viewport: Viewport;

var<private> frag_coord: vec4<f32>;

fn frag_coord_gl() -> vec2<f32> {
    return vec2<f32>(frag_coord.x, viewport.size.y - frag_coord.y);
}
";

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
enum Stage {
    Vertex,
    Fragment,
}

impl Stage {
    fn name(self) -> &'static str {
        match self {
            Stage::Vertex => "vertex",
            Stage::Fragment => "fragment",
        }
    }

    fn snippet<'a>(self, module: &ShaderModule<'a>) -> &'a str {
        match self {
            Stage::Vertex => module.vs,
            Stage::Fragment => module.fs,
        }
    }

    /// Prelude items the main source sees without importing them.
    fn prelude_items(self) -> &'static str {
        match self {
            Stage::Vertex => "viewport",
            Stage::Fragment => "viewport, frag_coord, frag_coord_gl",
        }
    }
}

/// Composed and validated shader IR for both stages.
#[derive(Debug, Clone)]
pub struct AssembledShader {
    pub vertex: naga::Module,
    pub fragment: naga::Module,
}

/// Composes shader modules, attributes and the main sources into one naga
/// module per stage.
///
/// Every [`ShaderModule`] is registered with a `naga_oil` composer under its
/// name, once per stage, with its varyings declared as module-private
/// variables. Main sources pull module functions in with
/// `#import <module>::{...}`. Attribute `@location`s follow declaration order,
/// which is also the vertex buffer slot order used by
/// [`crate::render::Model`].
#[derive(Debug, Default, Clone)]
pub struct ShaderAssembler<'a> {
    modules: Vec<ShaderModule<'a>>,
    attributes: Vec<(&'a str, AttributeFormat)>,
}

impl<'a> ShaderAssembler<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn module(mut self, module: ShaderModule<'a>) -> Self {
        self.modules.push(module);
        self
    }

    pub fn modules(mut self, modules: &[ShaderModule<'a>]) -> Self {
        self.modules.extend_from_slice(modules);
        self
    }

    pub fn attribute(mut self, name: &'a str, format: AttributeFormat) -> Self {
        self.attributes.push((name, format));
        self
    }

    /// Composes both stages. Fails on clashing names and on any parse or
    /// validation error in the composed result.
    pub fn assemble(&self, vs: &str, fs: &str) -> Result<AssembledShader> {
        self.validate()?;

        let vertex = self.compose(Stage::Vertex, &self.vertex_source(vs)?)?;
        let fragment = self.compose(Stage::Fragment, &self.fragment_source(fs)?)?;

        Ok(AssembledShader { vertex, fragment })
    }

    fn validate(&self) -> Result<()> {
        let mut attribute_names = HashSet::new();
        for (name, _) in &self.attributes {
            check_identifier("attribute", name)?;
            if VERTEX_INPUT_BUILTINS.contains(name) {
                bail!("attribute name \"{name}\" clashes with a builtin input");
            }
            if !attribute_names.insert(*name) {
                bail!("duplicate attribute \"{name}\"");
            }
        }

        let mut module_names = HashSet::new();
        let mut varying_names = HashSet::new();
        for module in &self.modules {
            check_identifier("module", module.name)?;
            if module.name == PRELUDE_PATH {
                bail!("shader module name \"{PRELUDE_PATH}\" is reserved for the prelude");
            }
            if !module_names.insert(module.name) {
                bail!("shader module \"{}\" included twice", module.name);
            }
            for v in module.varyings {
                check_identifier("varying", v.name)?;
                if VARYINGS_BUILTINS.contains(&v.name) {
                    bail!("varying \"{}\" in module \"{}\" clashes with a builtin output", v.name, module.name);
                }
                if !varying_names.insert(v.name) {
                    bail!("varying \"{}\" declared by more than one module", v.name);
                }
            }
        }

        Ok(())
    }

    fn compose(&self, stage: Stage, source: &str) -> Result<naga::Module> {
        let mut composer = Composer::default();

        composer
            .add_composable_module(ComposableModuleDescriptor {
                source: PRELUDE,
                file_path: "phyllo/prelude.wgsl",
                language: ShaderLanguage::Wgsl,
                ..Default::default()
            })
            .map_err(|e| anyhow!("failed to register the shader prelude: {e}"))?;

        for module in &self.modules {
            let module_source = module_source(module, stage.snippet(module))?;
            let file_path = format!("{}.{}.wgsl", module.name, stage.name());
            composer
                .add_composable_module(ComposableModuleDescriptor {
                    source: &module_source,
                    file_path: &file_path,
                    language: ShaderLanguage::Wgsl,
                    ..Default::default()
                })
                .map_err(|e| anyhow!("shader module \"{}\" ({} stage): {e}", module.name, stage.name()))?;
        }

        let file_path = format!("main.{}.wgsl", stage.name());
        let module = composer
            .make_naga_module(NagaModuleDescriptor {
                source,
                file_path: &file_path,
                shader_type: ShaderType::Wgsl,
                ..Default::default()
            })
            .map_err(|e| anyhow!("failed to compose the {} stage: {e}", stage.name()))?;

        Validator::new(ValidationFlags::all(), Capabilities::default())
            .validate(&module)
            .map_err(|e| anyhow!("composed {} stage is invalid: {e}", stage.name()))?;

        Ok(module)
    }

    fn varyings(&self) -> impl Iterator<Item = (&'a str, Varying<'a>)> + '_ {
        self.modules
            .iter()
            .flat_map(|m| m.varyings.iter().map(move |v| (m.name, *v)))
    }

    fn write_imports(&self, out: &mut String, stage: Stage) -> Result<()> {
        writeln!(out, "#import {PRELUDE_PATH}::{{{}}}", stage.prelude_items())?;
        for module in self.modules.iter().filter(|m| !m.varyings.is_empty()) {
            writeln!(out, "#import {}", module.name)?;
        }
        writeln!(out)?;
        Ok(())
    }

    fn write_varyings_struct(&self, out: &mut String) -> Result<()> {
        writeln!(out, "struct Varyings {{")?;
        writeln!(out, "    @builtin(position) position: vec4<f32>,")?;
        for (loc, (_, v)) in self.varyings().enumerate() {
            writeln!(out, "    @location({loc}) {}: {},", v.name, v.format.wgsl_type())?;
        }
        writeln!(out, "}}\n")?;
        Ok(())
    }

    // Varyings are referenced as `module::name` so the wrapper's own locals
    // never shadow them.
    fn vertex_source(&self, vs: &str) -> Result<String> {
        let mut out = String::new();
        self.write_imports(&mut out, Stage::Vertex)?;
        writeln!(out, "{}\n", vs.trim())?;

        writeln!(out, "struct VertexInput {{")?;
        writeln!(out, "    @builtin(vertex_index) vertex_index: u32,")?;
        writeln!(out, "    @builtin(instance_index) instance_index: u32,")?;
        for (loc, (name, format)) in self.attributes.iter().enumerate() {
            writeln!(out, "    @location({loc}) {name}: {},", format.wgsl_type())?;
        }
        writeln!(out, "}}\n")?;

        self.write_varyings_struct(&mut out)?;

        writeln!(out, "@vertex")?;
        writeln!(out, "fn {VS_ENTRY}(in: VertexInput) -> Varyings {{")?;
        writeln!(out, "    var out: Varyings;")?;
        writeln!(out, "    out.position = vertex_main(in);")?;
        for (module, v) in self.varyings() {
            writeln!(out, "    out.{0} = {module}::{0};", v.name)?;
        }
        writeln!(out, "    return out;")?;
        writeln!(out, "}}")?;

        Ok(out)
    }

    fn fragment_source(&self, fs: &str) -> Result<String> {
        let mut out = String::new();
        self.write_imports(&mut out, Stage::Fragment)?;
        writeln!(out, "{}\n", fs.trim())?;

        self.write_varyings_struct(&mut out)?;

        writeln!(out, "@fragment")?;
        writeln!(out, "fn {FS_ENTRY}(in: Varyings) -> @location(0) vec4<f32> {{")?;
        writeln!(out, "    frag_coord = in.position;")?;
        for (module, v) in self.varyings() {
            writeln!(out, "    {module}::{0} = in.{0};", v.name)?;
        }
        writeln!(out, "    return fragment_main();")?;
        writeln!(out, "}}")?;

        Ok(out)
    }
}

/// Source registered for one stage of `module`: its import path, a private
/// variable per varying, then the stage snippet.
fn module_source(module: &ShaderModule<'_>, snippet: &str) -> Result<String> {
    let mut out = String::new();
    writeln!(out, "#define_import_path {}\n", module.name)?;
    for v in module.varyings {
        writeln!(out, "var<private> {}: {};", v.name, v.format.wgsl_type())?;
    }
    writeln!(out, "\n{}", snippet.trim())?;
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    const TINT_VARYINGS: [Varying<'static>; 1] = [Varying::new("tint_color", AttributeFormat::Float32x3)];

    const TINT: ShaderModule<'static> = ShaderModule {
        name: "tint",
        varyings: &TINT_VARYINGS,
        vs: "fn set_tint(c: vec3<f32>) { tint_color = c; }",
        fs: "fn get_tint() -> vec3<f32> { return tint_color; }",
    };

    const VS: &str = "
#import tint::set_tint

fn vertex_main(in: VertexInput) -> vec4<f32> {
    set_tint(in.color);
    return vec4<f32>(in.position + in.offset, 0.0, 1.0);
}";

    const FS: &str = "
#import tint::get_tint

fn fragment_main() -> vec4<f32> {
    let uv = frag_coord_gl() / viewport.size;
    return vec4<f32>(get_tint() * uv.x, 1.0);
}";

    fn assembler() -> ShaderAssembler<'static> {
        ShaderAssembler::new()
            .module(TINT)
            .attribute("position", AttributeFormat::Float32x2)
            .attribute("color", AttributeFormat::Float32x3)
            .attribute("offset", AttributeFormat::Float32x2)
    }

    fn entry_point<'m>(module: &'m naga::Module, name: &str) -> &'m naga::EntryPoint {
        module
            .entry_points
            .iter()
            .find(|e| e.name == name)
            .unwrap_or_else(|| panic!("no entry point {name}"))
    }

    #[test]
    fn attributes_get_locations_in_declaration_order() {
        let source = assembler().vertex_source(VS).unwrap();
        assert!(source.contains("@location(0) position: vec2<f32>,"));
        assert!(source.contains("@location(1) color: vec3<f32>,"));
        assert!(source.contains("@location(2) offset: vec2<f32>,"));
    }

    #[test]
    fn varyings_are_module_private_and_copied_by_the_wrappers() {
        let asm = assembler();
        let module = module_source(&TINT, TINT.vs).unwrap();
        assert!(module.starts_with("#define_import_path tint"));
        assert!(module.contains("var<private> tint_color: vec3<f32>;"));

        let vertex = asm.vertex_source(VS).unwrap();
        let fragment = asm.fragment_source(FS).unwrap();
        for stage in [&vertex, &fragment] {
            assert!(stage.contains("#import tint\n"));
            assert!(stage.contains("@location(0) tint_color: vec3<f32>,"));
        }
        assert!(vertex.contains("out.tint_color = tint::tint_color;"));
        assert!(fragment.contains("tint::tint_color = in.tint_color;"));
    }

    #[test]
    fn assembled_stages_expose_entry_points() {
        let shader = assembler().assemble(VS, FS).unwrap();
        assert_eq!(entry_point(&shader.vertex, VS_ENTRY).stage, naga::ShaderStage::Vertex);
        assert_eq!(entry_point(&shader.fragment, FS_ENTRY).stage, naga::ShaderStage::Fragment);
    }

    #[test]
    fn assembled_stages_validate() {
        let shader = assembler().assemble(VS, FS).unwrap();
        for module in [&shader.vertex, &shader.fragment] {
            Validator::new(ValidationFlags::all(), Capabilities::default())
                .validate(module)
                .unwrap();
        }
    }

    #[test]
    fn varying_named_like_a_wrapper_local_composes() {
        const OUT_VARYINGS: [Varying<'static>; 1] = [Varying::new("out", AttributeFormat::Float32)];
        let carry = ShaderModule {
            name: "carry",
            varyings: &OUT_VARYINGS,
            vs: "fn set_out(v: f32) { out = v; }",
            fs: "fn get_out() -> f32 { return out; }",
        };

        let source = assembler().module(carry).vertex_source(VS).unwrap();
        assert!(source.contains("out.out = carry::out;"));
        assert!(assembler().module(carry).assemble(VS, FS).is_ok());
    }

    #[test]
    fn invalid_main_source_is_an_error() {
        const BAD_FS: &str = "
#import tint::get_tint

fn fragment_main() -> vec4<f32> {
    return get_tint();
}";
        let err = assembler().assemble(VS, BAD_FS).unwrap_err();
        assert!(err.to_string().contains("fragment stage"));
    }

    #[test]
    fn invalid_module_snippet_is_an_error() {
        const LEVEL_VARYINGS: [Varying<'static>; 1] = [Varying::new("level", AttributeFormat::Float32)];
        let broken = ShaderModule {
            name: "broken",
            varyings: &LEVEL_VARYINGS,
            vs: "",
            fs: "fn get_level() -> f32 { return missing; }",
        };
        assert!(assembler().module(broken).assemble(VS, FS).is_err());
    }

    #[test]
    fn duplicate_module_is_rejected() {
        let err = assembler().module(TINT).assemble(VS, FS).unwrap_err();
        assert!(err.to_string().contains("included twice"));
    }

    #[test]
    fn prelude_name_is_reserved() {
        let prelude = ShaderModule { name: PRELUDE_PATH, varyings: &[], vs: "", fs: "" };
        let err = assembler().module(prelude).assemble(VS, FS).unwrap_err();
        assert!(err.to_string().contains("reserved"));
    }

    #[test]
    fn duplicate_attribute_is_rejected() {
        let err = assembler()
            .attribute("color", AttributeFormat::Float32x4)
            .assemble(VS, FS)
            .unwrap_err();
        assert!(err.to_string().contains("duplicate attribute"));
    }

    #[test]
    fn varying_clashing_with_builtin_output_is_rejected() {
        const BAD_VARYINGS: [Varying<'static>; 1] =
            [Varying::new("position", AttributeFormat::Float32x4)];
        let bad = ShaderModule { name: "bad", varyings: &BAD_VARYINGS, vs: "", fs: "" };
        assert!(ShaderAssembler::new().module(bad).assemble(VS, FS).is_err());
    }

    #[test]
    fn varying_shared_between_modules_is_rejected() {
        let other = ShaderModule { name: "other", ..TINT };
        let err = assembler().module(other).assemble(VS, FS).unwrap_err();
        assert!(err.to_string().contains("more than one module"));
    }

    #[test]
    fn builtin_attribute_name_is_rejected() {
        let err = ShaderAssembler::new()
            .attribute("instance_index", AttributeFormat::Float32)
            .assemble(VS, FS)
            .unwrap_err();
        assert!(err.to_string().contains("builtin"));
    }
}
