use crate::render::AttributeFormat;

/// Value written by a module in the vertex stage and read back, interpolated,
/// in the fragment stage.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct Varying<'a> {
    pub name: &'a str,
    pub format: AttributeFormat,
}

impl<'a> Varying<'a> {
    pub const fn new(name: &'a str, format: AttributeFormat) -> Self {
        Self { name, format }
    }
}

/// Named shader snippet injected into both stages.
///
/// Each varying is visible to the snippets as a module-scope variable of the
/// same name: `vs` writes it, `fs` reads it.
#[derive(Debug, Copy, Clone)]
pub struct ShaderModule<'a> {
    pub name: &'a str,
    pub varyings: &'a [Varying<'a>],
    pub vs: &'a str,
    pub fs: &'a str,
}
