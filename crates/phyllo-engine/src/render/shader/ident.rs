use anyhow::{bail, Result};

/// Builtin members of the generated `VertexInput` struct.
pub(super) const VERTEX_INPUT_BUILTINS: &[&str] = &["vertex_index", "instance_index"];

/// Builtin members of the generated `Varyings` struct.
pub(super) const VARYINGS_BUILTINS: &[&str] = &["position"];

// Keywords plus the reserved words most likely to be picked as attribute names.
const RESERVED: &[&str] = &[
    "alias", "break", "case", "const", "const_assert", "continue", "continuing", "default",
    "diagnostic", "discard", "else", "enable", "false", "fn", "for", "if", "let", "loop",
    "override", "requires", "return", "struct", "switch", "true", "var", "while", "attribute",
    "varying", "module", "set", "self", "type", "uniform", "layout", "filter", "target",
    "static", "shared", "union", "enum", "match", "impl", "mod", "use", "where",
];

/// Checks that `name` is a plain WGSL identifier that will not collide with
/// keywords.
pub(super) fn check_identifier(kind: &str, name: &str) -> Result<()> {
    let mut chars = name.chars();
    let Some(first) = chars.next() else {
        bail!("{kind} name is empty");
    };
    if !(first.is_ascii_alphabetic() || first == '_') || !chars.all(|c| c.is_ascii_alphanumeric() || c == '_') {
        bail!("{kind} name \"{name}\" is not a valid identifier");
    }
    if name == "_" || name.starts_with("__") {
        bail!("{kind} name \"{name}\" is reserved");
    }
    if RESERVED.contains(&name) {
        bail!("{kind} name \"{name}\" is a WGSL keyword or reserved word");
    }
    Ok(())
}
