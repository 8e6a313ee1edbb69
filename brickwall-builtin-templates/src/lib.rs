//! Provides the built-in templates.

use std::collections::BTreeMap;

use brickwall_lang::{CompileError, CompiledTemplate, Compiler};

include!(concat!(env!("OUT_DIR"), "/built_in.gen.rs"));

/// A built-in template that failed to compile.
#[derive(Debug, thiserror::Error)]
#[error("built-in template `{name}`: {source}")]
pub struct BuiltInError {
    /// The name of the template.
    pub name: &'static str,
    /// The compilation error.
    #[source]
    pub source: CompileError,
}

/// Returns the sources of the built-in templates by name.
pub fn built_in_template_sources() -> BTreeMap<&'static str, &'static str> {
    BUILT_IN_TEMPLATES_RAW
        .iter()
        .map(|&(name, content)| (name.strip_suffix(".bwt").unwrap_or(name), content))
        .collect()
}

/// Compiles the built-in template with the given name.
pub fn built_in_template(name: &str) -> Option<Result<CompiledTemplate, BuiltInError>> {
    let (name, source) = built_in_template_sources().into_iter().find(|&(n, _)| n == name)?;

    Some(
        Compiler::new()
            .compile(source)
            .map_err(|source| BuiltInError { name, source }),
    )
}

/// Compiles all built-in templates.
pub fn built_in_templates() -> Result<BTreeMap<&'static str, CompiledTemplate>, BuiltInError> {
    let mut compiler = Compiler::new();

    built_in_template_sources()
        .into_iter()
        .map(|(name, source)| {
            compiler
                .compile(source)
                .map(|template| (name, template))
                .map_err(|source| BuiltInError { name, source })
        })
        .collect()
}
