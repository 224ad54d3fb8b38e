pub mod builder;
pub mod consts;
pub mod diagnostic;
pub mod emitter;
pub mod error;
pub mod id;
pub mod model;
pub mod parser;
pub mod syntax;

pub use builder::{BuildOutput, build_model};
pub use diagnostic::{Diagnostic, Severity, report};
pub use emitter::LayoutRect;
pub use error::{ModelError, ParseError};
pub use id::{FullName, Name};
pub use model::{Binding, Call, Entity, EntityId, EntityKind, Literal, Range, SourceModel};
pub use parser::parse_script;

/// Parse and build in one step.
pub fn build_source(text: &str, file_name: &str) -> Result<BuildOutput, ParseError> {
    let file = parse_script(text, file_name)?;
    Ok(build_model(&file))
}
