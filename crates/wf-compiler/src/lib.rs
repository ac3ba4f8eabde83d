//! wf-compiler - Graph compiler for Weft
//!
//! Turns a flat list of raw action declarations into a validated
//! [`CompiledGraph`]: targets are assigned, the per-kind rule set is
//! enforced, and wildcard dependencies are expanded.

pub mod declaration;
pub mod expand;
pub mod session;

pub use declaration::{ActionDeclaration, DeclarationKind, Declarations};
pub use expand::{expand, expand_dependencies};
pub use session::{DeclaredAction, Session};

use wf_core::{CompiledGraph, ProjectConfig};

/// Compile `declarations` under `config`
///
/// Never fails: rule violations are reported in the graph's error list.
pub fn compile<I>(declarations: I, config: ProjectConfig) -> CompiledGraph
where
    I: IntoIterator<Item = ActionDeclaration>,
{
    let mut session = Session::new(config);
    for declaration in declarations {
        session.declare(declaration);
    }
    session.compile()
}
