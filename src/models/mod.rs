pub mod dimension;
pub mod loaders;
pub mod schema;
pub mod session;

pub use dimension::Dimension;
pub use loaders::load_deployment;
pub use schema::{FieldKind, FieldSpec, PayloadSchema};
pub use session::{EvaluationResult, QaPair, SessionPhase, SessionState, Speaker, Turn};
