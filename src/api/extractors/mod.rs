//! Custom request extractors.

mod context;
mod validated_json;

pub use context::{SuperOwnerActor, Tenant};
pub use validated_json::ValidatedJson;
