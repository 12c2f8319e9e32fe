pub mod paths;
pub mod redact;
pub mod settings;

pub use paths::*;
pub use redact::redact_sensitive;
pub use settings::*;
