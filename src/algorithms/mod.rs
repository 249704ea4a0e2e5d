pub mod pattern_engine;
pub mod round_size;

pub use pattern_engine::{build_method, MethodKind, MethodSpec, PassSpec};
pub use round_size::{round_size, MethodClass, RoundSize, VerifyMode};
