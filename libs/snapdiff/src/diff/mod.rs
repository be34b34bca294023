mod anti_aliasing;
mod types;
mod utils;

pub use types::DiffOptions;
pub use types::DiffResult;
pub use utils::compare;
pub use utils::compare_with_options;
pub use utils::compare_with_threshold;
