mod error;
mod types;
mod utils;

pub use error::DiffError;
pub use error::ImageSide;
pub use types::ImageDimensions;
pub use utils::get_current_timestamp_str;
