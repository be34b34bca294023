mod utils;

pub use utils::decode_png;
pub use utils::encode_png;
pub use utils::png_dimensions;
pub use utils::extend_canvas;
pub use utils::align_to_common_canvas;
pub use utils::SENTINEL;
