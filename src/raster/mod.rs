pub mod buffer;
pub mod codec;
pub mod mosaic;

pub use buffer::PixelBuffer;
pub use mosaic::{Region, apply_mosaic};
