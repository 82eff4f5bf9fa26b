pub mod bar_buffer;

pub use bar_buffer::{Applied, BarBuffer, BarSnapshot, BarUpdate};
