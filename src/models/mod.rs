pub mod change_log;
pub mod field;
pub mod item;
pub mod item_data;
pub mod preference;

pub use change_log::*;
pub use field::*;
pub use item::*;
pub use item_data::*;
pub use preference::*;
