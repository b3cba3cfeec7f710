pub mod colors;
mod input;
mod layout;
mod state;

pub use input::handle_key;
pub use layout::render_ui;
pub use state::TuiState;
