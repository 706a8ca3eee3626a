pub mod text;

pub use text::{render_dashboard, render_error, render_list, render_table};
