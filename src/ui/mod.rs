pub mod icons;
pub mod output;
pub mod progress;
pub mod table;
pub mod theme;

pub use icons::Icons;
pub use output::{error, header, info, node_line, section, success, summary_row, warn};
pub use progress::ProgressManager;
pub use table::{AdapterRow, LanguageRow, TableBuilder};
pub use theme::{theme, Theme};
