//! Listing document sources
//!
//! Row extraction and cell normalization are shared; each origin contributes
//! a `JobSource` that maps its table columns onto a [`Job`](crate::models::Job).

pub mod factory;
pub mod fields;
pub mod jobright;
pub mod simplify;
pub mod table;
pub mod traits;

pub use factory::{SourceHandlerFactory, SourceKind};
pub use fields::{extract_text, extract_url, extract_url_with, LinkSyntax};
pub use jobright::JobrightSource;
pub use simplify::SimplifySource;
pub use table::{html_rows, markdown_rows};
pub use traits::JobSource;
