//! Application services for the boxd backend.

pub mod auth;
pub mod extractor;
pub mod images;
pub mod renderer;

pub use auth::{AuthService, Claims};
pub use extractor::MovieExtractor;
pub use images::ImageOptimizer;
pub use renderer::{ChromeRenderer, PageRenderer};
