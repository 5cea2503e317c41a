//! HTML chrome, styling and the browser side of the preview editor.
//!
//! ## Module Structure
//!
//! - `styles` - site and preview-layer CSS
//! - `components` - page head, header, footer and preview banner
//! - `preview_js` - script that drives the editor in the browser

mod components;
mod preview_js;
mod styles;

pub use components::{page_head, preview_chrome, site_footer, site_header};
pub use preview_js::PREVIEW_SCRIPT;
pub use styles::{PREVIEW_STYLE, SITE_STYLE};
