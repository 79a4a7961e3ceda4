//! Static-site output: the posts index page and the home page article list.
//!
//! # Submodules
//!
//! - [`indexes`]: Rebuilds `posts/genba/index.html` from the posts directory
//!   and splices the generated-article list into the home page between its
//!   marker comments
//!
//! # Output Structure
//!
//! ```text
//! web_root/
//! ├── index.html              # home page, list between GENBA markers
//! └── posts/genba/
//!     ├── index.html          # rebuilt posts index
//!     └── genba_2025-08-02_docker-shokyu.html
//! ```

pub mod indexes;
