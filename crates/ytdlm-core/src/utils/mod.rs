//! Small pure helpers shared by the adapters.

pub mod url;

pub use url::{is_playlist_url, is_valid_proxy_url, is_valid_url, is_youtube_url};
