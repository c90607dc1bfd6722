//! URL classification helpers.

use url::Url;

/// An absolute `http` or `https` URL.
#[must_use]
pub fn is_valid_url(input: &str) -> bool {
    Url::parse(input.trim()).is_ok_and(|u| matches!(u.scheme(), "http" | "https") && u.has_host())
}

/// Whether the URL points at a YouTube host.
#[must_use]
pub fn is_youtube_url(input: &str) -> bool {
    Url::parse(input.trim())
        .ok()
        .and_then(|u| u.host_str().map(str::to_ascii_lowercase))
        .is_some_and(|host| {
            host == "youtu.be"
                || host == "youtube.com"
                || host.ends_with(".youtube.com")
                || host == "youtube-nocookie.com"
                || host.ends_with(".youtube-nocookie.com")
        })
}

/// Heuristic: the URL names a playlist (`list=` query or `/playlist` path).
#[must_use]
pub fn is_playlist_url(input: &str) -> bool {
    input.contains("list=") || input.contains("/playlist")
}

/// A proxy URL yt-dlp will accept (`http`, `https`, `socks4`, `socks4a`, `socks5`, `socks5h`).
#[must_use]
pub fn is_valid_proxy_url(input: &str) -> bool {
    Url::parse(input.trim()).is_ok_and(|u| {
        matches!(
            u.scheme(),
            "http" | "https" | "socks4" | "socks4a" | "socks5" | "socks5h"
        ) && u.has_host()
    })
}
