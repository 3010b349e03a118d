use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;

/// File stem of a player's profile document under `profiles/`.
///
/// URL-safe base64 of the UTF-8 name without `=` padding. The offline profile
/// generator names its files the same way, so any drift here turns every
/// profile lookup into a 404.
pub fn player_profile_path(name: &str) -> String {
    URL_SAFE_NO_PAD.encode(name.as_bytes())
}
