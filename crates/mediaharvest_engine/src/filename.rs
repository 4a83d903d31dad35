use url::Url;

pub const DEFAULT_EXTENSION: &str = "jpg";

/// Image types only; the downloader rejects anything outside `image/*`
/// and octet-stream before a name is chosen.
const KNOWN_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "webp", "avif", "heic", "bmp"];

/// `{file_index}.{ext}`. The extension comes from the response content type,
/// then from the url path, then falls back to `jpg`.
pub fn media_filename(file_index: u64, media_url: &str, content_type: Option<&str>) -> String {
    let ext = content_type
        .and_then(extension_for_content_type)
        .or_else(|| extension_from_url(media_url))
        .unwrap_or(DEFAULT_EXTENSION);
    format!("{file_index}.{ext}")
}

fn extension_for_content_type(content_type: &str) -> Option<&'static str> {
    let essence = content_type.split(';').next()?.trim().to_ascii_lowercase();
    match essence.as_str() {
        "image/jpeg" | "image/jpg" | "image/pjpeg" => Some("jpg"),
        "image/png" => Some("png"),
        "image/gif" => Some("gif"),
        "image/webp" => Some("webp"),
        "image/avif" => Some("avif"),
        "image/heic" => Some("heic"),
        "image/bmp" => Some("bmp"),
        _ => None,
    }
}

fn extension_from_url(media_url: &str) -> Option<&'static str> {
    let url = Url::parse(media_url).ok()?;
    let last = url.path_segments()?.next_back()?;
    let (_, ext) = last.rsplit_once('.')?;
    let ext = ext.to_ascii_lowercase();
    let known = KNOWN_EXTENSIONS.iter().copied().find(|known| *known == ext)?;
    Some(if known == "jpeg" { "jpg" } else { known })
}
