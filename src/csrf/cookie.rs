//! Cookie rendering and parsing for the CSRF cookie.

/// Render a `Set-Cookie` value: `Path=/`, `SameSite=Strict`, finite `Max-Age`,
/// and `Secure` when the response travels over an encrypted transport.
pub fn render_set_cookie(name: &str, value: &str, max_age_secs: u64, secure: bool) -> String {
    let mut cookie = format!(
        "{}={}; Path=/; Max-Age={}; SameSite=Strict",
        name, value, max_age_secs
    );
    if secure {
        cookie.push_str("; Secure");
    }
    cookie
}

/// Find `name` in a request `Cookie` header (`a=1; b=2`).
pub fn find_in_cookie_header(header: &str, name: &str) -> Option<String> {
    header.split(';').find_map(|part| {
        let (key, value) = part.trim().split_once('=')?;
        if key.trim() == name {
            let value = value.trim().trim_matches('"');
            (!value.is_empty()).then(|| value.to_string())
        } else {
            None
        }
    })
}

/// Extract the value of `name` from a `Set-Cookie` header, ignoring attributes.
/// Returns `None` for other cookies and for deletions (`Max-Age=0`).
pub fn find_in_set_cookie(header: &str, name: &str) -> Option<String> {
    let mut parts = header.split(';');
    let (key, value) = parts.next()?.trim().split_once('=')?;
    if key.trim() != name {
        return None;
    }
    let deleted = parts.any(|attr| attr.trim().eq_ignore_ascii_case("max-age=0"));
    let value = value.trim().trim_matches('"');
    (!deleted && !value.is_empty()).then(|| value.to_string())
}
