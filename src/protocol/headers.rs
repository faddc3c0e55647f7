//! Header and cookie names used on the wire.

/// Custom header carrying the header half of a CSRF pair.
pub const X_CSRF_TOKEN: &str = "x-csrf-token";

/// Anti-sniff marker sent by the browser client.
pub const X_REQUESTED_WITH: &str = "x-requested-with";

/// Value for [`X_REQUESTED_WITH`].
pub const XML_HTTP_REQUEST: &str = "XMLHttpRequest";

/// Per-attempt request identifier.
pub const X_REQUEST_ID: &str = "x-request-id";

/// Client build version.
pub const X_CLIENT_VERSION: &str = "x-client-version";

/// Client wall clock at send time, milliseconds since the Unix epoch.
pub const X_CLIENT_TIMESTAMP: &str = "x-client-timestamp";

/// Default name of the cookie carrying the cookie half of a CSRF pair.
pub const DEFAULT_CSRF_COOKIE: &str = "csrf_token";
