//! Service name normalization

/// Turn a free-form service name into a metric-name-safe namespace.
///
/// Every character is lowercased, each run of whitespace or `-` becomes a
/// single `_`, and leading/trailing underscores are trimmed. Total for any
/// input; the empty string maps to the empty string.
///
/// ```
/// use promnats_axum::normalize;
///
/// assert_eq!(normalize("My Service-Name"), "my_service_name");
/// assert_eq!(normalize("  leading"), "leading");
/// ```
pub fn normalize(service_name: &str) -> String {
    let mut out = String::with_capacity(service_name.len());
    let mut in_separator = false;

    for ch in service_name.chars() {
        if ch == '-' || ch.is_whitespace() {
            if !in_separator {
                out.push('_');
                in_separator = true;
            }
        } else {
            out.extend(ch.to_lowercase());
            in_separator = false;
        }
    }

    out.trim_matches('_').to_string()
}
