//! Resource path templates with a single `:pathParam` placeholder.

use std::fmt::Display;

/// Placeholder replaced by the caller-supplied identifier.
pub const PATH_PARAM: &str = ":pathParam";

/// Substitute `param` into `template`.
///
/// The identifier is percent-encoded as a single path segment, so `/`, `?`
/// and `#` inside it cannot reach another resource. The template is returned
/// unchanged when it has no placeholder or when `param` is absent or renders
/// to an empty string.
pub fn resolve<P: Display>(template: &str, param: Option<P>) -> String {
    let Some(param) = param else {
        return template.to_owned();
    };
    let value = param.to_string();
    if value.is_empty() || !template.contains(PATH_PARAM) {
        return template.to_owned();
    }
    template.replacen(PATH_PARAM, &urlencoding::encode(&value), 1)
}

/// Whether `template` expects a path parameter.
pub fn has_placeholder(template: &str) -> bool {
    template.contains(PATH_PARAM)
}
