/// Escape text for inclusion in HTML element content or attribute values.
///
/// `&`, `<`, `>`, `"` and `'` are replaced; everything else passes through.
pub fn escape(text: &str) -> String {
    html_escape::encode_quoted_attribute(text).into_owned()
}
