use litpage::html::escape;

#[test]
fn markup_characters_are_escaped() {
    assert_eq!(
        escape(r#"<a href="x">Tom & 'Jerry'</a>"#),
        "&lt;a href=&quot;x&quot;&gt;Tom &amp; &#x27;Jerry&#x27;&lt;/a&gt;"
    );
}

#[test]
fn plain_text_is_unchanged() {
    assert_eq!(escape("fn main() { x / 2 }"), "fn main() { x / 2 }");
    assert_eq!(escape("naïve → ok"), "naïve → ok");
    assert_eq!(escape(""), "");
}
