//! HTML tag tables that drive element closing.

/// HTML void elements: never take children or a close tag.
///
/// <https://www.w3.org/TR/html51/syntax.html#void-elements>
pub const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "keygen", "link", "menuitem",
    "meta", "param", "source", "track", "wbr",
];

const P_CLOSERS: &[&str] = &[
    "address",
    "article",
    "aside",
    "blockquote",
    "details",
    "div",
    "dl",
    "fieldset",
    "figcaption",
    "figure",
    "footer",
    "form",
    "h1",
    "h2",
    "h3",
    "h4",
    "h5",
    "h6",
    "header",
    "hr",
    "main",
    "menu",
    "nav",
    "ol",
    "p",
    "pre",
    "section",
    "table",
    "ul",
];

/// Elements whose end tag may be omitted, with the sibling tags that close
/// them implicitly.
///
/// <https://www.w3.org/TR/html51/syntax.html#optional-tags>
pub const AUTO_STOP_TAGS: &[(&str, &[&str])] = &[
    ("li", &["li"]),
    ("dt", &["dt", "dd"]),
    ("dd", &["dd", "dt"]),
    ("p", P_CLOSERS),
    ("rt", &["rt", "rp"]),
    ("rp", &["rt", "rp"]),
    ("optgroup", &["optgroup"]),
    ("option", &["option", "optgroup"]),
    ("thead", &["tbody", "tfoot"]),
    ("tbody", &["tbody", "tfoot"]),
    ("tfoot", &["tbody"]),
    ("tr", &["tr"]),
    ("td", &["td", "th"]),
    ("th", &["td", "th"]),
];

/// Check if a lowercased tag name is an HTML void element.
pub fn is_void_element(tag: &str) -> bool {
    VOID_ELEMENTS.contains(&tag)
}

/// The sibling names that implicitly close a lowercased tag, if any.
pub fn auto_stop_tags(tag: &str) -> Option<&'static [&'static str]> {
    AUTO_STOP_TAGS
        .iter()
        .find(|(name, _)| *name == tag)
        .map(|(_, stops)| *stops)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_void_elements() {
        for tag in ["br", "hr", "img", "input", "keygen", "menuitem"] {
            assert!(is_void_element(tag), "{tag}");
        }
        assert!(!is_void_element("div"));
        assert!(!is_void_element("BR"));
    }

    #[test]
    fn test_auto_stop_lookup() {
        assert_eq!(auto_stop_tags("li"), Some(&["li"][..]));
        assert_eq!(auto_stop_tags("option"), Some(&["option", "optgroup"][..]));
        assert_eq!(auto_stop_tags("div"), None);
    }

    #[test]
    fn test_paragraph_closers() {
        let stops = auto_stop_tags("p").unwrap();
        assert_eq!(stops.len(), 29);
        assert!(stops.contains(&"ul"));
        assert!(stops.contains(&"h6"));
        assert!(!stops.contains(&"span"));
    }
}
