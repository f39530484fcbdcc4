use std::fmt;

/// Represents ways to locate a remote element
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Selector {
    /// Select by CSS selector (the default strategy)
    Css(String),
    /// Select using an XPath query
    XPath(String),
    /// Select an anchor element by its exact link text
    LinkText(String),
    /// Select an anchor element by a substring of its link text
    PartialLinkText(String),
    /// Select by tag name
    TagName(String),
    /// Chain multiple selectors, each resolved within the previous match
    Chain(Vec<Selector>),
    /// Represents an invalid selector string, with a reason.
    Invalid(String),
}

impl Selector {
    /// The W3C `using` strategy string for this selector, or `None` for
    /// non-leaf selectors that cannot be sent over the wire directly.
    pub fn strategy(&self) -> Option<&'static str> {
        match self {
            Selector::Css(_) => Some("css selector"),
            Selector::XPath(_) => Some("xpath"),
            Selector::LinkText(_) => Some("link text"),
            Selector::PartialLinkText(_) => Some("partial link text"),
            Selector::TagName(_) => Some("tag name"),
            Selector::Chain(_) | Selector::Invalid(_) => None,
        }
    }

    /// The raw selector expression sent as the W3C `value` field.
    pub fn expression(&self) -> Option<&str> {
        match self {
            Selector::Css(s)
            | Selector::XPath(s)
            | Selector::LinkText(s)
            | Selector::PartialLinkText(s)
            | Selector::TagName(s) => Some(s),
            Selector::Chain(_) | Selector::Invalid(_) => None,
        }
    }

    /// Flatten this selector into an ordered scope chain, root first.
    pub fn into_links(self) -> Vec<Selector> {
        match self {
            Selector::Chain(links) => links.into_iter().flat_map(Selector::into_links).collect(),
            leaf => vec![leaf],
        }
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Selector::Css(s)
            | Selector::XPath(s)
            | Selector::LinkText(s)
            | Selector::PartialLinkText(s)
            | Selector::TagName(s) => write!(f, "{s}"),
            Selector::Chain(links) => {
                let rendered: Vec<String> = links.iter().map(|l| l.to_string()).collect();
                write!(f, "{}", rendered.join(" >> "))
            }
            Selector::Invalid(reason) => write!(f, "<invalid: {reason}>"),
        }
    }
}

/// Render a scope chain the way a single chained selector displays.
pub(crate) fn chain_to_string(chain: &[Selector]) -> String {
    let rendered: Vec<String> = chain.iter().map(|l| l.to_string()).collect();
    rendered.join(" >> ")
}

impl From<&str> for Selector {
    fn from(s: &str) -> Self {
        // Handle chained selectors first
        let parts: Vec<&str> = s.split(">>").map(|p| p.trim()).collect();
        if parts.len() > 1 {
            return Selector::Chain(parts.into_iter().map(Selector::from).collect());
        }

        let lower = s.to_lowercase();
        match s {
            _ if lower.starts_with("css:") => Selector::Css(s[4..].trim().to_string()),
            _ if lower.starts_with("xpath:") => Selector::XPath(s[6..].trim().to_string()),
            _ if lower.starts_with("link text:") => {
                Selector::LinkText(s["link text:".len()..].trim().to_string())
            }
            _ if lower.starts_with("partial link text:") => {
                Selector::PartialLinkText(s["partial link text:".len()..].trim().to_string())
            }
            _ if lower.starts_with("tag:") => Selector::TagName(s[4..].trim().to_string()),
            // Bare XPath expressions are common enough to recognize directly
            _ if s.starts_with('/') || s.starts_with("./") || s.starts_with('(') => {
                Selector::XPath(s.to_string())
            }
            _ if s.is_empty() => Selector::Invalid("Empty selector string".to_string()),
            // Anything else is treated as CSS, the protocol's default strategy
            _ => Selector::Css(s.to_string()),
        }
    }
}

impl From<String> for Selector {
    fn from(s: String) -> Self {
        Selector::from(s.as_str())
    }
}

impl From<&String> for Selector {
    fn from(s: &String) -> Self {
        Selector::from(s.as_str())
    }
}
