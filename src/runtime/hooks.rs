//! Browser capabilities intercepted by the client runtime
//!
//! Every entry point the runtime patches is listed here and rendered into the script, so
//! this table is the complete record of what a proxied page has intercepted.

use serde::Serialize;

/// A URL-bearing DOM property replaced with a decoding getter and encoding setter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PropertyHook {
    pub interface: &'static str,
    pub property: &'static str,
}

/// A patched function or constructor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CallHook {
    /// Global path of the owning object, e.g. `XMLHttpRequest.prototype`
    pub owner: &'static str,
    pub operation: &'static str,
    pub kind: CallKind,
}

/// How a patched call treats its arguments
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CallKind {
    /// First argument is a string, `URL`, or `Request`; encode it
    RequestInput,
    /// Constructor whose first argument is a request input
    RequestConstructor,
    /// Encode the argument at `index`
    UrlArgument { index: usize },
    /// Re-encode `src`/`href` on the inserted node
    NodeInsertion,
    /// Encode the value when the attribute name is URL-bearing
    SetAttribute,
    /// Decode the result when the attribute name is URL-bearing
    GetAttribute,
}

pub const CALL_HOOKS: &[CallHook] = &[
    CallHook {
        owner: "window",
        operation: "fetch",
        kind: CallKind::RequestInput,
    },
    CallHook {
        owner: "window",
        operation: "Request",
        kind: CallKind::RequestConstructor,
    },
    CallHook {
        owner: "XMLHttpRequest.prototype",
        operation: "open",
        kind: CallKind::UrlArgument { index: 1 },
    },
    CallHook {
        owner: "window",
        operation: "open",
        kind: CallKind::UrlArgument { index: 0 },
    },
    CallHook {
        owner: "Node.prototype",
        operation: "appendChild",
        kind: CallKind::NodeInsertion,
    },
    CallHook {
        owner: "Node.prototype",
        operation: "insertBefore",
        kind: CallKind::NodeInsertion,
    },
    CallHook {
        owner: "Element.prototype",
        operation: "setAttribute",
        kind: CallKind::SetAttribute,
    },
    CallHook {
        owner: "Element.prototype",
        operation: "getAttribute",
        kind: CallKind::GetAttribute,
    },
];

pub const PROPERTY_HOOKS: &[PropertyHook] = &[
    PropertyHook {
        interface: "HTMLAnchorElement",
        property: "href",
    },
    PropertyHook {
        interface: "HTMLScriptElement",
        property: "src",
    },
    PropertyHook {
        interface: "HTMLImageElement",
        property: "src",
    },
    PropertyHook {
        interface: "HTMLLinkElement",
        property: "href",
    },
    PropertyHook {
        interface: "HTMLIFrameElement",
        property: "src",
    },
    PropertyHook {
        interface: "HTMLVideoElement",
        property: "src",
    },
    PropertyHook {
        interface: "HTMLAudioElement",
        property: "src",
    },
    PropertyHook {
        interface: "HTMLSourceElement",
        property: "src",
    },
    PropertyHook {
        interface: "HTMLObjectElement",
        property: "data",
    },
    PropertyHook {
        interface: "HTMLFormElement",
        property: "action",
    },
    PropertyHook {
        interface: "HTMLAreaElement",
        property: "href",
    },
    PropertyHook {
        interface: "HTMLBaseElement",
        property: "href",
    },
    PropertyHook {
        interface: "HTMLInputElement",
        property: "src",
    },
];

/// Attribute names rewritten by `setAttribute`/`getAttribute`
pub const URL_ATTRIBUTES: &[&str] = &["src", "href", "action", "data"];

/// Attributes the mutation observer re-applies on inserted elements
pub const OBSERVED_ATTRIBUTES: &[&str] = &["src", "href"];

/// Check whether an attribute name is URL-bearing (case-insensitive)
pub fn is_url_attribute(name: &str) -> bool {
    URL_ATTRIBUTES
        .iter()
        .any(|attribute| attribute.eq_ignore_ascii_case(name))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_url_element_is_hooked() {
        let hooked: Vec<_> = PROPERTY_HOOKS
            .iter()
            .map(|hook| (hook.interface, hook.property))
            .collect();

        for expected in [
            ("HTMLAnchorElement", "href"),
            ("HTMLObjectElement", "data"),
            ("HTMLFormElement", "action"),
            ("HTMLInputElement", "src"),
        ] {
            assert!(hooked.contains(&expected), "missing {:?}", expected);
        }
        assert_eq!(hooked.len(), 13);
    }

    #[test]
    fn test_call_hooks_are_unique() {
        for (i, a) in CALL_HOOKS.iter().enumerate() {
            for b in &CALL_HOOKS[i + 1..] {
                assert!(
                    (a.owner, a.operation) != (b.owner, b.operation),
                    "{}.{} registered twice",
                    a.owner,
                    a.operation
                );
            }
        }
    }

    #[test]
    fn test_is_url_attribute() {
        assert!(is_url_attribute("href"));
        assert!(is_url_attribute("SRC"));
        assert!(is_url_attribute("action"));
        assert!(is_url_attribute("data"));
        assert!(!is_url_attribute("data-src"));
        assert!(!is_url_attribute("class"));
    }

    #[test]
    fn test_call_kind_serializes_for_the_script() {
        let json = serde_json::to_string(&CallKind::UrlArgument { index: 1 }).unwrap();
        assert_eq!(json, r#"{"type":"url_argument","index":1}"#);
        let json = serde_json::to_string(&CallKind::RequestInput).unwrap();
        assert_eq!(json, r#"{"type":"request_input"}"#);
    }
}
