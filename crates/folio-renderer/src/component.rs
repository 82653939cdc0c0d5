//! Component registry for placeholders and element overrides.
//!
//! A [`ComponentSet`] maps a placeholder name (`Counter`) or an element name
//! (`a`, `h2`..`h4`) to a [`Component`]. The process-wide defaults are built
//! once; per-document overrides are layered on a clone and win on collision.
//!
//! Templates use `{{name}}` variables. Values are HTML-escaped except
//! `{{children}}`, which carries already rendered HTML.

use std::collections::BTreeMap;
use std::fmt::Write;
use std::sync::LazyLock;

use regex::{Captures, Regex};

use crate::anchor::TocEntry;
use crate::util::escape_html;

/// Template variable reference, e.g. `{{ href }}`.
static TEMPLATE_VAR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\{\{\s*([A-Za-z_][A-Za-z0-9_-]*)\s*\}\}").expect("invalid template regex")
});

static DEFAULT_COMPONENTS: LazyLock<ComponentSet> = LazyLock::new(|| {
    let mut set = ComponentSet::new();
    set.insert("a", Component::Builtin(Builtin::Link));
    for level in ["h2", "h3", "h4"] {
        set.insert(level, Component::Builtin(Builtin::Heading));
    }
    set.insert("Toc", Component::Builtin(Builtin::TableOfContents));
    set
});

/// Variable holding rendered child HTML; never escaped.
const CHILDREN_VAR: &str = "children";

/// Built-in renderers.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Builtin {
    /// Anchor link; external targets open in a new tab.
    Link,
    /// Heading with a self-referencing anchor.
    Heading,
    /// Table of contents of the current document.
    TableOfContents,
}

/// A renderable component.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Component {
    /// HTML template with `{{name}}` variables.
    Template(String),
    Builtin(Builtin),
}

/// Inputs to a component render.
#[derive(Clone, Debug, Default)]
pub struct Props<'a> {
    attrs: BTreeMap<String, String>,
    children: String,
    toc: &'a [TocEntry],
}

impl<'a> Props<'a> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a single attribute.
    #[must_use]
    pub fn attr(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attrs.insert(key.into(), value.into());
        self
    }

    /// Set attributes from a placeholder.
    #[must_use]
    pub fn attrs(mut self, attrs: &BTreeMap<String, String>) -> Self {
        self.attrs
            .extend(attrs.iter().map(|(k, v)| (k.clone(), v.clone())));
        self
    }

    /// Set rendered child HTML.
    #[must_use]
    pub fn children(mut self, html: String) -> Self {
        self.children = html;
        self
    }

    /// Provide the document's table of contents.
    #[must_use]
    pub fn toc(mut self, toc: &'a [TocEntry]) -> Self {
        self.toc = toc;
        self
    }

    fn get(&self, key: &str) -> &str {
        self.attrs.get(key).map_or("", String::as_str)
    }
}

impl Component {
    /// Render the component to HTML.
    #[must_use]
    pub fn render(&self, props: &Props<'_>) -> String {
        match self {
            Self::Template(template) => render_template(template, props),
            Self::Builtin(Builtin::Link) => render_link(props),
            Self::Builtin(Builtin::Heading) => render_heading(props),
            Self::Builtin(Builtin::TableOfContents) => render_toc(props.toc),
        }
    }
}

/// Named components available to a render.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ComponentSet {
    components: BTreeMap<String, Component>,
}

impl ComponentSet {
    /// Create an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Process-wide default components: `a`, `h2`..`h4` and `Toc`.
    #[must_use]
    pub fn defaults() -> &'static Self {
        &DEFAULT_COMPONENTS
    }

    /// Defaults merged with per-document template overrides.
    #[must_use]
    pub fn with_overrides(overrides: &BTreeMap<String, String>) -> Self {
        let mut set = Self::defaults().clone();
        for (name, template) in overrides {
            set.insert(name.clone(), Component::Template(template.clone()));
        }
        set
    }

    /// Add or replace a component.
    pub fn insert(&mut self, name: impl Into<String>, component: Component) {
        self.components.insert(name.into(), component);
    }

    /// Look up a component by name.
    #[must_use]
    pub fn lookup(&self, name: &str) -> Option<&Component> {
        self.components.get(name)
    }

    /// Render a named component, or `None` when the name is unknown.
    #[must_use]
    pub fn render(&self, name: &str, props: &Props<'_>) -> Option<String> {
        self.lookup(name).map(|component| component.render(props))
    }
}

fn render_template(template: &str, props: &Props<'_>) -> String {
    TEMPLATE_VAR
        .replace_all(template, |caps: &Captures<'_>| {
            let name = caps.get(1).map_or("", |m| m.as_str());
            if name == CHILDREN_VAR {
                props.children.clone()
            } else {
                escape_html(props.get(name))
            }
        })
        .into_owned()
}

fn is_external(href: &str) -> bool {
    href.starts_with("http://") || href.starts_with("https://") || href.starts_with("//")
}

fn render_link(props: &Props<'_>) -> String {
    let href = props.get("href");
    let mut html = format!(r#"<a href="{}""#, escape_html(href));
    let title = props.get("title");
    if !title.is_empty() {
        let _ = write!(html, r#" title="{}""#, escape_html(title));
    }
    if is_external(href) {
        html.push_str(r#" target="_blank" rel="noopener noreferrer""#);
    }
    let _ = write!(html, ">{}</a>", props.children);
    html
}

fn render_heading(props: &Props<'_>) -> String {
    let level = match props.get("level") {
        level @ ("1" | "2" | "3" | "4" | "5" | "6") => level,
        _ => "2",
    };
    let id = escape_html(props.get("id"));
    format!(
        r##"<h{level} id="{id}"><a class="anchor" href="#{id}" aria-hidden="true">#</a>{}</h{level}>"##,
        props.children
    )
}

fn render_toc(toc: &[TocEntry]) -> String {
    if toc.is_empty() {
        return String::new();
    }
    let mut html = String::from(r#"<nav class="toc"><ul>"#);
    for entry in toc {
        let _ = write!(
            html,
            r##"<li class="toc-h{}"><a href="#{}">{}</a></li>"##,
            entry.level,
            escape_html(&entry.id),
            escape_html(&entry.title)
        );
    }
    html.push_str("</ul></nav>");
    html
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_defaults() {
        let defaults = ComponentSet::defaults();

        assert_eq!(
            defaults.lookup("a"),
            Some(&Component::Builtin(Builtin::Link))
        );
        assert!(defaults.lookup("h2").is_some());
        assert!(defaults.lookup("h4").is_some());
        assert!(defaults.lookup("h5").is_none());
        assert!(defaults.lookup("Counter").is_none());
    }

    #[test]
    fn test_overrides_win() {
        let overrides = BTreeMap::from([
            ("h2".to_owned(), "<h2 class=\"big\">{{children}}</h2>".to_owned()),
            ("Counter".to_owned(), "<button>{{label}}</button>".to_owned()),
        ]);
        let set = ComponentSet::with_overrides(&overrides);

        let heading = set
            .render("h2", &Props::new().children("Intro".to_owned()))
            .unwrap();
        assert_eq!(heading, "<h2 class=\"big\">Intro</h2>");
        assert!(set.lookup("Counter").is_some());
        assert_eq!(
            set.lookup("a"),
            Some(&Component::Builtin(Builtin::Link))
        );
        // Defaults are untouched.
        assert_eq!(
            ComponentSet::defaults().lookup("h2"),
            Some(&Component::Builtin(Builtin::Heading))
        );
    }

    #[test]
    fn test_template_escapes_values_but_not_children() {
        let component = Component::Template("<p title=\"{{ title }}\">{{children}}{{missing}}</p>".to_owned());
        let props = Props::new()
            .attr("title", "<b>\"x\"</b>")
            .children("<em>kept</em>".to_owned());

        assert_eq!(
            component.render(&props),
            "<p title=\"&lt;b&gt;&quot;x&quot;&lt;/b&gt;\"><em>kept</em></p>"
        );
    }

    #[test]
    fn test_link_internal_and_external() {
        let set = ComponentSet::defaults();

        let internal = set
            .render("a", &Props::new().attr("href", "#intro").children("Intro".to_owned()))
            .unwrap();
        assert_eq!(internal, r##"<a href="#intro">Intro</a>"##);

        let external = set
            .render(
                "a",
                &Props::new()
                    .attr("href", "https://example.com/?a=1&b=2")
                    .attr("title", "Example")
                    .children("site".to_owned()),
            )
            .unwrap();
        assert_eq!(
            external,
            r#"<a href="https://example.com/?a=1&amp;b=2" title="Example" target="_blank" rel="noopener noreferrer">site</a>"#
        );
    }

    #[test]
    fn test_heading_builtin() {
        let html = ComponentSet::defaults()
            .render(
                "h3",
                &Props::new()
                    .attr("level", "3")
                    .attr("id", "usage")
                    .children("Usage".to_owned()),
            )
            .unwrap();

        assert_eq!(
            html,
            r##"<h3 id="usage"><a class="anchor" href="#usage" aria-hidden="true">#</a>Usage</h3>"##
        );
    }

    #[test]
    fn test_toc_builtin() {
        let toc = vec![
            TocEntry {
                title: "Intro".to_owned(),
                level: 2,
                id: Arc::from("intro"),
            },
            TocEntry {
                title: "A & B".to_owned(),
                level: 3,
                id: Arc::from("a-b"),
            },
        ];

        let html = ComponentSet::defaults()
            .render("Toc", &Props::new().toc(&toc))
            .unwrap();

        assert_eq!(
            html,
            r##"<nav class="toc"><ul><li class="toc-h2"><a href="#intro">Intro</a></li><li class="toc-h3"><a href="#a-b">A &amp; B</a></li></ul></nav>"##
        );
        assert_eq!(
            ComponentSet::defaults().render("Toc", &Props::new()),
            Some(String::new())
        );
    }

    #[test]
    fn test_render_unknown() {
        assert_eq!(ComponentSet::new().render("a", &Props::new()), None);
    }
}
