//! Load directive rendering

use crate::paths::{ComponentName, ComponentPaths};
use springboard_core::types::{ComponentKind, DirectiveStyle, LoadDirective};

/// Renders the exact manifest line that activates a component
#[derive(Debug, Clone)]
pub struct DirectiveRenderer {
    style: DirectiveStyle,
    paths: ComponentPaths,
}

impl DirectiveRenderer {
    pub fn new(style: DirectiveStyle, paths: ComponentPaths) -> Self {
        Self { style, paths }
    }

    pub fn style(&self) -> DirectiveStyle {
        self.style
    }

    pub fn render(&self, kind: ComponentKind, name: &ComponentName) -> LoadDirective {
        let function = kind.loader_function();
        match self.style {
            DirectiveStyle::Short => LoadDirective::new(format!("{}( '{}' );", function, name)),
            DirectiveStyle::ExplicitPath => {
                let descriptor = self
                    .paths
                    .component_dir(kind, name)
                    .join(kind.descriptor_file());
                LoadDirective::new(format!("{}( '{}', '{}' );", function, name, descriptor))
            }
        }
    }

    /// Component name a manifest line loads, if it is a directive of this kind
    ///
    /// Accepts both rendering styles and any spacing inside the call.
    pub fn component_name(kind: ComponentKind, directive: &LoadDirective) -> Option<String> {
        let rest = directive
            .as_str()
            .trim()
            .strip_prefix(kind.loader_function())?
            .trim_start()
            .strip_prefix('(')?
            .trim_start();
        let quote = rest.chars().next().filter(|c| *c == '\'' || *c == '"')?;
        let rest = &rest[1..];
        let end = rest.find(quote)?;
        let name = &rest[..end];
        (!name.is_empty()).then(|| name.to_string())
    }
}
