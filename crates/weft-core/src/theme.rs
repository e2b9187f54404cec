//! Design variables and theme-aware color resolution.
//!
//! A node's fill or stroke is either a literal color or a binding to a named
//! variable. Variables carry one value per theme. Which theme applies is
//! decided by a `ThemeScope`: the active document theme plus every frame
//! theme override crossed on the way down the tree. The scope is a plain
//! value threaded through recursive rendering, so entering a themed frame
//! can never leave stale state behind for its siblings.

use crate::model::{Color, ColorValue, Paint};
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::collections::HashMap;

/// Theme name used for a variable's fallback value.
pub const DEFAULT_THEME: &str = "default";

/// A color variable with per-theme values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Variable {
    pub name: String,
    /// Theme name → value. The `default` entry is used when no theme matches.
    pub values: HashMap<String, Color>,
}

impl Variable {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            values: HashMap::new(),
        }
    }

    pub fn with_value(mut self, theme: &str, color: Color) -> Self {
        self.values.insert(theme.to_string(), color);
        self
    }
}

/// All design variables of the document, by name.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct VariableSet {
    vars: HashMap<String, Variable>,
}

impl VariableSet {
    pub fn new(vars: impl IntoIterator<Item = Variable>) -> Self {
        Self {
            vars: vars.into_iter().map(|v| (v.name.clone(), v)).collect(),
        }
    }

    pub fn get(&self, name: &str) -> Option<&Variable> {
        self.vars.get(name)
    }

    pub fn insert(&mut self, var: Variable) {
        self.vars.insert(var.name.clone(), var);
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }
}

/// The themes in effect at one point of the tree, innermost last.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThemeScope {
    stack: SmallVec<[String; 2]>,
}

impl ThemeScope {
    /// Scope at the document root: just the active theme.
    pub fn root(active_theme: &str) -> Self {
        let mut stack = SmallVec::new();
        stack.push(active_theme.to_string());
        Self { stack }
    }

    /// Scope for the children of a frame with `theme` override (if any).
    #[must_use]
    pub fn enter(&self, theme: Option<&str>) -> Self {
        match theme {
            Some(t) => {
                let mut stack = self.stack.clone();
                stack.push(t.to_string());
                Self { stack }
            }
            None => self.clone(),
        }
    }

    /// The innermost theme in effect.
    pub fn current(&self) -> &str {
        self.stack.last().map(|s| s.as_str()).unwrap_or(DEFAULT_THEME)
    }

    /// Number of frame overrides entered below the active theme.
    pub fn depth(&self) -> usize {
        self.stack.len().saturating_sub(1)
    }

    /// Themes from innermost to outermost.
    pub fn themes(&self) -> impl Iterator<Item = &str> {
        self.stack.iter().rev().map(|s| s.as_str())
    }
}

/// Resolve a color value under `scope`. Unknown variables yield `None`.
pub fn resolve_color(value: &ColorValue, vars: &VariableSet, scope: &ThemeScope) -> Option<Color> {
    match value {
        ColorValue::Literal(c) => Some(*c),
        ColorValue::Variable(name) => {
            let Some(var) = vars.get(name) else {
                log::debug!("unknown color variable `{name}`");
                return None;
            };
            scope
                .themes()
                .find_map(|theme| var.values.get(theme))
                .or_else(|| var.values.get(DEFAULT_THEME))
                .copied()
        }
    }
}

/// Resolve a paint (color + its own opacity) under `scope`.
pub fn resolve_paint(paint: &Paint, vars: &VariableSet, scope: &ThemeScope) -> Option<Color> {
    resolve_color(&paint.color, vars, scope).map(|c| c.multiply_alpha(paint.opacity))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars() -> VariableSet {
        VariableSet::new([Variable::new("surface")
            .with_value("light", Color::WHITE)
            .with_value("dark", Color::BLACK)
            .with_value(DEFAULT_THEME, Color::rgba(0.5, 0.5, 0.5, 1.0))])
    }

    #[test]
    fn literal_ignores_theme() {
        let scope = ThemeScope::root("dark");
        let red = Color::rgba(1.0, 0.0, 0.0, 1.0);
        assert_eq!(resolve_color(&ColorValue::Literal(red), &vars(), &scope), Some(red));
    }

    #[test]
    fn innermost_override_wins() {
        let root = ThemeScope::root("light");
        let dark = root.enter(Some("dark"));
        let binding = ColorValue::Variable("surface".into());

        assert_eq!(resolve_color(&binding, &vars(), &root), Some(Color::WHITE));
        assert_eq!(resolve_color(&binding, &vars(), &dark), Some(Color::BLACK));
        assert_eq!(dark.depth(), 1);
        assert_eq!(root.depth(), 0);
    }

    #[test]
    fn unknown_theme_falls_back_outward_then_default() {
        let root = ThemeScope::root("light");
        let brand = root.enter(Some("brand"));
        let binding = ColorValue::Variable("surface".into());
        assert_eq!(resolve_color(&binding, &vars(), &brand), Some(Color::WHITE));

        let unknown = ThemeScope::root("sepia");
        assert_eq!(
            resolve_color(&binding, &vars(), &unknown),
            Some(Color::rgba(0.5, 0.5, 0.5, 1.0))
        );
    }

    #[test]
    fn missing_variable_resolves_to_none() {
        let scope = ThemeScope::root("light");
        assert_eq!(resolve_paint(&Paint::variable("nope"), &vars(), &scope), None);
    }

    #[test]
    fn paint_opacity_multiplies_alpha() {
        let scope = ThemeScope::root("light");
        let paint = Paint {
            opacity: 0.5,
            ..Paint::solid(Color::WHITE)
        };
        let c = resolve_paint(&paint, &vars(), &scope).unwrap();
        assert!((c.a - 0.5).abs() < f32::EPSILON);
    }
}
