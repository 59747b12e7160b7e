use crate::node::NodeKind;
use owo_colors::Style;
use std::sync::OnceLock;

static THEME: OnceLock<Theme> = OnceLock::new();

#[derive(Debug, Clone)]
pub struct Theme {
    pub header: Style,
    pub success: Style,
    pub error: Style,
    pub warn: Style,
    pub info: Style,
    pub dim: Style,
    pub scope: Style,
    pub definition: Style,
    pub import: Style,
    pub reference: Style,
    pub unresolved: Style,
}

impl Theme {
    pub fn detect() -> Self {
        if !console::Term::stdout().is_term() || !console::colors_enabled() {
            return Self::plain();
        }
        Self::colored()
    }

    pub fn colored() -> Self {
        Self {
            header: Style::new().cyan().bold(),
            success: Style::new().green().bold(),
            error: Style::new().red().bold(),
            warn: Style::new().yellow().bold(),
            info: Style::new().magenta(),
            dim: Style::new().white().dimmed(),
            scope: Style::new().white().dimmed(),
            definition: Style::new().blue().bold(),
            import: Style::new().cyan().bold(),
            reference: Style::new().green(),
            unresolved: Style::new().yellow().italic(),
        }
    }

    pub fn plain() -> Self {
        Self {
            header: Style::new(),
            success: Style::new(),
            error: Style::new(),
            warn: Style::new(),
            info: Style::new(),
            dim: Style::new(),
            scope: Style::new(),
            definition: Style::new(),
            import: Style::new(),
            reference: Style::new(),
            unresolved: Style::new(),
        }
    }

    /// Style for the name of a graph node; `bound` only matters for references
    pub fn node(&self, node: &NodeKind, bound: bool) -> Style {
        match node {
            NodeKind::Scope(_) => self.scope.clone(),
            NodeKind::Def(_) => self.definition.clone(),
            NodeKind::Import(_) => self.import.clone(),
            NodeKind::Ref(_) if bound => self.reference.clone(),
            NodeKind::Ref(_) => self.unresolved.clone(),
        }
    }
}

pub fn theme() -> &'static Theme {
    THEME.get_or_init(Theme::detect)
}
