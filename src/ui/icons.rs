use crate::node::NodeKind;

pub struct Icons;

impl Icons {
    pub const ROCKET: &str = "🚀";
    pub const SEARCH: &str = "🔍";
    pub const CHECK: &str = "✅";
    pub const CROSS: &str = "❌";
    pub const WARN: &str = "⚠️";
    pub const INFO: &str = "ℹ️";
    pub const STATS: &str = "📊";
    pub const LINK: &str = "🔗";
    pub const FILE: &str = "📄";
    pub const PACKAGE: &str = "📦";
    pub const SCOPE: &str = "🔲";
    pub const DEF: &str = "🔵";
    pub const UNRESOLVED: &str = "🟠";
}

impl Icons {
    /// Icon for a graph node; `bound` only matters for references
    pub fn for_node(node: &NodeKind, bound: bool) -> &'static str {
        match node {
            NodeKind::Scope(_) => Self::SCOPE,
            NodeKind::Def(_) => Self::DEF,
            NodeKind::Import(_) => Self::PACKAGE,
            NodeKind::Ref(_) if bound => Self::LINK,
            NodeKind::Ref(_) => Self::UNRESOLVED,
        }
    }
}
