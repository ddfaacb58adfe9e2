use super::role::RoleId;
use anyhow::Context;
use std::fmt::Write as _;
use std::path::Path;

/// Default file name for the rendered graph.
pub const DEFAULT_DIAGRAM_PATH: &str = "sop_agent_graph.mmd";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Node {
    Start,
    Role(RoleId),
    End,
}

impl Node {
    fn id(self) -> &'static str {
        match self {
            Self::Start => "__start__",
            Self::Role(role) => role.as_str(),
            Self::End => "__end__",
        }
    }

    fn declaration(self) -> String {
        match self {
            Self::Start => format!("    {}([<p>__start__</p>]):::first", self.id()),
            Self::Role(role) => format!("    {}({role})", self.id()),
            Self::End => format!("    {}([<p>__end__</p>]):::last", self.id()),
        }
    }
}

/// Every transition the control loop can take. Edges out of `main_agent`
/// never reach the end node.
const EDGES: [(Node, Node); 4] = [
    (Node::Start, Node::Role(RoleId::MainAgent)),
    (Node::Role(RoleId::MainAgent), Node::Role(RoleId::CriticAgent)),
    (Node::Role(RoleId::CriticAgent), Node::Role(RoleId::MainAgent)),
    (Node::Role(RoleId::CriticAgent), Node::End),
];

/// Mermaid flowchart of the acting/reviewing state machine.
pub fn render_mermaid() -> String {
    let mut out = String::from(
        "---\nconfig:\n  flowchart:\n    curve: linear\n---\ngraph TD;\n",
    );

    let nodes = std::iter::once(Node::Start)
        .chain(RoleId::ALL.into_iter().map(Node::Role))
        .chain(std::iter::once(Node::End));
    for node in nodes {
        out.push_str(&node.declaration());
        out.push_str(";\n");
    }

    for (from, to) in EDGES {
        let arrow = if from == Node::Start { "-->" } else { "-.->" };
        let _ = writeln!(out, "    {} {arrow} {};", from.id(), to.id());
    }

    out.push_str("    classDef default fill:#f2f0ff,line-height:1.2\n");
    out.push_str("    classDef first fill-opacity:0\n");
    out.push_str("    classDef last fill:#bfb6fc\n");
    out
}

/// Write the diagram to `path`.
pub fn write_mermaid(path: &Path) -> anyhow::Result<()> {
    std::fs::write(path, render_mermaid())
        .with_context(|| format!("Failed to write diagram to {}", path.display()))
}
