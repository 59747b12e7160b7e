use crate::node::NodeKind;
use crate::ui::{theme, Icons};
use owo_colors::OwoColorize;

pub fn header(text: &str) {
    println!("{} {}", Icons::ROCKET, text.style(theme().header.clone()));
}

pub fn success(label: &str) {
    println!("{} {}", Icons::CHECK, label.style(theme().success.clone()));
}

pub fn error(label: &str) {
    eprintln!("{} {}", Icons::CROSS, label.style(theme().error.clone()));
}

pub fn warn(label: &str) {
    eprintln!("{} {}", Icons::WARN, label.style(theme().warn.clone()));
}

pub fn info(label: &str, value: &str) {
    println!(
        "{} {}: {}",
        Icons::INFO.style(theme().info.clone()),
        label.style(theme().dim.clone()),
        value
    );
}

pub fn section(title: &str) {
    println!();
    println!("━{}━", title.style(theme().header.clone()));
}

/// One definition, import or reference: icon, kind, name, position and context
pub fn node_line(node: &NodeKind, bound: bool, kind: &str, context: &str) {
    let range = node.range();
    println!(
        "  {} {} {} {} {}",
        Icons::for_node(node, bound),
        kind.style(theme().dim.clone()),
        node.name().unwrap_or_default().style(theme().node(node, bound)),
        format!("{}:{}", range.start.row + 1, range.start.column + 1).style(theme().info.clone()),
        context.style(theme().dim.clone())
    );
}

pub fn summary_row(label: &str, value: &str) {
    println!("  {} {}", label.style(theme().dim.clone()), value);
}
