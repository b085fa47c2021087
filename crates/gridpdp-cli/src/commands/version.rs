//! Version command.

use gridpdp::Registry;

use crate::style::{colors::SemanticStyle, print_labeled, print_spacer};

const VERSION: &str = env!("CARGO_PKG_VERSION");

pub fn run() {
    println!("{} {}", "gridpdp".header(), VERSION);
    println!("Policy decision point for grid authorization.");
    print_spacer();

    let registry = Registry::builtin();
    print_labeled("Types", &registry.attributes().type_ids().join(", "));
    print_labeled(
        "Algorithms",
        &registry.algorithms().algorithm_ids().join(", "),
    );
    print_labeled(
        "Functions",
        &registry.functions().function_ids().len().to_string(),
    );
    print_spacer();
    print_labeled("Target", std::env::consts::ARCH);
    print_labeled("OS", std::env::consts::OS);
}
