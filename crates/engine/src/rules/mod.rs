//! Declarative SAYC rules
//!
//! Each module is a YAML file under `crates/engine/rules/`, embedded at
//! compile time. Extra modules can be loaded from a directory.

mod condition;
mod store;
mod template;

pub use condition::Condition;
pub use store::{Rule, RuleModule, RuleStore, RuleStoreError};
pub use template::{BidTemplate, Explanation, Level, StrainSpec};

/// `(origin, yaml)` for every built-in module.
pub const SAYC_MODULES: [(&str, &str); 7] = [
    ("openings.yaml", include_str!("../../rules/openings.yaml")),
    ("preempts.yaml", include_str!("../../rules/preempts.yaml")),
    ("notrump.yaml", include_str!("../../rules/notrump.yaml")),
    ("responses.yaml", include_str!("../../rules/responses.yaml")),
    ("rebids.yaml", include_str!("../../rules/rebids.yaml")),
    ("competitive.yaml", include_str!("../../rules/competitive.yaml")),
    ("slam.yaml", include_str!("../../rules/slam.yaml")),
];
