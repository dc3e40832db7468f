//! The built-in certification checklist template.
//!
//! Three item ids carry special meaning to the gate engine and are the
//! defaults for [`crate::gate::GateIds`]. Projects with a different id
//! scheme override them in `.certo/config.toml`.

use crate::model::item::{Category, ChecklistItem};

/// Functional regression test, cycle after the first patch.
pub const REGRESSION_ITEM_ID: &str = "exec-regression-patch1";
/// Security testing.
pub const SECURITY_ITEM_ID: &str = "exec-security";
/// Performance and load testing.
pub const PERFORMANCE_ITEM_ID: &str = "exec-performance";

/// The checklist every new project is seeded with, in workflow order.
#[must_use]
pub fn default_checklist() -> Vec<ChecklistItem> {
    let template: [(&str, &str, Category); 13] = [
        (
            "setup-environment",
            "Provision the certification test environment",
            Category::Setup,
        ),
        (
            "setup-build",
            "Install the candidate build and record component versions",
            Category::Setup,
        ),
        (
            "design-plan",
            "Write the test plan and coverage matrix",
            Category::Design,
        ),
        (
            "design-cases",
            "Author test cases for all certified features",
            Category::Design,
        ),
        (
            "design-review",
            "Review the test design with the vendor",
            Category::Design,
        ),
        (
            "exec-functional",
            "Run the functional test pass (cycle 1)",
            Category::Execution,
        ),
        (
            "exec-functional-retest",
            "Re-run failed cases after triage (cycle 2)",
            Category::Execution,
        ),
        (
            REGRESSION_ITEM_ID,
            "Functional regression after the first patch (cycle 3)",
            Category::Execution,
        ),
        (SECURITY_ITEM_ID, "Security testing", Category::Execution),
        (
            PERFORMANCE_ITEM_ID,
            "Performance and load testing",
            Category::Execution,
        ),
        (
            "exec-regression-final",
            "Final regression sweep (cycle 4)",
            Category::Execution,
        ),
        (
            "comp-report",
            "Compile the certification report",
            Category::Completion,
        ),
        (
            "comp-evidence",
            "Archive evidence artifacts and sign off",
            Category::Completion,
        ),
    ];

    template
        .iter()
        .zip(0u32..)
        .map(|((id, title, category), position)| {
            ChecklistItem::new(id, title, *category, position)
        })
        .collect()
}
