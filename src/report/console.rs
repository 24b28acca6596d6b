use crate::filter::category::{CategoryFilter, CategoryGroup, USER_SCRIPTS};
use crate::report::report_model::ReviewReport;

// ============================================================================
// Console reporter: formatted terminal output
// ============================================================================

/// Format a review report for the terminal.
///
/// Produces output like:
/// ```text
/// === Unset references: level-01 ===
///
/// ✗ UNSET  Player > CameraRig > Target Camera
///          obj:v1:behavior:9f2c...:4411#targetCamera
/// ✓ SET    Door > DoorLock > Key  (key_item)
///
/// === 2 to review, 3 acknowledged, 1 filtered (14 nodes scanned, 1 missing script) ===
/// ```
pub fn format_console_report(report: &ReviewReport) -> String {
    let mut out = String::new();

    out.push_str(&format!("=== Unset references: {} ===\n\n", report.scene));

    if report.rows.is_empty() {
        out.push_str("Nothing to review.\n");
    }

    for row in &report.rows {
        let marker = match (&row.value, row.acknowledged) {
            (_, true) => "- ACK  ",
            (None, false) => "\u{2717} UNSET",
            (Some(_), false) => "\u{2713} SET  ",
        };

        match &row.value {
            Some(value) => out.push_str(&format!("{}  {}  ({})\n", marker, row.label, value)),
            None => out.push_str(&format!("{}  {}\n", marker, row.label)),
        }
        out.push_str(&format!(
            "         {}#{}\n",
            row.object_id, row.property_path
        ));
    }

    out.push_str(&format!(
        "\n=== {} to review, {} acknowledged, {} filtered ({} nodes scanned",
        report.visible_count(),
        report.hidden_acknowledged,
        report.hidden_filtered,
        report.outcome.visited_nodes
    ));

    if report.outcome.skipped_behaviors > 0 {
        out.push_str(&format!(
            ", {} missing script",
            report.outcome.skipped_behaviors
        ));
    }

    out.push_str(") ===\n");

    out
}

/// Render the category menu with each switch's state.
pub fn format_category_tree<F: CategoryFilter>(groups: &[CategoryGroup], filter: &F) -> String {
    fn toggle<F: CategoryFilter>(filter: &F, category: &str) -> &'static str {
        if filter.get(category) { "[x]" } else { "[ ]" }
    }

    let mut out = String::new();
    for group in groups {
        out.push_str(&format!("{}\n", group.name));
        for sub in &group.groups {
            out.push_str(&format!("  {}\n", sub.name));
            for entry in &sub.entries {
                out.push_str(&format!(
                    "    {} {} ({})\n",
                    toggle(filter, &entry.category),
                    entry.label,
                    entry.category
                ));
            }
        }
        for entry in &group.entries {
            out.push_str(&format!(
                "  {} {} ({})\n",
                toggle(filter, &entry.category),
                entry.label,
                entry.category
            ));
        }
    }
    out.push_str(&format!("{} {}\n", toggle(filter, USER_SCRIPTS), USER_SCRIPTS));
    out
}
