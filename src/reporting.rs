use crate::sim::engine::SimulationOutcome;

/// Renders the before/after comparison and financials as plain text.
pub fn render_report(outcome: &SimulationOutcome) -> String {
    format!(
        "\n--- Without battery ---\n{}\n\n--- With battery ---\n{}\n\n\
         --- Improvements ---\n{}\n\n{}\n",
        outcome.before, outcome.after, outcome.improvements, outcome.financials
    )
}

pub fn print_report(outcome: &SimulationOutcome) {
    print!("{}", render_report(outcome));
}
