use colored::Colorize;
use lungscope_client::{NormalizedResult, Prediction, PrimaryResult};

use crate::labels::display_name;

const BAR_WIDTH: usize = 30;

/// Formats a probability in `[0, 1]` as a percentage with two decimals.
pub fn percent(p: f64) -> String {
    format!("{:.2}%", p * 100.0)
}

fn bar(p: f64) -> String {
    let filled = (p.clamp(0.0, 1.0) * BAR_WIDTH as f64).round() as usize;
    format!("{}{}", "█".repeat(filled), "░".repeat(BAR_WIDTH - filled))
}

/// Renders a prediction for the terminal. `None` means the result has no
/// known shape and the caller should print the raw JSON instead.
pub fn render(prediction: &Prediction) -> Option<String> {
    match &prediction.primary {
        PrimaryResult::Label(label) => Some(format!(
            "Predicted class: {}",
            display_name(label).bold()
        )),
        PrimaryResult::Labeled { label, confidence } => Some(format!(
            "Predicted class: {}\nConfidence: {}",
            display_name(label).bold(),
            percent(*confidence).bold()
        )),
        PrimaryResult::Distribution(dist) => Some(render_distribution(dist)),
        PrimaryResult::Unrecognized(_) => None,
    }
}

fn render_distribution(dist: &NormalizedResult) -> String {
    let mut out = format!(
        "Predicted class: {}\nConfidence: {}\n\nClass probabilities:",
        display_name(&dist.predicted_class).bold(),
        percent(dist.confidence()).bold()
    );

    let ranked = dist.ranked();
    let width = ranked
        .iter()
        .map(|(class, _)| display_name(class).chars().count())
        .max()
        .unwrap_or(0);

    for (class, p) in ranked {
        let name = format!("{:<width$}", display_name(class));
        let bar = if class == dist.predicted_class {
            bar(p).green().to_string()
        } else {
            bar(p).dimmed().to_string()
        };
        out.push_str(&format!("\n  {name}  {bar} {:>7}", percent(p)));
    }
    out
}
