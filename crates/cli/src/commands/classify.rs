//! `steward classify` — Print the intent ranking for a message.

use steward_core::request::{ChatRequest, Hints};
use steward_pipeline::{Classification, Classifier, default_registry};

use super::load_config;

pub fn run(route: Option<String>, thread: Option<String>, message: String) -> anyhow::Result<()> {
    let config = load_config()?;
    let registry = default_registry()?;
    let classifier = Classifier::new(config.pipeline.classifier.clone());

    let mut request = ChatRequest::new("cli", "cli", message.trim());
    request.route = route;
    if let Some(thread) = thread {
        request = request.with_hints(Hints::thread(thread));
    }

    let classification = classifier.classify(&registry, &request);
    print!("{}", render(&classification));
    Ok(())
}

fn render(classification: &Classification) -> String {
    let mut out = String::new();
    out.push_str(&format!("Resolved: {}\n", classification.resolved));
    if let Some(category) = &classification.route_category {
        out.push_str(&format!("Route category: {category}\n"));
    }
    if let Some(ambiguity) = &classification.ambiguity {
        out.push_str(&format!(
            "Ambiguous: {} vs {} (gap {:.2})\n",
            ambiguity.top, ambiguity.runner_up, ambiguity.gap
        ));
    }
    out.push('\n');
    out.push_str(&format!("  {:<24} {:>6} {:>6} {:>6}\n", "intent", "base", "bonus", "total"));
    for c in classification.candidates.iter().filter(|c| c.total > 0.0) {
        out.push_str(&format!(
            "  {:<24} {:>6.2} {:>6.2} {:>6.2}\n",
            c.intent, c.base, c.bonus, c.total
        ));
    }
    out
}
