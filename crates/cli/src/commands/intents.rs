//! `steward intents` — List registered intents.

use steward_pipeline::{IntentInfo, default_registry};

pub fn run() -> anyhow::Result<()> {
    let registry = default_registry()?;
    println!("Registered intents ({})", registry.len());
    println!();
    for info in registry.describe() {
        println!("{}", row(&info));
    }
    Ok(())
}

fn row(info: &IntentInfo) -> String {
    let tags: Vec<String> = info.tags.iter().map(|t| format!("{t:?}")).collect();
    let mut caps = Vec::new();
    if info.has_recipe {
        caps.push("recipe");
    }
    if info.has_template {
        caps.push("template");
    }
    format!(
        "  {:<22} {:<10} {:<28} [{}] {}",
        info.key,
        info.module,
        info.label,
        tags.join(", "),
        caps.join("+")
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rows_name_key_and_module() {
        let registry = default_registry().unwrap();
        let described = registry.describe();
        let ar = described.iter().find(|i| i.key == "ar_aging").unwrap();
        let line = row(ar);
        assert!(line.contains("ar_aging"));
        assert!(line.contains("finance"));
        assert!(line.contains("recipe"));
    }
}
