//! Prompt composer.
//!
//! Two independent layers, always sent persona first:
//!
//! - [`persona`]: identity, dial phrasing, the bad-news protocol, a module
//!   stance and the intent's persona hint.
//! - [`style`]: formatting rules, the intent template (structured family
//!   only) and depth guidance.
//!
//! Each layer carries its own version tag so a change to one can be
//! traced in envelope metadata without touching the other.

pub mod persona;
pub mod style;

use serde::Serialize;
use steward_config::{PersonaConfig, StyleConfig};
use steward_core::message::Message;
use steward_core::request::{ChatRequest, Depth, StyleFamily};

use crate::registry::Intent;

pub use persona::{Dials, PERSONA_VERSION};
pub use style::STYLE_VERSION;

/// Both system instructions plus what they were built from.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ComposedPrompt {
    pub persona: String,
    pub style: String,
    pub persona_version: &'static str,
    pub style_version: &'static str,
    pub family: StyleFamily,
    pub depth: Depth,
    pub module: String,
}

impl ComposedPrompt {
    /// The two system messages, persona first.
    pub fn messages(&self) -> [Message; 2] {
        [Message::system(&self.persona), Message::system(&self.style)]
    }
}

#[derive(Debug, Clone)]
pub struct PromptComposer {
    persona: PersonaConfig,
    style: StyleConfig,
}

impl PromptComposer {
    pub fn new(persona: PersonaConfig, style: StyleConfig) -> Self {
        Self { persona, style }
    }

    pub fn compose(&self, intent: Option<&dyn Intent>, request: &ChatRequest) -> ComposedPrompt {
        let module = request
            .module
            .as_deref()
            .map(str::trim)
            .filter(|m| !m.is_empty())
            .map(str::to_ascii_lowercase)
            .unwrap_or_else(|| intent.map_or("general", |i| i.module()).to_string());

        let dials = Dials::resolve(&self.persona, &request.dials);
        let family = style::resolve_family(request, &self.style);
        let depth = style::resolve_depth(request, &self.style);

        ComposedPrompt {
            persona: persona::render(intent, &module, &dials),
            style: style::render(intent, family, depth),
            persona_version: PERSONA_VERSION,
            style_version: STYLE_VERSION,
            family,
            depth,
            module,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::intents::ArAging;
    use steward_core::message::Role;

    fn composer() -> PromptComposer {
        PromptComposer::new(PersonaConfig::default(), StyleConfig::default())
    }

    #[test]
    fn module_comes_from_intent_unless_overridden() {
        let request = ChatRequest::new("u1", "b1", "aging");
        let prompt = composer().compose(Some(&ArAging), &request);
        assert_eq!(prompt.module, "finance");
        assert!(prompt.persona.contains("Stance (finance)"));

        let mut request = request;
        request.module = Some(" Tax ".into());
        let prompt = composer().compose(Some(&ArAging), &request);
        assert_eq!(prompt.module, "tax");
    }

    #[test]
    fn messages_are_persona_then_style() {
        let request = ChatRequest::new("u1", "b1", "hi");
        let prompt = composer().compose(None, &request);
        let [first, second] = prompt.messages();
        assert_eq!(first.role, Role::System);
        assert_eq!(first.content, prompt.persona);
        assert_eq!(second.content, prompt.style);
        assert_eq!(prompt.persona_version, "persona-v3");
        assert_eq!(prompt.style_version, "style-v2");
    }
}
