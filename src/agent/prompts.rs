use anyhow::Context as _;
use tera::{Context, Tera};

/// Critique used when the judgment service fails or answers with nothing.
pub const NO_CRITIQUE: &str = "No critique.";

/// Prefix that marks a transcript message as critic output.
pub const CRITIC_FEEDBACK_PREFIX: &str = "Critic feedback: ";

/// Action recorded when the model ends a turn without saying anything.
pub const DEFAULT_ACTION_SUMMARY: &str = "Main agent performed a step according to SOP.";

const CRITIC_TRANSFER_TOOL: &str = "transfer_to_critic_agent";

const ACTING_TEMPLATE: &str = "acting.txt";
const CRITIQUE_TEMPLATE: &str = "critique.txt";

const ACTING_PROMPT: &str = r"You are the main agent executing a standard operating procedure (SOP).

The SOP document is:
{{ sop }}

Work through the SOP one step at a time using the tools available to you.
{%- if tools %}
Available tools: {{ tools | join(sep=', ') }}.
{%- endif %}
{%- if critic %}
A critic reviews every action you take against the SOP. When you have finished a step,
reply with a short summary of exactly what you did and what you observed. If a tool fails
or you need guidance before continuing, call transfer_to_critic_agent.
Treat messages starting with 'Critic feedback:' as corrections to apply on your next step.
{%- else %}
When you are done, reply with a short summary of exactly what you did and what you observed.
{%- endif %}";

const CRITIQUE_PROMPT: &str = r#"You are a critic agent. The SOP document is: {{ sop }}

The main agent performed this action: {{ last_action }}

Please evaluate if this action aligns with the SOP. If it does, respond with "OK". If it does not, suggest alternative approaches or corrections for the main agent to try."#;

/// Prompt templates for both roles, compiled once per run.
pub struct PromptTemplates {
    tera: Tera,
}

impl PromptTemplates {
    pub fn new() -> anyhow::Result<Self> {
        let mut tera = Tera::default();
        tera.add_raw_templates([
            (ACTING_TEMPLATE, ACTING_PROMPT),
            (CRITIQUE_TEMPLATE, CRITIQUE_PROMPT),
        ])
        .context("failed to compile prompt templates")?;
        Ok(Self { tera })
    }

    /// System prompt for the acting role. The critic paragraph is only
    /// rendered when `transfer_to_critic_agent` is among `tool_names`.
    pub fn render_acting(&self, sop: &str, tool_names: &[String]) -> anyhow::Result<String> {
        let mut context = Context::new();
        context.insert("sop", sop);
        context.insert("tools", tool_names);
        context.insert(
            "critic",
            &tool_names.iter().any(|name| name == CRITIC_TRANSFER_TOOL),
        );
        self.render(ACTING_TEMPLATE, &context)
    }

    /// Judgment request sent to the language model by the reviewing role.
    pub fn render_critique(&self, sop: &str, last_action: &str) -> anyhow::Result<String> {
        let mut context = Context::new();
        context.insert("sop", sop);
        context.insert("last_action", last_action);
        self.render(CRITIQUE_TEMPLATE, &context)
    }

    fn render(&self, name: &str, context: &Context) -> anyhow::Result<String> {
        self.tera
            .render(name, context)
            .with_context(|| format!("failed to render prompt template {name}"))
    }
}
