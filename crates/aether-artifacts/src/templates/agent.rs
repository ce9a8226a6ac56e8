//! Agent template: `main.py` with one class, and `manifest.json`

use super::TemplateFiles;
use crate::naming::string_literal;
use crate::templater::TemplateContext;
use serde::Serialize;

#[derive(Serialize)]
struct Manifest<'a> {
    name: &'a str,
    purpose: &'a str,
    created_by: &'a str,
    created_at: String,
    thought_id: &'a str,
    entrypoint: &'static str,
    class_name: &'a str,
}

pub fn render(ctx: &TemplateContext<'_>) -> TemplateFiles {
    vec![
        ("main.py".to_string(), main_py(ctx)),
        ("manifest.json".to_string(), manifest_json(ctx)),
    ]
}

fn main_py(ctx: &TemplateContext<'_>) -> String {
    let class = &ctx.class_name;
    format!(
        r#""""Autonomous agent generated by Aether."""

from datetime import datetime, timezone

NAME = {name}
PURPOSE = {purpose}
CREATED_BY = {created_by}


class {class}:
    def __init__(self):
        self.name = NAME
        self.purpose = PURPOSE
        self.memory = []

    def think(self, context):
        self.memory.append(context)
        return f"{{self.name}} considers {{context!r}} in light of: {{self.purpose}}"

    def act(self, task):
        return {{
            "agent": self.name,
            "task": task,
            "status": "completed",
            "timestamp": datetime.now(timezone.utc).isoformat(),
        }}

    def describe(self):
        return {{"name": self.name, "purpose": self.purpose, "created_by": CREATED_BY}}


if __name__ == "__main__":
    agent = {class}()
    print(agent.think("hello"))
    print(agent.act("introduce yourself"))
"#,
        name = string_literal(ctx.display_name),
        purpose = string_literal(&ctx.purpose),
        created_by = string_literal(ctx.created_by),
        class = class,
    )
}

fn manifest_json(ctx: &TemplateContext<'_>) -> String {
    let manifest = Manifest {
        name: ctx.display_name,
        purpose: &ctx.purpose,
        created_by: ctx.created_by,
        created_at: ctx.created_at.to_rfc3339(),
        thought_id: ctx.thought_id,
        entrypoint: "main.py",
        class_name: &ctx.class_name,
    };
    let mut json = serde_json::to_string_pretty(&manifest).unwrap_or_else(|_| "{}".to_string());
    json.push('\n');
    json
}
