//! Tool template: `<name>.py` with `run` and `get_pricing`

use super::TemplateFiles;
use crate::naming::{stable_pick, string_literal};
use crate::templater::TemplateContext;

/// Price tiers in USD. A tool's tier is fixed by its name.
const PRICE_TIERS: &[&str] = &["0.99", "2.49", "4.99", "9.99", "19.99"];

pub fn render(ctx: &TemplateContext<'_>) -> TemplateFiles {
    let class = format!("{}Tool", ctx.class_name);
    let price = stable_pick(PRICE_TIERS, ctx.name);

    let source = format!(
        r#""""Monetizable tool generated by Aether."""

from datetime import datetime, timezone

TOOL_NAME = {tool_name}
PURPOSE = {purpose}
PRICE = {price}
CURRENCY = "USD"
BILLING = "per_use"


class {class}:
    def __init__(self):
        self.invocations = 0

    def run(self, payload=None):
        self.invocations += 1
        try:
            result = self.process(payload)
            return {{"success": True, "result": result, "timestamp": _now()}}
        except Exception as exc:
            return {{"success": False, "error": str(exc), "timestamp": _now()}}

    def process(self, payload):
        return {{
            "tool": TOOL_NAME,
            "purpose": PURPOSE,
            "input": payload,
            "invocation": self.invocations,
        }}

    def get_pricing(self):
        return {{
            "tool": TOOL_NAME,
            "price": PRICE,
            "currency": CURRENCY,
            "billing": BILLING,
        }}


def _now():
    return datetime.now(timezone.utc).isoformat()


if __name__ == "__main__":
    tool = {class}()
    print(tool.run({{"demo": True}}))
    print(tool.get_pricing())
"#,
        tool_name = string_literal(ctx.name),
        purpose = string_literal(&ctx.purpose),
        price = price,
        class = class,
    );

    vec![(format!("{}.py", ctx.name), source)]
}
