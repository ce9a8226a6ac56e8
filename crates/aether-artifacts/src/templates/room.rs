//! Room template: one React Three Fiber component, `<Class>Room.jsx`
//!
//! Generated JSX carries no comments of any form, and embedded text is
//! scrubbed of comment markers.

use super::TemplateFiles;
use crate::naming::{stable_pick, string_literal};
use crate::templater::TemplateContext;
use serde::Serialize;

#[derive(Serialize)]
struct Palette {
    name: String,
    primary: &'static str,
    accent: &'static str,
    background: &'static str,
}

const PALETTES: &[(&str, &str, &str, &str)] = &[
    ("cosmic", "#8a5cff", "#ffd166", "#07021a"),
    ("neon", "#00ffcc", "#ff00aa", "#050014"),
    ("forest", "#3fa34d", "#c6e377", "#0b1a0e"),
    ("ocean", "#1e90ff", "#7fffd4", "#001a33"),
    ("crystal", "#b9f2ff", "#e0b0ff", "#101426"),
    ("ember", "#ff6b35", "#ffd23f", "#1a0700"),
];

fn palette(theme: &str) -> Palette {
    let key = theme.trim().to_lowercase();
    let (_, primary, accent, background) = PALETTES
        .iter()
        .find(|(name, ..)| *name == key)
        .copied()
        .unwrap_or_else(|| *stable_pick(PALETTES, &key));
    Palette {
        name: theme.to_string(),
        primary,
        accent,
        background,
    }
}

/// Break up comment openers and closers in user-supplied text.
pub fn scrub_comment_markers(s: &str) -> String {
    let mut out = s.to_string();
    loop {
        let next = out
            .replace("//", "/ /")
            .replace("/*", "/ *")
            .replace("*/", "* /");
        if next == out {
            return out;
        }
        out = next;
    }
}

pub fn render(ctx: &TemplateContext<'_>) -> TemplateFiles {
    let component = format!("{}Room", ctx.class_name);
    let mut colors = palette(&ctx.theme);
    colors.name = scrub_comment_markers(&colors.name);
    let theme_json = serde_json::to_string(&colors).unwrap_or_else(|_| "{}".to_string());

    let source = format!(
        r#"import React, {{ useRef }} from "react";
import {{ Canvas, useFrame }} from "@react-three/fiber";
import {{ OrbitControls, Stars, Float }} from "@react-three/drei";

const THEME = {theme};
const TITLE = {title};
const PURPOSE = {purpose};

function Core() {{
  const mesh = useRef();
  useFrame((state, delta) => {{
    if (mesh.current) {{
      mesh.current.rotation.x += delta * 0.3;
      mesh.current.rotation.y += delta * 0.5;
    }}
  }});
  return (
    <mesh ref={{mesh}}>
      <icosahedronGeometry args={{[1.4, 1]}} />
      <meshStandardMaterial color={{THEME.primary}} emissive={{THEME.accent}} emissiveIntensity={{0.35}} wireframe />
    </mesh>
  );
}}

function Satellites({{ count }}) {{
  const items = Array.from({{ length: count }}, (_, i) => {{
    const angle = (i / count) * Math.PI * 2;
    return [Math.cos(angle) * 3.2, Math.sin(angle * 2) * 0.6, Math.sin(angle) * 3.2];
  }});
  return items.map((position, i) => (
    <Float key={{i}} speed={{1.5 + i * 0.1}} floatIntensity={{0.8}}>
      <mesh position={{position}}>
        <sphereGeometry args={{[0.18, 16, 16]}} />
        <meshStandardMaterial color={{THEME.accent}} />
      </mesh>
    </Float>
  ));
}}

export default function {component}() {{
  return (
    <div style={{{{ width: "100%", height: "100vh", background: THEME.background, position: "relative" }}}}>
      <div style={{{{ position: "absolute", top: 16, left: 16, zIndex: 1, color: THEME.primary, fontFamily: "monospace" }}}}>
        <h1 style={{{{ margin: 0 }}}}>{{TITLE}}</h1>
        <p style={{{{ margin: 0, opacity: 0.7 }}}}>{{PURPOSE}}</p>
      </div>
      <Canvas camera={{{{ position: [0, 0, 7] }}}}>
        <ambientLight intensity={{0.3}} />
        <pointLight position={{[10, 10, 10]}} color={{THEME.accent}} />
        <Core />
        <Satellites count={{6}} />
        <Stars radius={{80}} depth={{40}} count={{2000}} factor={{4}} fade />
        <OrbitControls enableZoom={{false}} autoRotate />
      </Canvas>
    </div>
  );
}}
"#,
        theme = theme_json,
        title = string_literal(&scrub_comment_markers(ctx.display_name)),
        purpose = string_literal(&scrub_comment_markers(&ctx.purpose)),
        component = component,
    );

    vec![(format!("{}.jsx", component), source)]
}
