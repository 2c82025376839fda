//! # Prompt Compiler
//!
//! Every outbound prompt starts with a block of hard visual constraints so the
//! model produces something the acceptance checker can pass. Generation
//! prompts then add a rotating style guide for variety across variants; edit
//! prompts restate the constraints in short form before the requested change.
//!
//! When a candidate is rejected, [`corrective_prompt`] appends targeted
//! reminders for exactly the violations that were found.

use crate::checker::{CANVAS_SIZE, Violation};
use crate::model::BackgroundMode;
use once_cell::sync::Lazy;
use regex::Regex;

const VARIANT_GUIDES: [&str; 3] = [
    "STYLE GUIDE: Bold, rounded, balanced silhouette. Symmetric and compact.",
    "STYLE GUIDE: Outer contour suggests a layered or dimensional form, but without any interior lines or detail. One solid filled shape only.",
    "STYLE GUIDE: Thick crescent or arc-based silhouette. Simple, readable, with generous curves.",
];

// Words that reliably coax the model into drawing interior detail
static BANNED_WORDS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\bpetals?\b").expect("banned word pattern"));
const BANNED_REPLACEMENT: &str = "rounded leaf-like form";

fn background_rule(mode: BackgroundMode) -> &'static str {
    match mode {
        BackgroundMode::Black => "Pure black background (RGB 0,0,0) filling the entire canvas.",
        BackgroundMode::Transparent => {
            "Fully transparent background (alpha 0) everywhere outside the silhouette."
        }
    }
}

fn corner_rule(mode: BackgroundMode) -> &'static str {
    match mode {
        BackgroundMode::Black => "All four corners of the image MUST be pure black (RGB 0,0,0).",
        BackgroundMode::Transparent => "All four corners of the image MUST be fully transparent.",
    }
}

fn preamble(mode: BackgroundMode) -> String {
    format!(
        "Generate a {CANVAS_SIZE}x{CANVAS_SIZE} PNG icon layer with ALL of these rules:\n\n\
         BACKGROUND: {}\n\
         SHAPE: Exactly ONE continuous silhouette shape, no separate pieces, no floating elements.\n\
         COLOR: The silhouette must be ONE solid flat color. Absolutely NO gradients, shadows, highlights, glow, outlines, textures, or internal details.\n\
         GEOMETRY: Large smooth rounded curves. Avoid thin lines, small details, or intricate features.\n\
         COMPOSITION: Centered on the canvas with approximately 60px margin on all sides. Bold, geometric, and readable at small sizes.\n\
         CORNERS: {}\n\
         STYLE: Ultra-minimal flat design. Think of a single-color vinyl sticker silhouette.\n",
        background_rule(mode),
        corner_rule(mode),
    )
}

fn sanitize(text: &str) -> String {
    BANNED_WORDS.replace_all(text, BANNED_REPLACEMENT).into_owned()
}

/// One fully constrained prompt per variant, style guides cycling.
pub fn build_prompts(description: &str, count: u32, mode: BackgroundMode) -> Vec<String> {
    let preamble = preamble(mode);
    (0..count as usize)
        .map(|i| {
            let guide = VARIANT_GUIDES[i % VARIANT_GUIDES.len()];
            sanitize(&format!("{preamble}\n{guide}\n\nSUBJECT: {description}"))
        })
        .collect()
}

pub fn build_edit_prompt(change: &str, mode: BackgroundMode) -> String {
    let background = match mode {
        BackgroundMode::Black => "pure black background (RGB 0,0,0)",
        BackgroundMode::Transparent => "fully transparent background",
    };
    let corners = match mode {
        BackgroundMode::Black => "all four corners pure black",
        BackgroundMode::Transparent => "all four corners fully transparent",
    };
    let abbreviated = format!(
        "This is an icon layer. Maintain these rules: {background}, exactly ONE continuous \
         silhouette shape, ONE solid flat color with NO gradients/shadows/highlights/glow/\
         outlines/textures/details, large smooth rounded curves, centered with ~60px margin, \
         {corners}."
    );
    sanitize(&format!("{abbreviated}\n\nREQUESTED CHANGE: {change}"))
}

/// The original prompt plus one reminder per kind of violation found.
pub fn corrective_prompt(original: &str, violations: &[Violation]) -> String {
    let mut reminders: Vec<String> = Vec::new();
    for violation in violations {
        let line = match violation {
            Violation::Dimensions { width, height } => format!(
                "The image MUST be exactly {CANVAS_SIZE}x{CANVAS_SIZE} pixels \
                 (the last one was {width}x{height})."
            ),
            Violation::Background { expected, .. } => format!(
                "The four corners and the whole background MUST be {}.",
                expected.describe()
            ),
            Violation::MultiColor { .. } => {
                "Use ONLY ONE flat color for the silhouette: no gradients, \
                 no shading, no highlights, no second color."
                    .to_string()
            }
            Violation::EmptySilhouette => {
                "Draw ONE large, clearly visible silhouette; the last image was blank.".to_string()
            }
        };
        if !reminders.contains(&line) {
            reminders.push(line);
        }
    }

    let mut prompt = format!("{original}\n\nCRITICAL REMINDER:");
    for reminder in reminders {
        prompt.push(' ');
        prompt.push_str(&reminder);
    }
    prompt.push_str(" Keep the shape simple with smooth curves.");
    prompt
}
