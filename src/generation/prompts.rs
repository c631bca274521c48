//! Prompt templates.
//!
//! The replacement policy is "ground material only": the existing ground
//! surface is re-paved, objects standing on it are left alone.

/// Instruction sent with every generation, sized to the site photo.
pub fn initial_generation(width: u32, height: u32) -> String {
    format!(
        r#"OUTPUT: Return exactly one image ({width}x{height}). No text. Do not crop/pad/resize.

You are an AI specializing in photorealistic architectural visualization. You will receive two images after this text: first the site photo, then the paving swatch. Your task is to replace the ground surface in the first image (the site photo) with the texture from the second image (the paving swatch).

CRITICAL INSTRUCTIONS:
1.  **Output Image Only:** Your entire response must be ONLY the final image. Do not include any text, explanation, or markdown.
2.  **Preserve Everything Else:** Do NOT alter any other part of the site photo. All objects, furniture, plants, walls, buildings, and the sky must remain IDENTICAL to the original.
3.  **Seamless Integration:** The new paving must be perfectly integrated. Match the original photo's perspective, lighting, shadows, and overall atmosphere.
4.  **Photorealism:** The result must look like a real photograph.
5.  **Exact Dimensions:** The output image must be exactly {width}x{height} pixels.
6.  **Ground Only:** Only replace the existing ground material (e.g., pavers, porcelain paving, planks). Do not cover objects that are on the ground."#
    )
}

/// The full initial instruction set plus a user edit, applied in one pass
/// against the original site photo.
pub fn refinement(width: u32, height: u32, instruction: &str, masked: bool) -> String {
    let mut prompt = format!(
        r#"{base}

**ADDITIONAL REFINEMENT INSTRUCTION:**
After applying the paving as described above, you must also apply the following user instruction to the image: "{instruction}".

The final image must incorporate both the paving replacement and this additional refinement."#,
        base = initial_generation(width, height),
        instruction = instruction.trim(),
    );
    if masked {
        prompt.push_str(
            r#"

**MASK:** A third image follows the swatch. It is a black-and-white mask the same size as the site photo. Apply the additional refinement ONLY inside the white area of the mask; everything in the black area must stay exactly as the paving replacement left it."#,
        );
    }
    prompt
}

const SUMMARIZE_REFINEMENT: &str = r#"You are a helpful assistant. A user provided a short, imperative instruction to an AI image editor. Your task is to convert this instruction into a clean, past-tense, descriptive sentence fragment that would be suitable for a design report.

Examples:
- User input: "make the stones bigger"
- Your output: "Increased the paving stone size"
- User input: "add a small tree on the left"
- Your output: "Added a small tree on the left"
- User input: "can you make it look like it just rained"
- Your output: "Created a wet look, as if it had just rained"

The user's instruction is:"#;

/// Few-shot prompt asking for a past-tense description of `instruction`.
pub fn summarize_refinement(instruction: &str) -> String {
    format!("{SUMMARIZE_REFINEMENT} \"{}\"", instruction.trim())
}
