use co_core::config::OptimizationConfig;
use co_core::text::truncate_chars;
use co_core::{ExtractedContent, SourceArticle};

pub const MAX_PROMPT_REFERENCES: usize = 2;

/// Build the rewrite instruction for `original` from up to two reference
/// extractions. Each embedded body is cut to its configured character cap;
/// a missing reference slot renders as `N/A` with no content.
pub fn build_optimization_prompt(
    original: &SourceArticle,
    references: &[ExtractedContent],
    config: &OptimizationConfig,
) -> String {
    let mut prompt = String::from(
        "You are a professional content optimizer and SEO expert. Your task is to improve an article \
         by analyzing top-ranking content on the same topic and applying its successful formatting \
         and writing patterns.\n\n",
    );

    prompt.push_str(&format!(
        "**ORIGINAL ARTICLE:**\nTitle: {}\nContent:\n{}\n\n",
        original.title,
        truncate_chars(&original.content, config.original_excerpt_chars)
    ));

    for slot in 0..MAX_PROMPT_REFERENCES {
        let (title, content) = match references.get(slot) {
            Some(reference) => (
                reference.title.as_str(),
                truncate_chars(&reference.content, config.reference_excerpt_chars),
            ),
            None => ("N/A", ""),
        };
        prompt.push_str(&format!(
            "**REFERENCE ARTICLE {} (top-ranking result):**\nTitle: {}\nContent:\n{}\n\n",
            slot + 1,
            title,
            content
        ));
    }

    prompt.push_str(
        "**YOUR TASK:**\n\
         Rewrite the ORIGINAL ARTICLE by incorporating the formatting style, structure, and content \
         patterns of the reference articles.\n\n\
         **REQUIREMENTS:**\n\
         1. **Maintain Core Message**: Keep all factual information and key points from the original article\n\
         2. **Improve Structure**: Use a heading hierarchy, bullet points, and formatting similar to the reference articles\n\
         3. **Enhance Readability**: Make the content more scannable and engaging\n\
         4. **SEO Optimization**: Incorporate relevant keywords and phrases naturally\n\
         5. **Similar Length**: Keep a length comparable to the original (not much shorter, not much longer)\n\
         6. **Professional Tone**: Maintain a professional, authoritative tone\n\
         7. **Formatting**: Use markdown (headings with ##, ### and bullet points with -)\n\n\
         **OUTPUT FORMAT:**\n\
         Provide ONLY the optimized article content in markdown format. Do NOT include any \
         meta-commentary, explanations, or notes. Just the article itself.\n\n\
         Begin the optimized article now:",
    );
    prompt
}
