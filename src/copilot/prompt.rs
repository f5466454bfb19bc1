//! System prompt assembly. Pure string construction: identical inputs always
//! produce identical prompt text, and nothing here performs I/O.

use super::{CopilotMode, RequestContext};
use std::fmt::Write;

/// Description of the JSON object the model must reply with. Shared by both
/// modes; the reply parser in [`super::reply`] enforces the same shape.
const REPLY_SCHEMA: &str = r#"Respond with a single JSON object and nothing else. The object has these fields:
- "message": a short natural-language summary of what you did, shown to the user.
- "reasoning": optional; your working notes. Omit if not useful.
- "action": one of "UPDATE_DOCUMENT", "UPDATE_FILES", "GENERATE_IMAGE", "NONE".
- For "UPDATE_DOCUMENT": include "document", the complete new HTML document.
- For "UPDATE_FILES": include "files", an object mapping file names to their complete new contents. Only include files you changed or created.
- For "GENERATE_IMAGE": include "image_prompt", a description of the image to generate.
- For "NONE": no payload; use this when only answering a question."#;

/// Build the system instruction for one request.
///
/// An empty context is valid: the prompt tells the model to create the
/// document or file set from scratch.
#[must_use]
pub fn assemble_system_prompt(mode: CopilotMode, context: &RequestContext) -> String {
    let mut prompt = String::new();

    match mode {
        CopilotMode::Article => {
            prompt.push_str(
                "You are an encyclopedia editor. You write and revise standalone \
                 HTML articles: clear structure, headings, and inline styles only.\n\n",
            );

            match (&context.title, &context.html) {
                (None, None) => {
                    prompt.push_str(
                        "There is no current article. Create a new one from scratch \
                         based on the user's request.\n",
                    );
                }
                (title, html) => {
                    if let Some(title) = title {
                        let _ = writeln!(prompt, "The article being edited is titled: {title}");
                    }
                    if let Some(html) = html {
                        let _ = writeln!(prompt, "Current article HTML:\n{html}");
                    } else {
                        prompt.push_str("The article has no content yet; write it in full.\n");
                    }
                }
            }
        }
        CopilotMode::Coder => {
            prompt.push_str(
                "You are a web developer working on a small static site. You write \
                 plain HTML, CSS, and vanilla JavaScript with no build step.\n\n",
            );

            match &context.files {
                Some(files) if !files.is_empty() => {
                    prompt.push_str("The project currently contains these files:\n");
                    for (name, content) in files {
                        let _ = writeln!(prompt, "--- {name} ---\n{content}");
                    }
                }
                _ => {
                    prompt.push_str(
                        "The project is empty. Create the initial files from scratch \
                         based on the user's request.\n",
                    );
                }
            }
        }
    }

    prompt.push('\n');
    prompt.push_str(REPLY_SCHEMA);
    prompt
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    #[test]
    fn article_prompt_embeds_title_and_html() {
        let context = RequestContext {
            title: Some("Quantum".to_string()),
            html: Some("<h1>Quantum</h1><p>...</p>".to_string()),
            files: None,
        };

        let prompt = assemble_system_prompt(CopilotMode::Article, &context);
        assert!(prompt.contains("Quantum"));
        assert!(prompt.contains("<h1>Quantum</h1>"));
        assert!(prompt.contains("UPDATE_DOCUMENT"));
    }

    #[test]
    fn coder_prompt_embeds_file_names_and_contents() {
        let mut files = BTreeMap::new();
        files.insert("a.js".to_string(), "x".to_string());

        let context = RequestContext {
            title: None,
            html: None,
            files: Some(files),
        };

        let prompt = assemble_system_prompt(CopilotMode::Coder, &context);
        assert!(prompt.contains("a.js"));
        assert!(prompt.contains("UPDATE_FILES"));
    }

    #[test]
    fn empty_context_still_produces_a_valid_prompt() {
        let prompt = assemble_system_prompt(CopilotMode::Article, &RequestContext::default());
        assert!(prompt.contains("from scratch"));
        assert!(prompt.contains("\"action\""));

        let prompt = assemble_system_prompt(CopilotMode::Coder, &RequestContext::default());
        assert!(prompt.contains("from scratch"));
    }

    #[test]
    fn assembly_is_deterministic() {
        let mut files = BTreeMap::new();
        files.insert("index.html".to_string(), "<html/>".to_string());
        files.insert("style.css".to_string(), "body{}".to_string());

        let context = RequestContext {
            title: None,
            html: None,
            files: Some(files),
        };

        let a = assemble_system_prompt(CopilotMode::Coder, &context);
        let b = assemble_system_prompt(CopilotMode::Coder, &context);
        assert_eq!(a, b);
    }
}
