//! Splitting a recipe document into front matter and prose
//!
//! A markdown recipe starts with a `---` line, carries YAML up to the next
//! `---` line, and continues with free-form prose. A document that does not
//! start with `---` is read as plain YAML with no prose.

use super::RecipeError;

/// Borrowed view of the two halves of a recipe document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DocumentParts<'a> {
    pub front_matter: &'a str,
    pub prose: &'a str,
}

fn is_fence(line: &str) -> bool {
    line.trim_end() == "---"
}

/// Split a document at its front matter fences.
///
/// # Errors
///
/// Fails with [`RecipeError::UnterminatedFrontMatter`] when the opening fence
/// has no closing fence.
pub fn split_front_matter(text: &str) -> Result<DocumentParts<'_>, RecipeError> {
    let body = text.strip_prefix('\u{feff}').unwrap_or(text);
    let mut lines = body.split_inclusive('\n');

    // Leading blank lines are allowed before the opening fence
    let mut offset = 0;
    let opened = loop {
        match lines.next() {
            Some(line) if line.trim().is_empty() => offset += line.len(),
            Some(line) if is_fence(line) => {
                offset += line.len();
                break true;
            }
            _ => break false,
        }
    };

    if !opened {
        return Ok(DocumentParts {
            front_matter: body,
            prose: "",
        });
    }

    let start = offset;
    for line in lines {
        if is_fence(line) {
            let front_matter = &body[start..offset];
            let prose = &body[offset + line.len()..];
            return Ok(DocumentParts {
                front_matter,
                prose: prose.trim_start_matches(['\r', '\n']),
            });
        }
        offset += line.len();
    }
    Err(RecipeError::UnterminatedFrontMatter)
}
