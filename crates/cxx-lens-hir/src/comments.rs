//! Brief documentation comments attached to declarations.
//!
//! A declaration owns the run of documentation comments (`///`, `//!`,
//! `/** */`, `/*! */`) that ends on the line directly above it, or a
//! trailing `///<` comment on its own last line. The brief text is the
//! `\brief` paragraph when there is one, the first paragraph otherwise.

use tree_sitter::Node;

/// Finds the brief comment for the declaration rooted at `node`.
pub(crate) fn brief_comment(node: Node<'_>, source: &str) -> Option<String> {
    let mut anchor = node;
    while let Some(parent) = anchor.parent() {
        if parent.kind() == "template_declaration" {
            anchor = parent;
        } else {
            break;
        }
    }

    let mut blocks = Vec::new();
    let mut expected_row = anchor.start_position().row;
    let mut sibling = anchor.prev_sibling();
    while let Some(comment) = sibling {
        if comment.kind() != "comment" || comment.end_position().row + 1 < expected_row {
            break;
        }
        let Ok(text) = comment.utf8_text(source.as_bytes()) else {
            break;
        };
        if !is_doc_comment(text) || is_trailing_doc_comment(text) {
            break;
        }
        blocks.push(text);
        expected_row = comment.start_position().row;
        sibling = comment.prev_sibling();
    }

    if blocks.is_empty() {
        let trailing = anchor.next_sibling().filter(|next| {
            next.kind() == "comment" && next.start_position().row == anchor.end_position().row
        });
        if let Some(Ok(text)) = trailing.map(|next| next.utf8_text(source.as_bytes())) {
            if is_trailing_doc_comment(text) {
                blocks.push(text);
            }
        }
    }

    blocks.reverse();
    let lines: Vec<String> = blocks.iter().flat_map(|block| comment_lines(block)).collect();
    brief_from_lines(&lines)
}

fn is_doc_comment(text: &str) -> bool {
    (text.starts_with("///") && !text.starts_with("////"))
        || text.starts_with("//!")
        || (text.starts_with("/**") && text != "/**/" && !text.starts_with("/***"))
        || text.starts_with("/*!")
}

fn is_trailing_doc_comment(text: &str) -> bool {
    ["///<", "//!<", "/**<", "/*!<"]
        .iter()
        .any(|marker| text.starts_with(marker))
}

/// Strips comment markers, returning the text lines of one comment.
fn comment_lines(text: &str) -> Vec<String> {
    if let Some(body) = text.strip_prefix("///").or_else(|| text.strip_prefix("//!")) {
        return vec![body.trim_start_matches('<').trim().to_owned()];
    }
    let body = text
        .strip_prefix("/**")
        .or_else(|| text.strip_prefix("/*!"))
        .unwrap_or(text);
    let body = body.strip_suffix("*/").unwrap_or(body);
    let body = body.strip_prefix('<').unwrap_or(body);
    body.lines()
        .map(|line| {
            let line = line.trim();
            line.strip_prefix('*').unwrap_or(line).trim().to_owned()
        })
        .collect()
}

fn brief_from_lines(lines: &[String]) -> Option<String> {
    let command = lines
        .iter()
        .position(|line| line.starts_with("\\brief") || line.starts_with("@brief"));
    let start = command
        .or_else(|| lines.iter().position(|line| !line.is_empty()))?;

    let mut words = Vec::new();
    for (index, line) in lines.iter().enumerate().skip(start) {
        if line.is_empty() {
            break;
        }
        if index != start && (line.starts_with('\\') || line.starts_with('@')) {
            break;
        }
        let text = if index == start && command.is_some() {
            line.get(6..).unwrap_or_default()
        } else {
            line
        };
        words.extend(text.split_whitespace());
    }
    let brief = words.join(" ");
    (!brief.is_empty()).then_some(brief)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lines(items: &[&str]) -> Vec<String> {
        items.iter().map(|item| (*item).to_owned()).collect()
    }

    #[test]
    fn first_paragraph_is_the_brief() {
        let brief = brief_from_lines(&lines(&["Adds two", "numbers.", "", "Details."]));
        assert_eq!(brief.as_deref(), Some("Adds two numbers."));
    }

    #[test]
    fn brief_command_is_stripped() {
        let brief = brief_from_lines(&lines(&["", "\\brief Short one.", "@param x unused"]));
        assert_eq!(brief.as_deref(), Some("Short one."));
    }

    #[test]
    fn block_comment_markers_are_removed() {
        assert_eq!(
            comment_lines("/**\n * Hello\n * world\n */"),
            vec!["", "Hello", "world", ""]
        );
        assert_eq!(comment_lines("///< trailing"), vec!["trailing"]);
    }

    #[test]
    fn plain_comments_are_not_documentation() {
        assert!(!is_doc_comment("// plain"));
        assert!(!is_doc_comment("/* plain */"));
        assert!(!is_doc_comment("/**/"));
        assert!(is_doc_comment("//! bang"));
        assert!(is_trailing_doc_comment("///< after"));
    }
}
