use pulldown_cmark::{Event, Options, Parser, TagEnd};

/// Renders Markdown to the text a reader would see, one block per paragraph.
pub fn to_plain_text(markdown: &str) -> String {
    let mut out = String::with_capacity(markdown.len());
    let options = Options::ENABLE_TABLES | Options::ENABLE_STRIKETHROUGH;

    for event in Parser::new_ext(markdown, options) {
        match event {
            Event::Text(text) | Event::Code(text) => out.push_str(&text),
            Event::SoftBreak | Event::HardBreak => out.push('\n'),
            Event::End(TagEnd::TableCell) => out.push('\t'),
            Event::End(
                TagEnd::Paragraph
                | TagEnd::Heading(_)
                | TagEnd::Item
                | TagEnd::CodeBlock
                | TagEnd::BlockQuote
                | TagEnd::TableHead
                | TagEnd::TableRow,
            )
            | Event::Rule => push_block_break(&mut out),
            _ => {}
        }
    }

    out.trim().to_string()
}

fn push_block_break(out: &mut String) {
    let trimmed_len = out.trim_end_matches([' ', '\t', '\n']).len();
    out.truncate(trimmed_len);
    if !out.is_empty() {
        out.push_str("\n\n");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_markup_and_keeps_blocks() {
        let markdown = "# Setup\n\nInstall **the** `cli` tool.\n\n- first step\n- second step\n";
        assert_eq!(
            to_plain_text(markdown),
            "Setup\n\nInstall the cli tool.\n\nfirst step\n\nsecond step"
        );
    }

    #[test]
    fn link_text_survives_without_url() {
        let markdown = "See [the guide](https://example.com/guide) for details.";
        assert_eq!(to_plain_text(markdown), "See the guide for details.");
    }

    #[test]
    fn code_blocks_keep_their_lines() {
        let markdown = "```\nlet x = 1;\nlet y = 2;\n```\n";
        assert_eq!(to_plain_text(markdown), "let x = 1;\nlet y = 2;");
    }
}
