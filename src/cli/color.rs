use nu_ansi_term::{Color, Style};

fn styled(color: Color, text: &str) -> String {
    Style::new().fg(color).paint(text).to_string()
}

pub fn cyan(text: &str) -> String {
    styled(Color::Cyan, text)
}

pub fn white(text: &str) -> String {
    styled(Color::LightGray, text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn styled_text_keeps_content() {
        let text = cyan("moo");
        assert!(text.contains("moo"));
        assert!(text.starts_with('\u{1b}'));
        assert!(white("moo").contains("moo"));
    }
}
