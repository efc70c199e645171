use super::{Sql, collapse_indentation};
use crate::config::ComposeConfig;
use std::fmt::Write;

impl Sql {
    /// Render SQL with `:N` / `:name` placeholders under the default config.
    ///
    /// `N` is the 1-based position of the first occurrence of the value, so a
    /// repeated value reuses its placeholder. The result is cached.
    pub fn render(&self) -> &str {
        self.text
            .get_or_init(|| self.render_with(&ComposeConfig::default()))
    }

    /// Render under an explicit config. Not cached.
    pub fn render_with(&self, config: &ComposeConfig) -> String {
        let index = self.index();
        let capacity = self.strings.iter().map(String::len).sum::<usize>() + self.params.len() * 4;
        let mut out = String::with_capacity(capacity);

        let mut strings = self.strings.iter();
        if let Some(head) = strings.next() {
            out.push_str(head);
        }
        for (i, (param, text)) in self.params.iter().zip(strings).enumerate() {
            out.push(':');
            match param.bind_name() {
                Some(name) => out.push_str(name),
                None => {
                    let _ = write!(out, "{}", index.rep(i) + 1);
                }
            }
            out.push_str(text);
        }

        if config.normalize_whitespace {
            collapse_indentation(out)
        } else {
            out
        }
    }
}
