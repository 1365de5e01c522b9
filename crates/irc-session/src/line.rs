//! IRC line parsing.

/// A parsed IRC line: `[:<source>] <command> <params...> [:<trailing>]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Line {
    pub source: Option<String>,
    pub command: String,
    pub params: Vec<String>,
}

impl Line {
    /// Parse a raw line. Returns `None` for blank lines and lines with no
    /// command.
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim_end_matches(['\r', '\n']);
        if raw.is_empty() {
            return None;
        }

        let (source, rest) = match raw.strip_prefix(':') {
            Some(stripped) => {
                let space = stripped.find(' ')?;
                (
                    Some(stripped[..space].to_string()),
                    stripped[space + 1..].trim_start(),
                )
            }
            None => (None, raw),
        };

        // The trailing param starts at the first " :" and may contain
        // spaces; everything before it splits on whitespace.
        let (head, trailing) = match rest.find(" :") {
            Some(pos) => (&rest[..pos], Some(&rest[pos + 2..])),
            None => (rest, None),
        };

        let mut words = head.split_whitespace();
        let command = words.next()?.to_ascii_uppercase();
        let mut params: Vec<String> = words.map(str::to_string).collect();
        if let Some(trailing) = trailing {
            params.push(trailing.to_string());
        }

        Some(Self {
            source,
            command,
            params,
        })
    }

    /// The nick part of the source (`nick!user@host` → `nick`).
    pub fn source_nick(&self) -> Option<&str> {
        let source = self.source.as_deref()?;
        let nick = &source[..source.find('!').unwrap_or(source.len())];
        if nick.is_empty() {
            None
        } else {
            Some(nick)
        }
    }

    /// Positional param, empty string when absent.
    pub fn param(&self, index: usize) -> &str {
        self.params.get(index).map_or("", String::as_str)
    }
}
