/// A `Content-Disposition` value split into its type and parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ContentDisposition {
    pub(crate) disposition: String,
    pub(crate) params: Vec<(String, String)>,
}

impl ContentDisposition {
    /// Parses values like `form-data; name="field"; filename="a b.txt"`.
    ///
    /// Parameter names are lowercased. Quoted values may contain `;` and use
    /// `\"` for a literal quote; other backslashes are kept as-is since browsers
    /// send unescaped Windows paths.
    pub fn parse(value: &str) -> ContentDisposition {
        let mut rest = value;

        let (disposition, tail) = split_unquoted(rest);
        rest = tail;

        let mut params = Vec::new();

        while !rest.is_empty() {
            let (segment, tail) = split_unquoted(rest);
            rest = tail;

            let segment = segment.trim();
            if segment.is_empty() {
                continue;
            }

            let (key, value) = match segment.find('=') {
                Some(idx) => (&segment[..idx], unquote(segment[idx + 1..].trim())),
                None => (segment, String::new()),
            };

            params.push((key.trim().to_ascii_lowercase(), value));
        }

        ContentDisposition {
            disposition: disposition.trim().to_ascii_lowercase(),
            params,
        }
    }

    pub fn param(&self, key: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(name, _)| name == key)
            .map(|(_, value)| value.as_str())
    }

    pub fn field_name(&self) -> Option<&str> {
        self.param("name")
    }

    pub fn file_name(&self) -> Option<&str> {
        self.param("filename")
    }
}

/// Splits at the first `;` that is not inside a quoted string.
fn split_unquoted(value: &str) -> (&str, &str) {
    let mut in_quotes = false;
    let mut escaped = false;

    for (idx, ch) in value.char_indices() {
        match ch {
            '\\' if in_quotes && !escaped => {
                escaped = true;
                continue;
            }
            '"' if !escaped => in_quotes = !in_quotes,
            ';' if !in_quotes => return (&value[..idx], &value[idx + 1..]),
            _ => {}
        }
        escaped = false;
    }

    (value, "")
}

fn unquote(value: &str) -> String {
    let inner = match value.strip_prefix('"') {
        Some(inner) => inner.strip_suffix('"').unwrap_or(inner),
        None => return value.to_owned(),
    };

    inner.replace("\\\"", "\"")
}
