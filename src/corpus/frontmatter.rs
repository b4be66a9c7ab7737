use std::collections::BTreeMap;

use serde::Serialize;
use serde_yaml_ng::Value;

const DELIMITER: &str = "---";

/// Key/value preamble of a document. Only `title` has meaning to the corpus,
/// everything else is carried through untouched.
#[derive(Serialize, Debug, Default, Clone, PartialEq)]
#[serde(transparent)]
pub struct Frontmatter(BTreeMap<String, Value>);

impl Frontmatter {
    /// The `title` field, if it is a string that is not blank after trimming.
    pub fn title(&self) -> Option<&str> {
        self.0
            .get("title")
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|title| !title.is_empty())
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    fn parse(yaml: &str) -> Result<Self, serde_yaml_ng::Error> {
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        match serde_yaml_ng::from_str::<Value>(yaml)? {
            Value::Mapping(mapping) => Ok(Self(
                mapping
                    .into_iter()
                    .filter_map(|(key, value)| match key {
                        Value::String(key) => Some((key, value)),
                        _ => None,
                    })
                    .collect(),
            )),
            _ => Ok(Self::default()),
        }
    }
}

/// Split a raw document into its front matter and body.
///
/// Front matter is recognized only when the very first line is `---` and a
/// later line closes it with `---`; otherwise the whole input is the body.
/// The YAML between the delimiters is parsed eagerly, so malformed front
/// matter surfaces as an error here.
pub fn split_frontmatter(raw: &str) -> Result<(Frontmatter, &str), serde_yaml_ng::Error> {
    let text = raw.strip_prefix('\u{feff}').unwrap_or(raw);

    let Some((first, rest)) = text.split_once('\n') else {
        return Ok((Frontmatter::default(), text));
    };
    if first.trim_end() != DELIMITER {
        return Ok((Frontmatter::default(), text));
    }

    let mut offset = 0;
    for line in rest.split_inclusive('\n') {
        if line.trim_end() == DELIMITER {
            let frontmatter = Frontmatter::parse(&rest[..offset])?;
            return Ok((frontmatter, &rest[offset + line.len()..]));
        }
        offset += line.len();
    }

    Ok((Frontmatter::default(), text))
}
