//! Named extraction rules over raw completions
//!
//! Each rule pairs one marker with how far its capture runs. Rules are pure
//! functions from the completion text to an optional span; the parser only
//! ever talks to them through [`Rule::capture`].
//!
//! | rule           | marker           | capture                                  |
//! |----------------|------------------|------------------------------------------|
//! | `thought`      | `Action:`        | everything before the first marker       |
//! | `action`       | `Action:`        | to end of line                           |
//! | `action_input` | `Action Input:`  | to end of text, or a hallucinated `Observation:` line |
//! | `ai_answer`    | `AI:`            | to end of text                           |
//! | `final_answer` | `Final Answer:`  | to end of text, or the next marker line  |
//! | `positivity`   | `Positivity:`    | leading decimal number, marker at line start |

use std::sync::OnceLock;

use fancy_regex::Regex;
use tracing::{error, warn};

/// How far a rule's capture extends
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Extent {
    /// Everything preceding the marker
    Before,
    /// Rest of the marker's line
    Line,
    /// Rest of the text, cut at the next marker line
    Block,
    /// Rest of the text
    Rest,
}

/// A single named extraction rule
pub struct Rule {
    pub name: &'static str,
    pub marker: &'static str,
    pub extent: Extent,
    pattern: &'static str,
    compiled: OnceLock<Option<Regex>>,
}

impl Rule {
    const fn new(
        name: &'static str,
        marker: &'static str,
        extent: Extent,
        pattern: &'static str,
    ) -> Self {
        Self {
            name,
            marker,
            extent,
            pattern,
            compiled: OnceLock::new(),
        }
    }

    fn regex(&self) -> Option<&Regex> {
        self.compiled
            .get_or_init(|| match Regex::new(self.pattern) {
                Ok(regex) => Some(regex),
                Err(e) => {
                    error!(
                        "Extraction rule '{}' ({}) failed to compile: {}",
                        self.name, self.marker, e
                    );
                    None
                },
            })
            .as_ref()
    }

    /// The raw (untrimmed) span this rule captures, if its marker is present.
    ///
    /// A match that aborts at runtime (backtrack limit on very large
    /// completions) is logged and treated as no match.
    pub fn capture<'t>(&self, text: &'t str) -> Option<&'t str> {
        let captures = match self.regex()?.captures(text) {
            Ok(captures) => captures?,
            Err(e) => {
                warn!(
                    "Extraction rule '{}' ({:?} after '{}') aborted on {} bytes: {}",
                    self.name,
                    self.extent,
                    self.marker,
                    text.len(),
                    e
                );
                return None;
            },
        };
        captures.get(1).map(|m| m.as_str())
    }
}

pub static THOUGHT: Rule = Rule::new("thought", "Action:", Extent::Before, r"(?s)^(.*?)Action:");

pub static ACTION: Rule = Rule::new("action", "Action:", Extent::Line, r"Action:([^\n]*)");

pub static ACTION_INPUT: Rule = Rule::new(
    "action_input",
    "Action Input:",
    Extent::Block,
    r"(?s)Action Input:(.*?)(?=\n[ \t]*Observation:|\z)",
);

pub static AI_ANSWER: Rule = Rule::new("ai_answer", "AI:", Extent::Rest, r"(?s)AI:(.*)");

pub static FINAL_ANSWER: Rule = Rule::new(
    "final_answer",
    "Final Answer:",
    Extent::Block,
    r"(?s)Final Answer:(.*?)(?=\n[ \t]*(?:Positivity|Thought|Action Input|Action|Observation):|\z)",
);

pub static POSITIVITY: Rule = Rule::new(
    "positivity",
    "Positivity:",
    Extent::Line,
    r"(?m)^[ \t]*Positivity:[ \t]*([0-9]+(?:\.[0-9]+)?)",
);

/// Strip one layer of surrounding double quotes, then one of single quotes
pub fn strip_quotes(value: &str) -> &str {
    let value = strip_pair(value, '"');
    strip_pair(value, '\'')
}

fn strip_pair(value: &str, quote: char) -> &str {
    value
        .strip_prefix(quote)
        .and_then(|inner| inner.strip_suffix(quote))
        .unwrap_or(value)
}

/// Trim a captured span and unwrap its quotes
pub fn normalize(value: &str) -> &str {
    strip_quotes(value.trim())
}

/// Capture a rule's span, trimmed
pub fn extract<'t>(rule: &Rule, text: &'t str) -> Option<&'t str> {
    rule.capture(text).map(str::trim)
}

/// The positivity score, if one is present and parses as a number
pub fn positivity(text: &str) -> Option<f64> {
    POSITIVITY.capture(text)?.parse().ok()
}
