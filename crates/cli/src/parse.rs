//! ArgMatches → CliAction conversion.
//!
//! Only shapes arguments; field values are validated by the store so the
//! CLI reports exactly the errors any other editing client would see.

use clap::ArgMatches;
use vigil_core::{RecordDraft, RecordFilter, RecordId, RecordPatch, SortOrder, ViolationTimestamp};

/// The result of parsing the command line.
#[derive(Debug, Clone, PartialEq)]
pub enum CliAction {
    /// Create the store and default config
    Init,
    /// Filtered, ordered listing
    List {
        filter: RecordFilter,
        order: SortOrder,
    },
    /// New record
    Add(RecordDraft),
    /// Patch the record at a position
    Update { position: usize, patch: RecordPatch },
    /// Remove the record at a position
    Delete { position: usize },
    /// Mark resolved
    Resolve(Target),
    /// Summary counts
    Status,
    /// Insert the example violation
    Demo,
    /// Stream change events
    Watch { alerts_only: bool },
}

/// How `resolve` names its record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    /// 0-based position
    Position(usize),
    /// Stable record id
    Id(RecordId),
}

impl std::str::FromStr for Target {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Ok(position) = s.parse::<usize>() {
            return Ok(Target::Position(position));
        }
        s.parse::<RecordId>()
            .map(Target::Id)
            .map_err(|_| format!("'{}' is neither a position nor a record id", s))
    }
}

fn string(m: &ArgMatches, id: &str) -> Option<String> {
    m.get_one::<String>(id).cloned()
}

/// Convert top-level matches into an action.
pub fn matches_to_action(matches: &ArgMatches) -> Result<CliAction, String> {
    match matches.subcommand() {
        Some(("init", _)) => Ok(CliAction::Init),
        Some(("list", m)) => {
            let mut filter = if m.get_flag("unresolved") {
                RecordFilter::unresolved()
            } else {
                RecordFilter::all()
            };
            filter.violation_type = string(m, "type");
            filter.factory_area = string(m, "area");
            filter.inspection_section = string(m, "section");
            let order = m
                .get_one::<String>("sort")
                .map(|s| s.parse::<SortOrder>())
                .transpose()?
                .unwrap_or_default();
            Ok(CliAction::List { filter, order })
        }
        Some(("add", m)) => {
            let timestamp = string(m, "timestamp")
                .unwrap_or_else(|| ViolationTimestamp::now().to_string());
            let mut draft = RecordDraft::new(
                timestamp,
                string(m, "area").unwrap_or_default(),
                string(m, "section").unwrap_or_default(),
                string(m, "type").unwrap_or_default(),
            )
            .with_resolved(m.get_flag("resolved"))
            .with_confirmed(m.get_flag("confirmed"));
            if let Some(url) = string(m, "image-url") {
                draft = draft.with_image_url(url);
            }
            Ok(CliAction::Add(draft))
        }
        Some(("update", m)) => {
            let position = *m
                .get_one::<usize>("position")
                .ok_or("update needs a position")?;
            let patch = RecordPatch {
                timestamp: string(m, "timestamp"),
                factory_area: string(m, "area"),
                inspection_section: string(m, "section"),
                violation_type: string(m, "type"),
                image_url: string(m, "image-url"),
                resolved: m.get_one::<bool>("resolved").copied(),
                confirmed: m.get_one::<bool>("confirmed").copied(),
            };
            if patch.is_empty() {
                return Err("update needs at least one field to change".to_string());
            }
            Ok(CliAction::Update { position, patch })
        }
        Some(("delete", m)) => {
            let position = *m
                .get_one::<usize>("position")
                .ok_or("delete needs a position")?;
            Ok(CliAction::Delete { position })
        }
        Some(("resolve", m)) => {
            let target = m
                .get_one::<String>("target")
                .ok_or("resolve needs a position or id")?
                .parse::<Target>()?;
            Ok(CliAction::Resolve(target))
        }
        Some(("status", _)) => Ok(CliAction::Status),
        Some(("demo", _)) => Ok(CliAction::Demo),
        Some(("watch", m)) => Ok(CliAction::Watch {
            alerts_only: m.get_flag("alerts-only"),
        }),
        Some((other, _)) => Err(format!("unknown command '{}'", other)),
        None => Err("no command given".to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::build_cli;

    fn parse(args: &[&str]) -> Result<CliAction, String> {
        let matches = build_cli().try_get_matches_from(args).map_err(|e| e.to_string())?;
        matches_to_action(&matches)
    }

    #[test]
    fn test_list_filters() {
        let action = parse(&["vigil", "list", "--unresolved", "--area", "A1", "--sort", "newest"])
            .unwrap();
        assert_eq!(
            action,
            CliAction::List {
                filter: RecordFilter::unresolved().with_factory_area("A1"),
                order: SortOrder::NewestFirst,
            }
        );
    }

    #[test]
    fn test_add_defaults_timestamp_to_now() {
        let action = parse(&[
            "vigil", "add", "--area", "A1", "--section", "S3", "--type", "NoHelmet",
        ])
        .unwrap();
        match action {
            CliAction::Add(draft) => {
                assert!(ViolationTimestamp::parse(&draft.timestamp).is_ok());
                assert!(!draft.resolved);
                assert_eq!(draft.image_url, "");
            }
            other => panic!("expected Add, got {:?}", other),
        }
    }

    #[test]
    fn test_update_builds_patch() {
        let action = parse(&["vigil", "update", "2", "--resolved", "true", "--type", "NoVest"])
            .unwrap();
        assert_eq!(
            action,
            CliAction::Update {
                position: 2,
                patch: RecordPatch::resolve().with_violation_type("NoVest"),
            }
        );
    }

    #[test]
    fn test_empty_update_rejected() {
        assert!(parse(&["vigil", "update", "0"]).is_err());
    }

    #[test]
    fn test_resolve_target() {
        assert_eq!(
            parse(&["vigil", "resolve", "3"]).unwrap(),
            CliAction::Resolve(Target::Position(3))
        );
        let id = RecordId::new();
        assert_eq!(
            parse(&["vigil", "resolve", &id.to_string()]).unwrap(),
            CliAction::Resolve(Target::Id(id))
        );
        assert!(parse(&["vigil", "resolve", "yesterday"]).is_err());
    }
}
