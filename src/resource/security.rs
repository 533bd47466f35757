//! `junos_security`: IKE traceoptions and UTM web filtering.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::codec::{parse_number, quote, quote_if_needed, show_command, unquote, CommandSet, PrefixTable};
use crate::error::{ParseError, ValidationError};

use super::{check_range, Resource, ResourceKind};

/// Accepted values of `utm.feature_profile_web_filtering_type`.
pub const WEB_FILTERING_TYPES: &[&str] = &[
    "juniper-enhanced",
    "juniper-local",
    "web-filtering-none",
    "websense-redirect",
];

/// Words that follow `ike traceoptions file` as option keywords; a file
/// name equal to one of them reads back as that option.
const FILE_KEYWORDS: &[&str] = &["files", "match", "size", "world-readable", "no-world-readable"];

const FILES_RANGE: (u64, u64) = (2, 1000);
const SIZE_RANGE: (u64, u64) = (10_240, 1_073_741_824);

/// Options of the `security` stanza.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SecurityOptions {
    /// `security ike traceoptions`.
    pub ike_traceoptions: Option<IkeTraceoptions>,
    /// `security utm`.
    pub utm: Option<UtmOptions>,
}

/// IKE trace options.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct IkeTraceoptions {
    /// Trace file settings.
    pub file: Option<TraceFile>,
    /// Trace flags, in configured order.
    pub flag: Vec<String>,
    /// Disable remote tracing.
    pub no_remote_trace: bool,
    /// Maximum trace messages per second; `None` leaves the device default.
    pub rate_limit: Option<u32>,
}

/// Trace file settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TraceFile {
    /// File name.
    pub name: Option<String>,
    /// Number of rotated files (2..=1000).
    pub files: Option<u32>,
    /// Regular expression lines must match to be logged.
    #[serde(rename = "match")]
    pub match_pattern: Option<String>,
    /// Maximum file size in bytes (10240..=1073741824).
    pub size: Option<u64>,
    /// Allow any user to read the file.
    pub world_readable: bool,
    /// Restrict file access to its owner.
    pub no_world_readable: bool,
}

/// UTM options.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct UtmOptions {
    /// Web filtering engine, one of [`WEB_FILTERING_TYPES`].
    pub feature_profile_web_filtering_type: Option<String>,
}

/// The `junos_security` resource.
#[derive(Debug, Clone, Copy, Default)]
pub struct Security;

impl Resource for Security {
    const KIND: ResourceKind = ResourceKind::Security;
    type Options = SecurityOptions;

    fn identifier(_options: &SecurityOptions) -> String {
        String::from("security")
    }

    fn validate(options: &SecurityOptions) -> Result<(), ValidationError> {
        if let Some(ike) = &options.ike_traceoptions {
            if let Some(file) = &ike.file {
                validate_trace_file(file)?;
            }
            let mut seen = HashSet::new();
            for flag in &ike.flag {
                if flag.is_empty() || flag.contains(char::is_whitespace) {
                    return Err(invalid_flag(flag, "must be a single keyword"));
                }
                if !seen.insert(flag.as_str()) {
                    return Err(invalid_flag(flag, "listed more than once"));
                }
            }
        }
        if let Some(filtering) = options
            .utm
            .as_ref()
            .and_then(|utm| utm.feature_profile_web_filtering_type.as_ref())
        {
            if !WEB_FILTERING_TYPES.contains(&filtering.as_str()) {
                return Err(ValidationError::InvalidValue {
                    field: String::from("utm.feature_profile_web_filtering_type"),
                    value: filtering.clone(),
                    expected: WEB_FILTERING_TYPES.join(", "),
                });
            }
        }
        Ok(())
    }

    fn set_lines(options: &SecurityOptions) -> Result<CommandSet, ValidationError> {
        let mut lines = CommandSet::new();

        if let Some(ike) = &options.ike_traceoptions {
            if let Some(file) = &ike.file {
                if let Some(name) = &file.name {
                    lines.set(format!("security ike traceoptions file {}", quote_if_needed(name)));
                }
                if let Some(files) = file.files {
                    lines.set(format!("security ike traceoptions file files {files}"));
                }
                if let Some(pattern) = &file.match_pattern {
                    lines.set(format!("security ike traceoptions file match {}", quote(pattern)));
                }
                if let Some(size) = file.size {
                    lines.set(format!("security ike traceoptions file size {size}"));
                }
                if file.world_readable {
                    lines.set("security ike traceoptions file world-readable");
                }
                if file.no_world_readable {
                    lines.set("security ike traceoptions file no-world-readable");
                }
            }
            for flag in &ike.flag {
                lines.set(format!("security ike traceoptions flag {flag}"));
            }
            if ike.no_remote_trace {
                lines.set("security ike traceoptions no-remote-trace");
            }
            if let Some(rate_limit) = ike.rate_limit {
                lines.set(format!("security ike traceoptions rate-limit {rate_limit}"));
            }
        }
        if let Some(filtering) = options
            .utm
            .as_ref()
            .and_then(|utm| utm.feature_profile_web_filtering_type.as_ref())
        {
            lines.set(format!(
                "security utm feature-profile web-filtering type {filtering}"
            ));
        }

        Ok(lines)
    }

    fn delete_lines(_id: &str) -> CommandSet {
        let mut lines = CommandSet::new();
        lines.delete("security ike traceoptions");
        lines.delete("security utm feature-profile web-filtering type");
        lines
    }

    fn read_command(_id: &str) -> String {
        show_command("security")
    }

    fn parse(_id: &str, raw: &str) -> Result<Option<SecurityOptions>, ParseError> {
        let mut options = SecurityOptions::default();
        parse_table().parse_into(&mut options, raw)?;
        Ok(Some(options))
    }
}

fn validate_trace_file(file: &TraceFile) -> Result<(), ValidationError> {
    match file.name.as_deref() {
        Some("") => return Err(ValidationError::missing("ike_traceoptions.file.name")),
        Some(name) if FILE_KEYWORDS.contains(&name) => {
            return Err(ValidationError::InvalidName {
                field: String::from("ike_traceoptions.file.name"),
                value: name.to_string(),
                reason: String::from("collides with a file option keyword"),
            });
        }
        _ => {}
    }
    check_range(
        "ike_traceoptions.file.files",
        file.files.map(u64::from),
        FILES_RANGE.0,
        FILES_RANGE.1,
    )?;
    check_range("ike_traceoptions.file.size", file.size, SIZE_RANGE.0, SIZE_RANGE.1)?;
    if file.world_readable && file.no_world_readable {
        return Err(ValidationError::conflict(
            "world_readable",
            "no_world_readable",
            "ike_traceoptions file",
        ));
    }
    Ok(())
}

fn invalid_flag(flag: &str, reason: &str) -> ValidationError {
    ValidationError::InvalidName {
        field: String::from("ike_traceoptions.flag"),
        value: flag.to_string(),
        reason: reason.to_string(),
    }
}

fn parse_table() -> PrefixTable<SecurityOptions> {
    PrefixTable::<SecurityOptions>::new()
        .on("ike traceoptions", |options, _, _| {
            ike(options);
            Ok(())
        })
        .on("ike traceoptions file", |options, rest, _| {
            let file = trace_file(options);
            if !rest.is_empty() {
                file.name = Some(unquote(rest));
            }
            Ok(())
        })
        .on("ike traceoptions file files", |options, rest, line| {
            trace_file(options).files = Some(parse_number(rest, "files", line)?);
            Ok(())
        })
        .on("ike traceoptions file match", |options, rest, _| {
            trace_file(options).match_pattern = Some(unquote(rest));
            Ok(())
        })
        .on("ike traceoptions file size", |options, rest, line| {
            trace_file(options).size = Some(parse_number(rest, "size", line)?);
            Ok(())
        })
        .on("ike traceoptions file world-readable", |options, _, _| {
            trace_file(options).world_readable = true;
            Ok(())
        })
        .on("ike traceoptions file no-world-readable", |options, _, _| {
            trace_file(options).no_world_readable = true;
            Ok(())
        })
        .on("ike traceoptions flag", |options, rest, _| {
            ike(options).flag.push(rest.to_string());
            Ok(())
        })
        .on("ike traceoptions no-remote-trace", |options, _, _| {
            ike(options).no_remote_trace = true;
            Ok(())
        })
        .on("ike traceoptions rate-limit", |options, rest, line| {
            ike(options).rate_limit = Some(parse_number(rest, "rate_limit", line)?);
            Ok(())
        })
        .on("utm", |options, _, _| {
            options.utm.get_or_insert_with(UtmOptions::default);
            Ok(())
        })
        .on("utm feature-profile web-filtering type", |options, rest, _| {
            options
                .utm
                .get_or_insert_with(UtmOptions::default)
                .feature_profile_web_filtering_type = Some(rest.to_string());
            Ok(())
        })
}

fn ike(options: &mut SecurityOptions) -> &mut IkeTraceoptions {
    options
        .ike_traceoptions
        .get_or_insert_with(IkeTraceoptions::default)
}

fn trace_file(options: &mut SecurityOptions) -> &mut TraceFile {
    ike(options).file.get_or_insert_with(TraceFile::default)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn full_options() -> SecurityOptions {
        SecurityOptions {
            ike_traceoptions: Some(IkeTraceoptions {
                file: Some(TraceFile {
                    name: Some(String::from("ike.log")),
                    files: Some(5),
                    match_pattern: Some(String::from("peer 10.0.0.1")),
                    size: Some(102_400),
                    world_readable: true,
                    no_world_readable: false,
                }),
                flag: vec![String::from("timer"), String::from("all")],
                no_remote_trace: true,
                rate_limit: Some(100),
            }),
            utm: Some(UtmOptions {
                feature_profile_web_filtering_type: Some(String::from("juniper-local")),
            }),
        }
    }

    fn as_reply(lines: &CommandSet) -> String {
        let mut reply = String::from("\n<configuration-output>\n");
        for line in lines {
            let relative = line.strip_prefix("set security ").unwrap_or(line);
            reply.push_str("set ");
            reply.push_str(relative);
            reply.push('\n');
        }
        reply.push_str("</configuration-output>\n");
        reply
    }

    #[test]
    fn test_render_order() {
        let lines = Security::render(&full_options()).unwrap();
        assert_eq!(
            lines.lines(),
            [
                "set security ike traceoptions file ike.log",
                "set security ike traceoptions file files 5",
                "set security ike traceoptions file match \"peer 10.0.0.1\"",
                "set security ike traceoptions file size 102400",
                "set security ike traceoptions file world-readable",
                "set security ike traceoptions flag timer",
                "set security ike traceoptions flag all",
                "set security ike traceoptions no-remote-trace",
                "set security ike traceoptions rate-limit 100",
                "set security utm feature-profile web-filtering type juniper-local",
            ]
        );
    }

    #[test]
    fn test_unset_rate_limit_not_rendered() {
        let options = SecurityOptions {
            ike_traceoptions: Some(IkeTraceoptions {
                flag: vec![String::from("all")],
                ..IkeTraceoptions::default()
            }),
            utm: None,
        };
        let lines = Security::render(&options).unwrap();
        assert_eq!(lines.lines(), ["set security ike traceoptions flag all"]);
    }

    #[test]
    fn test_world_readable_conflict() {
        let mut options = full_options();
        if let Some(file) = options
            .ike_traceoptions
            .as_mut()
            .and_then(|ike| ike.file.as_mut())
        {
            file.no_world_readable = true;
        }

        let err = Security::render(&options).unwrap_err();
        assert!(matches!(err, ValidationError::Conflict { .. }));
        assert_eq!(
            err.to_string(),
            "conflict between 'world_readable' and 'no_world_readable' for ike_traceoptions file"
        );
    }

    #[test]
    fn test_ranges() {
        let mut options = full_options();
        if let Some(file) = options
            .ike_traceoptions
            .as_mut()
            .and_then(|ike| ike.file.as_mut())
        {
            file.files = Some(1);
        }
        assert!(matches!(
            Security::validate(&options),
            Err(ValidationError::OutOfRange { min: 2, max: 1000, .. })
        ));

        let mut options = full_options();
        if let Some(file) = options
            .ike_traceoptions
            .as_mut()
            .and_then(|ike| ike.file.as_mut())
        {
            file.size = Some(1024);
        }
        assert!(Security::validate(&options).is_err());
    }

    #[test]
    fn test_file_name_keyword_rejected() {
        for keyword in FILE_KEYWORDS {
            let mut options = full_options();
            if let Some(file) = options
                .ike_traceoptions
                .as_mut()
                .and_then(|ike| ike.file.as_mut())
            {
                file.name = Some((*keyword).to_string());
            }
            let err = Security::validate(&options).unwrap_err();
            assert!(
                matches!(err, ValidationError::InvalidName { ref value, .. } if value == keyword),
                "{keyword}: {err}"
            );
            assert!(Security::render(&options).is_err());
        }
    }

    #[test]
    fn test_file_name_resembling_keyword_round_trips() {
        let mut options = full_options();
        if let Some(file) = options
            .ike_traceoptions
            .as_mut()
            .and_then(|ike| ike.file.as_mut())
        {
            file.name = Some(String::from("files.log"));
        }
        let rendered = Security::render(&options).unwrap();
        let parsed = Security::parse("security", &as_reply(&rendered)).unwrap().unwrap();
        assert_eq!(parsed, options);
    }

    #[test]
    fn test_duplicate_flag_rejected() {
        let mut options = full_options();
        if let Some(ike) = options.ike_traceoptions.as_mut() {
            ike.flag = vec![String::from("all"), String::from("timer"), String::from("all")];
        }
        let err = Security::validate(&options).unwrap_err();
        assert!(matches!(err, ValidationError::InvalidName { ref value, .. } if value == "all"));
        assert!(err.to_string().contains("listed more than once"));
    }

    #[test]
    fn test_unknown_web_filtering_type() {
        let options = SecurityOptions {
            ike_traceoptions: None,
            utm: Some(UtmOptions {
                feature_profile_web_filtering_type: Some(String::from("surf-control")),
            }),
        };
        assert!(matches!(
            Security::validate(&options),
            Err(ValidationError::InvalidValue { .. })
        ));
    }

    #[test]
    fn test_parse_prefix_precedence() {
        let raw = "<configuration-output>\nset ike traceoptions file files 5\n</configuration-output>";
        let parsed = Security::parse("security", raw).unwrap().unwrap();
        let file = parsed.ike_traceoptions.unwrap().file.unwrap();

        assert_eq!(file.files, Some(5));
        assert_eq!(file.name, None);
    }

    #[test]
    fn test_parse_merges_lines() {
        let raw = "<configuration-output>\n\
set ike traceoptions file ike.log\n\
set ike traceoptions flag all\n\
set ike traceoptions file size 20480\n\
set ike gateway gw1 address 10.0.0.1\n\
set policies default-policy deny-all\n\
</configuration-output>";
        let parsed = Security::parse("security", raw).unwrap().unwrap();
        let ike = parsed.ike_traceoptions.unwrap();
        let file = ike.file.unwrap();

        assert_eq!(file.name.as_deref(), Some("ike.log"));
        assert_eq!(file.size, Some(20_480));
        assert_eq!(ike.flag, ["all"]);
        assert_eq!(ike.rate_limit, None);
        assert!(parsed.utm.is_none());
    }

    #[test]
    fn test_parse_invalid_number() {
        let raw = "set ike traceoptions rate-limit lots";
        let err = Security::parse("security", raw).unwrap_err();
        assert!(matches!(err, ParseError::InvalidNumber { ref field, .. } if field == "rate_limit"));
        assert!(err.to_string().contains("ike traceoptions rate-limit lots"));
    }

    #[test]
    fn test_render_parse_is_idempotent() {
        let options = full_options();
        let rendered = Security::render(&options).unwrap();
        let parsed = Security::parse("security", &as_reply(&rendered)).unwrap().unwrap();

        assert_eq!(parsed, options);
        assert_eq!(Security::render(&parsed).unwrap(), rendered);
    }

    #[test]
    fn test_delete_lines_cover_managed_subtree() {
        assert_eq!(
            Security::delete_lines("security").lines(),
            [
                "delete security ike traceoptions",
                "delete security utm feature-profile web-filtering type",
            ]
        );
        assert_eq!(
            Security::read_command("security"),
            "show configuration security | display set relative"
        );
    }

    #[test]
    fn test_deserialize_yaml() {
        let yaml = r"
ike_traceoptions:
  file:
    name: ike.log
    match: error
    no_world_readable: true
  rate_limit: 0
utm:
  feature_profile_web_filtering_type: web-filtering-none
";
        let options: SecurityOptions = serde_yaml::from_str(yaml).unwrap();
        let ike = options.ike_traceoptions.unwrap();
        assert_eq!(ike.rate_limit, Some(0));
        assert_eq!(ike.file.unwrap().match_pattern.as_deref(), Some("error"));
    }
}
