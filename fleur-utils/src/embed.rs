use twilight_model::{channel::message::embed::Embed, util::Timestamp};
use twilight_util::builder::embed::{EmbedBuilder, EmbedFieldBuilder};

/// Color of the help embed.
pub const HELP_EMBED_COLOR: u32 = 0x00_bf_ff;

/// Severity of a log record.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum LogLevel {
    Success,
    Warn,
    Error,
}

impl LogLevel {
    pub fn color(self) -> u32 {
        match self {
            Self::Success => 0x1e_8e_3e,
            Self::Warn => 0xff_78_00,
            Self::Error => 0x99_00_00,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }
}

/// Compact one-line body of a log record: `description | actor | extra`.
pub fn log_line(description: &str, actor_name: &str, extra: Option<&str>) -> String {
    let extra = extra.map(str::trim).filter(|extra| !extra.is_empty());
    match extra {
        Some(extra) => format!("{description} | {actor_name} | {extra}"),
        None => format!("{description} | {actor_name}"),
    }
}

/// Build a color-coded, timestamped log embed.
pub fn log_embed(
    level: LogLevel,
    description: &str,
    actor_name: &str,
    extra: Option<&str>,
    timestamp_secs: i64,
) -> anyhow::Result<Embed> {
    let embed = EmbedBuilder::new()
        .color(level.color())
        .description(log_line(description, actor_name, extra))
        .timestamp(Timestamp::from_secs(timestamp_secs)?)
        .validate()?
        .build();

    Ok(embed)
}

/// Build the command list embed, one field per command.
pub fn help_embed<'a>(
    title: &str,
    description: &str,
    entries: impl IntoIterator<Item = (String, &'a str)>,
) -> anyhow::Result<Embed> {
    let builder = entries.into_iter().fold(
        EmbedBuilder::new()
            .title(title)
            .color(HELP_EMBED_COLOR)
            .description(description),
        |builder, (name, value)| builder.field(EmbedFieldBuilder::new(name, value).build()),
    );

    Ok(builder.validate()?.build())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_line_skips_empty_extra() {
        assert_eq!(log_line("moved", "Ann", None), "moved | Ann");
        assert_eq!(log_line("moved", "Ann", Some("  ")), "moved | Ann");
        assert_eq!(
            log_line("moved", "Ann", Some("[link](https://x)")),
            "moved | Ann | [link](https://x)"
        );
    }

    #[test]
    fn log_embed_carries_level_color() {
        let embed = log_embed(LogLevel::Warn, "no room", "Ann", None, 1_700_000_000).unwrap();

        assert_eq!(embed.color, Some(0xff7800));
        assert_eq!(embed.description.as_deref(), Some("no room | Ann"));
        assert!(embed.timestamp.is_some());
    }

    #[test]
    fn help_embed_lists_fields() {
        let embed = help_embed(
            "Commands",
            "All of them",
            [("!purge <N>".to_owned(), "Delete N messages.")],
        )
        .unwrap();

        assert_eq!(embed.fields.len(), 1);
        assert_eq!(embed.fields[0].name, "!purge <N>");
        assert!(!embed.fields[0].inline);
    }
}
