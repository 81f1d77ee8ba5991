use std::io::Write;

use anyhow::{Context, Error};
use log::info;

use crate::channel::Channel;
use crate::client::CommandClient;
use crate::payload::parse_and_print;

/// What happened over one probe run
#[derive(Debug, Default, PartialEq, Eq)]
pub struct ProbeSummary {
    pub sent: usize,
    pub parsed: usize,
    pub raw: usize,
}

/// Send each command once and print what comes back.
///
/// An unparseable reply only affects its own command. A channel failure
/// stops the run, since later exchanges would fail the same way.
pub fn run_probe<C: Channel, W: Write>(
    client: &mut CommandClient<C>,
    commands: &[String],
    out: &mut W,
) -> Result<ProbeSummary, Error> {
    let mut summary = ProbeSummary::default();

    for command in commands {
        let response = client
            .exchange(command)
            .with_context(|| format!("exchange for {:?} aborted", command))?;
        summary.sent += 1;

        writeln!(out, "Command: {}", command)?;
        if parse_and_print(&response, out)? {
            summary.parsed += 1;
        } else {
            summary.raw += 1;
        }
    }

    info!(
        "Probed {} commands: {} structured, {} raw",
        summary.sent, summary.parsed, summary.raw
    );

    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::scripted::ScriptedChannel;
    use crate::error::ChannelError;
    use crate::payload::PARSE_FAILURE;

    fn probe(channel: ScriptedChannel, commands: &[&str]) -> (ProbeSummary, String) {
        let commands: Vec<String> = commands.iter().map(|c| c.to_string()).collect();
        let mut client = CommandClient::new(channel);
        let mut out = Vec::new();

        let summary = run_probe(&mut client, &commands, &mut out).unwrap();
        (summary, String::from_utf8(out).unwrap())
    }

    #[test]
    fn test_on_then_off_each_print_one_key() {
        for command in ["MOS/1/on", "MOS/1/off"] {
            let channel = ScriptedChannel::replying(&["{\"status\":\"ok\"}", ""]);
            let (summary, out) = probe(channel, &[command]);

            assert_eq!(1, summary.parsed);
            assert_eq!(
                format!("Command: {command}\n{{\n    \"status\": \"ok\"\n}}\n"),
                out
            );
        }
    }

    #[test]
    fn test_parse_failure_does_not_stop_run() {
        let channel = ScriptedChannel::new(|cmd| match cmd {
            "INP/bits" => vec!["OK: 5".to_string(), String::new()],
            _ => vec!["{\"msg\":\"OK\"}".to_string(), String::new()],
        });

        let (summary, out) = probe(channel, &["MOS/1", "INP/bits", "INF"]);

        assert_eq!(
            ProbeSummary {
                sent: 3,
                parsed: 2,
                raw: 1
            },
            summary
        );
        assert!(out.contains(&format!("Command: INP/bits\n{PARSE_FAILURE}\nOK: 5\n")));
        assert!(out.contains("Command: INF\n{"));
    }

    #[test]
    fn test_silent_device_gives_raw_empty_response() {
        let (summary, out) = probe(ScriptedChannel::replying(&[]), &["INF"]);

        assert_eq!(1, summary.raw);
        assert_eq!(format!("Command: INF\n{PARSE_FAILURE}\n\n"), out);
    }

    struct BrokenChannel;

    impl Channel for BrokenChannel {
        fn name(&self) -> &str {
            "broken"
        }

        fn clear_input(&mut self) -> Result<(), ChannelError> {
            Ok(())
        }

        fn write_all(&mut self, _bytes: &[u8]) -> Result<(), ChannelError> {
            Err(ChannelError::Write {
                path: "broken".to_string(),
                source: std::io::Error::new(std::io::ErrorKind::BrokenPipe, "unplugged"),
            })
        }

        fn read_line(&mut self) -> Result<Option<String>, ChannelError> {
            Ok(None)
        }
    }

    #[test]
    fn test_channel_failure_names_operation() {
        let mut client = CommandClient::new(BrokenChannel);
        let mut out = Vec::new();

        let err = run_probe(&mut client, &["INF".to_string()], &mut out).unwrap_err();

        let report = format!("{:#}", err);
        assert!(report.contains("\"INF\""), "{report}");
        assert!(report.contains("writing to broken failed"), "{report}");
        assert!(out.is_empty());
    }
}
