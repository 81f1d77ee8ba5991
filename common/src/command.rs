use alloc::{
    collections::BTreeMap,
    format,
    string::{String, ToString},
    vec::Vec,
};
use serde::{Deserialize, Serialize};

/// Separator between the parts of a command line, `<TAG>/<param>/<value>`
pub const SEPARATOR: char = '/';

/// Parameter name for whole-group bit access
pub const BITS: &str = "bits";

/// Query that dumps the state of every I/O group
pub const INFO: &str = "INF";

/// Prefix for button group calls, `BUT/<group>/<button>`
pub const BUTTONS: &str = "BUT";

/// Button name that switches a whole group off
pub const BUTTON_OFF: &str = "OFF";

/// Widest group a mask can describe
pub const MAX_GROUP_WIDTH: u8 = 32;

/// The command list the probe tool walks when nothing else is given. The
/// `DUPA` line is deliberately not a real tag, so the device's "not found"
/// path gets exercised too.
pub const DEFAULT_PROBE_COMMANDS: &[&str] = &[
    "MOS",
    "MOS/1",
    "MOS/1/on",
    "MOS/1/off",
    "MOS/bits/",
    "REL/bits/44",
    "OPT/bits/0",
    "DUPA/bits/0",
    "INP/",
    "INP/bits",
    "INP/bits/1",
    "INF",
];

/// The I/O groups a controller exposes
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum IoKind {
    Mosfet,
    Relay,
    Opto,
    Ttl,
    Input,
}

impl IoKind {
    pub const ALL: [IoKind; 5] = [
        IoKind::Mosfet,
        IoKind::Relay,
        IoKind::Opto,
        IoKind::Ttl,
        IoKind::Input,
    ];

    /// Command prefix used on the wire
    pub fn tag(self) -> &'static str {
        match self {
            IoKind::Mosfet => "MOS",
            IoKind::Relay => "REL",
            IoKind::Opto => "OPT",
            IoKind::Ttl => "TTL",
            IoKind::Input => "INP",
        }
    }

    pub fn from_tag(tag: &str) -> Option<IoKind> {
        IoKind::ALL.into_iter().find(|kind| kind.tag() == tag)
    }

    pub fn is_output(self) -> bool {
        !matches!(self, IoKind::Input)
    }
}

/// A prefix that takes a bits mask, and how many outputs sit behind it
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputGroup {
    pub tag: String,
    pub width: u8,
}

impl OutputGroup {
    pub fn new(tag: &str, width: u8) -> Self {
        OutputGroup {
            tag: tag.to_string(),
            width,
        }
    }

    /// Largest mask the group accepts, `2^width - 1`. Widths past
    /// [`MAX_GROUP_WIDTH`] saturate at `u32::MAX`; the config loader rejects
    /// them before they get here.
    pub fn max_mask(&self) -> u32 {
        match self.width {
            0 => 0,
            w if w >= 32 => u32::MAX,
            w => u32::MAX >> (32 - w as u32),
        }
    }

    /// The groups driven by the stimulus loop, with their output counts
    pub fn defaults() -> Vec<OutputGroup> {
        [
            (IoKind::Mosfet, 16),
            (IoKind::Relay, 15),
            (IoKind::Opto, 8),
            (IoKind::Ttl, 8),
        ]
        .into_iter()
        .map(|(kind, width)| OutputGroup::new(kind.tag(), width))
        .collect()
    }
}

/// `<tag>/bits/<mask>`
pub fn bits_command(tag: &str, mask: u32) -> String {
    format!("{tag}{SEPARATOR}{BITS}{SEPARATOR}{mask}")
}

/// Split a command line into its slash-separated parts. Empty parts are
/// kept, so `INP/` gives `["INP", ""]`.
pub fn split_command(line: &str) -> Vec<&str> {
    line.split(SEPARATOR).collect()
}

/// Reply to a plain command: `{"msg": "..."}`
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageReply {
    pub msg: String,
}

/// Active button of every button group, keyed by group name
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ButtonsReply {
    pub status: String,
    pub groups: BTreeMap<String, String>,
}

/// Reply to `INF`: the bits of every group, keyed by tag
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct InfoReply {
    pub io: BTreeMap<String, u16>,
    #[serde(rename = "BUT", default)]
    pub buttons: ButtonsReply,
    pub msg: String,
    #[serde(rename = "retCode")]
    pub ret_code: u16,
}
