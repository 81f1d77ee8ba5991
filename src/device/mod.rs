//! In-process model of the controller's command API.
//!
//! The controller exposes MOSFET, relay, opto and TTL outputs behind I2C
//! expanders plus a bank of digital inputs. Commands take the form
//! `<TAG>/<param>/<value>` and every reply is a JSON object. Button groups
//! (`BUT/<group>/<button>`) switch named sets of outputs. The model gives the
//! client a realistic peer without hardware, see [`EmulatedChannel`].

use std::collections::BTreeMap;

use common::{
    split_command, ButtonsReply, InfoReply, IoKind, MessageReply, BUTTONS, BUTTON_OFF, INFO,
};
use log::{debug, error, info};
use serde::Serialize;

mod button;
mod group;
mod terminal;

pub use button::{Button, ButtonGroup, Pin};
pub use group::{InputBank, OutputBank, EXPANDER_COUNT, INPUT_COUNT};
pub use terminal::EmulatedChannel;

const RET_OK: u16 = 200;

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Reply {
    Message(MessageReply),
    Info(InfoReply),
}

impl Reply {
    fn message(msg: impl Into<String>) -> Self {
        Reply::Message(MessageReply { msg: msg.into() })
    }

    pub fn to_line(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

#[derive(Clone, Debug)]
pub struct Controller {
    expanders: [u16; EXPANDER_COUNT],
    outputs: Vec<OutputBank>,
    inputs: InputBank,
    buttons: BTreeMap<String, ButtonGroup>,
}

impl Controller {
    /// The board layout: 16 MOSFETs, 15 relays, then 8 opto and 8 TTL outputs
    /// sharing the third expander. No button groups.
    pub fn new() -> Self {
        Controller {
            expanders: [0; EXPANDER_COUNT],
            outputs: vec![
                OutputBank::new(IoKind::Mosfet, 0, 16, 0),
                OutputBank::new(IoKind::Relay, 1, 15, 0),
                OutputBank::new(IoKind::Opto, 2, 8, 8),
                OutputBank::new(IoKind::Ttl, 2, 8, 0),
            ],
            inputs: InputBank::new(),
            buttons: BTreeMap::new(),
        }
    }

    /// Register a button group. Its outputs start off.
    pub fn add_button_group(&mut self, name: &str, buttons: Vec<Button>) {
        self.buttons
            .insert(name.to_string(), ButtonGroup::new(buttons));
        self.reset_button_group(name);
    }

    pub fn output_bits(&self, kind: IoKind) -> Option<u16> {
        self.outputs
            .iter()
            .find(|bank| bank.kind == kind)
            .map(|bank| bank.bits(&self.expanders))
    }

    pub fn set_input(&mut self, index: usize, level: bool) -> bool {
        self.inputs.set_level(index, level)
    }

    /// Drive one output, pin numbered from 0
    pub fn set_output(&mut self, kind: IoKind, pin: u32, on: bool) -> bool {
        if !kind.is_output() {
            error!("{} is not an output!", kind.tag());
            return false;
        }

        let expanders = &mut self.expanders;
        self.outputs
            .iter()
            .find(|bank| bank.kind == kind)
            .map_or(false, |bank| bank.set_output(expanders, pin, on))
    }

    pub fn state(&self) -> InfoReply {
        let mut io = BTreeMap::new();
        for bank in &self.outputs {
            io.insert(bank.kind.tag().to_string(), bank.bits(&self.expanders));
        }
        io.insert(IoKind::Input.tag().to_string(), self.inputs.bits());

        let groups = self
            .buttons
            .iter()
            .map(|(name, group)| (name.clone(), group.current().to_string()))
            .collect();

        InfoReply {
            io,
            buttons: ButtonsReply {
                status: "OK".to_string(),
                groups,
            },
            msg: "OK".to_string(),
            ret_code: RET_OK,
        }
    }

    fn reset_button_group(&mut self, name: &str) -> bool {
        let Some(group) = self.buttons.get(name) else {
            return false;
        };

        for pin in group.pins() {
            self.set_output(pin.kind, pin.index, false);
        }
        if let Some(group) = self.buttons.get_mut(name) {
            group.set_current(BUTTON_OFF);
        }
        true
    }

    fn activate_button(&mut self, group: &str, button: &Button) -> bool {
        info!("activate button {} in group {}", button.name, group);
        self.reset_button_group(group);

        for pin in &button.pins {
            self.set_output(pin.kind, pin.index, true);
        }
        if let Some(group) = self.buttons.get_mut(group) {
            group.set_current(&button.name);
        }
        true
    }

    /// `BUT/<group>/<button>`, or `BUT/<group>/OFF` to release the group
    fn button_call(&mut self, parts: &[&str]) -> bool {
        let [_, group, name, ..] = parts else {
            return false;
        };

        let Some(button_group) = self.buttons.get(*group) else {
            info!("button group {} not found", group);
            return false;
        };

        if *name == BUTTON_OFF {
            return self.reset_button_group(group);
        }

        match button_group.find(name).cloned() {
            Some(button) => self.activate_button(group, &button),
            None => {
                info!("button {} not found", name);
                false
            }
        }
    }

    pub fn handle_api_call(&mut self, line: &str) -> Reply {
        debug!("Analyzing command: {:?}", line);

        let parts = split_command(line);
        let tag = parts[0];

        if tag == BUTTONS {
            let reply = if self.button_call(&parts) { "OK" } else { "ERR" };
            return Reply::message(reply);
        }

        if tag == INFO {
            return Reply::Info(self.state());
        }

        let Some(kind) = IoKind::from_tag(tag) else {
            return Reply::message(format!("ERR: API call for tag {} not found", tag));
        };

        info!("API call for tag {}", tag);
        let (parameter, value) = match group::parameters(&parts) {
            Ok(p) => p,
            Err(msg) => return Reply::message(msg),
        };

        if kind == IoKind::Input {
            return Reply::message(self.inputs.operation(parameter));
        }

        let expanders = &mut self.expanders;
        match self.outputs.iter().find(|bank| bank.kind == kind) {
            Some(bank) => Reply::message(bank.operation(expanders, parameter, value)),
            None => Reply::message(format!("ERR: API call for tag {} not found", tag)),
        }
    }
}

impl Default for Controller {
    fn default() -> Self {
        Controller::new()
    }
}
