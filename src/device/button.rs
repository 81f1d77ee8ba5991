use common::{IoKind, BUTTON_OFF};

/// One output driven by a button, numbered from 0 within its group
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Pin {
    pub kind: IoKind,
    pub index: u32,
}

impl Pin {
    pub fn new(kind: IoKind, index: u32) -> Self {
        Pin { kind, index }
    }
}

/// A named set of outputs switched on together
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Button {
    pub name: String,
    pub pins: Vec<Pin>,
}

impl Button {
    pub fn new(name: &str, pins: Vec<Pin>) -> Self {
        Button {
            name: name.to_string(),
            pins,
        }
    }
}

/// Mutually exclusive buttons: activating one releases the others
#[derive(Clone, Debug)]
pub struct ButtonGroup {
    buttons: Vec<Button>,
    current: String,
}

impl ButtonGroup {
    pub fn new(buttons: Vec<Button>) -> Self {
        ButtonGroup {
            buttons,
            current: BUTTON_OFF.to_string(),
        }
    }

    pub fn current(&self) -> &str {
        &self.current
    }

    pub fn find(&self, name: &str) -> Option<&Button> {
        self.buttons.iter().find(|button| button.name == name)
    }

    /// Every pin any button of the group drives
    pub fn pins(&self) -> Vec<Pin> {
        self.buttons
            .iter()
            .flat_map(|button| button.pins.iter().copied())
            .collect()
    }

    pub(super) fn set_current(&mut self, name: &str) {
        self.current = name.to_string();
    }
}
