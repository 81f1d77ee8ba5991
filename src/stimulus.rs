use std::sync::atomic::{AtomicBool, Ordering};

use anyhow::{bail, Error};
use common::{bits_command, OutputGroup};
use log::{debug, info};
use rand::{rngs::ThreadRng, Rng};

use crate::channel::Channel;
use crate::client::CommandClient;
use crate::config::StimulusConfig;

/// Produces random `<tag>/bits/<mask>` commands, one per group per round
pub struct StimulusGenerator<R: Rng> {
    groups: Vec<OutputGroup>,
    rng: R,
}

impl StimulusGenerator<ThreadRng> {
    pub fn new(groups: Vec<OutputGroup>) -> Self {
        StimulusGenerator::with_rng(groups, rand::thread_rng())
    }
}

impl<R: Rng> StimulusGenerator<R> {
    pub fn with_rng(groups: Vec<OutputGroup>, rng: R) -> Self {
        StimulusGenerator { groups, rng }
    }

    pub fn groups(&self) -> &[OutputGroup] {
        &self.groups
    }

    /// Uniform over `[0, 2^width - 1]`
    pub fn draw(&mut self, group: &OutputGroup) -> u32 {
        self.rng.gen_range(0..=group.max_mask())
    }

    pub fn next_round(&mut self) -> Vec<String> {
        let groups = std::mem::take(&mut self.groups);
        let round = groups
            .iter()
            .map(|group| bits_command(&group.tag, self.draw(group)))
            .collect();
        self.groups = groups;

        round
    }
}

/// Keep sending random masks until `stop` is raised. Returns how many
/// commands went out.
///
/// Replies are not checked. With `drain_responses` set, each reply is read
/// and logged before the next command. A generator without groups is an
/// error, since the loop would never send anything.
pub fn run_stimulus<C: Channel, R: Rng>(
    client: &mut CommandClient<C>,
    generator: &mut StimulusGenerator<R>,
    config: &StimulusConfig,
    stop: &AtomicBool,
) -> Result<u64, Error> {
    if generator.groups().is_empty() {
        bail!("no output groups to drive");
    }

    let mut sent = 0;

    client.clear_input_buffer()?;
    info!(
        "Stimulus running on {} groups, interval {:?}",
        generator.groups().len(),
        config.interval()
    );

    'rounds: while !stop.load(Ordering::Relaxed) {
        for command in generator.next_round() {
            if stop.load(Ordering::Relaxed) {
                break 'rounds;
            }

            client.send_command(&command)?;
            sent += 1;

            if config.drain_responses {
                let response = client.read_response()?;
                debug!("{} -> {:?}", command, response);
            }

            if let Some(interval) = config.interval() {
                std::thread::sleep(interval);
            }
        }
    }

    info!("Stimulus stopped after {} commands", sent);
    Ok(sent)
}
